//! Text rasterizer: turns a (possibly multi-line) string into world-space points.
//!
//! The string is drawn with cosmic-text into an off-screen grayscale mask, the mask
//! is scanned on a fixed grid and every bright cell becomes a candidate point.

use cosmic_text::{Align, Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use glam::{Vec2, Vec3};
use image::{GrayImage, Luma};
use rand::Rng;

pub const MASK_WIDTH: u32 = 1024;
pub const MASK_HEIGHT: u32 = 512;
pub const FONT_SIZE: f32 = 110.0;
pub const LINE_HEIGHT: f32 = 130.0;
/// Grid stride in pixels when scanning the mask.
pub const SAMPLE_STRIDE: u32 = 4;
pub const LUMA_THRESHOLD: u8 = 128;
pub const WORLD_UNITS_PER_PIXEL: f32 = 0.014;

const IN_PLANE_JITTER: f32 = 0.03;
const DEPTH_JITTER: f32 = 0.25;

pub struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextRasterizer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    /// Draw `text` centered line by line into a fresh mask.
    pub fn render_mask(&mut self, text: &str) -> GrayImage {
        let mut mask = GrayImage::new(MASK_WIDTH, MASK_HEIGHT);
        if text.trim().is_empty() {
            return mask;
        }

        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(FONT_SIZE, LINE_HEIGHT));
        buffer.set_size(&mut self.font_system, Some(MASK_WIDTH as f32), Some(MASK_HEIGHT as f32));
        let attrs = Attrs::new().family(Family::SansSerif).weight(Weight::BOLD);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        for line in buffer.lines.iter_mut() {
            line.set_align(Some(Align::Center));
        }
        buffer.shape_until_scroll(&mut self.font_system, false);

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(0xFF, 0xFF, 0xFF),
            |x, y, w, h, color| {
                let coverage = color.a();
                if coverage == 0 {
                    return;
                }
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let (px, py) = (x + dx, y + dy);
                        if px < 0 || py < 0 || px >= MASK_WIDTH as i32 || py >= MASK_HEIGHT as i32 {
                            continue;
                        }
                        let pixel = mask.get_pixel_mut(px as u32, py as u32);
                        pixel.0[0] = pixel.0[0].max(coverage);
                    }
                }
            },
        );

        mask
    }

    /// Exactly `count` points sampled from the rendered `text`.
    pub fn points<R: Rng>(&mut self, text: &str, count: usize, rng: &mut R) -> Vec<Vec3> {
        let mask = self.render_mask(text);
        points_from_mask(&mask, count, rng)
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Grid cells brighter than `threshold`, mapped to world units and centered on their bounding box.
pub fn sample_mask(mask: &GrayImage, stride: u32, threshold: u8) -> Vec<Vec2> {
    let stride = stride.max(1);
    let mut hits = Vec::new();
    for y in (0..mask.height()).step_by(stride as usize) {
        for x in (0..mask.width()).step_by(stride as usize) {
            let Luma([luma]) = *mask.get_pixel(x, y);
            if luma > threshold {
                hits.push(Vec2::new(x as f32, y as f32));
            }
        }
    }
    if hits.is_empty() {
        return hits;
    }

    let (min, max) = hits
        .iter()
        .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    let center = (min + max) * 0.5;

    // image rows grow downwards, world y grows upwards
    hits.into_iter()
        .map(|p| Vec2::new(p.x - center.x, center.y - p.y) * WORLD_UNITS_PER_PIXEL)
        .collect()
}

/// Map `count` points onto the mask's candidates by cyclic repetition, then jitter them.
///
/// A mask without any bright cell yields `count` origin points.
pub fn points_from_mask<R: Rng>(mask: &GrayImage, count: usize, rng: &mut R) -> Vec<Vec3> {
    let candidates = sample_mask(mask, SAMPLE_STRIDE, LUMA_THRESHOLD);
    if candidates.is_empty() {
        log::warn!("Text mask has no foreground pixels, placing {} text points at the origin", count);
        return vec![Vec3::ZERO; count];
    }

    log::debug!("Text mask yielded {} candidates for {} points", candidates.len(), count);
    (0..count)
        .map(|i| {
            let base = candidates[i % candidates.len()];
            Vec3::new(
                base.x + rng.gen_range(-IN_PLANE_JITTER..=IN_PLANE_JITTER),
                base.y + rng.gen_range(-IN_PLANE_JITTER..=IN_PLANE_JITTER),
                rng.gen_range(-DEPTH_JITTER..=DEPTH_JITTER),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn block_mask(x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut mask = GrayImage::new(64, 32);
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn test_blank_mask_falls_back_to_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = points_from_mask(&GrayImage::new(32, 32), 17, &mut rng);
        assert_eq!(points.len(), 17);
        assert!(points.iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn test_empty_string_falls_back_to_origin() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut rasterizer = TextRasterizer::new();
        let points = rasterizer.points("", 40, &mut rng);
        assert_eq!(points.len(), 40);
        assert!(points.iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn test_multi_line_text_is_drawn_centered() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut rasterizer = TextRasterizer::new();
        let points = rasterizer.points("MERRY\nCHRISTMAS", 500, &mut rng);
        assert_eq!(points.len(), 500);

        // headless machines may have no fonts at all; the count guarantee above still holds
        if rasterizer.font_system.db().len() == 0 {
            return;
        }

        let candidates = sample_mask(&rasterizer.render_mask("MERRY\nCHRISTMAS"), SAMPLE_STRIDE, LUMA_THRESHOLD);
        let upper: Vec<Vec2> = candidates.iter().copied().filter(|p| p.y > 0.0).collect();
        let lower: Vec<Vec2> = candidates.iter().copied().filter(|p| p.y < 0.0).collect();
        assert!(!upper.is_empty() && !lower.is_empty());

        let x_mid = |line: &[Vec2]| {
            let (lo, hi) = line
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
            (lo + hi) * 0.5
        };
        assert!(x_mid(&candidates).abs() < 1e-4);
        assert!(x_mid(&upper).abs() < 0.35, "upper line off centre: {}", x_mid(&upper));
        assert!(x_mid(&lower).abs() < 0.35, "lower line off centre: {}", x_mid(&lower));

        // "CHRISTMAS" is the wider line
        let width = |line: &[Vec2]| {
            let (lo, hi) = line
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
            hi - lo
        };
        assert!(width(&lower) > width(&upper));
    }

    #[test]
    fn test_sample_respects_stride_and_threshold() {
        let mut mask = block_mask(8, 8, 16, 16);
        // dim pixel below threshold is ignored
        mask.put_pixel(40, 8, Luma([LUMA_THRESHOLD]));
        let hits = sample_mask(&mask, 4, LUMA_THRESHOLD);
        // x in {8, 12}, y in {8, 12}
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_samples_are_centered_and_flipped() {
        let mask = block_mask(8, 4, 17, 13);
        let hits = sample_mask(&mask, 4, LUMA_THRESHOLD);
        let sum: Vec2 = hits.iter().copied().sum();
        assert!(sum.length() < 1e-4);

        // top row of the mask ends up with the largest world y
        let top = hits.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((top - 4.0 * WORLD_UNITS_PER_PIXEL).abs() < 1e-5);
    }

    #[test]
    fn test_points_cycle_candidates_with_bounded_jitter() {
        let mask = block_mask(0, 0, 8, 4);
        let candidates = sample_mask(&mask, SAMPLE_STRIDE, LUMA_THRESHOLD);
        assert_eq!(candidates.len(), 2);

        let mut rng = StdRng::seed_from_u64(3);
        let points = points_from_mask(&mask, 9, &mut rng);
        assert_eq!(points.len(), 9);
        for (i, point) in points.iter().enumerate() {
            let base = candidates[i % candidates.len()];
            assert!((point.x - base.x).abs() <= IN_PLANE_JITTER + 1e-6);
            assert!((point.y - base.y).abs() <= IN_PLANE_JITTER + 1e-6);
            assert!(point.z.abs() <= DEPTH_JITTER + 1e-6);
        }
    }
}

use glam::Vec3;
use rand::Rng;

use crate::animator::{AnimatorSettings, FrameInput, Mode, MorphAnimator};
use crate::batch::TransformBatch;
use crate::config::SceneConfig;
use crate::ornaments::{OrnamentFrame, Ribbon, Topper};
use crate::particles::{ParticleField, ParticleKind};
use crate::text::TextRasterizer;
use crate::wish::{WishFlight, WishId, WishQueue};

/// Draw groups in the order the renderer creates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Particles(ParticleKind),
    RibbonTube,
    RibbonLights,
    Topper,
    Wishes,
}

impl Group {
    pub const ALL: [Group; 8] = [
        Group::Particles(ParticleKind::Shard),
        Group::Particles(ParticleKind::Dust),
        Group::Particles(ParticleKind::GlassFlake),
        Group::Particles(ParticleKind::BlueOrnament),
        Group::RibbonTube,
        Group::RibbonLights,
        Group::Topper,
        Group::Wishes,
    ];
}

/// The whole animated scene. `frame` is the per-frame callback.
pub struct Scene {
    config: SceneConfig,
    mode: Mode,
    field: ParticleField,
    animator: MorphAnimator,
    ribbon: Ribbon,
    topper: Topper,
    wishes: WishQueue,
    flight: WishFlight,
    explode: f32,
}

impl Scene {
    /// Build every template. Runs once at startup.
    pub fn new<R: Rng>(config: SceneConfig, rng: &mut R) -> Self {
        let mut rasterizer = TextRasterizer::new();
        let text_points = rasterizer.points(&config.text, config.particle_count, rng);
        Self::with_text_points(config, &text_points, rng)
    }

    /// Same as `new` with text points supplied by the caller.
    pub fn with_text_points<R: Rng>(config: SceneConfig, text_points: &[Vec3], rng: &mut R) -> Self {
        let field = ParticleField::generate(&config, text_points, rng);
        let animator = MorphAnimator::new(&field, AnimatorSettings::from(&config));
        let ribbon = Ribbon::new(config.tree_height, config.tree_radius);
        let topper = Topper::new(config.tree_height);
        let flight = WishFlight::new(config.wish_sparks);

        Self {
            config,
            mode: Mode::TreeShape,
            field,
            animator,
            ribbon,
            topper,
            wishes: WishQueue::new(),
            flight,
            explode: 0.0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::info!("✨ Mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn cycle_mode(&mut self) -> Mode {
        self.set_mode(self.mode.next());
        self.mode
    }

    pub fn make_wish(&mut self, now: f32) -> WishId {
        self.wishes.submit(now)
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn animator(&self) -> &MorphAnimator {
        &self.animator
    }

    pub fn ribbon(&self) -> &Ribbon {
        &self.ribbon
    }

    pub fn topper(&self) -> &Topper {
        &self.topper
    }

    pub fn wishes(&self) -> &WishQueue {
        &self.wishes
    }

    /// Explode factor used by the last frame.
    pub fn explode(&self) -> f32 {
        self.explode
    }

    /// Run one full update pass.
    pub fn frame(&mut self, elapsed: f32, dt: f32, camera_position: Vec3) {
        let input = FrameInput {
            mode: self.mode,
            elapsed,
            dt,
            camera_position,
        };
        self.explode = self.animator.update(&self.field, &input);

        let settings = self.animator.settings();
        let ornament_frame = OrnamentFrame {
            mode: self.mode,
            elapsed,
            explode: self.explode,
            alpha: settings.smoothing_alpha(dt),
            tree_angle: elapsed * settings.tree_spin_speed,
        };
        self.ribbon.update(&ornament_frame);
        self.topper.update(&ornament_frame);

        self.wishes.prune(elapsed);
        self.flight.update(self.wishes.wishes(), elapsed);
    }

    pub fn batch(&self, group: Group) -> &TransformBatch {
        match group {
            Group::Particles(kind) => self.animator.batch(kind),
            Group::RibbonTube => self.ribbon.tube_batch(),
            Group::RibbonLights => self.ribbon.light_batch(),
            Group::Topper => self.topper.batch(),
            Group::Wishes => self.flight.batch(),
        }
    }

    pub fn batch_mut(&mut self, group: Group) -> &mut TransformBatch {
        match group {
            Group::Particles(kind) => self.animator.batch_mut(kind),
            Group::RibbonTube => self.ribbon.tube_batch_mut(),
            Group::RibbonLights => self.ribbon.light_batch_mut(),
            Group::Topper => self.topper.batch_mut(),
            Group::Wishes => self.flight.batch_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene() -> Scene {
        let config = SceneConfig {
            particle_count: 400,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let text = vec![Vec3::ZERO; config.particle_count];
        Scene::with_text_points(config, &text, &mut rng)
    }

    #[test]
    fn test_frame_fills_every_group() {
        let mut scene = scene();
        scene.make_wish(0.0);
        scene.frame(0.5, 1.0 / 60.0, Vec3::new(0.0, 0.0, 20.0));

        let particle_slots: usize = ParticleKind::ALL
            .iter()
            .map(|&kind| scene.batch(Group::Particles(kind)).len())
            .sum();
        assert_eq!(particle_slots, 400);
        assert_eq!(scene.batch(Group::RibbonTube).len(), 1);
        assert_eq!(scene.batch(Group::Topper).len(), 1);
        assert_eq!(scene.batch(Group::Wishes).len(), scene.config().wish_sparks);
        for group in Group::ALL {
            assert!(scene.batch(group).is_dirty());
        }
    }

    #[test]
    fn test_explode_comes_from_camera_distance() {
        let mut scene = scene();
        scene.frame(0.0, 0.016, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(scene.explode(), 1.0);
        scene.frame(0.016, 0.016, Vec3::new(0.0, 30.0, 0.0));
        assert_eq!(scene.explode(), 0.0);
    }

    #[test]
    fn test_wishes_expire_during_frames() {
        let mut scene = scene();
        scene.make_wish(1.0);
        scene.frame(2.0, 0.016, Vec3::Z * 20.0);
        assert_eq!(scene.wishes().len(), 1);
        scene.frame(4.6, 0.016, Vec3::Z * 20.0);
        assert!(scene.wishes().is_empty());
        assert!(scene.batch(Group::Wishes).is_empty());
    }

    #[test]
    fn test_mode_switch_changes_targets_not_positions() {
        let mut scene = scene();
        scene.frame(0.0, 0.016, Vec3::Z * 30.0);
        let before = scene.animator().current_positions().to_vec();
        scene.cycle_mode();
        assert_eq!(scene.mode(), Mode::TextShape);
        assert_eq!(scene.animator().current_positions(), &before[..]);
    }
}

//! Decorative sub-scenes layered on the tree: the spiral ribbon with its
//! blinking lights, and the topper star. Both fade and disperse with the same
//! explode factor as the particle field.

use std::f32::consts::TAU;

use glam::{Quat, Vec3, Vec4};

use crate::animator::Mode;
use crate::batch::{Instance, Transform, TransformBatch};

pub const RIBBON_SAMPLES: usize = 240;
pub const RIBBON_TURNS: f32 = 5.0;
pub const RIBBON_THICKNESS: f32 = 0.035;
pub const RIBBON_LIGHTS: usize = 48;

const LIGHT_SCALE: f32 = 0.07;
const LIGHT_SCATTER: f32 = 2.0;
const TOPPER_SCALE: f32 = 0.45;
const TOPPER_SPIN: f32 = 0.8;
/// Golden angle keeps neighbouring light phases far apart.
const PHASE_STEP: f32 = 2.399_963;

const LIGHT_COLORS: [[f32; 3]; 3] = [[1.0, 0.92, 0.75], [1.0, 0.75, 0.25], [1.0, 0.25, 0.2]];

/// What the ornaments read from the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentFrame {
    pub mode: Mode,
    pub elapsed: f32,
    pub explode: f32,
    /// Smoothing fraction for this frame, shared with the particle animator.
    pub alpha: f32,
    /// Current spin of the tree about +Y, radians.
    pub tree_angle: f32,
}

/// Ornaments are only shown on the tree, fading out as it explodes.
pub fn visibility_target(mode: Mode, explode: f32) -> f32 {
    match mode {
        Mode::TreeShape => 1.0 - explode,
        Mode::Scattered | Mode::TextShape => 0.0,
    }
}

/// Smoothed visibility in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Visibility(f32);

impl Visibility {
    pub fn value(self) -> f32 {
        self.0
    }

    pub fn step(&mut self, frame: &OrnamentFrame) -> f32 {
        let target = visibility_target(frame.mode, frame.explode);
        self.0 += (target - self.0) * frame.alpha;
        self.0 = self.0.clamp(0.0, 1.0);
        self.0
    }
}

/// Point on the ribbon for `t` in [0, 1], bottom to top.
///
/// A helix wrapped around the tree cone with two sine perturbations on top.
pub fn ribbon_point(t: f32, height: f32, radius: f32) -> Vec3 {
    let angle = t * RIBBON_TURNS * TAU;
    let wobble = (angle * 3.0).sin() * 0.08 + (angle * 7.0).sin() * 0.03;
    let r = radius * (1.0 - t) * 1.05 + 0.08 + wobble;
    let y = -height * 0.5 + t * height * 0.96 + (t * TAU * 4.0).sin() * 0.1;
    Vec3::new(r * angle.cos(), y, r * angle.sin())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonLight {
    pub position: Vec3,
    pub phase: f32,
    pub color: Vec3,
}

impl RibbonLight {
    pub fn blink(&self, time: f32) -> f32 {
        0.35 + 0.65 * (0.5 + 0.5 * (time * 3.0 + self.phase).sin())
    }
}

#[derive(Debug, Clone)]
pub struct Ribbon {
    path: Vec<Vec3>,
    lights: Vec<RibbonLight>,
    visibility: Visibility,
    tube_batch: TransformBatch,
    light_batch: TransformBatch,
}

impl Ribbon {
    pub fn new(height: f32, radius: f32) -> Self {
        let path = (0..RIBBON_SAMPLES)
            .map(|i| ribbon_point(i as f32 / (RIBBON_SAMPLES - 1) as f32, height, radius))
            .collect();
        let lights = (0..RIBBON_LIGHTS)
            .map(|i| RibbonLight {
                position: ribbon_point((i as f32 + 0.5) / RIBBON_LIGHTS as f32, height, radius),
                phase: i as f32 * PHASE_STEP,
                color: Vec3::from(LIGHT_COLORS[i % LIGHT_COLORS.len()]),
            })
            .collect();

        Self {
            path,
            lights,
            visibility: Visibility::default(),
            tube_batch: TransformBatch::with_len(1),
            light_batch: TransformBatch::with_len(RIBBON_LIGHTS),
        }
    }

    /// Curve samples for building the tube mesh.
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    pub fn lights(&self) -> &[RibbonLight] {
        &self.lights
    }

    pub fn visibility(&self) -> f32 {
        self.visibility.value()
    }

    pub fn tube_batch(&self) -> &TransformBatch {
        &self.tube_batch
    }

    pub fn tube_batch_mut(&mut self) -> &mut TransformBatch {
        &mut self.tube_batch
    }

    pub fn light_batch(&self) -> &TransformBatch {
        &self.light_batch
    }

    pub fn light_batch_mut(&mut self) -> &mut TransformBatch {
        &mut self.light_batch
    }

    pub fn update(&mut self, frame: &OrnamentFrame) {
        let visibility = self.visibility.step(frame);
        let spin = Quat::from_rotation_y(frame.tree_angle);

        self.tube_batch.set(
            0,
            Instance {
                transform: Transform {
                    position: Vec3::ZERO,
                    rotation: Vec3::new(0.0, frame.tree_angle, 0.0),
                    scale: visibility,
                },
                color: Vec4::new(1.0, 0.82, 0.45, visibility),
            },
        );
        self.tube_batch.mark_dirty();

        for (slot, light) in self.lights.iter().enumerate() {
            let radial = Vec3::new(light.position.x, 0.0, light.position.z).normalize_or_zero();
            let position = spin * (light.position + radial * frame.explode * LIGHT_SCATTER);
            let blink = light.blink(frame.elapsed);
            self.light_batch.set(
                slot,
                Instance {
                    transform: Transform {
                        position,
                        rotation: Vec3::ZERO,
                        scale: LIGHT_SCALE * blink * visibility,
                    },
                    color: (light.color * blink).extend(1.0),
                },
            );
        }
        self.light_batch.mark_dirty();
    }
}

/// Emissive star at the tip of the tree.
#[derive(Debug, Clone)]
pub struct Topper {
    position: Vec3,
    visibility: Visibility,
    batch: TransformBatch,
}

impl Topper {
    pub fn new(tree_height: f32) -> Self {
        Self {
            position: Vec3::new(0.0, tree_height * 0.5 + 0.25, 0.0),
            visibility: Visibility::default(),
            batch: TransformBatch::with_len(1),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn visibility(&self) -> f32 {
        self.visibility.value()
    }

    pub fn batch(&self) -> &TransformBatch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut TransformBatch {
        &mut self.batch
    }

    pub fn update(&mut self, frame: &OrnamentFrame) {
        let visibility = self.visibility.step(frame);
        let pulse = 1.0 + 0.08 * (frame.elapsed * 2.0).sin();
        self.batch.set(
            0,
            Instance {
                transform: Transform {
                    position: self.position,
                    rotation: Vec3::new(0.0, frame.elapsed * TOPPER_SPIN, 0.0),
                    scale: TOPPER_SCALE * visibility * pulse,
                },
                color: (Vec3::new(1.0, 0.9, 0.5) * pulse).extend(1.0),
            },
        );
        self.batch.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(mode: Mode, explode: f32) -> OrnamentFrame {
        OrnamentFrame {
            mode,
            elapsed: 1.0,
            explode,
            alpha: 0.04,
            tree_angle: 0.0,
        }
    }

    #[test]
    fn test_ribbon_climbs_and_narrows() {
        let bottom = ribbon_point(0.0, 9.0, 3.4);
        let top = ribbon_point(1.0, 9.0, 3.4);
        assert!(bottom.y < top.y);
        let radial = |p: Vec3| Vec3::new(p.x, 0.0, p.z).length();
        assert!(radial(bottom) > radial(top));
        assert!(radial(top) < 0.3);
    }

    #[test]
    fn test_ribbon_sampled_once_with_fixed_lights() {
        let ribbon = Ribbon::new(9.0, 3.4);
        assert_eq!(ribbon.path().len(), RIBBON_SAMPLES);
        assert_eq!(ribbon.lights().len(), RIBBON_LIGHTS);
        assert_eq!(ribbon.light_batch().len(), RIBBON_LIGHTS);
    }

    #[test]
    fn test_light_phases_differ() {
        let ribbon = Ribbon::new(9.0, 3.4);
        let lights = ribbon.lights();
        let a = lights[0].blink(0.5);
        let b = lights[1].blink(0.5);
        assert!((a - b).abs() > 1e-3);
        for light in lights {
            let blink = light.blink(2.0);
            assert!((0.35..=1.0 + 1e-6).contains(&blink));
        }
    }

    #[test]
    fn test_visibility_follows_mode_and_explode() {
        assert_eq!(visibility_target(Mode::TreeShape, 0.0), 1.0);
        assert_eq!(visibility_target(Mode::TreeShape, 1.0), 0.0);
        assert_eq!(visibility_target(Mode::TextShape, 0.0), 0.0);
        assert_eq!(visibility_target(Mode::Scattered, 0.0), 0.0);

        let mut ribbon = Ribbon::new(9.0, 3.4);
        for _ in 0..400 {
            ribbon.update(&frame(Mode::TreeShape, 0.0));
        }
        assert!(ribbon.visibility() > 0.99);

        for _ in 0..400 {
            ribbon.update(&frame(Mode::TextShape, 0.0));
        }
        assert!(ribbon.visibility() < 0.01);
        assert!(ribbon
            .light_batch()
            .instances()
            .iter()
            .all(|i| i.transform.scale < LIGHT_SCALE * 0.01));
    }

    #[test]
    fn test_lights_drift_outward_with_explode() {
        let mut calm = Ribbon::new(9.0, 3.4);
        let mut exploded = Ribbon::new(9.0, 3.4);
        calm.update(&frame(Mode::TreeShape, 0.0));
        exploded.update(&frame(Mode::TreeShape, 1.0));
        let radial = |i: &Instance| Vec3::new(i.transform.position.x, 0.0, i.transform.position.z).length();
        for (a, b) in calm.light_batch().instances().iter().zip(exploded.light_batch().instances()) {
            assert!(radial(b) > radial(a));
        }
    }

    #[test]
    fn test_topper_stays_put_and_fades() {
        let mut topper = Topper::new(9.0);
        let start = topper.position();
        for _ in 0..400 {
            topper.update(&frame(Mode::TreeShape, 0.0));
        }
        assert!(topper.visibility() > 0.99);
        assert_eq!(topper.batch().get(0).unwrap().transform.position, start);

        for _ in 0..400 {
            topper.update(&frame(Mode::TreeShape, 1.0));
        }
        assert!(topper.visibility() < 0.01);
        assert_eq!(topper.batch().get(0).unwrap().transform.position, start);
    }

    #[test]
    fn test_topper_pulse_leaves_alpha_opaque() {
        let mut topper = Topper::new(9.0);
        for elapsed in [0.0, 0.4, 0.785, 2.0, 3.9] {
            topper.update(&OrnamentFrame {
                elapsed,
                ..frame(Mode::TreeShape, 0.0)
            });
            let color = topper.batch().get(0).unwrap().color;
            assert_eq!(color.w, 1.0);
            assert!(color.x > 0.9 && color.x < 1.1);
        }
    }
}

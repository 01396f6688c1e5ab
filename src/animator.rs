//! Per-frame morph animator.
//!
//! Every frame each particle's current position is low-pass filtered toward a
//! target chosen by the active [`Mode`], blended toward its scattered layout by
//! the camera-driven explode factor, and written into its kind's batch slot.
//! Current positions live in an arena indexed by particle id, so nothing is
//! ever read back from the GPU.

use glam::{Quat, Vec3};

use crate::batch::{Instance, Transform, TransformBatch};
use crate::config::{SceneConfig, Smoothing};
use crate::particles::{Particle, ParticleField, ParticleKind};

const DRIFT_AMPLITUDE: f32 = 0.6;
const TEXT_RIPPLE_AMPLITUDE: f32 = 0.08;
const TEXT_SHRINK_MIN: f32 = 0.5;
/// Frame rate the per-frame damping constant was tuned at.
const REFERENCE_FPS: f32 = 60.0;

/// Which template position the particles are pulled toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Scattered,
    TreeShape,
    TextShape,
}

impl Mode {
    pub fn next(self) -> Self {
        match self {
            Mode::Scattered => Mode::TreeShape,
            Mode::TreeShape => Mode::TextShape,
            Mode::TextShape => Mode::Scattered,
        }
    }
}

/// Linear map of camera distance in [end, start] onto [1, 0], clamped.
pub fn explode_factor(distance: f32, start: f32, end: f32) -> f32 {
    ((start - distance) / (start - end)).clamp(0.0, 1.0)
}

/// Slow wandering offset, phased by the particle's own scatter coordinates.
pub fn drift(scatter: Vec3, time: f32) -> Vec3 {
    Vec3::new(
        (time * 0.7 + scatter.x).sin(),
        (time * 0.5 + scatter.y).cos(),
        (time * 0.6 + scatter.z).sin(),
    ) * DRIFT_AMPLITUDE
}

/// Mode dependent scale multiplier applied on top of the shimmer.
pub fn mode_scale(kind: ParticleKind, mode: Mode, explode: f32) -> f32 {
    match mode {
        Mode::TextShape if kind.hidden_in_text() => 0.0,
        Mode::TextShape => TEXT_SHRINK_MIN + (1.0 - TEXT_SHRINK_MIN) * explode,
        Mode::Scattered | Mode::TreeShape => 1.0,
    }
}

/// Everything the animator reads from outside for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub mode: Mode,
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    pub camera_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorSettings {
    pub damping: f32,
    pub smoothing: Smoothing,
    /// Radians per second of the tree's spin about +Y.
    pub tree_spin_speed: f32,
    pub explode_start: f32,
    pub explode_end: f32,
}

impl From<&SceneConfig> for AnimatorSettings {
    fn from(config: &SceneConfig) -> Self {
        Self {
            damping: config.damping,
            smoothing: config.smoothing,
            tree_spin_speed: config.tree_spin_speed,
            explode_start: config.explode_start,
            explode_end: config.explode_end,
        }
    }
}

impl AnimatorSettings {
    pub fn explode_factor(&self, camera_position: Vec3) -> f32 {
        explode_factor(camera_position.length(), self.explode_start, self.explode_end)
    }

    /// Fraction of the remaining distance covered this frame.
    pub fn smoothing_alpha(&self, dt: f32) -> f32 {
        match self.smoothing {
            Smoothing::PerFrame => self.damping,
            Smoothing::FrameRateIndependent => {
                1.0 - (1.0 - self.damping).powf(dt.max(0.0) * REFERENCE_FPS)
            }
        }
    }

    /// Target before the explode blend.
    pub fn nominal_target(&self, particle: &Particle, mode: Mode, time: f32) -> Vec3 {
        match mode {
            Mode::Scattered => particle.scatter_position,
            Mode::TreeShape => {
                Quat::from_rotation_y(time * self.tree_spin_speed) * particle.tree_position
            }
            Mode::TextShape => {
                let p = particle.text_position;
                let ripple = (time * 2.0 + p.x * 0.5).sin() * TEXT_RIPPLE_AMPLITUDE;
                p + Vec3::Y * ripple
            }
        }
    }

    /// Final target for a frame: nominal target pulled toward the scattered layout by `explode`.
    pub fn target(&self, particle: &Particle, mode: Mode, time: f32, explode: f32) -> Vec3 {
        let nominal = self.nominal_target(particle, mode, time);
        nominal.lerp(particle.scatter_position, explode) + drift(particle.scatter_position, time) * explode
    }
}

#[derive(Debug, Clone)]
pub struct MorphAnimator {
    settings: AnimatorSettings,
    current: Vec<Vec3>,
    batches: [TransformBatch; 4],
}

impl MorphAnimator {
    /// Particles start at their scattered positions.
    pub fn new(field: &ParticleField, settings: AnimatorSettings) -> Self {
        let current = field.particles().iter().map(|p| p.scatter_position).collect();
        let batches = ParticleKind::ALL.map(|kind| TransformBatch::with_len(field.partition(kind).len()));
        Self {
            settings,
            current,
            batches,
        }
    }

    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    pub fn current_positions(&self) -> &[Vec3] {
        &self.current
    }

    pub fn batch(&self, kind: ParticleKind) -> &TransformBatch {
        &self.batches[kind.index()]
    }

    pub fn batch_mut(&mut self, kind: ParticleKind) -> &mut TransformBatch {
        &mut self.batches[kind.index()]
    }

    /// Advance every particle by one frame. Returns the explode factor that was used.
    pub fn update(&mut self, field: &ParticleField, input: &FrameInput) -> f32 {
        let settings = self.settings;
        let explode = settings.explode_factor(input.camera_position);
        let alpha = settings.smoothing_alpha(input.dt);
        let time = input.elapsed;
        let particles = field.particles();

        for kind in ParticleKind::ALL {
            let archetype = kind.archetype();
            let mode_multiplier = mode_scale(kind, input.mode, explode);
            let batch = &mut self.batches[kind.index()];

            for (slot, &index) in field.partition(kind).iter().enumerate() {
                let index = index as usize;
                let particle = &particles[index];

                let target = settings.target(particle, input.mode, time, explode);
                let current = &mut self.current[index];
                *current += (target - *current) * alpha;

                let spin = Vec3::new(0.4, 0.6, 0.2) * time * (0.5 + particle.speed_offset);
                let scale = particle.base_scale
                    * archetype.shimmer(time, particle.speed_offset)
                    * mode_multiplier;

                batch.set(
                    slot,
                    Instance {
                        transform: Transform {
                            position: *current,
                            rotation: particle.rotation + spin,
                            scale,
                        },
                        color: particle.color.extend(1.0),
                    },
                );
            }
            batch.mark_dirty();
        }

        log::trace!("animator frame t={:.3} explode={:.3} alpha={:.4}", time, explode, alpha);
        explode
    }
}

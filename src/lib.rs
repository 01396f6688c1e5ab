//! Morphing particle tree: a field of particles that glides between a
//! scattered cloud, a spinning tree and a line of text, with ribbon, topper
//! and wish-flight ornaments, rendered through wgpu.

pub mod animator;
pub mod batch;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod mesh;
pub mod ornaments;
pub mod particles;
pub mod renderer;
pub mod scene;
pub mod text;
pub mod types;
pub mod wish;

pub use animator::{explode_factor, FrameInput, Mode, MorphAnimator};
pub use config::SceneConfig;
pub use error::{SceneError, SceneResult};
pub use particles::{Particle, ParticleField, ParticleKind};
pub use scene::{Group, Scene};
pub use wish::{Wish, WishId, WishQueue};

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Scripted camera: orbits the tree while slowly dollying in and out,
/// sweeping through the explode range without any input.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    config: CameraConfig,
    pub fov_y: f32,
    pub aspect: f32,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, aspect: f32) -> Self {
        Self {
            config,
            fov_y: 50f32.to_radians(),
            aspect,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn distance(&self, time: f32) -> f32 {
        let phase = (time / self.config.dolly_period * TAU).cos();
        // starts far away, reaches min_distance half a period in
        let mid = (self.config.min_distance + self.config.max_distance) * 0.5;
        let half_span = (self.config.max_distance - self.config.min_distance) * 0.5;
        mid + half_span * phase
    }

    pub fn position(&self, time: f32) -> Vec3 {
        let distance = self.distance(time);
        let azimuth = time * self.config.orbit_speed;
        let height = self.config.height.clamp(-distance, distance);
        let horizontal = (distance * distance - height * height).max(0.0).sqrt();
        Vec3::new(horizontal * azimuth.sin(), height, horizontal * azimuth.cos())
    }

    pub fn view_proj(&self, time: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, 0.1, 200.0);
        let view = Mat4::look_at_rh(self.position(time), Vec3::ZERO, Vec3::Y);
        projection * view
    }
}

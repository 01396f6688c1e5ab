use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};

use crate::types::InstanceRaw;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub scale: f32,
}

impl Transform {
    pub const HIDDEN: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: 0.0,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position,
        )
    }
}

/// One drawable instance: where it is and what color it glows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub transform: Transform,
    pub color: Vec4,
}

impl Instance {
    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.transform.matrix().to_cols_array_2d(),
            color: self.color.to_array(),
        }
    }
}

/// Slot-addressed instance buffer for one visual group.
///
/// Writers fill the slots for a frame and then call `mark_dirty`; the renderer
/// only re-uploads batches it finds dirty.
#[derive(Debug, Clone, Default)]
pub struct TransformBatch {
    instances: Vec<Instance>,
    dirty: bool,
}

impl TransformBatch {
    pub fn with_len(len: usize) -> Self {
        Self {
            instances: vec![
                Instance {
                    transform: Transform::HIDDEN,
                    color: Vec4::ZERO,
                };
                len
            ],
            dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn set(&mut self, slot: usize, instance: Instance) {
        self.instances[slot] = instance;
    }

    pub fn get(&self, slot: usize) -> Option<&Instance> {
        self.instances.get(slot)
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Empty the batch. Used by groups whose population changes between frames.
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Raw instances for upload, clearing the dirty flag. `None` when nothing changed.
    pub fn take_dirty(&mut self) -> Option<Vec<InstanceRaw>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.instances.iter().map(Instance::to_raw).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_places_translation_and_scale() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::ZERO,
            scale: 2.0,
        };
        let m = transform.matrix();
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.transform_point3(Vec3::X), Vec3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn test_take_dirty_clears_flag() {
        let mut batch = TransformBatch::with_len(3);
        assert!(batch.take_dirty().is_some());
        assert!(batch.take_dirty().is_none());

        batch.set(
            1,
            Instance {
                transform: Transform { position: Vec3::Y, rotation: Vec3::ZERO, scale: 1.0 },
                color: Vec4::ONE,
            },
        );
        assert!(!batch.is_dirty());
        batch.mark_dirty();
        let raw = batch.take_dirty().unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1].model[3][1], 1.0);
        assert_eq!(raw[0].model[0][0], 0.0);
    }
}

//! Wish flights: a small spark cluster that arcs from the viewer to the top of
//! the tree along a fixed quadratic Bezier curve.

use std::f32::consts::TAU;

use glam::{Vec3, Vec4};

use crate::batch::{Instance, Transform, TransformBatch};

/// Seconds from launch to arrival.
pub const FLIGHT_DURATION: f32 = 3.0;
/// Seconds a wish is kept alive by the queue.
pub const WISH_LIFETIME: f32 = 3.5;
/// Fraction of the flight spent fading in and, separately, fading out.
pub const ENVELOPE_EDGE: f32 = 0.1;

pub const FLIGHT_START: Vec3 = Vec3::new(0.0, -3.0, 8.0);
pub const FLIGHT_CONTROL: Vec3 = Vec3::new(4.5, 3.0, 5.0);
pub const FLIGHT_END: Vec3 = Vec3::new(0.0, 4.8, 0.0);

const SPARK_SCALE: f32 = 0.06;
const CLUSTER_RADIUS: f32 = 0.25;
const SPARK_COLOR: Vec4 = Vec4::new(1.0, 0.85, 0.55, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WishId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wish {
    pub id: WishId,
    /// Scene time of submission, seconds.
    pub start_time: f32,
}

/// Normalized flight progress, clamped to [0, 1] for any `now`.
pub fn progress(wish: &Wish, now: f32) -> f32 {
    ((now - wish.start_time) / FLIGHT_DURATION).clamp(0.0, 1.0)
}

pub fn bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

pub fn flight_position(progress: f32) -> Vec3 {
    bezier(FLIGHT_START, FLIGHT_CONTROL, FLIGHT_END, progress)
}

/// Ramp up over the first edge, hold at 1, ramp down over the last edge.
pub fn envelope(progress: f32) -> f32 {
    if progress < ENVELOPE_EDGE {
        progress / ENVELOPE_EDGE
    } else if progress > 1.0 - ENVELOPE_EDGE {
        (1.0 - progress) / ENVELOPE_EDGE
    } else {
        1.0
    }
    .clamp(0.0, 1.0)
}

/// Owns wish lifecycle: creation on submit, removal once `WISH_LIFETIME` has passed.
#[derive(Debug, Clone, Default)]
pub struct WishQueue {
    wishes: Vec<Wish>,
    next_id: u64,
}

impl WishQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, now: f32) -> WishId {
        let id = WishId(self.next_id);
        self.next_id += 1;
        self.wishes.push(Wish { id, start_time: now });
        log::info!("🌟 Wish {} launched at t={:.2}s", id.0, now);
        id
    }

    /// Drop wishes whose lifetime is over. Returns how many were removed.
    pub fn prune(&mut self, now: f32) -> usize {
        let before = self.wishes.len();
        self.wishes.retain(|wish| now - wish.start_time < WISH_LIFETIME);
        let removed = before - self.wishes.len();
        if removed > 0 {
            log::debug!("Removed {} finished wishes, {} still flying", removed, self.wishes.len());
        }
        removed
    }

    pub fn wishes(&self) -> &[Wish] {
        &self.wishes
    }

    pub fn len(&self) -> usize {
        self.wishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wishes.is_empty()
    }
}

/// Renders whatever wishes it is given into a single batch of sparks.
#[derive(Debug, Clone)]
pub struct WishFlight {
    /// Unit offsets of the sparks around the cluster head.
    offsets: Vec<Vec3>,
    batch: TransformBatch,
}

impl WishFlight {
    pub fn new(sparks: usize) -> Self {
        // fixed fibonacci-sphere layout so every wish looks the same
        let offsets = (0..sparks)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / sparks as f32;
                let ring = (1.0 - y * y).max(0.0).sqrt();
                let angle = i as f32 * 2.399_963;
                Vec3::new(ring * angle.cos(), y, ring * angle.sin())
            })
            .collect();
        Self {
            offsets,
            batch: TransformBatch::default(),
        }
    }

    pub fn batch(&self) -> &TransformBatch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut TransformBatch {
        &mut self.batch
    }

    pub fn update(&mut self, wishes: &[Wish], now: f32) {
        self.batch.clear();
        for wish in wishes {
            let t = progress(wish, now);
            let head = flight_position(t);
            let size = envelope(t);
            let swirl = (now - wish.start_time) * TAU * 0.5;
            let (sin, cos) = swirl.sin_cos();

            for (i, offset) in self.offsets.iter().enumerate() {
                let spun = Vec3::new(offset.x * cos - offset.z * sin, offset.y, offset.x * sin + offset.z * cos);
                let twinkle = 0.7 + 0.3 * (now * 9.0 + i as f32).sin();
                self.batch.push(Instance {
                    transform: Transform {
                        position: head + spun * CLUSTER_RADIUS * (0.6 + 0.4 * size),
                        rotation: Vec3::new(swirl, swirl * 0.5, 0.0),
                        scale: SPARK_SCALE * size * twinkle,
                    },
                    color: SPARK_COLOR,
                });
            }
        }
        self.batch.mark_dirty();
    }
}

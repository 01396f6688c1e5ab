use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::config::{PaletteEntry, SceneConfig};

/// Exponent (< 1) on the sampled depth fraction, pushing tree particles toward the base.
const TREE_DEPTH_EXPONENT: f32 = 0.8;
/// Fractional radial jitter around the tree cone surface.
const TREE_RADIAL_JITTER: f32 = 0.15;

/// Visual archetype of a particle. The set is closed; every kind has one `Archetype` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Shard,
    Dust,
    GlassFlake,
    BlueOrnament,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 4] = [
        ParticleKind::Shard,
        ParticleKind::Dust,
        ParticleKind::GlassFlake,
        ParticleKind::BlueOrnament,
    ];

    pub const fn index(self) -> usize {
        match self {
            ParticleKind::Shard => 0,
            ParticleKind::Dust => 1,
            ParticleKind::GlassFlake => 2,
            ParticleKind::BlueOrnament => 3,
        }
    }

    /// Pick a kind from a draw in [0, 1) against cumulative thresholds.
    pub fn from_cumulative(roll: f32, thresholds: &[f32; 4]) -> Self {
        for (kind, threshold) in Self::ALL.into_iter().zip(thresholds) {
            if roll < *threshold {
                return kind;
            }
        }
        ParticleKind::BlueOrnament
    }

    pub fn archetype(self) -> &'static Archetype {
        &ARCHETYPES[self.index()]
    }

    /// Kinds that disappear while the text is shown.
    pub const fn hidden_in_text(self) -> bool {
        matches!(self, ParticleKind::GlassFlake | ParticleKind::BlueOrnament)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSource {
    /// Weighted draw from the configured palette.
    Palette,
    /// Fixed color with a small random brightness variation.
    Fixed([f32; 3]),
}

/// Per-kind constants: size, color and shimmer behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub scale_min: f32,
    pub scale_max: f32,
    pub color: ColorSource,
    /// Shimmer = base + amplitude * sin(time * frequency + phase)
    pub shimmer_base: f32,
    pub shimmer_amplitude: f32,
    pub shimmer_frequency: f32,
}

impl Archetype {
    pub fn shimmer(&self, time: f32, speed_offset: f32) -> f32 {
        self.shimmer_base
            + self.shimmer_amplitude * (time * self.shimmer_frequency + speed_offset * TAU).sin()
    }
}

static ARCHETYPES: [Archetype; 4] = [
    // Shard
    Archetype {
        scale_min: 0.05,
        scale_max: 0.11,
        color: ColorSource::Palette,
        shimmer_base: 0.85,
        shimmer_amplitude: 0.15,
        shimmer_frequency: 2.5,
    },
    // Dust
    Archetype {
        scale_min: 0.015,
        scale_max: 0.04,
        color: ColorSource::Palette,
        shimmer_base: 0.6,
        shimmer_amplitude: 0.4,
        shimmer_frequency: 5.0,
    },
    // GlassFlake
    Archetype {
        scale_min: 0.06,
        scale_max: 0.12,
        color: ColorSource::Fixed([0.80, 0.92, 1.0]),
        shimmer_base: 0.8,
        shimmer_amplitude: 0.2,
        shimmer_frequency: 1.7,
    },
    // BlueOrnament
    Archetype {
        scale_min: 0.10,
        scale_max: 0.17,
        color: ColorSource::Fixed([0.12, 0.32, 0.95]),
        shimmer_base: 1.0,
        shimmer_amplitude: 0.06,
        shimmer_frequency: 1.2,
    },
];

/// Immutable particle template, created once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub scatter_position: Vec3,
    pub tree_position: Vec3,
    pub text_position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub base_scale: f32,
    pub color: Vec3,
    /// In [0, 1); desynchronizes time-driven effects between particles.
    pub speed_offset: f32,
    pub kind: ParticleKind,
}

/// All particle templates plus, per kind, the indices of its members.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    partitions: [Vec<u32>; 4],
}

impl ParticleField {
    /// Generate `config.particle_count` templates.
    ///
    /// Particle `i` takes `text_points[i]` as its text position. Particles beyond the end of
    /// `text_points` get the origin, the same fallback the rasterizer uses for a blank mask.
    pub fn generate<R: Rng>(config: &SceneConfig, text_points: &[Vec3], rng: &mut R) -> Self {
        let count = config.particle_count;
        if text_points.len() < count {
            log::warn!(
                "Only {} text points for {} particles, the rest take their text position at the origin",
                text_points.len(),
                count
            );
        }

        let mut particles = Vec::with_capacity(count);
        let mut partitions: [Vec<u32>; 4] = Default::default();

        for i in 0..count {
            let kind = ParticleKind::from_cumulative(rng.gen::<f32>(), &config.type_thresholds);
            let archetype = kind.archetype();

            let color = match archetype.color {
                ColorSource::Palette => pick_weighted(&config.palette, rng),
                ColorSource::Fixed(rgb) => Vec3::from(rgb) * rng.gen_range(0.85..=1.0),
            };

            let particle = Particle {
                scatter_position: sample_scatter(config.scatter_radius, rng),
                tree_position: sample_tree(config.tree_height, config.tree_radius, rng),
                text_position: text_points.get(i).copied().unwrap_or(Vec3::ZERO),
                rotation: Vec3::new(rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU)),
                base_scale: rng.gen_range(archetype.scale_min..archetype.scale_max),
                color,
                speed_offset: rng.gen::<f32>(),
                kind,
            };

            partitions[kind.index()].push(i as u32);
            particles.push(particle);
        }

        log::info!(
            "🎄 Generated {} particles (shard {}, dust {}, flake {}, ornament {})",
            particles.len(),
            partitions[0].len(),
            partitions[1].len(),
            partitions[2].len(),
            partitions[3].len(),
        );

        Self { particles, partitions }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn partition(&self, kind: ParticleKind) -> &[u32] {
        &self.partitions[kind.index()]
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Uniform point inside a sphere of `radius`.
pub fn sample_scatter<R: Rng>(radius: f32, rng: &mut R) -> Vec3 {
    let azimuth = rng.gen_range(0.0..TAU);
    let inclination = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = radius * rng.gen::<f32>().cbrt();
    Vec3::new(
        r * inclination.sin() * azimuth.cos(),
        r * inclination.cos(),
        r * inclination.sin() * azimuth.sin(),
    )
}

/// Point on a jittered cone of `height` and base `radius`, centered vertically on the origin.
pub fn sample_tree<R: Rng>(height: f32, radius: f32, rng: &mut R) -> Vec3 {
    // depth is the fraction of the way down from the tip
    let depth = rng.gen::<f32>().powf(TREE_DEPTH_EXPONENT);
    let y = (1.0 - depth) * height - height * 0.5;
    let cone_radius = depth * radius;
    let r = cone_radius * (1.0 + rng.gen_range(-TREE_RADIAL_JITTER..=TREE_RADIAL_JITTER));
    let azimuth = rng.gen_range(0.0..TAU);
    Vec3::new(r * azimuth.cos(), y, r * azimuth.sin())
}

fn pick_weighted<R: Rng>(palette: &[PaletteEntry], rng: &mut R) -> Vec3 {
    let total: f32 = palette.iter().map(|entry| entry.weight).sum();
    let mut roll = rng.gen::<f32>() * total;
    for entry in palette {
        if roll < entry.weight {
            return Vec3::from(entry.color);
        }
        roll -= entry.weight;
    }
    palette.last().map(|entry| Vec3::from(entry.color)).unwrap_or(Vec3::ONE)
}

use std::path::Path;

use serde::Deserialize;

use crate::error::{SceneError, SceneResult};

/// How the per-frame damping constant is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// `damping` is applied once per rendered frame, so the morph speed follows the frame rate.
    PerFrame,
    /// `damping` is treated as the per-frame value at 60 fps and rescaled by real frame time.
    FrameRateIndependent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaletteEntry {
    pub color: [f32; 3],
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians per second around the vertical axis.
    pub orbit_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Seconds for one full dolly in and out.
    pub dolly_period: f32,
    pub height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_speed: 0.12,
            min_distance: 3.0,
            max_distance: 22.0,
            dolly_period: 40.0,
            height: 1.5,
        }
    }
}

/// Scene parameters. Every field has a default, so a TOML file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub particle_count: usize,
    pub tree_height: f32,
    pub tree_radius: f32,
    pub scatter_radius: f32,
    pub text: String,
    /// Camera distance at which the explode blend starts (factor 0).
    pub explode_start: f32,
    /// Camera distance at which the explode blend is complete (factor 1).
    pub explode_end: f32,
    pub damping: f32,
    pub smoothing: Smoothing,
    pub tree_spin_speed: f32,
    /// Cumulative probabilities for Shard, Dust, GlassFlake, BlueOrnament.
    pub type_thresholds: [f32; 4],
    pub palette: Vec<PaletteEntry>,
    pub wish_sparks: usize,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            particle_count: 4000,
            tree_height: 9.0,
            tree_radius: 3.4,
            scatter_radius: 14.0,
            text: "MERRY\nCHRISTMAS".to_string(),
            explode_start: 18.0,
            explode_end: 4.0,
            damping: 0.04,
            smoothing: Smoothing::PerFrame,
            tree_spin_speed: 0.15,
            type_thresholds: [0.55, 0.90, 0.95, 1.0],
            palette: vec![
                PaletteEntry { color: [1.0, 0.78, 0.30], weight: 0.40 },
                PaletteEntry { color: [0.95, 0.88, 0.70], weight: 0.25 },
                PaletteEntry { color: [0.10, 0.55, 0.30], weight: 0.20 },
                PaletteEntry { color: [0.85, 0.12, 0.15], weight: 0.10 },
                PaletteEntry { color: [1.0, 1.0, 1.0], weight: 0.05 },
            ],
            wish_sparks: 18,
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Load a TOML config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> SceneResult<Self> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SceneResult<()> {
        let invalid = |msg: String| Err(SceneError::InvalidConfig(msg));

        if self.particle_count == 0 {
            return invalid("particle_count must be positive".into());
        }

        let camera = &self.camera;
        let scalars = [
            ("tree_height", self.tree_height),
            ("tree_radius", self.tree_radius),
            ("scatter_radius", self.scatter_radius),
            ("explode_start", self.explode_start),
            ("explode_end", self.explode_end),
            ("damping", self.damping),
            ("tree_spin_speed", self.tree_spin_speed),
            ("camera.orbit_speed", camera.orbit_speed),
            ("camera.min_distance", camera.min_distance),
            ("camera.max_distance", camera.max_distance),
            ("camera.dolly_period", camera.dolly_period),
            ("camera.height", camera.height),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
            return invalid(format!("{} must be a finite number, got {}", name, value));
        }

        // negated comparisons so NaN never slips through
        if !(self.tree_height > 0.0 && self.tree_radius > 0.0 && self.scatter_radius > 0.0) {
            return invalid("tree and scatter dimensions must be positive".into());
        }
        if !(self.explode_start > self.explode_end) {
            return invalid(format!(
                "explode_start ({}) must be greater than explode_end ({})",
                self.explode_start, self.explode_end
            ));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return invalid(format!("damping must be in (0, 1], got {}", self.damping));
        }

        let mut previous = 0.0;
        for &threshold in &self.type_thresholds {
            if !(threshold >= previous && threshold <= 1.0) {
                return invalid(format!(
                    "type_thresholds must be ascending within [0, 1], got {:?}",
                    self.type_thresholds
                ));
            }
            previous = threshold;
        }
        if (self.type_thresholds[3] - 1.0).abs() > f32::EPSILON {
            return invalid("last type threshold must be 1.0".into());
        }

        if self.palette.is_empty() {
            return invalid("palette must not be empty".into());
        }
        if self
            .palette
            .iter()
            .any(|entry| !(entry.weight >= 0.0) || entry.color.iter().any(|c| !c.is_finite()))
            || !(self.palette.iter().map(|entry| entry.weight).sum::<f32>() > 0.0)
        {
            return invalid("palette weights must be non-negative with a positive sum".into());
        }

        if !(camera.min_distance > 0.0 && camera.max_distance >= camera.min_distance) {
            return invalid("camera distances must satisfy 0 < min_distance <= max_distance".into());
        }
        if !(camera.dolly_period > 0.0) {
            return invalid("camera dolly_period must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_only_named_fields() {
        let config = SceneConfig::from_toml(
            r#"
            particle_count = 500
            text = "HI"
            smoothing = "frame_rate_independent"

            [camera]
            orbit_speed = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.particle_count, 500);
        assert_eq!(config.text, "HI");
        assert_eq!(config.smoothing, Smoothing::FrameRateIndependent);
        assert_eq!(config.camera.orbit_speed, 0.5);
        assert_eq!(config.camera.max_distance, CameraConfig::default().max_distance);
        assert_eq!(config.tree_height, SceneConfig::default().tree_height);
    }

    #[test]
    fn test_rejects_descending_thresholds() {
        let config = SceneConfig {
            type_thresholds: [0.9, 0.5, 0.95, 1.0],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_thresholds_not_ending_at_one() {
        let config = SceneConfig {
            type_thresholds: [0.5, 0.6, 0.7, 0.8],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_explode_range() {
        let config = SceneConfig {
            explode_start: 4.0,
            explode_end: 18.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_weight_palette() {
        let config = SceneConfig {
            palette: vec![PaletteEntry { color: [1.0, 1.0, 1.0], weight: 0.0 }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_explode_start() {
        let result = SceneConfig::from_toml("explode_start = nan");
        assert!(matches!(result, Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_finite_dimensions() {
        for text in ["tree_height = nan", "scatter_radius = inf", "damping = nan", "tree_spin_speed = -inf"] {
            let result = SceneConfig::from_toml(text);
            assert!(matches!(result, Err(SceneError::InvalidConfig(_))), "accepted {}", text);
        }
    }

    #[test]
    fn test_rejects_nan_threshold_and_palette_weight() {
        let config = SceneConfig {
            type_thresholds: [0.5, f32::NAN, 0.95, 1.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SceneConfig {
            palette: vec![PaletteEntry { color: [1.0, 1.0, 1.0], weight: f32::NAN }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = SceneConfig::from_toml("particle_count = \"lots\"");
        assert!(matches!(result, Err(SceneError::ConfigParse(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = SceneConfig::load("/definitely/not/here/morph-tree.toml");
        assert!(matches!(result, Err(SceneError::ConfigRead { .. })));
    }
}

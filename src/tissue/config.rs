//! Tissue configuration and its RON file format.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::simulation::error::SimulationError;
use crate::simulation::physics_config::PhysicsConfig;

/// Everything needed to build a [`Tissue`](crate::tissue::Tissue).
///
/// Missing fields fall back to [`Default`], so a file only needs the values
/// it changes:
///
/// ```text
/// (
///     dimension: 2,
///     max_generations: 6,
///     morphogens: ["bmp"],
///     physics: (drag: 0.5),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TissueConfig {
    /// Spatial dimension, 2 or 3
    pub dimension: usize,

    /// Fixed particle capacity
    pub max_particles: usize,

    /// Steps between division rounds
    pub division_period_steps: u64,

    /// Number of division rounds before the tissue settles
    pub max_generations: u32,

    /// Target radius multiplier applied to parent and child on division.
    /// `None` selects the volume-preserving factor `2^(-1/dimension)`.
    pub shrink_factor: Option<f32>,

    /// Half-width of the uniform offset given to each child
    pub division_jitter: f32,

    /// Scalar fields registered at construction, in order
    pub morphogens: Vec<String>,

    pub physics: PhysicsConfig,
}

impl Default for TissueConfig {
    fn default() -> Self {
        Self {
            dimension: 3,
            max_particles: 4096,
            division_period_steps: 100,
            max_generations: 8,
            shrink_factor: None,
            division_jitter: 0.001,
            morphogens: Vec::new(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl TissueConfig {
    /// Effective shrink factor for this dimension.
    pub fn shrink_factor(&self) -> f32 {
        self.shrink_factor
            .unwrap_or_else(|| 2f32.powf(-1.0 / self.dimension.max(1) as f32))
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(2..=3).contains(&self.dimension) {
            return Err(SimulationError::InvalidConfig(format!(
                "dimension must be 2 or 3, got {}",
                self.dimension
            )));
        }
        if self.max_particles == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_particles must be positive".into(),
            ));
        }
        if self.division_period_steps == 0 {
            return Err(SimulationError::InvalidConfig(
                "division_period_steps must be positive".into(),
            ));
        }
        let shrink = self.shrink_factor();
        if !(shrink > 0.0 && shrink <= 1.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "shrink_factor must be within (0, 1], got {shrink}"
            )));
        }
        if !self.division_jitter.is_finite() || self.division_jitter < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "division_jitter must be finite and not negative".into(),
            ));
        }
        self.physics.validate()
    }

    /// Parse and validate a RON document.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

/// Error type for configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("RON serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shrink_factor_preserves_volume() {
        let config = TissueConfig {
            dimension: 3,
            ..Default::default()
        };
        let s = config.shrink_factor();
        assert!((s * s * s - 0.5).abs() < 1e-6);

        let flat = TissueConfig {
            dimension: 2,
            ..Default::default()
        };
        assert!((flat.shrink_factor() - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn partial_document_uses_defaults() {
        let config = TissueConfig::from_ron_str(
            "(dimension: 2, morphogens: [\"bmp\"], physics: (drag: 0.5))",
        )
        .unwrap();
        assert_eq!(config.dimension, 2);
        assert_eq!(config.morphogens, vec!["bmp".to_string()]);
        assert_eq!(config.physics.drag, 0.5);
        assert_eq!(config.max_particles, 4096);
    }

    #[test]
    fn round_trips_through_ron() {
        let config = TissueConfig {
            dimension: 2,
            shrink_factor: Some(0.8),
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        assert_eq!(TissueConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for bad in [
            "(dimension: 4)",
            "(max_particles: 0)",
            "(division_period_steps: 0)",
            "(shrink_factor: Some(1.5))",
            "(physics: (drag: 1.0))",
            "(division_jitter: -0.1)",
        ] {
            assert!(
                matches!(TissueConfig::from_ron_str(bad), Err(ConfigError::Invalid(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            TissueConfig::from_ron_str("(dimension: )"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load_restores_the_config() {
        let path = std::env::temp_dir().join(format!("bio-tissue-{}.ron", std::process::id()));
        let config = TissueConfig {
            dimension: 2,
            morphogens: vec!["wnt".into()],
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = TissueConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            TissueConfig::load("/nonexistent/tissue.ron"),
            Err(ConfigError::Io(_))
        ));
    }
}

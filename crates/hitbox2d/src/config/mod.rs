//! Configuration system
//!
//! Physics settings load from TOML or RON, chosen by file extension.

use log::info;
pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        let config = if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error, also used for values that parse but make no sense
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Spatial hash grid layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Minimum corner of the world
    pub origin: Vec2,
    /// World width and height
    pub world_size: Vec2,
    /// Cells along x
    pub cells_per_row: usize,
    /// Cells along y
    pub cells_per_column: usize,
    /// Layer count for layered grids
    pub layers: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::zeros(),
            world_size: Vec2::new(1000.0, 1000.0),
            cells_per_row: 10,
            cells_per_column: 10,
            layers: 1,
        }
    }
}

impl GridConfig {
    /// Check the layout before building a grid from it
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells_per_row == 0 || self.cells_per_column == 0 {
            return Err(ConfigError::Parse("grid cell counts must be non-zero".to_string()));
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !(positive(self.world_size.x) && positive(self.world_size.y)) {
            return Err(ConfigError::Parse(format!(
                "grid world_size must be positive, got [{}, {}]",
                self.world_size.x, self.world_size.y
            )));
        }
        if !(self.origin.x.is_finite() && self.origin.y.is_finite()) {
            return Err(ConfigError::Parse("grid origin must be finite".to_string()));
        }
        if self.layers == 0 {
            return Err(ConfigError::Parse("grid needs at least one layer".to_string()));
        }
        Ok(())
    }
}

/// Collision response tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Resolution passes per frame
    pub iterations: usize,
    /// Share of the MTV applied to the first body when both are dynamic
    pub dynamic_share: f32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            dynamic_share: 0.5,
        }
    }
}

impl ResolutionConfig {
    /// Check the tuning values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Parse("resolution iterations must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.dynamic_share) {
            return Err(ConfigError::Parse(format!(
                "dynamic_share must be within [0, 1], got {}",
                self.dynamic_share
            )));
        }
        Ok(())
    }
}

/// Physics configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Broad-phase grid
    pub grid: GridConfig,
    /// Collision response
    pub resolution: ResolutionConfig,
}

impl Config for PhysicsConfig {}

impl PhysicsConfig {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.resolution.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("hitbox2d_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution.dynamic_share, 0.5);
        assert_eq!(config.grid.cells_per_row, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PhysicsConfig::default();
        config.grid.cells_per_column = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Parse(_))));

        let mut config = PhysicsConfig::default();
        config.resolution.dynamic_share = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Parse(_))));

        let mut config = PhysicsConfig::default();
        config.grid.world_size = Vec2::new(100.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let config: PhysicsConfig = toml::from_str(
            r#"
            [grid]
            world_size = [2000.0, 500.0]
            cells_per_row = 20

            [resolution]
            iterations = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.world_size, Vec2::new(2000.0, 500.0));
        assert_eq!(config.grid.cells_per_row, 20);
        assert_eq!(config.grid.cells_per_column, 10);
        assert_eq!(config.resolution.iterations, 3);
        assert_eq!(config.resolution.dynamic_share, 0.5);
    }

    #[test]
    fn test_save_and_load_ron() {
        let path = temp_path("physics.ron");
        let mut config = PhysicsConfig::default();
        config.grid.layers = 4;
        config.save_to_file(&path).unwrap();

        let loaded = PhysicsConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_path("physics.json");
        assert!(matches!(
            PhysicsConfig::default().save_to_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}

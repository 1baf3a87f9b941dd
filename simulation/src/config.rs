//! Simulation configuration.
//!
//! Mirrors the JSON config file. Every section has defaults, so a partial file
//! (or `{}`) is a valid config. Defaults reproduce the reference scenario: a
//! 50x50 grid with ten estates of each size, a hundred forest remnants and an
//! initial atmospheric stock of 10 000 CO2 units.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::EstateSize;
use crate::error::{Result, SimulationError};

/// Retry budget for a single footprint placement
pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub estates: EstateCounts,
    pub roads: RoadConfig,
    /// Number of single-cell forest remnants
    pub preserves: u32,
    pub initial_co2: f64,
    /// Cycles run by the CLI
    pub cycles: u32,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub placement_attempts: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            estates: EstateCounts::default(),
            roads: RoadConfig::default(),
            preserves: 100,
            initial_co2: 10_000.0,
            cycles: 10,
            seed: None,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
        }
    }
}

/// Requested number of estates per size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateCounts {
    pub large: u32,
    pub medium: u32,
    pub small: u32,
    pub mini: u32,
}

impl Default for EstateCounts {
    fn default() -> Self {
        Self {
            large: 10,
            medium: 10,
            small: 10,
            mini: 10,
        }
    }
}

impl EstateCounts {
    pub fn get(&self, size: EstateSize) -> u32 {
        match size {
            EstateSize::Large => self.large,
            EstateSize::Medium => self.medium,
            EstateSize::Small => self.small,
            EstateSize::Mini => self.mini,
        }
    }
}

/// Straight road segments, each `length` cells long
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub count: u32,
    pub length: u32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            count: 0,
            length: 5,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Io`] if the file cannot be read, or
    /// [`SimulationError::Json`] if it is not a valid config document.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject configs that cannot produce a world.
    pub fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.placement_attempts == 0 {
            return Err(SimulationError::InvalidConfig(
                "placement_attempts must be positive".to_string(),
            ));
        }
        if self.roads.count > 0 && self.roads.length == 0 {
            return Err(SimulationError::InvalidConfig(
                "road length must be positive when roads are requested".to_string(),
            ));
        }
        if !self.initial_co2.is_finite() || self.initial_co2 < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "initial_co2 must be a non-negative number, got {}",
                self.initial_co2
            )));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> u64 {
        self.grid.width as u64 * self.grid.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.grid.width, 50);
        assert_eq!(config.preserves, 100);
        assert_eq!(config.placement_attempts, 1000);
    }

    #[test]
    fn test_partial_sections() {
        let config = SimulationConfig::parse(
            r#"{ "grid": { "width": 20 }, "estates": { "large": 2 }, "seed": 42 }"#,
        )
        .unwrap();
        assert_eq!(config.grid.width, 20);
        assert_eq!(config.grid.height, 50);
        assert_eq!(config.estates.large, 2);
        assert_eq!(config.estates.medium, 10);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_validation() {
        assert!(SimulationConfig::default().validate().is_ok());

        let mut config = SimulationConfig::default();
        config.grid.height = 0;
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.roads = RoadConfig { count: 3, length: 0 };
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.initial_co2 = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.placement_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_estate_counts_by_size() {
        let counts = EstateCounts { large: 1, medium: 2, small: 3, mini: 4 };
        let total: u32 = EstateSize::ALL.iter().map(|s| counts.get(*s)).sum();
        assert_eq!(counts.get(EstateSize::Small), 3);
        assert_eq!(total, 10);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SimulationConfig::parse("{ grid: }"),
            Err(SimulationError::Json(_))
        ));
    }
}

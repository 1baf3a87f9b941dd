//! EcoWorld Simulation Engine
//!
//! Land-use simulation on a fixed grid using ECS architecture. Estates of four
//! size classes, road segments and forest remnants are packed onto the grid,
//! then each cycle converts their biomass into CO2 absorbed from a shared
//! atmospheric stock.

pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod persistence;
pub mod systems;
pub mod world;

pub use components::*;
pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use persistence::{ExportData, ImportResult};
pub use systems::AbsorptionTotals;
pub use world::{CycleReport, PlacementSummary, SimulationWorld};

//! Error types for the simulation crate.

use crate::components::Position;

/// Errors returned by world construction, configuration and persistence.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Configuration values that cannot produce a valid world.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Snapshot written by an incompatible schema version.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),

    /// Snapshot places an agent outside the configured grid.
    #[error("agent at ({}, {}) lies outside the {width}x{height} grid", .position.x, .position.y)]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },

    /// Snapshot places two agents on the same cell.
    #[error("cell ({}, {}) holds more than one agent", .0.x, .0.y)]
    CellOccupied(Position),

    /// Snapshot fields that contradict each other or the accounting rules.
    #[error("inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary snapshot error: {0}")]
    Binary(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

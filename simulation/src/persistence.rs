//! Persistence module for export/import of simulation state
//!
//! Serializes the world (config, agents, CO2 stock and cycle history) to JSON
//! for interchange, or to a compact binary file for save/restore.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::*;
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::world::{CycleReport, PlacementSummary, SimulationWorld};

const SNAPSHOT_VERSION: u8 = 1;

// ============================================================================
// Export Data Structures
// ============================================================================

/// Complete world state for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u8, // Schema version for forward compatibility
    pub exported_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub cycle: u64,
    pub co2_total: f64,
    pub next_agent_id: u64,
    pub next_plot_id: u64,
    pub placement: PlacementSummary,
    pub agents: Vec<ExportedAgent>,
    pub history: Vec<CycleReport>,
}

/// Single agent with all its components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedAgent {
    pub agent_id: u64,
    /// None for forest remnants, which belong to no plot
    pub plot_id: Option<u64>,
    pub x: u32,
    pub y: u32,
    pub land_use: LandUse,
    pub vegetation: Vegetation,
    pub biomass: f64,
}

/// Result of import operation
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub agents: usize,
    pub cycle: u64,
    pub co2_total: f64,
}

// ============================================================================
// Export / Import Implementation
// ============================================================================

impl SimulationWorld {
    fn to_export_data(&self) -> ExportData {
        let mut agents: Vec<ExportedAgent> = self
            .world
            .query::<(&AgentId, &Position, &LandUse, &Vegetation, &Biomass, Option<&PlotId>)>()
            .iter()
            .map(|(_, (id, pos, land_use, vegetation, biomass, plot))| ExportedAgent {
                agent_id: id.0,
                plot_id: plot.map(|p| p.0),
                x: pos.x,
                y: pos.y,
                land_use: *land_use,
                vegetation: *vegetation,
                biomass: biomass.0,
            })
            .collect();
        agents.sort_by_key(|a| a.agent_id);

        ExportData {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            config: self.config.clone(),
            cycle: self.cycle,
            co2_total: self.co2_total,
            next_agent_id: self.next_agent_id,
            next_plot_id: self.next_plot_id,
            placement: self.placement,
            agents,
            history: self.history.clone(),
        }
    }

    /// Export entire world state to a JSON string
    pub fn export_world(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_export_data())?)
    }

    /// Import world state from a JSON string, replacing current state
    pub fn import_world(&mut self, json: &str) -> Result<ImportResult> {
        let data: ExportData = serde_json::from_str(json)?;
        self.restore(data)
    }

    /// Write a binary snapshot to `path`
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &self.to_export_data())?;
        writer.flush()?;
        info!(path = %path.display(), cycle = self.cycle, "snapshot saved");
        Ok(())
    }

    /// Build a world from a binary snapshot written by [`Self::save_snapshot`]
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let data: ExportData = bincode::deserialize_from(reader)?;
        let (sim, _) = Self::from_export(data)?;
        info!(path = %path.display(), cycle = sim.cycle, "snapshot loaded");
        Ok(sim)
    }

    fn restore(&mut self, data: ExportData) -> Result<ImportResult> {
        let (restored, result) = Self::from_export(data)?;
        *self = restored;
        Ok(result)
    }

    /// Validate a snapshot, then build the world it describes
    fn from_export(data: ExportData) -> Result<(Self, ImportResult)> {
        if data.version != SNAPSHOT_VERSION {
            return Err(SimulationError::UnsupportedVersion(data.version));
        }
        data.config.validate()?;
        check_layout(&data)?;

        // The RNG only drives placement, which is already done
        let rng = match data.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut restored = Self::empty(data.config, rng);

        for agent in &data.agents {
            let pos = Position::new(agent.x, agent.y);
            let entity = restored.spawn_agent(
                AgentId(agent.agent_id),
                agent.plot_id.map(PlotId),
                pos,
                agent.land_use,
                agent.vegetation,
            );
            // Keep the stored biomass rather than the table value
            if let Ok(mut biomass) = restored.world.get::<&mut Biomass>(entity) {
                biomass.0 = agent.biomass;
            }
            restored.grid.occupy(&[pos]);
        }

        restored.cycle = data.cycle;
        restored.co2_total = data.co2_total;
        restored.next_agent_id = data.next_agent_id;
        restored.next_plot_id = data.next_plot_id;
        restored.placement = data.placement;
        restored.history = data.history;

        let result = ImportResult {
            agents: data.agents.len(),
            cycle: restored.cycle,
            co2_total: restored.co2_total,
        };
        Ok((restored, result))
    }
}

/// Every agent must sit on its own in-bounds cell, and the accounting
/// fields must agree with each other.
fn check_layout(data: &ExportData) -> Result<()> {
    if !data.co2_total.is_finite() || data.co2_total < 0.0 {
        return Err(SimulationError::InconsistentSnapshot(format!(
            "co2_total must be a non-negative number, got {}",
            data.co2_total
        )));
    }
    if data.history.len() as u64 != data.cycle {
        return Err(SimulationError::InconsistentSnapshot(format!(
            "cycle {} does not match {} history entries",
            data.cycle,
            data.history.len()
        )));
    }

    let p = &data.placement;
    let counts = [
        ("large", p.large),
        ("medium", p.medium),
        ("small", p.small),
        ("mini", p.mini),
        ("roads", p.roads),
        ("preserves", p.preserves),
    ];
    for (kind, count) in counts {
        if count.placed > count.requested {
            return Err(SimulationError::InconsistentSnapshot(format!(
                "{} placed {} of {} requested",
                kind, count.placed, count.requested
            )));
        }
    }

    let width = data.config.grid.width;
    let height = data.config.grid.height;
    let mut seen = HashSet::with_capacity(data.agents.len());

    for agent in &data.agents {
        let position = Position::new(agent.x, agent.y);
        if agent.x >= width || agent.y >= height {
            return Err(SimulationError::OutOfBounds {
                position,
                width,
                height,
            });
        }
        if !seen.insert(position) {
            return Err(SimulationError::CellOccupied(position));
        }
    }
    Ok(())
}

//! Simulation World - main orchestrator
//!
//! Builds the land-use grid (estates, roads, forest remnants) and runs the
//! per-cycle CO2 accounting.

use std::collections::HashMap;

use hecs::{EntityBuilder, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::components::*;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::grid::OccupancyGrid;
use crate::systems::{self, AbsorptionTotals};

/// Outcome of one simulation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// Atmospheric CO2 remaining after this cycle
    pub co2_total: f64,
    pub absorption: AbsorptionTotals,
    pub total_absorption: f64,
}

/// Requested vs. placed count for one kind of plot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementCount {
    pub requested: u32,
    pub placed: u32,
}

impl PlacementCount {
    pub fn abandoned(&self) -> u32 {
        self.requested.saturating_sub(self.placed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub large: PlacementCount,
    pub medium: PlacementCount,
    pub small: PlacementCount,
    pub mini: PlacementCount,
    pub roads: PlacementCount,
    pub preserves: PlacementCount,
}

impl PlacementSummary {
    pub fn estate(&self, size: EstateSize) -> PlacementCount {
        match size {
            EstateSize::Large => self.large,
            EstateSize::Medium => self.medium,
            EstateSize::Small => self.small,
            EstateSize::Mini => self.mini,
        }
    }

    fn estate_mut(&mut self, size: EstateSize) -> &mut PlacementCount {
        match size {
            EstateSize::Large => &mut self.large,
            EstateSize::Medium => &mut self.medium,
            EstateSize::Small => &mut self.small,
            EstateSize::Mini => &mut self.mini,
        }
    }

    /// Plots of any kind that could not be placed
    pub fn total_abandoned(&self) -> u32 {
        [
            self.large,
            self.medium,
            self.small,
            self.mini,
            self.roads,
            self.preserves,
        ]
        .iter()
        .map(PlacementCount::abandoned)
        .sum()
    }
}

pub struct SimulationWorld {
    pub world: World,
    pub(crate) grid: OccupancyGrid,
    pub(crate) config: SimulationConfig,
    pub(crate) rng: StdRng,
    pub(crate) cells: HashMap<Position, hecs::Entity>,
    pub(crate) cycle: u64,
    pub(crate) co2_total: f64,
    pub next_agent_id: u64,
    pub next_plot_id: u64,
    pub(crate) history: Vec<CycleReport>,
    pub(crate) placement: PlacementSummary,
}

impl SimulationWorld {
    /// Build a world from `config` and populate the grid.
    ///
    /// Estates go first (largest footprint first), then roads, then single
    /// forest cells on whatever is still free. A plot that cannot be placed
    /// is skipped and counted in [`PlacementSummary`].
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sim = Self::empty(config, rng);
        sim.populate();

        info!(
            width = sim.config.grid.width,
            height = sim.config.grid.height,
            agents = sim.agent_count(),
            free_cells = sim.grid.free_count(),
            abandoned = sim.placement.total_abandoned(),
            "world populated"
        );

        Ok(sim)
    }

    pub(crate) fn empty(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            world: World::new(),
            grid: OccupancyGrid::new(config.grid.width, config.grid.height),
            co2_total: config.initial_co2,
            config,
            rng,
            cells: HashMap::new(),
            cycle: 0,
            next_agent_id: 0,
            next_plot_id: 0,
            history: Vec::new(),
            placement: PlacementSummary::default(),
        }
    }

    fn populate(&mut self) {
        self.place_estates();
        self.place_roads();
        self.place_preserves();
    }

    fn place_estates(&mut self) {
        for size in EstateSize::ALL {
            let requested = self.config.estates.get(size);
            let (w, h) = size.footprint();
            let mut placed = 0;

            for _ in 0..requested {
                if self.place_plot(LandUse::Estate(size), w, h) {
                    placed += 1;
                }
            }

            if placed < requested {
                warn!(
                    size = ?size,
                    requested,
                    placed,
                    "could not place every estate; remaining ones skipped"
                );
            }
            *self.placement.estate_mut(size) = PlacementCount { requested, placed };
        }
    }

    fn place_roads(&mut self) {
        let requested = self.config.roads.count;
        let length = self.config.roads.length;
        let mut placed = 0;

        for _ in 0..requested {
            let (w, h) = if self.rng.gen::<bool>() {
                (length, 1)
            } else {
                (1, length)
            };
            if self.place_plot(LandUse::Road, w, h) {
                placed += 1;
            }
        }

        if placed < requested {
            warn!(requested, placed, length, "could not place every road segment");
        }
        self.placement.roads = PlacementCount { requested, placed };
    }

    fn place_preserves(&mut self) {
        let requested = self.config.preserves;
        let mut placed = 0;

        for _ in 0..requested {
            let Some(pos) = self.grid.take_random_free(&mut self.rng) else {
                info!(requested, placed, "grid full, no room for more forest remnants");
                break;
            };
            let id = AgentId(self.next_agent_id);
            self.next_agent_id += 1;
            self.spawn_agent(id, None, pos, LandUse::Preserve, Vegetation::Forest);
            placed += 1;
        }

        self.placement.preserves = PlacementCount { requested, placed };
    }

    /// Place one rectangular plot and spawn an agent per cell.
    /// Agent ids are consumed only when placement succeeds.
    fn place_plot(&mut self, land_use: LandUse, width: u32, height: u32) -> bool {
        let attempts = self.config.placement_attempts;
        let Some(cells) = self.grid.try_place(&mut self.rng, width, height, attempts) else {
            debug!(?land_use, width, height, attempts, "placement abandoned");
            return false;
        };

        let vegetation = vegetation_for(land_use, &mut self.rng);
        let plot = PlotId(self.next_plot_id);
        self.next_plot_id += 1;

        let first_id = self.next_agent_id;
        for (i, pos) in cells.iter().enumerate() {
            let id = AgentId(first_id + i as u64);
            self.spawn_agent(id, Some(plot), *pos, land_use, vegetation);
        }
        self.next_agent_id += cells.len() as u64;
        true
    }

    pub(crate) fn spawn_agent(
        &mut self,
        id: AgentId,
        plot: Option<PlotId>,
        pos: Position,
        land_use: LandUse,
        vegetation: Vegetation,
    ) -> hecs::Entity {
        let mut builder = EntityBuilder::new();
        builder
            .add(id)
            .add(pos)
            .add(land_use)
            .add(vegetation)
            .add(Biomass::of(vegetation))
            .add(PendingBiomass(0.0));
        if let Some(plot) = plot {
            builder.add(plot);
        }
        let entity = self.world.spawn(builder.build());
        self.cells.insert(pos, entity);
        entity
    }

    /// Run one simulation cycle
    pub fn step(&mut self) -> CycleReport {
        self.cycle += 1;

        systems::activation_system(&mut self.world);

        let absorption = systems::absorption_system(&self.world);
        let total_absorption = absorption.total();
        self.co2_total = systems::apply_absorption(self.co2_total, total_absorption);

        let report = CycleReport {
            cycle: self.cycle,
            co2_total: self.co2_total,
            absorption,
            total_absorption,
        };

        debug!(
            cycle = report.cycle,
            absorbed = report.total_absorption,
            co2 = report.co2_total,
            "cycle complete"
        );

        self.history.push(report.clone());
        report
    }

    /// Run `cycles` cycles, returning their reports in order
    pub fn run(&mut self, cycles: u32) -> Vec<CycleReport> {
        (0..cycles).map(|_| self.step()).collect()
    }

    /// Get agent count (every occupied cell holds one agent)
    pub fn agent_count(&self) -> usize {
        self.world.query::<&AgentId>().iter().count()
    }

    pub fn count_by_land_use(&self) -> HashMap<LandUse, usize> {
        let mut counts = HashMap::new();
        for (_, land_use) in self.world.query::<&LandUse>().iter() {
            *counts.entry(*land_use).or_insert(0) += 1;
        }
        counts
    }

    pub fn agent_at(&self, pos: Position) -> Option<hecs::Entity> {
        self.cells.get(&pos).copied()
    }

    pub fn land_use_at(&self, pos: Position) -> Option<LandUse> {
        let entity = self.agent_at(pos)?;
        self.world.get::<&LandUse>(entity).ok().map(|l| *l)
    }

    /// Cycles completed so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn co2_total(&self) -> f64 {
        self.co2_total
    }

    pub fn history(&self) -> &[CycleReport] {
        &self.history
    }

    pub fn placement_summary(&self) -> &PlacementSummary {
        &self.placement
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn free_cells(&self) -> usize {
        self.grid.free_count()
    }

    /// One glyph per cell, one line per row. Empty cells are `.`
    pub fn land_use_map(&self) -> String {
        let width = self.grid.width();
        let height = self.grid.height();
        let mut out = String::with_capacity((width as usize + 1) * height as usize);
        for y in 0..height {
            for x in 0..width {
                let glyph = self
                    .land_use_at(Position::new(x, y))
                    .map(|l| l.glyph())
                    .unwrap_or('.');
                out.push(glyph);
            }
            if y + 1 < height {
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EstateCounts, GridConfig, RoadConfig};
    use std::collections::HashSet;

    fn config(width: u32, height: u32, estates: EstateCounts, preserves: u32) -> SimulationConfig {
        SimulationConfig {
            grid: GridConfig { width, height },
            estates,
            preserves,
            seed: Some(2024),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_agent_ids_follow_footprints() {
        let estates = EstateCounts { large: 1, medium: 1, small: 0, mini: 0 };
        let sim = SimulationWorld::new(config(20, 20, estates, 2)).unwrap();

        // 16 large cells, 9 medium cells, 2 preserves
        assert_eq!(sim.agent_count(), 27);
        assert_eq!(sim.next_agent_id, 27);

        let ids: HashSet<u64> = sim
            .world
            .query::<&AgentId>()
            .iter()
            .map(|(_, id)| id.0)
            .collect();
        assert_eq!(ids, (0..27).collect::<HashSet<u64>>());

        for (_, (id, land_use)) in sim.world.query::<(&AgentId, &LandUse)>().iter() {
            let expected = match id.0 {
                0..=15 => LandUse::Estate(EstateSize::Large),
                16..=24 => LandUse::Estate(EstateSize::Medium),
                _ => LandUse::Preserve,
            };
            assert_eq!(*land_use, expected, "agent {}", id.0);
        }
    }

    #[test]
    fn test_estate_cells_share_plot_and_vegetation() {
        let estates = EstateCounts { large: 3, medium: 0, small: 0, mini: 0 };
        let sim = SimulationWorld::new(config(20, 20, estates, 0)).unwrap();

        let mut by_plot: HashMap<PlotId, Vec<Vegetation>> = HashMap::new();
        for (_, (plot, veg)) in sim.world.query::<(&PlotId, &Vegetation)>().iter() {
            by_plot.entry(*plot).or_default().push(*veg);
        }
        assert_eq!(by_plot.len(), 3);
        for vegs in by_plot.values() {
            assert_eq!(vegs.len(), 16);
            assert!(vegs.iter().all(|v| *v == vegs[0]));
        }
    }

    #[test]
    fn test_failed_placement_consumes_no_ids() {
        // A 5x5 grid fits one large estate at most
        let estates = EstateCounts { large: 3, medium: 0, small: 0, mini: 0 };
        let sim = SimulationWorld::new(config(5, 5, estates, 0)).unwrap();

        let summary = sim.placement_summary();
        assert_eq!(summary.large.requested, 3);
        assert_eq!(summary.large.placed, 1);
        assert_eq!(summary.total_abandoned(), 2);
        assert_eq!(sim.next_agent_id, 16);
        assert_eq!(sim.agent_count(), 16);
    }

    #[test]
    fn test_abandoned_never_underflows() {
        let count = PlacementCount { requested: 2, placed: 5 };
        assert_eq!(count.abandoned(), 0);
        assert_eq!(PlacementCount { requested: 5, placed: 2 }.abandoned(), 3);
    }

    #[test]
    fn test_only_plot_cells_carry_plot_id() {
        let estates = EstateCounts { large: 1, medium: 0, small: 1, mini: 0 };
        let sim = SimulationWorld::new(config(10, 10, estates, 5)).unwrap();

        for (_, (land_use, plot)) in sim.world.query::<(&LandUse, Option<&PlotId>)>().iter() {
            match land_use {
                LandUse::Preserve => assert!(plot.is_none()),
                _ => assert!(plot.is_some()),
            }
        }
        assert_eq!(sim.world.query::<&PlotId>().iter().count(), 20);
    }

    #[test]
    fn test_preserves_stop_when_grid_full() {
        let estates = EstateCounts { large: 0, medium: 0, small: 0, mini: 0 };
        let sim = SimulationWorld::new(config(3, 3, estates, 20)).unwrap();
        assert_eq!(sim.agent_count(), 9);
        assert_eq!(sim.free_cells(), 0);
        assert_eq!(sim.placement_summary().preserves.placed, 9);
    }

    #[test]
    fn test_roads_are_straight_segments() {
        let mut cfg = config(30, 30, EstateCounts { large: 0, medium: 0, small: 0, mini: 0 }, 0);
        cfg.roads = RoadConfig { count: 4, length: 6 };
        let sim = SimulationWorld::new(cfg).unwrap();

        let mut by_plot: HashMap<PlotId, Vec<Position>> = HashMap::new();
        for (_, (plot, pos, land_use)) in sim.world.query::<(&PlotId, &Position, &LandUse)>().iter() {
            assert_eq!(*land_use, LandUse::Road);
            by_plot.entry(*plot).or_default().push(*pos);
        }
        assert_eq!(by_plot.len(), 4);
        for cells in by_plot.values() {
            assert_eq!(cells.len(), 6);
            let same_row = cells.iter().all(|p| p.y == cells[0].y);
            let same_col = cells.iter().all(|p| p.x == cells[0].x);
            assert!(same_row || same_col);
        }
    }

    #[test]
    fn test_step_accounting() {
        let estates = EstateCounts { large: 0, medium: 0, small: 1, mini: 2 };
        let mut cfg = config(10, 10, estates, 3);
        cfg.initial_co2 = 100.0;
        let mut sim = SimulationWorld::new(cfg).unwrap();

        let report = sim.step();

        // small: 4 cells * 3.0 * 0.1, mini: 2 * 3.0 * 0.1, forest: 3 * 5.0 * 0.1
        assert_eq!(report.cycle, 1);
        assert!((report.absorption.small - 1.2).abs() < 1e-9);
        assert!((report.absorption.mini - 0.6).abs() < 1e-9);
        assert!((report.absorption.preserve - 1.5).abs() < 1e-9);
        assert_eq!(report.absorption.large, 0.0);
        assert!((report.total_absorption - 3.3).abs() < 1e-9);
        assert!((report.co2_total - 96.7).abs() < 1e-9);
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn test_co2_never_negative() {
        let estates = EstateCounts { large: 0, medium: 0, small: 0, mini: 0 };
        let mut cfg = config(10, 10, estates, 100);
        cfg.initial_co2 = 120.0;
        let mut sim = SimulationWorld::new(cfg).unwrap();

        // 100 forest cells absorb 50 per cycle
        let reports = sim.run(4);
        assert!((reports[0].co2_total - 70.0).abs() < 1e-9);
        assert!((reports[1].co2_total - 20.0).abs() < 1e-9);
        assert_eq!(reports[2].co2_total, 0.0);
        assert_eq!(reports[3].co2_total, 0.0);
        assert_eq!(sim.cycle(), 4);
    }

    #[test]
    fn test_land_use_map_shape() {
        let estates = EstateCounts { large: 1, medium: 0, small: 0, mini: 0 };
        let sim = SimulationWorld::new(config(6, 4, estates, 0)).unwrap();
        let map = sim.land_use_map();
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == 6));
        assert_eq!(map.chars().filter(|c| *c == 'L').count(), 16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.grid.width = 0;
        assert!(SimulationWorld::new(cfg).is_err());
    }
}

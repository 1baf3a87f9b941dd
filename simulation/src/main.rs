//! EcoWorld command-line runner
//!
//! Builds a world from a config file and/or flags, runs it for a number of
//! cycles and logs the CO2 accounting of each one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ecoworld::{EstateSize, SimulationConfig, SimulationWorld};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ecoworld",
    version,
    about = "Run the land-use CO2 absorption simulation"
)]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Number of cycles to run.
    #[arg(long)]
    cycles: Option<u32>,

    /// RNG seed for reproducible placement.
    #[arg(long, env = "ECOWORLD_SEED")]
    seed: Option<u64>,

    /// Write a JSON export of the final state to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write a binary snapshot of the final state to this path.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the land-use map after placement.
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let cycles = config.cycles;

    info!("EcoWorld simulation starting...");
    let mut world = SimulationWorld::new(config).context("failed to build world")?;

    let summary = world.placement_summary();
    for size in EstateSize::ALL {
        let count = summary.estate(size);
        info!(size = ?size, requested = count.requested, placed = count.placed, "estates");
    }
    info!(
        roads = summary.roads.placed,
        preserves = summary.preserves.placed,
        free_cells = world.free_cells(),
        "placement complete"
    );

    if cli.map {
        println!("{}", world.land_use_map());
    }

    for _ in 0..cycles {
        let report = world.step();
        info!(
            cycle = report.cycle,
            large = report.absorption.large,
            medium = report.absorption.medium,
            small = report.absorption.small,
            mini = report.absorption.mini,
            preserve = report.absorption.preserve,
            co2 = report.co2_total,
            "cycle {}",
            report.cycle
        );
    }

    if let Some(path) = &cli.export {
        let json = world.export_world()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        info!(path = %path.display(), "export written");
    }

    if let Some(path) = &cli.save {
        world
            .save_snapshot(path)
            .with_context(|| format!("failed to save snapshot to {}", path.display()))?;
    }

    info!(
        cycles = world.cycle(),
        co2 = world.co2_total(),
        "simulation complete"
    );

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    if let Some(cycles) = cli.cycles {
        config.cycles = cycles;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    Ok(config)
}

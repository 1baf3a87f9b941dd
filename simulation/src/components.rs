//! ECS Components for EcoWorld agents
//!
//! Every agent occupies exactly one grid cell.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Property (estate or road segment) a cell belongs to.
/// All cells of one footprint share the same plot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlotId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Land Use
// ============================================================================

/// Rural property size class, measured in fiscal modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstateSize {
    Large,
    Medium,
    Small,
    Mini,
}

impl EstateSize {
    /// Placement order: biggest footprints go first while the grid is empty.
    pub const ALL: [EstateSize; 4] = [
        EstateSize::Large,
        EstateSize::Medium,
        EstateSize::Small,
        EstateSize::Mini,
    ];

    /// Footprint as (width, height) in cells
    pub fn footprint(&self) -> (u32, u32) {
        match self {
            EstateSize::Large => (4, 4),
            EstateSize::Medium => (3, 3),
            EstateSize::Small => (2, 2),
            EstateSize::Mini => (1, 1),
        }
    }

    pub fn cells(&self) -> u32 {
        let (w, h) = self.footprint();
        w * h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandUse {
    Estate(EstateSize),
    /// Atlantic forest remnant
    Preserve,
    Road,
}

impl LandUse {
    /// Single-character glyph used by the terminal land-use map
    pub fn glyph(&self) -> char {
        match self {
            LandUse::Estate(EstateSize::Large) => 'L',
            LandUse::Estate(EstateSize::Medium) => 'M',
            LandUse::Estate(EstateSize::Small) => 'S',
            LandUse::Estate(EstateSize::Mini) => 'm',
            LandUse::Preserve => 'F',
            LandUse::Road => '#',
        }
    }
}

// ============================================================================
// Vegetation & Biomass
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vegetation {
    Soy,
    SugarCane,
    Diversified,
    Pasture,
    Grasses,
    BareSoil,
    Forest,
    Paved,
}

/// Land covers a large estate may be given (monoculture or pasture)
const LARGE_ESTATE_COVERS: &[Vegetation] = &[
    Vegetation::Soy,
    Vegetation::SugarCane,
    Vegetation::Pasture,
    Vegetation::Grasses,
    Vegetation::BareSoil,
];

impl Vegetation {
    /// Standing biomass per cell (hypothetical values)
    pub fn biomass(&self) -> f64 {
        match self {
            Vegetation::Soy => 2.5,
            Vegetation::SugarCane => 4.0,
            Vegetation::Diversified => 3.0,
            Vegetation::Pasture => 1.5,
            Vegetation::Grasses => 1.0,
            Vegetation::BareSoil => 0.0,
            Vegetation::Forest => 5.0,
            Vegetation::Paved => 0.0,
        }
    }
}

/// Pick the vegetation cover for a newly placed plot.
///
/// Large estates draw one monoculture/pasture cover at random; the whole plot
/// shares it. Smaller estates grow diversified crops.
pub fn vegetation_for<R: Rng + ?Sized>(land_use: LandUse, rng: &mut R) -> Vegetation {
    match land_use {
        LandUse::Estate(EstateSize::Large) => *LARGE_ESTATE_COVERS
            .choose(rng)
            .unwrap_or(&Vegetation::BareSoil),
        LandUse::Estate(_) => Vegetation::Diversified,
        LandUse::Preserve => Vegetation::Forest,
        LandUse::Road => Vegetation::Paved,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biomass(pub f64);

impl Biomass {
    pub fn of(vegetation: Vegetation) -> Self {
        Self(vegetation.biomass())
    }
}

/// Biomass computed during the step phase, committed on advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingBiomass(pub f64);

//! Absorption System
//!
//! Converts standing biomass into CO2 absorbed this cycle and sums it per
//! land-use category.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::{Biomass, EstateSize, LandUse};

/// Fraction of standing biomass absorbed as CO2 per cycle
pub const ABSORPTION_FACTOR: f64 = 0.1;

/// CO2 absorbed in one cycle, per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionTotals {
    pub large: f64,
    pub medium: f64,
    pub small: f64,
    pub mini: f64,
    pub preserve: f64,
}

impl AbsorptionTotals {
    /// Credit `amount` to the category of `land_use`. Roads have no category.
    pub fn credit(&mut self, land_use: LandUse, amount: f64) {
        match land_use {
            LandUse::Estate(EstateSize::Large) => self.large += amount,
            LandUse::Estate(EstateSize::Medium) => self.medium += amount,
            LandUse::Estate(EstateSize::Small) => self.small += amount,
            LandUse::Estate(EstateSize::Mini) => self.mini += amount,
            LandUse::Preserve => self.preserve += amount,
            LandUse::Road => {}
        }
    }

    pub fn total(&self) -> f64 {
        self.large + self.medium + self.small + self.mini + self.preserve
    }

    pub fn for_estate(&self, size: EstateSize) -> f64 {
        match size {
            EstateSize::Large => self.large,
            EstateSize::Medium => self.medium,
            EstateSize::Small => self.small,
            EstateSize::Mini => self.mini,
        }
    }
}

/// Sum this cycle's absorption over all agents
pub fn absorption_system(world: &World) -> AbsorptionTotals {
    let mut totals = AbsorptionTotals::default();
    for (_, (land_use, biomass)) in world.query::<(&LandUse, &Biomass)>().iter() {
        totals.credit(*land_use, biomass.0 * ABSORPTION_FACTOR);
    }
    totals
}

/// Remove absorbed CO2 from the atmospheric stock. The stock never goes
/// below zero.
pub fn apply_absorption(co2_total: f64, absorbed: f64) -> f64 {
    (co2_total - absorbed).max(0.0)
}

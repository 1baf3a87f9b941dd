//! Activation System
//!
//! Simultaneous activation: every agent computes its next state in the step
//! phase, then all agents commit it in the advance phase. No agent observes
//! another agent's committed state from the same cycle.

use hecs::World;
use tracing::trace;

use crate::components::{AgentId, Biomass, PendingBiomass, Vegetation};

/// Run step then advance for all agents.
/// Returns the number of agents activated.
pub fn activation_system(world: &mut World) -> usize {
    step_phase(world);
    advance_phase(world)
}

/// Stage next-cycle biomass from the current vegetation cover
fn step_phase(world: &mut World) {
    for (_, (vegetation, pending)) in world.query_mut::<(&Vegetation, &mut PendingBiomass)>() {
        pending.0 = vegetation.biomass();
    }
}

fn advance_phase(world: &mut World) -> usize {
    let mut count = 0;
    for (_, (id, biomass, pending)) in
        world.query_mut::<(&AgentId, &mut Biomass, &PendingBiomass)>()
    {
        biomass.0 = pending.0;
        trace!(agent = id.0, biomass = biomass.0, "agent advanced");
        count += 1;
    }
    count
}

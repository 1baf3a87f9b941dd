//! ECS Systems - process agents each cycle

pub mod absorption;
pub mod activation;

pub use absorption::{absorption_system, apply_absorption, AbsorptionTotals, ABSORPTION_FACTOR};
pub use activation::activation_system;

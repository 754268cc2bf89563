//! Traffic signal simulation
//!
//! Independently running traffic lights and pedestrian crossings, each driven
//! by its own tokio task on a shared one-tick cadence, with randomized sensor
//! input, emergency preemption and operator overrides.

pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod monitoring;
pub mod sensors;
pub mod shared_data;
pub mod simulation_engine;

pub use config::{InvalidModePolicy, SimulationConfig};
pub use error::SimulationError;
pub use simulation_engine::SimulationController;

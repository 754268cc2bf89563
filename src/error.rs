//! Error types for the signal simulation

use thiserror::Error;

/// Errors surfaced by the simulation core and its collaborators.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid pedestrian mode '{0}' (expected normal, priority or manual)")]
    InvalidModeValue(String),

    #[error("Simulation is already running")]
    AlreadyRunning,

    #[error("Simulation is not running")]
    NotRunning,

    #[error("Actor task failed: {0}")]
    TaskFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

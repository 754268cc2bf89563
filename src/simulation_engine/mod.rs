// simulation_engine/mod.rs
pub mod controller;
pub mod ticker;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use controller::{ControllerStatus, SimulationController};
pub use ticker::{drive_actor, TickOutcome, Ticker};

// Every mutation leaves an actor in a valid state, so a poisoned lock is still usable.
pub(crate) fn lock_actor<T>(actor: &Mutex<T>) -> MutexGuard<'_, T> {
    actor.lock().unwrap_or_else(PoisonError::into_inner)
}

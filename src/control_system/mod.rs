// control_system/mod.rs
pub mod pedestrian_crossing;
pub mod traffic_light;

use crate::shared_data::{ActorSnapshot, SimulationEvent};

pub use pedestrian_crossing::{CrossingMode, CrossingState, CrossingTiming, PedestrianCrossing};
pub use traffic_light::{LightState, LightTiming, TrafficLight};

/// A simulated signal that its own task advances once per tick.
pub trait SignalActor: Send + 'static {
    fn location(&self) -> &str;

    /// One step of the per-tick loop body after the wait. Returns any events
    /// worth recording beyond the regular snapshot.
    fn advance(&mut self) -> Vec<SimulationEvent>;

    fn actor_snapshot(&self) -> ActorSnapshot;

    fn reset(&mut self);
}

// src/shared_data.rs

use crate::control_system::pedestrian_crossing::{CrossingMode, CrossingState};
use crate::control_system::traffic_light::LightState;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only view of a traffic light, taken under the actor's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSnapshot {
    pub location: String,
    pub state: LightState,
    pub timer: u32,
    pub vehicle_sensor: bool,
    pub emergency_vehicle_sensor: bool,
    pub adjustment_factor: f64,
    pub cycle_count: u64,
    pub peak_hours: (u32, u32),
    pub current_hour: u32,
}

impl fmt::Display for LightSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} light is {} (Timer: {}s, Cycles: {}, Factor: {}, Peak Hours: ({}, {}))",
            self.location,
            self.state,
            self.timer,
            self.cycle_count,
            self.adjustment_factor,
            self.peak_hours.0,
            self.peak_hours.1
        )
    }
}

/// Read-only view of a pedestrian crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingSnapshot {
    pub location: String,
    pub state: CrossingState,
    pub button_pressed: bool,
    pub crossing_timer: u32,
    pub mode: CrossingMode,
}

impl fmt::Display for CrossingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} crossing is {} (Button Pressed: {}, Timer: {}s, Mode: {})",
            self.location, self.state, self.button_pressed, self.crossing_timer, self.mode
        )
    }
}

/// Snapshot of any simulated actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorSnapshot {
    Light(LightSnapshot),
    Crossing(CrossingSnapshot),
}

impl ActorSnapshot {
    pub fn location(&self) -> &str {
        match self {
            ActorSnapshot::Light(light) => &light.location,
            ActorSnapshot::Crossing(crossing) => &crossing.location,
        }
    }
}

impl fmt::Display for ActorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorSnapshot::Light(light) => light.fmt(f),
            ActorSnapshot::Crossing(crossing) => crossing.fmt(f),
        }
    }
}

/// Which sensor an injected reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Vehicle,
    EmergencyVehicle,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Vehicle => write!(f, "vehicle"),
            SensorKind::EmergencyVehicle => write!(f, "emergency vehicle"),
        }
    }
}

/// Everything the controller hands to its recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    Started { lights: usize, crossings: usize },
    Stopped,
    Reset,
    Snapshot(ActorSnapshot),
    Sensor {
        kind: SensorKind,
        location: String,
        detected: bool,
    },
    ButtonPressed { location: String },
    ModeChanged { mode: CrossingMode },
    ManualOverride { ticks: u32 },
}

impl SimulationEvent {
    /// Short event name, used as the CSV `event` column.
    pub fn name(&self) -> &'static str {
        match self {
            SimulationEvent::Started { .. } => "started",
            SimulationEvent::Stopped => "stopped",
            SimulationEvent::Reset => "reset",
            SimulationEvent::Snapshot(_) => "snapshot",
            SimulationEvent::Sensor { .. } => "sensor",
            SimulationEvent::ButtonPressed { .. } => "button_pressed",
            SimulationEvent::ModeChanged { .. } => "mode_changed",
            SimulationEvent::ManualOverride { .. } => "manual_override",
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            SimulationEvent::Snapshot(snapshot) => Some(snapshot.location()),
            SimulationEvent::Sensor { location, .. } => Some(location),
            SimulationEvent::ButtonPressed { location } => Some(location),
            _ => None,
        }
    }

    /// Human-readable description of the event.
    pub fn detail(&self) -> String {
        match self {
            SimulationEvent::Started { lights, crossings } => format!(
                "Simulation started ({} traffic lights, {} pedestrian crossings)",
                lights, crossings
            ),
            SimulationEvent::Stopped => "Simulation stopped".to_string(),
            SimulationEvent::Reset => "Simulation reset".to_string(),
            SimulationEvent::Snapshot(snapshot) => snapshot.to_string(),
            SimulationEvent::Sensor {
                kind,
                location,
                detected,
            } => format!(
                "{} sensor at {}: {}",
                kind,
                location,
                if *detected { "detected" } else { "clear" }
            ),
            SimulationEvent::ButtonPressed { location } => {
                format!("Pedestrian button pressed at {}", location)
            }
            SimulationEvent::ModeChanged { mode } => {
                format!("Pedestrian crossing mode set to {}", mode)
            }
            SimulationEvent::ManualOverride { ticks } => {
                format!("Manual override: all lights GREEN for {}s", ticks)
            }
        }
    }

    /// Lifecycle events go to the simulation log; the rest are sensor/operator events.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            SimulationEvent::Started { .. } | SimulationEvent::Stopped | SimulationEvent::Reset
        )
    }
}

/// One line of an append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub event: String,
    pub location: String,
    pub detail: String,
}

impl EventRecord {
    pub fn from_event(event: &SimulationEvent) -> Self {
        Self {
            timestamp: current_timestamp(),
            event: event.name().to_string(),
            location: event.location().unwrap_or_default().to_string(),
            detail: event.detail(),
        }
    }
}

// Local wall-clock time in ctime layout, e.g. "Mon Oct 19 08:15:02 2026".
pub fn current_timestamp() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

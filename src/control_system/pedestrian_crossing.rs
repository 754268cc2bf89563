use crate::control_system::SignalActor;
use crate::error::SimulationError;
use crate::global_variables::{CROSSING_DURATION, WAITING_DURATION};
use crate::shared_data::{ActorSnapshot, CrossingSnapshot, SimulationEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pedestrian signal states. Cycle: DontWalk -> Walk -> Waiting -> DontWalk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossingState {
    DontWalk,
    Walk,
    Waiting,
}

impl fmt::Display for CrossingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossingState::DontWalk => write!(f, "DON'T WALK"),
            CrossingState::Walk => write!(f, "WALK"),
            CrossingState::Waiting => write!(f, "WAITING"),
        }
    }
}

/// Behavioural variant of a crossing. Priority doubles the WALK phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingMode {
    #[default]
    Normal,
    Priority,
    Manual,
}

impl CrossingMode {
    pub const ALL: [CrossingMode; 3] = [
        CrossingMode::Normal,
        CrossingMode::Priority,
        CrossingMode::Manual,
    ];
}

impl FromStr for CrossingMode {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(CrossingMode::Normal),
            "priority" => Ok(CrossingMode::Priority),
            "manual" => Ok(CrossingMode::Manual),
            _ => Err(SimulationError::InvalidModeValue(value.to_string())),
        }
    }
}

impl fmt::Display for CrossingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossingMode::Normal => write!(f, "normal"),
            CrossingMode::Priority => write!(f, "priority"),
            CrossingMode::Manual => write!(f, "manual"),
        }
    }
}

/// Phase durations of a pedestrian crossing, in ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingTiming {
    pub crossing_duration: u32,
    pub waiting_duration: u32,
}

impl Default for CrossingTiming {
    fn default() -> Self {
        Self {
            crossing_duration: CROSSING_DURATION,
            waiting_duration: WAITING_DURATION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PedestrianCrossing {
    pub location: String,
    pub state: CrossingState,
    /// Set by a button press, cleared once the press is consumed.
    pub button_pressed: bool,
    /// Remaining ticks in the current phase.
    pub crossing_timer: u32,
    pub mode: CrossingMode,
    pub timing: CrossingTiming,
}

impl PedestrianCrossing {
    pub fn new(location: impl Into<String>) -> Self {
        Self::with_timing(location, CrossingTiming::default())
    }

    pub fn with_timing(location: impl Into<String>, timing: CrossingTiming) -> Self {
        Self {
            location: location.into(),
            state: CrossingState::DontWalk,
            button_pressed: false,
            crossing_timer: 0,
            mode: CrossingMode::Normal,
            timing,
        }
    }

    /// Counts the phase down; WALK and WAITING advance when it reaches zero.
    /// An idle DON'T WALK only moves on a button press.
    pub fn tick(&mut self) {
        if self.crossing_timer > 0 {
            self.crossing_timer -= 1;
        } else if matches!(self.state, CrossingState::Walk | CrossingState::Waiting) {
            self.switch_to_next();
        }
    }

    pub fn switch_to_next(&mut self) {
        let previous = self.state;
        match self.state {
            CrossingState::DontWalk => {
                let multiplier = if self.mode == CrossingMode::Priority { 2 } else { 1 };
                self.state = CrossingState::Walk;
                self.crossing_timer = self.timing.crossing_duration * multiplier;
            }
            CrossingState::Walk => {
                self.state = CrossingState::Waiting;
                self.crossing_timer = self.timing.waiting_duration;
            }
            CrossingState::Waiting => {
                self.state = CrossingState::DontWalk;
                self.crossing_timer = 0;
            }
        }
        log::debug!(
            "Pedestrian crossing {}: {} -> {} for {}s",
            self.location,
            previous,
            self.state,
            self.crossing_timer
        );
    }

    pub fn press_button(&mut self) {
        self.button_pressed = true;
    }

    /// Acts on a pending button press: one transition, then the press is cleared.
    /// Returns whether a press was consumed.
    pub fn consume_button_press(&mut self) -> bool {
        if !self.button_pressed {
            return false;
        }
        self.switch_to_next();
        self.button_pressed = false;
        true
    }

    /// Parses and applies a mode. An unknown mode is an error and changes nothing.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), SimulationError> {
        self.mode = mode.parse()?;
        Ok(())
    }

    pub fn snapshot(&self) -> CrossingSnapshot {
        CrossingSnapshot {
            location: self.location.clone(),
            state: self.state,
            button_pressed: self.button_pressed,
            crossing_timer: self.crossing_timer,
            mode: self.mode,
        }
    }

    /// Restores the initial simulation values; the configured mode is kept.
    pub fn reset(&mut self) {
        self.state = CrossingState::DontWalk;
        self.button_pressed = false;
        self.crossing_timer = 0;
    }
}

impl SignalActor for PedestrianCrossing {
    fn location(&self) -> &str {
        &self.location
    }

    fn advance(&mut self) -> Vec<SimulationEvent> {
        self.tick();
        self.consume_button_press();
        Vec::new()
    }

    fn actor_snapshot(&self) -> ActorSnapshot {
        ActorSnapshot::Crossing(self.snapshot())
    }

    fn reset(&mut self) {
        PedestrianCrossing::reset(self);
    }
}

use crate::control_system::SignalActor;
use crate::error::SimulationError;
use crate::global_variables::{
    EMERGENCY_PROBABILITY, MAX_GREEN_TIME, MIN_GREEN_TIME, PEAK_HOURS, VEHICLE_ADJUSTMENT_FACTOR,
    VEHICLE_PROBABILITY, YELLOW_BASE_TIME,
};
use crate::sensors::{RandomSource, ThreadRandom};
use crate::shared_data::{ActorSnapshot, LightSnapshot, SensorKind, SimulationEvent};
use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Possible states of a traffic light. The normal cycle is Red -> Green -> Yellow -> Red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightState {
    Red,
    Green,
    Yellow,
}

impl LightState {
    /// The state that follows this one in the normal cycle.
    pub fn next(self) -> Self {
        match self {
            LightState::Red => LightState::Green,
            LightState::Green => LightState::Yellow,
            LightState::Yellow => LightState::Red,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Red => write!(f, "RED"),
            LightState::Green => write!(f, "GREEN"),
            LightState::Yellow => write!(f, "YELLOW"),
        }
    }
}

/// Timing and sensor parameters shared by every traffic light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTiming {
    /// Lower bound of a green/red draw, in ticks.
    pub min_green_time: u32,
    /// Upper bound of a green/red draw, in ticks.
    pub max_green_time: u32,
    /// Yellow duration before the adjustment factor is applied.
    pub yellow_base_time: u32,
    /// Half-open `[start, end)` hour-of-day window in which green draws double.
    pub peak_hours: (u32, u32),
    /// Factor applied while the vehicle sensor reads true.
    pub vehicle_adjustment_factor: f64,
    pub vehicle_probability: f64,
    pub emergency_probability: f64,
}

impl Default for LightTiming {
    fn default() -> Self {
        Self {
            min_green_time: MIN_GREEN_TIME,
            max_green_time: MAX_GREEN_TIME,
            yellow_base_time: YELLOW_BASE_TIME,
            peak_hours: PEAK_HOURS,
            vehicle_adjustment_factor: VEHICLE_ADJUSTMENT_FACTOR,
            vehicle_probability: VEHICLE_PROBABILITY,
            emergency_probability: EMERGENCY_PROBABILITY,
        }
    }
}

impl LightTiming {
    /// Rejects timings a light cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.min_green_time > self.max_green_time {
            return Err(SimulationError::Config(format!(
                "min_green_time ({}) exceeds max_green_time ({})",
                self.min_green_time, self.max_green_time
            )));
        }
        for (name, p) in [
            ("vehicle_probability", self.vehicle_probability),
            ("emergency_probability", self.emergency_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimulationError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }
        if !(self.vehicle_adjustment_factor.is_finite() && self.vehicle_adjustment_factor > 0.0) {
            return Err(SimulationError::Config(format!(
                "vehicle_adjustment_factor must be positive, got {}",
                self.vehicle_adjustment_factor
            )));
        }
        let (start, end) = self.peak_hours;
        if start > end || end > 24 {
            return Err(SimulationError::Config(format!(
                "peak_hours ({}, {}) is not a valid hour window",
                start, end
            )));
        }
        Ok(())
    }
}

/// A single traffic light and its sensors.
pub struct TrafficLight {
    /// Unique location name.
    pub location: String,
    pub state: LightState,
    /// Remaining ticks in the current state.
    pub timer: u32,
    /// Last vehicle sensor reading.
    pub vehicle_sensor: bool,
    /// Last emergency vehicle sensor reading.
    pub emergency_vehicle_sensor: bool,
    /// 1.0 normally, `vehicle_adjustment_factor` after a positive vehicle reading.
    pub adjustment_factor: f64,
    /// Number of `switch_to_next` transitions since creation or reset.
    pub cycle_count: u64,
    /// Hour of day captured when the light was created.
    pub current_hour: u32,
    pub timing: LightTiming,
    rng: Box<dyn RandomSource>,
}

impl TrafficLight {
    /// Creates a light with default timings, the current local hour and thread-local randomness.
    pub fn new(location: impl Into<String>) -> Self {
        Self::with_random(
            location,
            LightTiming::default(),
            Local::now().hour(),
            Box::new(ThreadRandom),
        )
    }

    /// Creates a light from explicit parts.
    ///
    /// `timing` is expected to pass `LightTiming::validate`; the controller
    /// checks it as part of `SimulationConfig::validate`. An invalid timing
    /// never panics here: draws saturate and probabilities outside `[0, 1]`
    /// are clamped, with NaN reading as "never".
    pub fn with_random(
        location: impl Into<String>,
        timing: LightTiming,
        current_hour: u32,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            location: location.into(),
            state: LightState::Red,
            timer: 0,
            vehicle_sensor: false,
            emergency_vehicle_sensor: false,
            adjustment_factor: 1.0,
            cycle_count: 0,
            current_hour,
            timing,
            rng,
        }
    }

    // Scales a base duration by the adjustment factor, rounded to the nearest tick.
    fn scaled(&self, base: u32) -> u32 {
        (f64::from(base) * self.adjustment_factor).round() as u32
    }

    /// Advances one tick; switches state once the timer runs out.
    pub fn tick(&mut self) {
        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.switch_to_next();
        }
    }

    /// Moves to the next state of the cycle and draws that state's duration.
    pub fn switch_to_next(&mut self) {
        let previous = self.state;
        self.state = previous.next();
        self.timer = match self.state {
            LightState::Green => self.calculate_green_time(),
            LightState::Yellow => self.scaled(self.timing.yellow_base_time),
            LightState::Red => self.calculate_red_time(),
        };
        self.cycle_count += 1;
        log::debug!(
            "Traffic light {}: {} -> {} for {}s",
            self.location,
            previous,
            self.state,
            self.timer
        );
    }

    /// Green duration; the draw range doubles during peak hours.
    pub fn calculate_green_time(&mut self) -> u32 {
        let (low, high) = if self.is_peak_hour() {
            (
                self.timing.min_green_time.saturating_mul(2),
                self.timing.max_green_time.saturating_mul(2),
            )
        } else {
            (self.timing.min_green_time, self.timing.max_green_time)
        };
        let base = self.rng.uniform_int(low, high);
        self.scaled(base)
    }

    pub fn calculate_red_time(&mut self) -> u32 {
        let base = self
            .rng
            .uniform_int(self.timing.min_green_time, self.timing.max_green_time);
        self.scaled(base)
    }

    pub fn is_peak_hour(&self) -> bool {
        let (start, end) = self.timing.peak_hours;
        start <= self.current_hour && self.current_hour < end
    }

    /// Samples the vehicle sensor and updates the adjustment factor from it.
    pub fn detect_vehicle(&mut self) -> bool {
        self.vehicle_sensor = self.rng.chance(self.timing.vehicle_probability);
        self.adjustment_factor = if self.vehicle_sensor {
            self.timing.vehicle_adjustment_factor
        } else {
            1.0
        };
        self.vehicle_sensor
    }

    /// Samples the emergency sensor; a detection preempts the cycle and forces GREEN.
    ///
    /// A light that was not already green gets a fresh green duration instead of
    /// carrying over the timer of the state it was preempted from. Preemption is
    /// not counted as a cycle.
    pub fn detect_emergency_vehicle(&mut self) -> bool {
        self.emergency_vehicle_sensor = self.rng.chance(self.timing.emergency_probability);
        if self.emergency_vehicle_sensor && self.state != LightState::Green {
            log::info!(
                "Traffic light {}: emergency vehicle detected, preempting {} -> GREEN",
                self.location,
                self.state
            );
            self.state = LightState::Green;
            self.timer = self.calculate_green_time();
        }
        self.emergency_vehicle_sensor
    }

    /// Operator override: GREEN for a fixed number of ticks, outside the normal cycle.
    pub fn force_green(&mut self, ticks: u32) {
        self.state = LightState::Green;
        self.timer = ticks;
    }

    pub fn snapshot(&self) -> LightSnapshot {
        LightSnapshot {
            location: self.location.clone(),
            state: self.state,
            timer: self.timer,
            vehicle_sensor: self.vehicle_sensor,
            emergency_vehicle_sensor: self.emergency_vehicle_sensor,
            adjustment_factor: self.adjustment_factor,
            cycle_count: self.cycle_count,
            peak_hours: self.timing.peak_hours,
            current_hour: self.current_hour,
        }
    }

    /// Restores the initial simulation values. Timing and the captured hour are kept.
    pub fn reset(&mut self) {
        self.state = LightState::Red;
        self.timer = 0;
        self.vehicle_sensor = false;
        self.emergency_vehicle_sensor = false;
        self.adjustment_factor = 1.0;
        self.cycle_count = 0;
    }
}

impl fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficLight")
            .field("location", &self.location)
            .field("state", &self.state)
            .field("timer", &self.timer)
            .field("adjustment_factor", &self.adjustment_factor)
            .field("cycle_count", &self.cycle_count)
            .finish_non_exhaustive()
    }
}

impl SignalActor for TrafficLight {
    fn location(&self) -> &str {
        &self.location
    }

    // tick, then sample both sensors
    fn advance(&mut self) -> Vec<SimulationEvent> {
        self.tick();
        self.detect_vehicle();
        let mut events = Vec::new();
        if self.detect_emergency_vehicle() {
            events.push(SimulationEvent::Sensor {
                kind: SensorKind::EmergencyVehicle,
                location: self.location.clone(),
                detected: true,
            });
        }
        events
    }

    fn actor_snapshot(&self) -> ActorSnapshot {
        ActorSnapshot::Light(self.snapshot())
    }

    fn reset(&mut self) {
        TrafficLight::reset(self);
    }
}

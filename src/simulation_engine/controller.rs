use crate::config::{InvalidModePolicy, SimulationConfig};
use crate::control_system::{
    CrossingMode, PedestrianCrossing, SignalActor, TrafficLight,
};
use crate::error::SimulationError;
use crate::monitoring::recorder::Recorder;
use crate::sensors::{RandomSource, SeededRandom, ThreadRandom};
use crate::shared_data::{ActorSnapshot, SensorKind, SimulationEvent};
use crate::simulation_engine::lock_actor;
use crate::simulation_engine::ticker::{drive_actor, Ticker};
use chrono::{Local, Timelike};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type SharedLight = Arc<Mutex<TrafficLight>>;
pub type SharedCrossing = Arc<Mutex<PedestrianCrossing>>;

// Handles of the actor tasks of one run.
struct RunningTasks {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// Point-in-time summary of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStatus {
    pub running: bool,
    pub manual_override: bool,
    pub traffic_lights: usize,
    pub pedestrian_crossings: usize,
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status: Simulation {} | Manual Override: {} | {} traffic lights, {} pedestrian crossings",
            if self.running { "Running" } else { "Stopped" },
            if self.manual_override { "ON" } else { "OFF" },
            self.traffic_lights,
            self.pedestrian_crossings
        )
    }
}

/// Owns the actor set and runs one task per actor on a shared tick cadence.
pub struct SimulationController {
    config: SimulationConfig,
    lights: Vec<SharedLight>,
    crossings: Vec<SharedCrossing>,
    recorder: Arc<dyn Recorder>,
    running: Option<RunningTasks>,
    manual_override: AtomicBool,
}

impl SimulationController {
    /// Builds every actor named in the configuration.
    pub fn new(
        config: SimulationConfig,
        recorder: Arc<dyn Recorder>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let hour = config.current_hour.unwrap_or_else(|| Local::now().hour());

        let lights = config
            .traffic_lights
            .iter()
            .enumerate()
            .map(|(index, location)| {
                let rng: Box<dyn RandomSource> = match config.seed {
                    Some(seed) => Box::new(SeededRandom::new(seed.wrapping_add(index as u64))),
                    None => Box::new(ThreadRandom),
                };
                TrafficLight::with_random(location.as_str(), config.light.clone(), hour, rng)
            })
            .collect();
        let crossings = config
            .pedestrian_crossings
            .iter()
            .map(|location| {
                PedestrianCrossing::with_timing(location.as_str(), config.crossing.clone())
            })
            .collect();

        Ok(Self::from_actors(config, lights, crossings, recorder))
    }

    /// Wraps already-built actors, e.g. lights carrying a scripted random source.
    pub fn from_actors(
        config: SimulationConfig,
        lights: Vec<TrafficLight>,
        crossings: Vec<PedestrianCrossing>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            config,
            lights: lights
                .into_iter()
                .map(|light| Arc::new(Mutex::new(light)))
                .collect(),
            crossings: crossings
                .into_iter()
                .map(|crossing| Arc::new(Mutex::new(crossing)))
                .collect(),
            recorder,
            running: None,
            manual_override: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn lights(&self) -> &[SharedLight] {
        &self.lights
    }

    pub fn crossings(&self) -> &[SharedCrossing] {
        &self.crossings
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawns one task per actor. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.running.is_some() {
            return Err(SimulationError::AlreadyRunning);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let interval = self.config.tick_interval();
        let mut handles = Vec::with_capacity(self.lights.len() + self.crossings.len());
        for light in &self.lights {
            handles.push(spawn_actor(
                Arc::clone(light),
                Ticker::new(interval, shutdown_rx.clone()),
                Arc::clone(&self.recorder),
            ));
        }
        for crossing in &self.crossings {
            handles.push(spawn_actor(
                Arc::clone(crossing),
                Ticker::new(interval, shutdown_rx.clone()),
                Arc::clone(&self.recorder),
            ));
        }
        self.running = Some(RunningTasks { shutdown, handles });

        log::info!(
            "Simulation started: {} traffic lights, {} pedestrian crossings, tick {:?}",
            self.lights.len(),
            self.crossings.len(),
            interval
        );
        self.recorder.record(&SimulationEvent::Started {
            lights: self.lights.len(),
            crossings: self.crossings.len(),
        });
        Ok(())
    }

    /// Signals every actor task to finish and waits for all of them.
    ///
    /// Every task is drained even when one of them failed; the first failure
    /// is reported afterwards.
    pub async fn stop(&mut self) -> Result<(), SimulationError> {
        let tasks = self.running.take().ok_or(SimulationError::NotRunning)?;
        tasks.shutdown.send_replace(true);

        let mut first_failure = None;
        for handle in tasks.handles {
            if let Err(e) = handle.await {
                log::error!("Actor task failed during shutdown: {}", e);
                first_failure.get_or_insert_with(|| SimulationError::TaskFailed(e.to_string()));
            }
        }

        log::info!("Simulation stopped");
        self.recorder.record(&SimulationEvent::Stopped);
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stops a running simulation, then returns every actor to its initial values.
    pub async fn reset(&mut self) -> Result<(), SimulationError> {
        let stopped = if self.is_running() {
            self.stop().await
        } else {
            Ok(())
        };

        for light in &self.lights {
            lock_actor(light).reset();
        }
        for crossing in &self.crossings {
            lock_actor(crossing).reset();
        }
        self.manual_override.store(false, Ordering::SeqCst);

        log::info!("Simulation reset");
        self.recorder.record(&SimulationEvent::Reset);
        stopped
    }

    /// Advances every actor by one loop body without waiting.
    /// Only valid while the actor tasks are not running.
    pub fn step(&self) -> Result<(), SimulationError> {
        if self.is_running() {
            return Err(SimulationError::AlreadyRunning);
        }
        for light in &self.lights {
            self.advance_actor(light);
        }
        for crossing in &self.crossings {
            self.advance_actor(crossing);
        }
        Ok(())
    }

    fn advance_actor<A: SignalActor>(&self, actor: &Mutex<A>) {
        let events = lock_actor(actor).advance();
        for event in &events {
            self.recorder.record(event);
        }
    }

    /// Samples the vehicle sensor of every traffic light.
    pub fn inject_vehicle(&self) {
        for light in &self.lights {
            let event = {
                let mut light = lock_actor(light);
                let detected = light.detect_vehicle();
                SimulationEvent::Sensor {
                    kind: SensorKind::Vehicle,
                    location: light.location.clone(),
                    detected,
                }
            };
            self.recorder.record(&event);
        }
    }

    /// Samples the emergency sensor of every traffic light.
    pub fn inject_emergency(&self) {
        for light in &self.lights {
            let event = {
                let mut light = lock_actor(light);
                let detected = light.detect_emergency_vehicle();
                SimulationEvent::Sensor {
                    kind: SensorKind::EmergencyVehicle,
                    location: light.location.clone(),
                    detected,
                }
            };
            self.recorder.record(&event);
        }
    }

    /// Presses the button of every crossing. The press is consumed on the crossing's next tick.
    pub fn press_pedestrian_button(&self) {
        for crossing in &self.crossings {
            let location = {
                let mut crossing = lock_actor(crossing);
                crossing.press_button();
                crossing.location.clone()
            };
            self.recorder.record(&SimulationEvent::ButtonPressed { location });
        }
    }

    /// Applies a mode to every crossing. An unknown mode changes nothing and is
    /// either reported or swallowed according to `invalid_mode_policy`.
    pub fn set_pedestrian_mode(&self, mode: &str) -> Result<(), SimulationError> {
        let parsed: CrossingMode = match mode.parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                return match self.config.invalid_mode_policy {
                    InvalidModePolicy::Ignore => {
                        log::warn!("Ignoring pedestrian mode change: {}", err);
                        Ok(())
                    }
                    InvalidModePolicy::Reject => Err(err),
                };
            }
        };

        for crossing in &self.crossings {
            lock_actor(crossing).mode = parsed;
        }
        log::info!("Pedestrian crossing mode set to {}", parsed);
        self.recorder
            .record(&SimulationEvent::ModeChanged { mode: parsed });
        Ok(())
    }

    /// Forces every light GREEN for `manual_override_ticks`, outside the normal cycle.
    pub fn manual_override(&self) {
        let ticks = self.config.manual_override_ticks;
        for light in &self.lights {
            lock_actor(light).force_green(ticks);
        }
        self.manual_override.store(true, Ordering::SeqCst);
        log::info!("Manual override: all traffic lights GREEN for {}s", ticks);
        self.recorder
            .record(&SimulationEvent::ManualOverride { ticks });
    }

    /// Current snapshot of every actor, lights first.
    pub fn snapshots(&self) -> Vec<ActorSnapshot> {
        self.lights
            .iter()
            .map(|light| lock_actor(light).actor_snapshot())
            .chain(
                self.crossings
                    .iter()
                    .map(|crossing| lock_actor(crossing).actor_snapshot()),
            )
            .collect()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            running: self.is_running(),
            manual_override: self.manual_override.load(Ordering::SeqCst),
            traffic_lights: self.lights.len(),
            pedestrian_crossings: self.crossings.len(),
        }
    }
}

impl Drop for SimulationController {
    // Tasks cannot be awaited here; they are told to finish on their own.
    fn drop(&mut self) {
        if let Some(tasks) = &self.running {
            tasks.shutdown.send_replace(true);
        }
    }
}

fn spawn_actor<A: SignalActor>(
    actor: Arc<Mutex<A>>,
    ticker: Ticker,
    recorder: Arc<dyn Recorder>,
) -> JoinHandle<()> {
    tokio::spawn(drive_actor(actor, ticker, recorder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_system::{CrossingState, LightState, LightTiming};
    use crate::monitoring::recorder::MemoryRecorder;
    use crate::sensors::ScriptedRandom;

    fn quiet_light(location: &str) -> TrafficLight {
        TrafficLight::with_random(
            location,
            LightTiming::default(),
            12,
            Box::new(ScriptedRandom::always(false)),
        )
    }

    fn controller(recorder: Arc<MemoryRecorder>) -> SimulationController {
        SimulationController::from_actors(
            SimulationConfig::default(),
            vec![quiet_light("Oak Road"), quiet_light("Elm Road")],
            vec![PedestrianCrossing::new("Oak Crosswalk")],
            recorder,
        )
    }

    #[test]
    fn new_builds_configured_actors() {
        let mut config = SimulationConfig::default();
        config.seed = Some(1);
        config.current_hour = Some(8);
        let controller =
            SimulationController::new(config, Arc::new(MemoryRecorder::new())).unwrap();
        assert_eq!(controller.lights().len(), 2);
        assert_eq!(controller.crossings().len(), 2);
        assert!(lock_actor(&controller.lights()[0]).is_peak_hour());
        assert!(!controller.is_running());
        assert_eq!(controller.config().seed, Some(1));
        assert_eq!(controller.config().current_hour, Some(8));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = SimulationConfig::default();
        config.tick_interval_ms = 0;
        assert!(SimulationController::new(config, Arc::new(MemoryRecorder::new())).is_err());
    }

    #[test]
    fn step_consumes_button_press() {
        let recorder = Arc::new(MemoryRecorder::new());
        let controller = controller(recorder.clone());
        controller.press_pedestrian_button();
        controller.step().unwrap();

        let crossing = lock_actor(&controller.crossings()[0]).snapshot();
        assert_eq!(crossing.state, CrossingState::Walk);
        assert_eq!(crossing.crossing_timer, 10);
        assert!(!crossing.button_pressed);
        assert!(recorder
            .events()
            .iter()
            .any(|e| matches!(e, SimulationEvent::ButtonPressed { location } if location == "Oak Crosswalk")));
    }

    #[test]
    fn manual_override_forces_green() {
        let controller = controller(Arc::new(MemoryRecorder::new()));
        controller.manual_override();
        for light in controller.lights() {
            let light = lock_actor(light);
            assert_eq!(light.state, LightState::Green);
            assert_eq!(light.timer, 5);
        }
        assert!(controller.status().manual_override);
    }

    #[test]
    fn invalid_mode_policy_decides_outcome() {
        let controller = controller(Arc::new(MemoryRecorder::new()));
        assert!(matches!(
            controller.set_pedestrian_mode("express"),
            Err(SimulationError::InvalidModeValue(_))
        ));

        let mut config = SimulationConfig::default();
        config.invalid_mode_policy = InvalidModePolicy::Ignore;
        let lenient = SimulationController::from_actors(
            config,
            Vec::new(),
            vec![PedestrianCrossing::new("Oak Crosswalk")],
            Arc::new(MemoryRecorder::new()),
        );
        lenient.set_pedestrian_mode("priority").unwrap();
        assert!(lenient.set_pedestrian_mode("express").is_ok());
        assert_eq!(
            lock_actor(&lenient.crossings()[0]).mode,
            CrossingMode::Priority
        );
    }

    #[test]
    fn status_line_reads_like_a_label() {
        let controller = controller(Arc::new(MemoryRecorder::new()));
        assert_eq!(
            controller.status().to_string(),
            "Status: Simulation Stopped | Manual Override: OFF | 2 traffic lights, 1 pedestrian crossings"
        );
    }

    #[tokio::test]
    async fn stop_without_start_is_an_error() {
        let mut controller = controller(Arc::new(MemoryRecorder::new()));
        assert!(matches!(
            controller.stop().await,
            Err(SimulationError::NotRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_is_an_error() {
        let mut controller = controller(Arc::new(MemoryRecorder::new()));
        controller.start().unwrap();
        assert!(matches!(
            controller.start(),
            Err(SimulationError::AlreadyRunning)
        ));
        assert!(matches!(controller.step(), Err(SimulationError::AlreadyRunning)));
        controller.stop().await.unwrap();
    }
}

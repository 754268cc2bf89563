use crate::error::SimulationError;
use crate::global_variables::{ACTOR_LOG_SUFFIX, SENSOR_LOG_FILE, SIMULATION_LOG_FILE};
use crate::shared_data::{EventRecord, SimulationEvent};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Sink for everything the controller emits: per-tick snapshots, lifecycle
/// changes and operator actions. Implementations own their own failures.
pub trait Recorder: Send + Sync {
    fn record(&self, event: &SimulationEvent);
}

/// Writes every event through the `log` facade.
#[derive(Debug, Default)]
pub struct LogRecorder;

impl Recorder for LogRecorder {
    fn record(&self, event: &SimulationEvent) {
        match event {
            SimulationEvent::Snapshot(snapshot) => log::info!("{}", snapshot),
            other => log::info!("[{}] {}", other.name(), other.detail()),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<SimulationEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot lines recorded for one location.
    pub fn snapshot_lines(&self, location: &str) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                SimulationEvent::Snapshot(snapshot) if snapshot.location() == location => {
                    Some(snapshot.to_string())
                }
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, event: &SimulationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Append-only CSV logs in one directory:
/// `<location>_log.csv` per actor for snapshots, `simulation_log.csv` for
/// start/stop/reset and `sensor_log.csv` for sensor and operator events.
#[derive(Debug)]
pub struct CsvRecorder {
    dir: PathBuf,
    // serialises appends so rows from different actor tasks never interleave
    write_lock: Mutex<()>,
}

impl CsvRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SimulationError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn simulation_log(&self) -> PathBuf {
        self.dir.join(SIMULATION_LOG_FILE)
    }

    pub fn sensor_log(&self) -> PathBuf {
        self.dir.join(SENSOR_LOG_FILE)
    }

    pub fn actor_log(&self, location: &str) -> PathBuf {
        let stem: String = location
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}{}", stem, ACTOR_LOG_SUFFIX))
    }

    fn path_for(&self, event: &SimulationEvent) -> PathBuf {
        match event {
            SimulationEvent::Snapshot(snapshot) => self.actor_log(snapshot.location()),
            event if event.is_lifecycle() => self.simulation_log(),
            _ => self.sensor_log(),
        }
    }
}

impl Recorder for CsvRecorder {
    fn record(&self, event: &SimulationEvent) {
        let path = self.path_for(event);
        let record = EventRecord::from_event(event);
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = log_to_csv(&path, &record) {
            log::error!("Error logging {} event to {}: {}", record.event, path.display(), e);
        }
    }
}

/// Forwards each event to every inner recorder.
#[derive(Default)]
pub struct FanoutRecorder {
    recorders: Vec<Arc<dyn Recorder>>,
}

impl FanoutRecorder {
    pub fn new(recorders: Vec<Arc<dyn Recorder>>) -> Self {
        Self { recorders }
    }

    pub fn push(&mut self, recorder: Arc<dyn Recorder>) {
        self.recorders.push(recorder);
    }
}

impl Recorder for FanoutRecorder {
    fn record(&self, event: &SimulationEvent) {
        for recorder in &self.recorders {
            recorder.record(event);
        }
    }
}

// Appends one record; the header row is only written when the file is new.
fn log_to_csv<T: Serialize>(path: &Path, record: &T) -> Result<(), SimulationError> {
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Reads back every record of a CSV log written by `CsvRecorder`.
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<EventRecord>, SimulationError> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: EventRecord = result?;
        records.push(record);
    }
    Ok(records)
}

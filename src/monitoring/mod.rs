// monitoring/mod.rs
pub mod admin_cli;
pub mod recorder;

pub use recorder::{read_log, CsvRecorder, FanoutRecorder, LogRecorder, MemoryRecorder, Recorder};

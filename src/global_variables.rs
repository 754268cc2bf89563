// Tick cadence
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

// Traffic light timings (ticks)
pub const MIN_GREEN_TIME: u32 = 5;
pub const MAX_GREEN_TIME: u32 = 10;
pub const YELLOW_BASE_TIME: u32 = 3;
pub const PEAK_HOURS: (u32, u32) = (7, 9);
pub const VEHICLE_ADJUSTMENT_FACTOR: f64 = 1.5;
pub const MANUAL_OVERRIDE_TICKS: u32 = 5;

// Sensor probabilities
pub const VEHICLE_PROBABILITY: f64 = 0.5;
pub const EMERGENCY_PROBABILITY: f64 = 1.0 / 11.0;

// Pedestrian crossing timings (ticks)
pub const CROSSING_DURATION: u32 = 10;
pub const WAITING_DURATION: u32 = 5;

// Log file names
pub const SIMULATION_LOG_FILE: &str = "simulation_log.csv";
pub const SENSOR_LOG_FILE: &str = "sensor_log.csv";
pub const ACTOR_LOG_SUFFIX: &str = "_log.csv";

// Default actors
pub const DEFAULT_TRAFFIC_LIGHTS: [&str; 2] = ["Main Street", "Second Avenue"];
pub const DEFAULT_PEDESTRIAN_CROSSINGS: [&str; 2] = ["Main Street Crosswalk", "Second Avenue Crosswalk"];

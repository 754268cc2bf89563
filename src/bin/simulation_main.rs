// simulation_main.rs
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use traffic_signal_sim::monitoring::admin_cli::{print_snapshots, run_cli};
use traffic_signal_sim::monitoring::{CsvRecorder, FanoutRecorder, LogRecorder, Recorder};
use traffic_signal_sim::{SimulationConfig, SimulationController, SimulationError};

#[derive(Parser)]
#[command(name = "simulation_main")]
#[command(about = "Traffic light and pedestrian crossing simulation")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the append-only CSV logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run headless for this many ticks instead of opening the admin menu
    #[arg(long)]
    ticks: Option<u32>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Hour of day used for peak-hour detection
    #[arg(long)]
    hour: Option<u32>,
}

impl Cli {
    // Flags given on the command line win over the configuration file.
    fn apply_overrides(&self, config: &mut SimulationConfig) {
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.hour.is_some() {
            config.current_hour = self.hour;
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Simulation error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), SimulationError> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    cli.apply_overrides(&mut config);

    let mut recorders: Vec<Arc<dyn Recorder>> = vec![Arc::new(LogRecorder)];
    if let Some(dir) = &config.log_dir {
        recorders.push(Arc::new(CsvRecorder::new(dir)?));
    }
    let mut controller =
        SimulationController::new(config, Arc::new(FanoutRecorder::new(recorders)))?;
    let log_dir = controller.config().log_dir.clone();

    match cli.ticks {
        Some(ticks) => {
            println!("Running simulation headless for {} ticks...", ticks);
            controller.start()?;
            let run_for = controller.config().tick_interval() * ticks;
            tokio::select! {
                _ = tokio::time::sleep(run_for) => {}
                _ = tokio::signal::ctrl_c() => println!("Interrupted."),
            }
            controller.stop().await?;
            println!("=== Final State ===");
            println!("{}", controller.status());
            print_snapshots(&controller);
            Ok(())
        }
        None => run_cli(&mut controller, log_dir.as_deref()).await,
    }
}

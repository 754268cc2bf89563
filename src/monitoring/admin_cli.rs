use crate::control_system::CrossingMode;
use crate::error::SimulationError;
use crate::global_variables::{SENSOR_LOG_FILE, SIMULATION_LOG_FILE};
use crate::monitoring::recorder::read_log;
use crate::simulation_engine::SimulationController;
use rand::Rng;
use std::io::{stdout, Write};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Start,
    Stop,
    Reset,
    SimulateVehicle,
    SimulateEmergency,
    PressButton,
    SetMode,
    ManualOverride,
    ShowStatus,
    ViewEventLog,
    ViewSimulationLog,
    Exit,
}

impl MenuCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().parse::<u32>().ok()? {
            1 => Some(MenuCommand::Start),
            2 => Some(MenuCommand::Stop),
            3 => Some(MenuCommand::Reset),
            4 => Some(MenuCommand::SimulateVehicle),
            5 => Some(MenuCommand::SimulateEmergency),
            6 => Some(MenuCommand::PressButton),
            7 => Some(MenuCommand::SetMode),
            8 => Some(MenuCommand::ManualOverride),
            9 => Some(MenuCommand::ShowStatus),
            10 => Some(MenuCommand::ViewEventLog),
            11 => Some(MenuCommand::ViewSimulationLog),
            12 => Some(MenuCommand::Exit),
            _ => None,
        }
    }
}

fn print_menu() {
    println!("\nTraffic Signal Simulation Admin CLI");
    println!("1. Start Simulation");
    println!("2. Stop Simulation");
    println!("3. Reset Simulation");
    println!("4. Simulate Vehicle");
    println!("5. Simulate Emergency Vehicle");
    println!("6. Press Pedestrian Button");
    println!("7. Set Pedestrian Mode");
    println!("8. Manual Override");
    println!("9. Show Status");
    println!("10. View Event Log");
    println!("11. View Simulation Log");
    println!("12. Exit");
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = stdout().flush();
}

/// Runs the admin menu on stdin until the operator exits or input ends.
pub async fn run_cli(
    controller: &mut SimulationController,
    log_dir: Option<&Path>,
) -> Result<(), SimulationError> {
    run_cli_with(controller, log_dir, BufReader::new(tokio::io::stdin())).await
}

/// Same as `run_cli`, reading commands from any buffered async reader.
/// A running simulation is stopped before returning.
pub async fn run_cli_with<R: AsyncBufRead + Unpin>(
    controller: &mut SimulationController,
    log_dir: Option<&Path>,
    input: R,
) -> Result<(), SimulationError> {
    let mut lines = input.lines();
    loop {
        print_menu();
        prompt("Enter your choice: ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = MenuCommand::parse(&line) else {
            println!("Invalid choice. Try again.");
            continue;
        };
        match command {
            MenuCommand::Start => match controller.start() {
                Ok(()) => println!("{}", controller.status()),
                Err(e) => eprintln!("Error starting simulation: {}", e),
            },
            MenuCommand::Stop => match controller.stop().await {
                Ok(()) => println!("{}", controller.status()),
                Err(e) => eprintln!("Error stopping simulation: {}", e),
            },
            MenuCommand::Reset => {
                if let Err(e) = controller.reset().await {
                    eprintln!("Error resetting simulation: {}", e);
                }
                print_snapshots(controller);
            }
            MenuCommand::SimulateVehicle => {
                controller.inject_vehicle();
                print_snapshots(controller);
            }
            MenuCommand::SimulateEmergency => {
                controller.inject_emergency();
                print_snapshots(controller);
            }
            MenuCommand::PressButton => {
                controller.press_pedestrian_button();
                println!("Pedestrian button pressed");
            }
            MenuCommand::SetMode => {
                prompt("Enter mode (normal/priority/manual, blank for random): ");
                let entered = lines.next_line().await?.unwrap_or_default();
                let mode = if entered.trim().is_empty() {
                    random_mode().to_string()
                } else {
                    entered
                };
                match controller.set_pedestrian_mode(&mode) {
                    Ok(()) => println!("Pedestrian crossing mode set to {}", mode.trim()),
                    Err(e) => eprintln!("Error setting pedestrian mode: {}", e),
                }
            }
            MenuCommand::ManualOverride => {
                controller.manual_override();
                println!("Manual Override: ON");
            }
            MenuCommand::ShowStatus => {
                println!("{}", controller.status());
                print_snapshots(controller);
            }
            MenuCommand::ViewEventLog => show_log(log_dir, SENSOR_LOG_FILE),
            MenuCommand::ViewSimulationLog => show_log(log_dir, SIMULATION_LOG_FILE),
            MenuCommand::Exit => {
                println!("Exiting CLI.");
                break;
            }
        }
    }

    if controller.is_running() {
        controller.stop().await?;
    }
    Ok(())
}

/// The mode-button behaviour: pick any of the three modes.
pub fn random_mode() -> CrossingMode {
    let index = rand::rng().random_range(0..CrossingMode::ALL.len());
    CrossingMode::ALL[index]
}

pub fn print_snapshots(controller: &SimulationController) {
    for snapshot in controller.snapshots() {
        println!("{}", snapshot);
    }
}

fn show_log(log_dir: Option<&Path>, file_name: &str) {
    let Some(dir) = log_dir else {
        println!("File logging is disabled (start with --log-dir to enable it).");
        return;
    };
    match read_log(dir.join(file_name)) {
        Ok(records) if records.is_empty() => println!("{} is empty.", file_name),
        Ok(records) => {
            println!("{}:", file_name);
            for record in records {
                println!("{}: {}", record.timestamp, record.detail);
            }
        }
        Err(_) => println!("Log file not found."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_numbers_map_to_commands() {
        assert_eq!(MenuCommand::parse("1"), Some(MenuCommand::Start));
        assert_eq!(MenuCommand::parse(" 7 \n"), Some(MenuCommand::SetMode));
        assert_eq!(MenuCommand::parse("12"), Some(MenuCommand::Exit));
        assert_eq!(MenuCommand::parse("13"), None);
        assert_eq!(MenuCommand::parse("start"), None);
    }

    #[test]
    fn random_mode_is_a_known_mode() {
        for _ in 0..20 {
            assert!(CrossingMode::ALL.contains(&random_mode()));
        }
    }
}

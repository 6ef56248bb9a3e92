// src/main.rs
// Entry point for the cart AGV navigator: loads the floor configuration, starts the
// control loop on its own thread and serves position fixes, line readings and missions
// from stdin.

// Imports dependencies and crate modules.
// - env_logger: Logging for debugging (RUST_LOG=info).
// - cart_agv: configuration, executor, controller and console protocol.
use cart_agv::{
    AgvConfig, ConsoleRequest, LineCorrection, MissionController, SerialActuator,
    SharedLineSignal,
};
use log::{error, info, warn};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const DEFAULT_CONFIG: &str = "config/agv.yaml";

/// Loads the configuration named on the command line, falling back to
/// `config/agv.yaml` and then to the built-in shop floor.
fn load_config() -> Result<AgvConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Ok(AgvConfig::load(&path)?)
        }
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG);
            Ok(AgvConfig::load(DEFAULT_CONFIG)?)
        }
        None => {
            warn!("No configuration given, using the built-in 7x7 floor");
            Ok(AgvConfig::default())
        }
    }
}

/// Opens the drive link: the configured device node, or stdout
fn open_drive_link(config: &AgvConfig) -> Result<Box<dyn Write + Send>, Box<dyn Error>> {
    match &config.actuator.device {
        Some(device) => {
            info!("Writing drive commands to {}", device);
            Ok(Box::new(OpenOptions::new().write(true).open(device)?))
        }
        None => {
            info!("Writing drive commands to stdout");
            Ok(Box::new(io::stdout()))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging for debugging
    env_logger::init();
    info!("Starting cart AGV navigator...");

    let config = load_config()?;
    let actuator = SerialActuator::new(open_drive_link(&config)?);
    let line_signal = SharedLineSignal::new();
    let executor = config.build_executor(actuator, line_signal.clone())?;
    let controller = MissionController::new(executor);

    let shutdown = Arc::new(AtomicBool::new(false));
    let control_loop = controller.spawn(
        Duration::from_millis(config.cycle_ms.max(1)),
        Arc::clone(&shutdown),
    );
    // Fixes are applied on their own thread; the console only queues them
    let (fix_tx, fix_rx) = mpsc::channel();
    let fix_feed = controller.spawn_fix_feed(fix_rx);

    // Main loop: one console request per line until EOF or `quit`
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let request = match line.parse::<ConsoleRequest>() {
            Ok(request) => request,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match request {
            ConsoleRequest::Fix(fix) => {
                if fix_tx.send(fix).is_err() {
                    error!("Fix feed is gone, dropping fix {}", fix.cell);
                }
            }
            ConsoleRequest::Line(direction) => {
                line_signal.publish(LineCorrection::from_direction(direction));
            }
            ConsoleRequest::Mission(targets) => controller.set_mission(targets),
            ConsoleRequest::Status => match serde_yaml::to_string(&controller.status()) {
                Ok(text) => eprint!("{}", text),
                Err(e) => error!("Failed to render status: {}", e),
            },
            ConsoleRequest::Stop => {
                if let Err(e) = controller.stop() {
                    error!("Failed to stop: {}", e);
                }
            }
            ConsoleRequest::Quit => break,
        }
    }

    drop(fix_tx);
    if fix_feed.join().is_err() {
        error!("Fix feed panicked");
    }
    shutdown.store(true, Ordering::Relaxed);
    if control_loop.join().is_err() {
        error!("Control loop panicked");
    }
    if let Err(e) = controller.stop() {
        error!("Failed to send final stop: {}", e);
    }

    info!("Cart AGV navigator shut down");
    Ok(())
}

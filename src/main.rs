//! # Balance Bridge
//!
//! Turn a Wii Balance Board into a virtual gamepad.
//!
//! This application reads the board's four pressure sensors over HID,
//! converts them to calibrated weights, and drives a uinput virtual
//! gamepad from the configured pressure mappings.

use anyhow::Result;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, error, info, warn};
use tracing_subscriber;

use balance_bridge::board::session::{SessionHandle, SessionNotification};
use balance_bridge::config::Config;
use balance_bridge::mapping::{InputMap, MappingEngine};
use balance_bridge::pad::UinputGamepad;
use balance_bridge::telemetry::SampleLogger;

/// Default config file path when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of samples between status log messages
const LOG_INTERVAL_SAMPLES: u64 = 300;

/// Main entry point for the Balance Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first CLI argument, or `config/default.toml`)
///    - Create the uinput virtual gamepad
///    - Spawn the board session worker
///
/// 2. **Main Loop**
///    - React to session notifications: run each weight sample through the
///      mapping engine and the sample logger, auto-trigger the first tare
///      when the board reports ready
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the session worker and join it (device closed, LED off)
///    - Log total sample count
///    - Clean exit
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is malformed
/// - The virtual gamepad cannot be created (uinput permissions)
/// - The board session ends with a fatal error
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Balance Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)?;

    let mut logger = SampleLogger::new(&config.telemetry)?;

    let pad = UinputGamepad::create()?;
    let mut engine = MappingEngine::new(InputMap::from_config(&config.input), pad);

    let (notify_tx, mut notifications) = unbounded_channel();
    let session = SessionHandle::spawn(config.board.clone(), notify_tx)?;

    let mut sample_count: u64 = 0;
    let mut session_error: Option<String> = None;

    // Main loop
    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    break;
                };
                match notification {
                    SessionNotification::Status(status) => {
                        debug!("Session: {}", status);
                    }
                    SessionNotification::ReadyToTare => {
                        info!("Board ready; taring now. Step off the board.");
                        session.tare();
                    }
                    SessionNotification::TareComplete(true) => {
                        info!("Tare complete. Step on the board.");
                    }
                    SessionNotification::TareComplete(false) => {
                        warn!("Tare collected no samples, retrying...");
                        session.tare();
                    }
                    SessionNotification::Sample(sample) => {
                        engine.process(&sample);
                        if let Err(e) = logger.log(&sample) {
                            warn!("Sample log write failed: {}", e);
                        }

                        sample_count += 1;
                        if sample_count % LOG_INTERVAL_SAMPLES == 0 {
                            info!(
                                "{} samples processed (total {:.2} kg, CoM {:.2},{:.2})",
                                sample_count,
                                sample.total_kg,
                                sample.center_of_mass.0,
                                sample.center_of_mass.1,
                            );
                        }
                    }
                    SessionNotification::Error(e) => {
                        error!("Session error: {}", e);
                        session_error = Some(e);
                    }
                    SessionNotification::Finished => {
                        info!("Session finished");
                        break;
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    session.join();
    info!("Total samples processed: {}", sample_count);

    if let Some(e) = session_error {
        anyhow::bail!("session ended with error: {}", e);
    }
    Ok(())
}

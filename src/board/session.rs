//! # Board Session Worker
//!
//! Owns one connection to the board from open to close and runs the
//! connect → calibrate → stream → tare → weigh sequence on a dedicated
//! worker thread.
//!
//! ## Lifecycle
//!
//! ```text
//! Disconnected -> Connecting -> Calibrating -> ModeConfiguring
//!     -> ReadyUntared -> Weighing <-> (Tare) -> Stopping -> Disconnected
//! ```
//!
//! Failures while connecting, calibrating or configuring the data mode are
//! terminal: the session emits an error notification, closes the device and
//! finishes. There is no automatic retry; the controller starts a fresh
//! session (a rescan) when the operator asks for one. Weighing begins only
//! after a successful tare.
//!
//! ## Ownership and communication
//!
//! The worker exclusively owns the channel, the zero point and the
//! smoothing state. Everything flows out through one-way
//! [`SessionNotification`]s; the only inputs are [`SessionCommand::Tare`]
//! and [`SessionCommand::Stop`], honored cooperatively inside the loop.
//! `Stop` guarantees loop exit, device closure and a final
//! [`SessionNotification::Finished`], so a controller can safely join the
//! worker before spawning a replacement — two sessions never race on the
//! same device.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::calibration::{CalibrationTable, ZeroPoint};
use super::channel::{BoardChannel, HidBoardChannel};
use super::drift::DriftMonitor;
use super::protocol::{
    parse_memory_report, parse_sensor_report, CALIBRATION_BLOB_LEN, CALIBRATION_BLOCK_HIGH,
    CALIBRATION_BLOCK_LOW, LED_OFF, LED_ON, READ_CALIBRATION_CMD, REPORT_LEN, SET_DATA_MODE_CMD,
    SET_LED_REPORT,
};
use super::sample::{Quadrant, WeightSample};
use super::smoothing::SmoothingWindow;
use crate::config::BoardConfig;
use crate::error::{BalanceBridgeError, Result};

/// Overall budget for collecting the two calibration blocks.
const CALIBRATION_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the untared loop waits for a command before looping again.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// One-way notifications from the session worker.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    /// Human-readable progress for the presentation layer.
    Status(String),
    /// A fatal session error; `Finished` follows.
    Error(String),
    /// Connected, calibrated and streaming; waiting for the first tare.
    ReadyToTare,
    /// One processed weight sample.
    Sample(WeightSample),
    /// Result of a tare window (false = no samples collected).
    TareComplete(bool),
    /// The worker has exited and the device is closed.
    Finished,
}

/// Commands accepted by the session worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Re-zero the board. Valid any time after `ReadyToTare`.
    Tare,
    /// Exit the loop and close the device.
    Stop,
}

/// Whether a tare window ran to completion or was interrupted by `Stop`.
#[derive(Debug, PartialEq, Eq)]
enum TareFlow {
    Completed,
    Stop,
}

/// A single board session, generic over the transport for testability.
pub struct BoardSession<C: BoardChannel> {
    channel: C,
    config: BoardConfig,
    calibration: Option<CalibrationTable>,
    zero_point: ZeroPoint,
    is_tared: bool,
    windows: [SmoothingWindow; 4],
    drift: DriftMonitor,
    notifications: UnboundedSender<SessionNotification>,
    commands: Receiver<SessionCommand>,
}

impl<C: BoardChannel> BoardSession<C> {
    /// Creates a session over an already-open channel.
    pub fn new(
        channel: C,
        config: BoardConfig,
        notifications: UnboundedSender<SessionNotification>,
        commands: Receiver<SessionCommand>,
    ) -> Self {
        let windows =
            std::array::from_fn(|_| SmoothingWindow::new(config.averaging_samples));
        let drift = DriftMonitor::new(
            config.dead_zone_kg,
            config.auto_tare_drift_multiplier,
            config.auto_tare_drift_sec,
        );
        Self {
            channel,
            config,
            calibration: None,
            zero_point: [0.0; 4],
            is_tared: false,
            windows,
            drift,
            notifications,
            commands,
        }
    }

    /// Run the session to completion.
    ///
    /// Consumes the session; always ends by disabling the LED, dropping the
    /// channel and emitting [`SessionNotification::Finished`].
    pub fn run(mut self) {
        if let Err(e) = self.run_session() {
            error!("Session failed: {}", e);
            self.notify(SessionNotification::Error(e.to_string()));
        }
        self.set_led(false);
        self.status("Disconnected");
        self.notify(SessionNotification::Finished);
    }

    fn run_session(&mut self) -> Result<()> {
        self.set_led(true);

        self.status("Reading calibration data...");
        let calibration = self.read_calibration(CALIBRATION_TIMEOUT)?;
        self.calibration = Some(calibration);

        self.status("Setting data mode...");
        self.set_streaming_mode()?;

        self.status("Board ready, tare to begin weighing");
        self.notify(SessionNotification::ReadyToTare);

        self.weighing_loop()
    }

    fn notify(&self, notification: SessionNotification) {
        // The receiver going away just means nobody is listening anymore
        let _ = self.notifications.send(notification);
    }

    fn status(&self, message: &str) {
        info!("{}", message);
        self.notify(SessionNotification::Status(message.to_string()));
    }

    /// Set the player-1 LED. Failure is a warning, never fatal.
    fn set_led(&mut self, on: bool) {
        let payload = if on { LED_ON } else { LED_OFF };
        if let Err(e) = self.channel.write(&[SET_LED_REPORT, payload]) {
            warn!("Could not set LED: {}", e);
            self.notify(SessionNotification::Status(format!(
                "Warning: could not set LED ({})",
                e
            )));
        }
    }

    /// Request and assemble the 32-byte factory calibration blob.
    ///
    /// Polls for the two memory blocks at 0x0020 and 0x0030 under `budget`.
    /// A non-zero error nibble in any response, or fewer than two blocks by
    /// the deadline, aborts the session.
    fn read_calibration(&mut self, budget: Duration) -> Result<CalibrationTable> {
        self.channel
            .write(&READ_CALIBRATION_CMD)
            .map_err(|e| {
                BalanceBridgeError::Calibration(format!("calibration request failed: {}", e))
            })?;

        let mut low: Option<[u8; 16]> = None;
        let mut high: Option<[u8; 16]> = None;
        let deadline = Instant::now() + budget;

        while (low.is_none() || high.is_none()) && Instant::now() < deadline {
            let mut buf = [0u8; REPORT_LEN];
            let len = self
                .channel
                .read_timeout(&mut buf, self.config.read_timeout_ms as i32)
                .map_err(|e| {
                    BalanceBridgeError::Calibration(format!("calibration read failed: {}", e))
                })?;
            if len == 0 {
                continue;
            }

            let Some(block) = parse_memory_report(&buf[..len]) else {
                continue;
            };
            if block.error != 0 {
                return Err(BalanceBridgeError::Calibration(format!(
                    "board reported error 0x{:x} reading calibration",
                    block.error
                )));
            }
            match block.address {
                CALIBRATION_BLOCK_LOW => low = Some(block.data),
                CALIBRATION_BLOCK_HIGH => high = Some(block.data),
                other => debug!("Ignoring memory block at 0x{:04x}", other),
            }
        }

        let (Some(low), Some(high)) = (low, high) else {
            return Err(BalanceBridgeError::Calibration(
                "timed out waiting for calibration blocks".to_string(),
            ));
        };

        let mut blob = [0u8; CALIBRATION_BLOB_LEN];
        blob[..16].copy_from_slice(&low);
        blob[16..].copy_from_slice(&high);
        Ok(CalibrationTable::from_blob(&blob))
    }

    /// Tell the board to start streaming sensor reports.
    fn set_streaming_mode(&mut self) -> Result<()> {
        self.channel.write(&SET_DATA_MODE_CMD).map_err(|e| {
            BalanceBridgeError::SessionIo(format!("failed to set data mode: {}", e))
        })
    }

    fn weighing_loop(&mut self) -> Result<()> {
        loop {
            while let Ok(command) = self.commands.try_recv() {
                match command {
                    SessionCommand::Stop => return Ok(()),
                    SessionCommand::Tare => {
                        if self.tare_and_continue()? == TareFlow::Stop {
                            return Ok(());
                        }
                    }
                }
            }

            if self.is_tared {
                if let Some(sample) = self.poll_once()? {
                    self.notify(SessionNotification::Sample(sample));

                    if self.drift.observe(sample.total_kg, Instant::now()) {
                        self.status("Auto-taring to correct drift...");
                        if self.tare_and_continue()? == TareFlow::Stop {
                            return Ok(());
                        }
                    }
                }
            } else {
                // Nothing to emit until the first tare; wait on the command
                // channel instead of spinning
                match self.commands.recv_timeout(IDLE_WAIT) {
                    Ok(SessionCommand::Stop) => return Ok(()),
                    Ok(SessionCommand::Tare) => {
                        if self.tare_and_continue()? == TareFlow::Stop {
                            return Ok(());
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return Ok(()),
                }
            }
        }
    }

    /// Run a tare window, treating a failed tare (no samples) as
    /// recoverable: the session keeps running and the operator may simply
    /// tare again.
    fn tare_and_continue(&mut self) -> Result<TareFlow> {
        match self.perform_tare() {
            Ok(flow) => Ok(flow),
            Err(e @ BalanceBridgeError::Tare) => {
                warn!("{}", e);
                self.notify(SessionNotification::TareComplete(false));
                Ok(TareFlow::Completed)
            }
            Err(e) => Err(e),
        }
    }

    /// Sample the unloaded board and replace the zero point wholesale.
    ///
    /// Clears the smoothing windows first, suppresses sample emission for
    /// the window, and discards malformed reports. Collecting zero samples
    /// fails with [`BalanceBridgeError::Tare`] and leaves the zero point
    /// unchanged.
    fn perform_tare(&mut self) -> Result<TareFlow> {
        self.drift.reset();
        self.is_tared = false;
        for window in &mut self.windows {
            window.clear();
        }
        self.status("Taring, step off the board");

        let mut sums = [0f64; 4];
        let mut count: u32 = 0;
        let deadline = Instant::now() + Duration::from_secs_f32(self.config.tare_duration_sec);

        while Instant::now() < deadline {
            if let Ok(SessionCommand::Stop) = self.commands.try_recv() {
                return Ok(TareFlow::Stop);
            }

            let mut buf = [0u8; REPORT_LEN];
            let len = self
                .channel
                .read_timeout(&mut buf, self.config.read_timeout_ms as i32)
                .map_err(|e| {
                    BalanceBridgeError::SessionIo(format!("read failed during tare: {}", e))
                })?;
            if len == 0 {
                continue;
            }
            if let Some(raw) = parse_sensor_report(&buf[..len]) {
                for i in 0..4 {
                    sums[i] += raw[i] as f64;
                }
                count += 1;
            }
        }

        if count == 0 {
            return Err(BalanceBridgeError::Tare);
        }

        self.zero_point =
            std::array::from_fn(|i| (sums[i] / f64::from(count)) as f32);
        self.is_tared = true;
        debug!("Tare complete over {} samples: {:?}", count, self.zero_point);
        self.notify(SessionNotification::TareComplete(true));
        Ok(TareFlow::Completed)
    }

    /// Read and process at most one sensor report.
    ///
    /// Returns `None` on a read timeout or a non-sensor report; the caller
    /// just polls again. Only transport failures are errors.
    fn poll_once(&mut self) -> Result<Option<WeightSample>> {
        let mut buf = [0u8; REPORT_LEN];
        let len = self
            .channel
            .read_timeout(&mut buf, self.config.read_timeout_ms as i32)
            .map_err(|e| BalanceBridgeError::SessionIo(format!("read failed: {}", e)))?;
        if len == 0 {
            return Ok(None);
        }

        let Some(raw) = parse_sensor_report(&buf[..len]) else {
            return Ok(None);
        };
        let Some(calibration) = self.calibration else {
            return Ok(None);
        };

        let mut means = [0f32; 4];
        for quadrant in Quadrant::ALL {
            let i = quadrant as usize;
            let kg = calibration.weight_kg(quadrant, raw[i], self.zero_point[i]);
            self.windows[i].push(kg);
            means[i] = self.windows[i].mean();
        }

        Ok(Some(WeightSample::from_quadrants(
            means,
            self.config.dead_zone_kg,
        )))
    }
}

/// Controller-side handle to a running session worker.
///
/// Dropping the handle stops the worker and joins it, so replacing a
/// session (rescan) can never leave two workers racing on the device.
pub struct SessionHandle {
    commands: Sender<SessionCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Spawn a session worker that opens the first Balance Board found.
    ///
    /// Connection happens on the worker: an unopenable device surfaces as
    /// `Error` + `Finished` notifications, never as a panic or a retry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker thread itself cannot be spawned.
    pub fn spawn(
        config: BoardConfig,
        notifications: UnboundedSender<SessionNotification>,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("board-session".to_string())
            .spawn(move || {
                let _ = notifications.send(SessionNotification::Status(
                    "Connecting to Balance Board...".to_string(),
                ));
                let channel = match HidBoardChannel::open() {
                    Ok(channel) => channel,
                    Err(e) => {
                        error!("{}", e);
                        let _ = notifications.send(SessionNotification::Error(e.to_string()));
                        let _ = notifications.send(SessionNotification::Finished);
                        return;
                    }
                };
                BoardSession::new(channel, config, notifications, command_rx).run();
            })?;

        Ok(Self {
            commands: command_tx,
            worker: Some(worker),
        })
    }

    /// Request a tare. No-op if the worker already exited.
    pub fn tare(&self) {
        let _ = self.commands.send(SessionCommand::Tare);
    }

    /// Request the worker to stop. Returns immediately; use
    /// [`SessionHandle::join`] to wait for the device to be released.
    pub fn stop(&self) {
        let _ = self.commands.send(SessionCommand::Stop);
    }

    /// Stop the worker and wait for it to release the device.
    pub fn join(mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Session worker panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

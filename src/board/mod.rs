//! # Board Module
//!
//! Balance Board acquisition: everything between the HID transport and the
//! emitted [`sample::WeightSample`] stream.
//!
//! This module handles:
//! - Board connection over HID via a narrow channel trait
//! - Report protocol constants and parsing
//! - Factory calibration decode and raw-to-kg conversion
//! - Zero-point (tare) tracking and rolling-average smoothing
//! - Automatic drift correction
//! - The dedicated session worker and its notification/command channels

pub mod calibration;
pub mod channel;
pub mod drift;
pub mod protocol;
pub mod sample;
pub mod session;
pub mod smoothing;

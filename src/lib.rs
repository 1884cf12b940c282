//! # Balance Bridge Library
//!
//! Turn a Wii Balance Board into a virtual gamepad.
//!
//! This library reads the board's four pressure sensors over HID, converts
//! raw samples into calibrated per-quadrant weight with total weight and
//! center of mass, and maps sustained pressure patterns onto a uinput
//! virtual gamepad (buttons, d-pad and analog stick).

pub mod board;
pub mod config;
pub mod error;
pub mod mapping;
pub mod pad;
pub mod telemetry;

//! # Mapping Module
//!
//! Pressure-to-controller input mapping.
//!
//! This module handles:
//! - The mapping vocabulary (buttons, d-pad, stick directions, pairs)
//! - Per-quadrant thresholds and press states
//! - Combination-over-individual arbitration with per-cycle claiming
//! - Diffing against the previously asserted pad state

pub mod actions;
pub mod engine;

pub use engine::{InputMap, MappingEngine};

//! # Input Mapping Engine
//!
//! Converts weight samples into virtual pad state.
//!
//! ## Per-cycle algorithm
//!
//! 1. A quadrant is *pressed* when its weight is strictly above its
//!    threshold.
//! 2. **Combination pass** (priority): the six pairs are evaluated in
//!    [`QuadrantPair::EVALUATION_ORDER`]. A pair fires when both quadrants
//!    are pressed, neither is claimed yet this cycle, and the pair has a
//!    mapping; firing applies the pair's effect and claims both quadrants.
//! 3. **Individual pass**: every pressed, unclaimed quadrant with a button
//!    mapping contributes its button.
//! 4. **Diff**: press what is newly wanted, release whatever was asserted
//!    last cycle and is no longer wanted. The stick is a plain register and
//!    is written every cycle; (0, 0) is the "no combo" rest value.
//! 5. Everything commits as one batch.
//!
//! A button fed by two quadrants stays pressed while either source is
//! pressed. Mapping edits through the setters apply from the next cycle.
//! Sink failures are logged and swallowed: mapping has no error states and
//! never blocks on the pad.

use std::collections::BTreeSet;

use tracing::warn;

use super::actions::{ComboAction, ComboEffect, DpadDirection, GamepadButton, QuadrantPair};
use crate::board::sample::{Quadrant, WeightSample};
use crate::config::InputConfig;
use crate::pad::ControllerSink;

/// Per-quadrant thresholds and mappings consumed by the engine.
///
/// Immutable inside the engine; the only mutation paths are the narrow
/// setters below, driven by the presentation layer.
#[derive(Debug, Clone)]
pub struct InputMap {
    thresholds: [f32; 4],
    buttons: [Option<GamepadButton>; 4],
    combos: [Option<ComboAction>; 6],
}

impl Default for InputMap {
    /// All thresholds at 10 kg, no mappings.
    fn default() -> Self {
        Self {
            thresholds: [10.0; 4],
            buttons: [None; 4],
            combos: [None; 6],
        }
    }
}

impl InputMap {
    /// Build a map from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &InputConfig) -> Self {
        let mut map = Self::default();

        map.thresholds[Quadrant::TopRight as usize] = config.thresholds.top_right;
        map.thresholds[Quadrant::BottomRight as usize] = config.thresholds.bottom_right;
        map.thresholds[Quadrant::TopLeft as usize] = config.thresholds.top_left;
        map.thresholds[Quadrant::BottomLeft as usize] = config.thresholds.bottom_left;

        map.buttons[Quadrant::TopRight as usize] = config.buttons.top_right;
        map.buttons[Quadrant::BottomRight as usize] = config.buttons.bottom_right;
        map.buttons[Quadrant::TopLeft as usize] = config.buttons.top_left;
        map.buttons[Quadrant::BottomLeft as usize] = config.buttons.bottom_left;

        map.combos[QuadrantPair::Top.index()] = config.combos.top;
        map.combos[QuadrantPair::Bottom.index()] = config.combos.bottom;
        map.combos[QuadrantPair::Left.index()] = config.combos.left;
        map.combos[QuadrantPair::Right.index()] = config.combos.right;
        map.combos[QuadrantPair::DiagonalTlBr.index()] = config.combos.diagonal_tl_br;
        map.combos[QuadrantPair::DiagonalTrBl.index()] = config.combos.diagonal_tr_bl;

        map
    }

    /// Press threshold for a quadrant, in kg.
    #[must_use]
    pub fn threshold(&self, quadrant: Quadrant) -> f32 {
        self.thresholds[quadrant as usize]
    }

    pub fn set_threshold(&mut self, quadrant: Quadrant, kg: f32) {
        self.thresholds[quadrant as usize] = kg;
    }

    /// Button mapped to a quadrant, if any.
    #[must_use]
    pub fn button(&self, quadrant: Quadrant) -> Option<GamepadButton> {
        self.buttons[quadrant as usize]
    }

    pub fn set_button(&mut self, quadrant: Quadrant, button: Option<GamepadButton>) {
        self.buttons[quadrant as usize] = button;
    }

    /// Combo action mapped to a pair, if any.
    #[must_use]
    pub fn combo(&self, pair: QuadrantPair) -> Option<ComboAction> {
        self.combos[pair.index()]
    }

    pub fn set_combo(&mut self, pair: QuadrantPair, action: Option<ComboAction>) {
        self.combos[pair.index()] = action;
    }

    /// Press state per quadrant: weight strictly greater than threshold.
    #[must_use]
    pub fn press_states(&self, sample: &WeightSample) -> [bool; 4] {
        std::array::from_fn(|i| sample.quadrants_kg[i] > self.thresholds[i])
    }
}

/// A digital output the engine can hold asserted across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PadOutput {
    Button(GamepadButton),
    Dpad(DpadDirection),
}

/// Converts each weight sample into a minimal pad-state diff.
pub struct MappingEngine<S: ControllerSink> {
    map: InputMap,
    sink: S,
    asserted: BTreeSet<PadOutput>,
}

impl<S: ControllerSink> MappingEngine<S> {
    /// Creates an engine over a pad sink.
    pub fn new(map: InputMap, sink: S) -> Self {
        Self {
            map,
            sink,
            asserted: BTreeSet::new(),
        }
    }

    /// The current mapping configuration.
    #[must_use]
    pub fn map(&self) -> &InputMap {
        &self.map
    }

    /// Mutable access for runtime edits; changes apply from the next cycle.
    pub fn map_mut(&mut self) -> &mut InputMap {
        &mut self.map
    }

    /// Run one mapping cycle for a sample and commit the diff to the pad.
    pub fn process(&mut self, sample: &WeightSample) {
        let pressed = self.map.press_states(sample);
        let mut claimed = [false; 4];
        let mut to_press: BTreeSet<PadOutput> = BTreeSet::new();
        let mut stick = (0i16, 0i16);

        for pair in QuadrantPair::EVALUATION_ORDER {
            let (a, b) = pair.quadrants();
            let (a, b) = (a as usize, b as usize);
            if !pressed[a] || !pressed[b] || claimed[a] || claimed[b] {
                continue;
            }
            let Some(action) = self.map.combos[pair.index()] else {
                continue;
            };
            match action.effect() {
                ComboEffect::Stick(x, y) => stick = (x, y),
                ComboEffect::Dpad(direction) => {
                    to_press.insert(PadOutput::Dpad(direction));
                }
            }
            claimed[a] = true;
            claimed[b] = true;
        }

        for quadrant in Quadrant::ALL {
            let i = quadrant as usize;
            if pressed[i] && !claimed[i] {
                if let Some(button) = self.map.buttons[i] {
                    to_press.insert(PadOutput::Button(button));
                }
            }
        }

        let presses: Vec<PadOutput> = to_press.difference(&self.asserted).copied().collect();
        let releases: Vec<PadOutput> = self.asserted.difference(&to_press).copied().collect();

        for output in presses {
            let result = match output {
                PadOutput::Button(button) => self.sink.press_button(button),
                PadOutput::Dpad(direction) => self.sink.press_dpad(direction),
            };
            if let Err(e) = result {
                warn!("Pad press failed: {}", e);
            }
        }
        for output in releases {
            let result = match output {
                PadOutput::Button(button) => self.sink.release_button(button),
                PadOutput::Dpad(direction) => self.sink.release_dpad(direction),
            };
            if let Err(e) = result {
                warn!("Pad release failed: {}", e);
            }
        }

        if let Err(e) = self.sink.set_stick(stick.0, stick.1) {
            warn!("Pad stick update failed: {}", e);
        }
        if let Err(e) = self.sink.commit() {
            warn!("Pad commit failed: {}", e);
        }

        self.asserted = to_press;
    }
}

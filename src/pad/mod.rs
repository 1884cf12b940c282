//! # Virtual Gamepad Module
//!
//! Presents a uinput virtual gamepad to the host.
//!
//! This module handles:
//! - Creating the virtual device with a standard Xbox-style layout
//! - Translating mapping actions into evdev key and axis events
//! - Batching queued operations into a single emit per commit
//!
//! ## Device layout
//!
//! The virtual pad mirrors what the kernel `xpad` driver exposes for a real
//! Xbox 360 controller: 11 buttons (BTN_SOUTH..BTN_THUMBR), one analog
//! stick on ABS_X/ABS_Y (−32768..32767) and the d-pad on ABS_HAT0X/Y
//! (−1..1), so games treat it like any stock controller.
//!
//! ## Coordinate convention
//!
//! Callers pass stick axes with +y toward the top edge of the board; evdev
//! expects +y down, so the Y axis is inverted on the way out.

pub mod sink_trait;

pub use sink_trait::ControllerSink;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, UinputAbsSetup,
};
use tracing::{debug, info};

use crate::error::{BalanceBridgeError, Result};
use crate::mapping::actions::{DpadDirection, GamepadButton};

/// Name the virtual device advertises to the host.
pub const DEVICE_NAME: &str = "Balance Bridge Virtual Gamepad";

/// Stick axis range, matching the xpad driver.
pub const STICK_ABS_MIN: i32 = -32768;
/// Stick axis range, matching the xpad driver.
pub const STICK_ABS_MAX: i32 = 32767;

/// The evdev key for a mapped button, per the xpad layout.
fn button_key(button: GamepadButton) -> Key {
    match button {
        GamepadButton::A => Key::BTN_SOUTH,
        GamepadButton::B => Key::BTN_EAST,
        GamepadButton::X => Key::BTN_NORTH,
        GamepadButton::Y => Key::BTN_WEST,
        GamepadButton::LeftBumper => Key::BTN_TL,
        GamepadButton::RightBumper => Key::BTN_TR,
        GamepadButton::Back => Key::BTN_SELECT,
        GamepadButton::Start => Key::BTN_START,
        GamepadButton::Guide => Key::BTN_MODE,
        GamepadButton::LeftThumb => Key::BTN_THUMBL,
        GamepadButton::RightThumb => Key::BTN_THUMBR,
    }
}

/// The hat axis and deflection for a d-pad direction.
fn hat_value(direction: DpadDirection) -> (AbsoluteAxisType, i32) {
    match direction {
        DpadDirection::Up => (AbsoluteAxisType::ABS_HAT0Y, -1),
        DpadDirection::Down => (AbsoluteAxisType::ABS_HAT0Y, 1),
        DpadDirection::Left => (AbsoluteAxisType::ABS_HAT0X, -1),
        DpadDirection::Right => (AbsoluteAxisType::ABS_HAT0X, 1),
    }
}

/// Tracks which direction currently owns each hat axis.
///
/// A release only zeroes an axis while its own direction still drives it;
/// otherwise a press of the opposing direction earlier in the same batch
/// would be clobbered by the release that follows it.
#[derive(Debug, Default)]
struct HatState {
    x: i32,
    y: i32,
}

impl HatState {
    fn press(&mut self, direction: DpadDirection) -> (AbsoluteAxisType, i32) {
        let (axis, value) = hat_value(direction);
        match axis {
            AbsoluteAxisType::ABS_HAT0X => self.x = value,
            _ => self.y = value,
        }
        (axis, value)
    }

    fn release(&mut self, direction: DpadDirection) -> Option<(AbsoluteAxisType, i32)> {
        let (axis, value) = hat_value(direction);
        let current = match axis {
            AbsoluteAxisType::ABS_HAT0X => &mut self.x,
            _ => &mut self.y,
        };
        if *current != value {
            return None;
        }
        *current = 0;
        Some((axis, 0))
    }
}

/// Uinput-backed virtual gamepad
///
/// Operations queue evdev events; [`ControllerSink::commit`] emits the
/// whole batch at once, which the kernel closes with a single SYN report.
pub struct UinputGamepad {
    device: VirtualDevice,
    pending: Vec<InputEvent>,
    hat: HatState,
}

impl std::fmt::Debug for UinputGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UinputGamepad")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl UinputGamepad {
    /// Create the virtual gamepad device.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceBridgeError::Sink`] if `/dev/uinput` is unavailable
    /// or the device cannot be registered (typically a permission problem).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use balance_bridge::pad::UinputGamepad;
    ///
    /// let pad = UinputGamepad::create()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for button in [
            GamepadButton::A,
            GamepadButton::B,
            GamepadButton::X,
            GamepadButton::Y,
            GamepadButton::LeftBumper,
            GamepadButton::RightBumper,
            GamepadButton::Back,
            GamepadButton::Start,
            GamepadButton::Guide,
            GamepadButton::LeftThumb,
            GamepadButton::RightThumb,
        ] {
            keys.insert(button_key(button));
        }

        let stick_info = AbsInfo::new(0, STICK_ABS_MIN, STICK_ABS_MAX, 16, 128, 0);
        let hat_info = AbsInfo::new(0, -1, 1, 0, 0, 0);

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| BalanceBridgeError::Sink(format!("uinput unavailable: {}", e)))?
            .name(DEVICE_NAME)
            .with_keys(&keys)
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to register buttons: {}", e)))?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisType::ABS_X, stick_info))
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to register axis: {}", e)))?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisType::ABS_Y, stick_info))
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to register axis: {}", e)))?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisType::ABS_HAT0X, hat_info))
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to register axis: {}", e)))?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisType::ABS_HAT0Y, hat_info))
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to register axis: {}", e)))?
            .build()
            .map_err(|e| BalanceBridgeError::Sink(format!("failed to create device: {}", e)))?;

        info!("Created virtual gamepad '{}'", DEVICE_NAME);

        Ok(Self {
            device,
            pending: Vec::new(),
            hat: HatState::default(),
        })
    }

    fn queue_key(&mut self, key: Key, pressed: bool) {
        self.pending.push(InputEvent::new(
            EventType::KEY,
            key.code(),
            i32::from(pressed),
        ));
    }

    fn queue_abs(&mut self, axis: AbsoluteAxisType, value: i32) {
        self.pending
            .push(InputEvent::new(EventType::ABSOLUTE, axis.0, value));
    }
}

impl ControllerSink for UinputGamepad {
    fn press_button(&mut self, button: GamepadButton) -> Result<()> {
        self.queue_key(button_key(button), true);
        Ok(())
    }

    fn release_button(&mut self, button: GamepadButton) -> Result<()> {
        self.queue_key(button_key(button), false);
        Ok(())
    }

    fn press_dpad(&mut self, direction: DpadDirection) -> Result<()> {
        let (axis, value) = self.hat.press(direction);
        self.queue_abs(axis, value);
        Ok(())
    }

    fn release_dpad(&mut self, direction: DpadDirection) -> Result<()> {
        if let Some((axis, value)) = self.hat.release(direction) {
            self.queue_abs(axis, value);
        }
        Ok(())
    }

    fn set_stick(&mut self, x: i16, y: i16) -> Result<()> {
        self.queue_abs(AbsoluteAxisType::ABS_X, i32::from(x));
        self.queue_abs(AbsoluteAxisType::ABS_Y, -i32::from(y));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let events = std::mem::take(&mut self.pending);
        debug!("Committing {} pad events", events.len());
        self.device
            .emit(&events)
            .map_err(|e| BalanceBridgeError::Sink(format!("emit failed: {}", e)))
    }
}

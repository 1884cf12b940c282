//! # Mapping Vocabulary
//!
//! The actions a quadrant or quadrant pair can be mapped to, and the fixed
//! evaluation order for pair combos.
//!
//! ## Buttons
//!
//! The virtual pad exposes the 11 buttons of a standard Xbox-style
//! controller (A, B, X, Y, bumpers, Back/Start/Guide, stick clicks). An
//! individual quadrant maps to one of these.
//!
//! ## Combos
//!
//! A pair of quadrants maps to either one of the 8 full-deflection stick
//! directions or a d-pad direction. Pairs are evaluated in a fixed priority
//! order — top, bottom, left, right, then the diagonals — with
//! first-match-wins claiming, so a quadrant never feeds two actions in the
//! same cycle.

use crate::board::sample::Quadrant;

/// Full stick deflection per axis.
///
/// The symmetric magnitude is used in both directions so a diagonal
/// deflects identically either way.
pub const STICK_MAX: i16 = i16::MAX;

/// A digital button on the virtual pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GamepadButton {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    Guide,
    LeftThumb,
    RightThumb,
}

impl GamepadButton {
    /// Parse a kebab-case button name as used in config files.
    ///
    /// Unknown names yield `None` (treated as "no mapping").
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "left-bumper" => Some(Self::LeftBumper),
            "right-bumper" => Some(Self::RightBumper),
            "back" => Some(Self::Back),
            "start" => Some(Self::Start),
            "guide" => Some(Self::Guide),
            "left-thumb" => Some(Self::LeftThumb),
            "right-thumb" => Some(Self::RightThumb),
            _ => None,
        }
    }

    /// The kebab-case name accepted by [`GamepadButton::parse`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::X => "x",
            Self::Y => "y",
            Self::LeftBumper => "left-bumper",
            Self::RightBumper => "right-bumper",
            Self::Back => "back",
            Self::Start => "start",
            Self::Guide => "guide",
            Self::LeftThumb => "left-thumb",
            Self::RightThumb => "right-thumb",
        }
    }
}

/// A d-pad direction on the virtual pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DpadDirection {
    Up,
    Down,
    Left,
    Right,
}

impl DpadDirection {
    /// Stable name, used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// The effect a fired combo applies to the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboEffect {
    /// Deflect the stick to these axes (+x right, +y toward the top edge).
    Stick(i16, i16),
    /// Press a d-pad direction.
    Dpad(DpadDirection),
}

/// Action mapped to a quadrant pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboAction {
    StickUp,
    StickDown,
    StickLeft,
    StickRight,
    StickUpLeft,
    StickUpRight,
    StickDownLeft,
    StickDownRight,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl ComboAction {
    /// Parse a kebab-case action name as used in config files.
    ///
    /// Unknown names yield `None` (treated as "no mapping").
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "stick-up" => Some(Self::StickUp),
            "stick-down" => Some(Self::StickDown),
            "stick-left" => Some(Self::StickLeft),
            "stick-right" => Some(Self::StickRight),
            "stick-up-left" => Some(Self::StickUpLeft),
            "stick-up-right" => Some(Self::StickUpRight),
            "stick-down-left" => Some(Self::StickDownLeft),
            "stick-down-right" => Some(Self::StickDownRight),
            "dpad-up" => Some(Self::DpadUp),
            "dpad-down" => Some(Self::DpadDown),
            "dpad-left" => Some(Self::DpadLeft),
            "dpad-right" => Some(Self::DpadRight),
            _ => None,
        }
    }

    /// The pad effect this action applies when its pair fires.
    #[must_use]
    pub fn effect(self) -> ComboEffect {
        match self {
            Self::StickUp => ComboEffect::Stick(0, STICK_MAX),
            Self::StickDown => ComboEffect::Stick(0, -STICK_MAX),
            Self::StickLeft => ComboEffect::Stick(-STICK_MAX, 0),
            Self::StickRight => ComboEffect::Stick(STICK_MAX, 0),
            Self::StickUpLeft => ComboEffect::Stick(-STICK_MAX, STICK_MAX),
            Self::StickUpRight => ComboEffect::Stick(STICK_MAX, STICK_MAX),
            Self::StickDownLeft => ComboEffect::Stick(-STICK_MAX, -STICK_MAX),
            Self::StickDownRight => ComboEffect::Stick(STICK_MAX, -STICK_MAX),
            Self::DpadUp => ComboEffect::Dpad(DpadDirection::Up),
            Self::DpadDown => ComboEffect::Dpad(DpadDirection::Down),
            Self::DpadLeft => ComboEffect::Dpad(DpadDirection::Left),
            Self::DpadRight => ComboEffect::Dpad(DpadDirection::Right),
        }
    }
}

/// One of the six unordered quadrant pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadrantPair {
    /// Top-left + top-right
    Top,
    /// Bottom-left + bottom-right
    Bottom,
    /// Top-left + bottom-left
    Left,
    /// Top-right + bottom-right
    Right,
    /// Top-left + bottom-right
    DiagonalTlBr,
    /// Top-right + bottom-left
    DiagonalTrBl,
}

impl QuadrantPair {
    /// The fixed combo priority order: edges before diagonals.
    pub const EVALUATION_ORDER: [QuadrantPair; 6] = [
        QuadrantPair::Top,
        QuadrantPair::Bottom,
        QuadrantPair::Left,
        QuadrantPair::Right,
        QuadrantPair::DiagonalTlBr,
        QuadrantPair::DiagonalTrBl,
    ];

    /// The two quadrants this pair claims when it fires.
    #[must_use]
    pub fn quadrants(self) -> (Quadrant, Quadrant) {
        match self {
            Self::Top => (Quadrant::TopLeft, Quadrant::TopRight),
            Self::Bottom => (Quadrant::BottomLeft, Quadrant::BottomRight),
            Self::Left => (Quadrant::TopLeft, Quadrant::BottomLeft),
            Self::Right => (Quadrant::TopRight, Quadrant::BottomRight),
            Self::DiagonalTlBr => (Quadrant::TopLeft, Quadrant::BottomRight),
            Self::DiagonalTrBl => (Quadrant::TopRight, Quadrant::BottomLeft),
        }
    }

    /// Index into per-pair tables, following [`Self::EVALUATION_ORDER`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
            Self::Left => 2,
            Self::Right => 3,
            Self::DiagonalTlBr => 4,
            Self::DiagonalTrBl => 5,
        }
    }
}

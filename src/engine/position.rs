//! Joystick position classification.
//!
//! Two 8-bit analog axes collapse into one of five discrete positions.
//! The vertical axis is read first; the horizontal axis only matters
//! (and on lazy hardware, is only converted) when the vertical axis is
//! centered. Threshold boundaries are inclusive-center: a sample of
//! exactly 32 or 224 still reads as centered on that axis.

use crate::config::{AXIS_HIGH_THRESHOLD, AXIS_LOW_THRESHOLD};

/// Discrete joystick position. Derived every sample cycle, never
/// persisted.
///
/// The discriminants are wire-stable: transition codes are computed
/// from them, and external configuration tools depend on the numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Position {
    Center = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

/// Joystick axis selector for [`AxisReader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Analog axis source. Each read blocks until the conversion completes
/// (bounded, sub-millisecond on real hardware).
pub trait AxisReader {
    fn read(&mut self, axis: Axis) -> u8;
}

/// Classify a single axis sample into low / centered / high.
fn axis_trips(sample: u8) -> Option<bool> {
    if sample < AXIS_LOW_THRESHOLD {
        Some(true) // low side
    } else if sample > AXIS_HIGH_THRESHOLD {
        Some(false) // high side
    } else {
        None
    }
}

/// Classify a pair of axis samples into a [`Position`].
///
/// The vertical axis wins: a stick pushed into a corner reads as
/// Up/Down, not Left/Right.
pub fn classify_axes(vertical: u8, horizontal: u8) -> Position {
    match axis_trips(vertical) {
        Some(true) => Position::Up,
        Some(false) => Position::Down,
        None => match axis_trips(horizontal) {
            Some(true) => Position::Left,
            Some(false) => Position::Right,
            None => Position::Center,
        },
    }
}

/// Sample the current position, converting the horizontal axis only
/// when the vertical one is centered.
pub fn sample_position(adc: &mut impl AxisReader) -> Position {
    match axis_trips(adc.read(Axis::Vertical)) {
        Some(true) => Position::Up,
        Some(false) => Position::Down,
        None => match axis_trips(adc.read(Axis::Horizontal)) {
            Some(true) => Position::Left,
            Some(false) => Position::Right,
            None => Position::Center,
        },
    }
}

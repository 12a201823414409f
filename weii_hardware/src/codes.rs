//! Linux input event codes emitted by the balance board driver.
//!
//! `classify` is kept free of any evdev types so the mapping can be tested
//! on every platform.

use weii_traits::{Axis, AxisEvent};

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0x00;
pub const SYN_DROPPED: u16 = 0x03;

pub const ABS_HAT0X: u16 = 0x10;
pub const ABS_HAT0Y: u16 = 0x11;
pub const ABS_HAT1X: u16 = 0x12;
pub const ABS_HAT1Y: u16 = 0x13;

pub const BTN_A: u16 = 0x130;

/// Sensor position reported on each absolute hat code.
#[inline]
pub fn axis_for_code(code: u16) -> Option<Axis> {
    match code {
        ABS_HAT1X => Some(Axis::TopLeft),
        ABS_HAT0X => Some(Axis::TopRight),
        ABS_HAT0Y => Some(Axis::BottomLeft),
        ABS_HAT1Y => Some(Axis::BottomRight),
        _ => None,
    }
}

/// Map a raw `(type, code, value)` triple onto an `AxisEvent`.
pub fn classify(kind: u16, code: u16, value: i32) -> AxisEvent {
    match (kind, code) {
        (EV_ABS, c) => match axis_for_code(c) {
            Some(which) => AxisEvent::Axis { which, raw: value },
            None => AxisEvent::Unknown { kind, code, value },
        },
        (EV_KEY, BTN_A) => AxisEvent::ButtonPress,
        (EV_SYN, SYN_DROPPED) => AxisEvent::SyncDropped,
        (EV_SYN, SYN_REPORT) => AxisEvent::SyncReport(value),
        _ => AxisEvent::Unknown { kind, code, value },
    }
}

/// Inverse of `axis_for_code`, used by the simulator to emit realistic codes.
#[inline]
pub fn code_for_axis(which: Axis) -> u16 {
    match which {
        Axis::TopLeft => ABS_HAT1X,
        Axis::TopRight => ABS_HAT0X,
        Axis::BottomLeft => ABS_HAT0Y,
        Axis::BottomRight => ABS_HAT1Y,
    }
}

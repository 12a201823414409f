//! Decoded input events from a balance board.
//!
//! A board reports one absolute value per load sensor, then a sync marker
//! closing the group. Everything the device can emit maps onto `AxisEvent`;
//! shapes the board is not expected to produce land in `Unknown`.

/// One of the four load sensors under the board's feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::TopLeft,
        Axis::TopRight,
        Axis::BottomLeft,
        Axis::BottomRight,
    ];

    /// Stable slot index used by decoders.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::TopLeft => 0,
            Axis::TopRight => 1,
            Axis::BottomLeft => 2,
            Axis::BottomRight => 3,
        }
    }
}

/// Sync flag announcing that more values of the current group follow.
pub const SYNC_MORE_DATA: i32 = 3;
/// Sync flag closing the current group.
pub const SYNC_REPORT_COMPLETE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisEvent {
    /// Raw sensor value in device units (hundredths of a kilogram).
    Axis { which: Axis, raw: i32 },
    /// The board's front button.
    ButtonPress,
    /// The kernel dropped events; the current group may be incomplete.
    SyncDropped,
    /// Group delimiter; see `SYNC_MORE_DATA` and `SYNC_REPORT_COMPLETE`.
    SyncReport(i32),
    /// Anything else, kept raw for diagnostics.
    Unknown { kind: u16, code: u16, value: i32 },
}

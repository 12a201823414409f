//! Assembles per-axis board events into whole-board weight samples.
//!
//! The board reports each load sensor separately and closes a group with a
//! report-complete sync marker. A group becomes a sample only when all four
//! sensors reported; otherwise the whole group is dropped and decoding starts
//! over. Nothing here can fail: unexpected input is logged and skipped.

use weii_traits::event::{SYNC_MORE_DATA, SYNC_REPORT_COMPLETE};
use weii_traits::{Axis, AxisEvent};

/// Raw sensor units per kilogram (the driver reports hundredths of a kg).
pub const RAW_PER_KG: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeResult {
    /// Group still open.
    Pending,
    /// All four sensors reported; total weight in kg.
    Completed(f64),
    /// Group closed with at least one sensor missing.
    Discarded,
    /// The board button was pressed.
    Abort,
}

/// One open group: a converted reading per sensor, or nothing yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingSample {
    slots: [Option<f64>; 4],
}

impl PendingSample {
    #[inline]
    pub fn set(&mut self, which: Axis, kg: f64) {
        self.slots[which.index()] = Some(kg);
    }

    #[inline]
    pub fn get(&self, which: Axis) -> Option<f64> {
        self.slots[which.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Sum of all four slots, or None when any is unset. Always clears.
    pub fn take_total(&mut self) -> Option<f64> {
        let slots = std::mem::take(&mut self.slots);
        slots.iter().copied().sum::<Option<f64>>()
    }

    pub fn clear(&mut self) {
        self.slots = [None; 4];
    }
}

#[derive(Debug, Default)]
pub struct SampleDecoder {
    pending: PendingSample,
    unexpected: u64,
}

impl SampleDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group currently being assembled.
    pub fn pending(&self) -> &PendingSample {
        &self.pending
    }

    /// Events that did not fit the board protocol since construction.
    pub fn unexpected_events(&self) -> u64 {
        self.unexpected
    }

    pub fn decode(&mut self, event: AxisEvent) -> DecodeResult {
        match event {
            AxisEvent::Axis { which, raw } => {
                self.pending.set(which, f64::from(raw) / RAW_PER_KG);
                DecodeResult::Pending
            }
            AxisEvent::SyncDropped => DecodeResult::Pending,
            AxisEvent::SyncReport(SYNC_MORE_DATA) => DecodeResult::Pending,
            AxisEvent::SyncReport(SYNC_REPORT_COMPLETE) => match self.pending.take_total() {
                Some(total) => DecodeResult::Completed(total),
                None => DecodeResult::Discarded,
            },
            AxisEvent::ButtonPress => {
                self.pending.clear();
                DecodeResult::Abort
            }
            other => {
                self.unexpected = self.unexpected.saturating_add(1);
                tracing::warn!(event = ?other, "unexpected event from balance board");
                DecodeResult::Pending
            }
        }
    }
}

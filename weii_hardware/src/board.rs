//! evdev-backed balance board (Linux, `hardware` feature).

use crate::codes::classify;
use crate::error::HwError;
use std::collections::VecDeque;
use weii_traits::{AxisEvent, DeviceHandle, DeviceLookup};

/// Name the kernel's wiimote driver gives the balance board.
pub const BOARD_NAME: &str = "Nintendo Wii Remote Balance Board";

pub struct EvdevBoard {
    device: Option<evdev::Device>,
    pending: VecDeque<AxisEvent>,
}

impl EvdevBoard {
    fn new(device: evdev::Device) -> Self {
        Self {
            device: Some(device),
            pending: VecDeque::new(),
        }
    }
}

impl DeviceHandle for EvdevBoard {
    fn next_event(&mut self) -> Result<AxisEvent, Box<dyn std::error::Error + Send + Sync>> {
        loop {
            if let Some(ev) = self.pending.pop_front() {
                return Ok(ev);
            }
            let device = self.device.as_mut().ok_or(HwError::Disconnected)?;
            // Blocks until the driver delivers the next batch.
            let batch = device.fetch_events().map_err(HwError::from)?;
            self.pending.extend(
                batch.map(|ev| classify(ev.event_type().0, ev.code(), ev.value())),
            );
        }
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            self.pending.clear();
        }
    }
}

/// Scans `/dev/input` for a device whose name matches exactly.
pub struct EvdevLookup {
    name: String,
}

impl EvdevLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for EvdevLookup {
    fn default() -> Self {
        Self::new(BOARD_NAME)
    }
}

impl DeviceLookup for EvdevLookup {
    type Handle = EvdevBoard;

    fn find(&mut self) -> Option<EvdevBoard> {
        let (path, device) = evdev::enumerate().find(|(_, d)| d.name() == Some(self.name.as_str()))?;
        tracing::info!(path = %path.display(), name = %self.name, "balance board found");
        Some(EvdevBoard::new(device))
    }
}

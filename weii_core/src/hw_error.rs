//! Maps `Box<dyn Error>` from the device trait boundary to `MeasureError`.
//!
//! `weii_traits::DeviceHandle` returns boxed errors so any backend can plug in;
//! this module turns them into the typed variants the session reports, with an
//! optional feature-gated path for `weii_hardware::HwError` downcasting.

use crate::error::MeasureError;

/// Map a device read error to a typed `MeasureError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_device_error(e: &(dyn std::error::Error + 'static)) -> MeasureError {
    #[cfg(feature = "hardware-errors")]
    {
        use weii_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Disconnected => MeasureError::DeviceGone,
                HwError::Io(io) if is_gone(io) => MeasureError::DeviceGone,
                other => MeasureError::Device(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>()
        && is_gone(io)
    {
        return MeasureError::DeviceGone;
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("disconnected") || lower.contains("no such device") {
        MeasureError::DeviceGone
    } else {
        MeasureError::Device(s)
    }
}

/// ENODEV is what evdev reports once the board drops off Bluetooth.
fn is_gone(io: &std::io::Error) -> bool {
    const ENODEV: i32 = 19;
    io.kind() == std::io::ErrorKind::NotFound || io.raw_os_error() == Some(ENODEV)
}

pub mod clock;
pub mod event;

pub use clock::{Clock, MonotonicClock};
pub use event::{Axis, AxisEvent};

/// An opened board. Owned by exactly one measurement session at a time.
pub trait DeviceHandle {
    /// Block until the next event arrives.
    fn next_event(&mut self) -> Result<AxisEvent, Box<dyn std::error::Error + Send + Sync>>;

    /// Release the device. Calling it again after a prior close is a no-op.
    fn close(&mut self);
}

/// Finds the board by name. Must return promptly whether or not it is present.
pub trait DeviceLookup {
    type Handle: DeviceHandle;

    fn find(&mut self) -> Option<Self::Handle>;
}

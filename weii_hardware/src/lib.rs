//! Balance board backends.
//!
//! - `codes`: raw input-event code mapping shared by every backend
//! - `sim`: scripted board used by tests and the CLI when built without hardware
//! - `board`: real evdev device (Linux, `hardware` feature)
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod board;
pub mod codes;
pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use board::{BOARD_NAME, EvdevBoard, EvdevLookup};
pub use sim::{SimProbe, SimScript, SimulatedBoard, SimulatedLookup};

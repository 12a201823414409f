#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Measurement engine for the balance-board scale (hardware-agnostic).
//!
//! All device access goes through `weii_traits::DeviceLookup` and
//! `weii_traits::DeviceHandle`.
//!
//! ## Architecture
//!
//! - **Decoding**: per-axis events to whole-board samples (`decoder`)
//! - **Gating**: minimum-weight step-on/step-off rule (`gate`, `collector`)
//! - **Aggregation**: median plus offset (`aggregate`)
//! - **Session**: the phase state machine owning the device (`session`)
//! - **Harness**: background worker, single-session guard, cancellation (`harness`)
//! - **Hooks**: disconnect and command actions after a result (`hooks`)
//! - **Status**: snapshot-read status shared with observers (`status`)
//!
//! ## Units
//!
//! The driver reports hundredths of a kilogram per sensor; samples are `f64`
//! kilograms from the decoder onwards.

pub mod aggregate;
pub mod body;
pub mod cancel;
pub mod collector;
pub mod config;
pub mod conversions;
pub mod decoder;
pub mod error;
pub mod gate;
pub mod harness;
pub mod hooks;
pub mod hw_error;
pub mod mocks;
pub mod session;
pub mod status;

pub use aggregate::{median, reduce};
pub use cancel::CancelToken;
pub use collector::{Offer, SampleCollector, SampleWindow};
pub use config::{DEFAULT_POLL_INTERVAL, SessionConfig};
pub use decoder::{DecodeResult, PendingSample, SampleDecoder};
pub use error::{BuildError, MeasureError, Report, Result};
pub use gate::{GateDecision, ThresholdGate};
pub use harness::{MeasurementHarness, SessionReport};
pub use hooks::{CommandTemplate, HookAction, HookReport, HookRunner, MacAddress, PostSessionHooks};
pub use session::{MeasurementSession, SessionBuilder, SessionOutcome};
pub use status::{SessionPhase, SessionStatus, StatusBoard};

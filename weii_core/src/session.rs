//! One end-to-end measurement: find the board, wait for someone to step on,
//! collect samples until they step off or the window fills, then reduce.
//!
//! Phases run `AwaitingDevice -> AwaitingThreshold -> Collecting` and end in
//! exactly one of `Completed`, `Cancelled`, `Aborted` or `Failed`. The device
//! handle is owned by the session from the moment it is found and closed
//! exactly once on every exit path.

use std::time::Duration;

use weii_traits::clock::{Clock, MonotonicClock};
use weii_traits::{DeviceHandle, DeviceLookup};

use crate::aggregate;
use crate::cancel::CancelToken;
use crate::collector::{Offer, SampleCollector, SampleWindow};
use crate::config::{DEFAULT_POLL_INTERVAL, SessionConfig};
use crate::decoder::{DecodeResult, SampleDecoder};
use crate::error::{BuildError, MeasureError, Result};
use crate::hw_error::map_device_error;
use crate::status::{self, SessionPhase, SessionStatus, StatusBoard};

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed { weight_kg: f64, samples: usize },
    Cancelled,
    /// The board button was pressed. No weight is reported.
    Aborted,
    Failed(MeasureError),
}

impl SessionOutcome {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Completed { .. } => SessionPhase::Completed,
            Self::Cancelled => SessionPhase::Cancelled,
            Self::Aborted => SessionPhase::Aborted,
            Self::Failed(_) => SessionPhase::Failed,
        }
    }

    pub fn weight_kg(&self) -> Option<f64> {
        match self {
            Self::Completed { weight_kg, .. } => Some(*weight_kg),
            _ => None,
        }
    }
}

/// Closes the wrapped handle once, either explicitly or on drop.
struct OpenDevice<H: DeviceHandle> {
    handle: H,
    closed: bool,
}

impl<H: DeviceHandle> OpenDevice<H> {
    fn new(handle: H) -> Self {
        Self {
            handle,
            closed: false,
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.handle.close();
        tracing::info!("balance board closed");
    }
}

impl<H: DeviceHandle> Drop for OpenDevice<H> {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct MeasurementSession<L: DeviceLookup, C: Clock = MonotonicClock> {
    lookup: L,
    clock: C,
    config: SessionConfig,
    poll_interval: Duration,
    cancel: CancelToken,
    status: StatusBoard,
    discarded: u64,
    completed_groups: u64,
}

impl<L: DeviceLookup> MeasurementSession<L, MonotonicClock> {
    pub fn builder() -> SessionBuilder<L, MonotonicClock> {
        SessionBuilder::default()
    }
}

impl<L: DeviceLookup, C: Clock> MeasurementSession<L, C> {
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    /// Run to a terminal phase and publish it.
    pub fn run(mut self) -> SessionOutcome {
        self.enter(SessionPhase::AwaitingDevice, status::MSG_WAITING_FOR_BOARD);
        tracing::info!(
            min_weight_kg = self.config.min_weight_kg,
            max_samples = self.config.max_samples,
            adjust_kg = self.config.adjust_kg,
            "measurement session started"
        );

        let Some(handle) = self.await_device() else {
            tracing::info!("cancelled while waiting for balance board");
            return self.conclude(SessionOutcome::Cancelled, 0);
        };
        let mut device = OpenDevice::new(handle);
        tracing::info!("balance board found");
        self.enter(SessionPhase::AwaitingThreshold, status::MSG_BOARD_FOUND);

        let (outcome, samples) = self.measure(&mut device);
        let outcome = self.conclude(outcome, samples);
        device.close();
        outcome
    }

    /// Poll the lookup until it yields a handle. None means cancelled.
    fn await_device(&mut self) -> Option<L::Handle> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Some(handle) = self.lookup.find() {
                return Some(handle);
            }
            tracing::trace!("balance board not present");
            self.clock.sleep(self.poll_interval);
        }
    }

    /// Read events until collection ends. Returns the outcome and window size.
    fn measure(&mut self, device: &mut OpenDevice<L::Handle>) -> (SessionOutcome, usize) {
        let mut decoder = SampleDecoder::new();
        let mut collector =
            SampleCollector::new(self.config.min_weight_kg, self.config.max_samples);

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(samples = collector.len(), "measurement cancelled");
                return (SessionOutcome::Cancelled, collector.len());
            }

            let event = match device.handle.next_event() {
                Ok(ev) => ev,
                Err(e) => {
                    let err = map_device_error(&*e);
                    tracing::error!(error = %e, samples = collector.len(), "device read failed");
                    return (SessionOutcome::Failed(err), collector.len());
                }
            };

            match decoder.decode(event) {
                DecodeResult::Pending => {}
                DecodeResult::Discarded => {
                    self.discarded += 1;
                    let discarded = self.discarded;
                    tracing::debug!(discarded, "incomplete sensor group");
                    self.status.update(|s| s.discarded_groups = discarded);
                }
                DecodeResult::Abort => {
                    tracing::warn!(samples = collector.len(), "board button pressed");
                    return (SessionOutcome::Aborted, collector.len());
                }
                DecodeResult::Completed(kg) => {
                    self.completed_groups += 1;
                    let offer = collector.offer(kg);
                    self.record(offer, kg, collector.len());
                    if offer.is_final() {
                        if offer == Offer::SteppedOff {
                            tracing::info!(samples = collector.len(), "user stepped off");
                        }
                        let samples = collector.len();
                        return (self.finalize(&collector.into_window()), samples);
                    }
                }
            }
        }
    }

    /// Reflect one decoded sample in the shared status.
    fn record(&self, offer: Offer, kg: f64, count: usize) {
        let max = self.config.max_samples;
        match offer {
            Offer::Ignored => self.status.update(|s| s.latest_weight_kg = Some(kg)),
            // A one-sample window is full on its first sample.
            Offer::Started | Offer::Full if count == 1 => {
                tracing::info!(kg, "measurement started");
                let discarded = self.discarded;
                self.status.publish(SessionStatus {
                    phase: SessionPhase::Collecting,
                    message: status::MSG_STARTED.to_string(),
                    sample_count: count,
                    latest_weight_kg: Some(kg),
                    discarded_groups: discarded,
                });
            }
            Offer::Started | Offer::Accepted | Offer::Full => self.status.update(|s| {
                s.sample_count = count;
                s.latest_weight_kg = Some(kg);
                if count % status::PROGRESS_EVERY == 0 {
                    s.message = status::msg_progress(count, max);
                }
            }),
            Offer::SteppedOff => self.status.update(|s| {
                s.latest_weight_kg = Some(kg);
                s.message = status::MSG_STEPPED_OFF.to_string();
            }),
        }
    }

    fn finalize(&self, window: &SampleWindow) -> SessionOutcome {
        let groups = self.completed_groups + self.discarded;
        if self.discarded.saturating_mul(2) > groups {
            tracing::warn!(
                discarded = self.discarded,
                groups,
                "more than half of all sensor groups were incomplete; check the board batteries"
            );
        }
        match aggregate::reduce(window.as_slice(), self.config.adjust_kg) {
            Ok(weight_kg) => SessionOutcome::Completed {
                weight_kg,
                samples: window.len(),
            },
            Err(e) => SessionOutcome::Failed(e),
        }
    }

    /// Publish the terminal status for `outcome`.
    fn conclude(&self, outcome: SessionOutcome, samples: usize) -> SessionOutcome {
        let (message, latest) = match &outcome {
            SessionOutcome::Completed { weight_kg, .. } => {
                tracing::info!(weight_kg, samples, "measurement completed");
                (status::msg_done(*weight_kg), Some(*weight_kg))
            }
            SessionOutcome::Cancelled => (status::MSG_CANCELLED.to_string(), None),
            SessionOutcome::Aborted => (status::MSG_ABORTED.to_string(), None),
            SessionOutcome::Failed(e) => (status::msg_failed(e), None),
        };
        self.status.publish(SessionStatus {
            phase: outcome.phase(),
            message,
            sample_count: samples,
            latest_weight_kg: latest,
            discarded_groups: self.discarded,
        });
        outcome
    }

    fn enter(&self, phase: SessionPhase, message: &str) {
        tracing::debug!(%phase, "phase change");
        let discarded = self.discarded;
        self.status.publish(SessionStatus {
            discarded_groups: discarded,
            ..SessionStatus::new(phase, message)
        });
    }
}

/// Builder for `MeasurementSession`. Only the lookup is required.
pub struct SessionBuilder<L, C> {
    lookup: Option<L>,
    clock: C,
    config: SessionConfig,
    poll_interval: Duration,
    cancel: Option<CancelToken>,
    status: Option<StatusBoard>,
}

impl<L> Default for SessionBuilder<L, MonotonicClock> {
    fn default() -> Self {
        Self {
            lookup: None,
            clock: MonotonicClock::new(),
            config: SessionConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
            status: None,
        }
    }
}

impl<L: DeviceLookup, C: Clock> SessionBuilder<L, C> {
    pub fn with_lookup(mut self, lookup: L) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> SessionBuilder<L, C2> {
        SessionBuilder {
            lookup: self.lookup,
            clock,
            config: self.config,
            poll_interval: self.poll_interval,
            cancel: self.cancel,
            status: self.status,
        }
    }

    pub fn with_poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    /// Share an existing token instead of creating a fresh one.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Publish into an existing board instead of a private one.
    pub fn with_status(mut self, status: StatusBoard) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<MeasurementSession<L, C>> {
        let lookup = self
            .lookup
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLookup))?;
        self.config
            .validate()
            .map_err(|msg| eyre::Report::new(BuildError::InvalidConfig(msg)))?;
        if self.poll_interval.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "poll interval must be > 0",
            )));
        }
        Ok(MeasurementSession {
            lookup,
            clock: self.clock,
            config: self.config,
            poll_interval: self.poll_interval,
            cancel: self.cancel.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            discarded: 0,
            completed_groups: 0,
        })
    }
}

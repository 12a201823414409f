//! Runs measurement sessions on a background worker, one at a time.
//!
//! Observers poll `snapshot()` on their own cadence. `cancel()` is
//! cooperative: the worker notices it between device reads or lookup
//! attempts. Post-session hooks run on the worker after a completed session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::WrapErr;
use parking_lot::Mutex;
use weii_traits::DeviceLookup;
use weii_traits::clock::{Clock, MonotonicClock};

use crate::cancel::CancelToken;
use crate::config::{DEFAULT_POLL_INTERVAL, SessionConfig};
use crate::error::Result;
use crate::hooks::{HookReport, PostSessionHooks};
use crate::session::{MeasurementSession, SessionOutcome};
use crate::status::{self, SessionPhase, SessionStatus, StatusBoard};

/// Everything a finished worker hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Empty unless the session completed with hooks configured.
    pub hooks: Vec<HookReport>,
}

struct Worker {
    cancel: CancelToken,
    done: xch::Receiver<SessionReport>,
    join: Option<JoinHandle<()>>,
}

pub struct MeasurementHarness {
    status: StatusBoard,
    active: Arc<AtomicBool>,
    poll_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl Default for MeasurementHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementHarness {
    pub fn new() -> Self {
        Self {
            status: StatusBoard::new(),
            active: Arc::new(AtomicBool::new(false)),
            poll_interval: DEFAULT_POLL_INTERVAL,
            worker: Mutex::new(None),
        }
    }

    /// Device lookup interval used by sessions started from now on.
    pub fn with_poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    /// Start a session on a new worker thread.
    ///
    /// Returns `Ok(false)` without side effects when a session is already
    /// running. Errors are configuration or thread-spawn failures.
    pub fn start<L>(&self, lookup: L, config: SessionConfig, hooks: PostSessionHooks) -> Result<bool>
    where
        L: DeviceLookup + Send + 'static,
    {
        self.start_with_clock(lookup, MonotonicClock::new(), config, hooks)
    }

    pub fn start_with_clock<L, C>(
        &self,
        lookup: L,
        clock: C,
        config: SessionConfig,
        mut hooks: PostSessionHooks,
    ) -> Result<bool>
    where
        L: DeviceLookup + Send + 'static,
        C: Clock + Send + 'static,
    {
        let cancel = CancelToken::new();
        let session = MeasurementSession::builder()
            .with_lookup(lookup)
            .with_clock(clock)
            .with_config(config)
            .with_poll_interval(self.poll_interval)
            .with_cancel(cancel.clone())
            .with_status(self.status.clone())
            .build()?;

        // Held until the new worker is installed so `cancel` never sees an
        // active flag without the matching token.
        let mut slot = self.worker.lock();
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("measurement already in progress; start ignored");
            return Ok(false);
        }

        // Visible to observers before the worker gets scheduled.
        self.status.publish(SessionStatus::new(
            SessionPhase::AwaitingDevice,
            status::MSG_WAITING_FOR_BOARD,
        ));

        let (tx, rx) = xch::bounded(1);
        let active = self.active.clone();
        let spawned = std::thread::Builder::new()
            .name("weii-session".into())
            .spawn(move || {
                let outcome = session.run();
                let hooks = match outcome.weight_kg() {
                    Some(w) if !hooks.is_empty() => hooks.run(w),
                    _ => Vec::new(),
                };
                active.store(false, Ordering::Release);
                if tx.send(SessionReport { outcome, hooks }).is_err() {
                    tracing::trace!("session report dropped; nobody waiting");
                }
            });

        let join = match spawned.wrap_err("spawn measurement worker") {
            Ok(join) => join,
            Err(e) => {
                self.active.store(false, Ordering::Release);
                self.status.publish(SessionStatus::new(
                    SessionPhase::Failed,
                    status::msg_failed(&e),
                ));
                return Err(e);
            }
        };

        let previous = slot.replace(Worker {
            cancel,
            done: rx,
            join: Some(join),
        });
        drop(slot);
        if let Some(mut old) = previous
            && let Some(handle) = old.join.take()
            && handle.join().is_err()
        {
            tracing::warn!("previous measurement worker panicked");
        }
        Ok(true)
    }

    /// Ask the running session to stop. Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        let slot = self.worker.lock();
        match slot.as_ref() {
            Some(w) if self.is_active() => {
                w.cancel.cancel();
                tracing::info!("cancellation requested");
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> SessionStatus {
        self.status.snapshot()
    }

    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Wait up to `timeout` for the current session to finish.
    ///
    /// Returns None on timeout, when no session was started, or when the
    /// report was already taken by an earlier call.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<SessionReport> {
        let done = self.worker.lock().as_ref().map(|w| w.done.clone())?;
        let report = done.recv_timeout(timeout).ok()?;
        if let Some(w) = self.worker.lock().as_mut()
            && let Some(handle) = w.join.take()
            && handle.join().is_err()
        {
            tracing::warn!("measurement worker panicked after reporting");
        }
        Some(report)
    }
}

impl Drop for MeasurementHarness {
    fn drop(&mut self) {
        let Some(mut worker) = self.worker.lock().take() else {
            return;
        };
        worker.cancel.cancel();
        // A worker stuck in a blocking read cannot observe the token; leave it
        // detached rather than hang here.
        if let Some(handle) = worker.join.take() {
            if handle.is_finished() {
                if handle.join().is_err() {
                    tracing::warn!("measurement worker panicked");
                }
            } else {
                tracing::debug!("measurement worker still running at shutdown; detaching");
            }
        }
    }
}

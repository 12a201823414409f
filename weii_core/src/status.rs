//! Session status shared between the measuring worker and observers.
//!
//! One writer (the active session) replaces the whole `SessionStatus` under a
//! write lock; readers clone it under a read lock, so a snapshot never mixes
//! fields from two updates.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub const MSG_IDLE: &str = "Idle.";
pub const MSG_WAITING_FOR_BOARD: &str = "Waiting for balance board...";
pub const MSG_BOARD_FOUND: &str = "Balance board found, please step on.";
pub const MSG_STARTED: &str = "Measurement started, please wait...";
pub const MSG_STEPPED_OFF: &str = "User stepped off.";
pub const MSG_CANCELLED: &str = "Cancelled.";
pub const MSG_ABORTED: &str = "Aborted: board button pressed.";

/// A progress line is published every this many samples.
pub const PROGRESS_EVERY: usize = 10;

pub fn msg_progress(count: usize, max: usize) -> String {
    format!("Measuring... {count}/{max} samples")
}

pub fn msg_done(weight_kg: f64) -> String {
    format!("Done, weight: {weight_kg:.1} kg")
}

pub fn msg_failed(reason: impl fmt::Display) -> String {
    format!("Error: {reason}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session has run yet.
    #[default]
    Idle,
    AwaitingDevice,
    AwaitingThreshold,
    Collecting,
    Completed,
    Cancelled,
    Aborted,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Aborted | Self::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingDevice => "awaiting_device",
            Self::AwaitingThreshold => "awaiting_threshold",
            Self::Collecting => "collecting",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub message: String,
    /// Samples in the window.
    pub sample_count: usize,
    /// Latest decoded sample while measuring; the final weight once completed.
    /// Cleared on every other terminal phase.
    pub latest_weight_kg: Option<f64>,
    /// Sensor groups dropped because an axis was missing.
    pub discarded_groups: u64,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            message: MSG_IDLE.to_string(),
            sample_count: 0,
            latest_weight_kg: None,
            discarded_groups: 0,
        }
    }
}

impl SessionStatus {
    pub fn new(phase: SessionPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Cloneable handle on the shared status. Last writer wins across sessions.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<SessionStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole status.
    pub fn publish(&self, status: SessionStatus) {
        *self.inner.write() = status;
    }

    /// Modify the status in place under one write lock.
    pub fn update(&self, f: impl FnOnce(&mut SessionStatus)) {
        f(&mut self.inner.write());
    }

    pub fn snapshot(&self) -> SessionStatus {
        self.inner.read().clone()
    }
}

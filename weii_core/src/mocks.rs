//! Test and helper mocks for weii_core

use crate::hooks::{HookAction, HookRunner};
use parking_lot::Mutex;
use std::sync::Arc;

/// Hook runner that records every action instead of spawning processes.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    actions: Arc<Mutex<Vec<HookAction>>>,
    fail_with: Option<String>,
}

impl RecordingRunner {
    /// Records actions and reports each as failed with `msg`.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            fail_with: Some(msg.into()),
            ..Self::default()
        }
    }

    /// Shared view of the recorded actions; stays valid after the runner moves.
    pub fn actions(&self) -> Arc<Mutex<Vec<HookAction>>> {
        self.actions.clone()
    }
}

impl HookRunner for RecordingRunner {
    fn execute(&mut self, action: &HookAction) -> Result<(), String> {
        self.actions.lock().push(action.clone());
        match &self.fail_with {
            Some(msg) => Err(msg.clone()),
            None => Ok(()),
        }
    }
}

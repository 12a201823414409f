//! Actions run once after a completed measurement.
//!
//! - Disconnect: `bluetoothctl disconnect <addr>` so the board powers down.
//! - Command: a shell command template with `{weight}` replaced by the final
//!   weight at one decimal.
//!
//! Hook failures are reported per action and never change the measurement.

use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::MeasureError;

pub const WEIGHT_PLACEHOLDER: &str = "{weight}";

fn mac_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([0-9a-f]{2}:){5}[0-9a-f]{2}$").ok())
        .as_ref()
}

/// Bluetooth device address in `AA:BB:CC:DD:EE:FF` form (any case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn parse(s: &str) -> Result<Self, MeasureError> {
        let s = s.trim();
        if mac_pattern().is_some_and(|re| re.is_match(s)) {
            Ok(Self(s.to_string()))
        } else {
            Err(MeasureError::InvalidAddress(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate(String);

impl CommandTemplate {
    pub fn new(template: &str) -> Result<Self, MeasureError> {
        if template.trim().is_empty() {
            return Err(MeasureError::Config("hook command must not be blank".into()));
        }
        Ok(Self(template.to_string()))
    }

    /// Replace every `{weight}` with the weight at one decimal.
    pub fn render(&self, weight_kg: f64) -> String {
        self.0
            .replace(WEIGHT_PLACEHOLDER, &format!("{weight_kg:.1}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Disconnect(MacAddress),
    /// Fully rendered shell command.
    Command(String),
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnect(addr) => write!(f, "disconnect {addr}"),
            Self::Command(cmd) => write!(f, "command `{cmd}`"),
        }
    }
}

/// Executes hook actions. The process-backed runner is the default; tests
/// substitute a recording one.
pub trait HookRunner: Send {
    fn execute(&mut self, action: &HookAction) -> Result<(), String>;
}

/// Runs hooks as child processes and waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl HookRunner for ProcessRunner {
    fn execute(&mut self, action: &HookAction) -> Result<(), String> {
        let mut cmd = match action {
            HookAction::Disconnect(addr) => {
                let mut c = Command::new("/usr/bin/env");
                c.args(["bluetoothctl", "disconnect", addr.as_str()])
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                c
            }
            HookAction::Command(line) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
        };
        let status = cmd.status().map_err(|e| format!("spawn failed: {e}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("exited with {status}"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookReport {
    pub action: HookAction,
    pub result: Result<(), MeasureError>,
}

impl HookReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct PostSessionHooks {
    disconnect: Option<MacAddress>,
    command: Option<CommandTemplate>,
    runner: Box<dyn HookRunner>,
}

impl Default for PostSessionHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PostSessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostSessionHooks")
            .field("disconnect", &self.disconnect)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

impl PostSessionHooks {
    pub fn new() -> Self {
        Self::with_runner(ProcessRunner)
    }

    pub fn with_runner(runner: impl HookRunner + 'static) -> Self {
        Self {
            disconnect: None,
            command: None,
            runner: Box::new(runner),
        }
    }

    /// Validate and set the address to disconnect. An invalid address leaves
    /// the previous setting untouched.
    pub fn set_disconnect(&mut self, address: &str) -> Result<(), MeasureError> {
        self.disconnect = Some(MacAddress::parse(address)?);
        Ok(())
    }

    pub fn set_command(&mut self, template: &str) -> Result<(), MeasureError> {
        self.command = Some(CommandTemplate::new(template)?);
        Ok(())
    }

    pub fn disconnect(&self) -> Option<&MacAddress> {
        self.disconnect.as_ref()
    }

    pub fn command(&self) -> Option<&CommandTemplate> {
        self.command.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.disconnect.is_none() && self.command.is_none()
    }

    /// Run the configured actions for `weight_kg`, disconnect first.
    pub fn run(&mut self, weight_kg: f64) -> Vec<HookReport> {
        let mut actions = Vec::with_capacity(2);
        if let Some(addr) = &self.disconnect {
            actions.push(HookAction::Disconnect(addr.clone()));
        }
        if let Some(tpl) = &self.command {
            actions.push(HookAction::Command(tpl.render(weight_kg)));
        }

        actions
            .into_iter()
            .map(|action| {
                let result = self.runner.execute(&action).map_err(MeasureError::Hook);
                match &result {
                    Ok(()) => tracing::info!(%action, "post-session hook ran"),
                    Err(e) => tracing::warn!(%action, error = %e, "post-session hook failed"),
                }
                HookReport { action, result }
            })
            .collect()
    }
}

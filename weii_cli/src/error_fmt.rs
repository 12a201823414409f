//! Human-readable error descriptions, exit codes and structured JSON errors.

use weii_core::error::{BuildError, MeasureError};
use weii_core::SessionOutcome;

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_ABORTED: i32 = 2;
pub const EXIT_CANCELLED: i32 = 3;
pub const EXIT_FAILED: i32 = 4;

/// Explain a measurement error with likely causes and a fix hint.
pub fn humanize_measure(err: &MeasureError) -> String {
    match err {
        MeasureError::DeviceGone => "What happened: The balance board disconnected during the measurement.\nLikely causes: Batteries ran low, the board went out of Bluetooth range, or it was switched off.\nHow to fix: Check the batteries, press the sync button to reconnect, then measure again.".to_string(),
        MeasureError::Device(msg) => format!(
            "What happened: Reading from the balance board failed ({msg}).\nLikely causes: Missing permission on /dev/input, or the driver reported an I/O error.\nHow to fix: Make sure your user can read input devices (e.g. the `input` group) and retry."
        ),
        MeasureError::InsufficientData => "What happened: No weight samples were collected.\nLikely causes: Nobody stood on the board long enough, or the minimum weight is set too high.\nHow to fix: Stand still on the board until the measurement completes, or lower --min-limit.".to_string(),
        MeasureError::InvalidAddress(addr) => format!(
            "What happened: {addr:?} is not a Bluetooth address.\nLikely causes: Typo in --disconnect-address or hooks.disconnect_address.\nHow to fix: Use the form AA:BB:CC:DD:EE:FF (see `bluetoothctl devices`)."
        ),
        MeasureError::Hook(msg) => format!(
            "What happened: A post-measurement action failed ({msg}).\nLikely causes: bluetoothctl is not installed, or the command exited with an error.\nHow to fix: Run the command by hand to see its output; the weight itself is unaffected."
        ),
        MeasureError::Config(msg) => format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range or blank values in the config file or flags.\nHow to fix: Edit the config or flags, then rerun."
        ),
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingLookup => "What happened: No device lookup was provided to the measurement session.\nLikely causes: The board backend failed to initialize.\nHow to fix: Rebuild with --features hardware, or pass --simulate.".to_string(),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or flags.\nHow to fix: Edit the config file, then rerun. `weii init-config` writes a valid default."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MeasureError>() {
        return humanize_measure(me);
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("balance board not found") {
        return "What happened: No balance board was found.\nLikely causes: The board is not paired/connected, or the hid-wiimote driver is not loaded.\nHow to fix: Press the red sync button and connect with `bluetoothctl connect <ADDR>`, then retry.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        let cause = err
            .chain()
            .last()
            .map(ToString::to_string)
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid or incomplete ({cause}).\nLikely causes: A value is out of range or has the wrong type.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path, or create one with `weii init-config`. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit code for a finished session.
pub fn exit_code_for_outcome(outcome: &SessionOutcome) -> i32 {
    match outcome {
        SessionOutcome::Completed { .. } => EXIT_OK,
        SessionOutcome::Aborted => EXIT_ABORTED,
        SessionOutcome::Cancelled => EXIT_CANCELLED,
        SessionOutcome::Failed(_) => EXIT_FAILED,
    }
}

/// Exit code for errors that never produced a session outcome.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<MeasureError>() {
        Some(MeasureError::DeviceGone | MeasureError::Device(_)) => EXIT_FAILED,
        _ => EXIT_ERROR,
    }
}

pub fn reason_name(err: &MeasureError) -> &'static str {
    match err {
        MeasureError::InsufficientData => "InsufficientData",
        MeasureError::Device(_) => "Device",
        MeasureError::DeviceGone => "DeviceGone",
        MeasureError::InvalidAddress(_) => "InvalidAddress",
        MeasureError::Hook(_) => "Hook",
        MeasureError::Config(_) => "Config",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = err
        .downcast_ref::<MeasureError>()
        .map_or("Error", reason_name);
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

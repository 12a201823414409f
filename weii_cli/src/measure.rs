//! `weii measure` and `weii self-check`: config mapping, backend choice,
//! status polling and result output.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use serde_json::json;
use weii_core::body::{self, BmiCategory};
use weii_core::conversions::{body_height_cm, poll_interval};
use weii_core::{
    HookReport, MeasurementHarness, PostSessionHooks, SessionConfig, SessionOutcome,
    SessionReport, SessionStatus,
};
use weii_hardware::SimulatedLookup;
use weii_traits::{DeviceHandle, DeviceLookup};

use crate::cli::MeasureArgs;
use crate::error_fmt::{self, exit_code_for_outcome, humanize_measure};

/// Session settings after applying flag overrides on top of the config file.
pub fn session_config(cfg: &weii_config::Config, args: &MeasureArgs) -> eyre::Result<SessionConfig> {
    let mut session = SessionConfig::from(&cfg.session);
    if let Some(kg) = args.adjust {
        session.adjust_kg = kg;
    }
    if let Some(lb) = args.adjust_lb {
        session.adjust_kg = body::lb_to_kg(lb);
    }
    if let Some(kg) = args.min_limit {
        session.min_weight_kg = kg;
    }
    if let Some(n) = args.max_samples {
        session.max_samples = n;
    }

    if !(session.adjust_kg.is_finite() && (-20.0..=20.0).contains(&session.adjust_kg)) {
        eyre::bail!("invalid configuration: adjustment must be in [-20.0, 20.0] kg");
    }
    session
        .validate()
        .map_err(|msg| eyre::eyre!("invalid configuration: {msg}"))?;
    Ok(session)
}

/// Post-session actions from flags (preferred) or the `[hooks]` section.
///
/// A malformed disconnect address only disables that action; the
/// measurement itself still runs.
pub fn build_hooks(cfg: &weii_config::Config, args: &MeasureArgs) -> eyre::Result<PostSessionHooks> {
    let mut hooks = PostSessionHooks::new();
    let address = args
        .disconnect_address
        .as_deref()
        .or(cfg.hooks.disconnect_address.as_deref())
        .filter(|a| !a.trim().is_empty());
    if let Some(addr) = address
        && let Err(e) = hooks.set_disconnect(addr)
    {
        tracing::warn!(error = %e, "disconnect hook disabled");
        eprintln!("warning: {e}; the board will not be disconnected");
    }
    if let Some(cmd) = args.command.as_deref().or(cfg.hooks.command.as_deref()) {
        hooks
            .set_command(cmd)
            .map_err(eyre::Report::new)
            .wrap_err("invalid configuration: hook command")?;
    }
    Ok(hooks)
}

fn use_simulator(requested: bool) -> bool {
    if requested {
        return true;
    }
    if cfg!(not(all(feature = "hardware", target_os = "linux"))) {
        tracing::debug!("built without hardware support; using the simulated board");
        return true;
    }
    false
}

/// Run one measurement to its end. Returns the process exit code.
pub fn run_measure(cfg: &weii_config::Config, args: &MeasureArgs, json: bool) -> eyre::Result<i32> {
    let session = session_config(cfg, args)?;
    let hooks = build_hooks(cfg, args)?;
    let harness = Arc::new(MeasurementHarness::new().with_poll_interval(poll_interval(&cfg.device)));

    let for_signal = harness.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        for_signal.cancel();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let started = if use_simulator(args.simulate) {
        harness.start(SimulatedLookup::from_env(), session, hooks)?
    } else {
        start_hardware(&harness, &cfg.device.name, session, hooks)?
    };
    if !started {
        eyre::bail!("a measurement is already in progress");
    }

    let quiet = args.terse || json;
    let report = poll_until_done(&harness, Duration::from_millis(cfg.display.status_poll_ms.max(1)), quiet);
    let status = harness.snapshot();

    if json {
        println!("{}", report_json(&report, &status, cfg));
    } else {
        print_report(&report, cfg, args.terse);
    }
    Ok(exit_code_for_outcome(&report.outcome))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn start_hardware(
    harness: &MeasurementHarness,
    name: &str,
    session: SessionConfig,
    hooks: PostSessionHooks,
) -> eyre::Result<bool> {
    harness.start(weii_hardware::EvdevLookup::new(name), session, hooks)
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn start_hardware(
    harness: &MeasurementHarness,
    _name: &str,
    session: SessionConfig,
    hooks: PostSessionHooks,
) -> eyre::Result<bool> {
    harness.start(SimulatedLookup::from_env(), session, hooks)
}

/// Observe the worker at `every`, printing each new status message.
fn poll_until_done(harness: &MeasurementHarness, every: Duration, quiet: bool) -> SessionReport {
    let mut last_message = String::new();
    loop {
        let done = harness.wait_timeout(every);
        let snap = harness.snapshot();
        if !quiet && snap.message != last_message {
            println!("{}", snap.message);
            last_message = snap.message;
        }
        if let Some(report) = done {
            return report;
        }
    }
}

fn print_report(report: &SessionReport, cfg: &weii_config::Config, terse: bool) {
    match &report.outcome {
        SessionOutcome::Completed { weight_kg, .. } => {
            if terse {
                println!("{weight_kg:.1}");
            } else {
                if cfg.display.use_imperial {
                    println!("Weight: {:.1} lb", body::kg_to_lb(*weight_kg));
                }
                if let Some(line) = bmi_line(*weight_kg, body_height_cm(&cfg.display)) {
                    println!("{line}");
                }
            }
            for h in &report.hooks {
                print_hook(h);
            }
        }
        SessionOutcome::Failed(e) => eprintln!("{}", humanize_measure(e)),
        SessionOutcome::Cancelled | SessionOutcome::Aborted => {}
    }
}

fn print_hook(h: &HookReport) {
    if let Err(e) = &h.result {
        eprintln!("warning: {} failed: {e}", h.action);
    }
}

fn bmi_line(weight_kg: f64, height_cm: Option<f64>) -> Option<String> {
    let bmi = body::bmi(weight_kg, height_cm?)?;
    let category = BmiCategory::classify(bmi).map_or("out of range", BmiCategory::label);
    Some(format!("BMI: {bmi:.1} ({category})"))
}

fn report_json(report: &SessionReport, status: &SessionStatus, cfg: &weii_config::Config) -> String {
    let hooks: Vec<_> = report
        .hooks
        .iter()
        .map(|h| {
            json!({
                "action": h.action.to_string(),
                "ok": h.is_ok(),
                "error": h.result.as_ref().err().map(ToString::to_string),
            })
        })
        .collect();

    let mut obj = json!({
        "outcome": report.outcome.phase().as_str(),
        "message": status.message,
        "samples": status.sample_count,
        "discarded_groups": status.discarded_groups,
        "hooks": hooks,
    });
    match &report.outcome {
        SessionOutcome::Completed { weight_kg, .. } => {
            obj["weight_kg"] = json!(round1(*weight_kg));
            if cfg.display.use_imperial {
                obj["weight_lb"] = json!(round1(body::kg_to_lb(*weight_kg)));
            }
            if let Some(h) = body_height_cm(&cfg.display)
                && let Some(bmi) = body::bmi(*weight_kg, h)
            {
                obj["bmi"] = json!(round1(bmi));
                obj["bmi_category"] = json!(BmiCategory::classify(bmi).map(BmiCategory::label));
            }
        }
        SessionOutcome::Failed(e) => {
            obj["reason"] = json!(error_fmt::reason_name(e));
            obj["error"] = json!(humanize_measure(e));
        }
        SessionOutcome::Cancelled | SessionOutcome::Aborted => {}
    }
    obj.to_string()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// One lookup attempt; the board is closed again right away.
pub fn run_self_check(cfg: &weii_config::Config, simulate: bool) -> eyre::Result<()> {
    let found = if use_simulator(simulate) {
        probe_once(SimulatedLookup::from_env())
    } else {
        probe_hardware(&cfg.device.name)
    };
    if !found {
        eyre::bail!("balance board not found (looking for {:?})", cfg.device.name);
    }
    println!("OK: balance board present");
    Ok(())
}

fn probe_once<L: DeviceLookup>(mut lookup: L) -> bool {
    match lookup.find() {
        Some(mut handle) => {
            handle.close();
            true
        }
        None => false,
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn probe_hardware(name: &str) -> bool {
    probe_once(weii_hardware::EvdevLookup::new(name))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn probe_hardware(_name: &str) -> bool {
    probe_once(SimulatedLookup::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cfg = weii_config::Config::default();
        let args = MeasureArgs {
            adjust: Some(-2.0),
            min_limit: Some(30.0),
            max_samples: Some(50),
            ..MeasureArgs::default()
        };
        let s = session_config(&cfg, &args).expect("valid");
        assert_eq!(s.adjust_kg, -2.0);
        assert_eq!(s.min_weight_kg, 30.0);
        assert_eq!(s.max_samples, 50);
    }

    #[test]
    fn pound_adjustment_is_converted() {
        let args = MeasureArgs {
            adjust_lb: Some(-2.20462),
            ..MeasureArgs::default()
        };
        let s = session_config(&weii_config::Config::default(), &args).expect("valid");
        assert!((s.adjust_kg + 1.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_adjustment_is_rejected() {
        let args = MeasureArgs {
            adjust: Some(25.0),
            ..MeasureArgs::default()
        };
        assert!(session_config(&weii_config::Config::default(), &args).is_err());
    }

    #[test]
    fn malformed_address_disables_only_the_disconnect() {
        let args = MeasureArgs {
            disconnect_address: Some("not-a-mac".into()),
            command: Some("echo {weight}".into()),
            ..MeasureArgs::default()
        };
        let hooks = build_hooks(&weii_config::Config::default(), &args).expect("hooks");
        assert!(hooks.disconnect().is_none());
        assert!(hooks.command().is_some());
    }

    #[test]
    fn bmi_line_reports_category() {
        assert_eq!(
            bmi_line(70.0, Some(175.0)).as_deref(),
            Some("BMI: 22.9 (Normal weight)")
        );
        assert!(bmi_line(70.0, None).is_none());
    }
}

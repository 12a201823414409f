//! End-to-end session behaviour against the scripted board.

use std::time::Duration;

use weii_core::status::{MSG_ABORTED, MSG_CANCELLED};
use weii_core::{
    CancelToken, CommandTemplate, MeasureError, MeasurementSession, SessionConfig, SessionOutcome,
    SessionPhase, StatusBoard,
};
use weii_hardware::{SimProbe, SimScript, SimulatedBoard, SimulatedLookup};
use weii_traits::clock::test_clock::TestClock;
use weii_traits::{AxisEvent, DeviceHandle, DeviceLookup};

fn cfg(adjust_kg: f64) -> SessionConfig {
    SessionConfig {
        adjust_kg,
        min_weight_kg: 20.0,
        max_samples: 200,
    }
}

fn run_script(script: SimScript, config: SessionConfig) -> (SessionOutcome, StatusBoard, SimProbe) {
    let lookup = SimulatedLookup::present(script);
    let probe = lookup.probe();
    let status = StatusBoard::new();
    let session = MeasurementSession::builder()
        .with_lookup(lookup)
        .with_clock(TestClock::new())
        .with_config(config)
        .with_status(status.clone())
        .build()
        .expect("valid session");
    (session.run(), status, probe)
}

#[test]
fn full_window_of_identical_frames_yields_median_plus_adjust() {
    let script = SimScript::new().frames(200, 84.0).then_repeat(84.0);
    let (outcome, status, probe) = run_script(script, cfg(-2.0));

    assert_eq!(
        outcome,
        SessionOutcome::Completed {
            weight_kg: 82.0,
            samples: 200
        }
    );
    let snap = status.snapshot();
    assert_eq!(snap.phase, SessionPhase::Completed);
    assert_eq!(snap.sample_count, 200);
    assert_eq!(snap.latest_weight_kg, Some(82.0));
    assert_eq!(snap.message, "Done, weight: 82.0 kg");
    assert_eq!(probe.opened(), 1);
    assert_eq!(probe.closed(), 1);
    // Nothing is read past the frame that filled the window.
    assert_eq!(probe.reads(), 200 * 5);
}

#[test]
fn incomplete_group_is_discarded_and_counted() {
    let script = SimScript::new()
        .frames(3, 70.0)
        .partial_frame(weii_traits::Axis::TopLeft, 70.0)
        .frames(2, 70.0)
        .frame(0.0);
    let (outcome, status, probe) = run_script(script, cfg(0.0));

    assert_eq!(
        outcome,
        SessionOutcome::Completed {
            weight_kg: 70.0,
            samples: 5
        }
    );
    assert_eq!(status.snapshot().discarded_groups, 1);
    assert_eq!(probe.closed(), 1);
}

#[test]
fn button_press_mid_collection_aborts_without_weight() {
    let script = SimScript::new().frames(50, 84.0).button().then_repeat(84.0);
    let (outcome, status, probe) = run_script(script, cfg(0.0));

    assert_eq!(outcome, SessionOutcome::Aborted);
    let snap = status.snapshot();
    assert_eq!(snap.phase, SessionPhase::Aborted);
    assert_eq!(snap.message, MSG_ABORTED);
    assert_eq!(snap.sample_count, 50);
    assert_eq!(snap.latest_weight_kg, None);
    assert_eq!(probe.closed(), 1);
}

#[test]
fn button_while_waiting_for_step_on_aborts() {
    let script = SimScript::new().frames(3, 0.5).button();
    let (outcome, _, probe) = run_script(script, cfg(0.0));
    assert_eq!(outcome, SessionOutcome::Aborted);
    assert_eq!(probe.closed(), 1);
}

#[test]
fn step_off_ends_collection_without_the_light_sample() {
    let script = SimScript::new()
        .frames(4, 1.0)
        .frames(50, 84.0)
        .frame(18.0)
        .frames(10, 84.0);
    let (outcome, status, _) = run_script(script, cfg(0.0));

    assert_eq!(
        outcome,
        SessionOutcome::Completed {
            weight_kg: 84.0,
            samples: 50
        }
    );
    assert_eq!(status.snapshot().sample_count, 50);
}

#[test]
fn reported_weight_rounds_from_double_precision_sum() {
    assert_eq!(weii_hardware::sim::split_raw(20.55), [513, 513, 513, 516]);
    let script = SimScript::new().frames(5, 20.55).frame(0.0);
    let (outcome, status, _) = run_script(script, cfg(-2.0));

    let weight = outcome.weight_kg().expect("completed");
    assert_eq!(status.snapshot().message, "Done, weight: 18.6 kg");
    let template = CommandTemplate::new("log {weight}").expect("template");
    assert_eq!(template.render(weight), "log 18.6");
}

#[test]
fn one_sample_window_completes_on_the_first_accepted_frame() {
    let script = SimScript::new().frames(3, 5.0).frames(3, 80.0).then_repeat(80.0);
    let config = SessionConfig {
        max_samples: 1,
        ..cfg(0.0)
    };
    let (outcome, _, probe) = run_script(script, config);
    assert_eq!(
        outcome,
        SessionOutcome::Completed {
            weight_kg: 80.0,
            samples: 1
        }
    );
    assert_eq!(probe.reads(), 4 * 5);
}

#[test]
fn median_ignores_outliers() {
    let script = SimScript::new()
        .frames(10, 70.0)
        .frame(140.0)
        .frame(21.0)
        .frames(9, 70.0)
        .frame(0.0);
    let (outcome, _, _) = run_script(script, cfg(0.5));
    assert_eq!(outcome.weight_kg(), Some(70.5));
}

#[test]
fn device_failure_mid_read_fails_and_closes() {
    let script = SimScript::new().frames(10, 84.0).fail("bus reset");
    let (outcome, status, probe) = run_script(script, cfg(0.0));

    match outcome {
        SessionOutcome::Failed(MeasureError::Device(msg)) => assert!(msg.contains("bus reset")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    let snap = status.snapshot();
    assert_eq!(snap.phase, SessionPhase::Failed);
    assert!(snap.message.starts_with("Error:"));
    assert_eq!(snap.latest_weight_kg, None);
    assert_eq!(probe.closed(), 1);
}

#[test]
fn board_vanishing_reports_device_gone() {
    // Default tail disconnects once the script runs out.
    let script = SimScript::new().frames(10, 84.0);
    let (outcome, _, probe) = run_script(script, cfg(0.0));
    assert_eq!(outcome, SessionOutcome::Failed(MeasureError::DeviceGone));
    assert_eq!(probe.closed(), 1);
}

#[test]
fn lookup_is_retried_at_the_poll_interval() {
    let lookup = SimulatedLookup::appearing_after(3, SimScript::new().frames(5, 80.0).frame(0.0));
    let probe = lookup.probe();
    let clock = TestClock::new();
    let session = MeasurementSession::builder()
        .with_lookup(lookup)
        .with_clock(clock.clone())
        .with_poll_interval(Duration::from_millis(500))
        .build()
        .expect("valid session");

    assert_eq!(session.run().weight_kg(), Some(80.0));
    assert_eq!(probe.lookups(), 4);
    assert_eq!(clock.sleep_count(), 3);
    assert_eq!(clock.elapsed(), Duration::from_millis(1500));
}

#[test]
fn cancelled_before_start_never_looks_up() {
    let lookup = SimulatedLookup::present(SimScript::new().then_repeat(80.0));
    let probe = lookup.probe();
    let token = CancelToken::new();
    token.cancel();
    let status = StatusBoard::new();
    let session = MeasurementSession::builder()
        .with_lookup(lookup)
        .with_clock(TestClock::new())
        .with_cancel(token)
        .with_status(status.clone())
        .build()
        .expect("valid session");

    assert_eq!(session.run(), SessionOutcome::Cancelled);
    assert_eq!(probe.lookups(), 0);
    assert_eq!(probe.opened(), 0);
    let snap = status.snapshot();
    assert_eq!(snap.message, MSG_CANCELLED);
    assert_eq!(snap.sample_count, 0);
}

#[test]
fn cancel_while_awaiting_device_ends_within_a_poll() {
    let lookup = SimulatedLookup::absent();
    let probe = lookup.probe();
    let session = MeasurementSession::builder()
        .with_lookup(lookup)
        .with_poll_interval(Duration::from_millis(20))
        .build()
        .expect("valid session");
    let token = session.cancel_token();
    let status = session.status();

    let worker = std::thread::spawn(move || session.run());
    std::thread::sleep(Duration::from_millis(70));
    assert_eq!(status.snapshot().phase, SessionPhase::AwaitingDevice);
    token.cancel();
    let lookups_at_cancel = probe.lookups();

    let outcome = worker.join().expect("session thread");
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(probe.opened(), 0);
    // At most the attempt already in flight when the flag was set.
    assert!(probe.lookups() <= lookups_at_cancel + 1);
}

/// Lookup whose board sets the cancel flag after a fixed number of reads.
struct Tripwire {
    inner: SimulatedLookup,
    token: CancelToken,
    after_reads: usize,
}

struct TripwireBoard {
    inner: SimulatedBoard,
    token: CancelToken,
    left: usize,
}

impl DeviceLookup for Tripwire {
    type Handle = TripwireBoard;

    fn find(&mut self) -> Option<TripwireBoard> {
        self.inner.find().map(|inner| TripwireBoard {
            inner,
            token: self.token.clone(),
            left: self.after_reads,
        })
    }
}

impl DeviceHandle for TripwireBoard {
    fn next_event(&mut self) -> Result<AxisEvent, Box<dyn std::error::Error + Send + Sync>> {
        if self.left == 0 {
            self.token.cancel();
        } else {
            self.left -= 1;
        }
        self.inner.next_event()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[test]
fn cancel_while_collecting_publishes_no_weight() {
    let sim = SimulatedLookup::present(SimScript::new().then_repeat(84.0));
    let probe = sim.probe();
    let token = CancelToken::new();
    let status = StatusBoard::new();
    let session = MeasurementSession::builder()
        .with_lookup(Tripwire {
            inner: sim,
            token: token.clone(),
            after_reads: 5 * 30,
        })
        .with_clock(TestClock::new())
        .with_cancel(token)
        .with_status(status.clone())
        .build()
        .expect("valid session");

    assert_eq!(session.run(), SessionOutcome::Cancelled);
    let snap = status.snapshot();
    assert_eq!(snap.phase, SessionPhase::Cancelled);
    assert_eq!(snap.latest_weight_kg, None);
    assert!(snap.sample_count >= 30);
    assert_eq!(probe.closed(), 1);
}

#[test]
fn custom_sample_cap_stops_early() {
    let script = SimScript::new().then_repeat(75.0);
    let (outcome, status, _) = run_script(
        script,
        SessionConfig {
            max_samples: 20,
            ..cfg(0.0)
        },
    );
    assert_eq!(
        outcome,
        SessionOutcome::Completed {
            weight_kg: 75.0,
            samples: 20
        }
    );
    assert_eq!(status.snapshot().sample_count, 20);
}

#[test]
fn builder_requires_lookup_and_sane_config() {
    let err = MeasurementSession::<SimulatedLookup>::builder()
        .build()
        .err()
        .expect("missing lookup");
    assert!(err.to_string().contains("missing device lookup"));

    let err = MeasurementSession::builder()
        .with_lookup(SimulatedLookup::absent())
        .with_config(SessionConfig {
            max_samples: 0,
            ..SessionConfig::default()
        })
        .build()
        .err()
        .expect("zero max_samples");
    assert!(err.to_string().contains("max_samples"));

    let err = MeasurementSession::builder()
        .with_lookup(SimulatedLookup::absent())
        .with_poll_interval(Duration::ZERO)
        .build()
        .err()
        .expect("zero poll interval");
    assert!(err.to_string().contains("poll interval"));
}

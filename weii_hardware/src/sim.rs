//! Scripted balance board for tests and hardware-less runs.
//!
//! A `SimScript` is a sequence of events (whole frames, partial frames,
//! button presses, injected read failures) followed by a tail that either
//! repeats a frame forever or reports the board as gone. `SimProbe` counts
//! lookups, opens, closes, and reads so callers can assert resource handling.

use crate::error::HwError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use weii_traits::event::SYNC_REPORT_COMPLETE;
use weii_traits::{Axis, AxisEvent, DeviceHandle, DeviceLookup};

#[derive(Debug, Clone)]
enum Step {
    Event(AxisEvent),
    Fail(String),
}

/// What the board does once the scripted steps run out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Tail {
    /// Reads fail with `HwError::Disconnected`.
    #[default]
    Disconnect,
    /// Emit complete frames at this weight forever.
    Repeat(f64),
}

#[derive(Debug, Clone, Default)]
pub struct SimScript {
    steps: Vec<Step>,
    tail: Tail,
}

/// Split a weight into four raw sensor values (hundredths of a kg).
/// Any rounding remainder goes to the bottom-right sensor.
pub fn split_raw(kg: f64) -> [i32; 4] {
    let total = (kg * 100.0).round() as i32;
    let base = total / 4;
    [base, base, base, total - base * 3]
}

impl SimScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// One complete group: four axis values and a report-complete marker.
    pub fn frame(mut self, kg: f64) -> Self {
        let raw = split_raw(kg);
        for which in Axis::ALL {
            self.steps.push(Step::Event(AxisEvent::Axis {
                which,
                raw: raw[which.index()],
            }));
        }
        self.steps
            .push(Step::Event(AxisEvent::SyncReport(SYNC_REPORT_COMPLETE)));
        self
    }

    pub fn frames(self, n: usize, kg: f64) -> Self {
        (0..n).fold(self, |s, _| s.frame(kg))
    }

    /// A group that never reports `missing` before the report-complete marker.
    pub fn partial_frame(mut self, missing: Axis, kg: f64) -> Self {
        let raw = split_raw(kg);
        for which in Axis::ALL.into_iter().filter(|a| *a != missing) {
            self.steps.push(Step::Event(AxisEvent::Axis {
                which,
                raw: raw[which.index()],
            }));
        }
        self.steps
            .push(Step::Event(AxisEvent::SyncReport(SYNC_REPORT_COMPLETE)));
        self
    }

    pub fn event(mut self, event: AxisEvent) -> Self {
        self.steps.push(Step::Event(event));
        self
    }

    pub fn button(self) -> Self {
        self.event(AxisEvent::ButtonPress)
    }

    /// Inject a read failure at this point in the stream.
    pub fn fail(mut self, msg: impl Into<String>) -> Self {
        self.steps.push(Step::Fail(msg.into()));
        self
    }

    pub fn then_repeat(mut self, kg: f64) -> Self {
        self.tail = Tail::Repeat(kg);
        self
    }

    pub fn then_disconnect(mut self) -> Self {
        self.tail = Tail::Disconnect;
        self
    }
}

/// Shared counters observed by tests and the CLI self-check.
#[derive(Debug, Clone, Default)]
pub struct SimProbe {
    lookups: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl SimProbe {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

pub struct SimulatedBoard {
    steps: VecDeque<Step>,
    tail: Tail,
    frame_delay: Duration,
    probe: SimProbe,
    closed: bool,
}

impl SimulatedBoard {
    pub fn new(script: SimScript) -> Self {
        Self::with_probe(script, Duration::ZERO, SimProbe::default())
    }

    pub fn with_probe(script: SimScript, frame_delay: Duration, probe: SimProbe) -> Self {
        Self {
            steps: script.steps.into(),
            tail: script.tail,
            frame_delay,
            probe,
            closed: false,
        }
    }

    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }

    fn refill(&mut self) -> Result<(), HwError> {
        match self.tail {
            Tail::Repeat(kg) => {
                self.steps.extend(SimScript::new().frame(kg).steps);
                Ok(())
            }
            Tail::Disconnect => Err(HwError::Disconnected),
        }
    }
}

impl DeviceHandle for SimulatedBoard {
    fn next_event(&mut self) -> Result<AxisEvent, Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Disconnected));
        }
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if self.steps.is_empty() {
            self.refill()?;
        }
        match self.steps.pop_front() {
            Some(Step::Event(ev)) => {
                if ev == AxisEvent::SyncReport(SYNC_REPORT_COMPLETE) && !self.frame_delay.is_zero()
                {
                    std::thread::sleep(self.frame_delay);
                }
                Ok(ev)
            }
            Some(Step::Fail(msg)) => Err(Box::new(HwError::Scripted(msg))),
            None => Err(Box::new(HwError::Disconnected)),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.probe.closed.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("simulated board closed");
    }
}

/// Lookup that hands out a fresh `SimulatedBoard` once the board "appears".
pub struct SimulatedLookup {
    script: SimScript,
    appear_after: Option<usize>,
    frame_delay: Duration,
    probe: SimProbe,
}

impl SimulatedLookup {
    /// Board present on the first lookup.
    pub fn present(script: SimScript) -> Self {
        Self {
            script,
            appear_after: Some(0),
            frame_delay: Duration::ZERO,
            probe: SimProbe::default(),
        }
    }

    /// Board never shows up.
    pub fn absent() -> Self {
        Self {
            script: SimScript::new(),
            appear_after: None,
            frame_delay: Duration::ZERO,
            probe: SimProbe::default(),
        }
    }

    /// Board shows up after `misses` empty lookups.
    pub fn appearing_after(misses: usize, script: SimScript) -> Self {
        Self {
            appear_after: Some(misses),
            ..Self::present(script)
        }
    }

    pub fn with_frame_delay(mut self, d: Duration) -> Self {
        self.frame_delay = d;
        self
    }

    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }

    /// Build a lookup from `WEII_SIM_*` environment variables.
    ///
    /// - `WEII_SIM_ABSENT=1`: the board never appears
    /// - `WEII_SIM_APPEAR_AFTER`: empty lookups before the board appears (default 0)
    /// - `WEII_SIM_WEIGHT_KG`: weight of the person on the board (default 72.5)
    /// - `WEII_SIM_LIGHT_FRAMES`: empty-board frames before stepping on (default 5)
    /// - `WEII_SIM_FRAMES`: frames while standing on the board (default 250)
    /// - `WEII_SIM_BUTTON_AFTER`: press the button after this many standing frames
    /// - `WEII_SIM_FRAME_DELAY_MS`: pause after every frame (default 0)
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
        }

        if var::<u8>("WEII_SIM_ABSENT").unwrap_or(0) != 0 {
            return Self::absent();
        }
        let kg = var::<f64>("WEII_SIM_WEIGHT_KG").unwrap_or(72.5);
        let light = var::<usize>("WEII_SIM_LIGHT_FRAMES").unwrap_or(5);
        let frames = var::<usize>("WEII_SIM_FRAMES").unwrap_or(250);
        let script = SimScript::new().frames(light, 0.0);
        let script = match var::<usize>("WEII_SIM_BUTTON_AFTER") {
            Some(n) => script.frames(n.min(frames), kg).button(),
            None => script.frames(frames, kg),
        };
        let script = script.then_repeat(0.0);
        let delay = Duration::from_millis(var::<u64>("WEII_SIM_FRAME_DELAY_MS").unwrap_or(0));
        tracing::debug!(kg, light, frames, "simulated board configured from environment");
        Self::appearing_after(var::<usize>("WEII_SIM_APPEAR_AFTER").unwrap_or(0), script)
            .with_frame_delay(delay)
    }
}

impl DeviceLookup for SimulatedLookup {
    type Handle = SimulatedBoard;

    fn find(&mut self) -> Option<SimulatedBoard> {
        let attempt = self.probe.lookups.fetch_add(1, Ordering::SeqCst);
        match self.appear_after {
            Some(misses) if attempt >= misses => {
                self.probe.opened.fetch_add(1, Ordering::SeqCst);
                Some(SimulatedBoard::with_probe(
                    self.script.clone(),
                    self.frame_delay,
                    self.probe.clone(),
                ))
            }
            _ => None,
        }
    }
}

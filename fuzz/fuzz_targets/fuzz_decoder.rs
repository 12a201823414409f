#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use weii_core::{DecodeResult, SampleCollector, SampleDecoder};
use weii_traits::{Axis, AxisEvent};

#[derive(Debug, Arbitrary)]
enum Ev {
    Axis(u8, i32),
    Button,
    Dropped,
    Sync(i32),
    Other(u16, u16, i32),
}

impl Ev {
    fn into_event(self) -> AxisEvent {
        match self {
            Ev::Axis(i, raw) => AxisEvent::Axis {
                which: Axis::ALL[usize::from(i) % 4],
                raw,
            },
            Ev::Button => AxisEvent::ButtonPress,
            Ev::Dropped => AxisEvent::SyncDropped,
            Ev::Sync(flag) => AxisEvent::SyncReport(flag),
            Ev::Other(kind, code, value) => AxisEvent::Unknown { kind, code, value },
        }
    }
}

fuzz_target!(|input: (u8, Vec<Ev>)| {
    let (max, events) = input;
    let max = usize::from(max).max(1);
    let mut dec = SampleDecoder::new();
    let mut collector = SampleCollector::new(20.0, max);
    for ev in events {
        match dec.decode(ev.into_event()) {
            DecodeResult::Completed(kg) => {
                assert!(dec.pending().is_empty());
                if collector.offer(kg).is_final() {
                    break;
                }
            }
            DecodeResult::Discarded | DecodeResult::Abort => assert!(dec.pending().is_empty()),
            DecodeResult::Pending => {}
        }
        assert!(collector.len() <= max);
    }
    let _ = weii_core::reduce(collector.window().as_slice(), 0.0);
});

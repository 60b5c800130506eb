//! Property tests for report-to-frame assembly.

use proptest::prelude::*;
use rift_hid_dk1_protocol::{TrackerReportBuilder, decode_tracker_report};
use rift_sensor::FrameAssembler;
use rift_sensor::sequence::{MAX_FRAMES_PER_REPORT, MAX_GAP_TICKS, TIME_UNIT};

fn report(count: u8, timestamp: u16) -> Result<rift_hid_dk1_protocol::TrackerSensors, TestCaseError> {
    let raw = TrackerReportBuilder::new()
        .sample_count(count)
        .timestamp(timestamp)
        .build();
    decode_tracker_report(&raw).map_err(|e| TestCaseError::fail(e.to_string()))
}

proptest! {
    #[test]
    fn prop_batch_size_bounded(
        steps in proptest::collection::vec((0u8..=20, any::<u16>()), 1..40),
    ) {
        let mut asm = FrameAssembler::new(true);
        for (count, timestamp) in steps {
            let batch = asm.assemble(&report(count, timestamp)?);
            prop_assert!(batch.len() <= MAX_FRAMES_PER_REPORT);
            prop_assert_eq!(
                batch.len(),
                usize::from(count).min(3) + usize::from(batch.synthesized())
            );
            for frame in batch.frames() {
                prop_assert!(frame.time_delta > 0.0);
                prop_assert!(frame.time_delta <= f64::from(MAX_GAP_TICKS) * TIME_UNIT + 1e-12);
            }
        }
    }

    #[test]
    fn prop_catch_up_fills_exact_gap(
        start in any::<u16>(),
        first_count in 1u8..=3,
        gap in 1u16..=200,
    ) {
        let mut asm = FrameAssembler::new(true);
        asm.assemble(&report(first_count, start)?);

        let delivered = u16::from(first_count);
        let next = start.wrapping_add(delivered + gap);
        let batch = asm.assemble(&report(1, next)?);

        prop_assert!(batch.synthesized());
        let catch_up = batch.frames()[0];
        prop_assert!((catch_up.time_delta - f64::from(gap) * TIME_UNIT).abs() < 1e-12);
    }
}

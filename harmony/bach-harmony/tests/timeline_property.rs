//! Property tests for timeline lookup invariants.

use bach_harmony::progression::{ProgressionKind, Resolution, create_progression};
use bach_theory::pitch::{KeySignature, PitchClass};
use proptest::prelude::*;

const KINDS: [ProgressionKind; 6] = [
    ProgressionKind::Basic,
    ProgressionKind::CircleOfFifths,
    ProgressionKind::Subdominant,
    ProgressionKind::ChromaticCircle,
    ProgressionKind::BorrowedChord,
    ProgressionKind::DescendingFifths,
];

proptest! {
    #[test]
    fn events_are_monotone_and_cover_the_span(
        bars in 1u32..24,
        tonic in 0u8..12,
        minor in any::<bool>(),
        kind_idx in 0usize..6,
    ) {
        let key = KeySignature::new(PitchClass::from_index(tonic), minor);
        let duration = bars * 1920;
        let timeline =
            create_progression(key, duration, Resolution::Bar, KINDS[kind_idx]);

        prop_assert_eq!(timeline.total_duration(), duration);
        for window in timeline.events().windows(2) {
            prop_assert!(window[1].tick >= window[0].tick);
            prop_assert!(window[0].end_tick >= window[0].tick);
            prop_assert_eq!(window[1].tick, window[0].end_tick);
        }
    }

    #[test]
    fn get_at_returns_the_covering_event(
        bars in 1u32..16,
        query in 0u32..40_000,
        tonic in 0u8..12,
    ) {
        let key = KeySignature::new(PitchClass::from_index(tonic), false);
        let duration = bars * 1920;
        let timeline = create_progression(key, duration, Resolution::Bar, ProgressionKind::Basic);

        let event = timeline.get_at(query);
        if query < duration {
            prop_assert!(event.tick <= query);
            prop_assert!(event.end_tick > query);
        } else {
            // Past the end the final event remains in effect.
            prop_assert_eq!(event.tick, timeline.events().last().unwrap().tick);
        }
        prop_assert!((0.0..=1.0).contains(&event.weight));
    }
}

//! texture/bach-texture/src/rhythm.rs
//! Rhythmic subdivision profiles for one beat.

use bach_time::{TICKS_PER_BEAT, Tick};

/// Subdivision of a single beat. Every profile's durations sum to exactly
/// one beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhythmProfile {
    /// One note per beat — themes and sparse textures.
    QuarterNote,
    /// Two notes per beat — the single-line default.
    EighthNote,
    /// Dotted eighth + sixteenth — French overture style.
    DottedEighth,
    /// Three notes per beat — dance-like ternary feel.
    Triplet,
    /// Four notes per beat — the arpeggiated default.
    Sixteenth,
    /// Eighth + two sixteenths — characteristic figuration.
    Mixed8th16th,
}

/// `(offset, duration)` pairs describing one beat under the profile.
#[must_use]
pub fn subdivisions(profile: RhythmProfile, beat_ticks: Tick) -> Vec<(Tick, Tick)> {
    match profile {
        RhythmProfile::QuarterNote => vec![(0, beat_ticks)],
        RhythmProfile::EighthNote => {
            let half = beat_ticks / 2;
            vec![(0, half), (half, beat_ticks - half)]
        }
        RhythmProfile::DottedEighth => {
            let dotted = beat_ticks * 3 / 4;
            vec![(0, dotted), (dotted, beat_ticks - dotted)]
        }
        RhythmProfile::Triplet => {
            let third = beat_ticks / 3;
            vec![(0, third), (third, third), (third * 2, beat_ticks - third * 2)]
        }
        RhythmProfile::Sixteenth => {
            let quarter = beat_ticks / 4;
            vec![
                (0, quarter),
                (quarter, quarter),
                (quarter * 2, quarter),
                (quarter * 3, beat_ticks - quarter * 3),
            ]
        }
        RhythmProfile::Mixed8th16th => {
            let half = beat_ticks / 2;
            let quarter = beat_ticks / 4;
            vec![(0, half), (half, quarter), (half + quarter, beat_ticks - half - quarter)]
        }
    }
}

/// Default subdivision at the standard beat length.
#[must_use]
pub fn beat_subdivisions(profile: RhythmProfile) -> Vec<(Tick, Tick)> {
    subdivisions(profile, TICKS_PER_BEAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RhythmProfile; 6] = [
        RhythmProfile::QuarterNote,
        RhythmProfile::EighthNote,
        RhythmProfile::DottedEighth,
        RhythmProfile::Triplet,
        RhythmProfile::Sixteenth,
        RhythmProfile::Mixed8th16th,
    ];

    #[test]
    fn every_profile_fills_the_beat_exactly() {
        for profile in ALL {
            let subs = subdivisions(profile, TICKS_PER_BEAT);
            let total: Tick = subs.iter().map(|&(_, d)| d).sum();
            assert_eq!(total, TICKS_PER_BEAT, "{profile:?}");

            let mut expected_offset = 0;
            for &(offset, duration) in &subs {
                assert_eq!(offset, expected_offset, "{profile:?}");
                assert!(duration > 0);
                expected_offset += duration;
            }
        }
    }

    #[test]
    fn note_counts_match_the_profile() {
        assert_eq!(beat_subdivisions(RhythmProfile::QuarterNote).len(), 1);
        assert_eq!(beat_subdivisions(RhythmProfile::EighthNote).len(), 2);
        assert_eq!(beat_subdivisions(RhythmProfile::Triplet).len(), 3);
        assert_eq!(beat_subdivisions(RhythmProfile::Sixteenth).len(), 4);
        assert_eq!(beat_subdivisions(RhythmProfile::Mixed8th16th).len(), 3);
    }

    #[test]
    fn dotted_profile_is_three_to_one() {
        let subs = beat_subdivisions(RhythmProfile::DottedEighth);
        assert_eq!(subs, vec![(0, 360), (360, 120)]);
    }
}

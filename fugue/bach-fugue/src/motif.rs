//! fugue/bach-fugue/src/motif.rs
//! Motif templates and goal-tone design values.
//!
//! Each character maps to four fixed A/B template pairs. Motif A drives
//! toward the goal tone (climax); Motif B descends from it. Templates are
//! design values, never generated, which keeps subject construction
//! structured instead of a random walk.

use bach_time::{DOTTED_EIGHTH, DOTTED_HALF, EIGHTH_NOTE, HALF_NOTE, QUARTER_NOTE,
    SIXTEENTH_NOTE, Tick};

use crate::subject::SubjectCharacter;

/// Motivic pattern family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotifKind {
    /// Stepwise motion in scale degrees.
    Scale,
    /// Leap plus contrary step.
    Leap,
    /// Repeated pitch with a characteristic rhythm.
    Rhythmic,
    /// Half-step crawl.
    Chromatic,
    /// Single long opening value.
    Sustain,
}

/// A fixed motivic pattern: degree offsets from the starting degree and a
/// matching rhythm.
#[derive(Debug, Clone, Copy)]
pub struct MotifTemplate {
    pub kind: MotifKind,
    pub degree_offsets: &'static [i32],
    pub durations: &'static [Tick],
}

/// Goal-tone design values: where the climax falls and how high it sits.
#[derive(Debug, Clone, Copy)]
pub struct GoalTone {
    /// Climax position as a fraction of subject length.
    pub position_ratio: f32,
    /// Climax pitch as a fraction of the available range.
    pub pitch_ratio: f32,
}

/// Fixed goal tone per character.
#[must_use]
pub fn goal_tone_for(character: SubjectCharacter) -> GoalTone {
    match character {
        SubjectCharacter::Severe => GoalTone { position_ratio: 0.65, pitch_ratio: 0.85 },
        SubjectCharacter::Playful => GoalTone { position_ratio: 0.50, pitch_ratio: 0.90 },
        SubjectCharacter::Noble => GoalTone { position_ratio: 0.70, pitch_ratio: 0.80 },
        SubjectCharacter::Restless => GoalTone { position_ratio: 0.60, pitch_ratio: 0.95 },
    }
}

macro_rules! motif {
    ($kind:expr, $offsets:expr, $durations:expr) => {
        MotifTemplate { kind: $kind, degree_offsets: $offsets, durations: $durations }
    };
}

const Q: Tick = QUARTER_NOTE;
const E: Tick = EIGHTH_NOTE;
const S: Tick = SIXTEENTH_NOTE;
const H: Tick = HALF_NOTE;
const DQ: Tick = Q + E;
const DE: Tick = DOTTED_EIGHTH;
const DH: Tick = DOTTED_HALF;

/// The template pair (A ascends to the goal tone, B descends from it) for
/// a character. Each character has four pairs; `template_idx` selects
/// among them mod 4.
#[must_use]
pub fn templates_for(
    character: SubjectCharacter,
    template_idx: u32,
) -> (MotifTemplate, MotifTemplate) {
    use MotifKind::{Chromatic, Leap, Rhythmic, Scale, Sustain};
    match character {
        // Severe: scale ascents answered by leap-and-recover descents.
        SubjectCharacter::Severe => match template_idx % 4 {
            0 => (
                motif!(Scale, &[0, 1, 2, 3], &[Q, Q, Q, Q]),
                motif!(Leap, &[0, -3, -2, -1, 0], &[Q, E, E, E, Q]),
            ),
            1 => (
                motif!(Scale, &[0, 1, 3, 2], &[Q, Q, E, E]),
                motif!(Scale, &[0, -1, -2, -3], &[Q, Q, Q, H]),
            ),
            2 => (
                motif!(Leap, &[0, -1, 1, 2], &[Q, E, E, Q]),
                motif!(Leap, &[0, -2, -1, 0], &[H, Q, Q, Q]),
            ),
            _ => (
                motif!(Leap, &[0, 2, 4], &[H, Q, Q]),
                motif!(Scale, &[0, -1, -2, 0], &[Q, Q, Q, Q]),
            ),
        },
        // Playful: upward leaps and repeated-note rhythm play.
        SubjectCharacter::Playful => match template_idx % 4 {
            0 => (
                motif!(Leap, &[0, 3, 2, 4], &[E, Q, E, Q]),
                motif!(Rhythmic, &[0, 0, -1, -2], &[E, E, E, Q]),
            ),
            1 => (
                motif!(Scale, &[0, 2, 4, 3], &[E, E, E, Q]),
                motif!(Rhythmic, &[0, -1, 0, -2], &[E, E, E, Q]),
            ),
            2 => (
                motif!(Leap, &[0, 4, 3, 5], &[E, Q, E, Q]),
                motif!(Scale, &[0, -2, -1, -3], &[E, E, E, Q]),
            ),
            _ => (
                motif!(Leap, &[0, 1, 3, 4], &[DE, S, E, Q]),
                motif!(Rhythmic, &[0, 0, -2, -1], &[E, E, E, Q]),
            ),
        },
        // Noble: sustained openings and stately descents.
        SubjectCharacter::Noble => match template_idx % 4 {
            0 => (
                motif!(Sustain, &[0, 1, 2], &[H, Q, Q]),
                motif!(Scale, &[0, -1, -2, -3, -4], &[Q, Q, Q, E, H]),
            ),
            1 => (
                motif!(Sustain, &[0, 2, 1], &[DH, Q, Q]),
                motif!(Scale, &[0, -1, -2, -1], &[H, Q, Q, H]),
            ),
            2 => (
                motif!(Leap, &[0, 3, 2], &[H, Q, Q]),
                motif!(Scale, &[0, -1, -2, -3], &[Q, Q, DQ, H]),
            ),
            _ => (
                motif!(Sustain, &[0, 1, 0], &[H, Q, H]),
                motif!(Leap, &[0, -3, -2, -1], &[Q, Q, Q, H]),
            ),
        },
        // Restless: chromatic crawls and jittery leap escapes.
        SubjectCharacter::Restless => match template_idx % 4 {
            0 => (
                motif!(Chromatic, &[0, 0, 1, 1, 2], &[E, E, E, E, E]),
                motif!(Leap, &[0, -4, -3, -2, -1], &[E, E, S, S, Q]),
            ),
            1 => (
                motif!(Chromatic, &[0, 1, 0, 2], &[S, S, E, E]),
                motif!(Leap, &[0, -3, -1, -2], &[E, S, S, E]),
            ),
            2 => (
                motif!(Leap, &[0, 2, 1, 3, 2], &[E, S, S, E, E]),
                motif!(Leap, &[0, -2, -4, -3], &[E, E, S, Q]),
            ),
            _ => (
                motif!(Chromatic, &[0, 1, 2, 1, 3], &[S, S, S, S, E]),
                motif!(Scale, &[0, -1, -3, -2], &[E, E, E, Q]),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARACTERS: [SubjectCharacter; 4] = [
        SubjectCharacter::Severe,
        SubjectCharacter::Playful,
        SubjectCharacter::Noble,
        SubjectCharacter::Restless,
    ];

    #[test]
    fn every_template_pair_is_well_formed() {
        for character in CHARACTERS {
            for idx in 0..4 {
                let (a, b) = templates_for(character, idx);
                for template in [&a, &b] {
                    assert_eq!(
                        template.degree_offsets.len(),
                        template.durations.len(),
                        "{character:?} template {idx}"
                    );
                    assert!(template.durations.iter().all(|&d| d >= SIXTEENTH_NOTE));
                }
            }
        }
    }

    #[test]
    fn template_index_wraps_mod_four() {
        for character in CHARACTERS {
            let (a0, _) = templates_for(character, 0);
            let (a4, _) = templates_for(character, 4);
            assert_eq!(a0.degree_offsets, a4.degree_offsets);
        }
    }

    #[test]
    fn goal_tones_sit_inside_the_subject() {
        for character in CHARACTERS {
            let goal = goal_tone_for(character);
            assert!(goal.position_ratio > 0.0 && goal.position_ratio < 1.0);
            assert!(goal.pitch_ratio > 0.0 && goal.pitch_ratio <= 1.0);
        }
    }

    #[test]
    fn noble_climax_is_latest_and_restless_peak_is_sharpest() {
        assert!(
            goal_tone_for(SubjectCharacter::Noble).position_ratio
                > goal_tone_for(SubjectCharacter::Playful).position_ratio
        );
        assert!(
            goal_tone_for(SubjectCharacter::Restless).pitch_ratio
                > goal_tone_for(SubjectCharacter::Noble).pitch_ratio
        );
    }
}

//! fugue/bach-fugue/src/params.rs
//! Character-level generation parameters and melodic repair helpers.

use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, clamp_pitch, nearest_scale_tone};
use bach_time::{DOTTED_EIGHTH, DOTTED_QUARTER, EIGHTH_NOTE, HALF_NOTE, QUARTER_NOTE,
    SIXTEENTH_NOTE, TICKS_PER_BAR, TICKS_PER_BEAT, Tick};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::policy::ArchetypePolicy;
use crate::subject::SubjectCharacter;

/// Dotted half note.
const DOTTED_HALF: Tick = HALF_NOTE + QUARTER_NOTE;

/// Durations for Severe: even values, no dots.
pub const SEVERE_DURATIONS: [Tick; 3] = [HALF_NOTE, QUARTER_NOTE, EIGHTH_NOTE];
/// Durations for Playful: dotted values included.
pub const PLAYFUL_DURATIONS: [Tick; 4] =
    [QUARTER_NOTE, EIGHTH_NOTE, DOTTED_QUARTER, DOTTED_EIGHTH];
/// Durations for Noble: stately, long values dominate.
pub const NOBLE_DURATIONS: [Tick; 4] =
    [DOTTED_HALF, HALF_NOTE, DOTTED_QUARTER, QUARTER_NOTE];
/// Durations for Restless: short, nervous, syncopation-prone.
pub const RESTLESS_DURATIONS: [Tick; 5] =
    [EIGHTH_NOTE, SIXTEENTH_NOTE, DOTTED_EIGHTH, QUARTER_NOTE, DOTTED_QUARTER];

/// Parameters that shape subject generation for one character.
#[derive(Debug, Clone, Copy)]
pub struct CharacterParams {
    /// Probability of a leap rather than a step.
    pub leap_prob: f32,
    /// Maximum pitch range in semitones.
    pub max_range: i32,
    /// Maximum melodic leap in semitones.
    pub max_leap: i32,
    /// Available duration values.
    pub durations: &'static [Tick],
    /// Anacrusis probability before policy clamping.
    pub anacrusis_prob: f32,
}

/// Generation parameters for a character.
#[must_use]
pub fn character_params(character: SubjectCharacter) -> CharacterParams {
    match character {
        SubjectCharacter::Severe => CharacterParams {
            leap_prob: 0.15,
            max_range: 8,
            max_leap: 7,
            durations: &SEVERE_DURATIONS,
            anacrusis_prob: 0.30,
        },
        SubjectCharacter::Playful => CharacterParams {
            leap_prob: 0.45,
            max_range: 12,
            max_leap: 9,
            durations: &PLAYFUL_DURATIONS,
            anacrusis_prob: 0.70,
        },
        SubjectCharacter::Noble => CharacterParams {
            leap_prob: 0.25,
            max_range: 10,
            max_leap: 8,
            durations: &NOBLE_DURATIONS,
            anacrusis_prob: 0.40,
        },
        SubjectCharacter::Restless => CharacterParams {
            leap_prob: 0.40,
            max_range: 12,
            max_leap: 10,
            durations: &RESTLESS_DURATIONS,
            anacrusis_prob: 0.60,
        },
    }
}

/// Tighten character parameters to the archetype's window.
///
/// The range narrows to the intersection of the character range and the
/// archetype's degree bounds (roughly 1.7 semitones per degree).
pub fn apply_archetype_constraints(params: &mut CharacterParams, policy: &ArchetypePolicy) {
    let policy_max_semitones = (policy.max_range_degrees as f32 * 1.7).round() as i32;
    params.max_range = params.max_range.min(policy_max_semitones);
}

/// Cadential degree formula for a character (degrees relative to tonic).
#[derive(Debug, Clone, Copy)]
pub struct CadentialFormula {
    pub degrees: &'static [i32],
    pub durations: &'static [Tick],
}

/// Fixed cadential approach per character.
#[must_use]
pub fn cadential_formula(character: SubjectCharacter) -> CadentialFormula {
    match character {
        SubjectCharacter::Severe => CadentialFormula {
            degrees: &[2, 1, 0],
            durations: &[QUARTER_NOTE, QUARTER_NOTE, HALF_NOTE],
        },
        SubjectCharacter::Playful => CadentialFormula {
            degrees: &[4, 3, 2, 1, 0],
            durations: &[EIGHTH_NOTE, EIGHTH_NOTE, EIGHTH_NOTE, EIGHTH_NOTE, QUARTER_NOTE],
        },
        SubjectCharacter::Noble => CadentialFormula {
            degrees: &[1, 0],
            durations: &[HALF_NOTE, HALF_NOTE],
        },
        SubjectCharacter::Restless => CadentialFormula {
            degrees: &[3, 2, 1, 0],
            durations: &[EIGHTH_NOTE, EIGHTH_NOTE, EIGHTH_NOTE, QUARTER_NOTE],
        },
    }
}

/// Clamp a leap that exceeds the character's maximum interval.
///
/// The candidate is pulled toward the previous pitch while keeping its
/// direction, then snapped to the scale. Playful and Restless may keep one
/// 8-9 semitone leap per subject, granted 20% of the time.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn clamp_leap(
    pitch: i32,
    prev_pitch: i32,
    character: SubjectCharacter,
    key: KeySignature,
    scale: ScaleKind,
    floor: u8,
    ceil: u8,
    rng: &mut ChaCha8Rng,
    large_leap_count: &mut u32,
) -> i32 {
    let params = character_params(character);
    let interval = pitch - prev_pitch;
    let magnitude = interval.abs();
    if magnitude <= params.max_leap {
        return pitch;
    }

    let wide_allowed = matches!(
        character,
        SubjectCharacter::Playful | SubjectCharacter::Restless
    );
    if wide_allowed && (8..=9).contains(&magnitude) && *large_leap_count == 0
        && rng.gen_bool(0.2)
    {
        *large_leap_count += 1;
        return pitch;
    }

    // Pull toward the previous pitch at decreasing distances until a scale
    // tone fits.
    let direction = interval.signum();
    let mut distance = params.max_leap;
    while distance > 0 {
        let candidate = prev_pitch + direction * distance;
        let snapped =
            i32::from(nearest_scale_tone(clamp_pitch(candidate, floor, ceil), key, scale));
        if (snapped - prev_pitch).abs() <= params.max_leap {
            return snapped;
        }
        distance -= 1;
    }
    prev_pitch
}

/// Avoid consecutive same-pitch notes by shifting to an adjacent scale
/// tone within bounds. Returns the original pitch when no neighbor fits.
#[must_use]
pub fn avoid_unison(
    pitch: i32,
    prev_pitch: i32,
    key: KeySignature,
    scale: ScaleKind,
    floor: u8,
    ceil: u8,
) -> i32 {
    if pitch != prev_pitch {
        return pitch;
    }
    for offset in [1, -1, 2, -2] {
        let candidate = pitch + offset;
        if candidate < i32::from(floor) || candidate > i32::from(ceil) {
            continue;
        }
        let snapped = i32::from(nearest_scale_tone(candidate.clamp(0, 127) as u8, key, scale));
        if snapped != prev_pitch && snapped >= i32::from(floor) && snapped <= i32::from(ceil) {
            return snapped;
        }
    }
    pitch
}

/// Snap a raw pitch to the nearest scale tone within bounds.
#[must_use]
pub fn snap_to_scale(pitch: i32, key: KeySignature, scale: ScaleKind, floor: u8, ceil: u8) -> i32 {
    i32::from(nearest_scale_tone(clamp_pitch(pitch, floor, ceil), key, scale))
}

/// Quantize a tick position to the nearest strong beat. Noble subjects
/// always land on beat 1.
#[must_use]
pub fn quantize_to_strong_beat(
    raw_tick: Tick,
    character: SubjectCharacter,
    total_ticks: Tick,
) -> Tick {
    let grid = if character == SubjectCharacter::Noble {
        TICKS_PER_BAR
    } else {
        TICKS_PER_BEAT * 2
    };
    let snapped = ((raw_tick + grid / 2) / grid) * grid;
    snapped.clamp(0, total_ticks.saturating_sub(TICKS_PER_BEAT))
}

/// Apply a ±1-step rhythm variation with 30% probability, on the fixed
/// six-step duration ladder.
#[must_use]
pub fn vary_duration(base: Tick, rng: &mut ChaCha8Rng) -> Tick {
    if !rng.gen_bool(0.30) {
        return base;
    }
    const STEPS: [Tick; 6] = [
        TICKS_PER_BEAT / 4,
        TICKS_PER_BEAT / 2,
        TICKS_PER_BEAT,
        TICKS_PER_BEAT * 3 / 2,
        TICKS_PER_BEAT * 2,
        TICKS_PER_BEAT * 3,
    ];
    let current = STEPS.iter().position(|&step| step >= base).unwrap_or(2);
    let shift: i32 = if rng.gen_bool(0.5) { 1 } else { -1 };
    let idx = (current as i32 + shift).clamp(0, STEPS.len() as i32 - 1) as usize;
    STEPS[idx]
}

//! core/bach-theory/src/scale.rs
//! Scale kinds and diatonic degree arithmetic.
//!
//! Degrees are 0-based (0 = tonic, 6 = leading tone). Absolute degrees
//! extend scale degrees with an octave offset anchored so that C4 in
//! C major is 0 and D5 is 8.

use crate::pitch::KeySignature;

/// Number of degrees in every supported scale.
pub const DEGREE_COUNT: i32 = 7;

/// The four scale kinds used by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleKind {
    Major,
    NaturalMinor,
    /// Raised seventh.
    HarmonicMinor,
    /// Ascending form.
    MelodicMinor,
}

impl ScaleKind {
    /// Semitone offsets of the seven degrees from the tonic.
    #[must_use]
    pub const fn intervals(self) -> [u8; 7] {
        match self {
            Self::Major => [0, 2, 4, 5, 7, 9, 11],
            Self::NaturalMinor => [0, 2, 3, 5, 7, 8, 10],
            Self::HarmonicMinor => [0, 2, 3, 5, 7, 8, 11],
            Self::MelodicMinor => [0, 2, 3, 5, 7, 9, 11],
        }
    }

    /// The generation default for a mode: harmonic minor carries the
    /// leading tone Bach's minor-key subjects rely on.
    #[must_use]
    pub fn for_key(key: KeySignature) -> Self {
        if key.is_minor { Self::HarmonicMinor } else { Self::Major }
    }
}

/// Whether a MIDI pitch belongs to the scale.
#[must_use]
pub fn is_scale_tone(pitch: u8, key: KeySignature, kind: ScaleKind) -> bool {
    let offset = (12 + u32::from(pitch % 12) - u32::from(key.tonic.index())) % 12;
    kind.intervals().contains(&(offset as u8))
}

/// Snap a pitch to the closest scale member.
///
/// Ties between the upper and lower neighbor break downward: a chromatic
/// pitch is treated as an inflection of the degree below it, matching the
/// chromatic convention of [`pitch_to_scale_degree`].
#[must_use]
pub fn nearest_scale_tone(pitch: u8, key: KeySignature, kind: ScaleKind) -> u8 {
    if is_scale_tone(pitch, key, kind) {
        return pitch;
    }
    for distance in 1u8..=6 {
        let up = pitch.saturating_add(distance);
        let down = pitch.saturating_sub(distance);
        let up_ok = up <= 127 && is_scale_tone(up, key, kind);
        let down_ok = is_scale_tone(down, key, kind);
        match (up_ok, down_ok) {
            (true, false) => return up,
            (_, true) => return down,
            (false, false) => {}
        }
    }
    pitch
}

/// Map a pitch to its 0-based scale degree.
///
/// Chromatic pitches report the degree of the nearest lower scale tone and
/// `false` for the second element.
#[must_use]
pub fn pitch_to_scale_degree(pitch: u8, key: KeySignature, kind: ScaleKind) -> (u8, bool) {
    let offset = ((12 + u32::from(pitch % 12) - u32::from(key.tonic.index())) % 12) as u8;
    let table = kind.intervals();
    if let Some(idx) = table.iter().position(|&iv| iv == offset) {
        return (idx as u8, true);
    }
    // Chromatic: degree of the nearest lower scale tone.
    let mut lower = 0u8;
    for (idx, &iv) in table.iter().enumerate() {
        if iv < offset {
            lower = idx as u8;
        }
    }
    (lower, false)
}

/// Absolute degree: scale degree plus octave offset, with C4 in C major = 0.
#[must_use]
pub fn absolute_degree(pitch: u8, key: KeySignature, kind: ScaleKind) -> i32 {
    let octave = i32::from(pitch / 12) - 5;
    let (degree, _) = pitch_to_scale_degree(pitch, key, kind);
    octave * DEGREE_COUNT + i32::from(degree)
}

/// Inverse of [`absolute_degree`]; the result is always a scale tone.
#[must_use]
pub fn absolute_degree_to_pitch(abs_degree: i32, key: KeySignature, kind: ScaleKind) -> u8 {
    let octave = abs_degree.div_euclid(DEGREE_COUNT);
    let degree = abs_degree.rem_euclid(DEGREE_COUNT) as usize;
    let pc = (i32::from(key.tonic.index()) + i32::from(kind.intervals()[degree])) % 12;
    let pitch = 12 * (octave + 5) + pc;
    clamp_pitch(pitch, 0, 127)
}

/// Pitch for a signed degree offset from a base pitch's octave position.
///
/// Degrees beyond the seventh wrap into neighboring octaves, so degree 7 is
/// the tonic an octave up and degree -1 the leading tone below.
#[must_use]
pub fn degree_to_pitch(degree: i32, base: u8, key: KeySignature, kind: ScaleKind) -> u8 {
    let octave = degree.div_euclid(DEGREE_COUNT);
    let idx = degree.rem_euclid(DEGREE_COUNT) as usize;
    let pitch = i32::from(base) + i32::from(key.tonic.index()) + 12 * octave
        + i32::from(kind.intervals()[idx]);
    clamp_pitch(pitch, 0, 127)
}

/// Move a pitch by a signed number of scale degrees.
///
/// Chromatic inputs snap to the scale first, so the result is always a
/// scale tone.
#[must_use]
pub fn step_scale_degrees(pitch: u8, degrees: i32, key: KeySignature, kind: ScaleKind) -> u8 {
    let snapped = nearest_scale_tone(pitch, key, kind);
    absolute_degree_to_pitch(absolute_degree(snapped, key, kind) + degrees, key, kind)
}

/// Integer clamp into `[0,127] ∩ [low,high]`.
#[must_use]
pub fn clamp_pitch(pitch: i32, low: u8, high: u8) -> u8 {
    let clamped = pitch.clamp(i32::from(low), i32::from(high));
    clamped.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchClass;

    fn c_major() -> KeySignature {
        KeySignature::c_major()
    }

    #[test]
    fn scale_membership_in_c_major() {
        for pitch in [60, 62, 64, 65, 67, 69, 71, 72] {
            assert!(is_scale_tone(pitch, c_major(), ScaleKind::Major), "pitch {pitch}");
        }
        for pitch in [61, 63, 66, 68, 70] {
            assert!(!is_scale_tone(pitch, c_major(), ScaleKind::Major), "pitch {pitch}");
        }
    }

    #[test]
    fn harmonic_minor_raises_the_seventh() {
        let g_minor = KeySignature::new(PitchClass::G, true);
        assert!(is_scale_tone(66, g_minor, ScaleKind::HarmonicMinor)); // F#4
        assert!(!is_scale_tone(65, g_minor, ScaleKind::HarmonicMinor)); // F4
        assert!(is_scale_tone(65, g_minor, ScaleKind::NaturalMinor));
    }

    #[test]
    fn nearest_tone_snaps_chromatic_neighbors() {
        assert_eq!(nearest_scale_tone(61, c_major(), ScaleKind::Major), 60);
        assert_eq!(nearest_scale_tone(70, c_major(), ScaleKind::Major), 69);
        assert_eq!(nearest_scale_tone(64, c_major(), ScaleKind::Major), 64);
    }

    #[test]
    fn degrees_and_absolute_degrees() {
        assert_eq!(pitch_to_scale_degree(60, c_major(), ScaleKind::Major), (0, true));
        assert_eq!(pitch_to_scale_degree(71, c_major(), ScaleKind::Major), (6, true));
        assert_eq!(pitch_to_scale_degree(61, c_major(), ScaleKind::Major), (0, false));

        assert_eq!(absolute_degree(60, c_major(), ScaleKind::Major), 0);
        assert_eq!(absolute_degree(74, c_major(), ScaleKind::Major), 8);
        assert_eq!(absolute_degree(59, c_major(), ScaleKind::Major), -1);
    }

    #[test]
    fn absolute_degree_round_trips_on_scale_tones() {
        let key = KeySignature::new(PitchClass::B, false);
        for abs in -14..21 {
            let pitch = absolute_degree_to_pitch(abs, key, ScaleKind::Major);
            assert_eq!(absolute_degree(pitch, key, ScaleKind::Major), abs);
        }
    }

    #[test]
    fn stepping_degrees_walks_the_scale() {
        let key = c_major();
        assert_eq!(step_scale_degrees(60, 1, key, ScaleKind::Major), 62);
        assert_eq!(step_scale_degrees(60, -1, key, ScaleKind::Major), 59);
        assert_eq!(step_scale_degrees(60, 7, key, ScaleKind::Major), 72);
        // Chromatic input snaps first: C#4 -> C4 -> D4.
        assert_eq!(step_scale_degrees(61, 1, key, ScaleKind::Major), 62);
    }

    #[test]
    fn degree_to_pitch_wraps_octaves() {
        assert_eq!(degree_to_pitch(0, 60, c_major(), ScaleKind::Major), 60);
        assert_eq!(degree_to_pitch(7, 60, c_major(), ScaleKind::Major), 72);
        assert_eq!(degree_to_pitch(-1, 60, c_major(), ScaleKind::Major), 59);
        let g_minor = KeySignature::new(PitchClass::G, true);
        assert_eq!(degree_to_pitch(0, 60, g_minor, ScaleKind::HarmonicMinor), 67);
    }
}

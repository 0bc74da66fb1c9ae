//! core/bach-theory/src/chord.rs
//! Diatonic chords: degree, quality tables, and chord-tone expansion.

use serde::{Deserialize, Serialize};

use crate::pitch::KeySignature;

/// Roman-numeral chord degree within a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordDegree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

impl ChordDegree {
    /// All degrees in order.
    pub const ALL: [ChordDegree; 7] = [
        ChordDegree::I,
        ChordDegree::II,
        ChordDegree::III,
        ChordDegree::IV,
        ChordDegree::V,
        ChordDegree::VI,
        ChordDegree::VII,
    ];

    /// 0-based index of the degree.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Semitone offset of the chord root from the tonic.
    #[must_use]
    pub fn semitones(self, is_minor: bool) -> u8 {
        const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
        const MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];
        if is_minor { MINOR[self.index()] } else { MAJOR[self.index()] }
    }

    /// Roman-numeral label (uppercase, quality-agnostic).
    #[must_use]
    pub fn label(self) -> &'static str {
        const LABELS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];
        LABELS[self.index()]
    }
}

/// Chord quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Minor7,
    MajorMajor7,
    Diminished7,
    HalfDiminished7,
}

impl ChordQuality {
    /// Semitone offsets of the chord tones from the root.
    #[must_use]
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::MajorMajor7 => &[0, 4, 7, 11],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
        }
    }
}

/// Diatonic triad quality for a degree in a major key.
#[must_use]
pub fn major_key_quality(degree: ChordDegree) -> ChordQuality {
    const TABLE: [ChordQuality; 7] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Minor,
        ChordQuality::Major,
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
    ];
    TABLE[degree.index()]
}

/// Diatonic triad quality for a degree in a (harmonic) minor key.
///
/// V is always Major: the raised seventh supplies the leading tone.
#[must_use]
pub fn minor_key_quality(degree: ChordDegree) -> ChordQuality {
    const TABLE: [ChordQuality; 7] = [
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Major,
        ChordQuality::Major,
        ChordQuality::Diminished,
    ];
    TABLE[degree.index()]
}

/// A chord instance placed at a concrete root pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub degree: ChordDegree,
    pub quality: ChordQuality,
    pub root_pitch: u8,
    pub inversion: u8,
}

impl Chord {
    /// Build the diatonic chord for a degree in a key, rooted in `octave`.
    #[must_use]
    pub fn diatonic(key: KeySignature, degree: ChordDegree, octave: i32) -> Self {
        let quality =
            if key.is_minor { minor_key_quality(degree) } else { major_key_quality(degree) };
        let root = (octave + 1) * 12
            + i32::from(key.tonic.index())
            + i32::from(degree.semitones(key.is_minor));
        Self { degree, quality, root_pitch: root.clamp(0, 127) as u8, inversion: 0 }
    }

    /// Pitch classes of the chord tones.
    #[must_use]
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|&iv| (self.root_pitch % 12 + iv) % 12)
            .collect()
    }

    /// Whether a pitch's class belongs to this chord.
    #[must_use]
    pub fn contains_pitch(&self, pitch: u8) -> bool {
        self.pitch_classes().contains(&(pitch % 12))
    }

    /// Root-position bass pitch in the given octave.
    #[must_use]
    pub fn bass_pitch(&self, octave: i32) -> u8 {
        let pitch = (octave + 1) * 12 + i32::from(self.root_pitch % 12);
        pitch.clamp(0, 127) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchClass;

    #[test]
    fn c_major_triad_pitch_classes() {
        let chord = Chord::diatonic(KeySignature::c_major(), ChordDegree::I, 4);
        assert_eq!(chord.root_pitch, 60);
        assert_eq!(chord.quality, ChordQuality::Major);
        assert_eq!(chord.pitch_classes(), vec![0, 4, 7]);
        assert!(chord.contains_pitch(76));
        assert!(!chord.contains_pitch(62));
    }

    #[test]
    fn minor_key_dominant_is_major() {
        let g_minor = KeySignature::new(PitchClass::G, true);
        let five = Chord::diatonic(g_minor, ChordDegree::V, 4);
        assert_eq!(five.quality, ChordQuality::Major);
        assert_eq!(five.root_pitch % 12, 2); // D
        assert!(five.contains_pitch(66)); // F# — leading tone of G minor
    }

    #[test]
    fn bass_pitch_sits_in_requested_octave() {
        let chord = Chord::diatonic(KeySignature::c_major(), ChordDegree::IV, 4);
        assert_eq!(chord.bass_pitch(2), 41); // F2
    }

    #[test]
    fn seventh_qualities_have_four_tones() {
        assert_eq!(ChordQuality::Dominant7.intervals().len(), 4);
        assert_eq!(ChordQuality::Diminished7.intervals(), &[0, 3, 6, 9]);
    }
}

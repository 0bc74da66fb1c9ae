//! core/bach-theory/src/pitch.rs
//! Pitch classes and key signatures.
//!
//! Spelling is deferred to MIDI: only the twelve pitch classes matter, so
//! C# stands in for Db throughout.

use serde::{Deserialize, Serialize};

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitone index relative to C (0-11).
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Construct from a semitone index (taken mod 12).
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        Self::ALL[usize::from(index % 12)]
    }

    /// The pitch class of a MIDI pitch.
    #[must_use]
    pub fn of_pitch(pitch: u8) -> Self {
        Self::from_index(pitch % 12)
    }

    /// Parse a tonic name such as `C`, `F#`, or `Bb`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let index = match name {
            "C" => 0,
            "C#" | "Db" => 1,
            "D" => 2,
            "D#" | "Eb" => 3,
            "E" => 4,
            "F" => 5,
            "F#" | "Gb" => 6,
            "G" => 7,
            "G#" | "Ab" => 8,
            "A" => 9,
            "A#" | "Bb" => 10,
            "B" => 11,
            _ => return None,
        };
        Some(Self::from_index(index))
    }

    /// Display name using sharps.
    #[must_use]
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 12] =
            ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
        NAMES[usize::from(self.index())]
    }
}

/// A key: tonic pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub tonic: PitchClass,
    pub is_minor: bool,
}

impl KeySignature {
    #[must_use]
    pub fn new(tonic: PitchClass, is_minor: bool) -> Self {
        Self { tonic, is_minor }
    }

    /// C major, the default harmonic context.
    #[must_use]
    pub fn c_major() -> Self {
        Self { tonic: PitchClass::C, is_minor: false }
    }

    /// Pitch class of the leading tone (a semitone below the tonic).
    #[must_use]
    pub fn leading_tone_class(&self) -> PitchClass {
        PitchClass::from_index((self.tonic.index() + 11) % 12)
    }

    /// Pitch class of the dominant.
    #[must_use]
    pub fn dominant_class(&self) -> PitchClass {
        PitchClass::from_index((self.tonic.index() + 7) % 12)
    }

    /// Label such as `G minor` for reports and track names.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.tonic.name(), if self.is_minor { "minor" } else { "major" })
    }
}

impl Default for KeySignature {
    fn default() -> Self {
        Self::c_major()
    }
}

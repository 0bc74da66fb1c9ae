//! api/bach-api/src/config.rs
//! Flat generation config, its enums, and validation.

use bach_theory::pitch::{KeySignature, PitchClass};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which form assembler to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Fugue,
    Goldberg,
    Chaconne,
}

impl Form {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Fugue => "fugue",
            Self::Goldberg => "goldberg",
            Self::Chaconne => "chaconne",
        }
    }
}

/// Expressive character of the generated material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Character {
    Severe,
    Playful,
    Noble,
    Restless,
}

/// Target instrument: affects range and MIDI program, never the
/// generation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Organ,
    Violin,
    Cello,
    Guitar,
    Harpsichord,
    Piano,
}

/// How much of the form's full plan to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationScale {
    Short,
    Standard,
    Long,
    Full,
}

/// The flat host-facing configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub form: Form,
    /// Tonic name: `C`, `F#`, `Bb`, …
    pub tonic: String,
    #[serde(default)]
    pub is_minor: bool,
    pub num_voices: u8,
    pub bpm: u16,
    pub seed: u32,
    pub character: Character,
    #[serde(default = "default_instrument")]
    pub instrument: Instrument,
    #[serde(default = "default_duration_scale")]
    pub duration_scale: DurationScale,
    /// Optional override of the form's bar count.
    #[serde(default)]
    pub target_bars: Option<u32>,
}

fn default_instrument() -> Instrument {
    Instrument::Organ
}

fn default_duration_scale() -> DurationScale {
    DurationScale::Standard
}

/// Validation failures, reported before generation begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown tonic `{0}`")]
    InvalidTonic(String),

    #[error("num_voices {0} out of range [2, 5]")]
    VoicesOutOfRange(u8),

    #[error("bpm must be positive")]
    InvalidBpm,

    #[error("character `{character:?}` is incompatible with form `{form:?}`")]
    IncompatibleCharacterForm { character: Character, form: Form },

    #[error("config JSON: {0}")]
    Malformed(String),
}

/// Character × form compatibility table. Severe has no place in the
/// dance-heavy Goldberg plan.
fn compatible(character: Character, form: Form) -> bool {
    !matches!((character, form), (Character::Severe, Form::Goldberg))
}

/// A validated configuration with parsed key material.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub form: Form,
    pub key: KeySignature,
    pub num_voices: u8,
    pub bpm: u16,
    pub seed: u32,
    pub character: Character,
    pub instrument: Instrument,
    pub duration_scale: DurationScale,
    pub target_bars: Option<u32>,
}

impl GenerateConfig {
    /// Parse a flat JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] when the JSON does not match
    /// the record shape.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Malformed(err.to_string()))
    }

    /// Validate every field and resolve the key.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: tonic, voice count, bpm, then the
    /// character × form compatibility table.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let tonic = PitchClass::parse(&self.tonic)
            .ok_or_else(|| ConfigError::InvalidTonic(self.tonic.clone()))?;
        if !(2..=5).contains(&self.num_voices) {
            return Err(ConfigError::VoicesOutOfRange(self.num_voices));
        }
        if self.bpm == 0 {
            return Err(ConfigError::InvalidBpm);
        }
        if !compatible(self.character, self.form) {
            return Err(ConfigError::IncompatibleCharacterForm {
                character: self.character,
                form: self.form,
            });
        }

        Ok(ValidatedConfig {
            form: self.form,
            key: KeySignature::new(tonic, self.is_minor),
            num_voices: self.num_voices,
            bpm: self.bpm,
            seed: self.seed,
            character: self.character,
            instrument: self.instrument,
            duration_scale: self.duration_scale,
            target_bars: self.target_bars,
        })
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            form: Form::Fugue,
            tonic: "C".to_owned(),
            is_minor: false,
            num_voices: 3,
            bpm: 120,
            seed: 1,
            character: Character::Severe,
            instrument: Instrument::Organ,
            duration_scale: DurationScale::Standard,
            target_bars: None,
        }
    }
}

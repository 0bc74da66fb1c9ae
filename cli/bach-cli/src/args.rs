//! cli/bach-cli/src/args.rs
//! Argument surface for the `bach` binary.

use std::path::PathBuf;

use bach_api::{Character, DurationScale, Form, Instrument};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bach", version, about = "Generate Bach-style pieces as Standard MIDI Files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a piece and write it as a .mid file.
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Form to generate.
    #[arg(long, value_enum, default_value_t = FormArg::Fugue)]
    pub form: FormArg,

    /// Key tonic (e.g., C, F#, Bb).
    #[arg(long, default_value = "C", value_name = "TONIC")]
    pub key: String,

    /// Use the minor mode.
    #[arg(long)]
    pub minor: bool,

    /// Number of voices (2-5).
    #[arg(long, default_value_t = 3)]
    pub voices: u8,

    /// Tempo in beats per minute.
    #[arg(long, default_value_t = 120)]
    pub bpm: u16,

    /// Generation seed.
    #[arg(long, default_value_t = 1)]
    pub seed: u32,

    /// Expressive character.
    #[arg(long, value_enum, default_value_t = CharacterArg::Severe)]
    pub character: CharacterArg,

    /// Target instrument (range and MIDI program only).
    #[arg(long, value_enum, default_value_t = InstrumentArg::Organ)]
    pub instrument: InstrumentArg,

    /// How much of the form's plan to render.
    #[arg(long, value_enum, default_value_t = ScaleArg::Standard)]
    pub scale: ScaleArg,

    /// Optional bar-count override.
    #[arg(long, value_name = "BARS")]
    pub target_bars: Option<u32>,

    /// JSON config file; overrides every flag above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output MIDI path.
    #[arg(long, short, default_value = "out.mid", value_name = "PATH")]
    pub output: PathBuf,

    /// Write an analysis report (dissonance, counterpoint, diagnostics).
    #[arg(long, value_name = "PATH")]
    pub analysis: Option<PathBuf>,

    /// Exit non-zero on any Critical diagnostic even if output was written.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum FormArg {
    Fugue,
    Goldberg,
    Chaconne,
}

impl From<FormArg> for Form {
    fn from(value: FormArg) -> Self {
        match value {
            FormArg::Fugue => Form::Fugue,
            FormArg::Goldberg => Form::Goldberg,
            FormArg::Chaconne => Form::Chaconne,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum CharacterArg {
    Severe,
    Playful,
    Noble,
    Restless,
}

impl From<CharacterArg> for Character {
    fn from(value: CharacterArg) -> Self {
        match value {
            CharacterArg::Severe => Character::Severe,
            CharacterArg::Playful => Character::Playful,
            CharacterArg::Noble => Character::Noble,
            CharacterArg::Restless => Character::Restless,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum InstrumentArg {
    Organ,
    Violin,
    Cello,
    Guitar,
    Harpsichord,
    Piano,
}

impl From<InstrumentArg> for Instrument {
    fn from(value: InstrumentArg) -> Self {
        match value {
            InstrumentArg::Organ => Instrument::Organ,
            InstrumentArg::Violin => Instrument::Violin,
            InstrumentArg::Cello => Instrument::Cello,
            InstrumentArg::Guitar => Instrument::Guitar,
            InstrumentArg::Harpsichord => Instrument::Harpsichord,
            InstrumentArg::Piano => Instrument::Piano,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum ScaleArg {
    Short,
    Standard,
    Long,
    Full,
}

impl From<ScaleArg> for DurationScale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::Short => DurationScale::Short,
            ScaleArg::Standard => DurationScale::Standard,
            ScaleArg::Long => DurationScale::Long,
            ScaleArg::Full => DurationScale::Full,
        }
    }
}

//! forms/bach-forms/src/generate.rs
//! The library entry point and helpers shared by the assemblers.

use bach_analysis::FailReport;
use bach_api::{Character, ConfigError, Form, GenerateConfig, ValidatedConfig};
use bach_fugue::SubjectCharacter;
use bach_harmony::HarmonicTimeline;
use bach_harmony::progression::{ProgressionKind, Resolution, create_progression};
use bach_score::{NoteEvent, Track};
use bach_theory::pitch::KeySignature;
use bach_time::{Meter, TICKS_PER_BAR, TempoEvent, Tick};

use crate::instrument::instrument_profile;
use crate::{chaconne, fugue_form, goldberg};

/// A complete generated piece plus its diagnostics and provenance.
#[derive(Debug)]
pub struct GeneratedPiece {
    /// One track per voice; the MIDI writer prepends the metadata track.
    pub tracks: Vec<Track>,
    pub tempo_events: Vec<TempoEvent>,
    pub meter: Meter,
    pub timeline: HarmonicTimeline,
    pub total_ticks: Tick,
    pub report: FailReport,
    /// Provenance payload embedded as the `BACH:` text event.
    pub metadata: serde_json::Value,
}

/// Validate the config and run the selected form assembler.
///
/// # Errors
///
/// Returns a [`ConfigError`] before any generation begins; a degraded
/// generation is reported through `GeneratedPiece::report`, never as an
/// error.
pub fn generate(config: &GenerateConfig) -> Result<GeneratedPiece, ConfigError> {
    let validated = config.validate()?;
    Ok(match validated.form {
        Form::Fugue => fugue_form::assemble_fugue(&validated),
        Form::Chaconne => chaconne::assemble_chaconne(&validated),
        Form::Goldberg => goldberg::assemble_goldberg(&validated),
    })
}

/// Map the config character onto the generator's subject character.
pub(crate) fn subject_character(character: Character) -> SubjectCharacter {
    match character {
        Character::Severe => SubjectCharacter::Severe,
        Character::Playful => SubjectCharacter::Playful,
        Character::Noble => SubjectCharacter::Noble,
        Character::Restless => SubjectCharacter::Restless,
    }
}

/// Derive a deterministic sub-seed from the run seed and a component tag.
pub(crate) fn sub_seed(seed: u32, tag: u32) -> u32 {
    seed ^ tag.wrapping_mul(0x9E37_79B9)
}

/// Round a tick count up to a whole bar.
pub(crate) fn round_up_to_bar(ticks: Tick) -> Tick {
    ticks.div_ceil(TICKS_PER_BAR) * TICKS_PER_BAR
}

/// Append a progression covering `[start, start + duration)` to an
/// existing timeline.
pub(crate) fn append_progression(
    timeline: &mut HarmonicTimeline,
    key: KeySignature,
    start: Tick,
    duration: Tick,
    resolution: Resolution,
    kind: ProgressionKind,
) {
    let section = create_progression(key, duration, resolution, kind);
    for event in section.events() {
        let mut shifted = *event;
        shifted.tick += start;
        shifted.end_tick += start;
        timeline.push(shifted);
    }
}

/// Shift a pitch by octaves until it fits the `(low, high)` band.
pub(crate) fn shift_into_band(pitch: u8, band: (u8, u8)) -> u8 {
    let mut value = i32::from(pitch);
    while value < i32::from(band.0) {
        value += 12;
    }
    while value > i32::from(band.1) {
        value -= 12;
    }
    value.clamp(i32::from(band.0), i32::from(band.1)) as u8
}

/// Build one named track per voice from a flat note list.
pub(crate) fn tracks_from_notes(
    notes: &[NoteEvent],
    num_voices: u8,
    config: &ValidatedConfig,
) -> Vec<Track> {
    let profile = instrument_profile(config.instrument);
    (0..num_voices)
        .map(|voice| {
            let mut track =
                Track::new(format!("Voice {}", voice + 1), voice & 0x0F, profile.program);
            track.notes =
                notes.iter().copied().filter(|note| note.voice == voice).collect();
            track.notes.sort_by_key(|note| note.start_tick);
            track
        })
        .collect()
}

/// Common provenance payload for the `BACH:` text event.
pub(crate) fn metadata_json(config: &ValidatedConfig, total_bars: Tick) -> serde_json::Value {
    serde_json::json!({
        "form": config.form.name(),
        "key": config.key.label(),
        "seed": config.seed,
        "character": format!("{:?}", config.character).to_lowercase(),
        "num_voices": config.num_voices,
        "bars": total_bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_api::Instrument;

    #[test]
    fn generate_rejects_invalid_configs() {
        let config = GenerateConfig { num_voices: 9, ..GenerateConfig::default() };
        assert_eq!(generate(&config).unwrap_err(), ConfigError::VoicesOutOfRange(9));
    }

    #[test]
    fn sub_seeds_differ_by_tag() {
        assert_ne!(sub_seed(42, 1), sub_seed(42, 2));
        assert_eq!(sub_seed(42, 1), sub_seed(42, 1));
    }

    #[test]
    fn bar_rounding() {
        assert_eq!(round_up_to_bar(0), 0);
        assert_eq!(round_up_to_bar(1), TICKS_PER_BAR);
        assert_eq!(round_up_to_bar(TICKS_PER_BAR), TICKS_PER_BAR);
        assert_eq!(round_up_to_bar(TICKS_PER_BAR + 480), TICKS_PER_BAR * 2);
    }

    #[test]
    fn band_shifting_lands_inside() {
        assert_eq!(shift_into_band(60, (36, 60)), 60);
        assert_eq!(shift_into_band(72, (36, 60)), 60);
        assert_eq!(shift_into_band(30, (36, 60)), 42);
    }

    #[test]
    fn tracks_split_notes_by_voice() {
        let config = GenerateConfig {
            instrument: Instrument::Organ,
            ..GenerateConfig::default()
        }
        .validate()
        .expect("valid");
        let notes = [
            NoteEvent::new(0, 480, 60, 80, 0),
            NoteEvent::new(0, 480, 64, 80, 1),
            NoteEvent::new(480, 480, 62, 80, 0),
        ];
        let tracks = tracks_from_notes(&notes, 2, &config);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].notes.len(), 2);
        assert_eq!(tracks[1].notes.len(), 1);
        assert_eq!(tracks[0].name, "Voice 1");
        assert_eq!(tracks[0].program, 19);
    }
}

//! End-to-end invariants over generated pieces: MIDI validity, strong-beat
//! consonance, immutable pass-through, determinism, and the write/read
//! round trip.

use bach_api::{Character, Form, GenerateConfig, Instrument};
use bach_forms::{GeneratedPiece, generate};
use bach_midi::{read_midi, write_midi};
use bach_score::{NoteEvent, NoteSource};
use bach_theory::interval::{IntervalClass, simple_interval};
use bach_time::{TICKS_PER_BAR, TICKS_PER_BEAT, Tick, is_strong_beat};

fn fugue_config(seed: u32) -> GenerateConfig {
    GenerateConfig {
        form: Form::Fugue,
        tonic: "C".to_owned(),
        is_minor: false,
        num_voices: 3,
        bpm: 120,
        seed,
        character: Character::Severe,
        ..GenerateConfig::default()
    }
}

fn all_notes(piece: &GeneratedPiece) -> Vec<NoteEvent> {
    piece.tracks.iter().flat_map(|track| track.notes.iter().copied()).collect()
}

#[test]
fn generated_notes_are_midi_valid() {
    for config in [
        fugue_config(42),
        GenerateConfig {
            form: Form::Chaconne,
            tonic: "D".to_owned(),
            is_minor: true,
            num_voices: 2,
            character: Character::Noble,
            instrument: Instrument::Violin,
            seed: 3,
            ..GenerateConfig::default()
        },
    ] {
        let piece = generate(&config).expect("generation succeeds");
        for track in &piece.tracks {
            for note in &track.notes {
                assert!(note.duration > 0);
                assert!((1..=127).contains(&note.velocity));
            }
            // No same-voice overlap within a track.
            let mut sorted = track.notes.clone();
            sorted.sort_by_key(|n| n.start_tick);
            for pair in sorted.windows(2) {
                assert!(
                    pair[1].start_tick >= pair[0].end_tick(),
                    "overlap in {} at {}",
                    track.name,
                    pair[1].start_tick
                );
            }
        }
    }
}

#[test]
fn fugue_scenario_shape() {
    let piece = generate(&fugue_config(42)).expect("generation succeeds");
    assert_eq!(piece.tracks.len(), 3);
    assert_eq!(piece.total_ticks % TICKS_PER_BAR, 0);

    // Voice 0's first note sits on a C-major scale tone.
    let first = piece.tracks[0].notes.first().expect("bass notes");
    let scale = [0u8, 2, 4, 5, 7, 9, 11];
    assert!(scale.contains(&(first.pitch % 12)));
}

#[test]
fn strong_beats_carry_only_consonances() {
    let piece = generate(&fugue_config(42)).expect("generation succeeds");
    let notes = all_notes(&piece);

    let mut tick: Tick = 0;
    while tick < piece.total_ticks {
        if is_strong_beat(tick) {
            let sounding: Vec<&NoteEvent> =
                notes.iter().filter(|note| note.sounds_at(tick)).collect();
            let bass_voice =
                sounding.iter().map(|note| note.voice).min().unwrap_or(0);
            for (idx, a) in sounding.iter().enumerate() {
                for b in &sounding[idx + 1..] {
                    if a.voice == b.voice {
                        continue;
                    }
                    let interval = simple_interval(a.pitch, b.pitch);
                    let class = IntervalClass::of(interval);
                    let involves_bass = a.voice == bass_voice || b.voice == bass_voice;
                    let ok = if involves_bass {
                        class.is_consonant_against_bass()
                    } else {
                        class.is_consonant_between_upper()
                    };
                    assert!(
                        ok,
                        "interval {interval} at tick {tick} between voices {} and {}",
                        a.voice, b.voice
                    );
                }
            }
        }
        tick += TICKS_PER_BEAT;
    }
}

#[test]
fn immutable_sources_pass_through() {
    let config = GenerateConfig {
        form: Form::Goldberg,
        tonic: "G".to_owned(),
        num_voices: 3,
        bpm: 60,
        seed: 12,
        character: Character::Noble,
        instrument: Instrument::Harpsichord,
        duration_scale: bach_api::DurationScale::Short,
        ..GenerateConfig::default()
    };
    let piece = generate(&config).expect("generation succeeds");
    let soggetto: Vec<&NoteEvent> = piece.tracks[0]
        .notes
        .iter()
        .filter(|note| note.source == NoteSource::GoldbergSoggetto)
        .collect();
    assert!(!soggetto.is_empty());
    // Bar-length notes on bar boundaries, untouched by coordination.
    for note in soggetto {
        assert_eq!(note.start_tick % TICKS_PER_BAR, 0);
        assert_eq!(note.duration, TICKS_PER_BAR);
    }
}

#[test]
fn byte_identical_output_for_identical_configs() {
    let piece_a = generate(&fugue_config(9)).expect("generation succeeds");
    let piece_b = generate(&fugue_config(9)).expect("generation succeeds");
    let meta_a = serde_json::to_string(&piece_a.metadata).expect("json");
    let meta_b = serde_json::to_string(&piece_b.metadata).expect("json");
    let bytes_a =
        write_midi(&piece_a.tracks, &piece_a.tempo_events, piece_a.meter, 0, &meta_a);
    let bytes_b =
        write_midi(&piece_b.tracks, &piece_b.tempo_events, piece_b.meter, 0, &meta_b);
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn generated_piece_round_trips_through_smf() {
    let piece = generate(&fugue_config(42)).expect("generation succeeds");
    let metadata = serde_json::to_string(&piece.metadata).expect("json");
    let bytes = write_midi(&piece.tracks, &piece.tempo_events, piece.meter, 0, &metadata);
    let parsed = read_midi(&bytes).expect("parses");

    assert_eq!(parsed.bpm, 120);
    assert_eq!(parsed.metadata, metadata);
    for track in &piece.tracks {
        let parsed_track = parsed.track(&track.name).expect("track present");
        assert_eq!(parsed_track.notes.len(), track.notes.len());
        for note in &track.notes {
            let count = parsed_track
                .notes
                .iter()
                .filter(|candidate| {
                    candidate.start_tick == note.start_tick
                        && candidate.duration == note.duration
                        && candidate.pitch == note.pitch
                        && candidate.velocity == note.velocity
                })
                .count();
            assert_eq!(count, 1, "{note:?} in {}", track.name);
        }
    }
}

//! Write-then-read round trips.

use bach_midi::{read_midi, write_midi};
use bach_score::{NoteEvent, Track};
use bach_time::{Meter, TempoEvent};

fn voice_track(name: &str, notes: &[(u32, u32, u8, u8)]) -> Track {
    let mut track = Track::new(name, 0, 19);
    for &(start, duration, pitch, velocity) in notes {
        track.notes.push(NoteEvent::new(start, duration, pitch, velocity, 0));
    }
    track
}

#[test]
fn notes_tempo_and_metadata_survive_the_round_trip() {
    let tracks = vec![
        voice_track("Voice 1", &[(0, 480, 67, 80), (480, 240, 69, 75), (720, 240, 71, 70)]),
        voice_track("Voice 2", &[(0, 960, 48, 85), (960, 960, 55, 80)]),
    ];
    let tempo = vec![TempoEvent::new(0, 96)];
    let metadata = r#"{"form":"fugue","seed":42}"#;

    let bytes = write_midi(&tracks, &tempo, Meter::FOUR_FOUR, 0, metadata);
    let parsed = read_midi(&bytes).expect("round trip parse");

    assert_eq!(parsed.format, 1);
    assert_eq!(parsed.division, 480);
    assert_eq!(parsed.bpm, 96);
    assert_eq!(parsed.metadata, metadata);
    assert!(parsed.has_bach_metadata());
    assert!(parsed.track("BACH").is_some());

    // Every written note appears exactly once with its tuple intact.
    for (track_idx, original) in tracks.iter().enumerate() {
        let parsed_track = parsed.track(&original.name).expect("voice track");
        assert_eq!(parsed_track.notes.len(), original.notes.len(), "track {track_idx}");
        for note in &original.notes {
            let matches = parsed_track
                .notes
                .iter()
                .filter(|candidate| {
                    candidate.start_tick == note.start_tick
                        && candidate.duration == note.duration
                        && candidate.pitch == note.pitch
                        && candidate.velocity == note.velocity
                })
                .count();
            assert_eq!(matches, 1, "note {note:?}");
        }
    }
}

#[test]
fn transposition_shifts_parsed_pitches() {
    let tracks = vec![voice_track("Voice 1", &[(0, 480, 60, 80)])];
    let bytes = write_midi(&tracks, &[], Meter::FOUR_FOUR, 7, "");
    let parsed = read_midi(&bytes).expect("parse");
    assert_eq!(parsed.track("Voice 1").expect("track").notes[0].pitch, 67);
}

#[test]
fn empty_metadata_omits_the_text_event() {
    let bytes = write_midi(&[], &[], Meter::FOUR_FOUR, 0, "");
    let parsed = read_midi(&bytes).expect("parse");
    assert!(!parsed.has_bach_metadata());
    assert_eq!(parsed.bpm, 120);
}

#[test]
fn overlapping_same_pitch_notes_pair_in_onset_order() {
    // Two C4s where the first off should close the first on.
    let mut track = Track::new("Voice 1", 0, 0);
    track.notes.push(NoteEvent::new(0, 240, 60, 80, 0));
    track.notes.push(NoteEvent::new(480, 240, 60, 90, 0));
    let bytes = write_midi(&[track], &[], Meter::FOUR_FOUR, 0, "");
    let parsed = read_midi(&bytes).expect("parse");
    let notes = &parsed.track("Voice 1").expect("track").notes;
    assert_eq!(notes.len(), 2);
    assert_eq!((notes[0].start_tick, notes[0].duration), (0, 240));
    assert_eq!((notes[1].start_tick, notes[1].duration), (480, 240));
}

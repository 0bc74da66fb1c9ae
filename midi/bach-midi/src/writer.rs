//! midi/bach-midi/src/writer.rs
//! SMF Type-1 writer.

use bach_score::Track;
use bach_time::{Meter, TICKS_PER_BEAT, TempoEvent, Tick};

use crate::stream::{write_be16, write_be32, write_vlq};

/// Internal event for sorting before serialization.
struct WriteEvent {
    tick: Tick,
    status: u8,
    data1: u8,
    data2: u8,
    /// Lower sorts earlier at the same tick: note-off before note-on.
    priority: u8,
}

/// Transpose a pitch by a signed semitone offset and clamp to `[0, 127]`.
fn transpose(pitch: u8, semitones: i8) -> u8 {
    (i32::from(pitch) + i32::from(semitones)).clamp(0, 127) as u8
}

/// Serialize a complete SMF Type-1 byte stream.
///
/// Track 0 is the `BACH` metadata track: sorted tempo events, one
/// time-signature event, and an optional text event carrying
/// `"BACH:" + metadata`. Each non-empty voice track follows with a
/// program change, a name, and its note events (note-off before note-on
/// at equal ticks). `transpose_semitones` is applied to pitches exactly
/// once, here.
#[must_use]
pub fn write_midi(
    tracks: &[Track],
    tempo_events: &[TempoEvent],
    meter: Meter,
    transpose_semitones: i8,
    metadata: &str,
) -> Vec<u8> {
    let content_tracks: Vec<&Track> =
        tracks.iter().filter(|track| !track.notes.is_empty()).collect();

    let mut data = Vec::new();

    // MThd: length 6, format 1, track count, division.
    data.extend_from_slice(b"MThd");
    write_be32(&mut data, 6);
    write_be16(&mut data, 1);
    write_be16(&mut data, content_tracks.len() as u16 + 1);
    write_be16(&mut data, TICKS_PER_BEAT as u16);

    write_metadata_track(&mut data, tempo_events, meter, metadata);
    for track in content_tracks {
        write_voice_track(&mut data, track, transpose_semitones);
    }

    data
}

fn push_track_chunk(data: &mut Vec<u8>, body: &[u8]) {
    data.extend_from_slice(b"MTrk");
    write_be32(data, body.len() as u32);
    data.extend_from_slice(body);
}

fn write_meta(body: &mut Vec<u8>, delta: Tick, kind: u8, payload: &[u8]) {
    write_vlq(body, delta);
    body.push(0xFF);
    body.push(kind);
    write_vlq(body, payload.len() as u32);
    body.extend_from_slice(payload);
}

fn write_metadata_track(
    data: &mut Vec<u8>,
    tempo_events: &[TempoEvent],
    meter: Meter,
    metadata: &str,
) {
    let mut body = Vec::new();

    // Track name.
    write_meta(&mut body, 0, 0x03, b"BACH");

    // Tempo map, sorted; default 120 BPM when empty.
    let mut sorted: Vec<TempoEvent> = tempo_events.to_vec();
    sorted.sort_by_key(|event| event.tick);
    if sorted.is_empty() {
        sorted.push(TempoEvent::new(0, 120));
    }

    let mut prev_tick = 0;
    for event in &sorted {
        let usec = event.microseconds_per_beat();
        let payload =
            [((usec >> 16) & 0xFF) as u8, ((usec >> 8) & 0xFF) as u8, (usec & 0xFF) as u8];
        write_meta(&mut body, event.tick - prev_tick, 0x51, &payload);
        prev_tick = event.tick;
    }

    // Time signature: numerator, log2 denominator, 24 clocks/click, 8
    // thirty-seconds per quarter.
    write_meta(&mut body, 0, 0x58, &[meter.numerator, meter.denominator_log2(), 24, 8]);

    // Provenance text.
    if !metadata.is_empty() {
        let payload = format!("BACH:{metadata}");
        write_meta(&mut body, 0, 0x01, payload.as_bytes());
    }

    // End of track.
    write_meta(&mut body, 0, 0x2F, &[]);
    push_track_chunk(data, &body);
}

fn write_voice_track(data: &mut Vec<u8>, track: &Track, transpose_semitones: i8) {
    let mut body = Vec::new();
    let channel = track.channel & 0x0F;

    // Program change at tick 0.
    write_vlq(&mut body, 0);
    body.push(0xC0 | channel);
    body.push(track.program & 0x7F);

    if !track.name.is_empty() {
        write_meta(&mut body, 0, 0x03, track.name.as_bytes());
    }

    let mut events = Vec::with_capacity(track.notes.len() * 2);
    for note in &track.notes {
        let pitch = transpose(note.pitch, transpose_semitones);
        events.push(WriteEvent {
            tick: note.start_tick,
            status: 0x90 | channel,
            data1: pitch,
            data2: note.velocity,
            priority: 1,
        });
        events.push(WriteEvent {
            tick: note.end_tick(),
            status: 0x80 | channel,
            data1: pitch,
            data2: 0,
            priority: 0,
        });
    }
    events.sort_by(|a, b| a.tick.cmp(&b.tick).then_with(|| a.priority.cmp(&b.priority)));

    let mut prev_tick = 0;
    for event in &events {
        write_vlq(&mut body, event.tick - prev_tick);
        body.push(event.status);
        body.push(event.data1 & 0x7F);
        body.push(event.data2 & 0x7F);
        prev_tick = event.tick;
    }

    write_meta(&mut body, 0, 0x2F, &[]);
    push_track_chunk(data, &body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_score::NoteEvent;

    #[test]
    fn header_chunk_is_format_one_at_division_480() {
        let bytes = write_midi(&[], &[], Meter::FOUR_FOUR, 0, "");
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[4..8], [0, 0, 0, 6]);
        assert_eq!(&bytes[8..10], [0, 1]); // format 1
        assert_eq!(&bytes[10..12], [0, 1]); // metadata track only
        assert_eq!(&bytes[12..14], [0x01, 0xE0]); // 480
    }

    #[test]
    fn metadata_track_carries_name_tempo_and_text() {
        let bytes =
            write_midi(&[], &[TempoEvent::new(0, 120)], Meter::FOUR_FOUR, 0, "{\"seed\":42}");
        let haystack = bytes.as_slice();

        let name_pattern = [0x00, 0xFF, 0x03, 0x04, b'B', b'A', b'C', b'H'];
        assert!(contains(haystack, &name_pattern), "missing BACH track name");

        // 120 BPM = 500000 usec = 0x07 A1 20.
        let tempo_pattern = [0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20];
        assert!(contains(haystack, &tempo_pattern), "missing tempo event");

        let sig_pattern = [0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08];
        assert!(contains(haystack, &sig_pattern), "missing time signature");

        assert!(contains(haystack, b"BACH:{\"seed\":42}"), "missing metadata payload");
    }

    #[test]
    fn note_off_precedes_note_on_at_equal_ticks() {
        let mut track = Track::new("Voice 1", 0, 19);
        track.notes.push(NoteEvent::new(0, 480, 60, 80, 0));
        track.notes.push(NoteEvent::new(480, 480, 62, 80, 0));
        let bytes = write_midi(&[track], &[], Meter::FOUR_FOUR, 0, "");

        // At tick 480: 0x80 (off 60) must come before 0x90 (on 62).
        let off_pos = find(&bytes, &[0x80, 60, 0]).expect("note off");
        let on_pos = find(&bytes, &[0x90, 62, 80]).expect("second note on");
        assert!(off_pos < on_pos);
    }

    #[test]
    fn transposition_applies_once_with_clamping() {
        let mut track = Track::new("Voice 1", 0, 0);
        track.notes.push(NoteEvent::new(0, 480, 126, 80, 0));
        let bytes = write_midi(&[track], &[], Meter::FOUR_FOUR, 7, "");
        assert!(contains(&bytes, &[0x90, 127, 80]));
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        find(haystack, needle).is_some()
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|window| window == needle)
    }
}

//! midi/bach-midi/src/reader.rs
//! SMF 0/1 reader: running-status unwrapping, note pairing, tempo and
//! `BACH:` metadata extraction.

use bach_score::NoteEvent;
use bach_time::Tick;

use crate::error::MidiFormatError;
use crate::stream::{read_be16, read_be32, read_vlq};

/// A parsed track: name, channel, program, and paired notes sorted by
/// start tick.
#[derive(Debug, Clone, Default)]
pub struct ParsedTrack {
    pub name: String,
    pub channel: u8,
    pub program: u8,
    pub notes: Vec<NoteEvent>,
}

/// Complete parsed representation of an SMF file.
#[derive(Debug, Clone, Default)]
pub struct ParsedMidi {
    pub format: u16,
    pub num_tracks: u16,
    pub division: u16,
    /// From the first tempo meta-event; 120 when absent.
    pub bpm: u16,
    pub tracks: Vec<ParsedTrack>,
    /// `BACH:` text payload, empty when absent.
    pub metadata: String,
}

impl ParsedMidi {
    /// Find a track by name.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&ParsedTrack> {
        self.tracks.iter().find(|track| track.name == name)
    }

    /// Whether a `BACH:` payload was present.
    #[must_use]
    pub fn has_bach_metadata(&self) -> bool {
        !self.metadata.is_empty()
    }
}

/// Parse an SMF 0/1 byte stream.
///
/// # Errors
///
/// Returns a [`MidiFormatError`] on bad magic bytes, truncation, or an
/// unsupported format.
pub fn read_midi(data: &[u8]) -> Result<ParsedMidi, MidiFormatError> {
    let mut offset = 0usize;

    let magic: [u8; 4] = data
        .get(0..4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(MidiFormatError::Truncated { context: "header magic" })?;
    if &magic != b"MThd" {
        return Err(MidiFormatError::BadMagic { expected: "MThd", found: magic });
    }
    offset += 4;

    let header_len = read_be32(data, &mut offset)
        .ok_or(MidiFormatError::Truncated { context: "header length" })?;
    let header_end = offset + header_len as usize;

    let format =
        read_be16(data, &mut offset).ok_or(MidiFormatError::Truncated { context: "format" })?;
    if format > 1 {
        return Err(MidiFormatError::UnsupportedFormat(format));
    }
    let num_tracks = read_be16(data, &mut offset)
        .ok_or(MidiFormatError::Truncated { context: "track count" })?;
    let division = read_be16(data, &mut offset)
        .ok_or(MidiFormatError::Truncated { context: "division" })?;
    offset = header_end;

    let mut parsed = ParsedMidi {
        format,
        num_tracks,
        division,
        bpm: 120,
        tracks: Vec::new(),
        metadata: String::new(),
    };

    let mut first_tempo: Option<u16> = None;
    for _ in 0..num_tracks {
        parse_track(data, &mut offset, &mut parsed, &mut first_tempo)?;
    }
    if let Some(bpm) = first_tempo {
        parsed.bpm = bpm;
    }

    Ok(parsed)
}

fn parse_track(
    data: &[u8],
    offset: &mut usize,
    parsed: &mut ParsedMidi,
    first_tempo: &mut Option<u16>,
) -> Result<(), MidiFormatError> {
    let magic: [u8; 4] = data
        .get(*offset..*offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(MidiFormatError::Truncated { context: "track magic" })?;
    if &magic != b"MTrk" {
        return Err(MidiFormatError::BadMagic { expected: "MTrk", found: magic });
    }
    *offset += 4;

    let length = read_be32(data, offset)
        .ok_or(MidiFormatError::Truncated { context: "track length" })?
        as usize;
    let track_end = *offset + length;
    if track_end > data.len() {
        return Err(MidiFormatError::TrackOverrun);
    }

    let mut track = ParsedTrack::default();
    let mut tick: Tick = 0;
    let mut running_status: u8 = 0;
    // Open note-ons awaiting their note-off, in onset order.
    let mut open_notes: Vec<(u8, Tick, u8)> = Vec::new(); // (pitch, start, velocity)

    while *offset < track_end {
        let delta = read_vlq(data, offset)
            .ok_or(MidiFormatError::Truncated { context: "delta time" })?;
        tick += delta;

        let mut status =
            *data.get(*offset).ok_or(MidiFormatError::Truncated { context: "status byte" })?;
        if status & 0x80 != 0 {
            *offset += 1;
            if status < 0xF0 {
                running_status = status;
            }
        } else {
            // Running status: reuse the previous channel status.
            status = running_status;
            if status == 0 {
                return Err(MidiFormatError::Truncated { context: "running status" });
            }
        }

        match status & 0xF0 {
            0x90 | 0x80 => {
                let pitch = *data
                    .get(*offset)
                    .ok_or(MidiFormatError::Truncated { context: "note pitch" })?;
                let velocity = *data
                    .get(*offset + 1)
                    .ok_or(MidiFormatError::Truncated { context: "note velocity" })?;
                *offset += 2;
                track.channel = status & 0x0F;

                let is_on = status & 0xF0 == 0x90 && velocity > 0;
                if is_on {
                    open_notes.push((pitch, tick, velocity));
                } else if let Some(idx) =
                    open_notes.iter().position(|&(open_pitch, _, _)| open_pitch == pitch)
                {
                    let (_, start, velocity) = open_notes.remove(idx);
                    let duration = tick.saturating_sub(start).max(1);
                    let voice = parsed.tracks.len() as u8;
                    track.notes.push(NoteEvent::new(start, duration, pitch, velocity, voice));
                }
            }
            0xC0 => {
                track.program = *data
                    .get(*offset)
                    .ok_or(MidiFormatError::Truncated { context: "program" })?;
                track.channel = status & 0x0F;
                *offset += 1;
            }
            0xA0 | 0xB0 | 0xE0 => {
                *offset += 2; // two-byte messages we skip
            }
            0xD0 => {
                *offset += 1; // channel pressure
            }
            0xF0 => {
                if status == 0xFF {
                    let kind = *data
                        .get(*offset)
                        .ok_or(MidiFormatError::Truncated { context: "meta kind" })?;
                    *offset += 1;
                    let len = read_vlq(data, offset)
                        .ok_or(MidiFormatError::Truncated { context: "meta length" })?
                        as usize;
                    let payload = data
                        .get(*offset..*offset + len)
                        .ok_or(MidiFormatError::Truncated { context: "meta payload" })?;
                    *offset += len;

                    match kind {
                        0x03 => track.name = String::from_utf8_lossy(payload).into_owned(),
                        0x51 if payload.len() == 3 => {
                            let usec = u32::from(payload[0]) << 16
                                | u32::from(payload[1]) << 8
                                | u32::from(payload[2]);
                            if first_tempo.is_none() && usec > 0 {
                                *first_tempo = Some((60_000_000 / usec) as u16);
                            }
                        }
                        0x01 => {
                            let text = String::from_utf8_lossy(payload);
                            if let Some(body) = text.strip_prefix("BACH:") {
                                parsed.metadata = body.to_owned();
                            }
                        }
                        _ => {}
                    }
                } else {
                    // SysEx: length-prefixed, skip.
                    let len = read_vlq(data, offset)
                        .ok_or(MidiFormatError::Truncated { context: "sysex length" })?
                        as usize;
                    *offset += len;
                }
            }
            _ => return Err(MidiFormatError::Truncated { context: "unknown status" }),
        }
    }

    *offset = track_end;
    track.notes.sort_by_key(|note| note.start_tick);
    parsed.tracks.push(track);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_magic_is_rejected() {
        let err = read_midi(b"RIFF\x00\x00\x00\x06\x00\x01\x00\x01\x01\xE0").unwrap_err();
        assert!(matches!(err, MidiFormatError::BadMagic { expected: "MThd", .. }));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = read_midi(b"MThd\x00\x00").unwrap_err();
        assert!(matches!(err, MidiFormatError::Truncated { .. }));
    }

    #[test]
    fn format_two_is_unsupported() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&[0, 0, 0, 6, 0, 2, 0, 0, 0x01, 0xE0]);
        assert_eq!(read_midi(&data).unwrap_err(), MidiFormatError::UnsupportedFormat(2));
    }

    #[test]
    fn running_status_notes_are_unwrapped() {
        // One track: note-on 60, then running-status note-on 64, offs via
        // velocity-zero note-ons.
        let mut body = Vec::new();
        body.extend_from_slice(&[0x00, 0x90, 60, 80]);
        body.extend_from_slice(&[0x00, 64, 80]); // running status note-on
        body.extend_from_slice(&[0x83, 0x60, 60, 0]); // +480: off via vel 0
        body.extend_from_slice(&[0x00, 64, 0]);
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(&body);

        let parsed = read_midi(&data).expect("parse");
        assert_eq!(parsed.tracks.len(), 1);
        let notes = &parsed.tracks[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].pitch, notes[0].duration), (60, 480));
        assert_eq!((notes[1].pitch, notes[1].duration), (64, 480));
    }
}

//! score/bach-score/src/event.rs
//! Note events, provenance tags, and voice tracks.

use bach_time::Tick;
use serde::{Deserialize, Serialize};

/// Provenance of a proposed note. The coordinator routes notes to its
/// acceptance tiers by this tag, and analysis uses it to explain where a
/// note came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteSource {
    FugueSubject,
    FugueAnswer,
    EpisodeMaterial,
    FreeCounterpoint,
    PedalPoint,
    CantusFixed,
    ArpeggioFlow,
    TextureNote,
    GoldbergSoggetto,
    Unknown,
}

impl Default for NoteSource {
    fn default() -> Self {
        Self::Unknown
    }
}

/// A single note on the tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start_tick: Tick,
    /// Always > 0.
    pub duration: Tick,
    /// MIDI pitch in `[0, 127]`.
    pub pitch: u8,
    /// MIDI velocity in `[1, 127]`.
    pub velocity: u8,
    /// Voice index; 0 is the lowest voice.
    pub voice: u8,
    pub source: NoteSource,
}

impl NoteEvent {
    /// Construct a note with the default `Unknown` source.
    #[must_use]
    pub fn new(start_tick: Tick, duration: Tick, pitch: u8, velocity: u8, voice: u8) -> Self {
        Self { start_tick, duration, pitch, velocity, voice, source: NoteSource::Unknown }
    }

    /// Same note with a different provenance tag.
    #[must_use]
    pub fn with_source(mut self, source: NoteSource) -> Self {
        self.source = source;
        self
    }

    /// First tick after the note.
    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.start_tick + self.duration
    }

    /// Whether the note is sounding at the given tick.
    #[must_use]
    pub fn sounds_at(&self, tick: Tick) -> bool {
        tick >= self.start_tick && tick < self.end_tick()
    }
}

/// One output voice: name, MIDI channel/program, and its notes.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub name: String,
    pub channel: u8,
    pub program: u8,
    pub notes: Vec<NoteEvent>,
}

impl Track {
    #[must_use]
    pub fn new(name: impl Into<String>, channel: u8, program: u8) -> Self {
        Self { name: name.into(), channel, program, notes: Vec::new() }
    }

    /// End of the last note, or 0 for an empty track.
    #[must_use]
    pub fn total_ticks(&self) -> Tick {
        self.notes.iter().map(NoteEvent::end_tick).max().unwrap_or(0)
    }
}

//! midi/bach-midi/src/lib.rs
//! SMF Type-1 serialization.
//!
//! The writer emits a metadata track named `BACH` (tempo map, time
//! signature, optional `BACH:`-prefixed provenance text) followed by one
//! track per voice. The reader parses SMF 0/1 back into note events,
//! unwrapping running status and pairing note-on/off.

pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;

pub use error::MidiFormatError;
pub use reader::{ParsedMidi, ParsedTrack, read_midi};
pub use writer::write_midi;

//! midi/bach-midi/src/error.rs
//! Reader error taxonomy.

use thiserror::Error;

/// Why an SMF byte stream failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MidiFormatError {
    #[error("bad magic bytes: expected {expected}, found {found:?}")]
    BadMagic { expected: &'static str, found: [u8; 4] },

    #[error("truncated file while reading {context}")]
    Truncated { context: &'static str },

    #[error("unsupported SMF format {0} (only 0 and 1 are handled)")]
    UnsupportedFormat(u16),

    #[error("track chunk overruns the file")]
    TrackOverrun,
}

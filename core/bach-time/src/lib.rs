//! core/bach-time/src/lib.rs
//! Integer musical time: the tick grid, meters, and tempo events.
//!
//! Everything in the generator counts time in ticks (480 per quarter note).
//! Tempo never enters tick arithmetic; it lives only in [`TempoEvent`]
//! entries consumed by the MIDI writer.

pub mod meter;
pub mod tempo;
pub mod tick;

pub use meter::Meter;
pub use tempo::{TempoEvent, TimeSignatureEvent};
pub use tick::{
    BEATS_PER_BAR, DOTTED_EIGHTH, DOTTED_HALF, DOTTED_QUARTER, EIGHTH_NOTE, HALF_NOTE,
    QUARTER_NOTE, SIXTEENTH_NOTE, TICKS_PER_BAR, TICKS_PER_BEAT, Tick, bar_of, beat_in_bar,
    is_strong_beat, quantize_to_sixteenth,
};

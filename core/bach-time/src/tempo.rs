//! core/bach-time/src/tempo.rs
//! Tempo and time-signature events for the meta track.

use serde::{Deserialize, Serialize};

use crate::meter::Meter;
use crate::tick::Tick;

/// Microseconds in one minute, for BPM conversion in the MIDI writer.
pub const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;

/// A tempo change at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub tick: Tick,
    pub bpm: u16,
}

impl TempoEvent {
    #[must_use]
    pub fn new(tick: Tick, bpm: u16) -> Self {
        Self { tick, bpm }
    }

    /// Microseconds per quarter note at this tempo.
    #[must_use]
    pub fn microseconds_per_beat(&self) -> u32 {
        MICROSECONDS_PER_MINUTE / u32::from(self.bpm.max(1))
    }
}

/// A time-signature change at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureEvent {
    pub tick: Tick,
    pub meter: Meter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microseconds_per_beat_at_common_tempi() {
        assert_eq!(TempoEvent::new(0, 120).microseconds_per_beat(), 500_000);
        assert_eq!(TempoEvent::new(0, 60).microseconds_per_beat(), 1_000_000);
    }
}

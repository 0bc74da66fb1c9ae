//! harmony/bach-harmony/src/event.rs
//! A single harmonic event on the timeline.

use bach_theory::chord::{Chord, ChordDegree};
use bach_theory::pitch::KeySignature;
use bach_time::Tick;
use serde::{Deserialize, Serialize};

/// One span of harmony: key, chord, bass anchor, and metric weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicEvent {
    pub tick: Tick,
    /// Always > `tick`.
    pub end_tick: Tick,
    pub key: KeySignature,
    pub chord: Chord,
    pub bass_pitch: u8,
    /// Metric importance in `[0, 1]`: 1.0 downbeat cadence, 0.5 weak beat.
    pub weight: f32,
    /// Immutable events may not be overwritten by later passes.
    pub is_immutable: bool,
    /// Post-construction annotation hint; the only field later passes may
    /// write.
    pub rhythm_factor: f32,
}

impl HarmonicEvent {
    /// Build an event spanning `[tick, end_tick)` on the given chord.
    #[must_use]
    pub fn new(
        tick: Tick,
        end_tick: Tick,
        key: KeySignature,
        chord: Chord,
        bass_pitch: u8,
        weight: f32,
    ) -> Self {
        Self { tick, end_tick, key, chord, bass_pitch, weight, is_immutable: false,
            rhythm_factor: 1.0 }
    }

    /// The default harmonic context: C major, I chord, C3 bass.
    #[must_use]
    pub fn default_c_major() -> Self {
        let key = KeySignature::c_major();
        let chord = Chord::diatonic(key, ChordDegree::I, 4);
        Self::new(0, 0, key, chord, 48, 1.0)
    }

    /// Whether the event covers the given tick.
    #[must_use]
    pub fn covers(&self, tick: Tick) -> bool {
        tick >= self.tick && tick < self.end_tick
    }

    /// Duration in ticks.
    #[must_use]
    pub fn duration(&self) -> Tick {
        self.end_tick.saturating_sub(self.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_event_is_c_major_tonic() {
        let event = HarmonicEvent::default_c_major();
        assert_eq!(event.key, KeySignature::c_major());
        assert_eq!(event.chord.degree, ChordDegree::I);
        assert_eq!(event.chord.root_pitch, 60);
        assert_eq!(event.bass_pitch, 48);
    }
}

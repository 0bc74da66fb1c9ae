//! harmony/bach-harmony/src/timeline.rs
//! Append-only, chronologically ordered harmonic event sequence.

use bach_theory::chord::Chord;
use bach_theory::pitch::KeySignature;
use bach_time::Tick;

use crate::event::HarmonicEvent;

/// A time-ordered sequence of harmonic events.
///
/// Events must be pushed in chronological order (weakly monotonic ticks;
/// adjacent events may share a tick when they refine a subdivision). Once a
/// generation pass starts reading the timeline, only annotation of
/// `rhythm_factor` is permitted — events are never added, reordered, or
/// removed, which lets later stages cache indices.
#[derive(Debug, Clone, Default)]
pub struct HarmonicTimeline {
    events: Vec<HarmonicEvent>,
}

impl HarmonicTimeline {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event.
    ///
    /// # Panics
    ///
    /// Panics if the event would break chronological order or has
    /// `end_tick < tick`.
    pub fn push(&mut self, event: HarmonicEvent) {
        assert!(event.end_tick >= event.tick, "event ends before it starts");
        if let Some(last) = self.events.last() {
            assert!(event.tick >= last.tick, "events must be chronological");
        }
        self.events.push(event);
    }

    /// All events in order.
    #[must_use]
    pub fn events(&self) -> &[HarmonicEvent] {
        &self.events
    }

    /// Mutable access for post-construction annotation only (e.g. writing
    /// `rhythm_factor` hints). Do not add or remove events.
    pub fn events_mut(&mut self) -> &mut [HarmonicEvent] {
        &mut self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the timeline has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event, or 0 when empty.
    #[must_use]
    pub fn total_duration(&self) -> Tick {
        self.events.last().map_or(0, |event| event.end_tick)
    }

    /// Index of the event with the largest `tick <= query`, if any.
    ///
    /// Linear scan; timelines are tens to low hundreds of events, and the
    /// scan sidesteps binary-search edge cases around shared ticks.
    fn find_index(&self, tick: Tick) -> Option<usize> {
        let mut found = None;
        for (idx, event) in self.events.iter().enumerate() {
            if event.tick <= tick {
                found = Some(idx);
            } else {
                break;
            }
        }
        found
    }

    /// The event in effect at `tick`.
    ///
    /// Returns the default C major / I event when the timeline is empty or
    /// the query precedes the first event.
    #[must_use]
    pub fn get_at(&self, tick: Tick) -> HarmonicEvent {
        self.find_index(tick).map_or_else(HarmonicEvent::default_c_major, |idx| self.events[idx])
    }

    /// Key in effect at `tick`.
    #[must_use]
    pub fn key_at(&self, tick: Tick) -> KeySignature {
        self.get_at(tick).key
    }

    /// Chord in effect at `tick`.
    #[must_use]
    pub fn chord_at(&self, tick: Tick) -> Chord {
        self.get_at(tick).chord
    }

    /// Whether an event starting exactly at `tick` changes the key.
    ///
    /// The first event counts as a change when it differs from the default
    /// C major.
    #[must_use]
    pub fn is_key_change(&self, tick: Tick) -> bool {
        let Some(idx) = self.find_index(tick) else { return false };
        if self.events[idx].tick != tick {
            return false;
        }
        if idx == 0 {
            return self.events[0].key != KeySignature::c_major();
        }
        self.events[idx].key != self.events[idx - 1].key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_theory::chord::ChordDegree;
    use bach_theory::pitch::PitchClass;

    fn event(tick: Tick, end: Tick, key: KeySignature) -> HarmonicEvent {
        let chord = Chord::diatonic(key, ChordDegree::I, 4);
        HarmonicEvent::new(tick, end, key, chord, chord.bass_pitch(2), 1.0)
    }

    #[test]
    fn empty_timeline_yields_default_event() {
        let timeline = HarmonicTimeline::new();
        let got = timeline.get_at(1000);
        assert_eq!(got.key, KeySignature::c_major());
        assert_eq!(got.chord.degree, ChordDegree::I);
        assert!(!timeline.is_key_change(0));
    }

    #[test]
    fn get_at_picks_the_latest_covering_event() {
        let key = KeySignature::c_major();
        let mut timeline = HarmonicTimeline::new();
        timeline.push(event(0, 480, key));
        timeline.push(event(480, 960, key));
        timeline.push(event(960, 1920, key));

        assert_eq!(timeline.get_at(0).tick, 0);
        assert_eq!(timeline.get_at(479).tick, 0);
        assert_eq!(timeline.get_at(480).tick, 480);
        assert_eq!(timeline.get_at(5000).tick, 960);
        assert_eq!(timeline.total_duration(), 1920);
    }

    #[test]
    fn key_change_detection() {
        let c_major = KeySignature::c_major();
        let g_minor = KeySignature::new(PitchClass::G, true);
        let mut timeline = HarmonicTimeline::new();
        timeline.push(event(0, 960, c_major));
        timeline.push(event(960, 1920, g_minor));

        assert!(!timeline.is_key_change(0)); // first event matches the default
        assert!(timeline.is_key_change(960));
        assert!(!timeline.is_key_change(961)); // not an event start
        assert!(!timeline.is_key_change(480));
    }

    #[test]
    fn first_event_in_foreign_key_counts_as_change() {
        let d_minor = KeySignature::new(PitchClass::D, true);
        let mut timeline = HarmonicTimeline::new();
        timeline.push(event(0, 960, d_minor));
        assert!(timeline.is_key_change(0));
    }

    #[test]
    #[should_panic(expected = "chronological")]
    fn out_of_order_push_panics() {
        let key = KeySignature::c_major();
        let mut timeline = HarmonicTimeline::new();
        timeline.push(event(960, 1920, key));
        timeline.push(event(0, 480, key));
    }
}

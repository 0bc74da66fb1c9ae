//! counterpoint/bach-counterpoint/src/vertical.rs
//! Vertical context: the `is_safe` predicate and consonance scoring.

use bach_harmony::HarmonicTimeline;
use bach_score::NoteEvent;
use bach_theory::interval::{IntervalClass, simple_interval};
use bach_time::{Tick, is_strong_beat};
use smallvec::SmallVec;

/// Predicate that may whitelist a weak-beat harsh dissonance (passing
/// tones, neighbors, suspensions). Arguments: tick, voice, candidate
/// pitch, other sounding pitch, simple interval, previous pitch in the
/// same voice (0 = unknown).
pub type WeakBeatAllow<'a> = &'a dyn Fn(Tick, u8, u8, u8, u8, u8) -> bool;

/// Generation-time vertical reference for candidate pitch evaluation.
///
/// Construct once per generation pass; `placed` grows as voices are
/// accepted, and each new candidate queries `is_safe`/`score` against the
/// notes already placed.
///
/// Chord-tone status never exempts a candidate from these checks: a pitch
/// inside the current chord that clashes with a sustained pedal still
/// fails (vertical sovereignty).
pub struct VerticalContext<'a> {
    pub placed: &'a [NoteEvent],
    pub timeline: &'a HarmonicTimeline,
    pub num_voices: u8,
    /// `None` means strict m2/TT/M7 rejection on weak beats.
    pub weak_beat_allow: Option<WeakBeatAllow<'a>>,
}

impl<'a> VerticalContext<'a> {
    #[must_use]
    pub fn new(placed: &'a [NoteEvent], timeline: &'a HarmonicTimeline, num_voices: u8) -> Self {
        Self { placed, timeline, num_voices, weak_beat_allow: None }
    }

    /// Notes from other voices sounding at `tick`.
    fn sounding_at(&self, tick: Tick, voice: u8) -> SmallVec<[&NoteEvent; 8]> {
        self.placed
            .iter()
            .filter(|note| note.voice != voice && note.sounds_at(tick))
            .collect()
    }

    /// Lowest voice index sounding at `tick`, including the candidate's.
    fn bass_voice_at(&self, tick: Tick, candidate_voice: u8) -> u8 {
        self.sounding_at(tick, candidate_voice)
            .iter()
            .map(|note| note.voice)
            .chain(std::iter::once(candidate_voice))
            .min()
            .unwrap_or(candidate_voice)
    }

    /// Whether a candidate pitch is vertically safe at the given tick.
    ///
    /// Strong beats admit only perfect consonance, imperfect consonance,
    /// and P4 between upper voices. Weak beats additionally reject m2, TT,
    /// and M7 unless the predicate permits; milder dissonances pass.
    #[must_use]
    pub fn is_safe(&self, tick: Tick, voice: u8, pitch: u8) -> bool {
        let others = self.sounding_at(tick, voice);
        if others.is_empty() {
            return true;
        }
        let bass_voice = self.bass_voice_at(tick, voice);
        let strong = is_strong_beat(tick);

        for other in &others {
            let interval = simple_interval(pitch, other.pitch);
            let class = IntervalClass::of(interval);
            let involves_bass = voice == bass_voice || other.voice == bass_voice;

            if strong {
                let ok = if involves_bass {
                    class.is_consonant_against_bass()
                } else {
                    class.is_consonant_between_upper()
                };
                if !ok {
                    return false;
                }
            } else if class == IntervalClass::HarshDissonance {
                let allowed = self.weak_beat_allow.is_some_and(|allow| {
                    let prev = self.find_prev_pitch(voice, tick);
                    allow(tick, voice, pitch, other.pitch, interval, prev)
                });
                if !allowed {
                    return false;
                }
            }
        }
        true
    }

    /// Span safety: the onset must be safe, and so must every strong beat
    /// the note sustains across — a consonant attack does not license a
    /// clash two beats later.
    #[must_use]
    pub fn is_safe_span(&self, start: Tick, duration: Tick, voice: u8, pitch: u8) -> bool {
        if !self.is_safe(start, voice, pitch) {
            return false;
        }
        let end = start + duration;
        let strong_grid = bach_time::TICKS_PER_BEAT * 2;
        let mut tick = (start / strong_grid + 1) * strong_grid;
        while tick < end {
            if is_strong_beat(tick) && !self.is_safe(tick, voice, pitch) {
                return false;
            }
            tick += strong_grid;
        }
        true
    }

    /// Graduated vertical quality for candidate ranking.
    ///
    /// 0.0 when unsafe; otherwise the weakest pairwise quality: 1.0 for
    /// perfect consonance (or no other voice sounding), 0.8 imperfect,
    /// 0.5 P4 between upper voices, 0.3 tolerated weak-beat dissonance.
    #[must_use]
    pub fn score(&self, tick: Tick, voice: u8, pitch: u8) -> f32 {
        if !self.is_safe(tick, voice, pitch) {
            return 0.0;
        }
        let others = self.sounding_at(tick, voice);
        if others.is_empty() {
            return 1.0;
        }
        let bass_voice = self.bass_voice_at(tick, voice);

        let mut worst = 1.0f32;
        for other in &others {
            let interval = simple_interval(pitch, other.pitch);
            let involves_bass = voice == bass_voice || other.voice == bass_voice;
            let quality = match IntervalClass::of(interval) {
                IntervalClass::PerfectConsonance => 1.0,
                IntervalClass::ImperfectConsonance => 0.8,
                IntervalClass::Fourth if !involves_bass => 0.5,
                _ => 0.3,
            };
            worst = worst.min(quality);
        }
        worst
    }

    /// Most recent pitch placed in `voice` strictly before `before_tick`,
    /// or 0 when the voice has no history yet.
    #[must_use]
    pub fn find_prev_pitch(&self, voice: u8, before_tick: Tick) -> u8 {
        self.placed
            .iter()
            .filter(|note| note.voice == voice && note.start_tick < before_tick)
            .max_by_key(|note| note.start_tick)
            .map_or(0, |note| note.pitch)
    }
}

//! counterpoint/bach-counterpoint/src/coordinate.rs
//! The unified per-tick coordination pass.
//!
//! Merges proposed notes from every source (subject entries, flow layers,
//! pedal points, textures) into one placed-note list while enforcing the
//! vertical rules. Notes route to one of three acceptance tiers by their
//! source tag: immutable (pass through), lightweight (range + strong-beat
//! chord-tone + vertical check), or full (scale-neighbor alternatives
//! ranked by melodic x vertical quality).

use bach_harmony::HarmonicTimeline;
use bach_score::{NoteEvent, NoteSource};
use bach_theory::scale::{ScaleKind, step_scale_degrees};
use bach_time::{SIXTEENTH_NOTE, TICKS_PER_BEAT, Tick, is_strong_beat};
use smallvec::SmallVec;

use crate::melodic::MelodicContext;
use crate::vertical::{VerticalContext, WeakBeatAllow};

/// Why a proposed note was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    OutOfRange,
    NonChordToneOnStrongBeat,
    VerticalClash,
    NoViableAlternative,
    OverlapsPredecessor,
}

/// Diagnostic record for a dropped note. A drop leaves a rest; it never
/// aborts the piece.
#[derive(Debug, Clone)]
pub struct DroppedNote {
    pub tick: Tick,
    pub voice: u8,
    pub pitch: u8,
    pub source: NoteSource,
    pub reason: DropReason,
}

/// Configuration for one coordination pass.
pub struct CoordinationConfig<'a> {
    pub num_voices: u8,
    pub timeline: &'a HarmonicTimeline,
    /// `(low, high)` per voice index; voices beyond the slice use the full
    /// MIDI range.
    pub voice_ranges: &'a [(u8, u8)],
    /// Sources accepted without modification.
    pub immutable_sources: &'a [NoteSource],
    /// Sources checked but never rewritten.
    pub lightweight_sources: &'a [NoteSource],
    /// Rank full-tier candidates toward the voice's next proposed pitch.
    pub use_next_pitch_map: bool,
    /// Reject full-tier candidates that form a cross relation with another
    /// voice's most recent pitch.
    pub check_cross_relations: bool,
    pub weak_beat_allow: Option<WeakBeatAllow<'a>>,
    /// Form name for diagnostics.
    pub form_name: &'a str,
}

impl<'a> CoordinationConfig<'a> {
    /// A default configuration: pedal points and cantus lines immutable,
    /// nothing lightweight.
    #[must_use]
    pub fn new(timeline: &'a HarmonicTimeline, num_voices: u8) -> Self {
        Self {
            num_voices,
            timeline,
            voice_ranges: &[],
            immutable_sources: &[NoteSource::PedalPoint, NoteSource::CantusFixed],
            lightweight_sources: &[],
            use_next_pitch_map: false,
            check_cross_relations: false,
            weak_beat_allow: None,
            form_name: "Unknown",
        }
    }

    fn range_for(&self, voice: u8) -> (u8, u8) {
        self.voice_ranges.get(usize::from(voice)).copied().unwrap_or((0, 127))
    }
}

/// Result of a coordination pass.
pub struct CoordinationResult {
    /// Placed notes, sorted by `(start_tick, voice)`.
    pub notes: Vec<NoteEvent>,
    pub dropped: Vec<DroppedNote>,
}

/// Number of scale-neighbor alternatives tried in the full tier.
const FULL_TIER_ALTERNATIVES: [i32; 4] = [-1, 1, -2, 2];

/// Run the coordination pass over all proposed notes.
#[must_use]
pub fn coordinate_voices(
    mut proposed: Vec<NoteEvent>,
    config: &CoordinationConfig<'_>,
) -> CoordinationResult {
    // Group by start tick, immutable first within a group, then lower
    // voices before upper so the harmonic foundation is in place when the
    // upper voices are checked.
    let immutable = |note: &NoteEvent| config.immutable_sources.contains(&note.source);
    proposed.sort_by(|a, b| {
        a.start_tick
            .cmp(&b.start_tick)
            .then_with(|| immutable(b).cmp(&immutable(a)))
            .then_with(|| a.voice.cmp(&b.voice))
    });

    let mut placed: Vec<NoteEvent> = Vec::with_capacity(proposed.len());
    let mut dropped: Vec<DroppedNote> = Vec::new();
    // Index of the most recent accepted note per voice, for overlap repair.
    let mut last_in_voice: [Option<usize>; 16] = [None; 16];

    for (idx, note) in proposed.iter().enumerate() {
        let accepted = if immutable(note) {
            Some(*note)
        } else if config.lightweight_sources.contains(&note.source) {
            accept_lightweight(note, &placed, config, &mut dropped)
        } else {
            accept_full(note, idx, &proposed, &placed, config, &mut dropped)
        };

        let Some(accepted) = accepted else { continue };

        // Same-voice overlap repair: shorten the predecessor, unless it is
        // immutable; drop the new note when the predecessor cannot shrink
        // to a sixteenth or may not be touched.
        let slot = usize::from(accepted.voice.min(15));
        if let Some(prev_idx) = last_in_voice[slot] {
            let prev_immutable = immutable(&placed[prev_idx]);
            let prev = &mut placed[prev_idx];
            if prev.end_tick() > accepted.start_tick {
                if !prev_immutable && accepted.start_tick >= prev.start_tick + SIXTEENTH_NOTE {
                    prev.duration = accepted.start_tick - prev.start_tick;
                } else if !immutable(note) {
                    dropped.push(DroppedNote {
                        tick: accepted.start_tick,
                        voice: accepted.voice,
                        pitch: accepted.pitch,
                        source: accepted.source,
                        reason: DropReason::OverlapsPredecessor,
                    });
                    continue;
                }
            }
        }

        last_in_voice[slot] = Some(placed.len());
        placed.push(accepted);
    }

    placed.sort_by(|a, b| a.start_tick.cmp(&b.start_tick).then_with(|| a.voice.cmp(&b.voice)));
    CoordinationResult { notes: placed, dropped }
}

fn accept_lightweight(
    note: &NoteEvent,
    placed: &[NoteEvent],
    config: &CoordinationConfig<'_>,
    dropped: &mut Vec<DroppedNote>,
) -> Option<NoteEvent> {
    let (low, high) = config.range_for(note.voice);
    let drop = |reason: DropReason, dropped: &mut Vec<DroppedNote>| {
        dropped.push(DroppedNote {
            tick: note.start_tick,
            voice: note.voice,
            pitch: note.pitch,
            source: note.source,
            reason,
        });
        None
    };

    if note.pitch < low || note.pitch > high {
        return drop(DropReason::OutOfRange, dropped);
    }
    if is_strong_beat(note.start_tick) {
        let event = config.timeline.get_at(note.start_tick);
        if !event.chord.contains_pitch(note.pitch) {
            return drop(DropReason::NonChordToneOnStrongBeat, dropped);
        }
    }
    let vertical = vertical_context(placed, config);
    if !vertical.is_safe_span(note.start_tick, note.duration, note.voice, note.pitch) {
        return drop(DropReason::VerticalClash, dropped);
    }
    Some(*note)
}

fn accept_full(
    note: &NoteEvent,
    idx: usize,
    proposed: &[NoteEvent],
    placed: &[NoteEvent],
    config: &CoordinationConfig<'_>,
    dropped: &mut Vec<DroppedNote>,
) -> Option<NoteEvent> {
    let (low, high) = config.range_for(note.voice);
    let vertical = vertical_context(placed, config);
    let key = config.timeline.key_at(note.start_tick);
    let scale = ScaleKind::for_key(key);

    // Candidate list: the proposed pitch, then nearby scale neighbors.
    let mut candidates: SmallVec<[u8; 5]> = SmallVec::new();
    candidates.push(note.pitch);
    for offset in FULL_TIER_ALTERNATIVES {
        let alternative = step_scale_degrees(note.pitch, offset, key, scale);
        if alternative >= low && alternative <= high && !candidates.contains(&alternative) {
            candidates.push(alternative);
        }
    }

    let melodic = melodic_context_for(note.voice, note.start_tick, placed, config);
    let next_pitch = config
        .use_next_pitch_map
        .then(|| next_proposed_pitch(proposed, idx, note.voice))
        .flatten();

    let mut ranked: SmallVec<[(f32, u8); 5]> = SmallVec::new();
    for &candidate in &candidates {
        if candidate < low || candidate > high {
            continue;
        }
        if !vertical.is_safe_span(note.start_tick, note.duration, note.voice, candidate) {
            continue;
        }
        let vertical_score = vertical.score(note.start_tick, note.voice, candidate);
        if vertical_score <= 0.0 {
            continue;
        }
        let mut quality = melodic.score(candidate, None, note.start_tick) * vertical_score;
        if let Some(next) = next_pitch {
            // Lookahead: prefer candidates a step away from the voice's
            // next proposed pitch.
            if candidate.abs_diff(next) <= 2 {
                quality += 0.05;
            }
        }
        ranked.push((quality, candidate));
    }
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    for &(_, candidate) in &ranked {
        if config.check_cross_relations && has_cross_relation(candidate, note, placed, &vertical) {
            continue;
        }
        let mut accepted = *note;
        accepted.pitch = candidate;
        return Some(accepted);
    }

    dropped.push(DroppedNote {
        tick: note.start_tick,
        voice: note.voice,
        pitch: note.pitch,
        source: note.source,
        reason: if ranked.is_empty() {
            DropReason::VerticalClash
        } else {
            DropReason::NoViableAlternative
        },
    });
    None
}

fn vertical_context<'a>(
    placed: &'a [NoteEvent],
    config: &CoordinationConfig<'a>,
) -> VerticalContext<'a> {
    VerticalContext {
        placed,
        timeline: config.timeline,
        num_voices: config.num_voices,
        weak_beat_allow: config.weak_beat_allow,
    }
}

fn melodic_context_for(
    voice: u8,
    tick: Tick,
    placed: &[NoteEvent],
    config: &CoordinationConfig<'_>,
) -> MelodicContext {
    let mut recent: SmallVec<[u8; 3]> = SmallVec::new();
    let mut history: Vec<&NoteEvent> =
        placed.iter().filter(|note| note.voice == voice && note.start_tick < tick).collect();
    history.sort_by_key(|note| std::cmp::Reverse(note.start_tick));
    for note in history.iter().take(3) {
        recent.push(note.pitch);
    }

    let key = config.timeline.key_at(tick);
    let is_leading_tone =
        recent.first().is_some_and(|&pitch| pitch % 12 == key.leading_tone_class().index());
    MelodicContext::from_recent(&recent, is_leading_tone)
}

/// Pitch of the next note proposed for the same voice after `idx`.
fn next_proposed_pitch(proposed: &[NoteEvent], idx: usize, voice: u8) -> Option<u8> {
    proposed[idx + 1..]
        .iter()
        .find(|note| note.voice == voice)
        .map(|note| note.pitch)
}

/// Cross relation: the candidate's pitch class chromatically contradicts
/// another voice's pitch from within the last beat.
fn has_cross_relation(
    candidate: u8,
    note: &NoteEvent,
    placed: &[NoteEvent],
    vertical: &VerticalContext<'_>,
) -> bool {
    let window_start = note.start_tick.saturating_sub(TICKS_PER_BEAT);
    for voice in 0..vertical.num_voices {
        if voice == note.voice {
            continue;
        }
        let prev = vertical.find_prev_pitch(voice, note.start_tick);
        if prev == 0 {
            continue;
        }
        let recent = placed.iter().any(|other| {
            other.voice == voice && other.pitch == prev && other.end_tick() > window_start
        });
        if recent && (candidate % 12).abs_diff(prev % 12) == 1 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_harmony::progression::{Resolution, create_standard};
    use bach_theory::pitch::KeySignature;
    use bach_time::TICKS_PER_BAR;

    fn note(tick: Tick, pitch: u8, voice: u8, source: NoteSource) -> NoteEvent {
        NoteEvent::new(tick, TICKS_PER_BEAT, pitch, 80, voice).with_source(source)
    }

    fn timeline() -> HarmonicTimeline {
        create_standard(KeySignature::c_major(), TICKS_PER_BAR * 4, Resolution::Bar)
    }

    #[test]
    fn immutable_notes_pass_through_unchanged() {
        let timeline = timeline();
        let config = CoordinationConfig::new(&timeline, 2);
        // A pedal dissonant against the proposed upper note: the pedal must
        // survive, the upper note must adapt or drop.
        let pedal = note(0, 48, 0, NoteSource::PedalPoint);
        let result = coordinate_voices(vec![pedal], &config);
        assert_eq!(result.notes, vec![pedal]);
        assert!(result.dropped.is_empty());
    }

    #[test]
    fn lightweight_notes_drop_on_strong_beat_non_chord_tones() {
        let timeline = timeline();
        let mut config = CoordinationConfig::new(&timeline, 2);
        config.lightweight_sources = &[NoteSource::ArpeggioFlow];
        config.voice_ranges = &[(30, 90), (30, 90)];

        // Beat 1 over the C major I chord: D4 is not a chord tone.
        let bad = note(0, 62, 1, NoteSource::ArpeggioFlow);
        let good = note(0, 64, 1, NoteSource::ArpeggioFlow);
        let result = coordinate_voices(vec![bad], &config);
        assert!(result.notes.is_empty());
        assert_eq!(result.dropped[0].reason, DropReason::NonChordToneOnStrongBeat);

        let result = coordinate_voices(vec![good], &config);
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn full_tier_rewrites_clashing_pitches_to_neighbors() {
        let timeline = timeline();
        let config = CoordinationConfig::new(&timeline, 2);
        let pedal = note(0, 60, 0, NoteSource::PedalPoint);
        // B4 over a C pedal on a strong beat is a M7 clash; the full tier
        // should land on a consonant neighbor instead of dropping.
        let clash = note(0, 71, 1, NoteSource::FreeCounterpoint);
        let result = coordinate_voices(vec![pedal, clash], &config);
        assert_eq!(result.notes.len(), 2);
        let upper = result.notes.iter().find(|n| n.voice == 1).unwrap();
        assert_ne!(upper.pitch, 71);
        let interval = bach_theory::interval::simple_interval(upper.pitch, 60);
        assert!(matches!(interval, 0 | 3 | 4 | 7 | 8 | 9));
    }

    #[test]
    fn output_is_sorted_by_tick_then_voice() {
        let timeline = timeline();
        let config = CoordinationConfig::new(&timeline, 3);
        let notes = vec![
            note(TICKS_PER_BEAT, 64, 1, NoteSource::FreeCounterpoint),
            note(0, 48, 0, NoteSource::PedalPoint),
            note(0, 64, 2, NoteSource::FreeCounterpoint),
            note(0, 55, 1, NoteSource::FreeCounterpoint),
        ];
        let result = coordinate_voices(notes, &config);
        let keys: Vec<(Tick, u8)> =
            result.notes.iter().map(|n| (n.start_tick, n.voice)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn same_voice_overlaps_shorten_the_predecessor() {
        let timeline = timeline();
        let config = CoordinationConfig::new(&timeline, 1);
        let long = NoteEvent::new(0, TICKS_PER_BAR, 60, 80, 0)
            .with_source(NoteSource::FreeCounterpoint);
        let next = NoteEvent::new(TICKS_PER_BEAT, TICKS_PER_BEAT, 64, 80, 0)
            .with_source(NoteSource::FreeCounterpoint);
        let result = coordinate_voices(vec![long, next], &config);
        assert_eq!(result.notes.len(), 2);
        assert_eq!(result.notes[0].duration, TICKS_PER_BEAT);
    }
}

//! analysis/bach-analysis/src/dissonance.rs
//! Four-phase dissonance detection.
//!
//! Phase 1 scans beat-by-beat interval clashes between voices, phase 2
//! flags non-chord tones against the harmonic timeline, phase 3 catches
//! notes sustained across a chord change, and phase 4 reports
//! non-diatonic pitches. Phases 1 and 3 apply to multi-voice (organ)
//! textures only.

use bach_harmony::HarmonicTimeline;
use bach_score::NoteEvent;
use bach_theory::interval::{IntervalClass, simple_interval};
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, is_scale_tone};
use bach_time::{TICKS_PER_BAR, TICKS_PER_BEAT, Tick, is_strong_beat};
use serde::Serialize;

/// Severity of a detected dissonance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DissonanceSeverity {
    /// Acceptable in context (passing tone, weak beat).
    Low,
    /// Notable but not critical.
    Medium,
    /// Likely unintentional.
    High,
}

/// The four detection phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DissonanceKind {
    SimultaneousClash,
    NonChordTone,
    SustainedOverChordChange,
    NonDiatonicNote,
}

/// One detected dissonance.
#[derive(Debug, Clone, Serialize)]
pub struct DissonanceEvent {
    pub kind: DissonanceKind,
    pub severity: DissonanceSeverity,
    pub tick: Tick,
    /// 1-based bar number.
    pub bar: u32,
    /// 1-based beat within the bar.
    pub beat: u8,
    pub pitch: u8,
    /// Second pitch for clash events, 0 otherwise.
    pub other_pitch: u8,
    pub voice_a: u8,
    pub voice_b: u8,
    /// Simple interval in semitones for clash events.
    pub interval: u8,
    pub description: String,
}

fn locate(tick: Tick) -> (u32, u8) {
    ((tick / TICKS_PER_BAR) + 1, ((tick % TICKS_PER_BAR) / TICKS_PER_BEAT + 1) as u8)
}

/// Summary statistics for one analysis pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DissonanceSummary {
    pub total: u32,
    pub high_count: u32,
    pub medium_count: u32,
    pub low_count: u32,
    pub simultaneous_clash_count: u32,
    pub non_chord_tone_count: u32,
    pub sustained_over_chord_change_count: u32,
    pub non_diatonic_note_count: u32,
    /// Raw events per beat.
    pub density_per_beat: f32,
    /// Weighted: High 1.0, Medium 0.5, Low 0.0.
    pub weighted_density_per_beat: f32,
}

/// Complete result of an analysis pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DissonanceResult {
    pub events: Vec<DissonanceEvent>,
    pub summary: DissonanceSummary,
}

impl DissonanceResult {
    fn summarize(events: Vec<DissonanceEvent>, total_ticks: Tick) -> Self {
        let mut summary = DissonanceSummary { total: events.len() as u32, ..Default::default() };
        let mut weighted = 0.0f32;
        for event in &events {
            match event.severity {
                DissonanceSeverity::High => {
                    summary.high_count += 1;
                    weighted += 1.0;
                }
                DissonanceSeverity::Medium => {
                    summary.medium_count += 1;
                    weighted += 0.5;
                }
                DissonanceSeverity::Low => summary.low_count += 1,
            }
            match event.kind {
                DissonanceKind::SimultaneousClash => summary.simultaneous_clash_count += 1,
                DissonanceKind::NonChordTone => summary.non_chord_tone_count += 1,
                DissonanceKind::SustainedOverChordChange => {
                    summary.sustained_over_chord_change_count += 1;
                }
                DissonanceKind::NonDiatonicNote => summary.non_diatonic_note_count += 1,
            }
        }

        let beats = (total_ticks / TICKS_PER_BEAT).max(1) as f32;
        summary.density_per_beat = summary.total as f32 / beats;
        summary.weighted_density_per_beat = weighted / beats;

        Self { events, summary }
    }

    /// Human-readable text summary for stderr reports.
    #[must_use]
    pub fn to_text_summary(&self, system_name: &str, num_voices: u8) -> String {
        format!(
            "{system_name} ({num_voices} voices): {} dissonance events \
             (high {}, medium {}, low {}), {:.3} weighted per beat",
            self.summary.total,
            self.summary.high_count,
            self.summary.medium_count,
            self.summary.low_count,
            self.summary.weighted_density_per_beat,
        )
    }
}

fn total_span(notes: &[NoteEvent]) -> Tick {
    notes.iter().map(NoteEvent::end_tick).max().unwrap_or(0)
}

/// Phase 1: beat-by-beat interval clashes between voices.
#[must_use]
pub fn detect_simultaneous_clashes(notes: &[NoteEvent], num_voices: u8) -> Vec<DissonanceEvent> {
    let mut events = Vec::new();
    let span = total_span(notes);

    let mut tick = 0;
    while tick < span {
        // One sounding pitch per voice at this beat.
        let mut sounding: Vec<(u8, u8)> = Vec::with_capacity(usize::from(num_voices));
        for voice in 0..num_voices {
            if let Some(note) =
                notes.iter().find(|n| n.voice == voice && n.sounds_at(tick))
            {
                sounding.push((voice, note.pitch));
            }
        }

        for (idx_a, &(voice_a, pitch_a)) in sounding.iter().enumerate() {
            for &(voice_b, pitch_b) in &sounding[idx_a + 1..] {
                let interval = simple_interval(pitch_a, pitch_b);
                let class = IntervalClass::of(interval);
                let strong = is_strong_beat(tick);
                let severity = match class {
                    IntervalClass::HarshDissonance => {
                        if strong { DissonanceSeverity::High } else { DissonanceSeverity::Medium }
                    }
                    IntervalClass::MildDissonance => {
                        if strong { DissonanceSeverity::Medium } else { DissonanceSeverity::Low }
                    }
                    _ => continue,
                };
                let (bar, beat) = locate(tick);
                events.push(DissonanceEvent {
                    kind: DissonanceKind::SimultaneousClash,
                    severity,
                    tick,
                    bar,
                    beat,
                    pitch: pitch_a,
                    other_pitch: pitch_b,
                    voice_a,
                    voice_b,
                    interval,
                    description: format!(
                        "interval {interval} between voices {voice_a} and {voice_b}"
                    ),
                });
            }
        }
        tick += TICKS_PER_BEAT;
    }
    events
}

/// Phase 2: non-chord tones against the harmonic timeline.
///
/// When a secondary (generation-resolution) timeline is supplied, its
/// chord membership downgrades severity to Low — but only for ticks in
/// the interior of the primary event: on the left edge of a primary
/// event the primary timeline alone decides.
#[must_use]
pub fn detect_non_chord_tones(
    notes: &[NoteEvent],
    timeline: &HarmonicTimeline,
    generation_timeline: Option<&HarmonicTimeline>,
) -> Vec<DissonanceEvent> {
    let mut events = Vec::new();

    for note in notes {
        let event = timeline.get_at(note.start_tick);
        if event.chord.contains_pitch(note.pitch) {
            continue;
        }

        let strong = is_strong_beat(note.start_tick);
        let mut severity =
            if strong { DissonanceSeverity::Medium } else { DissonanceSeverity::Low };

        let on_left_edge = event.tick == note.start_tick;
        if !on_left_edge {
            if let Some(secondary) = generation_timeline {
                if secondary.get_at(note.start_tick).chord.contains_pitch(note.pitch) {
                    severity = DissonanceSeverity::Low;
                }
            }
        }

        let (bar, beat) = locate(note.start_tick);
        events.push(DissonanceEvent {
            kind: DissonanceKind::NonChordTone,
            severity,
            tick: note.start_tick,
            bar,
            beat,
            pitch: note.pitch,
            other_pitch: 0,
            voice_a: note.voice,
            voice_b: 0,
            interval: 0,
            description: format!(
                "pitch {} outside {} chord",
                note.pitch,
                event.chord.degree.label()
            ),
        });
    }
    events
}

/// Phase 3: notes held across a chord change that no longer fit.
#[must_use]
pub fn detect_sustained_over_chord_change(
    notes: &[NoteEvent],
    num_voices: u8,
    timeline: &HarmonicTimeline,
) -> Vec<DissonanceEvent> {
    let mut events = Vec::new();

    for note in notes {
        if note.voice >= num_voices {
            continue;
        }
        for boundary in timeline.events() {
            let change = boundary.tick;
            if change <= note.start_tick || change >= note.end_tick() {
                continue;
            }
            if boundary.chord.contains_pitch(note.pitch) {
                continue;
            }

            let against_bass = simple_interval(note.pitch, boundary.bass_pitch);
            let severity = if IntervalClass::of(against_bass) == IntervalClass::HarshDissonance {
                DissonanceSeverity::High
            } else {
                DissonanceSeverity::Medium
            };
            let (bar, beat) = locate(change);
            events.push(DissonanceEvent {
                kind: DissonanceKind::SustainedOverChordChange,
                severity,
                tick: change,
                bar,
                beat,
                pitch: note.pitch,
                other_pitch: boundary.bass_pitch,
                voice_a: note.voice,
                voice_b: 0,
                interval: against_bass,
                description: format!(
                    "pitch {} sustained into {} chord",
                    note.pitch,
                    boundary.chord.degree.label()
                ),
            });
        }
    }
    events
}

/// Phase 4: pitches outside the diatonic scale. Minor keys accept both
/// harmonic- and natural-minor tones.
#[must_use]
pub fn detect_non_diatonic_notes(notes: &[NoteEvent], key: KeySignature) -> Vec<DissonanceEvent> {
    let mut events = Vec::new();
    for note in notes {
        let diatonic = if key.is_minor {
            is_scale_tone(note.pitch, key, ScaleKind::HarmonicMinor)
                || is_scale_tone(note.pitch, key, ScaleKind::NaturalMinor)
        } else {
            is_scale_tone(note.pitch, key, ScaleKind::Major)
        };
        if diatonic {
            continue;
        }

        let severity = if note.duration < TICKS_PER_BEAT {
            DissonanceSeverity::Low
        } else {
            DissonanceSeverity::Medium
        };
        let (bar, beat) = locate(note.start_tick);
        events.push(DissonanceEvent {
            kind: DissonanceKind::NonDiatonicNote,
            severity,
            tick: note.start_tick,
            bar,
            beat,
            pitch: note.pitch,
            other_pitch: 0,
            voice_a: note.voice,
            voice_b: 0,
            interval: 0,
            description: format!("chromatic pitch {} in {}", note.pitch, key.label()),
        });
    }
    events
}

/// Run all four phases for a multi-voice (organ) texture.
#[must_use]
pub fn analyze_organ_dissonance(
    notes: &[NoteEvent],
    num_voices: u8,
    timeline: &HarmonicTimeline,
    key: KeySignature,
    generation_timeline: Option<&HarmonicTimeline>,
) -> DissonanceResult {
    let mut events = detect_simultaneous_clashes(notes, num_voices);
    events.extend(detect_non_chord_tones(notes, timeline, generation_timeline));
    events.extend(detect_sustained_over_chord_change(notes, num_voices, timeline));
    events.extend(detect_non_diatonic_notes(notes, key));
    events.sort_by_key(|event| event.tick);
    DissonanceResult::summarize(events, total_span(notes))
}

/// Run phases 2 and 4 for a single melodic line.
#[must_use]
pub fn analyze_solo_string_dissonance(
    notes: &[NoteEvent],
    timeline: &HarmonicTimeline,
    key: KeySignature,
) -> DissonanceResult {
    let mut events = detect_non_chord_tones(notes, timeline, None);
    events.extend(detect_non_diatonic_notes(notes, key));
    events.sort_by_key(|event| event.tick);
    DissonanceResult::summarize(events, total_span(notes))
}

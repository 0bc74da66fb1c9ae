//! fugue/bach-fugue/src/subject.rs
//! Subject and voice generation: N-candidate enumeration from motif
//! templates under character and archetype policies, scored and gated.

use bach_harmony::HarmonicTimeline;
use bach_score::{NoteEvent, NoteSource};
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, degree_to_pitch};
use bach_time::{QUARTER_NOTE, SIXTEENTH_NOTE, TICKS_PER_BAR, TICKS_PER_BEAT, Tick,
    quantize_to_sixteenth};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::analyzer::detect_invariant_violations;
use crate::motif::{goal_tone_for, templates_for};
use crate::params::{
    CharacterParams, apply_archetype_constraints, avoid_unison, character_params, clamp_leap,
    quantize_to_strong_beat, snap_to_scale, vary_duration,
};
use crate::policy::{ArchetypePolicy, FugueArchetype, archetype_for_character, archetype_policy};
use crate::scorer::ArchetypeScorer;

/// Expressive character of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectCharacter {
    Severe,
    Playful,
    Noble,
    Restless,
}

/// An immutable fugue subject.
#[derive(Debug, Clone)]
pub struct Subject {
    pub key: KeySignature,
    pub character: SubjectCharacter,
    pub notes: Vec<NoteEvent>,
    pub length_ticks: Tick,
    pub anacrusis_ticks: Tick,
    /// Set when no candidate passed the archetype hard gate.
    pub degraded: bool,
}

impl Subject {
    /// Lowest pitch, or 127 for an empty subject.
    #[must_use]
    pub fn lowest_pitch(&self) -> u8 {
        self.notes.iter().map(|n| n.pitch).min().unwrap_or(127)
    }

    /// Highest pitch, or 0 for an empty subject.
    #[must_use]
    pub fn highest_pitch(&self) -> u8 {
        self.notes.iter().map(|n| n.pitch).max().unwrap_or(0)
    }

    /// Pitch range in semitones.
    #[must_use]
    pub fn range(&self) -> i32 {
        if self.notes.is_empty() {
            return 0;
        }
        i32::from(self.highest_pitch()) - i32::from(self.lowest_pitch())
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// First `max_notes` notes — the head motif.
    #[must_use]
    pub fn kopfmotiv(&self, max_notes: usize) -> &[NoteEvent] {
        &self.notes[..max_notes.min(self.notes.len())]
    }
}

/// Request for one subject.
#[derive(Debug, Clone, Copy)]
pub struct SubjectRequest {
    pub key: KeySignature,
    pub character: SubjectCharacter,
    /// Desired length in bars; clamped into the archetype's window.
    pub bars: u8,
    pub seed: u32,
    /// `None` selects the character's default archetype.
    pub archetype: Option<FugueArchetype>,
}

/// Bar-level targets for secondary-voice generation: the voice should
/// anchor chord tones on bars, rise through the intensification span,
/// descend toward the cadence, and land on the target pitch class.
pub struct VoiceGrid<'a> {
    pub timeline: &'a HarmonicTimeline,
    /// Pitch class the final bar should land on.
    pub cadence_target_class: u8,
    /// Bar span `[from, to)` where ascending motion is preferred.
    pub intensify_bars: (u32, u32),
}

/// Deterministic subject/voice generator.
#[derive(Debug, Default)]
pub struct SubjectGenerator;

/// Base pitch anchor for degree arithmetic (C4 before key offset).
const BASE_NOTE: u8 = 60;
/// Interval jitter probability while walking templates.
const DEGREE_JITTER_PROB: f64 = 0.40;
/// Grid term weight when scoring secondary voices.
const GRID_WEIGHT: f32 = 0.2;

impl SubjectGenerator {
    /// Generate one subject: enumerate candidates, score, gate, select.
    #[must_use]
    pub fn generate(&self, request: &SubjectRequest) -> Subject {
        self.generate_inner(request, None)
    }

    /// Generate a secondary voice against a bar grid.
    #[must_use]
    pub fn generate_voice(&self, request: &SubjectRequest, grid: &VoiceGrid<'_>) -> Subject {
        self.generate_inner(request, Some(grid))
    }

    fn generate_inner(&self, request: &SubjectRequest, grid: Option<&VoiceGrid<'_>>) -> Subject {
        let archetype =
            request.archetype.unwrap_or_else(|| archetype_for_character(request.character));
        let policy = archetype_policy(archetype);
        let bars = request.bars.clamp(policy.min_subject_bars, policy.max_subject_bars);
        let scorer = ArchetypeScorer;

        let mut best_passing: Option<(f32, Subject)> = None;
        let mut best_raw: Option<(f32, Subject)> = None;

        for candidate_idx in 0..policy.path_candidates {
            let sub_seed =
                u64::from(request.seed) ^ (u64::from(candidate_idx) + 1).wrapping_mul(0x9E37_79B9);
            let mut rng = ChaCha8Rng::seed_from_u64(sub_seed);

            let notes = generate_notes(request.character, request.key, bars, policy, &mut rng);
            let notes = post_process(notes, request.character, request.key, &mut rng);

            let mut subject = Subject {
                key: request.key,
                character: request.character,
                notes,
                length_ticks: Tick::from(bars) * TICKS_PER_BAR,
                anacrusis_ticks: 0,
                degraded: false,
            };
            apply_anacrusis(&mut subject, policy, request.seed);

            let mut composite = scorer.evaluate(&subject, policy).composite();
            // Unrecovered soft-invariant violations cost score, not
            // candidacy.
            composite -= detect_invariant_violations(&subject.notes).len() as f32 * 0.05;
            if let Some(grid) = grid {
                composite =
                    composite * (1.0 - GRID_WEIGHT) + grid_alignment(&subject, grid) * GRID_WEIGHT;
            }

            if best_raw.as_ref().is_none_or(|(score, _)| composite > *score) {
                best_raw = Some((composite, subject.clone()));
            }
            if scorer.check_hard_gate(&subject, policy)
                && best_passing.as_ref().is_none_or(|(score, _)| composite > *score)
            {
                best_passing = Some((composite, subject));
            }
        }

        if let Some((_, subject)) = best_passing {
            subject
        } else {
            let (_, mut subject) = best_raw.unwrap_or_else(|| {
                (0.0, Subject {
                    key: request.key,
                    character: request.character,
                    notes: Vec::new(),
                    length_ticks: Tick::from(bars) * TICKS_PER_BAR,
                    anacrusis_ticks: 0,
                    degraded: true,
                })
            });
            subject.degraded = true;
            subject
        }
    }
}

/// Walk the motif templates toward and away from the goal tone.
fn generate_notes(
    character: SubjectCharacter,
    key: KeySignature,
    bars: u8,
    policy: &ArchetypePolicy,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(key);
    let mut params = character_params(character);
    apply_archetype_constraints(&mut params, policy);

    let total: Tick = Tick::from(bars) * TICKS_PER_BAR;

    // Goal tone: character base with small jitter, clamped to the policy
    // windows, quantized to a strong beat.
    let goal = goal_tone_for(character);
    let position = (goal.position_ratio + jitter(rng, 0.05))
        .clamp(policy.min_climax_position, policy.max_climax_position);
    let pitch_ratio = (goal.pitch_ratio + jitter(rng, 0.05))
        .clamp(policy.min_climax_pitch, policy.max_climax_pitch);
    let climax_tick =
        quantize_to_strong_beat((position * total as f32) as Tick, character, total);

    let template_idx = rng.r#gen::<u32>() % 4;
    let (motif_a, motif_b) = templates_for(character, template_idx);

    let start_degree: i32 = if rng.gen_bool(0.6) { 0 } else { 4 };
    let start_pitch = i32::from(degree_to_pitch(start_degree, BASE_NOTE, key, scale));
    let tonic_base = i32::from(degree_to_pitch(0, BASE_NOTE, key, scale));

    let pitch_floor = start_pitch.min(tonic_base).max(36) as u8;
    let pitch_ceil = (i32::from(pitch_floor) + params.max_range).min(96) as u8;

    let climax_pitch = (i32::from(pitch_floor)
        + ((f32::from(pitch_ceil) - f32::from(pitch_floor)) * pitch_ratio) as i32)
        .clamp(i32::from(pitch_floor), i32::from(pitch_ceil));

    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut tick: Tick = 0;
    let mut current_degree = start_degree;
    let mut current_pitch = start_pitch;
    let mut large_leaps = 0u32;

    let place = |notes: &mut Vec<NoteEvent>, tick: Tick, duration: Tick, pitch: i32| {
        notes.push(NoteEvent::new(tick, duration, pitch.clamp(0, 127) as u8, 80, 0)
            .with_source(NoteSource::FugueSubject));
    };

    // Phase 1: motif A toward the climax.
    for (idx, &offset) in motif_a.degree_offsets.iter().enumerate() {
        if tick >= climax_tick {
            break;
        }
        let target_degree = start_degree + offset;
        let target_pitch = i32::from(degree_to_pitch(target_degree, BASE_NOTE, key, scale));

        let progress =
            if climax_tick > 0 { tick as f32 / climax_tick as f32 } else { 0.0 };
        let interp = start_pitch + ((climax_pitch - start_pitch) as f32 * progress) as i32;

        // Bend the template toward the interpolated path.
        let degree_shift =
            if target_pitch < interp { (interp - target_pitch + 1) / 2 } else { 0 };
        let mut adjusted = target_degree + degree_shift;
        if rng.gen_bool(DEGREE_JITTER_PROB) {
            adjusted += if rng.gen_bool(0.5) { 1 } else { -1 };
        }

        let raw = i32::from(degree_to_pitch(adjusted, BASE_NOTE, key, scale));
        let mut pitch = snap_to_scale(raw, key, scale, pitch_floor, pitch_ceil);
        pitch = clamp_leap(pitch, current_pitch, character, key, scale, pitch_floor,
            pitch_ceil, rng, &mut large_leaps);
        pitch = avoid_unison(pitch, current_pitch, key, scale, pitch_floor, pitch_ceil);

        let mut duration = vary_duration(motif_a.durations[idx], rng);
        if tick + duration > climax_tick {
            duration = climax_tick - tick;
            if duration < SIXTEENTH_NOTE {
                break;
            }
        }

        place(&mut notes, tick, duration, pitch);
        tick += duration;
        current_degree = adjusted;
        current_pitch = pitch;
    }

    // Climax note.
    if tick < total {
        let duration = QUARTER_NOTE.min(total - tick);
        let pitch = snap_to_scale(climax_pitch, key, scale, pitch_floor, pitch_ceil);
        place(&mut notes, tick, duration, pitch);
        tick += duration;
        current_degree = start_degree + ((pitch_ratio * params.max_range as f32) / 2.0) as i32;
        current_pitch = pitch;
    }

    // Phase 2: motif B away from the climax toward the tonic.
    let tonic_pitch =
        snap_to_scale(tonic_base, key, scale, pitch_floor, pitch_ceil);
    for (idx, &offset) in motif_b.degree_offsets.iter().enumerate() {
        if tick >= total {
            break;
        }
        let remaining_ratio = if total > climax_tick {
            (tick.saturating_sub(climax_tick)) as f32 / (total - climax_tick) as f32
        } else {
            1.0
        };
        let interp =
            climax_pitch + ((tonic_pitch - climax_pitch) as f32 * remaining_ratio) as i32;

        let target_degree = current_degree + offset;
        let target_pitch = i32::from(degree_to_pitch(target_degree, BASE_NOTE, key, scale));
        let degree_shift = if target_pitch > interp + 2 {
            -1
        } else if target_pitch < interp - 2 {
            1
        } else {
            0
        };
        let mut adjusted = target_degree + degree_shift;
        if rng.gen_bool(DEGREE_JITTER_PROB) {
            adjusted += if rng.gen_bool(0.5) { 1 } else { -1 };
        }

        let raw = i32::from(degree_to_pitch(adjusted, BASE_NOTE, key, scale));
        let mut pitch = snap_to_scale(raw, key, scale, pitch_floor, pitch_ceil);
        pitch = clamp_leap(pitch, current_pitch, character, key, scale, pitch_floor,
            pitch_ceil, rng, &mut large_leaps);
        pitch = avoid_unison(pitch, current_pitch, key, scale, pitch_floor, pitch_ceil);

        let mut duration = vary_duration(motif_b.durations[idx], rng);
        if tick + duration > total {
            duration = total - tick;
            if duration < SIXTEENTH_NOTE {
                break;
            }
        }

        place(&mut notes, tick, duration, pitch);
        tick += duration;
        current_degree = adjusted;
        current_pitch = pitch;
    }

    // Fill any remaining span by reusing motif A's rhythm, stepping toward
    // the tonic.
    let mut rhythm_idx = 0usize;
    while tick < total {
        let mut duration = motif_a.durations[rhythm_idx % motif_a.durations.len()];
        if tick + duration > total {
            duration = total - tick;
            if duration < SIXTEENTH_NOTE {
                break;
            }
        }

        if current_pitch > tonic_pitch + 2 {
            current_degree -= 1;
        } else if current_pitch < tonic_pitch - 2 {
            current_degree += 1;
        }
        let raw = i32::from(degree_to_pitch(current_degree, BASE_NOTE, key, scale));
        let pitch = snap_to_scale(raw, key, scale, pitch_floor, pitch_ceil);
        current_pitch = pitch;

        place(&mut notes, tick, duration, pitch);
        tick += duration;
        rhythm_idx += 1;
    }

    // Ending: dominant per the archetype's preference, tonic otherwise.
    if let Some(last) = notes.last_mut() {
        let pitch = if rng.gen_bool(f64::from(policy.dominant_ending_prob)) {
            snap_to_scale(
                i32::from(degree_to_pitch(4, BASE_NOTE, key, scale)),
                key,
                scale,
                pitch_floor,
                pitch_ceil,
            )
        } else {
            tonic_pitch
        };
        last.pitch = pitch.clamp(0, 127) as u8;
    }

    notes
}

/// Grid quantization, overlap repair, and a final leap-limit pass.
fn post_process(
    mut notes: Vec<NoteEvent>,
    character: SubjectCharacter,
    key: KeySignature,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(key);
    let params: CharacterParams = character_params(character);

    // Quantize every onset to the sixteenth grid.
    for note in &mut notes {
        note.start_tick = quantize_to_sixteenth(note.start_tick);
    }

    // Resolve quantization overlaps by shortening predecessors.
    let mut repaired: Vec<NoteEvent> = Vec::with_capacity(notes.len());
    for note in notes {
        if let Some(prev) = repaired.last_mut() {
            if prev.end_tick() > note.start_tick {
                if note.start_tick >= prev.start_tick + SIXTEENTH_NOTE {
                    prev.duration = note.start_tick - prev.start_tick;
                } else {
                    continue; // fully swallowed by the predecessor
                }
            }
        }
        if note.duration >= SIXTEENTH_NOTE {
            repaired.push(note);
        }
    }

    // One more leap-limit pass after all the editing.
    let mut large_leaps = 0u32;
    for idx in 1..repaired.len() {
        let prev = i32::from(repaired[idx - 1].pitch);
        let current = i32::from(repaired[idx].pitch);
        if (current - prev).abs() > params.max_leap {
            let fixed =
                clamp_leap(current, prev, character, key, scale, 36, 96, rng, &mut large_leaps);
            repaired[idx].pitch = fixed.clamp(0, 127) as u8;
        }
    }

    repaired
}

/// Split the first note into an anacrusis fragment plus remainder, with a
/// character probability clamped into the policy window.
fn apply_anacrusis(subject: &mut Subject, policy: &ArchetypePolicy, seed: u32) {
    // "Auft" tag keeps the anacrusis decision independent of note choices.
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed ^ 0x4175_6674));
    let probability = f64::from(
        character_params(subject.character)
            .anacrusis_prob
            .clamp(policy.min_anacrusis_prob, policy.max_anacrusis_prob),
    );
    if !rng.gen_bool(probability) {
        return;
    }

    let anacrusis: Tick = match subject.character {
        SubjectCharacter::Playful | SubjectCharacter::Restless => {
            if rng.gen_bool(0.5) { TICKS_PER_BEAT } else { TICKS_PER_BEAT * 2 }
        }
        _ => TICKS_PER_BEAT,
    };

    let Some(first) = subject.notes.first().copied() else { return };
    if first.duration > anacrusis {
        // Split in place: the fragment keeps the head's span, the
        // remainder lands where bar 1 begins. Entry offsets downstream
        // account for the extra length.
        let mut fragment = first;
        fragment.duration = anacrusis;
        subject.notes[0].start_tick = first.start_tick + anacrusis;
        subject.notes[0].duration = first.duration - anacrusis;
        subject.notes.insert(0, fragment);
        subject.anacrusis_ticks = anacrusis;
        subject.length_ticks += anacrusis;
    }
}

/// How well a voice candidate fits its bar grid.
fn grid_alignment(subject: &Subject, grid: &VoiceGrid<'_>) -> f32 {
    if subject.notes.is_empty() {
        return 0.0;
    }

    let mut score = 0.0f32;
    let mut checks = 0.0f32;
    let bars = subject.length_ticks / TICKS_PER_BAR;

    // Chord tones on bar starts.
    for bar in 0..bars {
        let bar_tick = bar * TICKS_PER_BAR;
        let Some(note) = subject.notes.iter().find(|n| n.sounds_at(bar_tick)) else {
            continue;
        };
        checks += 1.0;
        if grid.timeline.get_at(bar_tick).chord.contains_pitch(note.pitch) {
            score += 1.0;
        }
    }

    // Ascending motion through the intensification span.
    let (from, to) = grid.intensify_bars;
    if to > from {
        let span_start = Tick::from(from) * TICKS_PER_BAR;
        let span_end = Tick::from(to) * TICKS_PER_BAR;
        let in_span: Vec<&NoteEvent> = subject
            .notes
            .iter()
            .filter(|n| n.start_tick >= span_start && n.start_tick < span_end)
            .collect();
        if in_span.len() >= 2 {
            checks += 1.0;
            if in_span.last().map(|n| n.pitch) >= in_span.first().map(|n| n.pitch) {
                score += 1.0;
            }
        }
    }

    // Descent into the final bar and cadence target pitch class.
    if let (Some(first), Some(last)) = (subject.notes.first(), subject.notes.last()) {
        checks += 1.0;
        if last.pitch <= first.pitch {
            score += 1.0;
        }
        checks += 1.0;
        if last.pitch % 12 == grid.cadence_target_class {
            score += 1.0;
        }
    }

    if checks > 0.0 { score / checks } else { 0.0 }
}

fn jitter(rng: &mut ChaCha8Rng, amount: f32) -> f32 {
    (rng.r#gen::<f32>() * 2.0 - 1.0) * amount
}

//! fugue/bach-fugue/src/analyzer.rs
//! Obligation extraction: detectors, density metrics, lateral dynamics,
//! and the stretto feasibility matrix.

use bach_score::NoteEvent;
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, pitch_to_scale_degree};
use bach_time::{TICKS_PER_BEAT, Tick, is_strong_beat};

use crate::obligation::{
    AccentContour, HarmonicImpulse, ObligationKind, ObligationNode, ObligationStrength,
    RegisterArc, StrettoEntry, SubjectProfile,
};

/// P4 or larger triggers a LeapResolve.
const LEAP_THRESHOLD_SEMITONES: i32 = 5;
/// Two beats to resolve a leap, a leading tone, or a seventh.
const RESOLVE_WINDOW: Tick = TICKS_PER_BEAT * 2;
/// Cadence stability is judged over the final bar.
const CADENCE_STABLE_WINDOW: Tick = TICKS_PER_BEAT * 4;
/// Final notes inspected for a stepwise cadential approach.
const CADENCE_APPROACH_NOTES: usize = 4;
/// Harmonic impulse analysis window.
const HARMONIC_WINDOW: Tick = TICKS_PER_BEAT * 2;
/// Degree 4 (0-based 3) acts as the 7th of V.
const SUBDOMINANT_DEGREE: u8 = 3;
/// Density and stretto sampling resolution (sixteenth note).
const SAMPLE_STEP: Tick = TICKS_PER_BEAT / 4;
/// Stretto voice-count range.
const MIN_STRETTO_VOICES: u8 = 2;
const MAX_STRETTO_VOICES: u8 = 5;
/// Stretto offset step (half beat).
const OFFSET_STEP: Tick = TICKS_PER_BEAT / 2;

/// Scale function of a pitch within the key: degree plus chromatic flag.
///
/// Minor keys try harmonic minor first and fall back to natural minor for
/// tones the raised seventh excludes.
fn identify_scale_function(pitch: u8, key: KeySignature) -> (u8, bool) {
    let scale = ScaleKind::for_key(key);
    let (degree, on_scale) = pitch_to_scale_degree(pitch, key, scale);
    if on_scale {
        return (degree, false);
    }
    if key.is_minor {
        let (degree, on_scale) = pitch_to_scale_degree(pitch, key, ScaleKind::NaturalMinor);
        if on_scale {
            return (degree, false);
        }
    }
    (degree, true)
}

fn is_leading_tone(pitch: u8, key: KeySignature) -> bool {
    pitch % 12 == key.leading_tone_class().index()
}

fn is_chord_seventh(pitch: u8, key: KeySignature) -> bool {
    let (degree, chromatic) = identify_scale_function(pitch, key);
    !chromatic && degree == SUBDOMINANT_DEGREE
}

/// Extract the complete constraint profile of a subject.
#[must_use]
pub fn analyze_obligations(notes: &[NoteEvent], key: KeySignature) -> SubjectProfile {
    let mut profile = SubjectProfile::default();
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return profile;
    };

    let mut next_id = 0u16;

    // Leading tones: resolve up a semitone within two beats.
    for note in notes {
        if is_leading_tone(note.pitch, key) {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::LeadingTone,
                note.start_tick,
                note.end_tick(),
                note.end_tick() + RESOLVE_WINDOW,
            );
            node.direction = 1;
            node.required_interval_semitones = 1;
            node.strength = ObligationStrength::Structural;
            profile.obligations.push(node);
            next_id += 1;
        }
    }

    // Sevenths: degree 4 resolves down by step.
    for note in notes {
        if is_chord_seventh(note.pitch, key) {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::Seventh,
                note.start_tick,
                note.end_tick(),
                note.end_tick() + RESOLVE_WINDOW,
            );
            node.direction = -1;
            node.required_interval_semitones = -1;
            node.strength = ObligationStrength::Soft;
            profile.obligations.push(node);
            next_id += 1;
        }
    }

    // Leaps: contrary stepwise motion within two beats.
    for pair in notes.windows(2) {
        let interval = i32::from(pair[1].pitch) - i32::from(pair[0].pitch);
        if interval.abs() >= LEAP_THRESHOLD_SEMITONES {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::LeapResolve,
                pair[1].start_tick,
                pair[1].start_tick,
                pair[1].start_tick + RESOLVE_WINDOW,
            );
            node.direction = if interval > 0 { -1 } else { 1 };
            node.strength = ObligationStrength::Soft;
            profile.obligations.push(node);
            next_id += 1;
        }
    }

    // Strong-beat gates: instantaneous chord-tone demands.
    for note in notes {
        if is_strong_beat(note.start_tick) {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::StrongBeatHarm,
                note.start_tick,
                note.start_tick,
                note.start_tick,
            );
            node.require_strong_beat = true;
            node.strength = ObligationStrength::Structural;
            profile.obligations.push(node);
            next_id += 1;
        }
    }

    // Cadence stability: subject must reach a stable degree in its final bar.
    let subject_start = first.start_tick;
    let subject_end = last.end_tick();
    if notes.len() >= 2 {
        let (degree, chromatic) = identify_scale_function(last.pitch, key);
        let ends_stable = !chromatic && (degree == 0 || degree == 4);
        if !ends_stable {
            let cadence_start = subject_end.saturating_sub(CADENCE_STABLE_WINDOW);
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::CadenceStable,
                last.start_tick,
                cadence_start,
                subject_end,
            );
            node.strength = ObligationStrength::Soft;
            profile.obligations.push(node);
            next_id += 1;
        }
    }

    // Cadence approach over the final notes. Soft when a stepwise approach
    // already exists, Structural to force one otherwise; callers upgrade to
    // Structural at section boundaries.
    if notes.len() >= 3 {
        let approach_start = notes.len().saturating_sub(CADENCE_APPROACH_NOTES);
        let has_step = notes[approach_start..]
            .windows(2)
            .any(|pair| pair[1].pitch.abs_diff(pair[0].pitch) <= 2);
        let mut node = ObligationNode::new(
            next_id,
            ObligationKind::CadenceApproach,
            notes[approach_start].start_tick,
            notes[approach_start].start_tick,
            subject_end,
        );
        node.strength =
            if has_step { ObligationStrength::Soft } else { ObligationStrength::Structural };
        profile.obligations.push(node);
    }

    // Density metrics at sixteenth resolution.
    let density = compute_density(&profile.obligations, subject_start, subject_end);
    profile.peak_density = density.0;
    profile.avg_density = density.1;
    profile.synchronous_pressure = density.2;

    // Lateral dynamics.
    profile.harmonic_impulses = extract_harmonic_impulses(notes, key);
    profile.register_arc = extract_register_arc(notes);
    profile.accent_contour = extract_accent_contour(notes);

    // Imitation characteristics.
    let (first_degree, first_chromatic) = identify_scale_function(first.pitch, key);
    profile.tonal_answer_feasible = !first_chromatic && (first_degree == 0 || first_degree == 4);

    let lowest = notes.iter().map(|n| n.pitch).min().unwrap_or(0);
    let highest = notes.iter().map(|n| n.pitch).max().unwrap_or(0);
    profile.invertible_octave = highest - lowest <= 12;

    let cadence_count = profile
        .obligations
        .iter()
        .filter(|ob| {
            matches!(ob.kind, ObligationKind::CadenceStable | ObligationKind::CadenceApproach)
        })
        .count();
    profile.cadence_gravity =
        cadence_count as f32 / (profile.obligations.len().max(1)) as f32;

    // Stretto feasibility matrix.
    let subject_length = subject_end - subject_start;
    profile.stretto_matrix = compute_stretto_matrix(&profile.obligations, notes, subject_length);

    profile
}

/// Soft voice-leading invariant violations, as recovery obligations.
///
/// A violated invariant (pitch hammered three times in a row, a leap past
/// the octave) demands recovery within two beats; expiry without recovery
/// costs candidate score, it never hard-fails.
#[must_use]
pub fn detect_invariant_violations(notes: &[NoteEvent]) -> Vec<ObligationNode> {
    let mut nodes = Vec::new();
    let mut next_id = 0u16;

    // Repetition: three consecutive equal pitches.
    for window in notes.windows(3) {
        if window[0].pitch == window[1].pitch && window[1].pitch == window[2].pitch {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::InvariantRecovery,
                window[2].start_tick,
                window[2].start_tick,
                window[2].start_tick + RESOLVE_WINDOW,
            );
            node.strength = ObligationStrength::Soft;
            nodes.push(node);
            next_id += 1;
        }
    }

    // Spacing: a melodic leap past the octave.
    for pair in notes.windows(2) {
        if i32::from(pair[1].pitch) - i32::from(pair[0].pitch) > 12
            || i32::from(pair[0].pitch) - i32::from(pair[1].pitch) > 12
        {
            let mut node = ObligationNode::new(
                next_id,
                ObligationKind::InvariantRecovery,
                pair[1].start_tick,
                pair[1].start_tick,
                pair[1].start_tick + RESOLVE_WINDOW,
            );
            node.direction = if pair[1].pitch > pair[0].pitch { -1 } else { 1 };
            node.strength = ObligationStrength::Soft;
            nodes.push(node);
            next_id += 1;
        }
    }

    nodes
}

fn compute_density(
    obligations: &[ObligationNode],
    start: Tick,
    end: Tick,
) -> (f32, f32, f32) {
    if obligations.is_empty() || end <= start {
        return (0.0, 0.0, 0.0);
    }

    let mut peak = 0.0f32;
    let mut weighted_sum = 0.0f32;
    let mut samples = 0u32;
    let mut ticks_with_debt = 0u32;
    let mut ticks_with_debt_and_gate = 0u32;

    let mut tick = start;
    while tick < end {
        let mut debt = 0u32;
        let mut has_gate = false;
        for ob in obligations {
            if !ob.is_active_at(tick) {
                continue;
            }
            if ob.is_debt() {
                debt += 1;
            } else if ob.kind == ObligationKind::StrongBeatHarm {
                has_gate = true;
            }
        }
        peak = peak.max(debt as f32);
        weighted_sum += debt as f32;
        samples += 1;
        if debt > 0 {
            ticks_with_debt += 1;
            if has_gate {
                ticks_with_debt_and_gate += 1;
            }
        }
        tick += SAMPLE_STEP;
    }

    let avg = if samples > 0 { weighted_sum / samples as f32 } else { 0.0 };
    let pressure = if ticks_with_debt > 0 {
        ticks_with_debt_and_gate as f32 / ticks_with_debt as f32
    } else {
        0.0
    };
    (peak, avg, pressure)
}

/// Implied triad estimate for a pitch-class set: every diatonic triad is
/// scored (root weight 3, third and fifth weight 2) against the histogram.
fn estimate_implied_degree(pitches: &[u8], key: KeySignature) -> (u8, f32) {
    if pitches.is_empty() {
        return (1, 0.0);
    }
    let tonic = key.tonic.index();
    let mut counts = [0u32; 12];
    for &pitch in pitches {
        counts[usize::from((12 + pitch % 12 - tonic) % 12)] += 1;
    }

    let intervals: [usize; 7] =
        if key.is_minor { [0, 2, 3, 5, 7, 8, 10] } else { [0, 2, 4, 5, 7, 9, 11] };

    let mut best_degree = 0usize;
    let mut best_score = 0u32;
    for degree in 0..7 {
        let root = intervals[degree] % 12;
        let third = intervals[(degree + 2) % 7] % 12;
        let fifth = intervals[(degree + 4) % 7] % 12;
        let score = counts[root] * 3 + counts[third] * 2 + counts[fifth] * 2;
        if score > best_score {
            best_score = score;
            best_degree = degree;
        }
    }

    let strength = (best_score as f32 / (pitches.len() as f32 * 3.0)).min(1.0);
    (best_degree as u8 + 1, strength)
}

/// Fixed per-degree tension table (1-based degrees).
fn degree_tension(degree: u8, is_minor: bool) -> f32 {
    const MAJOR: [f32; 7] = [0.0, 0.3, 0.2, 0.3, 0.6, 0.0, 0.9];
    const MINOR: [f32; 7] = [0.0, 0.3, 0.2, 0.3, 0.6, 0.1, 0.9];
    if !(1..=7).contains(&degree) {
        return 0.5;
    }
    let table = if is_minor { MINOR } else { MAJOR };
    table[usize::from(degree - 1)]
}

/// V/vii pull dominant-ward, ii/IV subdominant-ward.
fn directional_tendency(degree: u8) -> i8 {
    match degree {
        5 | 7 => 1,
        2 | 4 => -1,
        _ => 0,
    }
}

fn extract_harmonic_impulses(notes: &[NoteEvent], key: KeySignature) -> Vec<HarmonicImpulse> {
    let mut impulses = Vec::new();
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return impulses;
    };
    let start = first.start_tick;
    let end = last.end_tick();

    let mut window_start = start;
    while window_start < end {
        let window_end = window_start + HARMONIC_WINDOW;
        let pitches: Vec<u8> = notes
            .iter()
            .filter(|n| n.start_tick < window_end && n.end_tick() > window_start)
            .map(|n| n.pitch)
            .collect();

        if !pitches.is_empty() {
            let (degree, strength) = estimate_implied_degree(&pitches, key);
            if strength >= 0.1 {
                impulses.push(HarmonicImpulse {
                    tick: window_start,
                    implied_degree: degree,
                    strength,
                    directional_tendency: directional_tendency(degree),
                    tension: degree_tension(degree, key.is_minor),
                });
            }
        }
        window_start += HARMONIC_WINDOW;
    }
    impulses
}

fn extract_register_arc(notes: &[NoteEvent]) -> RegisterArc {
    let mut arc = RegisterArc::default();
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return arc;
    };
    arc.opening_pitch = first.pitch;
    arc.closing_pitch = last.pitch;

    let mut peak = 0u8;
    let mut peak_tick = first.start_tick;
    for note in notes {
        if note.pitch > peak {
            peak = note.pitch;
            peak_tick = note.start_tick;
        }
    }
    arc.peak_pitch = peak;

    let total = last.end_tick() - first.start_tick;
    if total > 0 {
        arc.peak_position = (peak_tick - first.start_tick) as f32 / total as f32;
    }

    let diff = i32::from(arc.closing_pitch) - i32::from(arc.opening_pitch);
    arc.overall_direction = if diff > 2 {
        1
    } else if diff < -2 {
        -1
    } else {
        0
    };
    arc
}

fn extract_accent_contour(notes: &[NoteEvent]) -> AccentContour {
    let mut contour = AccentContour::default();
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return contour;
    };
    let start = first.start_tick;
    let total = last.end_tick() - start;
    if total == 0 {
        return contour;
    }

    let third = total / 3;
    let mut front = 0.0f32;
    let mut mid = 0.0f32;
    let mut tail = 0.0f32;
    let mut syncopations = 0u32;

    for note in notes {
        let rel = note.start_tick - start;
        let on_strong = is_strong_beat(note.start_tick);
        let mut weight = note.duration as f32 / TICKS_PER_BEAT as f32;
        if on_strong {
            weight *= 1.5;
        }

        // Syncopation: long note starting off the beat.
        if !on_strong && note.start_tick % TICKS_PER_BEAT != 0 && note.duration >= TICKS_PER_BEAT
        {
            syncopations += 1;
        }

        if rel < third {
            front += weight;
        } else if rel < third * 2 {
            mid += weight;
        } else {
            tail += weight;
        }
    }

    let total_accent = front + mid + tail;
    if total_accent > 0.0 {
        contour.front_weight = front / total_accent;
        contour.mid_weight = mid / total_accent;
        contour.tail_weight = tail / total_accent;
    }
    contour.syncopation_ratio = syncopations as f32 / notes.len() as f32;
    contour
}

// ---------------------------------------------------------------------------
// Stretto feasibility
// ---------------------------------------------------------------------------

fn compute_stretto_matrix(
    obligations: &[ObligationNode],
    notes: &[NoteEvent],
    subject_length: Tick,
) -> Vec<StrettoEntry> {
    let mut matrix = Vec::new();
    if notes.is_empty() || subject_length <= TICKS_PER_BEAT {
        return matrix;
    }

    let base = notes[0].start_tick;
    let onsets: Vec<Tick> = notes.iter().map(|n| n.start_tick - base).collect();
    let arc = extract_register_arc(notes);
    let contour = extract_accent_contour(notes);

    let mut offset = TICKS_PER_BEAT;
    while offset < subject_length {
        for num_voices in MIN_STRETTO_VOICES..=MAX_STRETTO_VOICES {
            matrix.push(StrettoEntry {
                offset_ticks: offset,
                num_voices,
                peak_obligation: peak_obligation(obligations, offset, num_voices, subject_length),
                vertical_clash: vertical_clash(&onsets, offset, num_voices, subject_length),
                rhythmic_interference: rhythmic_interference(
                    notes,
                    offset,
                    num_voices,
                    subject_length,
                ),
                register_overlap: register_overlap(&arc, offset, num_voices, subject_length),
                perceptual_overlap: perceptual_overlap(
                    &contour,
                    offset,
                    subject_length,
                    num_voices,
                ),
                cadence_conflict: cadence_conflict(
                    obligations,
                    offset,
                    num_voices,
                    subject_length,
                ),
            });
        }
        offset += OFFSET_STEP;
    }
    matrix
}

/// Excess obligation pressure beyond the single-voice baseline when
/// `num_voices` shifted copies of the debt set are overlaid.
fn peak_obligation(
    obligations: &[ObligationNode],
    offset: Tick,
    num_voices: u8,
    subject_length: Tick,
) -> f32 {
    if obligations.is_empty() {
        return 0.0;
    }

    let mut single_peak = 0.0f32;
    let mut sample = 0;
    while sample < subject_length {
        let debt = obligations
            .iter()
            .filter(|ob| ob.is_debt() && sample >= ob.start_tick && sample <= ob.deadline)
            .count();
        single_peak = single_peak.max(debt as f32);
        sample += SAMPLE_STEP;
    }

    let total_span = subject_length + offset * Tick::from(num_voices - 1);
    let mut peak_excess = 0.0f32;

    let mut sample = 0;
    while sample < total_span {
        let mut total_debt = 0u32;
        let mut active_voices = 0u32;

        for voice in 0..num_voices {
            let shift = offset * Tick::from(voice);
            if sample < shift || sample >= shift + subject_length {
                continue;
            }
            active_voices += 1;
            for ob in obligations {
                if !ob.is_debt() {
                    continue;
                }
                if sample >= ob.start_tick + shift && sample <= ob.deadline + shift {
                    total_debt += 1;
                }
            }
        }

        if active_voices > 1 {
            let excess = total_debt as f32 - single_peak * active_voices as f32;
            peak_excess = peak_excess.max(excess.max(0.0));
        }
        sample += SAMPLE_STEP;
    }
    peak_excess
}

/// Strong-beat onset collisions as a parallel-perfect risk proxy.
fn vertical_clash(onsets: &[Tick], offset: Tick, num_voices: u8, subject_length: Tick) -> f32 {
    if onsets.is_empty() || num_voices < 2 {
        return 0.0;
    }

    let total_span = subject_length + offset * Tick::from(num_voices - 1);
    let mut collisions = 0u32;
    let mut strong_beats = 0u32;

    let mut tick = 0;
    while tick < total_span {
        if is_strong_beat(tick) {
            strong_beats += 1;
            let mut voices_with_onset = 0u32;
            for voice in 0..num_voices {
                let shift = offset * Tick::from(voice);
                let hit = onsets.iter().any(|&onset| {
                    let shifted = onset + shift;
                    shifted >= tick && shifted < tick + SAMPLE_STEP
                });
                if hit {
                    voices_with_onset += 1;
                }
            }
            if voices_with_onset >= 2 {
                collisions += 1;
            }
        }
        tick += TICKS_PER_BEAT;
    }

    if strong_beats == 0 { 0.0 } else { collisions as f32 / strong_beats as f32 }
}

/// Fraction of samples where two or more voices carry an accent.
fn rhythmic_interference(
    notes: &[NoteEvent],
    offset: Tick,
    num_voices: u8,
    subject_length: Tick,
) -> f32 {
    if notes.is_empty() || num_voices < 2 {
        return 0.0;
    }

    let base = notes[0].start_tick;
    let total_span = subject_length + offset * Tick::from(num_voices - 1);
    let mut collisions = 0u32;
    let mut samples = 0u32;

    let mut sample = 0;
    while sample < total_span {
        samples += 1;
        let mut accent_voices = 0u32;

        for voice in 0..num_voices {
            let shift = offset * Tick::from(voice);
            if sample < shift || sample >= shift + subject_length {
                continue;
            }
            for note in notes {
                let onset = note.start_tick - base + shift;
                let is_onset = sample >= onset && sample < onset + SAMPLE_STEP;
                if is_onset && (is_strong_beat(onset) || note.duration >= TICKS_PER_BEAT) {
                    accent_voices += 1;
                    break;
                }
            }
        }

        if accent_voices >= 2 {
            collisions += 1;
        }
        sample += SAMPLE_STEP;
    }

    if samples == 0 { 0.0 } else { collisions as f32 / samples as f32 }
}

/// Temporal overlap scaled by range narrowness and voice count.
fn register_overlap(arc: &RegisterArc, offset: Tick, num_voices: u8, subject_length: Tick) -> f32 {
    if num_voices < 2 || subject_length == 0 {
        return 0.0;
    }

    let range = i32::from(arc.peak_pitch) - i32::from(arc.opening_pitch.min(arc.closing_pitch));
    let range = range.max(1);

    let temporal_overlap = subject_length.saturating_sub(offset);
    let temporal_ratio = temporal_overlap as f32 / subject_length as f32;
    let range_factor = (12.0 / range as f32).min(1.0);
    let voice_factor = f32::from(num_voices - 1) / f32::from(MAX_STRETTO_VOICES - 1);

    (temporal_ratio * range_factor * (0.5 + 0.5 * voice_factor)).min(1.0)
}

/// Accent-peak coincidence when the shifted subjects are overlaid.
fn perceptual_overlap(
    contour: &AccentContour,
    offset: Tick,
    subject_length: Tick,
    num_voices: u8,
) -> f32 {
    if num_voices < 2 || subject_length == 0 {
        return 0.0;
    }

    let peak_weight = contour.front_weight.max(contour.mid_weight).max(contour.tail_weight);
    if peak_weight < 0.01 {
        return 0.0;
    }

    let third = subject_length / 3;
    let peak_center = if contour.front_weight >= contour.mid_weight
        && contour.front_weight >= contour.tail_weight
    {
        third / 2
    } else if contour.mid_weight >= contour.tail_weight {
        third + third / 2
    } else {
        third * 2 + third / 2
    };

    let mut collision = 0.0f32;
    let mut pairs = 0u32;

    for voice_a in 0..num_voices {
        for voice_b in voice_a + 1..num_voices {
            pairs += 1;
            let shift = offset * Tick::from(voice_b - voice_a);
            let peak_b = peak_center + shift;
            let a_start = offset * Tick::from(voice_a);
            let a_end = a_start + subject_length;

            if peak_b >= a_start && peak_b < a_end {
                let rel = peak_b - a_start;
                let coinciding = if rel < third {
                    contour.front_weight
                } else if rel < third * 2 {
                    contour.mid_weight
                } else {
                    contour.tail_weight
                };
                collision += coinciding * peak_weight;
            }
        }
    }

    if pairs == 0 { 0.0 } else { (collision / pairs as f32).min(1.0) }
}

/// Pairs where one voice's cadence window overlaps another's development
/// half.
fn cadence_conflict(
    obligations: &[ObligationNode],
    offset: Tick,
    num_voices: u8,
    subject_length: Tick,
) -> f32 {
    if num_voices < 2 {
        return 0.0;
    }

    let cadence_obs: Vec<&ObligationNode> = obligations
        .iter()
        .filter(|ob| {
            matches!(ob.kind, ObligationKind::CadenceStable | ObligationKind::CadenceApproach)
        })
        .collect();
    if cadence_obs.is_empty() {
        return 0.0;
    }

    let mut conflicts = 0u32;
    let mut pairs = 0u32;

    for voice_a in 0..num_voices {
        for voice_b in voice_a + 1..num_voices {
            pairs += 1;
            let shift_a = offset * Tick::from(voice_a);
            let shift_b = offset * Tick::from(voice_b);

            for ob in &cadence_obs {
                // Voice A's cadence window vs voice B's development half.
                let cad_start_a = ob.start_tick + shift_a;
                let cad_end_a = ob.deadline + shift_a;
                let b_dev_end = shift_b + subject_length / 2;
                if cad_start_a < b_dev_end && cad_end_a > shift_b {
                    conflicts += 1;
                }

                // And the reverse.
                let cad_start_b = ob.start_tick + shift_b;
                let cad_end_b = ob.deadline + shift_b;
                let a_dev_end = shift_a + subject_length / 2;
                if cad_start_b < a_dev_end && cad_end_b > shift_a {
                    conflicts += 1;
                }
            }
        }
    }

    let max_conflicts = pairs * cadence_obs.len() as u32 * 2;
    if max_conflicts == 0 {
        0.0
    } else {
        (conflicts as f32 / max_conflicts as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_theory::pitch::PitchClass;
    use bach_time::{EIGHTH_NOTE, QUARTER_NOTE, TICKS_PER_BAR};

    fn note(tick: Tick, duration: Tick, pitch: u8) -> NoteEvent {
        NoteEvent::new(tick, duration, pitch, 80, 0)
    }

    fn g_minor() -> KeySignature {
        KeySignature::new(PitchClass::G, true)
    }

    /// A simplified BWV 578-like opening line in G minor.
    fn little_fugue_subject() -> Vec<NoteEvent> {
        vec![
            note(0, QUARTER_NOTE, 67),            // G4
            note(480, QUARTER_NOTE, 74),          // D5 — leap of a 5th
            note(960, EIGHTH_NOTE, 70),           // Bb4
            note(1200, EIGHTH_NOTE, 69),          // A4
            note(1440, EIGHTH_NOTE, 70),          // Bb4
            note(1680, EIGHTH_NOTE, 67),          // G4
            note(1920, EIGHTH_NOTE, 66),          // F#4 — leading tone
            note(2160, EIGHTH_NOTE, 67),          // G4
            note(2400, EIGHTH_NOTE, 69),          // A4
            note(2640, EIGHTH_NOTE, 66),          // F#4
            note(2880, QUARTER_NOTE, 67),         // G4
            note(3360, QUARTER_NOTE, 62),         // D4
        ]
    }

    #[test]
    fn leading_tones_produce_exactly_matching_nodes() {
        let notes = little_fugue_subject();
        let profile = analyze_obligations(&notes, g_minor());
        let lt_count = profile
            .obligations
            .iter()
            .filter(|ob| ob.kind == ObligationKind::LeadingTone)
            .count();
        assert_eq!(lt_count, 2); // two F#4s

        for ob in &profile.obligations {
            if ob.kind == ObligationKind::LeadingTone {
                assert_eq!(ob.direction, 1);
                assert_eq!(ob.required_interval_semitones, 1);
                assert_eq!(ob.deadline, ob.start_tick + RESOLVE_WINDOW);
            }
        }
    }

    #[test]
    fn leaps_and_density_on_the_little_fugue_line() {
        let notes = little_fugue_subject();
        let profile = analyze_obligations(&notes, g_minor());

        let leaps = profile
            .obligations
            .iter()
            .filter(|ob| ob.kind == ObligationKind::LeapResolve)
            .count();
        assert!(leaps >= 1); // G4 -> D5 and the final G4 -> D4

        assert!(profile.peak_density >= 1.0 && profile.peak_density <= 3.0);
        assert!(profile.synchronous_pressure <= 0.5);
        assert!(profile.feasible_for(4));
    }

    #[test]
    fn register_arc_of_the_little_fugue_line() {
        let notes = little_fugue_subject();
        let profile = analyze_obligations(&notes, g_minor());
        assert_eq!(profile.register_arc.opening_pitch, 67);
        assert_eq!(profile.register_arc.peak_pitch, 74);
        assert_eq!(profile.register_arc.closing_pitch, 62);
        assert_eq!(profile.register_arc.overall_direction, -1);
    }

    #[test]
    fn stretto_matrix_is_bounded_and_has_a_feasible_two_voice_bar_offset() {
        let notes = little_fugue_subject();
        let profile = analyze_obligations(&notes, g_minor());
        assert!(!profile.stretto_matrix.is_empty());

        for entry in &profile.stretto_matrix {
            assert!(entry.peak_obligation >= 0.0);
            for dim in [
                entry.vertical_clash,
                entry.rhythmic_interference,
                entry.register_overlap,
                entry.perceptual_overlap,
                entry.cadence_conflict,
            ] {
                assert!((0.0..=1.0).contains(&dim));
            }
            let score = entry.feasibility_score();
            assert!((0.0..=1.0).contains(&score));
        }

        let bar_entry = profile
            .stretto_matrix
            .iter()
            .find(|e| e.num_voices == 2 && e.offset_ticks == TICKS_PER_BAR);
        let entry = bar_entry.expect("bar-offset entry exists");
        assert!(entry.feasibility_score() >= 0.5, "score {}", entry.feasibility_score());
    }

    #[test]
    fn strong_beat_gates_match_strong_beat_onsets() {
        let notes = little_fugue_subject();
        let profile = analyze_obligations(&notes, g_minor());
        let gates = profile
            .obligations
            .iter()
            .filter(|ob| ob.kind == ObligationKind::StrongBeatHarm)
            .count();
        let strong_onsets =
            notes.iter().filter(|n| is_strong_beat(n.start_tick)).count();
        assert_eq!(gates, strong_onsets);
    }

    #[test]
    fn sevenths_resolve_downward() {
        // C major: F4 is degree 4, the 7th of V7.
        let key = KeySignature::c_major();
        let notes =
            vec![note(0, QUARTER_NOTE, 65), note(480, QUARTER_NOTE, 64)];
        let profile = analyze_obligations(&notes, key);
        let seventh = profile
            .obligations
            .iter()
            .find(|ob| ob.kind == ObligationKind::Seventh)
            .expect("seventh detected");
        assert_eq!(seventh.direction, -1);
        assert_eq!(seventh.strength, ObligationStrength::Soft);
    }

    #[test]
    fn empty_subject_yields_empty_profile() {
        let profile = analyze_obligations(&[], g_minor());
        assert!(profile.obligations.is_empty());
        assert!(profile.stretto_matrix.is_empty());
    }

    #[test]
    fn invariant_violations_cover_repetition_and_spacing() {
        let hammered = vec![
            note(0, QUARTER_NOTE, 67),
            note(480, QUARTER_NOTE, 67),
            note(960, QUARTER_NOTE, 67),
        ];
        let nodes = detect_invariant_violations(&hammered);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, ObligationKind::InvariantRecovery);
        assert!(!nodes[0].is_debt());

        let wide = vec![note(0, QUARTER_NOTE, 60), note(480, QUARTER_NOTE, 74)];
        let nodes = detect_invariant_violations(&wide);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].direction, -1);

        let smooth = vec![note(0, QUARTER_NOTE, 60), note(480, QUARTER_NOTE, 62)];
        assert!(detect_invariant_violations(&smooth).is_empty());
    }
}

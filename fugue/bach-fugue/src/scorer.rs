//! fugue/bach-fugue/src/scorer.rs
//! Archetype-specific quality scoring and the hard gate.

use std::collections::BTreeSet;

use bach_score::{COMMON_FIGURES, NoteEvent, find_best_figure};
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, absolute_degree, absolute_degree_to_pitch};
use bach_time::{SIXTEENTH_NOTE, TICKS_PER_BAR, TICKS_PER_BEAT, Tick, is_strong_beat};

use crate::policy::ArchetypePolicy;
use crate::subject::Subject;

/// Multi-dimensional archetype quality, each dimension in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchetypeScore {
    /// Match to the archetype's structural profile.
    pub archetype_fitness: f32,
    /// Quality when diatonically inverted.
    pub inversion_quality: f32,
    /// Number and quality of valid stretto intervals.
    pub stretto_potential: f32,
    /// Head-motif distinctiveness and reusability.
    pub kopfmotiv_strength: f32,
}

impl ArchetypeScore {
    /// Weighted composite: fitness 0.30, inversion 0.25, stretto 0.25,
    /// kopfmotiv 0.20.
    #[must_use]
    pub fn composite(&self) -> f32 {
        self.archetype_fitness * 0.30
            + self.inversion_quality * 0.25
            + self.stretto_potential * 0.25
            + self.kopfmotiv_strength * 0.20
    }
}

/// Evaluates subjects against archetype requirements.
#[derive(Debug, Default)]
pub struct ArchetypeScorer;

impl ArchetypeScorer {
    /// Score all four dimensions.
    #[must_use]
    pub fn evaluate(&self, subject: &Subject, policy: &ArchetypePolicy) -> ArchetypeScore {
        ArchetypeScore {
            archetype_fitness: self.score_archetype_fitness(subject, policy),
            inversion_quality: self.score_inversion_quality(subject),
            stretto_potential: self.score_stretto_potential(subject),
            kopfmotiv_strength: self.score_kopfmotiv_strength(subject, policy),
        }
    }

    /// Check the policy's required conditions.
    #[must_use]
    pub fn check_hard_gate(&self, subject: &Subject, policy: &ArchetypePolicy) -> bool {
        if subject.notes.len() < 2 {
            return false;
        }

        if policy.require_invertible && self.score_inversion_quality(subject) < 0.40 {
            return false;
        }

        if policy.require_fragmentable
            && self.score_kopfmotiv_strength(subject, policy) < 0.40
        {
            return false;
        }

        // Contour symmetry: ascending vs descending motion within 25:75.
        if policy.require_contour_symmetry {
            let mut ascending = 0u32;
            let mut descending = 0u32;
            for pair in subject.notes.windows(2) {
                match i32::from(pair[1].pitch) - i32::from(pair[0].pitch) {
                    interval if interval > 0 => ascending += 1,
                    interval if interval < 0 => descending += 1,
                    _ => {}
                }
            }
            let total = ascending + descending;
            if total > 0 {
                let ratio = ascending.min(descending) as f32 / total as f32;
                if ratio < 0.25 {
                    return false;
                }
            }
        }

        // Functional resolution: a chromatic step must not be abandoned by
        // a leap.
        if policy.require_functional_resolution {
            let mut unresolved = 0u32;
            for idx in 1..subject.notes.len() {
                let interval = subject.notes[idx].pitch.abs_diff(subject.notes[idx - 1].pitch);
                if interval == 1 && idx + 1 < subject.notes.len() {
                    let next =
                        subject.notes[idx + 1].pitch.abs_diff(subject.notes[idx].pitch);
                    if next > 3 {
                        unresolved += 1;
                    }
                }
            }
            if unresolved > policy.max_consecutive_chromatic {
                return false;
            }
        }

        // Axis stability: the inversion must stay in a playable register.
        if policy.require_axis_stability {
            let scale = ScaleKind::for_key(subject.key);
            let inverted = invert_melody_diatonic(
                &subject.notes,
                subject.notes[0].pitch,
                subject.key,
                scale,
            );
            if inverted.iter().any(|n| n.pitch < 24 || n.pitch > 108) {
                return false;
            }
        }

        true
    }

    /// Range, step ratio, sixteenth density, and ending preference.
    #[must_use]
    pub fn score_archetype_fitness(&self, subject: &Subject, policy: &ArchetypePolicy) -> f32 {
        if subject.notes.is_empty() {
            return 0.0;
        }

        let mut score = 1.0f32;

        // Range fitness, with ~1.7 semitones per scale degree.
        let range_degrees = subject.range() as f32 / 1.7;
        if range_degrees < policy.min_range_degrees as f32 {
            score -= (policy.min_range_degrees as f32 - range_degrees) * 0.10;
        }
        if range_degrees > policy.max_range_degrees as f32 {
            score -= (range_degrees - policy.max_range_degrees as f32) * 0.10;
        }

        // Step-motion ratio.
        let mut steps = 0u32;
        let mut intervals = 0u32;
        for pair in subject.notes.windows(2) {
            if pair[1].pitch.abs_diff(pair[0].pitch) <= 2 {
                steps += 1;
            }
            intervals += 1;
        }
        if intervals > 0 {
            let step_ratio = steps as f32 / intervals as f32;
            if step_ratio < policy.min_step_ratio {
                score -= (policy.min_step_ratio - step_ratio) * 0.5;
            }
        }

        // Sixteenth-note density cap.
        let sixteenths =
            subject.notes.iter().filter(|n| n.duration <= SIXTEENTH_NOTE).count();
        let density = sixteenths as f32 / subject.notes.len() as f32;
        if density > policy.max_sixteenth_density {
            score -= (density - policy.max_sixteenth_density) * 0.5;
        }

        // Dominant-ending bonus when the policy favors it: Bach subjects
        // usually end on the dominant to set up the answer.
        if policy.dominant_ending_prob >= 0.5 && subject.notes.len() >= 2 {
            let dominant_class = subject.key.dominant_class().index();
            if subject.notes.last().is_some_and(|n| n.pitch % 12 == dominant_class) {
                score += 0.15 + (policy.dominant_ending_prob - 0.5) * 0.30;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Diatonic inversion around the first pitch: range similarity plus
    /// parallel-perfect avoidance against the original.
    #[must_use]
    pub fn score_inversion_quality(&self, subject: &Subject) -> f32 {
        if subject.notes.len() < 3 {
            return 0.5;
        }

        let scale = ScaleKind::for_key(subject.key);
        let pivot = subject.notes[0].pitch;
        let inverted = invert_melody_diatonic(&subject.notes, pivot, subject.key, scale);
        if inverted.is_empty() {
            return 0.0;
        }

        let inv_low = inverted.iter().map(|n| n.pitch).min().unwrap_or(127);
        let inv_high = inverted.iter().map(|n| n.pitch).max().unwrap_or(0);
        let inv_range = i32::from(inv_high) - i32::from(inv_low);
        let range_similarity =
            (1.0 - (inv_range - subject.range()).abs() as f32 / 12.0).max(0.0);

        let mut parallel_perfects = 0u32;
        let mut checked = 0u32;
        for idx in 1..subject.notes.len().min(inverted.len()) {
            let current =
                i32::from(subject.notes[idx].pitch) - i32::from(inverted[idx].pitch);
            let previous =
                i32::from(subject.notes[idx - 1].pitch) - i32::from(inverted[idx - 1].pitch);
            let current_class = current.rem_euclid(12);
            let previous_class = previous.rem_euclid(12);
            let both_perfect = matches!(current_class, 0 | 7) && matches!(previous_class, 0 | 7);
            if both_perfect && current != previous {
                parallel_perfects += 1;
            }
            checked += 1;
        }
        let parallel_penalty =
            if checked > 0 { parallel_perfects as f32 / checked as f32 } else { 0.0 };

        (range_similarity * 0.4 + (1.0 - parallel_penalty) * 0.6).clamp(0.0, 1.0)
    }

    /// Graduated score from the count of valid stretto intervals within
    /// half the subject length.
    #[must_use]
    pub fn score_stretto_potential(&self, subject: &Subject) -> f32 {
        if subject.notes.len() < 3 {
            return 0.0;
        }

        let max_offset = (subject.length_ticks / 2).max(TICKS_PER_BAR);
        let intervals = find_valid_stretto_intervals(&subject.notes, max_offset);
        match intervals.len() {
            0 => 0.2,
            1 => 0.6,
            2 => 0.8,
            _ => 1.0,
        }
    }

    /// Interval variety + rhythm variety + opening gesture, plus a
    /// vocabulary-match bonus weighted by the policy's fragment and
    /// sequence weights.
    #[must_use]
    pub fn score_kopfmotiv_strength(&self, subject: &Subject, policy: &ArchetypePolicy) -> f32 {
        if subject.notes.len() < 3 {
            return 0.0;
        }
        let kopf = subject.kopfmotiv(4);
        if kopf.len() < 2 {
            return 0.0;
        }

        let mut score = 0.0f32;

        let mut unique_intervals: BTreeSet<i32> = BTreeSet::new();
        for pair in kopf.windows(2) {
            unique_intervals.insert(i32::from(pair[1].pitch) - i32::from(pair[0].pitch));
        }
        score += unique_intervals.len() as f32 / (kopf.len() - 1) as f32 * 0.4;

        let unique_durations: BTreeSet<Tick> = kopf.iter().map(|n| n.duration).collect();
        score += unique_durations.len() as f32 / kopf.len() as f32 * 0.3;

        let first_interval = kopf[1].pitch.abs_diff(kopf[0].pitch);
        if first_interval >= 3 {
            score += 0.3;
        } else if first_interval >= 1 {
            score += 0.15;
        }

        // Vocabulary bonus: a head that matches a catalogued figure is
        // reusable in episodes and sequences.
        let vocabulary_weight =
            policy.fragment_reusability_weight + policy.sequence_potential_weight;
        if vocabulary_weight > 0.0 && kopf.len() == 4 {
            let pitches: Vec<u8> = kopf.iter().map(|n| n.pitch).collect();
            let scale = ScaleKind::for_key(subject.key);
            if find_best_figure(&pitches, &COMMON_FIGURES, subject.key, scale, 0.6).is_some() {
                score += vocabulary_weight * 0.5;
            }
        }

        score.clamp(0.0, 1.0)
    }
}

/// Invert a melody diatonically around a pivot pitch.
///
/// Each note maps to the degree mirrored across the pivot's absolute
/// degree; rhythm is untouched.
#[must_use]
pub fn invert_melody_diatonic(
    notes: &[NoteEvent],
    pivot: u8,
    key: KeySignature,
    scale: ScaleKind,
) -> Vec<NoteEvent> {
    let pivot_degree = absolute_degree(pivot, key, scale);
    notes
        .iter()
        .map(|note| {
            let degree = absolute_degree(note.pitch, key, scale);
            let mirrored = 2 * pivot_degree - degree;
            let mut inverted = *note;
            inverted.pitch = absolute_degree_to_pitch(mirrored, key, scale);
            inverted
        })
        .collect()
}

/// Offsets (in whole beats) at which a two-voice overlay of the subject
/// with itself stays clash-free on sampled beats.
#[must_use]
pub fn find_valid_stretto_intervals(notes: &[NoteEvent], max_offset: Tick) -> Vec<Tick> {
    let mut valid = Vec::new();
    let Some(first) = notes.first() else { return valid };
    let base = first.start_tick;
    let length = notes.last().map_or(0, NoteEvent::end_tick) - base;

    let sounding_at = |tick: Tick| -> Option<u8> {
        notes
            .iter()
            .find(|n| tick >= n.start_tick - base && tick < n.end_tick() - base)
            .map(|n| n.pitch)
    };

    let mut offset = TICKS_PER_BEAT;
    while offset <= max_offset {
        let mut violations = 0u32;
        let mut prev_interval: Option<i32> = None;

        let mut tick = offset;
        while tick < length {
            let leader = sounding_at(tick);
            let follower = sounding_at(tick - offset);
            if let (Some(lead), Some(follow)) = (leader, follower) {
                let interval = i32::from(lead) - i32::from(follow);
                let class = interval.rem_euclid(12);
                // Harsh intervals on strong beats break the stretto.
                if is_strong_beat(tick) && matches!(class, 1 | 6 | 11) {
                    violations += 1;
                }
                // Consecutive moving perfect intervals imply parallels.
                if let Some(prev) = prev_interval {
                    let prev_class = prev.rem_euclid(12);
                    if matches!(class, 0 | 7)
                        && matches!(prev_class, 0 | 7)
                        && interval != prev
                    {
                        violations += 1;
                    }
                }
                prev_interval = Some(interval);
            } else {
                prev_interval = None;
            }
            tick += TICKS_PER_BEAT;
        }

        if violations == 0 {
            valid.push(offset);
        }
        offset += TICKS_PER_BEAT;
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FugueArchetype, archetype_policy};
    use crate::subject::SubjectCharacter;
    use bach_time::{EIGHTH_NOTE, QUARTER_NOTE};

    fn subject_from(pitches: &[u8], durations: &[Tick]) -> Subject {
        let mut notes = Vec::new();
        let mut tick = 0;
        for (idx, &pitch) in pitches.iter().enumerate() {
            let duration = durations[idx % durations.len()];
            notes.push(NoteEvent::new(tick, duration, pitch, 80, 0));
            tick += duration;
        }
        Subject {
            key: KeySignature::c_major(),
            character: SubjectCharacter::Severe,
            notes,
            length_ticks: TICKS_PER_BAR * 2,
            anacrusis_ticks: 0,
            degraded: false,
        }
    }

    #[test]
    fn diatonic_inversion_mirrors_degrees() {
        let key = KeySignature::c_major();
        let notes = [
            NoteEvent::new(0, QUARTER_NOTE, 60, 80, 0),
            NoteEvent::new(480, QUARTER_NOTE, 64, 80, 0),
            NoteEvent::new(960, QUARTER_NOTE, 67, 80, 0),
        ];
        let inverted = invert_melody_diatonic(&notes, 60, key, ScaleKind::Major);
        let pitches: Vec<u8> = inverted.iter().map(|n| n.pitch).collect();
        // C stays, E (two degrees up) becomes A below, G (four up) becomes F below.
        assert_eq!(pitches, vec![60, 57, 53]);
    }

    #[test]
    fn composite_uses_the_documented_weights() {
        let score = ArchetypeScore {
            archetype_fitness: 1.0,
            inversion_quality: 0.0,
            stretto_potential: 0.0,
            kopfmotiv_strength: 0.0,
        };
        assert!((score.composite() - 0.30).abs() < 1e-6);
    }

    #[test]
    fn varied_heads_outscore_monotone_heads() {
        let scorer = ArchetypeScorer;
        let policy = archetype_policy(FugueArchetype::Compact);
        let varied = subject_from(&[60, 64, 62, 65], &[QUARTER_NOTE, EIGHTH_NOTE, QUARTER_NOTE]);
        let monotone = subject_from(&[60, 60, 60, 60], &[QUARTER_NOTE]);
        assert!(
            scorer.score_kopfmotiv_strength(&varied, policy)
                > scorer.score_kopfmotiv_strength(&monotone, policy)
        );
    }

    #[test]
    fn contour_symmetry_gate_rejects_one_way_lines() {
        let scorer = ArchetypeScorer;
        let policy = archetype_policy(FugueArchetype::Invertible);
        let ascending_only =
            subject_from(&[60, 62, 64, 65, 67, 69, 71, 72], &[QUARTER_NOTE]);
        assert!(!scorer.check_hard_gate(&ascending_only, policy));
    }

    #[test]
    fn stretto_search_finds_offsets_for_an_arched_line() {
        let subject = subject_from(&[60, 62, 64, 62, 60, 59, 60, 62], &[QUARTER_NOTE]);
        let offsets = find_valid_stretto_intervals(&subject.notes, TICKS_PER_BAR);
        for offset in &offsets {
            assert_eq!(offset % TICKS_PER_BEAT, 0);
        }
        let potential = ArchetypeScorer.score_stretto_potential(&subject);
        assert!((0.0..=1.0).contains(&potential));
    }

    #[test]
    fn fitness_penalizes_narrow_range() {
        let scorer = ArchetypeScorer;
        let policy = archetype_policy(FugueArchetype::Cantabile); // min 5 degrees
        let narrow = subject_from(&[60, 62, 60, 62, 60], &[QUARTER_NOTE]);
        let wide = subject_from(&[60, 64, 67, 69, 72, 69, 67, 64], &[QUARTER_NOTE]);
        assert!(
            scorer.score_archetype_fitness(&narrow, policy)
                < scorer.score_archetype_fitness(&wide, policy)
        );
    }
}

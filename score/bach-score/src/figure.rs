//! score/bach-score/src/figure.rs
//! Figure matching: score a pitch sequence against a vocabulary figure.

use bach_theory::pitch::KeySignature;
use bach_theory::scale::{
    DEGREE_COUNT, ScaleKind, absolute_degree, absolute_degree_to_pitch, nearest_scale_tone,
};

use crate::vocabulary::{IntervalMode, MelodicFigure};

/// Score for a single semitone-mode interval: exact, off-by-one, miss.
fn score_semitone_interval(actual: i32, expected: i32) -> f32 {
    match (actual - expected).abs() {
        0 => 1.0,
        1 => 0.3,
        _ => 0.0,
    }
}

/// Directed scale-degree difference between two pitches.
///
/// Degree counting is anchored to MIDI octaves, which can put the raw diff
/// on the wrong side of zero for keys other than C; the semitone direction
/// decides, and the diff is corrected by one key-relative octave when the
/// two disagree.
fn degree_diff(pitch_a: u8, pitch_b: u8, key: KeySignature, scale: ScaleKind) -> i32 {
    let snapped_a = nearest_scale_tone(pitch_a, key, scale);
    let snapped_b = nearest_scale_tone(pitch_b, key, scale);
    let mut diff =
        absolute_degree(snapped_b, key, scale) - absolute_degree(snapped_a, key, scale);

    let semitone_dir = i32::from(pitch_b) - i32::from(pitch_a);
    if semitone_dir > 0 && diff <= 0 {
        diff += DEGREE_COUNT;
    } else if semitone_dir < 0 && diff >= 0 {
        diff -= DEGREE_COUNT;
    }
    diff
}

/// Score one degree-mode interval pair, including the chroma bonus.
fn score_degree_interval(
    pitches: &[u8],
    idx: usize,
    figure: &MelodicFigure,
    key: KeySignature,
    scale: ScaleKind,
) -> f32 {
    let Some(intervals) = figure.degree_intervals else { return 0.0 };
    let actual = degree_diff(pitches[idx], pitches[idx + 1], key, scale);
    let expected = i32::from(intervals[idx].degree_diff);

    let same_dir = (actual > 0 && expected > 0)
        || (actual < 0 && expected < 0)
        || (actual == 0 && expected == 0);

    let mut score = if actual == expected {
        1.0
    } else if same_dir && (actual - expected).abs() == 1 {
        0.3
    } else if same_dir {
        0.1
    } else {
        0.0
    };

    // Chroma bonus only when the degree diff matches exactly: compare the
    // actual semitone interval against the diatonic realization.
    if actual == expected {
        let snapped_0 = nearest_scale_tone(pitches[idx], key, scale);
        let abs_0 = absolute_degree(snapped_0, key, scale);
        let natural_1 = absolute_degree_to_pitch(abs_0 + actual, key, scale);
        let actual_semitones = i32::from(pitches[idx + 1]) - i32::from(pitches[idx]);
        let natural_semitones = i32::from(natural_1) - i32::from(snapped_0);
        let chroma = actual_semitones - natural_semitones;
        if chroma == i32::from(intervals[idx].chroma_offset) {
            score += 0.1;
        }
    }

    score
}

/// Score how well a pitch sequence matches a figure, in `[0, 1]`.
///
/// A note-count mismatch scores exactly 0.0. Semitone-mode figures compare
/// directed chromatic intervals; degree-mode figures compare directed
/// scale-degree differences with a chroma bonus.
#[must_use]
pub fn match_figure(
    pitches: &[u8],
    figure: &MelodicFigure,
    key: KeySignature,
    scale: ScaleKind,
) -> f32 {
    if pitches.len() != usize::from(figure.note_count) || pitches.len() < 2 {
        return 0.0;
    }

    let interval_count = pitches.len() - 1;
    let use_semitone =
        figure.primary_mode == IntervalMode::Semitone || !figure.allow_transposition;

    let total: f32 = if use_semitone {
        let Some(expected) = figure.semitone_intervals else { return 0.0 };
        (0..interval_count)
            .map(|idx| {
                let actual = i32::from(pitches[idx + 1]) - i32::from(pitches[idx]);
                score_semitone_interval(actual, i32::from(expected[idx]))
            })
            .sum()
    } else if figure.degree_intervals.is_some() {
        (0..interval_count)
            .map(|idx| score_degree_interval(pitches, idx, figure, key, scale))
            .sum()
    } else {
        return 0.0;
    };

    (total / interval_count as f32).clamp(0.0, 1.0)
}

/// Index of the best-matching figure at or above `threshold`, if any.
///
/// Figures whose note count differs from the input are skipped.
#[must_use]
pub fn find_best_figure(
    pitches: &[u8],
    table: &[&MelodicFigure],
    key: KeySignature,
    scale: ScaleKind,
    threshold: f32,
) -> Option<usize> {
    let mut best_score = 0.0f32;
    let mut best_index = None;

    for (idx, figure) in table.iter().enumerate() {
        if usize::from(figure.note_count) != pitches.len() {
            continue;
        }
        let score = match_figure(pitches, figure, key, scale);
        if score > best_score {
            best_score = score;
            best_index = Some(idx);
        }
    }

    if best_score >= threshold { best_index } else { None }
}

/// Realize a figure as concrete pitches from a starting pitch.
///
/// Degree figures walk the scale; semitone figures apply their chromatic
/// intervals directly. Used to seed episode material and texture fallbacks.
#[must_use]
pub fn realize_figure(
    figure: &MelodicFigure,
    start_pitch: u8,
    key: KeySignature,
    scale: ScaleKind,
) -> Vec<u8> {
    let mut pitches = Vec::with_capacity(usize::from(figure.note_count));
    if let (IntervalMode::Degree, Some(intervals)) =
        (figure.primary_mode, figure.degree_intervals)
    {
        let start = nearest_scale_tone(start_pitch, key, scale);
        let mut abs = absolute_degree(start, key, scale);
        pitches.push(start);
        for interval in intervals {
            abs += i32::from(interval.degree_diff);
            let natural = absolute_degree_to_pitch(abs, key, scale);
            let pitch = i32::from(natural) + i32::from(interval.chroma_offset);
            pitches.push(pitch.clamp(0, 127) as u8);
        }
    } else if let Some(intervals) = figure.semitone_intervals {
        let mut pitch = i32::from(start_pitch);
        pitches.push(start_pitch);
        for &interval in intervals {
            pitch += i32::from(interval);
            pitches.push(pitch.clamp(0, 127) as u8);
        }
    }
    pitches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{ASC_RUN_4, COMMON_FIGURES, DESC_RUN_4, MORDENT};
    use bach_theory::pitch::PitchClass;

    fn c_major() -> KeySignature {
        KeySignature::c_major()
    }

    #[test]
    fn canonical_descending_run_scores_high() {
        let score = match_figure(&[72, 71, 69, 67], &DESC_RUN_4, c_major(), ScaleKind::Major);
        assert!(score >= 0.9, "score {score}");
    }

    #[test]
    fn transposition_preserves_degree_match() {
        let g_major = KeySignature::new(PitchClass::G, false);
        let score = match_figure(&[67, 66, 64, 62], &DESC_RUN_4, g_major, ScaleKind::Major);
        assert!(score >= 0.9, "score {score}");
    }

    #[test]
    fn direction_mismatch_scores_low() {
        let score = match_figure(&[60, 62, 64, 65], &DESC_RUN_4, c_major(), ScaleKind::Major);
        assert!(score <= 0.15, "score {score}");
    }

    #[test]
    fn count_mismatch_scores_zero() {
        let score = match_figure(&[60, 62, 64], &DESC_RUN_4, c_major(), ScaleKind::Major);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn mordent_matches_only_exact_semitones() {
        let exact = match_figure(&[67, 66, 67], &MORDENT, c_major(), ScaleKind::Major);
        assert!(exact >= 0.9);
        let off = match_figure(&[67, 65, 67], &MORDENT, c_major(), ScaleKind::Major);
        assert!(off < 0.5);
    }

    #[test]
    fn best_figure_lookup_finds_ascending_run() {
        let idx = find_best_figure(
            &[60, 62, 64, 65],
            &COMMON_FIGURES,
            c_major(),
            ScaleKind::Major,
            0.5,
        );
        let found = idx.map(|i| COMMON_FIGURES[i].name);
        assert_eq!(found, Some(ASC_RUN_4.name));
    }

    #[test]
    fn realized_figures_match_themselves() {
        for figure in COMMON_FIGURES {
            let pitches = realize_figure(figure, 72, c_major(), ScaleKind::Major);
            assert_eq!(pitches.len(), usize::from(figure.note_count), "{}", figure.name);
            let score = match_figure(&pitches, figure, c_major(), ScaleKind::Major);
            assert!(score >= 0.9, "{} scored {score}", figure.name);
        }
    }
}

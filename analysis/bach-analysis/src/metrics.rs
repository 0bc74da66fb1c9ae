//! analysis/bach-analysis/src/metrics.rs
//! Counterpoint metrics over a finished multi-voice texture.

use bach_score::NoteEvent;
use bach_theory::interval::simple_interval;
use bach_time::{TICKS_PER_BEAT, Tick};
use serde::Serialize;

/// Aggregate counterpoint statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CounterpointMetrics {
    /// Parallel perfect intervals (P1/P5/P8 moving in the same direction)
    /// between any voice pair, sampled per beat.
    pub parallel_perfects: u32,
    /// Stepwise motion ratio per voice, indexed by voice.
    pub step_ratios: Vec<f32>,
    /// Pitch span per voice, indexed by voice.
    pub voice_ranges: Vec<u8>,
    /// Beats on which an upper voice sounds below a lower voice.
    pub voice_crossings: u32,
    /// Average number of simultaneously sounding voices.
    pub avg_sounding_voices: f32,
}

/// Compute metrics for all voices in `[0, num_voices)`.
#[must_use]
pub fn compute_counterpoint_metrics(notes: &[NoteEvent], num_voices: u8) -> CounterpointMetrics {
    let mut metrics = CounterpointMetrics::default();
    let span = notes.iter().map(NoteEvent::end_tick).max().unwrap_or(0);
    if span == 0 {
        return metrics;
    }

    // Per-voice melodic statistics.
    for voice in 0..num_voices {
        let mut line: Vec<&NoteEvent> =
            notes.iter().filter(|n| n.voice == voice).collect();
        line.sort_by_key(|n| n.start_tick);

        let mut steps = 0u32;
        let mut intervals = 0u32;
        for pair in line.windows(2) {
            if pair[1].pitch.abs_diff(pair[0].pitch) <= 2 {
                steps += 1;
            }
            intervals += 1;
        }
        metrics
            .step_ratios
            .push(if intervals > 0 { steps as f32 / intervals as f32 } else { 0.0 });

        let low = line.iter().map(|n| n.pitch).min().unwrap_or(0);
        let high = line.iter().map(|n| n.pitch).max().unwrap_or(0);
        metrics.voice_ranges.push(high.saturating_sub(low));
    }

    // Beat-sampled pairwise statistics.
    let sounding_at = |tick: Tick, voice: u8| -> Option<u8> {
        notes.iter().find(|n| n.voice == voice && n.sounds_at(tick)).map(|n| n.pitch)
    };

    let mut prev_pitches: Vec<Option<u8>> = vec![None; usize::from(num_voices)];
    let mut sounding_total = 0u32;
    let mut samples = 0u32;

    let mut tick = 0;
    while tick < span {
        let current: Vec<Option<u8>> =
            (0..num_voices).map(|voice| sounding_at(tick, voice)).collect();

        sounding_total += current.iter().flatten().count() as u32;
        samples += 1;

        for a in 0..usize::from(num_voices) {
            for b in a + 1..usize::from(num_voices) {
                // Crossing: the nominally lower voice sounds above.
                if let (Some(lower), Some(upper)) = (current[a], current[b]) {
                    if lower > upper {
                        metrics.voice_crossings += 1;
                    }
                }

                // Parallel perfects need both voices moving into a perfect
                // interval from a perfect interval.
                let (Some(now_a), Some(now_b)) = (current[a], current[b]) else { continue };
                let (Some(was_a), Some(was_b)) = (prev_pitches[a], prev_pitches[b]) else {
                    continue;
                };
                if now_a == was_a && now_b == was_b {
                    continue;
                }
                let now_class = simple_interval(now_a, now_b);
                let was_class = simple_interval(was_a, was_b);
                if matches!(now_class, 0 | 7) && matches!(was_class, 0 | 7) {
                    let dir_a = i32::from(now_a) - i32::from(was_a);
                    let dir_b = i32::from(now_b) - i32::from(was_b);
                    if dir_a.signum() == dir_b.signum() && dir_a != 0 {
                        metrics.parallel_perfects += 1;
                    }
                }
            }
        }

        prev_pitches = current;
        tick += TICKS_PER_BEAT;
    }

    metrics.avg_sounding_voices =
        if samples > 0 { sounding_total as f32 / samples as f32 } else { 0.0 };
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(tick: Tick, pitch: u8, voice: u8) -> NoteEvent {
        NoteEvent::new(tick, TICKS_PER_BEAT, pitch, 80, voice)
    }

    #[test]
    fn parallel_fifths_are_counted() {
        // Two voices marching up in parallel fifths.
        let notes = [
            note(0, 48, 0),
            note(0, 55, 1),
            note(480, 50, 0),
            note(480, 57, 1),
            note(960, 52, 0),
            note(960, 59, 1),
        ];
        let metrics = compute_counterpoint_metrics(&notes, 2);
        assert_eq!(metrics.parallel_perfects, 2);
    }

    #[test]
    fn contrary_motion_into_a_fifth_is_not_parallel() {
        let notes = [
            note(0, 50, 0),
            note(0, 57, 1), // P5
            note(480, 48, 0),
            note(480, 55, 1), // P5 again, but via parallel... both down
        ];
        let metrics = compute_counterpoint_metrics(&notes, 2);
        assert_eq!(metrics.parallel_perfects, 1);

        let contrary = [
            note(0, 50, 0),
            note(0, 57, 1),
            note(480, 48, 0),
            note(480, 60, 1), // P8 by contrary motion
        ];
        let metrics = compute_counterpoint_metrics(&contrary, 2);
        assert_eq!(metrics.parallel_perfects, 0);
    }

    #[test]
    fn crossings_and_ranges_are_reported() {
        let notes = [
            note(0, 60, 0),
            note(0, 55, 1), // voice 1 below voice 0
            note(480, 60, 0),
            note(480, 72, 1),
        ];
        let metrics = compute_counterpoint_metrics(&notes, 2);
        assert_eq!(metrics.voice_crossings, 1);
        assert_eq!(metrics.voice_ranges, vec![0, 17]);
        assert!((metrics.avg_sounding_voices - 2.0).abs() < 1e-6);
    }
}

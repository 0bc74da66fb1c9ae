//! harmony/bach-harmony/src/progression.rs
//! Progression templates and cadence overlays for timeline construction.

use bach_theory::chord::{Chord, ChordDegree, ChordQuality, major_key_quality, minor_key_quality};
use bach_theory::pitch::KeySignature;
use bach_time::{TICKS_PER_BAR, TICKS_PER_BEAT, Tick};

use crate::event::HarmonicEvent;
use crate::timeline::HarmonicTimeline;

/// Density of harmonic events in a generated timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// One event per beat (dense; organ textures).
    Beat,
    /// One event per bar (moderate; flowing string textures).
    Bar,
    /// One event per quarter of the total span (coarse).
    Section,
}

/// Harmonic progression template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionKind {
    /// I-IV-V-I.
    Basic,
    /// I-vi-ii-V7-I.
    CircleOfFifths,
    /// I-IV-ii-V7-I.
    Subdominant,
    /// I-V/vi-vi-V/V-V-I, secondary dominants rendered as major chords on
    /// the diatonic degrees.
    ChromaticCircle,
    /// I-bVI-IV-V-I (modal mixture).
    BorrowedChord,
    /// I-IV-vii°-iii-vi-ii-V7-I.
    DescendingFifths,
}

/// Cadence overlay applied to a progression's final events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceKind {
    /// V7 → I.
    Perfect,
    /// V → vi.
    Deceptive,
    /// … → V.
    Half,
    /// iv6 → V, for minor-key section endings.
    Phrygian,
    /// Minor-key final chord raised to major.
    PicardyThird,
}

/// One step of a progression template.
#[derive(Clone, Copy)]
struct Step {
    degree: ChordDegree,
    /// Quality override; `None` takes the diatonic quality for the key.
    quality: Option<ChordQuality>,
    /// Root offset override in semitones from the tonic (for borrowed
    /// chords such as bVI).
    root_semitones: Option<u8>,
    weight: f32,
}

const fn step(degree: ChordDegree, weight: f32) -> Step {
    Step { degree, quality: None, root_semitones: None, weight }
}

const fn step_q(degree: ChordDegree, quality: ChordQuality, weight: f32) -> Step {
    Step { degree, quality: Some(quality), root_semitones: None, weight }
}

static BASIC_STEPS: [Step; 4] = {
    use ChordDegree as D;
    [step(D::I, 1.0), step(D::IV, 0.5), step(D::V, 0.75), step(D::I, 1.0)]
};

static CIRCLE_OF_FIFTHS_STEPS: [Step; 5] = {
    use ChordDegree as D;
    [
        step(D::I, 1.0),
        step(D::VI, 0.5),
        step(D::II, 0.5),
        step_q(D::V, ChordQuality::Dominant7, 0.75),
        step(D::I, 1.0),
    ]
};

static SUBDOMINANT_STEPS: [Step; 5] = {
    use ChordDegree as D;
    [
        step(D::I, 1.0),
        step(D::IV, 0.5),
        step(D::II, 0.5),
        step_q(D::V, ChordQuality::Dominant7, 0.75),
        step(D::I, 1.0),
    ]
};

static CHROMATIC_CIRCLE_STEPS: [Step; 6] = {
    use ChordDegree as D;
    [
        step(D::I, 1.0),
        step_q(D::III, ChordQuality::Major, 0.5),
        step(D::VI, 0.6),
        step_q(D::II, ChordQuality::Major, 0.5),
        step(D::V, 0.75),
        step(D::I, 1.0),
    ]
};

static BORROWED_CHORD_STEPS: [Step; 5] = {
    use ChordDegree as D;
    [
        step(D::I, 1.0),
        Step {
            degree: D::VI,
            quality: Some(ChordQuality::Major),
            root_semitones: Some(8),
            weight: 0.6,
        },
        step(D::IV, 0.5),
        step(D::V, 0.75),
        step(D::I, 1.0),
    ]
};

static DESCENDING_FIFTHS_STEPS: [Step; 8] = {
    use ChordDegree as D;
    [
        step(D::I, 1.0),
        step(D::IV, 0.5),
        step(D::VII, 0.5),
        step(D::III, 0.5),
        step(D::VI, 0.6),
        step(D::II, 0.5),
        step_q(D::V, ChordQuality::Dominant7, 0.75),
        step(D::I, 1.0),
    ]
};

fn template(kind: ProgressionKind) -> &'static [Step] {
    match kind {
        ProgressionKind::Basic => &BASIC_STEPS,
        ProgressionKind::CircleOfFifths => &CIRCLE_OF_FIFTHS_STEPS,
        ProgressionKind::Subdominant => &SUBDOMINANT_STEPS,
        ProgressionKind::ChromaticCircle => &CHROMATIC_CIRCLE_STEPS,
        ProgressionKind::BorrowedChord => &BORROWED_CHORD_STEPS,
        ProgressionKind::DescendingFifths => &DESCENDING_FIFTHS_STEPS,
    }
}

const CHORD_OCTAVE: i32 = 4;
const BASS_OCTAVE: i32 = 2;

fn realize_step(key: KeySignature, step: Step) -> (Chord, u8) {
    let mut chord = Chord::diatonic(key, step.degree, CHORD_OCTAVE);
    if let Some(quality) = step.quality {
        chord.quality = quality;
    }
    if let Some(semitones) = step.root_semitones {
        let root = (CHORD_OCTAVE + 1) * 12
            + i32::from(key.tonic.index())
            + i32::from(semitones);
        chord.root_pitch = root.clamp(0, 127) as u8;
    }
    let bass = chord.bass_pitch(BASS_OCTAVE);
    (chord, bass)
}

fn event_length(resolution: Resolution, duration: Tick, steps: usize) -> Tick {
    match resolution {
        Resolution::Beat => TICKS_PER_BEAT,
        Resolution::Bar => TICKS_PER_BAR,
        Resolution::Section => {
            let length = duration / steps as Tick;
            if length == 0 { duration } else { length }
        }
    }
}

/// Generate a standard I-IV-V-I backdrop for a key and duration.
#[must_use]
pub fn create_standard(
    key: KeySignature,
    duration: Tick,
    resolution: Resolution,
) -> HarmonicTimeline {
    create_progression(key, duration, resolution, ProgressionKind::Basic)
}

/// Generate a progression timeline from a template.
///
/// The template cycles until `duration` is covered; the final event is
/// truncated to end exactly at `duration`.
#[must_use]
pub fn create_progression(
    key: KeySignature,
    duration: Tick,
    resolution: Resolution,
    kind: ProgressionKind,
) -> HarmonicTimeline {
    let mut timeline = HarmonicTimeline::new();
    if duration == 0 {
        return timeline;
    }

    let steps = template(kind);
    let length = event_length(resolution, duration, steps.len());

    let mut tick = 0;
    let mut idx = 0;
    while tick < duration {
        let step = steps[idx % steps.len()];
        let (chord, bass) = realize_step(key, step);
        let end = (tick + length).min(duration);
        timeline.push(HarmonicEvent::new(tick, end, key, chord, bass, step.weight));
        tick = end;
        idx += 1;
    }

    timeline
}

/// Overlay a cadence on the final one or two events of a timeline.
///
/// This is a construction-phase rewrite: events are modified in place,
/// never added or removed.
pub fn apply_cadence(timeline: &mut HarmonicTimeline, cadence: CadenceKind, key: KeySignature) {
    let events = timeline.events_mut();
    let len = events.len();
    if len == 0 {
        return;
    }

    let rewrite = |event: &mut HarmonicEvent, degree: ChordDegree, quality: Option<ChordQuality>| {
        let mut chord = Chord::diatonic(key, degree, CHORD_OCTAVE);
        if let Some(quality) = quality {
            chord.quality = quality;
        }
        event.chord = chord;
        event.bass_pitch = chord.bass_pitch(BASS_OCTAVE);
        event.weight = 1.0;
    };

    match cadence {
        CadenceKind::Perfect => {
            if len >= 2 {
                rewrite(&mut events[len - 2], ChordDegree::V, Some(ChordQuality::Dominant7));
            }
            rewrite(&mut events[len - 1], ChordDegree::I, None);
        }
        CadenceKind::Deceptive => {
            if len >= 2 {
                rewrite(&mut events[len - 2], ChordDegree::V, None);
            }
            rewrite(&mut events[len - 1], ChordDegree::VI, None);
        }
        CadenceKind::Half => {
            rewrite(&mut events[len - 1], ChordDegree::V, None);
        }
        CadenceKind::Phrygian => {
            if len >= 2 {
                let minor_quality =
                    if key.is_minor { minor_key_quality(ChordDegree::IV) }
                    else { major_key_quality(ChordDegree::IV) };
                rewrite(&mut events[len - 2], ChordDegree::IV, Some(minor_quality));
                // First inversion: the chord third carries the bass.
                let event = &mut events[len - 2];
                event.chord.inversion = 1;
                let third_pc = event.chord.pitch_classes()[1];
                event.bass_pitch = ((BASS_OCTAVE + 1) * 12 + i32::from(third_pc))
                    .clamp(0, 127) as u8;
            }
            rewrite(&mut events[len - 1], ChordDegree::V, None);
        }
        CadenceKind::PicardyThird => {
            let event = &mut events[len - 1];
            if event.chord.quality == ChordQuality::Minor {
                event.chord.quality = ChordQuality::Major;
            }
            event.weight = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_theory::pitch::PitchClass;

    #[test]
    fn standard_progression_cycles_i_iv_v_i() {
        let key = KeySignature::c_major();
        let timeline = create_standard(key, TICKS_PER_BAR * 4, Resolution::Bar);
        assert_eq!(timeline.len(), 4);
        let degrees: Vec<ChordDegree> =
            timeline.events().iter().map(|event| event.chord.degree).collect();
        assert_eq!(degrees, vec![ChordDegree::I, ChordDegree::IV, ChordDegree::V, ChordDegree::I]);
        let weights: Vec<f32> = timeline.events().iter().map(|event| event.weight).collect();
        assert_eq!(weights, vec![1.0, 0.5, 0.75, 1.0]);
        assert_eq!(timeline.total_duration(), TICKS_PER_BAR * 4);
    }

    #[test]
    fn roots_sit_in_octave_four_and_basses_in_two() {
        let key = KeySignature::c_major();
        let timeline = create_standard(key, TICKS_PER_BAR, Resolution::Bar);
        let first = timeline.get_at(0);
        assert_eq!(first.chord.root_pitch, 60);
        assert_eq!(first.bass_pitch, 48);
    }

    #[test]
    fn final_event_truncates_to_duration() {
        let key = KeySignature::c_major();
        let timeline = create_standard(key, TICKS_PER_BEAT * 5, Resolution::Bar);
        assert_eq!(timeline.total_duration(), TICKS_PER_BEAT * 5);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn section_resolution_divides_span_by_template_length() {
        let key = KeySignature::c_major();
        let timeline =
            create_standard(key, TICKS_PER_BAR * 8, Resolution::Section);
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.events()[1].tick, TICKS_PER_BAR * 2);
    }

    #[test]
    fn perfect_cadence_rewrites_the_tail() {
        let key = KeySignature::new(PitchClass::G, true);
        let mut timeline =
            create_progression(key, TICKS_PER_BAR * 4, Resolution::Bar, ProgressionKind::Basic);
        apply_cadence(&mut timeline, CadenceKind::Perfect, key);
        let events = timeline.events();
        assert_eq!(events[2].chord.quality, ChordQuality::Dominant7);
        assert_eq!(events[3].chord.degree, ChordDegree::I);
    }

    #[test]
    fn picardy_third_raises_the_final_chord() {
        let key = KeySignature::new(PitchClass::D, true);
        let mut timeline =
            create_progression(key, TICKS_PER_BAR * 4, Resolution::Bar, ProgressionKind::Basic);
        assert_eq!(timeline.events()[3].chord.quality, ChordQuality::Minor);
        apply_cadence(&mut timeline, CadenceKind::PicardyThird, key);
        assert_eq!(timeline.events()[3].chord.quality, ChordQuality::Major);
    }

    #[test]
    fn borrowed_chord_progression_flattens_the_sixth() {
        let key = KeySignature::c_major();
        let timeline = create_progression(
            key,
            TICKS_PER_BAR * 5,
            Resolution::Bar,
            ProgressionKind::BorrowedChord,
        );
        let flat_six = timeline.events()[1].chord;
        assert_eq!(flat_six.root_pitch % 12, 8); // Ab in C major
        assert_eq!(flat_six.quality, ChordQuality::Major);
    }
}

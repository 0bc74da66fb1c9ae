//! score/bach-score/src/vocabulary.rs
//! Static melodic vocabulary: named figures, rhythm cells, and voice
//! profiles drawn from Bach reference works.
//!
//! Everything here is process-wide read-only data with `'static` lifetime.
//! Figures of equal duration share the ratio arrays in [`detail`].

/// Interval encoding mode for melodic figures.
///
/// Semitone mode encodes exact chromatic intervals (ornaments like the
/// mordent, where pitch identity matters). Degree mode encodes
/// scale-relative intervals as (degree_diff, chroma_offset) pairs, which
/// transpose to any key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalMode {
    Semitone,
    Degree,
}

/// Scale-degree-relative interval.
///
/// `degree_diff` is the directed interval including octaves (C4→D5 = +8,
/// E4→C4 = -2). `chroma_offset` adjusts for accidentals against the
/// diatonic scale: -1 flat, 0 natural, +1 sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeInterval {
    pub degree_diff: i8,
    pub chroma_offset: i8,
}

/// A named melodic figure.
///
/// The interval arrays are borrowed from static data; exactly one of them
/// is authoritative per `primary_mode`.
#[derive(Debug, Clone, Copy)]
pub struct MelodicFigure {
    pub name: &'static str,
    pub primary_mode: IntervalMode,
    /// False for ornaments, true for scale-derived patterns.
    pub allow_transposition: bool,
    pub semitone_intervals: Option<&'static [i8]>,
    pub degree_intervals: Option<&'static [DegreeInterval]>,
    /// Duration proportion of each note. Length = `note_count`.
    pub rhythm_ratios: &'static [f32],
    /// Onset position of each note. Length = `note_count`.
    pub onset_ratios: &'static [f32],
    pub note_count: u8,
    /// Source references, e.g. `BWV578:v1:b3`.
    pub provenance: &'static str,
}

/// A named rhythmic cell, independent of pitch content.
#[derive(Debug, Clone, Copy)]
pub struct RhythmCell {
    pub name: &'static str,
    /// Duration of each note in beats. Length = `note_count`.
    pub beat_ratios: &'static [f32],
    /// Onset within the beat (0.0-1.0). Length = `note_count`.
    pub onset_in_beat: &'static [f32],
    pub note_count: u8,
    pub total_beats: f32,
    pub provenance: &'static str,
}

/// Target interval distribution for a voice type. Statistical targets,
/// not hard constraints.
#[derive(Debug, Clone, Copy)]
pub struct VoiceIntervalProfile {
    pub name: &'static str,
    pub stepwise_ratio: f32,
    pub leap_ratio: f32,
    pub avg_interval: f32,
    pub max_leap: u8,
    pub provenance: &'static str,
}

/// Harmonic anchoring constraints for bass voices.
#[derive(Debug, Clone, Copy)]
pub struct BassHarmonicConstraint {
    pub harmonic_anchor_ratio: f32,
    pub chord_tone_ratio: f32,
    pub max_non_chord_beats: u8,
    pub provenance: &'static str,
}

mod detail {
    pub const EQ_R3: [f32; 3] = [1.0, 1.0, 1.0];
    pub const EQ_O3: [f32; 3] = [0.0, 1.0, 2.0];
    pub const EQ_R4: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const EQ_O4: [f32; 4] = [0.0, 1.0, 2.0, 3.0];
}

macro_rules! degree_figure {
    ($name:literal, $intervals:expr, $provenance:literal) => {
        MelodicFigure {
            name: $name,
            primary_mode: IntervalMode::Degree,
            allow_transposition: true,
            semitone_intervals: None,
            degree_intervals: Some($intervals),
            rhythm_ratios: &detail::EQ_R4,
            onset_ratios: &detail::EQ_O4,
            note_count: 4,
            provenance: $provenance,
        }
    };
}

const fn dg(degree_diff: i8, chroma_offset: i8) -> DegreeInterval {
    DegreeInterval { degree_diff, chroma_offset }
}

// Degree-mode figures (transposable); the most frequent shapes across the
// organ fugue / WTC / cello suite / Goldberg reference sets.
static DESC_RUN_4_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(-1, 0), dg(-1, 0)];
/// Descending scale run.
pub static DESC_RUN_4: MelodicFigure =
    degree_figure!("desc_run_4", &DESC_RUN_4_DG, "BWV574:upper:b33, BWV846f:upper:b3");

static ASC_RUN_4_DG: [DegreeInterval; 3] = [dg(1, 0), dg(1, 0), dg(1, 0)];
/// Ascending scale run.
pub static ASC_RUN_4: MelodicFigure =
    degree_figure!("asc_run_4", &ASC_RUN_4_DG, "BWV574:upper:b69, BWV1007_1:solo:b19");

static CAMBIATA_DOWN_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(-1, 0), dg(1, 0)];
/// Lower turn / cambiata.
pub static CAMBIATA_DOWN: MelodicFigure =
    degree_figure!("cambiata_down", &CAMBIATA_DOWN_DG, "BWV574:upper:b2, BWV846f:upper:b5");

static TURN_DOWN_DG: [DegreeInterval; 3] = [dg(1, 0), dg(-1, 0), dg(-1, 0)];
/// Upper escape then descend.
pub static TURN_DOWN: MelodicFigure =
    degree_figure!("turn_down", &TURN_DOWN_DG, "BWV574:upper:b7, BWV1007_1:solo:b5");

static LOWER_NBR_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(1, 0), dg(-1, 0)];
/// Lower neighbor oscillation.
pub static LOWER_NBR: MelodicFigure =
    degree_figure!("lower_nbr", &LOWER_NBR_DG, "BWV574:upper:b13, BWV846f:upper:b9");

static UPPER_NBR_DG: [DegreeInterval; 3] = [dg(1, 0), dg(-1, 0), dg(1, 0)];
/// Upper neighbor oscillation.
pub static UPPER_NBR: MelodicFigure =
    degree_figure!("upper_nbr", &UPPER_NBR_DG, "BWV574:upper:b42, BWV846f:upper:b3");

static TURN_UP_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(1, 0), dg(1, 0)];
/// Dip then ascend.
pub static TURN_UP: MelodicFigure =
    degree_figure!("turn_up", &TURN_UP_DG, "BWV574:upper:b11, BWV1007_1:solo:b11");

static ESCAPE_DOWN_DG: [DegreeInterval; 3] = [dg(1, 0), dg(1, 0), dg(-1, 0)];
/// Ascend then turn back.
pub static ESCAPE_DOWN: MelodicFigure =
    degree_figure!("escape_down", &ESCAPE_DOWN_DG, "BWV574:upper:b11, BWV1007_2:solo:b33");

static LEAP_UP_STEP_DOWN_DG: [DegreeInterval; 3] = [dg(2, 0), dg(-1, 0), dg(-1, 0)];
/// Leap a third up then step down.
pub static LEAP_UP_STEP_DOWN: MelodicFigure = degree_figure!(
    "leap_up_step_down",
    &LEAP_UP_STEP_DOWN_DG,
    "BWV574:upper:b2, BWV846f:lower:b5"
);

static STEP_DOWN_LEAP_UP_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(-1, 0), dg(2, 0)];
/// Step down twice then leap a third up.
pub static STEP_DOWN_LEAP_UP: MelodicFigure = degree_figure!(
    "step_down_leap_up",
    &STEP_DOWN_LEAP_UP_DG,
    "BWV574:upper:b14, BWV846f:upper:b4"
);

static STEP_UP_LEAP_DOWN_DG: [DegreeInterval; 3] = [dg(1, 0), dg(1, 0), dg(-2, 0)];
/// Step up twice then leap a third down.
pub static STEP_UP_LEAP_DOWN: MelodicFigure = degree_figure!(
    "step_up_leap_down",
    &STEP_UP_LEAP_DOWN_DG,
    "BWV846f:upper:b21, BWV988_01:upper:b2"
);

static ECHAPPEE_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(1, 0), dg(-2, 0)];
/// Échappée: neighbor then drop.
pub static ECHAPPEE: MelodicFigure =
    degree_figure!("echappee", &ECHAPPEE_DG, "BWV574:upper:b14, BWV1007_1:solo:b3");

static CAMBIATA_NBR_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(2, 0), dg(-1, 0)];
/// Cambiata neighbor: step-leap-step.
pub static CAMBIATA_NBR: MelodicFigure =
    degree_figure!("cambiata_nbr", &CAMBIATA_NBR_DG, "BWV574:upper:b33, BWV846f:upper:b14");

static LEAP_RECOVERY_DG: [DegreeInterval; 3] = [dg(1, 0), dg(-2, 0), dg(1, 0)];
/// Leap recovery: step-leap-step.
pub static LEAP_RECOVERY: MelodicFigure =
    degree_figure!("leap_recovery", &LEAP_RECOVERY_DG, "BWV574:lower:b26, BWV846f:lower:b8");

static CHROMATIC_DESC_DG: [DegreeInterval; 3] = [dg(-1, 0), dg(-1, 0), dg(-1, 1)];
/// Chromatic descent (lamento bass motif).
pub static CHROMATIC_DESC: MelodicFigure =
    degree_figure!("chromatic_desc", &CHROMATIC_DESC_DG, "BWV574:upper:b35, BWV1007_3:solo:b10");

static LEAP_DOWN_ASCEND_DG: [DegreeInterval; 3] = [dg(-2, 0), dg(1, 0), dg(1, 0)];
/// Leap a third down then ascend.
pub static LEAP_DOWN_ASCEND: MelodicFigure = degree_figure!(
    "leap_down_ascend",
    &LEAP_DOWN_ASCEND_DG,
    "BWV846f:lower:b8, BWV988_00:lower:b9"
);

// Semitone-mode ornaments (non-transposable).
static MORDENT_ST: [i8; 2] = [-1, 1];
/// Lower mordent.
pub static MORDENT: MelodicFigure = MelodicFigure {
    name: "mordent",
    primary_mode: IntervalMode::Semitone,
    allow_transposition: false,
    semitone_intervals: Some(&MORDENT_ST),
    degree_intervals: None,
    rhythm_ratios: &detail::EQ_R3,
    onset_ratios: &detail::EQ_O3,
    note_count: 3,
    provenance: "BWV574:upper:b3, BWV578:v1:b2",
};

static INV_MORDENT_ST: [i8; 2] = [1, -1];
/// Inverted mordent.
pub static INV_MORDENT: MelodicFigure = MelodicFigure {
    name: "inv_mordent",
    primary_mode: IntervalMode::Semitone,
    allow_transposition: false,
    semitone_intervals: Some(&INV_MORDENT_ST),
    degree_intervals: None,
    rhythm_ratios: &detail::EQ_R3,
    onset_ratios: &detail::EQ_O3,
    note_count: 3,
    provenance: "BWV574:upper:b3, BWV578:v1:b3",
};

static TRILL_3_ST: [i8; 3] = [1, -1, 1];
/// Trill fragment.
pub static TRILL_3: MelodicFigure = MelodicFigure {
    name: "trill_3",
    primary_mode: IntervalMode::Semitone,
    allow_transposition: false,
    semitone_intervals: Some(&TRILL_3_ST),
    degree_intervals: None,
    rhythm_ratios: &detail::EQ_R4,
    onset_ratios: &detail::EQ_O4,
    note_count: 4,
    provenance: "BWV574:upper:b3",
};

static INV_TRILL_3_ST: [i8; 3] = [-1, 1, -1];
/// Inverted trill fragment.
pub static INV_TRILL_3: MelodicFigure = MelodicFigure {
    name: "inv_trill_3",
    primary_mode: IntervalMode::Semitone,
    allow_transposition: false,
    semitone_intervals: Some(&INV_TRILL_3_ST),
    degree_intervals: None,
    rhythm_ratios: &detail::EQ_R4,
    onset_ratios: &detail::EQ_O4,
    note_count: 4,
    provenance: "BWV574:upper:b3",
};

/// The aggregate figure table used for matching and seeding.
pub static COMMON_FIGURES: [&MelodicFigure; 20] = [
    &DESC_RUN_4,
    &ASC_RUN_4,
    &CAMBIATA_DOWN,
    &TURN_DOWN,
    &LOWER_NBR,
    &UPPER_NBR,
    &TURN_UP,
    &ESCAPE_DOWN,
    &LEAP_UP_STEP_DOWN,
    &STEP_DOWN_LEAP_UP,
    &STEP_UP_LEAP_DOWN,
    &ECHAPPEE,
    &CAMBIATA_NBR,
    &LEAP_RECOVERY,
    &CHROMATIC_DESC,
    &LEAP_DOWN_ASCEND,
    &MORDENT,
    &INV_MORDENT,
    &TRILL_3,
    &INV_TRILL_3,
];

// Rhythm cells.
static RUNNING_16TH_R: [f32; 4] = [0.25, 0.25, 0.25, 0.25];
static RUNNING_16TH_O: [f32; 4] = [0.0, 0.25, 0.5, 0.75];
/// Running sixteenths — the top rhythm in every reference category.
pub static RUNNING_16TH: RhythmCell = RhythmCell {
    name: "running_16th",
    beat_ratios: &RUNNING_16TH_R,
    onset_in_beat: &RUNNING_16TH_O,
    note_count: 4,
    total_beats: 1.0,
    provenance: "all categories",
};

static RUNNING_8TH_R: [f32; 4] = [0.5, 0.5, 0.5, 0.5];
static RUNNING_8TH_O: [f32; 4] = [0.0, 0.5, 1.0, 1.5];
/// Running eighths.
pub static RUNNING_8TH: RhythmCell = RhythmCell {
    name: "running_8th",
    beat_ratios: &RUNNING_8TH_R,
    onset_in_beat: &RUNNING_8TH_O,
    note_count: 4,
    total_beats: 2.0,
    provenance: "all categories",
};

static RUNNING_QTR_R: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
static RUNNING_QTR_O: [f32; 4] = [0.0, 1.0, 2.0, 3.0];
/// Running quarters.
pub static RUNNING_QTR: RhythmCell = RhythmCell {
    name: "running_qtr",
    beat_ratios: &RUNNING_QTR_R,
    onset_in_beat: &RUNNING_QTR_O,
    note_count: 4,
    total_beats: 4.0,
    provenance: "all categories",
};

static LOMBARDIC_R: [f32; 4] = [0.25, 0.5, 0.25, 0.25];
static LOMBARDIC_O: [f32; 4] = [0.0, 0.25, 0.75, 1.0];
/// Lombardic snap: 16th-8th-16th-16th.
pub static LOMBARDIC: RhythmCell = RhythmCell {
    name: "lombardic",
    beat_ratios: &LOMBARDIC_R,
    onset_in_beat: &LOMBARDIC_O,
    note_count: 4,
    total_beats: 1.25,
    provenance: "all categories",
};

static DOTTED_PAIR_R: [f32; 4] = [0.5, 0.25, 0.25, 0.5];
static DOTTED_PAIR_O: [f32; 4] = [0.0, 0.5, 0.75, 1.0];
/// Dotted pair: 8th-16th-16th-8th.
pub static DOTTED_PAIR: RhythmCell = RhythmCell {
    name: "dotted_pair",
    beat_ratios: &DOTTED_PAIR_R,
    onset_in_beat: &DOTTED_PAIR_O,
    note_count: 4,
    total_beats: 1.5,
    provenance: "all categories",
};

static SHORT_LONG_R: [f32; 4] = [0.25, 0.25, 0.25, 0.5];
static SHORT_LONG_O: [f32; 4] = [0.0, 0.25, 0.5, 0.75];
/// Short-long: 16th-16th-16th-8th.
pub static SHORT_LONG: RhythmCell = RhythmCell {
    name: "short_long",
    beat_ratios: &SHORT_LONG_R,
    onset_in_beat: &SHORT_LONG_O,
    note_count: 4,
    total_beats: 1.25,
    provenance: "all categories",
};

static LONG_SHORT_R: [f32; 4] = [0.5, 0.25, 0.25, 0.25];
static LONG_SHORT_O: [f32; 4] = [0.0, 0.5, 0.75, 1.0];
/// Long-short: 8th-16th-16th-16th.
pub static LONG_SHORT: RhythmCell = RhythmCell {
    name: "long_short",
    beat_ratios: &LONG_SHORT_R,
    onset_in_beat: &LONG_SHORT_O,
    note_count: 4,
    total_beats: 1.25,
    provenance: "all categories",
};

static QTR_START_R: [f32; 4] = [1.0, 0.5, 0.5, 0.5];
static QTR_START_O: [f32; 4] = [0.0, 1.0, 1.5, 2.0];
/// Quarter start: qtr-8th-8th-8th.
pub static QTR_START: RhythmCell = RhythmCell {
    name: "qtr_start",
    beat_ratios: &QTR_START_R,
    onset_in_beat: &QTR_START_O,
    note_count: 4,
    total_beats: 2.5,
    provenance: "all categories",
};

/// The aggregate rhythm-cell table.
pub static COMMON_RHYTHMS: [&RhythmCell; 8] = [
    &RUNNING_16TH,
    &RUNNING_8TH,
    &RUNNING_QTR,
    &LOMBARDIC,
    &DOTTED_PAIR,
    &SHORT_LONG,
    &LONG_SHORT,
    &QTR_START,
];

/// Organ upper-voice profile.
pub static ORGAN_UPPER_PROFILE: VoiceIntervalProfile = VoiceIntervalProfile {
    name: "organ_upper",
    stepwise_ratio: 0.63,
    leap_ratio: 0.33,
    avg_interval: 2.75,
    max_leap: 12,
    provenance: "BWV578:v1-v3 avg",
};

/// Organ pedal profile.
pub static ORGAN_BASS_PROFILE: VoiceIntervalProfile = VoiceIntervalProfile {
    name: "organ_bass",
    stepwise_ratio: 0.44,
    leap_ratio: 0.52,
    avg_interval: 3.9,
    max_leap: 19,
    provenance: "BWV578:pedal",
};

/// Cello suite profile.
pub static CELLO_PROFILE: VoiceIntervalProfile = VoiceIntervalProfile {
    name: "cello_suite",
    stepwise_ratio: 0.55,
    leap_ratio: 0.38,
    avg_interval: 2.9,
    max_leap: 12,
    provenance: "BWV1007-1012 avg",
};

/// Well-Tempered Clavier book 1 profile.
pub static WTC_PROFILE: VoiceIntervalProfile = VoiceIntervalProfile {
    name: "wtc1",
    stepwise_ratio: 0.49,
    leap_ratio: 0.47,
    avg_interval: 3.4,
    max_leap: 12,
    provenance: "BWV846-869 avg",
};

/// Goldberg Variations profile.
pub static GOLDBERG_PROFILE: VoiceIntervalProfile = VoiceIntervalProfile {
    name: "goldberg",
    stepwise_ratio: 0.53,
    leap_ratio: 0.43,
    avg_interval: 3.2,
    max_leap: 12,
    provenance: "BWV988 avg",
};

/// The aggregate voice-profile table.
pub static VOICE_PROFILES: [&VoiceIntervalProfile; 5] = [
    &ORGAN_UPPER_PROFILE,
    &ORGAN_BASS_PROFILE,
    &CELLO_PROFILE,
    &WTC_PROFILE,
    &GOLDBERG_PROFILE,
];

/// Bass anchoring target from the BWV 578 pedal analysis.
pub static ORGAN_PEDAL_CONSTRAINT: BassHarmonicConstraint = BassHarmonicConstraint {
    harmonic_anchor_ratio: 0.65,
    chord_tone_ratio: 0.85,
    max_non_chord_beats: 2,
    provenance: "BWV578:pedal",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_arrays_match_note_counts() {
        for figure in COMMON_FIGURES {
            let interval_len = usize::from(figure.note_count) - 1;
            match figure.primary_mode {
                IntervalMode::Semitone => {
                    let st = figure.semitone_intervals.unwrap();
                    assert_eq!(st.len(), interval_len, "{}", figure.name);
                }
                IntervalMode::Degree => {
                    let dg = figure.degree_intervals.unwrap();
                    assert_eq!(dg.len(), interval_len, "{}", figure.name);
                }
            }
            assert_eq!(figure.rhythm_ratios.len(), usize::from(figure.note_count));
            assert_eq!(figure.onset_ratios.len(), usize::from(figure.note_count));
        }
    }

    #[test]
    fn ornaments_are_not_transposable() {
        assert!(!MORDENT.allow_transposition);
        assert!(!TRILL_3.allow_transposition);
        assert!(DESC_RUN_4.allow_transposition);
    }

    #[test]
    fn rhythm_cells_sum_to_their_total() {
        for cell in COMMON_RHYTHMS {
            let sum: f32 = cell.beat_ratios.iter().sum();
            assert!((sum - cell.total_beats).abs() < 1e-6, "{}", cell.name);
        }
    }
}

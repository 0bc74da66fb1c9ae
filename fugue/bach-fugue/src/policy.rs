//! fugue/bach-fugue/src/policy.rs
//! Archetype policies: structural strategy constraints for subjects.

use crate::subject::SubjectCharacter;

/// Structural strategy for a fugue subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FugueArchetype {
    /// Short, fragment-driven subjects built for sequence work.
    Compact,
    /// Long-breathed singing subjects.
    Cantabile,
    /// Subjects engineered for double counterpoint.
    Invertible,
    /// Chromatically inflected subjects with functional resolution.
    Chromatic,
}

/// Recommended answer type for an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Decide from the subject's opening degrees.
    Auto,
    /// Exact transposition to the dominant.
    Real,
    /// Opening adjusted to keep the tonic-dominant axis.
    Tonal,
}

/// Immutable constraints and scoring weights for one archetype.
#[derive(Debug, Clone, Copy)]
pub struct ArchetypePolicy {
    pub min_range_degrees: i32,
    pub max_range_degrees: i32,
    pub min_subject_bars: u8,
    pub max_subject_bars: u8,
    pub min_climax_position: f32,
    pub max_climax_position: f32,
    pub min_climax_pitch: f32,
    pub max_climax_pitch: f32,
    pub dominant_ending_prob: f32,
    pub preferred_answer: AnswerKind,
    pub min_anacrusis_prob: f32,
    pub max_anacrusis_prob: f32,

    // Compact: fragmentability.
    pub require_fragmentable: bool,
    pub fragment_reusability_weight: f32,
    pub sequence_potential_weight: f32,

    // Cantabile: melodic flow.
    pub max_sixteenth_density: f32,
    pub min_step_ratio: f32,

    // Invertible: symmetry.
    pub require_invertible: bool,
    pub require_contour_symmetry: bool,
    pub require_axis_stability: bool,
    pub symmetry_score_weight: f32,

    // Chromatic: functional harmony.
    pub max_consecutive_chromatic: u32,
    pub require_functional_resolution: bool,

    /// Candidate paths enumerated per subject.
    pub path_candidates: u32,
    pub base_quality_weight: f32,
}

static COMPACT: ArchetypePolicy = ArchetypePolicy {
    min_range_degrees: 3,
    max_range_degrees: 7,
    min_subject_bars: 1,
    max_subject_bars: 2,
    min_climax_position: 0.50,
    max_climax_position: 0.80,
    min_climax_pitch: 0.70,
    max_climax_pitch: 1.00,
    dominant_ending_prob: 0.80,
    preferred_answer: AnswerKind::Auto,
    min_anacrusis_prob: 0.10,
    max_anacrusis_prob: 0.40,
    require_fragmentable: true,
    fragment_reusability_weight: 0.3,
    sequence_potential_weight: 0.2,
    max_sixteenth_density: 0.5,
    min_step_ratio: 0.4,
    require_invertible: false,
    require_contour_symmetry: false,
    require_axis_stability: false,
    symmetry_score_weight: 0.0,
    max_consecutive_chromatic: 2,
    require_functional_resolution: false,
    path_candidates: 6,
    base_quality_weight: 0.60,
};

static CANTABILE: ArchetypePolicy = ArchetypePolicy {
    min_range_degrees: 5,
    max_range_degrees: 9,
    min_subject_bars: 2,
    max_subject_bars: 4,
    min_climax_position: 0.40,
    max_climax_position: 0.70,
    min_climax_pitch: 0.60,
    max_climax_pitch: 0.95,
    dominant_ending_prob: 0.60,
    preferred_answer: AnswerKind::Auto,
    min_anacrusis_prob: 0.40,
    max_anacrusis_prob: 0.80,
    require_fragmentable: false,
    fragment_reusability_weight: 0.0,
    sequence_potential_weight: 0.0,
    max_sixteenth_density: 0.40,
    min_step_ratio: 0.6,
    require_invertible: false,
    require_contour_symmetry: false,
    require_axis_stability: false,
    symmetry_score_weight: 0.0,
    max_consecutive_chromatic: 2,
    require_functional_resolution: false,
    path_candidates: 8,
    base_quality_weight: 0.75,
};

static INVERTIBLE: ArchetypePolicy = ArchetypePolicy {
    min_range_degrees: 4,
    max_range_degrees: 7,
    min_subject_bars: 2,
    max_subject_bars: 3,
    min_climax_position: 0.40,
    max_climax_position: 0.80,
    min_climax_pitch: 0.65,
    max_climax_pitch: 0.95,
    dominant_ending_prob: 0.70,
    preferred_answer: AnswerKind::Real,
    min_anacrusis_prob: 0.20,
    max_anacrusis_prob: 0.50,
    require_fragmentable: false,
    fragment_reusability_weight: 0.0,
    sequence_potential_weight: 0.1,
    max_sixteenth_density: 0.3,
    min_step_ratio: 0.5,
    require_invertible: true,
    require_contour_symmetry: true,
    require_axis_stability: true,
    symmetry_score_weight: 0.4,
    max_consecutive_chromatic: 2,
    require_functional_resolution: false,
    path_candidates: 12,
    base_quality_weight: 0.50,
};

static CHROMATIC: ArchetypePolicy = ArchetypePolicy {
    min_range_degrees: 4,
    max_range_degrees: 8,
    min_subject_bars: 2,
    max_subject_bars: 4,
    min_climax_position: 0.50,
    max_climax_position: 0.90,
    min_climax_pitch: 0.60,
    max_climax_pitch: 1.00,
    dominant_ending_prob: 0.55,
    preferred_answer: AnswerKind::Real,
    min_anacrusis_prob: 0.30,
    max_anacrusis_prob: 0.60,
    require_fragmentable: false,
    fragment_reusability_weight: 0.0,
    sequence_potential_weight: 0.0,
    max_sixteenth_density: 0.2,
    min_step_ratio: 0.4,
    require_invertible: false,
    require_contour_symmetry: false,
    require_axis_stability: false,
    symmetry_score_weight: 0.0,
    max_consecutive_chromatic: 4,
    require_functional_resolution: true,
    path_candidates: 10,
    base_quality_weight: 0.60,
};

/// The immutable policy for an archetype.
#[must_use]
pub fn archetype_policy(archetype: FugueArchetype) -> &'static ArchetypePolicy {
    match archetype {
        FugueArchetype::Compact => &COMPACT,
        FugueArchetype::Cantabile => &CANTABILE,
        FugueArchetype::Invertible => &INVERTIBLE,
        FugueArchetype::Chromatic => &CHROMATIC,
    }
}

/// Default archetype for a character.
#[must_use]
pub fn archetype_for_character(character: SubjectCharacter) -> FugueArchetype {
    match character {
        SubjectCharacter::Severe => FugueArchetype::Invertible,
        SubjectCharacter::Playful => FugueArchetype::Compact,
        SubjectCharacter::Noble => FugueArchetype::Cantabile,
        SubjectCharacter::Restless => FugueArchetype::Chromatic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_windows_are_ordered() {
        for archetype in [
            FugueArchetype::Compact,
            FugueArchetype::Cantabile,
            FugueArchetype::Invertible,
            FugueArchetype::Chromatic,
        ] {
            let policy = archetype_policy(archetype);
            assert!(policy.min_range_degrees <= policy.max_range_degrees);
            assert!(policy.min_subject_bars <= policy.max_subject_bars);
            assert!(policy.min_climax_position <= policy.max_climax_position);
            assert!(policy.min_climax_pitch <= policy.max_climax_pitch);
            assert!(policy.min_anacrusis_prob <= policy.max_anacrusis_prob);
            assert!(policy.path_candidates >= 6 && policy.path_candidates <= 12);
        }
    }

    #[test]
    fn invertible_demands_symmetry() {
        let policy = archetype_policy(FugueArchetype::Invertible);
        assert!(policy.require_invertible);
        assert!(policy.require_contour_symmetry);
        assert!(policy.require_axis_stability);
        assert_eq!(policy.preferred_answer, AnswerKind::Real);
    }

    #[test]
    fn every_character_maps_to_an_archetype() {
        use crate::subject::SubjectCharacter as C;
        assert_eq!(archetype_for_character(C::Noble), FugueArchetype::Cantabile);
        assert_eq!(archetype_for_character(C::Restless), FugueArchetype::Chromatic);
    }
}

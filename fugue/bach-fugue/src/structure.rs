//! fugue/bach-fugue/src/structure.rs
//! Fugue section layout: typed sections with phase-monotonic ordering.

use bach_theory::pitch::KeySignature;
use bach_time::Tick;

/// Section type within a fugue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Exposition,
    Episode,
    MiddleEntry,
    Stretto,
    Coda,
}

impl SectionType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exposition => "Exposition",
            Self::Episode => "Episode",
            Self::MiddleEntry => "MiddleEntry",
            Self::Stretto => "Stretto",
            Self::Coda => "Coda",
        }
    }
}

/// Dramatic phase of a fugue; sections may never regress to an earlier
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FuguePhase {
    Establish,
    Develop,
    Intensify,
    Resolve,
}

impl FuguePhase {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Establish => "Establish",
            Self::Develop => "Develop",
            Self::Intensify => "Intensify",
            Self::Resolve => "Resolve",
        }
    }
}

/// One section of the fugue plan.
#[derive(Debug, Clone, Copy)]
pub struct FugueSection {
    pub section_type: SectionType,
    pub phase: FuguePhase,
    pub start_tick: Tick,
    pub end_tick: Tick,
    pub key: KeySignature,
}

impl FugueSection {
    #[must_use]
    pub fn duration_ticks(&self) -> Tick {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// The full section plan of a fugue.
#[derive(Debug, Clone, Default)]
pub struct FugueStructure {
    pub sections: Vec<FugueSection>,
}

impl FugueStructure {
    /// Append a section; fails (returns false) if the phase would regress.
    pub fn add_section(
        &mut self,
        section_type: SectionType,
        phase: FuguePhase,
        start_tick: Tick,
        end_tick: Tick,
        key: KeySignature,
    ) -> bool {
        if let Some(last) = self.sections.last() {
            if phase < last.phase {
                return false;
            }
        }
        self.sections.push(FugueSection { section_type, phase, start_tick, end_tick, key });
        true
    }

    /// End of the last section, or 0 when empty.
    #[must_use]
    pub fn total_duration_ticks(&self) -> Tick {
        self.sections.last().map_or(0, |section| section.end_tick)
    }

    /// All sections in a given phase.
    #[must_use]
    pub fn sections_by_phase(&self, phase: FuguePhase) -> Vec<FugueSection> {
        self.sections.iter().copied().filter(|s| s.phase == phase).collect()
    }

    /// All sections of a given type.
    #[must_use]
    pub fn sections_by_type(&self, section_type: SectionType) -> Vec<FugueSection> {
        self.sections.iter().copied().filter(|s| s.section_type == section_type).collect()
    }

    /// Structural rule violations, empty when the plan is sound.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let Some(first) = self.sections.first() else {
            violations.push("structure is empty: no sections defined".to_owned());
            return violations;
        };

        if first.section_type != SectionType::Exposition {
            violations
                .push(format!("first section must be Exposition, got {}", first.section_type.name()));
        }
        if first.phase != FuguePhase::Establish {
            violations.push(format!(
                "first section must be in Establish phase, got {}",
                first.phase.name()
            ));
        }

        for idx in 1..self.sections.len() {
            if self.sections[idx].phase < self.sections[idx - 1].phase {
                violations.push(format!(
                    "phase regression at section {idx}: {} after {}",
                    self.sections[idx].phase.name(),
                    self.sections[idx - 1].phase.name()
                ));
            }
        }

        for (idx, section) in self.sections.iter().enumerate() {
            if section.end_tick < section.start_tick {
                violations.push(format!(
                    "section {idx} has negative duration (start={}, end={})",
                    section.start_tick, section.end_tick
                ));
            }
            if idx > 0 && section.start_tick < self.sections[idx - 1].end_tick {
                violations.push(format!(
                    "section {idx} starts before previous section ends (start={}, prev_end={})",
                    section.start_tick,
                    self.sections[idx - 1].end_tick
                ));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_time::TICKS_PER_BAR;

    fn key() -> KeySignature {
        KeySignature::c_major()
    }

    #[test]
    fn phases_may_not_regress() {
        let mut structure = FugueStructure::default();
        assert!(structure.add_section(
            SectionType::Exposition,
            FuguePhase::Establish,
            0,
            TICKS_PER_BAR * 8,
            key()
        ));
        assert!(structure.add_section(
            SectionType::Episode,
            FuguePhase::Develop,
            TICKS_PER_BAR * 8,
            TICKS_PER_BAR * 12,
            key()
        ));
        assert!(!structure.add_section(
            SectionType::Episode,
            FuguePhase::Establish,
            TICKS_PER_BAR * 12,
            TICKS_PER_BAR * 16,
            key()
        ));
        assert_eq!(structure.sections.len(), 2);
    }

    #[test]
    fn valid_plan_passes_validation() {
        let mut structure = FugueStructure::default();
        structure.add_section(SectionType::Exposition, FuguePhase::Establish, 0, 7680, key());
        structure.add_section(SectionType::Episode, FuguePhase::Develop, 7680, 11520, key());
        structure.add_section(SectionType::MiddleEntry, FuguePhase::Develop, 11520, 15360, key());
        structure.add_section(SectionType::Coda, FuguePhase::Resolve, 15360, 19200, key());
        assert!(structure.validate().is_empty());
        assert_eq!(structure.total_duration_ticks(), 19200);
        assert_eq!(structure.sections_by_phase(FuguePhase::Develop).len(), 2);
        assert_eq!(structure.sections_by_type(SectionType::Coda).len(), 1);
    }

    #[test]
    fn bad_first_section_is_flagged() {
        let mut structure = FugueStructure::default();
        structure.add_section(SectionType::Episode, FuguePhase::Establish, 0, 1920, key());
        let violations = structure.validate();
        assert!(violations.iter().any(|v| v.contains("Exposition")));
    }

    #[test]
    fn overlapping_sections_are_flagged() {
        let mut structure = FugueStructure::default();
        structure.add_section(SectionType::Exposition, FuguePhase::Establish, 0, 7680, key());
        structure.add_section(SectionType::Episode, FuguePhase::Develop, 3840, 11520, key());
        let violations = structure.validate();
        assert!(violations.iter().any(|v| v.contains("starts before")));
    }
}

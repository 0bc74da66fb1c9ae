//! fugue/bach-fugue/src/obligation.rs
//! Obligation taxonomy and the subject constraint profile.
//!
//! Obligations are future resolution demands a subject's notes generate.
//! Debts must resolve within a deadline; gates are instantaneous filters
//! that never accumulate; invariant-recovery nodes are injected when a
//! soft voice-leading invariant breaks and cost score on expiry.

use bach_time::Tick;

/// Types of obligations extracted from a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObligationKind {
    /// Leading tone → half-step upward resolution.
    LeadingTone,
    /// Seventh (degree 4 acting as 7th of V) → stepwise downward resolution.
    Seventh,
    /// Leap of a P4 or more → contrary stepwise motion.
    LeapResolve,
    /// Subject not ending stable → convergence to a stable degree.
    CadenceStable,
    /// Final notes should approach tonic or dominant stepwise.
    CadenceApproach,
    /// Voice must begin the subject at a specific tick.
    ImitationEntry,
    /// Minimum inter-subject distance in stretto.
    ImitationDistance,
    /// Strong beat → chord-tone gate (not a debt).
    StrongBeatHarm,
    /// Recovery demand after a soft invariant violation.
    InvariantRecovery,
}

impl ObligationKind {
    /// Stable name for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LeadingTone => "LeadingTone",
            Self::Seventh => "Seventh",
            Self::LeapResolve => "LeapResolve",
            Self::CadenceStable => "CadenceStable",
            Self::CadenceApproach => "CadenceApproach",
            Self::ImitationEntry => "ImitationEntry",
            Self::ImitationDistance => "ImitationDistance",
            Self::StrongBeatHarm => "StrongBeatHarm",
            Self::InvariantRecovery => "InvariantRecovery",
        }
    }
}

/// Obligation strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationStrength {
    /// Violation is a structural failure.
    Structural,
    /// Violation is a score penalty only.
    Soft,
}

/// A single obligation with temporal extent.
#[derive(Debug, Clone)]
pub struct ObligationNode {
    /// Unique id within the profile.
    pub id: u16,
    pub kind: ObligationKind,
    /// Tick of the note that spawned this obligation.
    pub origin: Tick,
    /// Earliest tick at which resolution may occur.
    pub start_tick: Tick,
    /// Resolution deadline (inclusive).
    pub deadline: Tick,
    /// +1 up, -1 down, 0 any.
    pub direction: i8,
    /// Bit per voice; 0 = unassigned.
    pub voice_mask: u8,
    pub strength: ObligationStrength,
    /// Required resolution interval (leading tone +1, seventh -1).
    pub required_interval_semitones: i8,
    pub require_strong_beat: bool,
    /// Ids of obligations that cannot co-resolve.
    pub conflicts: Vec<u16>,
    /// Ids whose resolution this obligation's resolution also satisfies.
    pub satisfies: Vec<u16>,
}

impl ObligationNode {
    /// A node with the given kind and window; remaining fields neutral.
    #[must_use]
    pub fn new(id: u16, kind: ObligationKind, origin: Tick, start_tick: Tick, deadline: Tick) -> Self {
        Self {
            id,
            kind,
            origin,
            start_tick,
            deadline,
            direction: 0,
            voice_mask: 0,
            strength: ObligationStrength::Structural,
            required_interval_semitones: 0,
            require_strong_beat: false,
            conflicts: Vec::new(),
            satisfies: Vec::new(),
        }
    }

    /// Whether this obligation counts toward debt density.
    #[must_use]
    pub fn is_debt(&self) -> bool {
        !matches!(self.kind, ObligationKind::StrongBeatHarm | ObligationKind::InvariantRecovery)
    }

    /// Whether the obligation is active at a tick.
    #[must_use]
    pub fn is_active_at(&self, tick: Tick) -> bool {
        tick >= self.start_tick && tick <= self.deadline
    }
}

/// Implied harmony from a melodic window: directional guidance, never
/// promoted to an obligation.
#[derive(Debug, Clone, Copy)]
pub struct HarmonicImpulse {
    pub tick: Tick,
    /// 1-7 scale degree of the implied triad root.
    pub implied_degree: u8,
    /// Implication confidence in `[0, 1]`.
    pub strength: f32,
    /// +1 dominant direction, -1 subdominant, 0 tonic/return.
    pub directional_tendency: i8,
    /// Harmonic tension in `[0, 1]`.
    pub tension: f32,
}

/// Pitch envelope of the subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterArc {
    pub opening_pitch: u8,
    pub peak_pitch: u8,
    pub closing_pitch: u8,
    /// Climax position as a ratio of subject length.
    pub peak_position: f32,
    /// +1 ascending, -1 descending, 0 return type.
    pub overall_direction: i8,
}

/// Strong-beat and long-note weight distribution across subject thirds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccentContour {
    pub front_weight: f32,
    pub mid_weight: f32,
    pub tail_weight: f32,
    pub syncopation_ratio: f32,
}

/// Stretto feasibility for one (offset, voice-count) configuration.
#[derive(Debug, Clone, Copy)]
pub struct StrettoEntry {
    pub offset_ticks: Tick,
    pub num_voices: u8,
    /// Peak excess debt beyond the independent single-voice baseline.
    pub peak_obligation: f32,
    /// Parallel-perfect risk proxy in `[0, 1]`.
    pub vertical_clash: f32,
    /// Simultaneous accent ratio in `[0, 1]`.
    pub rhythmic_interference: f32,
    /// Register intersection estimate in `[0, 1]`.
    pub register_overlap: f32,
    /// Accent-peak coincidence in `[0, 1]`.
    pub perceptual_overlap: f32,
    /// Cadence-window vs development conflict in `[0, 1]`.
    pub cadence_conflict: f32,
}

impl StrettoEntry {
    /// Practical feasibility threshold.
    pub const MIN_FEASIBLE: f32 = 0.5;

    /// Composite feasibility: geometric mean of the five normalized
    /// dimensions, with weakest-link dominance — if any dimension drops
    /// below 0.2 the composite IS that dimension.
    #[must_use]
    pub fn feasibility_score(&self) -> f32 {
        let norm_peak = 1.0 - (self.peak_obligation / 4.0).min(1.0);
        let norm_clash = 1.0 - self.vertical_clash;
        let norm_register = 1.0 - self.register_overlap;
        let norm_percept = 1.0 - self.perceptual_overlap;
        let norm_cadence = 1.0 - self.cadence_conflict;

        let floor = norm_peak
            .min(norm_clash)
            .min(norm_register)
            .min(norm_percept)
            .min(norm_cadence);
        if floor < 0.2 {
            return floor;
        }

        let product = norm_peak * norm_clash * norm_register * norm_percept * norm_cadence;
        product.powf(1.0 / 5.0)
    }
}

/// Complete constraint profile extracted from one subject.
#[derive(Debug, Clone, Default)]
pub struct SubjectProfile {
    pub obligations: Vec<ObligationNode>,

    /// Max simultaneous active debt at any sampled tick.
    pub peak_density: f32,
    /// Time-weighted mean active debt.
    pub avg_density: f32,
    /// Fraction of debt-carrying ticks that also carry a gate.
    pub synchronous_pressure: f32,

    /// Subject starts on tonic or dominant.
    pub tonal_answer_feasible: bool,
    /// Range fits within an octave.
    pub invertible_octave: bool,
    /// Ratio of cadence obligations among all obligations.
    pub cadence_gravity: f32,

    pub harmonic_impulses: Vec<HarmonicImpulse>,
    pub register_arc: RegisterArc,
    pub accent_contour: AccentContour,
    pub stretto_matrix: Vec<StrettoEntry>,
}

impl SubjectProfile {
    /// Quick feasibility check from density metrics.
    #[must_use]
    pub fn feasible_for(&self, num_voices: u8) -> bool {
        self.peak_density <= f32::from(num_voices) - 1.0 && self.synchronous_pressure < 0.6
    }

    /// Smallest stretto offset whose composite clears the threshold for
    /// the given voice count.
    #[must_use]
    pub fn min_safe_stretto_offset(&self, num_voices: u8) -> Option<Tick> {
        self.stretto_matrix
            .iter()
            .filter(|entry| entry.num_voices == num_voices)
            .filter(|entry| entry.feasibility_score() >= StrettoEntry::MIN_FEASIBLE)
            .map(|entry| entry.offset_ticks)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_are_not_debts() {
        let debt = ObligationNode::new(0, ObligationKind::LeadingTone, 0, 0, 960);
        let gate = ObligationNode::new(1, ObligationKind::StrongBeatHarm, 0, 0, 0);
        let recovery = ObligationNode::new(2, ObligationKind::InvariantRecovery, 0, 0, 960);
        assert!(debt.is_debt());
        assert!(!gate.is_debt());
        assert!(!recovery.is_debt());
    }

    #[test]
    fn activity_window_is_inclusive() {
        let node = ObligationNode::new(0, ObligationKind::Seventh, 0, 480, 1440);
        assert!(!node.is_active_at(479));
        assert!(node.is_active_at(480));
        assert!(node.is_active_at(1440));
        assert!(!node.is_active_at(1441));
    }

    #[test]
    fn floor_guard_short_circuits_the_geometric_mean() {
        let mut entry = StrettoEntry {
            offset_ticks: 480,
            num_voices: 2,
            peak_obligation: 0.0,
            vertical_clash: 0.0,
            rhythmic_interference: 0.0,
            register_overlap: 0.0,
            perceptual_overlap: 0.0,
            cadence_conflict: 0.0,
        };
        assert!((entry.feasibility_score() - 1.0).abs() < 1e-6);

        entry.vertical_clash = 0.9; // normalized 0.1 < floor 0.2
        assert!((entry.feasibility_score() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn feasibility_is_bounded() {
        let entry = StrettoEntry {
            offset_ticks: 480,
            num_voices: 3,
            peak_obligation: 2.0,
            vertical_clash: 0.4,
            rhythmic_interference: 0.3,
            register_overlap: 0.5,
            perceptual_overlap: 0.3,
            cadence_conflict: 0.2,
        };
        let score = entry.feasibility_score();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn density_gate_for_voice_counts() {
        let profile = SubjectProfile {
            peak_density: 2.0,
            synchronous_pressure: 0.4,
            ..SubjectProfile::default()
        };
        assert!(profile.feasible_for(3));
        assert!(!profile.feasible_for(2));
    }
}

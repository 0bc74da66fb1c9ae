//! fugue/bach-fugue/src/lib.rs
//! Constraint-driven subject and voice generation.
//!
//! A subject is analyzed into an obligation profile (resolution debts,
//! gates, lateral dynamics, and a stretto feasibility matrix); candidate
//! subjects are enumerated from motif templates under archetype and
//! character policies and the best survivor of the hard gate wins.

pub mod analyzer;
pub mod answer;
pub mod motif;
pub mod obligation;
pub mod params;
pub mod policy;
pub mod scorer;
pub mod structure;
pub mod subject;

pub use analyzer::analyze_obligations;
pub use obligation::{
    AccentContour, HarmonicImpulse, ObligationKind, ObligationNode, ObligationStrength,
    RegisterArc, StrettoEntry, SubjectProfile,
};
pub use policy::{ArchetypePolicy, FugueArchetype, archetype_policy};
pub use subject::{Subject, SubjectCharacter, SubjectGenerator, SubjectRequest, VoiceGrid};

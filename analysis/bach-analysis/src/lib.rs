//! analysis/bach-analysis/src/lib.rs
//! Post-hoc analysis of generated pieces: the four-phase dissonance
//! detector, counterpoint metrics, and the fail report the pipeline
//! accumulates diagnostics into.

pub mod dissonance;
pub mod metrics;
pub mod report;

pub use dissonance::{
    DissonanceEvent, DissonanceKind, DissonanceResult, DissonanceSeverity,
    analyze_organ_dissonance, analyze_solo_string_dissonance,
};
pub use metrics::{CounterpointMetrics, compute_counterpoint_metrics};
pub use report::{FailIssue, FailKind, FailReport, FailSeverity, FailSummary};

//! score/bach-score/src/lib.rs
//! Score material shared by every generator: note events with provenance
//! tags, voice tracks, and the static melodic vocabulary with figure
//! matching.

pub mod event;
pub mod figure;
pub mod vocabulary;

pub use event::{NoteEvent, NoteSource, Track};
pub use figure::{find_best_figure, match_figure, realize_figure};
pub use vocabulary::{
    COMMON_FIGURES, COMMON_RHYTHMS, DegreeInterval, IntervalMode, MelodicFigure, RhythmCell,
    VOICE_PROFILES, VoiceIntervalProfile,
};

//! counterpoint/bach-counterpoint/src/lib.rs
//! Generation-time counterpoint: the vertical safety check every candidate
//! pitch must pass, melodic voice-leading quality, and the per-tick
//! coordination pass that merges heterogeneous note sources into a
//! consistent multi-voice texture.

pub mod coordinate;
pub mod melodic;
pub mod vertical;

pub use coordinate::{
    CoordinationConfig, CoordinationResult, DropReason, DroppedNote, coordinate_voices,
};
pub use melodic::{MelodicContext, PhraseGoal};
pub use vertical::{VerticalContext, WeakBeatAllow};

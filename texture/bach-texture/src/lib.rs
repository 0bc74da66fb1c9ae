//! texture/bach-texture/src/lib.rs
//! Idiomatic figuration over a harmonic timeline: single lines, implied
//! polyphony, chord rolls, arpeggios, scale passages, and bariolage.

pub mod context;
pub mod generate;
pub mod rhythm;

pub use context::{TextureContext, TextureKind};
pub use generate::generate_texture;
pub use rhythm::{RhythmProfile, subdivisions};

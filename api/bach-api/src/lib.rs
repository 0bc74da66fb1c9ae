//! api/bach-api/src/lib.rs
//! The host-facing configuration surface: a flat record validated into
//! typed generation inputs. Errors are returned, never thrown across the
//! boundary.

pub mod config;

pub use config::{
    Character, ConfigError, DurationScale, Form, GenerateConfig, Instrument, ValidatedConfig,
};

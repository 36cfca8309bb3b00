//! # abridge-analysis
//!
//! Lexical analysis over a novel's chapter corpus. Every feature is a
//! pure function from chapter text (plus upstream artifacts) to a JSON
//! artifact; nothing here calls an LLM.
//!
//! - **Source**: [`source::select_source`] picks raw or condensed chapters
//! - **Names**: [`names::build_character_index`] surface-level name index
//! - **Salience**: [`salience::build_salience_index`] character ranking
//! - **Relationships**: [`relationships::build_relationship_matrix`]
//! - **Keywords**: [`keywords::build_event_keyword_map`] dictionary scan
//! - **Resolution**: [`resolver`] rule-driven genre and tag confidence
//! - **Pipeline**: [`pipeline::run_analysis`] with per-feature skip flags

#![deny(unsafe_code)]

pub mod artifacts;
pub mod dict;
pub mod error;
pub mod keywords;
pub mod names;
pub mod pipeline;
pub mod relationships;
pub mod resolver;
pub mod salience;
pub mod source;

pub use error::AnalysisError;
pub use pipeline::{run_analysis, AnalysisFlags, AnalysisReport};
pub use source::SourcePreference;

/// Reported scores are rounded to four decimal places so artifacts stay
/// diffable across runs.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

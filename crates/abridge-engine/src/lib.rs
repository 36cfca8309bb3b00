//! # abridge-engine
//!
//! The hierarchical, resumable, budget-aware reduction engine and the
//! stage orchestrators built on it.
//!
//! - **Reduction**: [`reduce::Reducer`] condenses an ordered unit
//!   sequence until it fits the input budget, grouping positionally
//! - **Resume**: [`resume::condense_missing`] maps a stage over its
//!   units idempotently, persisting each output as it completes
//! - **Splitting**: [`split::plan_chunks`] and [`split::Manifest`] keep
//!   single-call output under the output budget by splitting first
//! - **Stages**: [`stages`] wires chapters, arcs, and the novel together
//! - **Pipeline**: [`pipeline::run_pipeline`] with explicit skip flags

#![deny(unsafe_code)]

pub mod error;
pub mod layout;
pub mod pipeline;
pub mod reduce;
pub mod resume;
pub mod split;
pub mod stages;

pub use error::EngineError;
pub use layout::DataLayout;
pub use pipeline::{run_pipeline, SkipFlags};
pub use reduce::Reducer;
pub use stages::DEFAULT_CHAPTERS_PER_ARC;

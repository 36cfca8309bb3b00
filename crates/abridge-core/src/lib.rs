//! # abridge-core
//!
//! Shared vocabulary for the condensation pipeline.
//!
//! - **Units**: [`unit::Unit`] and [`unit::UnitId`], the ordered text blobs every stage operates on
//! - **Stages**: [`stage::Stage`] and [`stage::Layer`] for the reduction hierarchy
//! - **Grouping**: [`group::compute_groups`], positional and contiguous
//! - **Budgets**: [`budget::Budget`], input/output token ceilings
//! - **Ports**: [`compressor::Compressor`], [`estimator::TokenEstimator`], [`observer::CondenseObserver`]
//! - **Errors**: [`errors::CompressError`] with the transient/fatal split
//!
//! Foundation crate. Depended on by all other abridge crates.

#![deny(unsafe_code)]

pub mod budget;
pub mod compressor;
pub mod errors;
pub mod estimator;
pub mod group;
pub mod observer;
pub mod stage;
pub mod unit;

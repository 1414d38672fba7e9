//! examprep-core: answer normalization, grading and exam sessions.
//!
//! This crate defines the question model, the normalizer that turns the many
//! shapes of a raw correct answer into a canonical label set, the evaluator and
//! scoring aggregator built on it, and the study/exam sessions that drive them.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod import;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod shuffle;
pub mod timer;
pub mod view;

//! Quality-control overview of RNA-seq sample metadata.
//!
//! Loads a sample sheet, checks the `sample_id` / `condition` / `replicate`
//! columns, counts samples per condition, draws a bar chart and prints a
//! short summary. [`report::SampleQcReport`] drives the whole pass.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod report;

pub use config::QcConfig;
pub use report::{RunOutcome, SampleQcReport};

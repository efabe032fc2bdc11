//! dietrec: Diet Recommendation Library
//!
//! Cleans a patient dataset, ranks candidate attributes by information gain,
//! trains a random forest on the top-ranked subset and serves predictions
//! for single patient profiles.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod utils;

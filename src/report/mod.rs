//! Report module - summarizing training results

pub mod summary;
pub mod training_export;

pub use summary::*;
pub use training_export::*;

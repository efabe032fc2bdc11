//! Pipeline module - corpus preparation, feature selection, training and inference

pub mod cleaning;
pub mod columns;
pub mod config;
pub mod encoder;
pub mod features;
pub mod forest;
pub mod inference;
pub mod loader;
pub mod mutual_info;

pub use cleaning::*;
pub use columns::*;
pub use config::*;
pub use encoder::*;
pub use features::*;
pub use forest::{DecisionTree, ForestConfig, RandomForest, DEFAULT_SEED, DEFAULT_TREES};
pub use inference::*;
pub use loader::*;
pub use mutual_info::*;

//! CLI module - argument parsing and logging setup

mod args;
mod logging;

pub use args::{Cli, Commands, TrainingArgs};
pub use logging::init_tracing;

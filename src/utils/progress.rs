//! Spinners for the long-running training steps

use std::fmt::Display;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for a step of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS)
}

/// Finish a spinner with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

/// Stop a spinner in place with an error message
pub fn finish_with_failure(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("❌ {}", message));
}

/// Run `step` behind a spinner showing `message`.
///
/// On success the spinner reads `done(&value)`; on error it stops with the
/// error text and the error is handed back unchanged.
pub fn run_with_spinner<T, E, F, D>(message: &str, step: F, done: D) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    D: FnOnce(&T) -> String,
    E: Display,
{
    let pb = create_spinner(message);
    settle(&pb, step(), done)
}

fn settle<T, E, D>(pb: &ProgressBar, outcome: Result<T, E>, done: D) -> Result<T, E>
where
    D: FnOnce(&T) -> String,
    E: Display,
{
    match &outcome {
        Ok(value) => finish_with_success(pb, &done(value)),
        Err(err) => finish_with_failure(pb, &err.to_string()),
    }
    outcome
}

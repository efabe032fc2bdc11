//! Terminal styling for startup output

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("dietrec").cyan().bold(),
        style("diet recommendations from patient profiles").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, config: &PipelineConfig) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    let noise = if config.label_noise > 0.0 {
        format!("{:.1}%", config.label_noise * 100.0)
    } else {
        "off".to_string()
    };

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Input:    {:<37}│",
        FOLDER,
        truncate_path(input, 36)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Label noise:   {:<32}│",
        DICE,
        style(noise).yellow()
    );
    println!(
        "    │  {} Trees / seed:  {:<32}│",
        TREE,
        style(format!("{} / {}", config.forest.n_trees, config.forest.seed)).yellow()
    );
    println!(
        "    │  {} Features kept: {:<32}│",
        TARGET,
        style(config.num_features).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {} {}",
        style("⏱").dim(),
        style(format!("{:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final message once the model is ready
pub fn print_ready(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      {} {}", style(count).yellow().bold(), description);
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_keeps_short_values() {
        assert_eq!(truncate_string("data.csv", 20), "data.csv");
    }

    #[test]
    fn test_truncate_string_keeps_tail() {
        let truncated = truncate_string("/very/long/path/to/diet_recommendations.csv", 20);
        assert_eq!(truncated.chars().count(), 20);
        assert!(truncated.starts_with("..."));
        assert!(truncated.ends_with("recommendations.csv"));
    }
}

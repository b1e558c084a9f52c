//! Terminal styling for the command-line front end

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "");

const CARD_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ___  _       _           _
    / __|| | __ _(_)_ __  ___| |   ___ _ _  ___
   | (__ | |/ _` | | '  \|___| |__/ -_) ' \(_-<
    \___||_|\__,_|_|_|_|_|   |____\___|_||_/__/
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("ℓ").magenta().bold(),
        style("Claims, premiums and what drives them").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print a configuration card of label/value pairs
pub fn print_config(input: &Path, settings: &[(&str, String)]) {
    let line = "─".repeat(CARD_WIDTH - 2);
    let value_width = CARD_WIDTH - 14;

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(CARD_WIDTH - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {}Input: {:<w$}│", FOLDER, truncate_path(input, value_width), w = value_width + 1);
    println!("    ├{}┤", line);
    for (label, value) in settings {
        println!(
            "    │  {:<22} {:<w$}│",
            label,
            style(truncate_string(value, CARD_WIDTH - 28)).yellow(),
            w = CARD_WIDTH - 28
        );
    }
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

/// Print a warning that did not stop the run
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print the path of a written chart
pub fn print_chart(path: &Path) {
    println!("    {} {}", CHART, style(path.display()).dim());
}

/// Print the time a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {} {}",
        CLOCK,
        style(format!("{:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion(what: &str) {
    println!();
    println!("    {} {}", ROCKET, style(format!("{} complete!", what)).green().bold());
    println!();
}

/// Truncate a path for display, keeping the end
pub fn truncate_path(path: &Path, max_len: usize) -> String {
    let s = path.display().to_string();
    truncate_keep_end(&s, max_len)
}

/// Truncate a string for display, keeping the start
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn truncate_keep_end(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().skip(len - max_len.saturating_sub(3)).collect();
        format!("...{}", kept)
    }
}

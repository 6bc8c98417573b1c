//! Shared output helpers for text and JSON modes.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result. Text mode falls back to pretty JSON too;
/// commands print their own text layout before calling this for JSON.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Json | OutputFormat::Text => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: failed to serialize output: {}", "Error".red().bold(), e),
        },
    }
}

/// Print a success line in text mode.
pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning line in text mode.
pub fn warning(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Render a yes/no flag, green when it matches `good`.
pub fn flag(value: bool, good: bool) -> colored::ColoredString {
    let text = if value { "yes" } else { "no" };
    if value == good { text.green() } else { text.red() }
}

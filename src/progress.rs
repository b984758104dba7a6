//! Progress display module
//!
//! Run counters and styled diagnostics. Everything here writes to stderr,
//! STDOUT carries the filtered rows.

use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    eprintln!("  {} {}", "•".green(), text);
}

/// Create a row-count spinner on stderr
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} rows ({per_sec}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
    pb.set_style(style);

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Counters of one run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Rows tested against the filter
    pub seen: u64,
    /// Rows written to the output
    pub kept: u64,
    /// Input sources opened
    pub sources: u64,
    pub start_time: Instant,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            seen: 0,
            kept: 0,
            sources: 0,
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn add_row(&mut self, kept: bool) {
        self.seen += 1;
        if kept {
            self.kept += 1;
        }
    }

    pub fn add_source(&mut self) {
        self.sources += 1;
    }

    /// kept / seen, 0 when nothing was seen
    pub fn hit_proportion(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.kept as f64 / self.seen as f64
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One-line summary, e.g. `hit proportion: 50.00% ( 2 / 4 )`
    pub fn summary_line(&self) -> String {
        format!(
            "hit proportion: {:.2}% ( {} / {} )",
            self.hit_proportion() * 100.0,
            self.kept,
            self.seen
        )
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("  {} {}", "Sources read:   ".green(), self.sources);
        eprintln!("  {} {}", "Rows seen:      ".green(), format_number(self.seen));
        eprintln!("  {} {}", "Rows kept:      ".green().bold(), format_number(self.kept));
        eprintln!("  {} {}", "Result:         ".green(), self.summary_line());
        eprintln!("  {} {}", "Duration:       ".green(), format_duration(self.elapsed()));
        eprintln!("{}", "═".repeat(60).green());
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Good/Done:     green   (closed status, healthy labels, improving trends)
//!   - Warning/Active: yellow (in_progress, P1, warning labels)
//!   - Bad/Blocked:   red     (blocked status, P0, critical labels, cycles)
//!   - Reference:     cyan    (issue IDs)
//!   - Accent:        magenta (labels)
//!   - Muted:         dimmed  (field names, connectors)
//!   - Emphasis:      bold    (section headers)

use crate::domain::{HealthLevel, IssueStatus};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
#[must_use]
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
#[must_use]
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
#[must_use]
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to status text based on issue status.
pub(crate) fn colorize_status(status: IssueStatus, config: &OutputConfig) -> String {
    let text = status.as_str().to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        IssueStatus::Open => text.white().to_string(),
        IssueStatus::InProgress => text.yellow().to_string(),
        IssueStatus::Blocked => text.red().to_string(),
        IssueStatus::Closed => text.green().to_string(),
    }
}

/// Apply color to priority text based on priority level.
pub(crate) fn colorize_priority(priority: u8, config: &OutputConfig) -> String {
    let text = format!("P{priority}");
    if !config.use_colors {
        return text;
    }
    match priority {
        0 => text.red().bold().to_string(),
        1 => text.yellow().to_string(),
        _ => text,
    }
}

/// Colorize an issue ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Colorize a label name (magenta).
pub(crate) fn colorize_label(label: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return label.to_string();
    }
    label.magenta().to_string()
}

/// Colorize text by health level.
pub(crate) fn colorize_health(text: &str, level: HealthLevel, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    match level {
        HealthLevel::Healthy => text.green().to_string(),
        HealthLevel::Warning => text.yellow().to_string(),
        HealthLevel::Critical => text.red().bold().to_string(),
    }
}

/// Get a colored status icon, with ASCII fallback support.
pub(crate) fn colored_status_icon(status: IssueStatus, config: &OutputConfig) -> String {
    let icon = if config.use_ascii {
        match status {
            IssueStatus::Open => "o",
            IssueStatus::InProgress => ">",
            IssueStatus::Blocked => "x",
            IssueStatus::Closed => "+",
        }
    } else {
        match status {
            IssueStatus::Open => "○",
            IssueStatus::InProgress => "▶",
            IssueStatus::Blocked => "✗",
            IssueStatus::Closed => "✓",
        }
    };

    if !config.use_colors {
        return icon.to_string();
    }

    match status {
        IssueStatus::Open => icon.white().to_string(),
        IssueStatus::InProgress => icon.yellow().to_string(),
        IssueStatus::Blocked => icon.red().to_string(),
        IssueStatus::Closed => icon.green().to_string(),
    }
}

/// Horizontal bar for a `0..=1` fraction, `width` cells wide.
pub(crate) fn score_bar(fraction: f64, width: usize, config: &OutputConfig) -> String {
    let (full, empty) = if config.use_ascii { ('#', '.') } else { ('█', '░') };
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    let bar: String = std::iter::repeat_n(full, filled)
        .chain(std::iter::repeat_n(empty, width - filled))
        .collect();
    if !config.use_colors {
        return bar;
    }
    bar.cyan().to_string()
}

/// Apply dimmed style to text (for field names and connectors).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

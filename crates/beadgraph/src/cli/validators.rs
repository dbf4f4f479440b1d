//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute so bad input
//! is rejected at parse time with a specific message.

/// Longest label name accepted on the command line.
pub const MAX_LABEL_LENGTH: usize = 100;

/// Largest accepted `--limit`.
pub const MAX_LIMIT: usize = 1000;

/// Validate a label name.
///
/// Labels are trimmed and must be non-empty, free of whitespace and commas,
/// and at most [`MAX_LABEL_LENGTH`] characters.
pub fn validate_label(s: &str) -> Result<String, String> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err("Label cannot be empty".to_string());
    }

    if trimmed.chars().count() > MAX_LABEL_LENGTH {
        return Err(format!(
            "Label cannot exceed {MAX_LABEL_LENGTH} characters"
        ));
    }

    if trimmed.chars().any(|c| c.is_whitespace() || c == ',') {
        return Err(format!(
            "Invalid label '{trimmed}': labels cannot contain whitespace or commas"
        ));
    }

    Ok(trimmed.to_string())
}

/// Validate a result limit: a positive integer no larger than [`MAX_LIMIT`].
pub fn validate_limit(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid limit '{s}': expected a positive integer"))?;

    if n == 0 {
        return Err("Limit must be at least 1".to_string());
    }

    if n > MAX_LIMIT {
        return Err(format!("Limit cannot exceed {MAX_LIMIT}"));
    }

    Ok(n)
}

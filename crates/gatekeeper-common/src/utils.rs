//! Shared formatting helpers.

use chrono::{DateTime, Utc};

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncates a string to a maximum number of characters with ellipsis.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Shows the first `visible` characters of a secret followed by an ellipsis.
pub fn mask_secret(secret: &str, visible: usize) -> String {
    let shown: String = secret.chars().take(visible).collect();
    format!("{shown}...")
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(timestamp);
        assert_eq!(formatted, "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_truncate_string() {
        let input = "This is a very long string that should be truncated";
        let truncated = truncate_string(input, 20);
        assert_eq!(truncated, "This is a very lo...");

        let short = "Short";
        let not_truncated = truncate_string(short, 20);
        assert_eq!(not_truncated, "Short");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        let input = "🌤🌤🌤🌤🌤🌤";
        assert_eq!(truncate_string(input, 5), "🌤🌤...");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("123456789:ABCDEFGHIJ", 10), "123456789:...");
        assert_eq!(mask_secret("abc", 10), "abc...");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  New   York \t City "), "New York City");
        assert_eq!(normalize_whitespace("   "), "");
    }
}

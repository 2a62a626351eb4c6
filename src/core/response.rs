//! Discord message length helpers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Truncate text to fit message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    truncate_to(text, MESSAGE_LIMIT)
}

fn truncate_to(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    // Find a safe UTF-8 boundary
    let mut end = limit.saturating_sub(3); // Room for "..."
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Join whole lines under `header` without exceeding the message limit
///
/// Lines that do not fit are dropped and summarised as `...and N more`, so a
/// listing never ends mid-line.
pub fn fit_lines_for_message(header: &str, lines: &[String]) -> String {
    let mut out = String::from(header);
    for (idx, line) in lines.iter().enumerate() {
        let remaining = lines.len() - idx;
        let footer = format!("...and {remaining} more");
        // A line must leave room for a possible footer after it
        let reserve = if remaining > 1 { footer.len() + 1 } else { 0 };
        if out.len() + line.len() + 1 + reserve > MESSAGE_LIMIT {
            if out.len() + footer.len() <= MESSAGE_LIMIT {
                out.push_str(&footer);
            }
            return out;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_for_message("short text"), "short text");
    }

    #[test]
    fn test_truncate_long() {
        let result = truncate_for_message(&"a".repeat(3000));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_utf8_safety() {
        let text = "世界".repeat(1000);
        let result = truncate_for_message(&text);
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_fit_lines_all_fit() {
        let lines = vec!["one".to_string(), "two".to_string()];
        assert_eq!(fit_lines_for_message("List:\n", &lines), "List:\none\ntwo");
    }

    #[test]
    fn test_fit_lines_overflow_adds_footer() {
        let lines: Vec<String> = (0..100).map(|i| format!("{i:03} {}", "x".repeat(50))).collect();
        let result = fit_lines_for_message("", &lines);
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.contains("...and "));
        assert!(result.starts_with("000 "));
    }
}

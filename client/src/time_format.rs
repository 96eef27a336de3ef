use chrono::NaiveDateTime;

/// Best-effort display label for an opaque backend timestamp token.
/// Unparseable tokens pass through unchanged; routing always uses the raw
/// token, never the label.
pub fn timestamp_label(token: &str) -> String {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(token, format) {
            return dt.format("%d %b %H:%M").to_string();
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::timestamp_label;

    #[test]
    fn formats_minute_precision_tokens() {
        assert_eq!(timestamp_label("2024-01-01T00:00"), "01 Jan 00:00");
    }

    #[test]
    fn formats_second_precision_tokens() {
        assert_eq!(timestamp_label("2024-06-15T12:30:45"), "15 Jun 12:30");
    }

    #[test]
    fn passes_opaque_tokens_through() {
        assert_eq!(timestamp_label("run-0003"), "run-0003");
        assert_eq!(timestamp_label(""), "");
    }
}

use chrono::{DateTime, Utc};

/// Sanitize editor HTML before it is stored.
///
/// Keeps the formatting markup the rich-text editor produces and drops
/// scripts, event handlers and other active content.
pub fn sanitize_html(raw: &str) -> String {
    ammonia::clean(raw)
}

/// Format a document timestamp for listings (`dd/MM/yyyy`).
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_plain_paragraph_is_unchanged() {
        assert_eq!(sanitize_html("<p>hi</p>"), "<p>hi</p>");
    }

    #[test]
    fn test_formatting_survives() {
        let html = "<p><strong>bold</strong> and <em>italic</em></p><ul><li>one</li></ul>";
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_script_is_removed() {
        let cleaned = sanitize_html("<p>hi</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>hi</p>");
    }

    #[test]
    fn test_event_handlers_are_removed() {
        let cleaned = sanitize_html("<p onclick=\"steal()\">hi</p>");
        assert_eq!(cleaned, "<p>hi</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_html(""), "");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 15, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "07/03/2024");
    }
}

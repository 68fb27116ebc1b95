/// Upper bound for upstream bodies and error details echoed into logs and
/// responses.
pub const MAX_EXCERPT_CHARS: usize = 500;

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Replaces every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("exactly", 7), "exactly");
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("key=abc123&x=1", "abc123"), "key=[REDACTED]&x=1");
        assert_eq!(redact("nothing here", ""), "nothing here");
    }
}

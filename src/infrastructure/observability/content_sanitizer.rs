const MAX_VISIBLE_LENGTH: usize = 100;

/// Sanitizes user message text for safe logging: trims, truncates and
/// redacts credential-looking substrings. Chat content is user data, so it
/// never lands in logs verbatim.
pub fn sanitize_content(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let sanitized = if trimmed.chars().count() > MAX_VISIBLE_LENGTH {
        let visible: String = trimmed.chars().take(MAX_VISIBLE_LENGTH).collect();
        format!("{}... ({} chars total)", visible, trimmed.chars().count())
    } else {
        trimmed.to_string()
    };

    redact_sensitive_patterns(&sanitized)
}

fn redact_sensitive_patterns(text: &str) -> String {
    let patterns = [
        ("Bearer ", "Bearer [REDACTED]"),
        ("api_key=", "api_key=[REDACTED]"),
        ("password=", "password=[REDACTED]"),
        ("secret=", "secret=[REDACTED]"),
        ("token=", "token=[REDACTED]"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Some(idx) = result.find(pattern) {
            let end = result[idx + pattern.len()..]
                .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
                .map(|i| idx + pattern.len() + i)
                .unwrap_or(result.len());
            result = format!("{}{}{}", &result[..idx], replacement, &result[end..]);
        }
    }

    result
}

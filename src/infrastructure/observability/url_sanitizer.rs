use reqwest::Url;

const MAX_VISIBLE_LENGTH: usize = 120;

/// Sanitizes a callback URL for safe logging.
///
/// Credentials are dropped and query values are redacted since callers often
/// embed tokens in their callback URLs.
pub fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let Ok(mut url) = Url::parse(trimmed) else {
        return String::from("[INVALID URL]");
    };

    let _ = url.set_username("");
    let _ = url.set_password(None);

    let redacted: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, _)| (key.into_owned(), "REDACTED".to_string()))
        .collect();
    if redacted.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(redacted);
    }
    url.set_fragment(None);

    let sanitized = url.to_string();
    if sanitized.len() > MAX_VISIBLE_LENGTH {
        let cut = sanitized
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= MAX_VISIBLE_LENGTH)
            .last()
            .unwrap_or(0);
        format!("{}... ({} chars total)", &sanitized[..cut], sanitized.len())
    } else {
        sanitized
    }
}

use crate::ResolveError;

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '_' | ':' | '-')
}

/// Accepts `http(s)://` URLs made only of `[a-zA-Z0-9./_:-]`.
pub fn validate_url(url: &str) -> Result<(), ResolveError> {
    let invalid = |reason| ResolveError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(invalid("must start with http:// or https://"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }
    if !url.chars().all(is_allowed) {
        return Err(invalid("contains characters outside [a-zA-Z0-9./_:-]"));
    }
    let host = url.split("://").nth(1).unwrap_or_default();
    if host.is_empty() || host.starts_with('/') {
        return Err(invalid("missing host"));
    }
    Ok(())
}

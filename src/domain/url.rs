//! URL normalization for analysis targets.

use url::Url;

use crate::error::{AppError, Result};

const DEFAULT_SCHEME: &str = "https";

/// Normalize user input into an absolute `http(s)` URL.
///
/// - Missing scheme defaults to `https://`
/// - Query string, fragment and credentials are dropped
/// - Input with an explicit non-web scheme (`ftp://...`) is rejected
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_url(raw));
    }

    let mut url = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|_| AppError::invalid_url(trimmed))?
    } else {
        // `example.com:8080` parses with `example.com` as its scheme, so
        // anything without an explicit `://` is treated as scheme-less.
        Url::parse(&format!("{}://{}", DEFAULT_SCHEME, trimmed))
            .map_err(|_| AppError::invalid_url(trimmed))?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::invalid_url(trimmed));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(AppError::invalid_url(trimmed));
    }

    url.set_query(None);
    url.set_fragment(None);
    let _ = url.set_username("");
    let _ = url.set_password(None);

    Ok(url)
}

use url::Url;

use crate::models::compute_hash;

/// Prefix `https://` to a URL that carries no http(s) scheme.
///
/// Example: `"example.com/news"` → `"https://example.com/news"`
pub fn normalize_url(url: &str) -> String {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Stable digest of an absolute URL, used to detect already-recorded links.
///
/// The URL is re-serialized by the parser and its fragment dropped, so
/// `https://Example.com/a#top` and `https://example.com/a` collide.
pub fn fingerprint(absolute_url: &str) -> String {
    match Url::parse(absolute_url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            compute_hash(parsed.as_str())
        }
        Err(_) => compute_hash(absolute_url),
    }
}

/// True when both URLs parse and share the same host.
pub fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.host_str().is_some() && a.host_str() == b.host_str(),
        _ => false,
    }
}

/// Keep at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of successful attempts, 0 when there were none.
pub fn success_rate(successful: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(successful as f64 / total as f64 * 100.0)
}

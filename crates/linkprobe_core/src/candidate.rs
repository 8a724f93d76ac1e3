use thiserror::Error;
use url::Url;

/// Scheme assumed for candidates submitted without one (`example.com`).
pub const DEFAULT_SCHEME: &str = "https";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrl {
    #[error("empty url")]
    Empty,
    #[error("unparsable url: {0}")]
    Unparsable(String),
    #[error("unsupported scheme {0}")]
    UnsupportedScheme(String),
    #[error("url has no host")]
    MissingHost,
}

/// Turns a submitted candidate into a fetchable http(s) URL.
///
/// When `default_scheme` is set, a candidate that does not start with
/// `scheme://` gets that scheme prepended before parsing. A `://` later in the
/// path or query (return URLs) does not count.
pub fn normalize_candidate(candidate: &str, default_scheme: Option<&str>) -> Result<Url, InvalidUrl> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrl::Empty);
    }

    let with_scheme = match default_scheme {
        Some(scheme) if !has_scheme_prefix(trimmed) => format!("{scheme}://{trimmed}"),
        _ => trimmed.to_string(),
    };

    let url = Url::parse(&with_scheme).map_err(|err| InvalidUrl::Unparsable(err.to_string()))?;
    ensure_fetchable(url)
}

/// Resolves a `Location` header against the URL that produced it.
///
/// Returns `None` for targets that cannot be followed (unparsable, non-http
/// schemes, no host).
pub fn resolve_redirect(base: &Url, location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    base.join(location).ok().and_then(|url| ensure_fetchable(url).ok())
}

fn has_scheme_prefix(candidate: &str) -> bool {
    let Some((scheme, _)) = candidate.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn ensure_fetchable(url: Url) -> Result<Url, InvalidUrl> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(InvalidUrl::UnsupportedScheme(other.to_string())),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(InvalidUrl::MissingHost),
    }
}

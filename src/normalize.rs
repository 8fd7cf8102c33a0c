//! URL normalization: strip the fragment, case-fold scheme and authority.
//!
//! Two URLs are equal under this crawl iff their normalized forms are
//! byte-equal. This is deliberately narrower than `link_index`-style
//! normalization elsewhere in this codebase (no port stripping, no
//! trailing-slash collapsing) — path and query are preserved verbatim.

use anyhow::{Context, Result};
use url::Url;

/// Normalize a URL: drop the fragment, lowercase the scheme and host.
pub fn normalize(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let _ = normalized.set_scheme(&url.scheme().to_ascii_lowercase());
    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        let _ = normalized.set_host(Some(&lower));
    }
    normalized
}

/// Parse and normalize in one step.
pub fn parse_normalized(input: &str) -> Result<Url> {
    let parsed = Url::parse(input).with_context(|| format!("failed to parse URL: {input}"))?;
    Ok(normalize(&parsed))
}

/// Resolve `href` against `base`, then normalize. Returns `None` if `href`
/// does not resolve to an absolute URL.
pub fn resolve_normalized(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok().map(|u| normalize(&u))
}

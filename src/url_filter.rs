//! §4.A URL Filter: decides whether a URL is in scope for a crawl.

use url::Url;

/// `{ authority, pathPrefix }` — true iff scheme is http/https, authority
/// matches case-insensitively, and `pathAndQuery` starts with `path_prefix`
/// (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFilter {
    pub authority: String,
    pub path_prefix: String,
}

impl UrlFilter {
    pub fn new(authority: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            path_prefix: path_prefix.into(),
        }
    }

    /// True iff `url` matches this single filter.
    #[must_use]
    pub fn matches(&self, url: &Url) -> bool {
        let scheme_ok = matches!(url.scheme(), "http" | "https");
        let authority_ok = url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(&self.authority));
        let path_and_query = path_and_query(url);
        let path_ok = path_and_query.starts_with(self.path_prefix.as_str());
        scheme_ok && authority_ok && path_ok
    }

    /// Build the pair of filters spec §3 describes for a root URL: one for
    /// the bare host, one for `www.<host>` unless the host is `localhost`
    /// or already starts with `www.`.
    #[must_use]
    pub fn for_root_url(root: &Url) -> Vec<Self> {
        let Some(host) = root.host_str() else {
            return Vec::new();
        };
        let path_prefix = root_path_prefix(root);

        let mut filters = vec![Self::new(host, path_prefix.clone())];
        if host != "localhost" && !host.starts_with("www.") {
            filters.push(Self::new(format!("www.{host}"), path_prefix));
        }
        filters
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// `scheme://host/a/b/file` → `/a/b/` (the directory containing the last
/// path segment, trailing-slash terminated).
fn root_path_prefix(root: &Url) -> String {
    let path = root.path();
    match path.rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => "/".to_string(),
    }
}

/// OR across every configured filter.
#[must_use]
pub fn matches_any(filters: &[UrlFilter], url: &Url) -> bool {
    filters.iter().any(|f| f.matches(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_scheme_authority_prefix() {
        let f = UrlFilter::new("example.com", "/a/");
        assert!(f.matches(&Url::parse("https://example.com/a/x").unwrap()));
        assert!(!f.matches(&Url::parse("https://example.com/b/y").unwrap()));
        assert!(!f.matches(&Url::parse("https://other.com/a/x").unwrap()));
        assert!(!f.matches(&Url::parse("ftp://example.com/a/x").unwrap()));
    }

    #[test]
    fn authority_is_case_insensitive_path_is_not() {
        let f = UrlFilter::new("example.com", "/A/");
        assert!(f.matches(&Url::parse("https://EXAMPLE.com/A/x").unwrap()));
        assert!(!f.matches(&Url::parse("https://example.com/a/x").unwrap()));
    }

    #[test]
    fn www_duplication_for_root() {
        let root = Url::parse("https://example.com/").unwrap();
        let filters = UrlFilter::for_root_url(&root);
        assert_eq!(filters.len(), 2);
        assert!(filters.iter().any(|f| f.authority == "example.com"));
        assert!(filters.iter().any(|f| f.authority == "www.example.com"));
        assert!(filters.iter().all(|f| f.path_prefix == "/"));
    }

    #[test]
    fn no_www_duplication_for_localhost_or_existing_www() {
        let local = Url::parse("http://localhost/a/b/file").unwrap();
        assert_eq!(UrlFilter::for_root_url(&local).len(), 1);

        let www = Url::parse("https://www.example.com/a/b/file").unwrap();
        let filters = UrlFilter::for_root_url(&www);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].path_prefix, "/a/b/");
    }

    #[test]
    fn filter_monotonicity() {
        let url = Url::parse("https://example.com/a/x").unwrap();
        let base: Vec<UrlFilter> = vec![];
        assert!(!matches_any(&base, &url));
        let with_one = vec![UrlFilter::new("example.com", "/a/")];
        assert!(matches_any(&with_one, &url));
        let with_two = vec![
            UrlFilter::new("example.com", "/a/"),
            UrlFilter::new("other.com", "/"),
        ];
        assert!(matches_any(&with_two, &url));
    }
}

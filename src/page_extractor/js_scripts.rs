//! JavaScript evaluation scripts run via `page.evaluate()`.
//!
//! Each script returns a single JSON value matching one of the `Raw*`
//! shapes in `schema.rs`.

/// Title, description (priority chain), canonical href, and
/// `meta[name=robots]` content values in document order.
pub const METADATA_SCRIPT: &str = r#"
(() => {
  const getMeta = (selector) => {
    const el = document.querySelector(selector);
    return el ? el.getAttribute('content') : null;
  };
  const description =
    getMeta('meta[name="description"]') ||
    getMeta('meta[name="twitter:description"]') ||
    getMeta('meta[property="og:description"]') ||
    null;
  const canonical = document.querySelector('link[rel="canonical"]');
  const robotsMeta = Array.from(document.querySelectorAll('meta[name="robots" i]'))
    .map((el) => el.getAttribute('content'))
    .filter((v) => v !== null);
  return {
    title: document.title || null,
    description,
    canonical_href: canonical ? canonical.getAttribute('href') : null,
    robots_meta: robotsMeta,
  };
})()
"#;

/// Every `a[href]` resolved via the DOM, with rendered `innerText` and
/// `rel`. Anchors whose resolved href is not absolute are skipped by the
/// script itself (the DOM always resolves against the document base, so
/// this only excludes genuinely unparseable hrefs like `javascript:`).
pub const LINKS_SCRIPT: &str = r#"
(() => {
  const isHttp = (url) => url.startsWith('http://') || url.startsWith('https://');
  return Array.from(document.querySelectorAll('a[href]'))
    .map((a) => ({
      href: a.href,
      text: (a.innerText || '').trim() || null,
      rel: a.getAttribute('rel'),
    }))
    .filter((link) => isHttp(link.href));
})()
"#;

/// `link[rel=alternate]` feed references and `link[rel=sitemap]`
/// references, resolved against the current URL.
pub const FEEDS_AND_SITEMAPS_SCRIPT: &str = r#"
(() => {
  const feedTypes = new Set(['application/atom+xml', 'application/rss+xml', 'application/xml']);
  const feeds = Array.from(document.querySelectorAll('link[rel="alternate"]'))
    .filter((el) => feedTypes.has((el.getAttribute('type') || '').toLowerCase()))
    .map((el) => el.href);
  const sitemaps = Array.from(document.querySelectorAll('link[rel="sitemap"]'))
    .map((el) => el.href);
  return { feeds, sitemaps };
})()
"#;

/// `innerText` of every `main, *[role=main]`; falls back to `body` when
/// none exist.
pub const MAIN_TEXT_SCRIPT: &str = r#"
(() => {
  const mainEls = Array.from(document.querySelectorAll('main, *[role="main"]'));
  const texts = mainEls.length > 0
    ? mainEls.map((el) => el.innerText || '')
    : [document.body ? (document.body.innerText || '') : ''];
  return { texts };
})()
"#;

/// `innerText` of every `h1..h6`, in document order.
pub const HEADINGS_SCRIPT: &str = r#"
(() => {
  const headers = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6'))
    .map((el) => el.innerText || '');
  return { headers };
})()
"#;

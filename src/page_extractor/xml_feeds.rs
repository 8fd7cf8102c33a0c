//! §4.C.2 Content-Type dispatch: Atom/RSS feed-body link extraction for
//! `application/atom+xml`, `application/rss+xml`, and `application/xml`
//! responses. `application/xml` is deliberately run through both parsers
//! (SPEC_FULL.md §9 open question (b)) — most real feeds match only one
//! shape, so the other pass is typically a no-op.

use quick_xml::events::Event;
use quick_xml::Reader;

/// `/atom:feed/atom:entry/atom:link[@rel='alternate']/@href`, in document
/// order. Namespace prefixes are ignored (most feeds declare `atom` as the
/// default namespace or a single prefix); matching is by local name.
pub fn atom_entry_links(body: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut hrefs = Vec::new();
    let mut depth: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                if name == "link" && in_path(&depth, &["feed", "entry"]) {
                    if let Some(href) = link_alternate_href(&e)? {
                        hrefs.push(href);
                    }
                }
                depth.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref());
                if name == "link" && in_path(&depth, &["feed", "entry"]) {
                    if let Some(href) = link_alternate_href(&e)? {
                        hrefs.push(href);
                    }
                }
            }
            Event::End(_) => {
                depth.pop();
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(hrefs)
}

/// `/rss/channel/item/link` element text, in document order.
pub fn rss_item_links(body: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut links = Vec::new();
    let mut depth: Vec<String> = Vec::new();
    let mut capturing = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                capturing = name == "link" && in_path(&depth, &["rss", "channel", "item"]);
                depth.push(name);
            }
            Event::Text(t) if capturing => {
                links.push(t.unescape()?.trim().to_string());
                capturing = false;
            }
            Event::End(_) => {
                depth.pop();
                capturing = false;
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(links.into_iter().filter(|s| !s.is_empty()).collect())
}

fn local_name(qualified: &[u8]) -> String {
    let s = String::from_utf8_lossy(qualified);
    match s.rfind(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.to_string(),
    }
}

fn in_path(depth: &[String], expected_ancestors: &[&str]) -> bool {
    if depth.len() < expected_ancestors.len() {
        return false;
    }
    let tail = &depth[depth.len() - expected_ancestors.len()..];
    tail.iter().zip(expected_ancestors).all(|(a, b)| a == b)
}

fn link_alternate_href(
    e: &quick_xml::events::BytesStart,
) -> Result<Option<String>, quick_xml::Error> {
    let mut rel: Option<String> = None;
    let mut href: Option<String> = None;
    for attr in e.attributes() {
        let attr = attr?;
        match local_name(attr.key.as_ref()).as_str() {
            "rel" => rel = Some(attr.unescape_value()?.to_string()),
            "href" => href = Some(attr.unescape_value()?.to_string()),
            _ => {}
        }
    }
    match (rel.as_deref(), href) {
        (Some("alternate") | None, Some(href)) => Ok(Some(href)),
        _ => Ok(None),
    }
}

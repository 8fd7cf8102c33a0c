//! §4.B Robots Directive Parser: `index/noindex/follow/nofollow/none` tokens
//! from headers, meta tags, and anchor `rel` values.

/// `{ indexPage: bool, followLinks: bool }`. Default when absent: both true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotConfiguration {
    pub index_page: bool,
    pub follow_links: bool,
}

impl Default for RobotConfiguration {
    fn default() -> Self {
        Self {
            index_page: true,
            follow_links: true,
        }
    }
}

/// A single source's parse result: `None` means the source made no
/// definite statement about that directive.
#[derive(Debug, Clone, Copy, Default)]
struct Directive {
    index: Option<bool>,
    follow: Option<bool>,
}

/// Parse one directive string (space- or comma-separated tokens).
fn parse_one(input: &str) -> Directive {
    let mut directive = Directive::default();
    for raw in input.split([',', ' ']) {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        match token.to_ascii_lowercase().as_str() {
            "index" => directive.index.get_or_insert(true),
            "noindex" => directive.index.get_or_insert(false),
            "follow" => directive.follow.get_or_insert(true),
            "nofollow" => directive.follow.get_or_insert(false),
            "none" => {
                directive.index.get_or_insert(false);
                directive.follow.get_or_insert(false);
                continue;
            }
            _ => continue,
        };
    }
    directive
}

/// Merge a sequence of directive-bearing strings (headers first, then meta
/// tags, in document order) into one `RobotConfiguration`. The first
/// definite value for each of `index` and `follow` wins; later occurrences
/// never overwrite it.
#[must_use]
pub fn merge<'a, I: IntoIterator<Item = &'a str>>(sources: I) -> RobotConfiguration {
    let mut index: Option<bool> = None;
    let mut follow: Option<bool> = None;
    for source in sources {
        let directive = parse_one(source);
        if index.is_none() {
            index = directive.index;
        }
        if follow.is_none() {
            follow = directive.follow;
        }
        if index.is_some() && follow.is_some() {
            break;
        }
    }
    RobotConfiguration {
        index_page: index.unwrap_or(true),
        follow_links: follow.unwrap_or(true),
    }
}

/// Parse a `rel` attribute value into a per-link follow override, if the
/// value makes a definite statement.
#[must_use]
pub fn rel_follow_override(rel: &str) -> Option<bool> {
    parse_one(rel).follow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_sets_both_false() {
        let cfg = merge(["none"]);
        assert!(!cfg.index_page);
        assert!(!cfg.follow_links);
    }

    #[test]
    fn default_is_both_true() {
        let cfg = merge(std::iter::empty());
        assert!(cfg.index_page);
        assert!(cfg.follow_links);
    }

    #[test]
    fn first_definite_value_wins() {
        let cfg = merge(["noindex", "index, follow"]);
        assert!(!cfg.index_page);
        assert!(cfg.follow_links);
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let cfg = merge(["bogus, follow"]);
        assert!(cfg.index_page);
        assert!(cfg.follow_links);
    }

    #[test]
    fn nofollow_rel_overrides() {
        assert_eq!(rel_follow_override("nofollow"), Some(false));
        assert_eq!(rel_follow_override("noopener"), None);
    }

    #[test]
    fn merge_is_first_wins_law() {
        // Regardless of how many sources follow, the first definite value
        // for each directive is the one that survives.
        let a = merge(["index follow"]);
        let b = merge(["index follow", "noindex nofollow"]);
        assert_eq!(a.index_page, b.index_page);
        assert_eq!(a.follow_links, b.follow_links);
    }
}

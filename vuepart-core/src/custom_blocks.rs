//! Custom block allow/deny filtering

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Caller supplied decision function for custom block tags
pub type TagPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// How the set of emitted custom blocks is configured
#[derive(Clone)]
pub enum CustomBlocks {
    /// Tag list: `tag` allows, `!tag` denies, `*` and `!*` are wildcards
    Tags(Vec<String>),
    /// Arbitrary predicate over the tag name
    Predicate(TagPredicate),
}

impl fmt::Debug for CustomBlocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomBlocks::Tags(tags) => f.debug_tuple("Tags").field(tags).finish(),
            CustomBlocks::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Vec<String>> for CustomBlocks {
    fn from(tags: Vec<String>) -> Self {
        CustomBlocks::Tags(tags)
    }
}

/// Decides whether a custom block tag is exported from the component module
///
/// For a tag list the precedence is: an explicit allow wins, then an
/// explicit deny, then a deny wildcard, then an allow wildcard. Everything
/// else is denied.
#[derive(Clone)]
pub struct CustomBlockFilter {
    rule: Rule,
}

#[derive(Clone)]
enum Rule {
    Lists {
        allowed: HashSet<String>,
        denied: HashSet<String>,
    },
    Predicate(TagPredicate),
    DenyAll,
}

impl CustomBlockFilter {
    /// Build a filter from the configured setting; no setting denies everything
    pub fn new(setting: Option<&CustomBlocks>) -> Self {
        match setting {
            Some(CustomBlocks::Tags(tags)) => Self::from_tags(tags),
            Some(CustomBlocks::Predicate(predicate)) => Self {
                rule: Rule::Predicate(Arc::clone(predicate)),
            },
            None => Self::deny_all(),
        }
    }

    /// Build a filter from a tag list
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut allowed = HashSet::new();
        let mut denied = HashSet::new();
        for tag in tags {
            let tag = tag.as_ref();
            match tag.strip_prefix('!') {
                Some(name) => denied.insert(name.to_string()),
                None => allowed.insert(tag.to_string()),
            };
        }
        Self {
            rule: Rule::Lists { allowed, denied },
        }
    }

    /// A filter that rejects every tag
    pub fn deny_all() -> Self {
        Self { rule: Rule::DenyAll }
    }

    /// Whether blocks with `tag` are exported
    pub fn is_allowed(&self, tag: &str) -> bool {
        match &self.rule {
            Rule::Lists { allowed, denied } => {
                if allowed.contains(tag) {
                    return true;
                }
                if denied.contains(tag) || denied.contains("*") {
                    return false;
                }
                allowed.contains("*")
            }
            Rule::Predicate(predicate) => predicate(tag),
            Rule::DenyAll => false,
        }
    }
}

impl fmt::Debug for CustomBlockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::Lists { allowed, denied } => f
                .debug_struct("CustomBlockFilter")
                .field("allowed", allowed)
                .field("denied", denied)
                .finish(),
            Rule::Predicate(_) => f.write_str("CustomBlockFilter(predicate)"),
            Rule::DenyAll => f.write_str("CustomBlockFilter(deny all)"),
        }
    }
}

/// Fold the deprecated allow/deny lists into a tag list
///
/// The lists only apply when no explicit setting is configured. Returns the
/// effective setting and whether a deprecated list was present, so the caller
/// can warn about it.
pub fn merge_deprecated_lists(
    setting: Option<CustomBlocks>,
    white_list: Option<&[String]>,
    black_list: Option<&[String]>,
) -> (Option<CustomBlocks>, bool) {
    let deprecated = white_list.is_some() || black_list.is_some();
    if setting.is_some() || !deprecated {
        return (setting, deprecated);
    }

    let mut tags: Vec<String> = black_list
        .into_iter()
        .flatten()
        .map(|tag| format!("!{tag}"))
        .collect();
    tags.extend(white_list.into_iter().flatten().cloned());
    (Some(CustomBlocks::Tags(tags)), true)
}

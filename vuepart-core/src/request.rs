//! Virtual module requests
//!
//! A block of a composite file is addressed through the host's module
//! pipeline as `<basename>.vue?<query>`, where one reserved query parameter
//! carries `type[.index].lang`. [`PartRequestCodec`] is the only place that
//! builds or reads that value.

use crate::descriptor::Block;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Reserved query parameter carrying the block reference
pub const PARAM_NAME: &str = "vuepart";

/// Extension of composite files
pub const COMPOSITE_EXT: &str = ".vue";

static GET_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.vue(\.[a-z]+?)?\?(.+)$").expect("valid query pattern"));

/// The addressable block types of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Template,
    Script,
    Styles,
    CustomBlocks,
}

impl BlockKind {
    /// Get the wire name of the block type
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Template => "template",
            BlockKind::Script => "script",
            BlockKind::Styles => "styles",
            BlockKind::CustomBlocks => "customBlocks",
        }
    }

    /// Whether blocks of this type live in an ordered list and need an index
    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::Styles | BlockKind::CustomBlocks)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown block type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type: {0}")]
pub struct UnknownBlockKind(pub String);

impl FromStr for BlockKind {
    type Err = UnknownBlockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(BlockKind::Template),
            "script" => Ok(BlockKind::Script),
            "styles" => Ok(BlockKind::Styles),
            "customBlocks" => Ok(BlockKind::CustomBlocks),
            other => Err(UnknownBlockKind(other.to_string())),
        }
    }
}

/// Which block of a file a virtual id points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub kind: BlockKind,
    pub lang: String,
    pub index: Option<usize>,
}

/// A decoded virtual id: the owning file plus the block reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRequest {
    pub filename: PathBuf,
    pub meta: BlockRef,
}

/// Encoder/decoder for virtual block ids
///
/// Carries the per-type default language table used when a block declares
/// no language.
#[derive(Debug, Clone)]
pub struct PartRequestCodec {
    default_lang: BTreeMap<String, String>,
}

impl Default for PartRequestCodec {
    fn default() -> Self {
        Self::new(vuepart_config::builtin_default_lang())
    }
}

impl PartRequestCodec {
    /// Create a codec with the given default language table
    pub fn new(default_lang: BTreeMap<String, String>) -> Self {
        Self { default_lang }
    }

    /// Default language for a block type or custom tag
    pub fn default_lang(&self, key: &str) -> Option<&str> {
        self.default_lang.get(key).map(String::as_str)
    }

    /// Build the virtual id of a block
    ///
    /// Query parameters already present on `filename` are kept in order;
    /// the reserved parameter replaces an earlier value or is appended.
    ///
    /// # Examples
    /// ```
    /// use vuepart_core::request::{BlockKind, PartRequestCodec};
    /// use std::path::Path;
    ///
    /// let codec = PartRequestCodec::default();
    /// let id = codec.encode(Path::new("/src/App.vue"), Some("scss"), BlockKind::Styles, Some(0));
    /// assert_eq!(id, "App.vue?vuepart=styles.0.scss");
    /// ```
    pub fn encode(
        &self,
        filename: &Path,
        lang: Option<&str>,
        kind: BlockKind,
        index: Option<usize>,
    ) -> String {
        let text = filename.to_string_lossy();
        let (path, mut query) = match GET_QUERY.captures(&text) {
            Some(caps) => {
                let start = caps.get(2).map_or(text.len(), |m| m.start());
                (&text[..start - 1], parse_query(&caps[2]))
            }
            None => (&text[..], Vec::new()),
        };

        let mut segments = vec![kind.as_str().to_string()];
        segments.extend(index.map(|i| i.to_string()));
        segments.push(self.lang_or_default(kind, lang).to_string());
        let value = segments.join(".");

        match query.iter_mut().find(|(key, _)| key == PARAM_NAME) {
            Some(entry) => entry.1 = value,
            None => query.push((PARAM_NAME.to_string(), value)),
        }

        format!("{}?{}", basename(path), stringify_query(&query))
    }

    /// Decode the block reference of a virtual id
    ///
    /// A second segment made of digits is the index; everything after it is
    /// the language, dots included, so `script.d.ts` reads as language
    /// `d.ts`. Returns `None` for anything that is not a block request: ids
    /// without the composite extension, without the reserved parameter, with
    /// an unknown block type, or with an empty language.
    pub fn decode(&self, id: &str) -> Option<BlockRef> {
        let caps = GET_QUERY.captures(id)?;
        let query = parse_query(&caps[2]);
        let (_, data) = query.iter().find(|(key, _)| key == PARAM_NAME)?;

        let segments: Vec<&str> = data.split('.').collect();
        let kind: BlockKind = segments[0].parse().ok()?;

        let (index, rest) = match segments.get(1) {
            Some(segment) if is_index(segment) => (Some(segment.parse::<usize>().ok()?), &segments[2..]),
            _ => (None, &segments[1..]),
        };

        let lang = if rest.is_empty() {
            self.lang_or_default(kind, None).to_string()
        } else {
            rest.join(".")
        };
        if lang.is_empty() {
            return None;
        }

        Some(BlockRef { kind, lang, index })
    }

    /// Language segment for a block of `kind`: the given one, the configured
    /// default, else the type name
    fn lang_or_default<'a>(&'a self, kind: BlockKind, lang: Option<&'a str>) -> &'a str {
        lang.or_else(|| self.default_lang(kind.as_str()))
            .unwrap_or(kind.as_str())
    }

    /// Language used to address `block`
    ///
    /// Custom blocks use a non-empty `lang` attribute, else the default
    /// configured for their tag, else the tag itself. Other blocks use their
    /// declared language, else the default for the block type.
    pub fn block_lang<'a>(&'a self, kind: BlockKind, block: &'a Block) -> &'a str {
        match kind {
            BlockKind::CustomBlocks => block
                .attr_text("lang")
                .filter(|lang| !lang.is_empty())
                .or_else(|| self.default_lang(&block.tag))
                .unwrap_or(block.tag.as_str()),
            _ => self.lang_or_default(kind, block.lang.as_deref()),
        }
    }

    /// Build the virtual id of a parsed block
    pub fn encode_block(
        &self,
        filename: &Path,
        block: &Block,
        kind: BlockKind,
        index: Option<usize>,
    ) -> String {
        self.encode(filename, Some(self.block_lang(kind, block)), kind, index)
    }

    /// Whether an id addresses a block
    pub fn is_part_request(&self, id: &str) -> bool {
        self.decode(id).is_some()
    }

    /// Split a resolved virtual id into its owning file and block reference
    pub fn parse_request(&self, id: &str) -> Option<VirtualRequest> {
        let end = id.rfind(COMPOSITE_EXT)? + COMPOSITE_EXT.len();
        let meta = self.decode(id)?;
        Some(VirtualRequest {
            filename: PathBuf::from(&id[..end]),
            meta,
        })
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

/// Parse an `a=1&b=2` query string, keeping order and decoding escapes
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (unescape(key), unescape(value))
        })
        .collect()
}

fn unescape(text: &str) -> String {
    let spaced = text.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}

fn stringify_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

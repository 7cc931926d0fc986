//! Structural description of a parsed composite file
//!
//! A [`Descriptor`] is produced once per transform by the parser and then
//! treated as an immutable value. Style and custom block order is the order
//! of appearance in the source and is the only basis for index addressing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A version 3 source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMap {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: 3,
            file: None,
            source_root: None,
            sources: Vec::new(),
            sources_content: Vec::new(),
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

impl SourceMap {
    /// A map with no mappings, used when nothing better is available
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the map carries no mappings
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// An attribute value on a block's opening tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Bare attribute such as `scoped`
    Flag(bool),
    /// Attribute with a value such as `lang="scss"`
    Text(String),
}

impl AttrValue {
    /// The value when the attribute carries text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Flag(_) => None,
        }
    }
}

/// One top-level block of a composite file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    /// Tag name (`template`, `script`, `style`, or the custom tag)
    #[serde(rename = "type")]
    pub tag: String,
    /// Raw text between the opening and closing tags
    pub content: String,
    pub lang: Option<String>,
    /// External file reference
    pub src: Option<String>,
    pub attrs: BTreeMap<String, AttrValue>,
    pub map: Option<SourceMap>,
    pub scoped: bool,
    pub module: bool,
    /// Compiled code persisted by CSS extraction, served by `load`
    pub code: Option<String>,
}

impl Block {
    /// Create a block with the given tag and content
    pub fn new(tag: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the declared language (also recorded as the `lang` attribute)
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        self.attrs
            .insert("lang".to_string(), AttrValue::Text(lang.clone()));
        self.lang = Some(lang);
        self
    }

    /// Set the external `src` reference
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        let src = src.into();
        self.attrs
            .insert("src".to_string(), AttrValue::Text(src.clone()));
        self.src = Some(src);
        self
    }

    /// Mark the block as using scoped selectors
    pub fn scoped(mut self) -> Self {
        self.attrs.insert("scoped".to_string(), AttrValue::Flag(true));
        self.scoped = true;
        self
    }

    /// Mark the block as a CSS module
    pub fn css_module(mut self) -> Self {
        self.attrs.insert("module".to_string(), AttrValue::Flag(true));
        self.module = true;
        self
    }

    /// Text value of an attribute
    pub fn attr_text(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(AttrValue::as_text)
    }

    /// Content to serve for this block: extracted compiled code first, raw content otherwise
    pub fn served_code(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.content)
    }
}

/// Structural parse of one composite file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Descriptor {
    pub template: Option<Block>,
    pub script: Option<Block>,
    pub styles: Vec<Block>,
    pub custom_blocks: Vec<Block>,
}

impl Descriptor {
    /// Total number of blocks
    pub fn block_count(&self) -> usize {
        usize::from(self.template.is_some())
            + usize::from(self.script.is_some())
            + self.styles.len()
            + self.custom_blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_builders() {
        let block = Block::new("style", ".a{}").with_lang("scss").scoped();
        assert_eq!(block.lang.as_deref(), Some("scss"));
        assert_eq!(block.attr_text("lang"), Some("scss"));
        assert!(block.scoped);
        assert_eq!(block.attrs["scoped"], AttrValue::Flag(true));
        assert_eq!(block.attr_text("scoped"), None);
    }

    #[test]
    fn test_served_code_prefers_compiled() {
        let mut block = Block::new("style", ".a{}");
        assert_eq!(block.served_code(), ".a{}");
        block.code = Some(".a[data-v-1]{}".to_string());
        assert_eq!(block.served_code(), ".a[data-v-1]{}");
    }

    #[test]
    fn test_empty_source_map_serializes_mappings() {
        let json = serde_json::to_value(SourceMap::empty()).unwrap();
        assert_eq!(json["mappings"], "");
        assert_eq!(json["version"], 3);
        assert!(SourceMap::empty().is_empty());
    }

    #[test]
    fn test_block_count() {
        let descriptor = Descriptor {
            template: Some(Block::new("template", "<div/>")),
            script: None,
            styles: vec![Block::new("style", ""), Block::new("style", "")],
            custom_blocks: vec![Block::new("docs", "")],
        };
        assert_eq!(descriptor.block_count(), 4);
    }
}

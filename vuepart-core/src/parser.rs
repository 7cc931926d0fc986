//! Built-in composite file splitter
//!
//! [`BlockSplitter`] cuts a composite file into its top-level blocks without
//! understanding the languages inside them. `<script>` and `<style>` bodies
//! are raw text that ends at the first matching close tag; `<template>` and
//! custom blocks may nest tags of the same name.

use crate::compiler::{ParseOptions, SfcParser};
use crate::component::{Component, ComponentKind, ComponentMetadata};
use crate::descriptor::{AttrValue, Block, Descriptor, SourceMap};
use crate::error::ParseError;
use std::collections::BTreeMap;
use std::path::Path;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Default [`SfcParser`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSplitter;

impl BlockSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl Component for BlockSplitter {
    fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata::new(
            "block-splitter",
            env!("CARGO_PKG_VERSION"),
            ComponentKind::Parser,
            Some("Splits a composite file into top-level blocks"),
        )
    }
}

impl SfcParser for BlockSplitter {
    fn parse(
        &self,
        source: &str,
        filename: &Path,
        options: &ParseOptions,
    ) -> Result<Descriptor, ParseError> {
        let mut descriptor = Descriptor::default();
        let mut cursor = Cursor::new(source);

        while let Some(raw) = cursor.next_block()? {
            let mut block = raw.into_block(source);
            let needs_map = matches!(block.tag.as_str(), "script" | "style") && block.src.is_none();
            if options.need_map && needs_map {
                block.map = Some(line_map(
                    filename,
                    source,
                    raw.content_start,
                    &block.content,
                    options.source_root.as_deref(),
                ));
            }

            match block.tag.as_str() {
                "template" => {
                    if descriptor.template.is_some() {
                        return Err(duplicate("template", source, raw.start));
                    }
                    descriptor.template = Some(block);
                }
                "script" => {
                    if descriptor.script.is_some() {
                        return Err(duplicate("script", source, raw.start));
                    }
                    descriptor.script = Some(block);
                }
                "style" => descriptor.styles.push(block),
                _ => descriptor.custom_blocks.push(block),
            }
        }

        Ok(descriptor)
    }
}

fn duplicate(tag: &str, source: &str, offset: usize) -> ParseError {
    ParseError::at(
        format!(
            "Single file component can contain only one <{tag}> element (line {})",
            line_of(source, offset)
        ),
        offset,
    )
}

/// 1-based line of a byte offset
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// Location of one top-level block in the source
#[derive(Debug, Clone)]
struct RawBlock {
    tag: String,
    attrs: BTreeMap<String, AttrValue>,
    start: usize,
    content_start: usize,
    content_end: usize,
}

impl RawBlock {
    fn into_block(&self, source: &str) -> Block {
        let mut block = Block::new(self.tag.clone(), &source[self.content_start..self.content_end]);
        block.lang = self.attrs.get("lang").and_then(AttrValue::as_text).map(str::to_string);
        block.src = self.attrs.get("src").and_then(AttrValue::as_text).map(str::to_string);
        block.scoped = self.attrs.contains_key("scoped");
        block.module = self.attrs.contains_key("module");
        block.attrs = self.attrs.clone();
        block
    }
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Advance to the next top-level block, skipping text, comments and stray tags
    fn next_block(&mut self) -> Result<Option<RawBlock>, ParseError> {
        loop {
            let Some(offset) = self.rest().find('<') else {
                self.pos = self.bytes.len();
                return Ok(None);
            };
            self.pos += offset;
            let rest = self.rest();

            if rest.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
                continue;
            }
            if !self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_alphabetic) {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            let (tag, attrs, self_closing) = self.open_tag()?;
            let content_start = self.pos;
            if self_closing {
                return Ok(Some(RawBlock {
                    tag,
                    attrs,
                    start,
                    content_start,
                    content_end: content_start,
                }));
            }

            let raw_text = matches!(tag.as_str(), "script" | "style");
            let content_end = self.close_tag(&tag, raw_text).ok_or_else(|| {
                ParseError::at(
                    format!(
                        "<{tag}> element is missing its end tag (line {})",
                        line_of(self.src, start)
                    ),
                    start,
                )
            })?;
            return Ok(Some(RawBlock {
                tag,
                attrs,
                start,
                content_start,
                content_end,
            }));
        }
    }

    fn skip_past(&mut self, marker: &str) {
        self.pos = match self.rest().find(marker) {
            Some(i) => self.pos + i + marker.len(),
            None => self.bytes.len(),
        };
    }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| pred(b)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Parse `<name attr=...>` starting at `<`; leaves the cursor after `>`
    fn open_tag(&mut self) -> Result<(String, BTreeMap<String, AttrValue>, bool), ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
            .to_string();
        let mut attrs = BTreeMap::new();

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(ParseError::at(
                    format!("unclosed <{name}> tag (line {})", line_of(self.src, start)),
                    start,
                ));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((name, attrs, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((name, attrs, false));
            }

            let attr = self
                .take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
                .to_string();
            if attr.is_empty() {
                // stray `/` inside the tag
                self.pos += 1;
                continue;
            }

            self.skip_whitespace();
            if self.bytes.get(self.pos) != Some(&b'=') {
                attrs.insert(attr, AttrValue::Flag(true));
                continue;
            }
            self.pos += 1;
            self.skip_whitespace();

            let value = match self.bytes.get(self.pos) {
                Some(&quote @ (b'"' | b'\'')) => {
                    self.pos += 1;
                    let value = self.take_while(|b| b != quote);
                    if self.pos >= self.bytes.len() {
                        return Err(ParseError::at(
                            format!(
                                "unterminated value for attribute '{attr}' (line {})",
                                line_of(self.src, start)
                            ),
                            start,
                        ));
                    }
                    self.pos += 1;
                    value
                }
                _ => self.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
            };
            attrs.insert(attr, AttrValue::Text(value.to_string()));
        }
    }

    /// Find the close tag of `name`; returns where the content ends and leaves
    /// the cursor after the close tag
    fn close_tag(&mut self, name: &str, raw_text: bool) -> Option<usize> {
        let mut depth = 1usize;
        let mut pos = self.pos;

        while let Some(offset) = self.src[pos..].find('<') {
            pos += offset;
            let rest = &self.src[pos..];

            if !raw_text && rest.starts_with("<!--") {
                pos = rest.find("-->").map_or(self.bytes.len(), |i| pos + i + 3);
                continue;
            }

            if let Some(after) = rest.strip_prefix("</") {
                if tag_name_at(after, name) {
                    depth -= 1;
                    if depth == 0 {
                        let end = pos;
                        self.pos = rest.find('>').map_or(self.bytes.len(), |i| pos + i + 1);
                        return Some(end);
                    }
                }
            } else if !raw_text && tag_name_at(&rest[1..], name) {
                let tag_end = rest.find('>')?;
                if !rest[..tag_end].ends_with('/') {
                    depth += 1;
                }
                pos += tag_end + 1;
                continue;
            }
            pos += 1;
        }
        None
    }
}

/// Whether `text` starts with tag `name` followed by a tag boundary
fn tag_name_at(text: &str, name: &str) -> bool {
    let Some(head) = text.get(..name.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(name)
        && text[name.len()..]
            .bytes()
            .next()
            .map_or(true, |b| b.is_ascii_whitespace() || b == b'>' || b == b'/')
}

/// Line-granular map from a block's content back into the composite file
fn line_map(
    filename: &Path,
    source: &str,
    content_start: usize,
    content: &str,
    source_root: Option<&str>,
) -> SourceMap {
    let file = filename.to_string_lossy().replace('\\', "/");
    let offset = source[..content_start].matches('\n').count() as i64;

    let mut previous = 0i64;
    let mut lines = Vec::new();
    for (index, line) in content.split('\n').enumerate() {
        if is_blank_line(line) {
            lines.push(String::new());
            continue;
        }
        let original = index as i64 + offset;
        let mut segment = String::from("AA");
        encode_vlq(original - previous, &mut segment);
        segment.push('A');
        previous = original;
        lines.push(segment);
    }

    SourceMap {
        file: Some(file.clone()),
        source_root: Some(source_root.unwrap_or_default().replace('\\', "/")),
        sources: vec![file],
        sources_content: vec![Some(source.to_string())],
        mappings: lines.join(";").trim_end_matches(';').to_string(),
        ..SourceMap::default()
    }
}

/// Empty, whitespace-only or a bare `//` line
fn is_blank_line(line: &str) -> bool {
    line.strip_prefix("//").unwrap_or(line).trim().is_empty()
}

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 31) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 32;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = r#"<template>
  <div class="app">
    <template v-if="ok"><span/></template>
  </div>
</template>

<script lang="ts">
export default {}
</script>

<style scoped>
.app { color: red; }
</style>
<style module="classes" lang="scss">
.b { color: blue; }
</style>

<!-- <docs>commented</docs> -->
<docs>
# Title
</docs>
<i18n src="./locale.json" />
"#;

    fn parse(source: &str) -> Result<Descriptor, ParseError> {
        BlockSplitter::new().parse(source, Path::new("/src/App.vue"), &ParseOptions::default())
    }

    #[test]
    fn test_splits_blocks() {
        let d = parse(APP).unwrap();

        let template = d.template.unwrap();
        assert!(template.content.contains(r#"<template v-if="ok"><span/></template>"#));
        assert!(template.content.trim_end().ends_with("</div>"));

        let script = d.script.unwrap();
        assert_eq!(script.lang.as_deref(), Some("ts"));
        assert_eq!(script.content, "\nexport default {}\n");

        assert_eq!(d.styles.len(), 2);
        assert!(d.styles[0].scoped);
        assert!(!d.styles[0].module);
        assert!(d.styles[1].module);
        assert_eq!(d.styles[1].attr_text("module"), Some("classes"));
        assert_eq!(d.styles[1].lang.as_deref(), Some("scss"));

        assert_eq!(d.custom_blocks.len(), 2);
        assert_eq!(d.custom_blocks[0].tag, "docs");
        assert_eq!(d.custom_blocks[0].content, "\n# Title\n");
        assert_eq!(d.custom_blocks[1].tag, "i18n");
        assert_eq!(d.custom_blocks[1].src.as_deref(), Some("./locale.json"));
        assert_eq!(d.custom_blocks[1].content, "");
    }

    #[test]
    fn test_script_map_points_at_source_lines() {
        let source = "<template><div/></template>\n<script>\nexport default {}\n</script>\n";
        let d = parse(source).unwrap();
        let map = d.script.unwrap().map.unwrap();
        // content line 1 is source line 2 (0-based), a delta of +2
        assert_eq!(map.mappings, ";AAEA");
        assert_eq!(map.sources, vec!["/src/App.vue".to_string()]);
        assert_eq!(map.sources_content, vec![Some(source.to_string())]);
        assert!(d.template.unwrap().map.is_none());
    }

    #[test]
    fn test_no_map_when_disabled() {
        let options = ParseOptions {
            need_map: false,
            source_root: None,
        };
        let d = BlockSplitter::new()
            .parse("<style>.a{}</style>", Path::new("/a.vue"), &options)
            .unwrap();
        assert!(d.styles[0].map.is_none());
    }

    #[test]
    fn test_raw_text_blocks_ignore_markup() {
        let source = "<script>\nconst s = '<script>';\nconst t = '<template>';\n</script>";
        let d = parse(source).unwrap();
        assert_eq!(d.script.unwrap().content, "\nconst s = '<script>';\nconst t = '<template>';\n");
    }

    #[test]
    fn test_duplicate_template_is_rejected() {
        let err = parse("<template><a/></template>\n<template><b/></template>").unwrap_err();
        assert!(err.message.contains("only one <template>"));
        assert!(err.message.contains("line 2"));
        assert_eq!(err.offset, Some(26));
    }

    #[test]
    fn test_unclosed_block_is_rejected() {
        let err = parse("<script>\nexport default {}\n").unwrap_err();
        assert!(err.message.contains("<script> element is missing its end tag"));
        assert_eq!(err.offset, Some(0));
    }

    #[test]
    fn test_attribute_forms() {
        let d = parse("<style lang=less scoped data-x='1'></style>").unwrap();
        let style = &d.styles[0];
        assert_eq!(style.lang.as_deref(), Some("less"));
        assert!(style.scoped);
        assert_eq!(style.attr_text("data-x"), Some("1"));
    }

    #[test]
    fn test_empty_source() {
        let d = parse("").unwrap();
        assert_eq!(d.block_count(), 0);
    }

    #[test]
    fn test_encode_vlq() {
        let mut out = String::new();
        for value in [0, 1, -1, 2, 16, -17, 1000] {
            encode_vlq(value, &mut out);
            out.push(',');
        }
        assert_eq!(out, "A,C,D,E,gB,jB,w+B,");
    }
}

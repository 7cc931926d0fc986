//! Rewrite template asset `require(...)` calls into static imports
//!
//! Compiled render functions reference assets through `require("<path>")`.
//! ES module bundlers want imports instead, so every distinct specifier gets
//! a generated binding imported at the top of the code.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\(("(?:[^"\\]|\\.)+"|'(?:[^'\\]|\\.)+')\)"#).expect("valid require pattern")
});

/// Replace `require("x")` calls with imported bindings
///
/// Specifiers are deduplicated by their literal text, quotes included, and
/// the import lines are emitted in first-occurrence order ahead of the code.
pub fn transform_require_to_import(code: &str) -> String {
    let mut aliases: HashMap<String, String> = HashMap::new();
    let mut imports = String::new();

    let body = REQUIRE_CALL.replace_all(code, |caps: &Captures<'_>| {
        let specifier = &caps[1];
        aliases
            .entry(specifier.to_string())
            .or_insert_with(|| {
                let alias = alias_for(specifier);
                imports.push_str(&format!("import {alias} from {specifier}\n"));
                alias
            })
            .clone()
    });

    imports + &body
}

/// Binding name for a quoted specifier
fn alias_for(specifier: &str) -> String {
    let mut name = String::with_capacity(specifier.len());
    for c in specifier.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }
    let name = name.strip_prefix('_').unwrap_or(&name);
    let name = name.strip_suffix('_').unwrap_or(name);
    format!("__$_require_{name}__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_and_dedups() {
        let code = r#"var r = {src: require("../assets/logo.png"), b: require('./a.svg'), c: require("../assets/logo.png")}"#;
        let out = transform_require_to_import(code);
        assert_eq!(
            out,
            "import __$_require_assets_logo_png__ from \"../assets/logo.png\"\n\
             import __$_require_a_svg__ from './a.svg'\n\
             var r = {src: __$_require_assets_logo_png__, b: __$_require_a_svg__, c: __$_require_assets_logo_png__}"
        );
    }

    #[test]
    fn test_uppercase_becomes_separator() {
        let out = transform_require_to_import(r#"x(require("@/Img.PNG"))"#);
        assert_eq!(out, "import __$_require_mg__ from \"@/Img.PNG\"\nx(__$_require_mg__)");
    }

    #[test]
    fn test_no_require_is_untouched() {
        let code = "var render = function () { return _c('div') }";
        assert_eq!(transform_require_to_import(code), code);
    }

    #[test]
    fn test_escaped_quote_inside_specifier() {
        let out = transform_require_to_import(r#"require("a\"b.png")"#);
        assert!(out.starts_with("import __$_require_a_b_png__ from \"a\\\"b.png\"\n"));
        assert!(out.ends_with("__$_require_a_b_png__"));
    }

    #[test]
    fn test_alias_for() {
        assert_eq!(alias_for("'./x.png'"), "__$_require_x_png__");
        assert_eq!(alias_for("\"img/2x/icon.svg\""), "__$_require_img_2x_icon_svg__");
    }
}

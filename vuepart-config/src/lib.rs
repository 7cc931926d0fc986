//! Vuepart Config - Pure configuration data structures
//!
//! This crate contains only data structures and their defaults, no logic or
//! global state. It is the option vocabulary shared by the plugin core and the
//! CLI, and it round-trips through JSON with camelCase keys so a bundler-side
//! configuration file can be read as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default include pattern for composite files
pub const DEFAULT_INCLUDE: &str = "*.vue";

/// Default component normalizer helper
pub const DEFAULT_NORMALIZER: &str = "~vue-runtime-helpers/dist/normalize-component.js";

/// Default browser style injector helper
pub const DEFAULT_STYLE_INJECTOR: &str = "~vue-runtime-helpers/dist/inject-style/browser.js";

/// Default server-side style injector helper
pub const DEFAULT_STYLE_INJECTOR_SSR: &str = "~vue-runtime-helpers/dist/inject-style/server.js";

/// Built-in language per block type, used when a block declares no `lang`
pub fn builtin_default_lang() -> BTreeMap<String, String> {
    [("template", "html"), ("styles", "css"), ("script", "js")]
        .into_iter()
        .map(|(kind, lang)| (kind.to_string(), lang.to_string()))
        .collect()
}

/// Built-in asset url rewriting table handed to the template compiler
pub fn builtin_transform_asset_urls() -> BTreeMap<String, Vec<String>> {
    let mut urls = BTreeMap::new();
    urls.insert("video".to_string(), vec!["src".to_string(), "poster".to_string()]);
    urls.insert("source".to_string(), vec!["src".to_string()]);
    urls.insert("img".to_string(), vec!["src".to_string()]);
    urls.insert("image".to_string(), vec!["xlink:href".to_string()]);
    urls
}

/// Plugin configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
/// Function-valued options (custom block predicates, computed headers,
/// pre-assembly hooks) cannot be expressed here and are supplied
/// programmatically on top of this structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VueConfig {
    /// Glob patterns of files handled by the transform hook
    pub include: Vec<String>,
    /// Glob patterns excluded from the transform hook
    pub exclude: Vec<String>,
    /// Custom block tags; `!tag` denies, `*` means all
    pub custom_blocks: Option<Vec<String>>,
    /// Per-block-type language overrides (`template`, `styles`, `script`, or a custom tag)
    pub default_lang: BTreeMap<String, String>,
    /// `false` switches to CSS extraction mode
    pub css: bool,
    /// Attach `__file` to the exported component
    pub expose_filename: bool,
    /// Literal headers prepended to style blocks, keyed by language
    pub data: BTreeMap<String, String>,
    /// Deprecated: tags to deny, folded into `custom_blocks` as `!tag`
    pub black_list_custom_blocks: Option<Vec<String>>,
    /// Deprecated: tags to allow, folded into `custom_blocks`
    pub white_list_custom_blocks: Option<Vec<String>>,
    /// Template compiler options
    pub template: TemplateConfig,
    /// Load styles through `@microsoft/load-themed-styles` instead of injecting them
    pub use_spfx_theme_loading: bool,
    /// Component normalizer module (`~` prefix: import it)
    pub normalizer: Option<String>,
    /// Browser style injector module
    pub style_injector: Option<String>,
    /// Server-side style injector module
    #[serde(rename = "styleInjectorSSR")]
    pub style_injector_ssr: Option<String>,
    /// Ask the parser for per-block source maps
    pub need_map: bool,
    /// Source root recorded in generated maps
    pub source_root: Option<String>,
    /// Directory from which runtime helper packages are resolved
    pub helpers_dir: Option<String>,
}

impl Default for VueConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            custom_blocks: None,
            default_lang: BTreeMap::new(),
            css: true,
            expose_filename: false,
            data: BTreeMap::new(),
            black_list_custom_blocks: None,
            white_list_custom_blocks: None,
            template: TemplateConfig::default(),
            use_spfx_theme_loading: false,
            normalizer: None,
            style_injector: None,
            style_injector_ssr: None,
            need_map: true,
            source_root: None,
            helpers_dir: None,
        }
    }
}

impl VueConfig {
    /// Whether CSS extraction mode is enabled (`css: false`)
    pub fn extract_css(&self) -> bool {
        !self.css
    }

    /// Language table with user overrides applied over the built-in defaults
    pub fn merged_default_lang(&self) -> BTreeMap<String, String> {
        let mut langs = builtin_default_lang();
        langs.extend(self.default_lang.clone());
        langs
    }

    /// Include patterns, falling back to [`DEFAULT_INCLUDE`]
    pub fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            self.include.clone()
        }
    }

    /// Normalizer module with the default applied
    pub fn normalizer(&self) -> &str {
        self.normalizer.as_deref().unwrap_or(DEFAULT_NORMALIZER)
    }

    /// Browser style injector with the default applied
    pub fn style_injector(&self) -> &str {
        self.style_injector.as_deref().unwrap_or(DEFAULT_STYLE_INJECTOR)
    }

    /// SSR style injector with the default applied
    pub fn style_injector_ssr(&self) -> &str {
        self.style_injector_ssr
            .as_deref()
            .unwrap_or(DEFAULT_STYLE_INJECTOR_SSR)
    }
}

/// Options forwarded to the template compiler
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateConfig {
    /// Explicit production flag; `None` defers to the environment
    pub is_production: Option<bool>,
    /// Extra asset url rewrites, merged over the built-in table
    pub transform_asset_urls: BTreeMap<String, Vec<String>>,
}

impl TemplateConfig {
    /// Asset url table with user entries applied over the built-in defaults
    pub fn merged_transform_asset_urls(&self) -> BTreeMap<String, Vec<String>> {
        let mut urls = builtin_transform_asset_urls();
        urls.extend(self.transform_asset_urls.clone());
        urls
    }
}

/// The bundler hooks, used to route log output per hook
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    Resolve,
    Load,
    Transform,
}

impl Hook {
    /// Get the string name of the hook
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Resolve => "resolve",
            Hook::Load => "load",
            Hook::Transform => "transform",
        }
    }

    /// Get the log target name for this hook
    pub fn target(&self) -> String {
        format!("vuepart::{}", self.as_str())
    }
}

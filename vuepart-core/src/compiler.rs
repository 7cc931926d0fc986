//! Collaborator traits
//!
//! The pipeline never parses or compiles anything itself. It delegates to
//! four collaborators, each a [`Component`]: a composite-file parser, a
//! template compiler, a style compiler and an assembler that stitches the
//! compiled pieces into one module.

use crate::component::Component;
use crate::descriptor::{Block, Descriptor, SourceMap};
use crate::error::ParseError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Options handed to the parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Produce a source map per block
    pub need_map: bool,
    /// Source root recorded in the maps
    pub source_root: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            need_map: true,
            source_root: None,
        }
    }
}

/// Splits a composite file into a [`Descriptor`]
pub trait SfcParser: Component {
    fn parse(
        &self,
        source: &str,
        filename: &Path,
        options: &ParseOptions,
    ) -> Result<Descriptor, ParseError>;
}

/// Options handed to the template compiler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateCompileOptions {
    pub is_production: bool,
    /// Element name to the attributes holding asset urls
    pub transform_asset_urls: BTreeMap<String, Vec<String>>,
}

/// Output of the template compiler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledTemplate {
    /// Render function module code
    pub code: String,
    /// Fatal diagnostics
    pub errors: Vec<String>,
    /// Non-fatal hints
    pub tips: Vec<String>,
    /// Template declared `functional`
    pub functional: bool,
}

/// Turns a template block into render code
pub trait TemplateCompiler: Component {
    fn compile_template(
        &self,
        filename: &Path,
        template: &Block,
        options: &TemplateCompileOptions,
    ) -> CompiledTemplate;
}

/// Output of the style compiler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledStyle {
    pub code: String,
    pub map: Option<SourceMap>,
    /// Fatal diagnostics; the first one aborts the transform
    pub errors: Vec<String>,
    /// CSS modules class name table
    pub modules: Option<BTreeMap<String, String>>,
    /// Binding name of the CSS modules table, e.g. `$style`
    pub module_name: Option<String>,
    pub scoped: bool,
    pub media: Option<String>,
}

impl CompiledStyle {
    /// Create a compiled style with only code
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Whether the style is a CSS module
    pub fn is_module(&self) -> bool {
        self.module_name.is_some() || self.modules.is_some()
    }
}

/// Compiles and scopes one style block
pub trait StyleCompiler: Component {
    fn compile_style(&self, filename: &Path, scope_id: &str, style: &Block) -> CompiledStyle;
}

/// Synthetic script handed to the assembler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptSource {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// Everything the assembler needs to emit the component module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssembleInput {
    pub scope_id: String,
    pub styles: Vec<CompiledStyle>,
    /// Always empty; custom blocks are re-exported after assembly
    pub custom_blocks: Vec<Block>,
    pub template: Option<CompiledTemplate>,
    pub script: ScriptSource,
}

/// Runtime helper modules and build flags for the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct AssembleOptions {
    /// Component normalizer; a leading `~` means "import this module"
    pub normalizer: String,
    pub style_injector: String,
    pub style_injector_ssr: String,
    pub is_production: bool,
    /// Build target is the server (`VUE_ENV=server`)
    pub is_server: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            normalizer: vuepart_config::DEFAULT_NORMALIZER.to_string(),
            style_injector: vuepart_config::DEFAULT_STYLE_INJECTOR.to_string(),
            style_injector_ssr: vuepart_config::DEFAULT_STYLE_INJECTOR_SSR.to_string(),
            is_production: false,
            is_server: false,
        }
    }
}

/// Final component module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssembledModule {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// Stitches compiled pieces into one module
pub trait Assembler: Component {
    fn assemble(
        &self,
        filename: &Path,
        input: AssembleInput,
        options: &AssembleOptions,
    ) -> AssembledModule;
}

/// Hook run on the assembler input right before assembly
pub type BeforeAssemble = Arc<dyn Fn(AssembleInput) -> AssembleInput + Send + Sync>;

/// Header prepended to style blocks of one language
#[derive(Clone)]
pub enum DataHeader {
    Literal(String),
    /// Evaluated on every use
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

impl DataHeader {
    /// Current header text
    pub fn render(&self) -> String {
        match self {
            DataHeader::Literal(text) => text.clone(),
            DataHeader::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DataHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataHeader::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            DataHeader::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<String> for DataHeader {
    fn from(text: String) -> Self {
        DataHeader::Literal(text)
    }
}

impl From<&str> for DataHeader {
    fn from(text: &str) -> Self {
        DataHeader::Literal(text.to_string())
    }
}

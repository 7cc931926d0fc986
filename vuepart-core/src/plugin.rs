//! The bundler-facing plugin: resolve, load and transform hooks
//!
//! # Protocol
//! 1. `transform` runs on a composite file, publishes its descriptor to the
//!    store and returns a synthetic module importing each block by virtual id.
//! 2. The host feeds those ids back through `resolve_id`, which makes them
//!    absolute (or redirects blocks with an external `src`).
//! 3. `load` serves the addressed block out of the store.
//!
//! A resolve/load for a file that has not been transformed yet fails with
//! [`PluginError::NotYetProcessed`].

use crate::assemble::NormalizeAssembler;
use crate::compiler::{
    AssembleInput, AssembleOptions, Assembler, BeforeAssemble, CompiledStyle, CompiledTemplate,
    DataHeader, ParseOptions, ScriptSource, SfcParser, StyleCompiler, TemplateCompileOptions,
    TemplateCompiler,
};
use crate::custom_blocks::{merge_deprecated_lists, CustomBlockFilter, CustomBlocks};
use crate::descriptor::{Block, Descriptor, SourceMap};
use crate::error::PluginError;
use crate::filter::IdFilter;
use crate::parser::BlockSplitter;
use crate::request::{BlockKind, PartRequestCodec};
use crate::require_import::transform_require_to_import;
use crate::resolve::{normalize_path, parent_dir, PackageResolver};
use crate::scope_id::scope_id;
use crate::store::DescriptorStore;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vuepart_config::VueConfig;
use vuepart_vfs::{NativeFileSystem, VirtualFileSystem};

/// Ids in this namespace resolve to the installed runtime helpers
pub const HELPERS_NAMESPACE: &str = "vue-runtime-helpers/";

static LEADING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s+").expect("valid whitespace pattern"));

/// Production and server flags of the current build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildEnv {
    pub is_production: bool,
    /// `VUE_ENV=server`
    pub is_server: bool,
}

impl BuildEnv {
    /// Derive the flags from the config and the process environment
    ///
    /// An explicit `template.isProduction` wins; otherwise `NODE_ENV` or
    /// `BUILD` set to `production` turns production mode on.
    pub fn detect(config: &VueConfig) -> Self {
        let is_production = config
            .template
            .is_production
            .unwrap_or_else(|| env_is("NODE_ENV", "production") || env_is("BUILD", "production"));
        Self {
            is_production,
            is_server: env_is("VUE_ENV", "server"),
        }
    }

    /// Name of the build target for logs
    pub fn target(&self) -> &'static str {
        if self.is_server {
            "server"
        } else {
            "browser"
        }
    }
}

fn env_is(key: &str, expected: &str) -> bool {
    std::env::var(key).is_ok_and(|value| value == expected)
}

/// Full plugin options: the serializable config plus function-valued options
#[derive(Clone, Default)]
pub struct PluginOptions {
    pub config: VueConfig,
    /// Overrides `config.custom_blocks`, e.g. with a predicate
    pub custom_blocks: Option<CustomBlocks>,
    /// Style headers by language, applied over `config.data`
    pub data: BTreeMap<String, DataHeader>,
    pub before_assemble: Option<BeforeAssemble>,
    /// Overrides [`BuildEnv::detect`]
    pub build: Option<BuildEnv>,
}

impl PluginOptions {
    pub fn new(config: VueConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_custom_blocks(mut self, custom_blocks: CustomBlocks) -> Self {
        self.custom_blocks = Some(custom_blocks);
        self
    }

    pub fn with_data_header(mut self, lang: impl Into<String>, header: impl Into<DataHeader>) -> Self {
        self.data.insert(lang.into(), header.into());
        self
    }

    pub fn with_before_assemble(mut self, hook: BeforeAssemble) -> Self {
        self.before_assemble = Some(hook);
        self
    }

    pub fn with_build(mut self, build: BuildEnv) -> Self {
        self.build = Some(build);
        self
    }
}

impl From<VueConfig> for PluginOptions {
    fn from(config: VueConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("config", &self.config)
            .field("custom_blocks", &self.custom_blocks)
            .field("data", &self.data)
            .field("before_assemble", &self.before_assemble.is_some())
            .field("build", &self.build)
            .finish()
    }
}

/// The external compilers the pipeline delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub parser: Arc<dyn SfcParser>,
    pub template_compiler: Arc<dyn TemplateCompiler>,
    pub style_compiler: Arc<dyn StyleCompiler>,
    pub assembler: Arc<dyn Assembler>,
}

impl Collaborators {
    /// Use the given compilers with the built-in parser and assembler
    pub fn new(
        template_compiler: Arc<dyn TemplateCompiler>,
        style_compiler: Arc<dyn StyleCompiler>,
    ) -> Self {
        Self {
            parser: Arc::new(BlockSplitter::new()),
            template_compiler,
            style_compiler,
            assembler: Arc::new(NormalizeAssembler::new()),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn SfcParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn Assembler>) -> Self {
        self.assembler = assembler;
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("parser", &self.parser.metadata().name)
            .field("template_compiler", &self.template_compiler.metadata().name)
            .field("style_compiler", &self.style_compiler.metadata().name)
            .field("assembler", &self.assembler.metadata().name)
            .finish()
    }
}

/// Result of the load hook
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutput {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// Result of the transform hook
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub code: String,
    /// Never absent; empty mappings when the assembler produced none
    pub map: SourceMap,
    /// Non-fatal template compiler tips
    pub warnings: Vec<String>,
}

/// Composite-file plugin implementing the three bundler hooks
pub struct VuePlugin {
    config: VueConfig,
    build: BuildEnv,
    codec: PartRequestCodec,
    filter: IdFilter,
    custom_blocks: CustomBlockFilter,
    data: BTreeMap<String, DataHeader>,
    before_assemble: Option<BeforeAssemble>,
    store: DescriptorStore,
    resolver: PackageResolver,
    cwd: PathBuf,
    collaborators: Collaborators,
}

impl VuePlugin {
    /// Build the plugin with a fresh store, reading the native file system
    pub fn new(options: PluginOptions, collaborators: Collaborators) -> Result<Self, PluginError> {
        let PluginOptions {
            config,
            custom_blocks,
            data,
            before_assemble,
            build,
        } = options;

        let build = build.unwrap_or_else(|| BuildEnv::detect(&config));
        info!(target: "vuepart", "Version {}", env!("CARGO_PKG_VERSION"));
        debug!(
            target: "vuepart",
            "Build environment: {}",
            if build.is_production { "production" } else { "development" }
        );
        debug!(target: "vuepart", "Build target: {}", build.target());

        if config.black_list_custom_blocks.is_some() {
            warn!(target: "vuepart", "`blackListCustomBlocks` option is deprecated use `customBlocks`.");
        }
        if config.white_list_custom_blocks.is_some() {
            warn!(target: "vuepart", "`whiteListCustomBlocks` option is deprecated use `customBlocks`.");
        }
        let setting = custom_blocks.or_else(|| config.custom_blocks.clone().map(CustomBlocks::Tags));
        let (setting, _) = merge_deprecated_lists(
            setting,
            config.white_list_custom_blocks.as_deref(),
            config.black_list_custom_blocks.as_deref(),
        );

        let mut headers: BTreeMap<String, DataHeader> = config
            .data
            .iter()
            .map(|(lang, text)| (lang.clone(), DataHeader::Literal(text.clone())))
            .collect();
        headers.extend(data);

        if config.extract_css() {
            debug!(target: "vuepart", "Running in CSS extract mode");
        }
        debug!(target: "vuepart", ?collaborators, "collaborators ready");

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self {
            codec: PartRequestCodec::new(config.merged_default_lang()),
            filter: IdFilter::new(&config.include_patterns(), &config.exclude)?,
            custom_blocks: CustomBlockFilter::new(setting.as_ref()),
            data: headers,
            before_assemble,
            store: DescriptorStore::new(),
            resolver: PackageResolver::new(Arc::new(NativeFileSystem::new())),
            cwd,
            build,
            config,
            collaborators,
        })
    }

    /// Share an existing descriptor store
    pub fn with_store(mut self, store: DescriptorStore) -> Self {
        self.store = store;
        self
    }

    /// Resolve packages through another file system
    pub fn with_vfs(mut self, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        self.resolver = PackageResolver::new(vfs);
        self
    }

    /// Base directory for relative importers and helper lookup
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn codec(&self) -> &PartRequestCodec {
        &self.codec
    }

    pub fn build(&self) -> BuildEnv {
        self.build
    }

    /// Resolve hook
    ///
    /// Returns `None` for ids this plugin does not own.
    pub fn resolve_id(&self, id: &str, importer: Option<&str>) -> Result<Option<String>, PluginError> {
        if id.starts_with(HELPERS_NAMESPACE) {
            let helpers_dir = self
                .config
                .helpers_dir
                .as_ref()
                .map_or_else(|| self.cwd.clone(), |dir| self.absolute(Path::new(dir)));
            let resolved = self.resolver.resolve(id, &helpers_dir)?;
            debug!(target: "vuepart::resolve", from = id, to = %resolved.display(), "helper");
            return Ok(Some(resolved.to_string_lossy().into_owned()));
        }

        if !self.codec.is_part_request(id) {
            return Ok(None);
        }

        let importer_dir = importer.map_or_else(|| self.cwd.clone(), |path| parent_dir(Path::new(path)));
        let absolute = normalize_path(&self.absolute(&importer_dir).join(id));
        let absolute = absolute.to_string_lossy().into_owned();
        let Some(request) = self.codec.parse_request(&absolute) else {
            return Ok(None);
        };

        let block = self.store.resolve(&request)?;
        if request.meta.kind != BlockKind::Styles {
            if let Some(src) = &block.src {
                let dir = parent_dir(&request.filename);
                let external = if src.starts_with('.') {
                    normalize_path(&dir.join(src))
                } else {
                    self.resolver.resolve(src, &dir)?
                };
                debug!(target: "vuepart::resolve", from = id, to = %external.display(), "external src");
                return Ok(Some(external.to_string_lossy().into_owned()));
            }
        }

        debug!(target: "vuepart::resolve", from = id, to = %absolute, "virtual block");
        Ok(Some(absolute))
    }

    /// Load hook
    ///
    /// Serves the extracted compiled code of a block when present, its raw
    /// content otherwise. Raw style content gets the header for its language.
    pub fn load(&self, id: &str) -> Result<Option<LoadOutput>, PluginError> {
        let Some(request) = self.codec.parse_request(id) else {
            return Ok(None);
        };
        let block = self.store.resolve(&request)?;

        let code = if block.code.is_none() && request.meta.kind == BlockKind::Styles {
            self.prepend_header(&request.meta.lang, &block.content)
        } else {
            block.served_code().to_string()
        };
        debug!(target: "vuepart::load", id, code = %code, "served block");

        Ok(Some(LoadOutput { code, map: block.map }))
    }

    /// Transform hook
    ///
    /// Returns `None` for files outside the include/exclude filter.
    pub fn transform(&self, source: &str, filename: &str) -> Result<Option<TransformOutput>, PluginError> {
        if !self.filter.matches(filename) {
            return Ok(None);
        }
        let path = Path::new(filename);
        let options = ParseOptions {
            need_map: self.config.need_map,
            source_root: self.config.source_root.clone(),
        };
        let mut descriptor = self
            .collaborators
            .parser
            .parse(source, path, &options)
            .map_err(|source| PluginError::Parse {
                filename: path.to_path_buf(),
                source,
            })?;
        self.store.insert(path, descriptor.clone());

        let scope_id = scope_id(path, source, self.build.is_production);
        let mut styles = self.compile_styles(path, &scope_id, &descriptor)?;

        let mut warnings = Vec::new();
        let template = descriptor
            .template
            .as_ref()
            .map(|block| self.compile_template(path, block, &mut warnings))
            .transpose()?;

        let mut script = self.synthetic_script(path, &descriptor, &styles);
        if self.config.use_spfx_theme_loading {
            styles.clear();
        }

        if self.config.extract_css() && !styles.is_empty() {
            styles = self.extract_styles(path, &mut descriptor, styles, &mut script);
            self.store.insert(path, descriptor.clone());
        }

        let exports = self.custom_block_exports(path, &descriptor);
        let script = LEADING_WHITESPACE.replace_all(&script, "").into_owned();

        let mut input = AssembleInput {
            scope_id,
            styles,
            custom_blocks: Vec::new(),
            template,
            script: ScriptSource {
                code: script,
                map: None,
            },
        };
        if let Some(hook) = &self.before_assemble {
            input = hook(input);
        }
        let assembled = self
            .collaborators
            .assembler
            .assemble(path, input, &self.assemble_options());

        let mut code = assembled.code;
        for export in &exports {
            code.push('\n');
            code.push_str(export);
        }
        let map = assembled.map.unwrap_or_else(SourceMap::empty);
        debug!(target: "vuepart::transform", id = filename, code = %code, "assembled");

        Ok(Some(TransformOutput { code, map, warnings }))
    }

    fn compile_styles(
        &self,
        path: &Path,
        scope_id: &str,
        descriptor: &Descriptor,
    ) -> Result<Vec<CompiledStyle>, PluginError> {
        let compiler = &self.collaborators.style_compiler;
        descriptor
            .styles
            .iter()
            .map(|style| {
                let mut input = style.clone();
                if !input.content.is_empty() {
                    let lang = style.lang.as_deref().unwrap_or("css");
                    input.content = self.prepend_header(lang, &style.content);
                }
                let compiled = compiler.compile_style(path, scope_id, &input);
                if compiled.errors.is_empty() {
                    Ok(compiled)
                } else {
                    Err(PluginError::StyleCompile {
                        filename: path.to_path_buf(),
                        compiler: compiler.metadata().name,
                        errors: compiled.errors,
                    })
                }
            })
            .collect()
    }

    fn compile_template(
        &self,
        path: &Path,
        block: &Block,
        warnings: &mut Vec<String>,
    ) -> Result<CompiledTemplate, PluginError> {
        let compiler = &self.collaborators.template_compiler;
        let options = TemplateCompileOptions {
            is_production: self.build.is_production,
            transform_asset_urls: self.config.template.merged_transform_asset_urls(),
        };

        let mut compiled = compiler.compile_template(path, block, &options);
        compiled.code = transform_require_to_import(&compiled.code);
        if !compiled.errors.is_empty() {
            return Err(PluginError::TemplateCompile {
                filename: path.to_path_buf(),
                compiler: compiler.metadata().name,
                errors: compiled.errors,
            });
        }
        for tip in &compiled.tips {
            warn!(target: "vuepart::transform", file = %path.display(), "{tip}");
        }
        warnings.extend(compiled.tips.iter().cloned());
        Ok(compiled)
    }

    /// Entry script re-exporting the script block through its virtual id
    fn synthetic_script(&self, path: &Path, descriptor: &Descriptor, styles: &[CompiledStyle]) -> String {
        let Some(block) = &descriptor.script else {
            return String::new();
        };
        let spfx = self.config.use_spfx_theme_loading;
        let id = self.codec.encode_block(path, block, BlockKind::Script, None);

        let mut lines = vec![format!("export * from '{id}'")];
        if spfx {
            lines.push("import { loadStyles } from '@microsoft/load-themed-styles'".to_string());
        }
        lines.push(format!("import script from '{id}'"));
        if spfx {
            let css = styles
                .iter()
                .map(|style| style.code.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            lines.push(format!(
                "script.beforeCreate = () => {{loadStyles(`{}\n`)}}",
                escape_template_literal(&css)
            ));
        }
        lines.push("export default script".to_string());
        if self.config.expose_filename {
            let exposed = if self.build.is_production {
                path.file_name()
                    .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
            } else {
                path.to_string_lossy()
            };
            lines.push(format!(
                "script.__file = {}",
                serde_json::Value::from(&*exposed)
            ));
        }
        lines.join("\n")
    }

    /// Persist compiled styles onto the descriptor and import the plain ones by id
    ///
    /// Scoped and CSS-module styles stay in the assembled list with empty
    /// code; the others leave the list and are imported as separate assets.
    fn extract_styles(
        &self,
        path: &Path,
        descriptor: &mut Descriptor,
        styles: Vec<CompiledStyle>,
        script: &mut String,
    ) -> Vec<CompiledStyle> {
        let mut kept = Vec::new();
        for (index, style) in styles.into_iter().enumerate() {
            let block = &mut descriptor.styles[index];
            block.code = Some(style.code.clone());

            if style.is_module() || block.scoped {
                kept.push(CompiledStyle {
                    code: String::new(),
                    map: None,
                    ..style
                });
            } else {
                let id = self.codec.encode(path, Some("css"), BlockKind::Styles, Some(index));
                script.push('\n');
                script.push_str(&format!("import '{id}'"));
            }
        }
        kept
    }

    fn custom_block_exports(&self, path: &Path, descriptor: &Descriptor) -> Vec<String> {
        descriptor
            .custom_blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| self.custom_blocks.is_allowed(&block.tag))
            .map(|(index, block)| {
                let id = self
                    .codec
                    .encode_block(path, block, BlockKind::CustomBlocks, Some(index));
                format!("export * from '{id}'")
            })
            .collect()
    }

    fn prepend_header(&self, lang: &str, code: &str) -> String {
        match self.data.get(lang) {
            Some(header) => header.render() + code,
            None => code.to_string(),
        }
    }

    fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            normalizer: self.config.normalizer().to_string(),
            style_injector: self.config.style_injector().to_string(),
            style_injector_ssr: self.config.style_injector_ssr().to_string(),
            is_production: self.build.is_production,
            is_server: self.build.is_server,
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

impl fmt::Debug for VuePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VuePlugin")
            .field("build", &self.build)
            .field("custom_blocks", &self.custom_blocks)
            .field("store_entries", &self.store.len())
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

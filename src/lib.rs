//! Vuepart - single-file component support for module bundlers
//!
//! Each block of a component is addressed as its own virtual module, so the
//! bundler routes templates, scripts, styles and custom blocks through the
//! normal loader chain.
//!
//! # Architecture
//!
//! ```text
//! vuepart-config/  - Option vocabulary (pure data, JSON round-trip)
//! vuepart-vfs/     - File system abstraction for module resolution
//! vuepart-core/    - Request codec, descriptor store, hooks
//! vuepart-cli/     - Inspect ids and blocks from the command line
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use vuepart::{Collaborators, PluginOptions, VueConfig, VuePlugin};
//!
//! let plugin = VuePlugin::new(
//!     PluginOptions::new(VueConfig::default()),
//!     Collaborators::new(template_compiler, style_compiler),
//! )?;
//! let entry = plugin.transform(&source, "/src/App.vue")?;
//! ```

pub use vuepart_config as config;
pub use vuepart_core as core;
pub use vuepart_vfs as vfs;

// common types
pub use vuepart_config::{Hook, TemplateConfig, VueConfig};
pub use vuepart_core::{
    Block, BlockKind, BlockRef, BuildEnv, Collaborators, CompiledStyle, CompiledTemplate,
    CustomBlockFilter, CustomBlocks, DataHeader, Descriptor, DescriptorStore, LoadOutput,
    PartRequestCodec, PluginError, PluginOptions, SfcParser, StyleCompiler, TemplateCompiler,
    TransformOutput, VirtualRequest, VuePlugin,
};

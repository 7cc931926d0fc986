//! Vuepart Core
//!
//! Virtual-module addressing and the transform pipeline for single-file
//! components.

pub mod component;
pub mod compiler;
pub mod custom_blocks;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod plugin;
pub mod request;
pub mod require_import;
pub mod resolve;
pub mod scope_id;
pub mod store;

// Built-in collaborators
pub mod assemble;
pub mod parser;

pub use component::{Component, ComponentExt, ComponentKind, ComponentMetadata};
pub use compiler::{
    AssembleInput, AssembleOptions, AssembledModule, Assembler, BeforeAssemble, CompiledStyle,
    CompiledTemplate, DataHeader, ParseOptions, ScriptSource, SfcParser, StyleCompiler,
    TemplateCompileOptions, TemplateCompiler,
};
pub use custom_blocks::{CustomBlockFilter, CustomBlocks, TagPredicate};
pub use descriptor::{AttrValue, Block, Descriptor, SourceMap};
pub use error::{ParseError, PluginError};
pub use filter::IdFilter;
pub use plugin::{BuildEnv, Collaborators, LoadOutput, PluginOptions, TransformOutput, VuePlugin};
pub use request::{BlockKind, BlockRef, PartRequestCodec, VirtualRequest, PARAM_NAME};
pub use require_import::transform_require_to_import;
pub use resolve::PackageResolver;
pub use scope_id::scope_id;
pub use store::DescriptorStore;

pub use assemble::NormalizeAssembler;
pub use parser::BlockSplitter;

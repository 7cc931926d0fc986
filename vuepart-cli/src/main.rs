//! Vuepart CLI - inspect how single-file components are addressed
//!
//! Reads plugin options from a JSON config file (default: ./vue.config.json)

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use vuepart_config::VueConfig;
use vuepart_core::custom_blocks::merge_deprecated_lists;
use vuepart_core::{
    Block, BlockKind, BlockSplitter, CustomBlockFilter, CustomBlocks, Descriptor, ParseOptions,
    PartRequestCodec, SfcParser,
};

mod config;
mod logging;

use crate::config::{parse_level, LogConfig};
use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "vuepart",
    about = "Virtual block ids for single-file components",
    version
)]
struct Cli {
    /// Plugin configuration file
    #[arg(long, global = true, default_value = "vue.config.json")]
    config: PathBuf,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the virtual id of one block
    Encode {
        /// Owning component file
        file: PathBuf,
        /// Block type: template, script, styles, customBlocks
        #[arg(long = "type")]
        kind: BlockKind,
        /// Position in the styles or customBlocks list
        #[arg(long)]
        index: Option<usize>,
        /// Block language; the configured default applies when omitted
        #[arg(long)]
        lang: Option<String>,
    },
    /// Decode a virtual id into its block reference
    Decode {
        id: String,
    },
    /// Parse a component and list the virtual id of every block
    Blocks {
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let Some(level) = parse_level(&cli.log_level) else {
        eprintln!("Error: unknown log level '{}'", cli.log_level);
        process::exit(2);
    };
    logging::init(&LogConfig::with_global(level), cli.log_format);

    let config = match read_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let codec = PartRequestCodec::new(config.merged_default_lang());

    let result = match cli.command {
        Command::Encode {
            file,
            kind,
            index,
            lang,
        } => encode(&codec, &file, kind, index, lang.as_deref()),
        Command::Decode { id } => decode(&codec, &id),
        Command::Blocks { file } => blocks(&config, &codec, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Read the config file; a missing file means all defaults
fn read_config(path: &Path) -> Result<VueConfig, String> {
    if !path.exists() {
        debug!(target: "vuepart", path = %path.display(), "no config file, using defaults");
        return Ok(VueConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let config = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;
    info!(target: "vuepart", path = %path.display(), "loaded config");
    Ok(config)
}

fn encode(
    codec: &PartRequestCodec,
    file: &Path,
    kind: BlockKind,
    index: Option<usize>,
    lang: Option<&str>,
) -> Result<(), String> {
    if kind.is_list() && index.is_none() {
        return Err(format!("--index is required for {kind} blocks"));
    }
    println!("{}", codec.encode(file, lang, kind, index));
    Ok(())
}

/// A decoded id as printed by `decode`
#[derive(Debug, Serialize)]
struct DecodedId {
    filename: Option<String>,
    #[serde(rename = "type")]
    kind: &'static str,
    lang: String,
    index: Option<usize>,
}

fn decode(codec: &PartRequestCodec, id: &str) -> Result<(), String> {
    let meta = codec
        .decode(id)
        .ok_or_else(|| format!("'{id}' is not a block request"))?;
    let output = DecodedId {
        filename: codec
            .parse_request(id)
            .map(|request| request.filename.display().to_string()),
        kind: meta.kind.as_str(),
        lang: meta.lang,
        index: meta.index,
    };
    println!("{}", to_pretty(&output)?);
    Ok(())
}

fn blocks(config: &VueConfig, codec: &PartRequestCodec, file: &Path) -> Result<(), String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))?;
    let options = ParseOptions {
        need_map: false,
        source_root: config.source_root.clone(),
    };
    let descriptor = BlockSplitter::new()
        .parse(&source, file, &options)
        .map_err(|e| format!("cannot parse '{}': {}", file.display(), e))?;

    let (setting, deprecated) = merge_deprecated_lists(
        config.custom_blocks.clone().map(CustomBlocks::Tags),
        config.white_list_custom_blocks.as_deref(),
        config.black_list_custom_blocks.as_deref(),
    );
    if deprecated {
        tracing::warn!(
            target: "vuepart",
            "whiteListCustomBlocks and blackListCustomBlocks are deprecated, use customBlocks"
        );
    }
    let filter = CustomBlockFilter::new(setting.as_ref());

    println!("{}", to_pretty(&describe(codec, &filter, file, &descriptor))?);
    Ok(())
}

/// One line of the `blocks` listing
#[derive(Debug, Serialize)]
struct BlockEntry {
    tag: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scoped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<bool>,
    /// Custom blocks only: whether the component module re-exports it
    #[serde(skip_serializing_if = "Option::is_none")]
    exported: Option<bool>,
}

impl BlockEntry {
    fn new(id: String, block: &Block) -> Self {
        Self {
            tag: block.tag.clone(),
            id,
            src: block.src.clone(),
            scoped: None,
            module: None,
            exported: None,
        }
    }
}

/// One entry per block, in addressing order
fn describe(
    codec: &PartRequestCodec,
    filter: &CustomBlockFilter,
    file: &Path,
    descriptor: &Descriptor,
) -> Vec<BlockEntry> {
    let mut entries = Vec::new();

    if let Some(template) = &descriptor.template {
        let id = codec.encode_block(file, template, BlockKind::Template, None);
        entries.push(BlockEntry::new(id, template));
    }
    if let Some(script) = &descriptor.script {
        let id = codec.encode_block(file, script, BlockKind::Script, None);
        entries.push(BlockEntry::new(id, script));
    }
    for (index, style) in descriptor.styles.iter().enumerate() {
        let id = codec.encode_block(file, style, BlockKind::Styles, Some(index));
        entries.push(BlockEntry {
            scoped: Some(style.scoped),
            module: Some(style.module),
            ..BlockEntry::new(id, style)
        });
    }
    for (index, block) in descriptor.custom_blocks.iter().enumerate() {
        let id = codec.encode_block(file, block, BlockKind::CustomBlocks, Some(index));
        entries.push(BlockEntry {
            exported: Some(filter.is_allowed(&block.tag)),
            ..BlockEntry::new(id, block)
        });
    }
    entries
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

//! Error types for the plugin core
//!
//! Addressing failures are not errors: the request codec answers `None` for
//! ids it does not own. Everything here aborts the hook call that raised it.

use crate::request::BlockKind;
use std::path::PathBuf;
use thiserror::Error;
use vuepart_vfs::VfsError;

/// Main plugin error type
#[derive(Error, Debug)]
pub enum PluginError {
    /// A resolve/load call arrived before any transform of that file
    #[error("File not processed yet, {}", .filename.display())]
    NotYetProcessed { filename: PathBuf },

    /// The file is known but the addressed block does not exist
    #[error(
        "Requested (type={kind} & index={}) block not found in {}",
        index_label(.index),
        .filename.display()
    )]
    BlockNotFound {
        filename: PathBuf,
        kind: BlockKind,
        index: Option<usize>,
    },

    /// The parser rejected the composite file
    #[error("failed to parse {}: {source}", .filename.display())]
    Parse {
        filename: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The style compiler reported errors
    #[error("style compile error [{compiler}] in {}: {}", .filename.display(), first(.errors))]
    StyleCompile {
        filename: PathBuf,
        compiler: &'static str,
        errors: Vec<String>,
    },

    /// The template compiler reported errors
    #[error("template compile error [{compiler}] in {}: {}", .filename.display(), first(.errors))]
    TemplateCompile {
        filename: PathBuf,
        compiler: &'static str,
        errors: Vec<String>,
    },

    /// A helper or external `src` specifier could not be located
    #[error("cannot resolve '{specifier}' from {}", .from.display())]
    Unresolved { specifier: String, from: PathBuf },

    /// Invalid plugin options
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file system error: {0}")]
    Vfs(#[from] VfsError),
}

/// Error reported by a composite-file parser
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    /// Human readable description
    pub message: String,
    /// Byte offset into the source, when known
    pub offset: Option<usize>,
}

impl ParseError {
    /// Create a parse error without location
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    /// Create a parse error at a byte offset
    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

fn index_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => i.to_string(),
        None => "undefined".to_string(),
    }
}

fn first(errors: &[String]) -> &str {
    errors.first().map(String::as_str).unwrap_or("unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_yet_processed_message() {
        let err = PluginError::NotYetProcessed {
            filename: PathBuf::from("/src/App.vue"),
        };
        assert_eq!(err.to_string(), "File not processed yet, /src/App.vue");
    }

    #[test]
    fn test_block_not_found_message() {
        let err = PluginError::BlockNotFound {
            filename: PathBuf::from("/src/App.vue"),
            kind: BlockKind::Styles,
            index: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "Requested (type=styles & index=3) block not found in /src/App.vue"
        );

        let err = PluginError::BlockNotFound {
            filename: PathBuf::from("/src/App.vue"),
            kind: BlockKind::Template,
            index: None,
        };
        assert!(err.to_string().contains("type=template & index=undefined"));
    }

    #[test]
    fn test_compile_error_reports_first() {
        let err = PluginError::StyleCompile {
            filename: PathBuf::from("/a.vue"),
            compiler: "sass",
            errors: vec!["unexpected }".to_string(), "second".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[sass]"));
        assert!(msg.contains("unexpected }"));
        assert!(!msg.contains("second"));
    }

    #[test]
    fn test_vfs_error_conversion() {
        let err: PluginError = VfsError::NotFound {
            path: "/x".to_string(),
        }
        .into();
        assert!(matches!(err, PluginError::Vfs(_)));
    }
}

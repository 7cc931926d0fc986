//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A native OS file system implementation.
///
/// Wraps `std::fs`. With a base directory, relative paths are resolved
/// against it instead of the process working directory.
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a native file system resolving relative paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn full_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match &self.base {
            Some(base) if path.is_relative() => Cow::Owned(base.join(path)),
            _ => Cow::Borrowed(path),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full = self.full_path(path);
        std::fs::read(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VfsError::NotFound {
                    path: full.to_string_lossy().to_string(),
                }
            } else {
                e.into()
            }
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.full_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.full_path(path).is_dir()
    }
}

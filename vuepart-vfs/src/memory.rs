//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// An in-memory file system implementation.
///
/// Files are stored in a `BTreeMap` keyed by normalized path. Directories
/// are implicit: a path is a directory when some stored file lives below it.
///
/// # Example
/// ```
/// use vuepart_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::with_files([("/src/App.vue", "<template/>")]);
/// assert_eq!(fs.read_to_string(Path::new("/src/App.vue")).unwrap(), "<template/>");
/// assert!(fs.is_dir(Path::new("/src")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with files.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<Path>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.insert(path, content);
        }
        fs
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let key = normalize(path.as_ref());
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, content.into());
    }

    /// Remove a file, returning its previous content.
    pub fn remove(&self, path: &Path) -> Option<Vec<u8>> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(path))
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no file is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalize a path for internal storage: forward slashes, no trailing slash.
fn normalize(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    if text.len() > 1 {
        text.trim_end_matches('/').to_string()
    } else {
        text
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let key = normalize(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .get(&key)
            .cloned()
            .ok_or(VfsError::NotFound { path: key })
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let key = normalize(path);
        let prefix = if key.ends_with('/') {
            key
        } else {
            format!("{}/", key)
        };
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(name, _)| name.starts_with(&prefix))
    }
}

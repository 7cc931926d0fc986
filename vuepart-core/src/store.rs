//! Descriptor store and block resolution
//!
//! The store maps an absolute filename to the most recent descriptor produced
//! for it. Each transform publishes a whole new `Arc<Descriptor>`; published
//! versions are never mutated, so a resolve/load holding an older version
//! keeps a consistent view while a rebuild replaces it.

use crate::descriptor::{Block, Descriptor};
use crate::error::PluginError;
use crate::request::{BlockKind, VirtualRequest};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the per-file descriptor versions
///
/// Cloning the handle shares the underlying table, so the same store can be
/// handed to every hook implementation.
#[derive(Debug, Clone, Default)]
pub struct DescriptorStore {
    entries: Arc<RwLock<HashMap<PathBuf, Arc<Descriptor>>>>,
}

impl DescriptorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new descriptor version for `filename`, replacing any previous one
    pub fn insert(&self, filename: impl Into<PathBuf>, descriptor: Descriptor) -> Arc<Descriptor> {
        let version = Arc::new(descriptor);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(filename.into(), Arc::clone(&version));
        version
    }

    /// Current descriptor version for `filename`
    pub fn get(&self, filename: &Path) -> Option<Arc<Descriptor>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(filename)
            .cloned()
    }

    /// Drop the entry for `filename`
    pub fn remove(&self, filename: &Path) -> Option<Arc<Descriptor>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(filename)
    }

    /// Check if `filename` has been transformed
    pub fn contains(&self, filename: &Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(filename)
    }

    /// Number of files with a descriptor
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locate the block a virtual request addresses
    ///
    /// Fails with [`PluginError::NotYetProcessed`] when the file has no
    /// descriptor and with [`PluginError::BlockNotFound`] when the block is
    /// absent or the index is out of range.
    pub fn resolve(&self, request: &VirtualRequest) -> Result<Block, PluginError> {
        let descriptor = self
            .get(&request.filename)
            .ok_or_else(|| PluginError::NotYetProcessed {
                filename: request.filename.clone(),
            })?;

        select_block(&descriptor, request.meta.kind, request.meta.index)
            .cloned()
            .ok_or_else(|| PluginError::BlockNotFound {
                filename: request.filename.clone(),
                kind: request.meta.kind,
                index: request.meta.index,
            })
    }
}

/// Pick a block out of a descriptor by type and index
pub fn select_block(descriptor: &Descriptor, kind: BlockKind, index: Option<usize>) -> Option<&Block> {
    match kind {
        BlockKind::Template => descriptor.template.as_ref(),
        BlockKind::Script => descriptor.script.as_ref(),
        BlockKind::Styles => index.and_then(|i| descriptor.styles.get(i)),
        BlockKind::CustomBlocks => index.and_then(|i| descriptor.custom_blocks.get(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::BlockRef;

    fn sample() -> Descriptor {
        Descriptor {
            template: Some(Block::new("template", "<div/>")),
            script: None,
            styles: vec![Block::new("style", ".a{}"), Block::new("style", ".b{}")],
            custom_blocks: vec![Block::new("docs", "# Docs")],
        }
    }

    fn request(kind: BlockKind, index: Option<usize>) -> VirtualRequest {
        VirtualRequest {
            filename: PathBuf::from("/src/App.vue"),
            meta: BlockRef {
                kind,
                lang: "css".to_string(),
                index,
            },
        }
    }

    #[test]
    fn test_resolve_before_insert_fails() {
        let store = DescriptorStore::new();
        let err = store.resolve(&request(BlockKind::Styles, Some(0))).unwrap_err();
        assert!(matches!(err, PluginError::NotYetProcessed { .. }));
    }

    #[test]
    fn test_resolve_blocks() {
        let store = DescriptorStore::new();
        store.insert("/src/App.vue", sample());

        let style = store.resolve(&request(BlockKind::Styles, Some(1))).unwrap();
        assert_eq!(style.content, ".b{}");

        let template = store.resolve(&request(BlockKind::Template, None)).unwrap();
        assert_eq!(template.content, "<div/>");

        let docs = store.resolve(&request(BlockKind::CustomBlocks, Some(0))).unwrap();
        assert_eq!(docs.tag, "docs");
    }

    #[test]
    fn test_resolve_missing_blocks() {
        let store = DescriptorStore::new();
        store.insert("/src/App.vue", sample());

        for (kind, index) in [
            (BlockKind::Script, None),
            (BlockKind::Styles, Some(2)),
            (BlockKind::Styles, None),
            (BlockKind::CustomBlocks, Some(5)),
        ] {
            let err = store.resolve(&request(kind, index)).unwrap_err();
            match err {
                PluginError::BlockNotFound {
                    kind: k, index: i, ..
                } => {
                    assert_eq!(k, kind);
                    assert_eq!(i, index);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_insert_replaces_whole_version() {
        let store = DescriptorStore::new();
        let first = store.insert("/src/App.vue", sample());

        let mut next = sample();
        next.styles.truncate(1);
        store.insert("/src/App.vue", next);

        // the old version is untouched, the store serves the new one
        assert_eq!(first.styles.len(), 2);
        assert_eq!(store.get(Path::new("/src/App.vue")).unwrap().styles.len(), 1);
        assert!(store.resolve(&request(BlockKind::Styles, Some(1))).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clone_shares_entries() {
        let store = DescriptorStore::new();
        let handle = store.clone();
        handle.insert("/src/App.vue", sample());
        assert!(store.contains(Path::new("/src/App.vue")));
        assert!(store.remove(Path::new("/src/App.vue")).is_some());
        assert!(handle.is_empty());
    }
}

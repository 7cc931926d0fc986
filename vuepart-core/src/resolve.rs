//! Path resolution for helpers and external block sources
//!
//! Only what the hooks need: lexical path normalization and node-style
//! package lookup (`node_modules` walk, `package.json` `main`, extension and
//! `index` fallbacks) over a [`VirtualFileSystem`].

use crate::error::PluginError;
use serde::Deserialize;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;
use tracing::trace;
use vuepart_vfs::VirtualFileSystem;

const EXTENSIONS: [&str; 2] = ["js", "json"];

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Node-style module resolver
#[derive(Clone)]
pub struct PackageResolver {
    vfs: Arc<dyn VirtualFileSystem>,
}

impl PackageResolver {
    /// Create a resolver reading through `vfs`
    pub fn new(vfs: Arc<dyn VirtualFileSystem>) -> Self {
        Self { vfs }
    }

    /// Resolve `specifier` as seen from a module in `from_dir`
    ///
    /// Relative and absolute specifiers are resolved against `from_dir`,
    /// bare ones by walking up through `node_modules` directories.
    pub fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, PluginError> {
        let unresolved = || PluginError::Unresolved {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        };

        if is_path_like(specifier) {
            let base = normalize_path(&from_dir.join(specifier));
            return self.load_as_file(&base)
                .or_else(|| self.load_as_directory(&base))
                .ok_or_else(unresolved);
        }

        for dir in from_dir.ancestors() {
            if dir.file_name().map_or(false, |name| name == "node_modules") {
                continue;
            }
            let base = dir.join("node_modules").join(specifier);
            trace!(target: "vuepart::resolve", candidate = %base.display(), "package lookup");
            if let Some(found) = self
                .load_as_file(&base)
                .or_else(|| self.load_as_directory(&base))
            {
                return Ok(found);
            }
        }
        Err(unresolved())
    }

    fn load_as_file(&self, base: &Path) -> Option<PathBuf> {
        if self.vfs.is_file(base) {
            return Some(base.to_path_buf());
        }
        EXTENSIONS.iter().find_map(|ext| {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            self.vfs.is_file(&candidate).then_some(candidate)
        })
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !self.vfs.is_dir(dir) {
            return None;
        }
        let manifest = dir.join("package.json");
        if let Some(main) = self.read_main(&manifest) {
            let target = normalize_path(&dir.join(main));
            if let Some(found) = self.load_as_file(&target).or_else(|| self.load_index(&target)) {
                return Some(found);
            }
        }
        self.load_index(dir)
    }

    fn load_index(&self, dir: &Path) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("index.{ext}")))
            .find(|candidate| self.vfs.is_file(candidate))
    }

    fn read_main(&self, manifest: &Path) -> Option<String> {
        let text = self.vfs.read_to_string(manifest).ok()?;
        match serde_json::from_str::<PackageManifest>(&text) {
            Ok(manifest) => manifest.main.filter(|main| !main.is_empty()),
            Err(e) => {
                trace!(target: "vuepart::resolve", error = %e, "ignoring unreadable package.json");
                None
            }
        }
    }
}

impl std::fmt::Debug for PackageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageResolver").finish_non_exhaustive()
    }
}

fn is_path_like(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Path::new(specifier).is_absolute()
}

/// Lexically normalize a path, folding `.` and `..` without touching the disk
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(PathComponent::Normal(_)) => out.pop(),
                    Some(PathComponent::RootDir) | Some(PathComponent::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Directory part of a path, `.` when there is none
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vuepart_vfs::MemoryFileSystem;

    fn resolver(files: &[(&str, &str)]) -> PackageResolver {
        let fs = MemoryFileSystem::new();
        for (path, content) in files {
            fs.insert(path, *content);
        }
        PackageResolver::new(Arc::new(fs))
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d.vue")), PathBuf::from("/a/c/d.vue"));
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("/src/App.vue")), PathBuf::from("/src"));
        assert_eq!(parent_dir(Path::new("App.vue")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_exact_file() {
        let r = resolver(&[("/app/node_modules/vue-runtime-helpers/dist/normalize-component.js", "")]);
        let found = r
            .resolve("vue-runtime-helpers/dist/normalize-component.js", Path::new("/app/src"))
            .unwrap();
        assert_eq!(
            found,
            PathBuf::from("/app/node_modules/vue-runtime-helpers/dist/normalize-component.js")
        );
    }

    #[test]
    fn test_resolve_adds_extension() {
        let r = resolver(&[("/app/node_modules/lib/util.js", "")]);
        let found = r.resolve("lib/util", Path::new("/app")).unwrap();
        assert_eq!(found, PathBuf::from("/app/node_modules/lib/util.js"));
    }

    #[test]
    fn test_resolve_package_main() {
        let r = resolver(&[
            ("/app/node_modules/pkg/package.json", r#"{"main": "./lib/entry"}"#),
            ("/app/node_modules/pkg/lib/entry.js", ""),
            ("/app/node_modules/pkg/index.js", ""),
        ]);
        let found = r.resolve("pkg", Path::new("/app/src/deep")).unwrap();
        assert_eq!(found, PathBuf::from("/app/node_modules/pkg/lib/entry.js"));
    }

    #[test]
    fn test_resolve_index_fallback() {
        let r = resolver(&[
            ("/app/node_modules/pkg/package.json", r#"{"name": "pkg"}"#),
            ("/app/node_modules/pkg/index.js", ""),
        ]);
        let found = r.resolve("pkg", Path::new("/app")).unwrap();
        assert_eq!(found, PathBuf::from("/app/node_modules/pkg/index.js"));
    }

    #[test]
    fn test_resolve_nearest_node_modules_wins() {
        let r = resolver(&[
            ("/app/node_modules/pkg/index.js", ""),
            ("/app/src/node_modules/pkg/index.js", ""),
        ]);
        let found = r.resolve("pkg", Path::new("/app/src/components")).unwrap();
        assert_eq!(found, PathBuf::from("/app/src/node_modules/pkg/index.js"));
    }

    #[test]
    fn test_resolve_relative() {
        let r = resolver(&[("/app/src/shared/style.css", "")]);
        let found = r.resolve("../shared/style.css", Path::new("/app/src/components")).unwrap();
        assert_eq!(found, PathBuf::from("/app/src/shared/style.css"));
    }

    #[test]
    fn test_resolve_missing() {
        let r = resolver(&[]);
        let err = r.resolve("nope", Path::new("/app")).unwrap_err();
        match err {
            PluginError::Unresolved { specifier, from } => {
                assert_eq!(specifier, "nope");
                assert_eq!(from, PathBuf::from("/app"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

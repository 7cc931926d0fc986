//! Include/exclude matching for the transform hook

use crate::error::PluginError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Decides which module ids the transform hook handles
///
/// Patterns are case-insensitive globs matched against the whole id, where
/// `*` also crosses path separators. An id matches when it matches an
/// include pattern and no exclude pattern. Ids carrying a NUL byte are
/// internal to the host and never match.
#[derive(Debug, Clone)]
pub struct IdFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl IdFilter {
    /// Build a filter; an empty include list falls back to `*.vue`
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, PluginError> {
        let include = if include.is_empty() {
            build_set(&[vuepart_config::DEFAULT_INCLUDE])?
        } else {
            build_set(include)?
        };
        Ok(Self {
            include,
            exclude: build_set(exclude)?,
        })
    }

    /// Whether `id` is a composite file to transform
    pub fn matches(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }
        let path = id.replace('\\', "/");
        self.include.is_match(&path) && !self.exclude.is_match(&path)
    }
}

impl Default for IdFilter {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: GlobSet::empty(),
        }
    }
}

fn default_include() -> GlobSet {
    build_set(&[vuepart_config::DEFAULT_INCLUDE]).unwrap_or_else(|_| GlobSet::empty())
}

fn build_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, PluginError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| PluginError::Config(format!("invalid pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PluginError::Config(format!("invalid pattern set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_vue_files() {
        let filter = IdFilter::default();
        assert!(filter.matches("/src/App.vue"));
        assert!(filter.matches("/src/components/Button.VUE"));
        assert!(!filter.matches("/src/main.js"));
        assert!(!filter.matches("/src/App.vue?vuepart=script.js"));
    }

    #[test]
    fn test_rejects_host_internal_ids() {
        assert!(!IdFilter::default().matches("\0virtual/App.vue"));
    }

    #[test]
    fn test_include_and_exclude() {
        let filter = IdFilter::new(&["**/components/**/*.vue"], &["**/legacy/**"]).unwrap();
        assert!(filter.matches("/app/components/Card.vue"));
        assert!(!filter.matches("/app/views/Home.vue"));
        assert!(!filter.matches("/app/components/legacy/Old.vue"));
    }

    #[test]
    fn test_empty_include_falls_back_to_default() {
        let filter = IdFilter::new::<&str>(&[], &[]).unwrap();
        assert!(filter.matches("/a/B.vue"));
    }

    #[test]
    fn test_windows_separators() {
        let filter = IdFilter::new(&["**/src/*.vue"], &[]).unwrap();
        assert!(filter.matches("C:\\work\\src\\App.vue"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = IdFilter::new(&["src/[a-"], &[]).unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }
}

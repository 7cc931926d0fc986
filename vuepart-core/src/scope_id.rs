//! Scope id generation
//!
//! Scoped styles and templates share a `data-v-<hash>` attribute. The hash is
//! the `hash-sum` string checksum so ids match what the JavaScript toolchain
//! produces for the same input.

use std::path::Path;

/// Prefix of every scope id
pub const SCOPE_PREFIX: &str = "data-v-";

/// Scope id for a composite file
///
/// Production builds hash the basename so ids do not depend on the build
/// machine's directory layout.
pub fn scope_id(filename: &Path, source: &str, production: bool) -> String {
    let name = if production {
        filename
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| filename.to_string_lossy())
    } else {
        filename.to_string_lossy()
    };
    format!("{SCOPE_PREFIX}{}", hash_sum(&format!("{name}{source}")))
}

/// `hash-sum` of a string value, as 8+ lowercase hex digits
pub fn hash_sum(value: &str) -> String {
    let mut hash = fold(0, "");
    hash = fold(hash, "[object String]");
    hash = fold(hash, "string");
    hash = fold(hash, value);
    format!("{hash:08x}")
}

// Arithmetic follows JavaScript number semantics: the shift operates on the
// int32 view, the subtraction on the full value.
fn fold(mut hash: i64, text: &str) -> i64 {
    if text.is_empty() {
        return hash;
    }
    for unit in text.encode_utf16() {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        hash = i64::from((shifted - hash + i64::from(unit)) as i32);
    }
    if hash < 0 {
        hash * -2
    } else {
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_sum_known_values() {
        assert_eq!(hash_sum(""), "bba68bf6");
        assert_eq!(hash_sum("a"), "8daa19aa");
        assert_eq!(hash_sum("héllo 😀"), "6f3fa6eb");
        assert_eq!(hash_sum(&"x".repeat(100)), "47acc6f6");
    }

    #[test]
    fn test_scope_id_development_uses_full_path() {
        let id = scope_id(
            Path::new("/src/App.vue"),
            "<template><div/></template>",
            false,
        );
        assert_eq!(id, "data-v-b65443a0");
    }

    #[test]
    fn test_scope_id_production_uses_basename() {
        let source = "<template><div/></template>";
        let a = scope_id(Path::new("/src/App.vue"), source, true);
        let b = scope_id(Path::new("/elsewhere/App.vue"), source, true);
        assert_eq!(a, "data-v-36f57062");
        assert_eq!(a, b);
    }

    #[test]
    fn test_scope_id_changes_with_source() {
        let path = Path::new("/src/App.vue");
        assert_ne!(scope_id(path, "a", false), scope_id(path, "b", false));
    }
}

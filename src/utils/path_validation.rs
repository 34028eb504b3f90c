//! Path normalization for remote imports.
//!
//! Nested imports inside a remotely fetched file are resolved against the
//! parent's base path inside the repository. These helpers normalize such
//! paths lexically (there is no local file to canonicalize) and reject any
//! path that would leave the base path.

use crate::core::AwfError;

/// Lexically clean a `/`-separated relative path.
///
/// Removes `.` segments and empty segments and folds `name/..` pairs.
/// Leading `..` segments that cannot be folded are kept so callers can
/// detect an escape.
///
/// # Examples
///
/// ```rust
/// use awf_cli::utils::path_validation::clean_relative_path;
///
/// assert_eq!(clean_relative_path("./a/b/../c.md"), "a/c.md");
/// assert_eq!(clean_relative_path("../x.md"), "../x.md");
/// ```
pub fn clean_relative_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Join a nested import onto a remote base path, rejecting escapes.
///
/// `base_path` is the directory (inside the repository) of the importing
/// file; `nested` is the nested import as written. The nested path is cleaned
/// first and must not be absolute or climb out of `base_path`.
///
/// # Errors
///
/// Returns [`AwfError::PathEscape`] when the nested path is absolute or
/// normalizes to a path starting with `..` relative to `base_path`.
pub fn join_within_base(base_path: &str, nested: &str) -> Result<String, AwfError> {
    let escape = || AwfError::PathEscape {
        path: nested.to_string(),
        base_path: base_path.to_string(),
    };

    if nested.starts_with('/') || nested.starts_with('\\') {
        return Err(escape());
    }

    let cleaned = clean_relative_path(nested);
    if cleaned == ".." || cleaned.starts_with("../") || cleaned.is_empty() {
        return Err(escape());
    }

    let base = clean_relative_path(base_path);
    if base.is_empty() {
        Ok(cleaned)
    } else {
        Ok(format!("{base}/{cleaned}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_relative_path_folds_segments() {
        assert_eq!(clean_relative_path("a/./b//c.md"), "a/b/c.md");
        assert_eq!(clean_relative_path("a/b/../../c.md"), "c.md");
        assert_eq!(clean_relative_path("a/../../c.md"), "../c.md");
        assert_eq!(clean_relative_path("../../c.md"), "../../c.md");
    }

    #[test]
    fn test_join_within_base_accepts_nested() {
        assert_eq!(join_within_base("dir", "G.md").unwrap(), "dir/G.md");
        assert_eq!(join_within_base("dir/sub", "./x/../G.md").unwrap(), "dir/sub/G.md");
        assert_eq!(join_within_base("", "shared/G.md").unwrap(), "shared/G.md");
    }

    #[test]
    fn test_join_within_base_rejects_escape() {
        assert!(matches!(join_within_base("dir", "../G.md"), Err(AwfError::PathEscape { .. })));
        assert!(matches!(
            join_within_base("dir", "a/../../G.md"),
            Err(AwfError::PathEscape { .. })
        ));
        assert!(matches!(join_within_base("dir", "/etc/passwd"), Err(AwfError::PathEscape { .. })));
    }
}

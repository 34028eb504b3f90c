//! File system helpers for AWF.
//!
//! Reads and writes used by the resolver, the codemod engine and the action
//! updater. Writes happen in one call per file using a write-then-rename
//! strategy so readers never observe a partially written workflow or lock file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::AwfError;

/// Read a UTF-8 file, mapping failures onto [`AwfError`].
///
/// A missing file becomes [`AwfError::NotFound`] carrying the path, every
/// other failure becomes [`AwfError::FileSystem`].
pub fn read_text(path: &Path) -> Result<String, AwfError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AwfError::NotFound {
                reference: path.display().to_string(),
            }
        } else {
            AwfError::fs("read", path, &e)
        }
    })
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Write content to a sibling temporary file
/// 2. Sync the temporary file to disk
/// 3. Rename it over the target path
///
/// Parent directories are created when missing.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), AwfError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| AwfError::fs("create directory", parent, &e))?;
    }

    let temp_path = temp_sibling(path);
    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| AwfError::fs("create", &temp_path, &e))?;
        file.write_all(content).map_err(|e| AwfError::fs("write", &temp_path, &e))?;
        file.sync_all().map_err(|e| AwfError::fs("sync", &temp_path, &e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| AwfError::fs("rename", path, &e))
}

/// Convenience wrapper around [`atomic_write`] for string content.
pub fn safe_write(path: &Path, content: &str) -> Result<(), AwfError> {
    atomic_write(path, content.as_bytes())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Find the project root for `start`.
///
/// Walks up from `start` looking for a directory containing `.git` or
/// `.github`. Falls back to `start` itself when none is found.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() || dir.join(".github").is_dir() {
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    start.to_path_buf()
}

/// List workflow markdown files directly inside `dir`, sorted by path.
///
/// Compiled `.lock.yml` outputs and non-markdown files are skipped.
pub fn list_workflow_files(dir: &Path) -> Result<Vec<PathBuf>, AwfError> {
    if !dir.is_dir() {
        return Err(AwfError::NotFound {
            reference: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AwfError::FileSystem {
            operation: "list".to_string(),
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

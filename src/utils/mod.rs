//! Cross-cutting utilities for AWF.
//!
//! - [`fs`] - atomic writes, project-root discovery, workflow listing
//! - [`path_validation`] - lexical normalization of remote import paths
//! - [`process`] - subprocess execution for `gh` and `git`

pub mod fs;
pub mod path_validation;
pub mod process;

pub use fs::{atomic_write, find_project_root, list_workflow_files, read_text, safe_write};
pub use path_validation::{clean_relative_path, join_within_base};

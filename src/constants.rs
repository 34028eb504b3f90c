//! Global constants used throughout the AWF codebase.
//!
//! This module contains timeout durations, default locations, and other
//! values that are used across multiple modules. Defining them centrally
//! makes magic strings and numbers more discoverable.

use std::time::Duration;

/// Default timeout for subprocess calls to `gh` and `git` (60 seconds).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default GitHub host used for `git ls-remote` URLs.
pub const DEFAULT_GITHUB_HOST: &str = "https://github.com";

/// Git ref used when a workflowspec omits `@ref`.
pub const DEFAULT_REF: &str = "main";

/// Directory (relative to the project root) holding workflow markdown files.
pub const DEFAULT_WORKFLOWS_DIR: &str = ".github/workflows";

/// Location of the actions lock file relative to the project root.
pub const DEFAULT_ACTIONS_LOCK: &str = ".github/aw/actions-lock.json";

/// Location of the optional project configuration file.
pub const PROJECT_CONFIG_PATH: &str = ".github/aw/config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "AWF_CONFIG";

/// Path fragment identifying custom agent files.
pub const AGENTS_DIR_MARKER: &str = "/.github/agents/";

/// Suffix of compiled workflow outputs, which are never importable.
pub const LOCK_FILE_SUFFIX: &str = ".lock.yml";

/// Length of a full hexadecimal git commit digest.
pub const COMMIT_SHA_LEN: usize = 40;

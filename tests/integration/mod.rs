//! Integration test suite for AWF
//!
//! End-to-end tests of the `awf` binary plus library-level scenarios that
//! need the in-memory fetchers from the `test-utils` feature.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolve**: `awf resolve` output and import ordering
//! - **validate**: `awf validate` / `awf check` diagnostics
//! - **fix**: codemod dry runs, writes and listing
//! - **update**: `awf update` and the library update pipeline
//! - **remote**: remote imports and `awf add` failure modes

#[path = "../common/mod.rs"]
mod common;

mod fix;
mod remote;
mod resolve;
mod update;
mod validate;

//! Core types and functionality for AWF
//!
//! This module holds the pieces every other module depends on:
//!
//! - [`AwfError`] - the error taxonomy surfaced to callers
//! - [`ErrorContext`] / [`user_friendly_error`] - CLI-facing rendering with suggestions
//! - [`render_source_excerpt`] - source context with a caret for positioned errors
//! - [`OperationContext`] - cancellation and warning de-duplication for one operation

pub mod error;
pub mod error_formatting;
pub mod operation_context;

pub use error::{AwfError, ErrorContext, SchemaErrorKind, user_friendly_error};
pub use error_formatting::render_source_excerpt;
pub use operation_context::OperationContext;

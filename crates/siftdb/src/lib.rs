//! SiftDB — a catalog-driven saved-search engine.
//!
//! Administrators declare which collections and attributes are
//! searchable, compose include/exclude conditions from a closed
//! operator vocabulary, and the engine compiles those definitions
//! into typed query plans executed against a generic object store —
//! with tabular projection, deterministic natural-language
//! descriptions, and export/label surfaces injected as capabilities.
//!
//! ## Crate layout
//! - `core::catalog`: definitional entities and admin-time validation.
//! - `core::query`: predicate AST, compiler, and ordering resolution.
//! - `core::store`: the object-store seam plus the in-memory store.
//! - `core::table`: header and row projection.
//! - `core::results`: the fail-soft retrieval wrapper and pagination.
//! - `core::export`: export jobs, spreadsheet sink, label renderer.

pub use siftdb_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use siftdb_core::error::EngineError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
}

use crate::{
    catalog::{CatalogError, CoerceError},
    export::{LabelError, SinkError},
    store::StoreError,
};
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Top-level error for embedding surfaces. The taxonomy mirrors the
/// boundaries: catalog errors belong to definition time, store
/// errors to execution time; nothing here escapes the retrieval
/// boundary unhandled.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Coerce(#[from] CoerceError),

    #[error("{0}")]
    Label(#[from] LabelError),

    #[error("{0}")]
    Sink(#[from] SinkError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

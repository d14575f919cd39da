use crate::catalog::{
    AttributeId, CoerceError, CollectionId, GroupId, LayoutId, SearchId,
};
use thiserror::Error as ThisError;

///
/// CatalogError
///
/// Definition-time validation failures. These surface to the editor
/// next to the offending field and block the save; they are never
/// produced during query compilation or execution.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CatalogError {
    #[error("field '{field}' does not belong to {collection}")]
    FieldCollectionMismatch { field: String, collection: String },

    #[error("field '{field}' does not allow use in layout")]
    FieldNotLayoutable { field: String },

    #[error("field '{field}' does not allow ordering")]
    FieldNotOrderable { field: String },

    #[error("field '{field}' does not allow searching")]
    FieldNotSearchable { field: String },

    #[error("layout '{layout}' does not belong to {collection}")]
    LayoutCollectionMismatch { layout: String, collection: String },

    #[error("selector must start with two underscores")]
    SelectorShape,

    #[error("unknown attribute id {0}")]
    UnknownAttribute(AttributeId),

    #[error("unknown collection id {0}")]
    UnknownCollection(CollectionId),

    #[error("unknown group id {0}")]
    UnknownGroup(GroupId),

    #[error("unknown layout id {0}")]
    UnknownLayout(LayoutId),

    #[error("unknown search id {0}")]
    UnknownSearch(SearchId),

    #[error(transparent)]
    Value(#[from] CoerceError),
}

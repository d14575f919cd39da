use crate::{catalog::CollectionId, store::StoreRef};
use serde::{Deserialize, Serialize};

///
/// Collection
///
/// One concrete data collection administrators may search. The
/// `store_ref` names the backing collection in the object store; the
/// catalog itself never inspects records. The plural label is used by
/// the description synthesizer ("Include all contacts.").
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub store_ref: StoreRef,
    pub plural: String,
}

impl Collection {
    /// Create a collection with a naive default plural label
    /// (`store_ref` lowered + "s").
    pub fn new(id: CollectionId, name: impl Into<String>, store_ref: impl Into<StoreRef>) -> Self {
        let store_ref = store_ref.into();
        let plural = format!("{}s", store_ref.as_str().to_lowercase());

        Self {
            id,
            name: name.into(),
            store_ref,
            plural,
        }
    }

    /// Override the plural label.
    #[must_use]
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

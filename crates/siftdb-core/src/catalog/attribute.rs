use crate::catalog::{AttributeId, CatalogError, CollectionId};
use serde::{Deserialize, Serialize};

/// Path separator used by relationship and sort selectors.
pub const SELECTOR_SEPARATOR: &str = "__";

///
/// Attribute
///
/// A searchable/displayable field of a collection.
///
/// `field_name` is the raw storage accessor. `selector`, when
/// non-empty, must start with the `__` separator and denotes
/// traversal into a related collection or sub-attribute.
/// `sort_selector` overrides the accessor used for ordering; a
/// non-empty sort selector also signals that ordering must go
/// through an aggregate annotation (the direct accessor of a
/// multi-valued relation cannot be sorted).
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub collection: CollectionId,
    pub name: String,
    pub field_name: String,
    pub selector: String,
    pub sort_selector: String,
    pub enable_layout: bool,
    pub enable_search: bool,
    pub enable_freetext: bool,
}

impl Attribute {
    pub fn new(
        id: AttributeId,
        collection: CollectionId,
        name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            collection,
            name: name.into(),
            field_name: field_name.into(),
            selector: String::new(),
            sort_selector: String::new(),
            enable_layout: true,
            enable_search: true,
            enable_freetext: true,
        }
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    #[must_use]
    pub fn with_sort_selector(mut self, sort_selector: impl Into<String>) -> Self {
        self.sort_selector = sort_selector.into();
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, layout: bool, search: bool, freetext: bool) -> Self {
        self.enable_layout = layout;
        self.enable_search = search;
        self.enable_freetext = freetext;
        self
    }

    /// Full accessor: field name plus relationship selector.
    #[must_use]
    pub fn full_field_name(&self) -> String {
        format!("{}{}", self.field_name, self.selector)
    }

    /// Accessor used for ordering: the sort selector replaces the
    /// relationship selector when set.
    #[must_use]
    pub fn sort_field_name(&self) -> String {
        let selector = if self.sort_selector.is_empty() {
            &self.selector
        } else {
            &self.sort_selector
        };

        format!("{}{selector}", self.field_name)
    }

    /// Whether this attribute may be used as a sort key.
    #[must_use]
    pub const fn sortable(&self) -> bool {
        true
    }

    /// Relationship selector, split into traversal segments.
    #[must_use]
    pub fn selector_segments(&self) -> Vec<&str> {
        segments(&self.selector)
    }

    /// Ordering selector, split into traversal segments.
    #[must_use]
    pub fn sort_selector_segments(&self) -> Vec<&str> {
        if self.sort_selector.is_empty() {
            self.selector_segments()
        } else {
            segments(&self.sort_selector)
        }
    }

    /// Definition-time invariants.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.selector.is_empty() && !self.selector.starts_with(SELECTOR_SEPARATOR) {
            return Err(CatalogError::SelectorShape);
        }

        Ok(())
    }
}

fn segments(selector: &str) -> Vec<&str> {
    selector
        .split(SELECTOR_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute() -> Attribute {
        Attribute::new(AttributeId(1), CollectionId(1), "groups", "groups")
    }

    #[test]
    fn full_field_name_appends_selector() {
        let a = attribute().with_selector("__name");

        assert_eq!(a.full_field_name(), "groups__name");
        assert_eq!(a.selector_segments(), vec!["name"]);
    }

    #[test]
    fn sort_field_name_prefers_sort_selector() {
        let a = attribute()
            .with_selector("__name")
            .with_sort_selector("__rank");

        assert_eq!(a.sort_field_name(), "groups__rank");
        assert_eq!(a.sort_selector_segments(), vec!["rank"]);
    }

    #[test]
    fn sort_field_name_falls_back_to_selector() {
        let a = attribute().with_selector("__name");

        assert_eq!(a.sort_field_name(), "groups__name");
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let a = attribute().with_selector("something else");

        assert_eq!(a.validate(), Err(CatalogError::SelectorShape));
    }

    #[test]
    fn multi_hop_selector_splits_into_segments() {
        let a = attribute().with_selector("__country__name");

        assert_eq!(a.selector_segments(), vec!["country", "name"]);
    }
}

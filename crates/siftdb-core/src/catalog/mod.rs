pub mod attribute;
pub mod collection;
pub mod layout;
pub mod match_op;
pub mod search;
pub mod validate;

use crate::store::{FieldKind, FieldTarget, StoreSchema};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// re-exports
pub use attribute::Attribute;
pub use collection::Collection;
pub use layout::{Layout, LayoutColumn};
pub use match_op::{CoerceError, MatchOp, ValueClass};
pub use search::{SavedSearch, SearchCondition, SearchGroup, SearchOrdering};
pub use validate::CatalogError;

///
/// Entity ids
///
/// Plain numeric keys, assigned by the administrative layer. The
/// engine never allocates ids itself.
///

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            Deserialize,
            Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            Serialize,
        )]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub u64);
    };
}

entity_id!(AttributeId);
entity_id!(CollectionId);
entity_id!(GroupId);
entity_id!(LayoutId);
entity_id!(SearchId);

///
/// Catalog
///
/// Registry of every definitional entity: searchable collections,
/// their attributes, result layouts, saved searches, and groups.
/// All entities arrive through administrative CRUD; insertion is
/// where the definition-time invariants are enforced. The engine
/// only ever reads from the catalog afterwards.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Catalog {
    collections: BTreeMap<CollectionId, Collection>,
    attributes: BTreeMap<AttributeId, Attribute>,
    layouts: BTreeMap<LayoutId, Layout>,
    searches: BTreeMap<SearchId, SavedSearch>,
    groups: BTreeMap<GroupId, SearchGroup>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// INSERTION (admin-time validation)
    ///

    pub fn insert_collection(&mut self, collection: Collection) {
        self.collections.insert(collection.id, collection);
    }

    pub fn insert_group(&mut self, group: SearchGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn insert_attribute(&mut self, attribute: Attribute) -> Result<(), CatalogError> {
        attribute.validate()?;
        if !self.collections.contains_key(&attribute.collection) {
            return Err(CatalogError::UnknownCollection(attribute.collection));
        }

        self.attributes.insert(attribute.id, attribute);
        Ok(())
    }

    pub fn insert_layout(&mut self, layout: Layout) -> Result<(), CatalogError> {
        if !self.collections.contains_key(&layout.collection) {
            return Err(CatalogError::UnknownCollection(layout.collection));
        }

        self.layouts.insert(layout.id, layout);
        Ok(())
    }

    /// Append a column to an existing layout.
    ///
    /// The column's attribute must belong to the layout's collection
    /// and allow use in layouts.
    pub fn add_layout_column(
        &mut self,
        layout_id: LayoutId,
        column: LayoutColumn,
    ) -> Result<(), CatalogError> {
        let attribute = self
            .attributes
            .get(&column.attribute)
            .ok_or(CatalogError::UnknownAttribute(column.attribute))?;
        let layout = self
            .layouts
            .get(&layout_id)
            .ok_or(CatalogError::UnknownLayout(layout_id))?;

        if attribute.collection != layout.collection {
            return Err(CatalogError::FieldCollectionMismatch {
                field: attribute.name.clone(),
                collection: self.collection_name(layout.collection),
            });
        }
        if !attribute.enable_layout {
            return Err(CatalogError::FieldNotLayoutable {
                field: attribute.name.clone(),
            });
        }

        self.layouts
            .get_mut(&layout_id)
            .ok_or(CatalogError::UnknownLayout(layout_id))?
            .push_column(column);
        Ok(())
    }

    pub fn insert_search(&mut self, search: SavedSearch) -> Result<(), CatalogError> {
        if !self.collections.contains_key(&search.collection) {
            return Err(CatalogError::UnknownCollection(search.collection));
        }
        let layout = self
            .layouts
            .get(&search.layout)
            .ok_or(CatalogError::UnknownLayout(search.layout))?;

        if layout.collection != search.collection {
            return Err(CatalogError::LayoutCollectionMismatch {
                layout: layout.name.clone(),
                collection: self.collection_name(search.collection),
            });
        }
        if let Some(group) = search.group
            && !self.groups.contains_key(&group)
        {
            return Err(CatalogError::UnknownGroup(group));
        }

        self.searches.insert(search.id, search);
        Ok(())
    }

    /// Append a condition to a saved search.
    pub fn add_condition(
        &mut self,
        search_id: SearchId,
        condition: SearchCondition,
    ) -> Result<(), CatalogError> {
        condition.check_value()?;

        let search = self
            .searches
            .get(&search_id)
            .ok_or(CatalogError::UnknownSearch(search_id))?;
        let attribute = self
            .attributes
            .get(&condition.attribute)
            .ok_or(CatalogError::UnknownAttribute(condition.attribute))?;

        if attribute.collection != search.collection {
            return Err(CatalogError::FieldCollectionMismatch {
                field: attribute.name.clone(),
                collection: self.collection_name(search.collection),
            });
        }
        if !attribute.enable_search {
            return Err(CatalogError::FieldNotSearchable {
                field: attribute.name.clone(),
            });
        }

        self.searches
            .get_mut(&search_id)
            .ok_or(CatalogError::UnknownSearch(search_id))?
            .push_condition(condition);
        Ok(())
    }

    /// Append an ordering to a saved search.
    pub fn add_ordering(
        &mut self,
        search_id: SearchId,
        ordering: SearchOrdering,
    ) -> Result<(), CatalogError> {
        let search = self
            .searches
            .get(&search_id)
            .ok_or(CatalogError::UnknownSearch(search_id))?;
        let attribute = self
            .attributes
            .get(&ordering.attribute)
            .ok_or(CatalogError::UnknownAttribute(ordering.attribute))?;

        if attribute.collection != search.collection {
            return Err(CatalogError::FieldCollectionMismatch {
                field: attribute.name.clone(),
                collection: self.collection_name(search.collection),
            });
        }
        if !attribute.enable_search {
            return Err(CatalogError::FieldNotOrderable {
                field: attribute.name.clone(),
            });
        }

        self.searches
            .get_mut(&search_id)
            .ok_or(CatalogError::UnknownSearch(search_id))?
            .push_ordering(ordering);
        Ok(())
    }

    ///
    /// LOOKUP
    ///

    #[must_use]
    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(&id)
    }

    #[must_use]
    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(&id)
    }

    #[must_use]
    pub fn layout(&self, id: LayoutId) -> Option<&Layout> {
        self.layouts.get(&id)
    }

    #[must_use]
    pub fn search(&self, id: SearchId) -> Option<&SavedSearch> {
        self.searches.get(&id)
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&SearchGroup> {
        self.groups.get(&id)
    }

    ///
    /// ITERATION
    ///
    /// Iteration orders are part of the catalog contract: attributes
    /// by (collection name, attribute name), searches by name.
    ///

    #[must_use]
    pub fn attributes(&self) -> Vec<&Attribute> {
        let mut attributes: Vec<&Attribute> = self.attributes.values().collect();
        attributes.sort_by(|a, b| {
            (self.collection_name(a.collection), &a.name)
                .cmp(&(self.collection_name(b.collection), &b.name))
        });
        attributes
    }

    #[must_use]
    pub fn attributes_for(&self, collection: CollectionId) -> Vec<&Attribute> {
        let mut attributes: Vec<&Attribute> = self
            .attributes
            .values()
            .filter(|a| a.collection == collection)
            .collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        attributes
    }

    /// Attributes of a collection participating in free-text search.
    #[must_use]
    pub fn freetext_attributes(&self, collection: CollectionId) -> Vec<&Attribute> {
        self.attributes_for(collection)
            .into_iter()
            .filter(|a| a.enable_freetext)
            .collect()
    }

    #[must_use]
    pub fn searches(&self) -> Vec<&SavedSearch> {
        let mut searches: Vec<&SavedSearch> = self.searches.values().collect();
        searches.sort_by(|a, b| a.name.cmp(&b.name));
        searches
    }

    ///
    /// RESOLUTION
    ///
    /// Attribute names resolve against store metadata exactly once,
    /// into a typed target; accessor strings are never concatenated
    /// into a query key. An attribute whose field is unknown to the
    /// store resolves to a computed target, read directly off the
    /// materialized record.
    ///

    /// Resolve an attribute's search/display accessor.
    ///
    /// Returns `None` only when the attribute's collection is no
    /// longer in the catalog; callers drop the associated condition
    /// or column at the point of use.
    #[must_use]
    pub fn resolve<S: StoreSchema + ?Sized>(
        &self,
        attribute: &Attribute,
        schema: &S,
    ) -> Option<FieldTarget> {
        let collection = self.collection(attribute.collection)?;

        Some(resolve_target(
            schema,
            collection,
            &attribute.field_name,
            attribute.selector_segments(),
        ))
    }

    /// Resolve an attribute's ordering accessor.
    ///
    /// The sort selector, when set, replaces the relationship
    /// selector for ordering purposes.
    #[must_use]
    pub fn resolve_sort<S: StoreSchema + ?Sized>(
        &self,
        attribute: &Attribute,
        schema: &S,
    ) -> Option<FieldTarget> {
        let collection = self.collection(attribute.collection)?;

        Some(resolve_target(
            schema,
            collection,
            &attribute.field_name,
            attribute.sort_selector_segments(),
        ))
    }

    fn collection_name(&self, id: CollectionId) -> String {
        self.collections
            .get(&id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    ///
    /// TEST SUPPORT
    ///
    /// Bypass admin-time validation to simulate definitions that
    /// drifted after being saved.
    ///

    #[cfg(test)]
    pub(crate) fn add_condition_unchecked(&mut self, search: SearchId, condition: SearchCondition) {
        if let Some(s) = self.searches.get_mut(&search) {
            s.push_condition(condition);
        }
    }

    #[cfg(test)]
    pub(crate) fn push_raw_column(&mut self, layout: LayoutId, column: LayoutColumn) {
        if let Some(l) = self.layouts.get_mut(&layout) {
            l.push_column(column);
        }
    }
}

fn resolve_target<S: StoreSchema + ?Sized>(
    schema: &S,
    collection: &Collection,
    field: &str,
    rest: Vec<&str>,
) -> FieldTarget {
    match schema.field_kind(&collection.store_ref, field) {
        FieldKind::Scalar => FieldTarget::Scalar {
            field: field.to_string(),
        },
        FieldKind::Relation { target, many } => FieldTarget::Related {
            relation: field.to_string(),
            store: target,
            many,
            rest: rest.into_iter().map(ToString::to_string).collect(),
        },
        FieldKind::Unknown => FieldTarget::Computed {
            field: field.to_string(),
        },
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::entry_fixture;

    #[test]
    fn attribute_insert_rejects_unknown_collection() {
        let mut catalog = Catalog::new();
        let attribute = Attribute::new(AttributeId(1), CollectionId(99), "title", "title");

        assert!(matches!(
            catalog.insert_attribute(attribute),
            Err(CatalogError::UnknownCollection(CollectionId(99)))
        ));
    }

    #[test]
    fn condition_rejects_collection_mismatch() {
        let mut fx = entry_fixture();

        // An attribute from the author collection cannot condition an
        // entry search.
        let err = fx
            .catalog
            .add_condition(
                fx.search,
                SearchCondition::new(fx.author_name, MatchOp::Contains, "x"),
            )
            .unwrap_err();

        assert!(matches!(err, CatalogError::FieldCollectionMismatch { .. }));
    }

    #[test]
    fn condition_rejects_search_disabled_attribute() {
        let mut fx = entry_fixture();
        let hidden = AttributeId(90);
        fx.catalog
            .insert_attribute(
                Attribute::new(hidden, fx.collection, "internal", "internal")
                    .with_flags(true, false, false),
            )
            .unwrap();

        let err = fx
            .catalog
            .add_condition(
                fx.search,
                SearchCondition::new(hidden, MatchOp::Contains, "x"),
            )
            .unwrap_err();

        assert!(matches!(err, CatalogError::FieldNotSearchable { .. }));
    }

    #[test]
    fn search_rejects_layout_collection_mismatch() {
        let mut fx = entry_fixture();
        let layout = LayoutId(50);
        fx.catalog
            .insert_layout(Layout::new(layout, fx.author_collection, "author layout"))
            .unwrap();

        let err = fx
            .catalog
            .insert_search(
                SavedSearch::new(SearchId(50), "mismatched", fx.collection, layout),
            )
            .unwrap_err();

        assert!(matches!(err, CatalogError::LayoutCollectionMismatch { .. }));
    }

    #[test]
    fn attributes_iterate_by_collection_then_name() {
        let fx = entry_fixture();
        let names: Vec<&str> = fx
            .catalog
            .attributes_for(fx.collection)
            .iter()
            .map(|a| a.name.as_str())
            .collect();

        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn resolve_falls_back_to_computed_for_unknown_field() {
        let mut fx = entry_fixture();
        let virtual_id = AttributeId(91);
        fx.catalog
            .insert_attribute(Attribute::new(
                virtual_id,
                fx.collection,
                "word count",
                "word_count",
            ))
            .unwrap();

        let attribute = fx.catalog.attribute(virtual_id).unwrap();
        let target = fx.catalog.resolve(attribute, &fx.store).unwrap();

        assert!(matches!(target, FieldTarget::Computed { .. }));
    }
}

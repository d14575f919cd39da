use crate::{
    catalog::{AttributeId, CoerceError, CollectionId, GroupId, LayoutId, MatchOp, SearchId},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// SearchGroup
///
/// Free-form label for organizing saved searches; no effect on
/// query compilation.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchGroup {
    pub id: GroupId,
    pub name: String,
}

impl SearchGroup {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

///
/// SavedSearch
///
/// The persisted, reusable query definition. Exclusively owns its
/// conditions and orderings; deleting the search deletes both.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SavedSearch {
    pub id: SearchId,
    pub name: String,
    pub collection: CollectionId,
    pub group: Option<GroupId>,
    pub layout: LayoutId,
    conditions: Vec<SearchCondition>,
    orderings: Vec<SearchOrdering>,
}

impl SavedSearch {
    pub fn new(
        id: SearchId,
        name: impl Into<String>,
        collection: CollectionId,
        layout: LayoutId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            collection,
            group: None,
            layout,
            conditions: Vec::new(),
            orderings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[SearchCondition] {
        &self.conditions
    }

    #[must_use]
    pub fn orderings(&self) -> &[SearchOrdering] {
        &self.orderings
    }

    pub(crate) fn push_condition(&mut self, condition: SearchCondition) {
        self.conditions.push(condition);
    }

    pub(crate) fn push_ordering(&mut self, ordering: SearchOrdering) {
        self.orderings.push(ordering);
    }
}

///
/// SearchCondition
///
/// One atomic filter condition: attribute, operator, raw operand,
/// include/exclude polarity, and the AND-with-siblings flag.
///
/// The raw operand is stored as entered and coerced per the
/// operator's value class; a saved condition is assumed
/// pre-validated, but the compiler still treats coercion failure as
/// "drop this condition".
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchCondition {
    pub attribute: AttributeId,
    pub match_op: MatchOp,
    pub value: String,
    pub exclude: bool,
    pub and_together: bool,
}

impl SearchCondition {
    pub fn new(attribute: AttributeId, match_op: MatchOp, value: impl Into<String>) -> Self {
        Self {
            attribute,
            match_op,
            value: value.into(),
            exclude: false,
            and_together: false,
        }
    }

    #[must_use]
    pub const fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// AND this attribute's conditions together instead of OR.
    #[must_use]
    pub const fn anded(mut self) -> Self {
        self.and_together = true;
        self
    }

    /// Coerce the raw operand per the operator's value class.
    pub fn prepared_value(&self) -> Result<Value, CoerceError> {
        self.match_op.coerce(&self.value)
    }

    /// Definition-time operand validation.
    pub fn check_value(&self) -> Result<(), CoerceError> {
        self.prepared_value().map(|_| ())
    }
}

///
/// SearchOrdering
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchOrdering {
    pub attribute: AttributeId,
    pub descending: bool,
}

impl SearchOrdering {
    #[must_use]
    pub const fn new(attribute: AttributeId) -> Self {
        Self {
            attribute,
            descending: false,
        }
    }

    #[must_use]
    pub const fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

///
/// TESTS
///

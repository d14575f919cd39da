use crate::{
    catalog::{Attribute, Catalog, SearchOrdering},
    store::{FieldTarget, StoreSchema},
    table::HeaderCell,
};
use serde::{Deserialize, Serialize};

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Parse a request-supplied direction; anything other than
    /// `desc` means ascending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Direction a column-header link should offer next.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

///
/// AggregateFn
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateFn {
    Min,
    Max,
}

///
/// OrderKey
///
/// One resolved sort key. When the attribute carries a sort selector
/// the key goes through an aggregate annotation: ordering directly by
/// a to-many relation's attribute conflicts with row deduplication,
/// so each result is annotated with the minimum (ascending) or
/// maximum (descending) of the sort target and ordered by that
/// annotation instead.
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderKey {
    pub target: FieldTarget,
    pub direction: OrderDirection,
    pub aggregate: Option<AggregateFn>,
}

/// Resolve one saved ordering into a sort key.
///
/// Returns `None` when the attribute's collection is gone; the
/// ordering is dropped.
#[must_use]
pub fn order_key<S: StoreSchema + ?Sized>(
    catalog: &Catalog,
    schema: &S,
    attribute: &Attribute,
    descending: bool,
) -> Option<OrderKey> {
    let target = catalog.resolve_sort(attribute, schema)?;
    let direction = if descending {
        OrderDirection::Desc
    } else {
        OrderDirection::Asc
    };
    let aggregate = if attribute.sort_selector.is_empty() {
        None
    } else if descending {
        Some(AggregateFn::Max)
    } else {
        Some(AggregateFn::Min)
    };

    Some(OrderKey {
        target,
        direction,
        aggregate,
    })
}

/// Resolve a list of saved orderings, dropping unresolvable entries.
#[must_use]
pub fn order_keys<S: StoreSchema + ?Sized>(
    catalog: &Catalog,
    schema: &S,
    orderings: &[SearchOrdering],
) -> Vec<OrderKey> {
    orderings
        .iter()
        .filter_map(|o| {
            let attribute = catalog.attribute(o.attribute)?;
            order_key(catalog, schema, attribute, o.descending)
        })
        .collect()
}

///
/// AdhocOrdering
///
/// Outcome of resolving a results-page column-sort request: a
/// 1-based index into the rendered header plus a direction. Invalid
/// input (non-numeric, out of range, non-sortable column) resets to
/// "no ordering"; it is never an error.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AdhocOrdering {
    pub index: Option<usize>,
    pub direction: Option<OrderDirection>,
    pub ordering: Option<SearchOrdering>,
}

/// Resolve the `o`/`ot` request parameters against a rendered header.
#[must_use]
pub fn resolve_adhoc(
    header: &[HeaderCell],
    index_raw: Option<&str>,
    direction_raw: Option<&str>,
) -> AdhocOrdering {
    let direction = OrderDirection::parse(direction_raw);

    let Some(index) = index_raw.and_then(|s| s.parse::<usize>().ok()) else {
        return AdhocOrdering::default();
    };
    if index == 0 {
        return AdhocOrdering::default();
    }
    let Some(cell) = header.get(index - 1) else {
        return AdhocOrdering::default();
    };
    if !cell.sortable {
        return AdhocOrdering::default();
    }

    let mut ordering = SearchOrdering::new(cell.attribute);
    if direction == OrderDirection::Desc {
        ordering = ordering.descending();
    }

    AdhocOrdering {
        index: Some(index),
        direction: Some(direction),
        ordering: Some(ordering),
    }
}

///
/// TESTS
///

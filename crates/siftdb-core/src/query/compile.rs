use crate::{
    catalog::{AttributeId, Catalog, MatchOp, SavedSearch, SearchOrdering},
    query::{
        ordering::{OrderKey, order_keys},
        predicate::Predicate,
    },
    store::{StoreRef, StoreSchema},
    value::Value,
};
use tracing::warn;

///
/// QueryPlan
///
/// Compiled, executable description of one search. Filters are
/// sequential conjunctive steps; the exclude predicate is a single
/// negative filter; results are always distinct.
///
/// The plan is a pure value: compiling the same definition twice
/// (once for preview, once for an export worker) yields identical
/// plans.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub store: StoreRef,
    pub filters: Vec<Predicate>,
    pub exclude: Option<Predicate>,
    pub distinct: bool,
    pub order: Vec<OrderKey>,
}

impl QueryPlan {
    /// A plan with no filters: every record of the collection.
    #[must_use]
    pub const fn unfiltered(store: StoreRef) -> Self {
        Self {
            store,
            filters: vec![],
            exclude: None,
            distinct: true,
            order: vec![],
        }
    }

    /// A plan that matches nothing, used as the guaranteed-empty
    /// fallback after an execution failure.
    #[must_use]
    pub fn empty(store: StoreRef) -> Self {
        Self {
            filters: vec![Predicate::False],
            ..Self::unfiltered(store)
        }
    }

    #[must_use]
    pub fn matches_nothing(&self) -> bool {
        self.filters.contains(&Predicate::False)
    }
}

///
/// ConditionBucket
///
/// One attribute's coerced conditions within a polarity bucket.
/// Buckets keep first-seen attribute order; entries keep condition
/// order. Uncoercible conditions are dropped here (the definition
/// may have drifted since the condition was saved), never failing
/// collection.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ConditionBucket {
    pub attribute: AttributeId,
    pub and_together: bool,
    pub entries: Vec<(MatchOp, Value)>,
}

pub(crate) fn collect_conditions(
    search: &SavedSearch,
) -> (Vec<ConditionBucket>, Vec<ConditionBucket>) {
    let mut include: Vec<ConditionBucket> = Vec::new();
    let mut exclude: Vec<ConditionBucket> = Vec::new();

    for condition in search.conditions() {
        let value = match condition.prepared_value() {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    search = %search.id,
                    attribute = %condition.attribute,
                    %err,
                    "dropping condition with uncoercible value"
                );
                continue;
            }
        };

        let buckets = if condition.exclude {
            &mut exclude
        } else {
            &mut include
        };

        match buckets
            .iter_mut()
            .find(|b| b.attribute == condition.attribute)
        {
            Some(bucket) => {
                bucket.and_together |= condition.and_together;
                bucket.entries.push((condition.match_op, value));
            }
            None => buckets.push(ConditionBucket {
                attribute: condition.attribute,
                and_together: condition.and_together,
                entries: vec![(condition.match_op, value)],
            }),
        }
    }

    (include, exclude)
}

///
/// QueryCompiler
///
/// Turns a saved search plus an optional free-text term and ordering
/// override into a `QueryPlan`. Compilation is total for
/// structurally valid input: a condition referencing a now-missing
/// attribute is omitted from the predicate, never aborting the
/// compile. Execution failures belong to the store, caught at the
/// retrieval boundary.
///

pub struct QueryCompiler<'a, S: StoreSchema + ?Sized> {
    catalog: &'a Catalog,
    schema: &'a S,
}

impl<'a, S: StoreSchema + ?Sized> QueryCompiler<'a, S> {
    pub const fn new(catalog: &'a Catalog, schema: &'a S) -> Self {
        Self { catalog, schema }
    }

    #[must_use]
    pub fn compile(
        &self,
        search: &SavedSearch,
        freetext: Option<&str>,
        override_ordering: Option<&[SearchOrdering]>,
    ) -> QueryPlan {
        let Some(collection) = self.catalog.collection(search.collection) else {
            warn!(search = %search.id, "search references a missing collection");
            return QueryPlan::empty(StoreRef::default());
        };

        let (include, exclude) = collect_conditions(search);

        let mut filters: Vec<Predicate> = Vec::new();

        // Include bucket: distinct attributes are conjunctive;
        // repeating an attribute is how a search expresses OR within
        // it, unless the attribute is flagged and-together, in which
        // case each condition narrows in its own filter step.
        let mut or_groups: Vec<Predicate> = Vec::new();
        for bucket in include {
            let Some(target) = self.bucket_target(&bucket) else {
                continue;
            };

            if bucket.and_together {
                for (op, value) in bucket.entries {
                    filters.push(Predicate::condition(target.clone(), op, value));
                }
            } else {
                or_groups.push(Predicate::or(
                    bucket
                        .entries
                        .into_iter()
                        .map(|(op, value)| Predicate::condition(target.clone(), op, value))
                        .collect(),
                ));
            }
        }
        if !or_groups.is_empty() {
            filters.push(Predicate::and(or_groups));
        }

        // Exclude bucket: one disjunction per attribute, then a
        // single OR across attributes — a record is removed if it
        // matches any exclusion condition from any attribute.
        // TODO: and_together is not honored for exclude conditions.
        let mut exclude_groups: Vec<Predicate> = Vec::new();
        for bucket in exclude {
            let Some(target) = self.bucket_target(&bucket) else {
                continue;
            };

            exclude_groups.push(Predicate::or(
                bucket
                    .entries
                    .into_iter()
                    .map(|(op, value)| Predicate::condition(target.clone(), op, value))
                    .collect(),
            ));
        }
        let exclude = (!exclude_groups.is_empty()).then(|| Predicate::or(exclude_groups));

        // Free-text: case-insensitive containment OR-ed across every
        // freetext-enabled attribute of the collection.
        if let Some(term) = freetext.filter(|t| !t.is_empty()) {
            let clauses: Vec<Predicate> = self
                .catalog
                .freetext_attributes(search.collection)
                .into_iter()
                .filter_map(|attribute| self.catalog.resolve(attribute, self.schema))
                .map(|target| {
                    Predicate::condition(target, MatchOp::IContains, Value::text(term))
                })
                .collect();
            filters.push(Predicate::or(clauses));
        }

        let order = order_keys(
            self.catalog,
            self.schema,
            override_ordering.unwrap_or_else(|| search.orderings()),
        );

        QueryPlan {
            store: collection.store_ref.clone(),
            filters,
            exclude,
            distinct: true,
            order,
        }
    }

    fn bucket_target(&self, bucket: &ConditionBucket) -> Option<crate::store::FieldTarget> {
        let Some(attribute) = self.catalog.attribute(bucket.attribute) else {
            warn!(attribute = %bucket.attribute, "dropping conditions for a missing attribute");
            return None;
        };

        self.catalog.resolve(attribute, self.schema)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::SearchCondition,
        store::ObjectStore,
        test_fixtures::entry_fixture,
    };

    #[test]
    fn repeated_attribute_conditions_combine_as_or() {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "first"));
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "second"));

        let plan = fx.compile(None, None);

        // Single filter step holding one OR group.
        assert_eq!(plan.filters.len(), 1);
        let Predicate::And(groups) = &plan.filters[0] else {
            panic!("expected AND of per-attribute groups");
        };
        assert!(matches!(&groups[0], Predicate::Or(parts) if parts.len() == 2));
    }

    #[test]
    fn and_together_conditions_become_sequential_filters() {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "first").anded());
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "second"));

        let plan = fx.compile(None, None);

        // The flag on any of the attribute's conditions puts every
        // condition in its own narrowing step.
        assert_eq!(plan.filters.len(), 2);
    }

    #[test]
    fn exclude_conditions_or_across_attributes() {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "a").excluded());
        fx.add_condition(SearchCondition::new(fx.body, MatchOp::Contains, "b").excluded());

        let plan = fx.compile(None, None);

        let Some(Predicate::Or(groups)) = &plan.exclude else {
            panic!("expected top-level OR of exclude groups");
        };
        assert_eq!(groups.len(), 2);
        assert!(plan.filters.is_empty());
    }

    #[test]
    fn freetext_restricted_to_enabled_attributes() {
        let fx = entry_fixture();
        let plan = fx.compile(Some("term"), None);

        assert_eq!(plan.filters.len(), 1);
        let Predicate::Or(clauses) = &plan.filters[0] else {
            panic!("expected OR of freetext clauses");
        };
        // The fixture flags pub_date as non-freetext.
        assert_eq!(clauses.len(), fx.catalog.freetext_attributes(fx.collection).len());
        for clause in clauses {
            let Predicate::Compare(cmp) = clause else {
                panic!("expected containment comparisons");
            };
            assert_eq!(cmp.op, MatchOp::IContains);
        }
    }

    #[test]
    fn uncoercible_condition_is_dropped_not_fatal() {
        let mut fx = entry_fixture();
        // Bypass admin validation to simulate definition drift.
        fx.add_condition_unchecked(SearchCondition::new(fx.pub_date, MatchOp::Year, "not-a-year"));

        let plan = fx.compile(None, None);

        assert!(plan.filters.is_empty());
        assert!(fx.store.execute(&plan).is_ok());
    }

    #[test]
    fn missing_attribute_condition_is_dropped() {
        let mut fx = entry_fixture();
        fx.add_condition_unchecked(SearchCondition::new(
            AttributeId(9999),
            MatchOp::Contains,
            "x",
        ));

        let plan = fx.compile(None, None);
        assert!(plan.filters.is_empty());
    }

    #[test]
    fn compile_is_reentrant() {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "This"));

        let first = fx.compile(Some("term"), None);
        let second = fx.compile(Some("term"), None);

        assert_eq!(first, second);
    }
}

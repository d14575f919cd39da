use crate::{
    catalog::{MatchOp, SearchCondition, SearchOrdering},
    query::ordering::AggregateFn,
    store::{ObjectStore, RecordKey},
    test_fixtures::entry_fixture,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn include_conditions_and_across_attributes() {
    let mut fx = entry_fixture();
    fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, "t"));
    fx.add_condition(SearchCondition::new(fx.body, MatchOp::StartsWith, "Lorem"));

    let keys = fx.store.execute(&fx.compile(None, None)).unwrap();

    // Every entry title contains a "t", but only entries 1 and 3
    // start their body with "Lorem".
    assert_eq!(keys, vec![RecordKey(1), RecordKey(3)]);
}

#[test]
fn repeated_attribute_is_an_or_within_it() {
    let mut fx = entry_fixture();
    fx.add_condition(SearchCondition::new(fx.title, MatchOp::Exact, "Second post"));
    fx.add_condition(SearchCondition::new(
        fx.title,
        MatchOp::Exact,
        "Third thoughts",
    ));

    let keys = fx.store.execute(&fx.compile(None, None)).unwrap();
    assert_eq!(keys, vec![RecordKey(2), RecordKey(3)]);
}

#[test]
fn exclude_matches_any_attribute_condition() {
    let mut fx = entry_fixture();
    fx.add_condition(SearchCondition::new(fx.title, MatchOp::Contains, "Second").excluded());
    fx.add_condition(SearchCondition::new(fx.body, MatchOp::Contains, "next").excluded());

    let keys = fx.store.execute(&fx.compile(None, None)).unwrap();

    // Entry 2 is removed by the title condition, entry 3 by the body
    // condition, even though neither matches the other's condition.
    assert_eq!(keys, vec![RecordKey(1)]);
}

#[test]
fn freetext_does_not_match_disabled_attributes() {
    let mut fx = entry_fixture();
    // pub_date has freetext disabled; its rendered value for entry 1
    // would otherwise contain "2020".
    fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, "t"));

    let keys = fx
        .store
        .execute(&fx.compile(Some("1592222400"), None))
        .unwrap();
    assert!(keys.is_empty());
}

#[test]
fn freetext_matches_relation_values() {
    let fx = entry_fixture();

    // "jane" only appears in the related author names.
    let keys = fx.store.execute(&fx.compile(Some("jane"), None)).unwrap();
    assert_eq!(keys, vec![RecordKey(1), RecordKey(2)]);
}

#[test]
fn condition_on_relation_attribute_dedupes_results() {
    let mut fx = entry_fixture();
    // Both authors of entry 1 have an "o" in their name; the entry
    // still comes back once.
    fx.add_condition(SearchCondition::new(fx.authors, MatchOp::IContains, "o"));

    let keys = fx.store.execute(&fx.compile(None, None)).unwrap();
    assert_eq!(keys, vec![RecordKey(1), RecordKey(2)]);
}

#[test]
fn saved_relation_ordering_resolves_aggregates() {
    let mut fx = entry_fixture();
    fx.add_ordering(SearchOrdering::new(fx.authors));

    let plan = fx.compile(None, None);
    assert_eq!(plan.order[0].aggregate, Some(AggregateFn::Min));

    let descending = [SearchOrdering::new(fx.authors).descending()];
    let plan = fx.compile(None, Some(&descending));
    assert_eq!(plan.order[0].aggregate, Some(AggregateFn::Max));
}

#[test]
fn before_operator_with_now_sentinel_filters_future_dates() {
    let mut fx = entry_fixture();
    fx.add_condition(SearchCondition::new(fx.pub_date, MatchOp::Before, "now()"));

    let keys = fx.store.execute(&fx.compile(None, None)).unwrap();

    // Entry 2 has a null pub_date and never matches a comparison.
    assert_eq!(keys, vec![RecordKey(1), RecordKey(3)]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Adding OR conditions for the same attribute can only grow or
    /// preserve the result set.
    #[test]
    fn or_conditions_never_shrink_results(extra in proptest::collection::vec("[a-zA-Z]{0,4}", 0..4)) {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, "s"));
        let base: BTreeSet<RecordKey> =
            fx.store.execute(&fx.compile(None, None)).unwrap().into_iter().collect();

        for value in extra {
            fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, value));
        }
        let widened: BTreeSet<RecordKey> =
            fx.store.execute(&fx.compile(None, None)).unwrap().into_iter().collect();

        prop_assert!(widened.is_superset(&base));
    }

    /// Adding AND conditions for the same attribute can only shrink
    /// or preserve the result set.
    #[test]
    fn and_conditions_never_grow_results(extra in proptest::collection::vec("[a-zA-Z]{0,4}", 0..4)) {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, "s").anded());
        let base: BTreeSet<RecordKey> =
            fx.store.execute(&fx.compile(None, None)).unwrap().into_iter().collect();

        for value in extra {
            fx.add_condition(SearchCondition::new(fx.title, MatchOp::IContains, value).anded());
        }
        let narrowed: BTreeSet<RecordKey> =
            fx.store.execute(&fx.compile(None, None)).unwrap().into_iter().collect();

        prop_assert!(narrowed.is_subset(&base));
    }
}

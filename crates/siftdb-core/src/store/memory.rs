use crate::{
    catalog::MatchOp,
    query::{
        Predicate, QueryPlan,
        ordering::{AggregateFn, OrderDirection, OrderKey},
    },
    store::{
        FieldKind, FieldReading, FieldTarget, ObjectStore, RecordKey, StoreError, StoreRef,
        StoreSchema,
    },
    value::{TextMode, Value, canonical_cmp, compare_order},
};
use regex::Regex;
use std::{cmp::Ordering, collections::BTreeMap};
use tracing::debug;

///
/// MemoryStore
///
/// Deterministic in-memory object store. Record enumeration follows
/// primary-key order, which doubles as the stable order shared by
/// matrix header and row generation.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: BTreeMap<StoreRef, StoredCollection>,
}

#[derive(Clone, Debug, Default)]
struct StoredCollection {
    fields: BTreeMap<String, FieldDecl>,
    records: BTreeMap<RecordKey, StoredRecord>,
}

#[derive(Clone, Debug)]
enum FieldDecl {
    Scalar,
    Relation { target: StoreRef, many: bool },
}

///
/// StoredRecord
///
/// One record: a display string, scalar fields, and relation links.
/// Fields not declared in the collection schema may still be present
/// on records; they read as computed attributes.
///

#[derive(Clone, Debug, Default)]
pub struct StoredRecord {
    display: String,
    fields: BTreeMap<String, Value>,
    relations: BTreeMap<String, Vec<RecordKey>>,
}

impl StoredRecord {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn relation(
        mut self,
        name: impl Into<String>,
        keys: impl IntoIterator<Item = RecordKey>,
    ) -> Self {
        self.relations.insert(name.into(), keys.into_iter().collect());
        self
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// SCHEMA / DATA BUILDERS
    ///

    pub fn declare_collection(&mut self, store: impl Into<StoreRef>) {
        self.collections.entry(store.into()).or_default();
    }

    pub fn declare_scalar(&mut self, store: impl Into<StoreRef>, field: impl Into<String>) {
        self.collections
            .entry(store.into())
            .or_default()
            .fields
            .insert(field.into(), FieldDecl::Scalar);
    }

    pub fn declare_relation(
        &mut self,
        store: impl Into<StoreRef>,
        field: impl Into<String>,
        target: impl Into<StoreRef>,
        many: bool,
    ) {
        self.collections.entry(store.into()).or_default().fields.insert(
            field.into(),
            FieldDecl::Relation {
                target: target.into(),
                many,
            },
        );
    }

    pub fn insert(&mut self, store: impl Into<StoreRef>, key: RecordKey, record: StoredRecord) {
        self.collections
            .entry(store.into())
            .or_default()
            .records
            .insert(key, record);
    }

    ///
    /// INTERNAL LOOKUP
    ///

    fn collection(&self, store: &StoreRef) -> Result<&StoredCollection, StoreError> {
        self.collections
            .get(store)
            .ok_or_else(|| StoreError::UnknownCollection {
                store: store.clone(),
            })
    }

    fn record(&self, store: &StoreRef, key: RecordKey) -> Result<&StoredRecord, StoreError> {
        self.collection(store)?
            .records
            .get(&key)
            .ok_or_else(|| StoreError::UnknownRecord {
                store: store.clone(),
                key,
            })
    }

    /// Walk trailing selector segments starting from a related
    /// record. Traversal through a scalar segment is an execution
    /// error, caught at the retrieval boundary.
    fn path_values(
        &self,
        store: &StoreRef,
        key: RecordKey,
        segments: &[String],
    ) -> Result<Vec<Value>, StoreError> {
        let Some((head, tail)) = segments.split_first() else {
            return Ok(vec![Value::Text(self.display(store, key)?)]);
        };

        let collection = self.collection(store)?;
        let record = collection
            .records
            .get(&key)
            .ok_or_else(|| StoreError::UnknownRecord {
                store: store.clone(),
                key,
            })?;

        match collection.fields.get(head) {
            Some(FieldDecl::Relation { target, .. }) => {
                let keys = record.relations.get(head).cloned().unwrap_or_default();
                let mut values = Vec::new();
                for k in keys {
                    values.extend(self.path_values(target, k, tail)?);
                }
                Ok(values)
            }
            _ => {
                if !tail.is_empty() {
                    return Err(StoreError::TypeMismatch {
                        field: head.clone(),
                        operation: "relationship traversal",
                    });
                }

                Ok(record.fields.get(head).cloned().into_iter().collect())
            }
        }
    }

    ///
    /// PREDICATE EVALUATION
    ///
    /// A comparison matches when any value the target reaches
    /// matches; this mirrors join semantics, where a base record
    /// survives if any joined row satisfies the condition.
    ///

    fn eval(
        &self,
        store: &StoreRef,
        key: RecordKey,
        predicate: &Predicate,
    ) -> Result<bool, StoreError> {
        match predicate {
            Predicate::True => Ok(true),
            Predicate::False => Ok(false),

            Predicate::And(children) => {
                for child in children {
                    if !self.eval(store, key, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(children) => {
                for child in children {
                    if self.eval(store, key, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => Ok(!self.eval(store, key, inner)?),

            Predicate::IsNull { target, expect } => {
                let values = self.read_values(store, key, target)?;
                let is_null = values.iter().all(Value::is_null);
                Ok(is_null == *expect)
            }

            Predicate::Compare(cmp) => {
                let values = self.read_values(store, key, &cmp.target)?;
                for actual in values {
                    if compare_value(&actual, cmp.op, &cmp.value, cmp.target.key())? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    ///
    /// ORDERING
    ///
    /// Records are annotated with their sort values up front, then
    /// stably sorted by the canonical value ordering. Aggregate keys
    /// collapse multi-valued targets to their minimum or maximum.
    ///

    fn sort_keys(
        &self,
        store: &StoreRef,
        keys: Vec<RecordKey>,
        order: &[OrderKey],
    ) -> Result<Vec<RecordKey>, StoreError> {
        let mut annotated: Vec<(Vec<Value>, RecordKey)> = Vec::with_capacity(keys.len());
        for key in keys {
            let mut sort_values = Vec::with_capacity(order.len());
            for order_key in order {
                let values = self.read_values(store, key, &order_key.target)?;
                let value = match order_key.aggregate {
                    Some(AggregateFn::Min) => {
                        values.into_iter().min_by(|a, b| canonical_cmp(a, b))
                    }
                    Some(AggregateFn::Max) => {
                        values.into_iter().max_by(|a, b| canonical_cmp(a, b))
                    }
                    None => values.into_iter().next(),
                };
                sort_values.push(value.unwrap_or(Value::Null));
            }
            annotated.push((sort_values, key));
        }

        annotated.sort_by(|(left, _), (right, _)| {
            for (i, order_key) in order.iter().enumerate() {
                let mut ord = canonical_cmp(&left[i], &right[i]);
                if order_key.direction == OrderDirection::Desc {
                    ord = ord.reverse();
                }
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(annotated.into_iter().map(|(_, key)| key).collect())
    }
}

impl StoreSchema for MemoryStore {
    fn has_collection(&self, store: &StoreRef) -> bool {
        self.collections.contains_key(store)
    }

    fn field_kind(&self, store: &StoreRef, field: &str) -> FieldKind {
        match self.collections.get(store).and_then(|c| c.fields.get(field)) {
            Some(FieldDecl::Scalar) => FieldKind::Scalar,
            Some(FieldDecl::Relation { target, many }) => FieldKind::Relation {
                target: target.clone(),
                many: *many,
            },
            None => FieldKind::Unknown,
        }
    }
}

impl ObjectStore for MemoryStore {
    fn execute(&self, plan: &QueryPlan) -> Result<Vec<RecordKey>, StoreError> {
        let collection = self.collection(&plan.store)?;

        debug!(
            store = %plan.store,
            filters = plan.filters.len(),
            excluded = plan.exclude.is_some(),
            "executing plan"
        );

        // Base enumeration visits each record exactly once, so the
        // distinct guarantee holds by construction.
        let mut keys: Vec<RecordKey> = collection.records.keys().copied().collect();

        for filter in &plan.filters {
            let mut kept = Vec::with_capacity(keys.len());
            for key in keys {
                if self.eval(&plan.store, key, filter)? {
                    kept.push(key);
                }
            }
            keys = kept;
        }

        if let Some(exclude) = &plan.exclude {
            let mut kept = Vec::with_capacity(keys.len());
            for key in keys {
                if !self.eval(&plan.store, key, exclude)? {
                    kept.push(key);
                }
            }
            keys = kept;
        }

        if plan.order.is_empty() {
            return Ok(keys);
        }
        self.sort_keys(&plan.store, keys, &plan.order)
    }

    fn keys(&self, store: &StoreRef) -> Result<Vec<RecordKey>, StoreError> {
        Ok(self.collection(store)?.records.keys().copied().collect())
    }

    fn read(
        &self,
        store: &StoreRef,
        key: RecordKey,
        target: &FieldTarget,
    ) -> Result<FieldReading, StoreError> {
        match target {
            FieldTarget::Scalar { field } | FieldTarget::Computed { field } => {
                let record = self.record(store, key)?;
                Ok(record
                    .fields
                    .get(field)
                    .map_or(FieldReading::Missing, |v| FieldReading::Value(v.clone())))
            }
            FieldTarget::Related {
                relation,
                store: rel_store,
                ..
            } => {
                let record = self.record(store, key)?;
                Ok(FieldReading::Related {
                    store: rel_store.clone(),
                    keys: record.relations.get(relation).cloned().unwrap_or_default(),
                })
            }
        }
    }

    fn read_values(
        &self,
        store: &StoreRef,
        key: RecordKey,
        target: &FieldTarget,
    ) -> Result<Vec<Value>, StoreError> {
        match target {
            FieldTarget::Scalar { field } | FieldTarget::Computed { field } => {
                let record = self.record(store, key)?;
                Ok(record.fields.get(field).cloned().into_iter().collect())
            }
            FieldTarget::Related {
                relation,
                store: rel_store,
                rest,
                ..
            } => {
                let record = self.record(store, key)?;
                let keys = record.relations.get(relation).cloned().unwrap_or_default();

                if rest.is_empty() {
                    return keys
                        .iter()
                        .map(|k| self.display(rel_store, *k).map(Value::Text))
                        .collect();
                }

                let mut values = Vec::new();
                for k in keys {
                    values.extend(self.path_values(rel_store, k, rest)?);
                }
                Ok(values)
            }
        }
    }

    fn display(&self, store: &StoreRef, key: RecordKey) -> Result<String, StoreError> {
        Ok(self.record(store, key)?.display.clone())
    }
}

/// Apply one operator to a single reached value.
///
/// `Null` never matches. Text operators cast non-text values through
/// their display form (the storage-layer equivalent of LIKE casts);
/// date-part and regex operators are strict about their input types
/// and surface a catchable execution error instead.
fn compare_value(
    actual: &Value,
    op: MatchOp,
    operand: &Value,
    field: &str,
) -> Result<bool, StoreError> {
    if actual.is_null() {
        return Ok(false);
    }

    let mode = if op.case_insensitive() {
        TextMode::Ci
    } else {
        TextMode::Cs
    };

    match op {
        MatchOp::Exact | MatchOp::IExact => {
            if let Some(matched) = casting_text(actual).text_eq(operand, mode) {
                return Ok(matched);
            }
            Ok(compare_order(actual, operand) == Some(Ordering::Equal))
        }

        MatchOp::Contains | MatchOp::IContains => Ok(casting_text(actual)
            .text_contains(operand, mode)
            .unwrap_or(false)),
        MatchOp::StartsWith | MatchOp::IStartsWith => Ok(casting_text(actual)
            .text_starts_with(operand, mode)
            .unwrap_or(false)),
        MatchOp::EndsWith | MatchOp::IEndsWith => Ok(casting_text(actual)
            .text_ends_with(operand, mode)
            .unwrap_or(false)),

        MatchOp::Regex | MatchOp::IRegex => regex_match(actual, op, operand, field),

        MatchOp::Year | MatchOp::Month | MatchOp::Day | MatchOp::WeekDay => {
            let Value::Timestamp(ts) = actual else {
                return Err(StoreError::TypeMismatch {
                    field: field.to_string(),
                    operation: op.label(),
                });
            };
            let part = match op {
                MatchOp::Year => ts.year(),
                MatchOp::Month => ts.month(),
                MatchOp::Day => ts.day(),
                _ => ts.week_day(),
            };
            Ok(Value::Int(part) == *operand)
        }

        MatchOp::Gt | MatchOp::After => {
            Ok(compare_order(actual, operand).is_some_and(Ordering::is_gt))
        }
        MatchOp::Gte => Ok(compare_order(actual, operand).is_some_and(Ordering::is_ge)),
        MatchOp::Lt => Ok(compare_order(actual, operand).is_some_and(Ordering::is_lt)),
        MatchOp::Lte | MatchOp::Before => {
            Ok(compare_order(actual, operand).is_some_and(Ordering::is_le))
        }

        MatchOp::IsNull => {
            // CONTRACT: null checks compile to Predicate::IsNull.
            Err(StoreError::TypeMismatch {
                field: field.to_string(),
                operation: op.label(),
            })
        }
    }
}

fn regex_match(
    actual: &Value,
    op: MatchOp,
    operand: &Value,
    field: &str,
) -> Result<bool, StoreError> {
    let (Value::Text(text), Value::Text(pattern)) = (actual, operand) else {
        return Err(StoreError::TypeMismatch {
            field: field.to_string(),
            operation: op.label(),
        });
    };

    let pattern = if op == MatchOp::IRegex {
        format!("(?i){pattern}")
    } else {
        pattern.clone()
    };

    let re = Regex::new(&pattern).map_err(|e| StoreError::InvalidPattern {
        pattern,
        message: e.to_string(),
    })?;

    Ok(re.is_match(text))
}

/// Text-op view of a value: text passes through, anything else is
/// cast to its display form.
fn casting_text(value: &Value) -> Value {
    match value {
        Value::Text(_) => value.clone(),
        other => Value::Text(other.to_string()),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::ordering::{AggregateFn, OrderDirection, OrderKey},
        types::Timestamp,
    };

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.declare_scalar("group", "name");
        store.insert(
            "group",
            RecordKey(1),
            StoredRecord::new("Messenger").field("name", Value::text("Messenger")),
        );
        store.insert(
            "group",
            RecordKey(2),
            StoredRecord::new("Press").field("name", Value::text("Press")),
        );

        store.declare_scalar("contact", "city");
        store.declare_relation("contact", "groups", "group", true);
        store.insert(
            "contact",
            RecordKey(1),
            StoredRecord::new("Ada")
                .field("city", Value::text("Garching"))
                .relation("groups", [RecordKey(1)]),
        );
        store.insert(
            "contact",
            RecordKey(2),
            StoredRecord::new("Grace")
                .field("city", Value::Null)
                .relation("groups", [RecordKey(1), RecordKey(2)]),
        );
        store.insert(
            "contact",
            RecordKey(3),
            StoredRecord::new("Edsger").field("city", Value::text("Amsterdam")),
        );
        store
    }

    fn groups_target() -> FieldTarget {
        FieldTarget::Related {
            relation: "groups".to_string(),
            store: "group".into(),
            many: true,
            rest: vec!["name".to_string()],
        }
    }

    fn plan_with_filter(filter: Predicate) -> QueryPlan {
        QueryPlan {
            store: "contact".into(),
            filters: vec![filter],
            exclude: None,
            distinct: true,
            order: vec![],
        }
    }

    #[test]
    fn relation_compare_matches_any_related_row() {
        let store = store();
        let plan = plan_with_filter(Predicate::condition(
            groups_target(),
            MatchOp::Exact,
            Value::text("Press"),
        ));

        assert_eq!(store.execute(&plan).unwrap(), vec![RecordKey(2)]);
    }

    #[test]
    fn isnull_on_relation_matches_unlinked_records() {
        let store = store();
        let plan = plan_with_filter(Predicate::IsNull {
            target: groups_target(),
            expect: true,
        });

        assert_eq!(store.execute(&plan).unwrap(), vec![RecordKey(3)]);
    }

    #[test]
    fn isnull_matches_null_scalar() {
        let store = store();
        let plan = plan_with_filter(Predicate::IsNull {
            target: FieldTarget::Scalar {
                field: "city".to_string(),
            },
            expect: true,
        });

        assert_eq!(store.execute(&plan).unwrap(), vec![RecordKey(2)]);
    }

    #[test]
    fn aggregate_sort_uses_min_ascending_and_max_descending() {
        let store = store();

        // Ascending by min group name: Ada/Grace share "Messenger",
        // Edsger has no groups and sorts per the canonical rank of
        // Null.
        let mut plan = QueryPlan::unfiltered("contact".into());
        plan.order = vec![OrderKey {
            target: groups_target(),
            direction: OrderDirection::Asc,
            aggregate: Some(AggregateFn::Min),
        }];
        let asc = store.execute(&plan).unwrap();

        plan.order = vec![OrderKey {
            target: groups_target(),
            direction: OrderDirection::Desc,
            aggregate: Some(AggregateFn::Max),
        }];
        let desc = store.execute(&plan).unwrap();

        // Grace's max is "Press", so she leads the descending order.
        assert_eq!(desc.first(), Some(&RecordKey(2)));
        // Ascending min keeps Ada and Grace tied on "Messenger" in
        // key order.
        let ada = asc.iter().position(|k| *k == RecordKey(1)).unwrap();
        let grace = asc.iter().position(|k| *k == RecordKey(2)).unwrap();
        assert!(ada < grace);
    }

    #[test]
    fn invalid_regex_surfaces_catchable_error() {
        let store = store();
        let plan = plan_with_filter(Predicate::condition(
            FieldTarget::Scalar {
                field: "city".to_string(),
            },
            MatchOp::Regex,
            Value::text("("),
        ));

        assert!(matches!(
            store.execute(&plan),
            Err(StoreError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn date_part_on_text_field_is_a_type_mismatch() {
        let store = store();
        let plan = plan_with_filter(Predicate::condition(
            FieldTarget::Scalar {
                field: "city".to_string(),
            },
            MatchOp::Year,
            Value::Int(2020),
        ));

        assert!(matches!(
            store.execute(&plan),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn date_part_matches_timestamp_field() {
        let mut store = store();
        store.declare_scalar("contact", "joined");
        let ts = Timestamp::parse_rfc3339("2020-06-15T12:00:00Z").unwrap();
        store.insert(
            "contact",
            RecordKey(4),
            StoredRecord::new("Alan").field("joined", Value::Timestamp(ts)),
        );

        let target = FieldTarget::Scalar {
            field: "joined".to_string(),
        };
        let plan = plan_with_filter(Predicate::condition(
            target,
            MatchOp::Year,
            Value::Int(2020),
        ));

        assert_eq!(store.execute(&plan).unwrap(), vec![RecordKey(4)]);
    }

    #[test]
    fn text_ops_cast_non_text_values() {
        let mut store = MemoryStore::new();
        store.declare_scalar("entry", "rating");
        store.insert(
            "entry",
            RecordKey(1),
            StoredRecord::new("e1").field("rating", Value::Int(42)),
        );

        let plan = QueryPlan {
            store: "entry".into(),
            filters: vec![Predicate::condition(
                FieldTarget::Scalar {
                    field: "rating".to_string(),
                },
                MatchOp::IContains,
                Value::text("4"),
            )],
            exclude: None,
            distinct: true,
            order: vec![],
        };

        assert_eq!(store.execute(&plan).unwrap(), vec![RecordKey(1)]);
    }

    #[test]
    fn unknown_collection_is_an_execution_error() {
        let store = MemoryStore::new();
        let plan = QueryPlan::unfiltered("nowhere".into());

        assert!(matches!(
            store.execute(&plan),
            Err(StoreError::UnknownCollection { .. })
        ));
    }

    #[test]
    fn traversal_through_scalar_is_a_type_mismatch() {
        let store = store();
        let target = FieldTarget::Related {
            relation: "groups".to_string(),
            store: "group".into(),
            many: true,
            rest: vec!["name".to_string(), "deeper".to_string()],
        };
        let plan = plan_with_filter(Predicate::condition(
            target,
            MatchOp::Exact,
            Value::text("x"),
        ));

        assert!(matches!(
            store.execute(&plan),
            Err(StoreError::TypeMismatch { .. })
        ));
    }
}

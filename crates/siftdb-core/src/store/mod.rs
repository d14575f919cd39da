pub mod memory;

use crate::{query::QueryPlan, value::Value};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

// re-exports
pub use memory::{MemoryStore, StoredRecord};

///
/// StoreRef
///
/// Key naming one backing collection in the object store.
///

#[derive(
    Clone, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct StoreRef(String);

impl StoreRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoreRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

///
/// RecordKey
///
/// Primary key of a stored record.
///

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
pub struct RecordKey(pub u64);

///
/// FieldKind
///
/// Storage-level classification of a field name, as reported by the
/// store's schema. `Unknown` covers computed/virtual attributes that
/// have no storage metadata at all.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Scalar,
    Relation { target: StoreRef, many: bool },
    Unknown,
}

///
/// FieldTarget
///
/// Fully-resolved attribute accessor. Resolution happens once, at
/// compile time; predicates and projections address fields through
/// this tagged union, never through concatenated accessor strings.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldTarget {
    /// Direct stored field.
    Scalar { field: String },

    /// Traversal into a related collection, optionally continuing
    /// through `rest` segments on the related records.
    Related {
        relation: String,
        store: StoreRef,
        many: bool,
        rest: Vec<String>,
    },

    /// Virtual attribute; read directly off the materialized record,
    /// never failing the query.
    Computed { field: String },
}

impl FieldTarget {
    /// The leading field name this target addresses.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Scalar { field } | Self::Computed { field } => field,
            Self::Related { relation, .. } => relation,
        }
    }

    #[must_use]
    pub const fn is_many(&self) -> bool {
        matches!(self, Self::Related { many: true, .. })
    }
}

///
/// FieldReading
///
/// Result of reading a target off one record. Distinguishes a
/// missing field from a present field whose value may be `Null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldReading {
    Missing,
    Value(Value),
    Related { store: StoreRef, keys: Vec<RecordKey> },
}

///
/// StoreSchema
///
/// Metadata surface consulted during compile-time attribute
/// resolution. Pure lookup; no record access.
///

pub trait StoreSchema {
    fn has_collection(&self, store: &StoreRef) -> bool;

    fn field_kind(&self, store: &StoreRef, field: &str) -> FieldKind;
}

///
/// ObjectStore
///
/// The generic object store collaborator. Every operation that
/// touches records returns a `Result`: runtime failures (operator
/// applied to an incompatible stored type, a bad pattern, a vanished
/// collection) must be catchable at the retrieval boundary, never a
/// crash.
///

pub trait ObjectStore: StoreSchema {
    /// Execute a compiled plan, returning distinct record keys in
    /// final order.
    fn execute(&self, plan: &QueryPlan) -> Result<Vec<RecordKey>, StoreError>;

    /// Count the plan's results.
    fn count(&self, plan: &QueryPlan) -> Result<usize, StoreError> {
        Ok(self.execute(plan)?.len())
    }

    /// Enumerate a collection's keys in stable (primary key) order.
    /// Shared by matrix header and row generation, which must agree.
    fn keys(&self, store: &StoreRef) -> Result<Vec<RecordKey>, StoreError>;

    /// Read a resolved target off one record.
    fn read(
        &self,
        store: &StoreRef,
        key: RecordKey,
        target: &FieldTarget,
    ) -> Result<FieldReading, StoreError>;

    /// All values a target reaches on one record, trailing selector
    /// segments included. Scalar and computed targets yield at most
    /// one value; relation targets yield one value per related
    /// record.
    fn read_values(
        &self,
        store: &StoreRef,
        key: RecordKey,
        target: &FieldTarget,
    ) -> Result<Vec<Value>, StoreError>;

    /// Human-readable representation of one record.
    fn display(&self, store: &StoreRef, key: RecordKey) -> Result<String, StoreError>;
}

///
/// StoreError
///
/// Execution-time failures. Converted to a display string and an
/// empty result set at the retrieval boundary.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cannot apply {operation} to field '{field}'")]
    TypeMismatch {
        field: String,
        operation: &'static str,
    },

    #[error("unknown collection '{store}'")]
    UnknownCollection { store: StoreRef },

    #[error("unknown record {key} in collection '{store}'")]
    UnknownRecord { store: StoreRef, key: RecordKey },
}

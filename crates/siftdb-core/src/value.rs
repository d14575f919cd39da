use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, mem::discriminant};

///
/// Value
///
/// Runtime representation of a stored field value or a coerced
/// condition operand.
///
/// Null → the field's value is absent (i.e., SQL NULL).
/// List → many-cardinality transport; order is preserved.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    List(Vec<Self>),
    Null,
    Text(String),
    Timestamp(Timestamp),
}

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    Cs, // case-sensitive
    Ci, // case-insensitive
}

impl Value {
    /// Build a `Value::Text` from anything string-like.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_text(&self) -> Option<&String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    ///
    /// TEXT COMPARISONS
    ///
    /// Returns `None` when either side is not text; callers decide
    /// whether that is a non-match or an execution error.
    ///

    #[must_use]
    pub fn text_eq(&self, other: &Self, mode: TextMode) -> Option<bool> {
        let (a, b) = (self.as_text()?, other.as_text()?);
        Some(match mode {
            TextMode::Cs => a == b,
            TextMode::Ci => casefold(a) == casefold(b),
        })
    }

    #[must_use]
    pub fn text_contains(&self, other: &Self, mode: TextMode) -> Option<bool> {
        let (a, b) = (self.as_text()?, other.as_text()?);
        Some(match mode {
            TextMode::Cs => a.contains(b.as_str()),
            TextMode::Ci => casefold(a).contains(&casefold(b)),
        })
    }

    #[must_use]
    pub fn text_starts_with(&self, other: &Self, mode: TextMode) -> Option<bool> {
        let (a, b) = (self.as_text()?, other.as_text()?);
        Some(match mode {
            TextMode::Cs => a.starts_with(b.as_str()),
            TextMode::Ci => casefold(a).starts_with(&casefold(b)),
        })
    }

    #[must_use]
    pub fn text_ends_with(&self, other: &Self, mode: TextMode) -> Option<bool> {
        let (a, b) = (self.as_text()?, other.as_text()?);
        Some(match mode {
            TextMode::Cs => a.ends_with(b.as_str()),
            TextMode::Ci => casefold(a).ends_with(&casefold(b)),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(", "))
            }
            Self::Null => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

/// Perform ordering comparison between two values.
///
/// Identical variants compare strictly; `Int` and `Timestamp` widen to
/// a common numeric axis (epoch seconds literals are accepted where a
/// timestamp is stored). Returns `None` if ordering is undefined for
/// the given pair.
#[must_use]
pub fn compare_order(left: &Value, right: &Value) -> Option<Ordering> {
    if same_variant(left, right) {
        return strict_ordering(left, right);
    }

    match (left, right) {
        (Value::Int(a), Value::Timestamp(b)) => cmp_signed_unsigned(*a, b.get()),
        (Value::Timestamp(a), Value::Int(b)) => {
            cmp_signed_unsigned(*b, a.get()).map(Ordering::reverse)
        }
        _ => None,
    }
}

/// Canonical total ordering for result sorting.
///
/// This is the only ordering used for ORDER BY and aggregate
/// annotation keys; values of non-matching variants fall back to a
/// fixed variant rank so the sort is total.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    if let Some(ordering) = compare_order(left, right) {
        return ordering;
    }

    canonical_rank(left).cmp(&canonical_rank(right))
}

const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Int(_) => 1,
        Value::List(_) => 2,
        Value::Null => 3,
        Value::Text(_) => 4,
        Value::Timestamp(_) => 5,
    }
}

fn same_variant(left: &Value, right: &Value) -> bool {
    discriminant(left) == discriminant(right)
}

/// Strict ordering for identical value variants.
fn strict_ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
        _ => {
            // NOTE: Null and List do not define ordering.
            None
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn cmp_signed_unsigned(a: i64, b: u64) -> Option<Ordering> {
    if a < 0 {
        return Some(Ordering::Less);
    }

    (a as u64).partial_cmp(&b)
}

fn casefold(input: &str) -> String {
    if input.is_ascii() {
        return input.to_ascii_lowercase();
    }

    input.to_lowercase()
}

///
/// TESTS
///

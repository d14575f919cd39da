use crate::{types::Timestamp, value::Value};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// MatchOp
///
/// The closed operator vocabulary for search conditions. Conditions
/// never carry user-authored expressions; every comparison is one of
/// these operators applied to a single coerced operand.
///
/// `After` and `Before` lower to the same comparisons as `Gt` and
/// `Lte`; the variants stay distinct because they keep their own
/// display labels and are the only operators honoring the `now()`
/// timestamp sentinel.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MatchOp {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    IExact,
    IContains,
    IStartsWith,
    IEndsWith,
    IRegex,
    Year,
    Month,
    Day,
    WeekDay,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
    After,
    Before,
}

///
/// ValueClass
///
/// Coercion class of an operator's operand. Declared per operator;
/// validation and coercion consult the class, never the operator
/// directly.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueClass {
    /// Trimmed, case-insensitive `true`/`false`.
    Boolean,
    /// Integer literal (date parts).
    Integer,
    /// Integer, else RFC3339 timestamp, else raw text.
    Ordinal,
    /// `now()` sentinel, else timestamp (epoch seconds or RFC3339),
    /// else raw text.
    Temporal,
    /// Pass-through.
    Text,
}

///
/// CoerceError
///
/// Operand validation failures, surfaced to the search editor at
/// definition time.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CoerceError {
    #[error("Value is not an integer.")]
    NotAnInteger,
    #[error("Value is not a truth value.")]
    NotATruthValue,
}

impl MatchOp {
    pub const ALL: [Self; 21] = [
        Self::Exact,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Regex,
        Self::IExact,
        Self::IContains,
        Self::IStartsWith,
        Self::IEndsWith,
        Self::IRegex,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::WeekDay,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::IsNull,
        Self::After,
        Self::Before,
    ];

    /// Stable wire/storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Exact => "__exact",
            Self::Contains => "__contains",
            Self::StartsWith => "__startswith",
            Self::EndsWith => "__endswith",
            Self::Regex => "__regex",
            Self::IExact => "__iexact",
            Self::IContains => "__icontains",
            Self::IStartsWith => "__istartswith",
            Self::IEndsWith => "__iendswith",
            Self::IRegex => "__iregex",
            Self::Year => "__year",
            Self::Month => "__month",
            Self::Day => "__day",
            Self::WeekDay => "__week_day",
            Self::Gt | Self::After => "__gt",
            Self::Gte => "__gte",
            Self::Lt => "__lt",
            Self::Lte | Self::Before => "__lte",
            Self::IsNull => "__isnull",
        }
    }

    /// Editor-facing display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Contains => "Contains",
            Self::StartsWith => "Starts with",
            Self::EndsWith => "Ends with",
            Self::Regex => "Regular expression",
            Self::IExact => "Exact (case-insensitive)",
            Self::IContains => "Contains (case-insensitive)",
            Self::IStartsWith => "Starts with (case-insensitive)",
            Self::IEndsWith => "Ends with (case-insensitive)",
            Self::IRegex => "Regular expression (case-insensitive)",
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Day => "Day",
            Self::WeekDay => "Week day",
            Self::Gt => "Greater than",
            Self::Gte => "Greater than or equal to",
            Self::Lt => "Less than",
            Self::Lte => "Less than or equal to",
            Self::IsNull => "Is null",
            Self::After => "After",
            Self::Before => "Before",
        }
    }

    #[must_use]
    pub const fn value_class(self) -> ValueClass {
        match self {
            Self::Year | Self::Month | Self::Day | Self::WeekDay => ValueClass::Integer,
            Self::IsNull => ValueClass::Boolean,
            Self::After | Self::Before => ValueClass::Temporal,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => ValueClass::Ordinal,
            _ => ValueClass::Text,
        }
    }

    #[must_use]
    pub const fn case_insensitive(self) -> bool {
        matches!(
            self,
            Self::IExact | Self::IContains | Self::IStartsWith | Self::IEndsWith | Self::IRegex
        )
    }

    /// Coerce a raw operand string according to this operator's
    /// value class.
    pub fn coerce(self, raw: &str) -> Result<Value, CoerceError> {
        match self.value_class() {
            ValueClass::Integer => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CoerceError::NotAnInteger),

            ValueClass::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(CoerceError::NotATruthValue),
            },

            ValueClass::Temporal => {
                if raw == "now()" {
                    return Ok(Value::Timestamp(Timestamp::now()));
                }
                Ok(Timestamp::parse_flexible(raw)
                    .map_or_else(|_| Value::text(raw), Value::Timestamp))
            }

            ValueClass::Ordinal => {
                if let Ok(n) = raw.parse::<i64>() {
                    return Ok(Value::Int(n));
                }
                Ok(Timestamp::parse_rfc3339(raw)
                    .map_or_else(|_| Value::text(raw), Value::Timestamp))
            }

            ValueClass::Text => Ok(Value::text(raw)),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_class_coerces_or_fails() {
        assert_eq!(MatchOp::Year.coerce("2020"), Ok(Value::Int(2020)));
        assert_eq!(MatchOp::Year.coerce("other"), Err(CoerceError::NotAnInteger));
    }

    #[test]
    fn boolean_class_accepts_trimmed_case_insensitive_tokens() {
        assert_eq!(MatchOp::IsNull.coerce(" False "), Ok(Value::Bool(false)));
        assert_eq!(MatchOp::IsNull.coerce("TRUE"), Ok(Value::Bool(true)));
        assert_eq!(
            MatchOp::IsNull.coerce("other"),
            Err(CoerceError::NotATruthValue)
        );
    }

    #[test]
    fn temporal_class_substitutes_now() {
        let Ok(Value::Timestamp(t)) = MatchOp::After.coerce("now()") else {
            panic!("expected a timestamp");
        };
        assert!(t.get() > 0);
    }

    #[test]
    fn temporal_class_parses_epoch_and_rfc3339() {
        assert_eq!(
            MatchOp::Before.coerce("1710013530"),
            Ok(Value::Timestamp(Timestamp::from_seconds(1_710_013_530)))
        );
        assert_eq!(
            MatchOp::Before.coerce("2024-03-09T19:45:30Z"),
            Ok(Value::Timestamp(Timestamp::from_seconds(1_710_013_530)))
        );
    }

    #[test]
    fn text_class_passes_through() {
        assert_eq!(MatchOp::Contains.coerce("contains"), Ok(Value::text("contains")));
    }

    #[test]
    fn ordinal_class_prefers_integers() {
        assert_eq!(MatchOp::Gt.coerce("5"), Ok(Value::Int(5)));
        assert_eq!(MatchOp::Lt.coerce("abc"), Ok(Value::text("abc")));
    }

    #[test]
    fn aliases_share_codes_but_keep_labels() {
        assert_eq!(MatchOp::After.code(), MatchOp::Gt.code());
        assert_eq!(MatchOp::Before.code(), MatchOp::Lte.code());
        assert_ne!(MatchOp::After.label(), MatchOp::Gt.label());
        assert_ne!(MatchOp::Before.label(), MatchOp::Lte.label());
    }
}

use crate::{catalog::MatchOp, store::FieldTarget, value::Value};
use std::ops::{BitAnd, BitOr};

///
/// Predicate AST
///
/// Pure representation of compiled filter conditions. This layer
/// contains no evaluation or storage logic; the object store
/// interprets predicates during execution.
///

///
/// ComparePredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparePredicate {
    pub target: FieldTarget,
    pub op: MatchOp,
    pub value: Value,
}

///
/// Predicate
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
    IsNull { target: FieldTarget, expect: bool },
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    /// Build the predicate for one coerced condition entry.
    ///
    /// The null-check operator becomes a dedicated node; every other
    /// operator becomes a comparison.
    #[must_use]
    pub fn condition(target: FieldTarget, op: MatchOp, value: Value) -> Self {
        if op == MatchOp::IsNull {
            let expect = matches!(value, Value::Bool(true));
            return Self::IsNull { target, expect };
        }

        Self::Compare(ComparePredicate { target, op, value })
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

///
/// TESTS
///

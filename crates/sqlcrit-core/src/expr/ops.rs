use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Slot
/// Conjunction joining a predicate to the predicates before it.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Slot {
    #[default]
    #[display("AND")]
    And,
    #[display("OR")]
    Or,
}

///
/// MatchMode
///
/// How an expression names its column. Fixed at construction.
///
/// - `Immediate`: raw SQL column text, no metadata lookup.
/// - `Standard`: logical property resolved through entity metadata.
/// - `Exists`: no column target (subquery existence, nested groups).
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum MatchMode {
    #[display("IMMEDIATE")]
    Immediate,
    #[display("STANDARD")]
    Standard,
    #[display("EXISTS")]
    Exists,
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CompareOp {
    #[display("=")]
    Eq,
    #[display("<>")]
    Ne,
    #[display(">")]
    Gt,
    #[display(">=")]
    Ge,
    #[display("<")]
    Lt,
    #[display("<=")]
    Le,
}

///
/// RangeOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum RangeOp {
    #[display("IN")]
    In,
    #[display("NOT IN")]
    NotIn,
}

///
/// BetweenOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum BetweenOp {
    #[display("BETWEEN")]
    Between,
    #[display("NOT BETWEEN")]
    NotBetween,
}

///
/// FuzzyOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum FuzzyOp {
    #[display("LIKE")]
    Like,
    #[display("NOT LIKE")]
    NotLike,
}

///
/// Wildcard
/// Where `%` is placed around a fuzzy-match value.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Wildcard {
    /// `%value`
    #[display("PREFIX")]
    Prefix,
    /// `value%`
    #[display("SUFFIX")]
    Suffix,
    /// `%value%`
    #[default]
    #[display("BOTH")]
    Both,
}

impl Wildcard {
    /// Wrap the raw text with `%` on the configured side(s).
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Prefix => format!("%{text}"),
            Self::Suffix => format!("{text}%"),
            Self::Both => format!("%{text}%"),
        }
    }
}

///
/// NullOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum NullOp {
    #[display("IS NULL")]
    IsNull,
    #[display("IS NOT NULL")]
    IsNotNull,
}

///
/// SubqueryOp
/// Operators allowed between a column and a scalar or list subquery.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum SubqueryOp {
    #[display("=")]
    Eq,
    #[display("<>")]
    Ne,
    #[display(">")]
    Gt,
    #[display(">=")]
    Ge,
    #[display("<")]
    Lt,
    #[display("<=")]
    Le,
    #[display("IN")]
    In,
    #[display("NOT IN")]
    NotIn,
}

#[cfg(test)]
mod tests;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};
use ulid::Ulid;

///
/// Value
///
/// Bound parameter payload carried by expressions and emitted in the
/// compiled parameter map. The converter never interpolates a `Value`
/// into SQL text; every value travels through a placeholder.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Date(Date),
    Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    Ulid(Ulid),
    /// Ordered list of values.
    /// Lists expand into one placeholder per element where the operator
    /// allows it (IN lists and template arguments).
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Borrow the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Stable tag used by diagnostics.
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Bool(_) => ValueTag::Bool,
            Self::Int(_) => ValueTag::Int,
            Self::Uint(_) => ValueTag::Uint,
            Self::Float(_) => ValueTag::Float,
            Self::Text(_) => ValueTag::Text,
            Self::Bytes(_) => ValueTag::Bytes,
            Self::Date(_) => ValueTag::Date,
            Self::Timestamp(_) => ValueTag::Timestamp,
            Self::Ulid(_) => ValueTag::Ulid,
            Self::List(_) => ValueTag::List,
        }
    }

    /// Flatten one level of list nesting into individual bind values.
    ///
    /// Scalars yield themselves; lists yield their elements in order.
    #[must_use]
    pub fn into_elements(self) -> Vec<Self> {
        match self {
            Self::List(items) => items,
            other => vec![other],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Date(v) => write!(f, "{v}"),
            Self::Timestamp(v) => f.write_str(&v.format(&Rfc3339).map_err(|_| fmt::Error)?),
            Self::Ulid(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

///
/// ValueTag
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ValueTag {
    #[display("null")]
    Null,
    #[display("bool")]
    Bool,
    #[display("int")]
    Int,
    #[display("uint")]
    Uint,
    #[display("float")]
    Float,
    #[display("text")]
    Text,
    #[display("bytes")]
    Bytes,
    #[display("date")]
    Date,
    #[display("timestamp")]
    Timestamp,
    #[display("ulid")]
    Ulid,
    #[display("list")]
    List,
}

///
/// IntoValue
///
/// Conversion of caller-side Rust values into bind values.
/// `Option::None` converts to `Value::Null`, which single-value
/// conditions treat as an absent input.
///

pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &Value {
    fn into_value(self) -> Value {
        self.clone()
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for Date {
    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl IntoValue for OffsetDateTime {
    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }
}

impl IntoValue for Ulid {
    fn into_value(self) -> Value {
        Value::Ulid(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

macro_rules! impl_into_value_signed {
    ( $( $t:ty ),* $(,)? ) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }
        )*
    };
}

macro_rules! impl_into_value_unsigned {
    ( $( $t:ty ),* $(,)? ) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Value {
                    Value::Uint(u64::from(self))
                }
            }
        )*
    };
}

impl_into_value_signed!(i8, i16, i32, i64);
impl_into_value_unsigned!(u8, u16, u32, u64);

use crate::expr::Target;
use derive_more::Display;

///
/// Aggregate
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Aggregate {
    #[display("COUNT")]
    Count,
    #[display("SUM")]
    Sum,
    #[display("AVG")]
    Avg,
    #[display("MIN")]
    Min,
    #[display("MAX")]
    Max,
}

///
/// Selection
/// One projection item. Duplicate aliases are allowed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    Column {
        target: Target,
        alias: Option<String>,
    },
    Native {
        sql: String,
        alias: Option<String>,
    },
    /// `target: None` aggregates over `*`.
    Function {
        func: Aggregate,
        target: Option<Target>,
        distinct: bool,
        alias: Option<String>,
    },
}

impl Selection {
    /// Plain column or native text, as opposed to an aggregate.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        !matches!(self, Self::Function { .. })
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Column { alias, .. } | Self::Native { alias, .. } | Self::Function { alias, .. } => {
                alias.as_deref()
            }
        }
    }
}

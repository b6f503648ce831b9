use crate::expr::Target;
use derive_more::Display;

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Direction {
    #[default]
    #[display("ASC")]
    Asc,
    #[display("DESC")]
    Desc,
}

///
/// OrderBy
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OrderBy {
    Column { target: Target, direction: Direction },
    /// Raw ORDER BY item, direction included.
    Native(String),
}

///
/// Grouping
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Grouping {
    Column(Target),
    Native(String),
}

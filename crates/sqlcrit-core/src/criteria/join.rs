use derive_more::Display;

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum JoinKind {
    #[default]
    #[display("INNER JOIN")]
    Inner,
    #[display("LEFT JOIN")]
    Left,
    #[display("RIGHT JOIN")]
    Right,
}

///
/// JoinSpec
/// How a criteria participates when joined into a master criteria.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    /// Append this participant's projection to the master's SELECT.
    pub fetch: bool,
}

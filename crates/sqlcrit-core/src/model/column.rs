///
/// Column
/// Metadata for one mapped column, as produced by the metadata source.
/// The criteria layer consumes columns; it never invents them.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    /// Physical column name as written in SQL.
    pub name: String,
    /// Logical property name used by callers.
    pub property: String,
    pub flags: ColumnFlags,
}

impl Column {
    /// Create a plain mapped column.
    #[must_use]
    pub fn new(property: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property: property.into(),
            flags: ColumnFlags::default(),
        }
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.flags.primary = true;
        self.flags.unique = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.flags.unique = true;
        self
    }

    #[must_use]
    pub const fn version(mut self) -> Self {
        self.flags.version = true;
        self
    }

    #[must_use]
    pub const fn tenant(mut self) -> Self {
        self.flags.tenant = true;
        self
    }

    #[must_use]
    pub const fn logical_delete(mut self) -> Self {
        self.flags.logical_delete = true;
        self
    }

    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.flags.primary
    }
}

///
/// ColumnFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ColumnFlags {
    pub primary: bool,
    pub unique: bool,
    pub version: bool,
    pub tenant: bool,
    pub logical_delete: bool,
}

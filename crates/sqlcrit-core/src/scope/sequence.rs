use crate::value::Value;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::sync::atomic::{AtomicU64, Ordering};

///
/// ParameterSequence
///
/// Lock-free, monotonic source of parameter names. Names are never
/// reused for the lifetime of the owning scope.
///

#[derive(Debug)]
pub struct ParameterSequence {
    prefix: String,
    issued: AtomicU64,
}

impl ParameterSequence {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: AtomicU64::new(0),
        }
    }

    /// Allocate the next parameter name (`p1`, `p2`, ...).
    #[must_use]
    pub fn next_parameter_name(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;

        format!("{}{n}", self.prefix)
    }

    /// Number of names handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

///
/// AliasSequence
/// Lock-free, monotonic source of default table aliases.
///

#[derive(Debug)]
pub struct AliasSequence {
    prefix: String,
    issued: AtomicU64,
}

impl AliasSequence {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: AtomicU64::new(0),
        }
    }

    /// Allocate the next default alias (`t1`, `t2`, ...).
    #[must_use]
    pub fn next_alias(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;

        format!("{}{n}", self.prefix)
    }

    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

///
/// ParameterMap
///
/// Ordered parameter-name → value bindings for one compiled statement.
/// Arrival order is bind order: left to right, depth first.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(String, Value)>,
}

impl ParameterMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append one binding. Names come from a `ParameterSequence` and are
    /// never repeated, so no lookup is needed.
    pub fn record(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in bind order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Parameter values in bind order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

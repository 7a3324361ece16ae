//! Fetch shapes
//!
//! The generic contract offers several shapes for a fetched row; the
//! statement picks one per fetch call. Shapes are represented as an enum
//! rather than numeric mode constants, so an invalid mode is
//! unrepresentable.

use indexmap::IndexMap;

use crate::options::NullHandling;
use crate::row::Value;

/// Shape requested for a fetched row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Both name-keyed and position-keyed views of the row
    #[default]
    Both,
    /// Name-keyed map only
    Assoc,
    /// Position-keyed list only
    Num,
    /// Single column by zero-based index
    Column(usize),
    /// Object-like row with folding and normalization applied
    Object,
}

/// One fetched row, in the shape that was requested
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Name-keyed and position-keyed views of the same row
    Both {
        /// Values keyed by column name, in column order
        by_name: IndexMap<String, Value>,
        /// Values keyed by position
        by_index: Vec<Value>,
    },
    /// Name-keyed map
    Assoc(IndexMap<String, Value>),
    /// Position-keyed list
    Num(Vec<Value>),
    /// Single column value
    Column(Value),
    /// Object-like row
    Object(ObjectRow),
}

impl Fetched {
    /// First column of the row, whatever the shape
    pub fn first_value(&self) -> Option<&Value> {
        match self {
            Fetched::Both { by_index, .. } => by_index.first(),
            Fetched::Assoc(map) => map.values().next(),
            Fetched::Num(values) => values.first(),
            Fetched::Column(value) => Some(value),
            Fetched::Object(row) => row.fields.values().next(),
        }
    }
}

/// Object-shaped row: named fields in column order
///
/// Stands in for the dynamic record objects of the generic contract. A
/// caller that wants its own type builds it from the fields via
/// [`Statement::fetch_object_with`](crate::Statement::fetch_object_with).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectRow {
    fields: IndexMap<String, Value>,
}

impl ObjectRow {
    /// Build from already-normalized fields
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Field value by exact name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field names in column order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// (name, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume into the underlying field map
    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }
}

/// Coerce a textual NUMBER value into an integer or float.
///
/// Values that do not parse (locale formatting, out-of-range digits) are
/// returned as-is.
pub(crate) fn coerce_number(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    if let Ok(n) = text.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::Float(f);
    }
    value
}

/// Apply the null/empty-string normalization policy to one value
pub(crate) fn apply_null_policy(policy: NullHandling, value: Value) -> Value {
    match policy {
        NullHandling::Natural => value,
        NullHandling::NullToString => match value {
            Value::Null => Value::String(String::new()),
            other => other,
        },
        NullHandling::EmptyStringToNull => match value {
            Value::String(s) if s.is_empty() => Value::Null,
            other => other,
        },
    }
}

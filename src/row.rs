//! Row and value primitives shared by the bind and fetch paths
//!
//! A [`Value`] is what crosses the native boundary in both directions:
//! scalars on the way in and out, plus the opaque LOB / cursor / collection
//! handles the engine hands back or the adapter allocates during binding.

use std::fmt;
use std::sync::Arc;

use crate::native::{NativeCollection, NativeLob, NativeStatement};

/// A value bound to, or fetched from, the native engine
#[derive(Clone, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Character data (VARCHAR2, CHAR, loaded CLOB)
    String(String),
    /// Integer NUMBER
    Integer(i64),
    /// Floating point NUMBER
    Float(f64),
    /// Binary data (RAW, loaded BLOB)
    Bytes(Vec<u8>),
    /// Array-valued bind variable (engine-side PL/SQL table)
    Array(Vec<Value>),
    /// LOB descriptor handle
    Lob(Arc<dyn NativeLob>),
    /// Nested cursor handle (from a cursor-typed OUT bind)
    Cursor(Arc<dyn NativeStatement>),
    /// Collection object handle
    Collection(Arc<dyn NativeCollection>),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is an opaque native handle
    pub fn is_handle(&self) -> bool {
        matches!(self, Value::Lob(_) | Value::Cursor(_) | Value::Collection(_))
    }

    /// Try to get as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get as bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as a cursor handle
    pub fn as_cursor(&self) -> Option<&Arc<dyn NativeStatement>> {
        match self {
            Value::Cursor(c) => Some(c),
            _ => None,
        }
    }

    /// Render this value for the execute-failure bindings display:
    /// the type name for handles, `Array` for arrays, the string form
    /// otherwise
    pub fn describe(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
            Value::Array(_) => "Array".to_string(),
            Value::Lob(_) => "Lob".to_string(),
            Value::Cursor(_) => "Cursor".to_string(),
            Value::Collection(_) => "Collection".to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Bytes(b) => write!(f, "Bytes(<{} bytes>)", b.len()),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Lob(_) => write!(f, "Lob(<descriptor>)"),
            Value::Cursor(_) => write!(f, "Cursor(<handle>)"),
            Value::Collection(c) => write!(f, "Collection({})", c.type_name()),
        }
    }
}

/// Scalar variants compare by content; handles compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Lob(a), Value::Lob(b)) => Arc::ptr_eq(a, b),
            (Value::Cursor(a), Value::Cursor(b)) => Arc::ptr_eq(a, b),
            (Value::Collection(a), Value::Collection(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => write!(f, "<array of {}>", items.len()),
            Value::Lob(_) => write!(f, "<LOB descriptor>"),
            Value::Cursor(_) => write!(f, "<cursor>"),
            Value::Collection(c) => write!(f, "<collection {}>", c.type_name()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// One raw row as produced by a single native fetch call: field names in
/// stable native column order, plus the matching values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row from names and values; both lists must line up
    pub fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names in column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in column order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value by 0-based column position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value by field name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n.eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }

    /// Consume into (name, value) pairs in column order
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.names.into_iter().zip(self.values).collect()
    }
}

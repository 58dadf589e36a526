//! Store-agnostic documents, values and queries

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fields of a document, by name
pub type Fields = BTreeMap<String, Value>;

static NULL: Value = Value::Null;

/// Identifier of a document inside its collection, assigned by the store
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId {
    content: String,
}

impl DocumentId {
    /// Generate a random DocumentId, the way a store does when a document is created
    pub fn random() -> Self {
        let random = uuid::Uuid::new_v4().to_simple().to_string();
        Self { content: random }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl From<String> for DocumentId {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for DocumentId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// A field value, as stored in a document
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Rank of the value kind, used to order values of different kinds.
    /// Nulls come first.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Timestamp(_) => 3,
            Value::String(_) => 4,
        }
    }

    /// Compare two values of the same kind. Returns `None` for values of different kinds.
    ///
    /// This is what range filters use: `startDate >= <timestamp>` never matches a null `startDate`.
    pub fn compare_same_kind(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
            (Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            (Value::Timestamp(l), Value::Timestamp(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }

    /// Total order used to sort query results
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.compare_same_kind(other)
            .unwrap_or_else(|| self.kind_rank().cmp(&other.kind_rank()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Integer(i) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}
impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self { Value::Timestamp(t) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}


/// A document, as returned by a query
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: DocumentId,
    fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &DocumentId { &self.id }
    pub fn fields(&self) -> &Fields { &self.fields }

    /// Returns the value of a field. Absent fields read as `Value::Null`
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Whether the field is present, even with a null value
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}


/// Comparison operator of a [`Filter`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldOp {
    Equal,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

/// `field <op> value`
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FieldOp,
    pub value: Value,
}

impl Filter {
    pub fn new<S: ToString, V: Into<Value>>(field: S, op: FieldOp, value: V) -> Self {
        Self { field: field.to_string(), op, value: value.into() }
    }

    /// Whether a document satisfies this filter. Documents that lack the field never do.
    pub fn matches(&self, document: &Document) -> bool {
        if document.has(&self.field) == false {
            return false;
        }
        let ordering = match document.get(&self.field).compare_same_kind(&self.value) {
            None => return false,
            Some(o) => o,
        };
        match self.op {
            FieldOp::Equal => ordering == Ordering::Equal,
            FieldOp::LessThan => ordering == Ordering::Less,
            FieldOp::LessOrEqual => ordering != Ordering::Greater,
            FieldOp::GreaterThan => ordering == Ordering::Greater,
            FieldOp::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query over a collection: every filter must match (logical AND)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<S: ToString, V: Into<Value>>(mut self, field: S, op: FieldOp, value: V) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    pub fn order_by<S: ToString>(mut self, field: S, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), direction });
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }
}

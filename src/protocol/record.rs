//! Record definitions
//!
//! Parsed key/value groups and the shape of a parsed response line.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use super::escape::escape;
use super::Value;

/// One parsed key/value group from a response or event line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Insert a field, replacing (and returning) any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Re-encodes the record as one wire chunk (keys in sorted order)
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.fields {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match value.to_wire_text() {
                Some(text) => write!(f, "{}={}", escape(key), escape(&text))?,
                None => f.write_str(&escape(key))?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Parsed Response
// =============================================================================

/// A parsed response line
///
/// Either exactly one record or several; never a sequence of one.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Single(Record),
    Multiple(Vec<Record>),
}

impl Response {
    /// Shape a list of records, collapsing a list of one into `Single`
    ///
    /// An empty list becomes a single empty record.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        match records.len() {
            0 => Response::Single(Record::new()),
            1 => Response::Single(records.remove(0)),
            _ => Response::Multiple(records),
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            Response::Single(record) => std::slice::from_ref(record),
            Response::Multiple(records) => records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Response::Single(record) => vec![record],
            Response::Multiple(records) => records,
        }
    }

    pub fn first(&self) -> Option<&Record> {
        self.records().first()
    }

    pub fn into_first(self) -> Option<Record> {
        self.into_records().into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// True only for a single record with no fields
    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Single(record) if record.is_empty())
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Response::Multiple(_))
    }
}

impl From<Record> for Response {
    fn from(record: Record) -> Self {
        Response::Single(record)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records().iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

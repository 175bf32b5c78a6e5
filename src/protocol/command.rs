//! Command definitions
//!
//! An outgoing request: verb, flags, a primary option set and optional
//! batched option sets, plus the response and error lines received for it.

use std::fmt;

use crate::error::{QueryError, ResponseError, Result};

use super::codec;
use super::{Record, Response, TypeRegistry};

// =============================================================================
// Option Values
// =============================================================================

/// A single option value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// `NaN` floats are dropped from serialized option sets
    pub fn is_nan(&self) -> bool {
        matches!(self, Scalar::Float(f) if f.is_nan())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::Int(i64::from(v))
            }
        })*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::Str(v.to_string()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl From<&String> for Scalar {
    fn from(v: &String) -> Self {
        Scalar::Str(v.clone())
    }
}

/// Value of one option key
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Omitted when serializing
    Null,
    Scalar(Scalar),
    /// Emitted as one `key=value` pair per element
    List(Vec<Scalar>),
}

impl OptionValue {
    /// Whether this value is dropped on serialization
    pub fn is_omitted(&self) -> bool {
        match self {
            OptionValue::Null => true,
            OptionValue::Scalar(s) => s.is_nan(),
            OptionValue::List(_) => false,
        }
    }
}

macro_rules! option_from_scalar {
    ($($t:ty),*) => {
        $(impl From<$t> for OptionValue {
            fn from(v: $t) -> Self {
                OptionValue::Scalar(v.into())
            }
        })*
    };
}

option_from_scalar!(Scalar, i8, i16, i32, i64, u8, u16, u32, u64, f64, bool, &str, String, &String);

impl<T: Into<Scalar>> From<Option<T>> for OptionValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => OptionValue::Scalar(v.into()),
            None => OptionValue::Null,
        }
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for OptionValue {
    fn from(v: Vec<T>) -> Self {
        OptionValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Ordered set of options with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a key, keeping the position of an existing key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

// =============================================================================
// Command
// =============================================================================

/// A command to send to the server
#[derive(Debug, Clone, Default)]
pub struct Command {
    verb: String,
    flags: Vec<String>,
    options: OptionSet,
    multi_options: Vec<OptionSet>,
    response: Option<Response>,
    error: Option<Record>,
}

impl Command {
    /// Create a command for `verb`
    pub fn new(verb: impl AsRef<str>) -> Self {
        let mut command = Self::default();
        command.set_command(verb);
        command
    }

    /// Replace the verb (surrounding whitespace is trimmed)
    pub fn set_command(&mut self, verb: impl AsRef<str>) -> &mut Self {
        self.verb = verb.as_ref().trim().to_string();
        self
    }

    /// Append a flag such as `-uid`
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Replace all flags
    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Set one option on the primary option set
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Replace the primary option set
    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    /// Replace the batched option sets
    pub fn multi_options(mut self, sets: Vec<OptionSet>) -> Self {
        self.multi_options = sets;
        self
    }

    /// Clear the received response and error
    pub fn reset(&mut self) -> &mut Self {
        self.response = None;
        self.error = None;
        self
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn get_flags(&self) -> &[String] {
        &self.flags
    }

    pub fn get_options(&self) -> &OptionSet {
        &self.options
    }

    pub fn get_multi_options(&self) -> &[OptionSet] {
        &self.multi_options
    }

    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// True when either the primary or a batched option set is present
    pub fn has_options(&self) -> bool {
        !self.options.is_empty() || self.has_multi_options()
    }

    pub fn has_multi_options(&self) -> bool {
        !self.multi_options.is_empty()
    }

    /// Serialize to a wire line (without the trailing newline)
    pub fn build(&self) -> String {
        let line = codec::build_line(self);
        tracing::trace!(command = %line, "built command");
        line
    }

    // -------------------------------------------------------------------------
    // Response handling
    // -------------------------------------------------------------------------

    /// Store the parsed data line received for this command
    pub fn set_response(&mut self, line: &str, registry: &TypeRegistry) -> &mut Self {
        self.response = Some(codec::parse_with(line, registry));
        self
    }

    /// Store the parsed `error` line received for this command
    ///
    /// A leading `error` verb is accepted and ignored.
    pub fn set_error(&mut self, line: &str, registry: &TypeRegistry) -> &mut Self {
        let body = strip_verb(line, "error");
        let record = codec::parse_with(body, registry).into_first().unwrap_or_default();
        self.error = Some(record);
        self
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// The raw error record, if one has been received
    pub fn error(&self) -> Option<&Record> {
        self.error.as_ref()
    }

    /// The received error line interpreted as a [`ResponseError`]
    pub fn get_error(&self) -> Option<ResponseError> {
        self.error.as_ref().map(ResponseError::from_record)
    }

    /// True when an error line was received and its id is above 0
    pub fn has_error(&self) -> bool {
        self.get_error().is_some_and(|e| e.is_failure())
    }

    /// Surface a failing error line as [`QueryError::Response`]
    pub fn check(&self) -> Result<Option<&Response>> {
        match self.get_error() {
            Some(err) if err.is_failure() => {
                tracing::warn!(verb = %self.verb, id = err.id, msg = %err.msg, "command failed");
                Err(QueryError::Response(err))
            }
            _ => Ok(self.response.as_ref()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

fn strip_verb<'a>(line: &'a str, verb: &str) -> &'a str {
    match line.split_once(' ') {
        Some((head, rest)) if head == verb => rest,
        None if line == verb => "",
        _ => line,
    }
}

//! Value Coercer
//!
//! Typed field values and the field-name → type registry that drives
//! coercion of raw (already unescaped) wire values.
//!
//! Coercion never fails: text that does not fit the registered type
//! degrades to `NaN` for numbers instead of rejecting the record.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::QueryError;

/// A typed field value produced by parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text (default for unregistered fields)
    String(String),

    /// Numeric field; `NaN` when the wire text was not a number
    Number(f64),

    /// Comma separated numbers
    NumberList(Vec<f64>),

    /// Comma separated strings
    StringList(Vec<String>),

    /// Boolean field (non-empty text is true)
    Bool(bool),

    /// Bare flag with no `=value`
    Unset,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value
    ///
    /// Strings are parsed as well, so ids still compare when a registry
    /// leaves a numeric field untyped.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integral, non-negative numeric view of the value
    pub fn as_u64(&self) -> Option<u64> {
        let n = self.as_f64()?;
        if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
            Some(n as u64)
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number_list(&self) -> Option<&[f64]> {
        match self {
            Value::NumberList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Value::StringList(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    /// Render the value back to its unescaped wire text
    ///
    /// Returns `None` for [`Value::Unset`].
    pub fn to_wire_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::NumberList(list) => Some(
                list.iter()
                    .map(f64::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::StringList(list) => Some(list.join(",")),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Unset => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => f.write_str("<unset>"),
            Value::Bool(b) => write!(f, "{b}"),
            other => f.write_str(&other.to_wire_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// =============================================================================
// Type Registry
// =============================================================================

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    String,
    Integer,
    IntegerList,
    StringList,
    Boolean,
}

impl ValueType {
    /// Coerce an unescaped raw value to this type
    pub fn coerce(self, raw: &str) -> Value {
        match self {
            ValueType::IntegerList => Value::NumberList(raw.split(',').map(parse_number).collect()),
            ValueType::StringList => {
                Value::StringList(raw.split(',').map(str::to_string).collect())
            }
            ValueType::Boolean => Value::Bool(!raw.is_empty()),
            ValueType::Integer => Value::Number(parse_number(raw)),
            ValueType::String => Value::String(raw.to_string()),
        }
    }
}

impl FromStr for ValueType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(ValueType::String),
            "int" | "integer" | "number" => Ok(ValueType::Integer),
            "int[]" | "integers" | "arrayofint" => Ok(ValueType::IntegerList),
            "string[]" | "strings" | "arrayofstring" => Ok(ValueType::StringList),
            "bool" | "boolean" => Ok(ValueType::Boolean),
            other => Err(QueryError::Config(format!("unknown type tag `{other}`"))),
        }
    }
}

/// Parse the longest numeric prefix of `raw`
///
/// Leading whitespace is skipped and trailing garbage ignored, so `"12abc"`
/// is 12. Text without a leading decimal number (including `inf`/`NaN`
/// spellings) becomes `NaN`; only `Infinity` is accepted as a literal.
fn parse_number(raw: &str) -> f64 {
    let text = raw.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let integer_digits = count_digits(&bytes[end..]);
    end += integer_digits;
    let mut mantissa_digits = integer_digits;
    if bytes.get(end) == Some(&b'.') {
        let fraction_digits = count_digits(&bytes[end + 1..]);
        mantissa_digits += fraction_digits;
        end += 1 + fraction_digits;
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = count_digits(&bytes[exponent..]);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Mapping from field name to [`ValueType`]
///
/// Unknown field names are treated as strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    types: HashMap<String, ValueType>,
}

impl TypeRegistry {
    /// Create an empty registry (every field is a string)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the common ServerQuery fields
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for key in BUILTIN_INTEGERS {
            registry.insert(*key, ValueType::Integer);
        }
        for key in BUILTIN_INTEGER_LISTS {
            registry.insert(*key, ValueType::IntegerList);
        }
        for key in BUILTIN_BOOLEANS {
            registry.insert(*key, ValueType::Boolean);
        }
        registry
    }

    /// Shared instance of [`TypeRegistry::builtin`]
    pub fn shared() -> &'static TypeRegistry {
        static SHARED: OnceLock<TypeRegistry> = OnceLock::new();
        SHARED.get_or_init(TypeRegistry::builtin)
    }

    /// Register (or replace) the type of a field
    pub fn insert(&mut self, field: impl Into<String>, ty: ValueType) -> Option<ValueType> {
        self.types.insert(field.into(), ty)
    }

    /// Builder-style [`TypeRegistry::insert`]
    pub fn with(mut self, field: impl Into<String>, ty: ValueType) -> Self {
        self.insert(field, ty);
        self
    }

    pub fn lookup(&self, field: &str) -> ValueType {
        self.types.get(field).copied().unwrap_or_default()
    }

    /// Coerce a raw, already unescaped value for `field`
    pub fn coerce(&self, field: &str, raw: &str) -> Value {
        self.lookup(field).coerce(raw)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

const BUILTIN_INTEGERS: &[&str] = &[
    // error lines
    "id",
    "failed_permid",
    // notifications
    "reasonid",
    "targetmode",
    "target",
    "invokerid",
    "ctid",
    "cfid",
    "schandlerid",
    // clients
    "clid",
    "cid",
    "cldbid",
    "client_database_id",
    "client_type",
    "client_away",
    "client_flag_talking",
    "client_input_muted",
    "client_output_muted",
    "client_input_hardware",
    "client_output_hardware",
    "client_talk_power",
    "client_is_talker",
    "client_is_priority_speaker",
    "client_is_recording",
    "client_is_channel_commander",
    "client_channel_group_id",
    "client_channel_group_inherited_channel_id",
    "client_idle_time",
    "client_created",
    "client_lastconnected",
    "client_icon_id",
    "client_totalconnections",
    // channels
    "pid",
    "channel_order",
    "channel_maxclients",
    "channel_needed_subscribe_power",
    "total_clients",
    // virtual servers
    "sid",
    "virtualserver_id",
    "virtualserver_port",
    "virtualserver_clientsonline",
    "virtualserver_queryclientsonline",
    "virtualserver_maxclients",
    "virtualserver_uptime",
    // groups and permissions
    "sgid",
    "cgid",
    "permid",
    "permvalue",
    "permnegated",
    "permskip",
    // bans and transfers
    "banid",
    "time",
    "port",
    "size",
];

const BUILTIN_INTEGER_LISTS: &[&str] = &["client_servergroups"];

const BUILTIN_BOOLEANS: &[&str] = &["virtualserver_autostart"];

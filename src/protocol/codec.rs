//! Protocol codec
//!
//! Parsing of response/event lines and serialization of commands.
//!
//! ## Wire Format
//!
//! ### Command Line
//! ```text
//! <verb> [flag ...] [key=value ...] [key=value ...|key=value ...]
//! ```
//!
//! ### Response Line
//! ```text
//! key=value key=value|key=value key=value
//! └─────── record ──┘ └─────── record ──┘
//! ```
//!
//! Reserved characters inside keys and values are escaped (see
//! [`escape`](super::escape)).
//!
//! `|` separates both the values of a list option (`key=a|key=b`) and
//! batched option sets. The two are indistinguishable on the wire; a
//! response that carries such a list comes back as several records.

use super::command::{Command, OptionSet, OptionValue};
use super::escape::{escape, unescape};
use super::{Record, Response, TypeRegistry, Value};

/// Separator between records and between batched option sets
pub const RECORD_SEPARATOR: char = '|';

/// Separator between tokens inside one record
pub const TOKEN_SEPARATOR: char = ' ';

// =============================================================================
// Parsing
// =============================================================================

/// Parse a line using the shared builtin type registry
pub fn parse(line: &str) -> Response {
    parse_with(line, TypeRegistry::shared())
}

/// Parse a line into one record or an ordered sequence of records
///
/// Never fails: tokens without `=` become bare flags and values that do not
/// fit their registered type degrade (see [`TypeRegistry::coerce`]).
pub fn parse_with(line: &str, registry: &TypeRegistry) -> Response {
    let records: Vec<Record> = line
        .split(RECORD_SEPARATOR)
        .map(|chunk| parse_record(chunk, registry))
        .collect();
    tracing::trace!(records = records.len(), "parsed line");
    Response::from_records(records)
}

/// Parse a single chunk (no record separators) into a record
///
/// Later duplicate keys overwrite earlier ones. Empty tokens, produced by
/// repeated spaces or an empty line, are skipped: an empty chunk gives an
/// empty record, never one holding a bare `""` key.
pub fn parse_record(chunk: &str, registry: &TypeRegistry) -> Record {
    let mut record = Record::new();
    for token in chunk.split(TOKEN_SEPARATOR).filter(|t| !t.is_empty()) {
        match token.split_once('=') {
            Some((raw_key, raw_value)) => {
                let key = unescape(raw_key);
                let value = registry.coerce(&key, &unescape(raw_value));
                record.insert(key, value);
            }
            None => {
                record.insert(unescape(token), Value::Unset);
            }
        }
    }
    record
}

// =============================================================================
// Building
// =============================================================================

/// Serialize a command to its wire line
///
/// The primary option set is separated from the batched block by a space, so
/// its options apply to every batch entry.
pub(crate) fn build_line(command: &Command) -> String {
    let mut line = escape(command.verb());

    if command.has_flags() {
        line.push(TOKEN_SEPARATOR);
        line.push_str(&build_flags(command.get_flags()));
    }

    let primary = build_option_set(command.get_options());
    if !primary.is_empty() {
        line.push(TOKEN_SEPARATOR);
        line.push_str(&primary);
    }

    let batches: Vec<String> = command
        .get_multi_options()
        .iter()
        .map(build_option_set)
        .filter(|s| !s.is_empty())
        .collect();
    if !batches.is_empty() {
        line.push(TOKEN_SEPARATOR);
        line.push_str(&batches.join("|"));
    }

    line
}

/// Escape flags and join them with single spaces
pub fn build_flags(flags: &[String]) -> String {
    flags
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serialize one option set
///
/// Null values and `NaN` numbers are dropped. A list value becomes one
/// `key=value` pair per element joined by `|`.
pub fn build_option_set(options: &OptionSet) -> String {
    options
        .iter()
        .filter(|(_, value)| !value.is_omitted())
        .map(|(key, value)| escape_key_value(key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_key_value(key: &str, value: &OptionValue) -> String {
    let key = escape(key);
    match value {
        OptionValue::List(items) => items
            .iter()
            .map(|item| format!("{}={}", key, escape(&item.to_string())))
            .collect::<Vec<_>>()
            .join("|"),
        OptionValue::Scalar(item) => format!("{}={}", key, escape(&item.to_string())),
        OptionValue::Null => String::new(),
    }
}

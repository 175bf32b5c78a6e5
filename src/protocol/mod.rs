//! Protocol Module
//!
//! Defines the line-oriented key/value wire protocol.
//!
//! ## Flow
//! ```text
//!  Command ──build()──▶ "verb -flag key=value|key=value"  ──▶ transport
//!                                                               │
//!  Response ◀──parse()── "key=value key=value|key=value" ◀───────┘
//! ```
//!
//! ### Components
//! - `escape`  - reserved character escaping
//! - `value`   - typed values and the field type registry
//! - `record`  - parsed records and response shapes
//! - `command` - outgoing commands and option sets
//! - `codec`   - line parsing and command serialization

pub mod escape;
mod value;
mod record;
mod command;
mod codec;

pub use escape::{escape, unescape};
pub use value::{TypeRegistry, Value, ValueType};
pub use record::{Record, Response};
pub use command::{Command, OptionSet, OptionValue, Scalar};
pub use codec::{
    build_flags, build_option_set, parse, parse_record, parse_with, RECORD_SEPARATOR,
    TOKEN_SEPARATOR,
};

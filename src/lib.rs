//! # tsquery
//!
//! Client-side core for a line-oriented key/value server query protocol:
//! - Escaping of protocol-reserved characters
//! - Typed coercion of field values through a field type registry
//! - Command serialization and response/error line parsing
//! - Entities that cache server properties and re-publish events
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           Transport (external: socket, queueing)            │
//! └───────────┬──────────────────────────────────┬──────────────┘
//!             │ response / error lines           │ notify lines
//! ┌───────────▼───────────┐          ┌───────────▼──────────────┐
//! │     Command Codec     │          │         EventHub         │
//! │ (escape, parse, build)│          │  (synchronous fan-out)   │
//! └───────────▲───────────┘          └───────────┬──────────────┘
//!             │                                  │ filtered by identity
//!             │ Parent::execute      ┌───────────▼──────────────┐
//!             └──────────────────────┤         Entities         │
//!                                    │ (Client, VirtualServer)  │
//!                                    └──────────────────────────┘
//! ```
//!
//! The transport itself is not part of this crate; it is plugged in through
//! the [`entity::Parent`] trait.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod event;
pub mod entity;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QueryError, ResponseError, Result};
pub use config::Config;
pub use protocol::{Command, Record, Response, TypeRegistry, Value, ValueType};
pub use event::{EventHub, EventKind, ServerEvent};
pub use entity::{Client, Parent, VirtualServer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tsquery
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

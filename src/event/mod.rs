//! Event Module
//!
//! Protocol-level events decoded from unsolicited notification lines, and the
//! shared [`EventHub`] entities subscribe to.
//!
//! ## Notification Line
//! ```text
//! notifyclientmoved ctid=5 reasonid=0 clid=7|clid=8
//! └──── name ─────┘ └──── shared ───────────┘ └─ batched ─┘
//! ```
//! Batched records inherit the fields of the first record they do not set
//! themselves, so the line above yields two `ClientMoved` events.

mod hub;

pub use hub::{EventHub, Handler, SubscriptionId};

use std::fmt;

use crate::protocol::{parse_with, Record, TypeRegistry};

/// Prefix every notification verb carries
pub const NOTIFY_PREFIX: &str = "notify";

/// Kind of a [`ServerEvent`], used to route subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ClientConnect,
    ClientDisconnect,
    ClientMoved,
    TextMessage,
    ServerEdit,
    ChannelEdit,
    Other,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ClientConnect => "clientconnect",
            EventKind::ClientDisconnect => "clientdisconnect",
            EventKind::ClientMoved => "clientmoved",
            EventKind::TextMessage => "textmessage",
            EventKind::ServerEdit => "serveredit",
            EventKind::ChannelEdit => "channeledit",
            EventKind::Other => "other",
        }
    }

    /// Map a notification name (without the `notify` prefix)
    pub fn from_notification(name: &str) -> Self {
        match name {
            "cliententerview" => EventKind::ClientConnect,
            "clientleftview" => EventKind::ClientDisconnect,
            "clientmoved" => EventKind::ClientMoved,
            "textmessage" => EventKind::TextMessage,
            "serveredited" => EventKind::ServerEdit,
            "channeledited" => EventKind::ChannelEdit,
            _ => EventKind::Other,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event reported by the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A client came into view
    ClientConnect {
        clid: u64,
        channel_id: Option<u64>,
        record: Record,
    },

    /// A client left the server
    ClientDisconnect {
        clid: u64,
        from_channel: Option<u64>,
        reason_id: Option<u64>,
        reason_msg: String,
    },

    /// A client switched channels
    ClientMoved {
        clid: u64,
        channel_id: u64,
        reason_id: Option<u64>,
        invoker_id: Option<u64>,
    },

    /// A text message was received
    TextMessage {
        invoker_id: u64,
        invoker_name: String,
        invoker_uid: String,
        target_mode: u64,
        msg: String,
    },

    /// Virtual server properties changed
    ServerEdit {
        invoker_id: Option<u64>,
        changes: Record,
    },

    /// Channel properties changed
    ChannelEdit {
        channel_id: u64,
        invoker_id: Option<u64>,
        changes: Record,
    },

    /// Any notification without a dedicated variant, or one missing the
    /// fields its variant requires
    Other { name: String, record: Record },
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::ClientConnect { .. } => EventKind::ClientConnect,
            ServerEvent::ClientDisconnect { .. } => EventKind::ClientDisconnect,
            ServerEvent::ClientMoved { .. } => EventKind::ClientMoved,
            ServerEvent::TextMessage { .. } => EventKind::TextMessage,
            ServerEvent::ServerEdit { .. } => EventKind::ServerEdit,
            ServerEvent::ChannelEdit { .. } => EventKind::ChannelEdit,
            ServerEvent::Other { .. } => EventKind::Other,
        }
    }

    /// The client this event is about, when it names one
    ///
    /// For text messages this is the sender.
    pub fn client_id(&self) -> Option<u64> {
        match self {
            ServerEvent::ClientConnect { clid, .. }
            | ServerEvent::ClientDisconnect { clid, .. }
            | ServerEvent::ClientMoved { clid, .. } => Some(*clid),
            ServerEvent::TextMessage { invoker_id, .. } => Some(*invoker_id),
            _ => None,
        }
    }

    /// Decode a notification line into events
    ///
    /// Lines that are not notifications yield nothing.
    pub fn decode(line: &str, registry: &TypeRegistry) -> Vec<ServerEvent> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (verb, body) = line.split_once(' ').unwrap_or((line, ""));
        let Some(name) = verb.strip_prefix(NOTIFY_PREFIX) else {
            return Vec::new();
        };

        let mut records = parse_with(body, registry).into_records().into_iter();
        let Some(shared) = records.next() else {
            return Vec::new();
        };

        let mut events = vec![Self::from_record(name, shared.clone())];
        for batched in records {
            let mut merged = shared.clone();
            for (key, value) in batched {
                merged.insert(key, value);
            }
            events.push(Self::from_record(name, merged));
        }
        events
    }

    /// Build an event from a notification name and its record
    pub fn from_record(name: &str, record: Record) -> ServerEvent {
        let decoded = match EventKind::from_notification(name) {
            EventKind::ClientConnect => record.get_u64("clid").map(|clid| ServerEvent::ClientConnect {
                clid,
                channel_id: record.get_u64("ctid"),
                record: record.clone(),
            }),
            EventKind::ClientDisconnect => {
                record
                    .get_u64("clid")
                    .map(|clid| ServerEvent::ClientDisconnect {
                        clid,
                        from_channel: record.get_u64("cfid"),
                        reason_id: record.get_u64("reasonid"),
                        reason_msg: text(&record, "reasonmsg"),
                    })
            }
            EventKind::ClientMoved => match (record.get_u64("clid"), record.get_u64("ctid")) {
                (Some(clid), Some(channel_id)) => Some(ServerEvent::ClientMoved {
                    clid,
                    channel_id,
                    reason_id: record.get_u64("reasonid"),
                    invoker_id: record.get_u64("invokerid"),
                }),
                _ => None,
            },
            EventKind::TextMessage => {
                record
                    .get_u64("invokerid")
                    .map(|invoker_id| ServerEvent::TextMessage {
                        invoker_id,
                        invoker_name: text(&record, "invokername"),
                        invoker_uid: text(&record, "invokeruid"),
                        target_mode: record.get_u64("targetmode").unwrap_or(0),
                        msg: text(&record, "msg"),
                    })
            }
            EventKind::ServerEdit => Some(ServerEvent::ServerEdit {
                invoker_id: record.get_u64("invokerid"),
                changes: record.clone(),
            }),
            EventKind::ChannelEdit => record.get_u64("cid").map(|channel_id| ServerEvent::ChannelEdit {
                channel_id,
                invoker_id: record.get_u64("invokerid"),
                changes: record.clone(),
            }),
            EventKind::Other => None,
        };

        decoded.unwrap_or_else(|| ServerEvent::Other {
            name: name.to_string(),
            record,
        })
    }
}

fn text(record: &Record, key: &str) -> String {
    record
        .get(key)
        .and_then(|v| v.to_wire_text())
        .unwrap_or_default()
}

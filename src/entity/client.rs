//! Client entity
//!
//! A client connected to the selected virtual server, built from a
//! `clientlist` record.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{QueryError, Result};
use crate::event::{EventKind, ServerEvent};
use crate::protocol::{Command, Record, Response, Value};

use super::{Binding, Entity, EntityKind, Parent};

/// Flags `clientlist` is issued with on refresh
pub const CLIENT_LIST_FLAGS: &[&str] = &[
    "-uid", "-away", "-voice", "-times", "-groups", "-info", "-icon", "-country", "-ip",
];

/// `reasonid` for a channel kick
const KICK_FROM_CHANNEL: u32 = 4;

/// `reasonid` for a server kick
const KICK_FROM_SERVER: u32 = 5;

/// `targetmode` for a private text message
const TARGET_CLIENT: u32 = 1;

/// Characters left alone by the chat link encoding
const LINK_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A connected client
pub type Client<P> = Entity<ClientKind, P>;

/// Marker type describing clients
pub struct ClientKind;

/// Fields naming a client for its whole session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    /// Session-scoped client id
    pub clid: u64,

    /// Unique identifier; only present when listed with `-uid`
    pub uid: Option<String>,

    /// Database id; absent when the listing did not carry it
    pub dbid: Option<u64>,

    /// 0 for a regular client, 1 for a query client
    pub client_type: u64,
}

/// Events a client re-emits
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Moved into another channel
    Moved { channel_id: u64 },

    /// Sent a text message
    Message { text: String },

    /// Left the server; the client is destroyed right after
    Disconnected {
        reason_id: Option<u64>,
        reason_msg: String,
    },
}

/// Permission named by id or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRef {
    Id(u64),
    Name(String),
}

impl PermissionRef {
    fn apply(&self, command: Command) -> Command {
        match self {
            PermissionRef::Id(id) => command.option("permid", *id),
            PermissionRef::Name(name) => command.option("permsid", name),
        }
    }
}

impl From<u64> for PermissionRef {
    fn from(id: u64) -> Self {
        PermissionRef::Id(id)
    }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self {
        PermissionRef::Name(name.to_string())
    }
}

fn is_same_client(identity: &ClientIdentity, event: &ServerEvent) -> bool {
    event.client_id() == Some(identity.clid)
}

impl EntityKind for ClientKind {
    const NAME: &'static str = "client";
    const PREFIX: &'static str = "client";

    type Identity = ClientIdentity;
    type Event = ClientEvent;

    fn identity_fields() -> &'static [&'static str] {
        &[
            "clid",
            "client_unique_identifier",
            "client_database_id",
            "client_type",
        ]
    }

    fn identity(record: &Record) -> Result<ClientIdentity> {
        let clid = record.get_u64("clid").ok_or(QueryError::MissingIdentity {
            entity: Self::NAME,
            field: "clid",
        })?;
        Ok(ClientIdentity {
            clid,
            uid: record
                .get("client_unique_identifier")
                .and_then(Value::to_wire_text),
            dbid: record.get_u64("client_database_id"),
            client_type: record.get_u64("client_type").unwrap_or(0),
        })
    }

    fn bindings() -> Vec<Binding<ClientIdentity, ClientEvent>> {
        vec![
            Binding {
                kind: EventKind::ClientMoved,
                matches: is_same_client,
                project: |event| match event {
                    ServerEvent::ClientMoved { channel_id, .. } => Some(ClientEvent::Moved {
                        channel_id: *channel_id,
                    }),
                    _ => None,
                },
                terminal: false,
            },
            Binding {
                kind: EventKind::TextMessage,
                matches: is_same_client,
                project: |event| match event {
                    ServerEvent::TextMessage { msg, .. } => {
                        Some(ClientEvent::Message { text: msg.clone() })
                    }
                    _ => None,
                },
                terminal: false,
            },
            Binding {
                kind: EventKind::ClientDisconnect,
                matches: is_same_client,
                project: |event| match event {
                    ServerEvent::ClientDisconnect {
                        reason_id,
                        reason_msg,
                        ..
                    } => Some(ClientEvent::Disconnected {
                        reason_id: *reason_id,
                        reason_msg: reason_msg.clone(),
                    }),
                    _ => None,
                },
                terminal: true,
            },
        ]
    }

    fn refresh_command(_identity: &ClientIdentity) -> Command {
        Command::new("clientlist").flags(CLIENT_LIST_FLAGS.iter().copied())
    }

    fn matches_record(identity: &ClientIdentity, record: &Record) -> bool {
        record.get_u64("clid") == Some(identity.clid)
    }
}

impl<P: Parent> Entity<ClientKind, P> {
    // -------------------------------------------------------------------------
    // Identity and cached properties
    // -------------------------------------------------------------------------

    pub fn clid(&self) -> u64 {
        self.identity().clid
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity().uid.as_deref()
    }

    pub fn database_id(&self) -> Option<u64> {
        self.identity().dbid
    }

    /// Database id for commands addressed by `cldbid`
    fn require_database_id(&self) -> Result<u64> {
        self.database_id().ok_or(QueryError::MissingIdentity {
            entity: ClientKind::NAME,
            field: "client_database_id",
        })
    }

    /// Whether this is a ServerQuery client
    pub fn is_query(&self) -> bool {
        self.identity().client_type == 1
    }

    pub fn nickname(&self) -> Option<String> {
        self.property("nickname").and_then(|v| v.to_wire_text())
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.property("cid").and_then(|v| v.as_u64())
    }

    pub fn servergroups(&self) -> Vec<u64> {
        match self.property("servergroups") {
            Some(Value::NumberList(ids)) => ids
                .into_iter()
                .filter_map(|id| Value::Number(id).as_u64())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// BBCode link to the client for use in chat messages
    pub fn url(&self) -> String {
        let nickname = self.nickname().unwrap_or_default();
        format!(
            "[URL=client://{}/{}~{}]{}[/URL]",
            self.clid(),
            self.uid().unwrap_or_default(),
            utf8_percent_encode(&nickname, LINK_SAFE),
            nickname
        )
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Live client information (requires the client to be online)
    pub fn info(&self) -> Result<Record> {
        self.execute_first(Command::new("clientinfo").option("clid", self.clid()))
    }

    pub fn db_info(&self) -> Result<Record> {
        let cldbid = self.require_database_id()?;
        self.execute_first(Command::new("clientdbinfo").option("cldbid", cldbid))
    }

    pub fn custom_info(&self) -> Result<Response> {
        let cldbid = self.require_database_id()?;
        self.execute(Command::new("custominfo").option("cldbid", cldbid))
    }

    pub fn custom_delete(&self, ident: &str) -> Result<Response> {
        self.execute(
            Command::new("customdelete")
                .option("cldbid", self.require_database_id()?)
                .option("ident", ident),
        )
    }

    pub fn custom_set(&self, ident: &str, value: &str) -> Result<Response> {
        self.execute(
            Command::new("customset")
                .option("cldbid", self.require_database_id()?)
                .option("ident", ident)
                .option("value", value),
        )
    }

    /// Permissions assigned directly to the client's database entry
    pub fn perm_list(&self, permsid: bool) -> Result<Response> {
        let cldbid = self.require_database_id()?;
        let mut command = Command::new("clientpermlist").option("cldbid", cldbid);
        if permsid {
            command = command.flag("-permsid");
        }
        self.execute(command)
    }

    /// Name of the avatar file in the server's file storage
    pub fn avatar_name(&self) -> Result<String> {
        let info = self.db_info()?;
        let hash = info
            .get("client_base64HashClientUID")
            .and_then(Value::to_wire_text)
            .unwrap_or_default();
        Ok(format!("avatar_{hash}"))
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    pub fn kick_from_server(&self, msg: &str) -> Result<Response> {
        self.kick(KICK_FROM_SERVER, msg)
    }

    pub fn kick_from_channel(&self, msg: &str) -> Result<Response> {
        self.kick(KICK_FROM_CHANNEL, msg)
    }

    fn kick(&self, reason_id: u32, msg: &str) -> Result<Response> {
        self.execute(
            Command::new("clientkick")
                .option("clid", self.clid())
                .option("reasonid", reason_id)
                .option("reasonmsg", msg),
        )
    }

    /// Ban the client; `time` in seconds, `None` bans permanently
    ///
    /// Bans by unique id when it is known, by client id otherwise.
    pub fn ban(&self, reason: &str, time: Option<u64>) -> Result<Response> {
        let command = match self.uid() {
            Some(uid) => Command::new("banadd").option("uid", uid),
            None => Command::new("banclient").option("clid", self.clid()),
        };
        self.execute(command.option("time", time).option("banreason", reason))
    }

    pub fn move_to(&self, channel_id: u64, password: Option<&str>) -> Result<Response> {
        self.execute(
            Command::new("clientmove")
                .option("clid", self.clid())
                .option("cid", channel_id)
                .option("cpw", password),
        )
    }

    pub fn server_group_add(&self, sgid: u64) -> Result<Response> {
        self.execute(
            Command::new("servergroupaddclient")
                .option("sgid", sgid)
                .option("cldbid", self.require_database_id()?),
        )
    }

    pub fn server_group_del(&self, sgid: u64) -> Result<Response> {
        self.execute(
            Command::new("servergroupdelclient")
                .option("sgid", sgid)
                .option("cldbid", self.require_database_id()?),
        )
    }

    pub fn poke(&self, msg: &str) -> Result<Response> {
        self.execute(
            Command::new("clientpoke")
                .option("clid", self.clid())
                .option("msg", msg),
        )
    }

    /// Send a private text message
    pub fn message(&self, msg: &str) -> Result<Response> {
        self.execute(
            Command::new("sendtextmessage")
                .option("targetmode", TARGET_CLIENT)
                .option("target", self.clid())
                .option("msg", msg),
        )
    }

    pub fn add_perm(
        &self,
        perm: impl Into<PermissionRef>,
        value: i64,
        skip: bool,
        negate: bool,
    ) -> Result<Response> {
        let cldbid = self.require_database_id()?;
        let command = Command::new("clientaddperm").option("cldbid", cldbid);
        self.execute(
            perm.into()
                .apply(command)
                .option("permvalue", value)
                .option("permskip", u8::from(skip))
                .option("permnegated", u8::from(negate)),
        )
    }

    pub fn del_perm(&self, perm: impl Into<PermissionRef>) -> Result<Response> {
        let cldbid = self.require_database_id()?;
        let command = Command::new("clientdelperm").option("cldbid", cldbid);
        self.execute(perm.into().apply(command))
    }
}

//! Virtual server entity, built from a `serverlist` record.

use crate::error::{QueryError, Result};
use crate::protocol::{Command, Record, Response};

use super::{Binding, Entity, EntityKind, Parent};

/// A virtual server on the instance
pub type VirtualServer<P> = Entity<VirtualServerKind, P>;

/// Marker type describing virtual servers
pub struct VirtualServerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualServerIdentity {
    pub sid: u64,
}

/// Virtual servers do not re-emit any events
#[derive(Debug, Clone, PartialEq)]
pub enum VirtualServerEvent {}

impl EntityKind for VirtualServerKind {
    const NAME: &'static str = "virtualserver";
    const PREFIX: &'static str = "virtualserver";

    type Identity = VirtualServerIdentity;
    type Event = VirtualServerEvent;

    fn identity_fields() -> &'static [&'static str] {
        &["virtualserver_id"]
    }

    fn identity(record: &Record) -> Result<VirtualServerIdentity> {
        record
            .get_u64("virtualserver_id")
            .map(|sid| VirtualServerIdentity { sid })
            .ok_or(QueryError::MissingIdentity {
                entity: Self::NAME,
                field: "virtualserver_id",
            })
    }

    fn bindings() -> Vec<Binding<VirtualServerIdentity, VirtualServerEvent>> {
        Vec::new()
    }

    fn refresh_command(_identity: &VirtualServerIdentity) -> Command {
        Command::new("serverlist")
    }

    fn matches_record(identity: &VirtualServerIdentity, record: &Record) -> bool {
        record.get_u64("virtualserver_id") == Some(identity.sid)
    }
}

impl<P: Parent> Entity<VirtualServerKind, P> {
    pub fn id(&self) -> u64 {
        self.identity().sid
    }

    pub fn name(&self) -> Option<String> {
        self.property("name").and_then(|v| v.to_wire_text())
    }

    pub fn port(&self) -> Option<u64> {
        self.property("port").and_then(|v| v.as_u64())
    }

    /// Reported status, e.g. `online` or `offline`
    pub fn status(&self) -> Option<String> {
        self.property("status").and_then(|v| v.to_wire_text())
    }

    pub fn clients_online(&self) -> Option<u64> {
        self.property("clientsonline").and_then(|v| v.as_u64())
    }

    pub fn autostart(&self) -> bool {
        self.property("autostart")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Cached server properties (no round trip)
    pub fn info(&self) -> Record {
        self.properties()
    }

    /// Select this virtual server for subsequent commands
    pub fn select(&self, nickname: Option<&str>) -> Result<Response> {
        self.execute(
            Command::new("use")
                .option("sid", self.id())
                .option("client_nickname", nickname),
        )
    }

    pub fn delete(&self) -> Result<Response> {
        self.execute(Command::new("serverdelete").option("sid", self.id()))
    }

    pub fn start(&self) -> Result<Response> {
        self.execute(Command::new("serverstart").option("sid", self.id()))
    }

    /// Stop the server, optionally telling connected clients why
    pub fn stop(&self, reason: Option<&str>) -> Result<Response> {
        self.execute(
            Command::new("serverstop")
                .option("sid", self.id())
                .option("reasonmsg", reason),
        )
    }
}

impl From<u64> for VirtualServerIdentity {
    fn from(sid: u64) -> Self {
        Self { sid }
    }
}

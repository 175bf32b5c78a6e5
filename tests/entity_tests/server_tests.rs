//! Virtual Server Entity Tests

use std::sync::Arc;

use tsquery::entity::{Parent, VirtualServer};
use tsquery::protocol::parse;

use crate::support::{FakeParent, OK};

const SERVER_LINE: &str = "virtualserver_id=1 virtualserver_port=9987 virtualserver_status=online \
virtualserver_clientsonline=3 virtualserver_name=My\\sServer virtualserver_autostart=1";

fn server(parent: &Arc<FakeParent>) -> VirtualServer<FakeParent> {
    VirtualServer::new(parent, parse(SERVER_LINE).into_first().unwrap()).unwrap()
}

#[test]
fn test_server_identity_and_properties() {
    let parent = FakeParent::new();
    let server = server(&parent);

    assert_eq!(server.id(), 1);
    assert_eq!(server.port(), Some(9987));
    assert_eq!(server.status().as_deref(), Some("online"));
    assert_eq!(server.clients_online(), Some(3));
    assert_eq!(server.name().as_deref(), Some("My Server"));
    assert!(server.autostart());
    assert!(!server.info().contains_key("id"));
}

#[test]
fn test_server_registers_no_subscriptions() {
    let parent = FakeParent::new();
    let server = server(&parent);
    assert_eq!(server.subscription_count(), 0);
    assert_eq!(parent.events().subscription_count(), 0);
}

#[test]
fn test_server_commands() {
    let parent = FakeParent::new();
    let server = server(&parent);

    server.select(None).unwrap();
    server.select(Some("Query Bot")).unwrap();
    server.start().unwrap();
    server.stop(Some("maintenance")).unwrap();
    server.stop(None).unwrap();
    server.delete().unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "use sid=1",
            "use sid=1 client_nickname=Query\\sBot",
            "serverstart sid=1",
            "serverstop sid=1 reasonmsg=maintenance",
            "serverstop sid=1",
            "serverdelete sid=1",
        ]
    );
}

#[test]
fn test_server_refresh_picks_matching_record() {
    let parent = FakeParent::new();
    let server = server(&parent);

    parent.reply(
        "virtualserver_id=2 virtualserver_name=Other|virtualserver_id=1 virtualserver_name=Renamed",
        OK,
    );
    server.refresh().unwrap();

    assert_eq!(parent.last_sent().as_deref(), Some("serverlist"));
    assert_eq!(server.name().as_deref(), Some("Renamed"));
    assert_eq!(server.port(), None);
}

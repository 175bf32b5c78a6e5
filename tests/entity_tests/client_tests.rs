//! Client Entity Tests
//!
//! Tests verify:
//! - Identity and cached properties from a clientlist record
//! - Move/message/disconnect correlation
//! - Command lines issued by client operations

use tsquery::entity::{Client, ClientEvent, Parent, PermissionRef};
use tsquery::protocol::parse;
use tsquery::{QueryError, Record};

use crate::support::{client_record, FakeParent, OK};

fn client(parent: &std::sync::Arc<FakeParent>, clid: u64) -> Client<FakeParent> {
    Client::new(parent, client_record(clid, clid + 100, "Some User")).unwrap()
}

// =============================================================================
// Identity / Property Tests
// =============================================================================

#[test]
fn test_client_identity() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    assert_eq!(client.clid(), 5);
    assert_eq!(client.database_id(), Some(105));
    assert_eq!(client.uid(), Some("uid5="));
    assert!(!client.is_query());
}

#[test]
fn test_client_cached_properties() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    assert_eq!(client.nickname().as_deref(), Some("Some User"));
    assert_eq!(client.channel_id(), Some(1));
    assert_eq!(client.servergroups(), vec![6, 8]);
}

#[test]
fn test_client_without_database_id_is_accepted() {
    let parent = FakeParent::new();
    let record = parse("clid=5 client_x=1").into_first().unwrap_or_default();
    let client = Client::new(&parent, record).unwrap();

    assert_eq!(client.clid(), 5);
    assert_eq!(client.database_id(), None);
    assert_eq!(client.uid(), None);
    assert!(client.property("x").is_some());
}

#[test]
fn test_client_without_database_id_still_correlates_events() {
    let parent = FakeParent::new();
    let record: Record = [("clid", 5u64)].into_iter().collect();
    let client = Client::new(&parent, record).unwrap();
    let rx = client.subscribe().unwrap();

    parent.notify("notifyclientmoved ctid=2 reasonid=0 clid=5");
    assert_eq!(rx.try_recv().unwrap(), ClientEvent::Moved { channel_id: 2 });
}

#[test]
fn test_database_operations_need_database_id() {
    let parent = FakeParent::new();
    let record: Record = [("clid", 5u64)].into_iter().collect();
    let client = Client::new(&parent, record).unwrap();

    let missing = |result: tsquery::Result<_>| {
        matches!(
            result,
            Err(QueryError::MissingIdentity {
                field: "client_database_id",
                ..
            })
        )
    };
    assert!(missing(client.db_info().map(|_| ())));
    assert!(missing(client.custom_info().map(|_| ())));
    assert!(missing(client.custom_set("k", "v").map(|_| ())));
    assert!(missing(client.custom_delete("k").map(|_| ())));
    assert!(missing(client.perm_list(true).map(|_| ())));
    assert!(missing(client.server_group_add(6).map(|_| ())));
    assert!(missing(client.server_group_del(6).map(|_| ())));
    assert!(missing(client.add_perm("i_icon_id", 1, false, false).map(|_| ())));
    assert!(missing(client.del_perm(12u64).map(|_| ())));
    assert!(parent.sent().is_empty());
}

#[test]
fn test_client_operations_by_clid_work_without_database_id() {
    let parent = FakeParent::new();
    let record: Record = [("clid", 5u64)].into_iter().collect();
    let client = Client::new(&parent, record).unwrap();

    parent.reply("", OK);
    client.poke("hi").unwrap();
    assert_eq!(parent.last_sent().as_deref(), Some("clientpoke clid=5 msg=hi"));
}

#[test]
fn test_client_without_clid_is_rejected() {
    let parent = FakeParent::new();
    let record: Record = [("client_database_id", 9u64)].into_iter().collect();
    assert!(matches!(
        Client::new(&parent, record),
        Err(QueryError::MissingIdentity { field: "clid", .. })
    ));
}

#[test]
fn test_client_url_encodes_nickname() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);
    assert_eq!(
        client.url(),
        "[URL=client://5/uid5=~Some%20User]Some User[/URL]"
    );
}

// =============================================================================
// Event Tests
// =============================================================================

#[test]
fn test_client_move_event() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);
    let rx = client.subscribe().unwrap();

    parent.notify("notifyclientmoved ctid=9 reasonid=0 clid=5");
    parent.notify("notifyclientmoved ctid=9 reasonid=0 clid=6");

    assert_eq!(rx.try_recv().unwrap(), ClientEvent::Moved { channel_id: 9 });
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_client_message_event_matches_sender() {
    let parent = FakeParent::new();
    let sender = client(&parent, 5);
    let other = client(&parent, 6);
    let rx_sender = sender.subscribe().unwrap();
    let rx_other = other.subscribe().unwrap();

    parent.notify("notifytextmessage targetmode=1 msg=hi\\sthere target=6 invokerid=5 invokername=A invokeruid=x");

    assert_eq!(
        rx_sender.try_recv().unwrap(),
        ClientEvent::Message {
            text: "hi there".into()
        }
    );
    assert!(rx_other.try_recv().is_err());
}

#[test]
fn test_client_disconnect_destroys_client() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);
    let rx = client.subscribe().unwrap();
    assert_eq!(parent.events().subscription_count(), 3);

    parent.notify("notifyclientleftview cfid=1 ctid=0 reasonid=8 reasonmsg=bye clid=5");

    assert_eq!(
        rx.try_recv().unwrap(),
        ClientEvent::Disconnected {
            reason_id: Some(8),
            reason_msg: "bye".into()
        }
    );
    assert!(client.is_destroyed());
    assert_eq!(parent.events().subscription_count(), 0);

    // Later events for the same id reach nobody
    assert_eq!(parent.notify("notifyclientmoved ctid=2 clid=5"), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_batched_disconnect_tears_down_each_client() {
    let parent = FakeParent::new();
    let a = client(&parent, 5);
    let b = client(&parent, 6);
    let c = client(&parent, 7);

    parent.notify("notifyclientleftview reasonid=8 clid=5|clid=7");

    assert!(a.is_destroyed());
    assert!(!b.is_destroyed());
    assert!(c.is_destroyed());
    assert_eq!(parent.events().subscription_count(), 3);
}

// =============================================================================
// Operation Tests
// =============================================================================

#[test]
fn test_kick_commands() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.kick_from_server("bye now").unwrap();
    client.kick_from_channel("out").unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "clientkick clid=5 reasonid=5 reasonmsg=bye\\snow",
            "clientkick clid=5 reasonid=4 reasonmsg=out",
        ]
    );
}

#[test]
fn test_move_with_and_without_password() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.move_to(3, None).unwrap();
    client.move_to(3, Some("pw 1")).unwrap();

    assert_eq!(
        parent.sent(),
        vec!["clientmove clid=5 cid=3", "clientmove clid=5 cid=3 cpw=pw\\s1"]
    );
}

#[test]
fn test_message_and_poke() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.message("hello|world").unwrap();
    client.poke("wake up").unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "sendtextmessage targetmode=1 target=5 msg=hello\\pworld",
            "clientpoke clid=5 msg=wake\\sup",
        ]
    );
}

#[test]
fn test_ban_uses_uid() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.ban("spam", Some(60)).unwrap();
    client.ban("spam", None).unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "banadd uid=uid5= time=60 banreason=spam",
            "banadd uid=uid5= banreason=spam",
        ]
    );
}

#[test]
fn test_database_operations() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.server_group_add(9).unwrap();
    client.server_group_del(9).unwrap();
    client.custom_set("team", "red blue").unwrap();
    client.custom_delete("team").unwrap();
    client.custom_info().unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "servergroupaddclient sgid=9 cldbid=105",
            "servergroupdelclient sgid=9 cldbid=105",
            "customset cldbid=105 ident=team value=red\\sblue",
            "customdelete cldbid=105 ident=team",
            "custominfo cldbid=105",
        ]
    );
}

#[test]
fn test_permission_commands() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    client.perm_list(true).unwrap();
    client.add_perm("i_client_talk_power", 50, false, true).unwrap();
    client.add_perm(PermissionRef::Id(12), -1, true, false).unwrap();
    client.del_perm(12u64).unwrap();

    assert_eq!(
        parent.sent(),
        vec![
            "clientpermlist -permsid cldbid=105",
            "clientaddperm cldbid=105 permsid=i_client_talk_power permvalue=50 permskip=0 permnegated=1",
            "clientaddperm cldbid=105 permid=12 permvalue=-1 permskip=1 permnegated=0",
            "clientdelperm cldbid=105 permid=12",
        ]
    );
}

#[test]
fn test_info_returns_first_record() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    parent.reply("cid=1 client_idle_time=250 client_nickname=Some\\sUser", OK);
    let info = client.info().unwrap();

    assert_eq!(parent.last_sent().as_deref(), Some("clientinfo clid=5"));
    assert_eq!(info.get_u64("client_idle_time"), Some(250));
}

#[test]
fn test_avatar_name_from_db_info() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    parent.reply("client_base64HashClientUID=abcdef", OK);
    assert_eq!(client.avatar_name().unwrap(), "avatar_abcdef");
    assert_eq!(parent.last_sent().as_deref(), Some("clientdbinfo cldbid=105"));
}

#[test]
fn test_operation_error_passes_through() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    parent.reply("", "error id=512 msg=invalid\\sclientID");
    match client.poke("hi") {
        Err(QueryError::Response(err)) => {
            assert_eq!(err.id, 512);
            assert_eq!(err.msg, "invalid clientID");
        }
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_client_refresh_uses_clientlist_flags() {
    let parent = FakeParent::new();
    let client = client(&parent, 5);

    parent.reply(
        "clid=5 cid=4 client_database_id=105 client_nickname=Renamed client_type=0",
        OK,
    );
    client.refresh().unwrap();

    assert_eq!(
        parent.last_sent().as_deref(),
        Some("clientlist -uid -away -voice -times -groups -info -icon -country -ip")
    );
    assert_eq!(client.nickname().as_deref(), Some("Renamed"));
    assert_eq!(client.channel_id(), Some(4));
    assert!(client.servergroups().is_empty());
}

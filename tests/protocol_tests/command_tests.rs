//! Command Tests
//!
//! Response/error bookkeeping on a Command.

use tsquery::protocol::{Command, OptionSet};
use tsquery::{QueryError, Response, TypeRegistry};

#[test]
fn test_set_command_trims() {
    let mut command = Command::new("  clientlist \n");
    assert_eq!(command.verb(), "clientlist");
    command.set_command(" serverlist");
    assert_eq!(command.build(), "serverlist");
}

#[test]
fn test_presence_checks() {
    let command = Command::new("x");
    assert!(!command.has_flags());
    assert!(!command.has_options());
    assert!(!command.has_multi_options());

    let command = command.flag("-uid");
    assert!(command.has_flags());

    let command = Command::new("x").multi_options(vec![OptionSet::new().with("a", 1)]);
    assert!(command.has_options());
    assert!(command.has_multi_options());
}

#[test]
fn test_error_id_zero_is_success() {
    let registry = TypeRegistry::builtin();
    let mut command = Command::new("version");
    command.set_error("error id=0 msg=ok", &registry);
    assert!(!command.has_error());
    assert!(command.check().is_ok());
}

#[test]
fn test_error_id_nonzero_is_failure() {
    let registry = TypeRegistry::builtin();
    let mut command = Command::new("clientkick");
    command.set_error("error id=1 msg=denied", &registry);
    assert!(command.has_error());

    let err = command.get_error().unwrap();
    assert_eq!(err.id, 1);
    assert_eq!(err.msg, "denied");
}

#[test]
fn test_error_without_id_field_type_still_detected() {
    // An empty registry leaves `id` as text; it is still read as a number
    let registry = TypeRegistry::new();
    let mut command = Command::new("x");
    command.set_error("id=1 msg=x", &registry);
    assert!(command.has_error());
}

#[test]
fn test_no_error_means_success() {
    let command = Command::new("x");
    assert!(!command.has_error());
    assert!(command.get_error().is_none());
}

#[test]
fn test_check_surfaces_structured_error() {
    let registry = TypeRegistry::builtin();
    let mut command = Command::new("clientkick");
    command.set_error(
        "error id=2568 msg=insufficient\\sclient\\spermissions failed_permid=4",
        &registry,
    );

    match command.check() {
        Err(QueryError::Response(err)) => {
            assert_eq!(err.id, 2568);
            assert_eq!(err.msg, "insufficient client permissions");
            assert_eq!(err.failed_permid, Some(4));
            assert_eq!(
                err.to_string(),
                "server error 2568: insufficient client permissions"
            );
        }
        other => panic!("Expected response error, got {:?}", other),
    }
}

#[test]
fn test_response_is_kept_until_reset() {
    let registry = TypeRegistry::builtin();
    let mut command = Command::new("serverlist");
    command.set_response("virtualserver_id=1|virtualserver_id=2", &registry);
    command.set_error("error id=0 msg=ok", &registry);

    match command.check().unwrap() {
        Some(Response::Multiple(records)) => assert_eq!(records.len(), 2),
        other => panic!("Expected two records, got {:?}", other),
    }

    command.reset();
    assert!(command.response().is_none());
    assert!(command.error().is_none());
    // Options survive a reset
    assert_eq!(command.build(), "serverlist");
}

#[test]
fn test_display_matches_build() {
    let command = Command::new("use").option("sid", 1);
    assert_eq!(command.to_string(), command.build());
}

// tests/engine_tests.rs

use cfgtree::{compile, Engine, EngineError, ErrorCode, Flags, NodeSnapshot, SaveMode};
use proptest::prelude::*;

/// An engine holding a small hosts file:
///
/// ```text
/// /files/etc/hosts/1/ipaddr    = 127.0.0.1
/// /files/etc/hosts/1/canonical = localhost.localdomain
/// /files/etc/hosts/1/alias     = localhost
/// /files/etc/hosts/2/ipaddr    = 192.168.0.1
/// /files/etc/hosts/2/canonical = gateway
/// ```
fn hosts() -> Engine {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set("/files/etc/hosts/1/ipaddr", Some("127.0.0.1")).unwrap();
    aug.set("/files/etc/hosts/1/canonical", Some("localhost.localdomain"))
        .unwrap();
    aug.set("/files/etc/hosts/1/alias", Some("localhost")).unwrap();
    aug.set("/files/etc/hosts/2/ipaddr", Some("192.168.0.1")).unwrap();
    aug.set("/files/etc/hosts/2/canonical", Some("gateway")).unwrap();
    aug
}

// ============================================================================
// Lifecycle and Meta Tree
// ============================================================================

#[test]
fn test_meta_tree_reflects_create_arguments() {
    let mut aug = Engine::create("/srv/root", Some("/a:/b"), Flags::SAVE_NEWFILE);
    assert_eq!(aug.get("/augeas/root").unwrap().as_deref(), Some("/srv/root/"));
    assert_eq!(aug.get("/augeas/save").unwrap().as_deref(), Some("newfile"));
    assert_eq!(aug.get("/augeas/context").unwrap().as_deref(), Some("/files"));
    assert_eq!(aug.matches("/augeas/loadpath/path").unwrap().len(), 2);
    assert_eq!(aug.matches("/files").unwrap(), vec!["/files"]);
}

#[test]
fn test_default_save_mode() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    assert_eq!(aug.get("/augeas/save").unwrap().as_deref(), Some("overwrite"));
    assert_eq!(aug.save().unwrap(), SaveMode::Overwrite);
}

#[test]
fn test_save_mode_follows_meta_tree() {
    let mut aug = Engine::create("/", None, Flags::SAVE_BACKUP);
    assert_eq!(aug.save().unwrap(), SaveMode::Backup);
    aug.set("/augeas/save", Some("noop")).unwrap();
    assert_eq!(aug.save().unwrap(), SaveMode::Noop);
}

#[test]
fn test_operations_after_close_fail() {
    let mut aug = hosts();
    aug.close().unwrap();
    assert!(aug.is_closed());

    assert_eq!(aug.get("/files").unwrap_err(), EngineError::InstanceClosed);
    assert_eq!(aug.error().code, ErrorCode::InstanceClosed);
    assert_eq!(
        aug.set("/files/a", Some("x")).unwrap_err(),
        EngineError::InstanceClosed
    );
    assert_eq!(aug.remove("/files").unwrap_err(), EngineError::InstanceClosed);
    assert_eq!(
        aug.move_node("/files/a", "/files/b").unwrap_err(),
        EngineError::InstanceClosed
    );
    assert_eq!(aug.close().unwrap_err(), EngineError::InstanceClosed);

    let (status, out) = aug.srun("get /files");
    assert_eq!(status, -1);
    assert_eq!(out, "");
    assert_eq!(aug.error().code, ErrorCode::InstanceClosed);
}

// ============================================================================
// Get and Set
// ============================================================================

#[test]
fn test_get_by_value_predicate() {
    let mut aug = hosts();
    assert_eq!(
        aug.get("/files/etc/hosts/*[canonical='gateway']/ipaddr")
            .unwrap()
            .as_deref(),
        Some("192.168.0.1")
    );
}

#[test]
fn test_get_without_match_is_absent() {
    let mut aug = hosts();
    assert_eq!(aug.get("/files/etc/hosts/9/ipaddr").unwrap(), None);
    assert!(!aug.error().is_error());
}

#[test]
fn test_get_multiple_matches_reports_count() {
    let mut aug = hosts();
    let err = aug.get("/files/etc/hosts/*/ipaddr").unwrap_err();
    assert_eq!(err.code(), ErrorCode::MultipleMatches);

    let info = aug.error();
    assert_eq!(info.code, ErrorCode::MultipleMatches);
    assert_eq!(info.message, "Too many matches for path expression");
    assert!(info.details.contains('2'));
    assert_eq!(info.minor, None);
}

#[test]
fn test_success_clears_error_record() {
    let mut aug = hosts();
    aug.get("/files/etc/hosts/*/ipaddr").unwrap_err();
    assert!(aug.error().is_error());
    aug.get("/files/etc/hosts/1/ipaddr").unwrap();
    assert_eq!(aug.error().code, ErrorCode::NoError);
}

#[test]
fn test_set_multiple_matches_writes_nothing() {
    let mut aug = hosts();
    let err = aug.set("/files/etc/hosts/*/ipaddr", Some("10.0.0.1")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MultipleMatches);
    assert_eq!(
        aug.get("/files/etc/hosts/1/ipaddr").unwrap().as_deref(),
        Some("127.0.0.1")
    );
    assert_eq!(
        aug.get("/files/etc/hosts/2/ipaddr").unwrap().as_deref(),
        Some("192.168.0.1")
    );
}

#[test]
fn test_set_empty_and_absent_values() {
    let mut aug = hosts();
    aug.set("/files/etc/hosts/1/alias", Some("")).unwrap();
    assert_eq!(aug.get("/files/etc/hosts/1/alias").unwrap().as_deref(), Some(""));

    aug.set("/files/etc/hosts/1/alias", None).unwrap();
    assert_eq!(aug.get("/files/etc/hosts/1/alias").unwrap(), None);
    assert_eq!(aug.matches("/files/etc/hosts/1/alias").unwrap().len(), 1);
}

#[test]
fn test_clear_keeps_node() {
    let mut aug = hosts();
    aug.clear("/files/etc/hosts/2/canonical").unwrap();
    let entries = aug.entries("/files/etc/hosts/2/canonical").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, None);
}

#[test]
fn test_set_creates_missing_ancestors() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set("/files/etc/ssh/sshd_config/Port", Some("22")).unwrap();
    assert_eq!(
        aug.matches("/files/etc/ssh/*").unwrap(),
        vec!["/files/etc/ssh/sshd_config"]
    );
}

#[test]
fn test_set_next_position_creates_sibling() {
    let mut aug = hosts();
    aug.set("/files/etc/hosts/1/alias[2]", Some("local")).unwrap();
    assert_eq!(
        aug.get("/files/etc/hosts/1/alias[last()]").unwrap().as_deref(),
        Some("local")
    );

    let err = aug.set("/files/etc/hosts/1/alias[5]", Some("x")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotCreate);
}

#[test]
fn test_set_cannot_create_wildcard() {
    let mut aug = hosts();
    let err = aug.set("/files/etc/missing/*", Some("x")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotCreate);
    assert_eq!(aug.matches("/files/etc/missing").unwrap().len(), 0);
}

#[test]
fn test_root_cannot_hold_a_value() {
    let mut aug = hosts();
    let err = aug.set("/", Some("x")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArgument);
}

// ============================================================================
// Append and Multi-Set
// ============================================================================

#[test]
fn test_append_keeps_value_order() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let written = aug
        .set_many(
            "/files/etc/group/disk/user[last()+1]",
            &[Some("alice"), Some("bob"), Some("carol")],
        )
        .unwrap();
    assert_eq!(written, 3);

    for (i, name) in ["alice", "bob", "carol"].iter().enumerate() {
        let path = format!("/files/etc/group/disk/user[{}]", i + 1);
        assert_eq!(aug.get(&path).unwrap().as_deref(), Some(*name));
    }
}

#[test]
fn test_append_after_existing_siblings() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set("/files/etc/group/disk/gid", Some("6")).unwrap();
    aug.set("/files/etc/group/disk/user", Some("root")).unwrap();
    aug.set("/files/etc/group/disk/comment", Some("x")).unwrap();
    aug.set_many(
        "/files/etc/group/disk/user[last()+1]",
        &[Some("alice"), Some("bob")],
    )
    .unwrap();

    assert_eq!(
        aug.matches("/files/etc/group/disk/*").unwrap(),
        vec![
            "/files/etc/group/disk/gid",
            "/files/etc/group/disk/user[1]",
            "/files/etc/group/disk/user[2]",
            "/files/etc/group/disk/user[3]",
            "/files/etc/group/disk/comment",
        ]
    );
    assert_eq!(
        aug.get("/files/etc/group/disk/user[last()-1]").unwrap().as_deref(),
        Some("alice")
    );
    assert_eq!(
        aug.get("/files/etc/group/disk/user[last()]").unwrap().as_deref(),
        Some("bob")
    );
}

#[test]
fn test_set_many_inside_label_group() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set_many(
        "/files/etc/group/disk/user[last()+1]",
        &[Some("u1"), Some("u2")],
    )
    .unwrap();
    aug.set_many("/files/etc/group/disk/user[1]", &[Some("a"), Some("b")])
        .unwrap();

    let values: Vec<Option<String>> = aug
        .entries("/files/etc/group/disk/user")
        .unwrap()
        .into_iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(
        values,
        vec![Some("a".to_string()), Some("b".to_string()), Some("u2".to_string())]
    );
}

#[test]
fn test_append_without_value_creates_node() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set("/files/etc/hosts/1[last()+1]", None).unwrap();
    aug.set("/files/etc/hosts/1[last()+1]", None).unwrap();
    assert_eq!(aug.matches("/files/etc/hosts/1").unwrap().len(), 2);
}

#[test]
fn test_append_rejected_by_get() {
    let mut aug = hosts();
    let err = aug.get("/files/etc/hosts/1/alias[last()+1]").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPath);
    assert_eq!(aug.error().minor, Some(24));
}

#[test]
fn test_append_rejected_on_relative_path() {
    let mut aug = hosts();
    let err = aug.get("etc/hosts[last()+1]").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPath);

    let info = aug.error();
    assert_eq!(info.minor, Some(9));
    assert!(info.details.starts_with("etc/hosts|=|[last()+1]"));
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn test_remove_counts_subtree() {
    let mut aug = hosts();
    assert_eq!(aug.remove("/files/etc/hosts/1").unwrap(), 4);
    assert_eq!(aug.matches("/files/etc/hosts/*").unwrap(), vec!["/files/etc/hosts/2"]);
}

#[test]
fn test_remove_sums_all_matches() {
    let mut aug = hosts();
    assert_eq!(aug.remove("/files/etc/hosts/*/canonical").unwrap(), 2);
}

#[test]
fn test_remove_nothing_is_not_an_error() {
    let mut aug = hosts();
    assert_eq!(aug.remove("/files/etc/fstab").unwrap(), 0);
    assert!(!aug.error().is_error());
}

#[test]
fn test_remove_invalid_path_changes_nothing() {
    let mut aug = hosts();
    let err = aug.remove("/files/etc//hosts").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPath);
    assert_eq!(aug.error().minor, Some(11));
    assert!(aug.error().details.starts_with("/files/etc/|=|"));
    assert_eq!(aug.matches("/files/etc/hosts/*").unwrap().len(), 2);
}

// ============================================================================
// Move and Insert
// ============================================================================

#[test]
fn test_move_to_new_location() {
    let mut aug = hosts();
    aug.move_node("/files/etc/hosts/2", "/files/etc/hosts/3").unwrap();
    assert_eq!(
        aug.get("/files/etc/hosts/3/canonical").unwrap().as_deref(),
        Some("gateway")
    );
    assert_eq!(aug.matches("/files/etc/hosts/2").unwrap().len(), 0);
}

#[test]
fn test_move_replaces_existing_destination() {
    let mut aug = hosts();
    aug.move_node("/files/etc/hosts/2", "/files/etc/hosts/1").unwrap();
    assert_eq!(aug.matches("/files/etc/hosts/*").unwrap(), vec!["/files/etc/hosts/1"]);
    assert_eq!(aug.get("/files/etc/hosts/1/alias").unwrap(), None);
    assert_eq!(
        aug.get("/files/etc/hosts/1/ipaddr").unwrap().as_deref(),
        Some("192.168.0.1")
    );
}

#[test]
fn test_move_missing_source() {
    let mut aug = hosts();
    let err = aug.move_node("/files/etc/hosts/7", "/files/etc/hosts/8").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoMatch);
    assert_eq!(aug.matches("/files/etc/hosts/8").unwrap().len(), 0);
}

#[test]
fn test_move_ambiguous_source() {
    let mut aug = hosts();
    let err = aug.move_node("/files/etc/hosts/*", "/files/x").unwrap_err();
    assert_eq!(err.code(), ErrorCode::MultipleMatches);
    assert_eq!(aug.error().code, ErrorCode::MultipleMatches);
    assert_eq!(aug.matches("/files/x").unwrap().len(), 0);
    assert_eq!(
        aug.matches("/files/etc/hosts/*").unwrap(),
        vec!["/files/etc/hosts/1", "/files/etc/hosts/2"]
    );
}

#[test]
fn test_move_into_descendant() {
    let mut aug = hosts();
    let err = aug
        .move_node("/files/etc/hosts", "/files/etc/hosts/1/sub")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MoveIntoDescendant);
    assert_eq!(aug.matches("/files/etc/hosts/1/sub").unwrap().len(), 0);
}

#[test]
fn test_insert_before_and_after() {
    let mut aug = hosts();
    aug.insert("/files/etc/hosts/1/canonical", "alias", false).unwrap();
    aug.insert("/files/etc/hosts/1/ipaddr", "#comment", true).unwrap();
    let labels: Vec<String> = aug
        .children("/files/etc/hosts/1")
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, vec!["#comment", "ipaddr", "canonical", "alias", "alias"]);
}

#[test]
fn test_insert_needs_single_target() {
    let mut aug = hosts();
    let err = aug.insert("/files/etc/hosts/*", "x", true).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MultipleMatches);
    let err = aug.insert("/files/etc/hosts/1", "a/b", true).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArgument);
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_relative_paths_use_context() {
    let mut aug = hosts();
    assert_eq!(
        aug.get("etc/hosts/1/ipaddr").unwrap().as_deref(),
        Some("127.0.0.1")
    );
    aug.set("/augeas/context", Some("/files/etc/hosts/2")).unwrap();
    assert_eq!(aug.get("canonical").unwrap().as_deref(), Some("gateway"));
    aug.set("alias", Some("gw")).unwrap();
    assert_eq!(aug.get("/files/etc/hosts/2/alias").unwrap().as_deref(), Some("gw"));
}

#[test]
fn test_parent_and_self_steps() {
    let mut aug = hosts();
    assert_eq!(
        aug.matches("/files/etc/hosts/*/alias/..").unwrap(),
        vec!["/files/etc/hosts/1"]
    );
    assert_eq!(
        aug.matches("/files/etc/hosts/*/ipaddr[.='127.0.0.1']/../canonical/.")
            .unwrap(),
        vec!["/files/etc/hosts/1/canonical"]
    );
}

#[test]
fn test_labels_with_inner_spaces() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    aug.set("/files/etc/a b", Some("1")).unwrap();
    assert_eq!(aug.get("/files/etc/a b").unwrap().as_deref(), Some("1"));
    assert_eq!(aug.get("/files/etc/ a b ").unwrap().as_deref(), Some("1"));
    assert_eq!(aug.matches("/files/etc/*").unwrap(), vec!["/files/etc/a b"]);
}

#[test]
fn test_compiled_path_reuse() {
    let path = compile("/files/etc/hosts/1/ipaddr").unwrap();
    let mut first = hosts();
    let mut second = Engine::create("/", None, Flags::NONE);
    second.set(&path, Some("10.0.0.1")).unwrap();
    assert_eq!(first.get(&path).unwrap().as_deref(), Some("127.0.0.1"));
    assert_eq!(second.get(&path).unwrap().as_deref(), Some("10.0.0.1"));
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_and_reload() {
    let mut aug = hosts();
    let snap = aug.snapshot("/files/etc/hosts").unwrap();
    assert_eq!(snap.label, "hosts");
    assert_eq!(snap.children.len(), 2);

    let mut other = Engine::create("/", None, Flags::NONE);
    assert_eq!(other.load_snapshot("/files/etc/hosts", &snap).unwrap(), 7);
    assert_eq!(other.snapshot("/files/etc/hosts").unwrap(), snap);
}

#[test]
fn test_deep_tree_snapshot_is_refused() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let deep = format!("/files{}", "/a".repeat(20_000));
    aug.set(&deep, Some("x")).unwrap();

    let err = aug.snapshot("/files").unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArgument);
    assert_eq!(aug.get(&deep).unwrap().as_deref(), Some("x"));
    assert_eq!(aug.remove("/files/a").unwrap(), 20_000);
}

#[test]
fn test_snapshot_at_depth_limit() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let path = format!("/files{}", "/a".repeat(cfgtree::output::MAX_SNAPSHOT_DEPTH - 1));
    aug.set(&path, Some("x")).unwrap();
    let snap = aug.snapshot("/files").unwrap();

    let json = cfgtree::output::to_json(&snap).unwrap();
    assert_eq!(cfgtree::output::from_json(&json).unwrap(), snap);
}

#[test]
fn test_load_snapshot_rejects_bad_labels() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let snap = NodeSnapshot {
        children: vec![NodeSnapshot {
            label: "a/b".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let err = aug.load_snapshot("/files", &snap).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArgument);
    assert_eq!(aug.children("/files").unwrap().len(), 0);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_set_then_get_round_trips(value in ".*") {
        let mut aug = hosts();
        aug.set("/files/etc/hosts/2/alias", Some(value.as_str())).unwrap();
        prop_assert_eq!(aug.get("/files/etc/hosts/2/alias").unwrap(), Some(value));
    }

    #[test]
    fn prop_append_order_is_kept(values in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let mut aug = Engine::create("/", None, Flags::NONE);
        let refs: Vec<Option<&str>> = values.iter().map(|v| Some(v.as_str())).collect();
        aug.set_many("/files/list/item[last()+1]", &refs).unwrap();
        for (i, v) in values.iter().enumerate() {
            let got = aug.get(&format!("/files/list/item[{}]", i + 1)).unwrap();
            prop_assert_eq!(got.as_deref(), Some(v.as_str()));
        }
    }
}

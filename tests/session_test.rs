//! Integration tests for sessions
//!
//! Verifies buffered writes, commit visibility, conflict detection and
//! session close semantics.

use treestore::{Credentials, NodePath, PropertyValue, Repository, StoreError};

fn path(raw: &str) -> NodePath {
    NodePath::parse(raw).unwrap()
}

#[test]
fn test_add_node_then_get() {
    let repo = Repository::in_memory();
    let mut session = repo.login_admin().unwrap();

    session.add_node("/colours", "nt:unstructured").unwrap();
    session.commit().unwrap();

    let node = session.get_node("/colours").unwrap();
    assert_eq!(node.primary_type, "nt:unstructured");
    assert!(node.children.is_empty());
    assert!(session.list_children("/colours").unwrap().is_empty());
    session.logout().unwrap();
}

#[test]
fn test_pending_writes_are_not_visible_to_others() {
    let repo = Repository::in_memory();
    let mut writer = repo.login_admin().unwrap();
    let reader = repo.login_admin().unwrap();

    writer.add_node("/draft", "nt:unstructured").unwrap();
    assert!(matches!(reader.get_node("/draft"), Err(StoreError::NodeNotFound(_))));

    writer.commit().unwrap();
    // reads are read-committed: the reader sees the new revision at once
    assert!(reader.get_node("/draft").is_ok());
}

#[test]
fn test_remove_subtree() {
    let repo = Repository::in_memory();
    let mut session = repo.login_admin().unwrap();
    session.add_node("/a", "nt:unstructured").unwrap();
    session.add_node("/a/b", "nt:unstructured").unwrap();
    session.add_node("/a/b/c", "nt:unstructured").unwrap();
    session.commit().unwrap();

    session.remove_node("/a").unwrap();
    session.commit().unwrap();

    for p in ["/a", "/a/b", "/a/b/c"] {
        assert!(matches!(session.get_node(p), Err(StoreError::NodeNotFound(_))));
    }
    assert!(session.list_children("/").unwrap().is_empty());
}

#[test]
fn test_write_errors() {
    let repo = Repository::in_memory();
    let mut session = repo.login_admin().unwrap();
    session.add_node("/a", "nt:unstructured").unwrap();

    assert_eq!(
        session.add_node("/a", "nt:unstructured"),
        Err(StoreError::NodeExists(path("/a")))
    );
    assert_eq!(
        session.add_node("/missing/child", "nt:unstructured"),
        Err(StoreError::ParentMissing(path("/missing/child")))
    );
    assert_eq!(
        session.add_node("/", "nt:unstructured"),
        Err(StoreError::NodeExists(NodePath::root()))
    );
    assert!(matches!(session.remove_node("/"), Err(StoreError::InvalidPath { .. })));
    assert!(matches!(session.remove_node("/nope"), Err(StoreError::NodeNotFound(_))));
    assert!(matches!(
        session.set_property("/a", "", "x".into()),
        Err(StoreError::InvalidPath { .. })
    ));
    assert!(matches!(
        session.remove_property("/a", "colour"),
        Err(StoreError::PropertyNotFound { .. })
    ));
    assert!(matches!(session.add_node("/a//b", "nt:unstructured"), Err(StoreError::InvalidPath { .. })));

    // failed writes leave earlier buffered ones alone
    assert!(session.has_pending_changes());
    session.commit().unwrap();
    assert!(session.get_node("/a").is_ok());
}

#[test]
fn test_multi_value_round_trip() {
    let repo = Repository::in_memory();
    let mut session = repo.login_admin().unwrap();
    session.add_node("/a", "nt:unstructured").unwrap();
    session
        .set_property("/a", "tags", PropertyValue::from(vec!["a", "b"]))
        .unwrap();
    session.commit().unwrap();

    let props = session.get_properties("/a").unwrap();
    assert_eq!(props.get("tags").unwrap().values(), vec!["a", "b"]);
    assert!(props.get("tags").unwrap().is_multiple());
}

#[test]
fn test_close_twice_fails() {
    let repo = Repository::in_memory();
    let mut session = repo.login_admin().unwrap();
    session.add_node("/pending", "nt:unstructured").unwrap();

    session.logout().unwrap();
    let id = session.id().to_string();
    assert_eq!(session.logout(), Err(StoreError::SessionClosed(id.clone())));
    assert_eq!(session.commit(), Err(StoreError::SessionClosed(id.clone())));
    assert_eq!(
        session.add_node("/other", "nt:unstructured"),
        Err(StoreError::SessionClosed(id))
    );

    // discarded, nothing committed
    assert_eq!(repo.revision(), 0);
    assert!(repo.snapshot().tree().get(&path("/pending")).is_none());
    assert_eq!(repo.active_sessions(), 0);
}

#[test]
fn test_bad_credentials() {
    let repo = Repository::in_memory();
    assert!(matches!(
        repo.login(&Credentials::new("admin", "nope")),
        Err(StoreError::AuthenticationFailed(_))
    ));
    assert_eq!(repo.active_sessions(), 0);
}

#[test]
fn test_conflict_on_removed_node() {
    let repo = Repository::in_memory();
    let mut setup = repo.login_admin().unwrap();
    setup.add_node("/x", "nt:unstructured").unwrap();
    setup.commit().unwrap();
    setup.logout().unwrap();

    let mut a = repo.login_admin().unwrap();
    let mut b = repo.login_admin().unwrap();

    // b buffers its edit before a removes the node
    b.set_property("/x", "colour", "red".into()).unwrap();
    a.remove_node("/x").unwrap();
    a.commit().unwrap();

    assert_eq!(b.commit(), Err(StoreError::ConflictDetected(path("/x"))));

    // buffer discarded, store untouched
    assert!(!b.has_pending_changes());
    assert!(repo.snapshot().tree().get(&path("/x")).is_none());
    assert!(repo.snapshot().index().is_empty());
}

#[test]
fn test_conflict_on_recreated_node() {
    let repo = Repository::in_memory();
    let mut setup = repo.login_admin().unwrap();
    setup.add_node("/x", "nt:unstructured").unwrap();
    setup.commit().unwrap();

    let mut b = repo.login_admin().unwrap();
    b.set_property("/x", "colour", "red".into()).unwrap();

    setup.remove_node("/x").unwrap();
    setup.commit().unwrap();
    setup.add_node("/x", "nt:unstructured").unwrap();
    setup.commit().unwrap();

    assert_eq!(b.commit(), Err(StoreError::ConflictDetected(path("/x"))));
}

#[test]
fn test_conflict_on_concurrent_create() {
    let repo = Repository::in_memory();
    let mut a = repo.login_admin().unwrap();
    let mut b = repo.login_admin().unwrap();

    a.add_node("/shared", "nt:unstructured").unwrap();
    b.add_node("/shared", "nt:folder").unwrap();

    a.commit().unwrap();
    assert_eq!(b.commit(), Err(StoreError::ConflictDetected(path("/shared"))));
    assert_eq!(
        repo.snapshot().tree().get(&path("/shared")).unwrap().primary_type,
        "nt:unstructured"
    );
}

#[test]
fn test_concurrent_property_edits_last_writer_wins() {
    let repo = Repository::in_memory();
    let mut setup = repo.login_admin().unwrap();
    setup.add_node("/x", "nt:unstructured").unwrap();
    setup.commit().unwrap();

    let mut a = repo.login_admin().unwrap();
    let mut b = repo.login_admin().unwrap();
    a.set_property("/x", "colour", "red".into()).unwrap();
    b.set_property("/x", "colour", "blue".into()).unwrap();

    a.commit().unwrap();
    b.commit().unwrap();

    let snapshot = repo.snapshot();
    assert!(snapshot.index().lookup("red").is_empty());
    assert_eq!(snapshot.index().lookup("blue"), vec![path("/x")]);
}

#[test]
fn test_new_writes_start_from_latest_commit() {
    let repo = Repository::in_memory();
    let mut early = repo.login_admin().unwrap();
    let mut other = repo.login_admin().unwrap();

    other.add_node("/a", "nt:unstructured").unwrap();
    other.commit().unwrap();

    // early logged in at revision 0 but sees /a, and can write below it
    assert_eq!(early.get_node("/a").unwrap().primary_type, "nt:unstructured");
    early.add_node("/a/b", "nt:unstructured").unwrap();
    early.set_property("/a", "colour", "red".into()).unwrap();
    assert_eq!(early.base_revision(), 1);
    assert_eq!(early.commit().unwrap(), 2);

    let snapshot = repo.snapshot();
    assert!(snapshot.tree().get(&path("/a/b")).is_some());
    assert_eq!(snapshot.index().lookup("red"), vec![path("/a")]);
}

#[test]
fn test_buffered_writes_keep_their_base() {
    let repo = Repository::in_memory();
    let mut a = repo.login_admin().unwrap();
    let mut b = repo.login_admin().unwrap();

    a.add_node("/a", "nt:unstructured").unwrap();
    b.add_node("/b", "nt:unstructured").unwrap();
    b.commit().unwrap();

    // a's buffer was staged on revision 0; /b only exists at revision 1
    assert_eq!(a.base_revision(), 0);
    assert!(matches!(
        a.add_node("/b/child", "nt:unstructured"),
        Err(StoreError::ParentMissing(_))
    ));
    assert_eq!(a.commit().unwrap(), 2);
    assert_eq!(a.base_revision(), 2);

    a.add_node("/b/child", "nt:unstructured").unwrap();
    assert_eq!(a.commit().unwrap(), 3);
}

#[test]
fn test_concurrent_commits_from_threads() {
    const THREADS: usize = 8;
    const COMMITS: usize = 50;

    let repo = Repository::in_memory();
    let mut setup = repo.login_admin().unwrap();
    setup.add_node("/shared", "nt:unstructured").unwrap();
    setup.commit().unwrap();
    setup.logout().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let repo = repo.clone();
            std::thread::spawn(move || {
                for i in 0..COMMITS {
                    let mut session = repo.login_admin().unwrap();
                    let node = format!("/shared/t{}n{:03}", t, i);
                    session.add_node(&node, "nt:unstructured").unwrap();
                    session.set_property(&node, "colour", "red".into()).unwrap();
                    session.commit().unwrap();

                    // recolour half of them in a second commit
                    if i % 2 == 1 {
                        session.set_property(&node, "colour", "blue".into()).unwrap();
                        session.commit().unwrap();
                    }
                    session.logout().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = repo.snapshot();
    let children = snapshot.tree().list_children(&path("/shared")).unwrap();
    assert_eq!(children.len(), THREADS * COMMITS);
    assert_eq!(snapshot.revision() as usize, 1 + THREADS * COMMITS + THREADS * COMMITS / 2);

    let red = snapshot.index().lookup("red");
    let blue = snapshot.index().lookup("blue");
    assert_eq!(red.len(), THREADS * COMMITS / 2);
    assert_eq!(blue.len(), THREADS * COMMITS / 2);

    // every index entry agrees with the tree
    for (colour, paths) in [("red", &red), ("blue", &blue)] {
        for p in paths.iter() {
            let node = snapshot.tree().get(p).unwrap();
            assert_eq!(node.get_property("colour").and_then(|v| v.as_single()), Some(colour));
        }
    }
    assert_eq!(snapshot.index().len(), THREADS * COMMITS);
    assert_eq!(repo.active_sessions(), 0);
}

#[test]
fn test_dropping_open_session_releases_it() {
    let repo = Repository::in_memory();
    {
        let mut session = repo.login_admin().unwrap();
        session.add_node("/never", "nt:unstructured").unwrap();
        assert_eq!(repo.active_sessions(), 1);
    }
    assert_eq!(repo.active_sessions(), 0);
    assert_eq!(repo.revision(), 0);
}

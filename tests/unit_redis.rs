//! Integration tests against a live Redis server
//!
//! Ignored by default. Run with
//! `ANOI_TEST_REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anoi::{bootstrap, Namespace, RedisStore, RemoteSpace, Space, SpaceError, Uid, NIL};

fn connect() -> Option<RemoteSpace<RedisStore>> {
    let url = std::env::var("ANOI_TEST_REDIS_URL").ok()?;
    let store = RedisStore::connect(&url, Duration::from_secs(2)).unwrap();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let prefix = format!("anoi-test-{}-{}", std::process::id(), nanos);
    Some(RemoteSpace::new(store, prefix))
}

#[test]
#[ignore]
fn test_redis_roundtrip() {
    let Some(space) = connect() else {
        return;
    };
    let uid = space.allocate().unwrap();
    let content = vec![Uid::from('r'), Uid::from('e'), uid];
    space.set_content(uid, &content).unwrap();
    assert_eq!(space.get_content(uid).unwrap(), content);

    assert_eq!(space.cross(uid, Uid::from('k')).unwrap(), NIL);
    space.set_cross(uid, Uid::from('k'), Uid::from('v')).unwrap();
    assert_eq!(space.cross(uid, Uid::from('k')).unwrap(), Uid::from('v'));
    assert_eq!(
        space.cross_or_insert(uid, Uid::from('k'), Uid::from('w')).unwrap(),
        Uid::from('v')
    );
}

#[test]
#[ignore]
fn test_redis_namespace() {
    let Some(space) = connect() else {
        return;
    };
    bootstrap(&space).unwrap();
    let ns = Namespace::default_for(&space).unwrap();
    let apple = ns.get_name("apple").unwrap();
    assert_eq!(ns.get_name("apple").unwrap(), apple);
    assert_eq!(ns.name_of(apple).unwrap().as_deref(), Some("apple"));
}

#[test]
fn test_unreachable_server_is_transient() {
    // Port 1 on localhost refuses connections
    match RedisStore::connect("redis://127.0.0.1:1/", Duration::from_millis(200)) {
        Err(e) => assert!(e.is_transient(), "unexpected error: {}", e),
        Ok(_) => panic!("connected to a server that should not exist"),
    }
    assert!(matches!(
        RedisStore::connect("not a url", Duration::from_millis(200)),
        Err(SpaceError::Backend(_))
    ));
}

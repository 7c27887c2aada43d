//! Unit tests for snapshot persistence of the in-process backend

use std::fs;

use anoi::{bootstrap, BootstrapOutcome, MemorySpace, Namespace, Space, SpaceConfig, SpaceError};
use tempfile::tempdir;

#[test]
fn test_names_survive_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("space.bin");

    let apple = {
        let space = MemorySpace::load(&path).unwrap();
        bootstrap(&space).unwrap();
        let apple = Namespace::default_for(&space).unwrap().get_name("apple").unwrap();
        space.save().expect("save should succeed");
        apple
    };

    let space = MemorySpace::load(&path).expect("load should succeed");
    assert_eq!(bootstrap(&space).unwrap(), BootstrapOutcome::AlreadyBootstrapped);
    let ns = Namespace::default_for(&space).unwrap();
    assert_eq!(ns.lookup("apple").unwrap(), Some(apple));
    assert_eq!(ns.name_of(apple).unwrap().as_deref(), Some("apple"));

    // Allocation resumes past everything already handed out
    let fresh = space.allocate().unwrap();
    assert!(fresh > apple);
}

#[test]
fn test_config_flush_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("space.bin");
    let config = SpaceConfig::Memory {
        snapshot: Some(path.clone()),
    };

    {
        let space = config.open().unwrap();
        bootstrap(space.as_ref()).unwrap();
        space.flush().unwrap();
    }
    assert!(path.exists());

    let space = config.open().unwrap();
    assert_eq!(
        bootstrap(space.as_ref()).unwrap(),
        BootstrapOutcome::AlreadyBootstrapped
    );
}

#[test]
fn test_truncated_snapshot_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("space.bin");
    {
        let space = MemorySpace::with_path(&path);
        bootstrap(&space).unwrap();
        space.save().unwrap();
    }
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(MemorySpace::load(&path), Err(SpaceError::Snapshot(_))));
}

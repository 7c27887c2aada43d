//! Backend equivalence: one scripted session, identical observations

use anoi::{
    bootstrap, MemorySpace, MemoryStore, Namespace, RemoteSpace, Reserved, Space, SpaceError,
    Uid, NIL,
};

/// What a caller can observe from one operation
#[derive(Debug, PartialEq, Eq)]
enum Observation {
    Uid(Uid),
    Uids(Vec<Uid>),
    Flag(bool),
    Done,
    Text(String),
    Error(String),
}

fn observe<T>(result: Result<T, SpaceError>, f: impl FnOnce(T) -> Observation) -> Observation {
    match result {
        Ok(v) => f(v),
        Err(SpaceError::InvalidIdentifier(uid)) => Observation::Error(format!("invalid {}", uid)),
        Err(SpaceError::UnsupportedInput(_)) => Observation::Error("unsupported".to_string()),
        Err(e) => Observation::Error(format!("other: {}", e)),
    }
}

fn script(space: &dyn Space) -> Vec<Observation> {
    let mut log = Vec::new();

    let a = space.allocate().unwrap();
    let b = space.allocate().unwrap();
    log.push(Observation::Uid(a));
    log.push(Observation::Uid(b));

    // Content
    log.push(observe(space.get_content(a), Observation::Uids));
    log.push(observe(space.set_content(a, &[Uid::from('h'), b, NIL]), |_| Observation::Done));
    log.push(observe(space.get_content(a), Observation::Uids));
    log.push(observe(space.set_content(a, &[]), |_| Observation::Done));
    log.push(observe(space.get_content(a), Observation::Uids));

    // Edges
    log.push(observe(space.cross(a, b), Observation::Uid));
    log.push(observe(space.set_cross(a, b, Uid::from('x')), |_| Observation::Done));
    log.push(observe(space.cross(a, b), Observation::Uid));
    log.push(observe(space.cross_equals(a, Reserved::Type.uid(), Some(b)), Observation::Uid));
    log.push(observe(space.cross_or_insert(a, b, Uid::from('y')), Observation::Uid));
    log.push(observe(space.cross_or_insert(b, a, Uid::from('y')), Observation::Uid));
    log.push(observe(space.cross_or_insert(b, Uid::from('z'), NIL), Observation::Uid));
    log.push(observe(space.get_keys(a), |k| Observation::Uids(k.into_iter().collect())));
    log.push(observe(space.set_cross(a, b, NIL), |_| Observation::Done));
    log.push(observe(space.get_keys(a), |k| Observation::Uids(k.into_iter().collect())));
    log.push(observe(space.cross_or_allocate(b, Uid::from('c')), |u| {
        Observation::Flag(space.is_valid(u).unwrap_or(false))
    }));

    // Validity
    let ghost = Uid::new(b.get() + 100);
    log.push(observe(space.is_valid(ghost), Observation::Flag));
    log.push(observe(space.is_valid(Uid::from('q')), Observation::Flag));
    log.push(observe(space.is_valid(Uid::new(Reserved::Type.uid().get() + 50)), Observation::Flag));
    log.push(observe(space.get_content(ghost), Observation::Uids));
    log.push(observe(space.cross(a, ghost), Observation::Uid));
    log.push(observe(space.set_cross(a, Uid::from('k'), ghost), |_| Observation::Done));

    // Namespaces on top
    log.push(observe(bootstrap(space), |o| Observation::Text(format!("{:?}", o))));
    let ns = Namespace::default_for(space).unwrap();
    let apple = ns.get_name("apple").unwrap();
    log.push(observe(ns.get_name("apple"), |u| Observation::Flag(u == apple)));
    log.push(observe(ns.lookup("pear"), |u| Observation::Flag(u.is_some())));
    log.push(observe(ns.names(), |names| {
        Observation::Text(format!("{:?}", names.into_iter().map(|(n, _)| n).collect::<Vec<_>>()))
    }));
    log.push(observe(ns.name_of(apple), |n| Observation::Text(format!("{:?}", n))));

    log
}

#[test]
fn test_backends_observe_identically() {
    let memory = MemorySpace::new();
    let remote = RemoteSpace::new(MemoryStore::new(), "equivalence");
    let expected = script(&memory);
    let actual = script(&remote);
    assert_eq!(expected.len(), actual.len());
    for (i, (m, r)) in expected.iter().zip(&actual).enumerate() {
        assert_eq!(m, r, "step {} diverged", i);
    }
}

#[test]
fn test_two_remote_clients_share_state() {
    let store = MemoryStore::new();
    let first = RemoteSpace::new(store.clone(), "shared");
    let second = RemoteSpace::new(store, "shared");
    bootstrap(&first).unwrap();

    let apple = Namespace::default_for(&first)
        .unwrap()
        .get_name("apple")
        .unwrap();
    let seen = Namespace::default_for(&second)
        .unwrap()
        .lookup("apple")
        .unwrap();
    assert_eq!(seen, Some(apple));
    assert!(second.is_valid(apple).unwrap());
}

//! Proptest generators for anoi data structures
//!
//! Provides `Strategy` implementations for generating text, names and UID
//! sequences, plus a helper that builds every backend for equivalence tests.

#![allow(dead_code)]

use anoi::space::{MemorySpace, MemoryStore, RemoteSpace, Space};
use anoi::{bootstrap, Uid};
use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Text Generation
// ============================================================================

/// Arbitrary text, including control characters and astral code points
pub fn arb_text() -> impl Strategy<Value = String> {
    vec(any::<char>(), 0..24).prop_map(String::from_iter)
}

/// A human-readable name (may contain spaces)
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 _-]{0,11}".prop_map(String::from)
}

/// Between 1 and `max` names, duplicates allowed
pub fn arb_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    vec(arb_name(), 1..=max)
}

// ============================================================================
// UID Generation
// ============================================================================

/// A UID in the character plane (always valid, never NIL)
pub fn arb_char_uid() -> impl Strategy<Value = Uid> {
    any::<char>().prop_map(Uid::from)
}

/// A content vector of character UIDs
pub fn arb_content() -> impl Strategy<Value = Vec<Uid>> {
    vec(arb_char_uid(), 0..16)
}

/// A sequence of (key, value) edge writes
pub fn arb_edge_writes() -> impl Strategy<Value = Vec<(Uid, Uid)>> {
    vec((arb_char_uid(), arb_char_uid()), 0..12)
}

// ============================================================================
// Backends
// ============================================================================

/// One fresh space per backend, labelled for failure messages
pub fn backends() -> Vec<(&'static str, Box<dyn Space>)> {
    vec![
        ("memory", Box::new(MemorySpace::new())),
        (
            "remote",
            Box::new(RemoteSpace::new(MemoryStore::new(), "test")),
        ),
    ]
}

/// Like [`backends`], but each space is already bootstrapped
pub fn bootstrapped_backends() -> Vec<(&'static str, Box<dyn Space>)> {
    let spaces = backends();
    for (_, space) in &spaces {
        bootstrap(space.as_ref()).unwrap();
    }
    spaces
}

//! Tries stored in a space.
//!
//! A trie is a convention, not a separate structure: a node is any UID, its
//! edge table maps a branch label to the child node, and the
//! [`Reserved::Terminal`] key holds the payload for the path ending there.
//! Reserved UIDs are never branch labels, so other metadata (such as a
//! `NAME` edge) can share a node's edge table.
//!
//! Insertion publishes every new node with `cross_or_insert` before
//! descending into it, so concurrent inserters converge on one node per
//! prefix and never observe a half-built path.

use tracing::debug;

use crate::error::{Result, SpaceError};
use crate::id::{Reserved, Uid, NIL};
use crate::space::Space;

/// The payload key of every trie node.
pub const TERMINAL: Uid = Reserved::Terminal.uid();

/// A path of branch labels paired with its payload.
pub type Entry = (Vec<Uid>, Uid);

pub struct Trie<'a, S: Space + ?Sized> {
    space: &'a S,
    root: Uid,
}

impl<'a, S: Space + ?Sized> Clone for Trie<'a, S> {
    fn clone(&self) -> Self {
        Self {
            space: self.space,
            root: self.root,
        }
    }
}

impl<'a, S: Space + ?Sized> Trie<'a, S> {
    /// A trie rooted at `root`. Any valid UID can serve as a root; an
    /// untouched one is an empty trie.
    pub fn new(space: &'a S, root: Uid) -> Self {
        Self { space, root }
    }

    pub fn root(&self) -> Uid {
        self.root
    }

    pub fn space(&self) -> &'a S {
        self.space
    }

    /// The node a path leads to, or NIL if some edge along it is missing.
    pub fn node(&self, path: &[Uid]) -> Result<Uid> {
        let mut node = self.root;
        for &label in path {
            check_label(label)?;
            node = self.space.cross(node, label)?;
            if node.is_nil() {
                return Ok(NIL);
            }
        }
        Ok(node)
    }

    /// The payload stored under `path`, or NIL if absent.
    pub fn lookup(&self, path: &[Uid]) -> Result<Uid> {
        match self.node(path)? {
            node if node.is_nil() => Ok(NIL),
            node => self.space.cross(node, TERMINAL),
        }
    }

    /// Store `payload` under `path`, replacing any previous payload.
    pub fn insert(&self, path: &[Uid], payload: Uid) -> Result<()> {
        let node = self.descend_or_create(path)?;
        self.space.set_cross(node, TERMINAL, payload)
    }

    /// Return the payload under `path`, or publish the one produced by `make`
    /// if there is none. When several callers race on the same absent path
    /// exactly one payload wins and every caller gets it back; `make` may
    /// still have run in the losing callers.
    pub fn get_or_insert_with<F>(&self, path: &[Uid], make: F) -> Result<Uid>
    where
        F: FnOnce() -> Result<Uid>,
    {
        let existing = self.lookup(path)?;
        if !existing.is_nil() {
            return Ok(existing);
        }
        let node = self.descend_or_create(path)?;
        let candidate = make()?;
        self.space.cross_or_insert(node, TERMINAL, candidate)
    }

    /// Every (path, payload) pair, depth first, shorter paths before their
    /// extensions and siblings in label order.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        // One frame per node on the current path: the node and its unvisited
        // labels, reversed so that `pop` yields them in order
        let mut stack = vec![(self.root, self.visit(self.root, &path, &mut out)?)];
        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            match pending.pop() {
                Some(label) => {
                    let child = self.space.cross(node, label)?;
                    path.push(label);
                    let labels = self.visit(child, &path, &mut out)?;
                    stack.push((child, labels));
                }
                None => {
                    stack.pop();
                    path.pop();
                }
            }
        }
        Ok(out)
    }

    /// Record the payload at `node`, if any, and return its branch labels in
    /// reverse order.
    fn visit(&self, node: Uid, path: &[Uid], out: &mut Vec<Entry>) -> Result<Vec<Uid>> {
        let keys = self.space.get_keys(node)?;
        if keys.contains(&TERMINAL) {
            out.push((path.to_vec(), self.space.cross(node, TERMINAL)?));
        }
        Ok(keys.into_iter().rev().filter(|k| !k.is_reserved()).collect())
    }

    fn descend_or_create(&self, path: &[Uid]) -> Result<Uid> {
        let mut node = self.root;
        for &label in path {
            check_label(label)?;
            let child = self.space.cross_or_allocate(node, label)?;
            debug!(parent = %node, %label, %child, "trie step");
            node = child;
        }
        Ok(node)
    }
}

fn check_label(label: Uid) -> Result<()> {
    if label.is_reserved() {
        Err(SpaceError::unsupported(format!(
            "reserved UID {:?} cannot be a trie label",
            label
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::string_to_uid_vector;
    use crate::space::MemorySpace;

    fn path(s: &str) -> Vec<Uid> {
        string_to_uid_vector(s)
    }

    #[test]
    fn test_insert_then_lookup() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);
        let payload = space.allocate().unwrap();

        trie.insert(&path("cat"), payload).unwrap();
        assert_eq!(trie.lookup(&path("cat")).unwrap(), payload);
        assert_eq!(trie.lookup(&path("ca")).unwrap(), NIL);
        assert_eq!(trie.lookup(&path("cats")).unwrap(), NIL);
        assert_eq!(trie.lookup(&path("dog")).unwrap(), NIL);
    }

    #[test]
    fn test_shared_prefix_allocates_once() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);

        trie.insert(&path("car"), Uid::from('1')).unwrap();
        let after_first = space.allocated_count();
        trie.insert(&path("cat"), Uid::from('2')).unwrap();
        // Only the final 't' node is new
        assert_eq!(space.allocated_count(), after_first + 1);

        trie.insert(&path("car"), Uid::from('3')).unwrap();
        assert_eq!(space.allocated_count(), after_first + 1);
        assert_eq!(trie.lookup(&path("car")).unwrap(), Uid::from('3'));
    }

    #[test]
    fn test_empty_path_is_root_payload() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);
        trie.insert(&[], Uid::from('e')).unwrap();
        assert_eq!(space.cross(root, TERMINAL).unwrap(), Uid::from('e'));
        assert_eq!(trie.lookup(&[]).unwrap(), Uid::from('e'));
    }

    #[test]
    fn test_get_or_insert_with_keeps_first() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);

        let first = trie
            .get_or_insert_with(&path("x"), || Ok(Uid::from('1')))
            .unwrap();
        let second = trie
            .get_or_insert_with(&path("x"), || panic!("must not be called on a hit"))
            .unwrap();
        assert_eq!(first, Uid::from('1'));
        assert_eq!(second, first);
    }

    #[test]
    fn test_entries_order() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);
        for (word, ch) in [("b", 'B'), ("ab", 'X'), ("a", 'A')] {
            trie.insert(&path(word), Uid::from(ch)).unwrap();
        }
        // Metadata on the root must not show up as a branch
        space
            .set_cross(root, Reserved::Name.uid(), Uid::from('n'))
            .unwrap();

        let entries = trie.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                (path("a"), Uid::from('A')),
                (path("ab"), Uid::from('X')),
                (path("b"), Uid::from('B')),
            ]
        );
    }

    #[test]
    fn test_entries_of_very_long_path() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);
        let long = path(&"a".repeat(100_000));
        trie.insert(&long, Uid::from('L')).unwrap();
        trie.insert(&path("b"), Uid::from('B')).unwrap();

        let entries = trie.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.len(), 100_000);
        assert_eq!(entries[0].1, Uid::from('L'));
        assert_eq!(entries[1], (path("b"), Uid::from('B')));
    }

    #[test]
    fn test_reserved_label_rejected() {
        let space = MemorySpace::new();
        let root = space.allocate().unwrap();
        let trie = Trie::new(&space, root);
        assert!(matches!(
            trie.insert(&[TERMINAL], Uid::from('a')),
            Err(SpaceError::UnsupportedInput(_))
        ));
    }
}

//! Namespaces: interning human-readable names into UIDs.
//!
//! Every namespace is a trie whose root node is itself the payload of the
//! namespace's name in the root trie ([`Reserved::Root`]). Names are spelled
//! as character UIDs, so the trie branches one character at a time.
//!
//! A UID minted by a namespace carries a [`Reserved::Name`] edge to a node
//! whose contents spell the name, which makes the mapping reversible.

use tracing::debug;

use crate::bootstrap::is_bootstrapped;
use crate::codec::{string_to_uid_vector, uid_vector_to_string};
use crate::error::{Result, SpaceError};
use crate::id::{Reserved, Uid};
use crate::space::Space;
use crate::trie::Trie;

/// The namespace collaborators use when they have no better choice.
pub const DEFAULT_NAMESPACE: &str = "default";

pub struct Namespace<'a, S: Space + ?Sized> {
    name: String,
    trie: Trie<'a, S>,
}

impl<'a, S: Space + ?Sized> Clone for Namespace<'a, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            trie: self.trie.clone(),
        }
    }
}

impl<'a, S: Space + ?Sized> Namespace<'a, S> {
    /// Open (creating on first use) the namespace called `name`.
    ///
    /// Fails with `NotBootstrapped` if the space has no root trie yet.
    pub fn open(space: &'a S, name: &str) -> Result<Self> {
        if !is_bootstrapped(space)? {
            return Err(SpaceError::NotBootstrapped);
        }
        let roots = Trie::new(space, Reserved::Root.uid());
        let root = roots.get_or_insert_with(&string_to_uid_vector(name), || mint(space, name))?;
        Ok(Self {
            name: name.to_string(),
            trie: Trie::new(space, root),
        })
    }

    /// The namespace called `name` if it exists. Never writes.
    pub fn find(space: &'a S, name: &str) -> Result<Option<Self>> {
        if !is_bootstrapped(space)? {
            return Err(SpaceError::NotBootstrapped);
        }
        let root = Trie::new(space, Reserved::Root.uid()).lookup(&string_to_uid_vector(name))?;
        if root.is_nil() {
            return Ok(None);
        }
        Ok(Some(Self {
            name: name.to_string(),
            trie: Trie::new(space, root),
        }))
    }

    /// Open the [`DEFAULT_NAMESPACE`].
    pub fn default_for(space: &'a S) -> Result<Self> {
        Self::open(space, DEFAULT_NAMESPACE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace's own UID (the root of its trie).
    pub fn uid(&self) -> Uid {
        self.trie.root()
    }

    pub fn space(&self) -> &'a S {
        self.trie.space()
    }

    /// Intern `text`: the UID already bound to it, or a freshly minted one.
    ///
    /// Concurrent callers interning the same unseen name all receive the same
    /// UID.
    pub fn get_name(&self, text: &str) -> Result<Uid> {
        let space = self.space();
        self.trie
            .get_or_insert_with(&string_to_uid_vector(text), || mint(space, text))
    }

    /// The UID bound to `text`, without interning it.
    pub fn lookup(&self, text: &str) -> Result<Option<Uid>> {
        let uid = self.trie.lookup(&string_to_uid_vector(text))?;
        Ok((!uid.is_nil()).then_some(uid))
    }

    /// The name `uid` is bound to in this namespace, if any.
    pub fn name_of(&self, uid: Uid) -> Result<Option<String>> {
        match name_of(self.space(), uid)? {
            Some(name) if self.lookup(&name)? == Some(uid) => Ok(Some(name)),
            _ => Ok(None),
        }
    }

    /// Every (name, UID) pair in the namespace, sorted by name code points.
    pub fn names(&self) -> Result<Vec<(String, Uid)>> {
        self.trie
            .entries()?
            .into_iter()
            .map(|(path, uid)| Ok((uid_vector_to_string(&path)?, uid)))
            .collect()
    }
}

/// Allocate a UID for `text` and attach its spelling. The node is complete
/// before the caller publishes it in a trie.
fn mint<S: Space + ?Sized>(space: &S, text: &str) -> Result<Uid> {
    let uid = space.allocate()?;
    let spelling = space.allocate()?;
    space.set_content(spelling, &string_to_uid_vector(text))?;
    space.set_cross(uid, Reserved::Name.uid(), spelling)?;
    debug!(%uid, name = text, "minted");
    Ok(uid)
}

/// The name attached to `uid` via its `NAME` edge, if any.
pub fn name_of<S: Space + ?Sized>(space: &S, uid: Uid) -> Result<Option<String>> {
    let spelling = space.cross(uid, Reserved::Name.uid())?;
    if spelling.is_nil() {
        return Ok(None);
    }
    uid_vector_to_string(&space.get_content(spelling)?).map(Some)
}

/// A short human-readable label: the character itself, the reserved name, the
/// attached name, or the hex value.
pub fn label<S: Space + ?Sized>(space: &S, uid: Uid) -> Result<String> {
    if let Some(ch) = uid.as_char().filter(|c| !c.is_control() && !c.is_whitespace()) {
        return Ok(ch.to_string());
    }
    if let Some(reserved) = Reserved::from_uid(uid) {
        return Ok(reserved.name().to_string());
    }
    if space.is_valid(uid)? {
        if let Some(name) = name_of(space, uid)? {
            return Ok(name);
        }
    }
    Ok(uid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::bootstrap;
    use crate::space::MemorySpace;

    fn space() -> MemorySpace {
        let space = MemorySpace::new();
        bootstrap(&space).unwrap();
        space
    }

    #[test]
    fn test_requires_bootstrap() {
        let space = MemorySpace::new();
        assert!(matches!(
            Namespace::open(&space, "x"),
            Err(SpaceError::NotBootstrapped)
        ));
    }

    #[test]
    fn test_find_does_not_create() {
        let space = space();
        let before = space.allocated_count();
        assert!(Namespace::find(&space, "absent").unwrap().is_none());
        assert_eq!(space.allocated_count(), before);

        let opened = Namespace::open(&space, "present").unwrap();
        let found = Namespace::find(&space, "present").unwrap().unwrap();
        assert_eq!(found.uid(), opened.uid());
    }

    #[test]
    fn test_get_name_idempotent() {
        let space = space();
        let ns = Namespace::default_for(&space).unwrap();
        let a = ns.get_name("apple").unwrap();
        assert_eq!(ns.get_name("apple").unwrap(), a);
        assert_ne!(ns.get_name("orange").unwrap(), a);
        assert!(space.get_content(a).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_same_namespace() {
        let space = space();
        let first = Namespace::open(&space, "words").unwrap();
        let uid = first.get_name("tree").unwrap();
        let again = Namespace::open(&space, "words").unwrap();
        assert_eq!(again.uid(), first.uid());
        assert_eq!(again.lookup("tree").unwrap(), Some(uid));
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let space = space();
        let a = Namespace::open(&space, "a").unwrap();
        let b = Namespace::open(&space, "b").unwrap();
        assert_ne!(a.uid(), b.uid());
        let in_a = a.get_name("same").unwrap();
        let in_b = b.get_name("same").unwrap();
        assert_ne!(in_a, in_b);
        assert_eq!(a.name_of(in_b).unwrap(), None);
        assert_eq!(b.name_of(in_b).unwrap().as_deref(), Some("same"));
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let space = space();
        let ns = Namespace::default_for(&space).unwrap();
        let before = space.allocated_count();
        assert_eq!(ns.lookup("ghost").unwrap(), None);
        assert_eq!(space.allocated_count(), before);
    }

    #[test]
    fn test_empty_name() {
        let space = space();
        let ns = Namespace::default_for(&space).unwrap();
        let empty = ns.get_name("").unwrap();
        assert_eq!(ns.get_name("").unwrap(), empty);
        assert_eq!(ns.name_of(empty).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_names_listing() {
        let space = space();
        let ns = Namespace::open(&space, "fruit").unwrap();
        let pear = ns.get_name("pear").unwrap();
        let peach = ns.get_name("peach").unwrap();
        let names = ns.names().unwrap();
        assert_eq!(
            names,
            vec![("peach".to_string(), peach), ("pear".to_string(), pear)]
        );
    }

    #[test]
    fn test_long_name_listing() {
        let space = space();
        let ns = Namespace::open(&space, "long").unwrap();
        let name = "x".repeat(100_000);
        let uid = ns.get_name(&name).unwrap();
        assert_eq!(ns.names().unwrap(), vec![(name, uid)]);
    }

    #[test]
    fn test_label() {
        let space = space();
        let ns = Namespace::default_for(&space).unwrap();
        let uid = ns.get_name("idea").unwrap();
        assert_eq!(label(&space, Uid::from('λ')).unwrap(), "λ");
        assert_eq!(label(&space, Reserved::Nil.uid()).unwrap(), "NIL");
        assert_eq!(label(&space, uid).unwrap(), "idea");
        assert_eq!(label(&space, Uid::from('\n')).unwrap(), "0xa");
        let ghost = Uid::allocated(1_000_000);
        assert_eq!(label(&space, ghost).unwrap(), ghost.to_string());
    }
}

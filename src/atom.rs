//! Atoms: a cached, editable view of one UID.
//!
//! An [`Atom`] holds a local copy of a UID's contents and properties (its
//! edges). Edits stay local until [`Atom::store`] writes them back. Arguments
//! are [`Term`]s, so callers can mix raw UIDs with names that are interned
//! through the atom's namespace.

use indexmap::IndexMap;

use crate::codec::string_to_uid_vector;
use crate::error::{Result, SpaceError};
use crate::id::Uid;
use crate::namespace::Namespace;
use crate::space::Space;

/// Something that resolves to a UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Uid(Uid),
    /// Interned through a namespace on resolution
    Name(String),
}

impl Term {
    /// Parse a token: `0x1f` (hex) or `#31` (decimal) is a UID, a quoted or
    /// bare word is a name.
    pub fn parse(token: &str) -> Result<Term> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SpaceError::unsupported("empty term"));
        }
        if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16)
                .map(|raw| Term::Uid(Uid::new(raw)))
                .map_err(|_| SpaceError::unsupported(format!("bad hex UID '{}'", token)));
        }
        if let Some(dec) = token.strip_prefix('#') {
            return dec
                .parse::<u64>()
                .map(|raw| Term::Uid(Uid::new(raw)))
                .map_err(|_| SpaceError::unsupported(format!("bad decimal UID '{}'", token)));
        }
        let unquoted = token
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(token);
        Ok(Term::Name(unquoted.to_string()))
    }

    /// Resolve to a UID: raw UIDs are checked, names are interned.
    pub fn resolve<S: Space + ?Sized>(&self, namespace: &Namespace<'_, S>) -> Result<Uid> {
        match self {
            Term::Uid(uid) => {
                namespace.space().check(*uid)?;
                Ok(*uid)
            }
            Term::Name(name) => namespace.get_name(name),
        }
    }
}

impl From<Uid> for Term {
    fn from(uid: Uid) -> Self {
        Term::Uid(uid)
    }
}

impl From<&str> for Term {
    fn from(name: &str) -> Self {
        Term::Name(name.to_string())
    }
}

impl From<String> for Term {
    fn from(name: String) -> Self {
        Term::Name(name)
    }
}

impl<S: Space + ?Sized> From<&Atom<'_, S>> for Term {
    fn from(atom: &Atom<'_, S>) -> Self {
        Term::Uid(atom.uid)
    }
}

pub struct Atom<'a, S: Space + ?Sized> {
    uid: Uid,
    namespace: Namespace<'a, S>,
    contents: Option<Vec<Uid>>,
    properties: Option<IndexMap<Uid, Uid>>,
}

impl<'a, S: Space + ?Sized> Atom<'a, S> {
    /// A fresh atom on a newly allocated UID.
    pub fn new(namespace: Namespace<'a, S>) -> Result<Self> {
        let uid = namespace.space().allocate()?;
        Ok(Self::unloaded(uid, namespace))
    }

    /// An atom viewing an existing UID.
    pub fn open(uid: Uid, namespace: Namespace<'a, S>) -> Result<Self> {
        namespace.space().check(uid)?;
        Ok(Self::unloaded(uid, namespace))
    }

    fn unloaded(uid: Uid, namespace: Namespace<'a, S>) -> Self {
        Self {
            uid,
            namespace,
            contents: None,
            properties: None,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn contents(&self) -> Option<&[Uid]> {
        self.contents.as_deref()
    }

    pub fn properties(&self) -> Option<&IndexMap<Uid, Uid>> {
        self.properties.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some() && self.properties.is_some()
    }

    /// Replace the local copy with what the space holds.
    pub fn load(&mut self) -> Result<()> {
        let space = self.namespace.space();
        let contents = space.get_content(self.uid)?;
        let properties = space
            .get_keys(self.uid)?
            .into_iter()
            .map(|key| Ok((key, space.cross(self.uid, key)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        self.contents = Some(contents);
        self.properties = Some(properties);
        Ok(())
    }

    /// Write the local copy back: contents first, then each property.
    /// Edges present in the space but missing locally are left alone.
    pub fn store(&self) -> Result<()> {
        let (Some(contents), Some(properties)) = (&self.contents, &self.properties) else {
            return Err(SpaceError::unsupported(format!(
                "atom {} has nothing to store; load or build it first",
                self.uid
            )));
        };
        let space = self.namespace.space();
        space.set_content(self.uid, contents)?;
        for (&key, &value) in properties {
            space.set_cross(self.uid, key, value)?;
        }
        Ok(())
    }

    /// Replace the local copy with resolved terms.
    pub fn build<C, P>(&mut self, contents: C, properties: P) -> Result<()>
    where
        C: IntoIterator<Item = Term>,
        P: IntoIterator<Item = (Term, Term)>,
    {
        let (contents, properties) = self.resolve_all(contents, properties)?;
        self.contents = Some(contents);
        self.properties = Some(properties);
        Ok(())
    }

    /// Extend the contents and merge the properties (new values win).
    pub fn append<C, P>(&mut self, contents: C, properties: P) -> Result<()>
    where
        C: IntoIterator<Item = Term>,
        P: IntoIterator<Item = (Term, Term)>,
    {
        if !self.is_loaded() {
            return Err(SpaceError::unsupported(format!(
                "atom {} must be loaded or built before appending",
                self.uid
            )));
        }
        let (tail, updates) = self.resolve_all(contents, properties)?;
        if let Some(existing) = self.contents.as_mut() {
            existing.extend(tail);
        }
        if let Some(existing) = self.properties.as_mut() {
            existing.extend(updates);
        }
        Ok(())
    }

    /// Make the contents spell `text`, leaving properties untouched.
    pub fn set_contents_from_str(&mut self, text: &str) {
        self.contents = Some(string_to_uid_vector(text));
        self.properties.get_or_insert_with(IndexMap::new);
    }

    fn resolve_all<C, P>(&self, contents: C, properties: P) -> Result<(Vec<Uid>, IndexMap<Uid, Uid>)>
    where
        C: IntoIterator<Item = Term>,
        P: IntoIterator<Item = (Term, Term)>,
    {
        let contents = contents
            .into_iter()
            .map(|term| term.resolve(&self.namespace))
            .collect::<Result<Vec<_>>>()?;
        let properties = properties
            .into_iter()
            .map(|(key, value)| Ok((key.resolve(&self.namespace)?, value.resolve(&self.namespace)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok((contents, properties))
    }
}

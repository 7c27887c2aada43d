//! Type registry.
//!
//! Types are ordinary UIDs interned in the `TYPES` namespace. A UID's type is
//! recorded as its [`Reserved::Type`] edge.

use crate::error::Result;
use crate::id::{Reserved, Uid};
use crate::namespace::Namespace;
use crate::space::Space;

pub const TYPES_NAMESPACE: &str = "TYPES";

/// Types every registry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    /// Contents spell text in the character plane
    String,
    /// Contents are an arbitrary UID sequence
    Vector,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 2] = [BuiltinType::String, BuiltinType::Vector];

    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::String => "STRING",
            BuiltinType::Vector => "VECTOR",
        }
    }
}

pub struct TypeRegistry<'a, S: Space + ?Sized> {
    namespace: Namespace<'a, S>,
}

impl<'a, S: Space + ?Sized> TypeRegistry<'a, S> {
    /// Open the registry, interning the builtin types on first use.
    pub fn open(space: &'a S) -> Result<Self> {
        let namespace = Namespace::open(space, TYPES_NAMESPACE)?;
        for builtin in BuiltinType::ALL {
            namespace.get_name(builtin.name())?;
        }
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &Namespace<'a, S> {
        &self.namespace
    }

    /// The UID of type `name`, registering it if new.
    pub fn get(&self, name: &str) -> Result<Uid> {
        self.namespace.get_name(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Option<Uid>> {
        self.namespace.lookup(name)
    }

    pub fn builtin(&self, ty: BuiltinType) -> Result<Uid> {
        self.namespace.get_name(ty.name())
    }

    /// Record `ty` as the type of `uid`.
    pub fn assign(&self, uid: Uid, ty: Uid) -> Result<()> {
        self.namespace
            .space()
            .set_cross(uid, Reserved::Type.uid(), ty)
    }

    /// The type of `uid`, or NIL if it has none.
    pub fn type_of(&self, uid: Uid) -> Result<Uid> {
        self.namespace.space().cross(uid, Reserved::Type.uid())
    }
}

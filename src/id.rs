//! ID types for anoi
//!
//! Every datum is addressed by one integer, the [`Uid`]. The integer line is
//! split into three bands that are identical in every backend:
//!
//! - the character plane `[0, 0x110000)`: one UID per Unicode code point, so a
//!   string is just a content vector of character UIDs
//! - the reserved block `[0x110000, 0x110100)`: fixed UIDs with system-wide
//!   meaning, enumerated by [`Reserved`]
//! - allocated UIDs, from [`FIRST_ALLOCATED`] upward, handed out by a backend

use std::fmt;

use crate::error::{Result, SpaceError};

/// One past the largest Unicode code point.
pub const CHAR_PLANE_END: u64 = 0x11_0000;

/// First UID of the reserved block.
pub const RESERVED_BASE: u64 = CHAR_PLANE_END;

/// Size of the reserved block. Only the members of [`Reserved`] are valid;
/// the rest of the block is held back for future reserved members.
pub const RESERVED_BLOCK: u64 = 0x100;

/// The first UID any backend allocator hands out.
pub const FIRST_ALLOCATED: u64 = RESERVED_BASE + RESERVED_BLOCK;

/// The integer address of a node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(u64);

impl Uid {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Uid(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The n-th allocated UID (0-based).
    #[inline]
    pub const fn allocated(n: u64) -> Self {
        Uid(FIRST_ALLOCATED + n)
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self == NIL
    }

    /// True for UIDs in the character plane (including surrogates).
    #[inline]
    pub fn is_char_plane(self) -> bool {
        self.0 < CHAR_PLANE_END
    }

    /// The character this UID denotes, if it is a Unicode scalar value.
    pub fn as_char(self) -> Option<char> {
        u32::try_from(self.0).ok().and_then(char::from_u32)
    }

    pub fn is_reserved(self) -> bool {
        Reserved::from_uid(self).is_some()
    }

    /// True for UIDs that are valid in every backend without allocation.
    pub fn is_intrinsic(self) -> bool {
        self.is_char_plane() || self.is_reserved()
    }

    /// True if this UID lies in the band backends allocate from.
    #[inline]
    pub fn in_allocated_band(self) -> bool {
        self.0 >= FIRST_ALLOCATED
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Reserved::from_uid(*self) {
            Some(r) => write!(f, "Uid({})", r.name()),
            None => write!(f, "Uid({:#x})", self.0),
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<char> for Uid {
    fn from(ch: char) -> Self {
        Uid(ch as u64)
    }
}

impl From<Reserved> for Uid {
    fn from(r: Reserved) -> Self {
        r.uid()
    }
}

impl TryFrom<i64> for Uid {
    type Error = SpaceError;

    fn try_from(raw: i64) -> Result<Self> {
        u64::try_from(raw)
            .map(Uid)
            .map_err(|_| SpaceError::unsupported(format!("negative value {} is not a UID", raw)))
    }
}

/// Reserved UIDs: fixed, backend-independent, never allocated.
///
/// The discriminant is the offset into the reserved block, so the numeric
/// value of a member never changes once published.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reserved {
    /// Absent value or edge.
    Nil = 0,
    /// The root trie node; named namespaces hang off it.
    Root = 1,
    /// Edge key under which a trie node stores its payload.
    Terminal = 2,
    /// Edge key on `Root` marking a completed bootstrap.
    Bootstrapped = 3,
    /// Edge key from a UID to the node whose contents spell its name.
    Name = 4,
    /// Edge key from a UID to its type.
    Type = 5,
}

pub const NIL: Uid = Reserved::Nil.uid();

impl Reserved {
    pub const ALL: [Reserved; 6] = [
        Reserved::Nil,
        Reserved::Root,
        Reserved::Terminal,
        Reserved::Bootstrapped,
        Reserved::Name,
        Reserved::Type,
    ];

    #[inline]
    pub const fn uid(self) -> Uid {
        Uid(RESERVED_BASE + self as u64)
    }

    pub fn from_uid(uid: Uid) -> Option<Self> {
        let offset = uid.0.checked_sub(RESERVED_BASE)?;
        Self::ALL.get(usize::try_from(offset).ok()?).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reserved::Nil => "NIL",
            Reserved::Root => "ROOT",
            Reserved::Terminal => "TERMINAL",
            Reserved::Bootstrapped => "BOOTSTRAPPED",
            Reserved::Name => "NAME",
            Reserved::Type => "TYPE",
        }
    }
}

//! Anoi: a content-addressable graph storage substrate
//!
//! Everything in an anoi space is a UID. A UID carries an ordered content
//! vector of other UIDs and a sparse table of edges (key UID to value UID).
//! Characters are UIDs too, so text is just content in the character plane.
//!
//! On top of that substrate the crate builds tries over UID sequences,
//! namespaces that intern human-readable names, and a bootstrap step that
//! installs a space's own metadata. Storage is pluggable through the
//! [`Space`] trait, with an in-process backend and a networked one.

pub mod atom;
pub mod bootstrap;
pub mod codec;
pub mod config;
pub mod error;
pub mod id;
pub mod namespace;
pub mod repl;
pub mod space;
pub mod trie;
pub mod types;

pub use atom::{Atom, Term};
pub use bootstrap::{bootstrap, is_bootstrapped, BootstrapOutcome};
pub use codec::{string_to_uid_vector, uid_vector_to_string};
pub use config::SpaceConfig;
pub use error::{Result, SpaceError};
pub use id::{Reserved, Uid, NIL};
pub use namespace::{label, name_of, Namespace, DEFAULT_NAMESPACE};
pub use space::{KeyValueStore, MemorySpace, MemoryStore, RedisStore, RemoteSpace, Space};
pub use trie::{Trie, TERMINAL};
pub use types::{BuiltinType, TypeRegistry};

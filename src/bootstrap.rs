//! Installing a space's own metadata.
//!
//! The root trie cannot be allocated through a namespace, since namespaces
//! live inside it. It is therefore the reserved [`Reserved::Root`] node, which
//! exists in every backend without allocation, and bootstrap only has to
//! populate metadata around it:
//!
//! 1. every reserved member except NIL gets a `NAME` edge spelling its name
//! 2. the root is marked with a [`Reserved::Bootstrapped`] edge
//!
//! Both phases are idempotent and publish with `cross_or_insert`, so two
//! processes bootstrapping the same fresh backend converge. The marker is
//! written last; a space that carries it has its reserved names installed.
//! Each caller offers its own freshly allocated marker value, so exactly one
//! of any number of racing callers sees its value published.

use tracing::{debug, info};

use crate::codec::string_to_uid_vector;
use crate::error::Result;
use crate::id::{Reserved, Uid};
use crate::space::Space;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// This call published the marker; reported to exactly one caller
    Installed,
    /// The space was already bootstrapped; nothing was written
    AlreadyBootstrapped,
}

pub fn is_bootstrapped<S: Space + ?Sized>(space: &S) -> Result<bool> {
    let marker = space.cross(Reserved::Root.uid(), Reserved::Bootstrapped.uid())?;
    Ok(!marker.is_nil())
}

/// Bring a space to the bootstrapped state. Safe to call any number of
/// times, from any number of callers.
pub fn bootstrap<S: Space + ?Sized>(space: &S) -> Result<BootstrapOutcome> {
    if is_bootstrapped(space)? {
        debug!("space already bootstrapped");
        return Ok(BootstrapOutcome::AlreadyBootstrapped);
    }

    // Phase 1: reserved names
    for reserved in Reserved::ALL {
        if reserved != Reserved::Nil {
            install_reserved_name(space, reserved)?;
        }
    }

    // Phase 2: root marker
    let token = space.allocate()?;
    let marker = space.cross_or_insert(Reserved::Root.uid(), Reserved::Bootstrapped.uid(), token)?;
    if marker != token {
        debug!(%marker, "lost bootstrap race");
        return Ok(BootstrapOutcome::AlreadyBootstrapped);
    }

    info!(%marker, "bootstrapped space");
    Ok(BootstrapOutcome::Installed)
}

fn install_reserved_name<S: Space + ?Sized>(space: &S, reserved: Reserved) -> Result<Uid> {
    let uid = reserved.uid();
    let key = Reserved::Name.uid();
    let existing = space.cross(uid, key)?;
    if !existing.is_nil() {
        return Ok(existing);
    }
    let spelling = space.allocate()?;
    space.set_content(spelling, &string_to_uid_vector(reserved.name()))?;
    space.cross_or_insert(uid, key, spelling)
}

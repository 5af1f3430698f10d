//! Capability shared by every stored entity kind.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::id::EntityKind;

/// A persisted entity with a typed identifier.
///
/// The store port is generic over this trait so that one contract serves
/// devices, rooms and users, selected at compile time.
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    /// Typed identifier.
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Kind tag used in errors, paths and topics.
    const KIND: EntityKind;

    /// Borrow the identifier.
    fn id(&self) -> &Self::Id;
}

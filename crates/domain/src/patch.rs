//! Field-by-field patch helpers.

/// Result of applying a patch: whether anything was actually written.
///
/// A patch whose supplied fields all equal the stored values is
/// [`Unchanged`](Self::Unchanged): it is not persisted, does not bump
/// `updatedAt` and emits no notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Patched<T> {
    Updated(T),
    Unchanged(T),
}

impl<T> Patched<T> {
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Borrow the resulting entity.
    #[must_use]
    pub fn get(&self) -> &T {
        match self {
            Self::Updated(value) | Self::Unchanged(value) => value,
        }
    }

    /// Discard the change marker.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Updated(value) | Self::Unchanged(value) => value,
        }
    }
}

/// Overwrite `current` with `proposed` when it is supplied and differs.
///
/// Returns `true` when a write happened.
pub fn apply<T: PartialEq>(current: &mut T, proposed: Option<T>) -> bool {
    match proposed {
        Some(value) if *current != value => {
            *current = value;
            true
        }
        _ => false,
    }
}

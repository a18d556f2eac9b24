//! Typed resource handles.
//!
//! A handle is an id plus a compile-time kind tag. Handles are freely
//! copyable; the records they name are not. The trait impls are written out
//! by hand so the payload type itself never needs `Clone` or `Debug`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::id::ResourceId;

/// Typed accessor for one registered resource of kind `T`.
pub struct Handle<T> {
    id: ResourceId,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Tags an id with kind `T`. The association is not checked here; a
    /// lookup through a mistagged handle fails with `NotFound`.
    pub fn from_id(id: ResourceId) -> Self {
        Handle {
            id,
            _kind: PhantomData,
        }
    }

    pub fn id(self) -> ResourceId {
        self.id
    }
}

impl<T> From<Handle<T>> for ResourceId {
    fn from(handle: Handle<T>) -> Self {
        handle.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

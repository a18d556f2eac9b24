//! Resource identities.
//!
//! Identities are opaque, strictly increasing, and never reused within a
//! process run. Zero is reserved as "no identity" and is unrepresentable.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Opaque id naming one registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(NonZeroU32);

impl ResourceId {
    /// Wraps a raw value. Returns `None` for zero, the reserved sentinel.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(ResourceId)
    }

    /// Raw numeric value.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identity source. One per registry.
///
/// Issued values only grow; exhausting the 32-bit space is treated as
/// unreachable rather than a recoverable condition.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator { next: 1 }
    }
}

impl IdAllocator {
    /// Issues an id strictly greater than every id issued before it.
    pub fn allocate(&mut self) -> ResourceId {
        let id = ResourceId::new(self.next).expect("identity counter at zero");
        self.next = self.next.checked_add(1).expect("identity space exhausted");
        id
    }
}

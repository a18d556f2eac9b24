//! The registry: the single authority for creating, looking up, and
//! destroying resources, and for running cascading teardown over declared
//! dependency edges.
//!
//! Ownership model:
//! - Every registered payload is owned exclusively by its record.
//! - Lookups hand out borrows bounded by the registry borrow, so a view can
//!   never outlive a later destroy of the same id.
//! - A record changes only by appending dependency edges; there is no
//!   reference counting and no implicit reclamation. `destroy` is the one
//!   removal path.
//!
//! The registry holds no global state and no internal locks. Mutation goes
//! through `&mut self`, so a single thread owns it at a time; the type is
//! `Send`, and callers wanting to share one across threads wrap it in a
//! mutex themselves. A deep cascade then holds that lock for the whole
//! teardown, which is the intended trade.

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;

use tracing::{debug, error, trace};

use crate::handle::Handle;
use crate::id::{IdAllocator, ResourceId};
use crate::store::Store;

/// Registry failures.
///
/// Every variant indicates a bug in the calling code (a double destroy, a
/// dangling edge, a dependency cycle), not a recoverable runtime condition.
/// Callers either propagate these to a fatal boundary or assert on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An insert collided with a live record. The allocator never reissues
    /// ids, so this is unreachable in correct use.
    DuplicateIdentity(ResourceId),
    /// No live record carries the id.
    NotFound(ResourceId),
    /// A record was reached again while its own teardown was in progress.
    CyclicDependency(ResourceId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateIdentity(id) => write!(f, "duplicate identity {}", id),
            RegistryError::NotFound(id) => write!(f, "no live resource {}", id),
            RegistryError::CyclicDependency(id) => {
                write!(f, "dependency cycle through resource {}", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Identity-keyed store of heterogeneous resources.
///
/// Kinds are concrete payload types; each kind gets its own bucket, so two
/// kinds never resolve each other's records. Destroying an id destroys every
/// id reachable over its dependency edges first, depth-first in registration
/// order, each exactly once, before the payload's own destructor runs.
#[derive(Default)]
pub struct Registry {
    ids: IdAllocator,
    store: Store,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new resource of kind `T` and returns its handle.
    ///
    /// The build closure receives the freshly assigned id and the registry
    /// itself, so a payload can construct and register its own dependents
    /// while it is being built. The record is inserted only after `build`
    /// returns; a half-built resource is never visible to lookups.
    pub fn create<T, F>(&mut self, build: F) -> Handle<T>
    where
        T: Any + Send + Sync,
        F: FnOnce(ResourceId, &mut Registry) -> T,
    {
        let id = self.ids.allocate();
        let payload = build(id, self);
        let inserted = self
            .store
            .insert(TypeId::of::<T>(), type_name::<T>(), id, Box::new(payload));
        assert!(inserted, "{}", RegistryError::DuplicateIdentity(id));
        debug!(id = %id, kind = type_name::<T>(), "resource created");
        Handle::from_id(id)
    }

    /// Looks up a live resource of kind `T`.
    pub fn get<T: Any + Send + Sync>(&self, handle: Handle<T>) -> Result<&T, RegistryError> {
        self.store
            .get::<T>(handle.id())
            .ok_or(RegistryError::NotFound(handle.id()))
    }

    /// Mutable variant of [`Registry::get`].
    pub fn get_mut<T: Any + Send + Sync>(
        &mut self,
        handle: Handle<T>,
    ) -> Result<&mut T, RegistryError> {
        self.store
            .get_mut::<T>(handle.id())
            .ok_or(RegistryError::NotFound(handle.id()))
    }

    /// Records `dependent` as owned by `owner` for teardown purposes.
    ///
    /// Edges are walked in registration order when the owner is destroyed.
    /// The dependent itself is not validated: in correct use it was created,
    /// and therefore exists, before being registered.
    pub fn add_dependency(
        &mut self,
        owner: impl Into<ResourceId>,
        dependent: impl Into<ResourceId>,
    ) -> Result<(), RegistryError> {
        let owner = owner.into();
        let dependent = dependent.into();
        let type_id = self
            .store
            .kind_of(owner)
            .ok_or(RegistryError::NotFound(owner))?;
        let added = self.store.add_dependency(type_id, owner, dependent);
        debug_assert!(added, "record vanished between kind scan and edge append");
        trace!(owner = %owner, dependent = %dependent, "dependency registered");
        Ok(())
    }

    /// Outgoing dependency edges of a live resource, in registration order.
    pub fn dependencies_of(
        &self,
        id: impl Into<ResourceId>,
    ) -> Result<&[ResourceId], RegistryError> {
        let id = id.into();
        let type_id = self.store.kind_of(id).ok_or(RegistryError::NotFound(id))?;
        self.store
            .dependencies(type_id, id)
            .ok_or(RegistryError::NotFound(id))
    }

    /// Destroys a resource and, transitively, everything it has registered
    /// as a dependent.
    ///
    /// Dependents go down depth-first in registration order, each exactly
    /// once even when reachable over several paths, strictly before the
    /// owner's own destructor runs. Destroying an id with no live record
    /// fails with [`RegistryError::NotFound`]; that means a double destroy
    /// or a dangling edge and must not be ignored. A true cycle fails with
    /// [`RegistryError::CyclicDependency`] instead of recursing forever.
    pub fn destroy(&mut self, id: impl Into<ResourceId>) -> Result<(), RegistryError> {
        let mut destroyed = HashSet::new();
        let mut in_progress = Vec::new();
        self.destroy_recursive(id.into(), &mut destroyed, &mut in_progress)
    }

    fn destroy_recursive(
        &mut self,
        id: ResourceId,
        destroyed: &mut HashSet<ResourceId>,
        in_progress: &mut Vec<ResourceId>,
    ) -> Result<(), RegistryError> {
        // A diamond: some other path in this cascade already took it down.
        if destroyed.contains(&id) {
            return Ok(());
        }
        if in_progress.contains(&id) {
            return Err(RegistryError::CyclicDependency(id));
        }
        let type_id = self.store.kind_of(id).ok_or(RegistryError::NotFound(id))?;

        // Snapshot the edges; the record is about to go away.
        let dependents = self
            .store
            .dependencies(type_id, id)
            .ok_or(RegistryError::NotFound(id))?
            .to_vec();

        in_progress.push(id);
        for dependent in dependents {
            self.destroy_recursive(dependent, destroyed, in_progress)?;
        }
        in_progress.pop();

        let removed = self.store.remove(type_id, id);
        debug_assert!(removed, "record vanished mid-cascade");
        destroyed.insert(id);
        trace!(id = %id, "resource destroyed");
        Ok(())
    }

    /// Number of live records across all kinds.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        // Leaked payloads still drop with the store, but every record should
        // have gone through `destroy` first.
        for (kind, live) in self.store.live_by_kind() {
            error!(kind = kind, live = live, "registry dropped with live resources");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Widget {
        label: &'static str,
    }

    struct Gizmo;

    /// Pushes its name into a shared log when dropped, exposing the order
    /// in which a cascade runs destructors.
    struct DropProbe {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.log.lock().unwrap().push(self.name);
        }
    }

    fn probe(
        registry: &mut Registry,
        name: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Handle<DropProbe> {
        let log = Arc::clone(log);
        registry.create(|_, _| DropProbe { name, log })
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut registry = Registry::new();
        let mut seen = Vec::new();
        for _ in 0..8 {
            let handle: Handle<Gizmo> = registry.create(|_, _| Gizmo);
            seen.push(handle.id());
        }
        let mut sorted = seen.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, seen);
    }

    #[test]
    fn lookup_after_create() {
        let mut registry = Registry::new();
        let handle = registry.create(|_, _| Widget { label: "w" });
        assert_eq!(registry.get(handle).unwrap().label, "w");
        registry.get_mut(handle).unwrap().label = "renamed";
        assert_eq!(registry.get(handle).unwrap().label, "renamed");
    }

    #[test]
    fn destroy_then_lookup_fails() {
        let mut registry = Registry::new();
        let handle = registry.create(|_, _| Widget { label: "w" });
        registry.destroy(handle).unwrap();
        assert_eq!(
            registry.get(handle).err(),
            Some(RegistryError::NotFound(handle.id()))
        );
        // A second destroy is a double free and fails the same way.
        assert_eq!(
            registry.destroy(handle),
            Err(RegistryError::NotFound(handle.id()))
        );
    }

    #[test]
    fn build_closure_sees_its_own_id() {
        let mut registry = Registry::new();
        let mut observed = None;
        let handle: Handle<Gizmo> = registry.create(|id, _| {
            observed = Some(id);
            Gizmo
        });
        assert_eq!(observed, Some(handle.id()));
    }

    #[test]
    fn dependents_can_be_created_during_build() {
        let mut registry = Registry::new();
        let handle: Handle<Widget> = registry.create(|_, registry| {
            let _inner: Handle<Gizmo> = registry.create(|_, _| Gizmo);
            Widget { label: "outer" }
        });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(handle).unwrap().label, "outer");
    }

    #[test]
    fn cascade_runs_leaf_destructors_first() {
        let mut registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = probe(&mut registry, "a", &log);
        let b = probe(&mut registry, "b", &log);
        let c = probe(&mut registry, "c", &log);
        registry.add_dependency(a, b).unwrap();
        registry.add_dependency(b, c).unwrap();

        registry.destroy(a).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
        assert!(registry.is_empty());
        assert_eq!(registry.get(b).err(), Some(RegistryError::NotFound(b.id())));
    }

    #[test]
    fn diamond_destroys_shared_dependent_once() {
        let mut registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = probe(&mut registry, "a", &log);
        let b = probe(&mut registry, "b", &log);
        let c = probe(&mut registry, "c", &log);
        let d = probe(&mut registry, "d", &log);
        registry.add_dependency(a, b).unwrap();
        registry.add_dependency(a, c).unwrap();
        registry.add_dependency(b, d).unwrap();
        registry.add_dependency(c, d).unwrap();

        registry.destroy(a).unwrap();
        // d went down once, during b's branch; c's edge was already satisfied.
        assert_eq!(*log.lock().unwrap(), vec!["d", "b", "c", "a"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn cycle_is_detected_not_recursed() {
        let mut registry = Registry::new();
        let a: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        let b: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        registry.add_dependency(a, b).unwrap();
        registry.add_dependency(b, a).unwrap();

        assert_eq!(
            registry.destroy(a),
            Err(RegistryError::CyclicDependency(a.id()))
        );
    }

    #[test]
    fn kinds_do_not_cross_resolve() {
        let mut registry = Registry::new();
        let widget = registry.create(|_, _| Widget { label: "w" });
        let gizmo: Handle<Gizmo> = registry.create(|_, _| Gizmo);

        // The same numeric id under the wrong kind never resolves.
        let mistagged: Handle<Gizmo> = Handle::from_id(widget.id());
        assert_eq!(
            registry.get(mistagged).err(),
            Some(RegistryError::NotFound(widget.id()))
        );
        assert!(registry.get(widget).is_ok());
        assert!(registry.get(gizmo).is_ok());
    }

    #[test]
    fn destroy_only_touches_the_named_tree() {
        let mut registry = Registry::new();
        let parent = registry.create(|_, _| Widget { label: "p" });
        let x: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        let y: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        let other = registry.create(|_, _| Widget { label: "q" });
        registry.add_dependency(parent, x).unwrap();
        registry.add_dependency(parent, y).unwrap();

        registry.destroy(parent).unwrap();
        assert_eq!(registry.get(x).err(), Some(RegistryError::NotFound(x.id())));
        assert_eq!(registry.get(y).err(), Some(RegistryError::NotFound(y.id())));
        assert_eq!(
            registry.get(parent).err(),
            Some(RegistryError::NotFound(parent.id()))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(other).unwrap().label, "q");
    }

    #[test]
    fn edges_are_reported_in_registration_order() {
        let mut registry = Registry::new();
        let parent = registry.create(|_, _| Widget { label: "p" });
        let first: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        let second: Handle<Gizmo> = registry.create(|_, _| Gizmo);
        registry.add_dependency(parent, first).unwrap();
        registry.add_dependency(parent, second).unwrap();

        assert_eq!(
            registry.dependencies_of(parent).unwrap(),
            &[first.id(), second.id()]
        );
        let unknown = ResourceId::new(999).unwrap();
        assert_eq!(
            registry.dependencies_of(unknown),
            Err(RegistryError::NotFound(unknown))
        );
    }

    #[test]
    fn error_messages_name_the_id() {
        let id = ResourceId::new(5).unwrap();
        assert_eq!(
            RegistryError::NotFound(id).to_string(),
            "no live resource 5"
        );
        assert_eq!(
            RegistryError::CyclicDependency(id).to_string(),
            "dependency cycle through resource 5"
        );
        assert_eq!(
            RegistryError::DuplicateIdentity(id).to_string(),
            "duplicate identity 5"
        );
    }
}

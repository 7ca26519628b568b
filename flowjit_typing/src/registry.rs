//! Process-scoped registries: the global constructor lattice and the
//! overlay registry.
//!
//! Both registries are built incrementally at load/definition time and
//! are append-only afterwards: no deletion, no re-parenting of an
//! existing constructor, no replacement of an existing overlay. Writes go
//! through a single `RwLock` writer so that a multi-threaded host gets a
//! happens-before barrier at registration time; reads after registration
//! may run freely in parallel. `reset()` tears both registries down for
//! test isolation.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::lattice::{ConstructorId, Decoration, Lattice};
use crate::types::{TypeError, TypeId, TypeStore};

/// Stable identity of a host callable.
///
/// Host objects that cannot provide a stable identity (the host's
/// "unhashable" values) simply have no key; overlay lookups for them
/// return `None` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableKey(u64);

impl CallableKey {
    pub fn new(raw: u64) -> Self {
        CallableKey(raw)
    }
}

impl fmt::Display for CallableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A typed implementation registered as the compiled front for an
/// untyped host callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    /// Callable type signature of the typed implementation.
    pub signature: TypeId,
    /// Global function index of the typed implementation.
    pub global_index: usize,
}

/// Mapping from host callable to its typed implementation.
///
/// Populated once per registration, read-only after. The same shape is
/// reused by the array and foreign-function subsystems as their "typed
/// front for untyped code" table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayRegistry {
    overlays: HashMap<CallableKey, Overlay>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the typed implementation for a host callable. A second
    /// registration of the same key is an error, never a replacement.
    pub fn register(&mut self, key: CallableKey, overlay: Overlay) -> Result<(), TypeError> {
        if self.overlays.contains_key(&key) {
            return Err(TypeError::DuplicateOverlayRegistration(key.to_string()));
        }
        self.overlays.insert(key, overlay);
        Ok(())
    }

    /// Look up the typed implementation for a host callable.
    ///
    /// `None` as the key models a host callable without a stable
    /// identity; the lookup returns `None` for it, and for any unknown
    /// key, rather than failing.
    pub fn lookup(&self, key: Option<&CallableKey>) -> Option<&Overlay> {
        self.overlays.get(key?)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

static GLOBAL_LATTICE: Lazy<RwLock<Lattice>> = Lazy::new(|| RwLock::new(Lattice::new()));
static GLOBAL_OVERLAYS: Lazy<RwLock<OverlayRegistry>> =
    Lazy::new(|| RwLock::new(OverlayRegistry::new()));

/// Run `f` against a read snapshot of the global lattice.
pub fn with_lattice<R>(f: impl FnOnce(&Lattice) -> R) -> R {
    f(&GLOBAL_LATTICE.read().expect("lattice lock poisoned"))
}

/// Append a constructor to the global lattice.
pub fn register_constructor(
    name: &str,
    params: &[&str],
    parent: ConstructorId,
) -> Result<ConstructorId, TypeError> {
    GLOBAL_LATTICE
        .write()
        .expect("lattice lock poisoned")
        .register(name, params, parent)
}

/// Attach phase-two decoration to a global constructor.
pub fn decorate_constructor(
    store: &TypeStore,
    ctor: ConstructorId,
    decoration: Decoration,
) -> Result<(), TypeError> {
    GLOBAL_LATTICE
        .write()
        .expect("lattice lock poisoned")
        .decorate(store, ctor, decoration)
}

/// Register a typed overlay for a host callable in the global registry.
pub fn register_overlay(key: CallableKey, overlay: Overlay) -> Result<(), TypeError> {
    GLOBAL_OVERLAYS
        .write()
        .expect("overlay lock poisoned")
        .register(key, overlay)
}

/// Look a host callable up in the global overlay registry.
pub fn lookup_overlay(key: Option<&CallableKey>) -> Option<Overlay> {
    GLOBAL_OVERLAYS
        .read()
        .expect("overlay lock poisoned")
        .lookup(key)
        .copied()
}

/// Tear both global registries down to their initial state.
///
/// Test-isolation hook; production code never unregisters anything.
pub fn reset() {
    *GLOBAL_LATTICE.write().expect("lattice lock poisoned") = Lattice::new();
    *GLOBAL_OVERLAYS.write().expect("overlay lock poisoned") = OverlayRegistry::new();
}

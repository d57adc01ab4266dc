#![forbid(unsafe_code)]

//! Per-element binding bookkeeping.
//!
//! Elements are owned by the tree, not by the engine, so their bindings live
//! in a side table keyed by [`NodeId`]. Each entry keeps a weak handle to its
//! element; entries whose element is gone are swept and their bindings
//! released.
//!
//! # Invariants
//!
//! 1. A lingering element never has a binding list; attaching to it is a
//!    no-op and its ears stay registered until the model is dropped.
//! 2. Releasing an element unsubscribes each binding at most once.
//! 3. Bindings whose model has already been dropped release as a no-op.
//! 4. No registry borrow is held while a model is touched.

use std::cell::RefCell;
use std::fmt;

use ahash::AHashMap;
use tether_dom::{Element, NodeId, WeakElement};
use tether_model::{EarId, Model, WeakModel};

/// One registered ear: which model, which key, which callback.
pub struct Binding {
    model: WeakModel,
    key: String,
    ear: EarId,
}

impl Binding {
    #[must_use]
    pub fn new(model: &Model, key: impl Into<String>, ear: EarId) -> Self {
        Self {
            model: model.downgrade(),
            key: key.into(),
            ear,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn ear(&self) -> EarId {
        self.ear
    }

    /// Unsubscribe from the model. Returns whether an ear was removed; a
    /// dropped model yields `false`.
    pub fn release(&self) -> bool {
        self.model
            .upgrade()
            .is_some_and(|model| model.stop_hearing(self.ear))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("ear", &self.ear)
            .field("model_alive", &!self.model.is_dead())
            .finish()
    }
}

struct Entry {
    element: WeakElement,
    bindings: Vec<Binding>,
}

#[derive(Default)]
struct Registry {
    bound: AHashMap<NodeId, Entry>,
    lingering: AHashMap<NodeId, WeakElement>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

/// Record `binding` against `element`, unless the element lingers.
pub fn attach(element: &Element, binding: Binding) {
    let id = element.id();
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        if registry.lingering.contains_key(&id) {
            tracing::trace!(node = %id, key = binding.key(), "lingering element, binding not tracked");
            return;
        }
        registry
            .bound
            .entry(id)
            .or_insert_with(|| Entry {
                element: element.downgrade(),
                bindings: Vec::new(),
            })
            .bindings
            .push(binding);
    });
}

/// Exempt `element` from cleanup.
///
/// Any bindings already tracked are forgotten without being unsubscribed.
pub fn linger(element: &Element) {
    let id = element.id();
    let forgotten = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.lingering.insert(id, element.downgrade());
        registry.bound.remove(&id)
    });
    tracing::debug!(
        node = %id,
        forgotten = forgotten.map_or(0, |entry| entry.bindings.len()),
        "element lingers"
    );
}

#[must_use]
pub fn is_lingering(element: &Element) -> bool {
    REGISTRY.with(|registry| registry.borrow().lingering.contains_key(&element.id()))
}

/// Number of tracked bindings on `element`.
#[must_use]
pub fn binding_count(element: &Element) -> usize {
    REGISTRY.with(|registry| {
        registry
            .borrow()
            .bound
            .get(&element.id())
            .map_or(0, |entry| entry.bindings.len())
    })
}

/// Unsubscribe and forget every binding of `element`.
///
/// Returns how many ears were removed from live models. Lingering elements
/// are untouched.
pub fn release(element: &Element) -> usize {
    release_node(element.id())
}

pub(crate) fn release_node(id: NodeId) -> usize {
    let entry = REGISTRY.with(|registry| registry.borrow_mut().bound.remove(&id));
    let Some(entry) = entry else {
        return 0;
    };
    let released = release_all(&entry.bindings);
    tracing::debug!(
        node = %id,
        bindings = entry.bindings.len(),
        released,
        "bindings released"
    );
    released
}

/// Release entries whose element has been dropped, and forget dead
/// lingering marks. Returns the number of entries swept.
pub(crate) fn sweep() -> usize {
    let dead: Vec<Entry> = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.lingering.retain(|_, element| !element.is_dead());
        let ids: Vec<NodeId> = registry
            .bound
            .iter()
            .filter(|(_, entry)| entry.element.is_dead())
            .map(|(id, _)| *id)
            .collect();
        ids.iter()
            .filter_map(|id| registry.bound.remove(id))
            .collect()
    });
    for entry in &dead {
        release_all(&entry.bindings);
    }
    if !dead.is_empty() {
        tracing::debug!(entries = dead.len(), "swept dropped elements");
    }
    dead.len()
}

fn release_all(bindings: &[Binding]) -> usize {
    bindings.iter().filter(|binding| binding.release()).count()
}

#![forbid(unsafe_code)]

//! Removal detection.
//!
//! One [`MutationObserver`] per engine scope watches a document body for
//! child-list removals across the whole subtree. Records arrive in batches
//! when the document flushes its mutation queue, so a removed element keeps
//! its bindings, and keeps receiving writes, until the next flush.
//!
//! # Invariants
//!
//! 1. At most one observer is installed per thread; installing again swaps
//!    it and disconnects the previous one.
//! 2. A removed node that is connected again by delivery time is left alone.
//! 3. Removing a container releases every bound element beneath it.
//!
//! # Failure Modes
//!
//! - **Foreign document**: elements of a document other than the installed
//!   one are never observed, and binding them logs a warning. Call
//!   [`install`] for that document, or [`release`](crate::release)
//!   explicitly.

use std::cell::RefCell;

use tether_dom::{Document, Element, MutationObserver, MutationRecord, ObserveOptions, WeakDocument};

use crate::registry;

struct Installed {
    document: WeakDocument,
    observer: MutationObserver,
}

thread_local! {
    static OBSERVER: RefCell<Option<Installed>> = const { RefCell::new(None) };
}

/// Watch `document`'s body for removals of bound elements.
///
/// Replaces any observer installed earlier in this thread.
pub fn install(document: &Document) {
    let observer = MutationObserver::new(on_removals);
    observer.observe(
        document.body().as_node(),
        ObserveOptions::child_list().with_subtree(),
    );
    let previous = OBSERVER.with(|slot| {
        slot.borrow_mut().replace(Installed {
            document: document.downgrade(),
            observer,
        })
    });
    if let Some(previous) = previous {
        previous.observer.disconnect();
    }
    tracing::debug!(base_url = %document.base_url(), "removal observer installed");
}

/// Whether an observer is installed for a live document.
#[must_use]
pub fn is_installed() -> bool {
    OBSERVER.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|installed| installed.document.upgrade().is_some())
    })
}

/// Install for `element`'s document unless a live observer already exists.
///
/// An element of another live document is left unobserved and a warning is
/// logged, since its bindings are never released automatically.
pub(crate) fn ensure_installed(element: &Element) {
    let Some(document) = element.owner_document() else {
        return;
    };
    let installed = OBSERVER.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|installed| installed.document.upgrade())
    });
    match installed {
        None => install(&document),
        Some(observed) if !observed.ptr_eq(&document) => {
            tracing::warn!(
                node = %element.id(),
                "element belongs to an unobserved document, its bindings are not released on removal"
            );
        }
        Some(_) => {}
    }
}

/// Whether removals under `document`'s body are being observed.
#[must_use]
pub fn is_observing(document: &Document) -> bool {
    OBSERVER.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|installed| installed.document.upgrade())
            .is_some_and(|observed| observed.ptr_eq(document))
    })
}

fn on_removals(records: Vec<MutationRecord>) {
    let mut released = 0;
    for record in &records {
        for removed in record.removed_nodes() {
            if removed.is_connected() {
                continue;
            }
            for node in removed.inclusive_descendants() {
                if node.is_element() {
                    released += registry::release_node(node.id());
                }
            }
        }
    }
    let swept = registry::sweep();
    tracing::trace!(records = records.len(), released, swept, "removal batch handled");
}

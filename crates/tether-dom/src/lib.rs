#![forbid(unsafe_code)]

//! Minimal element tree for Tether.
//!
//! This crate provides just enough of a document model for the binding
//! engine in `tether-bind` to drive:
//!
//! - [`Document`]: owns the `body` root, the base URL used to resolve
//!   relative URLs, and the queue of pending mutation records.
//! - [`Node`] / [`Element`]: shared handles to tree nodes with attribute
//!   storage, rendered text, and child-list mutation.
//! - [`MutationObserver`]: records child-list and attribute mutations and
//!   delivers them in batches when [`Document::flush_mutations`] runs.
//!
//! # Architecture
//!
//! Nodes use `Rc<RefCell<..>>` for single-threaded shared ownership. Parents
//! own their children; children point back at their parent weakly. Every
//! node carries a process-unique [`NodeId`] that side tables can key on.
//!
//! # Invariants
//!
//! 1. A node has at most one parent; inserting it elsewhere detaches it first.
//! 2. A node is never inserted into one of its own descendants.
//! 3. Mutation records are queued at mutation time and delivered only by an
//!    explicit flush, never synchronously with the mutation.
//! 4. A node is connected iff its root ancestor is a document body.

pub mod document;
pub mod error;
pub mod mutation;
pub mod node;

pub use document::{DEFAULT_BASE_URL, Document, WeakDocument};
pub use error::DomError;
pub use mutation::{MutationKind, MutationObserver, MutationRecord, ObserveOptions};
pub use node::{Element, Node, NodeId, WeakElement, WeakNode};
pub use url::Url;

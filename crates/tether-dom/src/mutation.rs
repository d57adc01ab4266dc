#![forbid(unsafe_code)]

//! Mutation observation with queued, batched delivery.
//!
//! A [`MutationObserver`] registers interest in a target node (optionally its
//! whole subtree) for child-list and/or attribute mutations. Matching
//! mutations append a [`MutationRecord`] to the observer's queue at mutation
//! time. The callback only runs when the owning document is flushed, which
//! means a window always exists between a mutation and its delivery.
//!
//! # Invariants
//!
//! 1. Each mutation produces at most one record per observer, even when
//!    several of its registrations match.
//! 2. Subtree matching is evaluated at mutation time, against the tree as it
//!    was when the record was queued.
//! 3. Dropping the last `MutationObserver` handle stops observation; the
//!    document only holds it weakly.
//!
//! # Failure Modes
//!
//! - **Unbounded queue**: queued records hold strong handles to their target
//!   and to every added or removed node. They are released only when the
//!   document is flushed, [`MutationObserver::take_records`] is called, or
//!   the observer disconnects. A caller that keeps mutating an observed tree
//!   must call [`Document::flush_mutations`](crate::Document::flush_mutations)
//!   regularly, or the queue and the nodes it references grow without bound.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::node::{Node, WeakNode};

/// What kind of mutation a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
}

/// One observed mutation.
#[derive(Clone, Debug)]
pub struct MutationRecord {
    kind: MutationKind,
    target: Node,
    added_nodes: Vec<Node>,
    removed_nodes: Vec<Node>,
    attribute_name: Option<String>,
    old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: Node, added: Vec<Node>, removed: Vec<Node>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub(crate) fn attribute(target: Node, name: String, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name),
            old_value,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// The node whose child list or attributes changed.
    #[must_use]
    pub fn target(&self) -> &Node {
        &self.target
    }

    #[must_use]
    pub fn added_nodes(&self) -> &[Node] {
        &self.added_nodes
    }

    #[must_use]
    pub fn removed_nodes(&self) -> &[Node] {
        &self.removed_nodes
    }

    #[must_use]
    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute_name.as_deref()
    }

    /// Attribute value before the mutation, if it had one.
    #[must_use]
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }
}

/// Which mutations a registration is interested in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    /// Child-list mutations of the target only.
    #[must_use]
    pub const fn child_list() -> Self {
        Self {
            child_list: true,
            attributes: false,
            subtree: false,
        }
    }

    /// Attribute mutations of the target only.
    #[must_use]
    pub const fn attributes() -> Self {
        Self {
            child_list: false,
            attributes: true,
            subtree: false,
        }
    }

    /// Extend the registration to every descendant of the target.
    #[must_use]
    pub const fn with_subtree(mut self) -> Self {
        self.subtree = true;
        self
    }

    fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
        }
    }
}

type Callback = Box<dyn Fn(Vec<MutationRecord>)>;

pub(crate) struct ObserverInner {
    callback: Callback,
    targets: RefCell<Vec<(WeakNode, ObserveOptions)>>,
    queue: RefCell<Vec<MutationRecord>>,
}

impl ObserverInner {
    pub(crate) fn interested(&self, record: &MutationRecord) -> bool {
        self.targets.borrow().iter().any(|(target, options)| {
            if !options.accepts(record.kind) {
                return false;
            }
            target.upgrade().is_some_and(|target| {
                target.ptr_eq(&record.target)
                    || (options.subtree && target.contains(&record.target))
            })
        })
    }

    pub(crate) fn enqueue(&self, record: MutationRecord) {
        self.queue.borrow_mut().push(record);
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Hand the whole queue to the callback. Returns the batch size.
    pub(crate) fn deliver(&self) -> usize {
        let records = std::mem::take(&mut *self.queue.borrow_mut());
        let count = records.len();
        if count > 0 {
            (self.callback)(records);
        }
        count
    }
}

/// Observes mutations of nodes and receives them in batches.
#[derive(Clone)]
pub struct MutationObserver {
    inner: Rc<ObserverInner>,
}

impl MutationObserver {
    /// Create an observer. `callback` receives each delivered batch.
    #[must_use]
    pub fn new(callback: impl Fn(Vec<MutationRecord>) + 'static) -> Self {
        Self {
            inner: Rc::new(ObserverInner {
                callback: Box::new(callback),
                targets: RefCell::new(Vec::new()),
                queue: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Start observing `target`. Observing the same target again replaces
    /// its options.
    pub fn observe(&self, target: &Node, options: ObserveOptions) {
        {
            let mut targets = self.inner.targets.borrow_mut();
            targets.retain(|(node, _)| !node.is_dead());
            match targets
                .iter_mut()
                .find(|(node, _)| node.upgrade().is_some_and(|node| node.ptr_eq(target)))
            {
                Some((_, existing)) => *existing = options,
                None => targets.push((target.downgrade(), options)),
            }
        }
        if let Some(document) = target.owner_document() {
            document.register_observer(&self.inner);
        }
    }

    /// Stop observing everything and drop undelivered records.
    pub fn disconnect(&self) {
        self.inner.targets.borrow_mut().clear();
        self.inner.queue.borrow_mut().clear();
    }

    /// Take undelivered records without running the callback.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.inner.queue.borrow_mut())
    }

    /// Number of undelivered records.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending()
    }

    /// Whether any registration is still active.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.inner
            .targets
            .borrow()
            .iter()
            .any(|(node, _)| !node.is_dead())
    }
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("targets", &self.inner.targets.borrow().len())
            .field("pending", &self.inner.pending())
            .finish()
    }
}

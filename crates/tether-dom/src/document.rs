#![forbid(unsafe_code)]

//! Document: tree root, base URL, and mutation-record routing.
//!
//! The document owns the `body` element and keeps weak references to every
//! [`MutationObserver`](crate::MutationObserver) observing one of its nodes.
//! Mutations append records to interested observers' queues; nothing is
//! delivered until [`Document::flush_mutations`] runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use url::Url;

use crate::mutation::{MutationRecord, ObserverInner};
use crate::node::{Element, Node, NodeKind};

/// Base URL used by [`Document::new`].
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

pub(crate) fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is an absolute URL")
}

pub(crate) struct DocumentInner {
    base_url: Url,
    body: Node,
    observers: RefCell<Vec<Weak<ObserverInner>>>,
}

/// A shared handle to a document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Create an empty document with base URL [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(default_base_url())
    }

    /// Create an empty document resolving relative URLs against `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        let inner = Rc::new_cyclic(|weak| DocumentInner {
            base_url,
            body: Node::new(weak.clone(), NodeKind::element("body")),
            observers: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The root element every connected node descends from.
    #[must_use]
    pub fn body(&self) -> Element {
        Element::from_node(self.inner.body.clone())
    }

    /// Create a detached element. The tag is stored lower-cased.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        Element::from_node(Node::new(
            Rc::downgrade(&self.inner),
            NodeKind::element(tag),
        ))
    }

    /// Create a detached text node.
    #[must_use]
    pub fn create_text_node(&self, text: &str) -> Node {
        Node::new(Rc::downgrade(&self.inner), NodeKind::Text(text.to_owned()))
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver every queued mutation record to its observer.
    ///
    /// Observers run in registration order, each receiving its whole queue as
    /// one batch. Records queued by a callback are delivered in a further
    /// round of the same flush. Returns the number of records delivered.
    ///
    /// Callers own the flush cadence. Undelivered records keep the nodes
    /// they mention alive, so an observed tree that is never flushed grows
    /// its queues without bound.
    pub fn flush_mutations(&self) -> usize {
        let mut delivered = 0;
        loop {
            let mut round = 0;
            for observer in self.live_observers() {
                round += observer.deliver();
            }
            if round == 0 {
                break;
            }
            delivered += round;
        }
        if delivered > 0 {
            tracing::trace!(delivered, "flushed mutation records");
        }
        delivered
    }

    /// Records queued but not yet delivered, across all observers.
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.live_observers()
            .iter()
            .map(|observer| observer.pending())
            .sum()
    }

    pub(crate) fn register_observer(&self, observer: &Rc<ObserverInner>) {
        let mut observers = self.inner.observers.borrow_mut();
        let already = observers
            .iter()
            .any(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(observer)));
        if !already {
            observers.push(Rc::downgrade(observer));
        }
    }

    pub(crate) fn queue_record(&self, record: MutationRecord) {
        for observer in self.live_observers() {
            if observer.interested(&record) {
                observer.enqueue(record.clone());
            }
        }
    }

    fn live_observers(&self) -> Vec<Rc<ObserverInner>> {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|weak| weak.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("base_url", &self.inner.base_url.as_str())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

/// Non-owning document handle.
#[derive(Clone, Debug, Default)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    #[must_use]
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(Document::from_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_localhost() {
        let doc = Document::new();
        assert_eq!(doc.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn custom_base_url() {
        let base = Url::parse("https://example.com/app/").unwrap();
        let doc = Document::with_base_url(base.clone());
        assert_eq!(doc.base_url(), &base);
        assert_eq!(doc.create_element("a").base_url(), base);
    }

    #[test]
    fn body_is_connected() {
        let doc = Document::new();
        assert!(doc.body().is_connected());
        assert_eq!(doc.body().tag_name(), "BODY");
    }

    #[test]
    fn created_nodes_belong_to_document() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let text = doc.create_text_node("hi");
        assert!(el.owner_document().unwrap().ptr_eq(&doc));
        assert!(text.owner_document().unwrap().ptr_eq(&doc));
        assert_eq!(text.text_content(), "hi");
    }

    #[test]
    fn flush_without_observers_is_noop() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.body().append_child(el.as_node()).unwrap();
        el.remove();
        assert_eq!(doc.pending_mutations(), 0);
        assert_eq!(doc.flush_mutations(), 0);
    }

    #[test]
    fn weak_document_does_not_keep_alive() {
        let doc = Document::new();
        let weak = doc.downgrade();
        assert!(weak.upgrade().is_some());
        drop(doc);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn queued_records_hold_nodes_until_flushed() {
        use crate::{MutationObserver, ObserveOptions};

        let doc = Document::new();
        let observer = MutationObserver::new(|_| {});
        observer.observe(doc.body().as_node(), ObserveOptions::child_list().with_subtree());
        let el = doc.create_element("p");
        doc.body().append_child(el.as_node()).unwrap();

        let first_text = {
            el.set_inner_text("one");
            el.child_nodes()[0].downgrade()
        };
        for text in ["two", "three", "four"] {
            el.set_inner_text(text);
        }
        assert_eq!(doc.pending_mutations(), 5);
        assert!(first_text.upgrade().is_some(), "replaced text kept by the queue");

        assert_eq!(doc.flush_mutations(), 5);
        assert_eq!(doc.pending_mutations(), 0);
        assert!(first_text.is_dead());
    }
}

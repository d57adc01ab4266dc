#![forbid(unsafe_code)]

//! Node and element handles.
//!
//! [`Node`] is a cheap, clonable handle to a tree node. Cloning shares the
//! same node; equality is identity. [`Element`] is a `Node` known to be an
//! element and carries the attribute and child-list API.
//!
//! # Failure Modes
//!
//! - Inserting an ancestor into its descendant returns
//!   [`DomError::HierarchyRequest`] and leaves the tree untouched.
//! - Writing to a detached node is allowed; it simply produces no mutation
//!   records for observers of the document body.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use url::Url;

use crate::document::{Document, DocumentInner, default_base_url};
use crate::error::DomError;
use crate::mutation::MutationRecord;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity.
///
/// Ids are never reused, so a side table keyed by `NodeId` cannot confuse a
/// dropped node with a newly created one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct ElementData {
    local_name: String,
    attributes: Vec<(String, String)>,
}

pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

impl NodeKind {
    pub(crate) fn element(tag: &str) -> Self {
        Self::Element(ElementData {
            local_name: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }
}

struct NodeData {
    kind: NodeKind,
    parent: Option<Weak<NodeInner>>,
    children: Vec<Node>,
}

pub(crate) struct NodeInner {
    id: NodeId,
    document: Weak<DocumentInner>,
    data: RefCell<NodeData>,
}

/// A shared handle to a node in the element tree.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    pub(crate) fn new(document: Weak<DocumentInner>, kind: NodeKind) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id: NodeId::next(),
                document,
                data: RefCell::new(NodeData {
                    kind,
                    parent: None,
                    children: Vec::new(),
                }),
            }),
        }
    }

    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self.inner.data.borrow().kind, NodeKind::Element(_))
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.inner.data.borrow().kind, NodeKind::Text(_))
    }

    /// View this node as an element, if it is one.
    #[must_use]
    pub fn as_element(&self) -> Option<Element> {
        self.is_element().then(|| Element { node: self.clone() })
    }

    /// The parent node, if attached.
    #[must_use]
    pub fn parent_node(&self) -> Option<Node> {
        self.inner
            .data
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Node { inner })
    }

    /// Snapshot of the child list.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Node> {
        self.inner.data.borrow().children.clone()
    }

    /// Concatenated text of this node and all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        let data = self.inner.data.borrow();
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &data.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// The document this node was created by, if it is still alive.
    #[must_use]
    pub fn owner_document(&self) -> Option<Document> {
        self.inner.document.upgrade().map(Document::from_inner)
    }

    /// Topmost ancestor (the node itself when detached).
    #[must_use]
    pub fn root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent_node() {
            current = parent;
        }
        current
    }

    /// Whether the node is part of a live document's body subtree.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let root = self.root();
        root.owner_document()
            .is_some_and(|document| document.body().as_node().ptr_eq(&root))
    }

    /// Whether `other` is this node or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent_node();
        }
        false
    }

    /// This node followed by all descendants, in tree order.
    #[must_use]
    pub fn inclusive_descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.child_nodes().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Detach this node from its parent. No-op when already detached.
    pub fn remove(&self) {
        let Some(parent) = self.parent_node() else {
            return;
        };
        parent.inner.data.borrow_mut().children.retain(|c| !c.ptr_eq(self));
        self.inner.data.borrow_mut().parent = None;
        parent.queue(MutationRecord::child_list(
            parent.clone(),
            Vec::new(),
            vec![self.clone()],
        ));
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn queue(&self, record: MutationRecord) {
        if let Some(document) = self.owner_document() {
            document.queue_record(record);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.borrow();
        match &data.kind {
            NodeKind::Element(element) => f
                .debug_struct("Element")
                .field("id", &self.inner.id)
                .field("tag", &element.local_name)
                .field("children", &data.children.len())
                .finish(),
            NodeKind::Text(text) => f
                .debug_struct("Text")
                .field("id", &self.inner.id)
                .field("text", text)
                .finish(),
        }
    }
}

/// Non-owning node handle.
#[derive(Clone, Debug, Default)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }

    /// Whether the node has been dropped.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

/// A node known to be an element.
#[derive(Clone, PartialEq, Eq)]
pub struct Element {
    node: Node,
}

impl Element {
    pub(crate) fn from_node(node: Node) -> Self {
        Self { node }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    #[must_use]
    pub fn as_node(&self) -> &Node {
        &self.node
    }

    fn data(&self) -> Option<Ref<'_, ElementData>> {
        Ref::filter_map(self.node.inner.data.borrow(), |data| match &data.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        })
        .ok()
    }

    fn data_mut(&self) -> Option<RefMut<'_, ElementData>> {
        RefMut::filter_map(self.node.inner.data.borrow_mut(), |data| {
            match &mut data.kind {
                NodeKind::Element(element) => Some(element),
                NodeKind::Text(_) => None,
            }
        })
        .ok()
    }

    /// Lower-case local name (e.g. `"div"`).
    #[must_use]
    pub fn local_name(&self) -> String {
        self.data()
            .map(|data| data.local_name.clone())
            .unwrap_or_default()
    }

    /// Upper-case tag name (e.g. `"DIV"`).
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.local_name().to_ascii_uppercase()
    }

    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.data().and_then(|data| {
            data.attributes
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        })
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Attribute names in insertion order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.data()
            .map(|data| data.attributes.iter().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default()
    }

    /// Set an attribute. Names are stored lower-cased.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let old_value = {
            let Some(mut data) = self.data_mut() else {
                return;
            };
            match data.attributes.iter().position(|(key, _)| *key == name) {
                Some(index) => Some(std::mem::replace(
                    &mut data.attributes[index].1,
                    value.to_owned(),
                )),
                None => {
                    data.attributes.push((name.clone(), value.to_owned()));
                    None
                }
            }
        };
        self.node.queue(MutationRecord::attribute(
            self.node.clone(),
            name,
            old_value,
        ));
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let old_value = {
            let mut data = self.data_mut()?;
            let index = data.attributes.iter().position(|(key, _)| *key == name)?;
            data.attributes.remove(index).1
        };
        self.node.queue(MutationRecord::attribute(
            self.node.clone(),
            name,
            Some(old_value.clone()),
        ));
        Some(old_value)
    }

    /// Element children, skipping text nodes.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.node
            .child_nodes()
            .into_iter()
            .filter_map(|node| node.as_element())
            .collect()
    }

    #[must_use]
    pub fn child_element_count(&self) -> usize {
        self.children().len()
    }

    #[must_use]
    pub fn child_nodes(&self) -> Vec<Node> {
        self.node.child_nodes()
    }

    /// Rendered text of the subtree.
    #[must_use]
    pub fn inner_text(&self) -> String {
        self.node.text_content()
    }

    /// Replace all children with a single text node holding `text`.
    ///
    /// The text is stored verbatim and never interpreted as markup. An empty
    /// string leaves the element without children.
    pub fn set_inner_text(&self, text: &str) {
        let nodes = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::new(
                self.node.inner.document.clone(),
                NodeKind::Text(text.to_owned()),
            )]
        };
        self.splice_children(nodes);
    }

    /// Append `child`, detaching it from any previous parent.
    ///
    /// # Errors
    ///
    /// [`DomError::HierarchyRequest`] if `child` is this element or one of
    /// its ancestors.
    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.ensure_insertable(child)?;
        child.remove();
        child.inner.data.borrow_mut().parent = Some(Rc::downgrade(&self.node.inner));
        self.node.inner.data.borrow_mut().children.push(child.clone());
        self.node.queue(MutationRecord::child_list(
            self.node.clone(),
            vec![child.clone()],
            Vec::new(),
        ));
        Ok(())
    }

    /// Replace the whole child list with `nodes`, in order.
    ///
    /// # Errors
    ///
    /// [`DomError::HierarchyRequest`] if any node is this element or one of
    /// its ancestors. The child list is untouched in that case.
    pub fn replace_children<I>(&self, nodes: I) -> Result<(), DomError>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let nodes: Vec<Node> = nodes.into_iter().map(Into::into).collect();
        for node in &nodes {
            self.ensure_insertable(node)?;
        }
        self.splice_children(nodes);
        Ok(())
    }

    fn ensure_insertable(&self, child: &Node) -> Result<(), DomError> {
        if child.contains(&self.node) {
            return Err(DomError::HierarchyRequest {
                parent: self.id(),
                child: child.id(),
            });
        }
        Ok(())
    }

    fn splice_children(&self, nodes: Vec<Node>) {
        let mut incoming: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if incoming.iter().any(|seen| seen.ptr_eq(&node)) {
                continue;
            }
            if node
                .parent_node()
                .is_some_and(|parent| !parent.ptr_eq(&self.node))
            {
                node.remove();
            }
            incoming.push(node);
        }

        let removed = std::mem::take(&mut self.node.inner.data.borrow_mut().children);
        for child in &removed {
            child.inner.data.borrow_mut().parent = None;
        }
        for child in &incoming {
            child.inner.data.borrow_mut().parent = Some(Rc::downgrade(&self.node.inner));
        }
        self.node.inner.data.borrow_mut().children = incoming.clone();

        if !incoming.is_empty() || !removed.is_empty() {
            self.node.queue(MutationRecord::child_list(
                self.node.clone(),
                incoming,
                removed,
            ));
        }
    }

    /// Detach from the parent. No-op when already detached.
    pub fn remove(&self) {
        self.node.remove();
    }

    #[must_use]
    pub fn parent_element(&self) -> Option<Element> {
        self.node.parent_node().and_then(|node| node.as_element())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.node.is_connected()
    }

    #[must_use]
    pub fn owner_document(&self) -> Option<Document> {
        self.node.owner_document()
    }

    /// Base URL for resolving relative URLs written to this element.
    ///
    /// Falls back to [`DEFAULT_BASE_URL`](crate::DEFAULT_BASE_URL) when the
    /// owner document is gone.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.owner_document()
            .map(|document| document.base_url().clone())
            .unwrap_or_else(default_base_url)
    }

    #[must_use]
    pub fn contains(&self, other: &Node) -> bool {
        self.node.contains(other)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            node: self.node.downgrade(),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        element.node
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        element.node.clone()
    }
}

/// Non-owning element handle.
#[derive(Clone, Debug, Default)]
pub struct WeakElement {
    node: WeakNode,
}

impl WeakElement {
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.node.upgrade().map(Element::from_node)
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.node.is_dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_name_is_upper_case() {
        let doc = Document::new();
        let el = doc.create_element("Script");
        assert_eq!(el.local_name(), "script");
        assert_eq!(el.tag_name(), "SCRIPT");
    }

    #[test]
    fn attributes_are_case_insensitive() {
        let doc = Document::new();
        let el = doc.create_element("div");
        el.set_attribute("Data-Test", "1");
        assert_eq!(el.get_attribute("data-test").as_deref(), Some("1"));
        el.set_attribute("DATA-TEST", "2");
        assert_eq!(el.attribute_names(), vec!["data-test".to_string()]);
        assert_eq!(el.remove_attribute("data-test").as_deref(), Some("2"));
        assert!(!el.has_attribute("data-test"));
    }

    #[test]
    fn inner_text_is_not_markup() {
        let doc = Document::new();
        let el = doc.create_element("p");
        el.set_inner_text("<b>bold</b>");
        assert_eq!(el.inner_text(), "<b>bold</b>");
        assert_eq!(el.child_element_count(), 0);
        assert_eq!(el.child_nodes().len(), 1);
        assert!(el.child_nodes()[0].is_text());

        el.set_inner_text("");
        assert!(el.child_nodes().is_empty());
    }

    #[test]
    fn append_moves_between_parents() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");

        a.append_child(child.as_node()).unwrap();
        b.append_child(child.as_node()).unwrap();

        assert!(a.children().is_empty());
        assert_eq!(b.children(), vec![child.clone()]);
        assert_eq!(child.parent_element(), Some(b));
    }

    #[test]
    fn replace_children_keeps_order() {
        let doc = Document::new();
        let parent = doc.create_element("ul");
        let items: Vec<Element> = (0..3).map(|_| doc.create_element("li")).collect();
        parent.replace_children(items.clone()).unwrap();
        assert_eq!(parent.children(), items);

        parent.replace_children(Vec::<Node>::new()).unwrap();
        assert_eq!(parent.child_element_count(), 0);
        assert!(items.iter().all(|item| item.parent_element().is_none()));
    }

    #[test]
    fn replace_children_rejects_ancestor() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        outer.append_child(inner.as_node()).unwrap();

        let err = inner.replace_children([outer.clone()]).unwrap_err();
        assert_eq!(
            err,
            DomError::HierarchyRequest {
                parent: inner.id(),
                child: outer.id(),
            }
        );
        assert_eq!(outer.children(), vec![inner]);
    }

    #[test]
    fn replace_children_dedupes() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let child = doc.create_element("span");
        parent
            .replace_children([child.clone(), child.clone()])
            .unwrap();
        assert_eq!(parent.child_element_count(), 1);
    }

    #[test]
    fn connectedness_follows_body() {
        let doc = Document::new();
        let el = doc.create_element("div");
        assert!(!el.is_connected());
        doc.body().append_child(el.as_node()).unwrap();
        assert!(el.is_connected());
        el.remove();
        assert!(!el.is_connected());
    }

    #[test]
    fn inclusive_descendants_in_tree_order() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        root.append_child(a.as_node()).unwrap();
        a.append_child(b.as_node()).unwrap();
        root.append_child(c.as_node()).unwrap();

        let ids: Vec<NodeId> = root
            .as_node()
            .inclusive_descendants()
            .iter()
            .map(Node::id)
            .collect();
        assert_eq!(ids, vec![root.id(), a.id(), b.id(), c.id()]);
    }

    #[test]
    fn weak_element_dies_with_last_handle() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let weak = el.downgrade();
        assert!(weak.upgrade().is_some());
        drop(el);
        assert!(weak.is_dead());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn detached_document_uses_default_base() {
        let el = {
            let doc = Document::new();
            doc.create_element("a")
        };
        assert_eq!(el.base_url().as_str(), crate::DEFAULT_BASE_URL);
        assert!(!el.is_connected());
    }
}

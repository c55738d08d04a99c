//! Arena-based DOM tree with deferred construction.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a copyable handle that carries the
//! arena slot and the id of the owning document. Parent, child, and sibling
//! links are arena indices, so the sibling list is an intrusive doubly-linked
//! list without reference cycles.
//!
//! # Deferred building
//!
//! A document created from an event cursor ([`Document::parse_deferred`],
//! [`Document::from_source`]) starts with only what the first event
//! describes. Each container carries a `done` flag; while it is false the
//! container's trailing children have not been read yet. Accessors that
//! need them ([`Document::first_child`], [`Document::next_sibling`],
//! [`Document::document_element`], ...) pull events from the document-wide
//! cursor until the answer is known. Every accessor of that kind takes
//! `&mut Document` and returns a `Result`; the `*_if_available` variants
//! only look at what is already materialized.
//!
//! Mutation entry points build the affected container fully before
//! touching any links.

mod attr;
mod builder;
mod chardata;
mod document;
mod element;
mod equality;
mod mutation;
mod namespace;
mod node;
mod node_list;

pub use attr::{AttrValue, AttributeMap, NamedNodeMap};
pub use builder::BuildStep;
pub use document::DomImplementation;
pub use namespace::Namespace;
pub use node::{NodeKind, NodeType};
pub use node_list::NodeList;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

use crate::error::DomError;
use builder::DeferredBuild;

static NEXT_DOCUMENT_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DocumentId(NonZeroU32);

impl DocumentId {
    fn next() -> Self {
        let raw = NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }
}

/// A handle to a node in a document's arena.
///
/// The handle records which document it belongs to; passing it to a
/// different document is detected. `Option<NodeId>` has the same size as
/// `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    doc: DocumentId,
    index: NonZeroU32,
}

impl NodeId {
    #[allow(clippy::cast_possible_truncation)]
    fn new(doc: DocumentId, index: usize) -> Self {
        Self {
            doc,
            index: NonZeroU32::new(index as u32).unwrap_or(NonZeroU32::MIN),
        }
    }

    fn as_index(self) -> usize {
        self.index.get() as usize
    }

    /// Returns the id of the document that owns this node.
    #[must_use]
    pub fn document_id(self) -> DocumentId {
        self.doc
    }
}

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Attached to a parent (children) or an owner element (attributes).
        const OWNED = 1;
        /// The first child of its parent.
        const FIRST_CHILD = 1 << 1;
        /// Mutating calls fail with `NoModificationAllowed`.
        const READ_ONLY = 1 << 2;
        /// An attribute that was given a value explicitly.
        const SPECIFIED = 1 << 3;
        /// Adjacent text children have been merged.
        const NORMALIZED = 1 << 4;
    }
}

/// Storage for a single node in the document arena.
///
/// Access individual nodes via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// State bits.
    pub flags: NodeFlags,
    /// Whether all children of this node are materialized. Always true
    /// for leaves and for nodes that were not created by the builder.
    pub(crate) done: bool,
    /// Parent node; `None` for the document node and detached nodes.
    pub parent: Option<NodeId>,
    /// First materialized child.
    pub first_child: Option<NodeId>,
    /// Last materialized child.
    pub last_child: Option<NodeId>,
    /// Next sibling, if materialized.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            flags: NodeFlags::empty(),
            done: true,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

type UserData = HashMap<String, Box<dyn Any>>;

/// An XML document: the node arena, the document-element slot, the ID
/// registry, and the optional deferred-build cursor.
///
/// # Examples
///
/// ```
/// use lazydom::Document;
///
/// let mut doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let root = doc.document_element().unwrap().unwrap();
/// assert_eq!(doc.node_name(root), "root");
/// ```
pub struct Document {
    id: DocumentId,
    /// The node arena. Index 0 is an unused placeholder.
    nodes: Vec<NodeData>,
    root: NodeId,
    document_element: Option<NodeId>,
    /// Version from the XML declaration.
    pub version: Option<String>,
    /// Encoding from the XML declaration.
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
    /// Attributes flagged as IDs, in registration order.
    id_attrs: Vec<NodeId>,
    user_data: HashMap<NodeId, UserData>,
    /// Pseudo-attribute nodes standing for namespace declarations.
    declaration_attrs: HashMap<(NodeId, String), NodeId>,
    builder: Option<DeferredBuild>,
    prefix_counter: u32,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("document_element", &self.document_element)
            .field("version", &self.version)
            .field("encoding", &self.encoding)
            .field("standalone", &self.standalone)
            .field("building", &self.builder.is_some())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates a new, empty, fully built document.
    #[must_use]
    pub fn new() -> Self {
        let id = DocumentId::next();
        let placeholder = NodeData::new(NodeKind::Document);
        let root_node = NodeData::new(NodeKind::Document);
        Self {
            id,
            nodes: vec![placeholder, root_node],
            root: NodeId::new(id, 1),
            document_element: None,
            version: None,
            encoding: None,
            standalone: None,
            id_attrs: Vec::new(),
            user_data: HashMap::new(),
            declaration_attrs: HashMap::new(),
            builder: None,
            prefix_counter: 0,
        }
    }

    /// Returns this document's id.
    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the document element if it has been materialized.
    #[must_use]
    pub fn document_element_if_available(&self) -> Option<NodeId> {
        self.document_element
    }

    /// Returns `true` if `id` is a handle into this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.doc == self.id && id.as_index() < self.nodes.len()
    }

    /// Returns a reference to the node data for the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        assert_eq!(id.doc, self.id, "node handle belongs to another document");
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        assert_eq!(id.doc, self.id, "node handle belongs to another document");
        &mut self.nodes[id.as_index()]
    }

    pub(crate) fn check_owned(&self, id: NodeId) -> Result<(), DomError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DomError::WrongDocument)
        }
    }

    pub(crate) fn check_writable(&self, id: NodeId) -> Result<(), DomError> {
        self.check_owned(id)?;
        if self.node(id).flags.contains(NodeFlags::READ_ONLY) {
            return Err(DomError::NoModificationAllowed);
        }
        Ok(())
    }

    /// Allocates a detached node. Containers start done.
    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Returns the number of arena slots in use, including the document node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    // -- Materialized navigation --

    /// Returns the parent of a node. Parents always exist before children.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child if it has been materialized.
    #[must_use]
    pub fn first_child_if_available(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last materialized child.
    #[must_use]
    pub fn last_child_if_available(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling if it has been materialized.
    #[must_use]
    pub fn next_sibling_if_available(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling. Earlier siblings are always
    /// materialized.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Iterates over the materialized children of a node.
    #[must_use]
    pub fn children_if_available(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Iterates from the parent of a node up to the document node.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).parent,
        }
    }

    /// Iterates over the materialized descendants of a node in document
    /// order, excluding the node itself.
    #[must_use]
    pub fn descendants_if_available(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.node(id).first_child,
        }
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    // -- Raw link maintenance. No building, no validation. --

    pub(crate) fn link_append(&mut self, parent: NodeId, child: NodeId) {
        let old_last = self.node(parent).last_child;
        {
            let c = self.node_mut(child);
            c.parent = Some(parent);
            c.prev_sibling = old_last;
            c.next_sibling = None;
            c.flags.insert(NodeFlags::OWNED);
            c.flags.set(NodeFlags::FIRST_CHILD, old_last.is_none());
        }
        match old_last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
        self.clear_normalized(Some(parent));
    }

    pub(crate) fn link_before(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.node(reference).parent else {
            return;
        };
        let prev = self.node(reference).prev_sibling;
        {
            let c = self.node_mut(child);
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = Some(reference);
            c.flags.insert(NodeFlags::OWNED);
            c.flags.set(NodeFlags::FIRST_CHILD, prev.is_none());
        }
        let r = self.node_mut(reference);
        r.prev_sibling = Some(child);
        r.flags.remove(NodeFlags::FIRST_CHILD);
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.clear_normalized(Some(parent));
    }

    /// Clears the normalized flag on `id` and its flagged ancestors. A
    /// flagged container never has an unflagged container above it.
    pub(crate) fn clear_normalized(&mut self, mut id: Option<NodeId>) {
        while let Some(current) = id {
            let node = self.node_mut(current);
            if !node.flags.contains(NodeFlags::NORMALIZED) {
                break;
            }
            node.flags.remove(NodeFlags::NORMALIZED);
            id = node.parent;
        }
    }

    /// Unlinks a node from its parent, leaving its own subtree intact.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if let Some(p) = prev {
            self.node_mut(p).next_sibling = next;
        } else if let Some(parent) = parent {
            self.node_mut(parent).first_child = next;
        }
        if let Some(n) = next {
            let nd = self.node_mut(n);
            nd.prev_sibling = prev;
            if prev.is_none() {
                nd.flags.insert(NodeFlags::FIRST_CHILD);
            }
        } else if let Some(parent) = parent {
            self.node_mut(parent).last_child = prev;
        }
        self.clear_normalized(parent);
        if parent.is_some_and(|p| p == self.root) && self.document_element == Some(id) {
            self.document_element = None;
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
        n.flags.remove(NodeFlags::OWNED | NodeFlags::FIRST_CHILD);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over materialized child nodes.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over ancestor nodes.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over materialized descendants.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let node = self.doc.node(current);
        self.next = if let Some(child) = node.first_child {
            Some(child)
        } else {
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break None;
                }
                let n = self.doc.node(cursor);
                if let Some(sibling) = n.next_sibling {
                    break Some(sibling);
                }
                match n.parent {
                    Some(p) if p != self.root => cursor = p,
                    _ => break None,
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn elem(doc: &mut Document, name: &str) -> NodeId {
        doc.create_element(name).unwrap()
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
        assert!(doc.document_element_if_available().is_none());
    }

    #[test]
    fn test_document_ids_are_unique() {
        let a = Document::new();
        let b = Document::new();
        assert_ne!(a.id(), b.id());
        assert!(!b.contains(a.root()));
    }

    #[test]
    fn test_link_append_sets_first_child_flag() {
        let mut doc = Document::new();
        let parent = elem(&mut doc, "p");
        let a = elem(&mut doc, "a");
        let b = elem(&mut doc, "b");
        doc.link_append(parent, a);
        doc.link_append(parent, b);
        assert!(doc.node(a).flags.contains(NodeFlags::FIRST_CHILD));
        assert!(!doc.node(b).flags.contains(NodeFlags::FIRST_CHILD));
        assert!(doc.node(b).flags.contains(NodeFlags::OWNED));
        assert_eq!(doc.children_if_available(parent).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_link_before_first_child() {
        let mut doc = Document::new();
        let parent = elem(&mut doc, "p");
        let a = elem(&mut doc, "a");
        let b = elem(&mut doc, "b");
        doc.link_append(parent, a);
        doc.link_before(a, b);
        assert_eq!(doc.first_child_if_available(parent), Some(b));
        assert!(doc.node(b).flags.contains(NodeFlags::FIRST_CHILD));
        assert!(!doc.node(a).flags.contains(NodeFlags::FIRST_CHILD));
        assert_eq!(doc.prev_sibling(a), Some(b));
    }

    #[test]
    fn test_unlink_middle_child() {
        let mut doc = Document::new();
        let parent = elem(&mut doc, "p");
        let kids: Vec<_> = ["a", "b", "c"].iter().map(|n| elem(&mut doc, n)).collect();
        for &k in &kids {
            doc.link_append(parent, k);
        }
        doc.unlink(kids[1]);
        assert_eq!(
            doc.children_if_available(parent).collect::<Vec<_>>(),
            vec![kids[0], kids[2]]
        );
        assert_eq!(doc.prev_sibling(kids[2]), Some(kids[0]));
        assert!(doc.parent(kids[1]).is_none());
        assert!(!doc.node(kids[1]).flags.contains(NodeFlags::OWNED));
    }

    #[test]
    fn test_unlink_first_child_promotes_next() {
        let mut doc = Document::new();
        let parent = elem(&mut doc, "p");
        let a = elem(&mut doc, "a");
        let b = elem(&mut doc, "b");
        doc.link_append(parent, a);
        doc.link_append(parent, b);
        doc.unlink(a);
        assert_eq!(doc.first_child_if_available(parent), Some(b));
        assert!(doc.node(b).flags.contains(NodeFlags::FIRST_CHILD));
        assert!(doc.prev_sibling(b).is_none());
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let mut doc = Document::new();
        let a = elem(&mut doc, "a");
        let b = elem(&mut doc, "b");
        let c = elem(&mut doc, "c");
        let d = elem(&mut doc, "d");
        doc.link_append(doc.root(), a);
        doc.link_append(a, b);
        doc.link_append(b, c);
        doc.link_append(a, d);
        assert_eq!(doc.ancestors(c).collect::<Vec<_>>(), vec![b, a, doc.root()]);
        assert_eq!(doc.descendants_if_available(a).collect::<Vec<_>>(), vec![b, c, d]);
        assert_eq!(doc.descendants_if_available(b).collect::<Vec<_>>(), vec![c]);
        assert!(doc.is_inclusive_ancestor(a, c));
        assert!(!doc.is_inclusive_ancestor(c, a));
    }

    #[test]
    fn test_check_writable() {
        let mut doc = Document::new();
        let a = elem(&mut doc, "a");
        assert!(doc.check_writable(a).is_ok());
        doc.node_mut(a).flags.insert(NodeFlags::READ_ONLY);
        assert!(matches!(
            doc.check_writable(a),
            Err(DomError::NoModificationAllowed)
        ));
        let other = Document::new();
        assert!(matches!(
            other.check_writable(a),
            Err(DomError::WrongDocument)
        ));
    }
}

//! Attribute nodes and the per-element attribute map.
//!
//! An element's attributes are kept in an [`AttributeMap`]: one sequence
//! ordered by qualified name. Lookup by qualified name is a binary search
//! (O(log n)); lookup by (namespace URI, local name) is a linear scan
//! (O(n)) that compares qualified names when neither side has a namespace,
//! so attributes set through the DOM-1 calls are visible to the DOM-2 ones.

use std::cmp::Ordering;
use std::iter;

use super::namespace::Namespace;
use super::{Document, NodeFlags, NodeId, NodeKind};
use crate::error::DomError;

/// Attribute handles of one element, sorted by qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    items: Vec<NodeId>,
}

impl AttributeMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }

    pub(crate) fn insert_at(&mut self, index: usize, id: NodeId) {
        self.items.insert(index, id);
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        match self.items.iter().position(|&a| a == id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// A snapshot of an element's attributes, as returned by
/// [`Document::get_attributes`]. Includes namespace-declaration
/// pseudo-attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedNodeMap {
    items: Vec<NodeId>,
}

impl NamedNodeMap {
    #[must_use]
    pub fn length(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }

    /// Finds an item by qualified name.
    #[must_use]
    pub fn get_named_item(&self, doc: &Document, name: &str) -> Option<NodeId> {
        self.iter().find(|&a| doc.node_name(a) == name)
    }

    /// Finds an item by namespace URI and local name.
    #[must_use]
    pub fn get_named_item_ns(
        &self,
        doc: &Document,
        uri: Option<&str>,
        local_name: &str,
    ) -> Option<NodeId> {
        self.iter().find(|&a| doc.attr_matches_ns(a, uri, local_name))
    }
}

impl FromIterator<NodeId> for NamedNodeMap {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// A structural snapshot of an attribute: equal snapshots hash equally.
///
/// ```
/// use lazydom::Document;
///
/// let mut doc = Document::new();
/// let a = doc.create_attribute("id").unwrap();
/// let b = doc.create_attribute("id").unwrap();
/// doc.set_value(a, "5").unwrap();
/// doc.set_value(b, "5").unwrap();
/// assert_eq!(doc.attr_value(a), doc.attr_value(b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrValue {
    pub namespace: Option<Namespace>,
    pub local_name: String,
    pub value: String,
}

/// Compares `prefix:local` (or `local` for an empty prefix) against `name`
/// without allocating.
pub(crate) fn cmp_qname(prefix: &str, local: &str, name: &str) -> Ordering {
    if prefix.is_empty() {
        local.cmp(name)
    } else {
        prefix
            .bytes()
            .chain(iter::once(b':'))
            .chain(local.bytes())
            .cmp(name.bytes())
    }
}

impl Document {
    fn attr_parts(&self, attr: NodeId) -> Option<(&str, &str)> {
        match &self.node(attr).kind {
            NodeKind::Attribute {
                local_name,
                namespace,
                ..
            } => Some((namespace.as_ref().map_or("", Namespace::prefix), local_name)),
            _ => None,
        }
    }

    pub(crate) fn attribute_map(&self, el: NodeId) -> Option<&AttributeMap> {
        match &self.node(el).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub(crate) fn attribute_map_mut(&mut self, el: NodeId) -> Option<&mut AttributeMap> {
        match &mut self.node_mut(el).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Binary search for an attribute by qualified name.
    pub(crate) fn find_name_point(&self, el: NodeId, name: &str) -> Result<usize, usize> {
        let Some(map) = self.attribute_map(el) else {
            return Err(0);
        };
        map.items.binary_search_by(|&a| {
            self.attr_parts(a)
                .map_or(Ordering::Less, |(prefix, local)| cmp_qname(prefix, local, name))
        })
    }

    pub(crate) fn find_attribute(&self, el: NodeId, name: &str) -> Option<NodeId> {
        let pos = self.find_name_point(el, name).ok()?;
        self.attribute_map(el)?.get(pos)
    }

    pub(crate) fn attr_matches_ns(&self, attr: NodeId, uri: Option<&str>, local_name: &str) -> bool {
        let NodeKind::Attribute {
            local_name: name,
            namespace,
            ..
        } = &self.node(attr).kind
        else {
            return false;
        };
        let attr_uri = namespace.as_ref().map(Namespace::uri).filter(|u| !u.is_empty());
        match (uri.filter(|u| !u.is_empty()), attr_uri) {
            (Some(wanted), Some(have)) => wanted == have && name == local_name,
            (None, None) => self.node_name(attr) == local_name,
            _ => false,
        }
    }

    /// Linear search for an attribute by namespace URI and local name.
    pub(crate) fn find_attribute_ns(
        &self,
        el: NodeId,
        uri: Option<&str>,
        local_name: &str,
    ) -> Option<NodeId> {
        self.attribute_map(el)?
            .iter()
            .find(|&a| self.attr_matches_ns(a, uri, local_name))
    }

    /// The sorted position `attr` would take in `el`'s map.
    pub(crate) fn attr_insert_position(&self, el: NodeId, attr: NodeId) -> usize {
        let name = self.node_name(attr);
        match self.find_name_point(el, &name) {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Inserts an attribute into `el`'s map, displacing any attribute with
    /// the same qualified name or the same (namespace, local name). The
    /// displaced attributes are returned with their owner cleared.
    pub(crate) fn insert_attribute(&mut self, el: NodeId, attr: NodeId) -> Option<NodeId> {
        let name = self.node_name(attr);
        let (uri, local) = {
            let local = self.local_name(attr).unwrap_or_default().to_string();
            (self.namespace_uri(attr).map(str::to_string), local)
        };
        let mut displaced = None;
        if let Some(old) = self.find_attribute_ns(el, uri.as_deref(), &local) {
            if old != attr {
                self.release_attribute(el, old);
                displaced = Some(old);
            }
        }
        if let Some(old) = self.find_attribute(el, &name) {
            if old != attr {
                self.release_attribute(el, old);
                displaced = displaced.or(Some(old));
            }
        }
        let pos = {
            if let Some(map) = self.attribute_map_mut(el) {
                map.remove(attr);
            }
            self.attr_insert_position(el, attr)
        };
        if let Some(map) = self.attribute_map_mut(el) {
            map.insert_at(pos, attr);
        }
        let node = self.node_mut(attr);
        node.flags.insert(NodeFlags::OWNED);
        if let NodeKind::Attribute { owner, .. } = &mut node.kind {
            *owner = Some(el);
        }
        displaced
    }

    /// Removes an attribute from `el`'s map and clears its owner and ID
    /// registration.
    pub(crate) fn release_attribute(&mut self, el: NodeId, attr: NodeId) {
        if let Some(map) = self.attribute_map_mut(el) {
            map.remove(attr);
        }
        self.id_attrs.retain(|&a| a != attr);
        let node = self.node_mut(attr);
        node.flags.remove(NodeFlags::OWNED);
        if let NodeKind::Attribute { owner, is_id, .. } = &mut node.kind {
            *owner = None;
            *is_id = false;
        }
    }

    // -- Attribute node accessors --

    /// Returns the qualified name of an attribute.
    #[must_use]
    pub fn name(&self, attr: NodeId) -> Option<String> {
        matches!(self.node(attr).kind, NodeKind::Attribute { .. }).then(|| self.node_name(attr))
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn value(&self, attr: NodeId) -> Option<&str> {
        match &self.node(attr).kind {
            NodeKind::Attribute { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Sets the value of an attribute and marks it specified.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on a read-only attribute and
    /// `NotSupported` when `attr` is not an attribute.
    pub fn set_value(&mut self, attr: NodeId, new_value: &str) -> Result<(), DomError> {
        self.check_writable(attr)?;
        let node = self.node_mut(attr);
        match &mut node.kind {
            NodeKind::Attribute { value, .. } => {
                new_value.clone_into(value);
                node.flags.insert(NodeFlags::SPECIFIED);
                Ok(())
            }
            _ => Err(DomError::NotSupported("node is not an attribute")),
        }
    }

    /// Returns the element an attribute is attached to.
    #[must_use]
    pub fn owner_element(&self, attr: NodeId) -> Option<NodeId> {
        match self.node(attr).kind {
            NodeKind::Attribute { owner, .. } => owner,
            _ => None,
        }
    }

    /// Returns `true` if the attribute was given a value explicitly.
    #[must_use]
    pub fn specified(&self, attr: NodeId) -> bool {
        self.has_flag(attr, NodeFlags::SPECIFIED)
    }

    /// Returns `true` if the attribute is flagged as an ID.
    #[must_use]
    pub fn is_id(&self, attr: NodeId) -> bool {
        matches!(self.node(attr).kind, NodeKind::Attribute { is_id: true, .. })
    }

    /// Returns a hashable structural snapshot of an attribute.
    #[must_use]
    pub fn attr_value(&self, attr: NodeId) -> Option<AttrValue> {
        match &self.node(attr).kind {
            NodeKind::Attribute {
                local_name,
                namespace,
                value,
                ..
            } => Some(AttrValue {
                namespace: namespace.clone().filter(|ns| !ns.uri().is_empty()),
                local_name: local_name.clone(),
                value: value.clone(),
            }),
            _ => None,
        }
    }

    /// Structural attribute equality: namespace, local name and value.
    #[must_use]
    pub fn attr_equals(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        match (self.attr_value(a), other.attr_value(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

//! Tree editing: insertion, removal, replacement, cloning, and import.
//!
//! Every edit builds the affected container completely before changing any
//! link, so incremental building and editing never interleave.

use tracing::trace;

use super::{Document, NodeFlags, NodeId, NodeKind};
use crate::error::DomError;

impl Document {
    /// Validates inserting `new_child` into `parent`, optionally in place of
    /// `replaced`. Builds `parent` as a side effect.
    fn validate_insert(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
        replaced: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_owned(parent)?;
        self.check_owned(new_child)?;
        if let Some(r) = reference.or(replaced) {
            self.check_owned(r)?;
        }
        self.check_writable(parent)?;

        if !self.node(parent).kind.is_container() {
            return Err(DomError::HierarchyRequest("node cannot have children"));
        }
        match self.node(new_child).kind {
            NodeKind::Attribute { .. } => {
                return Err(DomError::HierarchyRequest("attributes are not children"));
            }
            NodeKind::Document => {
                return Err(DomError::HierarchyRequest("a document cannot be a child"));
            }
            NodeKind::DocumentType { .. } if parent != self.root => {
                return Err(DomError::HierarchyRequest(
                    "a document type belongs to the document node",
                ));
            }
            _ => {}
        }
        if self.is_inclusive_ancestor(new_child, parent) {
            return Err(DomError::HierarchyRequest(
                "node is an ancestor of the insertion point",
            ));
        }

        self.build(parent)?;
        if let Some(r) = reference.or(replaced) {
            if self.node(r).parent != Some(parent) {
                return Err(DomError::NotFound("reference node is not a child of this node"));
            }
        }
        if parent == self.root {
            self.validate_document_child(new_child, replaced)?;
        }
        Ok(())
    }

    fn validate_document_child(
        &self,
        new_child: NodeId,
        replaced: Option<NodeId>,
    ) -> Result<(), DomError> {
        let candidates: Vec<NodeId> = match self.node(new_child).kind {
            NodeKind::DocumentFragment => self.children_if_available(new_child).collect(),
            _ => vec![new_child],
        };
        let mut elements = 0;
        for &c in &candidates {
            match self.node(c).kind {
                NodeKind::Text { .. } | NodeKind::CData { .. } => {
                    return Err(DomError::HierarchyRequest(
                        "text is not allowed at document level",
                    ));
                }
                NodeKind::Element { .. } => elements += 1,
                _ => {}
            }
        }
        let existing = self
            .document_element
            .filter(|&e| Some(e) != replaced && e != new_child);
        if elements > 1 || (elements == 1 && existing.is_some()) {
            return Err(DomError::HierarchyRequest(
                "a document has at most one document element",
            ));
        }
        Ok(())
    }

    /// Removes a node from its current parent before it is re-inserted.
    fn take_from_parent(&mut self, id: NodeId) -> Result<(), DomError> {
        if let Some(old_parent) = self.node(id).parent {
            self.check_writable(old_parent)?;
            self.build(old_parent)?;
            self.unlink(id);
        }
        Ok(())
    }

    fn attach_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        match reference {
            Some(r) => self.link_before(r, child),
            None => self.link_append(parent, child),
        }
        if parent == self.root && self.is_element(child) {
            self.document_element = Some(child);
        }
    }

    /// Inserts `new_child` before `reference`, or at the end when
    /// `reference` is `None`. A fragment is spliced as its children.
    ///
    /// # Errors
    ///
    /// `WrongDocument`, `NoModificationAllowed`, `HierarchyRequest` (including
    /// cycle-forming inserts), and `NotFound` for a foreign reference node.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.validate_insert(parent, new_child, reference, None)?;
        if reference == Some(new_child) {
            return Ok(new_child);
        }
        if matches!(self.node(new_child).kind, NodeKind::DocumentFragment) {
            let kids: Vec<NodeId> = self.children_if_available(new_child).collect();
            for kid in kids {
                self.unlink(kid);
                self.attach_before(parent, kid, reference);
            }
        } else {
            self.take_from_parent(new_child)?;
            self.attach_before(parent, new_child, reference);
        }
        trace!(parent = ?parent, child = ?new_child, "inserted");
        Ok(new_child)
    }

    /// Appends a child.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_before`].
    pub fn append_child(&mut self, parent: NodeId, new_child: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, new_child, None)
    }

    /// Removes `old_child` from `parent` and returns it, detached but intact.
    ///
    /// # Errors
    ///
    /// `WrongDocument`, `NoModificationAllowed`, or `NotFound` when
    /// `old_child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, old_child: NodeId) -> Result<NodeId, DomError> {
        self.check_owned(old_child)?;
        self.check_writable(parent)?;
        self.build(parent)?;
        if self.node(old_child).parent != Some(parent) {
            return Err(DomError::NotFound("node is not a child of this node"));
        }
        self.unlink(old_child);
        Ok(old_child)
    }

    /// Replaces `old_child` with `new_child` and returns `old_child`.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_before`].
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError> {
        self.validate_insert(parent, new_child, None, Some(old_child))?;
        if new_child == old_child {
            return Ok(old_child);
        }
        if matches!(self.node(new_child).kind, NodeKind::DocumentFragment) {
            let kids: Vec<NodeId> = self.children_if_available(new_child).collect();
            for kid in kids {
                self.unlink(kid);
                self.attach_before(parent, kid, Some(old_child));
            }
        } else {
            self.take_from_parent(new_child)?;
            self.attach_before(parent, new_child, Some(old_child));
        }
        self.unlink(old_child);
        Ok(old_child)
    }

    /// Detaches a node from its parent after building the parent.
    ///
    /// # Errors
    ///
    /// `NotSupported` for attributes, `DomError::Om` for a node without a
    /// parent, and `NoModificationAllowed` for a read-only parent.
    pub fn detach(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        self.check_owned(id)?;
        if matches!(self.node(id).kind, NodeKind::Attribute { .. }) {
            return Err(DomError::NotSupported(
                "attributes are detached through their owner element",
            ));
        }
        let Some(parent) = self.node(id).parent else {
            return Err(DomError::Om("node has no parent to detach from".to_string()));
        };
        self.check_writable(parent)?;
        self.build(parent)?;
        self.unlink(id);
        Ok(id)
    }

    /// Inserts `sibling` directly before `id`.
    ///
    /// # Errors
    ///
    /// `DomError::Om` if `id` has no parent, plus the errors of
    /// [`Document::insert_before`].
    pub fn insert_sibling_before(&mut self, id: NodeId, sibling: NodeId) -> Result<(), DomError> {
        self.check_owned(id)?;
        let parent = self
            .node(id)
            .parent
            .ok_or_else(|| DomError::Om("node has no parent".to_string()))?;
        self.insert_before(parent, sibling, Some(id))?;
        Ok(())
    }

    /// Inserts `sibling` directly after `id`.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_sibling_before`].
    pub fn insert_sibling_after(&mut self, id: NodeId, sibling: NodeId) -> Result<(), DomError> {
        self.check_owned(id)?;
        let parent = self
            .node(id)
            .parent
            .ok_or_else(|| DomError::Om("node has no parent".to_string()))?;
        self.build(parent)?;
        let next = self.node(id).next_sibling;
        self.insert_before(parent, sibling, next)?;
        Ok(())
    }

    /// Appends a child, the object-model spelling of
    /// [`Document::append_child`].
    ///
    /// # Errors
    ///
    /// As [`Document::insert_before`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.append_child(parent, child)
    }

    /// Imports a node from another document and appends the copy.
    ///
    /// Unlike [`Document::import_node`], every node kind except documents
    /// is copied.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_before`], plus source cursor failures.
    pub fn add_foreign_child(
        &mut self,
        parent: NodeId,
        source: &mut Document,
        node: NodeId,
    ) -> Result<NodeId, DomError> {
        let copy = if source.id == self.id {
            node
        } else {
            self.import_subtree(source, node, true, false)?
        };
        self.append_child(parent, copy)
    }

    // -- Cloning --

    /// Copies a node. A deep clone materializes and copies the subtree.
    ///
    /// The copy is detached, writable, and never shares attributes or
    /// children with the source.
    ///
    /// # Errors
    ///
    /// `NotSupported` for the document node; cursor failures for a deep
    /// clone of an unbuilt node.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        self.check_owned(id)?;
        if matches!(self.node(id).kind, NodeKind::Document) {
            return Err(DomError::NotSupported("documents cannot be cloned"));
        }
        if deep {
            self.build(id)?;
        }
        Ok(self.clone_subtree(id, deep))
    }

    fn clone_subtree(&mut self, id: NodeId, deep: bool) -> NodeId {
        let copy = self.clone_shallow(id);
        if deep {
            let kids: Vec<NodeId> = self.children_if_available(id).collect();
            for kid in kids {
                let kid_copy = self.clone_subtree(kid, true);
                self.link_append(copy, kid_copy);
            }
        }
        copy
    }

    fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id);
        let mut kind = source.kind.clone();
        let flags = source.flags
            - (NodeFlags::OWNED | NodeFlags::READ_ONLY | NodeFlags::FIRST_CHILD);
        let attrs: Vec<NodeId> = match &mut kind {
            NodeKind::Element { attributes, .. } => {
                let ids = attributes.iter().collect();
                *attributes = super::AttributeMap::default();
                ids
            }
            NodeKind::Attribute { owner, is_id, .. } => {
                *owner = None;
                *is_id = false;
                Vec::new()
            }
            _ => Vec::new(),
        };
        let copy = self.create_node(kind);
        let node = self.node_mut(copy);
        node.flags = flags;
        if matches!(node.kind, NodeKind::Attribute { .. }) {
            node.flags.insert(NodeFlags::SPECIFIED);
        }
        for attr in attrs {
            let attr_copy = self.clone_shallow(attr);
            self.insert_attribute(copy, attr_copy);
        }
        copy
    }

    /// Deep-clones an element, the object-model spelling of
    /// `clone_node(el, true)`.
    ///
    /// # Errors
    ///
    /// As [`Document::clone_node`].
    pub fn clone_element(&mut self, el: NodeId) -> Result<NodeId, DomError> {
        self.clone_node(el, true)
    }

    // -- Import --

    /// Re-creates a node from `source` in this document.
    ///
    /// Elements, attributes, text, comments, and fragments are supported;
    /// other kinds fail with `NotSupported`, also when met among the
    /// children of a deep import. Importing from the same document clones.
    ///
    /// # Errors
    ///
    /// `NotSupported` as described, plus source cursor failures.
    pub fn import_node(
        &mut self,
        source: &mut Document,
        node: NodeId,
        deep: bool,
    ) -> Result<NodeId, DomError> {
        if source.id == self.id {
            return self.clone_node(node, deep);
        }
        self.import_subtree(source, node, deep, true)
    }

    fn import_subtree(
        &mut self,
        source: &mut Document,
        node: NodeId,
        deep: bool,
        strict: bool,
    ) -> Result<NodeId, DomError> {
        source.check_owned(node)?;
        let kind = match &source.node(node).kind {
            NodeKind::Document => {
                return Err(DomError::NotSupported("documents cannot be imported"));
            }
            NodeKind::CData { .. }
            | NodeKind::ProcessingInstruction { .. }
            | NodeKind::DocumentType { .. }
                if strict =>
            {
                return Err(DomError::NotSupported("node kind cannot be imported"));
            }
            NodeKind::Element {
                local_name,
                namespace,
                namespaces,
                line_number,
                ..
            } => NodeKind::Element {
                local_name: local_name.clone(),
                namespace: namespace.clone(),
                attributes: super::AttributeMap::default(),
                namespaces: namespaces.clone(),
                line_number: *line_number,
            },
            NodeKind::Attribute {
                local_name,
                namespace,
                value,
                ..
            } => NodeKind::attribute(local_name.clone(), namespace.clone(), value.clone()),
            other => other.clone(),
        };
        let attrs: Vec<NodeId> = source
            .attribute_map(node)
            .map(|m| m.iter().collect())
            .unwrap_or_default();
        let copy = self.create_node(kind);
        if matches!(self.node(copy).kind, NodeKind::Attribute { .. }) {
            self.node_mut(copy).flags.insert(NodeFlags::SPECIFIED);
        }
        for attr in attrs {
            let attr_copy = self.import_subtree(source, attr, false, strict)?;
            self.insert_attribute(copy, attr_copy);
        }
        if deep && self.node(copy).kind.is_container() {
            source.build(node)?;
            let kids: Vec<NodeId> = source.children_if_available(node).collect();
            for kid in kids {
                let kid_copy = self.import_subtree(source, kid, true, strict)?;
                self.link_append(copy, kid_copy);
            }
        }
        Ok(copy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(doc: &mut Document, parent: NodeId) -> Vec<String> {
        let kids = doc.child_nodes(parent).unwrap();
        kids.iter().map(|k| doc.node_name(k)).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.append_child(doc.root(), root).unwrap();
        for n in ["a", "b", "c"] {
            let el = doc.create_element(n).unwrap();
            doc.append_child(root, el).unwrap();
        }
        assert_eq!(names(&mut doc, root), vec!["a", "b", "c"]);
        assert_eq!(doc.document_element().unwrap(), Some(root));
    }

    #[test]
    fn test_insert_before_first_child() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let old = doc.create_element("old").unwrap();
        let new = doc.create_element("new").unwrap();
        doc.append_child(root, old).unwrap();
        doc.insert_before(root, new, Some(old)).unwrap();
        assert_eq!(doc.first_child(root).unwrap(), Some(new));
        assert!(doc.has_flag(new, NodeFlags::FIRST_CHILD));
        assert!(!doc.has_flag(old, NodeFlags::FIRST_CHILD));
        assert_eq!(doc.prev_sibling(old), Some(new));
        assert_eq!(doc.prev_sibling(new), None);
    }

    #[test]
    fn test_insert_moves_from_old_parent() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let x = doc.create_element("x").unwrap();
        doc.append_child(a, x).unwrap();
        doc.append_child(b, x).unwrap();
        assert!(!doc.has_child_nodes(a).unwrap());
        assert_eq!(doc.parent(x), Some(b));
    }

    #[test]
    fn test_fragment_is_spliced() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let last = doc.create_element("last").unwrap();
        doc.append_child(root, last).unwrap();
        let frag = doc.create_document_fragment();
        for n in ["f1", "f2"] {
            let el = doc.create_element(n).unwrap();
            doc.append_child(frag, el).unwrap();
        }
        doc.insert_before(root, frag, Some(last)).unwrap();
        assert_eq!(names(&mut doc, root), vec!["f1", "f2", "last"]);
        assert!(!doc.has_child_nodes(frag).unwrap());
    }

    #[test]
    fn test_cycle_forming_insert_is_rejected() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(a, b).unwrap();
        assert!(matches!(
            doc.append_child(b, a),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(a, a),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_second_document_element_is_rejected() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let text = doc.create_text_node("t");
        doc.append_child(doc.root(), a).unwrap();
        assert!(matches!(
            doc.append_child(doc.root(), b),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(doc.root(), text),
            Err(DomError::HierarchyRequest(_))
        ));
        let comment = doc.create_comment("ok");
        doc.append_child(doc.root(), comment).unwrap();
        doc.replace_child(doc.root(), b, a).unwrap();
        assert_eq!(doc.document_element().unwrap(), Some(b));
    }

    #[test]
    fn test_wrong_document_and_not_found() {
        let mut doc = Document::new();
        let mut other = Document::new();
        let a = doc.create_element("a").unwrap();
        let foreign = other.create_element("f").unwrap();
        let stranger = doc.create_element("s").unwrap();
        assert!(matches!(
            doc.append_child(a, foreign),
            Err(DomError::WrongDocument)
        ));
        let c = doc.create_element("c").unwrap();
        assert!(matches!(
            doc.insert_before(a, c, Some(stranger)),
            Err(DomError::NotFound(_))
        ));
        assert!(matches!(
            doc.remove_child(a, stranger),
            Err(DomError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_only_parent_rejects_edits() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.set_read_only(a, true);
        assert!(matches!(
            doc.append_child(a, b),
            Err(DomError::NoModificationAllowed)
        ));
    }

    #[test]
    fn test_detach_only_child() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(a, b).unwrap();
        doc.detach(b).unwrap();
        assert_eq!(doc.first_child(a).unwrap(), None);
        assert_eq!(doc.last_child(a).unwrap(), None);
        assert!(!doc.has_child_nodes(a).unwrap());
        assert!(matches!(doc.detach(b), Err(DomError::Om(_))));
    }

    #[test]
    fn test_detach_attribute_not_supported() {
        let mut doc = Document::new();
        let attr = doc.create_attribute("a").unwrap();
        assert!(matches!(doc.detach(attr), Err(DomError::NotSupported(_))));
    }

    #[test]
    fn test_insert_siblings() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let mid = doc.create_element("mid").unwrap();
        doc.append_child(root, mid).unwrap();
        let before = doc.create_element("before").unwrap();
        let after = doc.create_element("after").unwrap();
        doc.insert_sibling_before(mid, before).unwrap();
        doc.insert_sibling_after(mid, after).unwrap();
        assert_eq!(names(&mut doc, root), vec!["before", "mid", "after"]);
    }

    #[test]
    fn test_clone_is_isolated() {
        let mut doc = Document::parse_str("<r a=\"1\"><c>text</c></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let copy = doc.clone_node(r, true).unwrap();
        assert!(doc.is_equal_subtree(r, &doc, copy));
        assert!(doc.parent(copy).is_none());
        doc.set_attribute(copy, "a", "2").unwrap();
        assert_eq!(doc.get_attribute(r, "a"), Some("1"));
        let copy_attr = doc.get_attribute_node(copy, "a").unwrap();
        assert_eq!(doc.owner_element(copy_attr), Some(copy));

        let shallow = doc.clone_node(r, false).unwrap();
        assert!(!doc.has_child_nodes(shallow).unwrap());
        assert!(matches!(
            doc.clone_node(doc.root(), true),
            Err(DomError::NotSupported(_))
        ));
    }

    #[test]
    fn test_import_node() {
        let mut source = Document::parse_str("<r xmlns:p=\"urn:p\" p:a=\"1\"><c>t</c></r>").unwrap();
        let r = source.document_element().unwrap().unwrap();
        let mut doc = Document::new();
        let copy = doc.import_node(&mut source, r, true).unwrap();
        assert!(doc.is_equal_subtree(copy, &source, r));
        assert_eq!(doc.get_attribute_ns(copy, Some("urn:p"), "a"), Some("1"));

        let shallow = doc.import_node(&mut source, r, false).unwrap();
        assert!(!doc.has_child_nodes(shallow).unwrap());
    }

    #[test]
    fn test_import_unsupported_kinds() {
        let mut source = Document::parse_str("<r><![CDATA[x]]><?pi d?></r>").unwrap();
        let r = source.document_element().unwrap().unwrap();
        let cdata = source.first_child(r).unwrap().unwrap();
        let mut doc = Document::new();
        assert!(matches!(
            doc.import_node(&mut source, cdata, false),
            Err(DomError::NotSupported(_))
        ));
        assert!(matches!(
            doc.import_node(&mut source, r, true),
            Err(DomError::NotSupported(_))
        ));
        let holder = doc.create_element("holder").unwrap();
        doc.add_foreign_child(holder, &mut source, r).unwrap();
        assert_eq!(doc.child_nodes(holder).unwrap().length(), 1);
    }

    #[test]
    fn test_mutation_forces_build() {
        let mut doc = Document::parse_deferred("<r><a/><b/><c/></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let extra = doc.create_element("extra").unwrap();
        doc.append_child(r, extra).unwrap();
        assert!(doc.is_complete(r));
        assert_eq!(names(&mut doc, r), vec!["a", "b", "c", "extra"]);
    }
}

//! Structural node equality, across documents.

use super::namespace::Namespace;
use super::{AttrValue, Document, NodeId, NodeKind, NodeType};
use crate::util::qname::XMLNS_NAMESPACE;

impl Document {
    /// The attribute view compared by [`Document::is_equal_node`]: real
    /// attributes plus one pseudo-attribute per namespace declaration,
    /// sorted so that order does not matter.
    fn attribute_view(&self, el: NodeId) -> Vec<AttrValue> {
        let mut view: Vec<AttrValue> = self
            .all_attributes(el)
            .iter()
            .filter_map(|&a| self.attr_value(a))
            .collect();
        if let NodeKind::Element { namespaces, .. } = &self.node(el).kind {
            view.extend(namespaces.values().map(|ns| {
                if ns.prefix().is_empty() {
                    AttrValue {
                        namespace: Some(Namespace::new(XMLNS_NAMESPACE, "")),
                        local_name: "xmlns".to_string(),
                        value: ns.uri().to_string(),
                    }
                } else {
                    AttrValue {
                        namespace: Some(Namespace::new(XMLNS_NAMESPACE, "xmlns")),
                        local_name: ns.prefix().to_string(),
                        value: ns.uri().to_string(),
                    }
                }
            }));
        }
        view.sort();
        view
    }

    /// DOM node equality: same type, name, local name, namespace URI,
    /// prefix, and value. Elements also compare their attributes and
    /// namespace declarations regardless of order; document types compare
    /// their identifiers. Children, parents, and flags are not compared.
    ///
    /// `other` may be this document or another one.
    #[must_use]
    pub fn is_equal_node(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        if self.node_type(a) != other.node_type(b)
            || self.node_name(a) != other.node_name(b)
            || self.local_name(a) != other.local_name(b)
            || self.namespace_uri(a) != other.namespace_uri(b)
            || self.prefix(a) != other.prefix(b)
            || self.node_value(a) != other.node_value(b)
        {
            return false;
        }
        match self.node_type(a) {
            NodeType::Element => self.attribute_view(a) == other.attribute_view(b),
            NodeType::DocumentType => {
                self.public_id(a) == other.public_id(b)
                    && self.system_id(a) == other.system_id(b)
                    && self.internal_subset(a) == other.internal_subset(b)
            }
            _ => true,
        }
    }

    /// [`Document::is_equal_node`] applied to the whole materialized
    /// subtree: children must be pairwise equal and in the same order.
    #[must_use]
    pub fn is_equal_subtree(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            if !self.is_equal_node(x, other, y) {
                return false;
            }
            let mut left = self.children_if_available(x);
            let mut right = other.children_if_available(y);
            loop {
                match (left.next(), right.next()) {
                    (Some(l), Some(r)) => stack.push((l, r)),
                    (None, None) => break,
                    _ => return false,
                }
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn root_of(doc: &mut Document) -> NodeId {
        doc.document_element().unwrap().unwrap()
    }

    #[test]
    fn test_attribute_order_is_ignored() {
        let mut a = Document::parse_str("<e x=\"1\" y=\"2\" xmlns:p=\"urn:p\"/>").unwrap();
        let mut b = Document::parse_str("<e xmlns:p=\"urn:p\" y=\"2\" x=\"1\"/>").unwrap();
        let (ea, eb) = (root_of(&mut a), root_of(&mut b));
        assert!(a.is_equal_node(ea, &b, eb));
    }

    #[test]
    fn test_namespace_declarations_are_compared() {
        let mut a = Document::parse_str("<e xmlns:p=\"urn:p\"/>").unwrap();
        let mut b = Document::parse_str("<e xmlns:p=\"urn:q\"/>").unwrap();
        let (ea, eb) = (root_of(&mut a), root_of(&mut b));
        assert!(!a.is_equal_node(ea, &b, eb));
    }

    #[test]
    fn test_children_only_compared_by_subtree() {
        let mut a = Document::parse_str("<e><x/></e>").unwrap();
        let mut b = Document::parse_str("<e><y/></e>").unwrap();
        let (ea, eb) = (root_of(&mut a), root_of(&mut b));
        assert!(a.is_equal_node(ea, &b, eb));
        assert!(!a.is_equal_subtree(ea, &b, eb));
        assert!(a.is_equal_subtree(a.root(), &a, a.root()));
    }

    #[test]
    fn test_values_and_kinds_differ() {
        let mut doc = Document::new();
        let t1 = doc.create_text_node("a");
        let t2 = doc.create_text_node("a");
        let t3 = doc.create_text_node("b");
        let c = doc.create_comment("a");
        assert!(doc.is_equal_node(t1, &doc, t2));
        assert!(!doc.is_equal_node(t1, &doc, t3));
        assert!(!doc.is_equal_node(t1, &doc, c));
    }
}

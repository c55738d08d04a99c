//! End-to-end tests of the DOM editing surface: ordering, attribute
//! ownership, clone isolation, and the insert / detach scenarios.

#![allow(clippy::unwrap_used)]

use lazydom::tree::{NodeFlags, NodeKind};
use lazydom::{Document, DomError, NodeId};
use pretty_assertions::assert_eq;

fn names(doc: &Document, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    ids.into_iter().map(|id| doc.node_name(id)).collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_a_create_and_set_attribute() {
    let mut doc = Document::new();
    let root = doc.create_element_ns(Some("http://example.com"), "root").unwrap();
    doc.append_child(doc.root(), root).unwrap();
    let child = doc.create_element("child").unwrap();
    doc.append_child(root, child).unwrap();
    doc.set_attribute(child, "a", "1").unwrap();

    assert_eq!(doc.get_attribute(child, "a"), Some("1"));
    assert_eq!(doc.get_attributes(child).length(), 1);
    assert_eq!(doc.namespace_uri(root), Some("http://example.com"));
}

#[test]
fn test_scenario_b_streamed_namespaced_attribute() {
    let mut doc = Document::parse_deferred("<e xmlns:p=\"urn:x\" p:foo=\"bar\"/>").unwrap();
    let e = doc.document_element().unwrap().unwrap();

    assert_eq!(doc.get_attribute_ns(e, Some("urn:x"), "foo"), Some("bar"));
    let view = doc.get_attributes(e);
    assert_eq!(view.length(), 2);
    let real: Vec<_> = view
        .iter()
        .filter(|&a| doc.namespace_uri(a) != Some("http://www.w3.org/2000/xmlns/"))
        .collect();
    assert_eq!(real.len(), 1);
    assert_eq!(doc.name(real[0]).as_deref(), Some("p:foo"));
    let decl = view.get_named_item(&doc, "xmlns:p").unwrap();
    assert_eq!(doc.value(decl), Some("urn:x"));
}

#[test]
fn test_scenario_c_insert_before_first_child() {
    let mut doc = Document::parse_str("<r><old/><next/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let old = doc.first_child(r).unwrap().unwrap();
    assert!(doc.has_flag(old, NodeFlags::FIRST_CHILD));

    let new = doc.create_element("new").unwrap();
    doc.insert_before(r, new, Some(old)).unwrap();

    assert_eq!(doc.first_child(r).unwrap(), Some(new));
    assert!(doc.has_flag(new, NodeFlags::FIRST_CHILD));
    assert!(!doc.has_flag(old, NodeFlags::FIRST_CHILD));
    assert_eq!(doc.prev_sibling(old), Some(new));
    assert_eq!(doc.prev_sibling(new), None);
    let children = doc.child_nodes(r).unwrap();
    assert_eq!(names(&doc, children), vec!["new", "old", "next"]);
}

#[test]
fn test_scenario_c_old_first_child_loses_prev_when_removed() {
    let mut doc = Document::parse_str("<r><a/><b/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.first_child(r).unwrap().unwrap();
    let b = doc.next_sibling(a).unwrap().unwrap();
    doc.remove_child(r, a).unwrap();
    assert_eq!(doc.prev_sibling(b), None);
    assert!(doc.has_flag(b, NodeFlags::FIRST_CHILD));
}

#[test]
fn test_scenario_d_detach_only_child() {
    let mut doc = Document::parse_deferred("<r><only/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let only = doc.first_child(r).unwrap().unwrap();
    doc.detach(only).unwrap();

    assert_eq!(doc.first_child_if_available(r), None);
    assert_eq!(doc.last_child(r).unwrap(), None);
    assert!(!doc.has_child_nodes(r).unwrap());
    assert_eq!(doc.parent(only), None);
    assert!(doc.is_complete(r));
}

#[test]
fn test_scenario_e_independent_attributes_are_equal() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut doc = Document::new();
    let a = doc.create_attribute("id").unwrap();
    let b = doc.create_attribute("id").unwrap();
    doc.set_value(a, "5").unwrap();
    doc.set_value(b, "5").unwrap();
    assert!(doc.attr_equals(a, &doc, b));

    let hash = |id| {
        let mut h = DefaultHasher::new();
        doc.attr_value(id).unwrap().hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(a), hash(b));

    let mut other = Document::new();
    let c = other.create_attribute("id").unwrap();
    other.set_value(c, "5").unwrap();
    assert!(doc.attr_equals(a, &other, c));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_append_order_is_preserved() {
    for streamed in [false, true] {
        let mut doc = if streamed {
            Document::parse_deferred("<r><s1/><s2/></r>").unwrap()
        } else {
            let mut doc = Document::new();
            let r = doc.create_element("r").unwrap();
            doc.append_child(doc.root(), r).unwrap();
            doc
        };
        let r = doc.document_element().unwrap().unwrap();
        let before = doc.child_nodes(r).unwrap().length();
        let appended: Vec<NodeId> = (0..5)
            .map(|i| {
                let el = doc.create_element(&format!("n{i}")).unwrap();
                doc.append_child(r, el).unwrap();
                el
            })
            .collect();
        let children: Vec<NodeId> = doc.child_nodes(r).unwrap().into();
        assert_eq!(&children[before..], appended.as_slice());
    }
}

#[test]
fn test_attribute_ownership_is_exclusive() {
    let mut doc = Document::parse_str("<r><a/><b/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.first_child(r).unwrap().unwrap();
    let b = doc.next_sibling(a).unwrap().unwrap();
    let attr = doc.create_attribute("k").unwrap();

    doc.set_attribute_node(a, attr).unwrap();
    let err = doc.set_attribute_node(b, attr).unwrap_err();
    assert!(matches!(err, DomError::InUseAttribute));
    assert_eq!(err.code(), Some(10));
    assert_eq!(doc.set_attribute_node(a, attr).unwrap(), Some(attr));
    assert_eq!(doc.owner_element(attr), Some(a));
    assert!(!doc.has_attribute(b, "k"));
}

#[test]
fn test_deep_clone_is_equal_and_isolated() {
    let mut doc = Document::parse_str(
        "<r xmlns:p=\"urn:p\"><p:a x=\"1\">text<b/></p:a><!--c--></r>",
    )
    .unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let copy = doc.clone_node(r, true).unwrap();
    assert!(doc.is_equal_subtree(copy, &doc, r));
    assert_eq!(doc.parent(copy), None);

    let copy_a = doc.first_child(copy).unwrap().unwrap();
    let orig_a = doc.first_child(r).unwrap().unwrap();
    assert_ne!(copy_a, orig_a);
    doc.set_attribute(copy_a, "x", "2").unwrap();
    let text = doc.first_child(copy_a).unwrap().unwrap();
    doc.set_data(text, "changed").unwrap();
    let extra = doc.create_element("extra").unwrap();
    doc.append_child(copy, extra).unwrap();

    assert_eq!(doc.get_attribute(orig_a, "x"), Some("1"));
    assert_eq!(doc.text_content(orig_a).unwrap().as_deref(), Some("text"));
    assert_eq!(doc.child_nodes(r).unwrap().length(), 2);
    assert!(!doc.is_equal_subtree(copy, &doc, r));
}

#[test]
fn test_shallow_clone_is_empty() {
    let mut doc = Document::parse_str("<r a=\"1\"><x/><y/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let copy = doc.clone_node(r, false).unwrap();
    assert!(!doc.has_child_nodes(copy).unwrap());
    assert_eq!(doc.get_attribute(copy, "a"), Some("1"));
    assert!(doc.is_equal_node(copy, &doc, r));
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

#[test]
fn test_cycle_forming_insert_is_rejected() {
    let mut doc = Document::parse_str("<r><a><b/></a></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.first_child(r).unwrap().unwrap();
    let b = doc.first_child(a).unwrap().unwrap();

    assert_eq!(doc.append_child(b, a).unwrap_err().code(), Some(3));
    assert_eq!(doc.append_child(a, a).unwrap_err().code(), Some(3));
    assert!(matches!(
        doc.replace_child(b, r, a),
        Err(DomError::HierarchyRequest(_))
    ));
    // The tree is unchanged.
    assert_eq!(doc.parent(b), Some(a));
    assert_eq!(doc.parent(a), Some(r));
}

#[test]
fn test_hierarchy_errors() {
    let mut doc = Document::parse_str("<r><a/></r>").unwrap();
    let second = doc.create_element("second").unwrap();
    assert_eq!(doc.append_child(doc.root(), second).unwrap_err().code(), Some(3));
    let text = doc.create_text_node("x");
    assert_eq!(doc.append_child(text, second).unwrap_err().code(), Some(3));
}

#[test]
fn test_not_found_and_wrong_document() {
    let mut doc = Document::parse_str("<r><a/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let stray = doc.create_element("stray").unwrap();
    assert_eq!(doc.remove_child(r, stray).unwrap_err().code(), Some(8));

    let mut other = Document::new();
    let foreign = other.create_element("f").unwrap();
    assert!(matches!(
        doc.append_child(r, foreign),
        Err(DomError::WrongDocument)
    ));
    let imported = doc.import_node(&mut other, foreign, true).unwrap();
    doc.append_child(r, imported).unwrap();
    assert_eq!(doc.child_nodes(r).unwrap().length(), 2);
}

#[test]
fn test_read_only_nodes_reject_every_setter() {
    let mut doc = Document::parse_str("<r a=\"1\">t</r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let t = doc.first_child(r).unwrap().unwrap();
    doc.set_read_only(r, true);
    doc.set_read_only(t, true);

    let ro = |res: Result<(), DomError>| matches!(res, Err(DomError::NoModificationAllowed));
    assert!(ro(doc.set_attribute(r, "a", "2")));
    assert!(ro(doc.remove_attribute(r, "a")));
    assert!(ro(doc.set_prefix(r, None)));
    assert!(ro(doc.set_data(t, "u")));
    assert!(ro(doc.set_text_content(r, "u")));
    let el = doc.create_element("x").unwrap();
    assert!(matches!(
        doc.append_child(r, el),
        Err(DomError::NoModificationAllowed)
    ));
    assert_eq!(doc.get_attribute(r, "a"), Some("1"));
}

#[test]
fn test_fragment_is_spliced_flat() {
    let mut doc = Document::parse_str("<r><end/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let end = doc.first_child(r).unwrap().unwrap();
    let frag = doc.create_document_fragment();
    for name in ["a", "b"] {
        let el = doc.create_element(name).unwrap();
        doc.append_child(frag, el).unwrap();
    }
    doc.insert_before(r, frag, Some(end)).unwrap();
    let children = doc.child_nodes(r).unwrap();
    assert_eq!(names(&doc, children), vec!["a", "b", "end"]);
    assert!(!doc.has_child_nodes(frag).unwrap());
    assert!(matches!(doc.node(frag).kind, NodeKind::DocumentFragment));
}

#[test]
fn test_get_element_by_id() {
    let mut doc = Document::parse_str("<r><a key=\"one\"/><b key=\"two\"/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let b = doc.child_elements(r).unwrap()[1];
    doc.set_id_attribute(b, "key", true).unwrap();
    assert_eq!(doc.get_element_by_id("two"), Some(b));
    assert_eq!(doc.get_element_by_id("one"), None);
}

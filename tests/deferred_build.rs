//! Deferred building: lazily navigated trees must match eagerly parsed
//! ones, and discard / close / consume must leave a consistent tree.

#![allow(clippy::unwrap_used)]

use lazydom::reader::{collect_events, EventQueue, StreamReader, XmlEvent};
use lazydom::tree::BuildStep;
use lazydom::{Document, DomError, NodeId};
use pretty_assertions::assert_eq;

const SAMPLE: &str = "<?xml version=\"1.0\"?>\n\
<!-- header -->\n\
<catalog xmlns=\"urn:books\" xmlns:x=\"urn:extra\">\n\
  <book id=\"b1\" x:rating=\"5\"><title>Rust</title><![CDATA[<raw>]]></book>\n\
  <book id=\"b2\"><title>XML</title><?note keep?></book>\n\
  <empty/>\n\
</catalog>\n\
<!-- trailer -->";

fn describe(doc: &Document, id: NodeId) -> String {
    let attrs: Vec<String> = doc
        .all_attributes(id)
        .iter()
        .map(|&a| format!("{}={}", doc.node_name(a), doc.value(a).unwrap_or("")))
        .collect();
    format!(
        "{}|{:?}|{:?}|{}",
        doc.node_name(id),
        doc.namespace_uri(id),
        doc.node_value(id),
        attrs.join(",")
    )
}

/// Walks the tree with the cursor-driving accessors only.
fn lazy_shape(doc: &mut Document, id: NodeId, out: &mut Vec<String>) {
    out.push(describe(doc, id));
    let mut child = doc.first_child(id).unwrap();
    while let Some(c) = child {
        lazy_shape(doc, c, out);
        child = doc.next_sibling(c).unwrap();
    }
    out.push("/".to_string());
}

/// Walks only what is already materialized.
fn eager_shape(doc: &Document, id: NodeId, out: &mut Vec<String>) {
    out.push(describe(doc, id));
    for c in doc.children_if_available(id) {
        eager_shape(doc, c, out);
    }
    out.push("/".to_string());
}

// ---------------------------------------------------------------------------
// Lazy vs eager
// ---------------------------------------------------------------------------

#[test]
fn test_lazy_navigation_matches_eager_parse() {
    let eager = Document::parse_str(SAMPLE).unwrap();
    let mut expected = Vec::new();
    eager_shape(&eager, eager.root(), &mut expected);

    let mut lazy = Document::parse_deferred(SAMPLE).unwrap();
    let mut actual = Vec::new();
    let root = lazy.root();
    lazy_shape(&mut lazy, root, &mut actual);

    assert_eq!(actual, expected);
    assert!(lazy.is_complete(root));
    assert!(!lazy.is_building());
}

#[test]
fn test_out_of_order_navigation_matches_eager_parse() {
    let eager = Document::parse_str(SAMPLE).unwrap();
    let mut lazy = Document::parse_deferred(SAMPLE).unwrap();

    // Jump to the second book's title before looking at the first book.
    let catalog = lazy.document_element().unwrap().unwrap();
    let books = lazy.children_with_local_name(catalog, "book").unwrap();
    let second = books.item(1).unwrap();
    let title = lazy.first_element(second).unwrap().unwrap();
    assert_eq!(lazy.get_text(title).unwrap(), "XML");

    lazy.build(lazy.root()).unwrap();
    let mut expected = Vec::new();
    let mut actual = Vec::new();
    eager_shape(&eager, eager.root(), &mut expected);
    eager_shape(&lazy, lazy.root(), &mut actual);
    assert_eq!(actual, expected);
}

#[test]
fn test_document_metadata_available_before_building() {
    let doc = Document::parse_deferred("<?xml version=\"1.1\" standalone=\"yes\"?><r/>").unwrap();
    assert_eq!(doc.version.as_deref(), Some("1.1"));
    assert_eq!(doc.standalone, Some(true));
    assert!(doc.document_element_if_available().is_none());
}

#[test]
fn test_build_next_reports_steps() {
    let mut doc = Document::from_source(Box::new(EventQueue::new(vec![
        XmlEvent::StartDocument {
            version: Some("1.0".into()),
            encoding: None,
            standalone: None,
        },
        XmlEvent::start("r"),
        XmlEvent::Characters("t".into()),
        XmlEvent::EndElement,
        XmlEvent::EndDocument,
    ])))
    .unwrap();

    let BuildStep::Materialized(r) = doc.build_next().unwrap() else {
        panic!("expected the document element");
    };
    assert!(matches!(doc.build_next().unwrap(), BuildStep::Materialized(_)));
    assert_eq!(doc.build_next().unwrap(), BuildStep::Closed(r));
    assert_eq!(doc.build_next().unwrap(), BuildStep::Closed(doc.root()));
    assert_eq!(doc.build_next().unwrap(), BuildStep::Finished);
    assert!(doc.is_complete(doc.root()));
}

#[test]
fn test_programmatic_document_is_complete() {
    let mut doc = Document::new();
    assert!(doc.is_complete(doc.root()));
    assert!(!doc.is_building());
    assert_eq!(doc.build_next().unwrap(), BuildStep::Finished);
}

// ---------------------------------------------------------------------------
// Editing a partially built tree
// ---------------------------------------------------------------------------

#[test]
fn test_append_to_unbuilt_container_builds_it_first() {
    let mut doc = Document::parse_deferred("<r><a/><b/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let extra = doc.create_element("extra").unwrap();
    doc.append_child(r, extra).unwrap();

    let names: Vec<String> = doc
        .child_nodes(r)
        .unwrap()
        .iter()
        .map(|c| doc.node_name(c))
        .collect();
    assert_eq!(names, vec!["a", "b", "extra"]);
}

#[test]
fn test_discard_then_continue() {
    let xml = "<r><skip><deep><deeper/></deep>text</skip><keep>k</keep></r>";
    let mut doc = Document::parse_deferred(xml).unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let skip = doc.first_child(r).unwrap().unwrap();
    let deep = doc.first_child(skip).unwrap().unwrap();
    assert_eq!(doc.node_name(deep), "deep");

    doc.discard(skip).unwrap();
    let keep = doc.first_child(r).unwrap().unwrap();
    assert_eq!(doc.node_name(keep), "keep");
    assert_eq!(doc.get_text(keep).unwrap(), "k");
    assert_eq!(doc.child_nodes(r).unwrap().length(), 1);
    assert!(doc.is_complete(deep));
}

#[test]
fn test_discard_read_only_is_rejected() {
    let mut doc = Document::parse_deferred("<r><a/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.first_child(r).unwrap().unwrap();
    doc.set_read_only(a, true);
    assert!(matches!(doc.discard(a), Err(DomError::NoModificationAllowed)));
}

#[test]
fn test_close_without_building_truncates() {
    let mut doc = Document::parse_deferred("<r><a/><b/><c/></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.first_child(r).unwrap().unwrap();
    doc.close(false).unwrap();
    assert_eq!(doc.child_nodes(r).unwrap().as_slice(), &[a]);
    assert!(!doc.is_building());
}

#[test]
fn test_malformed_input_fails_when_reached() {
    let mut doc = Document::parse_deferred("<r><ok/><bad></r>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let ok = doc.first_child(r).unwrap().unwrap();
    assert_eq!(doc.node_name(ok), "ok");
    assert!(matches!(doc.child_nodes(r), Err(DomError::Parse(_))));
}

// ---------------------------------------------------------------------------
// Pull-reading a tree
// ---------------------------------------------------------------------------

#[test]
fn test_consuming_reader_matches_tokenizer() {
    let xml = "<r a=\"1\"><x>1</x><y><z/></y></r>";
    let expected = collect_events(&mut StreamReader::new(xml)).unwrap();

    let mut doc = Document::parse_deferred(xml).unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let _x = doc.first_child(r).unwrap().unwrap();
    let root = doc.root();
    let mut actual = Vec::new();
    {
        let mut reader = doc.stream_reader(root, false).unwrap();
        assert!(!reader.is_caching());
        while let Some(event) = reader.read_next().unwrap() {
            actual.push(event);
        }
    }
    let kinds = |events: &[XmlEvent]| events.iter().map(XmlEvent::kind).collect::<Vec<_>>();
    assert_eq!(kinds(&actual), kinds(&expected));
    assert_eq!(actual, expected);
    // Only what was built before reading is in the tree.
    assert_eq!(doc.child_nodes(r).unwrap().length(), 1);
}

#[test]
fn test_caching_reader_builds_tree() {
    let xml = "<r><x>1</x><y/></r>";
    let mut doc = Document::parse_deferred(xml).unwrap();
    let root = doc.root();
    let count = {
        let mut reader = doc.stream_reader(root, true).unwrap();
        let mut n = 0;
        while reader.read_next().unwrap().is_some() {
            n += 1;
        }
        n
    };
    assert_eq!(count, 9);
    assert!(doc.is_complete(root));
    let r = doc.document_element().unwrap().unwrap();
    assert_eq!(doc.child_nodes(r).unwrap().length(), 2);
}

#[test]
fn test_attribute_reader_not_supported() {
    let mut doc = Document::parse_str("<r a=\"1\"/>").unwrap();
    let r = doc.document_element().unwrap().unwrap();
    let a = doc.get_attribute_node(r, "a").unwrap();
    assert!(matches!(
        doc.stream_reader(a, true),
        Err(DomError::NotSupported(_))
    ));
}

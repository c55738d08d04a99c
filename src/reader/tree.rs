//! A pull reader over a document subtree.

use tracing::debug;

use super::{EventAttribute, EventSource, XmlEvent};
use crate::error::{DomError, ParseError};
use crate::tree::{Document, NodeId, NodeKind};

/// One open container of the walk.
#[derive(Debug)]
struct Frame {
    container: NodeId,
    /// The child reported last, `None` before the first child.
    last: Option<NodeId>,
    /// Set once the materialized children are exhausted and the rest of
    /// the container is read straight from the document's cursor.
    passing: bool,
    /// Elements opened by pass-through events inside this container.
    depth: usize,
}

/// Reports a node and its descendants as [`XmlEvent`]s in document order.
///
/// With caching enabled, unbuilt content is materialized as it is read and
/// the tree is complete afterwards. Without caching, materialized content is
/// replayed and the remainder is taken from the document's cursor without
/// being built; those nodes never appear in the tree.
///
/// Created by [`Document::stream_reader`].
///
/// # Examples
///
/// ```
/// use lazydom::reader::XmlEvent;
/// use lazydom::Document;
///
/// let mut doc = Document::parse_deferred("<a><b/>text</a>").unwrap();
/// let root = doc.root();
/// let mut reader = doc.stream_reader(root, true).unwrap();
/// let mut events = Vec::new();
/// while let Some(event) = reader.read_next().unwrap() {
///     events.push(event);
/// }
/// assert_eq!(events.len(), 7);
/// assert_eq!(events[4], XmlEvent::Characters("text".into()));
/// ```
pub struct TreeReader<'a> {
    doc: &'a mut Document,
    root: NodeId,
    cache: bool,
    started: bool,
    stack: Vec<Frame>,
}

impl<'a> TreeReader<'a> {
    /// Creates a reader without checking whether the document can be
    /// consumed.
    pub(crate) fn new_unchecked(doc: &'a mut Document, root: NodeId, cache: bool) -> Self {
        Self {
            doc,
            root,
            cache,
            started: false,
            stack: Vec::new(),
        }
    }

    /// Returns `true` if this reader materializes unbuilt content.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache
    }

    /// Returns the next event, or `None` once the subtree is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures and reports `DomError::Om` if the cursor
    /// ends inside an element.
    pub fn read_next(&mut self) -> Result<Option<XmlEvent>, DomError> {
        if !self.started {
            self.started = true;
            let root = self.root;
            let event = self.start_event(root);
            if self.doc.node(root).kind.is_container() {
                self.stack.push(Frame {
                    container: root,
                    last: None,
                    passing: false,
                    depth: 0,
                });
            }
            if event.is_some() {
                return Ok(event);
            }
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            if frame.passing {
                return self.pass_through();
            }
            let next = match (frame.last, self.cache) {
                (None, true) => self.doc.first_child(frame.container)?,
                (Some(last), true) => self.doc.next_sibling(last)?,
                (None, false) => self.doc.first_child_if_available(frame.container),
                (Some(last), false) => self.doc.next_sibling_if_available(last),
            };
            match next {
                Some(child) => {
                    frame.last = Some(child);
                    let event = self.start_event(child);
                    if self.doc.is_element(child) {
                        self.stack.push(Frame {
                            container: child,
                            last: None,
                            passing: false,
                            depth: 0,
                        });
                    }
                    if event.is_some() {
                        return Ok(event);
                    }
                }
                None if !self.cache && !self.doc.is_complete(frame.container) => {
                    debug!(node = ?frame.container, "passing unbuilt content through");
                    frame.passing = true;
                }
                None => {
                    let container = frame.container;
                    self.stack.pop();
                    if let Some(event) = self.end_event(container) {
                        return Ok(Some(event));
                    }
                }
            }
        }
    }

    fn pass_through(&mut self) -> Result<Option<XmlEvent>, DomError> {
        let event = self.doc.pass_through_next()?;
        let Some(frame) = self.stack.last_mut() else {
            return Ok(None);
        };
        match event {
            Some(XmlEvent::StartElement { .. }) => frame.depth += 1,
            Some(XmlEvent::EndElement) if frame.depth > 0 => frame.depth -= 1,
            Some(XmlEvent::EndElement) => {
                self.stack.pop();
            }
            Some(XmlEvent::EndDocument) => self.stack.clear(),
            Some(_) => {}
            None => {
                let container = frame.container;
                self.stack.clear();
                return match self.doc.node(container).kind {
                    NodeKind::Document => Ok(Some(XmlEvent::EndDocument)),
                    _ => Err(DomError::Om(
                        "cursor ended inside an element being read".to_string(),
                    )),
                };
            }
        }
        Ok(event)
    }

    /// The event that opens a node; `None` for fragments.
    fn start_event(&self, id: NodeId) -> Option<XmlEvent> {
        let doc = &*self.doc;
        Some(match &doc.node(id).kind {
            NodeKind::Document => XmlEvent::StartDocument {
                version: doc.version.clone(),
                encoding: doc.encoding.clone(),
                standalone: doc.standalone,
            },
            NodeKind::DocumentFragment | NodeKind::Attribute { .. } => return None,
            NodeKind::Element {
                local_name,
                namespace,
                namespaces,
                line_number,
                ..
            } => XmlEvent::StartElement {
                prefix: namespace
                    .as_ref()
                    .map(|ns| ns.prefix().to_string())
                    .unwrap_or_default(),
                local_name: local_name.clone(),
                namespace_uri: namespace
                    .as_ref()
                    .map(|ns| ns.uri().to_string())
                    .filter(|u| !u.is_empty()),
                attributes: doc
                    .all_attributes(id)
                    .iter()
                    .filter_map(|&a| {
                        let value = doc.attr_value(a)?;
                        Some(EventAttribute {
                            prefix: doc.prefix(a).unwrap_or_default().to_string(),
                            local_name: value.local_name,
                            namespace_uri: value.namespace.map(|ns| ns.uri().to_string()),
                            value: value.value,
                        })
                    })
                    .collect(),
                namespaces: namespaces.values().cloned().collect(),
                line: *line_number,
            },
            NodeKind::DocumentType {
                name,
                public_id,
                system_id,
                internal_subset,
            } => XmlEvent::DocType {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
                internal_subset: internal_subset.clone(),
            },
            NodeKind::Text { content } => XmlEvent::Characters(content.clone()),
            NodeKind::CData { content } => XmlEvent::CData(content.clone()),
            NodeKind::Comment { content } => XmlEvent::Comment(content.clone()),
            NodeKind::ProcessingInstruction { target, data } => XmlEvent::ProcessingInstruction {
                target: target.clone(),
                data: data.clone(),
            },
        })
    }

    fn end_event(&self, id: NodeId) -> Option<XmlEvent> {
        match self.doc.node(id).kind {
            NodeKind::Document => Some(XmlEvent::EndDocument),
            NodeKind::Element { .. } => Some(XmlEvent::EndElement),
            _ => None,
        }
    }
}

impl EventSource for TreeReader<'_> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        self.read_next().map_err(|e| match e {
            DomError::Parse(e) => e,
            other => ParseError::new(other.to_string()),
        })
    }

    fn is_finished(&self) -> bool {
        self.started && self.stack.is_empty()
    }
}

impl Document {
    /// Returns a pull reader over `node` and its descendants.
    ///
    /// With `cache` set, unbuilt content is materialized while reading.
    /// Without it, the unbuilt remainder is consumed from the cursor and
    /// never materialized.
    ///
    /// # Errors
    ///
    /// `NotSupported` when `cache` is false and the document has no cursor,
    /// or its cursor is exhausted while `node` is still incomplete.
    /// `NotSupported` for attribute nodes.
    pub fn stream_reader(&mut self, node: NodeId, cache: bool) -> Result<TreeReader<'_>, DomError> {
        self.check_owned(node)?;
        if matches!(self.node(node).kind, NodeKind::Attribute { .. }) {
            return Err(DomError::NotSupported("attributes cannot be streamed"));
        }
        if !cache {
            if !self.has_cursor() {
                return Err(DomError::NotSupported(
                    "this document was not created in a manner to be switched",
                ));
            }
            if !self.is_building() && !self.is_complete(node) {
                return Err(DomError::NotSupported("the parser is already consumed"));
            }
        }
        Ok(TreeReader::new_unchecked(self, node, cache))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::reader::{collect_events, EventQueue, StreamReader};
    use crate::tree::BuildStep;
    use pretty_assertions::assert_eq;

    fn drain(reader: &mut TreeReader<'_>) -> Vec<XmlEvent> {
        let mut events = Vec::new();
        while let Some(event) = reader.read_next().unwrap() {
            events.push(event);
        }
        events
    }

    const XML: &str = "<r xmlns:p=\"urn:p\" a=\"1\"><p:b>t</p:b><!--c--><d/></r>";

    #[test]
    fn test_cached_reading_matches_tokenizer() {
        let expected = collect_events(&mut StreamReader::new(XML)).unwrap();
        let mut doc = Document::parse_deferred(XML).unwrap();
        let root = doc.root();
        let events = drain(&mut doc.stream_reader(root, true).unwrap());
        assert_eq!(events, expected);
        assert!(doc.is_complete(root));
    }

    #[test]
    fn test_uncached_reading_consumes_unbuilt_content() {
        let expected = collect_events(&mut StreamReader::new(XML)).unwrap();
        let mut doc = Document::parse_deferred(XML).unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let b = doc.first_child(r).unwrap().unwrap();
        doc.build(b).unwrap();
        let root = doc.root();
        let events = drain(&mut doc.stream_reader(root, false).unwrap());
        assert_eq!(events, expected);
        assert_eq!(doc.next_sibling_if_available(b), None);
        assert!(!doc.is_building());
    }

    #[test]
    fn test_uncached_requires_cursor() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(matches!(
            doc.stream_reader(root, false),
            Err(DomError::NotSupported(_))
        ));
        assert!(doc.stream_reader(root, true).is_ok());
    }

    #[test]
    fn test_consumed_cursor_is_rejected() {
        let mut doc = Document::parse_deferred(XML).unwrap();
        let root = doc.root();
        drain(&mut doc.stream_reader(root, false).unwrap());
        assert!(doc.document_element_if_available().is_none());
        assert_eq!(doc.document_element().unwrap(), None);
        assert_eq!(doc.build_next().unwrap(), BuildStep::Finished);
        assert!(doc.stream_reader(root, false).is_ok());
        doc.set_complete(root, false);
        assert!(matches!(
            doc.stream_reader(root, false),
            Err(DomError::NotSupported(_))
        ));
    }

    #[test]
    fn test_abandoned_pass_through_blocks_building() {
        let mut doc = Document::parse_deferred(XML).unwrap();
        let root = doc.root();
        {
            let mut reader = doc.stream_reader(root, false).unwrap();
            loop {
                match reader.read_next().unwrap() {
                    Some(XmlEvent::StartElement { local_name, .. }) if local_name == "b" => break,
                    Some(_) => {}
                    None => panic!("subtree ended before <p:b>"),
                }
            }
        }
        assert!(doc.is_building());
        assert!(matches!(doc.build_next(), Err(DomError::Om(_))));
        assert!(doc.document_element_if_available().is_none());
        assert!(matches!(doc.document_element(), Err(DomError::Om(_))));
    }

    #[test]
    fn test_element_subtree_and_leaf() {
        let mut doc = Document::parse_str(XML).unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let b = doc.first_child(r).unwrap().unwrap();
        let events = drain(&mut doc.stream_reader(b, true).unwrap());
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], XmlEvent::EndElement);
        let t = doc.first_child(b).unwrap().unwrap();
        let events = drain(&mut doc.stream_reader(t, true).unwrap());
        assert_eq!(events, vec![XmlEvent::Characters("t".into())]);
    }

    #[test]
    fn test_reader_output_rebuilds_equal_tree() {
        let mut doc = Document::parse_str(XML).unwrap();
        let root = doc.root();
        let events = collect_events(&mut doc.stream_reader(root, true).unwrap()).unwrap();
        let mut copy = Document::from_source(Box::new(EventQueue::new(events))).unwrap();
        copy.close(true).unwrap();
        assert!(copy.is_equal_subtree(copy.root(), &doc, root));
    }
}

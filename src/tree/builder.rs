//! Deferred construction from an event cursor.
//!
//! The builder keeps a frontier: the path of open containers from the
//! document node down to the element whose content is being read. Only the
//! top of the frontier receives new children. A container leaves the
//! frontier, and becomes done, when the cursor reports its end.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::element::{classify_attribute, AttrRoute};
use super::namespace::Namespace;
use super::{Document, NodeFlags, NodeId, NodeKind, NodeList};
use crate::error::DomError;
use crate::parser::ParseOptions;
use crate::reader::{EventSource, StreamReader, XmlEvent};

pub(crate) struct DeferredBuild {
    source: Box<dyn EventSource>,
    /// Open containers; the document node is at the bottom.
    frontier: Vec<NodeId>,
    /// Elements opened by pass-through reads that were never materialized.
    skip_depth: usize,
    finished: bool,
}

/// The outcome of one [`Document::build_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// A node was created and attached.
    Materialized(NodeId),
    /// The cursor ended a container, which is now done.
    Closed(NodeId),
    /// Document metadata was read.
    Metadata,
    /// The cursor is exhausted or absent.
    Finished,
}

impl Document {
    /// Parses a whole document eagerly.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` for malformed XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazydom::Document;
    ///
    /// let mut doc = Document::parse_str("<a><b/></a>").unwrap();
    /// assert!(doc.is_complete(doc.root()));
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, DomError> {
        let mut doc = Self::parse_deferred(input)?;
        doc.close(true)?;
        Ok(doc)
    }

    /// Parses raw bytes eagerly, detecting the encoding first.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` if the bytes cannot be decoded or are not
    /// well-formed XML.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, DomError> {
        let reader = StreamReader::from_bytes(input, &ParseOptions::default())?;
        let mut doc = Self::from_source(Box::new(reader))?;
        doc.close(true)?;
        Ok(doc)
    }

    /// Creates a document that materializes `input` on demand.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` if the first event is malformed.
    pub fn parse_deferred(input: &str) -> Result<Self, DomError> {
        Self::parse_deferred_with_options(input, &ParseOptions::default())
    }

    /// Like [`Document::parse_deferred`] with explicit tokenizer limits.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` if the first event is malformed.
    pub fn parse_deferred_with_options(
        input: &str,
        options: &ParseOptions,
    ) -> Result<Self, DomError> {
        Self::from_source(Box::new(StreamReader::with_options(input, options)))
    }

    /// Creates a document in building state over an arbitrary event cursor.
    ///
    /// The first event is read immediately so that document metadata is
    /// available.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the first event.
    pub fn from_source(source: Box<dyn EventSource>) -> Result<Self, DomError> {
        let mut doc = Self::new();
        let root = doc.root;
        doc.node_mut(root).done = false;
        doc.builder = Some(DeferredBuild {
            source,
            frontier: vec![root],
            skip_depth: 0,
            finished: false,
        });
        debug!(document = ?doc.id, "attached event cursor");
        doc.build_next()?;
        Ok(doc)
    }

    /// Returns `true` while the document holds a cursor that has not
    /// reported its end.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.builder.as_ref().is_some_and(|b| !b.finished)
    }

    pub(crate) fn has_cursor(&self) -> bool {
        self.builder.is_some()
    }

    /// Returns `true` if all children of the node are materialized.
    #[must_use]
    pub fn is_complete(&self, id: NodeId) -> bool {
        self.node(id).done
    }

    /// Overrides the done flag of a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document.
    pub fn set_complete(&mut self, id: NodeId, complete: bool) {
        self.node_mut(id).done = complete;
    }

    /// Pulls one event from the cursor and materializes it.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` for malformed input and `DomError::Om`
    /// when the cursor is in the middle of a pass-through read or reports
    /// an unbalanced end.
    pub fn build_next(&mut self) -> Result<BuildStep, DomError> {
        let event = {
            let Some(builder) = self.builder.as_mut() else {
                return Ok(BuildStep::Finished);
            };
            if builder.finished {
                return Ok(BuildStep::Finished);
            }
            if builder.skip_depth > 0 {
                return Err(DomError::Om(
                    "cursor is being consumed without building".to_string(),
                ));
            }
            builder.source.next_event()?
        };
        match event {
            Some(event) => self.materialize(event),
            None => {
                self.finish_build();
                Ok(BuildStep::Finished)
            }
        }
    }

    fn frontier_top(&self) -> Option<NodeId> {
        self.builder.as_ref().and_then(|b| b.frontier.last().copied())
    }

    fn materialize(&mut self, event: XmlEvent) -> Result<BuildStep, DomError> {
        trace!(kind = ?event.kind(), "materialize");
        let parent = self
            .frontier_top()
            .ok_or_else(|| DomError::Om("no open container for event".to_string()))?;
        let kind = match event {
            XmlEvent::StartDocument {
                version,
                encoding,
                standalone,
            } => {
                self.version = version;
                self.encoding = encoding;
                self.standalone = standalone;
                return Ok(BuildStep::Metadata);
            }
            XmlEvent::StartElement {
                prefix,
                local_name,
                namespace_uri,
                attributes,
                mut namespaces,
                line,
            } => {
                if parent == self.root && self.document_element.is_some() {
                    return Err(DomError::HierarchyRequest(
                        "document already has a document element",
                    ));
                }
                let mut plain = Vec::with_capacity(attributes.len());
                for attr in attributes {
                    let qname = if attr.prefix.is_empty() {
                        attr.local_name.clone()
                    } else {
                        format!("{}:{}", attr.prefix, attr.local_name)
                    };
                    match classify_attribute(&qname, attr.namespace_uri.as_deref()) {
                        AttrRoute::DefaultNamespace => {
                            namespaces.push(Namespace::new(attr.value, ""));
                        }
                        AttrRoute::NamespaceDecl(p) => {
                            namespaces.push(Namespace::new(attr.value, p));
                        }
                        AttrRoute::Plain => plain.push(attr),
                    }
                }
                let el = self.materialize_element(
                    prefix,
                    local_name,
                    namespace_uri,
                    namespaces,
                    line,
                );
                for attr in plain {
                    let namespace = attr
                        .namespace_uri
                        .map(|uri| Namespace::new(uri, attr.prefix));
                    let id = self.create_node(NodeKind::attribute(
                        attr.local_name,
                        namespace,
                        attr.value,
                    ));
                    self.node_mut(id).flags.insert(NodeFlags::SPECIFIED);
                    self.insert_attribute(el, id);
                }
                self.node_mut(el).done = false;
                self.link_append(parent, el);
                if parent == self.root {
                    self.document_element = Some(el);
                }
                if let Some(builder) = self.builder.as_mut() {
                    builder.frontier.push(el);
                }
                return Ok(BuildStep::Materialized(el));
            }
            XmlEvent::EndElement => {
                if parent == self.root {
                    return Err(DomError::Om("end element outside any element".to_string()));
                }
                if let Some(builder) = self.builder.as_mut() {
                    builder.frontier.pop();
                }
                self.node_mut(parent).done = true;
                return Ok(BuildStep::Closed(parent));
            }
            XmlEvent::EndDocument => {
                self.finish_build();
                return Ok(BuildStep::Closed(self.root));
            }
            XmlEvent::Characters(content) => NodeKind::Text { content },
            XmlEvent::CData(content) => NodeKind::CData { content },
            XmlEvent::Comment(content) => NodeKind::Comment { content },
            XmlEvent::ProcessingInstruction { target, data } => {
                NodeKind::ProcessingInstruction { target, data }
            }
            XmlEvent::DocType {
                name,
                public_id,
                system_id,
                internal_subset,
            } => NodeKind::DocumentType {
                name,
                public_id,
                system_id,
                internal_subset,
            },
        };
        let id = self.create_node(kind);
        self.link_append(parent, id);
        Ok(BuildStep::Materialized(id))
    }

    fn materialize_element(
        &mut self,
        prefix: String,
        local_name: String,
        namespace_uri: Option<String>,
        declared: Vec<Namespace>,
        line: u32,
    ) -> NodeId {
        let namespace = namespace_uri.map(|uri| Namespace::new(uri, prefix));
        let namespaces: BTreeMap<String, Namespace> = declared
            .into_iter()
            .filter(|ns| !ns.prefix().starts_with("xmlns"))
            .map(|ns| (ns.prefix().to_string(), ns))
            .collect();
        let mut kind = NodeKind::element(local_name, namespace);
        if let NodeKind::Element {
            namespaces: slot,
            line_number,
            ..
        } = &mut kind
        {
            *slot = namespaces;
            *line_number = line;
        }
        self.create_node(kind)
    }

    /// Marks every open container done and stops consulting the cursor.
    fn finish_build(&mut self) {
        let Some(builder) = self.builder.as_mut() else {
            return;
        };
        builder.finished = true;
        builder.skip_depth = 0;
        let open: Vec<NodeId> = builder.frontier.drain(..).collect();
        for id in open {
            self.node_mut(id).done = true;
        }
        debug!(document = ?self.id, "event cursor drained");
    }

    /// Pulls one event without materializing it.
    ///
    /// The cursor position moves past content that will never appear in
    /// the tree. A container whose end is passed is marked done.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Parse` for malformed input.
    pub(crate) fn pass_through_next(&mut self) -> Result<Option<XmlEvent>, DomError> {
        let (event, closed) = {
            let Some(builder) = self.builder.as_mut() else {
                return Ok(None);
            };
            if builder.finished {
                return Ok(None);
            }
            let event = builder.source.next_event()?;
            let mut closed = None;
            match &event {
                Some(XmlEvent::StartElement { .. }) => builder.skip_depth += 1,
                Some(XmlEvent::EndElement) if builder.skip_depth > 0 => builder.skip_depth -= 1,
                Some(XmlEvent::EndElement) => {
                    if builder.frontier.len() > 1 {
                        closed = builder.frontier.pop();
                    }
                }
                _ => {}
            }
            (event, closed)
        };
        if let Some(id) = closed {
            self.node_mut(id).done = true;
        }
        if matches!(event, None | Some(XmlEvent::EndDocument)) {
            self.finish_build();
            debug!(document = ?self.id, "event cursor consumed");
        }
        Ok(event)
    }

    /// Materializes everything below `id`.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn build(&mut self, id: NodeId) -> Result<(), DomError> {
        self.check_owned(id)?;
        while !self.node(id).done {
            if self.build_next()? == BuildStep::Finished {
                break;
            }
        }
        Ok(())
    }

    /// Releases the cursor, optionally materializing the rest of the
    /// document first. Unbuilt containers are marked done either way.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures when `build` is set.
    pub fn close(&mut self, build: bool) -> Result<(), DomError> {
        if build {
            let root = self.root;
            self.build(root)?;
        }
        if let Some(mut builder) = self.builder.take() {
            for id in builder.frontier.drain(..) {
                self.node_mut(id).done = true;
            }
            debug!(document = ?self.id, built = build, "event cursor released");
        }
        Ok(())
    }

    /// Removes an element without materializing its unbuilt content.
    ///
    /// A built element is simply detached. Otherwise the cursor skips the
    /// rest of the element: once for every open frontier level down to
    /// and including the element.
    ///
    /// # Errors
    ///
    /// Returns `NoModificationAllowed` for read-only nodes, `DomError::Om`
    /// while a pass-through read is in progress, and cursor failures.
    pub fn discard(&mut self, id: NodeId) -> Result<(), DomError> {
        self.check_writable(id)?;
        if !self.node(id).done {
            let Some(builder) = self.builder.as_mut() else {
                return Err(DomError::Om("no cursor to discard from".to_string()));
            };
            if builder.skip_depth > 0 {
                return Err(DomError::Om(
                    "cursor is being consumed without building".to_string(),
                ));
            }
            let Some(level) = builder.frontier.iter().position(|&f| f == id) else {
                return Err(DomError::Om("node is not being built".to_string()));
            };
            for _ in level..builder.frontier.len() {
                builder.source.skip_element()?;
            }
            let closed: Vec<NodeId> = builder.frontier.drain(level..).collect();
            for node in closed {
                self.node_mut(node).done = true;
            }
            debug!(document = ?self.id, node = ?id, "discarded unbuilt element");
        }
        if self.node(id).parent.is_some() {
            self.unlink(id);
        }
        Ok(())
    }

    // -- Building accessors --

    /// Returns the first child, reading from the cursor if needed.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn first_child(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        self.check_owned(id)?;
        loop {
            if let Some(child) = self.node(id).first_child {
                return Ok(Some(child));
            }
            if self.node(id).done || self.build_next()? == BuildStep::Finished {
                return Ok(self.node(id).first_child);
            }
        }
    }

    /// Returns the last child, materializing the whole container.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn last_child(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        self.build(id)?;
        Ok(self.node(id).last_child)
    }

    /// Returns the next sibling, reading from the cursor if the parent is
    /// still being built.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn next_sibling(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        self.check_owned(id)?;
        loop {
            if let Some(sibling) = self.node(id).next_sibling {
                return Ok(Some(sibling));
            }
            let Some(parent) = self.node(id).parent else {
                return Ok(None);
            };
            if self.node(parent).done || self.build_next()? == BuildStep::Finished {
                return Ok(self.node(id).next_sibling);
            }
        }
    }

    /// Returns the next sibling of an element after forcing the element
    /// itself to completion.
    ///
    /// # Errors
    ///
    /// Fails with `DomError::Om` if the cursor ends before the element is
    /// complete.
    pub fn next_om_sibling(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        self.check_owned(id)?;
        while !self.node(id).done {
            if self.build_next()? == BuildStep::Finished && !self.node(id).done {
                return Err(DomError::Om(
                    "cursor ended before the element was complete".to_string(),
                ));
            }
        }
        self.next_sibling(id)
    }

    /// Returns `true` if the node has at least one child.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn has_child_nodes(&mut self, id: NodeId) -> Result<bool, DomError> {
        Ok(self.first_child(id)?.is_some())
    }

    /// Returns all children, materializing the container.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn child_nodes(&mut self, id: NodeId) -> Result<NodeList, DomError> {
        self.build(id)?;
        Ok(self.children_if_available(id).collect())
    }

    /// Object-model spelling of [`Document::child_nodes`].
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn children(&mut self, id: NodeId) -> Result<NodeList, DomError> {
        self.child_nodes(id)
    }

    /// Returns the document element, reading until it appears.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn document_element(&mut self) -> Result<Option<NodeId>, DomError> {
        while self.document_element.is_none() && !self.node(self.root).done {
            if self.build_next()? == BuildStep::Finished {
                break;
            }
        }
        Ok(self.document_element)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::reader::{EventAttribute, EventQueue};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deferred_document_starts_unbuilt() {
        let doc = Document::parse_deferred("<?xml version=\"1.0\"?><a><b/></a>").unwrap();
        assert!(!doc.is_complete(doc.root()));
        assert_eq!(doc.version.as_deref(), Some("1.0"));
        assert!(doc.first_child_if_available(doc.root()).is_none());
        assert!(doc.is_building());
    }

    #[test]
    fn test_first_child_builds_only_what_is_needed() {
        let mut doc = Document::parse_deferred("<a><b/><c/><d/></a>").unwrap();
        let a = doc.document_element().unwrap().unwrap();
        let b = doc.first_child(a).unwrap().unwrap();
        assert_eq!(doc.node_name(b), "b");
        assert!(doc.next_sibling_if_available(b).is_none());
        assert!(!doc.is_complete(a));
        let c = doc.next_sibling(b).unwrap().unwrap();
        assert_eq!(doc.node_name(c), "c");
        assert!(doc.next_sibling_if_available(c).is_none());
    }

    #[test]
    fn test_build_completes_subtree() {
        let mut doc = Document::parse_deferred("<a><b><c/></b>tail</a>").unwrap();
        let a = doc.document_element().unwrap().unwrap();
        doc.build(a).unwrap();
        assert!(doc.is_complete(a));
        assert_eq!(doc.child_nodes(a).unwrap().length(), 2);
    }

    #[test]
    fn test_from_source_queue_without_end_document() {
        let mut doc = Document::from_source(Box::new(EventQueue::new(vec![
            XmlEvent::start("r"),
            XmlEvent::Characters("x".into()),
        ])))
        .unwrap();
        let r = doc.document_element().unwrap().unwrap();
        assert_eq!(doc.last_child(r).unwrap().map(|t| doc.node_name(t)), Some("#text".into()));
        assert!(doc.is_complete(r));
        assert!(doc.is_complete(doc.root()));
        assert!(!doc.is_building());
    }

    #[test]
    fn test_second_top_level_element_is_rejected() {
        let mut doc = Document::from_source(Box::new(EventQueue::new(vec![
            XmlEvent::start("a"),
            XmlEvent::EndElement,
            XmlEvent::start("b"),
            XmlEvent::EndElement,
        ])))
        .unwrap();
        assert!(matches!(doc.close(true), Err(DomError::HierarchyRequest(_))));
        let a = doc.document_element_if_available().unwrap();
        assert_eq!(doc.node_name(a), "a");
        assert_eq!(doc.children_if_available(doc.root()).count(), 1);
    }

    #[test]
    fn test_xmlns_attributes_from_source_become_declarations() {
        let declared = EventAttribute {
            prefix: "xmlns".into(),
            local_name: "q".into(),
            namespace_uri: Some(crate::util::qname::XMLNS_NAMESPACE.into()),
            value: "urn:q".into(),
        };
        let mut doc = Document::from_source(Box::new(EventQueue::new(vec![
            XmlEvent::StartElement {
                prefix: String::new(),
                local_name: "r".into(),
                namespace_uri: None,
                attributes: vec![
                    EventAttribute::new("xmlns:p", "urn:p"),
                    EventAttribute::new("xmlns", "urn:d"),
                    declared,
                    EventAttribute::new("k", "v"),
                ],
                namespaces: Vec::new(),
                line: 0,
            },
            XmlEvent::EndElement,
        ])))
        .unwrap();
        let r = doc.document_element().unwrap().unwrap();
        assert_eq!(doc.all_attributes(r).len(), 1);
        assert_eq!(doc.get_attribute(r, "k"), Some("v"));
        assert_eq!(doc.namespace_uri_for_prefix(r, "p"), Some("urn:p"));
        assert_eq!(doc.namespace_uri_for_prefix(r, "q"), Some("urn:q"));
        assert_eq!(doc.default_namespace(r).map(|n| n.uri()), Some("urn:d"));
    }

    #[test]
    fn test_discard_skips_unbuilt_content() {
        let mut doc = Document::parse_deferred("<r><a><x/><y/></a><b/></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let a = doc.first_child(r).unwrap().unwrap();
        let x = doc.first_child(a).unwrap().unwrap();
        assert_eq!(doc.node_name(x), "x");
        doc.discard(a).unwrap();
        let b = doc.first_child(r).unwrap().unwrap();
        assert_eq!(doc.node_name(b), "b");
        assert!(doc.parent(a).is_none());
        assert!(doc.is_complete(a));
        assert_eq!(doc.child_nodes(a).unwrap().length(), 1);
    }

    #[test]
    fn test_discard_built_element_detaches() {
        let mut doc = Document::parse_str("<r><a/><b/></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let a = doc.first_child(r).unwrap().unwrap();
        doc.discard(a).unwrap();
        assert_eq!(doc.child_nodes(r).unwrap().length(), 1);
    }

    #[test]
    fn test_close_without_build_marks_done() {
        let mut doc = Document::parse_deferred("<r><a/><b/></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        doc.close(false).unwrap();
        assert!(doc.is_complete(r));
        assert!(!doc.has_cursor());
        assert_eq!(doc.first_child(r).unwrap(), None);
    }

    #[test]
    fn test_next_om_sibling_forces_element_completion() {
        let mut doc = Document::parse_deferred("<r><a><deep/></a><b/></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let a = doc.first_child(r).unwrap().unwrap();
        let b = doc.next_om_sibling(a).unwrap().unwrap();
        assert!(doc.is_complete(a));
        assert_eq!(doc.node_name(b), "b");
    }

    #[test]
    fn test_parse_error_surfaces_on_demand() {
        let mut doc = Document::parse_deferred("<r><a></b></r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let a = doc.first_child(r).unwrap().unwrap();
        assert!(matches!(doc.first_child(a), Err(DomError::Parse(_))));
    }

    #[test]
    fn test_line_numbers_recorded() {
        let mut doc = Document::parse_str("<r>\n  <a/>\n</r>").unwrap();
        let r = doc.document_element().unwrap().unwrap();
        let a = doc.first_element(r).unwrap().unwrap();
        assert_eq!(doc.line_number(a), 2);
    }
}

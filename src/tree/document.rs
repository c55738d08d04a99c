//! Node factories, document-level queries, user data, and the DOM
//! implementation object.

use std::any::Any;

use super::namespace::Namespace;
use super::{Document, NodeFlags, NodeId, NodeKind};
use crate::error::DomError;
use crate::util::qname::{check_qualified_name, is_name};

impl Document {
    // -- Factories --

    /// Creates a detached element with no namespace.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` if `name` is not an XML name.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId, DomError> {
        if !is_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        Ok(self.create_node(NodeKind::element(name, None)))
    }

    /// Creates a detached element with a namespace. The namespace is not
    /// declared on the element; serialization adds the declaration when it
    /// is not in scope.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` or `Namespace` for an illegal name / URI pair.
    pub fn create_element_ns(&mut self, uri: Option<&str>, qname: &str) -> Result<NodeId, DomError> {
        let (prefix, local) = check_qualified_name(qname, uri)?;
        let namespace = uri
            .filter(|u| !u.is_empty())
            .map(|u| Namespace::new(u, prefix));
        Ok(self.create_node(NodeKind::element(local, namespace)))
    }

    /// Creates a detached, specified attribute with an empty value.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` if `name` is not an XML name.
    pub fn create_attribute(&mut self, name: &str) -> Result<NodeId, DomError> {
        if !is_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        let id = self.create_node(NodeKind::attribute(name, None, ""));
        self.node_mut(id).flags.insert(NodeFlags::SPECIFIED);
        Ok(id)
    }

    /// Creates a detached, specified attribute with a namespace.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` or `Namespace` for an illegal name / URI pair.
    pub fn create_attribute_ns(&mut self, uri: Option<&str>, qname: &str) -> Result<NodeId, DomError> {
        let (prefix, local) = check_qualified_name(qname, uri)?;
        let namespace = uri
            .filter(|u| !u.is_empty())
            .map(|u| Namespace::new(u, prefix));
        let id = self.create_node(NodeKind::attribute(local, namespace, ""));
        self.node_mut(id).flags.insert(NodeFlags::SPECIFIED);
        Ok(id)
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: data.to_string(),
        })
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.create_node(NodeKind::Comment {
            content: data.to_string(),
        })
    }

    pub fn create_cdata_section(&mut self, data: &str) -> NodeId {
        self.create_node(NodeKind::CData {
            content: data.to_string(),
        })
    }

    /// Creates a processing instruction.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` if `target` is not an XML name or is `xml` in
    /// any case.
    pub fn create_processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<NodeId, DomError> {
        if !is_name(target) || target.eq_ignore_ascii_case("xml") {
            return Err(DomError::InvalidCharacter(target.to_string()));
        }
        Ok(self.create_node(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.create_node(NodeKind::DocumentFragment)
    }

    /// Creates a detached document type node.
    ///
    /// # Errors
    ///
    /// `InvalidCharacter` if `name` is not an XML name.
    pub fn create_document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<NodeId, DomError> {
        if !is_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        Ok(self.create_node(NodeKind::DocumentType {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            internal_subset: None,
        }))
    }

    // -- Document type --

    /// Returns the document type node, reading the prolog if needed.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn doctype(&mut self) -> Result<Option<NodeId>, DomError> {
        let mut cursor = self.first_child(self.root)?;
        while let Some(child) = cursor {
            match self.node(child).kind {
                NodeKind::DocumentType { .. } => return Ok(Some(child)),
                NodeKind::Element { .. } => return Ok(None),
                _ => cursor = self.next_sibling(child)?,
            }
        }
        Ok(None)
    }

    fn doctype_fields(&self, id: NodeId) -> Option<[Option<&str>; 4]> {
        match &self.node(id).kind {
            NodeKind::DocumentType {
                name,
                public_id,
                system_id,
                internal_subset,
            } => Some([
                Some(name.as_str()),
                public_id.as_deref(),
                system_id.as_deref(),
                internal_subset.as_deref(),
            ]),
            _ => None,
        }
    }

    /// Returns the root element name declared by a document type.
    #[must_use]
    pub fn doctype_name(&self, id: NodeId) -> Option<&str> {
        self.doctype_fields(id).and_then(|f| f[0])
    }

    #[must_use]
    pub fn public_id(&self, id: NodeId) -> Option<&str> {
        self.doctype_fields(id).and_then(|f| f[1])
    }

    #[must_use]
    pub fn system_id(&self, id: NodeId) -> Option<&str> {
        self.doctype_fields(id).and_then(|f| f[2])
    }

    /// Returns the internal subset of a document type, verbatim.
    #[must_use]
    pub fn internal_subset(&self, id: NodeId) -> Option<&str> {
        self.doctype_fields(id).and_then(|f| f[3])
    }

    // -- Flags and user data --

    /// Flags a node read-only. Every mutating call on it then fails with
    /// `NoModificationAllowed`.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document.
    pub fn set_read_only(&mut self, id: NodeId, read_only: bool) {
        self.node_mut(id).flags.set(NodeFlags::READ_ONLY, read_only);
    }

    #[must_use]
    pub fn is_read_only(&self, id: NodeId) -> bool {
        self.has_flag(id, NodeFlags::READ_ONLY)
    }

    /// Stores a value under `key` on a node and returns the previous value.
    pub fn set_user_data(
        &mut self,
        id: NodeId,
        key: &str,
        data: Box<dyn Any>,
    ) -> Option<Box<dyn Any>> {
        self.user_data
            .entry(id)
            .or_default()
            .insert(key.to_string(), data)
    }

    #[must_use]
    pub fn get_user_data(&self, id: NodeId, key: &str) -> Option<&dyn Any> {
        self.user_data
            .get(&id)
            .and_then(|slots| slots.get(key))
            .map(|data| &**data)
    }

    // -- Unsupported DOM Level 3 surface --

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn create_entity_reference(&mut self, _name: &str) -> Result<NodeId, DomError> {
        Err(DomError::NotSupported("entity references"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`; use [`Document::import_node`].
    pub fn adopt_node(&mut self, _source: &mut Document, _node: NodeId) -> Result<NodeId, DomError> {
        Err(DomError::NotSupported("adoptNode"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn normalize_document(&mut self) -> Result<(), DomError> {
        Err(DomError::NotSupported("normalizeDocument"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn rename_node(
        &mut self,
        _id: NodeId,
        _uri: Option<&str>,
        _qname: &str,
    ) -> Result<NodeId, DomError> {
        Err(DomError::NotSupported("renameNode"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn dom_config(&self) -> Result<(), DomError> {
        Err(DomError::NotSupported("domConfig"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn document_uri(&self) -> Result<String, DomError> {
        Err(DomError::NotSupported("documentURI"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn strict_error_checking(&self) -> Result<bool, DomError> {
        Err(DomError::NotSupported("strictErrorChecking"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn base_uri(&self, _id: NodeId) -> Result<String, DomError> {
        Err(DomError::NotSupported("baseURI"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn compare_document_position(&self, _a: NodeId, _b: NodeId) -> Result<u16, DomError> {
        Err(DomError::NotSupported("compareDocumentPosition"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn get_feature(&self, _id: NodeId, _feature: &str, _version: &str) -> Result<(), DomError> {
        Err(DomError::NotSupported("getFeature"))
    }

    /// # Errors
    ///
    /// Always `NotSupported`.
    pub fn is_supported(&self, _id: NodeId, _feature: &str, _version: &str) -> Result<bool, DomError> {
        Err(DomError::NotSupported("isSupported"))
    }
}

/// Entry point for creating documents, in the shape of the DOM
/// `DOMImplementation` interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomImplementation;

impl DomImplementation {
    /// Reports support for the `Core` and `XML` features, versions
    /// `1.0`, `2.0`, and `3.0` (or unspecified).
    #[must_use]
    pub fn has_feature(&self, feature: &str, version: Option<&str>) -> bool {
        let feature = feature.strip_prefix('+').unwrap_or(feature);
        let known = feature.eq_ignore_ascii_case("core") || feature.eq_ignore_ascii_case("xml");
        known && matches!(version, None | Some("" | "1.0" | "2.0" | "3.0"))
    }

    /// Creates a document, optionally with a document element and a
    /// document type.
    ///
    /// # Errors
    ///
    /// Name validation errors from the element and document-type
    /// factories.
    pub fn create_document(
        &self,
        uri: Option<&str>,
        qname: Option<&str>,
        doctype: Option<(&str, Option<&str>, Option<&str>)>,
    ) -> Result<Document, DomError> {
        let mut doc = Document::new();
        let root = doc.root();
        if let Some((name, public_id, system_id)) = doctype {
            let dt = doc.create_document_type(name, public_id, system_id)?;
            doc.append_child(root, dt)?;
        }
        if let Some(qname) = qname {
            let el = doc.create_element_ns(uri, qname)?;
            if let (Some(uri), Some(prefix)) = (uri.filter(|u| !u.is_empty()), doc.prefix(el)) {
                let prefix = prefix.to_string();
                doc.declare_namespace(el, uri, Some(&prefix))?;
            } else if let Some(uri) = uri.filter(|u| !u.is_empty()) {
                doc.declare_default_namespace(el, uri)?;
            }
            doc.append_child(root, el)?;
        }
        Ok(doc)
    }
}

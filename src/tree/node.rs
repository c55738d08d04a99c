use std::collections::BTreeMap;

use super::attr::AttributeMap;
use super::namespace::Namespace;
use super::{Document, NodeFlags, NodeId};
use crate::error::DomError;
use crate::reader::EventKind;
use crate::util::qname::{is_ncname, XMLNS_NAMESPACE, XML_NAMESPACE};

/// The kind of a node and its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node (root of the tree).
    Document,
    /// A lightweight container whose children are spliced on insertion.
    DocumentFragment,
    /// A document type declaration.
    DocumentType {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
        /// Internal subset, verbatim.
        internal_subset: Option<String>,
    },
    /// An element.
    Element {
        local_name: String,
        namespace: Option<Namespace>,
        attributes: AttributeMap,
        /// Namespace declarations made on this element, keyed by prefix.
        /// The empty prefix is the default namespace.
        namespaces: BTreeMap<String, Namespace>,
        /// Source line of the start tag, 0 for programmatic elements.
        line_number: u32,
    },
    /// An attribute. Never linked into a sibling chain.
    Attribute {
        local_name: String,
        namespace: Option<Namespace>,
        value: String,
        owner: Option<NodeId>,
        is_id: bool,
    },
    /// Character data.
    Text { content: String },
    /// A CDATA section.
    CData { content: String },
    /// A comment.
    Comment { content: String },
    /// A processing instruction.
    ProcessingInstruction { target: String, data: String },
}

impl NodeKind {
    /// Returns `true` for kinds that can hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Document | Self::DocumentFragment | Self::Element { .. }
        )
    }

    pub(crate) fn element(local_name: impl Into<String>, namespace: Option<Namespace>) -> Self {
        Self::Element {
            local_name: local_name.into(),
            namespace,
            attributes: AttributeMap::default(),
            namespaces: BTreeMap::new(),
            line_number: 0,
        }
    }

    pub(crate) fn attribute(
        local_name: impl Into<String>,
        namespace: Option<Namespace>,
        value: impl Into<String>,
    ) -> Self {
        Self::Attribute {
            local_name: local_name.into(),
            namespace,
            value: value.into(),
            owner: None,
            is_id: false,
        }
    }
}

/// DOM node type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CDataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl Document {
    /// Returns the DOM type of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        match self.node(id).kind {
            NodeKind::Document => NodeType::Document,
            NodeKind::DocumentFragment => NodeType::DocumentFragment,
            NodeKind::DocumentType { .. } => NodeType::DocumentType,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::CData { .. } => NodeType::CDataSection,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    /// Returns the stream event kind a node corresponds to.
    ///
    /// Fragments have no stream equivalent.
    #[must_use]
    pub fn om_type(&self, id: NodeId) -> Option<EventKind> {
        match self.node(id).kind {
            NodeKind::Document => Some(EventKind::StartDocument),
            NodeKind::DocumentFragment => None,
            NodeKind::DocumentType { .. } => Some(EventKind::Dtd),
            NodeKind::Element { .. } => Some(EventKind::StartElement),
            NodeKind::Attribute { .. } => Some(EventKind::Attribute),
            NodeKind::Text { .. } => Some(EventKind::Characters),
            NodeKind::CData { .. } => Some(EventKind::CData),
            NodeKind::Comment { .. } => Some(EventKind::Comment),
            NodeKind::ProcessingInstruction { .. } => Some(EventKind::ProcessingInstruction),
        }
    }

    /// Returns the DOM node name: the qualified name for elements and
    /// attributes, the target for PIs, and a `#`-name otherwise.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Document => "#document".to_string(),
            NodeKind::DocumentFragment => "#document-fragment".to_string(),
            NodeKind::DocumentType { name, .. } => name.clone(),
            NodeKind::Element {
                local_name,
                namespace,
                ..
            }
            | NodeKind::Attribute {
                local_name,
                namespace,
                ..
            } => match namespace {
                Some(ns) if !ns.prefix().is_empty() => format!("{}:{local_name}", ns.prefix()),
                _ => local_name.clone(),
            },
            NodeKind::Text { .. } => "#text".to_string(),
            NodeKind::CData { .. } => "#cdata-section".to_string(),
            NodeKind::Comment { .. } => "#comment".to_string(),
            NodeKind::ProcessingInstruction { target, .. } => target.clone(),
        }
    }

    /// Returns the local name of an element or attribute.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { local_name, .. } | NodeKind::Attribute { local_name, .. } => {
                Some(local_name)
            }
            _ => None,
        }
    }

    /// Returns the namespace of an element or attribute.
    #[must_use]
    pub fn namespace(&self, id: NodeId) -> Option<&Namespace> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } | NodeKind::Attribute { namespace, .. } => {
                namespace.as_ref().filter(|ns| !ns.uri().is_empty())
            }
            _ => None,
        }
    }

    /// Returns the namespace URI of an element or attribute.
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.namespace(id).map(Namespace::uri)
    }

    /// Returns the non-empty prefix of an element or attribute.
    #[must_use]
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.namespace(id)
            .map(Namespace::prefix)
            .filter(|p| !p.is_empty())
    }

    /// Changes the prefix of a namespaced element or attribute.
    ///
    /// Has no effect on other node kinds.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on read-only nodes,
    /// `InvalidCharacter` for a malformed prefix, and `Namespace` when the
    /// node has no namespace or the prefix is reserved for another one.
    pub fn set_prefix(&mut self, id: NodeId, prefix: Option<&str>) -> Result<(), DomError> {
        self.check_writable(id)?;
        let (is_attr, local_name, uri) = match &self.node(id).kind {
            NodeKind::Element {
                local_name,
                namespace,
                ..
            } => (false, local_name, namespace.as_ref().map(Namespace::uri)),
            NodeKind::Attribute {
                local_name,
                namespace,
                ..
            } => (true, local_name, namespace.as_ref().map(Namespace::uri)),
            _ => return Ok(()),
        };
        let prefix = prefix.unwrap_or("");
        let uri = uri.filter(|u| !u.is_empty()).map(str::to_string);
        if !prefix.is_empty() {
            if !is_ncname(prefix) {
                return Err(DomError::InvalidCharacter(prefix.to_string()));
            }
            let Some(uri) = uri.as_deref() else {
                return Err(DomError::Namespace(
                    "cannot set a prefix on a node without a namespace".to_string(),
                ));
            };
            if prefix == "xml" && uri != XML_NAMESPACE {
                return Err(DomError::Namespace(
                    "the 'xml' prefix is reserved for the XML namespace".to_string(),
                ));
            }
            if is_attr && (prefix == "xmlns") != (uri == XMLNS_NAMESPACE) {
                return Err(DomError::Namespace(
                    "the 'xmlns' prefix is reserved for the xmlns namespace".to_string(),
                ));
            }
        }
        if is_attr && local_name == "xmlns" && !prefix.is_empty() {
            return Err(DomError::Namespace(
                "an 'xmlns' attribute cannot take a prefix".to_string(),
            ));
        }
        let Some(uri) = uri else {
            return Ok(());
        };
        if is_attr {
            self.check_rename_free(id, prefix, local_name)?;
        }
        let owner = self.reposition_start(id);
        match &mut self.node_mut(id).kind {
            NodeKind::Element { namespace, .. } | NodeKind::Attribute { namespace, .. } => {
                *namespace = Some(Namespace::new(uri, prefix));
            }
            _ => {}
        }
        self.reposition_finish(id, owner);
        Ok(())
    }

    /// Renames an element or attribute in place, keeping its namespace.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on read-only nodes and
    /// `InvalidCharacter` when `name` is not an NCName.
    pub fn set_local_name(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.check_writable(id)?;
        if !is_ncname(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        let prefix = self.prefix(id).unwrap_or("").to_string();
        self.check_rename_free(id, &prefix, name)?;
        let owner = self.reposition_start(id);
        match &mut self.node_mut(id).kind {
            NodeKind::Element { local_name, .. } | NodeKind::Attribute { local_name, .. } => {
                *local_name = name.to_string();
            }
            _ => {}
        }
        self.reposition_finish(id, owner);
        Ok(())
    }

    /// Fails with `InUseAttribute` if an owned attribute renamed to
    /// `prefix:local` would clash with another attribute of its owner.
    fn check_rename_free(&self, id: NodeId, prefix: &str, local: &str) -> Result<(), DomError> {
        let NodeKind::Attribute {
            owner: Some(owner),
            namespace,
            ..
        } = &self.node(id).kind
        else {
            return Ok(());
        };
        let qname = if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{prefix}:{local}")
        };
        let uri = namespace.as_ref().map(Namespace::uri).filter(|u| !u.is_empty());
        let clash = self
            .find_attribute(*owner, &qname)
            .into_iter()
            .chain(uri.and_then(|u| self.find_attribute_ns(*owner, Some(u), local)))
            .any(|other| other != id);
        if clash {
            Err(DomError::InUseAttribute)
        } else {
            Ok(())
        }
    }

    /// Takes an attribute out of its owner's sorted map before a rename.
    fn reposition_start(&mut self, id: NodeId) -> Option<NodeId> {
        let NodeKind::Attribute {
            owner: Some(owner), ..
        } = self.node(id).kind
        else {
            return None;
        };
        self.attribute_map_mut(owner)?.remove(id);
        Some(owner)
    }

    fn reposition_finish(&mut self, id: NodeId, owner: Option<NodeId>) {
        if let Some(owner) = owner {
            let pos = self.attr_insert_position(owner, id);
            if let Some(map) = self.attribute_map_mut(owner) {
                map.insert_at(pos, id);
            }
        }
    }

    /// Returns `true` if both handles refer to the same node.
    #[must_use]
    pub fn is_same_node(&self, a: NodeId, b: NodeId) -> bool {
        a == b
    }

    /// Returns `true` if the node carries the given flag.
    #[must_use]
    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.node(id).flags.contains(flag)
    }

    /// Returns `true` if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// The element used as the namespace context of a node.
    pub(crate) fn namespace_context(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id).kind {
            NodeKind::Element { .. } => Some(id),
            NodeKind::Attribute { owner, .. } => *owner,
            NodeKind::Document => self.document_element,
            _ => self.ancestors(id).find(|&a| self.is_element(a)),
        }
    }

    /// Returns the namespace URI bound to `prefix` in scope of the node;
    /// `None` looks up the default namespace.
    #[must_use]
    pub fn lookup_namespace_uri(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        let el = self.namespace_context(id)?;
        self.find_namespace_uri(el, prefix.unwrap_or(""))
            .map(Namespace::uri)
    }

    /// Returns a prefix bound to `uri` in scope of the node.
    #[must_use]
    pub fn lookup_prefix(&self, id: NodeId, uri: &str) -> Option<&str> {
        if uri.is_empty() {
            return None;
        }
        let el = self.namespace_context(id)?;
        self.find_namespace(el, uri, None)
            .map(Namespace::prefix)
            .filter(|p| !p.is_empty())
    }

    /// Returns `true` if `uri` is the default namespace in scope of the
    /// node.
    #[must_use]
    pub fn is_default_namespace(&self, id: NodeId, uri: Option<&str>) -> bool {
        let default = self.lookup_namespace_uri(id, None);
        default == uri.filter(|u| !u.is_empty())
    }
}

//! Element operations: attributes with `xmlns` aliasing, ID bookkeeping,
//! text helpers, and child queries.
//!
//! Names that are namespace declarations (`xmlns`, `xmlns:p`, or anything
//! in the xmlns namespace) never reach the attribute map. Every attribute
//! entry point classifies its name through [`classify_attribute`] and
//! routes declarations to the element's namespace map instead.

use super::namespace::Namespace;
use super::{Document, NamedNodeMap, NodeFlags, NodeId, NodeKind, NodeList};
use crate::error::DomError;
use crate::util::qname::{check_qualified_name, is_name, split_qname, QName, XMLNS_NAMESPACE};

/// How an attribute name is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AttrRoute<'a> {
    /// `xmlns`: the default namespace declaration.
    DefaultNamespace,
    /// `xmlns:prefix`: a prefixed namespace declaration.
    NamespaceDecl(&'a str),
    /// An ordinary attribute.
    Plain,
}

pub(super) fn classify_attribute<'a>(qname: &'a str, uri: Option<&str>) -> AttrRoute<'a> {
    if qname == "xmlns" {
        return AttrRoute::DefaultNamespace;
    }
    if let Some(prefix) = qname.strip_prefix("xmlns:") {
        return AttrRoute::NamespaceDecl(prefix);
    }
    if uri == Some(XMLNS_NAMESPACE) {
        let (_, local) = split_qname(qname);
        return if local == "xmlns" {
            AttrRoute::DefaultNamespace
        } else {
            AttrRoute::NamespaceDecl(local)
        };
    }
    AttrRoute::Plain
}

/// Route for a lookup by (namespace URI, local name).
fn classify_ns_lookup<'a>(uri: Option<&str>, local_name: &'a str) -> AttrRoute<'a> {
    match uri {
        Some(XMLNS_NAMESPACE) if local_name == "xmlns" => AttrRoute::DefaultNamespace,
        Some(XMLNS_NAMESPACE) => AttrRoute::NamespaceDecl(local_name),
        _ => AttrRoute::Plain,
    }
}

impl Document {
    fn require_element(&self, el: NodeId) -> Result<(), DomError> {
        self.check_owned(el)?;
        if self.is_element(el) {
            Ok(())
        } else {
            Err(DomError::NotSupported("operation requires an element"))
        }
    }

    fn declared_uri(&self, el: NodeId, prefix: &str) -> Option<&str> {
        match &self.node(el).kind {
            NodeKind::Element { namespaces, .. } => namespaces.get(prefix).map(Namespace::uri),
            _ => None,
        }
    }

    fn route_declaration(&mut self, el: NodeId, route: AttrRoute<'_>, value: &str) -> Result<(), DomError> {
        match route {
            AttrRoute::DefaultNamespace => self.declare_default_namespace(el, value).map(drop),
            AttrRoute::NamespaceDecl(prefix) => {
                self.declare_namespace(el, value, Some(prefix)).map(drop)
            }
            AttrRoute::Plain => Ok(()),
        }
    }

    /// Returns the synthetic `xmlns` attribute node for a declaration,
    /// creating it on first use. One node exists per (element, prefix).
    fn namespace_attr_node(&mut self, el: NodeId, prefix: &str, uri: &str) -> NodeId {
        let key = (el, prefix.to_string());
        if let Some(&id) = self.declaration_attrs.get(&key) {
            if let NodeKind::Attribute { value, .. } = &mut self.node_mut(id).kind {
                uri.clone_into(value);
            }
            return id;
        }
        let (local, ns) = if prefix.is_empty() {
            ("xmlns".to_string(), Namespace::new(XMLNS_NAMESPACE, ""))
        } else {
            (prefix.to_string(), Namespace::new(XMLNS_NAMESPACE, "xmlns"))
        };
        let id = self.create_node(NodeKind::Attribute {
            local_name: local,
            namespace: Some(ns),
            value: uri.to_string(),
            owner: Some(el),
            is_id: false,
        });
        self.node_mut(id).flags.insert(NodeFlags::SPECIFIED);
        self.declaration_attrs.insert(key, id);
        id
    }

    // -- Reading attributes --

    /// Returns the value of an attribute by qualified name. `xmlns` and
    /// `xmlns:p` return the declared namespace URI.
    #[must_use]
    pub fn get_attribute(&self, el: NodeId, name: &str) -> Option<&str> {
        match classify_attribute(name, None) {
            AttrRoute::DefaultNamespace => self.declared_uri(el, ""),
            AttrRoute::NamespaceDecl(prefix) => self.declared_uri(el, prefix),
            AttrRoute::Plain => self.find_attribute(el, name).and_then(|a| self.value(a)),
        }
    }

    /// Returns the value of an attribute by namespace URI and local name.
    #[must_use]
    pub fn get_attribute_ns(&self, el: NodeId, uri: Option<&str>, local_name: &str) -> Option<&str> {
        match classify_ns_lookup(uri, local_name) {
            AttrRoute::DefaultNamespace => self.declared_uri(el, ""),
            AttrRoute::NamespaceDecl(prefix) => self.declared_uri(el, prefix),
            AttrRoute::Plain => self
                .find_attribute_ns(el, uri, local_name)
                .and_then(|a| self.value(a)),
        }
    }

    #[must_use]
    pub fn has_attribute(&self, el: NodeId, name: &str) -> bool {
        self.get_attribute(el, name).is_some()
    }

    #[must_use]
    pub fn has_attribute_ns(&self, el: NodeId, uri: Option<&str>, local_name: &str) -> bool {
        self.get_attribute_ns(el, uri, local_name).is_some()
    }

    /// Returns an attribute node by qualified name. Namespace declarations
    /// are returned as pseudo-attribute nodes, reused across calls.
    pub fn get_attribute_node(&mut self, el: NodeId, name: &str) -> Option<NodeId> {
        let (prefix, uri) = match classify_attribute(name, None) {
            AttrRoute::Plain => return self.find_attribute(el, name),
            AttrRoute::DefaultNamespace => ("", self.declared_uri(el, "")?.to_string()),
            AttrRoute::NamespaceDecl(p) => (p, self.declared_uri(el, p)?.to_string()),
        };
        Some(self.namespace_attr_node(el, prefix, &uri))
    }

    /// Returns an attribute node by namespace URI and local name.
    pub fn get_attribute_node_ns(
        &mut self,
        el: NodeId,
        uri: Option<&str>,
        local_name: &str,
    ) -> Option<NodeId> {
        let (prefix, decl_uri) = match classify_ns_lookup(uri, local_name) {
            AttrRoute::Plain => return self.find_attribute_ns(el, uri, local_name),
            AttrRoute::DefaultNamespace => ("", self.declared_uri(el, "")?.to_string()),
            AttrRoute::NamespaceDecl(p) => (p, self.declared_uri(el, p)?.to_string()),
        };
        Some(self.namespace_attr_node(el, prefix, &decl_uri))
    }

    /// Returns a fresh DOM view of the element's attributes: the real
    /// attributes followed by one pseudo-attribute per namespace
    /// declaration. The view is rebuilt on every call.
    pub fn get_attributes(&mut self, el: NodeId) -> NamedNodeMap {
        let mut items: Vec<NodeId> = self.all_attributes(el).to_vec();
        for ns in self.all_declared_namespaces(el) {
            items.push(self.namespace_attr_node(el, ns.prefix(), ns.uri()));
        }
        items.into_iter().collect()
    }

    /// Returns the real attributes of an element, sorted by qualified name.
    #[must_use]
    pub fn all_attributes(&self, el: NodeId) -> &[NodeId] {
        self.attribute_map(el).map_or(&[], |m| m.as_slice())
    }

    // -- Writing attributes --

    /// Sets an attribute by qualified name, updating an existing attribute
    /// in place.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed`, `InvalidCharacter` for a malformed name, or
    /// `NotSupported` when `el` is not an element.
    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.require_element(el)?;
        self.check_writable(el)?;
        if !is_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        let route = classify_attribute(name, None);
        if route != AttrRoute::Plain {
            return self.route_declaration(el, route, value);
        }
        if let Some(existing) = self.find_attribute(el, name) {
            return self.set_value(existing, value);
        }
        let attr = self.create_node(NodeKind::attribute(name, None, value));
        self.node_mut(attr).flags.insert(NodeFlags::SPECIFIED);
        self.insert_attribute(el, attr);
        Ok(())
    }

    /// Sets a namespaced attribute. The namespace is declared on the
    /// element when it is not in scope; an unprefixed name with a URI gets
    /// a bound or generated prefix.
    ///
    /// # Errors
    ///
    /// As [`Document::set_attribute`], plus `Namespace` for an inconsistent
    /// name and URI.
    pub fn set_attribute_ns(
        &mut self,
        el: NodeId,
        uri: Option<&str>,
        qname: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.require_element(el)?;
        self.check_writable(el)?;
        let (prefix, local) = check_qualified_name(qname, uri)?;
        let route = classify_attribute(qname, uri);
        if route != AttrRoute::Plain {
            return self.route_declaration(el, route, value);
        }
        let Some(uri) = uri.filter(|u| !u.is_empty()) else {
            return self.set_attribute(el, qname, value);
        };
        if let Some(existing) = self.find_attribute_ns(el, Some(uri), local) {
            return self.set_value(existing, value);
        }
        let ns = self.ensure_attribute_namespace(el, uri, prefix)?;
        let attr = self.create_node(NodeKind::attribute(local, Some(ns), value));
        self.node_mut(attr).flags.insert(NodeFlags::SPECIFIED);
        self.insert_attribute(el, attr);
        Ok(())
    }

    /// Finds or declares a prefixed namespace for an attribute.
    fn ensure_attribute_namespace(
        &mut self,
        el: NodeId,
        uri: &str,
        prefix: &str,
    ) -> Result<Namespace, DomError> {
        if prefix.is_empty() {
            if let Some(ns) = self
                .find_namespace(el, uri, None)
                .filter(|ns| !ns.prefix().is_empty())
            {
                return Ok(ns.clone());
            }
            return self.declare_namespace(el, uri, None);
        }
        if let Some(ns) = self.find_namespace(el, uri, Some(prefix)) {
            return Ok(ns.clone());
        }
        self.declare_namespace(el, uri, Some(prefix))
    }

    fn attach_attribute_node(
        &mut self,
        el: NodeId,
        attr: NodeId,
        declare: bool,
    ) -> Result<Option<NodeId>, DomError> {
        self.require_element(el)?;
        self.check_owned(attr)?;
        self.check_writable(el)?;
        let NodeKind::Attribute { owner, .. } = self.node(attr).kind else {
            return Err(DomError::HierarchyRequest("node is not an attribute"));
        };
        match owner {
            Some(o) if o == el => return Ok(Some(attr)),
            Some(_) => return Err(DomError::InUseAttribute),
            None => {}
        }
        let name = self.node_name(attr);
        let uri = self.namespace_uri(attr).map(str::to_string);
        let route = classify_attribute(&name, uri.as_deref());
        if route != AttrRoute::Plain {
            let value = self.value(attr).unwrap_or_default().to_string();
            self.route_declaration(el, route, &value)?;
            return Ok(None);
        }
        if declare {
            if let Some(ns) = self.namespace(attr).cloned() {
                if self.find_namespace(el, ns.uri(), Some(ns.prefix())).is_none() {
                    self.declare_namespace(el, ns.uri(), Some(ns.prefix()))?;
                }
            }
        }
        Ok(self.insert_attribute(el, attr))
    }

    /// Attaches an attribute node, replacing the attribute with the same
    /// qualified name. Returns the displaced attribute.
    ///
    /// Attaching an attribute to its current owner returns it unchanged.
    ///
    /// # Errors
    ///
    /// `InUseAttribute` if another element owns `attr`, plus the errors of
    /// [`Document::set_attribute`].
    pub fn set_attribute_node(&mut self, el: NodeId, attr: NodeId) -> Result<Option<NodeId>, DomError> {
        self.attach_attribute_node(el, attr, false)
    }

    /// Attaches an attribute node keyed by namespace and local name,
    /// declaring its namespace when it is not in scope.
    ///
    /// # Errors
    ///
    /// As [`Document::set_attribute_node`].
    pub fn set_attribute_node_ns(
        &mut self,
        el: NodeId,
        attr: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        self.attach_attribute_node(el, attr, true)
    }

    /// Adds an attribute node, copying it first when another element owns
    /// it. Returns the attached node.
    ///
    /// # Errors
    ///
    /// As [`Document::set_attribute_node_ns`].
    pub fn add_attribute(&mut self, el: NodeId, attr: NodeId) -> Result<NodeId, DomError> {
        self.check_owned(attr)?;
        let attr = match self.owner_element(attr) {
            Some(owner) if owner != el => self.clone_node(attr, false)?,
            _ => attr,
        };
        self.set_attribute_node_ns(el, attr)?;
        Ok(attr)
    }

    /// Creates and attaches an attribute, declaring `ns` on the element if
    /// it is not in scope. Returns the attribute node.
    ///
    /// # Errors
    ///
    /// As [`Document::set_attribute_ns`].
    pub fn add_attribute_value(
        &mut self,
        el: NodeId,
        local_name: &str,
        value: &str,
        ns: Option<Namespace>,
    ) -> Result<NodeId, DomError> {
        let qname = match &ns {
            Some(ns) if !ns.prefix().is_empty() => format!("{}:{local_name}", ns.prefix()),
            _ => local_name.to_string(),
        };
        let uri = ns.as_ref().map(Namespace::uri).filter(|u| !u.is_empty());
        let route = classify_attribute(&qname, uri);
        if route != AttrRoute::Plain {
            self.require_element(el)?;
            self.route_declaration(el, route, value)?;
            return Ok(self.namespace_attr_node(el, route_prefix(route), value));
        }
        self.set_attribute_ns(el, uri, &qname, value)?;
        self.find_attribute_ns(el, uri, local_name)
            .ok_or(DomError::NotFound("attribute was not attached"))
    }

    // -- Removing attributes --

    /// Removes an attribute by qualified name. Removing `xmlns` or
    /// `xmlns:p` removes the declaration.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only element.
    pub fn remove_attribute(&mut self, el: NodeId, name: &str) -> Result<(), DomError> {
        self.require_element(el)?;
        self.check_writable(el)?;
        match classify_attribute(name, None) {
            AttrRoute::DefaultNamespace => self.remove_namespace(el, "").map(drop),
            AttrRoute::NamespaceDecl(prefix) => self.remove_namespace(el, prefix).map(drop),
            AttrRoute::Plain => {
                if let Some(attr) = self.find_attribute(el, name) {
                    self.release_attribute(el, attr);
                }
                Ok(())
            }
        }
    }

    /// Removes an attribute by namespace URI and local name.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only element.
    pub fn remove_attribute_ns(
        &mut self,
        el: NodeId,
        uri: Option<&str>,
        local_name: &str,
    ) -> Result<(), DomError> {
        self.require_element(el)?;
        self.check_writable(el)?;
        match classify_ns_lookup(uri, local_name) {
            AttrRoute::DefaultNamespace => self.remove_namespace(el, "").map(drop),
            AttrRoute::NamespaceDecl(prefix) => self.remove_namespace(el, prefix).map(drop),
            AttrRoute::Plain => {
                if let Some(attr) = self.find_attribute_ns(el, uri, local_name) {
                    self.release_attribute(el, attr);
                }
                Ok(())
            }
        }
    }

    /// Removes an attribute node and returns it, unowned.
    ///
    /// # Errors
    ///
    /// `NotFound` if `el` does not own `attr`.
    pub fn remove_attribute_node(&mut self, el: NodeId, attr: NodeId) -> Result<NodeId, DomError> {
        self.require_element(el)?;
        self.check_owned(attr)?;
        self.check_writable(el)?;
        if self.owner_element(attr) != Some(el)
            || !self.all_attributes(el).contains(&attr)
        {
            return Err(DomError::NotFound("attribute is not owned by this element"));
        }
        self.release_attribute(el, attr);
        Ok(attr)
    }

    // -- IDs --

    /// Flags or unflags the attribute `name` as an ID.
    ///
    /// # Errors
    ///
    /// `NotFound` if the element has no such attribute.
    pub fn set_id_attribute(&mut self, el: NodeId, name: &str, is_id: bool) -> Result<(), DomError> {
        self.require_element(el)?;
        let attr = self
            .find_attribute(el, name)
            .ok_or(DomError::NotFound("no such attribute"))?;
        self.set_id_attribute_node(el, attr, is_id)
    }

    /// Flags or unflags a namespaced attribute as an ID.
    ///
    /// # Errors
    ///
    /// `NotFound` if the element has no such attribute.
    pub fn set_id_attribute_ns(
        &mut self,
        el: NodeId,
        uri: Option<&str>,
        local_name: &str,
        is_id: bool,
    ) -> Result<(), DomError> {
        self.require_element(el)?;
        let attr = self
            .find_attribute_ns(el, uri, local_name)
            .ok_or(DomError::NotFound("no such attribute"))?;
        self.set_id_attribute_node(el, attr, is_id)
    }

    /// Flags or unflags an attribute node of `el` as an ID and updates
    /// the document's ID registry.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only element, `NotFound` if `el`
    /// does not own `attr`.
    pub fn set_id_attribute_node(
        &mut self,
        el: NodeId,
        attr: NodeId,
        is_id: bool,
    ) -> Result<(), DomError> {
        self.check_owned(attr)?;
        self.check_writable(el)?;
        if self.owner_element(attr) != Some(el) {
            return Err(DomError::NotFound("attribute is not owned by this element"));
        }
        if let NodeKind::Attribute { is_id: flag, .. } = &mut self.node_mut(attr).kind {
            *flag = is_id;
        }
        self.id_attrs.retain(|&a| a != attr);
        if is_id {
            self.id_attrs.push(attr);
        }
        Ok(())
    }

    /// Returns the owner of the first registered ID attribute with the
    /// given value.
    #[must_use]
    pub fn get_element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.id_attrs
            .iter()
            .find(|&&a| self.value(a) == Some(id_value))
            .and_then(|&a| self.owner_element(a))
    }

    // -- Names --

    /// Returns the tag name: `prefix:local` or `local`.
    #[must_use]
    pub fn tag_name(&self, el: NodeId) -> Option<String> {
        self.is_element(el).then(|| self.node_name(el))
    }

    /// Returns the expanded name of an element or attribute.
    #[must_use]
    pub fn qname(&self, id: NodeId) -> Option<QName> {
        let local = self.local_name(id)?;
        Some(match self.namespace(id) {
            Some(ns) => QName::new(ns.uri(), local, ns.prefix()),
            None => QName::local(local),
        })
    }

    /// Resolves a `prefix:local` string against the namespaces in scope of
    /// `el`. An unprefixed name takes the default namespace. Returns `None`
    /// for an unbound prefix.
    #[must_use]
    pub fn resolve_qname(&self, el: NodeId, qname: &str) -> Option<QName> {
        match split_qname(qname) {
            (Some(prefix), local) => {
                let ns = self.find_namespace_uri(el, prefix)?;
                Some(QName::new(ns.uri(), local, prefix))
            }
            (None, local) => Some(match self.default_namespace(el) {
                Some(ns) => QName::new(ns.uri(), local, ""),
                None => QName::local(local),
            }),
        }
    }

    /// Returns the source line of an element's start tag, 0 if unknown.
    #[must_use]
    pub fn line_number(&self, el: NodeId) -> u32 {
        match self.node(el).kind {
            NodeKind::Element { line_number, .. } => line_number,
            _ => 0,
        }
    }

    // -- Text --

    /// Concatenates the direct Text and CDATA children of an element.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn get_text(&mut self, el: NodeId) -> Result<String, DomError> {
        self.build(el)?;
        let mut text = String::new();
        for child in self.children_if_available(el) {
            if let NodeKind::Text { content } | NodeKind::CData { content } = &self.node(child).kind {
                text.push_str(content);
            }
        }
        Ok(text)
    }

    /// Replaces the direct Text children of an element with one Text node.
    /// Other children are kept.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only element, cursor failures.
    pub fn set_text(&mut self, el: NodeId, text: &str) -> Result<(), DomError> {
        self.require_element(el)?;
        self.check_writable(el)?;
        self.build(el)?;
        let texts: Vec<NodeId> = self
            .children_if_available(el)
            .filter(|&c| matches!(self.node(c).kind, NodeKind::Text { .. }))
            .collect();
        for t in texts {
            self.unlink(t);
        }
        let node = self.create_text_node(text);
        self.link_append(el, node);
        Ok(())
    }

    /// [`Document::get_text`] with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn trimmed_text(&mut self, el: NodeId) -> Result<String, DomError> {
        Ok(self.get_text(el)?.trim().to_string())
    }

    /// Interprets the element's trimmed text as a qualified name in scope
    /// of the element.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn text_as_qname(&mut self, el: NodeId) -> Result<Option<QName>, DomError> {
        let text = self.trimmed_text(el)?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(self.resolve_qname(el, &text))
    }

    // -- Child queries --

    /// Returns the direct element children.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn child_elements(&mut self, el: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.build(el)?;
        Ok(self
            .children_if_available(el)
            .filter(|&c| self.is_element(c))
            .collect())
    }

    /// Returns the first element child, building only as far as needed.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn first_element(&mut self, el: NodeId) -> Result<Option<NodeId>, DomError> {
        self.find_child(el, |doc, c| doc.is_element(c))
    }

    /// Returns the first element child with the given expanded name.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn first_child_with_name(&mut self, el: NodeId, name: &QName) -> Result<Option<NodeId>, DomError> {
        self.find_child(el, |doc, c| doc.is_element(c) && doc.qname(c).as_ref() == Some(name))
    }

    fn find_child(
        &mut self,
        el: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Result<Option<NodeId>, DomError> {
        let mut cursor = self.first_child(el)?;
        while let Some(c) = cursor {
            if pred(self, c) {
                return Ok(Some(c));
            }
            cursor = self.next_sibling(c)?;
        }
        Ok(None)
    }

    fn filter_children(
        &mut self,
        el: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Result<NodeList, DomError> {
        self.build(el)?;
        Ok(self
            .children_if_available(el)
            .filter(|&c| self.is_element(c) && pred(self, c))
            .collect())
    }

    /// Returns the element children with the given expanded name.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn children_with_name(&mut self, el: NodeId, name: &QName) -> Result<NodeList, DomError> {
        self.filter_children(el, |doc, c| doc.qname(c).as_ref() == Some(name))
    }

    /// Returns the element children with the given local name.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn children_with_local_name(&mut self, el: NodeId, local_name: &str) -> Result<NodeList, DomError> {
        self.filter_children(el, |doc, c| doc.local_name(c) == Some(local_name))
    }

    /// Returns the element children in the given namespace.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn children_with_namespace(&mut self, el: NodeId, uri: &str) -> Result<NodeList, DomError> {
        self.filter_children(el, |doc, c| doc.namespace_uri(c) == Some(uri))
    }

    /// Returns the descendant elements with the given tag name, `*`
    /// matching all, in document order.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn get_elements_by_tag_name(&mut self, id: NodeId, name: &str) -> Result<NodeList, DomError> {
        self.build(id)?;
        Ok(self
            .descendants_if_available(id)
            .filter(|&d| self.is_element(d) && (name == "*" || self.node_name(d) == name))
            .collect())
    }

    /// Returns the descendant elements with the given namespace URI and
    /// local name; `*` matches any value of either.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn get_elements_by_tag_name_ns(
        &mut self,
        id: NodeId,
        uri: Option<&str>,
        local_name: &str,
    ) -> Result<NodeList, DomError> {
        self.build(id)?;
        let uri = uri.filter(|u| !u.is_empty());
        Ok(self
            .descendants_if_available(id)
            .filter(|&d| {
                self.is_element(d)
                    && (uri == Some("*") || self.namespace_uri(d) == uri)
                    && (local_name == "*" || self.local_name(d) == Some(local_name))
            })
            .collect())
    }
}

fn route_prefix<'a>(route: AttrRoute<'a>) -> &'a str {
    match route {
        AttrRoute::NamespaceDecl(prefix) => prefix,
        _ => "",
    }
}

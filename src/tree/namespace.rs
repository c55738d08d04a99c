//! Namespace values and element namespace scoping.

use super::{Document, NodeId, NodeKind};
use crate::error::DomError;
use crate::util::qname::XML_NAMESPACE;

/// An immutable (URI, prefix) pair. The empty prefix denotes the default
/// namespace.
///
/// ```
/// use lazydom::tree::Namespace;
///
/// let ns = Namespace::new("urn:x", "p");
/// assert_eq!(ns, Namespace::new("urn:x", "p"));
/// assert_ne!(ns, Namespace::new("urn:x", "q"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    uri: String,
    prefix: String,
}

impl Namespace {
    #[must_use]
    pub fn new(uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The prefix, empty for the default namespace.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.prefix.is_empty()
    }
}

fn xml_namespace() -> &'static Namespace {
    static XML: std::sync::OnceLock<Namespace> = std::sync::OnceLock::new();
    XML.get_or_init(|| Namespace::new(XML_NAMESPACE, "xml"))
}

impl Document {
    fn declarations(&self, el: NodeId) -> Option<&std::collections::BTreeMap<String, Namespace>> {
        match &self.node(el).kind {
            NodeKind::Element { namespaces, .. } => Some(namespaces),
            _ => None,
        }
    }

    /// Declares a namespace on an element, overwriting any existing
    /// declaration for the same prefix.
    ///
    /// `None` generates a fresh `nsN` prefix; `Some("")` declares the
    /// default namespace. Prefixes starting with `xmlns` are returned but
    /// not stored.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on a read-only element and
    /// `NotSupported` when `el` is not an element.
    pub fn declare_namespace(
        &mut self,
        el: NodeId,
        uri: &str,
        prefix: Option<&str>,
    ) -> Result<Namespace, DomError> {
        self.check_writable(el)?;
        if !self.is_element(el) {
            return Err(DomError::NotSupported(
                "namespace declarations require an element",
            ));
        }
        let prefix = match prefix {
            Some(p) => p.to_string(),
            None => self.generate_prefix(),
        };
        let ns = Namespace::new(uri, prefix);
        if ns.prefix.starts_with("xmlns") {
            return Ok(ns);
        }
        if let NodeKind::Element { namespaces, .. } = &mut self.node_mut(el).kind {
            namespaces.insert(ns.prefix.clone(), ns.clone());
        }
        Ok(ns)
    }

    /// Declares the default namespace of an element.
    ///
    /// # Errors
    ///
    /// As [`Document::declare_namespace`].
    pub fn declare_default_namespace(
        &mut self,
        el: NodeId,
        uri: &str,
    ) -> Result<Namespace, DomError> {
        self.declare_namespace(el, uri, Some(""))
    }

    pub(crate) fn generate_prefix(&mut self) -> String {
        self.prefix_counter += 1;
        format!("ns{}", self.prefix_counter)
    }

    /// Finds a namespace with the given URI in scope of `el`.
    ///
    /// A `None` or empty prefix matches any prefix bound to `uri`. The walk
    /// goes from `el` up through its ancestor elements.
    #[must_use]
    pub fn find_namespace(&self, el: NodeId, uri: &str, prefix: Option<&str>) -> Option<&Namespace> {
        if uri == XML_NAMESPACE && prefix.map_or(true, |p| p.is_empty() || p == "xml") {
            return Some(xml_namespace());
        }
        let prefix = prefix.filter(|p| !p.is_empty());
        let mut cursor = Some(el);
        while let Some(id) = cursor {
            if let Some(decls) = self.declarations(id) {
                let found = match prefix {
                    Some(p) => decls.get(p).filter(|ns| ns.uri == uri),
                    None => decls.values().find(|ns| ns.uri == uri),
                };
                if found.is_some() {
                    return found;
                }
            }
            cursor = self.parent(id);
        }
        None
    }

    /// Finds the nearest declaration of `prefix` in scope of `el`; the
    /// empty prefix finds the default namespace.
    ///
    /// A declaration with an empty URI undeclares the prefix and stops the
    /// walk.
    #[must_use]
    pub fn find_namespace_uri(&self, el: NodeId, prefix: &str) -> Option<&Namespace> {
        if prefix == "xml" {
            return Some(xml_namespace());
        }
        let mut cursor = Some(el);
        while let Some(id) = cursor {
            if let Some(ns) = self.declarations(id).and_then(|d| d.get(prefix)) {
                return (!ns.uri.is_empty()).then_some(ns);
            }
            cursor = self.parent(id);
        }
        None
    }

    /// Returns the default namespace in scope of `el`.
    #[must_use]
    pub fn default_namespace(&self, el: NodeId) -> Option<&Namespace> {
        self.find_namespace_uri(el, "")
    }

    /// Returns the URI bound to `prefix` in scope of `el`.
    #[must_use]
    pub fn namespace_uri_for_prefix(&self, el: NodeId, prefix: &str) -> Option<&str> {
        self.find_namespace_uri(el, prefix).map(Namespace::uri)
    }

    /// Removes the declaration of `prefix` from `el`. Returns `true` if one
    /// was present.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on a read-only element.
    pub fn remove_namespace(&mut self, el: NodeId, prefix: &str) -> Result<bool, DomError> {
        self.check_writable(el)?;
        self.declaration_attrs.remove(&(el, prefix.to_string()));
        match &mut self.node_mut(el).kind {
            NodeKind::Element { namespaces, .. } => Ok(namespaces.remove(prefix).is_some()),
            _ => Ok(false),
        }
    }

    /// Returns the namespaces declared directly on `el`, ordered by prefix.
    #[must_use]
    pub fn all_declared_namespaces(&self, el: NodeId) -> Vec<Namespace> {
        self.declarations(el)
            .map(|d| d.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Sets the namespace of an element, declaring it on the element if it
    /// is not already in scope.
    ///
    /// # Errors
    ///
    /// Fails with `NoModificationAllowed` on a read-only element and
    /// `NotSupported` when `el` is not an element.
    pub fn set_namespace(&mut self, el: NodeId, ns: Option<Namespace>) -> Result<(), DomError> {
        self.check_writable(el)?;
        if !self.is_element(el) {
            return Err(DomError::NotSupported("only elements take a namespace here"));
        }
        let ns = match ns {
            Some(ns) if !ns.uri.is_empty() => {
                if self.find_namespace(el, &ns.uri, Some(&ns.prefix)).is_none()
                    || (ns.prefix.is_empty()
                        && self.default_namespace(el).map(Namespace::uri) != Some(ns.uri()))
                {
                    self.declare_namespace(el, &ns.uri, Some(&ns.prefix))?;
                }
                Some(ns)
            }
            _ => None,
        };
        if let NodeKind::Element { namespace, .. } = &mut self.node_mut(el).kind {
            *namespace = ns;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let c = doc.create_element("c").unwrap();
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, c).unwrap();
        (a, b, c)
    }

    #[test]
    fn test_nearest_declaration_shadows() {
        let mut doc = Document::new();
        let (a, b, c) = nested(&mut doc);
        doc.declare_namespace(a, "urn:outer", Some("p")).unwrap();
        assert_eq!(doc.namespace_uri_for_prefix(c, "p"), Some("urn:outer"));
        doc.declare_namespace(b, "urn:inner", Some("p")).unwrap();
        assert_eq!(doc.namespace_uri_for_prefix(c, "p"), Some("urn:inner"));
        assert_eq!(doc.namespace_uri_for_prefix(a, "p"), Some("urn:outer"));
        assert_eq!(doc.namespace_uri_for_prefix(c, "q"), None);
    }

    #[test]
    fn test_declare_overwrites_prefix() {
        let mut doc = Document::new();
        let (a, _, _) = nested(&mut doc);
        doc.declare_namespace(a, "urn:1", Some("p")).unwrap();
        doc.declare_namespace(a, "urn:2", Some("p")).unwrap();
        assert_eq!(doc.all_declared_namespaces(a), vec![Namespace::new("urn:2", "p")]);
    }

    #[test]
    fn test_generated_prefixes() {
        let mut doc = Document::new();
        let (a, _, _) = nested(&mut doc);
        let first = doc.declare_namespace(a, "urn:1", None).unwrap();
        let second = doc.declare_namespace(a, "urn:2", None).unwrap();
        assert_eq!(first.prefix(), "ns1");
        assert_eq!(second.prefix(), "ns2");
    }

    #[test]
    fn test_xmlns_prefix_not_stored() {
        let mut doc = Document::new();
        let (a, _, _) = nested(&mut doc);
        doc.declare_namespace(a, "urn:x", Some("xmlns")).unwrap();
        assert!(doc.all_declared_namespaces(a).is_empty());
    }

    #[test]
    fn test_default_namespace_and_undeclare() {
        let mut doc = Document::new();
        let (a, b, c) = nested(&mut doc);
        doc.declare_default_namespace(a, "urn:d").unwrap();
        assert_eq!(doc.default_namespace(c).map(Namespace::uri), Some("urn:d"));
        doc.declare_default_namespace(b, "").unwrap();
        assert_eq!(doc.default_namespace(c), None);
        assert_eq!(doc.default_namespace(a).map(Namespace::uri), Some("urn:d"));
    }

    #[test]
    fn test_find_namespace_by_uri() {
        let mut doc = Document::new();
        let (a, _, c) = nested(&mut doc);
        doc.declare_namespace(a, "urn:x", Some("x")).unwrap();
        assert_eq!(
            doc.find_namespace(c, "urn:x", None),
            Some(&Namespace::new("urn:x", "x"))
        );
        assert_eq!(doc.find_namespace(c, "urn:x", Some("y")), None);
        assert_eq!(
            doc.find_namespace(c, XML_NAMESPACE, None).map(Namespace::prefix),
            Some("xml")
        );
        assert_eq!(doc.namespace_uri_for_prefix(c, "xml"), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_remove_namespace() {
        let mut doc = Document::new();
        let (a, _, _) = nested(&mut doc);
        doc.declare_namespace(a, "urn:x", Some("x")).unwrap();
        assert!(doc.remove_namespace(a, "x").unwrap());
        assert!(!doc.remove_namespace(a, "x").unwrap());
    }

    #[test]
    fn test_set_namespace_declares_when_missing() {
        let mut doc = Document::new();
        let (a, b, _) = nested(&mut doc);
        doc.declare_namespace(a, "urn:x", Some("x")).unwrap();
        doc.set_namespace(b, Some(Namespace::new("urn:x", "x"))).unwrap();
        assert!(doc.all_declared_namespaces(b).is_empty());
        doc.set_namespace(b, Some(Namespace::new("urn:y", "y"))).unwrap();
        assert_eq!(doc.all_declared_namespaces(b), vec![Namespace::new("urn:y", "y")]);
        assert_eq!(doc.node_name(b), "y:b");
    }
}

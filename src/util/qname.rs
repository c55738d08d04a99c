//! `QName` (qualified name) handling.
//!
//! A `QName` is a name of the form `prefix:localname` or just `localname` (with
//! no prefix). This module provides utilities for splitting and validating
//! qualified names as defined by the Namespaces in XML 1.0 specification, and
//! the [`QName`] value type used by the object-model API.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

use std::fmt;

use crate::error::DomError;

/// The well-known XML namespace URI, pre-bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The well-known xmlns namespace URI.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// An expanded name: namespace URI, local part, and the prefix it was
/// written with.
///
/// Two `QName`s are equal when their namespace URI and local part match;
/// the prefix is carried for serialization only.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    /// Namespace URI, empty for no namespace.
    pub namespace_uri: String,
    /// Local part.
    pub local_part: String,
    /// Prefix, empty for none.
    pub prefix: String,
}

impl QName {
    /// Creates a `QName` with no namespace.
    #[must_use]
    pub fn local(local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: String::new(),
            local_part: local_part.into(),
            prefix: String::new(),
        }
    }

    /// Creates a namespaced `QName`.
    #[must_use]
    pub fn new(
        namespace_uri: impl Into<String>,
        local_part: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_part: local_part.into(),
            prefix: prefix.into(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_part == other.local_part
    }
}

impl std::hash::Hash for QName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_part.hash(state);
    }
}

impl fmt::Display for QName {
    /// Formats in Clark notation: `{uri}local`, or just `local`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_part)
        }
    }
}

/// Splits a `QName` into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not.
///
/// # Examples
///
/// ```
/// use lazydom::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
#[must_use]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
#[must_use]
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `name` matches the XML `Name` production.
#[must_use]
pub fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Returns `true` if `name` is a `Name` without any colon.
#[must_use]
pub fn is_ncname(name: &str) -> bool {
    !name.contains(':') && is_name(name)
}

/// Validates a qualified name against a namespace URI, as required by the
/// namespace-aware factory methods.
///
/// Returns the `(prefix, local_name)` split on success; the prefix is empty
/// when the name has none. An empty `namespace_uri` is treated as no
/// namespace.
///
/// # Errors
///
/// - [`DomError::InvalidCharacter`] if `qname` is not an XML `Name`, or
///   either of its parts is not an `NCName`.
/// - [`DomError::Namespace`] if the name is malformed as a `QName`, a prefix
///   is used without a namespace, or the reserved `xml` / `xmlns` prefixes
///   are bound to the wrong URI.
pub fn check_qualified_name<'a>(
    qname: &'a str,
    namespace_uri: Option<&str>,
) -> Result<(&'a str, &'a str), DomError> {
    if !is_name(qname) {
        return Err(DomError::InvalidCharacter(qname.to_string()));
    }
    let uri = namespace_uri.filter(|u| !u.is_empty());
    let (prefix, local) = match split_qname(qname) {
        (Some(prefix), local) => {
            if prefix.is_empty() || local.is_empty() || local.contains(':') {
                return Err(DomError::Namespace(format!("malformed qualified name '{qname}'")));
            }
            if !is_ncname(prefix) || !is_ncname(local) {
                return Err(DomError::InvalidCharacter(qname.to_string()));
            }
            (prefix, local)
        }
        (None, local) => ("", local),
    };

    if !prefix.is_empty() && uri.is_none() {
        return Err(DomError::Namespace(format!(
            "prefix '{prefix}' requires a namespace URI"
        )));
    }
    if prefix == "xml" && uri != Some(XML_NAMESPACE) {
        return Err(DomError::Namespace(
            "the 'xml' prefix must be bound to the XML namespace".to_string(),
        ));
    }
    let is_xmlns_name = prefix == "xmlns" || (prefix.is_empty() && local == "xmlns");
    if is_xmlns_name != (uri == Some(XMLNS_NAMESPACE)) {
        return Err(DomError::Namespace(
            "'xmlns' names and the xmlns namespace must be used together".to_string(),
        ));
    }
    Ok((prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname_with_prefix() {
        assert_eq!(split_qname("xml:lang"), (Some("xml"), "lang"));
    }

    #[test]
    fn test_split_qname_without_prefix() {
        assert_eq!(split_qname("div"), (None, "div"));
    }

    #[test]
    fn test_split_qname_colon_at_start() {
        assert_eq!(split_qname(":local"), (Some(""), "local"));
    }

    #[test]
    fn test_split_qname_multiple_colons() {
        // Only splits on first colon
        assert_eq!(split_qname("a:b:c"), (Some("a"), "b:c"));
    }

    #[test]
    fn test_is_name_chars() {
        assert!(is_name_start_char('a'));
        assert!(is_name_start_char('_'));
        assert!(is_name_start_char(':'));
        assert!(!is_name_start_char('0'));
        assert!(!is_name_start_char('-'));

        assert!(is_name_char('0'));
        assert!(is_name_char('-'));
        assert!(is_name_char('.'));
        assert!(!is_name_char(' '));
    }

    #[test]
    fn test_is_name_and_ncname() {
        assert!(is_name("p:foo"));
        assert!(!is_ncname("p:foo"));
        assert!(is_ncname("foo-bar.1"));
        assert!(!is_name(""));
        assert!(!is_name("1abc"));
        assert!(!is_name("a b"));
    }

    #[test]
    fn test_check_qualified_name_valid() {
        assert_eq!(
            check_qualified_name("p:root", Some("urn:x")).ok(),
            Some(("p", "root"))
        );
        assert_eq!(check_qualified_name("root", None).ok(), Some(("", "root")));
        assert_eq!(
            check_qualified_name("xml:lang", Some(XML_NAMESPACE)).ok(),
            Some(("xml", "lang"))
        );
        assert_eq!(
            check_qualified_name("xmlns:p", Some(XMLNS_NAMESPACE)).ok(),
            Some(("xmlns", "p"))
        );
    }

    #[test]
    fn test_check_qualified_name_invalid_character() {
        let err = check_qualified_name("1bad", None).unwrap_err();
        assert_eq!(err.code(), Some(5));
    }

    #[test]
    fn test_check_qualified_name_prefix_without_namespace() {
        let err = check_qualified_name("p:root", None).unwrap_err();
        assert_eq!(err.code(), Some(14));
        let err = check_qualified_name("p:root", Some("")).unwrap_err();
        assert_eq!(err.code(), Some(14));
    }

    #[test]
    fn test_check_qualified_name_malformed() {
        assert_eq!(check_qualified_name(":root", Some("urn:x")).unwrap_err().code(), Some(14));
        assert_eq!(check_qualified_name("a:b:c", Some("urn:x")).unwrap_err().code(), Some(14));
    }

    #[test]
    fn test_check_qualified_name_reserved_prefixes() {
        assert!(check_qualified_name("xml:lang", Some("urn:x")).is_err());
        assert!(check_qualified_name("xmlns:p", Some("urn:x")).is_err());
        assert!(check_qualified_name("p:q", Some(XMLNS_NAMESPACE)).is_err());
    }

    #[test]
    fn test_qname_equality_ignores_prefix() {
        let a = QName::new("urn:x", "foo", "p");
        let b = QName::new("urn:x", "foo", "q");
        assert_eq!(a, b);
        assert_ne!(a, QName::local("foo"));
        assert_eq!(a.to_string(), "{urn:x}foo");
        assert_eq!(QName::local("bar").to_string(), "bar");
    }
}

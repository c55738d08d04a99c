//! XML text writer.
//!
//! [`XmlWriter`] implements [`XmlSink`] over any [`io::Write`]. Start tags
//! are held open until the next call so that empty elements can be written
//! self-closing and missing namespace declarations can be added.

use std::fmt::Write as _;
use std::io::{self, Write};

use super::XmlSink;
use crate::util::qname::XML_NAMESPACE;

/// Options controlling XML text output.
///
/// # Examples
///
/// ```
/// use lazydom::serial::SerializeOptions;
///
/// let options = SerializeOptions::default().xml_declaration(false).indent(true);
/// assert!(!options.xml_declaration);
/// assert_eq!(options.indent_str, "  ");
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether a document starts with an XML declaration.
    /// Defaults to `true`.
    pub xml_declaration: bool,
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            indent: false,
            indent_str: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    /// Enables or disables the XML declaration of document output.
    #[must_use]
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    /// Enables or disables indented output.
    ///
    /// When enabled, markup children are placed on their own lines.
    /// Whitespace-only text is dropped and elements holding text are not
    /// indented inside.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

#[derive(Debug)]
struct PendingAttr {
    prefix: String,
    local_name: String,
    uri: Option<String>,
    value: String,
}

/// A start tag that has not been closed yet.
#[derive(Debug)]
struct PendingTag {
    prefix: String,
    local_name: String,
    uri: Option<String>,
    namespaces: Vec<(String, String)>,
    attributes: Vec<PendingAttr>,
}

/// An open element.
#[derive(Debug)]
struct Scope {
    qname: String,
    /// Prefix bindings declared on this element.
    bindings: Vec<(String, String)>,
    has_markup: bool,
    has_text: bool,
}

fn qname(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{prefix}:{local_name}")
    }
}

/// Renders sink calls as XML text.
///
/// # Examples
///
/// ```
/// use lazydom::serial::{XmlSink, XmlWriter};
///
/// let mut writer = XmlWriter::new(Vec::new());
/// writer.write_start_element("p", "e", Some("urn:p")).unwrap();
/// writer.write_attribute("", "a", None, "1 < 2").unwrap();
/// writer.write_end_element().unwrap();
/// let xml = String::from_utf8(writer.into_inner()).unwrap();
/// assert_eq!(xml, "<p:e xmlns:p=\"urn:p\" a=\"1 &lt; 2\"/>");
/// ```
#[derive(Debug)]
pub struct XmlWriter<W: Write> {
    out: W,
    options: SerializeOptions,
    pending: Option<PendingTag>,
    scopes: Vec<Scope>,
    document: bool,
    prefix_counter: u32,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, SerializeOptions::default())
    }

    pub fn with_options(out: W, options: SerializeOptions) -> Self {
        Self {
            out,
            options,
            pending: None,
            scopes: Vec::new(),
            document: false,
            prefix_counter: 0,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Resolves a prefix against the pending declarations, then the open
    /// elements.
    fn resolve(&self, declared: &[(String, String)], prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        declared
            .iter()
            .chain(self.scopes.iter().rev().flat_map(|s| s.bindings.iter()))
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
    }

    fn prefix_for(&self, declared: &[(String, String)], uri: &str) -> Option<String> {
        declared
            .iter()
            .chain(self.scopes.iter().rev().flat_map(|s| s.bindings.iter()))
            .find(|(p, u)| !p.is_empty() && u == uri)
            .map(|(p, _)| p.clone())
            .filter(|p| self.resolve(declared, p).as_deref() == Some(uri))
    }

    fn fresh_prefix(&mut self, declared: &[(String, String)]) -> String {
        loop {
            self.prefix_counter += 1;
            let prefix = format!("ns{}", self.prefix_counter);
            if self.resolve(declared, &prefix).is_none() {
                return prefix;
            }
        }
    }

    fn write_indent(&mut self, depth: usize) -> io::Result<()> {
        let mut buf = String::from("\n");
        for _ in 0..depth {
            buf.push_str(&self.options.indent_str);
        }
        self.out.write_all(buf.as_bytes())
    }

    /// Prepares the position for a markup child: closes a pending start
    /// tag and indents.
    fn begin_markup(&mut self) -> io::Result<()> {
        self.close_start_tag(false)?;
        let depth = self.scopes.len();
        let indent = self.options.indent;
        if let Some(scope) = self.scopes.last_mut() {
            scope.has_markup = true;
            if indent && !scope.has_text {
                self.write_indent(depth)?;
            }
        }
        Ok(())
    }

    /// Writes a line break after a top-level node of a document.
    fn end_markup(&mut self) -> io::Result<()> {
        if self.document && self.scopes.is_empty() {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn close_start_tag(&mut self, empty: bool) -> io::Result<()> {
        let Some(tag) = self.pending.take() else {
            return Ok(());
        };
        let mut declared = tag.namespaces;

        match tag.uri.as_deref().filter(|u| !u.is_empty()) {
            Some(uri) => {
                if self.resolve(&declared, &tag.prefix).as_deref() != Some(uri) {
                    declared.retain(|(p, _)| *p != tag.prefix);
                    declared.push((tag.prefix.clone(), uri.to_string()));
                }
            }
            None if tag.prefix.is_empty() => {
                if self.resolve(&declared, "").is_some_and(|u| !u.is_empty()) {
                    declared.retain(|(p, _)| !p.is_empty());
                    declared.push((String::new(), String::new()));
                }
            }
            None => {}
        }

        let mut attributes = tag.attributes;
        for attr in &mut attributes {
            let Some(uri) = attr.uri.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            if !attr.prefix.is_empty() {
                match self.resolve(&declared, &attr.prefix) {
                    Some(bound) if bound == uri => continue,
                    _ if !declared.iter().any(|(p, _)| *p == attr.prefix) => {
                        declared.push((attr.prefix.clone(), uri.to_string()));
                        continue;
                    }
                    _ => {}
                }
            }
            attr.prefix = match self.prefix_for(&declared, uri) {
                Some(prefix) => prefix,
                None => {
                    let prefix = self.fresh_prefix(&declared);
                    declared.push((prefix.clone(), uri.to_string()));
                    prefix
                }
            };
        }

        let mut buf = String::new();
        buf.push('<');
        buf.push_str(&qname(&tag.prefix, &tag.local_name));
        for (prefix, uri) in &declared {
            buf.push_str(if prefix.is_empty() { " xmlns" } else { " xmlns:" });
            buf.push_str(prefix);
            buf.push_str("=\"");
            write_escaped_attr(&mut buf, uri);
            buf.push('"');
        }
        for attr in &attributes {
            buf.push(' ');
            buf.push_str(&qname(&attr.prefix, &attr.local_name));
            buf.push_str("=\"");
            write_escaped_attr(&mut buf, &attr.value);
            buf.push('"');
        }
        buf.push_str(if empty { "/>" } else { ">" });
        self.out.write_all(buf.as_bytes())?;

        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings = declared;
        }
        Ok(())
    }
}

impl<W: Write> XmlSink for XmlWriter<W> {
    fn write_start_document(
        &mut self,
        version: Option<&str>,
        _encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> io::Result<()> {
        self.document = true;
        if !self.options.xml_declaration {
            return Ok(());
        }
        let mut buf = String::new();
        let _ = write!(
            buf,
            "<?xml version=\"{}\" encoding=\"UTF-8\"",
            version.unwrap_or("1.0")
        );
        if let Some(standalone) = standalone {
            buf.push_str(" standalone=\"");
            buf.push_str(if standalone { "yes" } else { "no" });
            buf.push('"');
        }
        buf.push_str("?>\n");
        self.out.write_all(buf.as_bytes())
    }

    fn write_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: Option<&str>,
    ) -> io::Result<()> {
        self.begin_markup()?;
        self.pending = Some(PendingTag {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            uri: namespace_uri.map(str::to_string),
            namespaces: Vec::new(),
            attributes: Vec::new(),
        });
        self.scopes.push(Scope {
            qname: qname(prefix, local_name),
            bindings: Vec::new(),
            has_markup: false,
            has_text: false,
        });
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, namespace_uri: &str) -> io::Result<()> {
        let Some(tag) = self.pending.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "namespace declaration outside a start tag",
            ));
        };
        if !tag.namespaces.iter().any(|(p, _)| p == prefix) {
            tag.namespaces
                .push((prefix.to_string(), namespace_uri.to_string()));
        }
        Ok(())
    }

    fn write_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: Option<&str>,
        value: &str,
    ) -> io::Result<()> {
        let Some(tag) = self.pending.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "attribute outside a start tag",
            ));
        };
        tag.attributes.push(PendingAttr {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            uri: namespace_uri.map(str::to_string),
            value: value.to_string(),
        });
        Ok(())
    }

    fn write_characters(&mut self, text: &str) -> io::Result<()> {
        if self.options.indent && text.trim().is_empty() {
            return Ok(());
        }
        self.close_start_tag(false)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.has_text = true;
        }
        let mut buf = String::with_capacity(text.len());
        write_escaped_text(&mut buf, text);
        self.out.write_all(buf.as_bytes())
    }

    fn write_cdata(&mut self, text: &str) -> io::Result<()> {
        self.close_start_tag(false)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.has_text = true;
        }
        let mut buf = String::from("<![CDATA[");
        buf.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
        buf.push_str("]]>");
        self.out.write_all(buf.as_bytes())
    }

    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.begin_markup()?;
        self.out.write_all(b"<!--")?;
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"-->")?;
        self.end_markup()
    }

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> io::Result<()> {
        self.begin_markup()?;
        let mut buf = String::from("<?");
        buf.push_str(target);
        if !data.is_empty() {
            buf.push(' ');
            buf.push_str(data);
        }
        buf.push_str("?>");
        self.out.write_all(buf.as_bytes())?;
        self.end_markup()
    }

    fn write_doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> io::Result<()> {
        self.begin_markup()?;
        let mut buf = String::from("<!DOCTYPE ");
        buf.push_str(name);
        match (public_id, system_id) {
            (Some(pub_id), Some(sys_id)) => {
                let _ = write!(buf, " PUBLIC \"{pub_id}\" \"{sys_id}\"");
            }
            (None, Some(sys_id)) => {
                let _ = write!(buf, " SYSTEM \"{sys_id}\"");
            }
            _ => {}
        }
        if let Some(subset) = internal_subset {
            buf.push_str(" [");
            buf.push_str(subset);
            buf.push(']');
        }
        buf.push('>');
        self.out.write_all(buf.as_bytes())?;
        self.end_markup()
    }

    fn write_end_element(&mut self) -> io::Result<()> {
        if self.pending.is_some() {
            self.close_start_tag(true)?;
            self.scopes.pop();
            return self.end_markup();
        }
        let Some(scope) = self.scopes.pop() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "end element without an open element",
            ));
        };
        if self.options.indent && scope.has_markup && !scope.has_text {
            self.write_indent(self.scopes.len())?;
        }
        let mut buf = String::from("</");
        buf.push_str(&scope.qname);
        buf.push('>');
        self.out.write_all(buf.as_bytes())?;
        self.end_markup()
    }

    fn write_end_document(&mut self) -> io::Result<()> {
        self.close_start_tag(false)?;
        self.document = false;
        self.out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Writes a hexadecimal character reference (`&#xHH;`) for a Unicode code point.
fn write_hex_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes text content.
///
/// - `<`, `>`, `&` are escaped with named entity references
/// - `\r` is encoded as `&#13;`
/// - other control characters below 0x20 except `\t` and `\n` are hex-encoded
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value. Whitespace other than the space character is
/// written as a character reference so that it survives normalization.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

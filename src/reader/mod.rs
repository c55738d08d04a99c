//! Pull-based streaming XML.
//!
//! This module defines the event cursor contract the tree is built from
//! ([`EventSource`], [`XmlEvent`]) and its implementations:
//!
//! - [`StreamReader`] tokenizes XML text into namespace-resolved events.
//! - [`EventQueue`] replays a recorded event sequence.
//! - [`TreeReader`] walks a (possibly partially built) tree and reports it
//!   as events, optionally passing unbuilt content straight through from
//!   the document's own cursor.
//!
//! # Examples
//!
//! ```
//! use lazydom::reader::{EventSource, StreamReader, XmlEvent};
//!
//! let mut reader = StreamReader::new("<root><child>Hello</child></root>");
//! let mut names = Vec::new();
//! while let Some(event) = reader.next_event().unwrap() {
//!     if let XmlEvent::StartElement { local_name, .. } = event {
//!         names.push(local_name);
//!     }
//! }
//! assert_eq!(names, vec!["root", "child"]);
//! ```

mod event;
mod tree;

pub use event::{collect_events, EventAttribute, EventKind, EventQueue, EventSource, XmlEvent};
pub use tree::TreeReader;

use crate::encoding::decode_to_utf8;
use crate::error::ParseError;
use crate::parser::input::{
    parse_cdata_content, parse_comment_content, parse_doctype, parse_pi_content, parse_xml_decl,
    NamespaceResolver, ParserInput,
};
use crate::parser::ParseOptions;
use crate::tree::Namespace;
use crate::util::qname::split_qname;

/// Where the tokenizer is in the document grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Nothing read yet; the next event is `StartDocument`.
    Start,
    /// Before the document element.
    Prolog,
    /// Inside the document element.
    Content,
    /// After the document element.
    Epilog,
    /// `EndDocument` has been reported.
    Finished,
}

/// A namespace-aware pull tokenizer over an owned UTF-8 buffer.
///
/// Whitespace outside the document element is not reported. A self-closing
/// tag produces a `StartElement` followed by an `EndElement`.
#[derive(Debug)]
pub struct StreamReader {
    input: ParserInput,
    ns: NamespaceResolver,
    state: ReaderState,
    /// Qualified names of the open elements, for end-tag matching.
    open: Vec<String>,
    /// A self-closing tag was just reported; its `EndElement` is next.
    pending_end: bool,
    seen_doctype: bool,
}

impl StreamReader {
    /// Creates a reader over `input` with default options.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self::with_options(input, &ParseOptions::default())
    }

    /// Creates a reader over `input` with the given limits.
    #[must_use]
    pub fn with_options(input: impl Into<String>, options: &ParseOptions) -> Self {
        let mut text: String = input.into();
        if text.starts_with('\u{FEFF}') {
            text.drain(..'\u{FEFF}'.len_utf8());
        }
        let mut input = ParserInput::new(text);
        input.set_max_depth(options.max_depth);
        input.set_max_name_length(options.max_name_length);
        input.set_max_entity_expansions(options.max_entity_expansions);
        Self {
            input,
            ns: NamespaceResolver::new(),
            state: ReaderState::Start,
            open: Vec::new(),
            pending_end: false,
            seen_doctype: false,
        }
    }

    /// Creates a reader over raw bytes, detecting and transcoding the
    /// encoding first.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be decoded.
    pub fn from_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Self, ParseError> {
        let text = decode_to_utf8(bytes).map_err(|e| ParseError::new(e.to_string()))?;
        Ok(Self::with_options(text, options))
    }

    fn read_start(&mut self) -> Result<XmlEvent, ParseError> {
        self.state = ReaderState::Prolog;
        let has_decl = self.input.looking_at(b"<?xml")
            && matches!(
                self.input.peek_at(5),
                Some(b' ' | b'\t' | b'\r' | b'\n')
            );
        if !has_decl {
            return Ok(XmlEvent::StartDocument {
                version: None,
                encoding: None,
                standalone: None,
            });
        }
        let decl = parse_xml_decl(&mut self.input)?;
        Ok(XmlEvent::StartDocument {
            version: Some(decl.version),
            encoding: decl.encoding,
            standalone: decl.standalone,
        })
    }

    /// Reads a prolog or epilog construct.
    fn read_misc(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.skip_whitespace();
        let in_prolog = self.state == ReaderState::Prolog;

        if self.input.at_end() {
            if in_prolog {
                return Err(self.input.fatal("document has no document element"));
            }
            self.state = ReaderState::Finished;
            return Ok(XmlEvent::EndDocument);
        }
        if self.input.looking_at(b"<!--") {
            return parse_comment_content(&mut self.input).map(XmlEvent::Comment);
        }
        if self.input.looking_at(b"<?") {
            let (target, data) = parse_pi_content(&mut self.input)?;
            return Ok(XmlEvent::ProcessingInstruction { target, data });
        }
        if in_prolog && !self.seen_doctype && self.input.looking_at(b"<!DOCTYPE") {
            self.seen_doctype = true;
            let decl = parse_doctype(&mut self.input)?;
            return Ok(XmlEvent::DocType {
                name: decl.name,
                public_id: decl.public_id,
                system_id: decl.system_id,
                internal_subset: decl.internal_subset,
            });
        }
        if in_prolog && self.input.peek() == Some(b'<') {
            self.state = ReaderState::Content;
            return self.read_start_tag();
        }
        if in_prolog {
            Err(self.input.fatal("expected document element"))
        } else {
            Err(self.input.fatal("content after document element"))
        }
    }

    fn read_content(&mut self) -> Result<XmlEvent, ParseError> {
        if self.input.at_end() {
            return Err(self.input.fatal("unexpected end of input in element content"));
        }
        if self.input.looking_at(b"</") {
            return self.read_end_tag();
        }
        if self.input.looking_at(b"<![CDATA[") {
            return parse_cdata_content(&mut self.input).map(XmlEvent::CData);
        }
        if self.input.looking_at(b"<!--") {
            return parse_comment_content(&mut self.input).map(XmlEvent::Comment);
        }
        if self.input.looking_at(b"<?") {
            let (target, data) = parse_pi_content(&mut self.input)?;
            return Ok(XmlEvent::ProcessingInstruction { target, data });
        }
        if self.input.peek() == Some(b'<') {
            return self.read_start_tag();
        }
        self.read_char_data()
    }

    fn read_start_tag(&mut self) -> Result<XmlEvent, ParseError> {
        let line = self.input.line();
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;

        let mut raw_attrs: Vec<(String, String)> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr_name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let value = self.input.parse_attribute_value()?;
            if raw_attrs.iter().any(|(n, _)| *n == attr_name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute '{attr_name}'")));
            }
            raw_attrs.push((attr_name, value));
        }

        self.ns.push_scope();
        let mut namespaces = Vec::new();
        for (attr_name, value) in &raw_attrs {
            let prefix = if attr_name == "xmlns" {
                ""
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                prefix
            } else {
                continue;
            };
            self.ns.bind(prefix, value);
            namespaces.push(Namespace::new(value.as_str(), prefix));
        }

        let (prefix, local_name) = split_qname(&name);
        let namespace_uri = match prefix {
            Some(p) => Some(self.resolve_prefix(p)?),
            None => self.ns.resolve("").map(str::to_string),
        };

        let mut attributes = Vec::with_capacity(raw_attrs.len());
        for (attr_name, value) in raw_attrs {
            if attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
                continue;
            }
            let (attr_prefix, attr_local) = split_qname(&attr_name);
            let namespace_uri = match attr_prefix {
                Some(p) => Some(self.resolve_prefix(p)?),
                None => None,
            };
            attributes.push(EventAttribute {
                prefix: attr_prefix.unwrap_or("").to_string(),
                local_name: attr_local.to_string(),
                namespace_uri,
                value,
            });
        }

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
            self.pending_end = true;
        } else {
            self.input.expect_byte(b'>')?;
        }
        let event = XmlEvent::StartElement {
            prefix: prefix.unwrap_or("").to_string(),
            local_name: local_name.to_string(),
            namespace_uri,
            attributes,
            namespaces,
            line,
        };
        self.open.push(name);
        Ok(event)
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String, ParseError> {
        self.ns
            .resolve(prefix)
            .map(str::to_string)
            .ok_or_else(|| self.input.fatal(format!("unbound namespace prefix '{prefix}'")))
    }

    fn read_end_tag(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str(b"</")?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;
        match self.open.last() {
            Some(expected) if *expected == name => {}
            Some(expected) => {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{expected}>, found </{name}>"
                )))
            }
            None => return Err(self.input.fatal(format!("unexpected end tag </{name}>"))),
        }
        Ok(self.close_element())
    }

    fn close_element(&mut self) -> XmlEvent {
        self.open.pop();
        self.ns.pop_scope();
        self.input.decrement_depth();
        if self.open.is_empty() {
            self.state = ReaderState::Epilog;
        }
        XmlEvent::EndElement
    }

    fn read_char_data(&mut self) -> Result<XmlEvent, ParseError> {
        let mut text = String::new();
        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => self.input.parse_reference_into(&mut text)?,
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self.input.fatal("']]>' not allowed in character data"));
                }
                _ => text.push(self.input.next_char()?),
            }
        }
        Ok(XmlEvent::Characters(text))
    }
}

impl EventSource for StreamReader {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        if self.pending_end {
            self.pending_end = false;
            return Ok(Some(self.close_element()));
        }
        let event = match self.state {
            ReaderState::Start => self.read_start()?,
            ReaderState::Prolog | ReaderState::Epilog => self.read_misc()?,
            ReaderState::Content => self.read_content()?,
            ReaderState::Finished => return Ok(None),
        };
        Ok(Some(event))
    }

    fn is_finished(&self) -> bool {
        self.state == ReaderState::Finished
    }
}

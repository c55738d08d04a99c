//! Low-level input handling for the stream tokenizer.
//!
//! [`ParserInput`] owns the UTF-8 text being tokenized and tracks position
//! (line, column, byte offset). It provides the common parsing primitives:
//! peeking, advancing, name parsing, and reference resolution.
//!
//! # Security
//!
//! `ParserInput` tracks nesting depth and entity expansion count:
//!
//! - **Depth limit**: rejects documents nested deeper than configured.
//! - **Entity expansion limit**: caps the number of references resolved.
//!   Only the five built-in entities and character references exist, so
//!   expansion can never recurse.
//! - **Name length limit**: prevents memory exhaustion from huge names.
//!
//! No external entity loading is performed.

use crate::error::{ParseError, SourceLocation};
use crate::util::qname::{is_name_char, is_name_start_char, is_xml_char, XML_NAMESPACE};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of entity expansions per document.
pub(crate) const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// Owned input state for the stream tokenizer.
#[derive(Debug)]
pub(crate) struct ParserInput {
    input: String,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    entity_expansions: u32,
    max_entity_expansions: u32,
}

impl ParserInput {
    /// Creates a new `ParserInput` with default limits.
    pub fn new(input: String) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            entity_expansions: 0,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    pub fn set_max_entity_expansions(&mut self, max: u32) {
        self.max_entity_expansions = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the text between two byte offsets previously obtained from
    /// [`pos`](Self::pos).
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.input.get(start..end).unwrap_or("")
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos..).and_then(|s| s.chars().next())
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    ///
    /// Callers only advance over ASCII they have already matched.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(&b) = self.input.as_bytes().get(self.pos) {
                if b == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    /// Advances by one UTF-8 character, updating line/column.
    fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Consumes and returns the next byte, or returns an error at EOF.
    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        let b = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance(1);
        Ok(b)
    }

    /// Consumes and returns the next character with `\r\n` normalization
    /// (XML 1.0 §2.11) and character validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        Ok(ch)
    }

    // -- Expect operations --

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let b = self.next_byte()?;
        if b != expected {
            return Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            )));
        }
        Ok(())
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos.min(self.input.len())..].starts_with(s)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        self.pos > start
    }

    /// Skips whitespace, returning an error if none is found.
    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    /// Consumes bytes while `pred` returns `true` and returns the text.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.advance(1);
        }
        self.slice(start, self.pos).to_string()
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);
        while let Some(ch) = self.peek_char() {
            if !is_name_char(ch) {
                break;
            }
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        Ok(self.slice(start, self.pos).to_string())
    }

    // -- Reference parsing (XML 1.0 §4.1) --

    /// Parses an entity or character reference (`&...;`) and appends its
    /// replacement text to `out`.
    ///
    /// Handles the five built-in XML entities and decimal/hexadecimal
    /// character references. Any other entity is an error.
    pub fn parse_reference_into(&mut self, out: &mut String) -> Result<(), ParseError> {
        self.entity_expansions += 1;
        if self.entity_expansions > self.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.max_entity_expansions
            )));
        }

        self.expect_byte(b'&')?;
        if self.peek() == Some(b'#') {
            self.advance(1);
            let value = if self.peek() == Some(b'x') {
                self.advance(1);
                let hex = self.take_while(|b| b.is_ascii_hexdigit());
                u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.fatal("invalid hex character reference"))?
            } else {
                let dec = self.take_while(|b| b.is_ascii_digit());
                dec.parse::<u32>()
                    .map_err(|_| self.fatal("invalid decimal character reference"))?
            };
            self.expect_byte(b';')?;
            let ch = char::from_u32(value)
                .filter(|&c| is_xml_char(c))
                .ok_or_else(|| {
                    self.fatal(format!(
                        "character reference &#x{value:X}; does not refer to a valid XML character"
                    ))
                })?;
            out.push(ch);
            return Ok(());
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        let replacement = match name.as_str() {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "apos" => '\'',
            "quot" => '"',
            _ => return Err(self.fatal(format!("unknown entity reference: &{name};"))),
        };
        out.push(replacement);
        Ok(())
    }

    // -- Attribute value parsing (XML 1.0 §3.3.3) --

    /// Parses a quoted attribute value with reference resolution and
    /// whitespace normalization.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    break;
                }
                Some(b'&') => self.parse_reference_into(&mut value)?,
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => match self.next_char()? {
                    '\n' | '\t' => value.push(' '),
                    ch => value.push(ch),
                },
            }
        }
        Ok(value)
    }

    /// Parses a simple quoted value (single or double quotes, no reference
    /// resolution).
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        let start = self.pos;
        while !self.at_end() && self.peek() != Some(quote) {
            self.advance(1);
        }
        let value = self.slice(start, self.pos).to_string();
        self.expect_byte(quote)?;
        Ok(value)
    }

    /// Creates a `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }
}

// -------------------------------------------------------------------------
// Namespace resolver
// -------------------------------------------------------------------------

/// Namespace scope stack mirroring element nesting.
///
/// Each frame holds the `xmlns` declarations introduced on one element.
/// Resolution walks the stack from top to bottom.
#[derive(Debug)]
pub(crate) struct NamespaceResolver {
    /// `(prefix, uri)` frames; an empty prefix is the default namespace.
    stack: Vec<Vec<(String, String)>>,
}

impl NamespaceResolver {
    /// Creates a new resolver with the `xml` prefix pre-bound.
    pub fn new() -> Self {
        Self {
            stack: vec![vec![("xml".to_string(), XML_NAMESPACE.to_string())]],
        }
    }

    pub fn push_scope(&mut self) {
        self.stack.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    /// Binds a prefix (empty for the default namespace) in the current scope.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push((prefix.to_string(), uri.to_string()));
        }
    }

    /// Resolves a prefix to its URI. `xmlns=""` undeclares the default
    /// namespace, so an empty binding resolves to `None`.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

// -------------------------------------------------------------------------
// Markup constructs
// -------------------------------------------------------------------------

/// Parses an XML comment (`<!-- ... -->`), returning the content text.
///
/// See XML 1.0 §2.5 production `[15]`.
pub(crate) fn parse_comment_content(input: &mut ParserInput) -> Result<String, ParseError> {
    input.expect_str(b"<!--")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at(b"-->") {
            input.advance(3);
            return Ok(content);
        }
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        content.push(input.next_char()?);
    }
}

/// Parses a CDATA section (`<![CDATA[ ... ]]>`), returning the content text.
///
/// See XML 1.0 §2.7 production `[18]`.
pub(crate) fn parse_cdata_content(input: &mut ParserInput) -> Result<String, ParseError> {
    input.expect_str(b"<![CDATA[")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at(b"]]>") {
            input.advance(3);
            return Ok(content);
        }
        content.push(input.next_char()?);
    }
}

/// Parses a processing instruction (`<?target data?>`), returning
/// `(target, data)`. Missing data is the empty string.
///
/// See XML 1.0 §2.6 production `[16]`.
pub(crate) fn parse_pi_content(input: &mut ParserInput) -> Result<(String, String), ParseError> {
    input.expect_str(b"<?")?;
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }
    if target.contains(':') {
        return Err(input.fatal("PI target must not contain a colon"));
    }

    let mut data = String::new();
    if input.skip_whitespace() {
        loop {
            if input.at_end() {
                return Err(input.fatal("unexpected end of input in processing instruction"));
            }
            if input.looking_at(b"?>") {
                input.advance(2);
                break;
            }
            data.push(input.next_char()?);
        }
    } else {
        input.expect_str(b"?>")?;
    }
    Ok((target, data))
}

/// Parsed XML declaration data.
#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Parses an XML declaration (`<?xml version="1.0" ...?>`).
///
/// See XML 1.0 §2.8 production `[23]`.
pub(crate) fn parse_xml_decl(input: &mut ParserInput) -> Result<XmlDeclaration, ParseError> {
    input.expect_str(b"<?xml")?;
    input.skip_whitespace_required()?;

    input.expect_str(b"version")?;
    let version = parse_pseudo_attribute_value(input)?;
    if !is_valid_version_num(&version) {
        return Err(input.fatal(format!("invalid version number: '{version}'")));
    }

    let mut had_ws = input.skip_whitespace();
    let encoding = if input.looking_at(b"encoding") {
        if !had_ws {
            return Err(input.fatal("whitespace required before encoding"));
        }
        input.expect_str(b"encoding")?;
        let enc = parse_pseudo_attribute_value(input)?;
        if !is_valid_encoding_name(&enc) {
            return Err(input.fatal(format!("invalid encoding name: '{enc}'")));
        }
        had_ws = input.skip_whitespace();
        Some(enc)
    } else {
        None
    };

    let standalone = if input.looking_at(b"standalone") {
        if !had_ws {
            return Err(input.fatal("whitespace required before standalone"));
        }
        input.expect_str(b"standalone")?;
        let value = match parse_pseudo_attribute_value(input)?.as_str() {
            "yes" => true,
            "no" => false,
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        };
        input.skip_whitespace();
        Some(value)
    } else {
        None
    };

    input.expect_str(b"?>")?;
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

fn parse_pseudo_attribute_value(input: &mut ParserInput) -> Result<String, ParseError> {
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    input.parse_quoted_value()
}

/// Parsed document type declaration.
#[derive(Debug, Clone)]
pub(crate) struct DoctypeDeclaration {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub internal_subset: Option<String>,
}

/// Parses `<!DOCTYPE name ExternalID? [subset]? >`. The internal subset is
/// kept verbatim and not interpreted.
///
/// See XML 1.0 §2.8 production `[28]`.
pub(crate) fn parse_doctype(input: &mut ParserInput) -> Result<DoctypeDeclaration, ParseError> {
    input.expect_str(b"<!DOCTYPE")?;
    input.skip_whitespace_required()?;
    let name = input.parse_name()?;
    input.skip_whitespace();

    let (mut public_id, mut system_id) = (None, None);
    if input.looking_at(b"SYSTEM") {
        input.expect_str(b"SYSTEM")?;
        input.skip_whitespace_required()?;
        system_id = Some(input.parse_quoted_value()?);
    } else if input.looking_at(b"PUBLIC") {
        input.expect_str(b"PUBLIC")?;
        input.skip_whitespace_required()?;
        public_id = Some(input.parse_quoted_value()?);
        input.skip_whitespace_required()?;
        system_id = Some(input.parse_quoted_value()?);
    }
    input.skip_whitespace();

    let mut internal_subset = None;
    if input.peek() == Some(b'[') {
        input.advance(1);
        let start = input.pos();
        let mut quote: Option<u8> = None;
        loop {
            let b = input
                .peek()
                .ok_or_else(|| input.fatal("unexpected end of input in DOCTYPE"))?;
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b']' => break,
                None => {}
            }
            input.next_char()?;
        }
        internal_subset = Some(input.slice(start, input.pos()).to_string());
        input.advance(1);
        input.skip_whitespace();
    }

    input.expect_byte(b'>')?;
    Ok(DoctypeDeclaration {
        name,
        public_id,
        system_id,
        internal_subset,
    })
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_valid_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_valid_encoding_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(s: &str) -> ParserInput {
        ParserInput::new(s.to_string())
    }

    #[test]
    fn test_peek_and_advance() {
        let mut input = input("abc");
        assert_eq!(input.peek(), Some(b'a'));
        assert_eq!(input.peek_at(1), Some(b'b'));
        input.advance(1);
        assert_eq!(input.peek(), Some(b'b'));
        input.advance(2);
        assert!(input.at_end());
    }

    #[test]
    fn test_line_column_tracking() {
        let mut input = input("ab\ncd");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        input.advance(1);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
    }

    #[test]
    fn test_next_char_cr_normalization() {
        let mut input = input("a\r\nb\rc");
        assert_eq!(input.next_char().unwrap(), 'a');
        assert_eq!(input.next_char().unwrap(), '\n');
        assert_eq!(input.next_char().unwrap(), 'b');
        assert_eq!(input.next_char().unwrap(), '\n');
        assert_eq!(input.next_char().unwrap(), 'c');
    }

    #[test]
    fn test_parse_name_length_limit() {
        let mut input = input(&"a".repeat(100));
        input.set_max_name_length(50);
        let err = input.parse_name().unwrap_err();
        assert!(err.message.contains("name length"));
    }

    #[test]
    fn test_parse_reference_builtin_and_char() {
        let mut out = String::new();
        let mut input = input("&amp;&lt;&gt;&apos;&quot;&#65;&#x42;");
        for _ in 0..7 {
            input.parse_reference_into(&mut out).unwrap();
        }
        assert_eq!(out, "&<>'\"AB");
    }

    #[test]
    fn test_parse_reference_unknown_error() {
        let mut out = String::new();
        assert!(input("&bogus;").parse_reference_into(&mut out).is_err());
    }

    #[test]
    fn test_entity_expansion_limit() {
        let mut out = String::new();
        let mut input = input("&amp;&amp;&amp;");
        input.set_max_entity_expansions(2);
        assert!(input.parse_reference_into(&mut out).is_ok());
        assert!(input.parse_reference_into(&mut out).is_ok());
        assert!(input.parse_reference_into(&mut out).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut input = input("");
        input.set_max_depth(2);
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_err());
    }

    #[test]
    fn test_parse_attribute_value_normalization() {
        assert_eq!(
            input("\"hello &amp; world\"").parse_attribute_value().unwrap(),
            "hello & world"
        );
        assert_eq!(input("'a\tb\nc'").parse_attribute_value().unwrap(), "a b c");
    }

    #[test]
    fn test_namespace_resolver_scopes() {
        let mut ns = NamespaceResolver::new();
        assert_eq!(ns.resolve("xml"), Some(XML_NAMESPACE));
        assert_eq!(ns.resolve(""), None);

        ns.push_scope();
        ns.bind("", "http://default");
        ns.bind("foo", "http://foo");
        assert_eq!(ns.resolve(""), Some("http://default"));
        assert_eq!(ns.resolve("foo"), Some("http://foo"));

        ns.push_scope();
        ns.bind("", "");
        assert_eq!(ns.resolve(""), None);
        ns.pop_scope();

        ns.pop_scope();
        assert_eq!(ns.resolve("foo"), None);
    }

    #[test]
    fn test_parse_comment_rejects_double_dash() {
        assert_eq!(parse_comment_content(&mut input("<!-- hi -->")).unwrap(), " hi ");
        assert!(parse_comment_content(&mut input("<!-- a -- b -->")).is_err());
    }

    #[test]
    fn test_parse_cdata_content() {
        let content = parse_cdata_content(&mut input("<![CDATA[some <data>]]>")).unwrap();
        assert_eq!(content, "some <data>");
    }

    #[test]
    fn test_parse_pi_content() {
        let (target, data) = parse_pi_content(&mut input("<?target data?>")).unwrap();
        assert_eq!((target.as_str(), data.as_str()), ("target", "data"));
        let (target, data) = parse_pi_content(&mut input("<?target?>")).unwrap();
        assert_eq!((target.as_str(), data.as_str()), ("target", ""));
    }

    #[test]
    fn test_parse_xml_decl() {
        let decl = parse_xml_decl(&mut input(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        ))
        .unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(decl.standalone, Some(true));

        let decl = parse_xml_decl(&mut input("<?xml version='1.1' standalone='no'?>")).unwrap();
        assert_eq!(decl.encoding, None);
        assert_eq!(decl.standalone, Some(false));
    }

    #[test]
    fn test_parse_doctype_with_subset() {
        let decl = parse_doctype(&mut input(
            "<!DOCTYPE note PUBLIC \"-//X//EN\" \"note.dtd\" [<!ENTITY a \"]\">]>",
        ))
        .unwrap();
        assert_eq!(decl.name, "note");
        assert_eq!(decl.public_id.as_deref(), Some("-//X//EN"));
        assert_eq!(decl.system_id.as_deref(), Some("note.dtd"));
        assert_eq!(decl.internal_subset.as_deref(), Some("<!ENTITY a \"]\">"));
    }
}

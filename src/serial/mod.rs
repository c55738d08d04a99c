//! Serialization of a tree to a streaming sink.
//!
//! A subtree is walked with a [`TreeReader`](crate::reader::TreeReader) and
//! every event is forwarded to an [`XmlSink`]. [`XmlWriter`] is the sink
//! that renders text.
//!
//! # Examples
//!
//! ```
//! use lazydom::Document;
//!
//! let mut doc = Document::parse_deferred("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root();
//! let xml = doc.to_xml_string(root).unwrap();
//! assert_eq!(
//!     xml,
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root><child>Hello</child></root>\n"
//! );
//! assert!(doc.is_complete(root));
//! ```

mod xml;

pub use xml::{SerializeOptions, XmlWriter};

use std::io;

use crate::error::DomError;
use crate::reader::{TreeReader, XmlEvent};
use crate::tree::{Document, NodeId};

/// Receives a document as a sequence of write calls, in document order.
///
/// Namespace declarations and attributes of an element are written right
/// after its start element.
pub trait XmlSink {
    fn write_start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> io::Result<()>;

    /// Opens an element. `prefix` is empty for an unprefixed name.
    fn write_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: Option<&str>,
    ) -> io::Result<()>;

    /// Declares a namespace on the element just opened. An empty prefix
    /// declares the default namespace.
    fn write_namespace(&mut self, prefix: &str, namespace_uri: &str) -> io::Result<()>;

    fn write_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: Option<&str>,
        value: &str,
    ) -> io::Result<()>;

    fn write_characters(&mut self, text: &str) -> io::Result<()>;

    fn write_cdata(&mut self, text: &str) -> io::Result<()>;

    fn write_comment(&mut self, text: &str) -> io::Result<()>;

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> io::Result<()>;

    fn write_doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> io::Result<()>;

    /// Closes the innermost open element.
    fn write_end_element(&mut self) -> io::Result<()>;

    fn write_end_document(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// How [`Document::serialize`] treats content that is not built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializeMode {
    /// Materialize unbuilt content while writing; the tree is intact and
    /// complete afterwards.
    #[default]
    Preserve,
    /// Pass unbuilt content from the cursor straight to the sink without
    /// building it.
    Consume,
}

/// Forwards one event to a sink.
///
/// # Errors
///
/// Propagates sink failures.
pub fn write_event(sink: &mut dyn XmlSink, event: &XmlEvent) -> io::Result<()> {
    match event {
        XmlEvent::StartDocument {
            version,
            encoding,
            standalone,
        } => sink.write_start_document(version.as_deref(), encoding.as_deref(), *standalone),
        XmlEvent::StartElement {
            prefix,
            local_name,
            namespace_uri,
            attributes,
            namespaces,
            ..
        } => {
            sink.write_start_element(prefix, local_name, namespace_uri.as_deref())?;
            for ns in namespaces {
                sink.write_namespace(ns.prefix(), ns.uri())?;
            }
            for attr in attributes {
                sink.write_attribute(
                    &attr.prefix,
                    &attr.local_name,
                    attr.namespace_uri.as_deref(),
                    &attr.value,
                )?;
            }
            Ok(())
        }
        XmlEvent::EndElement => sink.write_end_element(),
        XmlEvent::Characters(text) => sink.write_characters(text),
        XmlEvent::CData(text) => sink.write_cdata(text),
        XmlEvent::Comment(text) => sink.write_comment(text),
        XmlEvent::ProcessingInstruction { target, data } => {
            sink.write_processing_instruction(target, data)
        }
        XmlEvent::DocType {
            name,
            public_id,
            system_id,
            internal_subset,
        } => sink.write_doctype(
            name,
            public_id.as_deref(),
            system_id.as_deref(),
            internal_subset.as_deref(),
        ),
        XmlEvent::EndDocument => sink.write_end_document(),
    }
}

impl Document {
    /// Writes `node` and its descendants to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `DomError::Io` for sink failures and propagates cursor
    /// failures.
    pub fn serialize(
        &mut self,
        node: NodeId,
        sink: &mut dyn XmlSink,
        mode: SerializeMode,
    ) -> Result<(), DomError> {
        self.check_owned(node)?;
        let mut reader = TreeReader::new_unchecked(self, node, mode == SerializeMode::Preserve);
        while let Some(event) = reader.read_next()? {
            write_event(sink, &event)?;
        }
        sink.flush()?;
        Ok(())
    }

    /// Serializes `node` to a string, building unbuilt content.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn to_xml_string(&mut self, node: NodeId) -> Result<String, DomError> {
        self.to_xml_string_with_options(node, SerializeMode::Preserve, &SerializeOptions::default())
    }

    /// Serializes `node` to a string, consuming unbuilt content.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn to_xml_string_consume(&mut self, node: NodeId) -> Result<String, DomError> {
        self.to_xml_string_with_options(node, SerializeMode::Consume, &SerializeOptions::default())
    }

    /// Serializes `node` to a string with explicit mode and text options.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn to_xml_string_with_options(
        &mut self,
        node: NodeId,
        mode: SerializeMode,
        options: &SerializeOptions,
    ) -> Result<String, DomError> {
        let mut writer = XmlWriter::with_options(Vec::new(), options.clone());
        self.serialize(node, &mut writer, mode)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| DomError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

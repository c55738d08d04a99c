//! Streaming events and the cursor contract the tree is built from.

use std::collections::VecDeque;

use crate::error::ParseError;
use crate::tree::Namespace;

/// An attribute carried by a [`XmlEvent::StartElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttribute {
    /// Prefix, empty for none.
    pub prefix: String,
    /// Local name.
    pub local_name: String,
    /// Resolved namespace URI, if the attribute is prefixed.
    pub namespace_uri: Option<String>,
    /// Normalized value.
    pub value: String,
}

impl EventAttribute {
    /// Creates an attribute with no namespace.
    #[must_use]
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            local_name: local_name.into(),
            namespace_uri: None,
            value: value.into(),
        }
    }
}

/// One event of a forward-only XML stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of the document, with the XML declaration's values if present.
    StartDocument {
        version: Option<String>,
        encoding: Option<String>,
        standalone: Option<bool>,
    },
    /// An element start tag. `namespaces` are the declarations made on this
    /// tag, separated from the ordinary attributes.
    StartElement {
        prefix: String,
        local_name: String,
        namespace_uri: Option<String>,
        attributes: Vec<EventAttribute>,
        namespaces: Vec<Namespace>,
        /// 1-based source line of the start tag, 0 when unknown.
        line: u32,
    },
    /// The end of the innermost open element.
    EndElement,
    /// Character data.
    Characters(String),
    /// A CDATA section.
    CData(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction { target: String, data: String },
    /// A document type declaration; the internal subset is kept verbatim.
    DocType {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
        internal_subset: Option<String>,
    },
    /// End of the document.
    EndDocument,
}

impl XmlEvent {
    /// Convenience constructor for a start tag with no namespace.
    #[must_use]
    pub fn start(local_name: impl Into<String>) -> Self {
        Self::StartElement {
            prefix: String::new(),
            local_name: local_name.into(),
            namespace_uri: None,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            line: 0,
        }
    }

    /// Returns the kind code of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StartDocument { .. } => EventKind::StartDocument,
            Self::StartElement { .. } => EventKind::StartElement,
            Self::EndElement => EventKind::EndElement,
            Self::Characters(_) => EventKind::Characters,
            Self::CData(_) => EventKind::CData,
            Self::Comment(_) => EventKind::Comment,
            Self::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            Self::DocType { .. } => EventKind::Dtd,
            Self::EndDocument => EventKind::EndDocument,
        }
    }
}

/// Stream event type codes, numbered like the standard pull-parser
/// constants. Also reported as the object-model type of tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventKind {
    StartElement = 1,
    EndElement = 2,
    ProcessingInstruction = 3,
    Characters = 4,
    Comment = 5,
    Space = 6,
    StartDocument = 7,
    EndDocument = 8,
    EntityReference = 9,
    Attribute = 10,
    Dtd = 11,
    CData = 12,
}

/// A forward-only cursor over XML events.
///
/// The deferred builder consults its source exclusively through this trait.
pub trait EventSource {
    /// Advances one event. Returns `None` once the stream is finished.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the underlying input is malformed.
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ParseError>;

    /// Discards the remainder of the innermost open element, up to and
    /// including its end tag.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the underlying input is malformed.
    fn skip_element(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(event) = self.next_event()? {
            match event {
                XmlEvent::StartElement { .. } => depth += 1,
                XmlEvent::EndElement if depth == 0 => return Ok(()),
                XmlEvent::EndElement => depth -= 1,
                XmlEvent::EndDocument => break,
                _ => {}
            }
        }
        Err(ParseError::new("stream ended inside an element being skipped"))
    }

    /// Returns `true` once the stream has reported its end.
    fn is_finished(&self) -> bool;
}

/// Replays a pre-recorded event sequence.
///
/// # Examples
///
/// ```
/// use lazydom::reader::{EventQueue, EventSource, XmlEvent};
///
/// let mut queue = EventQueue::new(vec![
///     XmlEvent::start("a"),
///     XmlEvent::Characters("hi".into()),
///     XmlEvent::EndElement,
/// ]);
/// assert_eq!(queue.next_event().unwrap(), Some(XmlEvent::start("a")));
/// assert!(!queue.is_finished());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<XmlEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = XmlEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Returns the number of events not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for EventQueue {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        Ok(self.events.pop_front())
    }

    fn is_finished(&self) -> bool {
        self.events.is_empty()
    }
}

/// Drains a source into a vector, stopping after `EndDocument`.
///
/// # Errors
///
/// Propagates the first `ParseError` reported by the source.
pub fn collect_events(source: &mut dyn EventSource) -> Result<Vec<XmlEvent>, ParseError> {
    let mut events = Vec::new();
    while let Some(event) = source.next_event()? {
        let end = event == XmlEvent::EndDocument;
        events.push(event);
        if end {
            break;
        }
    }
    Ok(events)
}

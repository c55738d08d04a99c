//! Error types for stream parsing and tree manipulation.
//!
//! Two families of failure exist in this crate:
//!
//! - [`ParseError`] is raised by a streaming source when the underlying XML
//!   is not well-formed. It carries line, column, and byte offset.
//! - [`DomError`] is raised by tree operations. Its variants follow the DOM
//!   exception taxonomy (read-only violation, wrong document, hierarchy
//!   violation, ...) plus the object-model failures of the deferred builder.
//!
//! All errors are raised synchronously at the point of violation. Nothing in
//! the tree retries or recovers internally.

use std::fmt;

use thiserror::Error;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when the streaming source meets malformed XML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates a parse error with no meaningful location (e.g. a failure
    /// detected before any input was consumed).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::default(),
        }
    }
}

/// Failures of tree construction, navigation, mutation, and serialization.
///
/// Each DOM-level variant maps to one of the standard DOM exception codes,
/// available through [`DomError::code`].
#[derive(Debug, Error)]
pub enum DomError {
    /// A mutating call was made on a node flagged read-only.
    #[error("no modification allowed: the node is read-only")]
    NoModificationAllowed,

    /// The node being attached belongs to a different document.
    #[error("wrong document: the node belongs to a different document")]
    WrongDocument,

    /// The operation would produce an illegal tree shape.
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// The attribute is already owned by another element.
    #[error("attribute in use: the attribute is owned by another element")]
    InUseAttribute,

    /// The referenced node is not where the operation expects it.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// A name contains characters that are not allowed.
    #[error("invalid character in name '{0}'")]
    InvalidCharacter(String),

    /// A qualified name and namespace URI are inconsistent.
    #[error("namespace error: {0}")]
    Namespace(String),

    /// An offset or count is outside the character data.
    #[error("index size error: offset {offset} is outside data of length {length}")]
    IndexSize {
        /// The offending offset.
        offset: usize,
        /// The length of the character data.
        length: usize,
    },

    /// The operation is not supported by this implementation or this node kind.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// A stream-object failure, e.g. the cursor ended before a required node
    /// could be materialized.
    #[error("object model error: {0}")]
    Om(String),

    /// The streaming source reported malformed XML.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The serialization sink failed to write.
    #[error("serialization failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DomError {
    /// Returns the DOM exception code for this error, if it has one.
    ///
    /// Object-model, parse, and I/O failures have no DOM code.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::IndexSize { .. } => Some(1),
            Self::HierarchyRequest(_) => Some(3),
            Self::WrongDocument => Some(4),
            Self::InvalidCharacter(_) => Some(5),
            Self::NoModificationAllowed => Some(7),
            Self::NotFound(_) => Some(8),
            Self::NotSupported(_) => Some(9),
            Self::InUseAttribute => Some(10),
            Self::Namespace(_) => Some(14),
            Self::Om(_) | Self::Parse(_) | Self::Io(_) => None,
        }
    }
}

//! # lazydom
//!
//! An XML DOM tree layered over a streaming event cursor. A document can be
//! parsed eagerly, or created over a cursor and materialized node by node as
//! the tree is navigated. The same arena-backed nodes serve the standard DOM
//! editing surface (insert, remove, replace, clone, import, normalize,
//! namespace-aware attributes) and a streaming object-model surface (build,
//! discard, pull-reading, serialization that consumes unbuilt content).
//!
//! ## Quick Start
//!
//! ```
//! use lazydom::Document;
//!
//! let mut doc = Document::parse_deferred("<root><child>Hello</child><rest/></root>").unwrap();
//! let root = doc.document_element().unwrap().unwrap();
//! let child = doc.first_child(root).unwrap().unwrap();
//! assert_eq!(doc.node_name(child), "child");
//! // `rest` has not been read yet.
//! assert!(!doc.is_complete(root));
//!
//! doc.set_attribute(child, "lang", "en").unwrap();
//! assert_eq!(doc.get_attribute(child, "lang"), Some("en"));
//! ```

pub mod encoding;
pub mod error;
pub mod parser;
pub mod reader;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use error::{DomError, ParseError};
pub use parser::ParseOptions;
pub use serial::{SerializeMode, SerializeOptions};
pub use tree::{Document, DomImplementation, Namespace, NodeId, NodeType};
pub use util::qname::QName;

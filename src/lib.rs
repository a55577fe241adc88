//! arenaxml - zero-copy XML parsing into an index-linked arena document
//!
//! A streaming XML 1.0 subset parser and writer:
//! - hand-rolled UTF-8 lexer with byte-exact error spans
//! - recursive-descent grammar with lexically scoped namespaces
//! - arena document: flat arrays of nodes, attributes and namespaces
//!   linked by `u32` indices, no per-node allocation
//! - entity decoding that only copies when an ampersand is present
//! - serializer with compact and pretty modes through a byte sink
//!
//! The input buffer must outlive the [`Document`]: parsed names, values
//! and text alias it wherever no decoding was needed. The first
//! structural error aborts parsing; the diagnostic (a source snippet
//! with a caret underline) is emitted through the `log` facade and
//! carried on the returned [`Error`].
//!
//! ```
//! let doc = arenaxml::parse(br#"<greeting kind="big">hello</greeting>"#).unwrap();
//! let root = doc.root().unwrap();
//! let elem = doc.node(root).as_element().unwrap();
//! assert_eq!(doc.text(elem.name), "greeting");
//!
//! let mut out = Vec::new();
//! assert!(arenaxml::write(&doc, &mut out, false));
//! ```
//!
//! Not supported by design: DTDs, CDATA sections, external entities,
//! encodings other than UTF-8/ASCII.

pub mod core;
pub mod dom;
pub mod error;
pub mod parser;
pub mod writer;

pub use crate::core::span::Span;
pub use crate::dom::{
    AttrId, Attribute, Attrs, Children, Document, ElementData, Namespace, Node, NodeData, NodeId,
    NsId, TextData, Visitor,
};
pub use crate::error::{Error, ErrorKind};
pub use crate::parser::parse;
pub use crate::writer::{write, Output};

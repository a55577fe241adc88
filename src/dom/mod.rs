//! DOM module - arena-based XML document
//!
//! The owned representation of parsed output:
//! - flat arenas of nodes, attributes and namespaces
//! - `u32` indices for all parent/child/sibling/attribute links
//! - stack-based namespace resolution during parsing
//! - iterators and a depth-first visitor for traversal

pub mod document;
pub mod namespace;
pub mod node;

pub use document::{Attrs, Children, Document, Visitor};
pub use node::{AttrId, Attribute, ElementData, Namespace, Node, NodeData, NodeId, NsId, TextData};

//! Document node representation
//!
//! Plain-old-data structs linked by `u32` indices into the document's
//! arenas. "No index" is `None`; every present index points at an entry
//! created before the link was written, so cycles cannot be formed.

use crate::core::span::Span;

/// Index into the document's namespace array.
pub type NsId = u32;
/// Index into the document's node array.
pub type NodeId = u32;
/// Index into the document's attribute array.
pub type AttrId = u32;

/// A namespace: optional prefix plus URI.
///
/// The prefix is `None` for the default namespace. Namespaces are
/// deduplicated by URI when added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<Span>,
    pub uri: Span,
}

/// An attribute, linked into its element's singly linked list in source
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: Span,
    pub value: Span,
    pub namespace: Option<NsId>,
    pub next_attribute: Option<AttrId>,
}

/// Payload of an element node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementData {
    pub name: Span,
    pub namespace: Option<NsId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub first_attribute: Option<AttrId>,
    pub last_attribute: Option<AttrId>,
}

/// Payload of a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextData {
    pub contents: Span,
}

/// Node payload: element or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(TextData),
}

/// A node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub data: NodeData,
    /// Next node with the same parent.
    pub next_sibling: Option<NodeId>,
}

impl Node {
    /// Create an unlinked element node.
    pub fn element(namespace: Option<NsId>, name: Span) -> Self {
        Node {
            data: NodeData::Element(ElementData {
                name,
                namespace,
                first_child: None,
                last_child: None,
                first_attribute: None,
                last_attribute: None,
            }),
            next_sibling: None,
        }
    }

    /// Create an unlinked text node.
    pub fn text(contents: Span) -> Self {
        Node {
            data: NodeData::Text(TextData { contents }),
            next_sibling: None,
        }
    }

    /// Check if this is an element node.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Element payload, if this is an element.
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    /// Mutable element payload, if this is an element.
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    /// Text payload, if this is a text node.
    #[inline]
    pub fn as_text(&self) -> Option<&TextData> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::span::RawSpan;

    #[test]
    fn test_element_node() {
        let node = Node::element(Some(0), Span::input(RawSpan::new(1, 4)));
        assert!(node.is_element());
        assert!(!node.is_text());
        let el = node.as_element().unwrap();
        assert_eq!(el.namespace, Some(0));
        assert!(el.first_child.is_none());
        assert!(el.first_attribute.is_none());
    }

    #[test]
    fn test_text_node() {
        let node = Node::text(Span::input(RawSpan::new(0, 2)));
        assert!(node.is_text());
        assert!(node.as_element().is_none());
        assert_eq!(node.as_text().unwrap().contents.len(), 2);
    }
}

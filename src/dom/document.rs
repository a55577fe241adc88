//! Arena-based XML document
//!
//! The owned, indexed representation of parsed output:
//! - growable arrays of namespaces, nodes and attributes
//! - parent/child/sibling/attribute relationships as `u32` indices
//! - a pool of owned byte buffers backing entity-decoded and copied text
//!
//! Indices assigned at creation never change. The input buffer handed to
//! the parser must outlive the document; most spans alias it.
//!
//! Builder misuse (invalid indices, text without an element parent, a
//! second parentless node) is a programmer contract violation and
//! panics rather than returning an error.

use crate::core::span::Span;
use crate::dom::node::{AttrId, Attribute, ElementData, Namespace, Node, NodeData, NodeId, NsId, TextData};

/// An XML document stored in arena format.
#[derive(Debug)]
pub struct Document<'input> {
    input: &'input [u8],
    namespaces: Vec<Namespace>,
    nodes: Vec<Node>,
    attributes: Vec<Attribute>,
    /// Backing storage for decoded and copied strings, freed with the
    /// document.
    buffers: Vec<Box<[u8]>>,
}

impl Document<'static> {
    /// Create an empty document for programmatic construction.
    pub fn new() -> Self {
        Document::with_input(b"")
    }
}

impl Default for Document<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'input> Document<'input> {
    pub(crate) fn with_input(input: &'input [u8]) -> Self {
        Document {
            input,
            namespaces: Vec::new(),
            nodes: Vec::with_capacity(16),
            attributes: Vec::new(),
            buffers: Vec::new(),
        }
    }

    /// The root element, present once any node exists.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of attributes in the arena.
    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Number of registered namespaces.
    #[inline]
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Get an attribute by index.
    #[inline]
    pub fn attribute(&self, id: AttrId) -> &Attribute {
        &self.attributes[id as usize]
    }

    /// Get a namespace by index.
    #[inline]
    pub fn namespace(&self, id: NsId) -> &Namespace {
        &self.namespaces[id as usize]
    }

    /// Resolve a span to its bytes, whichever buffer backs it.
    #[inline]
    pub fn bytes(&self, span: Span) -> &[u8] {
        match span {
            Span::Input { begin, end } => &self.input[begin as usize..end as usize],
            Span::Owned { buf, begin, end } => {
                &self.buffers[buf as usize][begin as usize..end as usize]
            }
        }
    }

    /// Resolve a span to text.
    #[inline]
    pub fn text(&self, span: Span) -> &str {
        std::str::from_utf8(self.bytes(span)).expect("document text is not valid UTF-8")
    }

    /// Take ownership of a decoded buffer; the returned span covers it.
    pub(crate) fn attach_buffer(&mut self, bytes: Vec<u8>) -> Span {
        let buf = self.buffers.len() as u32;
        let end = bytes.len() as u32;
        self.buffers.push(bytes.into_boxed_slice());
        Span::Owned { buf, begin: 0, end }
    }

    /// Copy a builder string into document-owned storage.
    fn intern(&mut self, text: &str) -> Span {
        self.attach_buffer(text.as_bytes().to_vec())
    }

    fn element_mut(&mut self, id: NodeId) -> &mut ElementData {
        self.nodes[id as usize]
            .as_element_mut()
            .expect("node is not an element")
    }

    /// Register a namespace, deduplicated by URI.
    ///
    /// Adding a URI that already exists returns the existing index; a
    /// missing prefix on the existing entry is backfilled.
    pub fn add_namespace(&mut self, prefix: Option<&str>, uri: &str) -> NsId {
        assert!(!uri.is_empty(), "namespace URI cannot be empty");
        for i in 0..self.namespaces.len() {
            if self.bytes(self.namespaces[i].uri) == uri.as_bytes() {
                if self.namespaces[i].prefix.is_none() {
                    if let Some(p) = prefix {
                        let span = self.intern(p);
                        self.namespaces[i].prefix = Some(span);
                    }
                }
                return i as NsId;
            }
        }
        let prefix = prefix.map(|p| self.intern(p));
        let uri = self.intern(uri);
        self.push_namespace(prefix, uri)
    }

    pub(crate) fn add_namespace_span(&mut self, prefix: Option<Span>, uri: Span) -> NsId {
        assert!(!self.bytes(uri).is_empty(), "namespace URI cannot be empty");
        for i in 0..self.namespaces.len() {
            if self.bytes(self.namespaces[i].uri) == self.bytes(uri) {
                if self.namespaces[i].prefix.is_none() {
                    self.namespaces[i].prefix = prefix;
                }
                return i as NsId;
            }
        }
        self.push_namespace(prefix, uri)
    }

    fn push_namespace(&mut self, prefix: Option<Span>, uri: Span) -> NsId {
        let ix = self.namespaces.len() as NsId;
        self.namespaces.push(Namespace { prefix, uri });
        ix
    }

    /// Append an element; with a parent, it becomes the parent's last
    /// child. The first node added with no parent is the root, and must
    /// stay the only parentless node.
    pub fn add_element(
        &mut self,
        namespace: Option<NsId>,
        name: &str,
        parent: Option<NodeId>,
    ) -> NodeId {
        let name = self.intern(name);
        self.add_element_span(namespace, name, parent)
    }

    pub(crate) fn add_element_span(
        &mut self,
        namespace: Option<NsId>,
        name: Span,
        parent: Option<NodeId>,
    ) -> NodeId {
        assert!(
            parent.is_some() || self.nodes.is_empty(),
            "root element must be the first node added to the document"
        );
        if let Some(ns) = namespace {
            assert!((ns as usize) < self.namespaces.len(), "invalid namespace index");
        }
        let ix = self.nodes.len() as NodeId;
        self.nodes.push(Node::element(namespace, name));
        if let Some(parent) = parent {
            self.link_child(parent, ix);
        }
        ix
    }

    /// Append a text node under an existing element.
    pub fn add_text(&mut self, contents: &str, parent: NodeId) -> NodeId {
        let contents = self.intern(contents);
        self.add_text_span(contents, parent)
    }

    pub(crate) fn add_text_span(&mut self, contents: Span, parent: NodeId) -> NodeId {
        assert!(!self.nodes.is_empty(), "text node cannot be the root");
        let ix = self.nodes.len() as NodeId;
        self.nodes.push(Node::text(contents));
        self.link_child(parent, ix);
        ix
    }

    /// Append an attribute at the tail of an element's attribute list,
    /// preserving source order.
    pub fn add_attribute(
        &mut self,
        namespace: Option<NsId>,
        name: &str,
        value: &str,
        element: NodeId,
    ) -> AttrId {
        let name = self.intern(name);
        let value = self.intern(value);
        self.add_attribute_span(namespace, name, value, element)
    }

    pub(crate) fn add_attribute_span(
        &mut self,
        namespace: Option<NsId>,
        name: Span,
        value: Span,
        element: NodeId,
    ) -> AttrId {
        if let Some(ns) = namespace {
            assert!((ns as usize) < self.namespaces.len(), "invalid namespace index");
        }
        let ix = self.attributes.len() as AttrId;
        self.attributes.push(Attribute {
            name,
            value,
            namespace,
            next_attribute: None,
        });
        match self.element_mut(element).last_attribute {
            None => {
                let el = self.element_mut(element);
                el.first_attribute = Some(ix);
                el.last_attribute = Some(ix);
            }
            Some(last) => {
                self.attributes[last as usize].next_attribute = Some(ix);
                self.element_mut(element).last_attribute = Some(ix);
            }
        }
        ix
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        assert!((parent as usize) < child as usize, "invalid parent index");
        match self.element_mut(parent).last_child {
            None => {
                let el = self.element_mut(parent);
                el.first_child = Some(child);
                el.last_child = Some(child);
            }
            Some(last) => {
                self.nodes[last as usize].next_sibling = Some(child);
                self.element_mut(parent).last_child = Some(child);
            }
        }
    }

    /// Iterate over the children of an element, in document order.
    pub fn children(&self, id: NodeId) -> Children<'_, 'input> {
        Children {
            doc: self,
            next: self.node(id).as_element().and_then(|el| el.first_child),
        }
    }

    /// Iterate over the attributes of an element, in source order.
    pub fn attributes(&self, element: NodeId) -> Attrs<'_, 'input> {
        Attrs {
            doc: self,
            next: self
                .node(element)
                .as_element()
                .and_then(|el| el.first_attribute),
        }
    }

    /// Depth-first walk of the tree through a [`Visitor`].
    ///
    /// Any callback returning `false` aborts the walk; `visit` then
    /// returns `false` as well.
    pub fn visit<V: Visitor>(&self, visitor: &mut V) -> bool {
        match self.root() {
            Some(root) => self.visit_node(root, visitor),
            None => true,
        }
    }

    fn visit_node<V: Visitor>(&self, id: NodeId, visitor: &mut V) -> bool {
        match &self.node(id).data {
            NodeData::Element(el) => {
                if !visitor.enter_element(self, id, el) {
                    return false;
                }
                let mut att = el.first_attribute;
                while let Some(ix) = att {
                    let attribute = self.attribute(ix);
                    if !visitor.attribute(self, ix, attribute) {
                        return false;
                    }
                    att = attribute.next_attribute;
                }
                let mut child = el.first_child;
                while let Some(ix) = child {
                    if !self.visit_node(ix, visitor) {
                        return false;
                    }
                    child = self.node(ix).next_sibling;
                }
                visitor.leave_element(self, id, el)
            }
            NodeData::Text(t) => visitor.text(self, id, t),
        }
    }
}

/// Depth-first document walker; every callback may abort the walk by
/// returning `false`.
pub trait Visitor {
    fn enter_element(&mut self, _doc: &Document<'_>, _id: NodeId, _element: &ElementData) -> bool {
        true
    }

    fn leave_element(&mut self, _doc: &Document<'_>, _id: NodeId, _element: &ElementData) -> bool {
        true
    }

    fn attribute(&mut self, _doc: &Document<'_>, _id: AttrId, _attribute: &Attribute) -> bool {
        true
    }

    fn text(&mut self, _doc: &Document<'_>, _id: NodeId, _text: &TextData) -> bool {
        true
    }
}

/// Iterator over child nodes.
pub struct Children<'a, 'input> {
    doc: &'a Document<'input>,
    next: Option<NodeId>,
}

impl<'a, 'input> Iterator for Children<'a, 'input> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over element attributes.
pub struct Attrs<'a, 'input> {
    doc: &'a Document<'input>,
    next: Option<AttrId>,
}

impl<'a, 'input> Iterator for Attrs<'a, 'input> {
    type Item = AttrId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.attribute(current).next_attribute;
        Some(current)
    }
}

//! XML serialization
//!
//! Depth-first pre-order emission of a [`Document`] through a
//! caller-supplied output sink. Namespace declarations are written on
//! the root element only; text and attribute values are escaped in a
//! single pass that batches runs of unescaped bytes into one sink call.
//!
//! A sink returning `false` aborts the whole write immediately; nothing
//! is buffered.

use crate::dom::node::{ElementData, NodeData, NodeId};
use crate::dom::Document;

/// Byte sink the serializer writes through.
///
/// Returning `false` applies backpressure: the serializer stops at once
/// and propagates `false` to the caller.
pub trait Output {
    fn write(&mut self, bytes: &[u8]) -> bool;
}

impl Output for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> bool {
        self.extend_from_slice(bytes);
        true
    }
}

// Newline plus the maximum supported indentation; deeper nesting is
// still tracked but indents no further.
const INDENT: &[u8] = b"\n                                        ";

/// Serialize `doc`: XML declaration, the tree, a trailing newline.
///
/// `pretty` inserts a newline and two spaces per depth before each
/// element start and end tag. Returns `false` as soon as the sink does.
pub fn write<O: Output>(doc: &Document<'_>, out: &mut O, pretty: bool) -> bool {
    if !out.write(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>") {
        return false;
    }
    if let Some(root) = doc.root() {
        if !write_node(doc, out, root, 0, pretty) {
            return false;
        }
    }
    out.write(b"\n")
}

/// Escape the five special characters, batching unescaped runs.
fn write_escaped<O: Output>(out: &mut O, bytes: &[u8]) -> bool {
    let mut done = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"&quot;",
            b'&' => b"&amp;",
            b'\'' => b"&apos;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            _ => continue,
        };
        if done < i && !out.write(&bytes[done..i]) {
            return false;
        }
        if !out.write(escape) {
            return false;
        }
        done = i + 1;
    }
    if done < bytes.len() && !out.write(&bytes[done..]) {
        return false;
    }
    true
}

/// Newline-and-indent in pretty mode, a plain separator otherwise.
fn write_indent<O: Output>(out: &mut O, cols: usize, needs_sep: bool, pretty: bool) -> bool {
    if pretty {
        out.write(&INDENT[..(cols + 1).min(INDENT.len())])
    } else if needs_sep {
        out.write(b" ")
    } else {
        true
    }
}

/// `prefix:name` of an element, prefix only when its namespace has one.
fn write_element_name<O: Output>(doc: &Document<'_>, out: &mut O, elem: &ElementData) -> bool {
    if let Some(ns) = elem.namespace {
        if let Some(prefix) = doc.namespace(ns).prefix {
            // An empty prefix is the default namespace.
            if !prefix.is_empty()
                && !(out.write(doc.bytes(prefix)) && out.write(b":"))
            {
                return false;
            }
        }
    }
    out.write(doc.bytes(elem.name))
}

/// All namespace declarations, emitted on the root element.
fn write_namespace_defs<O: Output>(
    doc: &Document<'_>,
    out: &mut O,
    elem: &ElementData,
    depth: usize,
    pretty: bool,
) -> bool {
    let name_len = elem.name.len();
    for i in 0..doc.namespace_count() {
        let ns = *doc.namespace(i as u32);
        // Later declarations align under the first, past "<name ".
        if !write_indent(out, 2 * depth + 2 + name_len, true, pretty && i != 0) {
            return false;
        }
        match ns.prefix {
            Some(prefix) if !prefix.is_empty() => {
                if !(out.write(b"xmlns:")
                    && out.write(doc.bytes(prefix))
                    && out.write(b"=\"")
                    && out.write(doc.bytes(ns.uri))
                    && out.write(b"\""))
                {
                    return false;
                }
            }
            _ => {
                if !(out.write(b"xmlns=\"")
                    && out.write(doc.bytes(ns.uri))
                    && out.write(b"\""))
                {
                    return false;
                }
            }
        }
    }
    true
}

fn write_attributes<O: Output>(doc: &Document<'_>, out: &mut O, elem: &ElementData) -> bool {
    let mut att = elem.first_attribute;
    while let Some(ix) = att {
        let attribute = doc.attribute(ix);
        if !out.write(b" ") {
            return false;
        }
        if let Some(ns) = attribute.namespace {
            if let Some(prefix) = doc.namespace(ns).prefix {
                if !prefix.is_empty()
                    && !(out.write(doc.bytes(prefix)) && out.write(b":"))
                {
                    return false;
                }
            }
        }
        if !(out.write(doc.bytes(attribute.name)) && out.write(b"=\"")) {
            return false;
        }
        if !write_escaped(out, doc.bytes(attribute.value)) {
            return false;
        }
        if !out.write(b"\"") {
            return false;
        }
        att = attribute.next_attribute;
    }
    true
}

fn write_node<O: Output>(
    doc: &Document<'_>,
    out: &mut O,
    id: NodeId,
    depth: usize,
    pretty: bool,
) -> bool {
    if !write_indent(out, 2 * depth, false, pretty) {
        return false;
    }
    match &doc.node(id).data {
        NodeData::Element(elem) => {
            if !(out.write(b"<") && write_element_name(doc, out, elem)) {
                return false;
            }
            if id == 0 && !write_namespace_defs(doc, out, elem, depth, pretty) {
                return false;
            }
            if !write_attributes(doc, out, elem) {
                return false;
            }

            if elem.first_child.is_none() {
                return out.write(b"/>");
            }
            if !out.write(b">") {
                return false;
            }

            let mut child = elem.first_child;
            while let Some(ix) = child {
                if !write_node(doc, out, ix, depth + 1, pretty) {
                    return false;
                }
                child = doc.node(ix).next_sibling;
            }

            if !write_indent(out, 2 * depth, false, pretty) {
                return false;
            }
            out.write(b"</") && write_element_name(doc, out, elem) && out.write(b">")
        }
        NodeData::Text(text) => write_escaped(out, doc.bytes(text.contents)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn to_string(doc: &Document<'_>, pretty: bool) -> String {
        let mut out = Vec::new();
        assert!(write(doc, &mut out, pretty));
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_compact_output() {
        let doc = parse(br#"<a x="1"><b>hi</b></a>"#).unwrap();
        assert_eq!(
            to_string(&doc, false),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a x=\"1\"><b>hi</b></a>\n"
        );
    }

    #[test]
    fn test_pretty_output() {
        let doc = parse(b"<a><b>hi</b><c/></a>").unwrap();
        assert_eq!(
            to_string(&doc, true),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\n  <b>\n    hi\n  </b>\n  <c/>\n</a>\n"
        );
    }

    #[test]
    fn test_escaping_batches_runs() {
        let mut doc = Document::new();
        let root = doc.add_element(None, "a", None);
        doc.add_text("x<y>&\"quoted\"'z'", root);
        assert_eq!(
            to_string(&doc, false),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>x&lt;y&gt;&amp;&quot;quoted&quot;&apos;z&apos;</a>\n"
        );
    }

    #[test]
    fn test_namespace_defs_on_root() {
        let doc = parse(br#"<a xmlns="urn:x" xmlns:p="urn:p"><p:b/></a>"#).unwrap();
        assert_eq!(
            to_string(&doc, false),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a xmlns=\"urn:x\" xmlns:p=\"urn:p\"><p:b/></a>\n"
        );
    }

    #[test]
    fn test_indent_caps_at_max_width() {
        let mut doc = Document::new();
        let mut parent = doc.add_element(None, "n", None);
        for _ in 0..30 {
            parent = doc.add_element(None, "n", Some(parent));
        }
        let pretty = to_string(&doc, true);
        // 30 levels deep would want 60 columns; the indent stops at 40.
        let deepest = pretty
            .lines()
            .map(|l| l.len() - l.trim_start().len())
            .max()
            .unwrap();
        assert_eq!(deepest, 40);
        // Nesting itself is still tracked correctly.
        assert_eq!(pretty.matches("<n").count(), 31);
        assert_eq!(pretty.matches("</n>").count(), 30);
    }

    #[test]
    fn test_sink_false_aborts_immediately() {
        struct Budget {
            left: usize,
            calls: usize,
        }
        impl Output for Budget {
            fn write(&mut self, _bytes: &[u8]) -> bool {
                self.calls += 1;
                if self.left == 0 {
                    return false;
                }
                self.left -= 1;
                true
            }
        }

        let doc = parse(b"<a><b>hi</b></a>").unwrap();
        let mut sink = Budget { left: 3, calls: 0 };
        assert!(!write(&doc, &mut sink, false));
        // One failing call, none after it
        assert_eq!(sink.calls, 4);
    }

    #[test]
    fn test_empty_document_writes_declaration_only() {
        let doc = Document::new();
        assert_eq!(
            to_string(&doc, false),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"
        );
    }

    #[test]
    fn test_roundtrip_preserves_structure() {
        let input = br#"<r xmlns="urn:d" xmlns:p="urn:p" a="1" p:b="x&amp;y"><c>text</c><p:d> s </p:d></r>"#;
        let doc = parse(input).unwrap();
        let serialized = to_string(&doc, false);
        let body = serialized.as_bytes();
        let reparsed = parse(body).unwrap();

        fn shape(doc: &Document<'_>, id: crate::dom::NodeId, out: &mut Vec<String>) {
            match &doc.node(id).data {
                NodeData::Element(el) => {
                    let ns = el
                        .namespace
                        .map(|ns| doc.text(doc.namespace(ns).uri).to_string())
                        .unwrap_or_default();
                    out.push(format!("elem {} [{}]", doc.text(el.name), ns));
                    for att in doc.attributes(id) {
                        let a = doc.attribute(att);
                        out.push(format!(
                            "att {}={}",
                            doc.text(a.name),
                            doc.text(a.value)
                        ));
                    }
                    for child in doc.children(id) {
                        shape(doc, child, out);
                    }
                    out.push("end".to_string());
                }
                NodeData::Text(t) => out.push(format!("text {:?}", doc.text(t.contents))),
            }
        }

        let mut before = Vec::new();
        shape(&doc, doc.root().unwrap(), &mut before);
        let mut after = Vec::new();
        shape(&reparsed, reparsed.root().unwrap(), &mut after);
        assert_eq!(before, after);
    }
}

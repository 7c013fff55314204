use crate::document::{Document, NodeId};
use crate::host::NodeKind;

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize `node`. Fragments serialize their children; placeholders are
/// invisible.
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serialize the children of `node`.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for c in doc.raw_children(node) {
        write_node(doc, *c, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.node_kind(node) {
        NodeKind::Text => escape_into(doc.raw_text(node), false, out),
        NodeKind::Placeholder => {}
        NodeKind::Fragment => {
            for c in doc.raw_children(node) {
                write_node(doc, *c, out);
            }
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in doc.attrs(node) {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for c in doc.raw_children(node) {
                write_node(doc, *c, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_into(s: &str, attr: bool, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

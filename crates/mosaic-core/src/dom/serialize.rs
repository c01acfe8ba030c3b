//! HTML serialization of the arena

use super::node::{NodeId, NodeKind};
use super::tree::NodeTree;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "test-script"];

impl NodeTree {
    /// Serialized children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.is_raw_text(id);
        for child in self.children(id) {
            self.write_node(*child, raw, &mut out);
        }
        out
    }

    /// Serialized `id` including its own tag
    pub fn outer_html(&self, id: NodeId) -> String {
        let raw = self.parent(id).is_some_and(|p| self.is_raw_text(p));
        let mut out = String::new();
        self.write_node(id, raw, &mut out);
        out
    }

    fn is_raw_text(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|e| RAW_TEXT_ELEMENTS.iter().any(|t| e.is(t)))
    }

    fn write_node(&self, id: NodeId, raw: bool, out: &mut String) {
        let Some(kind) = self.kind(id) else {
            return;
        };
        match kind {
            NodeKind::Document | NodeKind::Fragment => {
                for child in self.children(id) {
                    self.write_node(*child, false, out);
                }
            }
            NodeKind::Marker(_) => {}
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Text(text) => {
                if raw {
                    out.push_str(&text.value);
                } else {
                    escape_into(&text.value, false, out);
                }
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attr in &element.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.iter().any(|v| element.is(v)) {
                    return;
                }
                let child_raw = RAW_TEXT_ELEMENTS.iter().any(|t| element.is(t));
                for child in self.children(id) {
                    self.write_node(*child, child_raw, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

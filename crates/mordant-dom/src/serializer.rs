//! HTML serialization.
//!
//! [§ 13.3 Serialising HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! Produces HTML text from a [`DomTree`]. Raw text elements (`<style>`,
//! `<script>`, ...) are written verbatim; everything else is escaped.

use crate::{DomTree, NodeId, NodeType};

/// Void elements (no end tag, no children)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Serialize the whole document, including the doctype.
#[must_use]
pub fn serialize(tree: &DomTree) -> String {
    serialize_node(tree, NodeId::ROOT)
}

/// Serialize a node and its descendants (the node's outer HTML).
#[must_use]
pub fn serialize_node(tree: &DomTree, id: NodeId) -> String {
    let mut output = String::new();
    write_node(tree, id, &mut output);
    output
}

fn write_node(tree: &DomTree, id: NodeId, output: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };

    match &node.node_type {
        NodeType::Document => write_children(tree, id, output),
        NodeType::Doctype {
            name,
            public_id,
            system_id,
        } => {
            output.push_str("<!DOCTYPE ");
            output.push_str(name);
            if !public_id.is_empty() {
                output.push_str(" PUBLIC \"");
                output.push_str(public_id);
                output.push('"');
                if !system_id.is_empty() {
                    output.push_str(" \"");
                    output.push_str(system_id);
                    output.push('"');
                }
            } else if !system_id.is_empty() {
                output.push_str(" SYSTEM \"");
                output.push_str(system_id);
                output.push('"');
            }
            output.push('>');
        }
        NodeType::Element(element) => {
            let tag = element.tag_name.as_str();

            output.push('<');
            output.push_str(tag);
            for attr in element.attrs.iter() {
                output.push(' ');
                output.push_str(&attr.name);
                output.push_str("=\"");
                escape_attribute(&attr.value, output);
                output.push('"');
            }
            output.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            if RAW_TEXT_ELEMENTS.contains(&tag) {
                for &child in tree.children(id) {
                    if let Some(text) = tree.as_text(child) {
                        output.push_str(text);
                    }
                }
            } else {
                write_children(tree, id, output);
            }

            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
        NodeType::Text(text) => escape_text(text, output),
        NodeType::Comment(text) => {
            output.push_str("<!--");
            output.push_str(text);
            output.push_str("-->");
        }
    }
}

fn write_children(tree: &DomTree, id: NodeId, output: &mut String) {
    for &child in tree.children(id) {
        write_node(tree, child, output);
    }
}

/// "Escaping a string ... in attribute mode"
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        tree.append_child(NodeId::ROOT, p);
        tree.set_attribute(p, "title", "a \"b\" & c");
        let text = tree.create_text("1 < 2 & 3");
        tree.append_child(p, text);

        assert_eq!(
            serialize(&tree),
            "<p title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn style_content_is_not_escaped() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        tree.append_child(NodeId::ROOT, style);
        let css = tree.create_text("a > b { color: red; }");
        tree.append_child(style, css);

        assert_eq!(serialize(&tree), "<style>a > b { color: red; }</style>");
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let mut tree = DomTree::new();
        let img = tree.create_element("img");
        tree.append_child(NodeId::ROOT, img);
        tree.set_attribute(img, "src", "x.png");

        assert_eq!(serialize(&tree), "<img src=\"x.png\">");
    }
}

//! HTML parser for the mordant style inliner.
//!
//! Parsing is delegated to `html5ever`, which implements the
//! [WHATWG tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//! algorithm including implied `<html>`, `<head>` and `<body>` elements,
//! table fixups and foster parenting. The resulting `RcDom` is converted into
//! an arena [`DomTree`] that the rest of the pipeline mutates.
//!
//! Whitespace-only text nodes are preserved so that serializing an untouched
//! document reproduces its layout.

use std::io;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use mordant_dom::{AttributeList, DomTree, ElementData, NodeId, NodeType};

/// Errors raised while reading a document into the parser.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input could not be read by the parser.
    #[error("failed to read HTML input: {0}")]
    Io(#[from] io::Error),
}

/// Parse an HTML document into a [`DomTree`].
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the parser fails to consume the input.
/// Markup errors are recovered by the tree builder and only logged.
pub fn parse_html(html: &str) -> Result<DomTree, ParseError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    let recovered = dom.errors.borrow().len();
    if recovered > 0 {
        tracing::debug!(recovered, "HTML parser recovered from markup errors");
    }

    let mut tree = DomTree::new();
    convert_children(&dom.document, &mut tree, NodeId::ROOT);
    tracing::debug!(nodes = tree.len(), "parsed HTML document");
    Ok(tree)
}

fn convert_children(handle: &Handle, tree: &mut DomTree, parent: NodeId) {
    for child in handle.children.borrow().iter() {
        convert_node(child, tree, parent);
    }
}

fn convert_node(handle: &Handle, tree: &mut DomTree, parent: NodeId) {
    let node_type = match &handle.data {
        NodeData::Document => {
            convert_children(handle, tree, parent);
            return;
        }
        // Processing instructions only appear in XML documents.
        NodeData::ProcessingInstruction { .. } => return,
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeType::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        },
        NodeData::Text { contents } => NodeType::Text(contents.borrow().to_string()),
        NodeData::Comment { contents } => NodeType::Comment(contents.to_string()),
        NodeData::Element { name, attrs, .. } => {
            let attrs: AttributeList = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            NodeType::Element(ElementData {
                tag_name: name.local.to_string(),
                attrs,
            })
        }
    };

    let id = tree.alloc(node_type);
    tree.append_child(parent, id);

    // Template contents live in a separate fragment in html5ever; they are
    // flattened back under the template so that serialization keeps them.
    if let NodeData::Element {
        template_contents, ..
    } = &handle.data
        && let Some(contents) = template_contents.borrow().as_ref()
    {
        convert_children(contents, tree, id);
    }
    convert_children(handle, tree, id);
}

/// Render a DOM subtree as an indented outline for debugging.
#[must_use]
pub fn print_tree(tree: &DomTree, id: NodeId) -> String {
    let mut output = String::new();
    write_tree(tree, id, 0, &mut output);
    output
}

fn write_tree(tree: &DomTree, id: NodeId, indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);
    let Some(node) = tree.get(id) else {
        return;
    };
    let line = match &node.node_type {
        NodeType::Document => "Document".to_string(),
        NodeType::Doctype { name, .. } => format!("<!DOCTYPE {name}>"),
        NodeType::Element(data) => {
            let attrs: Vec<String> = data
                .attrs
                .iter()
                .map(|a| {
                    if a.value.is_empty() {
                        a.name.clone()
                    } else {
                        format!("{}=\"{}\"", a.name, a.value)
                    }
                })
                .collect();
            if attrs.is_empty() {
                format!("<{}>", data.tag_name)
            } else {
                format!("<{} {}>", data.tag_name, attrs.join(" "))
            }
        }
        NodeType::Text(data) => {
            let display = data.replace('\n', "\\n").replace(' ', "\u{00B7}");
            format!("\"{display}\"")
        }
        NodeType::Comment(data) => format!("<!-- {data} -->"),
    };
    output.push_str(&prefix);
    output.push_str(&line);
    output.push('\n');

    for &child in tree.children(id) {
        write_tree(tree, child, indent + 1, output);
    }
}

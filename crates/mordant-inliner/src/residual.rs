//! The stylesheet of rules that could not be inlined.
//!
//! Media queries, pseudo-selector rules, preserved selectors, at-rules and
//! rules that matched nothing are written back into a single
//! `<style type="text/css">` element in the document head.

use mordant_css::StyleToken;
use mordant_dom::{DomTree, NodeId};

/// Serialize residual rules, one per line, in source order, followed by
/// any text the tokenizer could not parse.
#[must_use]
pub fn write_residual(tokens: &[StyleToken], remainder: &[String]) -> String {
    tokens
        .iter()
        .map(StyleToken::to_css)
        .chain(remainder.iter().cloned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append a `<style type="text/css">` element holding `css` to the head.
///
/// A `<head>` is created as the first child of `<html>` when the document
/// has none. Nothing is inserted for blank `css` or a document without a
/// root element.
pub fn insert_residual(tree: &mut DomTree, css: &str) -> Option<NodeId> {
    if css.trim().is_empty() {
        return None;
    }
    let head = match tree.head() {
        Some(head) => head,
        None => {
            let html = tree.document_element()?;
            let head = tree.create_element("head");
            match tree.first_child(html) {
                Some(first) => tree.insert_before(html, head, first),
                None => tree.append_child(html, head),
            }
            head
        }
    };

    let style = tree.create_element("style");
    tree.set_attribute(style, "type", "text/css");
    let text = tree.create_text(css);
    tree.append_child(style, text);
    tree.append_child(head, style);
    tracing::debug!(bytes = css.len(), "inserted residual stylesheet");
    Some(style)
}

/// Pull the CSS out of every `<style>` element and remove the elements.
///
/// Only elements without a `type`, or with `type="text/css"`, are taken.
/// Their contents are joined with newlines in document order.
pub fn extract_styles(tree: &mut DomTree) -> String {
    let styles: Vec<NodeId> = tree
        .elements_by_tag_name("style")
        .filter(|&id| {
            tree.attribute(id, "type")
                .map(str::trim)
                .is_none_or(|t| t.is_empty() || t.eq_ignore_ascii_case("text/css"))
        })
        .collect();

    let css = styles
        .iter()
        .map(|&id| tree.text_content(id))
        .collect::<Vec<_>>()
        .join("\n");
    for id in styles {
        tree.detach(id);
    }
    css
}

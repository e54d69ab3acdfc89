//! Removal of scripting from email markup.

use mordant_dom::{DomTree, NodeId};

/// Remove every `<script>` element and every `on*` event handler
/// attribute. Returns the number of removed elements and attributes.
pub fn sanitize(tree: &mut DomTree) -> usize {
    let scripts: Vec<NodeId> = tree.elements_by_tag_name("script").collect();
    let mut removed = scripts.len();
    for id in scripts {
        tree.detach(id);
    }

    let elements: Vec<NodeId> = tree.elements().collect();
    for id in elements {
        if let Some(element) = tree.as_element_mut(id) {
            let before = element.attrs.len();
            element.attrs.retain(|attr| !is_event_handler(&attr.name));
            removed += before - element.attrs.len();
        }
    }

    tracing::debug!(removed, "sanitized document");
    removed
}

/// [§ 8.1.8.2 Event handlers on elements](https://html.spec.whatwg.org/multipage/webappapis.html#event-handlers-on-elements,-document-objects,-and-window-objects)
fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_handler_names() {
        assert!(is_event_handler("onclick"));
        assert!(is_event_handler("ONLOAD"));
        assert!(!is_event_handler("on"));
        assert!(!is_event_handler("class"));
    }
}

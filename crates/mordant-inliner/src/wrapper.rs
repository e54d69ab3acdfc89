//! Removal of layout wrapper `<div>`s left behind by page templates.

use mordant_dom::{DomTree, NodeId};

/// Replace every `<div>` whose `class` attribute contains one of `classes`
/// with its children. Returns the number of unwrapped elements.
///
/// Matching is by substring of the class attribute, so `grid` also removes
/// `<div class="grid--12">`.
pub fn remove_wrapper_divs(tree: &mut DomTree, classes: &[String]) -> usize {
    let classes: Vec<&str> = classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if classes.is_empty() {
        return 0;
    }

    let wrappers: Vec<NodeId> = tree
        .elements_by_tag_name("div")
        .filter(|&id| {
            tree.attribute(id, "class")
                .is_some_and(|value| classes.iter().any(|c| value.contains(*c)))
        })
        .collect();

    // Unwrapping moves children but never changes which nodes are wrappers,
    // so the collected list stays valid.
    for &id in &wrappers {
        tree.unwrap(id);
    }
    tracing::debug!(removed = wrappers.len(), "removed wrapper divs");
    wrappers.len()
}

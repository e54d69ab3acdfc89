//! The document capability the merge and attribute passes work against.

use std::hash::Hash;

use mordant_css::{SelectorError, query_selector_all};
use mordant_dom::{DomTree, NodeId};

use crate::error::InlinerError;

/// A parsed HTML document that can be queried by selector and whose
/// element attributes can be read and written.
pub trait DomQueryable {
    /// Handle to one element of the document.
    type Element: Copy + Eq + Hash;

    /// Parse an HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::InvalidInput`] when the text cannot be parsed.
    fn parse(html: &str) -> Result<Self, InlinerError>
    where
        Self: Sized;

    /// Every element matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] for selectors the engine cannot handle.
    fn select(&self, selector: &str) -> Result<Vec<Self::Element>, SelectorError>;

    /// Value of an attribute, if present.
    fn attribute(&self, element: Self::Element, name: &str) -> Option<&str>;

    /// Set an attribute, keeping its position if it already exists.
    fn set_attribute(&mut self, element: Self::Element, name: &str, value: &str);

    /// Serialize the whole document back to HTML.
    fn serialize(&self) -> String;
}

impl DomQueryable for DomTree {
    type Element = NodeId;

    fn parse(html: &str) -> Result<Self, InlinerError> {
        Ok(mordant_html::parse_html(html)?)
    }

    fn select(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        query_selector_all(self, selector)
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        Self::attribute(self, element, name)
    }

    fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) {
        Self::set_attribute(self, element, name, value);
    }

    fn serialize(&self) -> String {
        mordant_dom::serialize(self)
    }
}

//! CSS selector parsing and matching.
//!
//! This module implements the subset of
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) that the inliner
//! needs to resolve stylesheet rules against a [`DomTree`]: type, class, ID,
//! universal and attribute selectors and the four combinators. Pseudo-classes
//! are parsed but never match.

mod parser;

use std::collections::HashSet;

use mordant_dom::{DomTree, ElementData, NodeId};

pub use parser::parse_selector;

/// Why a selector could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector text was empty or only whitespace.
    #[error("empty selector")]
    Empty,
    /// A character that cannot start any supported simple selector.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Character offset into the selector.
        offset: usize,
    },
    /// A combinator with nothing on one of its sides.
    #[error("combinator without a selector on both sides")]
    DanglingCombinator,
    /// `.`, `#`, `:` or `[` not followed by a name.
    #[error("expected a name after {0:?}")]
    MissingName(char),
    /// An attribute selector or functional pseudo-class was not closed.
    #[error("unterminated {0}")]
    Unterminated(&'static str),
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Examples: `div`, `p`, `td`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.button`, `.ExternalClass`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#header`, `#footer`
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Any pseudo-class or pseudo-element. None of them is evaluated, so
    /// this never matches.
    NeverMatch,

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Examples: `[href]`, `[align=center]`, `[src$=".png"]`
    Attribute(AttributeSelector),
}

/// How an attribute selector compares the attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr=value]`: exactly equal.
    Equals,
    /// `[attr~=value]`: one of the whitespace-separated words.
    Includes,
    /// `[attr|=value]`: equal, or starts with `value-`.
    DashMatch,
    /// `[attr^=value]`: starts with.
    Prefix,
    /// `[attr$=value]`: ends with.
    Suffix,
    /// `[attr*=value]`: contains.
    Substring,
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name.
    pub name: String,
    /// Operator and expected value. `None` for `[attr]`.
    pub matcher: Option<(AttributeOperator, String)>,
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element.attrs.get(&self.name) else {
            return false;
        };
        let Some((operator, expected)) = &self.matcher else {
            return true;
        };
        let expected = expected.as_str();
        match operator {
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => actual.split_ascii_whitespace().any(|w| w == expected),
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            // "If "val" is the empty string then the selector does not represent anything."
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators): `A B`
    Descendant,
    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators): `A > B`
    Child,
    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators): `A + B`
    NextSibling,
    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators): `A ~ B`
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `table.body > tr td.cell`
/// This would be parsed as:
/// ```text
/// [td.cell] <--(Descendant)-- [tr] <--(Child)-- [table.body]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,

    /// Chain of (combinator, compound) pairs going left from the subject.
    /// Empty if this is a single compound selector.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// A parsed CSS selector ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The complex selector (compound selectors with combinators).
    pub complex: ComplexSelector,
}

impl ParsedSelector {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match the selector against an element with full DOM tree context.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId) -> bool {
        compound_matches_in_tree(&self.complex.subject, tree, node_id)
            && self.matches_combinators(tree, node_id, 0, &mut HashSet::new())
    }

    /// Walk the combinator chain right-to-left from an already matched
    /// element, starting at combinator `index`.
    ///
    /// Descendant and subsequent-sibling steps try every candidate, so
    /// `a > b c` still matches when the nearest `b` is not a child of `a`.
    /// `failed` records `(index, element)` pairs already known not to match,
    /// which keeps the walk polynomial in the depth of the tree.
    fn matches_combinators(
        &self,
        tree: &DomTree,
        current_id: NodeId,
        index: usize,
        failed: &mut HashSet<(usize, NodeId)>,
    ) -> bool {
        let Some((combinator, compound)) = self.complex.combinators.get(index) else {
            return true;
        };
        if failed.contains(&(index, current_id)) {
            return false;
        }

        let mut matches_rest = |candidate: NodeId| {
            compound_matches_in_tree(compound, tree, candidate)
                && self.matches_combinators(tree, candidate, index + 1, failed)
        };
        let matched = match combinator {
            Combinator::Descendant => tree.ancestors(current_id).any(&mut matches_rest),
            Combinator::Child => tree.parent(current_id).is_some_and(&mut matches_rest),
            Combinator::NextSibling => tree
                .preceding_siblings(current_id)
                .find(|&sibling| tree.as_element(sibling).is_some())
                .is_some_and(&mut matches_rest),
            Combinator::SubsequentSibling => {
                tree.preceding_siblings(current_id).any(&mut matches_rest)
            }
        };

        if !matched {
            let _ = failed.insert((index, current_id));
        }
        matched
    }
}

/// Check if a compound selector matches an element.
fn compound_matches_in_tree(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::Type(name) => element.is(name),
        SimpleSelector::Class(class_name) => element.has_class(class_name),
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Universal => true,
        SimpleSelector::NeverMatch => false,
        SimpleSelector::Attribute(attr) => attr.matches(element),
    })
}

/// Every attached element matching `selector`, in tree order.
#[must_use]
pub fn select(tree: &DomTree, selector: &ParsedSelector) -> Vec<NodeId> {
    tree.elements()
        .filter(|&id| selector.matches_in_tree(tree, id))
        .collect()
}

/// Parse a selector list and return every element matching any branch,
/// in tree order and without duplicates.
///
/// # Errors
///
/// Returns the first [`SelectorError`] among the branches.
pub fn query_selector_all(tree: &DomTree, selectors: &str) -> Result<Vec<NodeId>, SelectorError> {
    let parsed = crate::declaration::split_top_level(selectors, ',')
        .into_iter()
        .map(parse_selector)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tree
        .elements()
        .filter(|&id| parsed.iter().any(|s| s.matches_in_tree(tree, id)))
        .collect())
}

//! Stylesheet tokenizer, specificity calculator and selector engine for the
//! mordant style inliner.
//!
//! # Scope
//!
//! This crate implements:
//! - **Stylesheet tokenizer**: splits embedded CSS into rules on balanced
//!   braces, keeping `@media` blocks whole and flagging rules that can never
//!   be inlined (at-rules, pseudo-classes, pseudo-elements).
//!   - Comment removal
//!   - Top-level comma, semicolon and brace handling that respects strings
//!     and parentheses
//!   - Recovery from unbalanced braces and from overly deep nesting
//!   - `<!--` and `-->` around the whole stylesheet
//!
//! - **Declarations** ([§ 5.4.5](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations))
//!   - `!important` detection
//!   - Shared by rule bodies and `style` attributes
//!
//! - **Specificity** ([§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules))
//!   - `(inline, id, class, element)` vectors with a total order
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, universal and attribute selectors
//!   - Complex selectors with combinators (descendant, child, sibling)
//!   - Pseudo-classes and pseudo-elements parse but never match
//!
//! # Not Implemented
//!
//! - Custom properties, `calc()` and value validation
//! - Namespaced selectors
//! - Pseudo-class matching

/// Declaration parsing and serialization.
pub mod declaration;
/// CSS selector parsing and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Specificity vectors per [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules).
pub mod specificity;
/// Stylesheet tokenizer.
pub mod tokenizer;

// Re-exports for convenience
pub use declaration::{StyleProperty, parse_declarations, serialize_declarations};
pub use selector::{ParsedSelector, SelectorError, parse_selector, query_selector_all, select};
pub use specificity::{StyleSpecificity, specificity_of};
pub use tokenizer::{StyleToken, StyleTokenizer, Stylesheet, tokenize, tokenize_stylesheet};

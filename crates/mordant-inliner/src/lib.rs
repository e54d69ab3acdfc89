//! Inlining of embedded CSS into HTML email documents.
//!
//! Mail clients drop or ignore `<style>` elements unpredictably, so email
//! markup carries its styling in `style` attributes. This crate moves the
//! rules of every `<style>` element onto the elements they match:
//!
//! - rules are tokenized and matched with `mordant-css`,
//! - conflicting declarations are resolved per [`MergePolicy`],
//! - rules that cannot live in an attribute (media queries, pseudo
//!   selectors, rules matching nothing) are written back into one
//!   `<style>` element in the head,
//! - [`AttributeRule`]s mirror selected properties into HTML attributes.
//!
//! ```no_run
//! use mordant_inliner::{InlinerConfig, StylesInliner};
//!
//! let inliner = StylesInliner::new(InlinerConfig::default())?;
//! let html = inliner.inline("<style>p { color: red }</style><p>Hi</p>")?;
//! # Ok::<(), mordant_inliner::InlinerError>(())
//! ```

/// Attribute rules applied after merging.
pub mod attributes;
/// Engine configuration.
pub mod config;
/// The document capability used by the passes.
pub mod document;
/// Error type.
pub mod error;
/// The pipeline.
pub mod inliner;
/// Declaration resolution.
pub mod merge;
/// Style extraction and the residual stylesheet.
pub mod residual;
/// Script removal.
pub mod sanitize;
/// Wrapper div removal.
pub mod wrapper;

pub use attributes::{CompiledAttributeRule, apply_attribute_rules};
pub use config::{AttributeRule, InlinerConfig, MergePolicy};
pub use document::DomQueryable;
pub use error::InlinerError;
pub use inliner::{InlineReport, StylesInliner, inline};
pub use merge::{MergeEngine, MergeOutcome};
pub use residual::write_residual;

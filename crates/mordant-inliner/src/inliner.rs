//! The inlining pipeline.
//!
//! `parse → sanitize → unwrap → extract → tokenize → merge → residual →
//! attribute rules → serialize`
//!
//! Every stage runs on every call. Without embedded CSS the tokenize, merge
//! and residual stages are no-ops and the document is serialized as parsed.

use regex::Regex;
use serde_json::Value;

use mordant_css::{Stylesheet, tokenize_stylesheet};
use mordant_dom::DomTree;

use crate::attributes::{CompiledAttributeRule, apply_attribute_rules, compile_rules};
use crate::config::{AttributeRule, InlinerConfig, MergePolicy};
use crate::document::DomQueryable;
use crate::error::InlinerError;
use crate::merge::MergeEngine;
use crate::residual::{extract_styles, insert_residual, write_residual};
use crate::sanitize::sanitize;
use crate::wrapper::remove_wrapper_divs;

/// Counts gathered while inlining one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineReport {
    /// Rules produced by the tokenizer (top level only).
    pub tokens: usize,
    /// Elements whose `style` attribute was rewritten.
    pub styled_elements: usize,
    /// Rules written to the residual stylesheet.
    pub residual_rules: usize,
    /// HTML attributes written by attribute rules.
    pub attributes_written: usize,
}

/// A configured inlining engine.
///
/// Construction compiles every pattern of the configuration. The engine
/// holds no per-call state, so one instance can serve many documents,
/// including from several threads at once.
#[derive(Debug, Clone)]
pub struct StylesInliner {
    config: InlinerConfig,
    engine: MergeEngine,
    attribute_rules: Vec<CompiledAttributeRule>,
    markers: Vec<Regex>,
}

impl StylesInliner {
    /// Build an engine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::Config`] when a preserve pattern or an
    /// attribute rule pattern does not compile.
    pub fn new(config: InlinerConfig) -> Result<Self, InlinerError> {
        let markers = config
            .preserve_selectors
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let attribute_rules = compile_rules(&config.attribute_rules)?;
        Ok(Self {
            engine: MergeEngine::new(config.policy, config.normalize_quotes),
            attribute_rules,
            markers,
            config,
        })
    }

    /// The configuration the engine was built from.
    #[must_use]
    pub const fn config(&self) -> &InlinerConfig {
        &self.config
    }

    /// Inline the embedded CSS of an HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::InvalidInput`] for blank or unparseable HTML.
    pub fn inline(&self, html: &str) -> Result<String, InlinerError> {
        let mut tree = parse_document(html)?;
        let _ = self.inline_tree(&mut tree);
        Ok(tree.serialize())
    }

    /// Run every stage after parsing on an already parsed document.
    pub fn inline_tree(&self, tree: &mut DomTree) -> InlineReport {
        if self.config.sanitize {
            let _ = sanitize(tree);
        }
        let _ = remove_wrapper_divs(tree, &self.config.wrapper_classes);

        let css = extract_styles(tree);
        let stylesheet = tokenize_stylesheet(&css, &self.markers);
        let outcome = self.engine.merge(tree, &stylesheet.tokens);

        let residual = write_residual(&outcome.residual, &stylesheet.remainder);
        let _ = insert_residual(tree, &residual);
        let attributes_written = apply_attribute_rules(tree, &self.attribute_rules);

        let report = InlineReport {
            tokens: stylesheet.tokens.len(),
            styled_elements: outcome.styled_elements,
            residual_rules: outcome.residual.len(),
            attributes_written,
        };
        tracing::debug!(?report, "inlined document");
        report
    }

    /// Tokenize the embedded CSS of a document without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::InvalidInput`] for blank or unparseable HTML.
    pub fn stylesheet(&self, html: &str) -> Result<Stylesheet, InlinerError> {
        let mut tree = parse_document(html)?;
        if self.config.sanitize {
            let _ = sanitize(&mut tree);
        }
        Ok(tokenize_stylesheet(&extract_styles(&mut tree), &self.markers))
    }

    /// Inline the `html` member of a JSON object and return the object with
    /// that member replaced. Other members are kept.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::Json`] for malformed JSON and
    /// [`InlinerError::InvalidInput`] when there is no string `html`
    /// member or its document is invalid.
    pub fn inline_json(&self, content: &str) -> Result<String, InlinerError> {
        let mut envelope: Value = serde_json::from_str(content)?;
        let Some(html) = envelope.get("html").and_then(Value::as_str) else {
            return Err(InlinerError::InvalidInput(
                "JSON content has no string `html` member".to_string(),
            ));
        };

        let inlined = self.inline(html)?;
        if let Some(slot) = envelope.get_mut("html") {
            *slot = Value::String(inlined);
        }
        Ok(serde_json::to_string(&envelope)?)
    }
}

/// Inline `html` with the given policy and attribute rules, using defaults
/// for everything else.
///
/// # Errors
///
/// Returns [`InlinerError::InvalidInput`] for blank or unparseable HTML and
/// [`InlinerError::Config`] for an attribute rule that does not compile.
pub fn inline(
    html: &str,
    policy: MergePolicy,
    attribute_rules: &[AttributeRule],
) -> Result<String, InlinerError> {
    let config = InlinerConfig::default()
        .with_policy(policy)
        .with_attribute_rules(attribute_rules.to_vec());
    StylesInliner::new(config)?.inline(html)
}

fn parse_document(html: &str) -> Result<DomTree, InlinerError> {
    if html.trim().is_empty() {
        return Err(InlinerError::InvalidInput("HTML input is empty".to_string()));
    }
    DomTree::parse(html)
}

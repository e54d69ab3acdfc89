//! Resolution of matched rules into `style` attributes.
//!
//! [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! The merge runs in three steps:
//!
//! 1. Every inlinable rule is split into its selector branches and each
//!    branch is matched against the document. Branches that match nothing,
//!    or that the selector engine rejects, are kept for the residual
//!    stylesheet. Branches with identical selector text are folded into the
//!    first one, in source order.
//! 2. The matched branches are ordered by ascending specificity (stable, so
//!    source order breaks ties) and their declarations are queued on every
//!    element they matched.
//! 3. Each element with queued declarations gets a new `style` attribute,
//!    computed from its existing declarations and the queue per
//!    [`MergePolicy`].

use std::cmp::Ordering;
use std::collections::HashMap;

use mordant_css::declaration::{normalize_whitespace, split_top_level, strip_comments};
use mordant_css::{StyleProperty, StyleSpecificity, StyleToken, serialize_declarations, specificity_of};

use crate::config::MergePolicy;
use crate::document::DomQueryable;

/// One selector branch that matched at least one element.
struct MatchedRule<E> {
    selector: String,
    specificity: StyleSpecificity,
    properties: Vec<StyleProperty>,
    elements: Vec<E>,
}

/// One piece of a `style` attribute being rebuilt.
enum StylePart {
    Declaration(StyleProperty),
    /// Existing text that is not a `name: value` declaration.
    Verbatim(String),
}

/// Result of a merge pass.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Rules that were not inlined, in source order.
    pub residual: Vec<StyleToken>,
    /// Number of elements whose `style` attribute was rewritten.
    pub styled_elements: usize,
}

/// Applies inlinable rules to a document under one [`MergePolicy`].
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine {
    policy: MergePolicy,
    normalize_quotes: bool,
}

impl MergeEngine {
    /// Create an engine. With `normalize_quotes`, double quotes in inlined
    /// values become single quotes.
    #[must_use]
    pub const fn new(policy: MergePolicy, normalize_quotes: bool) -> Self {
        Self {
            policy,
            normalize_quotes,
        }
    }

    /// Inline `tokens` into `document` and return what is left over.
    pub fn merge<D: DomQueryable>(&self, document: &mut D, tokens: &[StyleToken]) -> MergeOutcome {
        let mut residual = Vec::new();
        let mut rules = collect_matches(document, tokens, &mut residual);
        rules.sort_by_key(|rule| rule.specificity);

        // Elements are kept in the order they first receive a declaration.
        let mut pending: Vec<(D::Element, Vec<StyleProperty>)> = Vec::new();
        let mut slots: HashMap<D::Element, usize> = HashMap::new();
        for rule in &rules {
            for &element in &rule.elements {
                let slot = *slots.entry(element).or_insert_with(|| {
                    pending.push((element, Vec::new()));
                    pending.len() - 1
                });
                pending[slot]
                    .1
                    .extend(rule.properties.iter().map(|p| self.prepare(p, rule.specificity)));
            }
        }

        for (element, declarations) in &pending {
            let existing = document.attribute(*element, "style").map(str::to_owned);
            let style = self.style_for(existing.as_deref(), declarations);
            document.set_attribute(*element, "style", &style);
        }

        tracing::debug!(
            rules = rules.len(),
            elements = pending.len(),
            residual = residual.len(),
            policy = %self.policy,
            "merged stylesheet into style attributes"
        );
        MergeOutcome {
            residual,
            styled_elements: pending.len(),
        }
    }

    /// The new `style` attribute value for an element.
    ///
    /// Existing declarations that are not overridden keep their text, and
    /// existing fragments that are not declarations are kept in place.
    #[must_use]
    pub fn style_for(&self, existing: Option<&str>, declarations: &[StyleProperty]) -> String {
        if self.policy == MergePolicy::AlwaysAppend {
            return append_style(existing, declarations);
        }

        let mut parts = Vec::new();
        for part in existing.map(existing_parts).unwrap_or_default() {
            match part {
                StylePart::Declaration(property) => self.resolve_into(&mut parts, property),
                verbatim @ StylePart::Verbatim(_) => parts.push(verbatim),
            }
        }
        for property in declarations {
            self.resolve_into(&mut parts, property.clone());
        }

        parts
            .iter()
            .map(|part| match part {
                StylePart::Declaration(property) if is_inline(property) => {
                    format!("{};", property.full_property)
                }
                StylePart::Declaration(property) => format!("{};", property.to_css()),
                StylePart::Verbatim(text) => format!("{text};"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keep one declaration per property name, at its first-seen position.
    fn resolve_into(&self, parts: &mut Vec<StylePart>, candidate: StyleProperty) {
        let current = parts.iter_mut().find_map(|part| match part {
            StylePart::Declaration(current) if current.same_property(&candidate) => Some(current),
            _ => None,
        });
        match current {
            Some(current) => {
                if self.overrides(&candidate, current) {
                    *current = candidate;
                }
            }
            None => parts.push(StylePart::Declaration(candidate)),
        }
    }

    /// Whether `candidate`, seen after `current`, replaces it.
    fn overrides(&self, candidate: &StyleProperty, current: &StyleProperty) -> bool {
        if candidate.important != current.important {
            return candidate.important;
        }
        match self.policy {
            MergePolicy::ProcessSpecificity => match (&candidate.specificity, &current.specificity) {
                (Some(ours), theirs) => ours.compare_to(theirs.as_ref()) != Ordering::Less,
                (None, Some(_)) => false,
                (None, None) => true,
            },
            MergePolicy::IgnoreSpecificity | MergePolicy::AlwaysAppend => true,
        }
    }

    fn prepare(&self, property: &StyleProperty, specificity: StyleSpecificity) -> StyleProperty {
        let mut property = property.clone().with_specificity(specificity);
        if self.normalize_quotes && property.value.contains('"') {
            property.value = property.value.replace('"', "'");
            property.full_property = property.full_property.replace('"', "'");
        }
        property
    }
}

/// Match every inlinable token branch against the document.
///
/// Tokens that can never be inlined, and branches that match nothing, are
/// pushed onto `residual` in source order.
fn collect_matches<D: DomQueryable>(
    document: &D,
    tokens: &[StyleToken],
    residual: &mut Vec<StyleToken>,
) -> Vec<MatchedRule<D::Element>> {
    let mut rules: Vec<MatchedRule<D::Element>> = Vec::new();

    for token in tokens {
        let branches = token.selector_branches();
        if !token.is_inlinable() || branches.is_empty() {
            residual.push(token.clone());
            continue;
        }

        for branch in branches {
            let elements = match document.select(branch) {
                Ok(elements) => elements,
                Err(err) => {
                    tracing::warn!(selector = branch, error = %err, "selector not supported, keeping rule in stylesheet");
                    Vec::new()
                }
            };
            if elements.is_empty() {
                residual.push(StyleToken::rule(branch, token.properties.clone()));
                continue;
            }

            if let Some(rule) = rules.iter_mut().find(|r| r.selector == branch) {
                rule.properties.extend(token.properties.iter().cloned());
            } else {
                rules.push(MatchedRule {
                    selector: branch.to_string(),
                    specificity: specificity_of(branch),
                    properties: token.properties.clone(),
                    elements,
                });
            }
        }
    }
    rules
}

/// Split an existing `style` attribute into declarations ranked as inline
/// and fragments kept as text.
fn existing_parts(style: &str) -> Vec<StylePart> {
    split_top_level(&strip_comments(style), ';')
        .into_iter()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| match StyleProperty::parse(fragment) {
            Some(property) => StylePart::Declaration(property.with_specificity(StyleSpecificity::INLINE)),
            None => StylePart::Verbatim(normalize_whitespace(fragment)),
        })
        .collect()
}

fn is_inline(property: &StyleProperty) -> bool {
    property.specificity.is_some_and(|s| s.inline > 0)
}

/// Existing style text, terminated with `;`, followed by every declaration.
fn append_style(existing: Option<&str>, declarations: &[StyleProperty]) -> String {
    let appended = serialize_declarations(declarations);
    match existing.map(str::trim).filter(|s| !s.is_empty()) {
        None => appended,
        Some(current) if current.ends_with(';') => format!("{current} {appended}"),
        Some(current) => format!("{current}; {appended}"),
    }
}

use std::hash::{Hash, Hasher};

use crate::declaration::{StyleProperty, normalize_whitespace, split_top_level};
use crate::specificity::{StyleSpecificity, specificity_of};

/// One parsed CSS rule.
///
/// A token is either a style rule (`selector { declarations }`), a block
/// at-rule whose prelude is kept as the selector text, or a statement
/// at-rule such as `@import url(a.css);`.
///
/// Equality and hashing only look at the selector text, the specificity and
/// the media-query flag.
#[derive(Debug, Clone, Default)]
pub struct StyleToken {
    /// Selector or at-rule prelude, whitespace collapsed. May be a comma group.
    pub selector: String,
    /// Declarations in source order.
    pub properties: Vec<StyleProperty>,
    /// Rules nested inside this one, e.g. the rules of an `@media` block.
    pub children: Vec<StyleToken>,
    /// Specificity of the most specific selector branch. `None` for
    /// at-rules and pseudo-selector rules.
    pub specificity: Option<StyleSpecificity>,
    /// The prelude starts with `@`.
    pub is_media_query: bool,
    /// The selector has a `:` pseudo-class or `::` pseudo-element.
    pub is_pseudo_selector: bool,
    /// The rule sits inside another block.
    pub is_nested: bool,
    /// The selector matched one of the preserve markers given to the tokenizer.
    pub is_preserved: bool,
    /// A block-less at-rule, serialized as `prelude;`.
    pub is_statement: bool,
}

impl StyleToken {
    /// Build a style rule token, classifying its selector.
    #[must_use]
    pub fn rule(selector: &str, properties: Vec<StyleProperty>) -> Self {
        let selector = normalize_whitespace(selector);
        let is_media_query = selector.starts_with('@');
        let is_pseudo_selector = !is_media_query && has_pseudo(&selector);
        let specificity = (!is_media_query && !is_pseudo_selector).then(|| {
            split_top_level(&selector, ',')
                .into_iter()
                .map(specificity_of)
                .max()
                .unwrap_or_default()
        });
        Self {
            selector,
            properties,
            specificity,
            is_media_query,
            is_pseudo_selector,
            ..Self::default()
        }
    }

    /// Whether the merge engine may push this rule into `style` attributes.
    #[must_use]
    pub fn is_inlinable(&self) -> bool {
        !self.is_media_query
            && !self.is_pseudo_selector
            && !self.is_preserved
            && !self.is_statement
            && self.children.is_empty()
    }

    /// The comma-separated branches of the selector, trimmed.
    #[must_use]
    pub fn selector_branches(&self) -> Vec<&str> {
        split_top_level(&self.selector, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Serialize the rule, nested rules included.
    ///
    /// Declarations are written from their source text, so re-tokenizing
    /// the output yields an equivalent token.
    #[must_use]
    pub fn to_css(&self) -> String {
        if self.is_statement {
            return format!("{};", self.selector);
        }

        let mut parts: Vec<String> = self.children.iter().map(Self::to_css).collect();
        parts.extend(self.properties.iter().map(|p| format!("{};", p.full_property)));
        if parts.is_empty() {
            format!("{} {{ }}", self.selector)
        } else {
            format!("{} {{ {} }}", self.selector, parts.join(" "))
        }
    }
}

impl PartialEq for StyleToken {
    fn eq(&self, other: &Self) -> bool {
        self.selector == other.selector
            && self.specificity == other.specificity
            && self.is_media_query == other.is_media_query
    }
}

impl Eq for StyleToken {}

impl Hash for StyleToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.selector.hash(state);
        self.specificity.hash(state);
        self.is_media_query.hash(state);
    }
}

/// The result of tokenizing a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Rules in source order.
    pub tokens: Vec<StyleToken>,
    /// Text that could not be tokenized, kept so it can be written back out.
    pub remainder: Vec<String>,
}

impl Stylesheet {
    /// Whether nothing at all was parsed or left over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.remainder.is_empty()
    }
}

/// [§ 3.6 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
///
/// Whether the selector has a `:` outside attribute brackets, parentheses,
/// strings and escapes.
#[must_use]
pub fn has_pseudo(selector: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in selector.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            _ if quote.is_some() => {
                if quote == Some(c) {
                    quote = None;
                }
            }
            '"' | '\'' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

//! Stylesheet tokenizer.
//!
//! Turns embedded CSS text into an ordered list of [`StyleToken`]s. Each
//! token pairs a selector (or at-rule prelude) with its declaration block and
//! records whether it can be inlined at all.

/// Brace-balanced rule scanner.
pub mod scanner;
/// Rule tokens produced by the scanner.
pub mod token;

use regex::Regex;

pub use scanner::StyleTokenizer;
pub use token::{StyleToken, Stylesheet, has_pseudo};

/// Tokenize `css` into rules. Empty input yields no tokens.
///
/// Selectors containing a match for any of `markers` are flagged
/// [`StyleToken::is_preserved`].
#[must_use]
pub fn tokenize(css: &str, markers: &[Regex]) -> Vec<StyleToken> {
    tokenize_stylesheet(css, markers).tokens
}

/// Tokenize `css`, also returning text that could not be parsed.
#[must_use]
pub fn tokenize_stylesheet(css: &str, markers: &[Regex]) -> Stylesheet {
    let mut tokenizer = StyleTokenizer::new(css, markers);
    tokenizer.run();
    let stylesheet = tokenizer.into_stylesheet();
    tracing::debug!(
        tokens = stylesheet.tokens.len(),
        remainder = stylesheet.remainder.len(),
        "tokenized stylesheet"
    );
    stylesheet
}

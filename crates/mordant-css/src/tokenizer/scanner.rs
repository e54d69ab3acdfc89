use regex::Regex;

use super::token::{StyleToken, Stylesheet};
use crate::declaration::{StyleProperty, normalize_whitespace, parse_declarations, strip_comments};

/// Blocks nested deeper than this are kept as plain text.
const MAX_NESTING_DEPTH: usize = 16;

/// What ended a rule prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    OpenBrace,
    Semicolon,
    CloseBrace,
    Eof,
}

/// Splits stylesheet text into [`StyleToken`]s on balanced braces.
///
/// Comments are removed up front. Braces, semicolons and commas inside
/// strings, parentheses and attribute brackets never split a rule. When the
/// input has a `{` without its `}` or a stray `}`, the rest of the input is
/// kept verbatim in [`Stylesheet::remainder`] and a warning is logged.
/// A rule whose blocks nest more than 16 levels deep is kept the same way,
/// and tokenizing resumes after it.
pub struct StyleTokenizer<'a> {
    /// The input, comments already stripped
    input: Vec<char>,
    /// Current position in the input
    position: usize,
    /// Patterns marking selectors that must stay in the stylesheet
    markers: &'a [Regex],
    /// Collected tokens
    tokens: Vec<StyleToken>,
    /// Unparseable fragments
    remainder: Vec<String>,
}

impl<'a> StyleTokenizer<'a> {
    /// Create a tokenizer for `css` that flags selectors matching `markers`.
    #[must_use]
    pub fn new(css: &str, markers: &'a [Regex]) -> Self {
        Self {
            input: strip_comments(css).chars().collect(),
            position: 0,
            markers,
            tokens: Vec::new(),
            remainder: Vec::new(),
        }
    }

    /// Tokenize the whole input.
    pub fn run(&mut self) {
        let (tokens, loose) = self.consume_rule_list(false);
        self.tokens = tokens;
        for declaration in loose {
            tracing::warn!(
                fragment = %declaration.full_property,
                "declaration outside of any rule"
            );
            self.remainder.push(format!("{};", declaration.full_property));
        }
    }

    /// Return the collected tokens and leftover text.
    #[must_use]
    pub fn into_stylesheet(self) -> Stylesheet {
        Stylesheet {
            tokens: self.tokens,
            remainder: self.remainder,
        }
    }

    /// Consume rules until the end of input, or until the `}` closing the
    /// enclosing block when `nested`.
    ///
    /// Declarations found between rules (`color: red;` inside `@page { }`
    /// or a nesting parent) are returned separately.
    fn consume_rule_list(&mut self, nested: bool) -> (Vec<StyleToken>, Vec<StyleProperty>) {
        let mut tokens = Vec::new();
        let mut loose = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.position;
            if self.peek().is_none() {
                break;
            }
            // [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
            // "<CDO-token> <CDC-token>: If the top-level flag is set, do nothing."
            if !nested && self.skip_cdo_or_cdc() {
                continue;
            }

            let (prelude, terminator) = self.consume_prelude();
            match terminator {
                Terminator::OpenBrace => {
                    let body_start = self.position;
                    let Some((body_end, depth)) = self.find_block_end() else {
                        self.malformed(start, "unclosed block");
                        break;
                    };
                    self.position = body_end + 1;
                    if depth > MAX_NESTING_DEPTH {
                        self.keep_as_text(start, self.position, "blocks nested too deeply");
                        continue;
                    }
                    let body: String = self.input[body_start..body_end].iter().collect();
                    tokens.push(self.build_token(&prelude, &body, nested));
                }
                Terminator::Semicolon => {
                    let prelude = normalize_whitespace(&prelude);
                    if prelude.starts_with('@') {
                        let mut token = StyleToken::rule(&prelude, Vec::new());
                        token.is_statement = true;
                        token.is_nested = nested;
                        tokens.push(token);
                    } else {
                        loose.extend(parse_declarations(&prelude));
                    }
                }
                Terminator::CloseBrace if nested => {
                    loose.extend(parse_declarations(&prelude));
                    // Leave the `}` for the caller.
                    self.position -= 1;
                    break;
                }
                Terminator::CloseBrace => {
                    self.malformed(start, "unexpected `}`");
                    break;
                }
                Terminator::Eof => {
                    if nested {
                        loose.extend(parse_declarations(&prelude));
                    } else if !prelude.trim().is_empty() {
                        self.malformed(start, "rule without a block");
                    }
                    break;
                }
            }
        }

        (tokens, loose)
    }

    fn build_token(&self, prelude: &str, body: &str, nested: bool) -> StyleToken {
        let (children, properties) = if contains_block(body) {
            let mut inner = StyleTokenizer {
                input: body.chars().collect(),
                position: 0,
                markers: self.markers,
                tokens: Vec::new(),
                remainder: Vec::new(),
            };
            inner.consume_rule_list(true)
        } else {
            (Vec::new(), parse_declarations(body))
        };

        let mut token = StyleToken::rule(prelude, properties);
        token.is_nested = nested;
        token.is_preserved = !token.is_media_query
            && self.markers.iter().any(|m| m.is_match(&token.selector));
        token.children = children;
        token
    }

    /// Record everything from `start` to the end as opaque text.
    fn malformed(&mut self, start: usize, reason: &str) {
        self.keep_as_text(start, self.input.len(), reason);
        self.position = self.input.len();
    }

    fn keep_as_text(&mut self, start: usize, end: usize, reason: &str) {
        let text: String = self.input[start..end].iter().collect();
        let text = normalize_whitespace(&text);
        tracing::warn!(reason, fragment = %text, "malformed CSS kept as plain text");
        if !text.is_empty() {
            self.remainder.push(text);
        }
    }

    /// Skip a `<!--` or `-->` at the current position.
    fn skip_cdo_or_cdc(&mut self) -> bool {
        for marker in ["<!--", "-->"] {
            let len = marker.chars().count();
            let matches = self
                .input
                .get(self.position..self.position + len)
                .is_some_and(|window| window.iter().copied().eq(marker.chars()));
            if matches {
                self.position += len;
                return true;
            }
        }
        false
    }

    /// Consume a prelude up to a top-level `{`, `;` or `}` (which is consumed too).
    fn consume_prelude(&mut self) -> (String, Terminator) {
        let mut prelude = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.consume() {
            match c {
                '{' if depth == 0 => return (prelude, Terminator::OpenBrace),
                ';' if depth == 0 => return (prelude, Terminator::Semicolon),
                '}' if depth == 0 => return (prelude, Terminator::CloseBrace),
                '"' | '\'' => {
                    prelude.push(c);
                    prelude.push_str(&self.consume_string(c));
                    continue;
                }
                '\\' => {
                    prelude.push(c);
                    if let Some(escaped) = self.consume() {
                        prelude.push(escaped);
                    }
                    continue;
                }
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            prelude.push(c);
        }
        (prelude, Terminator::Eof)
    }

    /// Find the index of the `}` matching an already consumed `{`, along
    /// with the deepest block nesting seen inside it (1 for a flat block).
    fn find_block_end(&self) -> Option<(usize, usize)> {
        let mut depth = 1usize;
        let mut deepest = 1usize;
        let mut quote: Option<char> = None;
        let mut i = self.position;
        while let Some(&c) = self.input.get(i) {
            match c {
                '\\' => i += 1,
                _ if quote.is_some() => {
                    if quote == Some(c) {
                        quote = None;
                    }
                }
                '"' | '\'' => quote = Some(c),
                '{' => {
                    depth += 1;
                    deepest = deepest.max(depth);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((i, deepest));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Consume the rest of a string whose opening quote was consumed.
    fn consume_string(&mut self, quote: char) -> String {
        let mut text = String::new();
        while let Some(c) = self.consume() {
            text.push(c);
            if c == '\\' {
                if let Some(escaped) = self.consume() {
                    text.push(escaped);
                }
            } else if c == quote {
                break;
            }
        }
        text
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.input.get(self.position).copied();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }
}

/// Whether a block body holds rules rather than only declarations.
fn contains_block(body: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in body.chars() {
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
            '{' => return true,
            _ => {}
        }
    }
    false
}

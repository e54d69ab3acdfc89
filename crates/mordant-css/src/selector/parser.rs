//! [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
//!
//! Hand-written parser for a single complex selector (no comma lists).

use super::{
    AttributeOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    ParsedSelector, SelectorError, SimpleSelector,
};

/// Parse one selector branch into a [`ParsedSelector`].
///
/// Supports type, class, ID, universal and attribute selectors, compound
/// selectors, and the descendant, child, next-sibling and subsequent-sibling
/// combinators. Pseudo-classes and pseudo-elements parse as
/// [`SimpleSelector::NeverMatch`].
///
/// # Errors
///
/// Returns a [`SelectorError`] for empty input, dangling combinators,
/// unterminated brackets or characters outside the supported grammar.
pub fn parse_selector(raw: &str) -> Result<ParsedSelector, SelectorError> {
    let mut parser = SelectorParser {
        input: raw.trim().chars().collect(),
        position: 0,
    };
    parser.run()
}

struct SelectorParser {
    input: Vec<char>,
    position: usize,
}

impl SelectorParser {
    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    ///
    /// Compounds and combinators are collected left to right, then reversed so
    /// that the subject comes first for right-to-left matching.
    fn run(&mut self) -> Result<ParsedSelector, SelectorError> {
        if self.input.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut compounds = vec![self.consume_compound()?];
        let mut combinators_between = Vec::new();

        while let Some(combinator) = self.consume_combinator() {
            if self.peek().is_none() {
                return Err(SelectorError::DanglingCombinator);
            }
            combinators_between.push(combinator);
            compounds.push(self.consume_compound()?);
        }

        let Some(subject) = compounds.pop() else {
            return Err(SelectorError::Empty);
        };

        // For "A > B C": compounds [A, B], combinators [Child, Descendant]
        // become [(Descendant, B), (Child, A)].
        let combinators = combinators_between
            .into_iter()
            .zip(compounds)
            .rev()
            .collect();

        Ok(ParsedSelector {
            complex: ComplexSelector {
                subject,
                combinators,
            },
        })
    }

    /// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
    ///
    /// Whitespace alone is the descendant combinator; whitespace around
    /// `>`, `+` or `~` is insignificant.
    fn consume_combinator(&mut self) -> Option<Combinator> {
        let had_whitespace = self.skip_whitespace();
        let combinator = match self.peek()? {
            '>' => Combinator::Child,
            '+' => Combinator::NextSibling,
            '~' => Combinator::SubsequentSibling,
            _ if had_whitespace => return Some(Combinator::Descendant),
            _ => return None,
        };
        self.position += 1;
        let _ = self.skip_whitespace();
        Some(combinator)
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn consume_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut simple_selectors = Vec::new();

        while let Some(c) = self.peek() {
            let simple = match c {
                '.' => {
                    self.position += 1;
                    SimpleSelector::Class(self.consume_name('.')?)
                }
                '#' => {
                    self.position += 1;
                    SimpleSelector::Id(self.consume_name('#')?)
                }
                '*' => {
                    self.position += 1;
                    SimpleSelector::Universal
                }
                '[' => {
                    self.position += 1;
                    SimpleSelector::Attribute(self.consume_attribute()?)
                }
                ':' => {
                    self.position += 1;
                    self.consume_pseudo()?
                }
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => break,
                c if is_ident_start(c) || c == '\\' => {
                    if !simple_selectors.is_empty() {
                        // A type selector must come first in a compound.
                        return Err(self.unexpected(c));
                    }
                    SimpleSelector::Type(self.consume_ident())
                }
                c => return Err(self.unexpected(c)),
            };
            simple_selectors.push(simple);
        }

        if simple_selectors.is_empty() {
            return Err(match self.peek() {
                Some(_) => SelectorError::DanglingCombinator,
                None => SelectorError::Empty,
            });
        }
        Ok(CompoundSelector { simple_selectors })
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    fn consume_pseudo(&mut self) -> Result<SimpleSelector, SelectorError> {
        if self.peek() == Some(':') {
            self.position += 1;
        }
        let _ = self.consume_name(':')?;

        // Functional pseudo-classes (:nth-child(...), :not(...)) are skipped
        // as a balanced group.
        if self.peek() == Some('(') {
            self.position += 1;
            let mut depth = 1u32;
            while depth > 0 {
                match self.consume() {
                    Some('(') => depth += 1,
                    Some(')') => depth -= 1,
                    Some(_) => {}
                    None => return Err(SelectorError::Unterminated("pseudo-class argument")),
                }
            }
        }
        Ok(SimpleSelector::NeverMatch)
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    fn consume_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let _ = self.skip_whitespace();
        let name = self.consume_name('[')?;
        let _ = self.skip_whitespace();

        let operator = match self.consume() {
            Some(']') => return Ok(AttributeSelector { name, matcher: None }),
            Some('=') => AttributeOperator::Equals,
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.consume() != Some('=') {
                    return Err(SelectorError::Unterminated("attribute selector"));
                }
                match op {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            _ => return Err(SelectorError::Unterminated("attribute selector")),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                self.consume_string(quote)?
            }
            _ => self.consume_ident(),
        };

        // Case-sensitivity flags (`i`, `s`) are accepted and ignored.
        let _ = self.skip_whitespace();
        if self.peek().is_some_and(|c| c.eq_ignore_ascii_case(&'i') || c.eq_ignore_ascii_case(&'s')) {
            self.position += 1;
            let _ = self.skip_whitespace();
        }
        if self.consume() != Some(']') {
            return Err(SelectorError::Unterminated("attribute selector"));
        }

        Ok(AttributeSelector {
            name,
            matcher: Some((operator, value)),
        })
    }

    fn consume_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    if let Some(escaped) = self.consume() {
                        value.push(escaped);
                    }
                }
                Some(c) => value.push(c),
                None => return Err(SelectorError::Unterminated("string")),
            }
        }
    }

    /// Consume an identifier that must not be empty.
    fn consume_name(&mut self, after: char) -> Result<String, SelectorError> {
        let name = self.consume_ident();
        if name.is_empty() {
            Err(SelectorError::MissingName(after))
        } else {
            Ok(name)
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.position += 1;
                if let Some(escaped) = self.consume() {
                    ident.push(escaped);
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        ident
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
        self.position > start
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::UnexpectedChar {
            found,
            offset: self.position,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }
}

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

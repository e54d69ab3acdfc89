//! Selector specificity.
//!
//! [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
//!
//! Specificity is computed lexically from the selector text so that every
//! selector gets a value, including ones the matcher cannot parse. A fourth,
//! leading component ranks declarations that came from an element's own
//! `style` attribute above everything a stylesheet can produce.

use std::cmp::Ordering;
use std::fmt;

/// An ordered `(inline, id, class, element)` specificity vector.
///
/// Comparison is lexicographic, left to right. The derived `Ord` and `Hash`
/// are structural over the four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StyleSpecificity {
    /// Set for declarations that originate from a `style` attribute.
    pub inline: u32,
    /// "count the number of ID selectors in the selector (= A)"
    pub ids: u32,
    /// "count the number of class selectors, attributes selectors, and
    /// pseudo-classes in the selector (= B)"
    pub classes: u32,
    /// "count the number of type selectors and pseudo-elements in the
    /// selector (= C)"
    pub elements: u32,
}

impl StyleSpecificity {
    /// Specificity assigned to declarations already present in a `style` attribute.
    pub const INLINE: Self = Self::new(1, 0, 0, 0);

    /// Create a specificity from its four components.
    #[must_use]
    pub const fn new(inline: u32, ids: u32, classes: u32, elements: u32) -> Self {
        Self {
            inline,
            ids,
            classes,
            elements,
        }
    }

    /// Compare against a possibly absent specificity.
    ///
    /// A present specificity always ranks strictly above an absent one, so
    /// this never returns [`Ordering::Equal`] for `None`.
    #[must_use]
    pub fn compare_to(&self, other: Option<&Self>) -> Ordering {
        other.map_or(Ordering::Greater, |other| self.cmp(other))
    }

    fn add(&mut self, other: Self) {
        self.inline += other.inline;
        self.ids += other.ids;
        self.classes += other.classes;
        self.elements += other.elements;
    }
}

impl fmt::Display for StyleSpecificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.inline, self.ids, self.classes, self.elements
        )
    }
}

/// Pseudo-elements that may be written with a single colon for CSS2 compatibility.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// Compute the specificity of one selector branch (not a comma group).
///
/// The inline component is always 0 for stylesheet selectors. `*` and
/// combinators contribute nothing. `:is()`, `:not()` and `:has()` take the
/// specificity of their most specific argument and `:where()` contributes 0.
#[must_use]
pub fn specificity_of(selector: &str) -> StyleSpecificity {
    let chars: Vec<char> = selector.chars().collect();
    let mut counter = Counter {
        input: &chars,
        position: 0,
        specificity: StyleSpecificity::default(),
    };
    counter.run();
    counter.specificity
}

struct Counter<'a> {
    input: &'a [char],
    position: usize,
    specificity: StyleSpecificity,
}

impl Counter<'_> {
    fn run(&mut self) {
        while let Some(c) = self.consume() {
            match c {
                '#' => {
                    if !self.consume_ident().is_empty() {
                        self.specificity.ids += 1;
                    }
                }
                '.' => {
                    if !self.consume_ident().is_empty() {
                        self.specificity.classes += 1;
                    }
                }
                '[' => {
                    self.skip_until(']');
                    self.specificity.classes += 1;
                }
                ':' => self.consume_pseudo(),
                '"' | '\'' => self.skip_until(c),
                '\\' => {
                    // An escaped first character still starts a type selector.
                    let _ = self.consume();
                    let _ = self.consume_ident();
                    self.specificity.elements += 1;
                }
                c if is_ident_start(c) => {
                    let _ = self.consume_ident();
                    self.specificity.elements += 1;
                }
                _ => {}
            }
        }
    }

    fn consume_pseudo(&mut self) {
        let is_element = self.peek() == Some(':');
        if is_element {
            let _ = self.consume();
        }
        let name = self.consume_ident().to_ascii_lowercase();
        let argument = if self.peek() == Some('(') {
            let _ = self.consume();
            Some(self.consume_parenthesized())
        } else {
            None
        };

        if is_element || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
            self.specificity.elements += 1;
            return;
        }

        match (name.as_str(), argument) {
            ("where", _) => {}
            ("is" | "not" | "has" | "matches" | "any", Some(argument)) => {
                let most_specific = crate::declaration::split_top_level(&argument, ',')
                    .into_iter()
                    .map(specificity_of)
                    .max()
                    .unwrap_or_default();
                self.specificity.add(most_specific);
            }
            _ => self.specificity.classes += 1,
        }
    }

    fn consume_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                let _ = self.consume();
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

    /// Consume up to the matching `)` and return the text in between.
    fn consume_parenthesized(&mut self) -> String {
        let mut depth = 1u32;
        let mut text = String::new();
        while let Some(c) = self.consume() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            text.push(c);
        }
        text
    }

    fn skip_until(&mut self, end: char) {
        while let Some(c) = self.consume() {
            if c == end {
                break;
            }
            if c == '"' || c == '\'' {
                self.skip_until(c);
            }
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

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_class_counts_once() {
        assert_eq!(specificity_of(".a\\:b"), StyleSpecificity::new(0, 0, 1, 0));
    }

    #[test]
    fn attribute_value_with_brackets_is_one_attribute() {
        assert_eq!(
            specificity_of("a[title=\"x]y\"]"),
            StyleSpecificity::new(0, 0, 1, 1)
        );
    }
}

//! Declaration blocks and the text helpers shared by the tokenizer.
//!
//! [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
//!
//! Declarations are split on top-level `;` (not inside parentheses or
//! strings, so `url(data:image/png;base64,...)` survives), then on the first
//! `:`. Both a `style` attribute and a rule body go through the same path.

use crate::specificity::StyleSpecificity;

/// One CSS declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleProperty {
    /// Property name as written (case is preserved).
    pub name: String,
    /// Value with `!important` removed and whitespace collapsed.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
    /// The declaration text as written, whitespace collapsed.
    pub full_property: String,
    /// Specificity of the rule the declaration belongs to, once known.
    pub specificity: Option<StyleSpecificity>,
}

impl StyleProperty {
    /// Parse a single `name: value` declaration.
    ///
    /// Returns `None` for text without a `:` or with an empty name.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let full_property = normalize_whitespace(text);
        let (name, value) = full_property.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let (value, important) = trim_important(value.trim());
        Some(Self {
            name: name.to_string(),
            value: value.to_string(),
            important,
            full_property,
            specificity: None,
        })
    }

    /// Attach the owning rule's specificity.
    #[must_use]
    pub const fn with_specificity(mut self, specificity: StyleSpecificity) -> Self {
        self.specificity = Some(specificity);
        self
    }

    /// Whether two declarations set the same property (ASCII case-insensitive).
    #[must_use]
    pub fn same_property(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }

    /// Canonical `name: value` text, with ` !important` when flagged.
    #[must_use]
    pub fn to_css(&self) -> String {
        if self.important {
            format!("{}: {} !important", self.name, self.value)
        } else {
            format!("{}: {}", self.name, self.value)
        }
    }
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// Strip a trailing `!important` (ASCII case-insensitive, optional
/// whitespace around the `!`) and report whether it was present.
fn trim_important(value: &str) -> (&str, bool) {
    // STEP 1: Check for the "important" keyword at the end
    let trimmed = value.trim_end();
    let Some(split) = trimmed.len().checked_sub("important".len()) else {
        return (trimmed, false);
    };
    if !trimmed.is_char_boundary(split) || !trimmed[split..].eq_ignore_ascii_case("important") {
        return (trimmed, false);
    }

    // STEP 2: Skip whitespace between ! and important, then require !
    let before = trimmed[..split].trim_end();
    match before.strip_suffix('!') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

/// Parse a declaration block (rule body or `style` attribute) into properties.
///
/// A trailing declaration without `;` parses the same as one with it.
/// Comments are removed first; fragments without a `:` are dropped.
#[must_use]
pub fn parse_declarations(block: &str) -> Vec<StyleProperty> {
    let block = strip_comments(block);
    split_top_level(&block, ';')
        .into_iter()
        .filter(|d| !d.trim().is_empty())
        .filter_map(|d| {
            let parsed = StyleProperty::parse(d);
            if parsed.is_none() {
                tracing::debug!(declaration = d.trim(), "dropping declaration without a name");
            }
            parsed
        })
        .collect()
}

/// Render declarations as `name: value;` pairs separated by a space.
#[must_use]
pub fn serialize_declarations(properties: &[StyleProperty]) -> String {
    properties
        .iter()
        .map(|p| format!("{};", p.to_css()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse every run of whitespace to one space and trim both ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
///
/// Remove `/* ... */` comments that are not inside a string. An unterminated
/// comment runs to the end of the input, as in the CSS tokenizer.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                output.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        output.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '/' && chars.peek() == Some(&'*') => {
                let _ = chars.next();
                let mut previous = '\0';
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
                // A comment separates tokens like whitespace does.
                output.push(' ');
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                output.push(c);
            }
        }
    }
    output
}

/// Split `text` on `separator` where it is not nested inside `()`/`[]` or a string.
#[must_use]
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
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
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn important_is_case_insensitive_and_spaced() {
        assert_eq!(trim_important("red ! IMPORTANT"), ("red", true));
        assert_eq!(trim_important("red!important"), ("red", true));
        assert_eq!(trim_important("important"), ("important", false));
        assert_eq!(trim_important("red"), ("red", false));
    }

    #[test]
    fn split_ignores_nested_separators() {
        assert_eq!(
            split_top_level("a:is(b, c), d[title=\"x,y\"], e", ','),
            vec!["a:is(b, c)", " d[title=\"x,y\"]", " e"]
        );
    }

    #[test]
    fn comments_inside_strings_are_kept() {
        assert_eq!(
            strip_comments("a { content: \"/* no */\"; } /* yes */"),
            "a { content: \"/* no */\"; }  "
        );
    }
}

//! Copying resolved CSS values onto HTML attributes.
//!
//! Some mail clients ignore CSS sizing on images and tables, so values such
//! as `width: 600px` are mirrored into presentational attributes
//! (`width="600"`). The pass reads the final `style` attribute, so it must
//! run after the merge.

use regex::{Regex, RegexBuilder};

use mordant_css::parse_declarations;

use crate::config::AttributeRule;
use crate::document::DomQueryable;
use crate::error::InlinerError;

/// An [`AttributeRule`] with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledAttributeRule {
    element_type: String,
    property: Regex,
    output: Regex,
    attribute: String,
    override_existing: bool,
}

impl CompiledAttributeRule {
    /// Compile a rule. The property pattern is anchored to the whole
    /// property name and matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::Config`] for a rule with blank fields or an
    /// invalid pattern.
    pub fn compile(rule: &AttributeRule) -> Result<Self, InlinerError> {
        if !rule.is_valid() {
            return Err(InlinerError::Config(format!(
                "attribute rule for `{}` has empty fields",
                rule.element_type
            )));
        }
        let property = RegexBuilder::new(&format!("^(?:{})$", rule.css_property_regex))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            element_type: rule.element_type.trim().to_string(),
            property,
            output: Regex::new(&rule.css_property_output_regex)?,
            attribute: rule.html_attribute_name.trim().to_string(),
            override_existing: rule.override_if_already_existing,
        })
    }

    /// The attribute value this rule derives from a `style` attribute.
    ///
    /// The last declaration whose name matches is used, since that is the
    /// one a renderer applies.
    #[must_use]
    pub fn value_from_style(&self, style: &str) -> Option<String> {
        let declarations = parse_declarations(style);
        let declaration = declarations
            .iter()
            .rev()
            .find(|p| self.property.is_match(&p.name))?;
        self.extract(&declaration.value)
    }

    fn extract(&self, value: &str) -> Option<String> {
        let captures = self.output.captures(value)?;
        let matched = captures
            .iter()
            .skip(1)
            .flatten()
            .next()
            .or_else(|| captures.get(0))?;
        Some(matched.as_str().to_string()).filter(|v| !v.is_empty())
    }

    /// Apply the rule to every element of its type. Returns the number of
    /// attributes written.
    pub fn apply<D: DomQueryable>(&self, document: &mut D) -> usize {
        let elements = match document.select(&self.element_type) {
            Ok(elements) => elements,
            Err(err) => {
                tracing::warn!(element = %self.element_type, error = %err, "attribute rule element type is not a selector");
                return 0;
            }
        };

        let mut written = 0;
        for element in elements {
            let Some(value) = document
                .attribute(element, "style")
                .and_then(|style| self.value_from_style(style))
            else {
                continue;
            };
            let has_value = document
                .attribute(element, &self.attribute)
                .is_some_and(|v| !v.trim().is_empty());
            if has_value && !self.override_existing {
                continue;
            }
            document.set_attribute(element, &self.attribute, &value);
            written += 1;
        }
        written
    }
}

/// Compile the usable rules of a configuration. Rules with blank fields
/// are skipped with a warning.
///
/// # Errors
///
/// Returns [`InlinerError::Config`] if a pattern does not compile.
pub fn compile_rules(rules: &[AttributeRule]) -> Result<Vec<CompiledAttributeRule>, InlinerError> {
    rules
        .iter()
        .filter(|rule| {
            let valid = rule.is_valid();
            if !valid {
                tracing::warn!(element = %rule.element_type, "skipping attribute rule with empty fields");
            }
            valid
        })
        .map(CompiledAttributeRule::compile)
        .collect()
}

/// Run every rule over the document, in order.
pub fn apply_attribute_rules<D: DomQueryable>(document: &mut D, rules: &[CompiledAttributeRule]) -> usize {
    let written: usize = rules.iter().map(|rule| rule.apply(document)).sum();
    tracing::debug!(rules = rules.len(), written, "applied attribute rules");
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width_rule() -> CompiledAttributeRule {
        CompiledAttributeRule::compile(&AttributeRule::image_width()).unwrap()
    }

    #[test]
    fn test_default_rule_values() {
        let rule = width_rule();
        assert_eq!(rule.value_from_style("width: 2500px;"), Some("2500".to_string()));
        assert_eq!(rule.value_from_style("WIDTH: 40PX"), Some("40".to_string()));
        assert_eq!(rule.value_from_style("width: 100%"), Some("100%".to_string()));
        assert_eq!(rule.value_from_style("width: auto"), None);
        assert_eq!(rule.value_from_style("max-width: 300px"), None);
    }

    #[test]
    fn test_last_matching_declaration_wins() {
        let rule = width_rule();
        assert_eq!(
            rule.value_from_style("width: 10px; width: 20px"),
            Some("20".to_string())
        );
    }

    #[test]
    fn test_output_without_groups_uses_whole_match() {
        let rule = CompiledAttributeRule::compile(&AttributeRule {
            element_type: "td".to_string(),
            css_property_regex: "background(-color)?".to_string(),
            css_property_output_regex: "#[0-9a-fA-F]{3,6}".to_string(),
            html_attribute_name: "bgcolor".to_string(),
            override_if_already_existing: false,
        })
        .unwrap();
        assert_eq!(
            rule.value_from_style("background: #ffcc00 url(x.png)"),
            Some("#ffcc00".to_string())
        );
    }

    #[test]
    fn test_invalid_rules() {
        let mut rule = AttributeRule::image_width();
        rule.css_property_output_regex = "([0-9]+".to_string();
        assert!(matches!(
            CompiledAttributeRule::compile(&rule),
            Err(InlinerError::Config(_))
        ));

        rule.html_attribute_name = " ".to_string();
        assert_eq!(compile_rules(&[rule]).unwrap().len(), 0);
    }
}

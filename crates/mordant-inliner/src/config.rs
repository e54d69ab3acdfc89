//! Engine configuration.
//!
//! Everything is deserializable from JSON with camelCase keys, and every
//! field has a default, so `{}` is a complete configuration.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::InlinerError;

/// How conflicting declarations for one element are resolved.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum MergePolicy {
    /// One declaration per property. `!important` beats normal, then the
    /// higher specificity wins, then the later declaration.
    #[default]
    ProcessSpecificity,
    /// One declaration per property. `!important` beats normal, otherwise
    /// the later declaration wins.
    IgnoreSpecificity,
    /// Every matched declaration is appended in order, duplicates included.
    AlwaysAppend,
}

impl MergePolicy {
    /// The accepted policy names, in declaration order.
    #[must_use]
    pub fn names() -> Vec<String> {
        Self::iter().map(|policy| policy.to_string()).collect()
    }
}

/// Maps a CSS property found in an element's final `style` attribute onto
/// an HTML attribute, e.g. `width: 600px` on an `<img>` to `width="600"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRule {
    /// Tag name of the elements the rule applies to.
    #[serde(default)]
    pub element_type: String,
    /// Pattern that must match the whole property name.
    #[serde(rename = "cssPropertyRegEx", default)]
    pub css_property_regex: String,
    /// Pattern applied to the property value. The first participating
    /// capture group is written, or the whole match if there are none.
    #[serde(rename = "cssPropertyOutputRegEx", default)]
    pub css_property_output_regex: String,
    /// Name of the HTML attribute to write.
    #[serde(default)]
    pub html_attribute_name: String,
    /// Replace an attribute that already has a value.
    #[serde(default)]
    pub override_if_already_existing: bool,
}

impl AttributeRule {
    /// The built-in rule: `img` `width` in pixels or percent becomes the
    /// `width` attribute.
    #[must_use]
    pub fn image_width() -> Self {
        Self {
            element_type: "img".to_string(),
            css_property_regex: "width".to_string(),
            css_property_output_regex: "([0-9]+)(?:px|PX)|([0-9]+%)".to_string(),
            html_attribute_name: "width".to_string(),
            override_if_already_existing: true,
        }
    }

    /// A rule is usable only when none of its text fields is blank.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            &self.element_type,
            &self.css_property_regex,
            &self.css_property_output_regex,
            &self.html_attribute_name,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// Parse one JSON-encoded rule.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::Json`] if the text is not a rule object.
    pub fn parse(text: &str) -> Result<Self, InlinerError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a list of JSON-encoded rules, skipping entries that do not
    /// parse or are not valid.
    pub fn parse_all<I, S>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref();
                match Self::parse(entry) {
                    Ok(rule) if rule.is_valid() => Some(rule),
                    Ok(_) => {
                        tracing::warn!(rule = entry, "skipping attribute rule with empty fields");
                        None
                    }
                    Err(err) => {
                        tracing::warn!(rule = entry, error = %err, "skipping unparseable attribute rule");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Complete configuration of a [`crate::StylesInliner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlinerConfig {
    /// Conflict resolution for inlined declarations.
    pub policy: MergePolicy,
    /// Attribute rules applied after merging.
    pub attribute_rules: Vec<AttributeRule>,
    /// Regexes marking selectors that must stay in the stylesheet,
    /// e.g. `\.ExternalClass\b`.
    pub preserve_selectors: Vec<String>,
    /// Classes of wrapper `<div>`s replaced by their children.
    pub wrapper_classes: Vec<String>,
    /// Remove `<script>` elements and `on*` attributes.
    pub sanitize: bool,
    /// Replace `"` with `'` in inlined values.
    pub normalize_quotes: bool,
}

impl Default for InlinerConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::default(),
            attribute_rules: vec![AttributeRule::image_width()],
            preserve_selectors: Vec::new(),
            wrapper_classes: Vec::new(),
            sanitize: false,
            normalize_quotes: true,
        }
    }
}

impl InlinerConfig {
    /// Read a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`InlinerError::Json`] for malformed JSON or mistyped fields.
    pub fn from_json(text: &str) -> Result<Self, InlinerError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Replace the merge policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the attribute rules.
    #[must_use]
    pub fn with_attribute_rules(mut self, rules: Vec<AttributeRule>) -> Self {
        self.attribute_rules = rules;
        self
    }
}

//! Single-field validation and payload rule sets.

use std::collections::BTreeMap;
use crate::rule::{patterns, FieldRules, FieldValue, FieldValues, ValidationMessages};

/// Validate one value against its rules.
///
/// Returns the first failing check's message. Pure: the same arguments always
/// give the same answer.
pub fn validate_field(
    value: &FieldValue,
    rules: &FieldRules,
    messages: &ValidationMessages,
) -> Option<String> {
    validate_field_with(value, rules, messages, &FieldValues::new())
}

/// Like [`validate_field`], handing `all_values` to the custom predicate.
pub fn validate_field_with(
    value: &FieldValue,
    rules: &FieldRules,
    messages: &ValidationMessages,
    all_values: &FieldValues,
) -> Option<String> {
    if value.is_empty() {
        return rules.required.then(|| messages.required());
    }

    let text = value.as_text();
    let length = text.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            return Some(messages.min_length(min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Some(messages.max_length(max));
        }
    }

    if let Some(min) = rules.min {
        if value.as_number().is_some_and(|n| n < min) {
            return Some(messages.min(min));
        }
    }
    if let Some(max) = rules.max {
        if value.as_number().is_some_and(|n| n > max) {
            return Some(messages.max(max));
        }
    }

    if let Some(re) = &rules.pattern {
        if !re.is_match(&text) {
            return Some(messages.pattern());
        }
    }

    if rules.email && !patterns::email().is_match(&text) {
        return Some(messages.email());
    }
    if rules.phone {
        let digits: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
            .collect();
        if !patterns::phone().is_match(&digits) {
            return Some(messages.phone());
        }
    }
    if rules.url && !patterns::url().is_match(&text) {
        return Some(messages.url());
    }

    rules.custom.as_ref().and_then(|custom| custom(value, all_values))
}

/// Rules for every field of a payload.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, FieldRules, ValidationMessages)>,
}

impl RuleSet {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field with default messages.
    pub fn field(self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.field_with_messages(name, rules, ValidationMessages::default())
    }

    /// Add a field with message overrides.
    pub fn field_with_messages(
        mut self,
        name: impl Into<String>,
        rules: FieldRules,
        messages: ValidationMessages,
    ) -> Self {
        self.fields.push((name.into(), rules, messages));
        self
    }

    /// Field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _, _)| name.as_str())
    }

    /// Every field with its rules and messages, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldRules, &ValidationMessages)> {
        self.fields
            .iter()
            .map(|(name, rules, messages)| (name.as_str(), rules, messages))
    }

    /// Validate a payload. Missing fields are treated as null. Returns field
    /// name -> message for every failing field.
    pub fn validate(&self, values: &FieldValues) -> BTreeMap<String, String> {
        let null = FieldValue::Null;
        self.fields
            .iter()
            .filter_map(|(name, rules, messages)| {
                let value = values.get(name).unwrap_or(&null);
                validate_field_with(value, rules, messages, values).map(|error| (name.clone(), error))
            })
            .collect()
    }
}

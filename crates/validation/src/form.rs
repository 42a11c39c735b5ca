//! Form-level validation state.
//!
//! Tracks value, error, touched and dirty flags per field. Errors are always
//! computed, but only *shown* for touched fields: [`FormValidation::is_valid`]
//! can be false while [`FormValidation::visible_errors`] is empty.

use std::collections::BTreeMap;
use crate::field::validate_field_with;
use crate::rule::{FieldRules, FieldValue, FieldValues, ValidationMessages};

/// Errors from form operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The form has no field by that name
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Configuration of one form field.
#[derive(Debug, Clone, Default)]
pub struct FieldConfig {
    /// Validation rules
    pub rules: FieldRules,
    /// Message overrides
    pub messages: ValidationMessages,
    /// Value restored by `reset`
    pub initial_value: FieldValue,
}

impl FieldConfig {
    /// Field with rules, default messages and an empty initial value.
    pub fn new(rules: FieldRules) -> Self {
        Self {
            rules,
            messages: ValidationMessages::default(),
            initial_value: FieldValue::Text(String::new()),
        }
    }

    /// Override messages.
    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Set the initial value.
    pub fn with_initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = value.into();
        self
    }
}

/// Field name -> configuration.
pub type FormConfig = BTreeMap<String, FieldConfig>;

/// Live state of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    /// Current value
    pub value: FieldValue,
    /// Current error, shown or not
    pub error: Option<String>,
    /// The user has interacted with the field
    pub touched: bool,
    /// Value differs from the initial value
    pub dirty: bool,
}

impl FieldState {
    fn pristine(value: FieldValue) -> Self {
        Self {
            value,
            error: None,
            touched: false,
            dirty: false,
        }
    }
}

/// Validation state for a whole form.
#[derive(Debug, Clone)]
pub struct FormValidation {
    config: FormConfig,
    fields: BTreeMap<String, FieldState>,
}

impl FormValidation {
    /// Build a form with every field at its initial value.
    pub fn new(config: FormConfig) -> Self {
        let fields = config
            .iter()
            .map(|(name, cfg)| (name.clone(), FieldState::pristine(cfg.initial_value.clone())))
            .collect();
        Self { config, fields }
    }

    /// Set a value. With `validate`, the field's error and dirty flag are
    /// recomputed, along with the errors of fields that depend on it.
    pub fn set_field_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
        validate: bool,
    ) -> Result<(), FormError> {
        let value = value.into();
        let state = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        state.value = value;

        if validate {
            self.revalidate(name);
            for dependent in self.dependents_of(name) {
                self.recompute_error(&dependent);
            }
        }
        Ok(())
    }

    /// Set several values at once.
    pub fn set_values(&mut self, values: FieldValues, validate: bool) -> Result<(), FormError> {
        if let Some(unknown) = values.keys().find(|name| !self.fields.contains_key(*name)) {
            return Err(FormError::UnknownField(unknown.clone()));
        }
        for (name, value) in values {
            self.set_field_value(&name, value, validate)?;
        }
        Ok(())
    }

    /// Mark a field as interacted with (or not).
    pub fn set_field_touched(&mut self, name: &str, touched: bool) -> Result<(), FormError> {
        let state = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        state.touched = touched;
        Ok(())
    }

    /// Touch every field and recompute every error. Returns overall validity.
    pub fn validate_all(&mut self) -> bool {
        let values = self.values();
        for (name, state) in self.fields.iter_mut() {
            if let Some(cfg) = self.config.get(name) {
                state.error = validate_field_with(&state.value, &cfg.rules, &cfg.messages, &values);
            }
            state.touched = true;
        }
        self.is_valid()
    }

    /// Restore initial values; clear touched, dirty and errors.
    pub fn reset(&mut self) {
        for (name, state) in self.fields.iter_mut() {
            let initial = self
                .config
                .get(name)
                .map(|cfg| cfg.initial_value.clone())
                .unwrap_or_default();
            *state = FieldState::pristine(initial);
        }
    }

    /// Validate everything, then hand the values to `on_submit` if valid.
    /// Returns `Ok(None)` without calling it when the form is invalid.
    pub fn submit<T, E>(
        &mut self,
        on_submit: impl FnOnce(&FieldValues) -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        if !self.validate_all() {
            return Ok(None);
        }
        on_submit(&self.values()).map(Some)
    }

    /// State of one field.
    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    /// Current value of every field.
    pub fn values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|(name, state)| (name.clone(), state.value.clone()))
            .collect()
    }

    /// Every current error, shown or not.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, state)| state.error.clone().map(|e| (name.clone(), e)))
            .collect()
    }

    /// Error of a field, only if the field has been touched.
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .filter(|state| state.touched)
            .and_then(|state| state.error.as_deref())
    }

    /// Errors of touched fields.
    pub fn visible_errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(_, state)| state.touched)
            .filter_map(|(name, state)| state.error.clone().map(|e| (name.clone(), e)))
            .collect()
    }

    /// Any field holds an error.
    pub fn has_error(&self) -> bool {
        self.fields.values().any(|state| state.error.is_some())
    }

    /// Any field differs from its initial value.
    pub fn is_dirty(&self) -> bool {
        self.fields.values().any(|state| state.dirty)
    }

    /// No field holds an error, touched or not.
    pub fn is_valid(&self) -> bool {
        !self.has_error()
    }

    fn revalidate(&mut self, name: &str) {
        self.recompute_error(name);
        let initial = self.config.get(name).map(|cfg| &cfg.initial_value);
        if let Some(state) = self.fields.get_mut(name) {
            state.dirty = Some(&state.value) != initial;
        }
    }

    fn recompute_error(&mut self, name: &str) {
        let values = self.values();
        let Some(cfg) = self.config.get(name) else {
            return;
        };
        if let Some(state) = self.fields.get_mut(name) {
            state.error = validate_field_with(&state.value, &cfg.rules, &cfg.messages, &values);
        }
    }

    fn dependents_of(&self, name: &str) -> Vec<String> {
        self.config
            .iter()
            .filter(|(field, cfg)| field.as_str() != name && cfg.rules.dependencies.iter().any(|d| d == name))
            .map(|(field, _)| field.clone())
            .collect()
    }
}

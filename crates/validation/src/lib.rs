//! Field validation (Layer 1)
//!
//! Declarative per-field rules, a pure single-field validator, rule sets for
//! whole payloads, and the form-level state engine used while operators edit
//! tasks.

#![warn(missing_docs)]

pub mod rule;
pub mod field;
pub mod form;

pub use rule::{FieldRules, FieldValue, FieldValues, ValidationMessages, CustomRule, patterns};
pub use field::{validate_field, validate_field_with, RuleSet};
pub use form::{FormValidation, FormConfig, FieldConfig, FieldState, FormError};

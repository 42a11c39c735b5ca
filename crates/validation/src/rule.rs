//! Rule and value types.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A form or payload value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Text
    Text(String),
}

/// Field name -> value.
pub type FieldValues = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Null or the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for length and pattern checks.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Numeric reading used for range checks. Text that does not parse has no
    /// numeric reading and skips range checks.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) if n.is_nan() => None,
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<u8> for FieldValue {
    fn from(n: u8) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Render a number without a trailing `.0` when it is integral.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Custom predicate: receives the field value and every value of the form or
/// payload, returns an error message or `None`.
pub type CustomRule = Arc<dyn Fn(&FieldValue, &FieldValues) -> Option<String> + Send + Sync>;

/// Declarative rules for one field.
#[derive(Clone, Default)]
pub struct FieldRules {
    /// Value must be present
    pub required: bool,
    /// Minimum text length (characters)
    pub min_length: Option<usize>,
    /// Maximum text length (characters)
    pub max_length: Option<usize>,
    /// Minimum numeric value
    pub min: Option<f64>,
    /// Maximum numeric value
    pub max: Option<f64>,
    /// Pattern the text must match
    pub pattern: Option<Regex>,
    /// Must look like an email address
    pub email: bool,
    /// Must look like a phone number
    pub phone: bool,
    /// Must look like an http(s) URL
    pub url: bool,
    /// Custom predicate, evaluated last
    pub custom: Option<CustomRule>,
    /// Fields whose changes re-validate this one
    pub dependencies: Vec<String>,
}

impl FieldRules {
    /// No rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Minimum length.
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Maximum length.
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Minimum numeric value.
    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    /// Maximum numeric value.
    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    /// Pattern to match.
    pub fn pattern(mut self, re: Regex) -> Self {
        self.pattern = Some(re);
        self
    }

    /// Pattern to match, compiled from source.
    pub fn try_pattern(self, source: &str) -> Result<Self, regex::Error> {
        Ok(self.pattern(Regex::new(source)?))
    }

    /// Email address check.
    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    /// Phone number check.
    pub fn phone(mut self) -> Self {
        self.phone = true;
        self
    }

    /// URL check.
    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    /// Custom predicate.
    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue, &FieldValues) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(f));
        self
    }

    /// Re-validate this field when `field` changes.
    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.dependencies.push(field.into());
        self
    }
}

impl std::fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern.as_ref().map(|re| re.as_str()))
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("url", &self.url)
            .field("custom", &self.custom.is_some())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Message overrides. Unset entries fall back to the defaults; `{min}` and
/// `{max}` are substituted with the rule's bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessages {
    /// Missing required value
    pub required: Option<String>,
    /// Too short (`{min}`)
    pub min_length: Option<String>,
    /// Too long (`{max}`)
    pub max_length: Option<String>,
    /// Below the minimum (`{min}`)
    pub min: Option<String>,
    /// Above the maximum (`{max}`)
    pub max: Option<String>,
    /// Pattern mismatch
    pub pattern: Option<String>,
    /// Bad email
    pub email: Option<String>,
    /// Bad phone number
    pub phone: Option<String>,
    /// Bad URL
    pub url: Option<String>,
}

impl ValidationMessages {
    pub(crate) fn required(&self) -> String {
        pick(&self.required, "This field is required")
    }

    pub(crate) fn min_length(&self, n: usize) -> String {
        pick(&self.min_length, "Must be at least {min} characters").replacen("{min}", &n.to_string(), 1)
    }

    pub(crate) fn max_length(&self, n: usize) -> String {
        pick(&self.max_length, "Must be no more than {max} characters").replacen("{max}", &n.to_string(), 1)
    }

    pub(crate) fn min(&self, n: f64) -> String {
        pick(&self.min, "Must be at least {min}").replacen("{min}", &format_number(n), 1)
    }

    pub(crate) fn max(&self, n: f64) -> String {
        pick(&self.max, "Must be no more than {max}").replacen("{max}", &format_number(n), 1)
    }

    pub(crate) fn pattern(&self) -> String {
        pick(&self.pattern, "Invalid format")
    }

    pub(crate) fn email(&self) -> String {
        pick(&self.email, "Please enter a valid email address")
    }

    pub(crate) fn phone(&self) -> String {
        pick(&self.phone, "Please enter a valid phone number")
    }

    pub(crate) fn url(&self) -> String {
        pick(&self.url, "Please enter a valid URL")
    }
}

fn pick(custom: &Option<String>, default: &str) -> String {
    custom.clone().unwrap_or_else(|| default.to_string())
}

/// Built-in patterns.
pub mod patterns {
    use regex::Regex;
    use std::sync::OnceLock;

    fn compiled(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
        cell.get_or_init(|| Regex::new(source).expect("built-in pattern compiles"))
    }

    /// `local@domain.tld`
    pub fn email() -> &'static Regex {
        static CELL: OnceLock<Regex> = OnceLock::new();
        compiled(&CELL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
    }

    /// Optional `+`, then up to 16 digits not starting with 0. Spaces, dashes
    /// and parentheses are stripped before matching.
    pub fn phone() -> &'static Regex {
        static CELL: OnceLock<Regex> = OnceLock::new();
        compiled(&CELL, r"^\+?[1-9]\d{0,15}$")
    }

    /// `http(s)://host.tld...`
    pub fn url() -> &'static Regex {
        static CELL: OnceLock<Regex> = OnceLock::new();
        compiled(&CELL, r"^https?://.+\..+")
    }

    /// Room numbers such as `204`, `B-12`.
    pub fn room_number() -> &'static Regex {
        static CELL: OnceLock<Regex> = OnceLock::new();
        compiled(&CELL, r"^[A-Za-z0-9-]{1,10}$")
    }
}

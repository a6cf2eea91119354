//! Field-level validation of bound models.
//!
//! Rules never reject a request. They are evaluated after binding and their
//! failures are recorded for the handler to inspect.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::action::FieldMeta;

type CustomCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A validation rule attached to one model field.
///
/// Only [`ValidationRule::Required`] fails on a missing (`null`) value; the
/// other rules accept it.
#[derive(Clone)]
pub enum ValidationRule {
    /// Value must be present and, for text, not blank
    Required,
    /// Character count of a text value
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Inclusive numeric bounds
    Range { min: Option<f64>, max: Option<f64> },
    /// Text must match the expression
    Pattern(Regex),
    /// Application-defined predicate
    Custom { name: &'static str, check: CustomCheck },
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Required => f.write_str("Required"),
            ValidationRule::Length { min, max } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .finish(),
            ValidationRule::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            ValidationRule::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            ValidationRule::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

impl ValidationRule {
    #[must_use]
    pub fn length(min: usize, max: usize) -> Self {
        ValidationRule::Length {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn min_length(min: usize) -> Self {
        ValidationRule::Length {
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub fn range(min: f64, max: f64) -> Self {
        ValidationRule::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    /// # Errors
    ///
    /// Returns the regex compilation error for an invalid expression.
    pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
        Regex::new(expr).map(ValidationRule::Pattern)
    }

    pub fn custom<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        ValidationRule::Custom {
            name,
            check: Arc::new(check),
        }
    }

    /// Short rule identifier used in [`ValidationIssue::rule`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::Required => "required",
            ValidationRule::Length { .. } => "length",
            ValidationRule::Range { .. } => "range",
            ValidationRule::Pattern(_) => "pattern",
            ValidationRule::Custom { name, .. } => *name,
        }
    }

    /// Evaluate the rule, returning a message on failure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            ValidationRule::Required => match value {
                Value::Null => Err("value is required".to_string()),
                Value::String(s) if s.trim().is_empty() => Err("value is required".to_string()),
                _ => Ok(()),
            },
            _ if value.is_null() => Ok(()),
            ValidationRule::Length { min, max } => {
                let len = text_of(value).chars().count();
                if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
                    Err(format!(
                        "length {len} is outside {}..={}",
                        bound(*min),
                        bound(*max)
                    ))
                } else {
                    Ok(())
                }
            }
            ValidationRule::Range { min, max } => {
                let n = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| "value is not a number".to_string())?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    Err(format!("{n} is outside {}..={}", bound(*min), bound(*max)))
                } else {
                    Ok(())
                }
            }
            ValidationRule::Pattern(re) => {
                if re.is_match(&text_of(value)) {
                    Ok(())
                } else {
                    Err(format!("value does not match {}", re.as_str()))
                }
            }
            ValidationRule::Custom { name, check } => {
                if check(value) {
                    Ok(())
                } else {
                    Err(format!("{name} check failed"))
                }
            }
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bound<T: fmt::Display>(b: Option<T>) -> String {
    b.map(|v| v.to_string()).unwrap_or_default()
}

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Evaluate every rule of every field against the bound values.
#[must_use]
pub fn validate_fields(fields: &[FieldMeta], values: &Map<String, Value>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for field in fields {
        let value = values.get(field.name()).unwrap_or(&Value::Null);
        for rule in field.rules() {
            if let Err(message) = rule.check(value) {
                issues.push(ValidationIssue::new(field.name(), rule.kind(), message));
            }
        }
    }
    issues
}

/// Validation outcome of every model bound for the current exchange.
///
/// Valid when no issue has been recorded, which is vacuously the case for
/// actions without models or rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelState {
    issues: Vec<ValidationIssue>,
}

impl ModelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend<I: IntoIterator<Item = ValidationIssue>>(&mut self, issues: I) {
        self.issues.extend(issues);
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn issues_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ScalarType;
    use serde_json::json;

    #[test]
    fn test_required() {
        let r = ValidationRule::Required;
        assert!(r.check(&Value::Null).is_err());
        assert!(r.check(&json!("   ")).is_err());
        assert!(r.check(&json!("x")).is_ok());
        assert!(r.check(&json!(0)).is_ok());
    }

    #[test]
    fn test_optional_rules_accept_null() {
        assert!(ValidationRule::length(3, 5).check(&Value::Null).is_ok());
        assert!(ValidationRule::range(1.0, 2.0).check(&Value::Null).is_ok());
    }

    #[test]
    fn test_length_counts_chars() {
        let r = ValidationRule::length(2, 3);
        assert!(r.check(&json!("é")).is_err());
        assert!(r.check(&json!("éé")).is_ok());
        assert!(r.check(&json!("abcd")).is_err());
    }

    #[test]
    fn test_range() {
        let r = ValidationRule::range(18.0, 130.0);
        assert!(r.check(&json!(18)).is_ok());
        assert!(r.check(&json!(17)).is_err());
        assert!(r.check(&json!("abc")).is_err());
    }

    #[test]
    fn test_pattern_and_custom() {
        let email = ValidationRule::pattern(r"^[^@\s]+@[^@\s]+$").unwrap();
        assert!(email.check(&json!("a@b.c")).is_ok());
        assert!(email.check(&json!("nope")).is_err());
        assert!(ValidationRule::pattern("(").is_err());

        let even = ValidationRule::custom("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(even.check(&json!(4)).is_ok());
        assert_eq!(even.kind(), "even");
    }

    #[test]
    fn test_validate_fields_collects_issues() {
        let fields = vec![
            FieldMeta::new("username", ScalarType::Text).rule(ValidationRule::Required),
            FieldMeta::new("age", ScalarType::Int).rule(ValidationRule::range(0.0, 10.0)),
            FieldMeta::new("note", ScalarType::Text),
        ];
        let values = json!({"username": "", "age": 11, "note": ""});
        let issues = validate_fields(&fields, values.as_object().unwrap());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "username");
        assert_eq!(issues[1].rule, "range");

        let mut state = ModelState::new();
        assert!(state.is_valid());
        state.extend(issues);
        assert!(!state.is_valid());
        assert_eq!(state.issues_for("age").count(), 1);
    }
}

//! Validation results: named field failures collected by validators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Name of the offending field (or a pseudo-field such as `"id"`).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationFailure {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Zero or more validation failures. Empty means the request may proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationFailure>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failure.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationFailure::new(field, message)])
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.0.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = ValidationFailure>) {
        self.0.extend(failures);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.0
    }

    /// Return `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when it holds at least one failure.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<ValidationFailure>> for ValidationErrors {
    fn from(failures: Vec<ValidationFailure>) -> Self {
        Self(failures)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, failure) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            failure.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_ok_when_empty() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn should_keep_failures_in_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationFailure::new("name", "is required"));
        errors.push(ValidationFailure::new("email", "is not a valid email address"));

        let fields: Vec<&str> = errors.failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email"]);
        assert_eq!(
            errors.to_string(),
            "name: is required; email: is not a valid email address"
        );
    }

    #[test]
    fn should_serialize_as_plain_list() {
        let errors = ValidationErrors::single("key", "must be unique");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "field": "key", "message": "must be unique" }])
        );
    }
}

//! Field-level validation errors
//!
//! Validation in the domain crates collects every problem it finds instead
//! of stopping at the first one, so a client can highlight all offending
//! form fields at once. Errors that do not belong to a single field go to
//! the `non_field_errors` bucket.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key used for errors that are not tied to a specific field
pub const NON_FIELD_KEY: &str = "non_field_errors";

/// Ordered collection of validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding a single non-field message
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_KEY, message);
        errors
    }

    /// Creates a collection holding a single message for `field`
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a "This field is required." message
    pub fn required(&mut self, field: &str) {
        self.add(field, "This field is required.");
    }

    /// Records `message` against `field` when `condition` is false
    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.add(field, message);
        }
    }

    /// Merges another collection into this one
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any message was recorded for `field`
    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages recorded for `field`
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                if field == NON_FIELD_KEY {
                    write!(f, "{}", message)?;
                } else {
                    write!(f, "{}: {}", field, message)?;
                }
            }
        }
        Ok(())
    }
}

/// Parses a query-string boolean; anything unrecognised yields `None`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_collects_per_field() {
        let mut errors = FieldErrors::new();
        errors.required("bathrooms");
        errors.add("bathrooms", "Ensure this value is greater than or equal to 0.");
        errors.required("sqft_area");

        assert_eq!(errors.messages("bathrooms").len(), 2);
        assert!(errors.contains("sqft_area"));
        assert!(!errors.contains("price"));
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = FieldErrors::non_field("Invalid email or password.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["non_field_errors"][0], "Invalid email or password.");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}

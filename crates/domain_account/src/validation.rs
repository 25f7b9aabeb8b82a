//! Registration and profile field rules
//!
//! # Validation Rules
//!
//! - Email must be well formed and not already registered
//! - Password and confirmation must match
//! - First name 1..=50 characters, last name 1..=75 characters
//! - `budget_max` is required on registration; both budgets are non-negative
//!   and `budget_min` may not exceed `budget_max`
//! - Phone numbers use the North American `+1-XXX-XXX-XXXX` format
//! - Terms and conditions must be accepted

use chrono::Utc;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::{FieldErrors, UserId, VerificationStatus};

use crate::user::{NewUser, Sex};

pub const FIRST_NAME_MAX: usize = 50;
pub const LAST_NAME_MAX: usize = 75;
pub const MAX_AGE: i32 = 150;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const PHONE_PATTERN: &str = r"^\+1-\d{3}-\d{3}-\d{4}$";
const URL_PATTERN: &str = r"^https?://[^\s/$.?#].[^\s]*$";

pub const PASSWORD_MISMATCH: &str = "Passwords must match.";
pub const EMAIL_TAKEN: &str = "This email is already taken.";
pub const EMAIL_INVALID: &str = "Email must be a valid email address.";
pub const PHONE_INVALID: &str = "Phone number must be in the format +1-XXX-XXX-XXXX.";
pub const TERMS_REQUIRED: &str = "You must accept the terms and conditions.";

fn matches_pattern(pattern: &str, value: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// Whether `email` is a syntactically valid address
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && matches_pattern(EMAIL_PATTERN, email)
}

/// Whether `phone` follows `+1-XXX-XXX-XXXX`
pub fn is_valid_phone(phone: &str) -> bool {
    matches_pattern(PHONE_PATTERN, phone)
}

/// Emails are compared case-insensitively and stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn check_name(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank.");
    } else if trimmed.chars().count() > max {
        errors.add(field, format!("Ensure this field has no more than {} characters.", max));
    }
}

pub(crate) fn check_non_negative(errors: &mut FieldErrors, field: &str, value: Option<Decimal>) {
    if let Some(v) = value {
        errors.check(
            v >= Decimal::ZERO,
            field,
            "Ensure this value is greater than or equal to 0.",
        );
    }
}

pub(crate) fn check_budget_range(errors: &mut FieldErrors, min: Option<Decimal>, max: Option<Decimal>) {
    if let (Some(min), Some(max)) = (min, max) {
        errors.check(
            min <= max,
            "budget_min",
            "Minimum budget cannot exceed maximum budget.",
        );
    }
}

pub(crate) fn check_link(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(link) = value.filter(|l| !l.is_empty()) {
        errors.check(matches_pattern(URL_PATTERN, link), field, "Enter a valid URL.");
    }
}

pub(crate) fn check_age(errors: &mut FieldErrors, age: Option<i32>) {
    if let Some(age) = age {
        errors.check(
            (0..=MAX_AGE).contains(&age),
            "age",
            format!("Ensure this value is between 0 and {}.", MAX_AGE),
        );
    }
}

/// Sign-up payload
///
/// Every field is optional at the type level so that missing fields are
/// reported alongside malformed ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub city: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub yearly_income: Option<Decimal>,
    pub phone_number: Option<String>,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub receive_email_notifications: Option<bool>,
    pub receive_sms_notifications: Option<bool>,
    pub terms_accepted: Option<bool>,
}

impl RegistrationForm {
    /// Validates the form and produces the user to insert
    ///
    /// # Arguments
    ///
    /// * `email_taken` - whether the normalized email already belongs to an account
    pub fn validate(self, email_taken: bool) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = self.email.as_deref().map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            errors.required("email");
        } else if !is_valid_email(&email) {
            errors.add("email", EMAIL_INVALID);
        } else if email_taken {
            errors.add("email", EMAIL_TAKEN);
        }

        let password = self.password.clone().unwrap_or_default();
        let confirmation = self.password_confirmation.clone().unwrap_or_default();
        if password.is_empty() {
            errors.required("password");
        }
        if confirmation.is_empty() {
            errors.required("password_confirmation");
        }
        if !password.is_empty() && !confirmation.is_empty() && password != confirmation {
            errors.add("password", PASSWORD_MISMATCH);
        }

        match self.first_name.as_deref() {
            Some(name) => check_name(&mut errors, "first_name", name, FIRST_NAME_MAX),
            None => errors.required("first_name"),
        }
        match self.last_name.as_deref() {
            Some(name) => check_name(&mut errors, "last_name", name, LAST_NAME_MAX),
            None => errors.required("last_name"),
        }

        if self.budget_max.is_none() {
            errors.required("budget_max");
        }
        check_non_negative(&mut errors, "budget_min", self.budget_min);
        check_non_negative(&mut errors, "budget_max", self.budget_max);
        check_non_negative(&mut errors, "yearly_income", self.yearly_income);
        check_budget_range(&mut errors, self.budget_min, self.budget_max);
        check_age(&mut errors, self.age);

        match self.phone_number.as_deref() {
            Some(phone) if is_valid_phone(phone) => {}
            Some(_) => errors.add("phone_number", PHONE_INVALID),
            None => errors.required("phone_number"),
        }

        match self.terms_accepted {
            Some(true) => {}
            _ => errors.add("terms_accepted", TERMS_REQUIRED),
        }

        check_link(&mut errors, "facebook_link", self.facebook_link.as_deref());
        check_link(&mut errors, "instagram_link", self.instagram_link.as_deref());

        errors.into_result()?;

        Ok(NewUser {
            id: UserId::new_v7(),
            email,
            password,
            first_name: self.first_name.unwrap_or_default().trim().to_string(),
            last_name: self.last_name.unwrap_or_default().trim().to_string(),
            age: self.age,
            sex: self.sex,
            city: self.city,
            preferred_location: self.preferred_location,
            id_verification_status: VerificationStatus::Unverified,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            yearly_income: self.yearly_income,
            phone_number: self.phone_number,
            facebook_link: self.facebook_link,
            instagram_link: self.instagram_link,
            receive_email_notifications: self.receive_email_notifications.unwrap_or(true),
            receive_sms_notifications: self.receive_sms_notifications.unwrap_or(false),
            terms_accepted: true,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_patterns() {
        assert!(is_valid_email("tenant@example.com"));
        assert!(!is_valid_email("tenant@"));
        assert!(!is_valid_email("no-at-sign"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("+1-519-555-0199"));
        assert!(!is_valid_phone("519-555-0199"));
        assert!(!is_valid_phone("+1-519-555-01990"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Tenant@Example.COM "), "tenant@example.com");
    }
}

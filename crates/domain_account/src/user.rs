//! User aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{define_code_enum, FieldErrors, UserId, VerificationStatus};

use crate::error::AccountError;
use crate::password::verify_password;
use crate::validation::{
    check_age, check_budget_range, check_link, check_name, check_non_negative, is_valid_email,
    is_valid_phone, normalize_email, EMAIL_INVALID, EMAIL_TAKEN, FIRST_NAME_MAX, LAST_NAME_MAX,
    PASSWORD_MISMATCH, PHONE_INVALID,
};

define_code_enum!(
    /// Sex of a user, also used as a roommate gender preference
    Sex {
        Male => "M",
        Female => "F",
        Other => "O",
    }
);

/// A registered marketplace user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub city: Option<String>,
    pub preferred_location: Option<String>,
    pub id_verification_status: VerificationStatus,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub yearly_income: Option<Decimal>,
    /// Path under the media root
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub email_verified: bool,
    pub terms_accepted: bool,
    pub receive_email_notifications: bool,
    pub receive_sms_notifications: bool,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Both budget bounds, when the user has set them
    pub fn budget_range(&self) -> Option<(Decimal, Decimal)> {
        self.budget_min.zip(self.budget_max)
    }
}

/// A validated registration, still carrying the plaintext password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub city: Option<String>,
    pub preferred_location: Option<String>,
    pub id_verification_status: VerificationStatus,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub yearly_income: Option<Decimal>,
    pub phone_number: Option<String>,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub receive_email_notifications: bool,
    pub receive_sms_notifications: bool,
    pub terms_accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Builds the stored user once the password has been hashed
    pub fn into_user(self, password_hash: String) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            sex: self.sex,
            city: self.city,
            preferred_location: self.preferred_location,
            id_verification_status: self.id_verification_status,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            yearly_income: self.yearly_income,
            profile_picture: None,
            phone_number: self.phone_number,
            phone_verified: false,
            email_verified: false,
            terms_accepted: self.terms_accepted,
            receive_email_notifications: self.receive_email_notifications,
            receive_sms_notifications: self.receive_sms_notifications,
            facebook_link: self.facebook_link,
            instagram_link: self.instagram_link,
            last_login: None,
            created_at: self.created_at,
        }
    }
}

/// Partial profile edit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
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
}

impl ProfileUpdate {
    /// The normalized new email, when it differs from the current one
    pub fn changed_email(&self, user: &User) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|email| *email != user.email)
    }

    /// Validates the edit against `user` and applies it
    ///
    /// Returns the new plaintext password when one was supplied, so the
    /// caller can hash it before persisting.
    pub fn apply(self, user: &mut User, email_taken: bool) -> Result<Option<String>, FieldErrors> {
        let mut errors = FieldErrors::new();

        let new_email = self.changed_email(user);
        if let Some(email) = &new_email {
            if !is_valid_email(email) {
                errors.add("email", EMAIL_INVALID);
            } else if email_taken {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        let password = self.password.filter(|p| !p.is_empty());
        let confirmation = self.password_confirmation.filter(|p| !p.is_empty());
        if (password.is_some() || confirmation.is_some()) && password != confirmation {
            errors.add("password", PASSWORD_MISMATCH);
        }

        if let Some(name) = self.first_name.as_deref() {
            check_name(&mut errors, "first_name", name, FIRST_NAME_MAX);
        }
        if let Some(name) = self.last_name.as_deref() {
            check_name(&mut errors, "last_name", name, LAST_NAME_MAX);
        }
        if let Some(phone) = self.phone_number.as_deref() {
            errors.check(is_valid_phone(phone), "phone_number", PHONE_INVALID);
        }

        check_age(&mut errors, self.age);
        check_non_negative(&mut errors, "budget_min", self.budget_min);
        check_non_negative(&mut errors, "budget_max", self.budget_max);
        check_non_negative(&mut errors, "yearly_income", self.yearly_income);
        check_budget_range(
            &mut errors,
            self.budget_min.or(user.budget_min),
            self.budget_max.or(user.budget_max),
        );
        check_link(&mut errors, "facebook_link", self.facebook_link.as_deref());
        check_link(&mut errors, "instagram_link", self.instagram_link.as_deref());

        errors.into_result()?;

        if let Some(email) = new_email {
            user.email = email;
            // A changed address has to be confirmed again
            user.email_verified = false;
        }
        if let Some(v) = self.first_name {
            user.first_name = v.trim().to_string();
        }
        if let Some(v) = self.last_name {
            user.last_name = v.trim().to_string();
        }
        if self.age.is_some() {
            user.age = self.age;
        }
        if self.sex.is_some() {
            user.sex = self.sex;
        }
        if self.city.is_some() {
            user.city = self.city;
        }
        if self.preferred_location.is_some() {
            user.preferred_location = self.preferred_location;
        }
        if self.budget_min.is_some() {
            user.budget_min = self.budget_min;
        }
        if self.budget_max.is_some() {
            user.budget_max = self.budget_max;
        }
        if self.yearly_income.is_some() {
            user.yearly_income = self.yearly_income;
        }
        if self.phone_number.is_some() {
            user.phone_number = self.phone_number;
            user.phone_verified = false;
        }
        if self.facebook_link.is_some() {
            user.facebook_link = self.facebook_link;
        }
        if self.instagram_link.is_some() {
            user.instagram_link = self.instagram_link;
        }
        if let Some(v) = self.receive_email_notifications {
            user.receive_email_notifications = v;
        }
        if let Some(v) = self.receive_sms_notifications {
            user.receive_sms_notifications = v;
        }

        Ok(password)
    }
}

/// Checks a login attempt against the account found for the email, if any
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
/// The verification check only runs once the password is known to be right.
pub fn check_login(user: Option<&User>, password: &str) -> Result<(), AccountError> {
    let user = user.ok_or(AccountError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AccountError::InvalidCredentials);
    }
    if !user.email_verified {
        return Err(AccountError::EmailNotVerified);
    }
    Ok(())
}

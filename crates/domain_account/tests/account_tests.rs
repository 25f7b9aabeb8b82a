//! Tests for registration, profile edits, login checks and roommate profiles

use chrono::Utc;
use rust_decimal_macros::dec;
use proptest::prelude::*;
use std::collections::HashMap;

use core_kernel::UserId;
use domain_account::password::hash_password;
use domain_account::roommate::{Occupation, RoommateDraft, RoommateFilter, RoommatePatch};
use domain_account::user::{check_login, ProfileUpdate, Sex, User};
use domain_account::validation::{is_valid_phone, RegistrationForm};
use domain_account::AccountError;

fn valid_form() -> RegistrationForm {
    RegistrationForm {
        email: Some("Tenant@Example.com".to_string()),
        password: Some("Sup3rSecret!".to_string()),
        password_confirmation: Some("Sup3rSecret!".to_string()),
        first_name: Some("Jamie".to_string()),
        last_name: Some("Rivera".to_string()),
        budget_min: Some(dec!(800)),
        budget_max: Some(dec!(1400)),
        phone_number: Some("+1-519-555-0199".to_string()),
        terms_accepted: Some(true),
        ..Default::default()
    }
}

fn registered_user(password: &str, verified: bool) -> User {
    let new_user = valid_form().validate(false).unwrap();
    let mut user = new_user.into_user(hash_password(password).unwrap());
    user.email_verified = verified;
    user
}

// ============================================================================
// Registration Tests
// ============================================================================

mod registration_tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        let user = valid_form().validate(false).unwrap();

        assert_eq!(user.email, "tenant@example.com");
        assert_eq!(user.first_name, "Jamie");
        assert!(user.receive_email_notifications);
        assert!(!user.receive_sms_notifications);
    }

    #[test]
    fn test_new_user_starts_unverified() {
        let user = registered_user("Sup3rSecret!", false);
        assert!(!user.email_verified);
        assert!(!user.phone_verified);
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_password_mismatch() {
        let mut form = valid_form();
        form.password_confirmation = Some("different".to_string());

        let errors = form.validate(false).unwrap_err();
        assert_eq!(errors.messages("password"), ["Passwords must match.".to_string()]);
    }

    #[test]
    fn test_terms_must_be_accepted() {
        let mut form = valid_form();
        form.terms_accepted = Some(false);
        let errors = form.validate(false).unwrap_err();
        assert!(errors.contains("terms_accepted"));

        let mut form = valid_form();
        form.terms_accepted = None;
        let errors = form.validate(false).unwrap_err();
        assert_eq!(
            errors.messages("terms_accepted"),
            ["You must accept the terms and conditions.".to_string()]
        );
    }

    #[test]
    fn test_invalid_phone() {
        let mut form = valid_form();
        form.phone_number = Some("5195550199".to_string());

        let errors = form.validate(false).unwrap_err();
        assert_eq!(
            errors.messages("phone_number"),
            ["Phone number must be in the format +1-XXX-XXX-XXXX.".to_string()]
        );
    }

    #[test]
    fn test_email_taken() {
        let errors = valid_form().validate(true).unwrap_err();
        assert_eq!(errors.messages("email"), ["This email is already taken.".to_string()]);
    }

    #[test]
    fn test_budget_max_required() {
        let mut form = valid_form();
        form.budget_max = None;
        form.budget_min = None;
        let errors = form.validate(false).unwrap_err();
        assert!(errors.contains("budget_max"));
    }

    #[test]
    fn test_negative_budget_and_inverted_range() {
        let mut form = valid_form();
        form.budget_min = Some(dec!(-1));
        let errors = form.validate(false).unwrap_err();
        assert!(errors.contains("budget_min"));

        let mut form = valid_form();
        form.budget_min = Some(dec!(2000));
        let errors = form.validate(false).unwrap_err();
        assert!(errors.contains("budget_min"));
    }

    #[test]
    fn test_names_are_bounded() {
        let mut form = valid_form();
        form.first_name = Some("x".repeat(51));
        form.last_name = Some("   ".to_string());
        let errors = form.validate(false).unwrap_err();
        assert!(errors.contains("first_name"));
        assert!(errors.contains("last_name"));
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let errors = RegistrationForm::default().validate(false).unwrap_err();
        for field in ["email", "password", "first_name", "last_name", "budget_max", "phone_number", "terms_accepted"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_form_deserializes_sex_codes() {
        let form: RegistrationForm = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "sex": "F",
            "budget_max": "1000.00"
        }))
        .unwrap();
        assert_eq!(form.sex, Some(Sex::Female));
        assert_eq!(form.budget_max, Some(dec!(1000.00)));
    }
}

// ============================================================================
// Login Tests
// ============================================================================

mod login_tests {
    use super::*;

    #[test]
    fn test_login_success() {
        let user = registered_user("Sup3rSecret!", true);
        assert!(check_login(Some(&user), "Sup3rSecret!").is_ok());
    }

    #[test]
    fn test_unknown_email() {
        assert!(matches!(check_login(None, "x"), Err(AccountError::InvalidCredentials)));
    }

    #[test]
    fn test_wrong_password() {
        let user = registered_user("Sup3rSecret!", true);
        assert!(matches!(
            check_login(Some(&user), "nope"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unverified_email_after_correct_password() {
        let user = registered_user("Sup3rSecret!", false);
        let err = check_login(Some(&user), "Sup3rSecret!").unwrap_err();
        assert!(matches!(err, AccountError::EmailNotVerified));
        assert!(err.to_string().starts_with("Email not verified."));
    }

    #[test]
    fn test_unverified_with_wrong_password_is_still_invalid_credentials() {
        let user = registered_user("Sup3rSecret!", false);
        assert!(matches!(
            check_login(Some(&user), "nope"),
            Err(AccountError::InvalidCredentials)
        ));
    }
}

// ============================================================================
// Profile Update Tests
// ============================================================================

mod profile_update_tests {
    use super::*;

    #[test]
    fn test_partial_update() {
        let mut user = registered_user("pw", true);
        let update = ProfileUpdate {
            city: Some("Waterloo".to_string()),
            budget_max: Some(dec!(1600)),
            ..Default::default()
        };

        let new_password = update.apply(&mut user, false).unwrap();
        assert!(new_password.is_none());
        assert_eq!(user.city.as_deref(), Some("Waterloo"));
        assert_eq!(user.budget_max, Some(dec!(1600)));
        assert_eq!(user.first_name, "Jamie");
    }

    #[test]
    fn test_password_change_requires_confirmation() {
        let mut user = registered_user("pw", true);
        let update = ProfileUpdate {
            password: Some("new-password".to_string()),
            ..Default::default()
        };
        let errors = update.apply(&mut user, false).unwrap_err();
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_password_change_returns_plaintext() {
        let mut user = registered_user("pw", true);
        let update = ProfileUpdate {
            password: Some("new-password".to_string()),
            password_confirmation: Some("new-password".to_string()),
            ..Default::default()
        };
        assert_eq!(update.apply(&mut user, false).unwrap().as_deref(), Some("new-password"));
    }

    #[test]
    fn test_email_change_resets_verification() {
        let mut user = registered_user("pw", true);
        let update = ProfileUpdate {
            email: Some("New@Example.com".to_string()),
            ..Default::default()
        };
        update.apply(&mut user, false).unwrap();
        assert_eq!(user.email, "new@example.com");
        assert!(!user.email_verified);
    }

    #[test]
    fn test_same_email_is_not_a_change() {
        let user = registered_user("pw", true);
        let update = ProfileUpdate {
            email: Some("TENANT@example.com".to_string()),
            ..Default::default()
        };
        assert!(update.changed_email(&user).is_none());
    }

    #[test]
    fn test_budget_range_checked_against_existing_values() {
        let mut user = registered_user("pw", true);
        let update = ProfileUpdate {
            budget_min: Some(dec!(5000)),
            ..Default::default()
        };
        let errors = update.apply(&mut user, false).unwrap_err();
        assert!(errors.contains("budget_min"));
        assert_eq!(user.budget_min, Some(dec!(800)));
    }
}

// ============================================================================
// Roommate Profile Tests
// ============================================================================

mod roommate_tests {
    use super::*;

    fn draft() -> RoommateDraft {
        RoommateDraft {
            description: Some("Quiet grad student".to_string()),
            stay_length: Some(12),
            occupation: Some(Occupation::Student),
            roommate_budget: Some(dec!(700)),
            pet_friendly: true,
            gender_preference: Some(Sex::Other),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_profile() {
        let owner = UserId::new();
        let profile = draft().validate(owner).unwrap();
        assert_eq!(profile.user_id, owner);
        assert!(profile.open_to_message);
        assert!(profile.created_at <= Utc::now());
    }

    #[test]
    fn test_description_required() {
        let mut d = draft();
        d.description = None;
        let errors = d.validate(UserId::new()).unwrap_err();
        assert!(errors.contains("description"));
    }

    #[test]
    fn test_stay_length_and_budget_bounds() {
        let mut d = draft();
        d.stay_length = Some(0);
        d.roommate_budget = Some(dec!(-5));
        let errors = d.validate(UserId::new()).unwrap_err();
        assert!(errors.contains("stay_length"));
        assert!(errors.contains("roommate_budget"));
    }

    #[test]
    fn test_patch_updates_flags() {
        let mut profile = draft().validate(UserId::new()).unwrap();
        let patch = RoommatePatch {
            smoke_friendly: Some(true),
            open_to_message: Some(false),
            ..Default::default()
        };
        patch.apply(&mut profile).unwrap();
        assert!(profile.smoke_friendly);
        assert!(!profile.open_to_message);
        assert!(profile.pet_friendly);
    }

    #[test]
    fn test_filter_ignores_unparsable_values() {
        let params: HashMap<String, String> = [
            ("pet_friendly".to_string(), "True".to_string()),
            ("smoke_friendly".to_string(), "sometimes".to_string()),
            ("gender_preference".to_string(), "Z".to_string()),
        ]
        .into_iter()
        .collect();

        let filter = RoommateFilter::from_query(&params);
        assert_eq!(filter.pet_friendly, Some(true));
        assert_eq!(filter.smoke_friendly, None);
        assert_eq!(filter.gender_preference, None);
    }

    #[test]
    fn test_filter_matches() {
        let profile = draft().validate(UserId::new()).unwrap();

        let mut filter = RoommateFilter {
            pet_friendly: Some(true),
            occupation: Some(Occupation::Student),
            max_budget: Some(dec!(750)),
            ..Default::default()
        };
        assert!(filter.matches(&profile));

        filter.max_budget = Some(dec!(600));
        assert!(!filter.matches(&profile));

        let filter = RoommateFilter {
            smoke_friendly: Some(true),
            ..Default::default()
        };
        assert!(!filter.matches(&profile));
    }
}

// ============================================================================
// Phone Format Properties
// ============================================================================

mod phone_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_north_american_numbers_accepted(a in 200u32..1000, b in 0u32..1000, c in 0u32..10_000) {
            let phone = format!("+1-{:03}-{:03}-{:04}", a, b, c);
            prop_assert!(is_valid_phone(&phone));
        }

        #[test]
        fn prop_undashed_numbers_rejected(digits in "[0-9]{10}") {
            let phone = format!("+1{}", digits);
            prop_assert!(!is_valid_phone(&phone));
        }
    }
}

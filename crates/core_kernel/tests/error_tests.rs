//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::FieldErrors;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(errors) => {
            assert_eq!(errors.messages("non_field_errors"), ["Invalid input".to_string()]);
        }
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_state() {
    let error = CoreError::invalid_state("Cannot transition from O to I");

    match error {
        CoreError::InvalidStateTransition(msg) => assert!(msg.contains("Cannot transition")),
        _ => panic!("Expected InvalidStateTransition error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Listing not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Listing not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_from_field_errors() {
    let errors = FieldErrors::single("price", "Ensure this value is greater than or equal to 0.");
    let core_error: CoreError = errors.into();

    assert!(matches!(core_error, CoreError::Validation(_)));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::Validation(FieldErrors::single("email", "This email is already taken."));
    let display = format!("{}", error);

    assert!(display.contains("Validation failed"));
    assert!(display.contains("email: This email is already taken."));
}

#[test]
fn test_field_errors_merge() {
    let mut first = FieldErrors::single("front_image", "A front image is required.");
    let mut second = FieldErrors::new();
    second.add("images", "At least 3 additional pictures are required.");
    second.add("front_image", "Only one front image may be uploaded.");
    first.merge(second);

    assert_eq!(first.messages("front_image").len(), 2);
    assert!(first.contains("images"));
}

//! Verification state shared by users and listings

use crate::define_code_enum;

define_code_enum!(
    /// Verification state of an identity document or a listing
    VerificationStatus {
        Verified => "V",
        Pending => "P",
        Unverified => "U",
    }
);

impl Default for VerificationStatus {
    fn default() -> Self {
        VerificationStatus::Unverified
    }
}

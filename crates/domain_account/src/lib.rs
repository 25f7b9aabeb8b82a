//! Accounts Domain
//!
//! Users sign up with an email address, confirm it through a mailed link and
//! then log in. A user may additionally publish one roommate profile, which
//! is what groups and invitations refer to.
//!
//! # Account Lifecycle
//!
//! ```text
//! Registered (email unverified) -> Email verified -> Active
//!                                                     |
//!                                                     +-> Roommate profile published
//! ```

pub mod user;
pub mod roommate;
pub mod validation;
pub mod password;
pub mod error;

pub use user::{User, Sex, NewUser, ProfileUpdate, check_login};
pub use roommate::{RoommateProfile, Occupation, RoommateDraft, RoommatePatch, RoommateFilter};
pub use validation::RegistrationForm;
pub use error::AccountError;

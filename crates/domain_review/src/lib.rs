//! Reviews Domain
//!
//! Users rate each other once per pair, from 1 to 5, in the role the
//! reviewee played: tenant, landlord or roommate.

pub mod review;
pub mod error;

pub use review::{Review, ReviewDraft, ReviewPatch, ReviewFilter, RevieweeRole, RatingSummary};
pub use error::ReviewError;

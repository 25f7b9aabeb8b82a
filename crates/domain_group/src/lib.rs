//! Groups Domain
//!
//! Roommates form a group around one listing and apply for it together.
//! Tenants move their group between open, private, filled and sent; the
//! landlord of the listing answers with under review, invited or rejected.
//!
//! # Group Status Flow
//!
//! ```text
//!  tenant:   O <-> P <-> F ---> S
//!  landlord:                    S -> U -> I   (siblings on the listing -> R)
//!                                     \-> R
//! ```

pub mod group;
pub mod invitation;
pub mod application;
pub mod error;

pub use group::{Group, GroupDraft, GroupMember, GroupPatch, GroupStatus, LeaveOutcome};
pub use invitation::{GroupInvitation, InvitationStatus};
pub use application::{ApplicationViews, is_landlord_visible, is_tenant_visible};
pub use error::GroupError;

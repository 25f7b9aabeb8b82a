//! Test Utilities Crate
//!
//! Shared fixtures, builders and database helpers for the marketplace test
//! suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, places and amounts
//! - `builders`: Builders for users, listings, groups and reviews
//! - `database`: PostgreSQL test containers
//! - `generators`: Proptest strategies

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use generators::*;

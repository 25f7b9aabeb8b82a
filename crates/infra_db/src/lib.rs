//! Infrastructure Database Layer
//!
//! Postgres persistence for the marketplace using SQLx. Domain crates stay
//! free of I/O; the repositories here load and store their types and run
//! the multi-step writes inside a single transaction.
//!
//! Queries are checked at runtime (`query_as::<_, Row>`), so the crate
//! builds without a live database. Enumerations are stored as their short
//! codes and decoded on the way out.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::repositories::ListingRepository;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/nestmate")).await?;
//! run_migrations(&pool).await?;
//! let listings = ListingRepository::new(pool).search(&query).await?;
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod seed;

pub use pool::{create_lazy_pool, create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use seed::{insert_batch, SeedBatch};

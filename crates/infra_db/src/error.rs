//! Database error types
//!
//! Errors raised by the repositories. Postgres constraint violations are
//! mapped to dedicated variants so the API layer can answer 409 or 400
//! instead of a blanket 500.

use core_kernel::UnknownCode;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be turned back into a domain type
    #[error("Decode error: {0}")]
    Decode(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Listing", "LST-123");
    /// assert!(error.to_string().contains("Listing"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::DuplicateEntry(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Maps SQLx errors to specific variants based on the PostgreSQL error code
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseError::Decode(format!("column {}: {}", index, source))
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<UnknownCode> for DatabaseError {
    fn from(error: UnknownCode) -> Self {
        DatabaseError::Decode(error.to_string())
    }
}

/// Parses a stored code column back into its enum
pub(crate) fn decode<T>(code: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr<Err = UnknownCode>,
{
    Ok(code.trim().parse()?)
}

/// Like [`decode`] for nullable columns
pub(crate) fn decode_opt<T>(code: Option<&str>) -> Result<Option<T>, DatabaseError>
where
    T: std::str::FromStr<Err = UnknownCode>,
{
    code.map(decode).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::VerificationStatus;

    #[test]
    fn test_not_found_message() {
        let err = DatabaseError::not_found("Group", "GRP-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: Group with id 'GRP-1' not found");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(DatabaseError::from(sqlx::Error::RowNotFound).is_not_found());
        assert!(DatabaseError::from(sqlx::Error::PoolTimedOut).is_connection_error());
    }

    #[test]
    fn test_decode_codes() {
        let status: VerificationStatus = decode("V ").unwrap();
        assert_eq!(status, VerificationStatus::Verified);
        assert!(decode::<VerificationStatus>("Z").is_err());
        assert_eq!(decode_opt::<VerificationStatus>(None).unwrap(), None);
    }
}

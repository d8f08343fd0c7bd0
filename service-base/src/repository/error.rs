//! Repository error types
//!
//! Every repository operation reports failure through [`RepositoryError`].
//! The [`RepositoryErrorKind`] separates three families that callers treat
//! differently:
//!
//! - contract violations (bad arguments, raised before any I/O),
//! - `NotFound` (the targeted row does not exist),
//! - persistence failures (anything the store itself rejected).
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("ExampleClass", "42");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// The repository call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Counting rows matching a filter
    Count,
    /// Inserting one entity
    Create,
    /// Inserting a batch of entities in one transaction
    CreateMany,
    /// Overwriting an existing entity
    Update,
    /// Deleting an entity by key
    Delete,
    /// Removing every row of an entity
    Clear,
    /// Looking up one row by key
    GetById,
    /// Fetching the first matching row
    GetSingle,
    /// Fetching all matching rows
    GetMany,
    /// Fetching a page of matching rows
    GetManyPaged,
    /// Eager loading related rows
    LoadRelated,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "count",
            Self::Create => "create",
            Self::CreateMany => "create_many",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Clear => "clear_entity",
            Self::GetById => "get_by_id",
            Self::GetSingle => "get_single",
            Self::GetMany => "get_many",
            Self::GetManyPaged => "get_many_paged",
            Self::LoadRelated => "load_related",
        })
    }
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Invalid call arguments, detected before the store is touched
    ContractViolation,
    /// The targeted row does not exist
    NotFound,
    /// UNIQUE or PRIMARY KEY conflict
    AlreadyExists,
    /// FOREIGN KEY, CHECK or NOT NULL conflict
    ConstraintViolation,
    /// The database could not be reached
    ConnectionFailed,
    /// Lock contention or pool acquire timeout
    Timeout,
    /// Any other statement failure
    DatabaseError,
    /// Row could not be decoded into the entity
    SerializationError,
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ContractViolation => "contract_violation",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::ConstraintViolation => "constraint_violation",
            Self::ConnectionFailed => "connection_failed",
            Self::Timeout => "timeout",
            Self::DatabaseError => "database_error",
            Self::SerializationError => "serialization_error",
            Self::Other => "other",
        })
    }
}

/// A failed repository call with the entity it concerned
///
/// # Example
///
/// ```rust
/// use service_base::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::contract_violation(
///     RepositoryOperation::GetManyPaged,
///     "There are no order entries in the list",
/// );
/// assert!(error.is_contract_violation());
/// assert!(!error.is_persistence_failure());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    pub operation: RepositoryOperation,
    pub kind: RepositoryErrorKind,
    pub message: String,
    /// Schema name, e.g. "ExampleClass"
    pub entity_type: Option<String>,
    /// Rendered key, e.g. "3, 9"
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Invalid arguments, raised before any I/O
    pub fn contract_violation(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ContractViolation, message)
    }

    /// No row with this key
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::GetById,
            kind: RepositoryErrorKind::NotFound,
            message: "Entity not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn constraint_violation(
        operation: RepositoryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(operation, RepositoryErrorKind::ConstraintViolation, message)
    }

    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Invalid arguments rather than a store failure
    pub fn is_contract_violation(&self) -> bool {
        self.kind == RepositoryErrorKind::ContractViolation
    }

    /// The targeted row does not exist
    pub fn is_not_found(&self) -> bool {
        self.kind == RepositoryErrorKind::NotFound
    }

    /// Anything the store rejected: neither a contract violation nor a miss
    pub fn is_persistence_failure(&self) -> bool {
        !matches!(
            self.kind,
            RepositoryErrorKind::ContractViolation | RepositoryErrorKind::NotFound
        )
    }

    /// Transient failures worth trying again
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id)?,
            (Some(entity_type), None) => write!(f, " [{}]", entity_type)?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

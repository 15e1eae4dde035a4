//! Domain Layer - Core Entity Trait and Errors
//!
//! Identifier generation is the caller's concern: entities arrive with
//! their ids already assigned.

/// Entity identifier. Callers supply opaque unique strings (uuids).
pub type Uuid = String;

/// Tag attached to a shopping list.
pub type Tag = String;

/// Core trait for identified domain entities.
///
/// Used to build the id predicates that drive sequence edits uniformly.
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the entity's unique identifier.
    fn id(&self) -> &Uuid;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required predicate or key lookup matched nothing.
    NotFound(String),
    /// A key-uniqueness violation (e.g. adding a list twice).
    Conflict(String),
    /// The state record and the list store disagree. Treated as a defect:
    /// the enclosing transaction aborts and the error is never swallowed.
    InvariantViolation(String),
    /// The underlying store reported an error or abort.
    Storage(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

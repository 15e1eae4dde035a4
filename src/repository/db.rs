//! Database Setup
//!
//! Opens the redb database and initializes the schema: the two record
//! tables plus the single fixed-key state record.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::domain::{DomainError, DomainResult, StateRecord};

/// Persisted schema version; also the fixed key of the state record.
pub const STATE_VERSION: u32 = 1;

/// List-record store: list id -> JSON `ShoppingList` document.
pub(super) const LIST_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("shopping_lists");

/// App-state store: `STATE_VERSION` -> JSON `StateRecord` document.
pub(super) const STATE_TABLE: TableDefinition<u32, &str> =
    TableDefinition::new("application_state");

/// Open (or create) the database at `path`, creating both tables and, if
/// absent, a state record with empty tags, empty query and an empty id
/// sequence. Idempotent: an existing database is left untouched.
pub fn open(path: &Path) -> DomainResult<Database> {
    let db = Database::create(path)?;

    let txn = db.begin_write()?;
    {
        txn.open_table(LIST_TABLE)?;

        let mut state_table = txn.open_table(STATE_TABLE)?;
        if state_table.get(STATE_VERSION)?.is_none() {
            let record = StateRecord::empty(STATE_VERSION);
            state_table.insert(STATE_VERSION, serde_json::to_string(&record)?.as_str())?;
            log::info!("seeded empty state record (schema v{})", STATE_VERSION);
        }
    }
    txn.commit()?;

    log::debug!("database open at {}", path.display());
    Ok(db)
}

impl From<redb::DatabaseError> for DomainError {
    fn from(e: redb::DatabaseError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<redb::TransactionError> for DomainError {
    fn from(e: redb::TransactionError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<redb::TableError> for DomainError {
    fn from(e: redb::TableError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<redb::StorageError> for DomainError {
    fn from(e: redb::StorageError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<redb::CommitError> for DomainError {
    fn from(e: redb::CommitError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

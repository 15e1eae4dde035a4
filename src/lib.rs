//! Shoplist Core
//!
//! A single-user list manager whose data survives reloads in durable local
//! storage while the view renders from an in-memory mirror. Every mutation
//! commits to storage first; only then is the identical edit applied to the
//! mirror, so a storage failure can never corrupt either copy.
//!
//! Layered architecture:
//! - sequence: the ordered collection both layers edit with
//! - domain: core entities and errors
//! - repository: durable store (one atomic transaction per operation)
//! - manager: the state synchronizer and view-facing action surface

mod manager;

pub mod domain;
pub mod repository;
pub mod sequence;

pub use domain::{
    ApplicationState, DomainError, DomainResult, Entity, ItemKind, ListQuery, ShoppingList,
    ShoppingListItem, StateRecord, Tag, Uuid,
};
pub use manager::{Model, StateManager};
pub use repository::Store;
pub use sequence::{NotFound, Sequence};

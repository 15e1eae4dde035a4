//! Domain Layer
//!
//! Core entities and errors. This layer has no external dependencies
//! (except serde for serialization).

mod entity;
mod item;
mod list;
mod query;
mod state;

pub use entity::{DomainError, DomainResult, Entity, Tag, Uuid};
pub use item::{ItemKind, ShoppingListItem};
pub use list::ShoppingList;
pub use query::ListQuery;
pub use state::{ApplicationState, StateRecord};

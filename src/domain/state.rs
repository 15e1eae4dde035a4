//! Application State
//!
//! `ApplicationState` is the in-memory mirror the view renders from; it is
//! only ever written by the state manager. `StateRecord` is its durable
//! projection: the single fixed-key record holding tags, the active query,
//! and the ordered list-id sequence, while full list bodies live in the
//! list-record store, joined by id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity::{Tag, Uuid};
use super::list::ShoppingList;
use super::query::ListQuery;
use crate::sequence::Sequence;

/// The in-memory mirror of all application state.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationState {
    /// Union of all list tags (denormalized cache)
    pub tags: BTreeSet<Tag>,
    /// Active filter
    pub query: ListQuery,
    /// All lists, in display order
    pub shopping_lists: Sequence<ShoppingList>,
    /// Informational connectivity flag; local writes proceed regardless
    pub is_network_available: bool,
}

impl ApplicationState {
    pub fn empty() -> Self {
        Self {
            tags: BTreeSet::new(),
            query: ListQuery::default(),
            shopping_lists: Sequence::empty(),
            is_network_available: true,
        }
    }

    /// Lists passing the active query, in display order.
    pub fn filtered_lists(&self) -> Vec<&ShoppingList> {
        self.shopping_lists
            .iter()
            .filter(|list| self.query.matches(list))
            .collect()
    }
}

/// The single durable state record, keyed by the schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: u32,
    pub tags: BTreeSet<Tag>,
    pub query: ListQuery,
    /// Order and membership of lists, as ids
    pub shopping_lists: Sequence<Uuid>,
}

impl StateRecord {
    /// The record seeded at store initialization.
    pub fn empty(id: u32) -> Self {
        Self {
            id,
            tags: BTreeSet::new(),
            query: ListQuery::default(),
            shopping_lists: Sequence::empty(),
        }
    }
}

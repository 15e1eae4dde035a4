//! Shopping List Entity

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Tag, Uuid};
use super::item::ShoppingListItem;
use crate::sequence::Sequence;

/// A named, ordered collection of items with tags and a pin flag.
///
/// Doubles as the durable list-record shape: one record per list, keyed by
/// id, holding the full value including the item sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    /// Unique identifier (caller-supplied)
    pub id: Uuid,
    /// Tags for filtering
    pub tags: BTreeSet<Tag>,
    /// Pinned lists sort to the front, most recently pinned first
    pub is_pinned: bool,
    /// Ordered items
    pub items: Sequence<ShoppingListItem>,
}

impl ShoppingList {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self {
            id: id.into(),
            tags: BTreeSet::new(),
            is_pinned: false,
            items: Sequence::empty(),
        }
    }

    pub fn with_tags(id: impl Into<Uuid>, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            ..Self::new(id)
        }
    }
}

impl Entity for ShoppingList {
    fn id(&self) -> &Uuid {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_creation() {
        let list = ShoppingList::new("L1");
        assert_eq!(list.id(), "L1");
        assert!(!list.is_pinned);
        assert!(list.tags.is_empty());
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_list_with_tags() {
        let list = ShoppingList::with_tags("L1", ["food".to_string(), "weekly".to_string()]);
        assert!(list.tags.contains("food"));
        assert!(list.tags.contains("weekly"));
    }
}

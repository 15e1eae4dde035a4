//! Shopping List Item Entity

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Uuid};

/// Item kind determines behavior and appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Section heading inside a list (no checkbox)
    Title,
    /// Task still to be done
    #[default]
    PendingTask,
    /// Task checked off
    CompletedTask,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Title => "title",
            ItemKind::PendingTask => "pendingTask",
            ItemKind::CompletedTask => "completedTask",
        }
    }
}

/// One entry of a shopping list. Owned by exactly one list, referenced by
/// its position in that list's item sequence, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Unique identifier (caller-supplied)
    pub id: Uuid,
    /// Item kind
    pub kind: ItemKind,
    /// Item text content
    pub content: String,
}

impl ShoppingListItem {
    pub fn new(id: impl Into<Uuid>, kind: ItemKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
        }
    }
}

impl Entity for ShoppingListItem {
    fn id(&self) -> &Uuid {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = ShoppingListItem::new("I1", ItemKind::PendingTask, "Milk");
        assert_eq!(item.id(), "I1");
        assert_eq!(item.content, "Milk");
        assert_eq!(item.kind, ItemKind::PendingTask);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(ItemKind::PendingTask.as_str(), "pendingTask");
        let json = serde_json::to_string(&ItemKind::CompletedTask).unwrap();
        assert_eq!(json, "\"completedTask\"");
        let kind: ItemKind = serde_json::from_str("\"title\"").unwrap();
        assert_eq!(kind, ItemKind::Title);
    }
}

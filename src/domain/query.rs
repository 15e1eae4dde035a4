//! List Query
//!
//! The active filter persisted in the state record. Tag filtering lives
//! here; search-term matching and highlighting belong to the presentation
//! layer, which only reads the `search_term` field back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity::Tag;
use super::list::ShoppingList;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Lists must carry every one of these tags to match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<Tag>>,
    /// Free-text term; matching is the view layer's concern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl ListQuery {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.search_term.is_none()
    }

    /// True when the list carries every tag of the query. An absent or
    /// empty tag filter matches everything.
    pub fn matches(&self, list: &ShoppingList) -> bool {
        match &self.tags {
            Some(tags) => tags.is_subset(&list.tags),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_matches_all() {
        let query = ListQuery::default();
        assert!(query.is_empty());
        assert!(query.matches(&ShoppingList::new("L1")));
    }

    #[test]
    fn test_tag_subset_match() {
        let list = ShoppingList::with_tags("L1", ["food".to_string(), "weekly".to_string()]);
        let query = ListQuery {
            tags: Some(["food".to_string()].into_iter().collect()),
            search_term: None,
        };
        assert!(query.matches(&list));

        let query = ListQuery {
            tags: Some(["food".to_string(), "monthly".to_string()].into_iter().collect()),
            search_term: None,
        };
        assert!(!query.matches(&list));
    }

    #[test]
    fn test_query_serialization_omits_absent_fields() {
        let json = serde_json::to_string(&ListQuery::default()).unwrap();
        assert_eq!(json, "{}");
    }
}

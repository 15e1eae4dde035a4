//! Durable Store Adapter
//!
//! Translates each domain operation into exactly one atomic write
//! transaction over the two record tables, using sequence operations to
//! keep the embedded id and item orderings consistent with the stored
//! values. Any `?` early return drops the uncommitted transaction, which
//! aborts it: a failed operation never leaves a partial write behind.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable};

use crate::domain::{
    ApplicationState, DomainError, DomainResult, ItemKind, ListQuery, ShoppingList,
    ShoppingListItem, StateRecord, Tag,
};
use crate::sequence::Sequence;

use super::db::{self, LIST_TABLE, STATE_TABLE, STATE_VERSION};

/// redb-backed store for shopping lists and the application state record.
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path` with the schema initialized.
    pub fn open(path: &Path) -> DomainResult<Self> {
        Ok(Self {
            db: Arc::new(db::open(path)?),
        })
    }

    /// Wrap an already-open database, possibly shared with other stores.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Rebuild the full application state from the durable records: the
    /// state record supplies tags, query and list order; each id is joined
    /// against the list table. One read transaction.
    pub async fn load_state(&self) -> DomainResult<ApplicationState> {
        let txn = self.db.begin_read()?;
        let lists = txn.open_table(LIST_TABLE)?;
        let states = txn.open_table(STATE_TABLE)?;

        let record = read_state(&states)?;
        let mut loaded: Vec<ShoppingList> = Vec::new();
        for id in record.shopping_lists.iter() {
            let guard = lists.get(id.as_str())?.ok_or_else(|| {
                log::error!("state record references missing list {}", id);
                DomainError::InvariantViolation(format!(
                    "state record references missing list {}",
                    id
                ))
            })?;
            loaded.push(serde_json::from_str(guard.value())?);
        }

        Ok(ApplicationState {
            tags: record.tags,
            query: record.query,
            shopping_lists: Sequence::from_vec(loaded),
            is_network_available: true,
        })
    }

    /// Put the list record and append its id to the state record's id
    /// sequence. A new list invalidates any active filter, so the query is
    /// cleared in the same transaction. Rejects duplicate ids.
    pub async fn add_list(&self, list: &ShoppingList) -> DomainResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            if lists.get(list.id.as_str())?.is_some() {
                return Err(DomainError::Conflict(format!(
                    "shopping list {} already exists",
                    list.id
                )));
            }
            write_list(&mut lists, list)?;

            let mut states = txn.open_table(STATE_TABLE)?;
            let mut state = read_state(&states)?;
            state.shopping_lists = state.shopping_lists.insert_back(list.id.clone());
            state.query = ListQuery::default();
            write_state(&mut states, &state)?;
        }
        txn.commit()?;
        log::debug!("added list {}", list.id);
        Ok(())
    }

    /// Delete the list record and remove its id from the state record's id
    /// sequence. A record that exists without a matching id in the sequence
    /// means the two stores disagree; the transaction aborts.
    pub async fn remove_list(&self, list_id: &str) -> DomainResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            if lists.remove(list_id)?.is_none() {
                return Err(DomainError::NotFound(format!(
                    "shopping list {} not found",
                    list_id
                )));
            }

            let mut states = txn.open_table(STATE_TABLE)?;
            let mut state = read_state(&states)?;
            let (extracted, rest) = state.shopping_lists.extract(|id| id.as_str() == list_id);
            if extracted.is_none() {
                log::error!("list {} has a record but no state-record id", list_id);
                return Err(DomainError::InvariantViolation(format!(
                    "list {} missing from state record",
                    list_id
                )));
            }
            state.shopping_lists = rest;
            write_state(&mut states, &state)?;
        }
        txn.commit()?;
        log::debug!("removed list {}", list_id);
        Ok(())
    }

    /// Set the pin flag on the list record and move its id to the front of
    /// the state record's sequence: pin order is most recently pinned
    /// first, by always moving to the front rather than sorting.
    pub async fn pin_list(&self, list_id: &str) -> DomainResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            let mut list = read_list(&lists, list_id)?;
            list.is_pinned = true;
            write_list(&mut lists, &list)?;

            let mut states = txn.open_table(STATE_TABLE)?;
            let mut state = read_state(&states)?;
            state.shopping_lists = state
                .shopping_lists
                .move_to_front(|id| id.as_str() == list_id)
                .map_err(|_| {
                    log::error!("list {} has a record but no state-record id", list_id);
                    DomainError::InvariantViolation(format!(
                        "list {} missing from state record",
                        list_id
                    ))
                })?;
            write_state(&mut states, &state)?;
        }
        txn.commit()?;
        log::debug!("pinned list {}", list_id);
        Ok(())
    }

    /// Union `tags` into both the list record and the state record's global
    /// tag cache, in one transaction.
    pub async fn add_tags_to_list(&self, list_id: &str, tags: &BTreeSet<Tag>) -> DomainResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            let mut list = read_list(&lists, list_id)?;
            list.tags = &list.tags | tags;
            write_list(&mut lists, &list)?;

            let mut states = txn.open_table(STATE_TABLE)?;
            let mut state = read_state(&states)?;
            state.tags = &state.tags | tags;
            write_state(&mut states, &state)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Set-difference counterpart of [`Store::add_tags_to_list`]. The global
    /// cache is denormalized: the tags are dropped from it even if another
    /// list still carries them.
    pub async fn remove_tags_from_list(
        &self,
        list_id: &str,
        tags: &BTreeSet<Tag>,
    ) -> DomainResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            let mut list = read_list(&lists, list_id)?;
            list.tags = &list.tags - tags;
            write_list(&mut lists, &list)?;

            let mut states = txn.open_table(STATE_TABLE)?;
            let mut state = read_state(&states)?;
            state.tags = &state.tags - tags;
            write_state(&mut states, &state)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Append an item to the list's item sequence.
    pub async fn add_list_item(
        &self,
        list_id: &str,
        item: &ShoppingListItem,
    ) -> DomainResult<()> {
        let item = item.clone();
        self.update_list(list_id, move |mut list| {
            list.items = list.items.insert_back(item);
            Ok(list)
        })
        .await
    }

    /// Reorder one item to sit immediately before a sibling. The sibling is
    /// resolved in the post-extraction sequence.
    pub async fn move_list_item(
        &self,
        list_id: &str,
        item_id: &str,
        before_sibling_id: &str,
    ) -> DomainResult<()> {
        let err = || {
            DomainError::NotFound(format!(
                "item {} or sibling {} not in list {}",
                item_id, before_sibling_id, list_id
            ))
        };
        let (item_id, sibling_id) = (item_id.to_string(), before_sibling_id.to_string());
        self.update_list(list_id, move |mut list| {
            list.items = list
                .items
                .move_before(|i| i.id == item_id, |s| s.id == sibling_id)
                .map_err(|_| err())?;
            Ok(list)
        })
        .await
    }

    /// Remove an item from the list's item sequence.
    pub async fn remove_list_item(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        let err = not_found(list_id, item_id);
        let item_id = item_id.to_string();
        self.update_list(list_id, move |mut list| {
            let (extracted, rest) = list.items.extract(|i| i.id == item_id);
            if extracted.is_none() {
                return Err(err);
            }
            list.items = rest;
            Ok(list)
        })
        .await
    }

    /// Replace the content of one item.
    pub async fn edit_list_item(
        &self,
        list_id: &str,
        item_id: &str,
        content: &str,
    ) -> DomainResult<()> {
        let err = not_found(list_id, item_id);
        let (item_id, content) = (item_id.to_string(), content.to_string());
        self.update_list(list_id, move |mut list| {
            list.items.find(|i| i.id == item_id).map_err(|_| err)?;
            list.items = list.items.map_matching(
                |i| i.id == item_id,
                |mut i| {
                    i.content = content;
                    i
                },
            );
            Ok(list)
        })
        .await
    }

    pub async fn mark_item_completed(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        self.set_item_kind(list_id, item_id, ItemKind::CompletedTask)
            .await
    }

    pub async fn mark_item_pending(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        self.set_item_kind(list_id, item_id, ItemKind::PendingTask)
            .await
    }

    async fn set_item_kind(
        &self,
        list_id: &str,
        item_id: &str,
        kind: ItemKind,
    ) -> DomainResult<()> {
        let err = not_found(list_id, item_id);
        let item_id = item_id.to_string();
        self.update_list(list_id, move |mut list| {
            list.items.find(|i| i.id == item_id).map_err(|_| err)?;
            list.items = list.items.map_matching(
                |i| i.id == item_id,
                |mut i| {
                    i.kind = kind;
                    i
                },
            );
            Ok(list)
        })
        .await
    }

    /// Read-modify-write of a single list record in one transaction. A
    /// failed edit aborts and writes nothing.
    async fn update_list<F>(&self, list_id: &str, edit: F) -> DomainResult<()>
    where
        F: FnOnce(ShoppingList) -> DomainResult<ShoppingList>,
    {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LIST_TABLE)?;
            let list = read_list(&lists, list_id)?;
            let list = edit(list)?;
            write_list(&mut lists, &list)?;
        }
        txn.commit()?;
        log::debug!("updated list {}", list_id);
        Ok(())
    }
}

fn not_found(list_id: &str, item_id: &str) -> DomainError {
    DomainError::NotFound(format!("item {} not in list {}", item_id, list_id))
}

fn read_list<T>(table: &T, list_id: &str) -> DomainResult<ShoppingList>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let guard = table.get(list_id)?.ok_or_else(|| {
        DomainError::NotFound(format!("shopping list {} not found", list_id))
    })?;
    Ok(serde_json::from_str(guard.value())?)
}

fn write_list(
    table: &mut redb::Table<'_, &'static str, &'static str>,
    list: &ShoppingList,
) -> DomainResult<()> {
    table.insert(list.id.as_str(), serde_json::to_string(list)?.as_str())?;
    Ok(())
}

fn read_state<T>(table: &T) -> DomainResult<StateRecord>
where
    T: ReadableTable<u32, &'static str>,
{
    let guard = table.get(STATE_VERSION)?.ok_or_else(|| {
        DomainError::InvariantViolation("state record missing".to_string())
    })?;
    Ok(serde_json::from_str(guard.value())?)
}

fn write_state(
    table: &mut redb::Table<'_, u32, &'static str>,
    state: &StateRecord,
) -> DomainResult<()> {
    table.insert(STATE_VERSION, serde_json::to_string(state)?.as_str())?;
    Ok(())
}

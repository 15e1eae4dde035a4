//! State Synchronizer
//!
//! `StateManager` owns the single in-memory mirror of application state and
//! is its only writer. Every action is initiate -> await the store
//! transaction -> apply the identical sequence edit to the mirror -> notify
//! subscribers. The mirror is never mutated before the durable commit
//! reports success, so it never shows a state the store cannot reproduce
//! after a reload; on abort the mirror is left exactly as it was.
//!
//! Ordering: actions on one list id are serialized end to end by a
//! per-list-id mutex, and actions that rewrite the shared state record are
//! additionally serialized by a global mutex, so commit order and mirror
//! order can never disagree. Lock order is state guard, then list guard,
//! then (after the store round-trip) the mirror itself.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::domain::{
    ApplicationState, DomainError, DomainResult, Entity, ListQuery, ShoppingList,
    ShoppingListItem, Tag, Uuid,
};
use crate::repository::Store;

/// The action surface consumed by the view layer: one method per action a
/// user can perform. These do not cover all possible state changes, only
/// those the user has control over.
#[async_trait]
pub trait Model: Send + Sync {
    async fn add_list(&self, list: ShoppingList) -> DomainResult<()>;
    async fn pin_list(&self, list_id: &str) -> DomainResult<()>;
    async fn remove_list(&self, list_id: &str) -> DomainResult<()>;
    async fn add_tags_to_list(&self, list_id: &str, tags: BTreeSet<Tag>) -> DomainResult<()>;
    async fn remove_tags_from_list(&self, list_id: &str, tags: BTreeSet<Tag>)
        -> DomainResult<()>;
    async fn add_list_item(&self, list_id: &str, item: ShoppingListItem) -> DomainResult<()>;
    async fn move_list_item(
        &self,
        list_id: &str,
        item_id: &str,
        before_sibling_id: &str,
    ) -> DomainResult<()>;
    async fn remove_list_item(&self, list_id: &str, item_id: &str) -> DomainResult<()>;
    async fn edit_list_item(&self, list_id: &str, item_id: &str, content: &str)
        -> DomainResult<()>;
    async fn mark_list_item_completed(&self, list_id: &str, item_id: &str) -> DomainResult<()>;
    async fn mark_list_item_pending(&self, list_id: &str, item_id: &str) -> DomainResult<()>;
}

/// Owns the mirror, drives the durable store, and republishes the mirror to
/// subscribers after each successful commit.
pub struct StateManager {
    store: Store,
    /// The mirror. Locked only briefly, after the store has committed.
    state: Mutex<ApplicationState>,
    /// Serializes actions that rewrite the shared state record.
    state_guard: Mutex<()>,
    /// At most one in-flight action per list id.
    list_guards: std::sync::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    notify: watch::Sender<ApplicationState>,
}

impl StateManager {
    /// Seed the mirror from the durable records.
    pub async fn load(store: Store) -> DomainResult<Self> {
        let state = store.load_state().await?;
        let (notify, _) = watch::channel(state.clone());
        Ok(Self {
            store,
            state: Mutex::new(state),
            state_guard: Mutex::new(()),
            list_guards: std::sync::Mutex::new(HashMap::new()),
            notify,
        })
    }

    /// A receiver that yields the full application state after every change.
    pub fn subscribe(&self) -> watch::Receiver<ApplicationState> {
        self.notify.subscribe()
    }

    /// Snapshot of the current mirror.
    pub async fn current_state(&self) -> ApplicationState {
        self.state.lock().await.clone()
    }

    /// Flip the informational connectivity flag and republish. Local writes
    /// are unaffected by it.
    pub async fn set_network_available(&self, available: bool) {
        let mut state = self.state.lock().await;
        state.is_network_available = available;
        self.notify.send_replace(state.clone());
    }

    fn list_guard(&self, list_id: &str) -> Arc<Mutex<()>> {
        let mut guards = self
            .list_guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guards.entry(list_id.to_string()).or_default().clone()
    }

    /// Forget the guard of a removed list so the map stays bounded by live
    /// lists. Tasks already holding a clone keep serializing among themselves.
    fn drop_list_guard(&self, list_id: &str) {
        let mut guards = self
            .list_guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guards.remove(list_id);
    }

    /// Compute the post-commit mirror edit on a clone and swap it in, so a
    /// failing edit observably changes nothing. Publishes on success.
    async fn apply_mirror<F>(&self, edit: F) -> DomainResult<()>
    where
        F: FnOnce(ApplicationState) -> DomainResult<ApplicationState>,
    {
        let mut state = self.state.lock().await;
        let next = edit(state.clone())?;
        *state = next;
        self.notify.send_replace(state.clone());
        Ok(())
    }
}

/// Id predicate for sequence edits.
fn by_id<E: Entity>(id: &str) -> impl Fn(&E) -> bool + '_ {
    move |entity| entity.id() == id
}

/// The store committed an edit the mirror cannot replay: the two copies
/// have drifted, which is a defect, not a recoverable condition.
fn drift(list_id: &str) -> DomainError {
    log::error!("mirror out of step with store for list {}", list_id);
    DomainError::InvariantViolation(format!("mirror out of step with store for list {}", list_id))
}

#[async_trait]
impl Model for StateManager {
    async fn add_list(&self, list: ShoppingList) -> DomainResult<()> {
        let _state_guard = self.state_guard.lock().await;
        let guard = self.list_guard(&list.id);
        let _list_guard = guard.lock().await;

        self.store.add_list(&list).await?;

        self.apply_mirror(move |mut state| {
            state.shopping_lists = state.shopping_lists.insert_back(list);
            state.query = ListQuery::default();
            Ok(state)
        })
        .await
    }

    async fn pin_list(&self, list_id: &str) -> DomainResult<()> {
        let _state_guard = self.state_guard.lock().await;
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.pin_list(list_id).await?;

        self.apply_mirror(|mut state| {
            state.shopping_lists = state
                .shopping_lists
                .map_matching(by_id(list_id), |mut list| {
                    list.is_pinned = true;
                    list
                })
                .move_to_front(by_id(list_id))
                .map_err(|_| drift(list_id))?;
            Ok(state)
        })
        .await
    }

    async fn remove_list(&self, list_id: &str) -> DomainResult<()> {
        let _state_guard = self.state_guard.lock().await;
        {
            let guard = self.list_guard(list_id);
            let _list_guard = guard.lock().await;

            self.store.remove_list(list_id).await?;

            self.apply_mirror(|mut state| {
                let (extracted, rest) = state.shopping_lists.extract(by_id(list_id));
                if extracted.is_none() {
                    return Err(drift(list_id));
                }
                state.shopping_lists = rest;
                Ok(state)
            })
            .await?;
        }
        self.drop_list_guard(list_id);
        Ok(())
    }

    async fn add_tags_to_list(&self, list_id: &str, tags: BTreeSet<Tag>) -> DomainResult<()> {
        let _state_guard = self.state_guard.lock().await;
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.add_tags_to_list(list_id, &tags).await?;

        self.apply_mirror(move |mut state| {
            state.shopping_lists.find(by_id(list_id)).map_err(|_| drift(list_id))?;
            state.tags = &state.tags | &tags;
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.tags = &list.tags | &tags;
                list
            });
            Ok(state)
        })
        .await
    }

    async fn remove_tags_from_list(
        &self,
        list_id: &str,
        tags: BTreeSet<Tag>,
    ) -> DomainResult<()> {
        let _state_guard = self.state_guard.lock().await;
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.remove_tags_from_list(list_id, &tags).await?;

        self.apply_mirror(move |mut state| {
            state.shopping_lists.find(by_id(list_id)).map_err(|_| drift(list_id))?;
            state.tags = &state.tags - &tags;
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.tags = &list.tags - &tags;
                list
            });
            Ok(state)
        })
        .await
    }

    async fn add_list_item(&self, list_id: &str, item: ShoppingListItem) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.add_list_item(list_id, &item).await?;

        self.apply_mirror(move |mut state| {
            state.shopping_lists.find(by_id(list_id)).map_err(|_| drift(list_id))?;
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.items = list.items.insert_back(item);
                list
            });
            Ok(state)
        })
        .await
    }

    async fn move_list_item(
        &self,
        list_id: &str,
        item_id: &str,
        before_sibling_id: &str,
    ) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store
            .move_list_item(list_id, item_id, before_sibling_id)
            .await?;

        self.apply_mirror(|mut state| {
            let list = state
                .shopping_lists
                .find(by_id(list_id))
                .map_err(|_| drift(list_id))?;
            let items = list
                .items
                .clone()
                .move_before(by_id(item_id), by_id(before_sibling_id))
                .map_err(|_| drift(list_id))?;
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.items = items;
                list
            });
            Ok(state)
        })
        .await
    }

    async fn remove_list_item(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.remove_list_item(list_id, item_id).await?;

        self.apply_mirror(|mut state| {
            let list = state
                .shopping_lists
                .find(by_id(list_id))
                .map_err(|_| drift(list_id))?;
            let (extracted, items) = list.items.clone().extract(by_id(item_id));
            if extracted.is_none() {
                return Err(drift(list_id));
            }
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.items = items;
                list
            });
            Ok(state)
        })
        .await
    }

    async fn edit_list_item(
        &self,
        list_id: &str,
        item_id: &str,
        content: &str,
    ) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.edit_list_item(list_id, item_id, content).await?;

        self.edit_item_in_mirror(list_id, item_id, |item| {
            item.content = content.to_string();
        })
        .await
    }

    async fn mark_list_item_completed(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.mark_item_completed(list_id, item_id).await?;

        self.edit_item_in_mirror(list_id, item_id, |item| {
            item.kind = crate::domain::ItemKind::CompletedTask;
        })
        .await
    }

    async fn mark_list_item_pending(&self, list_id: &str, item_id: &str) -> DomainResult<()> {
        let guard = self.list_guard(list_id);
        let _list_guard = guard.lock().await;

        self.store.mark_item_pending(list_id, item_id).await?;

        self.edit_item_in_mirror(list_id, item_id, |item| {
            item.kind = crate::domain::ItemKind::PendingTask;
        })
        .await
    }
}

impl StateManager {
    /// Shared mirror edit for per-item field updates: the same
    /// first-match replacement the store applied.
    async fn edit_item_in_mirror<F>(&self, list_id: &str, item_id: &str, f: F) -> DomainResult<()>
    where
        F: FnOnce(&mut ShoppingListItem) + Send,
    {
        self.apply_mirror(|mut state| {
            let list = state
                .shopping_lists
                .find(by_id(list_id))
                .map_err(|_| drift(list_id))?;
            list.items.find(by_id(item_id)).map_err(|_| drift(list_id))?;
            let items = list.items.clone().map_matching(by_id(item_id), |mut item| {
                f(&mut item);
                item
            });
            state.shopping_lists = state.shopping_lists.map_matching(by_id(list_id), |mut list| {
                list.items = items;
                list
            });
            Ok(state)
        })
        .await
    }
}

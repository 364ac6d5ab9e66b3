//! Draft Manager
//!
//! Owns the locally edited order of one ranking. Edits are persisted under a
//! per-ranking key after a quiet period, survive reloads, and are either
//! committed to the server (`save_draft`) or thrown away (`discard_draft`).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use leptos_dragdrop::{apply_drop, DropTarget};
use tokio::sync::Mutex;

use crate::config::CacheConfig;
use crate::debounce::Debouncer;
use crate::error::{DraftError, DraftResult};
use crate::models::{ids_of, same_order, Item, ItemLookup, Ranking, StoredDraft};
use crate::observable::{Observable, Subscription};
use crate::remote::RankingApi;
use crate::runtime;
use crate::store::{get_json, set_json, CacheStore};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq)]
pub struct DraftState {
    /// Working order shown to the user
    pub items: Vec<Item>,
    pub has_draft: bool,
    /// Working order differs positionally from the committed order
    pub is_dirty: bool,
    pub is_saving: bool,
    pub last_error: Option<DraftError>,
}

#[derive(Clone)]
pub struct DraftManager {
    inner: Rc<Inner>,
}

struct Inner {
    ranking_id: String,
    key: String,
    store: Rc<dyn CacheStore>,
    api: Rc<dyn RankingApi>,
    committed: RefCell<Vec<Item>>,
    state: Rc<Observable<DraftState>>,
    persist: Debouncer<StoredDraft>,
    /// Serializes draft writes and deletes on `key`
    write_lock: Rc<Mutex<()>>,
    /// Bumped by every discard; a save that sees a different value on
    /// completion was abandoned by the user
    epoch: Cell<u64>,
}

impl DraftManager {
    /// Build the manager for `ranking`, restoring a persisted draft when
    /// every id in it still resolves against the ranking's items or the
    /// catalog.
    pub async fn load(
        ranking: Ranking,
        catalog: Option<&ItemLookup>,
        store: Rc<dyn CacheStore>,
        api: Rc<dyn RankingApi>,
        config: &CacheConfig,
    ) -> Self {
        let key = config.draft_key(&ranking.id);
        let committed = ranking.items;

        let restored = rehydrate(store.as_ref(), &key, &committed, catalog).await;
        let has_draft = restored.is_some();
        let items = restored.unwrap_or_else(|| committed.clone());
        let is_dirty = !same_order(&items, &committed);

        let write_lock = Rc::new(Mutex::new(()));
        let persist = {
            let store = store.clone();
            let key = key.clone();
            let lock = write_lock.clone();
            Debouncer::new(config.debounce(), move |draft: StoredDraft| {
                let store = store.clone();
                let key = key.clone();
                let lock = lock.clone();
                async move {
                    let _guard = lock.lock().await;
                    match set_json(store.as_ref(), &key, &draft).await {
                        Ok(()) => log::debug!("Persisted {} ({} items)", key, draft.item_ids.len()),
                        Err(e) => log::warn!("Failed to persist {}: {}", key, e),
                    }
                }
            })
        };

        Self {
            inner: Rc::new(Inner {
                ranking_id: ranking.id,
                key,
                store,
                api,
                committed: RefCell::new(committed),
                state: Observable::new(DraftState {
                    items,
                    has_draft,
                    is_dirty,
                    is_saving: false,
                    last_error: None,
                }),
                persist,
                write_lock,
                epoch: Cell::new(0),
            }),
        }
    }

    pub fn ranking_id(&self) -> &str {
        &self.inner.ranking_id
    }

    pub fn snapshot(&self) -> DraftState {
        self.inner.state.get()
    }

    pub fn items(&self) -> Vec<Item> {
        self.inner.state.with(|s| s.items.clone())
    }

    pub fn committed(&self) -> Vec<Item> {
        self.inner.committed.borrow().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.state.with(|s| s.is_dirty)
    }

    pub fn has_draft(&self) -> bool {
        self.inner.state.with(|s| s.has_draft)
    }

    pub fn is_saving(&self) -> bool {
        self.inner.state.with(|s| s.is_saving)
    }

    pub fn last_error(&self) -> Option<DraftError> {
        self.inner.state.with(|s| s.last_error.clone())
    }

    pub fn subscribe(&self, listener: impl Fn(&DraftState) + 'static) -> Subscription {
        self.inner.state.subscribe(listener)
    }

    /// Replace the working order and (re)arm the persistence timer.
    /// Re-submitting the current draft order is a no-op.
    pub fn update_draft(&self, items: Vec<Item>) {
        let inner = &self.inner;
        if inner.state.with(|s| s.has_draft && same_order(&s.items, &items)) {
            return;
        }
        let is_dirty = !same_order(&items, &inner.committed.borrow());
        let draft = StoredDraft {
            item_ids: ids_of(&items),
            updated_at: runtime::now_millis(),
        };
        inner.state.update(|s| {
            s.items = items;
            s.has_draft = true;
            s.is_dirty = is_dirty;
        });
        inner.persist.schedule(draft);
    }

    /// Apply a finished drag to the working order. Returns false when the
    /// drop changes nothing.
    pub fn move_item(&self, dragged: &str, target: &DropTarget) -> bool {
        let next = self
            .inner
            .state
            .with(|s| apply_drop(s.items.as_slice(), |item| item.id.as_str(), dragged, target));
        match next {
            Some(items) => {
                self.update_draft(items);
                true
            }
            None => false,
        }
    }

    /// Write a pending draft now (page hide, route change)
    pub async fn flush(&self) {
        self.inner.persist.flush().await;
    }

    /// Commit the working order. On failure the draft and its persisted copy
    /// stay put and the error is both returned and kept in `last_error`.
    pub async fn save_draft(&self) -> DraftResult<()> {
        let inner = &self.inner;
        if inner.state.with(|s| s.is_saving) {
            return Err(DraftError::SaveInProgress);
        }
        let sending = self.items();
        let epoch = inner.epoch.get();
        inner.state.update(|s| {
            s.is_saving = true;
            s.last_error = None;
        });

        let result = inner.api.commit_ranking(&inner.ranking_id, &ids_of(&sending)).await;

        // discarded mid-flight; `is_saving` was already reset and may belong
        // to a newer save by now
        if inner.epoch.get() != epoch {
            log::info!("Save of ranking {} finished after discard, ignoring result", inner.ranking_id);
            return result.map_err(DraftError::SaveFailed);
        }

        match result {
            Ok(()) => {
                log::info!("Saved ranking {} ({} items)", inner.ranking_id, sending.len());
                *inner.committed.borrow_mut() = sending.clone();
                if inner.state.with(|s| same_order(&s.items, &sending)) {
                    inner.persist.cancel();
                    inner.state.update(|s| {
                        s.is_saving = false;
                        s.has_draft = false;
                        s.is_dirty = false;
                    });
                    inner.clear_persisted().await;
                } else {
                    // edited while the request was in flight; keep those edits
                    inner.state.update(|s| {
                        s.is_saving = false;
                        s.is_dirty = true;
                    });
                }
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save ranking {}: {}", inner.ranking_id, e);
                let error = DraftError::SaveFailed(e);
                inner.state.update(|s| {
                    s.is_saving = false;
                    s.last_error = Some(error.clone());
                });
                Err(error)
            }
        }
    }

    /// Revert to the committed order and forget the persisted draft.
    /// Local state resets before the storage delete is awaited. A save still
    /// in flight is abandoned: its result is ignored and a new save may start.
    pub async fn discard_draft(&self) {
        let inner = &self.inner;
        inner.epoch.set(inner.epoch.get() + 1);
        inner.persist.cancel();
        let committed = self.committed();
        inner.state.update(|s| {
            s.items = committed;
            s.has_draft = false;
            s.is_dirty = false;
            s.is_saving = false;
            s.last_error = None;
        });
        inner.clear_persisted().await;
    }

    /// The committed order changed outside this manager (fresh fetch).
    /// Applied to the working copy only when no draft is active.
    pub fn set_committed(&self, items: Vec<Item>) {
        let inner = &self.inner;
        *inner.committed.borrow_mut() = items.clone();
        if inner.state.with(|s| s.has_draft) {
            let is_dirty = inner.state.with(|s| !same_order(&s.items, &items));
            inner.state.update(|s| s.is_dirty = is_dirty);
        } else {
            inner.state.update(|s| {
                s.items = items;
                s.is_dirty = false;
            });
        }
    }
}

impl Inner {
    async fn clear_persisted(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.delete(&self.key).await {
            log::warn!("Failed to clear {}: {}", self.key, e);
        }
    }
}

/// Resolve a persisted draft, or drop it if any id no longer resolves
async fn rehydrate(
    store: &dyn CacheStore,
    key: &str,
    committed: &[Item],
    catalog: Option<&ItemLookup>,
) -> Option<Vec<Item>> {
    let draft: StoredDraft = match get_json(store, key).await {
        Ok(Some(draft)) => draft,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Draft {} unreadable, ignoring: {}", key, e);
            return None;
        }
    };

    let known: HashMap<&str, &Item> = committed.iter().map(|item| (item.id.as_str(), item)).collect();
    let resolved: Option<Vec<Item>> = draft
        .item_ids
        .iter()
        .map(|id| {
            known
                .get(id.as_str())
                .copied()
                .or_else(|| catalog.and_then(|c| c.get(id)))
                .cloned()
        })
        .collect();

    match resolved {
        Some(items) => {
            log::info!("Restored draft {} ({} items)", key, items.len());
            Some(items)
        }
        None => {
            log::warn!("Draft {} references unknown items, discarding", key);
            if let Err(e) = store.delete(key).await {
                log::warn!("Failed to remove stale draft {}: {}", key, e);
            }
            None
        }
    }
}

//! Draft manager tests: debounced persistence, save/discard, rehydration.

use std::future::Future;
use std::time::Duration;

use tokio::task::LocalSet;

use super::*;
use crate::error::ApiError;
use crate::store::MemoryStore;
use crate::testing::{items, FakeApi, SlowStore};

const KEY: &str = "ranking_draft_r1";

fn config() -> CacheConfig {
    CacheConfig {
        debounce_ms: 100,
        ..CacheConfig::default()
    }
}

fn ranking(ids: &[&str]) -> Ranking {
    Ranking {
        id: "r1".to_string(),
        version: 1,
        items: items(ids),
        zones: Vec::new(),
    }
}

async fn local<F: Future<Output = ()>>(test: F) {
    LocalSet::new().run_until(test).await;
}

async fn load(store: &Rc<MemoryStore>, api: &Rc<FakeApi>, ids: &[&str], catalog: Option<&ItemLookup>) -> DraftManager {
    DraftManager::load(ranking(ids), catalog, store.clone(), api.clone(), &config()).await
}

fn order(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

async fn persisted(store: &MemoryStore) -> Option<Vec<String>> {
    get_json::<StoredDraft>(store, KEY).await.unwrap().map(|d| d.item_ids)
}

async fn settle() {
    runtime::sleep(Duration::from_millis(250)).await;
}

#[tokio::test(start_paused = true)]
async fn test_reorder_then_discard() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b", "c"], None).await;
        assert!(!manager.is_dirty());

        manager.update_draft(items(&["c", "a", "b"]));
        assert!(manager.is_dirty());
        assert!(manager.has_draft());

        manager.discard_draft().await;
        assert_eq!(order(&manager.items()), vec!["a", "b", "c"]);
        assert!(!manager.is_dirty());
        assert!(!manager.has_draft());

        settle().await;
        assert_eq!(persisted(&store).await, None);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_persistence_is_debounced_to_latest() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b", "c"], None).await;

        manager.update_draft(items(&["b", "a", "c"]));
        runtime::sleep(Duration::from_millis(50)).await;
        manager.update_draft(items(&["c", "b", "a"]));
        runtime::sleep(Duration::from_millis(50)).await;
        assert_eq!(persisted(&store).await, None);

        settle().await;
        assert_eq!(persisted(&store).await, Some(vec!["c".into(), "b".into(), "a".into()]));
        assert_eq!(store.write_count(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_update_is_idempotent() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b"], None).await;

        manager.update_draft(items(&["b", "a"]));
        let dirty = manager.is_dirty();
        settle().await;
        manager.update_draft(items(&["b", "a"]));
        settle().await;

        assert_eq!(manager.is_dirty(), dirty);
        assert_eq!(store.write_count(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_reorder_back_to_committed_is_clean() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b"], None).await;

        manager.update_draft(items(&["b", "a"]));
        manager.update_draft(items(&["a", "b"]));
        assert!(!manager.is_dirty());
        assert!(manager.has_draft());

        manager.update_draft(items(&["a"]));
        assert!(manager.is_dirty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_save_commits_and_clears_draft() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b", "c"], None).await;

        manager.update_draft(items(&["c", "a", "b"]));
        settle().await;
        assert!(persisted(&store).await.is_some());

        manager.save_draft().await.unwrap();

        assert_eq!(
            *api.commits.borrow(),
            vec![("r1".to_string(), vec!["c".to_string(), "a".to_string(), "b".to_string()])]
        );
        assert!(!manager.has_draft());
        assert!(!manager.is_dirty());
        assert!(!manager.is_saving());
        assert_eq!(order(&manager.committed()), vec!["c", "a", "b"]);
        assert_eq!(persisted(&store).await, None);

        // reload from what the server now holds
        let reloaded = load(&store, &api, &["c", "a", "b"], None).await;
        assert_eq!(order(&reloaded.items()), vec!["c", "a", "b"]);
        assert!(!reloaded.has_draft());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_save_clears_pending_write() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b"], None).await;

        manager.update_draft(items(&["b", "a"]));
        manager.save_draft().await.unwrap();
        settle().await;

        assert_eq!(persisted(&store).await, None);
        assert_eq!(store.write_count(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_save_failure_keeps_draft() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        api.fail_commit.set(true);
        let manager = load(&store, &api, &["a", "b"], None).await;

        manager.update_draft(items(&["b", "a"]));
        manager.flush().await;

        let err = manager.save_draft().await.unwrap_err();
        assert!(matches!(err, DraftError::SaveFailed(ApiError::Status(500, _))));
        assert_eq!(manager.last_error(), Some(err));
        assert!(manager.has_draft());
        assert!(manager.is_dirty());
        assert!(!manager.is_saving());
        assert_eq!(persisted(&store).await, Some(vec!["b".into(), "a".into()]));

        // retry succeeds
        api.fail_commit.set(false);
        manager.save_draft().await.unwrap();
        assert!(manager.last_error().is_none());
        assert!(!manager.has_draft());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_second_save_while_saving_is_rejected() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        api.latency.set(Some(Duration::from_millis(100)));
        let manager = load(&store, &api, &["a", "b"], None).await;
        manager.update_draft(items(&["b", "a"]));

        let first = manager.clone();
        let pending = tokio::task::spawn_local(async move { first.save_draft().await });
        runtime::sleep(Duration::from_millis(10)).await;
        assert!(manager.is_saving());
        assert_eq!(manager.save_draft().await, Err(DraftError::SaveInProgress));

        pending.await.unwrap().unwrap();
        assert_eq!(api.commits.borrow().len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_edits_during_save_survive() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        api.latency.set(Some(Duration::from_millis(100)));
        let manager = load(&store, &api, &["a", "b", "c"], None).await;
        manager.update_draft(items(&["b", "a", "c"]));

        let first = manager.clone();
        let pending = tokio::task::spawn_local(async move { first.save_draft().await });
        runtime::sleep(Duration::from_millis(10)).await;
        manager.update_draft(items(&["c", "b", "a"]));
        pending.await.unwrap().unwrap();

        assert_eq!(order(&manager.committed()), vec!["b", "a", "c"]);
        assert_eq!(order(&manager.items()), vec!["c", "b", "a"]);
        assert!(manager.has_draft());
        assert!(manager.is_dirty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_discard_during_save_ignores_late_success() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        api.latency.set(Some(Duration::from_millis(100)));
        let manager = load(&store, &api, &["a", "b"], None).await;
        manager.update_draft(items(&["b", "a"]));

        let first = manager.clone();
        let pending = tokio::task::spawn_local(async move { first.save_draft().await });
        runtime::sleep(Duration::from_millis(10)).await;
        manager.discard_draft().await;
        assert_eq!(order(&manager.items()), vec!["a", "b"]);
        assert!(!manager.is_saving());

        pending.await.unwrap().unwrap();
        assert_eq!(api.commits.borrow().len(), 1);
        assert_eq!(order(&manager.items()), vec!["a", "b"]);
        assert_eq!(order(&manager.committed()), vec!["a", "b"]);
        assert!(!manager.has_draft());
        assert!(!manager.is_saving());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_rehydrates_valid_draft() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let first = load(&store, &api, &["a", "b", "c"], None).await;
        first.update_draft(items(&["b", "c", "a"]));
        first.flush().await;
        drop(first);

        let manager = load(&store, &api, &["a", "b", "c"], None).await;
        assert_eq!(order(&manager.items()), vec!["b", "c", "a"]);
        assert!(manager.has_draft());
        assert!(manager.is_dirty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_rehydrate_resolves_through_catalog() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        set_json(store.as_ref(), KEY, &StoredDraft {
            item_ids: vec!["b".into(), "new".into(), "a".into()],
            updated_at: 0,
        })
        .await
        .unwrap();
        let catalog: ItemLookup = items(&["new"]).into_iter().map(|i| (i.id.clone(), i)).collect();

        let manager = load(&store, &api, &["a", "b"], Some(&catalog)).await;
        assert_eq!(order(&manager.items()), vec!["b", "new", "a"]);
        assert_eq!(manager.items()[1].name, "NEW");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_draft_is_discarded() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        set_json(store.as_ref(), KEY, &StoredDraft {
            item_ids: vec!["b".into(), "x".into(), "a".into()],
            updated_at: 0,
        })
        .await
        .unwrap();

        let manager = load(&store, &api, &["a", "b"], None).await;
        assert_eq!(order(&manager.items()), vec!["a", "b"]);
        assert!(!manager.is_dirty());
        assert!(!manager.has_draft());
        assert_eq!(persisted(&store).await, None);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_external_change_respects_active_draft() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b", "c"], None).await;

        manager.set_committed(items(&["c", "b", "a"]));
        assert_eq!(order(&manager.items()), vec!["c", "b", "a"]);
        assert!(!manager.is_dirty());

        manager.update_draft(items(&["a", "c", "b"]));
        manager.set_committed(items(&["b", "a", "c"]));
        assert_eq!(order(&manager.items()), vec!["a", "c", "b"]);
        assert!(manager.is_dirty());

        manager.set_committed(items(&["a", "c", "b"]));
        assert!(!manager.is_dirty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_storage_failures_are_not_fatal() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        store.set_available(false);
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b"], None).await;

        manager.update_draft(items(&["b", "a"]));
        settle().await;
        assert!(manager.is_dirty());

        manager.save_draft().await.unwrap();
        assert!(!manager.has_draft());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_dirty_transitions() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b"], None).await;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = manager.subscribe(move |s| sink.borrow_mut().push(s.is_dirty));

        manager.update_draft(items(&["b", "a"]));
        manager.discard_draft().await;

        assert_eq!(*seen.borrow(), vec![true, false]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_drag_drop_moves_item() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        let manager = load(&store, &api, &["a", "b", "c"], None).await;

        assert!(!manager.move_item("a", &DropTarget::Slot(1)));
        assert!(!manager.has_draft());

        assert!(manager.move_item("c", &DropTarget::Item("a".to_string())));
        assert_eq!(order(&manager.items()), vec!["c", "a", "b"]);
        assert!(manager.is_dirty());

        settle().await;
        assert_eq!(persisted(&store).await, Some(vec!["c".to_string(), "a".to_string(), "b".to_string()]));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_flush_waits_for_write_in_progress() {
    local(async {
        let store = Rc::new(SlowStore::new(Duration::from_millis(100)));
        let api = Rc::new(FakeApi::default());
        let manager = DraftManager::load(ranking(&["a", "b", "c"]), None, store.clone(), api.clone(), &config()).await;

        manager.update_draft(items(&["b", "a", "c"]));
        // timer fired at 100ms; the write is still suspended
        runtime::sleep(Duration::from_millis(120)).await;
        manager.update_draft(items(&["c", "b", "a"]));
        manager.flush().await;

        assert_eq!(persisted(&store.inner).await, Some(vec!["c".to_string(), "b".to_string(), "a".to_string()]));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_new_save_allowed_after_discarding_in_flight_save() {
    local(async {
        let store = Rc::new(MemoryStore::new());
        let api = Rc::new(FakeApi::default());
        api.latency.set(Some(Duration::from_millis(100)));
        let manager = load(&store, &api, &["a", "b"], None).await;
        manager.update_draft(items(&["b", "a"]));

        let first = manager.clone();
        let abandoned = tokio::task::spawn_local(async move { first.save_draft().await });
        runtime::sleep(Duration::from_millis(10)).await;
        manager.discard_draft().await;

        manager.update_draft(items(&["b", "a"]));
        let second = manager.clone();
        let current = tokio::task::spawn_local(async move { second.save_draft().await });
        runtime::sleep(Duration::from_millis(10)).await;
        assert!(manager.is_saving());

        // the abandoned request resolves first and must not clear the flag
        abandoned.await.unwrap().unwrap();
        assert!(manager.is_saving());

        current.await.unwrap().unwrap();
        assert!(!manager.is_saving());
        assert!(!manager.has_draft());
        assert_eq!(order(&manager.committed()), vec!["b", "a"]);
        assert_eq!(api.commits.borrow().len(), 2);
    })
    .await;
}

//! Leptos Bindings
//!
//! Mirror the framework-free state holders into Leptos signals. Each handle
//! owns its subscription; dropping the last clone stops the updates.

use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{bind_global_mouseup, create_dnd_signals, DndSignals, DropTarget};

use crate::catalog::{CatalogState, CatalogSync};
use crate::draft::{DraftManager, DraftState};
use crate::error::{CatalogError, DraftError};
use crate::models::Item;
use crate::network::NetworkStatus;
use crate::observable::Subscription;

/// Reactive `{items, is_loading, error}` view of the catalog
#[derive(Clone)]
pub struct CatalogHandle {
    pub state: ReadSignal<CatalogState>,
    _subscription: Rc<Subscription>,
}

impl CatalogHandle {
    pub fn items(&self) -> Option<Arc<Vec<Item>>> {
        self.state.with(|s| s.items.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.is_loading)
    }

    pub fn error(&self) -> Option<CatalogError> {
        self.state.with(|s| s.error.clone())
    }
}

pub fn use_catalog(sync: &CatalogSync) -> CatalogHandle {
    let (state, set_state) = signal(sync.snapshot());
    let subscription = sync.subscribe(move |next| set_state.set(next.clone()));
    CatalogHandle {
        state,
        _subscription: Rc::new(subscription),
    }
}

/// Reactive draft view plus the edit/save/discard actions
#[derive(Clone)]
pub struct DraftHandle {
    pub state: ReadSignal<DraftState>,
    manager: DraftManager,
    _subscription: Rc<Subscription>,
}

impl DraftHandle {
    pub fn items(&self) -> Vec<Item> {
        self.state.with(|s| s.items.clone())
    }

    pub fn is_dirty(&self) -> bool {
        self.state.with(|s| s.is_dirty)
    }

    pub fn is_saving(&self) -> bool {
        self.state.with(|s| s.is_saving)
    }

    pub fn last_error(&self) -> Option<DraftError> {
        self.state.with(|s| s.last_error.clone())
    }

    pub fn update_draft(&self, items: Vec<Item>) {
        self.manager.update_draft(items);
    }

    /// Wire to `leptos_dragdrop::bind_global_mouseup`
    pub fn on_drop(&self, dragged: String, target: DropTarget) {
        self.manager.move_item(&dragged, &target);
    }

    /// Fire and forget; failures land in `last_error`
    pub fn save_draft(&self) {
        let manager = self.manager.clone();
        spawn_local(async move {
            let _ = manager.save_draft().await;
        });
    }

    pub fn discard_draft(&self) {
        let manager = self.manager.clone();
        spawn_local(async move {
            manager.discard_draft().await;
        });
    }

    pub fn manager(&self) -> &DraftManager {
        &self.manager
    }
}

pub fn use_draft(manager: DraftManager) -> DraftHandle {
    let (state, set_state) = signal(manager.snapshot());
    let subscription = manager.subscribe(move |next| set_state.set(next.clone()));
    DraftHandle {
        state,
        manager,
        _subscription: Rc::new(subscription),
    }
}

/// Drag state for a draft list. Global listeners live for the page, so
/// call once per mounted list.
pub fn use_draft_dnd(handle: &DraftHandle) -> DndSignals {
    let dnd = create_dnd_signals();
    let handle = handle.clone();
    bind_global_mouseup(dnd, move |dragged, target| handle.on_drop(dragged, target));
    dnd
}

/// Online flag as a signal; keep the subscription alive alongside it
pub fn use_online(network: &NetworkStatus) -> (ReadSignal<bool>, Subscription) {
    let (online, set_online) = signal(network.is_online());
    let subscription = network.subscribe(move |now| set_online.set(*now));
    (online, subscription)
}

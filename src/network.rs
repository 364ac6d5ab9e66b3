//! Online/offline signal
//!
//! Wraps the runtime's connectivity flag in an observable so the catalog
//! sync can react to reconnects.

use std::rc::Rc;

use crate::observable::{Observable, Subscription};

#[derive(Clone)]
pub struct NetworkStatus {
    online: Rc<Observable<bool>>,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        Self {
            online: Observable::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.get()
    }

    /// Record a connectivity change; repeated values are not re-broadcast
    pub fn set_online(&self, online: bool) {
        if self.online.get() != online {
            log::info!("Network status changed: online={}", online);
            self.online.set(online);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.online.subscribe(listener)
    }

    /// Seed from `navigator.onLine` and follow the window's
    /// `online`/`offline` events for the page lifetime.
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> Self {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::JsCast;

        let Some(win) = web_sys::window() else {
            return Self::new(false);
        };
        let status = Self::new(win.navigator().on_line());

        for (event, online) in [("online", true), ("offline", false)] {
            let target = status.clone();
            let handler = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
                target.set_online(online);
            });
            let _ = win.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref());
            handler.forget();
        }
        status
    }
}

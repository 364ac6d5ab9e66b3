//! Event-loop helpers
//!
//! The browser build runs on the JS event loop; native builds (tests) use a
//! tokio current-thread runtime inside a `LocalSet`.

use std::future::Future;
use std::time::Duration;

/// Spawn a non-`Send` task on the current event loop
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(future);

    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_local(future);
    }
}

pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}

/// Unix millis
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

//! Single-flight coordination for token refresh.
//!
//! Any number of requests may observe the refresh-needed signal during the
//! same expiring-token window; only one refresh call may go out. The first
//! observer starts the refresh and installs its future in the shared slot;
//! later observers await that same future and all see one outcome, success
//! or failure alike.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;

type SharedRefresh = Shared<BoxFuture<'static, Option<String>>>;

/// Gate holding the refresh currently in flight, if any.
#[derive(Default)]
pub struct RefreshGate {
    inflight: Mutex<Option<SharedRefresh>>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight refresh, or start one with `start` if none exists.
    ///
    /// The slot is cleared once the refresh settles; the pointer check keeps
    /// a slow waiter from evicting a newer refresh installed after its own
    /// completed.
    pub async fn run<F>(&self, start: F) -> Option<String>
    where
        F: FnOnce() -> BoxFuture<'static, Option<String>>,
    {
        let fut = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let fut = start().shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let outcome = fut.clone().await;

        let mut slot = self.inflight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&fut)) {
            *slot = None;
        }
        outcome
    }
}

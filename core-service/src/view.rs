//! Guards against updating a view after it was torn down.
//!
//! Fetches are never cancelled. A screen owns a [`ViewScope`] and hands
//! [`ViewHandle`]s to its tasks; once the scope is closed or dropped, results
//! that arrive later are discarded instead of applied.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Lifetime of a view. Closing or dropping it deactivates every handle.
#[derive(Debug)]
pub struct ViewScope {
    active: Arc<AtomicBool>,
}

/// Cloneable observer of a [`ViewScope`].
#[derive(Debug, Clone)]
pub struct ViewHandle {
    active: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn handle(&self) -> ViewHandle {
        ViewHandle {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl ViewHandle {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run `future` to completion and return its output only if the view is
    /// still active afterwards.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        let output = future.await;
        if self.is_active() {
            Some(output)
        } else {
            debug!("View closed before the result arrived; discarding");
            None
        }
    }

    /// Call `apply` with `value` if the view is still active.
    pub fn apply<T>(&self, value: T, apply: impl FnOnce(T)) -> bool {
        if !self.is_active() {
            return false;
        }
        apply(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_results_after_close_are_discarded() {
        let scope = ViewScope::new();
        let handle = scope.handle();

        assert_eq!(handle.run(async { 7 }).await, Some(7));

        let pending = {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .run(async {
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        "surah list"
                    })
                    .await
            })
        };
        drop(scope);

        assert_eq!(pending.await.unwrap(), None);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_apply_only_while_active() {
        let scope = ViewScope::new();
        let handle = scope.handle();
        let mut applied = Vec::new();

        assert!(handle.apply(1, |v| applied.push(v)));
        scope.close();
        assert!(!handle.apply(2, |v| applied.push(v)));
        assert_eq!(applied, vec![1]);
    }
}

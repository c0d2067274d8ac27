//! Blocking work against a backend that must not be entered from two threads.

use crate::types::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs blocking closures one at a time on tokio's blocking pool.
///
/// The lock guard moves into the blocking task, so it is released when the
/// closure returns, not when the caller stops waiting. A render abandoned by
/// a timeout still holds the gate until pdfium is done with it.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockingGate {
    lock: Arc<Mutex<()>>,
}

impl BlockingGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let value = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            f()
        })
        .await?;
        Ok(value)
    }
}

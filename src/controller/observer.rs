use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use super::cells::Cells;
use crate::state::FetchState;

/// Watches the state of a [`FetchController`](`super::FetchController`)
///
/// This is the re-render trigger for the host: an observer is notified every time any of
/// `result`, `failure` or `pending` changes.
pub struct Observer<T>(pub(super) watch::Receiver<Cells<T>>);

impl<T> Observer<T> {
    /// The current state
    pub fn state(&self) -> FetchState<T> {
        self.0.borrow().state.clone()
    }

    /// Wait for the next state change
    ///
    /// Returns `None` once the controller and all its activations are gone.
    pub async fn changed(&mut self) -> Option<FetchState<T>> {
        self.0.changed().await.ok()?;
        Some(self.0.borrow_and_update().state.clone())
    }

    /// Wait until the state satisfies the predicate
    ///
    /// Returns immediately if the current state already does.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<FetchState<T>>
    where
        F: FnMut(&FetchState<T>) -> bool,
    {
        let cells = self.0.wait_for(|cells| predicate(&cells.state)).await.ok()?;
        Some(cells.state.clone())
    }
}

impl<T: Send + Sync + 'static> Observer<T> {
    /// Convert the observer into a stream of states
    ///
    /// The stream yields the current state first, then one item per change. Intermediate
    /// states may be skipped if the consumer is slower than the controller.
    pub fn into_stream(self) -> impl Stream<Item = FetchState<T>> {
        WatchStream::new(self.0).map(|cells| cells.state)
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

use futures::future::{AbortHandle, Abortable};
use std::future::Future;

/// A flag shared between whoever issued an operation and the operation
/// itself. Once cancelled, the operation's future resolves to
/// `Err(Aborted)` the next time it is polled, and any completion carrying
/// this token must be ignored.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    handle: AbortHandle,
}

impl CancellationToken {
    /// Tie `future` to a fresh token.
    pub fn guard<F: Future>(future: F) -> (Self, Abortable<F>) {
        let (handle, registration) = AbortHandle::new_pair();
        (Self { handle }, Abortable::new(future, registration))
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_aborted()
    }
}

//! Framework-independent state containers for forms and remote data.
//!
//! Both managers are single-threaded and observable: every state change is
//! pushed to subscribers so the owning view can redraw.

pub mod cancel;
pub mod fetch;
pub mod form;
pub mod subscribers;

pub use cancel::CancellationToken;
pub use fetch::{
    Completion, FetchError, FetchManager, FetchState, FetchStatus,
    PendingFetch, SharedFetchManager, Transport,
};
pub use form::{FieldInput, FormManager, FormState, OnSubmit, Validator};
pub use subscribers::{SubscriptionId, Subscribers};

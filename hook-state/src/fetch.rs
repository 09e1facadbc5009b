use futures::FutureExt;
use futures::future::{Abortable, Aborted, LocalBoxFuture};
use payloads::{APIClient, ClientError, RequestIdentifier};
use serde::de::DeserializeOwned;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::cancel::CancellationToken;
use crate::subscribers::{SubscriptionId, Subscribers};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
    /// The request was superseded or its consumer detached. Never surfaced
    /// in [`FetchState`].
    #[error("request aborted")]
    Aborted,
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::APIError(status, _) => Self::Status(status.as_u16()),
            ClientError::Network(e) if e.is_decode() => {
                Self::Decode(e.to_string())
            }
            ClientError::Network(e) => Self::Transport(e.to_string()),
            ClientError::Decode(e) => Self::Decode(e.to_string()),
        }
    }
}

/// Performs the request an identifier describes and decodes the body.
pub trait Transport: Clone + 'static {
    fn fetch<T: DeserializeOwned + 'static>(
        &self,
        identifier: &RequestIdentifier,
    ) -> LocalBoxFuture<'static, Result<T, FetchError>>;
}

impl Transport for APIClient {
    fn fetch<T: DeserializeOwned + 'static>(
        &self,
        identifier: &RequestIdentifier,
    ) -> LocalBoxFuture<'static, Result<T, FetchError>> {
        let client = self.clone();
        let identifier = identifier.clone();
        async move {
            client
                .fetch_json::<T>(&identifier)
                .await
                .map_err(FetchError::from)
        }
        .boxed_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn status(&self) -> FetchStatus {
        if self.loading {
            FetchStatus::Loading
        } else if self.error.is_some() {
            FetchStatus::Failed
        } else if self.data.is_some() {
            FetchStatus::Loaded
        } else {
            FetchStatus::Idle
        }
    }
}

/// A request started by [`FetchManager::request`]. Drive it with
/// [`resolve`](Self::resolve) and hand the result back to
/// [`FetchManager::settle`].
pub struct PendingFetch<T> {
    identifier: RequestIdentifier,
    token: CancellationToken,
    future: Abortable<LocalBoxFuture<'static, Result<T, FetchError>>>,
}

impl<T> PendingFetch<T> {
    pub fn identifier(&self) -> &RequestIdentifier {
        &self.identifier
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub async fn resolve(self) -> Completion<T> {
        let Self {
            identifier,
            token,
            future,
        } = self;
        let outcome = match future.await {
            Ok(outcome) => outcome,
            Err(Aborted) => Err(FetchError::Aborted),
        };
        Completion {
            identifier,
            token,
            outcome,
        }
    }
}

/// The outcome of a [`PendingFetch`], still tagged with its token.
pub struct Completion<T> {
    pub identifier: RequestIdentifier,
    pub outcome: Result<T, FetchError>,
    token: CancellationToken,
}

impl<T> Completion<T> {
    pub fn is_stale(&self) -> bool {
        self.token.is_cancelled()
            || matches!(self.outcome, Err(FetchError::Aborted))
    }
}

/// Tracks one remote resource at a time.
///
/// Requesting a new identifier cancels whatever is still in flight, so only
/// the latest identifier's outcome ever reaches [`state`](Self::state).
pub struct FetchManager<T, C> {
    transport: C,
    state: FetchState<T>,
    identifier: Option<RequestIdentifier>,
    token: Option<CancellationToken>,
    subscribers: Subscribers<FetchState<T>>,
}

impl<T, C> FetchManager<T, C> {
    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    pub fn status(&self) -> FetchStatus {
        self.state.status()
    }

    /// The identifier most recently requested, if still attached.
    pub fn identifier(&self) -> Option<&RequestIdentifier> {
        self.identifier.as_ref()
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&FetchState<T>) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// The consumer is going away: cancel the in-flight request, if any.
    /// Later completions are discarded. A cancelled load stops loading;
    /// settled data or errors are kept.
    pub fn detach(&mut self) {
        let cancelled = self.cancel_inflight();
        self.identifier = None;
        if cancelled && self.state.loading {
            tracing::debug!("detached while loading");
            let state = FetchState {
                data: self.state.data.take(),
                loading: false,
                error: self.state.error.take(),
            };
            self.set_state(state);
        }
    }

    /// Returns whether a request was in flight.
    fn cancel_inflight(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn set_state(&mut self, state: FetchState<T>) {
        self.state = state;
        self.subscribers.notify(&self.state);
    }
}

impl<T, C> FetchManager<T, C>
where
    T: DeserializeOwned + 'static,
    C: Transport,
{
    pub fn new(transport: C) -> Self {
        Self {
            transport,
            state: FetchState::default(),
            identifier: None,
            token: None,
            subscribers: Subscribers::default(),
        }
    }

    /// Switch to `identifier`.
    ///
    /// Returns `None` without side effects when the identifier is unchanged.
    /// `None` as identifier always settles into an idle state without any
    /// network activity.
    pub fn request(
        &mut self,
        identifier: Option<RequestIdentifier>,
    ) -> Option<PendingFetch<T>> {
        if identifier.is_some() && identifier == self.identifier {
            return None;
        }
        self.cancel_inflight();
        self.identifier = identifier.clone();

        match identifier {
            Some(identifier) => Some(self.start(identifier)),
            None => {
                tracing::debug!("no identifier, settling idle");
                self.set_state(FetchState::default());
                None
            }
        }
    }

    /// Issue the current identifier again. Returns `None` if there is none.
    pub fn refetch(&mut self) -> Option<PendingFetch<T>> {
        let identifier = self.identifier.clone()?;
        self.cancel_inflight();
        Some(self.start(identifier))
    }

    /// Apply a finished request. Returns false, leaving the state untouched,
    /// if the request was cancelled before or while it ran.
    pub fn settle(&mut self, completion: Completion<T>) -> bool {
        if completion.is_stale() {
            tracing::debug!(
                "discarding stale response for {}",
                completion.identifier
            );
            return false;
        }
        self.token = None;

        let state = match completion.outcome {
            Ok(data) => {
                tracing::debug!("loaded {}", completion.identifier);
                FetchState {
                    data: Some(data),
                    loading: false,
                    error: None,
                }
            }
            Err(error) => {
                tracing::debug!("failed {}: {error}", completion.identifier);
                FetchState {
                    data: None,
                    loading: false,
                    error: Some(error),
                }
            }
        };
        self.set_state(state);
        true
    }

    fn start(&mut self, identifier: RequestIdentifier) -> PendingFetch<T> {
        tracing::debug!("loading {identifier}");
        let (token, future) =
            CancellationToken::guard(self.transport.fetch::<T>(&identifier));
        self.token = Some(token.clone());
        self.set_state(FetchState::loading());
        PendingFetch {
            identifier,
            token,
            future,
        }
    }
}

impl<T, C> Drop for FetchManager<T, C> {
    fn drop(&mut self) {
        self.cancel_inflight();
    }
}

/// A [`FetchManager`] shared between a view and the tasks it spawns.
///
/// Subscribers run while the manager is mutably borrowed, so they must not
/// call back into it.
pub struct SharedFetchManager<T, C> {
    inner: Rc<RefCell<FetchManager<T, C>>>,
}

impl<T, C> Clone for SharedFetchManager<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, C> SharedFetchManager<T, C> {
    pub fn borrow(&self) -> Ref<'_, FetchManager<T, C>> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, FetchManager<T, C>> {
        self.inner.borrow_mut()
    }

    pub fn detach(&self) {
        self.inner.borrow_mut().detach();
    }
}

impl<T, C> SharedFetchManager<T, C>
where
    T: DeserializeOwned + 'static,
    C: Transport,
{
    pub fn new(manager: FetchManager<T, C>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(manager)),
        }
    }

    /// Request `identifier` and apply its outcome. Returns whether the
    /// outcome reached the state.
    pub async fn load(&self, identifier: Option<RequestIdentifier>) -> bool {
        let pending = self.inner.borrow_mut().request(identifier);
        self.drive(pending).await
    }

    pub async fn reload(&self) -> bool {
        let pending = self.inner.borrow_mut().refetch();
        self.drive(pending).await
    }

    async fn drive(&self, pending: Option<PendingFetch<T>>) -> bool {
        let Some(pending) = pending else {
            return false;
        };
        let completion = pending.resolve().await;
        self.inner.borrow_mut().settle(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use serde_json::{Value, json};

    type Gate = oneshot::Sender<Result<Value, FetchError>>;

    /// Transport whose responses are released by the test.
    #[derive(Clone, Default)]
    struct GatedTransport {
        gates: Rc<RefCell<Vec<(String, Gate)>>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl GatedTransport {
        fn complete(&self, url: &str, outcome: Result<Value, FetchError>) {
            let mut gates = self.gates.borrow_mut();
            let index = gates
                .iter()
                .position(|(gate_url, _)| gate_url == url)
                .unwrap();
            let (_, gate) = gates.remove(index);
            let _ = gate.send(outcome);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Transport for GatedTransport {
        fn fetch<T: DeserializeOwned + 'static>(
            &self,
            identifier: &RequestIdentifier,
        ) -> LocalBoxFuture<'static, Result<T, FetchError>> {
            let (sender, receiver) = oneshot::channel();
            self.calls.borrow_mut().push(identifier.url.clone());
            self.gates
                .borrow_mut()
                .push((identifier.url.clone(), sender));
            async move {
                match receiver.await {
                    Ok(Ok(value)) => serde_json::from_value::<T>(value)
                        .map_err(|e| FetchError::Decode(e.to_string())),
                    Ok(Err(error)) => Err(error),
                    Err(_) => Err(FetchError::Transport("gate dropped".into())),
                }
            }
            .boxed_local()
        }
    }

    fn id(url: &str) -> Option<RequestIdentifier> {
        Some(RequestIdentifier::get(url))
    }

    fn manager(transport: &GatedTransport) -> FetchManager<Value, GatedTransport> {
        FetchManager::new(transport.clone())
    }

    #[tokio::test]
    async fn loads_data() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let pending = manager.request(id("/users")).unwrap();
        assert_eq!(manager.status(), FetchStatus::Loading);
        assert!(manager.state().data.is_none());

        transport.complete("/users", Ok(json!([{"id": 1}])));
        assert!(manager.settle(pending.resolve().await));

        assert_eq!(manager.status(), FetchStatus::Loaded);
        assert_eq!(manager.state().data, Some(json!([{"id": 1}])));
        assert_eq!(manager.state().error, None);
    }

    #[tokio::test]
    async fn not_found_fails_with_status() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let pending = manager.request(id("/users")).unwrap();
        transport.complete("/users", Err(FetchError::Status(404)));
        assert!(manager.settle(pending.resolve().await));

        let state = manager.state();
        assert!(!state.loading);
        assert!(state.data.is_none());
        let message = state.error.as_ref().unwrap().to_string();
        assert!(message.contains("404"), "{message}");
        assert_eq!(message, "HTTP error! status: 404");
    }

    #[tokio::test]
    async fn decode_failure_is_an_error() {
        let transport = GatedTransport::default();
        let mut manager: FetchManager<Vec<u32>, _> =
            FetchManager::new(transport.clone());

        let pending = manager.request(id("/users")).unwrap();
        transport.complete("/users", Ok(json!({"not": "a list"})));
        assert!(manager.settle(pending.resolve().await));

        assert!(matches!(manager.state().error, Some(FetchError::Decode(_))));
        assert_eq!(manager.status(), FetchStatus::Failed);
    }

    #[test]
    fn no_identifier_is_idle_without_requests() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        assert!(manager.request(None).is_none());
        assert_eq!(*manager.state(), FetchState::default());
        assert_eq!(manager.status(), FetchStatus::Idle);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn switching_to_none_cancels_and_goes_idle() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let pending = manager.request(id("/users")).unwrap();
        assert!(manager.request(None).is_none());
        assert_eq!(manager.status(), FetchStatus::Idle);

        transport.complete("/users", Ok(json!([])));
        assert!(!manager.settle(pending.resolve().await));
        assert_eq!(manager.status(), FetchStatus::Idle);
    }

    #[test]
    fn same_identifier_is_not_refetched() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let first = manager.request(id("/users"));
        assert!(first.is_some());
        assert!(manager.request(id("/users")).is_none());
        assert_eq!(transport.calls(), vec!["/users".to_string()]);
        assert!(!first.unwrap().token().is_cancelled());
    }

    #[tokio::test]
    async fn superseded_request_never_reaches_state() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let users = manager.request(id("/users")).unwrap();
        let posts = manager.request(id("/posts")).unwrap();
        assert!(users.token().is_cancelled());

        transport.complete("/users", Ok(json!(["user"])));
        transport.complete("/posts", Ok(json!(["post"])));

        let users = users.resolve().await;
        assert_eq!(users.outcome, Err(FetchError::Aborted));
        assert!(!manager.settle(users));
        assert_eq!(manager.status(), FetchStatus::Loading);

        assert!(manager.settle(posts.resolve().await));
        assert_eq!(manager.state().data, Some(json!(["post"])));
    }

    #[tokio::test]
    async fn late_response_after_switch_is_discarded() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        // The first response has fully arrived, but the identifier changes
        // before it is applied.
        let users = manager.request(id("/users")).unwrap();
        transport.complete("/users", Err(FetchError::Status(500)));
        let users = users.resolve().await;
        assert!(users.outcome.is_err());

        let posts = manager.request(id("/posts")).unwrap();
        assert!(!manager.settle(users));
        assert_eq!(manager.state().error, None);

        transport.complete("/posts", Ok(json!(["post"])));
        assert!(manager.settle(posts.resolve().await));
        assert_eq!(manager.state().data, Some(json!(["post"])));
        assert_eq!(manager.state().error, None);
    }

    #[tokio::test]
    async fn shared_manager_only_reflects_latest_load() {
        let transport = GatedTransport::default();
        let shared = SharedFetchManager::new(manager(&transport));

        let (users_applied, posts_applied, ()) = futures::join!(
            shared.load(id("/users")),
            shared.load(id("/posts")),
            async {
                transport.complete("/posts", Ok(json!(["post"])));
                transport.complete("/users", Ok(json!(["user"])));
            },
        );

        assert!(!users_applied);
        assert!(posts_applied);
        assert_eq!(shared.borrow().state().data, Some(json!(["post"])));
    }

    #[tokio::test]
    async fn detach_discards_inflight_response() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let pending = manager.request(id("/users")).unwrap();
        manager.detach();
        assert!(!manager.state().loading);
        assert_eq!(manager.status(), FetchStatus::Idle);

        transport.complete("/users", Ok(json!([])));
        assert!(!manager.settle(pending.resolve().await));
        assert!(manager.identifier().is_none());
        assert!(!manager.state().loading);

        // re-attaching to the same identifier issues a fresh request
        assert!(manager.request(id("/users")).is_some());
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn detach_after_settle_keeps_data() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);
        let notified = Rc::new(RefCell::new(0));
        {
            let notified = notified.clone();
            manager.subscribe(move |_: &FetchState<Value>| {
                *notified.borrow_mut() += 1
            });
        }

        let pending = manager.request(id("/users")).unwrap();
        transport.complete("/users", Ok(json!(["user"])));
        assert!(manager.settle(pending.resolve().await));
        assert_eq!(*notified.borrow(), 2);

        manager.detach();
        assert_eq!(manager.status(), FetchStatus::Loaded);
        assert_eq!(manager.state().data, Some(json!(["user"])));
        assert_eq!(*notified.borrow(), 2);
    }

    #[tokio::test]
    async fn none_after_detach_still_settles_idle() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);

        let pending = manager.request(id("/users")).unwrap();
        manager.detach();
        assert!(manager.request(None).is_none());
        assert_eq!(manager.status(), FetchStatus::Idle);

        transport.complete("/users", Ok(json!([])));
        assert!(!manager.settle(pending.resolve().await));
        assert_eq!(manager.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn dropping_manager_cancels_request() {
        let transport = GatedTransport::default();
        let pending = {
            let mut manager = manager(&transport);
            manager.request(id("/users")).unwrap()
        };
        assert!(pending.token().is_cancelled());
        let completion = pending.resolve().await;
        assert_eq!(completion.outcome, Err(FetchError::Aborted));
    }

    #[tokio::test]
    async fn refetch_reissues_current_identifier() {
        let transport = GatedTransport::default();
        let shared = SharedFetchManager::new(manager(&transport));
        assert!(shared.borrow_mut().refetch().is_none());

        let (applied, ()) = futures::join!(shared.load(id("/todos")), async {
            transport.complete("/todos", Err(FetchError::Status(503)));
        });
        assert!(applied);
        assert_eq!(shared.borrow().status(), FetchStatus::Failed);

        let (applied, ()) = futures::join!(shared.reload(), async {
            transport.complete("/todos", Ok(json!([1, 2])));
        });
        assert!(applied);
        assert_eq!(shared.borrow().state().data, Some(json!([1, 2])));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn subscribers_follow_transitions() {
        let transport = GatedTransport::default();
        let mut manager = manager(&transport);
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            manager.subscribe(move |state: &FetchState<Value>| {
                seen.borrow_mut().push(state.status())
            });
        }

        let users = manager.request(id("/users")).unwrap();
        let posts = manager.request(id("/posts")).unwrap();
        transport.complete("/users", Ok(json!([])));
        transport.complete("/posts", Err(FetchError::Transport("reset".into())));
        manager.settle(users.resolve().await);
        manager.settle(posts.resolve().await);

        assert_eq!(
            *seen.borrow(),
            vec![FetchStatus::Loading, FetchStatus::Loading, FetchStatus::Failed]
        );
    }
}

use hook_state::{FetchError, FetchManager, FetchState, SharedFetchManager};
use payloads::{APIClient, RequestIdentifier};
use serde::de::DeserializeOwned;
use yew::prelude::*;

/// Fetch hook return type
pub struct FetchHookReturn<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub refetch: Callback<()>,
}

impl<T> FetchHookReturn<T> {
    /// Render based on fetch state with contextual loading/error messages.
    ///
    /// - loading: "Loading {context}..."
    /// - failed: "Error loading {context}: ..."
    /// - loaded: the render function's output
    /// - idle: nothing
    pub fn render<F>(&self, context: &str, render_fn: F) -> Html
    where
        F: Fn(&T) -> Html,
    {
        if self.is_loading {
            return html! { <p>{format!("Loading {context}...")}</p> };
        }
        if let Some(error) = &self.error {
            return html! {
                <p role="alert">{format!("Error loading {context}: {error}")}</p>
            };
        }
        match &self.data {
            Some(data) => render_fn(data),
            None => html! {},
        }
    }
}

/// Fetch `identifier` on mount and whenever it changes.
///
/// A change of identifier, or unmounting, cancels the request still in
/// flight so its response is never applied. `None` fetches nothing.
///
/// # Example
///
/// ```rust
/// # use payloads::responses;
/// # use ui::get_api_client;
/// # use ui::hooks::{FetchHookReturn, use_fetch};
/// # use yew::prelude::*;
/// #[hook]
/// pub fn use_users() -> FetchHookReturn<Vec<responses::User>> {
///     let client = get_api_client();
///     use_fetch(Some(client.identifier("users")))
/// }
/// ```
#[hook]
pub fn use_fetch<T>(identifier: Option<RequestIdentifier>) -> FetchHookReturn<T>
where
    T: DeserializeOwned + Clone + 'static,
{
    let manager = use_memo((), |_| {
        SharedFetchManager::<T, APIClient>::new(FetchManager::new(
            crate::get_api_client(),
        ))
    });
    let state = use_state(FetchState::<T>::default);

    {
        let manager = (*manager).clone();
        let state = state.clone();
        use_effect_with(identifier, move |identifier| {
            let subscription = manager
                .borrow_mut()
                .subscribe(move |next: &FetchState<T>| state.set(next.clone()));

            let loader = manager.clone();
            let identifier = identifier.clone();
            yew::platform::spawn_local(async move {
                loader.load(identifier).await;
            });

            // Cleanup on identifier change or unmount
            move || {
                manager.borrow_mut().unsubscribe(subscription);
                manager.detach();
            }
        });
    }

    let refetch = {
        let manager = (*manager).clone();
        Callback::from(move |_| {
            let manager = manager.clone();
            yew::platform::spawn_local(async move {
                manager.reload().await;
            });
        })
    };

    FetchHookReturn {
        data: state.data.clone(),
        is_loading: state.loading,
        error: state.error.clone(),
        refetch,
    }
}

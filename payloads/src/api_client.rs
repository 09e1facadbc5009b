use crate::responses;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// Options that, together with the url, determine which request is made.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

/// The resource locator plus request options of a fetch.
///
/// Two identifiers are the same request only if every field matches; a change
/// to the url, method, any header or the body counts as a new identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestIdentifier {
    pub url: String,
    pub options: RequestOptions,
}

impl RequestIdentifier {
    pub fn new(url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            url: url.into(),
            options,
        }
    }

    /// A plain GET with no extra headers or body.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, RequestOptions::default())
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.options.method = method;
        self
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.options.body = Some(body);
        self
    }
}

impl fmt::Display for RequestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.options.method, self.url)
    }
}

/// An API client for fetching JSON resources.
#[derive(Clone)]
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inner_client: reqwest::Client::new(),
        }
    }

    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    /// Absolute urls are used as-is; anything else is treated as a path
    /// under this client's api root.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.format_url(url.trim_start_matches('/'))
        }
    }

    /// Identifier for a GET of `path` under the api root.
    pub fn identifier(&self, path: &str) -> RequestIdentifier {
        RequestIdentifier::get(self.format_url(path.trim_start_matches('/')))
    }

    async fn send(&self, identifier: &RequestIdentifier) -> ReqwestResult {
        let options = &identifier.options;
        let mut request = self
            .inner_client
            .request(options.method.clone(), self.resolve_url(&identifier.url));

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        request.send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Methods on the fixture API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    /// Perform the request described by `identifier` and decode its JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        identifier: &RequestIdentifier,
    ) -> Result<T, ClientError> {
        tracing::debug!("fetching {identifier}");
        let response = self.send(identifier).await?;
        ok_body(response).await
    }

    pub async fn get_users(&self) -> Result<Vec<responses::User>, ClientError> {
        self.fetch_json(&self.identifier("users")).await
    }

    pub async fn get_posts(&self) -> Result<Vec<responses::Post>, ClientError> {
        self.fetch_json(&self.identifier("posts")).await
    }

    pub async fn get_albums(
        &self,
    ) -> Result<Vec<responses::Album>, ClientError> {
        self.fetch_json(&self.identifier("albums")).await
    }

    pub async fn get_todos(&self) -> Result<Vec<responses::Todo>, ClientError> {
        self.fetch_json(&self.identifier("todos")).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A non-success status, containing the response text.
    #[error("HTTP error! status: {}", .0.as_u16())]
    APIError(StatusCode, String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice::<T>(&bytes)?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}

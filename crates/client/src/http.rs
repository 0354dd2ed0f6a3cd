//! Resilient request client: credential injection, server-signal handling,
//! single-flight refresh, and one transparent retry.

use crate::config::ServicesConfig;
use crate::error::ClientError;
use crate::refresh::RefreshGate;
use crate::session::SessionStore;
use crate::token::bearer_from_headers;
use dailyfeed_core::SessionStorage;
use futures::FutureExt;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Server signal: the access token is near or past expiry, refresh and retry.
pub const REFRESH_NEEDED_HEADER: &str = "x-token-refresh-needed";
/// Server signal: the refresh token itself is unusable, relogin is required.
pub const RELOGIN_REQUIRED_HEADER: &str = "x-relogin-required";

/// A file to send as a multipart form part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field_name: String,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

/// An outgoing request, held in a rebuildable form so a retry reuses the
/// original method, body, and headers with only the bearer value changed.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    json: Option<Value>,
    file: Option<FilePart>,
    skip_refresh: bool,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            json: None,
            file: None,
            skip_refresh: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).json(body)
    }

    pub fn put_json(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, url).json(body)
    }

    pub fn patch_json(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, url).json(body)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn multipart_file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    /// Opt out of refresh handling for this request.
    pub fn skip_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

struct ClientInner {
    http: reqwest::Client,
    session: SessionStore,
    services: ServicesConfig,
    refresh_url: String,
    refresh_gate: RefreshGate,
    on_relogin: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Authenticated HTTP client for the backend services.
///
/// Cheap to clone; clones share the session, cookie jar, and refresh gate.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    /// Create a new client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn services(&self) -> &ServicesConfig {
        &self.inner.services
    }

    /// Perform an authenticated call with transparent recovery from an
    /// expiring-token condition.
    ///
    /// The current token is re-read from the session store on every call; a
    /// concurrent refresh may have replaced it since the caller was created.
    /// Responses carrying the relogin signal wipe local state and short-
    /// circuit; responses carrying the refresh signal trigger a single-flight
    /// refresh and at most one retry. Everything else passes through.
    pub async fn execute(&self, spec: RequestSpec) -> Result<Response, ClientError> {
        let token = self.inner.session.token().await;
        let response = self.send(&spec, token.as_deref()).await?;

        if header_flag(response.headers(), RELOGIN_REQUIRED_HEADER) {
            warn!(url = spec.url(), "relogin required, wiping local session");
            self.inner.session.wipe().await;
            if let Some(hook) = &self.inner.on_relogin {
                hook();
            }
            return Ok(response);
        }

        if !spec.skip_refresh && header_flag(response.headers(), REFRESH_NEEDED_HEADER) {
            debug!(url = spec.url(), "token refresh needed");
            match self.refresh_token().await {
                Some(new_token) => {
                    debug!(url = spec.url(), "retrying request with refreshed token");
                    return self.send(&spec, Some(&new_token)).await;
                }
                None => {
                    warn!(
                        url = spec.url(),
                        "token refresh failed, returning original response"
                    );
                }
            }
        }

        Ok(response)
    }

    /// Join or start the single-flight refresh. Returns the new token when
    /// the refresh succeeded.
    async fn refresh_token(&self) -> Option<String> {
        let client = self.clone();
        self.inner
            .refresh_gate
            .run(move || async move { client.do_refresh().await }.boxed())
            .await
    }

    async fn do_refresh(self) -> Option<String> {
        debug!("refreshing access token");
        // The cookie jar carries the httpOnly refresh cookie; no body needed.
        // Sent directly, not through execute: signal headers on the refresh
        // response must not recurse into another refresh or wipe the session.
        let spec = RequestSpec::new(Method::POST, &self.inner.refresh_url);
        let token = self.inner.session.token().await;
        let response = match self.send(&spec, token.as_deref()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "token refresh failed");
            return None;
        }

        let Some(new_token) = bearer_from_headers(response.headers()) else {
            warn!("no Authorization header in refresh response");
            return None;
        };

        if let Err(err) = self.inner.session.set_token(&new_token).await {
            warn!(error = %err, "failed to persist refreshed token");
            return None;
        }
        debug!("token refreshed");
        Some(new_token)
    }

    async fn send(&self, spec: &RequestSpec, token: Option<&str>) -> Result<Response, ClientError> {
        let mut request = self
            .inner
            .http
            .request(spec.method.clone(), &spec.url);

        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &spec.json {
            request = request.json(body);
        }
        if let Some(file) = &spec.file {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)?;
            let form = reqwest::multipart::Form::new().part(file.field_name.clone(), part);
            request = request.multipart(form);
        }

        Ok(request.send().await?)
    }

    /// Execute and deserialize a JSON payload, mapping error statuses onto
    /// the client error taxonomy.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, ClientError> {
        let value = self.execute_value(spec).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute and return the raw JSON body, mapping error statuses onto
    /// the client error taxonomy.
    pub async fn execute_value(&self, spec: RequestSpec) -> Result<Value, ClientError> {
        let response = self.execute(spec).await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_status(
                status,
                crate::error::api_error_message(&body, status),
            ))
        }
    }
}

fn header_flag(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Builder for HttpClient
pub struct HttpClientBuilder {
    services: ServicesConfig,
    storage: Option<Arc<dyn SessionStorage>>,
    session: Option<SessionStore>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    on_relogin: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            storage: None,
            session: None,
            timeout: None,
            user_agent: None,
            on_relogin: None,
        }
    }
}

impl HttpClientBuilder {
    /// Set the backend service endpoints
    pub fn services(mut self, services: ServicesConfig) -> Self {
        self.services = services;
        self
    }

    /// Set the durable storage backing the session store
    pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use an existing session store instead of constructing one
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Hook invoked after a relogin-required signal has wiped local state.
    /// The surrounding application navigates to its login entry point here.
    pub fn on_relogin<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_relogin = Some(Box::new(hook));
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if no session store or storage backend was supplied,
    /// or if the underlying HTTP client cannot be constructed
    pub fn build(self) -> Result<HttpClient, ClientError> {
        // Cookie support is what lets the server-set refresh cookie flow on
        // every call, the equivalent of fetch's credentials: 'include'.
        let mut client_builder = reqwest::ClientBuilder::new().cookie_store(true);

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent("dailyfeed-client/0.1.0");
        }

        let http = client_builder.build()?;

        // The session store shares this client so the refresh cookie set on
        // the login response lands in the jar the refresh call reads from.
        let session = match self.session {
            Some(session) => session,
            None => {
                let storage = self.storage.ok_or_else(|| {
                    ClientError::Configuration(
                        "a session store or storage backend is required".into(),
                    )
                })?;
                SessionStore::new(storage, http.clone(), &self.services)
            }
        };

        let refresh_url = format!("{}/api/token/refresh", self.services.member);

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                http,
                session,
                services: self.services,
                refresh_url,
                refresh_gate: RefreshGate::new(),
                on_relogin: self.on_relogin,
            }),
        })
    }
}

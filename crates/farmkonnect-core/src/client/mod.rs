//! FarmKonnect API client.
//!
//! Every call goes through a [`RetryingInvoker`]: the libcurl transfer runs in
//! `spawn_blocking`, non-2xx responses become [`ApiError::Status`], and the
//! retry loop decides from the error's shape whether to try again.

mod error;
mod request;
pub mod resources;

pub use error::{transport_shape, ApiError};
pub use request::{perform, procedure_url, HttpResponse, Method, PreparedRequest, TRPC_PREFIX};
pub use resources::{DateRange, Page, ProductFilter};

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::retry::{CancellationToken, RetryError, RetryEvent, RetryingInvoker};

/// Client for the FarmKonnect tRPC-over-HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    invoker: RetryingInvoker,
}

impl ApiClient {
    /// Build a client from config; fails on an unusable base URL or retry section.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)
            .with_context(|| format!("invalid base_url: {}", config.base_url))?;
        let policy = config.retry_policy().context("invalid [retry] config")?;
        Ok(Self {
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            timeout: config.timeout(),
            invoker: RetryingInvoker::new(policy),
        })
    }

    /// Stop retrying once `token` is cancelled. Keeps the configured policy.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.invoker = std::mem::take(&mut self.invoker).with_cancellation(token);
        self
    }

    /// Observe every retry of every call made by this client.
    pub fn on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&RetryEvent) + Send + Sync + 'static,
    {
        self.invoker = std::mem::take(&mut self.invoker).on_retry(observer);
        self
    }

    pub fn invoker(&self) -> &RetryingInvoker {
        &self.invoker
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Call `procedure` and return the decoded JSON response.
    ///
    /// On failure the error of the last attempt is returned unchanged.
    pub async fn request(
        &self,
        method: Method,
        procedure: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, RetryError<ApiError>> {
        let prepared = procedure_url(&self.base_url, procedure, params)
            .and_then(|url| PreparedRequest::new(method, url, self.token.as_deref(), body))
            .map_err(RetryError::Operation)?;
        self.send(prepared).await
    }

    /// Send a prepared request through the retry loop.
    pub async fn send(&self, prepared: PreparedRequest) -> Result<Value, RetryError<ApiError>> {
        tracing::debug!(method = prepared.method.as_str(), url = %prepared.url, "api request");
        let prepared = Arc::new(prepared);
        let timeout = self.timeout;
        self.invoker
            .invoke(|| {
                let req = Arc::clone(&prepared);
                async move {
                    tokio::task::spawn_blocking(move || perform(&req, timeout))
                        .await
                        .map_err(|e| ApiError::Join(e.to_string()))?
                        .map_err(ApiError::Transport)?
                        .into_json()
                }
            })
            .await
    }

    /// `GET` a query procedure.
    pub async fn query(
        &self,
        procedure: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, RetryError<ApiError>> {
        self.request(Method::Get, procedure, params, None).await
    }

    /// `POST` a mutation procedure with a JSON body.
    pub async fn mutate(&self, procedure: &str, body: &Value) -> Result<Value, RetryError<ApiError>> {
        self.request(Method::Post, procedure, &[], Some(body)).await
    }
}

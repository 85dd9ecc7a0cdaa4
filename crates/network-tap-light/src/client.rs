//! Request/response plumbing and the tapping decorator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{PayloadTap, TapError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            body: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The page's outgoing-request capability.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TapError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TapError> {
        (**self).execute(request).await
    }
}

/// Decorates a client so that matching responses are copied into the tap. The caller
/// always receives exactly what the inner client returned.
pub struct TappedClient<C> {
    inner: C,
    tap: Arc<PayloadTap>,
}

impl<C> TappedClient<C>
where
    C: HttpClient,
{
    pub fn new(inner: C, tap: Arc<PayloadTap>) -> Self {
        Self { inner, tap }
    }

    pub fn tap(&self) -> &Arc<PayloadTap> {
        &self.tap
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C> HttpClient for TappedClient<C>
where
    C: HttpClient,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TapError> {
        if !self.tap.matches(&request.url) {
            return self.inner.execute(request).await;
        }
        let url = request.url.clone();
        let response = self.inner.execute(request).await?;
        let captured = self.tap.observe(&url, response.status, &response.body);
        debug!(%url, status = response.status, captured, "tapped game data response");
        Ok(response)
    }
}

//! HTTP client with built-in request hedging.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, Request};

use super::Fetch;
use super::error::HttpError;
use super::hedging::hedge;

/// Delay before a duplicate attempt is raced against a slow one.
pub const DEFAULT_HEDGE_AFTER: Duration = Duration::from_secs(1);

/// HTTP client that hedges slow requests.
#[derive(Clone)]
pub struct HedgingClient {
    client: Client,
    after: Duration,
}

impl HedgingClient {
    /// Creates a new hedging client wrapping the given reqwest Client.
    pub fn new(client: Client, after: Duration) -> Self {
        Self { client, after }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn hedge_after(&self) -> Duration {
        self.after
    }

    /// Executes a request, hedging it if it is slow.
    ///
    /// Only GET and HEAD requests without a body that cannot be replayed are
    /// accepted; anything else could have side effects when duplicated.
    #[tracing::instrument(skip(self, request), fields(url = %request.url()))]
    pub async fn execute(&self, request: Request) -> Result<Vec<u8>> {
        if !matches!(*request.method(), Method::GET | Method::HEAD) {
            bail!(
                "Refusing to hedge non-idempotent {} request to {}",
                request.method(),
                request.url()
            );
        }
        if request.try_clone().is_none() {
            bail!(
                "Refusing to hedge request to {}: body cannot be replayed",
                request.url()
            );
        }

        hedge(self.after, || {
            let attempt = request.try_clone();
            async move {
                let attempt = attempt.context("Request body cannot be replayed")?;
                self.execute_once(attempt).await
            }
        })
        .await
    }

    /// Single attempt without hedging.
    async fn execute_once(&self, request: Request) -> Result<Vec<u8>> {
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} {} returned {}", method, url, status);
            return Err(HttpError::new(method, url, status).into());
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Fetch for HedgingClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}...", url);
        let request = self
            .client
            .get(url)
            .build()
            .with_context(|| format!("Invalid request URL {:?}", url))?;
        self.execute(request).await
    }
}

//! HTTP transport with latency hedging and status classification.

mod client;
mod error;
mod hedging;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{DEFAULT_HEDGE_AFTER, HedgingClient};
pub use error::HttpError;
pub use hedging::hedge;

/// Read-only byte fetch used by the network backends.
///
/// Implementations must only issue idempotent requests: a call may be
/// duplicated on the wire when hedging kicks in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and return the full response body of a 2xx response.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

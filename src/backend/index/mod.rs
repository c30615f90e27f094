//! pkg.go.dev search.
//!
//! pkg.go.dev only searches packages, not commands, so results are filtered
//! by the "command" chip on each heading. Packages grouped under another
//! module's heading carry neither the chip nor a version and are resolved
//! with their own detail page.

mod scrape;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use super::Backend;
use crate::collector::{Collector, Gathered};
use crate::http::Fetch;
use crate::package::Pkg;

use scrape::{Detail, SearchSnippet};

pub const DEFAULT_INDEX_URL: &str = "https://pkg.go.dev";

/// A heading groups at most this many other packages.
const GROUPED_PER_SNIPPET: usize = 5;

/// Commands found through pkg.go.dev.
#[derive(Clone)]
pub struct SearchIndex {
    fetch: Arc<dyn Fetch>,
    base_url: String,
    limit: usize,
    jobs: usize,
}

impl SearchIndex {
    pub fn with_base_url(fetch: Arc<dyn Fetch>, base_url: &str, limit: usize) -> Self {
        Self {
            fetch,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
            jobs: limit.max(1),
        }
    }

    /// Process at most `jobs` search results at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let limit = self.limit.to_string();
        Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("limit", limit.as_str()), ("m", "package"), ("q", query)],
        )
        .with_context(|| format!("Invalid index URL {:?}", self.base_url))
    }

    fn detail_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn one snippet into packages, looking up grouped entries. A grouped
    /// entry whose lookup fails is kept without a version next to its error.
    async fn resolve(self, snippet: SearchSnippet) -> Gathered<Pkg> {
        let mut lookups = Collector::new(GROUPED_PER_SNIPPET).with_limit(self.jobs);
        for path in snippet.subs {
            let index = self.clone();
            lookups.spawn(move |sink| async move {
                match index.lookup(&path).await {
                    Ok(pkg) => sink.value(pkg).await,
                    Err(e) => {
                        sink.value(Pkg::unversioned(path)).await;
                        sink.error(e).await;
                    }
                }
            });
        }

        let mut gathered = lookups.drain().await;
        if let Some(pkg) = snippet.command {
            gathered.values.push(pkg);
        }
        gathered
    }
}

#[async_trait]
impl Backend for SearchIndex {
    /// Libraries resolve to an empty package: only commands are
    /// installable.
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, path: &str) -> Result<Pkg> {
        let url = self.detail_url(path);
        debug!("Fetching package page {}...", url);
        let page = async {
            let body = self.fetch.get(&url).await?;
            scrape::detail_page(&body).with_context(|| format!("Unexpected page layout at {}", url))
        }
        .await
        .with_context(|| format!("Index lookup of {:?} failed", path))?;

        Ok(match page {
            Detail::Library => {
                debug!("{} is not a command", path);
                Pkg::default()
            }
            Detail::Command { version } => Pkg::new(path, version),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Gathered<Pkg> {
        let snippets = async {
            let url = self.search_url(query)?;
            debug!("Searching index at {}...", url);
            let body = self.fetch.get(url.as_str()).await?;
            scrape::search_page(&body, query)
        }
        .await;

        let snippets = match snippets {
            Ok(snippets) => snippets,
            Err(e) => {
                return Gathered::failed(e.context(format!("Index search for {:?} failed", query)));
            }
        };
        debug!("Index returned {} results for {:?}", snippets.len(), query);

        let mut collector = Collector::new(snippets.len()).with_limit(self.jobs);
        for snippet in snippets {
            let index = self.clone();
            collector.spawn(move |sink| async move {
                match snippet {
                    Ok(snippet) => {
                        let gathered = index.resolve(snippet).await;
                        for pkg in gathered.values {
                            sink.value(pkg).await;
                        }
                        for error in gathered.errors {
                            sink.error(error).await;
                        }
                    }
                    Err(e) => {
                        debug!("Skipping search result: {:#}", e);
                        sink.error(e).await;
                    }
                }
            });
        }

        collector.drain().await.retain(|pkg| !pkg.is_empty())
    }
}

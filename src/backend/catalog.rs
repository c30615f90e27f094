//! deps.dev package catalog.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use super::Backend;
use crate::collector::Gathered;
use crate::error::{NotFound, is_not_found};
use crate::http::Fetch;
use crate::package::{self, Pkg};

pub const DEFAULT_API_URL: &str = "https://api.deps.dev/v3/systems/go/packages";
pub const DEFAULT_SEARCH_URL: &str = "https://deps.dev/_/search";

/// deps.dev response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Package {
        pub versions: Vec<Version>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Version {
        pub version_key: VersionKey,
        pub is_default: bool,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct VersionKey {
        pub name: String,
        pub version: String,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Search {
        pub results: Vec<SearchResult>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase", default)]
    pub struct SearchResult {
        pub name: String,
        pub default_version: String,
    }
}

/// Versions as published on deps.dev.
pub struct RemoteCatalog {
    fetch: Arc<dyn Fetch>,
    api_url: String,
    search_url: String,
    limit: usize,
}

impl RemoteCatalog {
    pub fn with_urls(fetch: Arc<dyn Fetch>, api_url: &str, search_url: &str, limit: usize) -> Self {
        Self {
            fetch,
            api_url: api_url.trim_end_matches('/').to_string(),
            search_url: search_url.to_string(),
            limit,
        }
    }

    fn package_url(&self, path: &str) -> Result<Url> {
        let mut url =
            Url::parse(&self.api_url).with_context(|| format!("Invalid catalog URL {:?}", self.api_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Catalog URL {:?} cannot take a path", self.api_url))?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let limit = self.limit.to_string();
        Url::parse_with_params(
            &self.search_url,
            &[
                ("q", query),
                ("kind", "PACKAGE"),
                ("system", "GO"),
                ("page", "0"),
                ("perPage", limit.as_str()),
            ],
        )
        .with_context(|| format!("Invalid catalog search URL {:?}", self.search_url))
    }

    /// Default version of exactly `path`, without walking up.
    async fn lookup_exact(&self, path: &str) -> Result<Pkg> {
        let url = self.package_url(path)?;
        debug!("Fetching catalog entry from {}...", url);
        let body = self.fetch.get(url.as_str()).await?;
        let package: api::Package = serde_json::from_slice(&body)
            .with_context(|| format!("Failed to parse catalog entry from {}", url))?;

        package
            .versions
            .into_iter()
            .find(|v| v.is_default)
            .map(|v| {
                let name = if v.version_key.name.is_empty() {
                    path.to_string()
                } else {
                    v.version_key.name
                };
                Pkg::new(name, v.version_key.version)
            })
            .ok_or_else(|| NotFound::new(path).into())
    }
}

#[async_trait]
impl Backend for RemoteCatalog {
    /// Packages below a module root are not catalogued themselves, so an
    /// unknown path is retried with each ancestor until one resolves.
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, path: &str) -> Result<Pkg> {
        match self.lookup_exact(path).await {
            Err(e) if is_not_found(&e) => debug!("{} is not catalogued: {:#}", path, e),
            other => return other.with_context(|| format!("Catalog lookup of {:?} failed", path)),
        }

        let mut ancestor = package::parent(path);
        while let Some(candidate) = ancestor {
            match self.lookup_exact(candidate).await {
                Ok(pkg) => {
                    debug!("Resolved {} through ancestor {}", path, candidate);
                    return Ok(pkg);
                }
                Err(e) => debug!("Ancestor {} did not resolve: {:#}", candidate, e),
            }
            ancestor = package::parent(candidate);
        }

        Err(NotFound::new(path).into())
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Gathered<Pkg> {
        let found = async {
            let url = self.search_url(query)?;
            debug!("Searching catalog at {}...", url);
            let body = self.fetch.get(url.as_str()).await?;
            let search: api::Search = serde_json::from_slice(&body)
                .with_context(|| format!("Failed to parse catalog search from {}", url))?;
            anyhow::Ok(search.results)
        }
        .await;

        match found {
            Ok(results) => Gathered::ok(
                results
                    .into_iter()
                    .filter(|r| r.name.ends_with(query))
                    .map(|r| Pkg::new(r.name, r.default_version))
                    .collect(),
            ),
            Err(e) => Gathered::failed(e.context(format!("Catalog search for {:?} failed", query))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HedgingClient, HttpError, MockFetch};
    use mockall::predicate::eq;
    use reqwest::{Client, Method, StatusCode};
    use std::time::Duration;

    fn not_found(url: &str) -> anyhow::Error {
        HttpError::new(Method::GET, url.to_string(), StatusCode::NOT_FOUND).into()
    }

    fn entry(name: &str, default: Option<&str>) -> Vec<u8> {
        let mut versions = vec![serde_json::json!({
            "versionKey": { "system": "GO", "name": name, "version": "v0.0.1" },
            "publishedAt": "2020-01-01T00:00:00Z",
            "isDefault": false
        })];
        if let Some(version) = default {
            versions.push(serde_json::json!({
                "versionKey": { "system": "GO", "name": name, "version": version },
                "isDefault": true
            }));
        }
        serde_json::to_vec(&serde_json::json!({
            "packageKey": { "system": "GO", "name": name },
            "versions": versions
        }))
        .unwrap()
    }

    fn catalog(fetch: MockFetch) -> RemoteCatalog {
        RemoteCatalog::with_urls(
            Arc::new(fetch),
            "https://api.test/v3/systems/go/packages",
            "https://test/_/search",
            10,
        )
    }

    const API: &str = "https://api.test/v3/systems/go/packages/";

    #[test]
    fn test_package_url_escapes_slashes() {
        let catalog = catalog(MockFetch::new());
        assert_eq!(
            catalog.package_url("golang.org/x/tools/gopls").unwrap().as_str(),
            "https://api.test/v3/systems/go/packages/golang.org%2Fx%2Ftools%2Fgopls"
        );
    }

    #[test]
    fn test_search_url_carries_limit() {
        let catalog = catalog(MockFetch::new());
        assert_eq!(
            catalog.search_url("go pls").unwrap().as_str(),
            "https://test/_/search?q=go+pls&kind=PACKAGE&system=GO&page=0&perPage=10"
        );
    }

    #[tokio::test]
    async fn test_lookup_selects_default_version() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_get()
            .with(eq(format!("{}example.com%2Ffoo", API)))
            .times(1)
            .returning(|_| Ok(entry("example.com/foo", Some("v1.3.0"))));

        let pkg = catalog(fetch).lookup("example.com/foo").await.unwrap();
        assert_eq!(pkg, Pkg::new("example.com/foo", "v1.3.0"));
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_ancestor() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_get()
            .with(eq(format!("{}a%2Fb%2Fc", API)))
            .times(1)
            .returning(|url| Err(not_found(url)));
        fetch
            .expect_get()
            .with(eq(format!("{}a%2Fb", API)))
            .times(1)
            .returning(|_| Ok(entry("a/b", Some("2.0.0"))));
        // Never reached.
        fetch.expect_get().with(eq(format!("{}a", API))).never();

        let pkg = catalog(fetch).lookup("a/b/c").await.unwrap();
        assert_eq!(pkg, Pkg::new("a/b", "2.0.0"));
    }

    #[tokio::test]
    async fn test_lookup_without_default_walks_up() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_get()
            .with(eq(format!("{}a%2Fb", API)))
            .returning(|_| Ok(entry("a/b", None)));
        fetch
            .expect_get()
            .with(eq(format!("{}a", API)))
            .returning(|_| Ok(entry("a", Some("v1.0.0"))));

        let pkg = catalog(fetch).lookup("a/b").await.unwrap();
        assert_eq!(pkg, Pkg::new("a", "v1.0.0"));
    }

    #[tokio::test]
    async fn test_lookup_ancestor_errors_move_on() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_get()
            .with(eq(format!("{}a%2Fb%2Fc", API)))
            .returning(|url| Err(not_found(url)));
        fetch
            .expect_get()
            .with(eq(format!("{}a%2Fb", API)))
            .returning(|_| Err(anyhow!("connection reset")));
        fetch
            .expect_get()
            .with(eq(format!("{}a", API)))
            .returning(|_| Ok(b"{not json".to_vec()));

        let err = catalog(fetch).lookup("a/b/c").await.unwrap_err();
        assert!(is_not_found(&err));
        assert_eq!(err.downcast_ref::<NotFound>().unwrap().path, "a/b/c");
    }

    #[tokio::test]
    async fn test_lookup_transport_error_is_not_retried_upwards() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_get()
            .times(1)
            .returning(|_| Err(anyhow!("dns failure")));

        let err = catalog(fetch).lookup("a/b/c").await.unwrap_err();
        assert!(!is_not_found(&err));
        assert!(format!("{:#}", err).contains("dns failure"));
    }

    #[tokio::test]
    async fn test_lookup_preserves_empty_version() {
        let mut fetch = MockFetch::new();
        fetch.expect_get().returning(|_| {
            Ok(br#"{"versions":[{"versionKey":{"name":"x/y"},"isDefault":true}]}"#.to_vec())
        });

        let pkg = catalog(fetch).lookup("x/y").await.unwrap();
        assert_eq!(pkg, Pkg::unversioned("x/y"));
    }

    #[tokio::test]
    async fn test_search_filters_by_suffix() {
        let mut fetch = MockFetch::new();
        fetch.expect_get().times(1).returning(|_| {
            Ok(serde_json::to_vec(&serde_json::json!({
                "page": 0,
                "totalMatches": 3,
                "results": [
                    { "kind": "PACKAGE", "system": "GO", "name": "golang.org/x/tools/gopls", "defaultVersion": "v0.16.1" },
                    { "kind": "PACKAGE", "system": "GO", "name": "github.com/someone/gopls-helper", "defaultVersion": "v1.0.0" },
                    { "kind": "PACKAGE", "system": "GO", "name": "example.com/gopls" }
                ]
            }))
            .unwrap())
        });

        let gathered = catalog(fetch).search("gopls").await;
        assert!(gathered.is_clean());
        assert_eq!(
            gathered.values,
            vec![
                Pkg::new("golang.org/x/tools/gopls", "v0.16.1"),
                Pkg::unversioned("example.com/gopls"),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_failure_is_reported() {
        let mut fetch = MockFetch::new();
        fetch.expect_get().returning(|_| Ok(b"<html>".to_vec()));

        let gathered = catalog(fetch).search("gopls").await;
        assert!(gathered.values.is_empty());
        assert_eq!(gathered.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_over_http() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/packages/a%2Fb%2Fc")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let found = server
            .mock("GET", "/packages/a%2Fb")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(entry("a/b", Some("2.0.0")))
            .expect(1)
            .create_async()
            .await;

        let client = HedgingClient::new(Client::new(), Duration::from_secs(5));
        let catalog = RemoteCatalog::with_urls(
            Arc::new(client),
            &format!("{}/packages", server.url()),
            &format!("{}/search", server.url()),
            10,
        );

        let pkg = catalog.lookup("a/b/c").await.unwrap();
        assert_eq!(pkg, Pkg::new("a/b", "2.0.0"));
        missing.assert_async().await;
        found.assert_async().await;
    }
}

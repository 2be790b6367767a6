//! Loading JSON documents for vector layers.
//!
//! [`ResourceFetcher`] is the network seam: [`HttpFetcher`] talks to real
//! endpoints, [`MemoryFetcher`] serves canned responses. Local files go
//! through [`LocalAssets`], which confines reads to one directory.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    Status { url: String, status: u16 },
    Request { url: String, message: String },
    InvalidJson { origin: String, message: String },
    Io { path: PathBuf, source: std::io::Error },
    /// The path escapes the asset root.
    OutsideRoot(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status { url, status } => write!(f, "request to {url} failed: HTTP {status}"),
            FetchError::Request { url, message } => write!(f, "request to {url} failed: {message}"),
            FetchError::InvalidJson { origin, message } => {
                write!(f, "response from {origin} is not JSON: {message}")
            }
            FetchError::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            FetchError::OutsideRoot(p) => write!(f, "path {p} is outside the asset directory"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fetches a JSON document by URL.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait ResourceFetcher: Send + Sync {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            if !resp.status().is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: resp.status().as_u16(),
                });
            }

            resp.json::<Value>().await.map_err(|e| FetchError::InvalidJson {
                origin: url.to_string(),
                message: e.to_string(),
            })
        })
    }
}

#[derive(Debug, Clone)]
enum CannedResponse {
    Json(Value),
    Status(u16),
}

/// In-memory fetcher. Unknown URLs answer 404.
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    responses: Arc<RwLock<HashMap<String, CannedResponse>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_json(&self, url: impl Into<String>, body: Value) {
        if let Ok(mut map) = self.responses.write() {
            map.insert(url.into(), CannedResponse::Json(body));
        }
    }

    pub fn insert_status(&self, url: impl Into<String>, status: u16) {
        if let Ok(mut map) = self.responses.write() {
            map.insert(url.into(), CannedResponse::Status(status));
        }
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        let canned = self
            .responses
            .read()
            .ok()
            .and_then(|map| map.get(url).cloned());
        Box::pin(async move {
            match canned {
                Some(CannedResponse::Json(body)) => Ok(body),
                Some(CannedResponse::Status(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        })
    }
}

/// Directory served as the map's static assets. Paths such as
/// `/data/roads.json` resolve relative to it.
#[derive(Debug, Clone)]
pub struct LocalAssets {
    root: PathBuf,
}

impl LocalAssets {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let mut out = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(FetchError::OutsideRoot(path.to_string()));
                }
            }
        }
        Ok(out)
    }

    pub async fn read_json(&self, path: &str) -> Result<Value, FetchError> {
        let full = self.resolve(path)?;
        let text = tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| FetchError::Io {
                path: full.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| FetchError::InvalidJson {
            origin: full.display().to_string(),
            message: e.to_string(),
        })
    }
}

//! Fetch request descriptors.

use super::url::{canonicalize, redact};
use dotgraph_core::{Error, Fingerprint};
use url::Url;

/// HTTP method of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource to fetch plus the stage context its continuation needs.
///
/// Only `method` and `url` identify the resource for caching; `context`
/// rides along untouched and is handed back with the completion.
#[derive(Debug, Clone)]
pub struct FetchRequest<C = ()> {
    method: Method,
    url: Url,
    pub context: C,
}

impl<C> FetchRequest<C> {
    /// Build a request, rejecting empty or malformed URLs before any I/O.
    pub fn new(method: Method, url: &str, context: C) -> Result<Self, Error> {
        if url.trim().is_empty() {
            return Err(Error::InvalidInput("url must not be empty".into()));
        }
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method, url, context })
    }

    pub fn get(url: &str, context: C) -> Result<Self, Error> {
        Self::new(Method::Get, url, context)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host the admission pool is keyed by.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.method.as_str(), self.url.as_str())
    }

    /// URL with secrets masked, for logs and cache metadata.
    pub fn redacted_url(&self) -> String {
        redact(&self.url)
    }
}

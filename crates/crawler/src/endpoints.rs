//! congress.gov request URLs.

use dotgraph_core::Error;
use url::Url;

/// Page size requested from listing endpoints.
const PAGE_LIMIT: u32 = 250;

/// Builds API URLs and attaches the API key to requests bound for the API host.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    host: String,
    api_key: Option<String>,
}

impl Endpoints {
    pub fn new(base: &str, api_key: Option<String>) -> Result<Self, Error> {
        let parsed = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{base}: no host")))?
            .to_ascii_lowercase();
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Ok(Self { base: base.trim_end_matches('/').to_string(), host, api_key })
    }

    /// Current members of Congress.
    pub fn members(&self) -> Result<String, Error> {
        self.authorize(&format!("{}/member?format=json&currentMember=true&limit={PAGE_LIMIT}", self.base))
    }

    /// Congress listing, newest first.
    pub fn congresses(&self) -> Result<String, Error> {
        self.authorize(&format!("{}/congress?format=json", self.base))
    }

    /// Bills introduced in `congress`.
    pub fn bills(&self, congress: u32) -> Result<String, Error> {
        self.authorize(&format!("{}/bill/{congress}?format=json&limit={PAGE_LIMIT}", self.base))
    }

    /// Action listing for a bill, derived from the bill's own detail URL.
    pub fn actions(&self, bill_url: &str) -> Result<String, Error> {
        let mut url = Url::parse(bill_url).map_err(|e| Error::InvalidUrl(format!("{bill_url}: {e}")))?;
        let path = format!("{}/actions", url.path().trim_end_matches('/'));
        url.set_path(&path);
        if !url.query_pairs().any(|(k, _)| k == "format") {
            url.query_pairs_mut().append_pair("format", "json");
        }
        self.authorize(url.as_str())
    }

    /// Append the API key if `url` targets the API host and lacks one.
    ///
    /// Third-party hosts (the House clerk, senate.gov) never receive the key.
    pub fn authorize(&self, url: &str) -> Result<String, Error> {
        let mut parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        let Some(key) = &self.api_key else { return Ok(parsed.into()) };

        let same_host = parsed.host_str().is_some_and(|h| h.eq_ignore_ascii_case(&self.host));
        let has_key = parsed.query_pairs().any(|(k, _)| k == "api_key");
        if same_host && !has_key {
            parsed.query_pairs_mut().append_pair("api_key", key);
        }
        Ok(parsed.into())
    }
}

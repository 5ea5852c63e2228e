//! Request descriptors and persisted metadata.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Input descriptor for one cache load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    key: String,
    headers: BTreeMap<String, String>,
    force_refresh: bool,
    local_max_age: Option<Duration>,
    http_interval: Option<Duration>,
}

impl Request {
    /// Start building a request for `url`, cached under `key`.
    pub fn builder(url: impl Into<String>, key: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            url: url.into(),
            key: key.into(),
            headers: BTreeMap::new(),
            force_refresh: false,
            local_max_age: None,
            http_interval: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stable cache identifier, independent of url formatting.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Bypass local trust entirely.
    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    /// Max tolerated metadata age before the entry counts as stale.
    pub fn local_max_age(&self) -> Option<Duration> {
        self.local_max_age
    }

    /// Revalidate a trusted entry once it is older than this.
    pub fn http_interval(&self) -> Option<Duration> {
        self.http_interval
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    key: String,
    headers: BTreeMap<String, String>,
    force_refresh: bool,
    local_max_age: Option<Duration>,
    http_interval: Option<Duration>,
}

impl RequestBuilder {
    /// Add an outbound header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn local_max_age(mut self, max_age: Duration) -> Self {
        self.local_max_age = Some(max_age);
        self
    }

    pub fn http_interval(mut self, interval: Duration) -> Self {
        self.http_interval = Some(interval);
        self
    }

    /// Validate and freeze the request.
    pub fn build(self) -> CacheResult<Request> {
        let parsed = url::Url::parse(&self.url).map_err(|e| CacheError::Config {
            message: format!("invalid url {}: {}", self.url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CacheError::Config {
                message: format!("unsupported url scheme: {}", parsed.scheme()),
            });
        }

        let trimmed = self.key.trim_matches(|c| c == '/' || c == '\\');
        if trimmed.is_empty() {
            return Err(CacheError::Config {
                message: "cache key must not be empty".to_string(),
            });
        }
        if trimmed.split(['/', '\\']).any(|seg| seg == ".." || seg.is_empty()) {
            return Err(CacheError::Config {
                message: format!("cache key must be a relative path without '..': {}", self.key),
            });
        }

        Ok(Request {
            url: self.url,
            key: self.key,
            headers: self.headers,
            force_refresh: self.force_refresh,
            local_max_age: self.local_max_age,
            http_interval: self.http_interval,
        })
    }
}

/// Persisted metadata for one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// Url the body was fetched from.
    pub url: String,

    /// Cache key of the originating request.
    pub key: String,

    /// Content-Type of the first fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// When the entry was first written.
    pub cache_created: DateTime<Utc>,

    /// When the entry was last fetched or revalidated.
    pub cache_updated: DateTime<Utc>,

    /// ETag for conditional requests.
    #[serde(rename = "httpETag", default, skip_serializing_if = "Option::is_none")]
    pub http_etag: Option<String>,

    /// Last-Modified of the most recent response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_modified: Option<DateTime<Utc>>,

    /// Checksum of the body at the last successful fetch (sha256:...).
    pub content_checksum: String,
}

/// Status and headers of the most recent fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub status: u16,
    /// Header map keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
}

impl ResponseInfo {
    /// Capture status and headers from a response.
    pub fn from_response(response: &reqwest::Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self {
            status: response.status().as_u16(),
            headers,
        }
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Parsed `Last-Modified` (HTTP-date).
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.header("last-modified")
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let req = Request::builder("https://example.com/a.json", "a")
            .header("Accept", "application/json")
            .force_refresh(true)
            .local_max_age(Duration::from_secs(60))
            .http_interval(Duration::from_secs(5))
            .build()
            .expect("valid request");

        assert_eq!(req.url(), "https://example.com/a.json");
        assert_eq!(req.key(), "a");
        assert_eq!(req.headers().get("Accept").unwrap(), "application/json");
        assert!(req.force_refresh());
        assert_eq!(req.local_max_age(), Some(Duration::from_secs(60)));
        assert_eq!(req.http_interval(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(Request::builder("not a url", "k").build().is_err());
        assert!(Request::builder("ftp://example.com/x", "k").build().is_err());
    }

    #[test]
    fn rejects_escaping_keys() {
        for key in ["", "/", "../x", "a/../../b", "a//b"] {
            let result = Request::builder("https://example.com/x", key).build();
            assert!(
                matches!(result, Err(CacheError::Config { .. })),
                "key {:?} should be rejected",
                key
            );
        }
        assert!(Request::builder("https://example.com/x", "a/b/c")
            .build()
            .is_ok());
    }

    #[test]
    fn info_wire_names() {
        let now = Utc::now();
        let info = CacheInfo {
            url: "https://example.com/x".to_string(),
            key: "x".to_string(),
            content_type: Some("text/plain".to_string()),
            cache_created: now,
            cache_updated: now,
            http_etag: Some("\"v1\"".to_string()),
            http_modified: None,
            content_checksum: crate::digest::checksum(b"x"),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("httpETag").is_some());
        assert!(value.get("contentChecksum").is_some());
        assert!(value.get("cacheCreated").is_some());
        assert!(value.get("httpModified").is_none());
    }
}

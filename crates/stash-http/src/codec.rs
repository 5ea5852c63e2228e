//! Metadata encoding.

use crate::error::{CacheError, CacheResult};
use crate::types::CacheInfo;

/// Metadata codec strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InfoCodec {
    /// Compact UTF-8 JSON.
    Json,
    /// Indented UTF-8 JSON.
    #[default]
    PrettyJson,
}

impl InfoCodec {
    pub fn encode(&self, info: &CacheInfo) -> CacheResult<Vec<u8>> {
        let encoded = match self {
            Self::Json => serde_json::to_vec(info),
            Self::PrettyJson => serde_json::to_vec_pretty(info),
        };
        encoded.map_err(|e| CacheError::Config {
            message: format!("failed to encode cache info: {}", e),
        })
    }

    /// Decode a metadata buffer; `path` is only used for error context.
    pub fn decode(&self, bytes: &[u8], path: &str) -> CacheResult<CacheInfo> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::MalformedInfo {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> CacheInfo {
        let now = Utc::now();
        CacheInfo {
            url: "https://example.com/defs/a.d.ts".to_string(),
            key: "0f3a9c".to_string(),
            content_type: Some("text/plain; charset=utf-8".to_string()),
            cache_created: now - chrono::Duration::hours(2),
            cache_updated: now,
            http_etag: Some("W/\"abc\"".to_string()),
            http_modified: Some(now - chrono::Duration::days(3)),
            content_checksum: crate::digest::checksum(b"declare module 'a';"),
        }
    }

    #[test]
    fn decode_reproduces_all_fields() {
        let info = sample();
        for codec in [InfoCodec::Json, InfoCodec::PrettyJson] {
            let bytes = codec.encode(&info).unwrap();
            assert!(!bytes.is_empty());
            assert_eq!(codec.decode(&bytes, "x.json").unwrap(), info);
        }
    }

    #[test]
    fn pretty_is_indented() {
        let bytes = InfoCodec::PrettyJson.encode(&sample()).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("\n  \"url\""));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = InfoCodec::default()
            .decode(b"invalid json content", "/c/x.json")
            .unwrap_err();
        assert!(matches!(err, CacheError::MalformedInfo { ref path, .. } if path == "/c/x.json"));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = InfoCodec::Json
            .decode(br#"{"url":"https://example.com","key":"x"}"#, "x.json")
            .unwrap_err();
        assert!(matches!(err, CacheError::MalformedInfo { .. }));
    }
}

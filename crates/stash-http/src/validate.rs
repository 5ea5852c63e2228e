//! Integrity policies for cached metadata and bodies.
//!
//! Validators only inspect a [`CacheObject`]; they never mutate it.

use std::time::Duration;

use chrono::{TimeDelta, Utc};

use crate::error::{CacheError, CacheResult};
use crate::object::CacheObject;
use crate::schema::InfoSchema;

/// Metadata trust policy.
#[derive(Debug, Clone)]
pub enum InfoValidator {
    /// Schema only. Used when there is no remote to fall back to.
    Strict { schema: InfoSchema },
    /// Schema plus freshness. Staleness routes to a re-fetch.
    MaxAge {
        schema: InfoSchema,
        max_age: Option<Duration>,
    },
}

impl InfoValidator {
    /// Pick the policy for a loader: age-aware when remote reads are allowed.
    pub fn for_remote(schema: InfoSchema, remote_read: bool, max_age: Option<Duration>) -> Self {
        if remote_read {
            Self::MaxAge { schema, max_age }
        } else {
            Self::Strict { schema }
        }
    }

    pub fn assert(&self, object: &CacheObject) -> CacheResult<()> {
        let key = object.request().key();
        let info = object.info().ok_or_else(|| CacheError::Unsatisfactory {
            key: key.to_string(),
            reason: "no info object".to_string(),
        })?;

        let schema = match self {
            Self::Strict { schema } | Self::MaxAge { schema, .. } => schema,
        };
        let instance = serde_json::to_value(info).map_err(|e| CacheError::Unsatisfactory {
            key: key.to_string(),
            reason: format!("info not representable: {}", e),
        })?;
        schema
            .validate(&instance)
            .map_err(|reason| CacheError::Unsatisfactory {
                key: key.to_string(),
                reason,
            })?;

        if let Self::MaxAge {
            max_age: Some(max_age),
            ..
        } = self
        {
            // Ages too large for chrono never expire.
            let threshold = TimeDelta::from_std(*max_age)
                .ok()
                .and_then(|age| Utc::now().checked_sub_signed(age));
            if let Some(threshold) = threshold {
                if info.cache_updated < threshold {
                    return Err(CacheError::Unsatisfactory {
                        key: key.to_string(),
                        reason: format!(
                            "stale: updated {} is older than {}s",
                            info.cache_updated.to_rfc3339(),
                            max_age.as_secs()
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Body trust policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyValidator {
    /// Computed checksum must equal the recorded one.
    #[default]
    Checksum,
}

impl BodyValidator {
    pub fn assert(&self, object: &CacheObject) -> CacheResult<()> {
        match self {
            Self::Checksum => {
                let key = object.request().key();
                let expected = object
                    .info()
                    .map(|i| i.content_checksum.as_str())
                    .unwrap_or_default();
                let actual = object.body_checksum().unwrap_or_default();
                if expected.is_empty() || actual != expected {
                    return Err(CacheError::ChecksumMismatch {
                        key: key.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

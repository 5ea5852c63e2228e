//! Cache gates and sharding configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache options, fixed for the lifetime of a [`CacheStore`](crate::CacheStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Read entries from disk.
    #[serde(default = "default_true")]
    pub cache_read: bool,

    /// Write fetched entries to disk.
    #[serde(default = "default_true")]
    pub cache_write: bool,

    /// Fetch from the remote.
    #[serde(default = "default_true")]
    pub remote_read: bool,

    /// Directory fan-out depth for key sharding (0 = flat).
    #[serde(default)]
    pub split_key_dir: usize,

    /// Max metadata age applied when a request carries none.
    #[serde(default, with = "duration_secs")]
    pub local_max_age: Option<Duration>,
}

fn default_true() -> bool {
    true
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            cache_read: true,
            cache_write: true,
            remote_read: true,
            split_key_dir: 0,
            local_max_age: None,
        }
    }
}

impl CacheOptions {
    /// Create options from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `STASH_CACHE_READ` | Read from disk (`1`/`true`/`0`/`false`) |
    /// | `STASH_CACHE_WRITE` | Write to disk |
    /// | `STASH_REMOTE_READ` | Fetch from the remote |
    /// | `STASH_SPLIT_KEY_DIR` | Sharding depth |
    /// | `STASH_LOCAL_MAX_AGE` | Default max metadata age in seconds |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_read: env_flag("STASH_CACHE_READ").unwrap_or(defaults.cache_read),
            cache_write: env_flag("STASH_CACHE_WRITE").unwrap_or(defaults.cache_write),
            remote_read: env_flag("STASH_REMOTE_READ").unwrap_or(defaults.remote_read),
            split_key_dir: std::env::var("STASH_SPLIT_KEY_DIR")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.split_key_dir),
            local_max_age: std::env::var("STASH_LOCAL_MAX_AGE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Only read from disk; never fetch, write or delete.
    pub fn offline() -> Self {
        Self {
            cache_write: false,
            remote_read: false,
            ..Self::default()
        }
    }

    pub fn with_cache_read(mut self, enabled: bool) -> Self {
        self.cache_read = enabled;
        self
    }

    pub fn with_cache_write(mut self, enabled: bool) -> Self {
        self.cache_write = enabled;
        self
    }

    pub fn with_remote_read(mut self, enabled: bool) -> Self {
        self.remote_read = enabled;
        self
    }

    pub fn with_split_key_dir(mut self, depth: usize) -> Self {
        self.split_key_dir = depth;
        self
    }

    pub fn with_local_max_age(mut self, max_age: Duration) -> Self {
        self.local_max_age = Some(max_age);
        self
    }

    /// Whether a loader may mutate or delete on-disk entries.
    ///
    /// Requires read, remote and write all enabled.
    pub fn can_update(&self) -> bool {
        self.cache_read && self.remote_read && self.cache_write
    }

    /// All gates closed: the loader does nothing.
    pub fn is_inert(&self) -> bool {
        !self.cache_read && !self.cache_write && !self.remote_read
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim() {
        v if v == "1" || v.eq_ignore_ascii_case("true") => Some(true),
        v if v == "0" || v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "STASH_CACHE_READ",
        "STASH_CACHE_WRITE",
        "STASH_REMOTE_READ",
        "STASH_SPLIT_KEY_DIR",
        "STASH_LOCAL_MAX_AGE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn update_policy_requires_all_gates() {
        assert!(CacheOptions::default().can_update());
        assert!(!CacheOptions::default().with_cache_write(false).can_update());
        assert!(!CacheOptions::default().with_remote_read(false).can_update());
        assert!(!CacheOptions::default().with_cache_read(false).can_update());
        assert!(!CacheOptions::offline().can_update());
    }

    #[test]
    fn inert_when_all_gates_closed() {
        let opts = CacheOptions::default()
            .with_cache_read(false)
            .with_cache_write(false)
            .with_remote_read(false);
        assert!(opts.is_inert());
        assert!(!CacheOptions::offline().is_inert());
    }

    #[test]
    #[serial]
    fn from_env_defaults() {
        clear_env();
        assert_eq!(CacheOptions::from_env(), CacheOptions::default());
    }

    #[test]
    #[serial]
    fn from_env_reads_gates_and_depth() {
        clear_env();
        std::env::set_var("STASH_CACHE_WRITE", "false");
        std::env::set_var("STASH_REMOTE_READ", "0");
        std::env::set_var("STASH_SPLIT_KEY_DIR", "2");
        std::env::set_var("STASH_LOCAL_MAX_AGE", "3600");

        let opts = CacheOptions::from_env();
        clear_env();

        assert!(opts.cache_read);
        assert!(!opts.cache_write);
        assert!(!opts.remote_read);
        assert_eq!(opts.split_key_dir, 2);
        assert_eq!(opts.local_max_age, Some(Duration::from_secs(3600)));
    }

    #[test]
    #[serial]
    fn from_env_ignores_garbage() {
        clear_env();
        std::env::set_var("STASH_CACHE_READ", "maybe");
        std::env::set_var("STASH_SPLIT_KEY_DIR", "-1");

        let opts = CacheOptions::from_env();
        clear_env();

        assert!(opts.cache_read);
        assert_eq!(opts.split_key_dir, 0);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let opts: CacheOptions =
            serde_json::from_str(r#"{"remote_read": false, "local_max_age": 60}"#).unwrap();
        assert!(opts.cache_read);
        assert!(opts.cache_write);
        assert!(!opts.remote_read);
        assert_eq!(opts.local_max_age, Some(Duration::from_secs(60)));
    }
}

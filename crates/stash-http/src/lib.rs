//! Disk-backed HTTP response cache with conditional revalidation.
//!
//! Given a url and a stable cache key, a [`CacheLoader`] returns a validated
//! byte payload, touching the network only when the local copy is absent,
//! stale or explicitly bypassed:
//!
//! - Local entries are a body file plus a JSON metadata file (`cache_info_v1`)
//! - Metadata is schema- and age-checked, bodies are checksum-checked (SHA-256)
//! - Corrupt entries are removed and re-fetched
//! - Re-fetches send `If-None-Match`; a 304 only refreshes metadata
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stash_http::{CacheOptions, CacheStore, Request};
//!
//! # async fn example() -> stash_http::CacheResult<()> {
//! let store = Arc::new(CacheStore::new(
//!     "/var/cache/defs",
//!     CacheOptions::default().with_split_key_dir(2),
//! )?);
//!
//! let request = Request::builder("https://example.com/defs/node.d.ts", "3f9a0c")
//!     .local_max_age(Duration::from_secs(24 * 60 * 60))
//!     .build()?;
//!
//! let object = store.loader(request).get_object().await?;
//! println!("{} bytes", object.body().map_or(0, <[u8]>::len));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `STASH_CACHE_DIR` | Store directory (default: platform cache dir + `stash/http`) |
//! | `STASH_CACHE_READ` | Read entries from disk (default: true) |
//! | `STASH_CACHE_WRITE` | Write entries to disk (default: true) |
//! | `STASH_REMOTE_READ` | Fetch from the remote (default: true) |
//! | `STASH_SPLIT_KEY_DIR` | Key sharding depth (default: 0) |
//! | `STASH_LOCAL_MAX_AGE` | Default max metadata age in seconds |
//!
//! # Concurrency
//!
//! Loaders sharing a store take no locks against each other. Two loaders for
//! the same key can race on disk writes; serialize them externally if needed.

pub mod codec;
mod digest;
pub mod error;
mod http;
pub mod keys;
pub mod loader;
pub mod object;
pub mod options;
pub mod schema;
pub mod store;
pub mod types;
pub mod validate;

// Re-export main types
pub use codec::InfoCodec;
pub use digest::checksum;
pub use error::{Artifact, CacheError, CacheResult, ErrorKind, Phase};
pub use keys::{shard, EntryPaths};
pub use loader::CacheLoader;
pub use object::CacheObject;
pub use options::CacheOptions;
pub use schema::InfoSchema;
pub use store::CacheStore;
pub use types::{CacheInfo, Request, RequestBuilder, ResponseInfo};
pub use validate::{BodyValidator, InfoValidator};

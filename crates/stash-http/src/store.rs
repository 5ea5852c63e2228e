//! Shared cache store: root directory, options, codec, schema and HTTP client.
//!
//! # Cache Structure
//!
//! ```text
//! {store_dir}/{shard...}/
//!   {key}.raw     # Response body
//!   {key}.json    # Cache metadata (cache_info_v1)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::fs;
use tracing::debug;

use crate::codec::InfoCodec;
use crate::error::{CacheError, CacheResult, Phase};
use crate::keys::EntryPaths;
use crate::loader::{io, CacheLoader};
use crate::options::CacheOptions;
use crate::schema::InfoSchema;
use crate::types::Request;

const USER_AGENT_VALUE: &str = concat!("stash-http/", env!("CARGO_PKG_VERSION"));

/// Store configuration and shared read-only services.
///
/// Never mutated after construction; share it between loaders with `Arc`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    store_dir: PathBuf,
    options: CacheOptions,
    codec: InfoCodec,
    schema: InfoSchema,
    client: reqwest::Client,
}

impl CacheStore {
    /// Create a store rooted at `store_dir`.
    pub fn new(store_dir: impl Into<PathBuf>, options: CacheOptions) -> CacheResult<Self> {
        Ok(Self {
            store_dir: store_dir.into(),
            options,
            codec: InfoCodec::default(),
            schema: InfoSchema::cache_info_v1()?,
            client: default_client()?,
        })
    }

    /// Create a store from environment variables.
    ///
    /// `STASH_CACHE_DIR` overrides the platform cache directory; options come
    /// from [`CacheOptions::from_env`].
    pub fn from_env() -> CacheResult<Self> {
        let dir = match std::env::var("STASH_CACHE_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_store_dir()?,
        };
        Self::new(dir, CacheOptions::from_env())
    }

    pub fn with_codec(mut self, codec: InfoCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_schema(mut self, schema: InfoSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Use a caller-built HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn codec(&self) -> InfoCodec {
        self.codec
    }

    pub fn schema(&self) -> &InfoSchema {
        &self.schema
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Resolve the entry locations for `key`.
    pub fn paths(&self, key: &str) -> EntryPaths {
        EntryPaths::resolve(&self.store_dir, key, self.options.split_key_dir)
    }

    /// Create a loader for one request.
    pub fn loader(self: &Arc<Self>, request: Request) -> CacheLoader {
        CacheLoader::new(Arc::clone(self), request)
    }

    /// Remove both files of one entry.
    pub async fn evict(&self, key: &str) -> CacheResult<()> {
        let paths = self.paths(key);
        io::remove_file(&paths.info_file).await?;
        io::remove_file(&paths.body_file).await?;
        debug!(key, "evicted from cache");
        Ok(())
    }

    /// Remove the whole store directory.
    pub async fn clear(&self) -> CacheResult<()> {
        let exists = fs::try_exists(&self.store_dir)
            .await
            .map_err(|e| CacheError::io(Phase::Remove, &self.store_dir, e))?;
        if exists {
            fs::remove_dir_all(&self.store_dir)
                .await
                .map_err(|e| CacheError::io(Phase::Remove, &self.store_dir, e))?;
            debug!(dir = %self.store_dir.display(), "cleared cache store");
        }
        Ok(())
    }
}

fn default_client() -> CacheResult<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .default_headers(default_headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| CacheError::Config {
            message: format!("failed to create HTTP client: {}", e),
        })
}

fn default_store_dir() -> CacheResult<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| CacheError::Config {
            message: "could not determine cache directory".to_string(),
        })?;

    Ok(base.join("stash").join("http"))
}

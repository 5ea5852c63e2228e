//! Per-request cache load workflow.
//!
//! One run is a strictly ordered pipeline:
//!
//! ```text
//! read local ──► local hit ─────────────────────────────► done
//!     │
//!     └──► fetch ──► 304 ──► write info ────────────────► done
//!              └───► 200 ──► write body, then info ─────► done
//! ```
//!
//! Read failures clear the object and (update policy permitting) remove the
//! entry before falling back to a fetch. Fetch and write failures reject the
//! call; nothing is retried.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, info_span, Instrument};

use crate::error::{CacheError, CacheResult};
use crate::keys::EntryPaths;
use crate::object::CacheObject;
use crate::store::CacheStore;
use crate::types::Request;
use crate::validate::{BodyValidator, InfoValidator};

pub mod events;
mod fetch;
pub(crate) mod io;
mod read;
mod remove;
mod write;

type PendingLoad = Shared<BoxFuture<'static, CacheResult<Arc<CacheObject>>>>;

/// Loads one request through the cache.
///
/// Concurrent [`get_object`](Self::get_object) calls on the same loader share
/// one run. Build a new loader per distinct request.
pub struct CacheLoader {
    inner: Arc<LoaderInner>,
    pending: Mutex<Option<PendingLoad>>,
}

pub(crate) struct LoaderInner {
    pub(crate) store: Arc<CacheStore>,
    pub(crate) request: Arc<Request>,
    pub(crate) paths: EntryPaths,
    pub(crate) info_validator: InfoValidator,
    pub(crate) body_validator: BodyValidator,
}

impl CacheLoader {
    pub fn new(store: Arc<CacheStore>, request: Request) -> Self {
        let options = store.options();
        let info_validator = InfoValidator::for_remote(
            store.schema().clone(),
            options.remote_read,
            request.local_max_age().or(options.local_max_age),
        );
        let paths = store.paths(request.key());

        Self {
            inner: Arc::new(LoaderInner {
                store,
                request: Arc::new(request),
                paths,
                info_validator,
                body_validator: BodyValidator::default(),
            }),
            pending: Mutex::new(None),
        }
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    pub fn store(&self) -> &CacheStore {
        &self.inner.store
    }

    pub fn paths(&self) -> &EntryPaths {
        &self.inner.paths
    }

    /// Resolve the request to a validated object.
    ///
    /// Joins the in-flight run if there is one; otherwise starts a new one.
    pub async fn get_object(&self) -> CacheResult<Arc<CacheObject>> {
        let load = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.as_ref() {
                Some(load) if load.peek().is_none() => {
                    debug!(
                        event = events::GET_OBJECT,
                        skipped = true,
                        key = self.inner.request.key(),
                        "joining in-flight load"
                    );
                    load.clone()
                }
                _ => {
                    let load = Arc::clone(&self.inner).run().boxed().shared();
                    *pending = Some(load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.as_ref().is_some_and(|p| p.ptr_eq(&load)) {
            *pending = None;
        }
        result
    }
}

impl fmt::Display for CacheLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.request.url())
    }
}

impl fmt::Debug for CacheLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLoader")
            .field("url", &self.inner.request.url())
            .field("key", &self.inner.request.key())
            .field("paths", &self.inner.paths)
            .finish_non_exhaustive()
    }
}

impl LoaderInner {
    async fn run(self: Arc<Self>) -> CacheResult<Arc<CacheObject>> {
        let span = info_span!(
            "get_object",
            key = self.request.key(),
            url = self.request.url()
        );
        async move {
            let mut object = CacheObject::new(Arc::clone(&self.request), self.paths.clone());

            let read_failure = match read::cache_read(&self, &mut object).await {
                Ok(state) => {
                    debug!(event = events::CACHE_READ, ?state, "local read done");
                    None
                }
                // Without the update policy a bad entry can be neither
                // repaired nor replaced.
                Err(err) if !self.store.options().can_update() => return Err(err),
                Err(err) => {
                    debug!(event = events::CACHE_READ, error = %err, "no usable local copy");
                    Some(err)
                }
            };

            if self.use_cached(&object) {
                info!(event = events::GET_OBJECT, "using local cache");
                return Ok(Arc::new(object));
            }

            fetch::http_load(&self, &mut object, !self.request.force_refresh()).await?;

            if object.body().is_none() {
                return Err(CacheError::NoResultBody {
                    url: self.request.url().to_string(),
                    cause: read_failure.map(Box::new),
                });
            }
            info!(event = events::GET_OBJECT, "resolved");
            Ok(Arc::new(object))
        }
        .instrument(span)
        .await
    }

    /// Trust the local copy unless forced, or due for an interval re-check.
    fn use_cached(&self, object: &CacheObject) -> bool {
        if !object.has_local_copy() || self.request.force_refresh() {
            return false;
        }
        let (Some(interval), Some(info)) = (self.request.http_interval(), object.info()) else {
            return true;
        };
        let due = TimeDelta::from_std(interval)
            .ok()
            .and_then(|i| Utc::now().checked_sub_signed(i))
            .is_some_and(|threshold| info.cache_updated < threshold);
        if due {
            info!(event = events::GET_OBJECT, "auto check update on interval");
        }
        !due
    }
}

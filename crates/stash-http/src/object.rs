//! The per-load working object.

use std::path::Path;
use std::sync::Arc;

use crate::keys::EntryPaths;
use crate::types::{CacheInfo, Request, ResponseInfo};

/// State of one cache load: request, resolved paths, metadata and body.
///
/// Built fresh for every run of a [`CacheLoader`](crate::CacheLoader) and
/// handed to the caller only once fully validated.
#[derive(Debug, Clone)]
pub struct CacheObject {
    request: Arc<Request>,
    paths: EntryPaths,
    pub(crate) info: Option<CacheInfo>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) body_checksum: Option<String>,
    pub(crate) response: Option<ResponseInfo>,
}

impl CacheObject {
    pub(crate) fn new(request: Arc<Request>, paths: EntryPaths) -> Self {
        Self {
            request,
            paths,
            info: None,
            body: None,
            body_checksum: None,
            response: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn store_dir(&self) -> &Path {
        &self.paths.store_dir
    }

    pub fn body_file(&self) -> &Path {
        &self.paths.body_file
    }

    pub fn info_file(&self) -> &Path {
        &self.paths.info_file
    }

    pub fn info(&self) -> Option<&CacheInfo> {
        self.info.as_ref()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as UTF-8, if present and valid.
    pub fn body_str(&self) -> Option<&str> {
        self.body().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Checksum computed from the bytes in `body`.
    pub fn body_checksum(&self) -> Option<&str> {
        self.body_checksum.as_deref()
    }

    /// Response of the fetch in this run, if one happened.
    pub fn response(&self) -> Option<&ResponseInfo> {
        self.response.as_ref()
    }

    pub(crate) fn has_local_copy(&self) -> bool {
        self.info.is_some() && self.body.is_some()
    }

    pub(crate) fn clear_local(&mut self) {
        self.info = None;
        self.body = None;
        self.body_checksum = None;
    }
}

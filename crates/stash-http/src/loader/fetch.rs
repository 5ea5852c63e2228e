//! Fetch phase: conditional GET and metadata refresh.

use chrono::Utc;
use tracing::{debug, info};

use crate::digest::checksum;
use crate::error::{CacheError, CacheResult};
use crate::http::{self, FetchOutcome};
use crate::object::CacheObject;
use crate::types::{CacheInfo, Request, ResponseInfo};

use super::{events, write, LoaderInner};

/// Fetch from the remote and hand the result to the write phase.
///
/// `http_cache` allows a conditional request when a valid local copy exists.
pub(crate) async fn http_load(
    inner: &LoaderInner,
    object: &mut CacheObject,
    http_cache: bool,
) -> CacheResult<()> {
    if !inner.store.options().remote_read {
        debug!(event = events::HTTP_LOAD, skipped = true, "remote read disabled");
        return Ok(());
    }

    let url = inner.request.url();
    let etag = match object.info() {
        Some(info) if http_cache && object.has_local_copy() => info.http_etag.clone(),
        _ => None,
    };

    info!(event = events::HTTP_LOAD, url, conditional = etag.is_some(), "loading");
    let outcome = http::fetch(inner.store.client(), &inner.request, etag.as_deref()).await?;

    match outcome {
        FetchOutcome::NotModified(response) => {
            if object.body.is_none() {
                return Err(flow(url, "http 304 but no local content"));
            }
            let Some(info) = object.info.as_mut() else {
                return Err(flow(url, "http 304 but no local info"));
            };
            info!(event = events::HTTP_CACHE_HIT, url, "not modified");

            let unchanged = info.content_checksum.clone();
            update_info(info, &response, unchanged);
            object.response = Some(response);

            write::cache_write(inner, object, true).await
        }
        FetchOutcome::Fetched { response, body } => {
            if body.is_empty() {
                return Err(flow(url, "no response body"));
            }
            let sum = checksum(&body);

            match object.info.as_mut() {
                Some(info) => update_info(info, &response, sum.clone()),
                None => object.info = Some(copy_info(&inner.request, &response, sum.clone())),
            }
            object.body_checksum = Some(sum);
            object.body = Some(body);
            info!(
                event = events::HTTP_LOAD,
                url,
                status = response.status,
                "fetched"
            );
            object.response = Some(response);

            write::cache_write(inner, object, false).await
        }
    }
}

fn flow(url: &str, message: &str) -> CacheError {
    CacheError::Flow {
        url: url.to_string(),
        message: message.to_string(),
    }
}

/// First record for a request: stamps the creation time.
pub(crate) fn copy_info(request: &Request, response: &ResponseInfo, sum: String) -> CacheInfo {
    let now = Utc::now();
    let mut info = CacheInfo {
        url: request.url().to_string(),
        key: request.key().to_string(),
        content_type: response.content_type().map(String::from),
        cache_created: now,
        cache_updated: now,
        http_etag: None,
        http_modified: None,
        content_checksum: String::new(),
    };
    update_info(&mut info, response, sum);
    info
}

/// Refresh validators and timestamps; the creation time is kept.
pub(crate) fn update_info(info: &mut CacheInfo, response: &ResponseInfo, sum: String) {
    let now = Utc::now();
    if let Some(etag) = response.etag() {
        info.http_etag = Some(etag.to_string());
    }
    info.http_modified = Some(response.last_modified().unwrap_or(now));
    info.cache_updated = now;
    info.content_checksum = sum;
}

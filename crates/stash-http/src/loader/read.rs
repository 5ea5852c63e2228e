//! Read phase: load and validate the local entry.

use tokio::fs;
use tracing::{debug, error, warn};

use crate::digest::checksum;
use crate::error::{Artifact, CacheError, CacheResult, Phase};
use crate::object::CacheObject;
use crate::types::CacheInfo;

use super::{events, io, remove, LoaderInner};

/// What the read phase found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalRead {
    /// Disk reads disabled.
    Skipped,
    /// Nothing usable on disk, but nothing wrong either.
    Miss,
    /// Metadata and body loaded and validated.
    Hit,
}

/// Run the read phase. On failure the object is cleared and the entry removed
/// (when the update policy allows) before the error is returned.
pub(crate) async fn cache_read(
    inner: &LoaderInner,
    object: &mut CacheObject,
) -> CacheResult<LocalRead> {
    if !inner.store.options().cache_read {
        debug!(event = events::CACHE_READ, skipped = true, "cache read disabled");
        return Ok(LocalRead::Skipped);
    }

    match read_local(inner, object).await {
        Ok(LocalRead::Miss) => {
            object.clear_local();
            // Clean up leftovers such as an orphaned body or an empty info file.
            remove::cache_remove(inner).await;
            Ok(LocalRead::Miss)
        }
        Ok(state) => Ok(state),
        Err(err) => {
            object.clear_local();
            remove::cache_remove(inner).await;
            Err(err)
        }
    }
}

async fn read_local(inner: &LoaderInner, object: &mut CacheObject) -> CacheResult<LocalRead> {
    let key = inner.request.key();

    let Some(info) = read_info(inner).await? else {
        debug!(event = events::CACHE_READ, key, "no local info");
        return Ok(LocalRead::Miss);
    };
    object.info = Some(info);

    if let Err(err) = inner.info_validator.assert(object) {
        debug!(
            event = events::LOCAL_INFO_BAD,
            key,
            error = %err,
            "cache info unsatisfactory"
        );
        return Err(err);
    }

    if let Some(info) = object.info() {
        check_identity(inner, info)?;
    }

    let body = fs::read(&inner.paths.body_file)
        .await
        .map_err(|e| CacheError::io(Phase::Read, &inner.paths.body_file, e))?;
    if body.is_empty() {
        warn!(event = events::LOCAL_BODY_EMPTY, key, "empty body file");
        return Err(CacheError::EmptyArtifact {
            phase: Phase::Read,
            artifact: Artifact::Body,
            path: inner.paths.body_file.display().to_string(),
        });
    }
    object.body_checksum = Some(checksum(&body));
    object.body = Some(body);

    if let Err(err) = inner.body_validator.assert(object) {
        error!(
            event = events::LOCAL_BODY_BAD,
            key,
            error = %err,
            "cache body invalid"
        );
        return Err(err);
    }

    debug!(event = events::LOCAL_CACHE_HIT, key, "valid local entry");
    Ok(LocalRead::Hit)
}

async fn read_info(inner: &LoaderInner) -> CacheResult<Option<CacheInfo>> {
    let path = &inner.paths.info_file;

    let Some(buffer) = io::read_optional(path).await? else {
        return Ok(None);
    };
    if buffer.is_empty() {
        debug!(
            event = events::LOCAL_INFO_EMPTY,
            path = %path.display(),
            "empty info file"
        );
        return Ok(None);
    }

    let info = inner
        .store
        .codec()
        .decode(&buffer, &path.display().to_string())
        .map_err(|err| {
            warn!(
                event = events::LOCAL_INFO_MALFORMED,
                path = %path.display(),
                error = %err,
                "malformed info file"
            );
            err
        })?;

    debug!(event = events::INFO_READ, path = %path.display(), "read info file");
    Ok(Some(info))
}

/// The stored record must belong to this request; anything else means the
/// store location was reused or corrupted.
fn check_identity(inner: &LoaderInner, info: &CacheInfo) -> CacheResult<()> {
    let request = &inner.request;
    let checks = [
        ("url", request.url(), info.url.as_str()),
        ("key", request.key(), info.key.as_str()),
    ];
    for (field, expected, found) in checks {
        if expected != found {
            error!(
                event = events::LOCAL_INFO_MALFORMED,
                field,
                expected,
                found,
                "cache info does not match request"
            );
            return Err(CacheError::InfoMismatch {
                field,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }
    Ok(())
}

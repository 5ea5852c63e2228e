//! Write phase: persist body then metadata.

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::{Artifact, CacheError, CacheResult, Phase};
use crate::object::CacheObject;

use super::{events, io, LoaderInner};

/// Persist the object. With `cache_was_fresh` the server confirmed the body
/// unchanged and only metadata is rewritten.
pub(crate) async fn cache_write(
    inner: &LoaderInner,
    object: &CacheObject,
    cache_was_fresh: bool,
) -> CacheResult<()> {
    if !inner.store.options().cache_write {
        debug!(event = events::CACHE_WRITE, skipped = true, "cache write disabled");
        return Ok(());
    }

    let paths = &inner.paths;
    let body = object.body().unwrap_or_default();
    if body.is_empty() {
        return Err(empty(Artifact::Body, &paths.body_file));
    }
    let Some(info) = object.info() else {
        return Err(empty(Artifact::Info, &paths.info_file));
    };
    let encoded = inner.store.codec().encode(info)?;
    if encoded.is_empty() {
        return Err(empty(Artifact::Info, &paths.info_file));
    }

    // Body first, metadata last: metadata is the commit record.
    if cache_was_fresh {
        debug!(event = events::CACHE_WRITE, skipped = true, "cache was fresh");
    } else {
        io::write_atomic(&paths.body_file, body).await?;
        info!(
            event = events::CACHE_WRITE,
            key = inner.request.key(),
            bytes = body.len(),
            "written body to cache"
        );
    }
    io::write_atomic(&paths.info_file, &encoded).await?;

    for (artifact, path) in [
        (Artifact::Body, &paths.body_file),
        (Artifact::Info, &paths.info_file),
    ] {
        match fs::metadata(path).await {
            Ok(meta) if meta.len() == 0 => error!(
                event = events::CACHE_WRITE,
                %artifact,
                path = %path.display(),
                "written zero {} bytes",
                artifact
            ),
            Ok(_) => {}
            Err(err) => warn!(
                event = events::CACHE_WRITE,
                %artifact,
                path = %path.display(),
                error = %err,
                "could not stat written file"
            ),
        }
    }

    Ok(())
}

fn empty(artifact: Artifact, path: &std::path::Path) -> CacheError {
    CacheError::EmptyArtifact {
        phase: Phase::Write,
        artifact,
        path: path.display().to_string(),
    }
}

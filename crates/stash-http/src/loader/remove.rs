//! Self-healing removal of a bad entry.

use tracing::{debug, info, warn};

use super::{events, io, LoaderInner};

/// Delete both files of the entry, if the update policy allows it.
///
/// Best effort: failures are logged and swallowed.
pub(crate) async fn cache_remove(inner: &LoaderInner) {
    if !inner.store.options().can_update() {
        debug!(
            event = events::CACHE_REMOVE,
            skipped = true,
            key = inner.request.key(),
            "update policy off, keeping entry"
        );
        return;
    }
    for path in [&inner.paths.info_file, &inner.paths.body_file] {
        match io::remove_file(path).await {
            Ok(true) => info!(
                event = events::CACHE_REMOVE,
                key = inner.request.key(),
                path = %path.display(),
                "removed cache file"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                event = events::CACHE_REMOVE,
                key = inner.request.key(),
                error = %err,
                "failed to remove cache file"
            ),
        }
    }
}

//! Cache key to path derivation.

use std::path::{Path, PathBuf};

/// Body file extension.
pub(crate) const BODY_EXT: &str = "raw";
/// Metadata file extension.
pub(crate) const INFO_EXT: &str = "json";

/// Resolved locations of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPaths {
    /// Sharded directory holding both files.
    pub store_dir: PathBuf,
    /// `{store_dir}/{key}.raw`
    pub body_file: PathBuf,
    /// `{store_dir}/{key}.json`
    pub info_file: PathBuf,
}

impl EntryPaths {
    pub(crate) fn resolve(base: &Path, key: &str, depth: usize) -> Self {
        let key = key.trim_matches(is_separator);
        let store_dir = shard(base, key, depth, 1);
        let body_file = store_dir.join(format!("{}.{}", key, BODY_EXT));
        let info_file = store_dir.join(format!("{}.{}", key, INFO_EXT));
        Self {
            store_dir,
            body_file,
            info_file,
        }
    }
}

/// Fan a key out into nested directories under `base`.
///
/// Takes up to `depth * chunk` leading characters of the key (never more than
/// `len - 2`) and appends them as `chunk`-sized directory names. Path
/// separators are not counted, so every level is a plain name under `base`.
/// Depth 0 returns `base` unchanged.
pub fn shard(base: &Path, key: &str, depth: usize, chunk: usize) -> PathBuf {
    if depth == 0 {
        return base.to_path_buf();
    }
    let chunk = chunk.max(1);
    let chars: Vec<char> = key.chars().filter(|c| !is_separator(*c)).collect();
    let steps = chars.len().saturating_sub(2).min(depth.saturating_mul(chunk));

    let mut dir = base.to_path_buf();
    for start in (0..steps).step_by(chunk) {
        let end = (start + chunk).min(chars.len());
        let level: String = chars[start..end].iter().collect();
        // "." and ".." would not name a child directory.
        if level.chars().all(|c| c == '.') {
            continue;
        }
        dir.push(level);
    }
    dir
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

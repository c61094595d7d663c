//! Timestamp-based file names
//!
//! Names have the form `yyyyMMdd_HHmmss[_N]<ext>`. When the plain name is
//! taken, `_1`, `_2`, ... are tried in order and existence is re-checked on
//! every attempt, since earlier renames in the same run may have just
//! claimed a name.
//!
//! A file's own path never counts as taken. A file that already carries its
//! canonical name therefore keeps it, and is reported as skipped rather than
//! renamed.
//!
//! Two runs over the same tree at the same time can both see a name as free
//! and race on it. Running concurrently is not supported.

use crate::config::NamingZone;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// chrono format of the timestamp part of a name
pub const NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp part of a name, e.g. `20210504_101500`
pub fn format_stem(instant: DateTime<Utc>, zone: NamingZone) -> String {
    zone.format(instant, NAME_FORMAT)
}

/// Candidate name for a given suffix index; index 0 has no suffix
pub fn candidate_name(stem: &str, extension: &str, index: u32) -> String {
    if index == 0 {
        format!("{stem}{extension}")
    } else {
        format!("{stem}_{index}{extension}")
    }
}

/// First free `yyyyMMdd_HHmmss[_N]<ext>` path in `dir`
///
/// `own` is the path of the file being renamed, if it already lives in
/// `dir`; it is treated as free.
pub fn next_available_name(
    instant: DateTime<Utc>,
    extension: &str,
    dir: &Path,
    zone: NamingZone,
    own: Option<&Path>,
) -> Result<PathBuf> {
    let stem = format_stem(instant, zone);
    find_free_name(&stem, extension, dir, u32::MAX, |path| {
        if own == Some(path) {
            Ok(false)
        } else {
            path.try_exists()
        }
    })
}

/// Try suffix indices `0..=max_index` until `exists` reports a free path
fn find_free_name<F>(
    stem: &str,
    extension: &str,
    dir: &Path,
    max_index: u32,
    mut exists: F,
) -> Result<PathBuf>
where
    F: FnMut(&Path) -> io::Result<bool>,
{
    for index in 0..=max_index {
        let candidate = dir.join(candidate_name(stem, extension, index));
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        trace!(?candidate, "Name taken");
    }

    Err(Error::NameExhausted {
        dir: dir.to_path_buf(),
        base: candidate_name(stem, extension, 0),
    })
}

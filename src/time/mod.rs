//! Capture time resolution
//!
//! A file can carry up to three timestamps:
//! - File system modification time
//! - File system creation time (where the platform records one)
//! - An embedded capture time from EXIF (images) or the QuickTime creation
//!   date (videos)
//!
//! Copies and syncs tend to push file system times forward, so the earliest
//! of the available candidates is taken as the capture time.

pub mod exif;
pub mod metadata;
pub mod quicktime;

use crate::classify::{MediaCategory, classify};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use metadata::{ContainerKind, ContainerMetadata, MetadataService};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, trace};

/// Source of a timestamp candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Embedded EXIF or container metadata
    Embedded,
    /// File system creation time
    FileCreated,
    /// File system modification time
    FileModified,
}

/// All timestamps known for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateTimestamps {
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub embedded: Option<DateTime<Utc>>,
}

impl CandidateTimestamps {
    /// Earliest present candidate; embedded metadata wins ties
    pub fn earliest(&self) -> Option<ResolvedTimestamp> {
        [
            (self.embedded, TimeSource::Embedded),
            (self.created, TimeSource::FileCreated),
            (self.modified, TimeSource::FileModified),
        ]
        .into_iter()
        .filter_map(|(time, source)| time.map(|instant| ResolvedTimestamp { instant, source }))
        .fold(None, |best: Option<ResolvedTimestamp>, candidate| match best {
            Some(best) if best.instant <= candidate.instant => Some(best),
            _ => Some(candidate),
        })
    }
}

/// The instant chosen to name a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub instant: DateTime<Utc>,
    pub source: TimeSource,
}

/// Resolves capture times using a [`MetadataService`] for embedded tags
#[derive(Debug, Clone, Default)]
pub struct TimestampResolver<M = ContainerMetadata> {
    metadata: M,
}

impl<M: MetadataService> TimestampResolver<M> {
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }

    /// Collect every timestamp candidate for `path`
    ///
    /// Only file system attribute failures are errors. Embedded metadata that
    /// is missing or unreadable leaves `embedded` empty.
    pub fn candidates(&self, path: &Path) -> Result<CandidateTimestamps> {
        let attribute_error = |source: std::io::Error| Error::AttributeRead {
            path: path.to_path_buf(),
            source,
        };

        let meta = fs::metadata(path).map_err(attribute_error)?;
        let modified = meta.modified().map_err(attribute_error)?;
        let created = match meta.created() {
            Ok(time) => Some(DateTime::<Utc>::from(time)),
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                trace!(?path, "File system does not record creation time");
                None
            }
            Err(e) => return Err(attribute_error(e)),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        Ok(CandidateTimestamps {
            modified: Some(modified.into()),
            created,
            embedded: self.embedded_time(path, classify(&name)),
        })
    }

    /// Resolve the capture time of `path`
    pub fn resolve(&self, path: &Path) -> Result<ResolvedTimestamp> {
        let candidates = self.candidates(path)?;
        let resolved = candidates.earliest().ok_or_else(|| Error::NoTimestamp {
            path: path.to_path_buf(),
        })?;

        debug!(
            ?path,
            instant = %resolved.instant,
            source = ?resolved.source,
            "Resolved capture time"
        );
        Ok(resolved)
    }

    fn embedded_time(&self, path: &Path, category: MediaCategory) -> Option<DateTime<Utc>> {
        let lookup = match category {
            MediaCategory::ExifCapableImage => self
                .metadata
                .date_time_original(path)
                .map(|time| time.map(|naive| naive.and_utc())),
            MediaCategory::HeicImage => self
                .metadata
                .container_creation_date(path, ContainerKind::Heif),
            MediaCategory::MovContainer => self
                .metadata
                .container_creation_date(path, ContainerKind::QuickTime),
            MediaCategory::Renamable
            | MediaCategory::DeletableSidecar
            | MediaCategory::Ignored => return None,
        };

        match lookup {
            Ok(Some(time)) => Some(time),
            Ok(None) => {
                debug!(?path, "No embedded capture time");
                None
            }
            Err(e) => {
                debug!(?path, error = %e, "Unreadable metadata, using file system times");
                None
            }
        }
    }
}

//! Embedded metadata lookup
//!
//! The resolver only needs two answers from a media container: the EXIF
//! DateTimeOriginal of an image, and the creation date of a HEIF or QuickTime
//! container. [`MetadataService`] is that seam; [`ContainerMetadata`] is the
//! implementation used by the binary.

use super::{exif, quicktime};
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

/// Container family for [`MetadataService::container_creation_date`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// HEIF image, creation date from EXIF DateTimeOriginal
    Heif,
    /// QuickTime movie, Apple creation date key or movie header time
    QuickTime,
}

/// Source of embedded capture timestamps
///
/// Both methods return `Ok(None)` when the tag is simply missing. Errors are
/// reserved for containers that cannot be read or parsed.
pub trait MetadataService {
    /// EXIF DateTimeOriginal of a JPEG/PNG image, as written by the camera
    fn date_time_original(&self, path: &Path) -> Result<Option<NaiveDateTime>>;

    /// Creation date stored in a HEIF or QuickTime container
    fn container_creation_date(
        &self,
        path: &Path,
        kind: ContainerKind,
    ) -> Result<Option<DateTime<Utc>>>;
}

/// Reads metadata straight from the files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerMetadata;

impl MetadataService for ContainerMetadata {
    fn date_time_original(&self, path: &Path) -> Result<Option<NaiveDateTime>> {
        Ok(exif::read_date_time_original(path)?
            .as_deref()
            .and_then(exif::parse_exif_datetime))
    }

    fn container_creation_date(
        &self,
        path: &Path,
        kind: ContainerKind,
    ) -> Result<Option<DateTime<Utc>>> {
        match kind {
            ContainerKind::Heif => Ok(exif::read_date_time_original(path)?
                .as_deref()
                .and_then(exif::parse_exif_datetime)
                .map(|naive| naive.and_utc())),
            ContainerKind::QuickTime => quicktime::read_creation_time(path),
        }
    }
}

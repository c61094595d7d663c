//! Meta Renamer - rename photos and videos after their capture time
//!
//! This library walks a directory tree and renames media files in place to
//! `yyyyMMdd_HHmmss[_N].<ext>`, with support for:
//! - EXIF DateTimeOriginal for JPEG, PNG and HEIC images
//! - QuickTime creation date for MOV videos
//! - File system creation and modification times
//! - Removal of `.aae` sidecar files

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod naming;
pub mod process;
pub mod time;

pub use classify::{MediaCategory, classify};
pub use cli::Cli;
pub use config::{Config, NamingZone};
pub use error::{Error, Result};
pub use process::{ProcessingOutcome, Renamer, RunSummary, SkipReason};
pub use time::metadata::{ContainerKind, ContainerMetadata, MetadataService};
pub use time::{ResolvedTimestamp, TimeSource, TimestampResolver};

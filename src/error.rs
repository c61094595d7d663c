//! Error types for the media renamer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for renamer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the media renamer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {path}")]
    InvalidRoot { path: PathBuf },

    #[error("Failed to read file attributes of {path}: {source}")]
    AttributeRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to read container metadata from {path}: {message}")]
    ContainerRead { path: PathBuf, message: String },

    #[error("No usable timestamp for {path}")]
    NoTimestamp { path: PathBuf },

    #[error("No free name left for {base} in {dir}")]
    NameExhausted { dir: PathBuf, base: String },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

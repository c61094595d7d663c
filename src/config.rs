//! Configuration types for the media renamer

use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;

/// Time zone used to render new file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingZone {
    /// System local time zone
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
}

impl NamingZone {
    /// Render `instant` with a chrono format string in this zone
    pub fn format(self, instant: DateTime<Utc>, fmt: &str) -> String {
        match self {
            NamingZone::Local => instant.with_timezone(&Local).format(fmt).to_string(),
            NamingZone::Utc => instant.format(fmt).to_string(),
        }
    }
}

/// Configuration for one renaming run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory whose tree is renamed in place
    pub root_dir: PathBuf,

    /// Time zone for generated names
    pub naming_zone: NamingZone,

    /// Verbose output
    pub verbose: bool,

    /// Write the log file as JSON lines
    pub json_log: bool,
}

impl Config {
    /// Configuration for `root_dir` with default settings
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Check that the root exists and is a directory
    pub fn validate(&self) -> crate::Result<()> {
        if self.root_dir.is_dir() {
            Ok(())
        } else {
            Err(crate::Error::InvalidRoot {
                path: self.root_dir.clone(),
            })
        }
    }
}

//! CLI argument parsing with clap

use crate::config::Config;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Meta Renamer - rename photos and videos after their capture time
///
/// Every .jpg, .png, .heic, .mov, .mp4, .m4v and .hevc file below DIRECTORY is
/// renamed in place to yyyyMMdd_HHmmss.<ext>, using the earliest of its
/// embedded capture time and its file system timestamps. .aae sidecar files
/// are deleted.
#[derive(Parser, Debug)]
#[command(name = "meta-renamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to process recursively
    pub directory: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Usage line shown when no usable directory is given
    pub fn usage() -> String {
        Self::command().render_usage().to_string()
    }

    /// Convert CLI arguments to Config, if a directory was given
    pub fn to_config(&self) -> Option<Config> {
        let root = self.directory.as_ref()?;
        let mut config = Config::new(root);
        config.verbose = self.verbose;
        config.json_log = self.json_log;
        Some(config)
    }
}

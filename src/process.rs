//! Recursive in-place renaming
//!
//! Handles the core logic of:
//! - Walking the directory tree one level at a time
//! - Deleting sidecar files
//! - Resolving capture times and renaming media files
//! - Folding per-file outcomes into a run summary
//!
//! A failure on one file or one unreadable directory is recorded and the walk
//! moves on. Only an invalid root aborts a run.

use crate::classify::{MediaCategory, classify, extension_of};
use crate::config::{Config, NamingZone};
use crate::error::{Error, Result};
use crate::naming;
use crate::time::metadata::{ContainerMetadata, MetadataService};
use crate::time::{TimeSource, TimestampResolver};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Why a file was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension is neither media nor sidecar
    Ignored,
    /// The file already carries its timestamp name
    AlreadyNamed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => f.write_str("not a media file"),
            SkipReason::AlreadyNamed => f.write_str("already named after its capture time"),
        }
    }
}

/// Result of processing a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// File renamed in place
    Renamed {
        from: PathBuf,
        to: PathBuf,
        source: TimeSource,
    },
    /// Sidecar removed
    Deleted { path: PathBuf },
    /// File left untouched
    Skipped { path: PathBuf, reason: SkipReason },
    /// Processing failed; the file is unchanged
    Failed { path: PathBuf, reason: String },
}

impl ProcessingOutcome {
    /// Path the outcome is about (the original path for renames)
    pub fn path(&self) -> &Path {
        match self {
            ProcessingOutcome::Renamed { from, .. } => from,
            ProcessingOutcome::Deleted { path }
            | ProcessingOutcome::Skipped { path, .. }
            | ProcessingOutcome::Failed { path, .. } => path,
        }
    }

    fn failed(path: &Path, err: &Error) -> Self {
        ProcessingOutcome::Failed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Counts and outcomes of a run or of one subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub renamed: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<ProcessingOutcome>,
}

impl RunSummary {
    /// Number of successfully renamed files
    pub fn processed(&self) -> usize {
        self.renamed
    }

    /// Add one outcome
    pub fn record(&mut self, outcome: ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Renamed { .. } => self.renamed += 1,
            ProcessingOutcome::Deleted { .. } => self.deleted += 1,
            ProcessingOutcome::Skipped { .. } => self.skipped += 1,
            ProcessingOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Fold a subtree summary into this one
    pub fn merge(&mut self, other: RunSummary) {
        self.renamed += other.renamed;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.outcomes.extend(other.outcomes);
    }

    /// Outcomes that failed
    pub fn failures(&self) -> impl Iterator<Item = &ProcessingOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProcessingOutcome::Failed { .. }))
    }

    pub fn summary(&self) -> String {
        format!(
            "Renamed: {}, Deleted: {}, Skipped: {}, Failed: {}",
            self.renamed, self.deleted, self.skipped, self.failed
        )
    }
}

/// Renames media files in place after their capture time
pub struct Renamer<M = ContainerMetadata> {
    resolver: TimestampResolver<M>,
    zone: NamingZone,
    rename: fn(&Path, &Path) -> io::Result<()>,
}

impl Renamer<ContainerMetadata> {
    /// Create a renamer reading metadata from disk
    pub fn new(config: &Config) -> Self {
        Self::with_metadata(ContainerMetadata, config.naming_zone)
    }
}

impl<M: MetadataService> Renamer<M> {
    /// Create a renamer with a custom metadata source
    pub fn with_metadata(metadata: M, zone: NamingZone) -> Self {
        Self {
            resolver: TimestampResolver::new(metadata),
            zone,
            rename: |from, to| fs::rename(from, to),
        }
    }

    #[cfg(test)]
    fn with_rename_step(mut self, rename: fn(&Path, &Path) -> io::Result<()>) -> Self {
        self.rename = rename;
        self
    }

    /// Process every file below `root`
    pub fn run(&self, root: &Path) -> Result<RunSummary> {
        let _span = span!(Level::INFO, "renamer_run", root = %root.display()).entered();

        if !root.is_dir() {
            return Err(Error::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        info!("Scanning directory tree...");
        let summary = self.walk_dir(root);
        info!(
            renamed = summary.renamed,
            deleted = summary.deleted,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run complete"
        );
        Ok(summary)
    }

    /// Process one directory level and recurse into its subdirectories
    fn walk_dir(&self, dir: &Path) -> RunSummary {
        debug!(?dir, "Entering directory");
        let mut summary = RunSummary::default();

        // Sorting makes walkdir read the whole level before yielding, so
        // names created by renames below are never visited again.
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    let err = Error::from(e);
                    error!(?path, error = %err, "Failed to list entry");
                    summary.record(ProcessingOutcome::failed(&path, &err));
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                summary.merge(self.walk_dir(entry.path()));
            } else {
                summary.record(self.process_file(entry.path()));
            }
        }

        summary
    }

    /// Classify one file and delete, rename or skip it
    pub fn process_file(&self, path: &Path) -> ProcessingOutcome {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = match classify(&name) {
            MediaCategory::DeletableSidecar => self.delete_sidecar(path),
            MediaCategory::Ignored => ProcessingOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::Ignored,
            },
            MediaCategory::Renamable
            | MediaCategory::ExifCapableImage
            | MediaCategory::HeicImage
            | MediaCategory::MovContainer => self
                .rename_media(path, &name)
                .unwrap_or_else(|e| ProcessingOutcome::failed(path, &e)),
        };

        match &outcome {
            ProcessingOutcome::Renamed { from, to, source } => {
                info!(from = %from.display(), to = %to.display(), ?source, "Renamed");
            }
            ProcessingOutcome::Deleted { path } => info!(path = %path.display(), "Deleted"),
            ProcessingOutcome::Skipped { path, reason } => {
                debug!(path = %path.display(), %reason, "Skipped");
            }
            ProcessingOutcome::Failed { path, reason } => {
                warn!(path = %path.display(), %reason, "Failed");
            }
        }

        outcome
    }

    fn delete_sidecar(&self, path: &Path) -> ProcessingOutcome {
        match fs::remove_file(path) {
            Ok(()) => ProcessingOutcome::Deleted {
                path: path.to_path_buf(),
            },
            Err(source) => ProcessingOutcome::failed(
                path,
                &Error::Delete {
                    path: path.to_path_buf(),
                    source,
                },
            ),
        }
    }

    fn rename_media(&self, path: &Path, name: &str) -> Result<ProcessingOutcome> {
        let resolved = self.resolver.resolve(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let target = naming::next_available_name(
            resolved.instant,
            extension_of(name),
            dir,
            self.zone,
            Some(path),
        )?;

        if target == path {
            return Ok(ProcessingOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::AlreadyNamed,
            });
        }

        (self.rename)(path, &target).map_err(|source| Error::Rename {
            from: path.to_path_buf(),
            to: target.clone(),
            source,
        })?;

        Ok(ProcessingOutcome::Renamed {
            from: path.to_path_buf(),
            to: target,
            source: resolved.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::tests::{FakeMetadata, utc, write_with_mtime};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn utc_renamer() -> Renamer {
        Renamer::with_metadata(ContainerMetadata, NamingZone::Utc)
    }

    fn names_in(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_summary_record_and_merge() {
        let mut a = RunSummary::default();
        a.record(ProcessingOutcome::Deleted {
            path: PathBuf::from("a.aae"),
        });
        a.record(ProcessingOutcome::Failed {
            path: PathBuf::from("b.jpg"),
            reason: "boom".into(),
        });

        let mut b = RunSummary::default();
        b.record(ProcessingOutcome::Renamed {
            from: PathBuf::from("c.jpg"),
            to: PathBuf::from("20200101_000000.jpg"),
            source: TimeSource::FileModified,
        });
        b.record(ProcessingOutcome::Skipped {
            path: PathBuf::from("d.txt"),
            reason: SkipReason::Ignored,
        });

        a.merge(b);
        assert_eq!(a.processed(), 1);
        assert_eq!((a.deleted, a.skipped, a.failed), (1, 1, 1));
        assert_eq!(a.outcomes.len(), 4);
        assert_eq!(a.failures().count(), 1);

        let summary = a.summary();
        assert!(summary.contains("Renamed: 1"));
        assert!(summary.contains("Failed: 1"));
    }

    #[test]
    fn test_invalid_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.jpg");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(utc_renamer().run(&file), Err(Error::InvalidRoot { .. })));
        assert!(matches!(
            utc_renamer().run(&dir.path().join("missing")),
            Err(Error::InvalidRoot { .. })
        ));
        // Nothing was touched
        assert!(file.exists());
    }

    #[test]
    fn test_exif_jpeg_renamed_after_capture_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_0001.jpg");
        write_with_mtime(&path, utc(2022, 8, 8, 8, 8, 8));
        let renamer = Renamer::with_metadata(
            FakeMetadata {
                exif: NaiveDate::from_ymd_opt(2021, 5, 4).and_then(|d| d.and_hms_opt(10, 15, 0)),
                ..Default::default()
            },
            NamingZone::Utc,
        );

        let summary = renamer.run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(names_in(dir.path()), BTreeSet::from(["20210504_101500.jpg".to_string()]));
        assert!(matches!(
            summary.outcomes[0],
            ProcessingOutcome::Renamed {
                source: TimeSource::Embedded,
                ..
            }
        ));
    }

    #[test]
    fn test_mov_without_creation_tag_uses_file_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        write_with_mtime(&path, utc(2020, 1, 1, 0, 0, 0));

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(names_in(dir.path()), BTreeSet::from(["20200101_000000.mov".to_string()]));
    }

    #[test]
    fn test_colliding_names_get_increasing_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            write_with_mtime(&dir.path().join(name), utc(2019, 7, 7, 7, 7, 7));
        }

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 3);

        // Entries are visited in name order
        let renamed: Vec<_> = summary
            .outcomes
            .iter()
            .map(|o| match o {
                ProcessingOutcome::Renamed { from, to, .. } => (
                    from.file_name().unwrap().to_string_lossy().into_owned(),
                    to.file_name().unwrap().to_string_lossy().into_owned(),
                ),
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        assert_eq!(
            renamed,
            [
                ("a.mp4".to_string(), "20190707_070707.mp4".to_string()),
                ("b.mp4".to_string(), "20190707_070707_1.mp4".to_string()),
                ("c.mp4".to_string(), "20190707_070707_2.mp4".to_string()),
            ]
        );
    }

    #[test]
    fn test_sidecar_deleted_but_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(&dir.path().join("IMG_0001.png"), utc(2021, 1, 2, 3, 4, 5));
        fs::write(dir.path().join("IMG_0001.AAE"), b"<plist/>").unwrap();

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(names_in(dir.path()), BTreeSet::from(["20210102_030405.png".to_string()]));
    }

    #[test]
    fn test_nested_directories_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2020").join("trip");
        fs::create_dir_all(&nested).unwrap();
        write_with_mtime(&dir.path().join("top.m4v"), utc(2020, 2, 2, 2, 2, 2));
        write_with_mtime(&nested.join("deep.hevc"), utc(2020, 3, 3, 3, 3, 3));

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 2);
        assert_eq!(names_in(&nested), BTreeSet::from(["20200303_030303.hevc".to_string()]));
        assert!(dir.path().join("2020").is_dir());
    }

    #[test]
    fn test_corrupt_jpeg_still_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"\xFF\xD8\xFF\xE1\x00\x10Exif\x00\x00garbage").unwrap();
        filetime::set_file_mtime(
            &path,
            filetime::FileTime::from_unix_time(utc(2016, 6, 6, 6, 6, 6).timestamp(), 0),
        )
        .unwrap();

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(names_in(dir.path()), BTreeSet::from(["20160606_060606.jpg".to_string()]));
    }

    #[test]
    fn test_ignored_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("README"), b"x").unwrap();

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(
            names_in(dir.path()),
            BTreeSet::from(["README".to_string(), "notes.txt".to_string()])
        );
    }

    #[test]
    fn test_rerun_leaves_named_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "b.mp4"] {
            write_with_mtime(&dir.path().join(name), utc(2019, 7, 7, 7, 7, 7));
        }
        utc_renamer().run(dir.path()).unwrap();
        let before = names_in(dir.path());

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(names_in(dir.path()), before);
    }

    #[test]
    fn test_vanished_file_fails_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let renamer = utc_renamer();

        let outcome = renamer.process_file(&dir.path().join("gone.jpg"));
        assert!(matches!(outcome, ProcessingOutcome::Failed { .. }));

        let outcome = renamer.process_file(&dir.path().join("gone.aae"));
        assert!(matches!(outcome, ProcessingOutcome::Failed { .. }));
    }

    #[test]
    fn test_process_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_0002.heic");
        write_with_mtime(&path, utc(2023, 3, 3, 3, 3, 3));
        let renamer = Renamer::with_metadata(
            FakeMetadata {
                container: Some(utc(2022, 12, 31, 23, 59, 59)),
                ..Default::default()
            },
            NamingZone::Utc,
        );

        let outcome = renamer.process_file(&path);
        assert_eq!(
            outcome,
            ProcessingOutcome::Renamed {
                from: path.clone(),
                to: dir.path().join("20221231_235959.heic"),
                source: TimeSource::Embedded,
            }
        );
        assert_eq!(outcome.path(), path.as_path());
    }

    #[test]
    fn test_rename_failure_is_recorded_and_walk_continues() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(&dir.path().join("a_locked.jpg"), utc(2018, 1, 1, 1, 1, 1));
        write_with_mtime(&dir.path().join("b.jpg"), utc(2018, 2, 2, 2, 2, 2));

        let renamer = utc_renamer().with_rename_step(|from, to| {
            if from.to_string_lossy().contains("locked") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "file in use"))
            } else {
                fs::rename(from, to)
            }
        });

        let summary = renamer.run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.failed, 1);

        let failure = summary.failures().next().unwrap();
        assert!(failure.path().ends_with("a_locked.jpg"));
        match failure {
            ProcessingOutcome::Failed { reason, .. } => assert!(reason.contains("file in use")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            names_in(dir.path()),
            BTreeSet::from(["20180202_020202.jpg".to_string(), "a_locked.jpg".to_string()])
        );
    }

    #[test]
    fn test_unlistable_directory_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("removed");

        let summary = utc_renamer().walk_dir(&missing);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].path(), missing.as_path());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_fails_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(&dir.path().join("ok.mp4"), utc(2015, 5, 5, 5, 5, 5));
        std::os::unix::fs::symlink(dir.path().join("nowhere.jpg"), dir.path().join("link.jpg"))
            .unwrap();

        let summary = utc_renamer().run(dir.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.failures().all(|o| o.path().ends_with("link.jpg")));
        assert!(dir.path().join("20150505_050505.mp4").exists());
    }
}

//! Meta Renamer - rename photos and videos after their capture time
//!
//! Walks a directory tree, resolves the capture time of every media file from
//! EXIF, QuickTime and file system timestamps, and renames it in place.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use meta_renamer::{Cli, Config, ProcessingOutcome, Renamer, RunSummary};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colored, line-oriented console output

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let padding = 60usize.saturating_sub(title.len()) / 2;
        let _ = stdout().execute(Print(" ".repeat(padding)));
        let _ = stdout().execute(Print(style(title).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{msg}\n")));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{msg}\n")));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(status_icon).with(status_color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{path}\n")));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(config) = cli.to_config() else {
        println!("{}", Cli::usage());
        return Ok(());
    };

    if config.validate().is_err() {
        println!("The provided path is not a directory: {}", config.root_dir.display());
        println!("{}", Cli::usage());
        return Ok(());
    }

    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir);
    let _guard = setup_logging(&config, &log_path);

    info!(version = env!("CARGO_PKG_VERSION"), "Meta Renamer starting");
    tracing::debug!(?config, "Configuration loaded");

    let renamer = Renamer::new(&config);
    match renamer.run(&config.root_dir) {
        Ok(summary) => {
            print_summary(&summary, &config, &log_path);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Processing failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_summary(summary: &RunSummary, config: &Config, log_path: &Path) {
    use cli_output::*;

    print_separator();
    print_title("Processing complete");
    print_separator();

    print_blank();
    print_stat("Renamed", &summary.renamed.to_string(), CliTheme::SUCCESS);
    print_stat("Deleted", &summary.deleted.to_string(), CliTheme::ACCENT);
    print_stat("Skipped", &summary.skipped.to_string(), CliTheme::WARNING);
    print_stat("Failed", &summary.failed.to_string(), CliTheme::ERROR);
    print_blank();

    if config.verbose {
        print_separator();
        print_hint("Detailed results");
        print_blank();

        for outcome in &summary.outcomes {
            let source = outcome.path().display().to_string();
            match outcome {
                ProcessingOutcome::Renamed { to, .. } => {
                    print_result("✓", CliTheme::SUCCESS, &source, &format!("→ {}", to.display()));
                }
                ProcessingOutcome::Deleted { .. } => {
                    print_result("−", CliTheme::ACCENT, &source, "deleted");
                }
                ProcessingOutcome::Skipped { reason, .. } => {
                    print_result("⊘", CliTheme::WARNING, &source, &reason.to_string());
                }
                ProcessingOutcome::Failed { reason, .. } => {
                    print_result("✗", CliTheme::ERROR, &source, reason);
                }
            }
        }
    }

    if summary.failed > 0 {
        print_separator();
        print_error(&format!("{} files failed", summary.failed));
        print_blank();
        for outcome in summary.failures() {
            if let ProcessingOutcome::Failed { path, reason } = outcome {
                print_result("✗", CliTheme::ERROR, &path.display().to_string(), reason);
            }
        }
    }

    print_separator();
    if log_path.exists() {
        print_log_path(&log_path.display().to_string());
    }
    print_hint(&format!("processed {} files.", summary.processed()));
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Log file path for this run
fn get_log_path(exe_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    exe_dir.join("Log").join(format!("Rename_{timestamp}.log"))
}

/// Setup logging (file + console)
///
/// Console output always works; the log file is skipped when it cannot be
/// created.
fn setup_logging(config: &Config, log_path: &Path) -> Option<WorkerGuard> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let file = log_path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| {
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)
        });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            if config.json_log {
                subscriber
                    .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
                    .init();
            } else {
                subscriber
                    .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                    .init();
            }
            info!(log_file = %log_path.display(), "Log file location");
            Some(guard)
        }
        Err(e) => {
            subscriber.init();
            warn!(log_file = %log_path.display(), error = %e, "Log file unavailable, logging to console only");
            None
        }
    }
}

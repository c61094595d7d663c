//! Extension-based classification of directory entries
//!
//! Every file name maps to exactly one [`MediaCategory`]. The mapping only
//! looks at the text after the last `.`, compared case-insensitively, so it
//! can be used without touching the filesystem.

/// What the renamer does with a file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    /// Renamed using filesystem timestamps only
    Renamable,
    /// JPEG/PNG carrying EXIF DateTimeOriginal
    ExifCapableImage,
    /// HEIF image with EXIF inside the container
    HeicImage,
    /// QuickTime movie with an embedded creation date
    MovContainer,
    /// Sidecar removed during the run
    DeletableSidecar,
    /// Left untouched
    Ignored,
}

/// Lowercase extension (without dot) to category
const EXTENSION_TABLE: &[(&str, MediaCategory)] = &[
    ("jpg", MediaCategory::ExifCapableImage),
    ("png", MediaCategory::ExifCapableImage),
    ("heic", MediaCategory::HeicImage),
    ("mov", MediaCategory::MovContainer),
    ("mp4", MediaCategory::Renamable),
    ("m4v", MediaCategory::Renamable),
    ("hevc", MediaCategory::Renamable),
    ("aae", MediaCategory::DeletableSidecar),
];

/// Extension of `name` including its leading dot, in original case
///
/// Returns an empty string when the name has no dot.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// Classify a file name by its extension
pub fn classify(name: &str) -> MediaCategory {
    let ext = extension_of(name).trim_start_matches('.');
    if ext.is_empty() {
        return MediaCategory::Ignored;
    }

    EXTENSION_TABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, category)| *category)
        .unwrap_or(MediaCategory::Ignored)
}

//! EXIF DateTimeOriginal extraction for JPEG, PNG and HEIF images

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Read the raw DateTimeOriginal value of an image
///
/// `Ok(None)` means the container has no EXIF block, or the block has no
/// DateTimeOriginal. A container that cannot be parsed is an error.
pub fn read_date_time_original(path: &Path) -> Result<Option<String>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(Error::ExifRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        trace!(?path, "No DateTimeOriginal tag");
        return Ok(None);
    };

    // display_value() quotes ASCII values, so read the bytes directly
    let raw = match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => Some(field.display_value().to_string()),
    };
    trace!(?path, ?raw, "Found DateTimeOriginal");
    Ok(raw)
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    // Some cameras append subseconds
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%.f").ok()
}

//! QuickTime creation date
//!
//! The capture date written by Apple devices lives in `moov/meta` as the
//! `com.apple.quicktime.creationdate` key: ISO-8601 text with a UTC offset.
//! When that key is missing the `moov/mvhd` creation time is used instead.
//! It counts seconds since 1904-01-01 UTC; version 1 headers store it as a
//! 64-bit value.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Seconds between 1904-01-01 and 1970-01-01
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

const CREATION_DATE_KEY: &str = "com.apple.quicktime.creationdate";

/// Longest creationdate value read from an `ilst` item
const MAX_VALUE_LEN: u64 = 256;

#[derive(Debug, Clone, Copy)]
struct AtomRange {
    data_start: u64,
    data_end: u64,
}

/// Read the movie creation time of a QuickTime/ISO-BMFF file
pub fn read_creation_time(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    creation_time_from(&mut reader, len).map_err(|e| Error::ContainerRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Walk top-level atoms to `moov`, then prefer the Apple creation date
fn creation_time_from<R: Read + Seek>(
    reader: &mut R,
    len: u64,
) -> std::io::Result<Option<DateTime<Utc>>> {
    let Some(moov) = find_atom(reader, 0, len, *b"moov")? else {
        trace!("No moov atom");
        return Ok(None);
    };

    if let Some(time) = apple_creation_date(reader, moov)? {
        return Ok(Some(time));
    }
    movie_header_time(reader, moov)
}

/// `com.apple.quicktime.creationdate` from `moov/meta/keys` + `ilst`
fn apple_creation_date<R: Read + Seek>(
    reader: &mut R,
    moov: AtomRange,
) -> std::io::Result<Option<DateTime<Utc>>> {
    let Some(meta) = find_atom(reader, moov.data_start, moov.data_end, *b"meta")? else {
        return Ok(None);
    };
    let children_start = meta_children_start(reader, meta)?;

    let Some(keys) = find_atom(reader, children_start, meta.data_end, *b"keys")? else {
        return Ok(None);
    };
    let Some(index) = find_key_index(reader, keys, CREATION_DATE_KEY)? else {
        trace!("No creationdate key");
        return Ok(None);
    };

    let Some(ilst) = find_atom(reader, children_start, meta.data_end, *b"ilst")? else {
        return Ok(None);
    };
    // ilst items are typed by their 1-based key index
    let Some(item) = find_atom(reader, ilst.data_start, ilst.data_end, index.to_be_bytes())? else {
        return Ok(None);
    };
    let Some(data) = find_atom(reader, item.data_start, item.data_end, *b"data")? else {
        return Ok(None);
    };

    // Skip type indicator and locale
    let value_start = data.data_start + 8;
    if value_start >= data.data_end {
        return Ok(None);
    }
    let value = read_bytes(reader, value_start, (data.data_end - value_start).min(MAX_VALUE_LEN))?;
    let text = String::from_utf8_lossy(&value);
    let parsed = parse_creation_date(&text);
    if parsed.is_none() {
        trace!(value = %text, "Unparseable creationdate");
    }
    Ok(parsed)
}

/// Offset of the first child of a `meta` atom
///
/// QuickTime files store children directly; ISO files prefix them with a
/// version/flags word.
fn meta_children_start<R: Read + Seek>(reader: &mut R, meta: AtomRange) -> std::io::Result<u64> {
    if meta.data_start + 8 > meta.data_end {
        return Ok(meta.data_start);
    }
    let head = read_bytes(reader, meta.data_start, 8)?;
    if &head[4..8] == b"hdlr" || &head[4..8] == b"keys" {
        Ok(meta.data_start)
    } else {
        Ok(meta.data_start + 4)
    }
}

/// 1-based index of `wanted` in a `keys` atom
fn find_key_index<R: Read + Seek>(
    reader: &mut R,
    keys: AtomRange,
    wanted: &str,
) -> std::io::Result<Option<u32>> {
    reader.seek(SeekFrom::Start(keys.data_start))?;
    let mut head = [0u8; 8];
    reader.read_exact(&mut head)?;
    let count = u32::from_be_bytes([head[4], head[5], head[6], head[7]]);

    let mut offset = keys.data_start + 8;
    for index in 1..=count {
        if offset + 8 > keys.data_end {
            break;
        }
        let entry = read_bytes(reader, offset, 8)?;
        let size = u64::from(u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]));
        if size < 8 || offset + size > keys.data_end {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("bad key entry size {size}"),
            ));
        }
        let name = read_bytes(reader, offset + 8, size - 8)?;
        if name == wanted.as_bytes() {
            return Ok(Some(index));
        }
        offset += size;
    }
    Ok(None)
}

/// Parse ISO-8601 text such as `2020-01-01T09:00:00+0900`
fn parse_creation_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim_end_matches('\0').trim();
    ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%.f%z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Creation time from `moov/mvhd`
fn movie_header_time<R: Read + Seek>(
    reader: &mut R,
    moov: AtomRange,
) -> std::io::Result<Option<DateTime<Utc>>> {
    let Some(mvhd) = find_atom(reader, moov.data_start, moov.data_end, *b"mvhd")? else {
        trace!("No mvhd atom");
        return Ok(None);
    };

    reader.seek(SeekFrom::Start(mvhd.data_start))?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;

    let qt_seconds = if version_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        u64::from(u32::from_be_bytes(buf))
    };

    // Zero means the writer never set it
    if qt_seconds == 0 {
        return Ok(None);
    }

    let unix = i64::try_from(qt_seconds)
        .ok()
        .and_then(|s| s.checked_sub(QT_TO_UNIX_OFFSET));
    Ok(unix.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)))
}

fn read_bytes<R: Read + Seek>(reader: &mut R, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn find_atom<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    kind: [u8; 4],
) -> std::io::Result<Option<AtomRange>> {
    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;

        let mut size = u64::from(u32::from_be_bytes([header[0], header[1], header[2], header[3]]));
        let atom_kind = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8u64;

        if size == 1 {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext)?;
            size = u64::from_be_bytes(ext);
            header_size = 16;
        } else if size == 0 {
            // Atom extends to the end of its parent
            size = end - offset;
        }

        if size < header_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("atom size {size} smaller than its header"),
            ));
        }

        let atom_end = offset.saturating_add(size).min(end);
        if atom_kind == kind {
            return Ok(Some(AtomRange {
                data_start: offset + header_size,
                data_end: atom_end,
            }));
        }
        offset = atom_end;
    }
    Ok(None)
}

//! Archive page extraction.
//!
//! Opens a downloaded chapter archive, enumerates its entries, and returns
//! the image pages. Extraction is synchronous and memory-bound; callers on
//! an async runtime run it on a blocking thread.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::io::{Cursor, Read};

/// Entry name extensions accepted as page images.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// A single image entry extracted from a chapter archive.
#[derive(Clone, Debug)]
pub struct ArchivePage {
    /// Entry file name, directory components stripped.
    pub file_name: String,
    /// Decompressed image bytes.
    pub bytes: Bytes,
    /// Content type derived from the file extension.
    pub content_type: &'static str,
}

/// Extract all image pages from a zip archive held in memory.
///
/// Selects non-directory entries whose extension is in [`IMAGE_EXTENSIONS`]
/// (case-insensitive). Returns [`Error::NoImageEntries`] when nothing
/// matches, so the caller aborts with nothing written and nothing to roll
/// back. Entries larger than `max_entry_bytes` once decompressed fail the
/// whole extraction; a truncated chapter must not be cached.
pub fn extract_pages(archive: &[u8], max_entry_bytes: u64) -> Result<Vec<ArchivePage>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| Error::Archive(format!("failed to open archive: {e}")))?;

    let mut pages = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| Error::Archive(format!("failed to read entry {index}: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let Some(content_type) = image_content_type(entry.name()) else {
            continue;
        };
        let file_name = base_name(entry.name());

        if entry.size() > max_entry_bytes {
            return Err(Error::EntryTooLarge {
                entry: file_name,
                size: entry.size(),
                max: max_entry_bytes,
            });
        }

        // take() guards against entries whose header lies about their size.
        let mut data = Vec::with_capacity(entry.size() as usize);
        let read = (&mut entry)
            .take(max_entry_bytes + 1)
            .read_to_end(&mut data)
            .map_err(|e| Error::Archive(format!("failed to decompress {file_name}: {e}")))?;
        if read as u64 > max_entry_bytes {
            return Err(Error::EntryTooLarge {
                entry: file_name,
                size: read as u64,
                max: max_entry_bytes,
            });
        }

        pages.push(ArchivePage {
            file_name,
            bytes: Bytes::from(data),
            content_type,
        });
    }

    if pages.is_empty() {
        return Err(Error::NoImageEntries);
    }
    Ok(pages)
}

/// Content type for an image entry name, `None` when not an image.
pub fn image_content_type(entry_name: &str) -> Option<&'static str> {
    let ext = entry_name.rsplit('.').next()?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Strip directory components; archives often nest pages one level deep.
fn base_name(entry_name: &str) -> String {
    entry_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(entry_name)
        .to_string()
}

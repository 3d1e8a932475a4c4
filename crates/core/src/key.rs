//! Cache key layout.
//!
//! The cache prefix for a (series slug, chapter number) pair is the unit of
//! ownership: every page object and the manifest for a chapter live under
//! `"<slug>/<chapter>/"`. Writers treat manifest presence as the only
//! authoritative completion state.

use crate::chapter::ChapterNumber;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// File name of the per-chapter manifest object.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Characters escaped when a cache key is embedded in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Cache prefix owning every object of one chapter, trailing slash included.
pub fn chapter_prefix(slug: &str, number: ChapterNumber) -> String {
    format!("{slug}/{number}/")
}

/// Key of a single cached page object.
pub fn page_key(slug: &str, number: ChapterNumber, file_name: &str) -> String {
    format!("{slug}/{number}/{file_name}")
}

/// Key of the chapter manifest, the terminal write of materialization.
pub fn manifest_key(slug: &str, number: ChapterNumber) -> String {
    format!("{slug}/{number}/{MANIFEST_FILE_NAME}")
}

/// Public URL for a cached object, escaping each key segment.
pub fn object_url(public_base: &str, key: &str) -> String {
    let escaped: Vec<String> = key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect();
    format!("{}/{}", public_base.trim_end_matches('/'), escaped.join("/"))
}

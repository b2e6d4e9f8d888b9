//! Bookmark data decoding
//!
//! LaunchServices records applications as serialized bookmarks. A bookmark is a
//! `book` container: a header, then a data section holding typed items and one
//! or more tables of contents that map keys to item offsets. The path of the
//! bookmarked file is stored as an array of path component strings.
//!
//! All offsets inside the container are relative to the start of the data
//! section, and all integers are little-endian.

use crate::registry::LocationResolver;
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"book";
const HEADER_FIELDS_LEN: usize = 16;
const TOC_MAGIC: u32 = 0xffff_fffe;
const TOC_HEADER_LEN: usize = 20;
const TOC_ENTRY_LEN: usize = 12;
const MAX_TOCS: usize = 32;

const TYPE_STRING: u32 = 0x0101;
const TYPE_ARRAY: u32 = 0x0601;

/// Table of contents key holding the path components
pub const KEY_PATH_COMPONENTS: u32 = 0x1004;

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn offset_at(data: &[u8], offset: usize) -> Option<usize> {
    read_u32(data, offset).and_then(|value| usize::try_from(value).ok())
}

/// A parsed bookmark container
#[derive(Debug, Clone, Copy)]
pub struct Bookmark<'a> {
    data: &'a [u8],
}

impl<'a> Bookmark<'a> {
    /// Validate the container header. Returns `None` for anything that is not a bookmark.
    pub fn parse(blob: &'a [u8]) -> Option<Self> {
        if blob.len() < HEADER_FIELDS_LEN || &blob[..4] != MAGIC {
            return None;
        }
        let header_len = offset_at(blob, 12)?;
        if header_len < HEADER_FIELDS_LEN {
            return None;
        }
        let data = blob.get(header_len..)?;
        Some(Self { data })
    }

    /// Offset of the item stored under `key`, searching every table of contents
    pub fn lookup(&self, key: u32) -> Option<usize> {
        let mut toc = offset_at(self.data, 0)?;
        for _ in 0..MAX_TOCS {
            if toc == 0 {
                return None;
            }
            if read_u32(self.data, toc.checked_add(4)?)? != TOC_MAGIC {
                return None;
            }
            let next = offset_at(self.data, toc + 12)?;
            let count = offset_at(self.data, toc + 16)?;

            for index in 0..count {
                let entry = toc
                    .checked_add(TOC_HEADER_LEN)?
                    .checked_add(index.checked_mul(TOC_ENTRY_LEN)?)?;
                if read_u32(self.data, entry)? == key {
                    return offset_at(self.data, entry + 4);
                }
            }
            toc = next;
        }
        None
    }

    fn item(&self, offset: usize) -> Option<(u32, &'a [u8])> {
        let len = offset_at(self.data, offset)?;
        let kind = read_u32(self.data, offset.checked_add(4)?)?;
        let start = offset.checked_add(8)?;
        let payload = self.data.get(start..start.checked_add(len)?)?;
        Some((kind, payload))
    }

    fn string(&self, offset: usize) -> Option<&'a str> {
        match self.item(offset)? {
            (TYPE_STRING, payload) => std::str::from_utf8(payload).ok(),
            _ => None,
        }
    }

    /// Path components of the bookmarked file, outermost first
    pub fn path_components(&self) -> Option<Vec<&'a str>> {
        let (kind, payload) = self.item(self.lookup(KEY_PATH_COMPONENTS)?)?;
        if kind != TYPE_ARRAY || payload.len() % 4 != 0 {
            return None;
        }
        payload
            .chunks_exact(4)
            .map(|chunk| {
                let offset = u32::from_le_bytes(chunk.try_into().ok()?);
                self.string(usize::try_from(offset).ok()?)
            })
            .collect()
    }

    /// Absolute path of the bookmarked file
    pub fn path(&self) -> Option<PathBuf> {
        let components = self.path_components()?;
        if components.is_empty() {
            return None;
        }
        Some(PathBuf::from(format!("/{}", components.join("/"))))
    }
}

/// Resolves bookmarks by decoding their recorded path.
///
/// A bookmark whose file no longer exists is stale and resolves to `None`.
#[derive(Debug, Clone, Copy)]
pub struct BookmarkResolver<F = fn(&Path) -> bool> {
    exists: F,
}

impl BookmarkResolver {
    /// Resolver that checks decoded paths against the filesystem
    pub fn new() -> Self {
        Self {
            exists: Path::exists,
        }
    }
}

impl Default for BookmarkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fn(&Path) -> bool> BookmarkResolver<F> {
    /// Resolver with a custom existence check
    pub fn with_existence_check(exists: F) -> Self {
        Self { exists }
    }
}

impl<F: Fn(&Path) -> bool> LocationResolver for BookmarkResolver<F> {
    fn resolve(&self, blob: &[u8]) -> Option<PathBuf> {
        let path = Bookmark::parse(blob)?.path()?;
        if (self.exists)(&path) {
            Some(path)
        } else {
            tracing::trace!(path = %path.display(), "Bookmark target no longer exists");
            None
        }
    }
}

//! File table access and exact-match lookup
//!
//! The table is a sorted array of [`RawEntry`] records directly after the
//! header. Sort order is assumed, not checked: an unsorted image gives
//! undefined lookup results. [`FileTable::verify`] can check it offline.

use crate::core::error::{FlashFsError, Result};
use crate::core::format::{RawEntry, ENTRY_SIZE};
use std::cmp::Ordering;
use std::ffi::CStr;
use std::ops::Range;

/// Read-only view over a located image
#[derive(Debug, Clone, Copy)]
pub struct FileTable<'a> {
    /// Image bytes, starting at the signature
    image: &'a [u8],
    count: usize,
}

impl<'a> FileTable<'a> {
    /// Wrap `image` (starting at the signature) holding `count` entries
    ///
    /// The caller guarantees the entry array itself lies inside `image`;
    /// the locator checks this before mounting.
    pub fn new(image: &'a [u8], count: usize) -> Self {
        FileTable { image, count }
    }

    pub fn image(&self) -> &'a [u8] {
        self.image
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn entry(&self, index: usize) -> Result<RawEntry> {
        if index >= self.count {
            return Err(FlashFsError::CorruptImage(format!(
                "entry index {} out of range (count {})",
                index, self.count
            )));
        }
        let offset = RawEntry::offset_of(index);
        self.image
            .get(offset..offset + ENTRY_SIZE)
            .and_then(RawEntry::parse)
            .ok_or_else(|| {
                FlashFsError::CorruptImage(format!("entry {} lies outside the image", index))
            })
    }

    /// Stored filename of entry `index`, without its NUL terminator
    pub fn name_bytes(&self, index: usize) -> Result<&'a [u8]> {
        let entry = self.entry(index)?;
        let tail = self
            .image
            .get(entry.filename_offset as usize..)
            .ok_or_else(|| {
                FlashFsError::CorruptImage(format!(
                    "filename offset {:#x} of entry {} lies outside the image",
                    entry.filename_offset, index
                ))
            })?;
        let name = CStr::from_bytes_until_nul(tail).map_err(|_| {
            FlashFsError::CorruptImage(format!("filename of entry {} is not terminated", index))
        })?;
        Ok(name.to_bytes())
    }

    pub fn name(&self, index: usize) -> Result<&'a str> {
        let bytes = self.name_bytes(index)?;
        std::str::from_utf8(bytes).map_err(|_| {
            FlashFsError::CorruptImage(format!("filename of entry {} is not valid UTF-8", index))
        })
    }

    /// Byte range of the body of entry `index`, relative to the image base
    pub fn body_range(&self, index: usize) -> Result<Range<usize>> {
        let entry = self.entry(index)?;
        let start = entry.body_offset as usize;
        match start.checked_add(entry.body_size as usize) {
            Some(end) if end <= self.image.len() => Ok(start..end),
            _ => Err(FlashFsError::CorruptImage(format!(
                "body of entry {} ({:#x} + {:#x} bytes) lies outside the image",
                index, start, entry.body_size
            ))),
        }
    }

    pub fn body(&self, index: usize) -> Result<&'a [u8]> {
        let range = self.body_range(index)?;
        Ok(&self.image[range])
    }

    /// Binary search for the entry whose filename equals `path` byte-for-byte
    ///
    /// `path` must already have its leading slash removed.
    pub fn find(&self, path: &str) -> Result<Option<usize>> {
        let key = path.as_bytes();
        let mut low = 0;
        let mut high = self.count;

        while low < high {
            let mid = low + (high - low) / 2;
            match key.cmp(self.name_bytes(mid)?) {
                Ordering::Equal => return Ok(Some(mid)),
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
            }
        }

        Ok(None)
    }

    /// Index of the first entry belonging to directory `dir`
    ///
    /// `dir` has no leading slash; `prefix_len` is its length including the
    /// implicit trailing slash (0 for the root). An entry belongs when it
    /// starts with `dir` and has a '/' at `prefix_len - 1`.
    pub fn first_in_directory(&self, dir: &str, prefix_len: usize) -> Result<Option<usize>> {
        for index in 0..self.count {
            if prefix_len == 0 {
                return Ok(Some(index));
            }
            let name = self.name_bytes(index)?;
            if name.starts_with(dir.as_bytes()) && name.get(prefix_len - 1) == Some(&b'/') {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Iterate over `(filename, body)` for every entry in table order
    pub fn iter(&self) -> impl Iterator<Item = Result<(&'a str, &'a [u8])>> + '_ {
        (0..self.count).map(move |index| Ok((self.name(index)?, self.body(index)?)))
    }

    /// Check every entry is addressable and the table is strictly ascending
    ///
    /// Mounting never calls this; it is meant for offline image checks.
    pub fn verify(&self) -> Result<()> {
        let mut previous: Option<&[u8]> = None;
        for index in 0..self.count {
            let name = self.name(index)?.as_bytes();
            self.body_range(index)?;

            if name.is_empty() {
                return Err(FlashFsError::CorruptImage(format!(
                    "entry {} has an empty filename",
                    index
                )));
            }
            if let Some(previous) = previous {
                if previous >= name {
                    return Err(FlashFsError::CorruptImage(format!(
                        "entry {} ({}) is out of order",
                        index,
                        String::from_utf8_lossy(name)
                    )));
                }
            }
            previous = Some(name);
        }
        Ok(())
    }
}

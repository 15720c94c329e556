//! Directory enumeration over the flat, sorted file table
//!
//! There are no directory records in the image. A directory `d` is the run of
//! consecutive entries whose names start with `d/`; because the table is
//! sorted, that run is contiguous. Enumeration walks the run once, yielding one
//! name per immediate child. A child that is itself a directory is reported as
//! `name/` and its whole subtree is skipped in a single step.

use crate::core::error::{FlashFsError, Result};
use crate::core::table::FileTable;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a directory
///
/// `name` borrows from the image. Directory names keep their trailing '/'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirEntry<'a> {
    pub name: &'a str,
    pub kind: EntryKind,
}

impl DirEntry<'_> {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl fmt::Display for DirEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Opaque enumeration position returned by [`DirCursor::tell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirPosition {
    anchor: usize,
    index: Option<usize>,
}

/// Strip a leading '/' and compute the prefix length including the implicit
/// trailing slash (0 for the root)
pub fn normalize_dir(path: &str) -> (&str, usize) {
    let dir = path.strip_prefix('/').unwrap_or(path);
    let prefix_len = if dir.is_empty() || dir.ends_with('/') {
        dir.len()
    } else {
        dir.len() + 1
    };
    (dir, prefix_len)
}

/// Enumeration state for one open directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirCursor {
    /// First entry of the directory's subtree; rewinding returns here
    anchor: usize,
    /// Next entry to emit, `None` once the directory is exhausted
    current: Option<usize>,
    /// Entries from `anchor` to the end of the table
    remaining: usize,
    /// Length of the directory path including its trailing '/'
    prefix_len: usize,
}

impl DirCursor {
    /// Find the first entry under `path`; `None` if the directory is absent
    pub fn open(table: &FileTable<'_>, path: &str) -> Result<Option<Self>> {
        let (dir, prefix_len) = normalize_dir(path);
        let anchor = match table.first_in_directory(dir, prefix_len)? {
            Some(anchor) => anchor,
            None => return Ok(None),
        };

        Ok(Some(DirCursor {
            anchor,
            current: Some(anchor),
            remaining: table.len() - anchor,
            prefix_len,
        }))
    }

    /// Yield the next immediate child, or `None` at the end of the directory
    pub fn next<'a>(&mut self, table: &FileTable<'a>) -> Result<Option<DirEntry<'a>>> {
        let index = match self.current {
            Some(index) => index,
            None => return Ok(None),
        };
        let end = self.anchor + self.remaining;

        let full = table.name_bytes(index)?;
        let (dir_prefix, rest) = split_checked(full, self.prefix_len)?;

        let (child, kind) = match rest.iter().position(|&b| b == b'/') {
            Some(slash) => (&rest[..=slash], EntryKind::Directory),
            None => (rest, EntryKind::File),
        };

        // A file child covers exactly one entry. A directory child covers every
        // following entry that starts with "<dir>/<child>/".
        let mut next = index + 1;
        if kind == EntryKind::Directory {
            let subtree = &full[..self.prefix_len + child.len()];
            while next < end && table.name_bytes(next)?.starts_with(subtree) {
                next += 1;
            }
        }

        self.current = if next < end && table.name_bytes(next)?.starts_with(dir_prefix) {
            Some(next)
        } else {
            None
        };

        let name = std::str::from_utf8(child).map_err(|_| {
            FlashFsError::CorruptImage(format!("filename of entry {} is not valid UTF-8", index))
        })?;
        Ok(Some(DirEntry { name, kind }))
    }

    /// Restart enumeration from the anchor without rescanning the table
    pub fn rewind(&mut self) {
        self.current = Some(self.anchor);
    }

    pub fn tell(&self) -> DirPosition {
        DirPosition {
            anchor: self.anchor,
            index: self.current,
        }
    }

    /// Restore a position previously produced by [`tell`](Self::tell)
    ///
    /// Rejects positions from another directory, or pointing outside this
    /// directory's run of entries.
    pub fn seek(&mut self, table: &FileTable<'_>, position: DirPosition) -> Result<()> {
        if position.anchor != self.anchor {
            return Err(FlashFsError::InvalidDirPosition);
        }

        if let Some(index) = position.index {
            if index < self.anchor || index >= self.anchor + self.remaining {
                return Err(FlashFsError::InvalidDirPosition);
            }
            let anchor_name = table.name_bytes(self.anchor)?;
            let (dir_prefix, _) = split_checked(anchor_name, self.prefix_len)?;
            if !table.name_bytes(index)?.starts_with(dir_prefix) {
                return Err(FlashFsError::InvalidDirPosition);
            }
        }

        self.current = position.index;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }
}

fn split_checked(name: &[u8], prefix_len: usize) -> Result<(&[u8], &[u8])> {
    if name.len() < prefix_len {
        return Err(FlashFsError::CorruptImage(format!(
            "entry {} is shorter than its directory prefix",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(name.split_at(prefix_len))
}

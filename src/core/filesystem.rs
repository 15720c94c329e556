//! Mounted file system: locator output, file table, and handle pools

use crate::core::config::FlashFsConfig;
use crate::core::dir::{normalize_dir, DirCursor, DirEntry, DirPosition};
use crate::core::error::{FlashFsError, Result};
use crate::core::file::{FileCursor, SeekOrigin};
use crate::core::locator::locate;
use crate::core::pool::HandlePool;
use crate::core::table::FileTable;
use tracing::{debug, info};

/// Open file, identified by its slot in the file handle pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(usize);

impl FileHandle {
    pub fn slot(&self) -> usize {
        self.0
    }
}

/// Open directory, identified by its slot in the directory handle pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirHandle(usize);

impl DirHandle {
    pub fn slot(&self) -> usize {
        self.0
    }
}

/// Size and location of a stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo<'a> {
    /// Stored path (no leading slash)
    pub path: &'a str,
    pub size: u64,
    /// Offset of the body from the image base
    pub offset: usize,
}

/// Read-only file system over an image found inside a flash region
///
/// Mount failure is not an error: an unmounted file system reports
/// [`FlashFsError::NotMounted`] from every open.
pub struct FlashFileSystem<'a> {
    table: Option<FileTable<'a>>,
    base: Option<usize>,
    files: HandlePool<FileCursor<'a>>,
    dirs: HandlePool<DirCursor>,
    config: FlashFsConfig,
}

impl<'a> FlashFileSystem<'a> {
    /// Mount with the reference configuration
    pub fn mount(region: &'a [u8]) -> Self {
        Self::mount_unchecked(region, FlashFsConfig::default())
    }

    /// Mount with a custom configuration, validating it first
    pub fn mount_with(region: &'a [u8], config: FlashFsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::mount_unchecked(region, config))
    }

    fn mount_unchecked(region: &'a [u8], config: FlashFsConfig) -> Self {
        let located = locate(region, &config);
        if let Some(located) = located {
            info!(
                "Mounted flash file system at offset {:#x} with {} files",
                located.base, located.header.file_count
            );
        }

        FlashFileSystem {
            table: located
                .map(|l| FileTable::new(&region[l.base..], l.header.file_count as usize)),
            base: located.map(|l| l.base),
            files: HandlePool::new(config.max_open_files),
            dirs: HandlePool::new(config.max_open_dirs),
            config,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.table.is_some()
    }

    /// Number of files in the image (0 when unmounted)
    pub fn file_count(&self) -> usize {
        self.table.map_or(0, |table| table.len())
    }

    /// Offset of the image inside the scanned region
    pub fn image_offset(&self) -> Option<usize> {
        self.base
    }

    pub fn table(&self) -> Result<FileTable<'a>> {
        self.table.ok_or(FlashFsError::NotMounted)
    }

    pub fn config(&self) -> &FlashFsConfig {
        &self.config
    }

    pub fn open_files(&self) -> usize {
        self.files.in_use()
    }

    pub fn open_dirs(&self) -> usize {
        self.dirs.in_use()
    }

    fn lookup(&self, path: &str) -> Result<(FileTable<'a>, usize)> {
        let table = self.table()?;
        let key = path.strip_prefix('/').unwrap_or(path);
        match table.find(key)? {
            Some(index) => Ok((table, index)),
            None => {
                debug!("Failed to find '{}' in file system image", key);
                Err(FlashFsError::NotFound(key.to_string()))
            }
        }
    }

    // File handles

    pub fn open_file(&mut self, path: &str) -> Result<FileHandle> {
        let (table, index) = self.lookup(path)?;
        let range = table.body_range(index)?;
        let cursor = FileCursor::new(&table.image()[range.clone()]);

        let slot = self.files.acquire(cursor).map_err(|_| {
            debug!("File handle table is full");
            FlashFsError::TooManyOpenFiles {
                capacity: self.files.capacity(),
            }
        })?;
        debug!("Opened '{}' in slot {} ({} bytes)", path, slot, range.len());
        Ok(FileHandle(slot))
    }

    fn file(&self, handle: FileHandle) -> Result<&FileCursor<'a>> {
        self.files
            .get(handle.0)
            .ok_or(FlashFsError::BadFileHandle(handle.0))
    }

    fn file_mut(&mut self, handle: FileHandle) -> Result<&mut FileCursor<'a>> {
        self.files
            .get_mut(handle.0)
            .ok_or(FlashFsError::BadFileHandle(handle.0))
    }

    /// Read into `buf`, returning the number of bytes copied (0 at end of file)
    pub fn read(&mut self, handle: FileHandle, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file_mut(handle)?.read(buf))
    }

    pub fn seek(&mut self, handle: FileHandle, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.file_mut(handle)?.seek(offset, origin)
    }

    pub fn tell(&self, handle: FileHandle) -> Result<u64> {
        Ok(self.file(handle)?.tell())
    }

    pub fn length(&self, handle: FileHandle) -> Result<u64> {
        Ok(self.file(handle)?.length())
    }

    /// Unread bytes of an open file, borrowed straight from the image
    pub fn remaining(&self, handle: FileHandle) -> Result<&'a [u8]> {
        Ok(self.file(handle)?.remaining())
    }

    /// Writing is never supported
    pub fn write(&mut self, handle: FileHandle, _buf: &[u8]) -> Result<usize> {
        self.file(handle)?;
        debug!("Rejected write to read-only file in slot {}", handle.0);
        Err(FlashFsError::ReadOnly)
    }

    /// Nothing is buffered, so flushing always succeeds
    pub fn flush(&mut self, handle: FileHandle) -> Result<()> {
        self.file(handle)?;
        Ok(())
    }

    pub fn is_terminal(&self, handle: FileHandle) -> Result<bool> {
        self.file(handle)?;
        Ok(false)
    }

    pub fn close_file(&mut self, handle: FileHandle) -> Result<()> {
        self.files
            .release(handle.0)
            .map(|_| debug!("Closed file slot {}", handle.0))
            .ok_or(FlashFsError::BadFileHandle(handle.0))
    }

    // Directory handles

    pub fn open_dir(&mut self, path: &str) -> Result<DirHandle> {
        let table = self.table()?;
        let cursor = match DirCursor::open(&table, path)? {
            Some(cursor) => cursor,
            None => return Err(self.missing_dir(&table, path)?),
        };

        let slot = self.dirs.acquire(cursor).map_err(|_| {
            debug!("Dir handle table is full");
            FlashFsError::TooManyOpenDirs {
                capacity: self.dirs.capacity(),
            }
        })?;
        debug!("Opened directory '{}' in slot {}", path, slot);
        Ok(DirHandle(slot))
    }

    fn missing_dir(&self, table: &FileTable<'a>, path: &str) -> Result<FlashFsError> {
        let (dir, _) = normalize_dir(path);
        debug!("Failed to find '{}' directory in file system image", dir);
        if table.find(dir)?.is_some() {
            return Ok(FlashFsError::NotADirectory(dir.to_string()));
        }
        Ok(FlashFsError::NotFound(dir.to_string()))
    }

    fn dir_mut(&mut self, handle: DirHandle) -> Result<&mut DirCursor> {
        self.dirs
            .get_mut(handle.0)
            .ok_or(FlashFsError::BadDirHandle(handle.0))
    }

    /// Next immediate child, or `None` once the directory is exhausted
    pub fn read_dir(&mut self, handle: DirHandle) -> Result<Option<DirEntry<'a>>> {
        let table = self.table()?;
        self.dir_mut(handle)?.next(&table)
    }

    pub fn rewind_dir(&mut self, handle: DirHandle) -> Result<()> {
        self.dir_mut(handle)?.rewind();
        Ok(())
    }

    pub fn tell_dir(&self, handle: DirHandle) -> Result<DirPosition> {
        self.dirs
            .get(handle.0)
            .map(DirCursor::tell)
            .ok_or(FlashFsError::BadDirHandle(handle.0))
    }

    pub fn seek_dir(&mut self, handle: DirHandle, position: DirPosition) -> Result<()> {
        let table = self.table()?;
        self.dir_mut(handle)?.seek(&table, position)
    }

    pub fn close_dir(&mut self, handle: DirHandle) -> Result<()> {
        self.dirs
            .release(handle.0)
            .map(|_| debug!("Closed directory slot {}", handle.0))
            .ok_or(FlashFsError::BadDirHandle(handle.0))
    }

    /// Close every open file and directory handle
    pub fn close_all(&mut self) {
        debug!(
            "Closing {} file and {} directory handles",
            self.files.in_use(),
            self.dirs.in_use()
        );
        self.files.clear();
        self.dirs.clear();
    }

    // Handle-free conveniences

    pub fn exists(&self, path: &str) -> Result<bool> {
        match self.lookup(path) {
            Ok(_) => Ok(true),
            Err(FlashFsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn metadata(&self, path: &str) -> Result<FileInfo<'a>> {
        let (table, index) = self.lookup(path)?;
        let range = table.body_range(index)?;
        Ok(FileInfo {
            path: table.name(index)?,
            size: range.len() as u64,
            offset: range.start,
        })
    }

    /// Whole body of a file, borrowed from the image
    pub fn contents(&self, path: &str) -> Result<&'a [u8]> {
        let (table, index) = self.lookup(path)?;
        table.body(index)
    }

    /// True when at least one stored path lies under `path/`
    pub fn is_dir(&self, path: &str) -> Result<bool> {
        let table = self.table()?;
        Ok(DirCursor::open(&table, path)?.is_some())
    }

    /// Collect the immediate children of a directory without using a pool slot
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry<'a>>> {
        let table = self.table()?;
        let mut cursor = match DirCursor::open(&table, path)? {
            Some(cursor) => cursor,
            None => return Err(self.missing_dir(&table, path)?),
        };

        let mut entries = Vec::new();
        while let Some(entry) = cursor.next(&table)? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

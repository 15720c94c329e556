//! Thread-safe wrapper
//!
//! The image itself is immutable and shared freely. The lock serializes pool
//! acquire/release and cursor movement, which is all the mutable state there is.

use crate::core::dir::{DirEntry, DirPosition};
use crate::core::error::Result;
use crate::core::file::SeekOrigin;
use crate::core::filesystem::{DirHandle, FileHandle, FileInfo, FlashFileSystem};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedFileSystem<'a> {
    inner: Arc<Mutex<FlashFileSystem<'a>>>,
}

impl<'a> SharedFileSystem<'a> {
    pub fn new(fs: FlashFileSystem<'a>) -> Self {
        SharedFileSystem {
            inner: Arc::new(Mutex::new(fs)),
        }
    }

    /// Run `f` with exclusive access to the file system
    pub fn with<R>(&self, f: impl FnOnce(&mut FlashFileSystem<'a>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.lock().is_mounted()
    }

    pub fn open_file(&self, path: &str) -> Result<FileHandle> {
        self.inner.lock().open_file(path)
    }

    pub fn read(&self, handle: FileHandle, buf: &mut [u8]) -> Result<usize> {
        self.inner.lock().read(handle, buf)
    }

    pub fn seek(&self, handle: FileHandle, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.inner.lock().seek(handle, offset, origin)
    }

    pub fn length(&self, handle: FileHandle) -> Result<u64> {
        self.inner.lock().length(handle)
    }

    pub fn close_file(&self, handle: FileHandle) -> Result<()> {
        self.inner.lock().close_file(handle)
    }

    pub fn open_dir(&self, path: &str) -> Result<DirHandle> {
        self.inner.lock().open_dir(path)
    }

    pub fn read_dir(&self, handle: DirHandle) -> Result<Option<DirEntry<'a>>> {
        self.inner.lock().read_dir(handle)
    }

    pub fn rewind_dir(&self, handle: DirHandle) -> Result<()> {
        self.inner.lock().rewind_dir(handle)
    }

    pub fn tell_dir(&self, handle: DirHandle) -> Result<DirPosition> {
        self.inner.lock().tell_dir(handle)
    }

    pub fn seek_dir(&self, handle: DirHandle, position: DirPosition) -> Result<()> {
        self.inner.lock().seek_dir(handle, position)
    }

    pub fn close_dir(&self, handle: DirHandle) -> Result<()> {
        self.inner.lock().close_dir(handle)
    }

    pub fn metadata(&self, path: &str) -> Result<FileInfo<'a>> {
        self.inner.lock().metadata(path)
    }

    /// File contents need no lock once found; the returned slice outlives it
    pub fn contents(&self, path: &str) -> Result<&'a [u8]> {
        self.inner.lock().contents(path)
    }
}

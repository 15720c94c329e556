//! # flashfs - Read-only file system embedded in firmware flash
//!
//! `flashfs-rs` mounts a single contiguous image that has been appended to a
//! firmware image. The image is a header, a file table sorted by path, the
//! NUL-terminated paths, and the file bodies. Nothing is copied: every read
//! and every directory listing borrows straight from the flash bytes.
//!
//! - **Locating** - the region is scanned backward for the `FFileSys` tag
//! - **Lookup** - exact path match by binary search over the sorted table
//! - **Directories** - synthesized from the flat path list, one child per step
//! - **Handles** - fixed-size pools, no allocation after mount
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashfs_rs::{FlashFileSystem, Result, SeekOrigin};
//!
//! # fn main() -> Result<()> {
//! # let flash: &[u8] = &[];
//! let mut fs = FlashFileSystem::mount(flash);
//! if !fs.is_mounted() {
//!     return Ok(());
//! }
//!
//! let file = fs.open_file("/index.html")?;
//! let mut buf = [0u8; 128];
//! let n = fs.read(file, &mut buf)?;
//! fs.seek(file, 0, SeekOrigin::Start)?;
//! fs.close_file(file)?;
//!
//! let dir = fs.open_dir("/docs")?;
//! while let Some(entry) = fs.read_dir(dir)? {
//!     println!("{}", entry.name);
//! }
//! fs.close_dir(dir)?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom configuration
//!
//! ```rust,no_run
//! use flashfs_rs::FsBuilder;
//!
//! # fn main() -> flashfs_rs::Result<()> {
//! # let flash: &[u8] = &[];
//! let fs = FsBuilder::new()
//!     .max_open_files(4)
//!     .scan_limit(256 * 1024)
//!     .mount(flash)?;
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use crate::core::{
    builder::ImageBuilder,
    config::FlashFsConfig,
    dir::{DirEntry, DirPosition, EntryKind},
    error::{FlashFsError, Result},
    file::SeekOrigin,
    filesystem::{DirHandle, FileHandle, FileInfo, FlashFileSystem},
    format::{DEFAULT_SCAN_LIMIT, SIGNATURE},
    shared::SharedFileSystem,
};

use std::path::Path;
use tracing::debug;

/// Builder for mounting with non-default settings
///
/// # Examples
///
/// ```rust,no_run
/// use flashfs_rs::FsBuilder;
///
/// # fn main() -> flashfs_rs::Result<()> {
/// # let flash: &[u8] = &[];
/// let fs = FsBuilder::new()
///     .signature(*b"MyFlash!")
///     .max_open_dirs(2)
///     .mount(flash)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FsBuilder {
    config: FlashFsConfig,
}

impl FsBuilder {
    pub fn new() -> Self {
        FsBuilder {
            config: FlashFsConfig::default(),
        }
    }

    /// Start from a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Loading configuration from {:?}", path.as_ref());
        Ok(FsBuilder {
            config: FlashFsConfig::load(path)?,
        })
    }

    pub fn signature(mut self, signature: [u8; 8]) -> Self {
        self.config.signature = signature;
        self
    }

    pub fn scan_limit(mut self, bytes: usize) -> Self {
        self.config.scan_limit = bytes;
        self
    }

    pub fn alignment(mut self, alignment: usize) -> Self {
        self.config.alignment = alignment;
        self
    }

    pub fn max_open_files(mut self, count: usize) -> Self {
        self.config.max_open_files = count;
        self
    }

    pub fn max_open_dirs(mut self, count: usize) -> Self {
        self.config.max_open_dirs = count;
        self
    }

    pub fn config(&self) -> &FlashFsConfig {
        &self.config
    }

    /// Validate the configuration and mount `region`
    pub fn mount(self, region: &[u8]) -> Result<FlashFileSystem<'_>> {
        FlashFileSystem::mount_with(region, self.config)
    }
}

/// Read-only view of a file tree
///
/// Lets tools walk any mounted image (or a wrapper around one) without caring
/// about handles.
pub trait Vfs<'a> {
    /// Immediate children of a directory; directory names end with '/'
    fn list_children(&self, dir: &str) -> Result<Vec<DirEntry<'a>>>;

    /// Full contents of a file
    fn read(&self, path: &str) -> Result<&'a [u8]>;

    fn exists(&self, path: &str) -> Result<bool>;

    fn is_dir(&self, path: &str) -> Result<bool>;

    fn metadata(&self, path: &str) -> Result<FileInfo<'a>>;
}

impl<'a> Vfs<'a> for FlashFileSystem<'a> {
    fn list_children(&self, dir: &str) -> Result<Vec<DirEntry<'a>>> {
        self.list(dir)
    }

    fn read(&self, path: &str) -> Result<&'a [u8]> {
        self.contents(path)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        FlashFileSystem::exists(self, path)
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        FlashFileSystem::is_dir(self, path)
    }

    fn metadata(&self, path: &str) -> Result<FileInfo<'a>> {
        FlashFileSystem::metadata(self, path)
    }
}

impl<'a> Vfs<'a> for SharedFileSystem<'a> {
    fn list_children(&self, dir: &str) -> Result<Vec<DirEntry<'a>>> {
        self.with(|fs| fs.list(dir))
    }

    fn read(&self, path: &str) -> Result<&'a [u8]> {
        self.contents(path)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.with(|fs| fs.exists(path))
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        self.with(|fs| fs.is_dir(path))
    }

    fn metadata(&self, path: &str) -> Result<FileInfo<'a>> {
        SharedFileSystem::metadata(self, path)
    }
}

/// Visit every file under `dir` depth-first, in table order
///
/// `visit` receives the full path (no leading slash) and the file body.
pub fn walk<'a, V, F>(vfs: &V, dir: &str, visit: &mut F) -> Result<()>
where
    V: Vfs<'a> + ?Sized,
    F: FnMut(&str, &'a [u8]),
{
    let dir = dir.trim_start_matches('/');
    let prefix = if dir.is_empty() || dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    };

    for entry in vfs.list_children(dir)? {
        let path = format!("{}{}", prefix, entry.name);
        if entry.is_dir() {
            walk(vfs, &path, visit)?;
        } else {
            visit(&path, vfs.read(&path)?);
        }
    }
    Ok(())
}

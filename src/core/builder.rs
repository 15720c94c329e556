//! Host-side image builder
//!
//! Produces the byte layout described in [`crate::core::format`] from a set
//! of `(path, contents)` pairs. Used by the `flashfs pack` command and by
//! tests; the device side only ever reads images.

use crate::core::error::{FlashFsError, Result};
use crate::core::format::{ImageHeader, RawEntry, ENTRY_SIZE, HEADER_SIZE, IMAGE_ALIGNMENT, SIGNATURE};
use crate::core::locator::scan_backward;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ImageBuilder {
    signature: [u8; 8],
    files: BTreeMap<String, Vec<u8>>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder {
            signature: SIGNATURE,
            files: BTreeMap::new(),
        }
    }

    pub fn with_signature(mut self, signature: [u8; 8]) -> Self {
        self.signature = signature;
        self
    }

    /// Add a file. A single leading '/' is stripped.
    pub fn add<P: AsRef<str>>(&mut self, path: P, contents: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let path = path.strip_prefix('/').unwrap_or(path);

        if path.is_empty()
            || path.ends_with('/')
            || path.contains('\0')
            || path.split('/').any(|segment| segment.is_empty())
        {
            return Err(FlashFsError::InvalidPath(path.to_string()));
        }

        if self.files.contains_key(path) {
            return Err(FlashFsError::InvalidPath(format!("duplicate path {}", path)));
        }
        self.files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize the image
    ///
    /// Fails if the signature occurs anywhere past the header, since the
    /// backward scan would then pick the wrong base.
    pub fn build(&self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.files.len())
            .map_err(|_| FlashFsError::InvalidPath("too many files".to_string()))?;

        let names_start = HEADER_SIZE + self.files.len() * ENTRY_SIZE;
        let mut names = Vec::new();
        let mut name_offsets = Vec::with_capacity(self.files.len());
        for path in self.files.keys() {
            name_offsets.push(names_start + names.len());
            names.extend_from_slice(path.as_bytes());
            names.push(0);
        }

        let mut bodies = Vec::new();
        let mut body_offsets = Vec::with_capacity(self.files.len());
        let bodies_start = align_up(names_start + names.len());
        for contents in self.files.values() {
            body_offsets.push(bodies_start + bodies.len());
            bodies.extend_from_slice(contents);
            bodies.resize(align_up(bodies.len()), 0);
        }

        let mut header = ImageHeader::new(count);
        header.signature = self.signature;

        let mut image = Vec::with_capacity(bodies_start + bodies.len());
        image.extend_from_slice(&header.to_bytes());
        for ((contents, name_offset), body_offset) in
            self.files.values().zip(&name_offsets).zip(&body_offsets)
        {
            let entry = RawEntry {
                filename_offset: to_u32(*name_offset)?,
                body_offset: to_u32(*body_offset)?,
                body_size: to_u32(contents.len())?,
            };
            image.extend_from_slice(&entry.to_bytes());
        }
        image.extend_from_slice(&names);
        image.resize(bodies_start, 0);
        image.extend_from_slice(&bodies);

        if scan_backward(&image, &self.signature) != Some(0) {
            return Err(FlashFsError::CorruptImage(
                "signature occurs inside file names or contents".to_string(),
            ));
        }

        debug!("Built image with {} files ({} bytes)", count, image.len());
        Ok(image)
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(offset: usize) -> usize {
    (offset + IMAGE_ALIGNMENT - 1) & !(IMAGE_ALIGNMENT - 1)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| FlashFsError::CorruptImage(format!("offset {:#x} exceeds 32 bits", value)))
}

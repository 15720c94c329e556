//! On-flash image layout
//!
//! ```text
//! Offset  Field
//! 0       signature    8 bytes, "FFileSys"
//! 8       file_count   u32 (LE)
//! 12      entries      file_count x { filename_offset, body_offset, body_size } (u32 LE each)
//! ...     filenames    NUL-terminated, no leading '/', '/'-separated segments
//! ...     bodies       raw bytes
//! ```
//!
//! All offsets are relative to the start of the image (the signature).
//! Entries are sorted by filename in ascending byte order.

pub const SIGNATURE: [u8; 8] = *b"FFileSys";
pub const SIGNATURE_LEN: usize = 8;

/// Size of the fixed header (signature + file count)
pub const HEADER_SIZE: usize = SIGNATURE_LEN + 4;

/// Size of one file table entry
pub const ENTRY_SIZE: usize = 12;

/// Default number of bytes scanned for the signature (512 KiB of flash)
pub const DEFAULT_SCAN_LIMIT: usize = 512 * 1024;

/// Required alignment of the image start
pub const IMAGE_ALIGNMENT: usize = 4;

/// Default handle pool capacity
pub const DEFAULT_MAX_OPEN: usize = 16;

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Image header as stored at the image base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub signature: [u8; 8],
    pub file_count: u32,
}

impl ImageHeader {
    pub fn new(file_count: u32) -> Self {
        ImageHeader {
            signature: SIGNATURE,
            file_count,
        }
    }

    /// Decode a header from the start of `bytes`
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are available. The
    /// signature is copied as-is; matching it is the locator's job.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let signature: [u8; 8] = bytes.get(..SIGNATURE_LEN)?.try_into().ok()?;
        let file_count = read_u32_le(bytes, SIGNATURE_LEN)?;
        Some(ImageHeader {
            signature,
            file_count,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..SIGNATURE_LEN].copy_from_slice(&self.signature);
        bytes[SIGNATURE_LEN..].copy_from_slice(&self.file_count.to_le_bytes());
        bytes
    }

    /// Byte length of header plus entry table, or `None` on overflow
    pub fn table_end(&self) -> Option<usize> {
        (self.file_count as usize)
            .checked_mul(ENTRY_SIZE)?
            .checked_add(HEADER_SIZE)
    }
}

/// One file table record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub filename_offset: u32,
    pub body_offset: u32,
    pub body_size: u32,
}

impl RawEntry {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Some(RawEntry {
            filename_offset: read_u32_le(bytes, 0)?,
            body_offset: read_u32_le(bytes, 4)?,
            body_size: read_u32_le(bytes, 8)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..4].copy_from_slice(&self.filename_offset.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.body_offset.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.body_size.to_le_bytes());
        bytes
    }

    /// Offset of entry `index` relative to the image base
    pub fn offset_of(index: usize) -> usize {
        HEADER_SIZE + index * ENTRY_SIZE
    }
}

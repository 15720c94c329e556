//! Image locator
//!
//! The image is appended after other firmware of unknown length, so its start
//! is found by scanning the flash region backward from the top of the scan
//! window for the signature. The highest match decides: if it is misaligned,
//! the header is truncated, or the file count is zero, nothing is mounted.

use crate::core::config::FlashFsConfig;
use crate::core::format::{ImageHeader, SIGNATURE_LEN};
use tracing::{debug, warn};

/// A validated image position inside a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    /// Offset of the signature from the start of the region
    pub base: usize,
    pub header: ImageHeader,
}

/// Find the highest occurrence of `signature` in `window`
pub fn scan_backward(window: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Option<usize> {
    if window.len() < SIGNATURE_LEN {
        return None;
    }
    (0..=window.len() - SIGNATURE_LEN)
        .rev()
        .find(|&offset| window[offset..offset + SIGNATURE_LEN] == signature[..])
}

/// Locate and validate the image inside `region`
///
/// Returns `None` for every "not mounted" outcome; the reason is logged.
pub fn locate(region: &[u8], config: &FlashFsConfig) -> Option<Located> {
    let window = &region[..region.len().min(config.scan_limit)];

    let base = match scan_backward(window, &config.signature) {
        Some(base) => base,
        None => {
            warn!(
                "File system signature not found in {} scanned bytes",
                window.len()
            );
            return None;
        }
    };
    debug!("Signature candidate at offset {:#x}", base);

    if base.checked_rem(config.alignment) != Some(0) {
        warn!(
            "File system image at offset {:#x} isn't {}-byte aligned",
            base, config.alignment
        );
        return None;
    }

    let header = match ImageHeader::parse(&region[base..]) {
        Some(header) => header,
        None => {
            warn!("File system header at offset {:#x} is truncated", base);
            return None;
        }
    };

    if header.file_count == 0 {
        warn!("File system image at offset {:#x} contains no files", base);
        return None;
    }

    let fits = header
        .table_end()
        .and_then(|end| base.checked_add(end))
        .is_some_and(|end| end <= region.len());
    if !fits {
        warn!(
            "File table of {} entries at offset {:#x} runs past the end of the region",
            header.file_count, base
        );
        return None;
    }

    Some(Located { base, header })
}

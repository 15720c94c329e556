//! File cursor: a bounds-checked read position over one file body

use crate::core::error::{FlashFsError, Result};
use tracing::debug;

/// Origin for [`FileCursor::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Offset from the first byte
    Start,
    /// Offset from the current position
    Current,
    /// Offset from the *last* byte of the file (`length - 1`)
    End,
}

impl SeekOrigin {
    /// Map a POSIX `whence` value (`SEEK_SET`, `SEEK_CUR`, `SEEK_END`)
    pub fn from_whence(whence: i32) -> Result<Self> {
        match whence {
            0 => Ok(SeekOrigin::Start),
            1 => Ok(SeekOrigin::Current),
            2 => Ok(SeekOrigin::End),
            other => {
                debug!("Received unknown origin code ({}) for seek", other);
                Err(FlashFsError::UnsupportedSeekOrigin(other))
            }
        }
    }
}

/// Read cursor over one file body borrowed from the image
///
/// The position is always within `0..=len`.
#[derive(Debug, Clone)]
pub struct FileCursor<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> FileCursor<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        FileCursor { body, pos: 0 }
    }

    /// Copy up to `buf.len()` bytes; returns 0 at end of file
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.body[self.pos..];
        let count = buf.len().min(remaining.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.pos += count;
        count
    }

    /// Move the cursor and return the new offset from the start of the file
    ///
    /// `SeekOrigin::End` is anchored at the last byte, so `seek(0, End)`
    /// positions on the final byte rather than past it. A target outside
    /// `0..=length` fails and leaves the cursor where it was.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => self.pos as i64,
            SeekOrigin::End => self.body.len() as i64 - 1,
        };

        let target = base
            .checked_add(offset)
            .filter(|target| (0..=self.body.len() as i64).contains(target))
            .ok_or(FlashFsError::InvalidSeek { offset })?;

        self.pos = target as usize;
        Ok(self.pos as u64)
    }

    pub fn tell(&self) -> u64 {
        self.pos as u64
    }

    pub fn length(&self) -> u64 {
        self.body.len() as u64
    }

    /// Remaining unread bytes, borrowed from the image
    pub fn remaining(&self) -> &'a [u8] {
        &self.body[self.pos..]
    }
}

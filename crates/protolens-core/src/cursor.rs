//! Forward-only reader over an immutable byte slice.
//!
//! The cursor is the only mutable state in a decode. Every successful read
//! advances the offset by exactly the number of bytes consumed; a failed read
//! leaves the offset where it was.

use crate::error::{Error, Result};
use bytes::Buf;
use std::ops::Range;
use tracing::trace;

/// Size of a gRPC message prefix: 1 compression flag byte + 4 length bytes
pub const GRPC_HEADER_LEN: usize = 5;

/// Bounds-checked reader over a borrowed buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
    saved_offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            saved_offset: 0,
        }
    }

    /// Current offset into the buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left between the offset and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Returns true once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.offset == self.data.len()
    }

    /// The full underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a base-128 varint.
    ///
    /// There is no limit on the number of continuation bytes. Bits beyond the
    /// 64th are dropped. Returns the value and the byte range it occupied.
    pub fn read_varint(&mut self) -> Result<(u64, Range<usize>)> {
        let start = self.offset;
        let mut pos = start;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let Some(&byte) = self.data.get(pos) else {
                return Err(Error::out_of_bounds(pos, 1, 0));
            };
            pos += 1;

            if shift < u64::BITS {
                result |= u64::from(byte & 0x7F) << shift;
            }
            if byte & 0x80 == 0 {
                break;
            }
            shift = shift.saturating_add(7);
        }

        self.offset = pos;
        Ok((result, start..pos))
    }

    /// Read exactly `length` bytes.
    ///
    /// Takes a `u64` so that lengths decoded from the wire can be checked
    /// before any narrowing conversion.
    pub fn read_bytes(&mut self, length: u64) -> Result<&'a [u8]> {
        let available = self.remaining();
        let len = match usize::try_from(length) {
            Ok(len) if len <= available => len,
            _ => return Err(Error::out_of_bounds(self.offset, length, available)),
        };

        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Read a little-endian `u32`
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut raw = self.read_bytes(4)?;
        Ok(raw.get_u32_le())
    }

    /// Read a little-endian `u64`
    pub fn read_u64_le(&mut self) -> Result<u64> {
        let mut raw = self.read_bytes(8)?;
        Ok(raw.get_u64_le())
    }

    /// Remember the current offset, replacing any earlier checkpoint
    pub fn checkpoint(&mut self) {
        self.saved_offset = self.offset;
    }

    /// Rewind to the last checkpoint (or to 0 if none was taken)
    pub fn restore_checkpoint(&mut self) {
        self.offset = self.saved_offset;
    }

    /// Skip a gRPC length-prefix header if one appears to be present.
    ///
    /// The header is a zero compression flag followed by a big-endian `u32`
    /// length. The skip is only committed when the declared length fits in the
    /// bytes that follow the header. Never fails; returns whether it skipped.
    pub fn try_skip_grpc_framing(&mut self) -> bool {
        if self.remaining() < GRPC_HEADER_LEN || self.data[self.offset] != 0 {
            return false;
        }

        self.checkpoint();
        let declared = match self.read_bytes(GRPC_HEADER_LEN as u64) {
            Ok(mut header) => {
                header.advance(1);
                header.get_u32()
            }
            Err(_) => {
                self.restore_checkpoint();
                return false;
            }
        };

        if u64::from(declared) > self.remaining() as u64 {
            trace!(
                "gRPC length {} exceeds {} remaining bytes, not framed",
                declared,
                self.remaining()
            );
            self.restore_checkpoint();
            return false;
        }

        trace!("Skipped gRPC header declaring {} bytes", declared);
        true
    }
}

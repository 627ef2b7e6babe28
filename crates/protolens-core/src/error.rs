//! Error types for the protolens-core library.
//!
//! Only two errors can escape a decode: [`Error::OutOfBounds`] and
//! [`Error::UnsupportedWireType`]. Both abort the decode of the whole
//! top-level buffer. Invalid UTF-8 and failed nested decodes are handled
//! inside the payload classifier and never show up here.

use thiserror::Error;

/// Result type alias for protolens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all protolens operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A read asked for more bytes than the buffer has left
    #[error("out of bounds at offset {offset}: requested {requested} byte(s), {available} left")]
    OutOfBounds {
        /// Byte offset where the read was attempted
        offset: usize,
        /// Number of bytes the read needed
        requested: u64,
        /// Number of bytes remaining in the buffer
        available: usize,
    },

    /// The low three bits of a tag are not 0, 1, 2 or 5
    #[error("unsupported wire type {wire_type} in tag at offset {offset}")]
    UnsupportedWireType {
        /// Byte offset of the tag
        offset: usize,
        /// The rejected wire type value
        wire_type: u8,
    },
}

impl Error {
    /// Creates a new out-of-bounds error
    pub fn out_of_bounds(offset: usize, requested: u64, available: usize) -> Self {
        Self::OutOfBounds {
            offset,
            requested,
            available,
        }
    }

    /// Creates a new unsupported wire type error
    pub fn unsupported_wire_type(offset: usize, wire_type: u8) -> Self {
        Self::UnsupportedWireType { offset, wire_type }
    }
}

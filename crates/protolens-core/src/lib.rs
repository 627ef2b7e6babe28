//! # protolens-core
//!
//! A library for decoding Protocol Buffer payloads without a schema.
//!
//! Given bytes believed to hold a protobuf message, the decoder walks the wire
//! format and produces a tree of field records. Because the `.proto` file is
//! unknown, every scalar comes with all its plausible readings, and every
//! length-delimited payload is classified as text, a nested message, or raw
//! bytes.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`cursor`]: Bounds-checked byte reader and gRPC header detection
//! - [`scalar`]: Candidate interpretations of varint and fixed-width values
//! - [`decoder`]: Field and message decoding, payload classification
//! - [`hex`]: Hex rendering of byte ranges
//! - [`render`]: Visitors over decoded messages (text tree, statistics)
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use protolens_core::{Candidate, Decoder, DecoderConfig, Payload};
//!
//! // gRPC frame header followed by: field 1 = 150, field 2 = "testing"
//! let data = [
//!     0x00, 0x00, 0x00, 0x00, 0x0C,
//!     0x08, 0x96, 0x01,
//!     0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g',
//! ];
//!
//! let decoder = Decoder::with_config(DecoderConfig::new().skip_grpc_framing(true));
//! let message = decoder.decode(&data)?;
//!
//! assert_eq!(message.len(), 2);
//! assert_eq!(message.fields()[0].candidates(), Some(&[Candidate::Uint(150), Candidate::Sint(75)][..]));
//! assert_eq!(message.fields()[1].payload().and_then(Payload::as_str), Some("testing"));
//! # Ok::<(), protolens_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! The [`FieldVisitor`] trait lets callers walk a decoded tree and produce
//! their own output formats.
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod hex;
pub mod render;
pub mod scalar;

// Re-export primary types for convenience
pub use cursor::ByteCursor;
pub use decoder::{
    decode, Content, Decoder, DecoderConfig, FieldRecord, Message, Payload, WireType,
    DEFAULT_MAX_DEPTH,
};
pub use error::{Error, Result};
pub use render::{render_tree, FieldVisitor, StatsVisitor, TreeRenderer};
pub use scalar::Candidate;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Schema-less message decoding.
//!
//! This module turns a protobuf-encoded buffer into a [`Message`] of
//! [`FieldRecord`]s without any `.proto` definition.
//!
//! ## Algorithm Overview
//!
//! 1. Optionally skip a leading gRPC frame header
//! 2. Decode fields one after another until the buffer is exhausted
//! 3. List every plausible reading of varint and fixed-width values
//! 4. Classify each length-delimited payload, in order, as:
//!    - `string` if it is valid UTF-8
//!    - `protobuf` if it decodes completely as a nested message
//!    - `bytes` otherwise
//!
//! Valid UTF-8 always wins, so a nested message whose bytes happen to be
//! valid UTF-8 is reported as a string.
//!
//! Any out-of-bounds read or unsupported wire type aborts the whole decode;
//! no partial result is returned. Inside step 4 those same failures only mean
//! "not a nested message" and are never surfaced.

mod field;
mod record;
mod wire;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::hex::to_hex;
use tracing::{debug, trace};

pub use record::{Content, FieldRecord, Message, Payload};
pub use wire::WireType;

/// Nesting limit used unless the caller picks another one.
///
/// Decoding, [`walk`](crate::render::walk), serialization and drop all recurse
/// once per nesting level, so the limit also bounds their stack use.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Skip a leading 5-byte gRPC frame header when one is detected
    pub skip_grpc_framing: bool,
    /// Deepest nesting level decoded as a message (`None` = unlimited).
    /// Payloads below it are reported as `bytes`.
    pub max_depth: Option<usize>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            skip_grpc_framing: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to look for a gRPC frame header
    pub fn skip_grpc_framing(mut self, skip: bool) -> Self {
        self.skip_grpc_framing = skip;
        self
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Removes the nesting limit.
    ///
    /// Only use this for trusted input: adversarial nesting can exhaust the
    /// stack.
    pub fn unlimited_depth(mut self) -> Self {
        self.max_depth = None;
        self
    }
}

/// Decoder for protobuf buffers of unknown schema
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a whole buffer.
    ///
    /// Byte ranges of top-level fields are offsets into `data`, including the
    /// gRPC header if one was skipped.
    pub fn decode(&self, data: &[u8]) -> Result<Message> {
        debug!("Starting decode of {} bytes", data.len());

        let mut cursor = ByteCursor::new(data);
        if self.config.skip_grpc_framing && cursor.try_skip_grpc_framing() {
            debug!("Skipped gRPC frame header");
        }

        let message = self.read_message(&mut cursor, 0)?;
        debug!("Decode complete: {} top-level fields", message.len());
        Ok(message)
    }

    /// Decode fields until the cursor reaches the end of its buffer
    fn read_message(&self, cursor: &mut ByteCursor<'_>, depth: usize) -> Result<Message> {
        let mut fields = Vec::new();
        while !cursor.is_at_end() {
            fields.push(self.read_field(cursor, depth)?);
        }
        Ok(Message::new(fields))
    }

    /// Classify a length-delimited payload found in a message at `depth`
    fn classify(&self, payload: &[u8], depth: usize) -> Payload {
        let hex = to_hex(payload);

        if let Some(text) = as_text(payload) {
            return Payload::String {
                value: text.to_owned(),
                hex,
            };
        }

        if let Some(message) = self.as_message(payload, depth + 1) {
            return Payload::Protobuf {
                value: message,
                hex,
            };
        }

        Payload::Bytes {
            value: hex.clone(),
            hex,
        }
    }

    /// Try to decode `payload` as a complete message at nesting level `depth`
    fn as_message(&self, payload: &[u8], depth: usize) -> Option<Message> {
        if self.config.max_depth.is_some_and(|max| depth > max) {
            trace!("Not decoding {} byte payload at depth {}: limit reached", payload.len(), depth);
            return None;
        }

        let mut cursor = ByteCursor::new(payload);
        match self.read_message(&mut cursor, depth) {
            Ok(message) => Some(message),
            Err(e) => {
                trace!("{} byte payload is not a message: {}", payload.len(), e);
                None
            }
        }
    }
}

fn as_text(payload: &[u8]) -> Option<&str> {
    std::str::from_utf8(payload).ok()
}

/// Decode a buffer with the default decoder
pub fn decode(data: &[u8]) -> Result<Message> {
    Decoder::new().decode(data)
}

//! Decoded field records.
//!
//! The tree is built bottom-up during one decode and never mutated after.
//! Serialization follows the shape consumers of the JSON output expect:
//!
//! ```json
//! {
//!   "byteRange": "0-3",
//!   "fieldNumber": 1,
//!   "type": "varint",
//!   "originalHex": "08 96 01",
//!   "content": [{"kind": "uint", "value": 150}, {"kind": "sint", "value": 75}]
//! }
//! ```

use super::wire::WireType;
use crate::scalar::Candidate;
use serde::{Serialize, Serializer};
use std::ops::Range;

/// A decoded message: field records in wire order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Message {
    fields: Vec<FieldRecord>,
}

impl Message {
    pub(crate) fn new(fields: Vec<FieldRecord>) -> Self {
        Self { fields }
    }

    /// The records, in the order they appear in the buffer
    pub fn fields(&self) -> &[FieldRecord] {
        &self.fields
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the message has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the records in wire order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldRecord> {
        self.fields.iter()
    }

    /// Consume the message, returning its records
    pub fn into_fields(self) -> Vec<FieldRecord> {
        self.fields
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a FieldRecord;
    type IntoIter = std::slice::Iter<'a, FieldRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// One decoded field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    /// Bytes the field occupied, tag through end of payload, relative to the
    /// buffer (or nested payload) it was decoded from
    #[serde(rename = "byteRange", serialize_with = "serialize_range")]
    pub range: Range<usize>,
    /// Field number from the tag (`tag >> 3`)
    pub field_number: u64,
    /// Wire type from the tag (`tag & 7`)
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Hex of every byte in `range`
    pub original_hex: String,
    /// Decoded value
    pub content: Content,
}

impl FieldRecord {
    /// Candidate readings, for varint and fixed-width fields
    pub fn candidates(&self) -> Option<&[Candidate]> {
        match &self.content {
            Content::Scalar(candidates) => Some(candidates.as_slice()),
            Content::Payload(_) => None,
        }
    }

    /// Classified payload, for length-delimited fields
    pub fn payload(&self) -> Option<&Payload> {
        match &self.content {
            Content::Payload(payload) => Some(payload),
            Content::Scalar(_) => None,
        }
    }
}

/// Decoded value of a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// Varint, fixed32 or fixed64 readings, in fixed order
    Scalar(Vec<Candidate>),
    /// Length-delimited payload
    Payload(Payload),
}

/// Classification of a length-delimited payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    /// Valid UTF-8 text
    String {
        /// Decoded text
        value: String,
        /// Hex of the raw payload
        hex: String,
    },
    /// A nested message that consumed the whole payload
    Protobuf {
        /// The nested records
        value: Message,
        /// Hex of the raw payload
        hex: String,
    },
    /// Neither text nor a message
    Bytes {
        /// Hex of the raw payload
        value: String,
        /// Hex of the raw payload
        hex: String,
    },
}

impl Payload {
    /// Classification name, as used in serialized output
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::String { .. } => "string",
            Payload::Protobuf { .. } => "protobuf",
            Payload::Bytes { .. } => "bytes",
        }
    }

    /// Hex of the raw payload bytes
    pub fn hex(&self) -> &str {
        match self {
            Payload::String { hex, .. } | Payload::Protobuf { hex, .. } | Payload::Bytes { hex, .. } => {
                hex
            }
        }
    }

    /// The nested message, if the payload decoded as one
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Payload::Protobuf { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The text, if the payload was valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String { value, .. } => Some(value.as_str()),
            _ => None,
        }
    }
}

fn serialize_range<S: Serializer>(range: &Range<usize>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{}-{}", range.start, range.end))
}

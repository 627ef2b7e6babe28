//! Decoding of a single wire-format field.

use super::record::{Content, FieldRecord};
use super::wire::WireType;
use super::Decoder;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::hex::to_hex;
use crate::scalar::{fixed32_candidates, fixed64_candidates, varint_candidates};

impl Decoder {
    /// Decode the field whose tag starts at `offset` in `data`.
    ///
    /// Returns the record and the offset just past its payload. Length-delimited
    /// payloads are classified as top-level (depth 0) fields.
    pub fn decode_field(&self, data: &[u8], offset: usize) -> Result<(FieldRecord, usize)> {
        let mut cursor = ByteCursor::new(data);
        cursor.read_bytes(offset as u64)?;

        let record = self.read_field(&mut cursor, 0)?;
        Ok((record, cursor.offset()))
    }

    /// Read one field at the cursor. `depth` is the nesting level of the
    /// message the field belongs to.
    pub(super) fn read_field(&self, cursor: &mut ByteCursor<'_>, depth: usize) -> Result<FieldRecord> {
        let (tag, tag_range) = cursor.read_varint()?;
        let start = tag_range.start;

        let wire_type = WireType::from_tag(tag)
            .ok_or_else(|| Error::unsupported_wire_type(start, (tag & 0x07) as u8))?;
        let field_number = tag >> 3;

        let content = match wire_type {
            WireType::Varint => {
                let (value, _) = cursor.read_varint()?;
                Content::Scalar(varint_candidates(value))
            }
            WireType::Fixed64 => Content::Scalar(fixed64_candidates(cursor.read_u64_le()?)),
            WireType::LengthDelimited => {
                let (length, _) = cursor.read_varint()?;
                let payload = cursor.read_bytes(length)?;
                Content::Payload(self.classify(payload, depth))
            }
            WireType::Fixed32 => Content::Scalar(fixed32_candidates(cursor.read_u32_le()?)),
        };

        let end = cursor.offset();
        Ok(FieldRecord {
            range: start..end,
            field_number,
            wire_type,
            original_hex: to_hex(&cursor.data()[start..end]),
            content,
        })
    }
}

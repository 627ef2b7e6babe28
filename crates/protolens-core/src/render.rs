//! Walking and rendering decoded messages.
//!
//! This module provides the [`FieldVisitor`] trait for customizing how a
//! decoded [`Message`] is consumed, plus two visitors: [`TreeRenderer`] for an
//! indented text dump and [`StatsVisitor`] for summary counts.

use crate::decoder::{Content, FieldRecord, Message, Payload, WireType};
use std::fmt::{Result, Write};

/// Trait for visiting decoded fields.
///
/// [`walk`] calls the hooks depth-first, in wire order. Top-level fields have
/// depth 0; fields of a nested message are visited between the
/// `enter_field` and `exit_field` calls of the field that contains them.
///
/// # Example
///
/// ```
/// use protolens_core::render::{walk, FieldVisitor};
/// use protolens_core::FieldRecord;
///
/// struct Numbers(Vec<u64>);
///
/// impl FieldVisitor for Numbers {
///     fn enter_field(&mut self, field: &FieldRecord, _depth: usize) -> std::fmt::Result {
///         self.0.push(field.field_number);
///         Ok(())
///     }
/// }
///
/// let message = protolens_core::decode(&[0x08, 0x01, 0x10, 0x02]).unwrap();
/// let mut numbers = Numbers(Vec::new());
/// walk(&message, &mut numbers).unwrap();
/// assert_eq!(numbers.0, vec![1, 2]);
/// ```
pub trait FieldVisitor {
    /// Called before any nested fields of `field`
    fn enter_field(&mut self, field: &FieldRecord, depth: usize) -> Result {
        let _ = (field, depth);
        Ok(())
    }

    /// Called after all nested fields of `field`
    fn exit_field(&mut self, field: &FieldRecord, depth: usize) -> Result {
        let _ = (field, depth);
        Ok(())
    }
}

/// Visit every field of `message`, recursing into nested messages
pub fn walk(message: &Message, visitor: &mut impl FieldVisitor) -> Result {
    walk_at(message, visitor, 0)
}

fn walk_at(message: &Message, visitor: &mut impl FieldVisitor, depth: usize) -> Result {
    for field in message {
        visitor.enter_field(field, depth)?;
        if let Some(nested) = field.payload().and_then(Payload::as_message) {
            walk_at(nested, visitor, depth + 1)?;
        }
        visitor.exit_field(field, depth)?;
    }
    Ok(())
}

/// Writes one line per field, nested messages indented below their field
pub struct TreeRenderer<W: Write> {
    writer: W,
    indent_str: String,
}

impl<W: Write> TreeRenderer<W> {
    /// Creates a renderer indenting by two spaces per level
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent_str: "  ".to_string(),
        }
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FieldVisitor for TreeRenderer<W> {
    fn enter_field(&mut self, field: &FieldRecord, depth: usize) -> Result {
        for _ in 0..depth {
            self.writer.write_str(&self.indent_str)?;
        }
        write!(
            self.writer,
            "[{}-{}] #{} {}",
            field.range.start, field.range.end, field.field_number, field.wire_type
        )?;

        match &field.content {
            Content::Scalar(candidates) => {
                self.writer.write_char(':')?;
                for candidate in candidates {
                    write!(self.writer, " {}", candidate)?;
                }
            }
            Content::Payload(Payload::String { value, .. }) => {
                write!(self.writer, " string: {:?}", value)?;
            }
            Content::Payload(Payload::Protobuf { value, .. }) => {
                write!(self.writer, " protobuf ({} fields):", value.len())?;
            }
            Content::Payload(Payload::Bytes { value, .. }) => {
                write!(self.writer, " bytes: {}", value)?;
            }
        }
        self.writer.write_char('\n')
    }
}

/// Render `message` as an indented text tree
pub fn render_tree(message: &Message) -> String {
    let mut renderer = TreeRenderer::new(String::new());
    // Writing into a String cannot fail
    let _ = walk(message, &mut renderer);
    renderer.into_inner()
}

/// A visitor that collects statistics about a decoded message
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsVisitor {
    /// Total number of fields at every depth
    pub field_count: usize,
    /// Number of varint fields
    pub varint_count: usize,
    /// Number of fixed64 fields
    pub fixed64_count: usize,
    /// Number of fixed32 fields
    pub fixed32_count: usize,
    /// Length-delimited fields classified as text
    pub string_count: usize,
    /// Length-delimited fields classified as nested messages
    pub message_count: usize,
    /// Length-delimited fields classified as raw bytes
    pub bytes_count: usize,
    /// Deepest nesting level seen (0 = top-level fields only)
    pub max_depth: usize,
}

impl StatsVisitor {
    /// Collect statistics for `message`
    pub fn collect(message: &Message) -> Self {
        let mut stats = Self::default();
        // StatsVisitor never returns an error
        let _ = walk(message, &mut stats);
        stats
    }
}

impl FieldVisitor for StatsVisitor {
    fn enter_field(&mut self, field: &FieldRecord, depth: usize) -> Result {
        self.field_count += 1;
        self.max_depth = self.max_depth.max(depth);

        match field.wire_type {
            WireType::Varint => self.varint_count += 1,
            WireType::Fixed64 => self.fixed64_count += 1,
            WireType::Fixed32 => self.fixed32_count += 1,
            WireType::LengthDelimited => match field.payload() {
                Some(Payload::String { .. }) => self.string_count += 1,
                Some(Payload::Protobuf { .. }) => self.message_count += 1,
                Some(Payload::Bytes { .. }) | None => self.bytes_count += 1,
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use pretty_assertions::assert_eq;

    // Field 1 varint 150, field 2 = { field 1 varint 150, field 3 "hi" },
    // field 4 bytes ff, field 5 fixed32 1.0
    const SAMPLE: &[u8] = &[
        0x08, 0x96, 0x01, //
        0x12, 0x07, 0x08, 0x96, 0x01, 0x1A, 0x02, b'h', b'i', //
        0x22, 0x01, 0xFF, //
        0x2D, 0x00, 0x00, 0x80, 0x3F,
    ];

    #[test]
    fn test_render_tree() {
        let message = decode(SAMPLE).unwrap();
        let expected = "\
[0-3] #1 varint: uint=150 sint=75
[3-12] #2 length_delimited protobuf (2 fields):
  [0-3] #1 varint: uint=150 sint=75
  [3-7] #3 length_delimited string: \"hi\"
[12-15] #4 length_delimited bytes: ff
[15-20] #5 fixed32: float=1 int=1065353216
";
        assert_eq!(render_tree(&message), expected);
    }

    #[test]
    fn test_custom_indent() {
        let message = decode(SAMPLE).unwrap();
        let mut renderer = TreeRenderer::new(String::new()).indent_str("\t");
        walk(&message, &mut renderer).unwrap();
        assert!(renderer.into_inner().contains("\n\t[0-3] #1 varint"));
    }

    #[test]
    fn test_stats_visitor() {
        let stats = StatsVisitor::collect(&decode(SAMPLE).unwrap());
        assert_eq!(
            stats,
            StatsVisitor {
                field_count: 6,
                varint_count: 2,
                fixed64_count: 0,
                fixed32_count: 1,
                string_count: 1,
                message_count: 1,
                bytes_count: 1,
                max_depth: 1,
            }
        );
    }

    #[test]
    fn test_empty_message() {
        let message = decode(&[]).unwrap();
        assert_eq!(render_tree(&message), "");
        assert_eq!(StatsVisitor::collect(&message), StatsVisitor::default());
    }
}

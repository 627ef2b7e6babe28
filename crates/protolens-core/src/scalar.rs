//! Candidate interpretations of raw scalar values.
//!
//! Without a schema the semantic type of a varint or fixed-width field is
//! unknowable. These functions list every plausible reading so an analyst can
//! pick the right one.
//!
//! | wire type | candidates (in order)                      |
//! |-----------|--------------------------------------------|
//! | varint    | `uint`, then `int32`, `int64`, `sint` when they differ from `uint` |
//! | fixed32   | `float`, `int`                             |
//! | fixed64   | `double`, `int`                            |

use serde::{Serialize, Serializer};
use std::fmt;

/// One possible reading of a raw scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Candidate {
    /// The raw varint as an unsigned integer
    Uint(u64),
    /// Low 32 bits as two's-complement
    Int32(i32),
    /// All 64 bits as two's-complement
    Int64(i64),
    /// Zig-zag decoded (`sint32`/`sint64`)
    Sint(i64),
    /// IEEE-754 single precision (fixed32)
    Float(#[serde(serialize_with = "serialize_float")] f32),
    /// IEEE-754 double precision (fixed64)
    Double(#[serde(serialize_with = "serialize_float")] f64),
    /// Raw unsigned fixed-width value
    Int(u64),
}

impl Candidate {
    /// Name of the interpretation, as used in serialized output
    pub fn kind(&self) -> &'static str {
        match self {
            Candidate::Uint(_) => "uint",
            Candidate::Int32(_) => "int32",
            Candidate::Int64(_) => "int64",
            Candidate::Sint(_) => "sint",
            Candidate::Float(_) => "float",
            Candidate::Double(_) => "double",
            Candidate::Int(_) => "int",
        }
    }
}

/// Finite values stay numbers; NaN and the infinities become `"NaN"`,
/// `"inf"` and `"-inf"` so JSON output can tell them apart.
fn serialize_float<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Copy + Into<f64> + fmt::Display + Serialize,
    S: Serializer,
{
    if Into::<f64>::into(*value).is_finite() {
        value.serialize(serializer)
    } else {
        serializer.collect_str(value)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Uint(v) | Candidate::Int(v) => write!(f, "{}={}", self.kind(), v),
            Candidate::Int32(v) => write!(f, "{}={}", self.kind(), v),
            Candidate::Int64(v) | Candidate::Sint(v) => write!(f, "{}={}", self.kind(), v),
            Candidate::Float(v) => write!(f, "{}={}", self.kind(), v),
            Candidate::Double(v) => write!(f, "{}={}", self.kind(), v),
        }
    }
}

/// Zig-zag decode a varint (`0 -> 0, 1 -> -1, 2 -> 1, 3 -> -2, ...`)
pub fn zigzag_decode(n: u64) -> i64 {
    // Same as `n >> 1` for even n and `-((n + 1) >> 1)` for odd n, without
    // overflowing on u64::MAX
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// All readings of a varint: `uint` first, then `int32`, `int64` and `sint`
/// only where they differ numerically from `uint`
pub fn varint_candidates(value: u64) -> Vec<Candidate> {
    let raw = i128::from(value);
    let mut candidates = vec![Candidate::Uint(value)];

    let as_int32 = value as u32 as i32;
    if i128::from(as_int32) != raw {
        candidates.push(Candidate::Int32(as_int32));
    }

    let as_int64 = value as i64;
    if i128::from(as_int64) != raw {
        candidates.push(Candidate::Int64(as_int64));
    }

    let as_sint = zigzag_decode(value);
    if i128::from(as_sint) != raw {
        candidates.push(Candidate::Sint(as_sint));
    }

    candidates
}

/// Readings of a fixed32 value: always `[float, int]`
pub fn fixed32_candidates(value: u32) -> Vec<Candidate> {
    vec![
        Candidate::Float(f32::from_bits(value)),
        Candidate::Int(u64::from(value)),
    ]
}

/// Readings of a fixed64 value: always `[double, int]`
pub fn fixed64_candidates(value: u64) -> Vec<Candidate> {
    vec![Candidate::Double(f64::from_bits(value)), Candidate::Int(value)]
}

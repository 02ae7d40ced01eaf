//! Little-endian binary codec shared by the `.ani` and `.mesh` formats.
//!
//! The formats carry no magic or version bytes: fields are written back to
//! back, strings and arrays are prefixed with a `u64` count. Decoding is
//! lenient by default. A read past the end yields a zero value, logs a
//! warning once and marks the reader as [`overflowed`](BinaryReader::overflowed),
//! so a truncated asset still loads partially instead of aborting.
//!
//! - [`BinaryReader`] - lenient decoder over a byte slice
//! - [`BinaryWriter`] - matching encoder used by the asset pipeline and tests
//! - [`DecodeError`] - reported by [`BinaryReader::finish`] for callers that
//!   want strict validation

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Errors reported when a decode is checked strictly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The data ended before every field could be read.
    #[error("{context}: truncated at byte {offset} ({requested} more bytes requested)")]
    Truncated {
        /// What was being decoded (e.g. `"animation"`).
        context: &'static str,
        /// Offset of the first failed read.
        offset: usize,
        /// Bytes requested by the first failed read.
        requested: usize,
    },
    /// Every field was read but bytes remain.
    #[error("{context}: {remaining} trailing bytes after the last field")]
    TrailingBytes {
        /// What was being decoded.
        context: &'static str,
        /// Number of unread bytes.
        remaining: usize,
    },
}

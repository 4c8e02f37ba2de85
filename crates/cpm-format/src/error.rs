//! Module loading errors

use crate::offset::ByteMode;
use std::fmt;
use thiserror::Error;

/// Which fixed-size table failed a bounds check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// The segment-offset table trailing the header
    SegmentTable,
    /// The string table's count prefix and offset array
    StringTable,
    /// A function symbol's parameter type list
    ParamTypes,
    /// A fixed-size symbol record
    SymbolRecord,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::SegmentTable => "segment table",
            TableKind::StringTable => "string table",
            TableKind::ParamTypes => "parameter type list",
            TableKind::SymbolRecord => "symbol record",
        };
        f.write_str(name)
    }
}

/// Which index space an out-of-range index belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Segment table index
    Segment,
    /// String table index
    String,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Segment => f.write_str("segment"),
            IndexKind::String => f.write_str("string"),
        }
    }
}

/// Errors produced while validating or reading a module
///
/// Malformed input is never retried: every variant describes a permanent
/// property of the bytes that were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// Buffer shorter than the fixed header
    #[error("Module too small: {len} bytes, header needs {required}")]
    TooSmall {
        /// Buffer length
        len: usize,
        /// Minimum length
        required: usize,
    },

    /// Byte mode other than 0 (32-bit) or 1 (64-bit)
    #[error("Invalid byte mode {0} (expected 0 or 1)")]
    InvalidByteMode(u8),

    /// First four bytes are not the module signature
    #[error("Invalid magic number: expected {expected:02x?}, got {actual:02x?}")]
    BadMagic {
        /// Required signature
        expected: [u8; 4],
        /// Bytes found in the buffer
        actual: [u8; 4],
    },

    /// Version rejected by the compatibility table
    #[error("Unsupported bytecode version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version found in the header
        major: u32,
        /// Minor version found in the header
        minor: u32,
    },

    /// A declared table extends past the end of the buffer
    #[error("{table} at {start} needs {required} bytes but the module has {len}")]
    TableOverflowsBuffer {
        /// Table that failed the check
        table: TableKind,
        /// Position of the table
        start: usize,
        /// Bytes the table needs from `start`
        required: usize,
        /// Buffer length
        len: usize,
    },

    /// Segment or string index at or beyond the declared count
    #[error("{kind} index {index} out of range (count: {count})")]
    IndexOutOfRange {
        /// Index space
        kind: IndexKind,
        /// Requested index
        index: u64,
        /// Declared count
        count: u64,
    },

    /// Address or size beyond the buffer or the native size range
    #[error("Offset {offset:#x} out of range (limit: {limit:#x})")]
    OffsetOutOfRange {
        /// Offending address or value
        offset: u64,
        /// Largest admissible value
        limit: u64,
    },

    /// Offset written with a width other than the module's
    #[error("Offset width mismatch: module uses {expected}, offset is {actual}")]
    ByteModeMismatch {
        /// Byte mode of the module
        expected: ByteMode,
        /// Byte mode of the offset
        actual: ByteMode,
    },

    /// String runs to the end of the buffer without a NUL byte
    #[error("String {index} at {start} is not NUL-terminated")]
    UnterminatedString {
        /// String table index
        index: u32,
        /// Position of the first byte
        start: usize,
    },

    /// String bytes are not valid UTF-8
    #[error("String {index} at {start} is not valid UTF-8")]
    InvalidUtf8 {
        /// String table index
        index: u32,
        /// Position of the first byte
        start: usize,
    },

    /// String handed to the builder contains the terminator byte
    #[error("String {0:?} contains a NUL byte")]
    EmbeddedNul(String),

    /// Symbol record with an unknown discriminant
    #[error("Invalid symbol kind {kind} at {position}")]
    InvalidSymbolKind {
        /// Tag found in the record
        kind: u32,
        /// Position of the record
        position: usize,
    },

    /// Class symbol whose attribute range is reversed
    #[error("Invalid attribute range [{start}, {end}) in class symbol")]
    InvalidAttributeRange {
        /// First attribute index
        start: u32,
        /// One past the last attribute index
        end: u32,
    },
}

impl ModuleError {
    /// Short stable name of the error kind, for reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModuleError::TooSmall { .. } => "TooSmall",
            ModuleError::InvalidByteMode(_) => "InvalidByteMode",
            ModuleError::BadMagic { .. } => "BadMagic",
            ModuleError::UnsupportedVersion { .. } => "UnsupportedVersion",
            ModuleError::TableOverflowsBuffer { .. } => "TableOverflowsBuffer",
            ModuleError::IndexOutOfRange { .. } => "IndexOutOfRange",
            ModuleError::OffsetOutOfRange { .. } => "OffsetOutOfRange",
            ModuleError::ByteModeMismatch { .. } => "ByteModeMismatch",
            ModuleError::UnterminatedString { .. } => "UnterminatedString",
            ModuleError::InvalidUtf8 { .. } => "InvalidUtf8",
            ModuleError::EmbeddedNul(_) => "EmbeddedNul",
            ModuleError::InvalidSymbolKind { .. } => "InvalidSymbolKind",
            ModuleError::InvalidAttributeRange { .. } => "InvalidAttributeRange",
        }
    }

    pub(crate) fn out_of_bounds(end: usize, len: usize) -> Self {
        ModuleError::OffsetOutOfRange {
            offset: end as u64,
            limit: len as u64,
        }
    }
}

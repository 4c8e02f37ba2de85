//! Module header
//!
//! ```text
//! ┌──────┬─────────────┬────────────────────────────┐
//! │ 0    │ magic       │ 4 bytes, 63 70 6d 80       │
//! │ 4    │ major       │ u32                        │
//! │ 8    │ minor       │ u32                        │
//! │ 12   │ byte_mode   │ u8, 0 = 32-bit, 1 = 64-bit │
//! │ 13   │ seg_counts  │ u8                         │
//! │ 14   │ reserved    │ 2 bytes                    │
//! │ 16   │ seg_table   │ seg_counts offsets         │
//! └──────┴─────────────┴────────────────────────────┘
//! ```

use crate::error::{IndexKind, ModuleError, TableKind};
use crate::offset::{ByteMode, Offset};
use crate::reader::ModuleReader;
use crate::version::{is_supported, MAGIC, VERSION_MAJOR, VERSION_MINOR};
use crate::writer::ModuleWriter;

/// Size of the fixed part of the header
pub const HEADER_SIZE: usize = 16;

/// Validated module header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Signature bytes (always [`MAGIC`] once validated)
    pub magic: [u8; 4],
    /// Bytecode major version
    pub major: u32,
    /// Bytecode minor version
    pub minor: u32,
    /// Width of every offset in the module
    pub byte_mode: ByteMode,
    /// Number of entries in the segment table
    pub segment_count: u8,
}

impl Header {
    /// Header for a module written by this crate
    pub fn new(byte_mode: ByteMode, segment_count: u8) -> Self {
        Self {
            magic: MAGIC,
            major: VERSION_MAJOR,
            minor: VERSION_MINOR,
            byte_mode,
            segment_count,
        }
    }

    /// Size of the segment table
    pub fn segment_table_size(&self) -> usize {
        self.segment_count as usize * self.byte_mode.width()
    }

    /// Size of the fixed header plus the segment table
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.segment_table_size()
    }

    /// Parse and validate the header at the start of `data`
    ///
    /// Returns the header and the number of bytes it occupies, segment table
    /// included.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), ModuleError> {
        match Self::parse_inner(data) {
            Ok((header, size)) => {
                log::debug!(
                    "accepted module header v{}.{} ({}, {} segments)",
                    header.major,
                    header.minor,
                    header.byte_mode,
                    header.segment_count
                );
                Ok((header, size))
            }
            Err(err) => {
                log::debug!("rejected module header: {}", err);
                Err(err)
            }
        }
    }

    fn parse_inner(data: &[u8]) -> Result<(Self, usize), ModuleError> {
        if data.len() < HEADER_SIZE {
            return Err(ModuleError::TooSmall {
                len: data.len(),
                required: HEADER_SIZE,
            });
        }

        let mut reader = ModuleReader::new(data, 0, ByteMode::Narrow);
        let magic = reader.read_array::<4>()?;
        let major = reader.read_u32()?;
        let minor = reader.read_u32()?;
        let raw_mode = reader.read_u8()?;
        let segment_count = reader.read_u8()?;

        let byte_mode = ByteMode::from_raw(raw_mode)?;

        let table_size = byte_mode.table_size(segment_count as usize)?;
        if HEADER_SIZE + table_size > data.len() {
            return Err(ModuleError::TableOverflowsBuffer {
                table: TableKind::SegmentTable,
                start: HEADER_SIZE,
                required: table_size,
                len: data.len(),
            });
        }

        if magic != MAGIC {
            return Err(ModuleError::BadMagic {
                expected: MAGIC,
                actual: magic,
            });
        }

        if !is_supported(major, minor) {
            return Err(ModuleError::UnsupportedVersion { major, minor });
        }

        let header = Self {
            magic,
            major,
            minor,
            byte_mode,
            segment_count,
        };
        Ok((header, HEADER_SIZE + table_size))
    }

    /// Raw offset stored in segment-table slot `index`
    ///
    /// `data` must be the buffer this header was parsed from.
    pub fn segment_offset(&self, data: &[u8], index: u8) -> Result<Offset, ModuleError> {
        if index >= self.segment_count {
            return Err(ModuleError::IndexOutOfRange {
                kind: IndexKind::Segment,
                index: index as u64,
                count: self.segment_count as u64,
            });
        }
        let position = HEADER_SIZE + index as usize * self.byte_mode.width();
        Offset::read(self.byte_mode, data, position)
    }

    /// Encode the fixed header followed by `segment_offsets`
    ///
    /// The number of offsets must equal `segment_count`.
    pub fn encode(
        &self,
        writer: &mut ModuleWriter,
        segment_offsets: &[Offset],
    ) -> Result<(), ModuleError> {
        if writer.mode() != self.byte_mode {
            return Err(ModuleError::ByteModeMismatch {
                expected: self.byte_mode,
                actual: writer.mode(),
            });
        }
        if segment_offsets.len() != self.segment_count as usize {
            return Err(ModuleError::IndexOutOfRange {
                kind: IndexKind::Segment,
                index: segment_offsets.len() as u64,
                count: self.segment_count as u64,
            });
        }
        writer.emit_bytes(&self.magic);
        writer.emit_u32(self.major);
        writer.emit_u32(self.minor);
        writer.emit_u8(self.byte_mode.to_raw());
        writer.emit_u8(self.segment_count);
        writer.emit_u16(0);
        for offset in segment_offsets {
            writer.emit_offset(*offset)?;
        }
        Ok(())
    }
}

//! String table
//!
//! The string-table segment holds a `u32` count, `count` offsets, then the
//! string blob. Each offset is relative to the start of the blob and points at
//! a NUL-terminated byte string.

use crate::error::{IndexKind, ModuleError, TableKind};
use crate::header::Header;
use crate::offset::{ByteMode, Offset};
use crate::reader::ModuleReader;
use crate::segment::{segment_start, SegmentKind};
use std::fmt;

/// Size of the string count prefix
pub const STRING_TABLE_PREFIX: usize = 4;

/// Terminator of every string in the blob
pub const STRING_TERMINATOR: u8 = 0;

/// Index of a string in the string table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StringIndex(pub u32);

impl fmt::Display for StringIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parsed string table
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
    mode: ByteMode,
    start: usize,
    count: u32,
}

impl<'a> StringTable<'a> {
    /// Parse the string table of the module in `data`
    pub fn parse(data: &'a [u8], header: &Header) -> Result<Self, ModuleError> {
        let start = segment_start(data, header, SegmentKind::StringTable.index())?;

        let mut reader = ModuleReader::new(data, start, header.byte_mode);
        let count = reader.read_u32().map_err(|_| ModuleError::TableOverflowsBuffer {
            table: TableKind::StringTable,
            start,
            required: STRING_TABLE_PREFIX,
            len: data.len(),
        })?;

        let table = Self {
            data,
            mode: header.byte_mode,
            start,
            count,
        };
        let required = table.table_size()?;
        if start
            .checked_add(required)
            .map_or(true, |end| end > data.len())
        {
            return Err(ModuleError::TableOverflowsBuffer {
                table: TableKind::StringTable,
                start,
                required,
                len: data.len(),
            });
        }

        log::debug!("string table at {:#x} with {} strings", start, count);
        Ok(table)
    }

    fn table_size(&self) -> Result<usize, ModuleError> {
        let offsets = self.mode.table_size(self.count as usize)?;
        STRING_TABLE_PREFIX
            .checked_add(offsets)
            .ok_or(ModuleError::OffsetOutOfRange {
                offset: offsets as u64,
                limit: usize::MAX as u64,
            })
    }

    /// Number of strings
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Whether the table has no strings
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Position of the string-table segment
    pub fn start(&self) -> usize {
        self.start
    }

    /// Position of the string blob
    pub fn blob_start(&self) -> usize {
        // Bounded by `parse`.
        self.start + STRING_TABLE_PREFIX + self.count as usize * self.mode.width()
    }

    /// Position of the first byte of string `index`
    pub fn string_start(&self, index: StringIndex) -> Result<usize, ModuleError> {
        if index.0 >= self.count {
            return Err(ModuleError::IndexOutOfRange {
                kind: IndexKind::String,
                index: index.0 as u64,
                count: self.count as u64,
            });
        }
        let slot = self.start + STRING_TABLE_PREFIX + index.0 as usize * self.mode.width();
        let relative = Offset::read(self.mode, self.data, slot)?.to_size()?;
        let position = self
            .blob_start()
            .checked_add(relative)
            .filter(|&position| position < self.data.len())
            .ok_or(ModuleError::OffsetOutOfRange {
                offset: (self.blob_start() as u64).saturating_add(relative as u64),
                limit: self.data.len() as u64,
            })?;
        Ok(position)
    }

    /// Bytes of string `index`, without the terminator
    pub fn get(&self, index: StringIndex) -> Result<&'a [u8], ModuleError> {
        self.locate(index).map(|(_, bytes)| bytes)
    }

    /// String `index` as UTF-8
    pub fn get_str(&self, index: StringIndex) -> Result<&'a str, ModuleError> {
        let (start, bytes) = self.locate(index)?;
        std::str::from_utf8(bytes).map_err(|_| ModuleError::InvalidUtf8 {
            index: index.0,
            start,
        })
    }

    fn locate(&self, index: StringIndex) -> Result<(usize, &'a [u8]), ModuleError> {
        let start = self.string_start(index)?;
        let rest = &self.data[start..];
        let len = rest
            .iter()
            .position(|&b| b == STRING_TERMINATOR)
            .ok_or(ModuleError::UnterminatedString {
                index: index.0,
                start,
            })?;
        Ok((start, &rest[..len]))
    }

    /// Iterate over all strings in index order
    pub fn iter(&self) -> impl Iterator<Item = (StringIndex, Result<&'a [u8], ModuleError>)> + 'a {
        let table = *self;
        (0..self.count).map(move |i| (StringIndex(i), table.get(StringIndex(i))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ModuleWriter;

    /// Module whose only segment-table entries point every well-known segment
    /// at the string table.
    fn module(mode: ByteMode, relative: &[usize], blob: &[u8]) -> Vec<u8> {
        let header = Header::new(mode, 3);
        let zero = Offset::from_size(mode, 0).unwrap();
        let mut writer = ModuleWriter::new(mode);
        header.encode(&mut writer, &[zero, zero, zero]).unwrap();
        writer.emit_u32(relative.len() as u32);
        for &value in relative {
            writer.emit_size(value).unwrap();
        }
        writer.emit_bytes(blob);
        writer.into_bytes()
    }

    #[test]
    fn test_lookup_strings() {
        for mode in [ByteMode::Narrow, ByteMode::Wide] {
            let data = module(mode, &[0, 4, 8], b"foo\0bar\0\0");
            let (header, _) = Header::parse(&data).unwrap();
            let table = StringTable::parse(&data, &header).unwrap();
            assert_eq!(table.len(), 3);
            assert_eq!(table.get(StringIndex(0)), Ok(&b"foo"[..]));
            assert_eq!(table.get_str(StringIndex(1)), Ok("bar"));
            assert_eq!(table.get_str(StringIndex(2)), Ok(""));
        }
    }

    #[test]
    fn test_index_out_of_range() {
        let data = module(ByteMode::Narrow, &[0], b"x\0");
        let (header, _) = Header::parse(&data).unwrap();
        let table = StringTable::parse(&data, &header).unwrap();
        for index in [1, 2, u32::MAX] {
            assert_eq!(
                table.get(StringIndex(index)),
                Err(ModuleError::IndexOutOfRange {
                    kind: IndexKind::String,
                    index: index as u64,
                    count: 1,
                })
            );
        }
    }

    #[test]
    fn test_missing_string_table_segment() {
        let header = Header::new(ByteMode::Narrow, 2);
        let zero = Offset::from_size(ByteMode::Narrow, 0).unwrap();
        let mut writer = ModuleWriter::new(ByteMode::Narrow);
        header.encode(&mut writer, &[zero, zero]).unwrap();
        let data = writer.into_bytes();
        assert!(matches!(
            StringTable::parse(&data, &header),
            Err(ModuleError::IndexOutOfRange {
                kind: IndexKind::Segment,
                index: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_count_prefix_overflows() {
        let mut data = module(ByteMode::Narrow, &[], b"");
        data.truncate(data.len() - 2);
        let (header, _) = Header::parse(&data).unwrap();
        assert!(matches!(
            StringTable::parse(&data, &header),
            Err(ModuleError::TableOverflowsBuffer {
                table: TableKind::StringTable,
                required: STRING_TABLE_PREFIX,
                ..
            })
        ));
    }

    #[test]
    fn test_offset_array_overflows() {
        let mut data = module(ByteMode::Wide, &[0], b"");
        // Claim a second string whose offset is missing.
        let count_at = data.len() - 12;
        data[count_at..count_at + 4].copy_from_slice(&2u32.to_le_bytes());
        let (header, _) = Header::parse(&data).unwrap();
        assert!(matches!(
            StringTable::parse(&data, &header),
            Err(ModuleError::TableOverflowsBuffer { required: 20, .. })
        ));
    }

    #[test]
    fn test_string_start_past_end() {
        let data = module(ByteMode::Narrow, &[0, 100], b"a\0");
        let (header, _) = Header::parse(&data).unwrap();
        let table = StringTable::parse(&data, &header).unwrap();
        assert!(table.get(StringIndex(0)).is_ok());
        assert!(matches!(
            table.get(StringIndex(1)),
            Err(ModuleError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let data = module(ByteMode::Narrow, &[0, 2], b"a\0bc");
        let (header, _) = Header::parse(&data).unwrap();
        let table = StringTable::parse(&data, &header).unwrap();
        let start = table.string_start(StringIndex(1)).unwrap();
        assert_eq!(
            table.get(StringIndex(1)),
            Err(ModuleError::UnterminatedString { index: 1, start })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let data = module(ByteMode::Narrow, &[0], b"\xff\xfe\0");
        let (header, _) = Header::parse(&data).unwrap();
        let table = StringTable::parse(&data, &header).unwrap();
        assert_eq!(table.get(StringIndex(0)), Ok(&b"\xff\xfe"[..]));
        assert!(matches!(
            table.get_str(StringIndex(0)),
            Err(ModuleError::InvalidUtf8 { index: 0, .. })
        ));
    }

    #[test]
    fn test_iter() {
        let data = module(ByteMode::Narrow, &[2, 0], b"b\0a\0");
        let (header, _) = Header::parse(&data).unwrap();
        let table = StringTable::parse(&data, &header).unwrap();
        let strings: Vec<_> = table.iter().map(|(i, s)| (i.0, s.unwrap())).collect();
        assert_eq!(strings, vec![(0, &b"a"[..]), (1, &b"b"[..])]);
    }
}

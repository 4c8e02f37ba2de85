//! Segment resolution
//!
//! A segment starts at `header_size + segment_table[index]`, where
//! `header_size` covers the fixed header and the segment table. Segments carry
//! no explicit length. Ordered by `(start, index)`, each segment ends where its
//! successor starts, and the last one at the end of the module; of two
//! segments sharing a start, the lower index is therefore empty.

use crate::error::ModuleError;
use crate::header::Header;
use std::fmt;
use std::ops::Range;

/// Number of segment indices with a defined meaning
pub const WELL_KNOWN_SEGMENTS: u8 = 5;

/// Well-known segment indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SegmentKind {
    /// Symbols defined by this module
    ExportTable = 0,
    /// Symbols this module expects from others
    ImportTable = 1,
    /// String table
    StringTable = 2,
    /// Static data
    Data = 3,
    /// Bytecode
    Code = 4,
}

impl SegmentKind {
    /// All well-known segments in index order
    pub const ALL: [SegmentKind; 5] = [
        SegmentKind::ExportTable,
        SegmentKind::ImportTable,
        SegmentKind::StringTable,
        SegmentKind::Data,
        SegmentKind::Code,
    ];

    /// Segment-table index
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Well-known segment at `index`, if any
    ///
    /// Indices from [`WELL_KNOWN_SEGMENTS`] upwards are reserved.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::ExportTable => "export",
            SegmentKind::ImportTable => "import",
            SegmentKind::StringTable => "strings",
            SegmentKind::Data => "data",
            SegmentKind::Code => "code",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved segment
///
/// `start..end` is always within the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Segment-table index
    pub index: u8,
    /// First byte of the segment
    pub start: usize,
    /// Start of the successor segment, or the module length
    pub end: usize,
    bytes: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Well-known kind, if the index has one
    pub fn kind(&self) -> Option<SegmentKind> {
        SegmentKind::from_index(self.index)
    }

    /// Segment bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Byte range within the module
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Segment length
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the segment has no bytes
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Start position of segment `index`
///
/// Fails with `IndexOutOfRange` for indices beyond the segment table, and with
/// `OffsetOutOfRange` when the start lies past the end of `data`.
pub fn segment_start(data: &[u8], header: &Header, index: u8) -> Result<usize, ModuleError> {
    let value = header.segment_offset(data, index)?.to_size()?;
    let start = header
        .encoded_len()
        .checked_add(value)
        .ok_or(ModuleError::OffsetOutOfRange {
            offset: value as u64,
            limit: data.len() as u64,
        })?;
    if start > data.len() {
        return Err(ModuleError::OffsetOutOfRange {
            offset: start as u64,
            limit: data.len() as u64,
        });
    }
    log::trace!("segment {} starts at {:#x}", index, start);
    Ok(start)
}

/// Resolve segment `index` of the module in `data`
pub fn get_segment<'a>(
    data: &'a [u8],
    header: &Header,
    index: u8,
) -> Result<Segment<'a>, ModuleError> {
    let start = segment_start(data, header, index)?;

    // Segments without a valid start cannot bound anyone else.
    let end = (0..header.segment_count)
        .filter(|&other| other != index)
        .filter_map(|other| Some((segment_start(data, header, other).ok()?, other)))
        .filter(|&successor| successor > (start, index))
        .map(|(other_start, _)| other_start)
        .min()
        .unwrap_or(data.len());

    Ok(Segment {
        index,
        start,
        end,
        bytes: &data[start..end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::{ByteMode, Offset};
    use crate::writer::ModuleWriter;

    fn module(mode: ByteMode, offsets: &[usize], body: usize) -> Vec<u8> {
        let header = Header::new(mode, offsets.len() as u8);
        let offsets: Vec<Offset> = offsets
            .iter()
            .map(|&value| Offset::from_size(mode, value).unwrap())
            .collect();
        let mut writer = ModuleWriter::new(mode);
        header.encode(&mut writer, &offsets).unwrap();
        for i in 0..body {
            writer.emit_u8(i as u8);
        }
        writer.into_bytes()
    }

    #[test]
    fn test_no_segments() {
        let data = module(ByteMode::Narrow, &[], 0);
        let (header, _) = Header::parse(&data).unwrap();
        for index in 0..=u8::MAX {
            assert!(matches!(
                get_segment(&data, &header, index),
                Err(ModuleError::IndexOutOfRange { count: 0, .. })
            ));
        }
    }

    #[test]
    fn test_start_is_relative_to_header_end() {
        let data = module(ByteMode::Wide, &[0, 4, 10], 12);
        let (header, header_size) = Header::parse(&data).unwrap();
        assert_eq!(header_size, 16 + 3 * 8);

        let first = get_segment(&data, &header, 0).unwrap();
        assert_eq!(first.range(), header_size..header_size + 4);
        assert_eq!(first.bytes(), &[0, 1, 2, 3]);
        assert_eq!(first.kind(), Some(SegmentKind::ExportTable));

        let last = get_segment(&data, &header, 2).unwrap();
        assert_eq!(last.range(), header_size + 10..data.len());
        assert_eq!(last.len(), 2);
    }

    #[test]
    fn test_unsorted_and_shared_starts() {
        let data = module(ByteMode::Narrow, &[6, 0, 6, 3], 8);
        let (header, header_size) = Header::parse(&data).unwrap();

        let second = get_segment(&data, &header, 1).unwrap();
        assert_eq!(second.range(), header_size..header_size + 3);

        // Of two segments sharing a start, the lower index is empty.
        let first = get_segment(&data, &header, 0).unwrap();
        assert!(first.is_empty());
        assert_eq!(first.start, header_size + 6);
        let third = get_segment(&data, &header, 2).unwrap();
        assert_eq!(third.range(), header_size + 6..data.len());
        assert_eq!(
            get_segment(&data, &header, 3).unwrap().range(),
            header_size + 3..header_size + 6
        );
    }

    #[test]
    fn test_start_past_end_rejected() {
        let data = module(ByteMode::Narrow, &[0, 9], 4);
        let (header, header_size) = Header::parse(&data).unwrap();
        assert_eq!(
            get_segment(&data, &header, 1),
            Err(ModuleError::OffsetOutOfRange {
                offset: (header_size + 9) as u64,
                limit: data.len() as u64,
            })
        );
        // The broken segment does not affect the valid one.
        assert_eq!(get_segment(&data, &header, 0).unwrap().end, data.len());
    }

    #[test]
    fn test_empty_segment_at_end() {
        let data = module(ByteMode::Narrow, &[2], 2);
        let (header, _) = Header::parse(&data).unwrap();
        let segment = get_segment(&data, &header, 0).unwrap();
        assert!(segment.is_empty());
        assert_eq!(segment.start, data.len());
    }

    #[test]
    fn test_reserved_indices_have_no_kind() {
        assert_eq!(SegmentKind::from_index(2), Some(SegmentKind::StringTable));
        assert_eq!(SegmentKind::from_index(WELL_KNOWN_SEGMENTS), None);
        for kind in SegmentKind::ALL {
            assert_eq!(SegmentKind::from_index(kind.index()), Some(kind));
        }
    }
}

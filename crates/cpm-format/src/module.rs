//! Validated module view

use crate::error::ModuleError;
use crate::header::Header;
use crate::offset::ByteMode;
use crate::segment::{get_segment, Segment, SegmentKind};
use crate::stringtab::{StringIndex, StringTable};
use crate::symbol::{Symbol, Symbols};
use crate::types::{ResolvedType, TypeDescriptor};

/// Counts gathered by [`Module::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleStats {
    /// Resolved segments
    pub segments: usize,
    /// Strings in the string table
    pub strings: u32,
    /// Records in the export table
    pub exports: usize,
    /// Records in the import table
    pub imports: usize,
}

/// A module whose header has been validated
///
/// Borrows the caller's buffer; the byte mode is fixed by the header and used
/// for every offset read through this view.
#[derive(Debug, Clone, Copy)]
pub struct Module<'a> {
    data: &'a [u8],
    header: Header,
    header_size: usize,
}

impl<'a> Module<'a> {
    /// Validate the header of `data`
    pub fn parse(data: &'a [u8]) -> Result<Self, ModuleError> {
        let (header, header_size) = Header::parse(data)?;
        Ok(Self {
            data,
            header,
            header_size,
        })
    }

    /// Module bytes
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Validated header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Size of the header including the segment table
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Offset width of this module
    pub fn byte_mode(&self) -> ByteMode {
        self.header.byte_mode
    }

    /// Resolve segment `index`
    pub fn segment(&self, index: u8) -> Result<Segment<'a>, ModuleError> {
        get_segment(self.data, &self.header, index)
    }

    /// Resolve a well-known segment
    pub fn well_known_segment(&self, kind: SegmentKind) -> Result<Segment<'a>, ModuleError> {
        self.segment(kind.index())
    }

    /// Resolve every segment in table order
    pub fn segments(&self) -> impl Iterator<Item = Result<Segment<'a>, ModuleError>> + 'a {
        let module = *self;
        (0..self.header.segment_count).map(move |index| module.segment(index))
    }

    /// Parse the string table
    pub fn string_table(&self) -> Result<StringTable<'a>, ModuleError> {
        StringTable::parse(self.data, &self.header)
    }

    /// Decode the symbol record at `position`
    pub fn read_symbol(&self, position: usize) -> Result<(Symbol<'a>, usize), ModuleError> {
        Symbol::read(self.data, position, self.header.byte_mode)
    }

    /// Iterate over the symbol records packed in a segment
    pub fn symbols(&self, kind: SegmentKind) -> Result<Symbols<'a>, ModuleError> {
        let segment = self.well_known_segment(kind)?;
        Ok(Symbols::new(self.data, segment.range(), self.header.byte_mode))
    }

    /// Resolve a type descriptor's names through `strings`
    pub fn resolve_type(
        &self,
        strings: &StringTable<'a>,
        descriptor: &TypeDescriptor,
    ) -> Result<ResolvedType<'a>, ModuleError> {
        if descriptor.is_builtin() {
            return Ok(ResolvedType::Builtin(descriptor.builtin));
        }
        Ok(ResolvedType::Class {
            module: strings.get(descriptor.module_name)?,
            class: strings.get(descriptor.class_name)?,
        })
    }

    /// Shorthand for looking up one string
    pub fn string(&self, index: StringIndex) -> Result<&'a [u8], ModuleError> {
        self.string_table()?.get(index)
    }

    /// Walk every structure reachable from the header
    ///
    /// Resolves all segments, all strings, and every export and import record
    /// together with the names it references, type names included. Well-known segments missing from
    /// a short segment table are skipped. Stops at the first error.
    pub fn validate(&self) -> Result<ModuleStats, ModuleError> {
        let mut stats = ModuleStats::default();
        for segment in self.segments() {
            segment?;
            stats.segments += 1;
        }

        let present = |kind: SegmentKind| kind.index() < self.header.segment_count;
        let strings = if present(SegmentKind::StringTable) {
            let strings = self.string_table()?;
            for (_, value) in strings.iter() {
                value?;
            }
            stats.strings = strings.len();
            Some(strings)
        } else {
            None
        };

        for kind in [SegmentKind::ExportTable, SegmentKind::ImportTable] {
            if !present(kind) {
                continue;
            }
            let mut count = 0;
            for record in self.symbols(kind)? {
                let (_, symbol) = record?;
                if let Some(strings) = &strings {
                    self.check_names(strings, &symbol)?;
                }
                count += 1;
            }
            match kind {
                SegmentKind::ExportTable => stats.exports = count,
                _ => stats.imports = count,
            }
        }

        log::debug!(
            "module valid: {} segments, {} strings, {} exports, {} imports",
            stats.segments,
            stats.strings,
            stats.exports,
            stats.imports
        );
        Ok(stats)
    }

    /// Look up every string a record references, including its type names
    fn check_names(
        &self,
        strings: &StringTable<'a>,
        symbol: &Symbol<'a>,
    ) -> Result<(), ModuleError> {
        strings.get(symbol.name())?;
        if let Some(owner) = symbol.owner() {
            strings.get(owner)?;
        }
        match symbol {
            Symbol::Attribute(attr) => {
                self.resolve_type(strings, &attr.ty)?;
            }
            Symbol::Class(_) => {}
            Symbol::Function(func) => {
                self.resolve_type(strings, &func.return_type)?;
                for param in func.params.iter() {
                    self.resolve_type(strings, &param)?;
                }
            }
        }
        Ok(())
    }
}

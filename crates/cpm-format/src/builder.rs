//! In-memory module construction
//!
//! The builder lays segments out back to back after the header, in index
//! order: export table, import table, string table, data, code, then any extra
//! segments.

use crate::error::{IndexKind, ModuleError};
use crate::header::Header;
use crate::offset::{ByteMode, Offset};
use crate::segment::WELL_KNOWN_SEGMENTS;
use crate::stringtab::{StringIndex, STRING_TERMINATOR};
use crate::symbol::{FunctionDef, Symbol};
use crate::writer::ModuleWriter;
use rustc_hash::FxHashMap;

/// Builds a well-formed module
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    mode: ByteMode,
    strings: Vec<String>,
    string_index: FxHashMap<String, StringIndex>,
    exports: ModuleWriter,
    imports: ModuleWriter,
    data: Vec<u8>,
    code: Vec<u8>,
    extra: Vec<Vec<u8>>,
}

impl ModuleBuilder {
    /// Create a builder for a module with the given offset width
    pub fn new(mode: ByteMode) -> Self {
        Self {
            mode,
            strings: Vec::new(),
            string_index: FxHashMap::default(),
            exports: ModuleWriter::new(mode),
            imports: ModuleWriter::new(mode),
            data: Vec::new(),
            code: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Offset width of the module being built
    pub fn mode(&self) -> ByteMode {
        self.mode
    }

    /// Add a string to the string table, reusing an existing entry
    pub fn intern(&mut self, value: &str) -> Result<StringIndex, ModuleError> {
        if let Some(&index) = self.string_index.get(value) {
            return Ok(index);
        }
        if value.as_bytes().contains(&STRING_TERMINATOR) {
            return Err(ModuleError::EmbeddedNul(value.to_string()));
        }
        let index = StringIndex(u32::try_from(self.strings.len()).map_err(|_| {
            ModuleError::IndexOutOfRange {
                kind: IndexKind::String,
                index: self.strings.len() as u64,
                count: u32::MAX as u64,
            }
        })?);
        self.strings.push(value.to_string());
        self.string_index.insert(value.to_string(), index);
        Ok(index)
    }

    /// Append a record to the export table
    pub fn export(&mut self, symbol: &Symbol<'_>) -> Result<(), ModuleError> {
        symbol.encode(&mut self.exports)
    }

    /// Append a function record to the export table
    pub fn export_function(&mut self, def: &FunctionDef) -> Result<(), ModuleError> {
        def.encode(&mut self.exports)
    }

    /// Append a record to the import table
    pub fn import(&mut self, symbol: &Symbol<'_>) -> Result<(), ModuleError> {
        symbol.encode(&mut self.imports)
    }

    /// Append a function record to the import table
    pub fn import_function(&mut self, def: &FunctionDef) -> Result<(), ModuleError> {
        def.encode(&mut self.imports)
    }

    /// Set the data segment contents
    pub fn data_segment(&mut self, bytes: &[u8]) {
        self.data = bytes.to_vec();
    }

    /// Set the code segment contents
    pub fn code_segment(&mut self, bytes: &[u8]) {
        self.code = bytes.to_vec();
    }

    /// Append a segment after the well-known ones; returns its index
    pub fn push_segment(&mut self, bytes: &[u8]) -> Result<u8, ModuleError> {
        // The segment count is a u8, so the last usable index is 254.
        let index = WELL_KNOWN_SEGMENTS as usize + self.extra.len();
        let index = u8::try_from(index)
            .ok()
            .filter(|&index| index < u8::MAX)
            .ok_or(ModuleError::IndexOutOfRange {
                kind: IndexKind::Segment,
                index: index as u64,
                count: u8::MAX as u64,
            })?;
        self.extra.push(bytes.to_vec());
        Ok(index)
    }

    fn string_table(&self) -> Result<Vec<u8>, ModuleError> {
        let mut writer = ModuleWriter::new(self.mode);
        writer.emit_u32(self.strings.len() as u32);
        let mut relative = 0usize;
        for value in &self.strings {
            writer.emit_size(relative)?;
            relative += value.len() + 1;
        }
        for value in &self.strings {
            writer.emit_bytes(value.as_bytes());
            writer.emit_u8(STRING_TERMINATOR);
        }
        Ok(writer.into_bytes())
    }

    /// Encode the module
    pub fn build(&self) -> Result<Vec<u8>, ModuleError> {
        let strings = self.string_table()?;
        let mut segments: Vec<&[u8]> = vec![
            self.exports.buffer(),
            self.imports.buffer(),
            strings.as_slice(),
            self.data.as_slice(),
            self.code.as_slice(),
        ];
        segments.extend(self.extra.iter().map(Vec::as_slice));

        let mut offsets = Vec::with_capacity(segments.len());
        let mut relative = 0usize;
        for segment in &segments {
            offsets.push(Offset::from_size(self.mode, relative)?);
            relative += segment.len();
        }

        // push_segment keeps the count within u8
        let header = Header::new(self.mode, segments.len() as u8);
        let mut writer = ModuleWriter::with_capacity(self.mode, header.encoded_len() + relative);
        header.encode(&mut writer, &offsets)?;
        for segment in &segments {
            writer.emit_bytes(segment);
        }

        log::debug!(
            "built {} module: {} segments, {} strings, {} bytes",
            self.mode,
            segments.len(),
            self.strings.len(),
            writer.len()
        );
        Ok(writer.into_bytes())
    }
}

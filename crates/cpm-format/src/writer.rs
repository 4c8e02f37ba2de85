//! Growable little-endian buffer for constructing modules

use crate::error::ModuleError;
use crate::offset::{ByteMode, Offset};

/// Module writer for encoding fields
///
/// Offsets are emitted with the writer's byte mode only; an offset created
/// for the other mode is rejected.
#[derive(Debug, Clone)]
pub struct ModuleWriter {
    buffer: Vec<u8>,
    mode: ByteMode,
}

impl ModuleWriter {
    /// Create an empty writer
    pub fn new(mode: ByteMode) -> Self {
        Self {
            buffer: Vec::new(),
            mode,
        }
    }

    /// Create an empty writer with capacity
    pub fn with_capacity(mode: ByteMode, capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            mode,
        }
    }

    /// Byte mode used for offsets
    pub fn mode(&self) -> ByteMode {
        self.mode
    }

    /// Bytes written so far
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Current length
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing was written yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit unsigned integer
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit an offset
    pub fn emit_offset(&mut self, offset: Offset) -> Result<(), ModuleError> {
        let position = self.buffer.len();
        self.buffer.resize(position + self.mode.width(), 0);
        if let Err(err) = offset.write(self.mode, &mut self.buffer, position) {
            self.buffer.truncate(position);
            return Err(err);
        }
        Ok(())
    }

    /// Emit a native size as an offset
    pub fn emit_size(&mut self, size: usize) -> Result<(), ModuleError> {
        let offset = Offset::from_size(self.mode, size)?;
        self.emit_offset(offset)
    }
}

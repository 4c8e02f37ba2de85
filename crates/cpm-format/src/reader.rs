//! Bounds-checked cursor over module bytes
//!
//! All fields are little-endian. Every read checks the remaining length first
//! and leaves the position unchanged on failure.

use crate::error::ModuleError;
use crate::offset::{field, ByteMode, Offset};

/// Cursor reading fixed-width fields from a module buffer
#[derive(Debug, Clone)]
pub struct ModuleReader<'a> {
    buffer: &'a [u8],
    position: usize,
    mode: ByteMode,
}

impl<'a> ModuleReader<'a> {
    /// Create a reader at `position` using `mode` for offset fields
    pub fn new(buffer: &'a [u8], position: usize, mode: ByteMode) -> Self {
        Self {
            buffer,
            position,
            mode,
        }
    }

    /// Current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte mode used for offset fields
    pub fn mode(&self) -> ByteMode {
        self.mode
    }

    /// Bytes left after the current position
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, ModuleError> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    /// Read a 32-bit unsigned integer
    pub fn read_u32(&mut self) -> Result<u32, ModuleError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }

    /// Read an offset of the reader's byte mode
    pub fn read_offset(&mut self) -> Result<Offset, ModuleError> {
        let offset = Offset::read(self.mode, self.buffer, self.position)?;
        self.position += self.mode.width();
        Ok(offset)
    }

    /// Read `count` raw bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ModuleError> {
        self.take(count)
    }

    /// Read a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ModuleError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ModuleError> {
        let bytes = field(self.buffer, self.position, count)?;
        self.position += count;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fields() {
        let buffer = [
            0x07, // u8
            0x01, 0x02, 0x03, 0x04, // u32
            0x10, 0x00, 0x00, 0x00, // narrow offset
        ];
        let mut reader = ModuleReader::new(&buffer, 0, ByteMode::Narrow);
        assert_eq!(reader.read_u8(), Ok(7));
        assert_eq!(reader.read_u32(), Ok(0x0403_0201));
        assert_eq!(reader.read_offset().unwrap().get(), 0x10);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let buffer = [0u8; 6];
        let mut reader = ModuleReader::new(&buffer, 2, ByteMode::Wide);
        assert!(reader.read_offset().is_err());
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u32(), Ok(0));
        assert!(reader.read_u8().is_err());
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn test_read_array_and_bytes() {
        let buffer = *b"abcdef";
        let mut reader = ModuleReader::new(&buffer, 0, ByteMode::Narrow);
        assert_eq!(reader.read_array::<2>(), Ok(*b"ab"));
        assert_eq!(reader.read_bytes(3), Ok(&b"cde"[..]));
        assert!(reader.read_bytes(2).is_err());
    }

    #[test]
    fn test_position_past_end() {
        let buffer = [0u8; 4];
        let mut reader = ModuleReader::new(&buffer, 10, ByteMode::Narrow);
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(
            reader.read_u8(),
            Err(ModuleError::OffsetOutOfRange { offset: 11, limit: 4 })
        ));
    }
}

//! Dual-width offsets
//!
//! Every address and size field in a module is an offset whose width is chosen
//! once per module by the header's byte mode: 4 bytes in narrow (32-bit) mode,
//! 8 bytes in wide (64-bit) mode. The width is not stored next to the value, so
//! an [`Offset`] can only be produced by the mode-aware constructors here.

use crate::error::ModuleError;
use std::fmt;

/// Per-module selector for the width of every offset field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ByteMode {
    /// 32-bit offsets
    Narrow = 0,
    /// 64-bit offsets
    Wide = 1,
}

impl ByteMode {
    /// Decode the raw header byte
    pub fn from_raw(raw: u8) -> Result<Self, ModuleError> {
        match raw {
            0 => Ok(ByteMode::Narrow),
            1 => Ok(ByteMode::Wide),
            other => Err(ModuleError::InvalidByteMode(other)),
        }
    }

    /// Raw header byte for this mode
    pub const fn to_raw(self) -> u8 {
        self as u8
    }

    /// Width in bytes of one offset
    pub const fn width(self) -> usize {
        match self {
            ByteMode::Narrow => 4,
            ByteMode::Wide => 8,
        }
    }

    /// Size in bytes of an array of `count` offsets
    pub fn table_size(self, count: usize) -> Result<usize, ModuleError> {
        count
            .checked_mul(self.width())
            .ok_or(ModuleError::OffsetOutOfRange {
                offset: count as u64,
                limit: (usize::MAX / self.width()) as u64,
            })
    }
}

impl TryFrom<u8> for ByteMode {
    type Error = ModuleError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        ByteMode::from_raw(raw)
    }
}

impl fmt::Display for ByteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteMode::Narrow => f.write_str("32-bit"),
            ByteMode::Wide => f.write_str("64-bit"),
        }
    }
}

/// Width in bytes of an offset for a raw byte-mode value
pub fn width_of(raw_mode: u8) -> Result<usize, ModuleError> {
    ByteMode::from_raw(raw_mode).map(ByteMode::width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    Narrow(u32),
    Wide(u64),
}

/// An address or size field of a module
///
/// The representation always matches the [`ByteMode`] it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset(Repr);

impl Offset {
    /// Narrow a native size into an offset of the given mode
    pub fn from_size(mode: ByteMode, size: usize) -> Result<Self, ModuleError> {
        match mode {
            ByteMode::Narrow => u32::try_from(size)
                .map(|value| Offset(Repr::Narrow(value)))
                .map_err(|_| ModuleError::OffsetOutOfRange {
                    offset: size as u64,
                    limit: u32::MAX as u64,
                }),
            ByteMode::Wide => Ok(Offset(Repr::Wide(size as u64))),
        }
    }

    /// Widen or check an offset into a native size
    ///
    /// Fails only for wide offsets on hosts whose `usize` is narrower than
    /// 64 bits.
    pub fn to_size(self) -> Result<usize, ModuleError> {
        match self.0 {
            Repr::Narrow(value) => Ok(value as usize),
            Repr::Wide(value) => {
                usize::try_from(value).map_err(|_| ModuleError::OffsetOutOfRange {
                    offset: value,
                    limit: usize::MAX as u64,
                })
            }
        }
    }

    /// Offset of the given mode holding `value`
    pub fn from_u64(mode: ByteMode, value: u64) -> Result<Self, ModuleError> {
        match mode {
            ByteMode::Narrow => u32::try_from(value)
                .map(|value| Offset(Repr::Narrow(value)))
                .map_err(|_| ModuleError::OffsetOutOfRange {
                    offset: value,
                    limit: u32::MAX as u64,
                }),
            ByteMode::Wide => Ok(Offset(Repr::Wide(value))),
        }
    }

    /// Raw value, widened to 64 bits
    pub fn get(self) -> u64 {
        match self.0 {
            Repr::Narrow(value) => value as u64,
            Repr::Wide(value) => value,
        }
    }

    /// Byte mode this offset was created for
    pub fn mode(self) -> ByteMode {
        match self.0 {
            Repr::Narrow(_) => ByteMode::Narrow,
            Repr::Wide(_) => ByteMode::Wide,
        }
    }

    /// Read a little-endian offset at `position`
    pub fn read(mode: ByteMode, buffer: &[u8], position: usize) -> Result<Self, ModuleError> {
        let bytes = field(buffer, position, mode.width())?;
        let offset = match mode {
            ByteMode::Narrow => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                Offset(Repr::Narrow(u32::from_le_bytes(raw)))
            }
            ByteMode::Wide => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                Offset(Repr::Wide(u64::from_le_bytes(raw)))
            }
        };
        Ok(offset)
    }

    /// Write this offset little-endian at `position`
    ///
    /// `mode` is the byte mode of the module owning `buffer`; an offset of the
    /// other width is rejected rather than truncated or padded.
    pub fn write(
        self,
        mode: ByteMode,
        buffer: &mut [u8],
        position: usize,
    ) -> Result<(), ModuleError> {
        if self.mode() != mode {
            return Err(ModuleError::ByteModeMismatch {
                expected: mode,
                actual: self.mode(),
            });
        }
        let len = buffer.len();
        let end = position
            .checked_add(mode.width())
            .filter(|&end| end <= len)
            .ok_or_else(|| ModuleError::out_of_bounds(position.saturating_add(mode.width()), len))?;
        match self.0 {
            Repr::Narrow(value) => buffer[position..end].copy_from_slice(&value.to_le_bytes()),
            Repr::Wide(value) => buffer[position..end].copy_from_slice(&value.to_le_bytes()),
        }
        Ok(())
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.get())
    }
}

/// Bounds-checked view of `width` bytes at `position`
pub(crate) fn field(buffer: &[u8], position: usize, width: usize) -> Result<&[u8], ModuleError> {
    position
        .checked_add(width)
        .and_then(|end| buffer.get(position..end))
        .ok_or_else(|| ModuleError::out_of_bounds(position.saturating_add(width), buffer.len()))
}

//! Symbol records
//!
//! Records are packed little-endian with a `u32` kind tag first. `W` is the
//! offset width of the module.
//!
//! ```text
//! Attribute  tag | class_name | name | type (12) | value_offset (W)
//! Class      tag | name | object_size (W) | attr_start | attr_end
//! Function   tag | class_name | func_name | func_kind | return (12)
//!                | param_count | param types (12 each)
//! ```

use crate::error::{ModuleError, TableKind};
use crate::offset::{ByteMode, Offset};
use crate::reader::ModuleReader;
use crate::stringtab::StringIndex;
use crate::types::{BuiltinType, TypeDescriptor, TYPE_DESCRIPTOR_SIZE};
use crate::writer::ModuleWriter;
use std::fmt;
use std::ops::Range;

/// Symbol record discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SymbolKind {
    /// Class attribute
    Attribute = 1,
    /// Class
    Class = 2,
    /// Function or method
    Function = 3,
}

impl SymbolKind {
    /// Decode a record tag
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(SymbolKind::Attribute),
            2 => Some(SymbolKind::Class),
            3 => Some(SymbolKind::Function),
            _ => None,
        }
    }

    /// Record tag
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Size of the fixed part of a record of this kind
    pub const fn fixed_size(self, mode: ByteMode) -> usize {
        match self {
            SymbolKind::Attribute => 12 + TYPE_DESCRIPTOR_SIZE + mode.width(),
            SymbolKind::Class => 16 + mode.width(),
            SymbolKind::Function => 20 + TYPE_DESCRIPTOR_SIZE,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Attribute => f.write_str("attribute"),
            SymbolKind::Class => f.write_str("class"),
            SymbolKind::Function => f.write_str("function"),
        }
    }
}

/// Function kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FunctionKind(pub u32);

impl FunctionKind {
    /// Instance method
    pub const METHOD: FunctionKind = FunctionKind(0);
}

/// Attribute of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSymbol {
    /// Owning class
    pub class_name: StringIndex,
    /// Attribute name
    pub name: StringIndex,
    /// Declared type
    pub ty: TypeDescriptor,
    /// Position of the attribute's value
    pub value_offset: Offset,
}

/// Class definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSymbol {
    /// Class name
    pub name: StringIndex,
    /// Instance size in bytes
    pub object_size: Offset,
    /// First attribute index
    pub attr_start: u32,
    /// One past the last attribute index
    pub attr_end: u32,
}

impl ClassSymbol {
    /// Attribute indices owned by this class
    pub fn attributes(&self) -> Range<u32> {
        self.attr_start..self.attr_end
    }
}

/// Parameter types of a function, borrowed from the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamTypes<'a> {
    bytes: &'a [u8],
}

impl<'a> ParamTypes<'a> {
    /// Number of parameters
    pub fn len(&self) -> usize {
        self.bytes.len() / TYPE_DESCRIPTOR_SIZE
    }

    /// Whether the function takes no parameters
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Type of parameter `index`
    pub fn get(&self, index: usize) -> Option<TypeDescriptor> {
        let start = index.checked_mul(TYPE_DESCRIPTOR_SIZE)?;
        let chunk = self.bytes.get(start..start.checked_add(TYPE_DESCRIPTOR_SIZE)?)?;
        Some(descriptor_from_chunk(chunk))
    }

    /// Iterate over the parameter types
    pub fn iter(&self) -> impl Iterator<Item = TypeDescriptor> + 'a {
        self.bytes
            .chunks_exact(TYPE_DESCRIPTOR_SIZE)
            .map(descriptor_from_chunk)
    }

    /// Raw encoded parameter list
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

fn descriptor_from_chunk(chunk: &[u8]) -> TypeDescriptor {
    let word = |i: usize| u32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
    TypeDescriptor {
        builtin: BuiltinType(word(0)),
        module_name: StringIndex(word(4)),
        class_name: StringIndex(word(8)),
    }
}

/// Function or method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSymbol<'a> {
    /// Owning class
    pub class_name: StringIndex,
    /// Function name
    pub name: StringIndex,
    /// Function kind
    pub kind: FunctionKind,
    /// Return type
    pub return_type: TypeDescriptor,
    /// Parameter types
    pub params: ParamTypes<'a>,
}

/// Owned function definition, used when building modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Owning class
    pub class_name: StringIndex,
    /// Function name
    pub name: StringIndex,
    /// Function kind
    pub kind: FunctionKind,
    /// Return type
    pub return_type: TypeDescriptor,
    /// Parameter types
    pub params: Vec<TypeDescriptor>,
}

impl FunctionDef {
    /// Encode as a function record
    pub fn encode(&self, writer: &mut ModuleWriter) -> Result<(), ModuleError> {
        let count = param_count(self.params.len())?;
        encode_function_head(
            writer,
            self.class_name,
            self.name,
            self.kind,
            &self.return_type,
            count,
        );
        for param in &self.params {
            param.encode(writer);
        }
        Ok(())
    }
}

fn param_count(len: usize) -> Result<u32, ModuleError> {
    u32::try_from(len).map_err(|_| ModuleError::OffsetOutOfRange {
        offset: len as u64,
        limit: u32::MAX as u64,
    })
}

fn encode_function_head(
    writer: &mut ModuleWriter,
    class_name: StringIndex,
    name: StringIndex,
    kind: FunctionKind,
    return_type: &TypeDescriptor,
    param_count: u32,
) {
    writer.emit_u32(SymbolKind::Function.to_u32());
    writer.emit_u32(class_name.0);
    writer.emit_u32(name.0);
    writer.emit_u32(kind.0);
    return_type.encode(writer);
    writer.emit_u32(param_count);
}

/// A decoded symbol record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<'a> {
    /// Attribute record
    Attribute(AttributeSymbol),
    /// Class record
    Class(ClassSymbol),
    /// Function record
    Function(FunctionSymbol<'a>),
}

impl<'a> Symbol<'a> {
    /// Record kind
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Attribute(_) => SymbolKind::Attribute,
            Symbol::Class(_) => SymbolKind::Class,
            Symbol::Function(_) => SymbolKind::Function,
        }
    }

    /// Name of the symbol itself
    pub fn name(&self) -> StringIndex {
        match self {
            Symbol::Attribute(attr) => attr.name,
            Symbol::Class(class) => class.name,
            Symbol::Function(func) => func.name,
        }
    }

    /// Owning class, for attributes and functions
    pub fn owner(&self) -> Option<StringIndex> {
        match self {
            Symbol::Attribute(attr) => Some(attr.class_name),
            Symbol::Class(_) => None,
            Symbol::Function(func) => Some(func.class_name),
        }
    }

    /// Encoded size of this record
    pub fn encoded_len(&self, mode: ByteMode) -> usize {
        let fixed = self.kind().fixed_size(mode);
        match self {
            Symbol::Function(func) => fixed + func.params.as_bytes().len(),
            _ => fixed,
        }
    }

    /// Decode the record at `position`
    ///
    /// Returns the symbol and the position just past it. The fixed part of the
    /// record and the full parameter list are bounds-checked before any field
    /// is decoded.
    pub fn read(
        data: &'a [u8],
        position: usize,
        mode: ByteMode,
    ) -> Result<(Self, usize), ModuleError> {
        let mut reader = ModuleReader::new(data, position, mode);
        let tag = reader.read_u32()?;
        let kind = SymbolKind::from_u32(tag).ok_or(ModuleError::InvalidSymbolKind {
            kind: tag,
            position,
        })?;

        let fixed = kind.fixed_size(mode);
        if reader.remaining() + 4 < fixed {
            return Err(ModuleError::TableOverflowsBuffer {
                table: TableKind::SymbolRecord,
                start: position,
                required: fixed,
                len: data.len(),
            });
        }

        let symbol = match kind {
            SymbolKind::Attribute => Symbol::Attribute(AttributeSymbol {
                class_name: StringIndex(reader.read_u32()?),
                name: StringIndex(reader.read_u32()?),
                ty: TypeDescriptor::decode(&mut reader)?,
                value_offset: reader.read_offset()?,
            }),
            SymbolKind::Class => {
                let name = StringIndex(reader.read_u32()?);
                let object_size = reader.read_offset()?;
                let attr_start = reader.read_u32()?;
                let attr_end = reader.read_u32()?;
                if attr_start > attr_end {
                    return Err(ModuleError::InvalidAttributeRange {
                        start: attr_start,
                        end: attr_end,
                    });
                }
                Symbol::Class(ClassSymbol {
                    name,
                    object_size,
                    attr_start,
                    attr_end,
                })
            }
            SymbolKind::Function => {
                let class_name = StringIndex(reader.read_u32()?);
                let name = StringIndex(reader.read_u32()?);
                let kind = FunctionKind(reader.read_u32()?);
                let return_type = TypeDescriptor::decode(&mut reader)?;
                let count = reader.read_u32()?;

                let params_start = reader.position();
                let required = (count as usize)
                    .checked_mul(TYPE_DESCRIPTOR_SIZE)
                    .filter(|&size| size <= reader.remaining())
                    .ok_or(ModuleError::TableOverflowsBuffer {
                        table: TableKind::ParamTypes,
                        start: params_start,
                        required: (count as usize).saturating_mul(TYPE_DESCRIPTOR_SIZE),
                        len: data.len(),
                    })?;
                let bytes = reader.read_bytes(required)?;

                Symbol::Function(FunctionSymbol {
                    class_name,
                    name,
                    kind,
                    return_type,
                    params: ParamTypes { bytes },
                })
            }
        };

        log::trace!("{} symbol at {:#x}", kind, position);
        Ok((symbol, reader.position()))
    }

    /// Encode this record
    pub fn encode(&self, writer: &mut ModuleWriter) -> Result<(), ModuleError> {
        match self {
            Symbol::Attribute(attr) => {
                if attr.value_offset.mode() != writer.mode() {
                    return Err(ModuleError::ByteModeMismatch {
                        expected: writer.mode(),
                        actual: attr.value_offset.mode(),
                    });
                }
                writer.emit_u32(SymbolKind::Attribute.to_u32());
                writer.emit_u32(attr.class_name.0);
                writer.emit_u32(attr.name.0);
                attr.ty.encode(writer);
                writer.emit_offset(attr.value_offset)?;
            }
            Symbol::Class(class) => {
                if class.attr_start > class.attr_end {
                    return Err(ModuleError::InvalidAttributeRange {
                        start: class.attr_start,
                        end: class.attr_end,
                    });
                }
                if class.object_size.mode() != writer.mode() {
                    return Err(ModuleError::ByteModeMismatch {
                        expected: writer.mode(),
                        actual: class.object_size.mode(),
                    });
                }
                writer.emit_u32(SymbolKind::Class.to_u32());
                writer.emit_u32(class.name.0);
                writer.emit_offset(class.object_size)?;
                writer.emit_u32(class.attr_start);
                writer.emit_u32(class.attr_end);
            }
            Symbol::Function(func) => {
                let count = param_count(func.params.len())?;
                encode_function_head(
                    writer,
                    func.class_name,
                    func.name,
                    func.kind,
                    &func.return_type,
                    count,
                );
                writer.emit_bytes(func.params.as_bytes());
            }
        }
        Ok(())
    }
}

/// Iterator over symbol records packed back to back in a byte range
///
/// Stops at the end of the range, or after yielding the first error.
#[derive(Debug, Clone)]
pub struct Symbols<'a> {
    data: &'a [u8],
    position: usize,
    end: usize,
    mode: ByteMode,
    failed: bool,
}

impl<'a> Symbols<'a> {
    /// Iterate over the records in `data[range]`
    pub fn new(data: &'a [u8], range: Range<usize>, mode: ByteMode) -> Self {
        let end = range.end.min(data.len());
        Self {
            data: &data[..end],
            position: range.start,
            end,
            mode,
            failed: false,
        }
    }
}

impl<'a> Iterator for Symbols<'a> {
    type Item = Result<(usize, Symbol<'a>), ModuleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.end {
            return None;
        }
        let position = self.position;
        match Symbol::read(self.data, position, self.mode) {
            Ok((symbol, next)) => {
                self.position = next;
                Some(Ok((position, symbol)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

//! Type descriptors

use crate::error::ModuleError;
use crate::reader::ModuleReader;
use crate::stringtab::StringIndex;
use crate::writer::ModuleWriter;

/// Encoded size of a [`TypeDescriptor`] in any byte mode
pub const TYPE_DESCRIPTOR_SIZE: usize = 12;

/// Builtin type id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuiltinType(pub u32);

impl BuiltinType {
    /// Not a builtin; the descriptor names a class instead
    pub const NONE: BuiltinType = BuiltinType(0);

    /// Whether this id names a builtin type
    pub fn is_builtin(self) -> bool {
        self != Self::NONE
    }
}

/// Reference to a builtin type or to a class by name
///
/// For non-builtin types, `module_name` and `class_name` are string-table
/// indices naming where the class is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Builtin type id, [`BuiltinType::NONE`] for classes
    pub builtin: BuiltinType,
    /// Defining module name
    pub module_name: StringIndex,
    /// Class name
    pub class_name: StringIndex,
}

impl TypeDescriptor {
    /// Descriptor of a builtin type
    pub fn builtin(id: u32) -> Self {
        Self {
            builtin: BuiltinType(id),
            module_name: StringIndex(0),
            class_name: StringIndex(0),
        }
    }

    /// Descriptor of a class `class_name` defined in `module_name`
    pub fn class(module_name: StringIndex, class_name: StringIndex) -> Self {
        Self {
            builtin: BuiltinType::NONE,
            module_name,
            class_name,
        }
    }

    /// Whether this descriptor names a builtin
    pub fn is_builtin(&self) -> bool {
        self.builtin.is_builtin()
    }

    pub(crate) fn decode(reader: &mut ModuleReader<'_>) -> Result<Self, ModuleError> {
        let builtin = BuiltinType(reader.read_u32()?);
        let module_name = StringIndex(reader.read_u32()?);
        let class_name = StringIndex(reader.read_u32()?);
        Ok(Self {
            builtin,
            module_name,
            class_name,
        })
    }

    pub(crate) fn encode(&self, writer: &mut ModuleWriter) {
        writer.emit_u32(self.builtin.0);
        writer.emit_u32(self.module_name.0);
        writer.emit_u32(self.class_name.0);
    }
}

/// A type descriptor resolved against the string table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType<'a> {
    /// Builtin type id
    Builtin(BuiltinType),
    /// Class named through the string table
    Class {
        /// Defining module name
        module: &'a [u8],
        /// Class name
        class: &'a [u8],
    },
}

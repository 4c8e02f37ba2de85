//! CP module format
//!
//! This crate reads and validates `cpm` binary modules: the fixed header, the
//! segment table, the string table and the symbol records of the export and
//! import tables. All parsing works on a borrowed `&[u8]`, checks every bound
//! before reading and never panics on malformed input. A builder produces
//! well-formed modules for tooling and tests.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod error;
pub mod header;
pub mod module;
pub mod offset;
pub mod reader;
pub mod segment;
pub mod source;
pub mod stringtab;
pub mod symbol;
pub mod types;
pub mod version;
pub mod writer;

pub use builder::ModuleBuilder;
pub use error::{IndexKind, ModuleError, TableKind};
pub use header::{Header, HEADER_SIZE};
pub use module::{Module, ModuleStats};
pub use offset::{ByteMode, Offset};
pub use reader::ModuleReader;
pub use segment::{get_segment, Segment, SegmentKind};
pub use source::ModuleSource;
pub use stringtab::{StringIndex, StringTable};
pub use symbol::{
    AttributeSymbol, ClassSymbol, FunctionDef, FunctionKind, FunctionSymbol, ParamTypes, Symbol,
    SymbolKind, Symbols,
};
pub use types::{BuiltinType, ResolvedType, TypeDescriptor};
pub use version::{MAGIC, VERSION_MAJOR, VERSION_MINOR};
pub use writer::ModuleWriter;

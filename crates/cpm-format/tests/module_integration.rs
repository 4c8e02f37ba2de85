//! Integration tests for module reading

use cpm_format::{
    AttributeSymbol, ByteMode, ClassSymbol, FunctionDef, FunctionKind, IndexKind, Module,
    ModuleBuilder, ModuleError, ModuleSource, Offset, ResolvedType, SegmentKind, StringIndex,
    Symbol, TableKind, TypeDescriptor, MAGIC,
};
use std::io::Write;

const INT: u32 = 2;

/// `point` module exporting a `Point` class with two attributes and a method,
/// and importing `Vec` from `std`.
fn point_module(mode: ByteMode) -> Vec<u8> {
    let mut builder = ModuleBuilder::new(mode);
    let point = builder.intern("Point").unwrap();
    let x = builder.intern("x").unwrap();
    let y = builder.intern("y").unwrap();
    let norm = builder.intern("norm").unwrap();
    let std_name = builder.intern("std").unwrap();
    let vec = builder.intern("Vec").unwrap();
    let push = builder.intern("push").unwrap();

    builder
        .export(&Symbol::Class(ClassSymbol {
            name: point,
            object_size: Offset::from_size(mode, 16).unwrap(),
            attr_start: 0,
            attr_end: 2,
        }))
        .unwrap();
    for (name, at) in [(x, 0), (y, 8)] {
        builder
            .export(&Symbol::Attribute(AttributeSymbol {
                class_name: point,
                name,
                ty: TypeDescriptor::builtin(INT),
                value_offset: Offset::from_size(mode, at).unwrap(),
            }))
            .unwrap();
    }
    builder
        .export_function(&FunctionDef {
            class_name: point,
            name: norm,
            kind: FunctionKind::METHOD,
            return_type: TypeDescriptor::builtin(INT),
            params: vec![TypeDescriptor::class(std_name, vec)],
        })
        .unwrap();
    builder
        .import_function(&FunctionDef {
            class_name: vec,
            name: push,
            kind: FunctionKind::METHOD,
            return_type: TypeDescriptor::builtin(0),
            params: vec![],
        })
        .unwrap();
    builder.code_segment(&[0x01, 0x02, 0x03]);
    builder.build().unwrap()
}

fn raw_header(magic: [u8; 4], major: u32, mode: u8, segments: u8) -> Vec<u8> {
    let mut data = magic.to_vec();
    data.extend_from_slice(&major.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.push(mode);
    data.push(segments);
    data.extend_from_slice(&[0, 0]);
    data
}

#[test]
fn test_minimal_module_has_no_segments() {
    let data = raw_header(MAGIC, 0, 0, 0);
    assert_eq!(data.len(), 16);
    let module = Module::parse(&data).expect("minimal module should parse");
    for index in 0..=u8::MAX {
        assert!(matches!(
            module.segment(index),
            Err(ModuleError::IndexOutOfRange {
                kind: IndexKind::Segment,
                ..
            })
        ));
    }
}

#[test]
fn test_bad_magic_last_byte() {
    let data = raw_header([0x63, 0x70, 0x6d, 0x00], 0, 0, 0);
    assert!(matches!(
        Module::parse(&data),
        Err(ModuleError::BadMagic { .. })
    ));
}

#[test]
fn test_segment_table_past_end() {
    let mut data = raw_header(MAGIC, 0, 1, 1);
    data.extend_from_slice(&[0; 4]);
    assert_eq!(data.len(), 20);
    assert!(matches!(
        Module::parse(&data),
        Err(ModuleError::TableOverflowsBuffer {
            table: TableKind::SegmentTable,
            ..
        })
    ));
}

#[test]
fn test_unsupported_major_version() {
    let data = raw_header(MAGIC, 1, 0, 0);
    assert_eq!(
        Module::parse(&data).unwrap_err(),
        ModuleError::UnsupportedVersion { major: 1, minor: 0 }
    );
}

#[test]
fn test_every_truncation_fails_cleanly() {
    let data = point_module(ByteMode::Wide);
    for len in 0..data.len() {
        let truncated = &data[..len];
        let Ok(module) = Module::parse(truncated) else {
            continue;
        };
        // Whatever parses must not read past the truncated end.
        for segment in module.segments().flatten() {
            assert!(segment.end <= len);
        }
        if let Ok(strings) = module.string_table() {
            assert!(strings.iter().count() <= 7);
        }
        for kind in [SegmentKind::ExportTable, SegmentKind::ImportTable] {
            if let Ok(symbols) = module.symbols(kind) {
                assert!(symbols.count() <= 4);
            }
        }
    }
}

#[test]
fn test_exports_resolve_through_string_table() {
    for mode in [ByteMode::Narrow, ByteMode::Wide] {
        let data = point_module(mode);
        let module = Module::parse(&data).unwrap();
        assert_eq!(module.byte_mode(), mode);
        let strings = module.string_table().unwrap();
        assert_eq!(strings.len(), 7);

        let exports: Vec<Symbol<'_>> = module
            .symbols(SegmentKind::ExportTable)
            .unwrap()
            .map(|result| result.map(|(_, symbol)| symbol))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(exports.len(), 4);

        let Symbol::Class(class) = exports[0] else {
            panic!("expected class, got {:?}", exports[0]);
        };
        assert_eq!(strings.get_str(class.name), Ok("Point"));
        assert_eq!(class.object_size.to_size(), Ok(16));
        assert_eq!(class.attributes().len(), 2);

        let Symbol::Attribute(y) = exports[2] else {
            panic!("expected attribute, got {:?}", exports[2]);
        };
        assert_eq!(strings.get_str(y.name), Ok("y"));
        assert_eq!(y.value_offset.to_size(), Ok(8));
        assert_eq!(y.value_offset.mode(), mode);

        let Symbol::Function(norm) = exports[3] else {
            panic!("expected function, got {:?}", exports[3]);
        };
        assert_eq!(strings.get_str(norm.name), Ok("norm"));
        assert_eq!(
            module.resolve_type(&strings, &norm.return_type),
            Ok(ResolvedType::Builtin(cpm_format::BuiltinType(INT)))
        );
        let param = norm.params.get(0).unwrap();
        assert_eq!(
            module.resolve_type(&strings, &param),
            Ok(ResolvedType::Class {
                module: b"std",
                class: b"Vec",
            })
        );
    }
}

#[test]
fn test_imports_are_separate_from_exports() {
    let data = point_module(ByteMode::Narrow);
    let module = Module::parse(&data).unwrap();
    let imports: Vec<_> = module
        .symbols(SegmentKind::ImportTable)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(imports.len(), 1);
    let (position, symbol) = imports[0];
    assert_eq!(module.read_symbol(position).unwrap().0, symbol);
    assert_eq!(module.string(symbol.name()).unwrap(), b"push");
    assert_eq!(module.string(symbol.owner().unwrap()).unwrap(), b"Vec");

    let code = module.well_known_segment(SegmentKind::Code).unwrap();
    assert_eq!(code.bytes(), &[0x01, 0x02, 0x03]);
    assert_eq!(code.end, data.len());
    assert!(module.well_known_segment(SegmentKind::Data).unwrap().is_empty());
}

#[test]
fn test_empty_tables_yield_no_symbols() {
    let data = ModuleBuilder::new(ByteMode::Wide).build().unwrap();
    let module = Module::parse(&data).unwrap();
    assert_eq!(module.symbols(SegmentKind::ExportTable).unwrap().count(), 0);
    assert_eq!(module.symbols(SegmentKind::ImportTable).unwrap().count(), 0);
    assert_eq!(module.string_table().unwrap().len(), 0);
}

#[test]
fn test_param_count_overrun_in_module() {
    let mut builder = ModuleBuilder::new(ByteMode::Narrow);
    let name = builder.intern("f").unwrap();
    builder
        .export_function(&FunctionDef {
            class_name: name,
            name,
            kind: FunctionKind(1),
            return_type: TypeDescriptor::builtin(0),
            params: vec![TypeDescriptor::builtin(INT)],
        })
        .unwrap();
    let mut data = builder.build().unwrap();

    let module = Module::parse(&data).unwrap();
    let exports = module.well_known_segment(SegmentKind::ExportTable).unwrap();
    // Claim a million parameters: tag, class, name, kind, return type, count.
    let count_at = exports.start + 16 + 12;
    data[count_at..count_at + 4].copy_from_slice(&1_000_000u32.to_le_bytes());

    let module = Module::parse(&data).unwrap();
    let results: Vec<_> = module.symbols(SegmentKind::ExportTable).unwrap().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(ModuleError::TableOverflowsBuffer {
            table: TableKind::ParamTypes,
            ..
        })
    ));
}

#[test]
fn test_string_index_out_of_range() {
    let data = point_module(ByteMode::Narrow);
    let module = Module::parse(&data).unwrap();
    let strings = module.string_table().unwrap();
    assert_eq!(
        strings.get(StringIndex(strings.len())),
        Err(ModuleError::IndexOutOfRange {
            kind: IndexKind::String,
            index: 7,
            count: 7,
        })
    );
}

#[test]
fn test_parse_from_mapped_file() {
    let data = point_module(ByteMode::Wide);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let source = ModuleSource::open(file.path()).unwrap();
    let module = Module::parse(&source).unwrap();
    assert_eq!(module.data(), &data[..]);
    assert_eq!(module.string(StringIndex(0)).unwrap(), b"Point");
}

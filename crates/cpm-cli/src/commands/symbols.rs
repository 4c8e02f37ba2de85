//! `cpm symbols`: decode the export and import tables.

use super::{load, name, print_json, type_name, Options};
use crate::output::StyledOutput;
use crate::TableArg;
use anyhow::Context;
use cpm_format::{Module, SegmentKind, StringTable, Symbol};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

#[derive(Serialize)]
struct TableReport {
    table: &'static str,
    symbols: Vec<SymbolEntry>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SymbolEntry {
    Attribute {
        position: usize,
        class: String,
        name: String,
        #[serde(rename = "type")]
        ty: String,
        value_offset: u64,
    },
    Class {
        position: usize,
        name: String,
        object_size: u64,
        attributes: [u32; 2],
    },
    Function {
        position: usize,
        class: String,
        name: String,
        function_kind: u32,
        returns: String,
        params: Vec<String>,
    },
}

pub fn execute(
    options: &Options,
    path: &Path,
    table: Option<TableArg>,
) -> anyhow::Result<ExitCode> {
    let source = load(path)?;
    let module = Module::parse(&source)
        .with_context(|| format!("invalid module {}", path.display()))?;
    // Records still decode without a string table; names fall back to indices.
    let strings = module.string_table().ok();

    let kinds: &[SegmentKind] = match table {
        Some(TableArg::Export) => &[SegmentKind::ExportTable],
        Some(TableArg::Import) => &[SegmentKind::ImportTable],
        None => &[SegmentKind::ExportTable, SegmentKind::ImportTable],
    };

    let reports: Vec<TableReport> = kinds
        .iter()
        .map(|&kind| table_report(&module, strings.as_ref(), kind))
        .collect();
    let clean = reports.iter().all(|report| report.error.is_none());

    if options.json {
        print_json(&reports)?;
    } else {
        print_reports(options, &reports);
    }

    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn table_report<'a>(
    module: &Module<'a>,
    strings: Option<&StringTable<'a>>,
    kind: SegmentKind,
) -> TableReport {
    let mut report = TableReport {
        table: kind.name(),
        symbols: Vec::new(),
        error: None,
    };
    let records = match module.symbols(kind) {
        Ok(records) => records,
        Err(err) => {
            report.error = Some(err.to_string());
            return report;
        }
    };
    for record in records {
        match record {
            Ok((position, symbol)) => {
                report
                    .symbols
                    .push(entry(module, strings, position, &symbol));
            }
            Err(err) => report.error = Some(err.to_string()),
        }
    }
    report
}

fn entry<'a>(
    module: &Module<'a>,
    strings: Option<&StringTable<'a>>,
    position: usize,
    symbol: &Symbol<'a>,
) -> SymbolEntry {
    match symbol {
        Symbol::Attribute(attr) => SymbolEntry::Attribute {
            position,
            class: name(strings, attr.class_name),
            name: name(strings, attr.name),
            ty: type_name(module, strings, &attr.ty),
            value_offset: attr.value_offset.get(),
        },
        Symbol::Class(class) => SymbolEntry::Class {
            position,
            name: name(strings, class.name),
            object_size: class.object_size.get(),
            attributes: [class.attr_start, class.attr_end],
        },
        Symbol::Function(func) => SymbolEntry::Function {
            position,
            class: name(strings, func.class_name),
            name: name(strings, func.name),
            function_kind: func.kind.0,
            returns: type_name(module, strings, &func.return_type),
            params: func
                .params
                .iter()
                .map(|param| type_name(module, strings, &param))
                .collect(),
        },
    }
}

fn print_reports(options: &Options, reports: &[TableReport]) {
    let mut out = StyledOutput::new(options.color);
    for report in reports {
        out.bold(&format!("{} table", report.table));
        out.dim(&format!(" ({} symbols)", report.symbols.len()));
        out.newline();

        for symbol in &report.symbols {
            match symbol {
                SymbolEntry::Attribute {
                    position,
                    class,
                    name,
                    ty,
                    value_offset,
                } => {
                    out.dim(&format!("  {:#010x}  ", position));
                    out.info("attribute ");
                    out.plain(&format!("{}.{}: {} @ {}", class, name, ty, value_offset));
                }
                SymbolEntry::Class {
                    position,
                    name,
                    object_size,
                    attributes,
                } => {
                    out.dim(&format!("  {:#010x}  ", position));
                    out.info("class     ");
                    out.plain(&format!(
                        "{} (size {}, attributes {}..{})",
                        name, object_size, attributes[0], attributes[1]
                    ));
                }
                SymbolEntry::Function {
                    position,
                    class,
                    name,
                    function_kind,
                    returns,
                    params,
                } => {
                    out.dim(&format!("  {:#010x}  ", position));
                    out.info("function  ");
                    out.plain(&format!(
                        "{}.{}({}) -> {} [kind {}]",
                        class,
                        name,
                        params.join(", "),
                        returns,
                        function_kind
                    ));
                }
            }
            out.newline();
        }

        if let Some(error) = &report.error {
            out.plain("  ");
            out.error(error);
            out.newline();
        }
    }
    out.flush();
}

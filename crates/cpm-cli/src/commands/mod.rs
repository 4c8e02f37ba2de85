//! Subcommand implementations.

pub mod check;
pub mod info;
pub mod strings;
pub mod symbols;
pub mod version;

use anyhow::Context;
use cpm_format::{Module, ModuleSource, ResolvedType, StringIndex, StringTable, TypeDescriptor};
use serde::Serialize;
use std::path::Path;
use termcolor::ColorChoice;

/// Flags shared by every subcommand
pub struct Options {
    pub json: bool,
    pub color: ColorChoice,
}

/// Read a module file
pub fn load(path: &Path) -> anyhow::Result<ModuleSource> {
    ModuleSource::open(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Display form of string `index`, or a marker when it does not resolve
pub fn name(strings: Option<&StringTable<'_>>, index: StringIndex) -> String {
    match strings.map(|table| table.get(index)) {
        Some(Ok(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        Some(Err(_)) | None => format!("<{}>", index),
    }
}

/// Display form of a type descriptor
pub fn type_name<'a>(
    module: &Module<'a>,
    strings: Option<&StringTable<'a>>,
    descriptor: &TypeDescriptor,
) -> String {
    match strings.map(|table| module.resolve_type(table, descriptor)) {
        Some(Ok(ResolvedType::Builtin(id))) => format!("builtin:{}", id.0),
        Some(Ok(ResolvedType::Class { module, class })) => format!(
            "{}.{}",
            String::from_utf8_lossy(module),
            String::from_utf8_lossy(class)
        ),
        _ if descriptor.is_builtin() => format!("builtin:{}", descriptor.builtin.0),
        _ => format!(
            "{}.{}",
            name(strings, descriptor.module_name),
            name(strings, descriptor.class_name)
        ),
    }
}

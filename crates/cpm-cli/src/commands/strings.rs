//! `cpm strings`: dump the string table.

use super::{load, print_json, Options};
use crate::output::StyledOutput;
use anyhow::Context;
use cpm_format::Module;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

#[derive(Serialize)]
struct StringEntry {
    index: u32,
    value: Option<String>,
    error: Option<String>,
}

pub fn execute(options: &Options, path: &Path) -> anyhow::Result<ExitCode> {
    let source = load(path)?;
    let module = Module::parse(&source)
        .with_context(|| format!("invalid module {}", path.display()))?;
    let strings = module
        .string_table()
        .with_context(|| format!("no usable string table in {}", path.display()))?;

    let entries: Vec<StringEntry> = strings
        .iter()
        .map(|(index, value)| match value {
            Ok(bytes) => StringEntry {
                index: index.0,
                value: Some(String::from_utf8_lossy(bytes).into_owned()),
                error: None,
            },
            Err(err) => StringEntry {
                index: index.0,
                value: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    let clean = entries.iter().all(|entry| entry.error.is_none());

    if options.json {
        print_json(&entries)?;
    } else {
        let mut out = StyledOutput::new(options.color);
        for entry in &entries {
            out.dim(&format!("{:>6}  ", format!("#{}", entry.index)));
            match (&entry.value, &entry.error) {
                (Some(value), _) => out.plain(&format!("{:?}", value)),
                (None, error) => out.error(error.as_deref().unwrap_or("unresolved")),
            }
            out.newline();
        }
        out.flush();
    }

    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

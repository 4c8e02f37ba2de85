//! `cpm check`: validate modules.

use super::{load, print_json, Options};
use crate::output::StyledOutput;
use cpm_format::{Module, ModuleError, ModuleStats};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Serialize)]
struct CheckResult {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strings: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbols: Option<usize>,
}

impl CheckResult {
    fn valid(path: &Path, stats: ModuleStats) -> Self {
        Self {
            file: path.display().to_string(),
            valid: true,
            kind: None,
            error: None,
            segments: Some(stats.segments),
            strings: Some(stats.strings),
            symbols: Some(stats.exports + stats.imports),
        }
    }

    fn invalid(path: &Path, kind: &'static str, error: String) -> Self {
        Self {
            file: path.display().to_string(),
            valid: false,
            kind: Some(kind),
            error: Some(error),
            segments: None,
            strings: None,
            symbols: None,
        }
    }
}

fn check_file(path: &Path) -> CheckResult {
    let source = match load(path) {
        Ok(source) => source,
        Err(err) => return CheckResult::invalid(path, "Io", format!("{:#}", err)),
    };
    let stats = Module::parse(&source).and_then(|module| module.validate());
    match stats {
        Ok(stats) => CheckResult::valid(path, stats),
        Err(err) => invalid_module(path, &err),
    }
}

fn invalid_module(path: &Path, err: &ModuleError) -> CheckResult {
    log::debug!("{}: {:?}", path.display(), err);
    CheckResult::invalid(path, err.kind_name(), err.to_string())
}

pub fn execute(options: &Options, files: &[PathBuf]) -> anyhow::Result<ExitCode> {
    let results: Vec<CheckResult> = files.iter().map(|path| check_file(path)).collect();
    let failed = results.iter().filter(|result| !result.valid).count();

    if options.json {
        print_json(&results)?;
    } else {
        let mut out = StyledOutput::new(options.color);
        for result in &results {
            if result.valid {
                out.success("ok");
                out.plain(&format!("    {}", result.file));
                out.dim(&format!(
                    "  ({} segments, {} strings, {} symbols)",
                    result.segments.unwrap_or_default(),
                    result.strings.unwrap_or_default(),
                    result.symbols.unwrap_or_default()
                ));
            } else {
                out.error(&format!("error[{}]", result.kind.unwrap_or("Unknown")));
                out.plain(&format!(
                    " {}: {}",
                    result.file,
                    result.error.as_deref().unwrap_or_default()
                ));
            }
            out.newline();
        }
        if files.len() > 1 {
            out.newline();
            out.plain(&format!(
                "{} checked, {} valid, {} invalid\n",
                results.len(),
                results.len() - failed,
                failed
            ));
        }
        out.flush();
    }

    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

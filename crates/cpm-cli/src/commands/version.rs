//! `cpm version`: tool and bytecode format versions.

use super::{print_json, Options};
use cpm_format::{version::SUPPORTED_VERSIONS, VERSION_MAJOR, VERSION_MINOR};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Serialize)]
struct VersionReport {
    tool: &'static str,
    bytecode: String,
    supported_majors: Vec<u32>,
}

pub fn execute(options: &Options) -> anyhow::Result<ExitCode> {
    let report = VersionReport {
        tool: env!("CARGO_PKG_VERSION"),
        bytecode: format!("{}.{}", VERSION_MAJOR, VERSION_MINOR),
        supported_majors: SUPPORTED_VERSIONS.iter().map(|rule| rule.major).collect(),
    };

    if options.json {
        print_json(&report)?;
    } else {
        println!("cpm v{}", report.tool);
        println!("bytecode format v{}", report.bytecode);
    }
    Ok(ExitCode::SUCCESS)
}

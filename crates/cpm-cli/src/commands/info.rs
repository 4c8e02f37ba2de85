//! `cpm info`: header fields and segment layout.

use super::{load, print_json, Options};
use crate::output::StyledOutput;
use anyhow::Context;
use cpm_format::{Module, SegmentKind};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

#[derive(Serialize)]
struct InfoReport {
    file: String,
    size: usize,
    major: u32,
    minor: u32,
    byte_mode: String,
    offset_width: usize,
    header_size: usize,
    segments: Vec<SegmentReport>,
}

#[derive(Serialize)]
struct SegmentReport {
    index: u8,
    name: Option<&'static str>,
    start: Option<usize>,
    end: Option<usize>,
    len: Option<usize>,
    error: Option<String>,
}

pub fn execute(options: &Options, path: &Path) -> anyhow::Result<ExitCode> {
    let source = load(path)?;
    let module = Module::parse(&source)
        .with_context(|| format!("invalid module {}", path.display()))?;
    let header = module.header();

    let segments: Vec<SegmentReport> = (0..header.segment_count)
        .map(|index| {
            let name = SegmentKind::from_index(index).map(SegmentKind::name);
            match module.segment(index) {
                Ok(segment) => SegmentReport {
                    index,
                    name,
                    start: Some(segment.start),
                    end: Some(segment.end),
                    len: Some(segment.len()),
                    error: None,
                },
                Err(err) => SegmentReport {
                    index,
                    name,
                    start: None,
                    end: None,
                    len: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();
    let clean = segments.iter().all(|segment| segment.error.is_none());

    let report = InfoReport {
        file: path.display().to_string(),
        size: source.len(),
        major: header.major,
        minor: header.minor,
        byte_mode: header.byte_mode.to_string(),
        offset_width: header.byte_mode.width(),
        header_size: module.header_size(),
        segments,
    };

    if options.json {
        print_json(&report)?;
    } else {
        print_report(options, &report);
    }

    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_report(options: &Options, report: &InfoReport) {
    let mut out = StyledOutput::new(options.color);
    out.bold(&report.file);
    out.newline();
    out.plain(&format!("  size:        {} bytes\n", report.size));
    out.plain(&format!("  version:     {}.{}\n", report.major, report.minor));
    out.plain(&format!(
        "  offsets:     {} ({} bytes)\n",
        report.byte_mode, report.offset_width
    ));
    out.plain(&format!("  header size: {} bytes\n", report.header_size));
    out.plain(&format!("  segments:    {}\n", report.segments.len()));

    for segment in &report.segments {
        out.plain(&format!("  [{:>3}] ", segment.index));
        out.info(&format!("{:<8}", segment.name.unwrap_or("-")));
        match (&segment.error, segment.start, segment.end, segment.len) {
            (None, Some(start), Some(end), Some(len)) => {
                out.plain(&format!(" {:#010x}..{:#010x}", start, end));
                out.dim(&format!("  {} bytes", len));
            }
            (error, ..) => {
                out.plain(" ");
                out.error(error.as_deref().unwrap_or("unresolved"));
            }
        }
        out.newline();
    }
    out.flush();
}

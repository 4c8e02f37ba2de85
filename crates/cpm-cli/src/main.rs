//! CP module inspector
//!
//! Command-line front end over `cpm-format`: dumps headers, segments, strings
//! and symbol tables of `.cpm` files and validates them.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use cpm_format::ModuleError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cpm")]
#[command(about = "Inspect and validate CP bytecode modules", long_about = None)]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// When to use color
    #[arg(long, global = true, default_value = "auto", value_parser = ["auto", "always", "never"])]
    color: String,

    /// Log parser decisions (same as CPM_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Symbol table selector for `cpm symbols`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableArg {
    /// Export table
    Export,
    /// Import table
    Import,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header and segment layout of a module
    Info {
        /// Module file
        file: PathBuf,
    },

    /// List the string table
    Strings {
        /// Module file
        file: PathBuf,
    },

    /// List symbol records with their names resolved
    Symbols {
        /// Module file
        file: PathBuf,
        /// Only show one table (default: both)
        #[arg(short, long, value_enum)]
        segment: Option<TableArg>,
    },

    /// Validate modules
    Check {
        /// Module files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show tool and bytecode format versions
    Version,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CPM_LOG", default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = commands::Options {
        json: cli.json,
        color: output::resolve_color_choice(Some(&cli.color)),
    };

    let result = match cli.command {
        Commands::Info { file } => commands::info::execute(&options, &file),
        Commands::Strings { file } => commands::strings::execute(&options, &file),
        Commands::Symbols { file, segment } => commands::symbols::execute(&options, &file, segment),
        Commands::Check { files } => commands::check::execute(&options, &files),
        Commands::Version => commands::version::execute(&options),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            let label = match err.chain().find_map(|cause| cause.downcast_ref::<ModuleError>()) {
                Some(module_err) => format!("error[{}]", module_err.kind_name()),
                None => "error".to_string(),
            };
            output::StyledOutput::new(options.color).stderr_error(&label, &format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

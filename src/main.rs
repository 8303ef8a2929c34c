//! jsonmap CLI.
//!
//! Small tools over the parsers: pretty printing, a type outline of a
//! document, and a compact re-emission with sorted keys.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use jsonmap::json::{beautify, parse, parse_generic};
use jsonmap::{Generic, JsonError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonmap")]
#[command(about = "Inspect and reformat JSON documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Pretty-print a document
    Beautify {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the value kinds of a document as an indented outline
    Inspect {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Re-emit a document compactly with object keys sorted
    Canonical {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
}

/// Failures reported by the CLI.
enum CliError {
    Io(std::io::Error),
    Json(JsonError),
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<JsonError> for CliError {
    fn from(e: JsonError) -> Self {
        CliError::Json(e)
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String, CliError> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn run_beautify(file: Option<&PathBuf>) -> Result<String, CliError> {
    let input = read_input(file)?;
    // Validate first; beautify itself does not check the input.
    parse(&input)?;
    Ok(beautify(input.trim()))
}

fn run_inspect(file: Option<&PathBuf>) -> Result<String, CliError> {
    let input = read_input(file)?;
    let tree = parse_generic(&input)?;
    let mut out = String::new();
    outline(&tree, 0, &mut out);
    Ok(out.trim_end().to_string())
}

fn run_canonical(file: Option<&PathBuf>) -> Result<String, CliError> {
    let input = read_input(file)?;
    let tree = parse_generic(&input)?;
    let value = serde_json::Value::from(tree);
    Ok(value.to_string())
}

fn outline(node: &Generic, depth: usize, out: &mut String) {
    let summary = match node {
        Generic::Null => "null".to_string(),
        Generic::Bool(_) => "bool".to_string(),
        Generic::Integer(_) => "integer".to_string(),
        Generic::Float(_) => "float".to_string(),
        Generic::String(_) => "string".to_string(),
        Generic::List(items) => format!("list ({} items)", items.len()),
        Generic::Map(members) => format!("object ({} members)", members.len()),
    };
    let _ = writeln!(out, "{}", summary);

    let indent = "  ".repeat(depth + 1);
    match node {
        Generic::List(items) => {
            for (index, item) in items.iter().enumerate() {
                let _ = write!(out, "{}[{}]: ", indent, index);
                outline(item, depth + 1, out);
            }
        }
        Generic::Map(members) => {
            for (key, member) in members {
                let _ = write!(out, "{}{:?}: ", indent, key);
                outline(member, depth + 1, out);
            }
        }
        _ => {}
    }
}

fn report(result: Result<String, CliError>) -> ExitCode {
    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(CliError::Json(e)) => {
            eprintln!("error: {} ({}): {}", e.name(), e.code(), e);
            ExitCode::from(1)
        }
        Err(CliError::Io(e)) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("jsonmap v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Commands::Beautify { file }) => report(run_beautify(file.as_ref())),
        Some(Commands::Inspect { file }) => report(run_inspect(file.as_ref())),
        Some(Commands::Canonical { file }) => report(run_canonical(file.as_ref())),
        None => {
            println!("jsonmap v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
            ExitCode::SUCCESS
        }
    }
}

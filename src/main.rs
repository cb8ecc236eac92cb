// ABOUTME: CLI driver: run a script file and map the outcome to exit codes

use clap::Parser;
use log::LevelFilter;
use minipy::config::{EXIT_DATAERR, EXIT_IOERR, EXIT_OK, EXIT_SOFTWARE, VERSION};
use minipy::{ExecError, Interpreter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process;

/// Interpreter for a Python-flavored scripting language
#[derive(Parser, Debug)]
#[command(name = "minipy")]
#[command(version = VERSION)]
#[command(about = "An embeddable interpreter for a Python-flavored scripting language")]
struct CliArgs {
    /// Script file to execute
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Enable debug logging of the pipeline stages
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = CliArgs::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("minipy: failed to initialize logging: {}", err);
    }

    let source = match std::fs::read_to_string(&args.script) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("minipy: cannot open '{}': {}", args.script.display(), err);
            process::exit(EXIT_IOERR);
        }
    };

    // Default callbacks write to stdout/stderr, which is exactly what a
    // standalone driver wants.
    let mut interpreter = Interpreter::new();
    match interpreter.evaluate(&source) {
        Ok(_) => process::exit(EXIT_OK),
        Err(ExecError::Lex(_)) | Err(ExecError::Syntax(_)) => process::exit(EXIT_DATAERR),
        Err(ExecError::Runtime(_)) => process::exit(EXIT_SOFTWARE),
    }
}

//! sqlcli - command-line SQL client.
//!
//! This is the entry point for the sqlcli binary.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use sqlcli_core::VERBOSE;
use sqlcli_gateway::LocalExecutor;
use sqlcli_repl::logging::{self, Profile};
use sqlcli_repl::messages::CLI_NAME;
use sqlcli_repl::CliClient;
use tracing::{error, info};

const HISTORY_FILE: &str = ".sqlcli_history";

#[derive(Debug, Parser)]
#[command(name = CLI_NAME, version, about = "Command-line SQL client")]
struct Args {
    /// SQL file run before anything else to set up the session.
    #[arg(short = 'i', long = "init")]
    init: Option<PathBuf>,

    /// SQL script to run instead of the interactive console.
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Command history file [default: ~/.sqlcli_history].
    #[arg(long)]
    history: Option<PathBuf>,

    /// Session property default, as KEY=VALUE. Repeatable.
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    define: Vec<(String, String)>,

    /// Show the whole error chain for failed statements.
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn default_history() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => Path::new(&home).join(HISTORY_FILE),
        None => PathBuf::from(HISTORY_FILE),
    }
}

fn read_script(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not read SQL file");
            eprintln!("Could not read SQL file {}: {}", path.display(), e);
            None
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(match &args.log_file {
        Some(path) => Profile::File(path.clone()),
        None => Profile::Stderr,
    });

    let mut defaults: HashMap<String, String> = args.define.into_iter().collect();
    if args.verbose {
        defaults.insert(VERBOSE.key.to_string(), "true".to_string());
    }
    info!(properties = defaults.len(), "Starting {}", CLI_NAME);

    let executor = LocalExecutor::with_defaults(defaults);
    let history = args.history.unwrap_or_else(default_history);
    let mut client = CliClient::new(executor).with_history(history);

    if let Some(init) = &args.init {
        let Some(content) = read_script(init) else {
            return ExitCode::FAILURE;
        };
        if !client.execute_initialization(&content) {
            eprintln!("Could not execute initialization file {}", init.display());
            return ExitCode::FAILURE;
        }
    }

    match &args.file {
        Some(file) => {
            let Some(content) = read_script(file) else {
                return ExitCode::FAILURE;
            };
            if !client.execute_in_non_interactive_mode(&content) {
                return ExitCode::FAILURE;
            }
        }
        None => {
            if let Err(e) = client.execute_in_interactive_mode() {
                error!(error = %e, "Interactive session failed");
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

//! # autstr CLI Module
//!
//! This module implements the CLI interface for autstr.
//!
//! ## Available Commands
//!
//! - `init` - Create the catalog from a built-in presentation
//! - `info` - Show the stored presentation
//! - `define` - Bind a relation name to a formula
//! - `check` - Decide a closed formula
//! - `eval` - Enumerate the tuples of a formula
//! - `min` - Smallest value of a formula's first variable
//! - `export` - Write the presentation to a file
//! - `import` - Replace the presentation from a file
//! - `server` - Start the HTTP server

mod commands;

use crate::config::{AppConfig, LimitsSection};
use autstr_core::{AutstrError, Structure};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// autstr - first-order queries over automatic structures
///
/// Relations over the naturals or integers are stored as finite automata;
/// every first-order formula over them is decided exactly.
#[derive(Parser, Debug)]
#[command(name = "autstr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the presentation catalog
    #[arg(short = 'D', long, global = true, default_value = "autstr.redb")]
    pub database: PathBuf,

    /// Path to a TOML config file (default: ./autstr.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of states one operator may create
    #[arg(long, global = true)]
    pub max_states: Option<usize>,

    /// Wall-clock budget per query in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Maximum tuples returned by one evaluation
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Create the catalog from a built-in presentation
    Init {
        /// Built-in structure (naturals, integers)
        #[arg(short, long, default_value = "integers")]
        structure: Structure,

        /// Refuse relations that leave the universe instead of restricting them
        #[arg(long)]
        reject_inconsistent: bool,

        /// Overwrite an existing presentation
        #[arg(short, long)]
        force: bool,
    },

    /// Show the stored presentation
    Info,

    /// Bind a relation name to a formula
    Define {
        /// Relation name
        name: String,

        /// Defining formula
        formula: String,

        /// Tape order (comma-separated); defaults to the sorted free variables
        #[arg(long, value_delimiter = ',')]
        variables: Option<Vec<String>>,
    },

    /// Decide a closed formula
    Check {
        /// Closed formula
        formula: String,
    },

    /// Enumerate the tuples satisfying a formula
    Eval {
        /// Formula with free variables
        formula: String,

        /// Maximum number of tuples to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Smallest value of the formula's first free variable
    Min {
        /// Formula with at least one free variable
        formula: String,
    },

    /// Export the presentation to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a presentation from a file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Overwrite an existing presentation
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AutstrError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let flags = LimitsSection {
        max_states: cli.max_states,
        timeout_ms: cli.timeout_ms,
    };
    let limits = flags.over(config.limits);
    let db = cli.database.as_path();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            max_results,
        }) => {
            let mut server = config.server;
            server.host = host.unwrap_or(server.host);
            server.port = port.unwrap_or(server.port);
            server.max_results = max_results.unwrap_or(server.max_results);
            if !cli.quiet {
                print_banner();
            }
            cmd_server(db, limits, &server).await
        }
        Some(Commands::Init {
            structure,
            reject_inconsistent,
            force,
        }) => cmd_init(db, limits, structure, reject_inconsistent, force, json_mode),
        Some(Commands::Info) | None => cmd_info(db, limits, json_mode),
        Some(Commands::Define {
            name,
            formula,
            variables,
        }) => cmd_define(db, limits, &name, &formula, variables, json_mode),
        Some(Commands::Check { formula }) => cmd_check(db, limits, &formula, json_mode),
        Some(Commands::Eval { formula, limit }) => cmd_eval(db, limits, &formula, limit, json_mode),
        Some(Commands::Min { formula }) => cmd_min(db, limits, &formula, json_mode),
        Some(Commands::Export { output }) => cmd_export(db, &output),
        Some(Commands::Import { input, force }) => cmd_import(db, &input, force),
    }
}

/// Print the startup banner.
fn print_banner() {
    println!();
    println!("  autstr v{}", env!("CARGO_PKG_VERSION"));
    println!("  first-order queries over automatic structures");
    println!();
}

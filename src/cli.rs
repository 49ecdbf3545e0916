//! Command-line interface for the PScript language server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pscript")]
#[command(about = "PScript language server and analysis tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Language Server Protocol (LSP) server
    #[command(alias = "lsp")]
    Serve {
        /// Log filter, e.g. `debug` or `pscript_ide=trace`. Overrides RUST_LOG.
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Print the definitions and encoded semantic tokens of a file
    Debug { file: PathBuf },
    /// Index a directory and print scan statistics
    Index {
        root: PathBuf,
        /// Also run a workspace symbol search
        #[arg(long)]
        query: Option<String>,
    },
}

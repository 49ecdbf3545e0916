//! PScript language server entry point.

mod cli;
mod lsp;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use pscript_ide::{
    AnalysisConfig, Legend, WorkspaceIndex, WorkspaceIndexer, collect_definitions,
    compute_semantic_tokens, encode_semantic_tokens,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn env_filter(log_level: Option<&str>, default: &str) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { log_level } => {
            if let Err(e) = serve(log_level.as_deref()) {
                eprintln!("LSP server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Debug { file } => {
            init_cli_tracing();
            debug_file(&file);
        }
        Command::Index { root, query } => {
            init_cli_tracing();
            index_root(root, query.as_deref());
        }
    }
}

fn serve(log_level: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (connection, io_threads) = lsp_server::Connection::stdio();
    let (layer, handle) = lsp::LspLayer::new(&connection);

    // stdout carries the protocol; logs go to stderr and the client.
    tracing_subscriber::registry()
        .with(env_filter(log_level, "info"))
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(layer)
        .init();

    lsp::serve(connection, handle)?;
    io_threads.join()?;
    Ok(())
}

fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(None, "warn"))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn debug_file(path: &Path) {
    let source = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file: {e}");
            std::process::exit(1);
        }
    };

    println!("=== Analyzing: {} ===\n", path.display());

    let result = pscript_syntax::parse(&source);
    if result.diagnostics.is_empty() {
        println!("✓ No parse errors");
    } else {
        println!("Diagnostics ({} total):", result.diagnostics.len());
        for diag in &result.diagnostics {
            println!("  {diag}");
        }
    }

    println!("\n=== Definitions ===");
    for def in collect_definitions(&result.program) {
        let container = if def.container_name.is_empty() {
            String::new()
        } else {
            format!(" in {}", def.container_name)
        };
        println!(
            "  {}:{} {:?} {}{container}: {}",
            def.range.start.line, def.range.start.character, def.kind, def.name, def.detail
        );
    }

    println!("\n=== Semantic tokens ===");
    let tokens = compute_semantic_tokens(&result.program, &Legend::standard());
    for tuple in encode_semantic_tokens(&tokens).chunks(5) {
        println!("  {tuple:?}");
    }
    println!();
}

fn index_root(root: PathBuf, query: Option<&str>) {
    let config = AnalysisConfig::default();
    let index = Arc::new(WorkspaceIndex::new());
    let indexer = WorkspaceIndexer::new(index.clone(), config.indexing.clone());

    println!("=== Indexing: {} ===\n", root.display());
    let stats = indexer.scan(&[root]);
    println!("  files indexed: {}", stats.files_indexed);
    println!("  files failed:  {}", stats.files_failed);
    println!("  symbols added: {}", stats.symbols_added);
    println!("  distinct names: {}", index.symbol_count());
    if stats.truncated {
        println!("  (stopped at {} files)", config.indexing.max_files);
    }

    if let Some(query) = query {
        println!("\n=== Search: {query} ===");
        for symbol in index.search(query, config.workspace_symbols.max_results) {
            let location = &symbol.location;
            println!(
                "  {:?} {} {}:{}:{}",
                symbol.kind,
                symbol.name,
                location.uri,
                location.range.start.line,
                location.range.start.character
            );
        }
    }
}

//! `pcb-core`: command-line entry point tying the board reader, importer,
//! artifact store, DRC engine, auto-fix engine, and external-applicator
//! client into one pipeline (spec.md §2, §6).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use pcb_cli::config::Config;
use pcb_cli::pipeline::{self, Stores};

#[derive(Parser)]
#[command(name = "pcb-core", about = "PCB design-rule assistant core")]
struct Cli {
    /// Path to a TOML config file. Falls back to built-in defaults when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a binary PCB file (plus optional JSON companion directory)
    /// and persist it as a new board + ruleset artifact pair.
    Import {
        pcb_file: PathBuf,
        #[arg(long)]
        companion_dir: Option<PathBuf>,
    },
    /// Print a one-line summary of the latest version of a board artifact.
    Summarize { board_id: Uuid },
    /// Run DRC over a board against a ruleset and persist the result.
    Drc { board_id: Uuid, ruleset_id: Uuid },
    /// Run the auto-fix engine over a DRC result, producing a patch.
    Autofix {
        board_id: Uuid,
        ruleset_id: Uuid,
        violations_id: Uuid,
        /// Drive fixes live through the external applicator instead of
        /// building an offline patch on faith.
        #[arg(long)]
        live: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("pcb_core=info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let result = match cli.command {
        Commands::Import { pcb_file, companion_dir } => run_import(&config, &pcb_file, companion_dir.as_deref()),
        Commands::Summarize { board_id } => run_summarize(&config, board_id),
        Commands::Drc { board_id, ruleset_id } => run_drc(&config, board_id, ruleset_id),
        Commands::Autofix { board_id, ruleset_id, violations_id, live } => {
            run_autofix(&config, board_id, ruleset_id, violations_id, live)
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_import(config: &Config, pcb_file: &std::path::Path, companion_dir: Option<&std::path::Path>) -> Result<(), pipeline::PipelineError> {
    let stores = Stores::open(config);
    let (board, ruleset) = pipeline::load_and_import(config, pcb_file, companion_dir, &stores)?;
    println!("board {} v{}", board.id, board.version);
    println!("ruleset {} v{}", ruleset.id, ruleset.version);
    Ok(())
}

fn run_summarize(config: &Config, board_id: Uuid) -> Result<(), pipeline::PipelineError> {
    let stores = Stores::open(config);
    let board = stores.boards.read(board_id, None)?;
    let summary = pipeline::summarize(&board.data);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_drc(config: &Config, board_id: Uuid, ruleset_id: Uuid) -> Result<(), pipeline::PipelineError> {
    let stores = Stores::open(config);
    let violations = pipeline::run_drc(board_id, ruleset_id, &stores)?;
    println!("violations {} v{} ({} found)", violations.id, violations.version, violations.data.len());
    Ok(())
}

fn run_autofix(
    config: &Config,
    board_id: Uuid,
    ruleset_id: Uuid,
    violations_id: Uuid,
    live: bool,
) -> Result<(), pipeline::PipelineError> {
    let stores = Stores::open(config);
    let client = if live {
        Some(pcb_client::AltiumClient::new(config.client.command_file.clone(), config.client.result_file.clone()))
    } else {
        None
    };
    let (patch, log) = pipeline::run_autofix(board_id, ruleset_id, violations_id, &stores, client.as_ref())?;
    println!("patch {} v{} ({} operations)", patch.id, patch.version, patch.data.operations.len());
    for entry in &log {
        println!("  {:?} net={:?} -> {:?}", entry.rule_kind, entry.net, entry.outcome);
    }
    Ok(())
}

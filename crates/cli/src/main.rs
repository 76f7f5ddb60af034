// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! setlog - durable workout set logging

mod commands;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{history, maintenance, session};
use setlog_core::{Config, Layout, SystemClock, UuidIdGen};
use setlog_engine::Engine;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "setlog", version, about = "setlog - crash-safe workout set logging")]
struct Cli {
    /// Data directory (defaults to $SETLOG_DATA_DIR, then the user data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log sets interactively, one command per line on stdin
    Session(session::SessionArgs),
    /// Show the last two completions of an exercise
    Last(history::LastArgs),
    /// List recently trained exercises
    Recent(history::RecentArgs),
    /// Copy the ledger to a file
    Export {
        /// Destination path
        dest: PathBuf,
    },
    /// Replace the ledger with a CSV file and rebuild the index
    Import {
        /// Source CSV file
        src: PathBuf,
    },
    /// Rebuild the last-two index from the ledger
    RebuildIndex,
    /// Recover an interrupted session and wait for its sets to commit
    Recover,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprint!("{}", error::CliError::from_anyhow(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let layout = Layout::resolve(cli.data_dir)?;
    std::fs::create_dir_all(layout.root())?;
    let _log_guard = logging::setup_logging(&layout)?;
    let config = Config::load(&layout)?;
    tracing::debug!(root = %layout.root().display(), ?config, "starting");

    let engine = Engine::open(layout, config, SystemClock, UuidIdGen).await?;
    let result = match cli.command {
        Commands::Session(args) => session::handle(&engine, args).await,
        Commands::Last(args) => history::last(&engine, args).await,
        Commands::Recent(args) => history::recent(&engine, args).await,
        Commands::Export { dest } => maintenance::export(&engine, &dest).await,
        Commands::Import { src } => maintenance::import(&engine, &src).await,
        Commands::RebuildIndex => maintenance::rebuild_index(&engine).await,
        Commands::Recover => maintenance::recover(&engine).await,
    };
    engine.shutdown().await;
    result
}

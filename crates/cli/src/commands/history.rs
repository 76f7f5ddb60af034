// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only history queries served by the index

use crate::output::{print_list, Completion, OutputFormat};
use clap::Args;
use setlog_core::Clock;
use setlog_engine::Engine;

#[derive(Args)]
pub struct LastArgs {
    /// Exercise code, e.g. SQUAT
    pub code: String,

    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct RecentArgs {
    /// Only exercises completed within this many days
    #[arg(long, default_value_t = 14)]
    pub days: u32,

    /// Maximum number of exercises to list
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub async fn last<C: Clock>(engine: &Engine<C>, args: LastArgs) -> anyhow::Result<()> {
    let code = args.code.trim().to_uppercase();
    let completions: Vec<Completion> = engine
        .last_two(&code)
        .await?
        .into_iter()
        .map(|entry| Completion::new(code.clone(), entry))
        .collect();

    if completions.is_empty() && matches!(args.output, OutputFormat::Text) {
        println!("No history for {code}");
        return Ok(());
    }
    print_list(&completions, args.output);
    Ok(())
}

pub async fn recent<C: Clock>(engine: &Engine<C>, args: RecentArgs) -> anyhow::Result<()> {
    let completions: Vec<Completion> = engine
        .recent_exercises(args.days, args.limit)
        .await?
        .into_iter()
        .map(|(code, entry)| Completion::new(code, entry))
        .collect();

    if completions.is_empty() && matches!(args.output, OutputFormat::Text) {
        println!("Nothing in the last {} days", args.days);
        return Ok(());
    }
    print_list(&completions, args.output);
    Ok(())
}

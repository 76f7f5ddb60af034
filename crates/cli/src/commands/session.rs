// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive logging session
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! save <code> <weight> <reps> [effort]   log a set outside the plan
//! next <weight> <reps> [effort]          log the next prescribed set
//! undo                                   take back the last staged set
//! last <code>                            show the last two completions
//! quit                                   wait for pending sets, then exit
//! ```
//!
//! End of input behaves like `quit`.

use crate::output::Completion;
use anyhow::Context;
use clap::Args;
use setlog_core::{Clock, PlanCursor, SetInput, MAX_EFFORT};
use setlog_engine::{Engine, Staged};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args)]
pub struct SessionArgs {
    /// Plan name recorded on every set
    #[arg(long, default_value = "adlib")]
    pub plan: String,

    /// Day label recorded on every set
    #[arg(long, default_value = "")]
    pub day: String,

    /// JSON file with the day's prescribed items, used by `next`
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// Continue the recovered session instead of starting a new one
    #[arg(long)]
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Save { code: String, input: SetInput },
    Next { input: SetInput },
    Undo,
    Last { code: String },
    Quit,
    Blank,
}

pub async fn handle<C: Clock>(engine: &Engine<C>, args: SessionArgs) -> anyhow::Result<()> {
    let mut plan = match &args.items {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading items from {}", path.display()))?;
            PlanCursor::from_json(&json)
                .with_context(|| format!("parsing items in {}", path.display()))?
        }
        None => PlanCursor::default(),
    };

    let context = match engine.session().await? {
        Some(context) if args.resume => {
            println!("Session {} resumed", context.session_id);
            context
        }
        _ => {
            let context = engine.begin_session(&args.plan, &args.day).await?;
            println!("Session {} started", context.session_id);
            context
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Blank) => {}
            Ok(command) => {
                if let Err(e) = execute(engine, &mut plan, command).await {
                    eprintln!("error: {e:#}");
                }
            }
            Err(message) => eprintln!("error: {message}"),
        }
    }

    let pending = engine.pending().await?.len();
    if pending > 0 {
        println!("Waiting for {pending} pending set(s)");
    }
    engine.settle().await?;
    println!("Session {} closed", context.session_id);
    Ok(())
}

async fn execute<C: Clock>(
    engine: &Engine<C>,
    plan: &mut PlanCursor,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Save { code, input } => {
            let staged = engine.save_adlib(&code, input).await?;
            print_staged(&staged);
        }
        Command::Next { input } => {
            let Some(item) = plan.current().cloned() else {
                println!("Plan complete");
                return Ok(());
            };
            let staged = engine.save(item, input).await?;
            plan.advance();
            print_staged(&staged);
        }
        Command::Undo => match engine.undo_last().await? {
            Some(undone) => {
                if !undone.record.adlib {
                    plan.rewind();
                }
                println!("Undone #{} {}", undone.sequence, undone.record.ex_code);
            }
            None => println!("Nothing to undo"),
        },
        Command::Last { code } => {
            let entries = engine.last_two(&code).await?;
            if entries.is_empty() {
                println!("No history for {code}");
            }
            for entry in entries {
                println!("{}", Completion::new(code.clone(), entry));
            }
        }
        Command::Quit | Command::Blank => {}
    }
    Ok(())
}

fn print_staged(staged: &Staged) {
    let r = &staged.record;
    println!(
        "Staged #{} {} set {}: {} x {} at {}",
        staged.sequence, r.ex_code, r.set_num, r.weight, r.reps, r.time
    );
}

fn parse_line(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, rest)) = words.split_first() else {
        return Ok(Command::Blank);
    };
    match (verb.to_lowercase().as_str(), rest) {
        ("save", [code, weight, reps, effort @ ..]) => Ok(Command::Save {
            code: code.to_uppercase(),
            input: parse_input(weight, reps, effort)?,
        }),
        ("next", [weight, reps, effort @ ..]) => Ok(Command::Next {
            input: parse_input(weight, reps, effort)?,
        }),
        ("undo", []) => Ok(Command::Undo),
        ("last", [code]) => Ok(Command::Last {
            code: code.to_uppercase(),
        }),
        ("quit" | "exit", []) => Ok(Command::Quit),
        ("save", _) => Err("usage: save <code> <weight> <reps> [effort]".to_string()),
        ("next", _) => Err("usage: next <weight> <reps> [effort]".to_string()),
        ("last", _) => Err("usage: last <code>".to_string()),
        _ => Err(format!("unknown command: {line}")),
    }
}

fn parse_input(weight: &str, reps: &str, effort: &[&str]) -> Result<SetInput, String> {
    let input = SetInput::new(weight, reps);
    match effort {
        [] => Ok(input),
        [value] => match value.parse::<u8>() {
            Ok(n) if (1..=MAX_EFFORT).contains(&n) => Ok(input.effort(n)),
            _ => Err(format!("effort must be 1-{MAX_EFFORT}, got {value}")),
        },
        _ => Err("too many arguments".to_string()),
    }
}

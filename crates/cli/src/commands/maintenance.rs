// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger export/import, index rebuild and crash recovery

use anyhow::Context;
use setlog_core::Clock;
use setlog_engine::Engine;
use std::path::Path;

pub async fn export<C: Clock>(engine: &Engine<C>, dest: &Path) -> anyhow::Result<()> {
    let bytes = engine
        .export_ledger(dest)
        .await
        .with_context(|| format!("exporting ledger to {}", dest.display()))?;
    println!("Exported {bytes} bytes to {}", dest.display());
    Ok(())
}

pub async fn import<C: Clock>(engine: &Engine<C>, src: &Path) -> anyhow::Result<()> {
    // Pending sets belong to the ledger being replaced
    engine.settle().await?;
    let summary = engine
        .import_ledger(src)
        .await
        .with_context(|| format!("importing ledger from {}", src.display()))?;
    println!(
        "Imported {} rows ({} skipped), {} exercises indexed",
        summary.rows, summary.skipped, summary.exercises
    );
    Ok(())
}

pub async fn rebuild_index<C: Clock>(engine: &Engine<C>) -> anyhow::Result<()> {
    let exercises = engine.rebuild_index().await?;
    println!("Index rebuilt: {exercises} exercises");
    Ok(())
}

pub async fn recover<C: Clock>(engine: &Engine<C>) -> anyhow::Result<()> {
    let recovery = engine.recovery().clone();
    let Some(session_id) = recovery.session_id else {
        println!("No session to recover");
        return Ok(());
    };

    if recovery.from_journal {
        println!("Session {session_id}: metadata was unreadable, rebuilt from journal");
    }
    let waiting = engine.pending().await?.len();
    engine.settle().await?;
    engine.sync_now().await?;
    println!(
        "Session {session_id}: {} committed, {} already in ledger, {} undone, {} committed after waiting",
        recovery.committed, recovery.dropped, recovery.undone, waiting
    );
    Ok(())
}

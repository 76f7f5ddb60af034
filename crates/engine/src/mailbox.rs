// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/reply plumbing shared by the component tasks

use crate::EngineError;
use tokio::sync::{mpsc, oneshot};

/// Send a request carrying a reply channel and wait for the answer
pub(crate) async fn call<M, T>(
    tx: &mpsc::UnboundedSender<M>,
    component: &'static str,
    make: impl FnOnce(oneshot::Sender<T>) -> M,
) -> Result<T, EngineError> {
    let (reply, rx) = oneshot::channel();
    tx.send(make(reply))
        .map_err(|_| EngineError::ActorGone(component))?;
    rx.await.map_err(|_| EngineError::ActorGone(component))
}

/// Counters a file-owning task keeps about its writes and flushes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub writes: u64,
    pub flushes: u64,
    pub failed_flushes: u64,
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancel-and-reschedule debounce timer
//!
//! Each file-owning task holds one. Every write calls `arm`, which pushes
//! the deadline out to a full window from now, so a burst of writes ends in
//! a single flush after the burst goes quiet.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct FlushTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl FlushTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// (Re)start the window, replacing any earlier deadline
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves at the current deadline; never resolves while disarmed
    ///
    /// The returned future owns a copy of the deadline, so it can sit in a
    /// `select!` next to branches that mutate the timer.
    pub fn fired(&self) -> impl Future<Output = ()> + Send + 'static {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        }
    }
}

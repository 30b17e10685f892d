// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use bytes::Bytes;
use tokio::{sync::mpsc, time::Instant};

use crate::models::data::Data;

/// What a worker eventually receives for one enqueued Interest: the Data, or
/// `None` when the request is permanently lost (the failure sentinel).
pub type RxItem = Option<Data>;

/// Sender side of a worker's delivery queue. Held (cloned) by every pending
/// Interest belonging to that worker; the queue itself stays with the worker.
#[derive(Debug, Clone)]
pub struct RxHandle {
    tx: mpsc::UnboundedSender<RxItem>,
}

impl RxHandle {
    /// Delivers one item. Returns `false` when the worker is gone, which the
    /// pipeline treats as "nobody cares anymore".
    pub(crate) fn push(&self, item: RxItem) -> bool {
        self.tx.send(item).is_ok()
    }
}

/// Receiver side of a worker's delivery queue (single consumer).
#[derive(Debug)]
pub struct RxQueue {
    rx: mpsc::UnboundedReceiver<RxItem>,
}

impl RxQueue {
    /// Creates the handle/queue pair for one worker.
    pub fn channel() -> (RxHandle, RxQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RxHandle { tx }, RxQueue { rx })
    }

    /// Waits for the next delivery. `Some(None)` is the failure sentinel;
    /// `None` means every sender is gone and nothing further will arrive.
    pub async fn recv(&mut self) -> Option<RxItem> {
        self.rx.recv().await
    }
}

/// Snapshot of one in-flight request.
///
/// A record lives in exactly one place at a time: the request queue (not yet
/// sent, `expressed_at == None`) or the PIT (sent, awaiting a reply).
#[derive(Debug)]
pub struct PendingInterest {
    /// Fully wire-encoded Interest, LP framing and PIT token included.
    pub wire: Bytes,
    /// The token embedded in `wire`.
    pub token: u64,
    /// Interest lifetime, copied from the logical Interest.
    pub lifetime: Duration,
    /// Stamped when the batch containing this Interest is committed for
    /// sending.
    pub expressed_at: Option<Instant>,
    /// Timeout counter; duplicate-nonce retransmits do not bump it.
    pub n_timeout: u8,
    /// Where the eventual Data (or failure sentinel) goes.
    pub rx: RxHandle,
}

impl PendingInterest {
    pub fn new(wire: Bytes, token: u64, lifetime: Duration, rx: RxHandle) -> Self {
        Self {
            wire,
            token,
            lifetime,
            expressed_at: None,
            n_timeout: 0,
            rx,
        }
    }

    pub fn mark_expressed(&mut self, now: Instant) {
        self.expressed_at = Some(now);
    }

    /// Absolute deadline; `None` while the record sits in the request queue.
    pub fn deadline(&self) -> Option<Instant> {
        self.expressed_at.map(|at| at + self.lifetime)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) => deadline <= now,
            None => false,
        }
    }
}

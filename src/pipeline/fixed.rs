// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The fixed-window Interest pipeline.
//!
//! Workers enqueue wire-encoded Interests from any task; one dedicated
//! dispatcher task owns the PIT outright and runs the poll → timeout →
//! admission → send cycle. Replies are demultiplexed by the echoed PIT token
//! and handed to the owning worker's RxQueue; a `None` on that queue is the
//! failure sentinel for a permanently lost request.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use anyhow::{Context, Result};
use bytes::Bytes;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    face::{Face, FaceEvent},
    models::{
        data::Data,
        interest::Interest,
        lp::{self, NackReason},
        tlv::DecodeError,
    },
    pipeline::{
        MAX_RETRY,
        pending::{PendingInterest, RxHandle},
        pit::Pit,
        token::PitTokenGenerator,
    },
};

/// Observable totals since `run()`. Written by the dispatcher, readable from
/// any thread.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    tx_interests: AtomicU64,
    rx_data: AtomicU64,
    rx_nacks: AtomicU64,
    timeouts: AtomicU64,
    spurious_drops: AtomicU64,
}

impl PipelineCounters {
    pub fn tx_interests(&self) -> u64 {
        self.tx_interests.load(Ordering::Relaxed)
    }

    pub fn rx_data(&self) -> u64 {
        self.rx_data.load(Ordering::Relaxed)
    }

    pub fn rx_nacks(&self) -> u64 {
        self.rx_nacks.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Data or NACK packets whose token matched no live PIT entry.
    pub fn spurious_drops(&self) -> u64 {
        self.spurious_drops.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
enum ReexpressError {
    #[error("stored wire no longer decodes: {0}")]
    Decode(#[from] DecodeError),
}

/// Fixed-window pending-interest engine over one face.
pub struct Pipeline<F: Face> {
    queue_tx: mpsc::UnboundedSender<PendingInterest>,
    tokens: PitTokenGenerator,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    counters: Arc<PipelineCounters>,
    // Present between `new` and `run`; taken by the thread that starts the
    // dispatcher.
    dispatcher: Mutex<Option<Dispatcher<F>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<F: Face> Pipeline<F> {
    pub fn new(face: F, window: usize) -> Self {
        Self::with_token_generator(face, window, PitTokenGenerator::new())
    }

    /// Same as [`Pipeline::new`] with a caller-supplied token generator
    /// (seeded in tests).
    pub fn with_token_generator(
        face: F,
        window: usize,
        tokens: PitTokenGenerator,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let counters = Arc::new(PipelineCounters::default());
        let running = Arc::new(AtomicBool::new(false));

        let dispatcher = Dispatcher {
            face,
            pit: Pit::with_window(window),
            queue_rx,
            queue_tx: queue_tx.clone(),
            tokens: tokens.clone(),
            cancel: cancel.clone(),
            running: Arc::clone(&running),
            counters: Arc::clone(&counters),
        };

        Self {
            queue_tx,
            tokens,
            cancel,
            running,
            counters,
            dispatcher: Mutex::new(Some(dispatcher)),
            handle: Mutex::new(None),
        }
    }

    /// Starts the dispatcher task. Calling again is a no-op.
    pub fn run(&self) {
        let dispatcher = lock(&self.dispatcher).take();
        if let Some(dispatcher) = dispatcher {
            self.running.store(true, Ordering::Release);
            let handle = tokio::spawn(dispatcher.run());
            *lock(&self.handle) = Some(handle);
        }
    }

    /// Queues one Interest for expression and routes its eventual reply to
    /// `rx`. Never blocks; returns `false` only while shutting down.
    pub fn enqueue_interest(&self, interest: &Interest, rx: &RxHandle) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let token = self.tokens.next();
        let wire = lp::encode_interest_with_token(interest, token);
        let pending = PendingInterest::new(wire, token, interest.lifetime(), rx.clone());
        self.queue_tx.send(pending).is_ok()
    }

    /// True while the dispatcher runs and the face is healthy.
    pub fn is_valid(&self) -> bool {
        !self.cancel.is_cancelled() && self.running.load(Ordering::Acquire)
    }

    /// Signals shutdown and waits for the dispatcher to drain: every live PIT
    /// entry gets a failure sentinel, unexpressed queue items are discarded.
    /// Safe to call more than once.
    pub async fn end(&self) {
        self.cancel.cancel();
        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("dispatcher task failed: {e}");
            }
        }
    }

    pub fn counters(&self) -> Arc<PipelineCounters> {
        Arc::clone(&self.counters)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The dispatcher side: sole owner of the PIT and the face.
struct Dispatcher<F: Face> {
    face: F,
    pit: Pit,
    queue_rx: mpsc::UnboundedReceiver<PendingInterest>,
    // Retries re-enter the request queue and are re-admitted like any other
    // pending Interest.
    queue_tx: mpsc::UnboundedSender<PendingInterest>,
    tokens: PitTokenGenerator,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    counters: Arc<PipelineCounters>,
}

impl<F: Face> Dispatcher<F> {
    async fn run(mut self) {
        info!(window = self.pit.window(), "interest dispatcher started");

        while !self.cancel.is_cancelled() && self.face.is_valid() {
            match self.face.poll().await {
                Ok(events) => {
                    for event in events {
                        self.handle_event(event);
                    }
                },
                Err(e) => {
                    warn!("fatal: face poll failed: {e:#}");
                    break;
                },
            }

            self.process_timeouts();

            if let Err(e) = self.express_batch().await {
                warn!("fatal: unable to send interest batch on face: {e:#}");
                break;
            }
        }

        self.drain();
        self.running.store(false, Ordering::Release);
        // Reached on fatal face errors too, so late enqueues see a closed
        // pipeline.
        self.cancel.cancel();
        info!("interest dispatcher stopped");
    }

    fn handle_event(&mut self, event: FaceEvent) {
        match event {
            FaceEvent::Data { token, data } => self.on_data(token, data),
            FaceEvent::Nack { token, reason } => self.on_nack(token, reason),
        }
    }

    fn on_data(&mut self, token: u64, data: Data) {
        match self.pit.remove(token) {
            Some(entry) => {
                self.counters.rx_data.fetch_add(1, Ordering::Relaxed);
                let _ = entry.rx.push(Some(data));
            },
            None => {
                self.counters.spurious_drops.fetch_add(1, Ordering::Relaxed);
                debug!(token, "unexpected data packet dropped");
            },
        }
    }

    fn on_nack(&mut self, token: u64, reason: NackReason) {
        let Some(entry) = self.pit.remove(token) else {
            self.counters.spurious_drops.fetch_add(1, Ordering::Relaxed);
            debug!(token, %reason, "unexpected nack dropped");
            return;
        };

        self.counters.rx_nacks.fetch_add(1, Ordering::Relaxed);
        debug!(token, %reason, "received nack");

        if reason.is_retryable() {
            // Duplicate nonce: same retry budget, fresh nonce and token.
            match self.reexpress(&entry, false) {
                Ok(pending) => {
                    let _ = self.queue_tx.send(pending);
                },
                Err(e) => {
                    warn!("failed to re-express nacked interest: {e}");
                    let _ = entry.rx.push(None);
                },
            }
        } else {
            let _ = entry.rx.push(None);
        }
    }

    fn process_timeouts(&mut self) {
        let now = Instant::now();
        while let Some(entry) = self.pit.take_expired(now) {
            self.counters.timeouts.fetch_add(1, Ordering::Relaxed);

            if entry.n_timeout + 1 < MAX_RETRY {
                match self.reexpress(&entry, true) {
                    Ok(pending) => {
                        debug!(
                            token = entry.token,
                            n_timeout = pending.n_timeout,
                            "interest timed out, re-expressing"
                        );
                        let _ = self.queue_tx.send(pending);
                    },
                    Err(e) => {
                        warn!("failed to re-express timed-out interest: {e}");
                        let _ = entry.rx.push(None);
                    },
                }
            } else {
                debug!(token = entry.token, "interest retry budget exhausted");
                let _ = entry.rx.push(None);
            }
        }
    }

    /// Rebuilds a pending record for retransmission: fresh nonce, fresh
    /// token, same delivery queue. `bump` advances the timeout counter.
    fn reexpress(
        &self,
        entry: &PendingInterest,
        bump: bool,
    ) -> Result<PendingInterest, ReexpressError> {
        let mut interest = lp::decode_interest(&entry.wire)?;
        interest.refresh_nonce();

        let token = self.tokens.next();
        let wire = lp::encode_interest_with_token(&interest, token);

        let mut pending =
            PendingInterest::new(wire, token, entry.lifetime, entry.rx.clone());
        pending.n_timeout = entry.n_timeout + u8::from(bump);
        Ok(pending)
    }

    /// Admits up to the window slack from the request queue, inserts the
    /// batch into the PIT and hands it to the face in one call.
    async fn express_batch(&mut self) -> Result<()> {
        if self.pit.is_full() {
            return Ok(());
        }
        let slack = self.pit.window() - self.pit.len();

        let mut admitted = Vec::new();
        for _ in 0..slack {
            match self.queue_rx.try_recv() {
                Ok(pending) => admitted.push(pending),
                Err(_) => break,
            }
        }
        if admitted.is_empty() {
            return Ok(());
        }

        let now = Instant::now();
        let mut batch = Vec::with_capacity(admitted.len());
        for mut pending in admitted {
            while self.pit.contains(pending.token) {
                // 64-bit clash: re-roll the token, which means re-encoding.
                match self.retoken(&pending) {
                    Ok((wire, token)) => {
                        debug!(token, "re-rolled colliding pit token");
                        pending.wire = wire;
                        pending.token = token;
                    },
                    Err(e) => {
                        warn!("failed to re-roll colliding token: {e}");
                        break;
                    },
                }
            }
            if self.pit.contains(pending.token) {
                // The re-roll failed to converge; the worker still gets its
                // delivery, as a sentinel.
                let _ = pending.rx.push(None);
                continue;
            }

            pending.mark_expressed(now);
            let wire = pending.wire.clone();
            if self.pit.insert(pending).is_ok() {
                batch.push(wire);
                self.counters.tx_interests.fetch_add(1, Ordering::Relaxed);
            }
        }

        if batch.is_empty() {
            return Ok(());
        }
        self.face.send(&batch).await.context("face send failed")
    }

    /// Flushes failure sentinels to every live entry and discards queue items
    /// that were never expressed.
    fn drain(&mut self) {
        let live = self.pit.drain();
        if !live.is_empty() {
            debug!(pending = live.len(), "flushing sentinels to live pit entries");
        }
        for entry in live {
            let _ = entry.rx.push(None);
        }

        self.queue_rx.close();
        let mut discarded = 0usize;
        while self.queue_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "dropped unexpressed request queue items");
        }
    }

    fn retoken(&self, pending: &PendingInterest) -> Result<(Bytes, u64), ReexpressError> {
        let interest = lp::decode_interest(&pending.wire)?;
        let token = self.tokens.next();
        Ok((lp::encode_interest_with_token(&interest, token), token))
    }
}

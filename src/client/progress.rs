// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{task::JoinHandle, time::{Duration, Instant, sleep}};
use tokio_util::sync::CancellationToken;
use tracing::info;

const REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Periodic transfer progress reporter.
///
/// Workers bump the shared byte counter as segments arrive; a background task
/// logs percentage and throughput every half second until `finish()`.
#[derive(Debug)]
pub struct ProgressReporter {
    received: Arc<AtomicU64>,
    total: u64,
    started: Instant,
    cancel: CancellationToken,
    reporter: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub fn start(total: u64) -> Self {
        let received = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let reporter = {
            let received = Arc::clone(&received);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = sleep(REPORT_INTERVAL) => {},
                    }
                    report(received.load(Ordering::Relaxed), total, started);
                }
            })
        };

        Self {
            received,
            total,
            started,
            cancel,
            reporter: Some(reporter),
        }
    }

    /// Shared byte counter handed to workers.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.received)
    }

    pub fn add(&self, bytes: u64) {
        self.received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Stops the reporter and logs the final line.
    pub async fn finish(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.reporter.take() {
            let _ = handle.await;
        }
        report(self.received.load(Ordering::Relaxed), self.total, self.started);
    }
}

fn report(received: u64, total: u64, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    let percent = if total == 0 {
        100.0
    } else {
        received as f64 * 100.0 / total as f64
    };
    let rate_mbps = if elapsed > 0.0 {
        received as f64 / 1_000_000.0 / elapsed
    } else {
        0.0
    };
    info!(
        received,
        total,
        percent = (percent * 10.0).round() / 10.0,
        rate_mbps = (rate_mbps * 100.0).round() / 100.0,
        "transfer progress"
    );
}

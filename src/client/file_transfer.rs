// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The file-transfer client: worker tasks generating segment demand on top of
//! the Interest pipeline.
//!
//! Each worker owns one RxQueue and walks its share of the file chunk by
//! chunk: worker `t` takes chunks `t, t + nthreads, t + 2·nthreads, …`. Per
//! chunk it enqueues one Interest per covered segment, then performs exactly
//! that many blocking dequeues. Segments arrive in any order; the segment
//! component of the Data name decides where the bytes land.

use std::{
    fs::File,
    os::unix::fs::FileExt,
    path::PathBuf,
    sync::{Arc, atomic::{AtomicU64, Ordering}},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail, ensure};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::{metadata::FileMetadata, naming, progress::ProgressReporter},
    face::Face,
    models::interest::Interest,
    pipeline::{DEFAULT_LIFETIME, fixed::Pipeline, pending::RxQueue},
};

/// Transfer parameters, usually filled in from the CLI.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Name prefix of every Interest expressed by this consumer.
    pub prefix: String,
    /// Path of the file to be copied over NDN.
    pub filepath: String,
    /// File size in bytes.
    pub filesize: u64,
    /// How many bytes one worker requests per round.
    pub read_chunk: u64,
    /// The producer's payload size; determines the segment for each byte.
    pub payload_size: usize,
    /// Number of workers reading the file concurrently.
    pub nthreads: u16,
    /// Interest lifetime.
    pub lifetime: Duration,
    /// Write the reassembled bytes here; `None` discards them.
    pub output: Option<PathBuf>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            filepath: String::new(),
            filesize: 0,
            read_chunk: 262_144,
            payload_size: 1024,
            nthreads: 1,
            lifetime: DEFAULT_LIFETIME,
            output: None,
        }
    }
}

/// Runs one file transfer over an already-started pipeline.
pub struct FileTransferRunner<F: Face> {
    options: Arc<TransferOptions>,
    pipeline: Arc<Pipeline<F>>,
    stop: CancellationToken,
    workers: Vec<JoinHandle<Result<()>>>,
    progress: Option<ProgressReporter>,
}

impl<F: Face> FileTransferRunner<F> {
    pub fn new(options: TransferOptions, pipeline: Arc<Pipeline<F>>) -> Self {
        Self {
            options: Arc::new(options),
            pipeline,
            stop: CancellationToken::new(),
            workers: Vec::new(),
            progress: None,
        }
    }

    /// Token that aborts the transfer when cancelled (Ctrl-C hook).
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Discovers the file version, then spawns the workers.
    pub async fn run(&mut self) -> Result<()> {
        let version = self
            .fetch_metadata()
            .await
            .context("failed to fetch file metadata")?;
        info!(
            filepath = %self.options.filepath,
            filesize = self.options.filesize,
            version,
            nthreads = self.options.nthreads,
            "starting file transfer"
        );

        let output = match &self.options.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create output file {path:?}"))?;
                file.set_len(self.options.filesize)
                    .context("failed to size output file")?;
                Some(Arc::new(file))
            },
            None => None,
        };

        let progress = ProgressReporter::start(self.options.filesize);
        for index in 0..self.options.nthreads {
            self.workers.push(tokio::spawn(transfer_worker(
                index,
                Arc::clone(&self.options),
                Arc::clone(&self.pipeline),
                self.stop.clone(),
                version,
                progress.counter(),
                output.clone(),
            )));
        }
        self.progress = Some(progress);
        Ok(())
    }

    /// Joins every worker; the first failure wins and stops the rest.
    pub async fn wait(&mut self) -> Result<()> {
        let mut result = Ok(());
        for handle in self.workers.drain(..) {
            let outcome = match handle.await {
                Ok(worker_result) => worker_result,
                Err(e) => Err(anyhow!("worker panicked: {e}")),
            };
            if let Err(e) = outcome {
                self.stop.cancel();
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        if let Some(progress) = self.progress.take() {
            progress.finish().await;
        }
        result
    }

    /// One metadata round-trip to learn the version segments are published
    /// under.
    async fn fetch_metadata(&self) -> Result<u64> {
        let (handle, mut rx) = RxQueue::channel();

        let name = naming::metadata_name(&self.options.prefix, &self.options.filepath)?;
        let mut interest = Interest::new(name, self.options.lifetime);
        interest.set_can_be_prefix(true).set_must_be_fresh(true);

        ensure!(
            self.pipeline.enqueue_interest(&interest, &handle),
            "unable to enqueue metadata interest packet"
        );

        match rx.recv().await {
            Some(Some(data)) => {
                let metadata = FileMetadata::decode(data.content())
                    .context("metadata content does not carry a versioned name")?;
                metadata
                    .version()
                    .ok_or_else(|| anyhow!("metadata name carries no version"))
            },
            Some(None) => bail!("file metadata request was not satisfied"),
            None => bail!("pipeline closed before the metadata reply"),
        }
    }
}

async fn transfer_worker<F: Face>(
    index: u16,
    options: Arc<TransferOptions>,
    pipeline: Arc<Pipeline<F>>,
    stop: CancellationToken,
    version: u64,
    received_bytes: Arc<AtomicU64>,
    output: Option<Arc<File>>,
) -> Result<()> {
    let (handle, mut rx) = RxQueue::channel();
    let payload = options.payload_size as u64;
    let stride = options.read_chunk * u64::from(options.nthreads);
    let mut offset = options.read_chunk * u64::from(index);

    while !stop.is_cancelled() && pipeline.is_valid() && offset < options.filesize {
        let mut expressed = 0u64;
        let first_segment = offset / payload;
        let chunk_end = (offset + options.read_chunk).min(options.filesize);
        let last_segment = chunk_end.div_ceil(payload);

        for segment in first_segment..last_segment {
            let name = naming::segment_name(
                &options.prefix,
                &options.filepath,
                version,
                segment,
            )?;
            let interest = Interest::new(name, options.lifetime);
            if !pipeline.enqueue_interest(&interest, &handle) {
                stop.cancel();
                bail!("unable to enqueue interest packet");
            }
            expressed += 1;
        }
        debug!(index, offset, expressed, "expressed chunk");

        for _ in 0..expressed {
            match rx.recv().await {
                Some(Some(data)) => {
                    let content = data.content();
                    received_bytes.fetch_add(content.len() as u64, Ordering::Relaxed);

                    if let Some(file) = &output {
                        let Some(segment) = data.name().segment() else {
                            warn!(name = %data.name(), "data name carries no segment");
                            continue;
                        };
                        write_segment(
                            file,
                            segment * payload,
                            content,
                            options.filesize,
                        )?;
                    }
                },
                Some(None) => {
                    stop.cancel();
                    bail!("segment request at offset {offset} permanently failed");
                },
                None => {
                    stop.cancel();
                    bail!("pipeline closed before all segments arrived");
                },
            }
        }

        offset += stride;
    }

    Ok(())
}

/// Writes one segment's bytes at its file offset, clamped to the file size.
fn write_segment(file: &File, offset: u64, content: &[u8], filesize: u64) -> Result<()> {
    if offset >= filesize {
        warn!(offset, filesize, "segment beyond end of file ignored");
        return Ok(());
    }
    let len = (filesize - offset).min(content.len() as u64) as usize;
    file.write_all_at(&content[..len], offset)
        .context("failed to write segment to output file")
}

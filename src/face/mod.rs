// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::future::Future;

use anyhow::Result;
use bytes::Bytes;

use crate::models::{data::Data, lp::NackReason};

pub mod udp;

/// One packet delivered by the face, already stripped of its link framing.
#[derive(Debug, Clone)]
pub enum FaceEvent {
    Data { token: u64, data: Data },
    Nack { token: u64, reason: NackReason },
}

/// The transport seam between the pipeline and packet I/O.
///
/// The dispatcher is the only caller: `poll` may block for a few
/// milliseconds at most (it paces the dispatch loop), `send` submits one
/// pre-encoded batch. A returned error from either is transport-fatal and
/// shuts the pipeline down.
pub trait Face: Send + 'static {
    /// Submits a batch of wire-encoded link packets.
    fn send(&mut self, batch: &[Bytes]) -> impl Future<Output = Result<()>> + Send;

    /// Advances I/O once, returning whatever consumer-relevant packets
    /// arrived. Frames without a PIT token are dropped inside the face.
    fn poll(&mut self) -> impl Future<Output = Result<Vec<FaceEvent>>> + Send;

    fn is_valid(&self) -> bool;
}

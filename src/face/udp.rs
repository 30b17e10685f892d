// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::{net::UdpSocket, time::timeout};
use tracing::{debug, warn};

use crate::{
    cfg::config::ForwarderConfig,
    face::{Face, FaceEvent},
    models::lp::{self, LpFrame},
};

/// Buffer large enough for any NDN network packet (the format caps packets at
/// 8800 octets; jumbo-frame forwarders stay well under 64 KiB).
const RECV_BUFFER_LEN: usize = 65536;

/// A unicast UDP face connected to one forwarder.
#[derive(Debug)]
pub struct UdpFace {
    socket: UdpSocket,
    mtu: usize,
    poll_timeout: Duration,
    recv_buf: Vec<u8>,
    valid: bool,
}

impl UdpFace {
    /// Binds an ephemeral local port and connects it to the forwarder.
    pub async fn connect(cfg: &ForwarderConfig) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("failed to bind local UDP socket")?;
        socket
            .connect(&cfg.address)
            .await
            .with_context(|| format!("failed to connect face to {}", cfg.address))?;
        debug!(forwarder = %cfg.address, mtu = cfg.mtu, "udp face connected");

        Ok(Self {
            socket,
            mtu: cfg.mtu,
            poll_timeout: Duration::from_millis(cfg.poll_timeout_ms),
            recv_buf: vec![0u8; RECV_BUFFER_LEN],
            valid: true,
        })
    }

    fn decode(&self, wire: &[u8]) -> Option<FaceEvent> {
        match lp::decode_frame(wire) {
            Ok(LpFrame::Data {
                token: Some(token),
                data,
            }) => Some(FaceEvent::Data { token, data }),
            Ok(LpFrame::Nack {
                token: Some(token),
                reason,
            }) => Some(FaceEvent::Nack { token, reason }),
            Ok(_) => {
                debug!("dropped frame without PIT token");
                None
            },
            Err(e) => {
                debug!("dropped undecodable frame: {e}");
                None
            },
        }
    }
}

impl Face for UdpFace {
    async fn send(&mut self, batch: &[Bytes]) -> Result<()> {
        for wire in batch {
            if wire.len() > self.mtu {
                // An oversized Interest cannot be fragmented here; drop it and
                // let the timeout path surface the loss.
                warn!(len = wire.len(), mtu = self.mtu, "interest exceeds face MTU");
                continue;
            }
            if let Err(e) = self.socket.send(wire).await {
                self.valid = false;
                return Err(e).context("face send failed");
            }
        }
        Ok(())
    }

    async fn poll(&mut self) -> Result<Vec<FaceEvent>> {
        let mut events = Vec::new();

        // One bounded wait paces the dispatcher...
        match timeout(self.poll_timeout, self.socket.recv(&mut self.recv_buf)).await {
            Err(_) => return Ok(events),
            Ok(Err(e)) => {
                self.valid = false;
                return Err(e).context("face recv failed");
            },
            Ok(Ok(len)) => {
                if let Some(event) = self.decode(&self.recv_buf[..len]) {
                    events.push(event);
                }
            },
        }

        // ...then whatever else is already queued drains without blocking.
        loop {
            match self.socket.try_recv(&mut self.recv_buf) {
                Ok(len) => {
                    if let Some(event) = self.decode(&self.recv_buf[..len]) {
                        events.push(event);
                    }
                },
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.valid = false;
                    return Err(e).context("face recv failed");
                },
            }
        }

        Ok(events)
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

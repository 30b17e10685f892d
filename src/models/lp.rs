// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! NDNLPv2 link-layer framing.
//!
//! Every Interest this consumer expresses is wrapped into an `LpPacket`
//! carrying a PitToken header and the Interest as its Fragment. Replies come
//! back either LP-framed (Data or Nack, PitToken echoed) or as a bare network
//! packet; both shapes decode into an [`LpFrame`].
//!
//! The PIT token travels as an opaque 8-octet blob whose content is the
//! little-endian image of the `u64` token. Only this process ever interprets
//! those octets — the producer echoes them back verbatim.

use core::fmt;

use bytes::{Bytes, BytesMut};
use zerocopy::{
    FromBytes, IntoBytes,
    byteorder::{LittleEndian, U64},
};

use crate::models::{
    data::Data,
    interest::Interest,
    tlv::{self, DecodeError, read_nni, read_tlv, write_tlv},
};

/// Nack reason codes (NDNLPv2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackReason {
    /// Nack element present without a reason code.
    None,
    Congestion,
    Duplicate,
    NoRoute,
    /// Unassigned or vendor-specific reason.
    Other(u64),
}

impl NackReason {
    #[inline]
    pub fn from_code(code: u64) -> Self {
        match code {
            50 => NackReason::Congestion,
            100 => NackReason::Duplicate,
            150 => NackReason::NoRoute,
            other => NackReason::Other(other),
        }
    }

    #[inline]
    pub fn as_code(&self) -> u64 {
        match *self {
            NackReason::None => 0,
            NackReason::Congestion => 50,
            NackReason::Duplicate => 100,
            NackReason::NoRoute => 150,
            NackReason::Other(code) => code,
        }
    }

    /// Whether this consumer retransmits on the reason instead of failing the
    /// request. Only duplicate-nonce rejections qualify.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, NackReason::Duplicate)
    }
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NackReason::None => write!(f, "None"),
            NackReason::Congestion => write!(f, "Congestion"),
            NackReason::Duplicate => write!(f, "Duplicate"),
            NackReason::NoRoute => write!(f, "NoRoute"),
            NackReason::Other(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// One decoded link-layer frame, as seen by a consumer.
#[derive(Debug, Clone)]
pub enum LpFrame {
    Data { token: Option<u64>, data: Data },
    Nack { token: Option<u64>, reason: NackReason },
}

/// Serializes a PIT token into its 8-octet wire blob.
pub fn token_to_blob(token: u64) -> [u8; 8] {
    let le = U64::<LittleEndian>::new(token);
    let mut blob = [0u8; 8];
    blob.copy_from_slice(le.as_bytes());
    blob
}

/// Reads a PIT token blob back into its `u64` value.
///
/// Returns `None` for blobs this consumer did not produce (wrong length).
pub fn token_from_blob(blob: &[u8]) -> Option<u64> {
    U64::<LittleEndian>::read_from_bytes(blob).ok().map(|v| v.get())
}

/// Wraps an Interest into an LpPacket carrying `token` as its PitToken.
pub fn encode_interest_with_token(interest: &Interest, token: u64) -> Bytes {
    let fragment = interest.encode();
    let mut body = BytesMut::with_capacity(fragment.len() + 16);
    write_tlv(&mut body, tlv::LP_PIT_TOKEN, &token_to_blob(token));
    write_tlv(&mut body, tlv::LP_FRAGMENT, &fragment);
    tlv::wrap_tlv(tlv::LP_PACKET, &body)
}

/// Wraps a Data packet into an LpPacket echoing `token` (producer side; used
/// by the test producers here).
pub fn encode_data_with_token(data: &Data, token: u64) -> Bytes {
    let fragment = data.encode();
    let mut body = BytesMut::with_capacity(fragment.len() + 16);
    write_tlv(&mut body, tlv::LP_PIT_TOKEN, &token_to_blob(token));
    write_tlv(&mut body, tlv::LP_FRAGMENT, &fragment);
    tlv::wrap_tlv(tlv::LP_PACKET, &body)
}

/// Recovers the logical Interest from an expressed wire block, discarding the
/// LP framing and token. Accepts a bare Interest as well.
pub fn decode_interest(wire: &[u8]) -> Result<Interest, DecodeError> {
    let buf = Bytes::copy_from_slice(wire);
    match peek_type(&buf)? {
        tlv::INTEREST => Interest::decode(buf),
        tlv::LP_PACKET => {
            let (fragment, _) = split_lp(buf)?;
            let fragment = fragment.ok_or(DecodeError::Truncated)?;
            Interest::decode(fragment)
        },
        typ => Err(DecodeError::UnexpectedType(typ)),
    }
}

/// Reads the PIT token out of an expressed wire block.
pub fn extract_token(wire: &[u8]) -> Result<Option<u64>, DecodeError> {
    let buf = Bytes::copy_from_slice(wire);
    if peek_type(&buf)? != tlv::LP_PACKET {
        return Ok(None);
    }
    let (_, lp) = split_lp(buf)?;
    Ok(lp.token)
}

/// Decodes one incoming link-layer frame.
pub fn decode_frame(wire: &[u8]) -> Result<LpFrame, DecodeError> {
    let buf = Bytes::copy_from_slice(wire);
    match peek_type(&buf)? {
        tlv::DATA => Ok(LpFrame::Data {
            token: None,
            data: Data::decode(buf)?,
        }),
        tlv::LP_PACKET => {
            let (fragment, lp) = split_lp(buf)?;
            if let Some(reason) = lp.nack {
                return Ok(LpFrame::Nack {
                    token: lp.token,
                    reason,
                });
            }
            let fragment = fragment.ok_or(DecodeError::Truncated)?;
            match peek_type(&fragment)? {
                tlv::DATA => Ok(LpFrame::Data {
                    token: lp.token,
                    data: Data::decode(fragment)?,
                }),
                typ => Err(DecodeError::UnexpectedType(typ)),
            }
        },
        typ => Err(DecodeError::UnexpectedType(typ)),
    }
}

struct LpHeaders {
    token: Option<u64>,
    nack: Option<NackReason>,
}

/// Splits an LpPacket into its Fragment and the headers this consumer uses.
fn split_lp(mut buf: Bytes) -> Result<(Option<Bytes>, LpHeaders), DecodeError> {
    let mut value = tlv::read_tlv_expect(&mut buf, tlv::LP_PACKET)?;
    let mut fragment = None;
    let mut headers = LpHeaders {
        token: None,
        nack: None,
    };

    while !value.is_empty() {
        let (typ, element) = read_tlv(&mut value)?;
        match typ {
            tlv::LP_FRAGMENT => fragment = Some(element),
            tlv::LP_PIT_TOKEN => headers.token = token_from_blob(&element),
            tlv::LP_NACK => headers.nack = Some(parse_nack(element)?),
            // Sequence numbers and other hop-by-hop headers are ignored.
            _ => {},
        }
    }

    Ok((fragment, headers))
}

fn parse_nack(mut value: Bytes) -> Result<NackReason, DecodeError> {
    while !value.is_empty() {
        let (typ, element) = read_tlv(&mut value)?;
        if typ == tlv::LP_NACK_REASON {
            return Ok(NackReason::from_code(read_nni(&element)?));
        }
    }
    Ok(NackReason::None)
}

fn peek_type(buf: &Bytes) -> Result<u64, DecodeError> {
    let mut probe = buf.clone();
    tlv::read_var(&mut probe)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TLV primitives shared by every packet model.
//!
//! NDN packets are nested Type-Length-Value elements where both the type and
//! the length are encoded as VAR-NUMBERs:
//!
//! ```text
//! value < 253          → 1 octet
//! value ≤ 0xFFFF       → 0xFD + u16 (big-endian)
//! value ≤ 0xFFFFFFFF   → 0xFE + u32 (big-endian)
//! otherwise            → 0xFF + u64 (big-endian)
//! ```
//!
//! Readers consume from a [`Bytes`] cursor so nested values are zero-copy
//! slices of the original datagram.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

// Packet-level TLV-TYPE numbers (NDN packet format v0.3).
pub const INTEREST: u64 = 0x05;
pub const DATA: u64 = 0x06;
pub const NAME: u64 = 0x07;

// Name component types.
pub const GENERIC_COMPONENT: u64 = 0x08;
pub const KEYWORD_COMPONENT: u64 = 0x20;
pub const SEGMENT_COMPONENT: u64 = 0x32;
pub const VERSION_COMPONENT: u64 = 0x36;

// Interest elements.
pub const CAN_BE_PREFIX: u64 = 0x21;
pub const MUST_BE_FRESH: u64 = 0x12;
pub const NONCE: u64 = 0x0A;
pub const INTEREST_LIFETIME: u64 = 0x0C;
pub const HOP_LIMIT: u64 = 0x22;

// Data elements.
pub const META_INFO: u64 = 0x14;
pub const CONTENT: u64 = 0x15;
pub const SIGNATURE_INFO: u64 = 0x16;
pub const SIGNATURE_VALUE: u64 = 0x17;
pub const CONTENT_TYPE: u64 = 0x18;
pub const FRESHNESS_PERIOD: u64 = 0x19;
pub const FINAL_BLOCK_ID: u64 = 0x1A;
pub const SIGNATURE_TYPE: u64 = 0x1B;

// NDNLPv2 elements.
pub const LP_PACKET: u64 = 0x64;
pub const LP_FRAGMENT: u64 = 0x50;
pub const LP_SEQUENCE: u64 = 0x51;
pub const LP_PIT_TOKEN: u64 = 0x62;
pub const LP_NACK: u64 = 0x0320;
pub const LP_NACK_REASON: u64 = 0x0321;

/// Returned when a buffer does not parse as the expected TLV structure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated TLV element")]
    Truncated,
    #[error("unexpected TLV type {0:#x}")]
    UnexpectedType(u64),
    #[error("invalid non-negative integer of {0} octets")]
    BadNonNegativeInteger(usize),
    #[error("invalid name URI: {0}")]
    BadUri(String),
}

/// Appends a VAR-NUMBER.
pub fn write_var(buf: &mut BytesMut, v: u64) {
    match v {
        0..=252 => buf.put_u8(v as u8),
        253..=0xFFFF => {
            buf.put_u8(0xFD);
            buf.put_u16(v as u16);
        },
        0x1_0000..=0xFFFF_FFFF => {
            buf.put_u8(0xFE);
            buf.put_u32(v as u32);
        },
        _ => {
            buf.put_u8(0xFF);
            buf.put_u64(v);
        },
    }
}

/// Reads a VAR-NUMBER from the cursor.
pub fn read_var(buf: &mut Bytes) -> Result<u64, DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::Truncated);
    }
    match buf.get_u8() {
        0xFD => {
            if buf.remaining() < 2 {
                return Err(DecodeError::Truncated);
            }
            Ok(u64::from(buf.get_u16()))
        },
        0xFE => {
            if buf.remaining() < 4 {
                return Err(DecodeError::Truncated);
            }
            Ok(u64::from(buf.get_u32()))
        },
        0xFF => {
            if buf.remaining() < 8 {
                return Err(DecodeError::Truncated);
            }
            Ok(buf.get_u64())
        },
        first => Ok(u64::from(first)),
    }
}

/// Appends one complete `type length value` element.
pub fn write_tlv(buf: &mut BytesMut, typ: u64, value: &[u8]) {
    write_var(buf, typ);
    write_var(buf, value.len() as u64);
    buf.put_slice(value);
}

/// Consumes the next element and returns `(type, value)`.
///
/// The value is a zero-copy slice of the cursor's backing buffer.
pub fn read_tlv(buf: &mut Bytes) -> Result<(u64, Bytes), DecodeError> {
    let typ = read_var(buf)?;
    let len = read_var(buf)? as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    Ok((typ, buf.split_to(len)))
}

/// Consumes the next element, requiring `expected` as its type.
pub fn read_tlv_expect(buf: &mut Bytes, expected: u64) -> Result<Bytes, DecodeError> {
    let (typ, value) = read_tlv(buf)?;
    if typ != expected {
        return Err(DecodeError::UnexpectedType(typ));
    }
    Ok(value)
}

/// Appends a NonNegativeInteger in its shortest 1/2/4/8-octet form.
pub fn write_nni(buf: &mut BytesMut, v: u64) {
    if v <= u64::from(u8::MAX) {
        buf.put_u8(v as u8);
    } else if v <= u64::from(u16::MAX) {
        buf.put_u16(v as u16);
    } else if v <= u64::from(u32::MAX) {
        buf.put_u32(v as u32);
    } else {
        buf.put_u64(v);
    }
}

/// Decodes a NonNegativeInteger value (must be exactly 1, 2, 4 or 8 octets).
pub fn read_nni(value: &[u8]) -> Result<u64, DecodeError> {
    match value.len() {
        1 => Ok(u64::from(value[0])),
        2 => Ok(u64::from(u16::from_be_bytes([value[0], value[1]]))),
        4 => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(value);
            Ok(u64::from(u32::from_be_bytes(raw)))
        },
        8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(value);
            Ok(u64::from_be_bytes(raw))
        },
        n => Err(DecodeError::BadNonNegativeInteger(n)),
    }
}

/// Wraps an already-encoded body into an outer element.
pub fn wrap_tlv(typ: u64, body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(body.len() + 10);
    write_tlv(&mut out, typ, body);
    out.freeze()
}

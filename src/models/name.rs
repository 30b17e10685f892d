// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! NDN names and name components.
//!
//! Components carry their TLV-TYPE so the typed naming conventions (segment,
//! version, keyword) survive a round-trip. URIs use the short convention
//! markers: `/seg=4`, `/v=2`, `/32=metadata`; everything else prints as a
//! percent-escaped generic component.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::models::tlv::{
    self, DecodeError, read_nni, read_tlv, read_tlv_expect, write_nni, write_tlv,
};

/// One name component: a TLV-TYPE plus an opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    typ: u64,
    value: Bytes,
}

impl Component {
    pub fn new(typ: u64, value: impl Into<Bytes>) -> Self {
        Self {
            typ,
            value: value.into(),
        }
    }

    pub fn generic(value: impl Into<Bytes>) -> Self {
        Self::new(tlv::GENERIC_COMPONENT, value)
    }

    pub fn keyword(value: impl Into<Bytes>) -> Self {
        Self::new(tlv::KEYWORD_COMPONENT, value)
    }

    pub fn segment(segno: u64) -> Self {
        Self::new(tlv::SEGMENT_COMPONENT, nni_bytes(segno))
    }

    pub fn version(version: u64) -> Self {
        Self::new(tlv::VERSION_COMPONENT, nni_bytes(version))
    }

    pub fn typ(&self) -> u64 {
        self.typ
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn is_segment(&self) -> bool {
        self.typ == tlv::SEGMENT_COMPONENT
    }

    pub fn is_version(&self) -> bool {
        self.typ == tlv::VERSION_COMPONENT
    }

    /// Segment number, when this is a segment component.
    pub fn as_segment(&self) -> Option<u64> {
        if self.is_segment() { self.as_number() } else { None }
    }

    /// Version number, when this is a version component.
    pub fn as_version(&self) -> Option<u64> {
        if self.is_version() { self.as_number() } else { None }
    }

    fn as_number(&self) -> Option<u64> {
        read_nni(&self.value).ok()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.typ, self.as_number()) {
            (tlv::GENERIC_COMPONENT, _) => write!(f, "{}", escape(&self.value)),
            (tlv::SEGMENT_COMPONENT, Some(n)) => write!(f, "seg={n}"),
            (tlv::VERSION_COMPONENT, Some(n)) => write!(f, "v={n}"),
            (typ, _) => write!(f, "{typ}={}", escape(&self.value)),
        }
    }
}

/// A hierarchical NDN name: an ordered list of components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URI such as `/ndnc/ft/video.bin/v=2/seg=0`.
    ///
    /// Accepted component forms: `seg=<n>`, `v=<n>`, `<type>=<escaped>` and a
    /// plain percent-escaped generic component. The root name is `/`.
    pub fn from_uri(uri: &str) -> Result<Self, DecodeError> {
        let trimmed = uri.strip_prefix('/').unwrap_or(uri);
        let mut name = Name::new();
        for part in trimmed.split('/') {
            if part.is_empty() {
                continue;
            }
            name.push(parse_component(part)?);
        }
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn last(&self) -> Option<&Component> {
        self.components.last()
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Builder-style append.
    pub fn append(mut self, component: Component) -> Self {
        self.push(component);
        self
    }

    /// The first `n` components as a new name.
    pub fn prefix(&self, n: usize) -> Name {
        Name {
            components: self.components.iter().take(n).cloned().collect(),
        }
    }

    /// The components from `start` onwards as a new name.
    pub fn sub_name(&self, start: usize) -> Name {
        Name {
            components: self.components.iter().skip(start).cloned().collect(),
        }
    }

    pub fn starts_with(&self, prefix: &Name) -> bool {
        self.components.len() >= prefix.components.len()
            && self.components[..prefix.components.len()] == prefix.components[..]
    }

    /// Segment number of the last component, if it is a segment.
    pub fn segment(&self) -> Option<u64> {
        self.last().and_then(Component::as_segment)
    }

    /// Appends the encoded component list (no outer `Name` element).
    pub fn encode_value_to(&self, buf: &mut BytesMut) {
        for component in &self.components {
            write_tlv(buf, component.typ, &component.value);
        }
    }

    /// Encodes the full `Name` TLV element.
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::new();
        self.encode_value_to(&mut body);
        tlv::wrap_tlv(tlv::NAME, &body)
    }

    /// Parses the value of a `Name` element (the component list).
    pub fn from_value(mut value: Bytes) -> Result<Self, DecodeError> {
        let mut name = Name::new();
        while !value.is_empty() {
            let (typ, inner) = read_tlv(&mut value)?;
            name.push(Component::new(typ, inner));
        }
        Ok(name)
    }

    /// Parses a full `Name` element from the cursor.
    pub fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let value = read_tlv_expect(buf, tlv::NAME)?;
        Self::from_value(value)
    }

    pub fn to_uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

fn parse_component(part: &str) -> Result<Component, DecodeError> {
    if let Some((marker, rest)) = part.split_once('=') {
        return match marker {
            "seg" => {
                let segno = rest
                    .parse::<u64>()
                    .map_err(|_| DecodeError::BadUri(part.to_string()))?;
                Ok(Component::segment(segno))
            },
            "v" => {
                let version = rest
                    .parse::<u64>()
                    .map_err(|_| DecodeError::BadUri(part.to_string()))?;
                Ok(Component::version(version))
            },
            _ => {
                let typ = marker
                    .parse::<u64>()
                    .map_err(|_| DecodeError::BadUri(part.to_string()))?;
                Ok(Component::new(typ, unescape(rest)?))
            },
        };
    }
    Ok(Component::generic(unescape(part)?))
}

fn nni_bytes(v: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    write_nni(&mut buf, v);
    buf.freeze()
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn escape(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len());
    for &b in value {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn unescape(part: &str) -> Result<Bytes, DecodeError> {
    let raw = part.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            if i + 3 > raw.len() {
                return Err(DecodeError::BadUri(part.to_string()));
            }
            let hi = hex_digit(raw[i + 1]);
            let lo = hex_digit(raw[i + 2]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                _ => return Err(DecodeError::BadUri(part.to_string())),
            }
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(Bytes::from(out))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

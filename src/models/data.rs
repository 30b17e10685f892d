// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{Bytes, BytesMut};

use crate::models::{
    name::{Component, Name},
    tlv::{self, DecodeError, read_nni, read_tlv, write_nni, write_tlv},
};

/// SignatureType for a SHA-256 digest (the producer's default).
pub const SIGNATURE_DIGEST_SHA256: u64 = 0;

/// An NDN Data packet.
///
/// Signatures are carried opaquely: this consumer delegates verification, so
/// the SignatureInfo/SignatureValue bytes are preserved but never inspected
/// beyond the signature type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    name: Name,
    content_type: Option<u64>,
    freshness_period_ms: Option<u64>,
    final_block_id: Option<Component>,
    content: Bytes,
    signature_type: u64,
    signature_value: Bytes,
}

impl Data {
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content_type: None,
            freshness_period_ms: None,
            final_block_id: None,
            content: content.into(),
            signature_type: SIGNATURE_DIGEST_SHA256,
            signature_value: Bytes::new(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> Option<u64> {
        self.content_type
    }

    pub fn freshness_period_ms(&self) -> Option<u64> {
        self.freshness_period_ms
    }

    pub fn final_block_id(&self) -> Option<&Component> {
        self.final_block_id.as_ref()
    }

    pub fn set_freshness_period_ms(&mut self, ms: u64) -> &mut Self {
        self.freshness_period_ms = Some(ms);
        self
    }

    pub fn set_final_block_id(&mut self, component: Component) -> &mut Self {
        self.final_block_id = Some(component);
        self
    }

    /// Encodes the full `Data` TLV element.
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(self.content.len() + 64);

        let mut name_value = BytesMut::new();
        self.name.encode_value_to(&mut name_value);
        write_tlv(&mut body, tlv::NAME, &name_value);

        let mut meta = BytesMut::new();
        if let Some(content_type) = self.content_type {
            let mut v = BytesMut::new();
            write_nni(&mut v, content_type);
            write_tlv(&mut meta, tlv::CONTENT_TYPE, &v);
        }
        if let Some(freshness) = self.freshness_period_ms {
            let mut v = BytesMut::new();
            write_nni(&mut v, freshness);
            write_tlv(&mut meta, tlv::FRESHNESS_PERIOD, &v);
        }
        if let Some(final_block) = &self.final_block_id {
            let mut v = BytesMut::new();
            write_tlv(&mut v, final_block.typ(), final_block.value());
            write_tlv(&mut meta, tlv::FINAL_BLOCK_ID, &v);
        }
        if !meta.is_empty() {
            write_tlv(&mut body, tlv::META_INFO, &meta);
        }

        write_tlv(&mut body, tlv::CONTENT, &self.content);

        let mut sig_info = BytesMut::new();
        let mut sig_type = BytesMut::new();
        write_nni(&mut sig_type, self.signature_type);
        write_tlv(&mut sig_info, tlv::SIGNATURE_TYPE, &sig_type);
        write_tlv(&mut body, tlv::SIGNATURE_INFO, &sig_info);
        write_tlv(&mut body, tlv::SIGNATURE_VALUE, &self.signature_value);

        tlv::wrap_tlv(tlv::DATA, &body)
    }

    /// Parses a full `Data` element.
    pub fn decode(mut buf: Bytes) -> Result<Self, DecodeError> {
        let value = tlv::read_tlv_expect(&mut buf, tlv::DATA)?;
        Self::from_value(value)
    }

    /// Parses the value of an already-unwrapped `Data` element.
    pub fn from_value(mut value: Bytes) -> Result<Self, DecodeError> {
        let name = Name::decode(&mut value)?;
        let mut data = Self::new(name, Bytes::new());

        while !value.is_empty() {
            let (typ, element) = read_tlv(&mut value)?;
            match typ {
                tlv::META_INFO => data.parse_meta_info(element)?,
                tlv::CONTENT => data.content = element,
                tlv::SIGNATURE_INFO => data.parse_signature_info(element)?,
                tlv::SIGNATURE_VALUE => data.signature_value = element,
                _ => {},
            }
        }

        Ok(data)
    }

    fn parse_meta_info(&mut self, mut value: Bytes) -> Result<(), DecodeError> {
        while !value.is_empty() {
            let (typ, element) = read_tlv(&mut value)?;
            match typ {
                tlv::CONTENT_TYPE => self.content_type = Some(read_nni(&element)?),
                tlv::FRESHNESS_PERIOD => {
                    self.freshness_period_ms = Some(read_nni(&element)?);
                },
                tlv::FINAL_BLOCK_ID => {
                    let mut inner = element;
                    let (component_type, component_value) = read_tlv(&mut inner)?;
                    self.final_block_id =
                        Some(Component::new(component_type, component_value));
                },
                _ => {},
            }
        }
        Ok(())
    }

    fn parse_signature_info(&mut self, mut value: Bytes) -> Result<(), DecodeError> {
        while !value.is_empty() {
            let (typ, element) = read_tlv(&mut value)?;
            if typ == tlv::SIGNATURE_TYPE {
                self.signature_type = read_nni(&element)?;
            }
        }
        Ok(())
    }
}

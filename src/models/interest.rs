// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::{
    models::{
        name::Name,
        tlv::{self, DecodeError, read_nni, read_tlv, write_nni, write_tlv},
    },
    utils::random_nonce,
};

/// Interest lifetime applied when the packet does not carry one.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_millis(4000);

/// An NDN Interest packet.
///
/// Only the elements this consumer produces or inspects are modeled; unknown
/// elements are skipped on decode so packets from newer producers still parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    name: Name,
    can_be_prefix: bool,
    must_be_fresh: bool,
    nonce: Option<u32>,
    lifetime: Duration,
}

impl Interest {
    /// Builds an Interest with a freshly drawn nonce.
    pub fn new(name: Name, lifetime: Duration) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: Some(random_nonce()),
            lifetime,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn nonce(&self) -> Option<u32> {
        self.nonce
    }

    pub fn can_be_prefix(&self) -> bool {
        self.can_be_prefix
    }

    pub fn must_be_fresh(&self) -> bool {
        self.must_be_fresh
    }

    pub fn set_can_be_prefix(&mut self, value: bool) -> &mut Self {
        self.can_be_prefix = value;
        self
    }

    pub fn set_must_be_fresh(&mut self, value: bool) -> &mut Self {
        self.must_be_fresh = value;
        self
    }

    /// Re-rolls the nonce so a retransmission is not rejected as a duplicate.
    pub fn refresh_nonce(&mut self) {
        let old = self.nonce;
        let mut fresh = random_nonce();
        while Some(fresh) == old {
            fresh = random_nonce();
        }
        self.nonce = Some(fresh);
    }

    /// Encodes the full `Interest` TLV element.
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::new();
        let mut name_value = BytesMut::new();
        self.name.encode_value_to(&mut name_value);
        write_tlv(&mut body, tlv::NAME, &name_value);
        if self.can_be_prefix {
            write_tlv(&mut body, tlv::CAN_BE_PREFIX, &[]);
        }
        if self.must_be_fresh {
            write_tlv(&mut body, tlv::MUST_BE_FRESH, &[]);
        }
        if let Some(nonce) = self.nonce {
            write_tlv(&mut body, tlv::NONCE, &nonce.to_be_bytes());
        }
        let mut lifetime_value = BytesMut::new();
        write_nni(&mut lifetime_value, self.lifetime.as_millis() as u64);
        write_tlv(&mut body, tlv::INTEREST_LIFETIME, &lifetime_value);
        tlv::wrap_tlv(tlv::INTEREST, &body)
    }

    /// Parses a full `Interest` element.
    pub fn decode(mut buf: Bytes) -> Result<Self, DecodeError> {
        let mut value = tlv::read_tlv_expect(&mut buf, tlv::INTEREST)?;
        let name = Name::decode(&mut value)?;

        let mut interest = Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: None,
            lifetime: DEFAULT_INTEREST_LIFETIME,
        };

        while !value.is_empty() {
            let (typ, element) = read_tlv(&mut value)?;
            match typ {
                tlv::CAN_BE_PREFIX => interest.can_be_prefix = true,
                tlv::MUST_BE_FRESH => interest.must_be_fresh = true,
                tlv::NONCE => {
                    if element.len() != 4 {
                        return Err(DecodeError::BadNonNegativeInteger(element.len()));
                    }
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(&element);
                    interest.nonce = Some(u32::from_be_bytes(raw));
                },
                tlv::INTEREST_LIFETIME => {
                    interest.lifetime = Duration::from_millis(read_nni(&element)?);
                },
                // HopLimit and anything newer is irrelevant to this consumer.
                _ => {},
            }
        }

        Ok(interest)
    }
}

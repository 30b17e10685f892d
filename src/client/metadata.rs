// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;

use crate::models::{
    name::Name,
    tlv::{self, DecodeError},
};

/// Content of a file-metadata Data packet.
///
/// The producer answers the `<prefix><filepath>/32=metadata` Interest with
/// the versioned name prefix of the file, encoded as a nested Name element —
/// the consumer learns the version under which segments are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    versioned_name: Name,
}

impl FileMetadata {
    pub fn new(versioned_name: Name) -> Self {
        Self { versioned_name }
    }

    pub fn versioned_name(&self) -> &Name {
        &self.versioned_name
    }

    /// The publication version carried by the versioned name.
    pub fn version(&self) -> Option<u64> {
        self.versioned_name.last().and_then(|c| c.as_version())
    }

    pub fn encode(&self) -> Bytes {
        self.versioned_name.encode()
    }

    pub fn decode(content: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = Bytes::copy_from_slice(content);
        let versioned_name = Name::decode(&mut buf)?;
        if versioned_name.last().and_then(|c| c.as_version()).is_none() {
            return Err(DecodeError::UnexpectedType(tlv::NAME));
        }
        Ok(Self { versioned_name })
    }
}

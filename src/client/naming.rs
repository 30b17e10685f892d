// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The file-transfer naming scheme.
//!
//! Segment Data lives under `<prefix><filepath>/<version>/<segment>`; the
//! file's metadata packet under `<prefix><filepath>/32=metadata`. The
//! canonical prefix is `/ndnc/ft`, but every helper takes the prefix the
//! consumer was started with.

use once_cell::sync::Lazy;

use crate::models::{
    name::{Component, Name},
    tlv::DecodeError,
};

/// Canonical name prefix of the file-transfer service.
pub const NAME_PREFIX_URI: &str = "/ndnc/ft";

/// Components in [`NAME_PREFIX_URI`].
pub const NAME_PREFIX_COMPONENTS: usize = 2;

pub static NAME_PREFIX: Lazy<Name> = Lazy::new(|| {
    Name::from_uri(NAME_PREFIX_URI).expect("static prefix URI parses")
});

static METADATA_COMPONENT: Lazy<Component> =
    Lazy::new(|| Component::keyword(&b"metadata"[..]));

/// `<prefix><filepath>/32=metadata`
pub fn metadata_name(prefix: &str, filepath: &str) -> Result<Name, DecodeError> {
    Ok(Name::from_uri(&format!("{prefix}{filepath}"))?
        .append(METADATA_COMPONENT.clone()))
}

/// `<prefix><filepath>/<version>/<segment>`
pub fn segment_name(
    prefix: &str,
    filepath: &str,
    version: u64,
    segment: u64,
) -> Result<Name, DecodeError> {
    Ok(Name::from_uri(&format!("{prefix}{filepath}"))?
        .append(Component::version(version))
        .append(Component::segment(segment)))
}

pub fn is_metadata_name(name: &Name) -> bool {
    match name.last() {
        Some(component) => {
            !component.is_segment() && *component == *METADATA_COMPONENT
        },
        None => false,
    }
}

/// File path from a metadata name: drop the metadata suffix and the service
/// prefix.
pub fn file_path_from_metadata_name(name: &Name) -> Option<String> {
    if !is_metadata_name(name) {
        return None;
    }
    Some(uri_of_sub_name(&name.prefix(name.len() - 1)))
}

/// File path from a versioned segment name: drop segment and version.
pub fn file_path_from_segment_name(name: &Name) -> Option<String> {
    if name.len() < NAME_PREFIX_COMPONENTS + 2 || name.segment().is_none() {
        return None;
    }
    Some(uri_of_sub_name(&name.prefix(name.len() - 2)))
}

fn uri_of_sub_name(name: &Name) -> String {
    name.sub_name(NAME_PREFIX_COMPONENTS).to_uri()
}

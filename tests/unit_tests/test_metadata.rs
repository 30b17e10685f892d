// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use ndn_ft_client_rs::{
    client::metadata::FileMetadata,
    models::name::{Component, Name},
};

#[test]
fn test_metadata_round_trip() {
    let versioned = Name::from_uri("/ndnc/ft/file.bin")
        .expect("uri parses")
        .append(Component::version(7));
    let metadata = FileMetadata::new(versioned.clone());
    assert_eq!(metadata.version(), Some(7));

    let decoded = FileMetadata::decode(&metadata.encode()).expect("content parses");
    assert_eq!(decoded.versioned_name(), &versioned);
    assert_eq!(decoded.version(), Some(7));
}

#[test]
fn test_metadata_requires_version() {
    let unversioned = Name::from_uri("/ndnc/ft/file.bin").expect("uri parses");
    let content = unversioned.encode();
    assert!(FileMetadata::decode(&content).is_err());
}

#[test]
fn test_metadata_rejects_non_name_content() {
    assert!(FileMetadata::decode(b"not a name").is_err());
}

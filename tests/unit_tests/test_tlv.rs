// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{Bytes, BytesMut};
use hex_literal::hex;
use ndn_ft_client_rs::models::tlv::{
    self, DecodeError, read_nni, read_tlv, read_var, write_nni, write_tlv, write_var,
};

fn var_bytes(v: u64) -> Vec<u8> {
    let mut buf = BytesMut::new();
    write_var(&mut buf, v);
    buf.to_vec()
}

#[test]
fn test_var_number_boundaries() {
    assert_eq!(var_bytes(0), hex!("00"));
    assert_eq!(var_bytes(252), hex!("FC"));
    assert_eq!(var_bytes(253), hex!("FD 00 FD"));
    assert_eq!(var_bytes(65535), hex!("FD FF FF"));
    assert_eq!(var_bytes(65536), hex!("FE 00 01 00 00"));
    assert_eq!(var_bytes(0xFFFF_FFFF), hex!("FE FF FF FF FF"));
    assert_eq!(
        var_bytes(0x1_0000_0000),
        hex!("FF 00 00 00 01 00 00 00 00")
    );
}

#[test]
fn test_var_number_round_trip() {
    for v in [0u64, 1, 252, 253, 65535, 65536, 0xFFFF_FFFF, u64::MAX] {
        let mut buf = Bytes::from(var_bytes(v));
        assert_eq!(read_var(&mut buf), Ok(v), "value {v}");
        assert!(buf.is_empty());
    }
}

#[test]
fn test_var_number_truncated() {
    let mut empty = Bytes::new();
    assert_eq!(read_var(&mut empty), Err(DecodeError::Truncated));

    let mut cut = Bytes::from_static(&hex!("FD 00"));
    assert_eq!(read_var(&mut cut), Err(DecodeError::Truncated));
}

#[test]
fn test_tlv_round_trip() {
    let mut buf = BytesMut::new();
    write_tlv(&mut buf, tlv::CONTENT, b"hello");

    let mut cursor = buf.freeze();
    let (typ, value) = read_tlv(&mut cursor).expect("element parses");
    assert_eq!(typ, tlv::CONTENT);
    assert_eq!(&value[..], b"hello");
    assert!(cursor.is_empty());
}

#[test]
fn test_tlv_length_beyond_buffer() {
    // Claims 5 octets of value, carries 2.
    let mut cursor = Bytes::from_static(&hex!("15 05 61 62"));
    assert_eq!(read_tlv(&mut cursor), Err(DecodeError::Truncated));
}

#[test]
fn test_nni_shortest_form() {
    let cases: &[(u64, &[u8])] = &[
        (0, &hex!("00")),
        (255, &hex!("FF")),
        (256, &hex!("01 00")),
        (65535, &hex!("FF FF")),
        (65536, &hex!("00 01 00 00")),
        (0xFFFF_FFFF, &hex!("FF FF FF FF")),
        (0x1_0000_0000, &hex!("00 00 00 01 00 00 00 00")),
    ];
    for (v, expected) in cases {
        let mut buf = BytesMut::new();
        write_nni(&mut buf, *v);
        assert_eq!(&buf[..], *expected, "value {v}");
        assert_eq!(read_nni(&buf), Ok(*v));
    }
}

#[test]
fn test_nni_rejects_odd_lengths() {
    assert_eq!(read_nni(&[0, 0, 0]), Err(DecodeError::BadNonNegativeInteger(3)));
    assert_eq!(read_nni(&[]), Err(DecodeError::BadNonNegativeInteger(0)));
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use ndn_ft_client_rs::cfg::config::Config;

#[test]
fn test_defaults() {
    let mut cfg = Config::default();
    cfg.validate_and_normalize().expect("defaults are valid");

    assert_eq!(cfg.forwarder.address, "127.0.0.1:6363");
    assert_eq!(cfg.forwarder.mtu, 8800);
    assert_eq!(cfg.forwarder.poll_timeout_ms, 2);
    assert_eq!(cfg.pipeline.window_size, 4096);
}

#[test]
fn test_empty_document_uses_defaults() {
    let cfg = Config::from_yaml_str("{}").expect("empty config parses");
    assert_eq!(cfg.pipeline.window_size, 4096);
}

#[test]
fn test_overrides() {
    let cfg = Config::from_yaml_str(
        r#"
forwarder:
  Address: "10.0.0.1:6363"
  Mtu: 1400
  PollTimeoutMillis: 5
pipeline:
  WindowSize: 128
logger:
  level: "debug"
  output: stdout
  format: json
"#,
    )
    .expect("config parses");

    assert_eq!(cfg.forwarder.address, "10.0.0.1:6363");
    assert_eq!(cfg.forwarder.mtu, 1400);
    assert_eq!(cfg.forwarder.poll_timeout_ms, 5);
    assert_eq!(cfg.pipeline.window_size, 128);
    assert_eq!(cfg.logger.level, "debug");
}

#[test]
fn test_zero_poll_timeout_is_normalized() {
    let cfg = Config::from_yaml_str(
        r#"
forwarder:
  PollTimeoutMillis: 0
"#,
    )
    .expect("config parses");
    assert_eq!(cfg.forwarder.poll_timeout_ms, 1);
}

#[test]
fn test_invalid_values_rejected() {
    assert!(Config::from_yaml_str("pipeline:\n  WindowSize: 0\n").is_err());
    assert!(Config::from_yaml_str("forwarder:\n  Mtu: 100\n").is_err());
    assert!(Config::from_yaml_str("forwarder:\n  Address: \"\"\n").is_err());
}

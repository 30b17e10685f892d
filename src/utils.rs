// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rand::RngExt;

/// Draws a fresh 4-byte Interest nonce.
///
/// Nonces only need to be unlikely to repeat within one Interest lifetime,
/// so the thread-local generator is enough here.
pub fn random_nonce() -> u32 {
    rand::rng().random()
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::{Arc, Mutex, PoisonError};

use rand::{RngExt, SeedableRng, rngs::StdRng};

/// Draws 64-bit PIT tokens for pending Interests.
///
/// Tokens come from an OS-seeded PRNG; the 64-bit space makes clashes between
/// simultaneously-live entries negligible, and the dispatcher still re-rolls
/// on the rare collision at PIT insert. Any worker thread may draw, so the
/// generator state sits behind a small lock.
#[derive(Debug, Clone)]
pub struct PitTokenGenerator {
    rng: Arc<Mutex<StdRng>>,
}

impl PitTokenGenerator {
    pub fn new() -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::from_rng(&mut rand::rng()))),
        }
    }

    /// Deterministic generator for reproducible tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn next(&self) -> u64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random()
    }
}

impl Default for PitTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

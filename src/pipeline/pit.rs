// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::time::Instant;

use crate::pipeline::pending::PendingInterest;

/// Returned when a token is inserted while an entry with the same value is
/// still live.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("duplicate PIT token {0:#018x}")]
pub struct DuplicateToken(pub u64);

/// Consumer-side Pending Interest Table.
///
/// A token→entry map plus a FIFO of tokens in expression order. Since every
/// Interest of a run shares one lifetime, FIFO order is deadline order, so
/// expiry only ever inspects the queue head. Entries satisfied out of order
/// leave their queue slot behind as a tombstone, discarded on the next scan;
/// insert, satisfy and (amortized) expiry all stay O(1).
#[derive(Debug)]
pub struct Pit {
    entries: HashMap<u64, PendingInterest>,
    deadlines: VecDeque<u64>,
    window: usize,
}

impl Pit {
    pub fn with_window(window: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(window),
            deadlines: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.window
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn contains(&self, token: u64) -> bool {
        self.entries.contains_key(&token)
    }

    pub fn get(&self, token: u64) -> Option<&PendingInterest> {
        self.entries.get(&token)
    }

    /// Inserts an expressed entry, appending its token to the deadline queue.
    pub fn insert(&mut self, entry: PendingInterest) -> Result<(), DuplicateToken> {
        if self.entries.contains_key(&entry.token) {
            return Err(DuplicateToken(entry.token));
        }
        self.deadlines.push_back(entry.token);
        self.entries.insert(entry.token, entry);
        Ok(())
    }

    /// Removes an entry out of order (satisfied or nacked). Its deadline-queue
    /// slot stays behind as a tombstone.
    pub fn remove(&mut self, token: u64) -> Option<PendingInterest> {
        self.entries.remove(&token)
    }

    /// The live entry with the earliest deadline, discarding any tombstones
    /// in front of it.
    pub fn peek_oldest(&mut self) -> Option<&PendingInterest> {
        self.discard_tombstones();
        let token = self.deadlines.front()?;
        self.entries.get(token)
    }

    /// Pops the oldest entry if its deadline has passed.
    pub fn take_expired(&mut self, now: Instant) -> Option<PendingInterest> {
        self.discard_tombstones();
        let token = *self.deadlines.front()?;
        let expired = self
            .entries
            .get(&token)
            .is_some_and(|entry| entry.is_expired(now));
        if !expired {
            return None;
        }
        self.deadlines.pop_front();
        self.entries.remove(&token)
    }

    fn discard_tombstones(&mut self) {
        while let Some(token) = self.deadlines.front() {
            if self.entries.contains_key(token) {
                return;
            }
            self.deadlines.pop_front();
        }
    }

    /// Empties the table, yielding every live entry (shutdown path).
    pub fn drain(&mut self) -> Vec<PendingInterest> {
        self.deadlines.clear();
        self.entries.drain().map(|(_, entry)| entry).collect()
    }
}

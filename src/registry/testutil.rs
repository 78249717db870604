// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Shared fixtures for registry tests: a fresh tree with a root key on
//! a deterministic clock, and an in-process handle manager wired to
//! the same mask conventions the dispatcher uses.

#![cfg(test)]

use crate::registry::clock::FixedClock;
use crate::registry::handle::LocalHandleManager;
use crate::registry::key::{KeyFlags, KeyId};
use crate::registry::tree::Registry;

/// A `Registry` plus one anonymous root, ready for path operations.
pub fn fresh_tree(now: u64) -> (Registry<FixedClock>, KeyId) {
    let mut registry = Registry::new(FixedClock(now));
    let root = registry.arena.alloc(None, None, KeyFlags::ROOT, 0);
    (registry, root)
}

pub fn fresh_handle_manager() -> LocalHandleManager {
    LocalHandleManager::new()
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The fixed table of top-level pseudo-keys.
//!
//! Every root is constructed lazily, on first demand, and torn down
//! wholesale at shutdown. `HKEY_CLASSES_ROOT` is not a root in its own
//! right; it aliases a subtree under `HKEY_LOCAL_MACHINE`.

use crate::registry::clock::Clock;
use crate::registry::key::{KeyFlags, KeyId};
use crate::registry::strutil::to_wide;
use crate::registry::tree::Registry;

/// The well-known top-level pseudo-keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKey {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

const ROOT_COUNT: usize = 5;

impl RootKey {
    fn slot(self) -> usize {
        match self {
            RootKey::ClassesRoot => 0,
            RootKey::CurrentUser => 1,
            RootKey::LocalMachine => 2,
            RootKey::Users => 3,
            RootKey::CurrentConfig => 4,
        }
    }

    /// Human label used by the v2 codec when a path's topmost ancestor
    /// is a named root.
    pub fn label(self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }
}

/// Lazily-populated table mapping each [`RootKey`] to its backing
/// [`KeyId`].
#[derive(Default)]
pub struct RootTable {
    slots: [Option<KeyId>; ROOT_COUNT],
}

impl RootTable {
    pub fn new() -> Self {
        Self {
            slots: [None; ROOT_COUNT],
        }
    }

    /// Returns the backing key for `root`, constructing it (and, for
    /// `HKEY_CLASSES_ROOT`, the `HKEY_LOCAL_MACHINE\SOFTWARE\Classes`
    /// path it aliases) on first use.
    pub fn get<C: Clock>(&mut self, registry: &mut Registry<C>, root: RootKey) -> KeyId {
        if let Some(id) = self.slots[root.slot()] {
            return id;
        }

        let id = match root {
            RootKey::ClassesRoot => {
                let local_machine = self.get(registry, RootKey::LocalMachine);
                let (classes, _) = registry
                    .create_key(local_machine, &to_wide("SOFTWARE\\Classes"), None, false)
                    .expect("creating the Classes subtree under a fresh root cannot fail");
                classes
            }
            _ => {
                let now = registry.now();
                registry.arena.alloc(None, None, KeyFlags::ROOT, now)
            }
        };

        self.slots[root.slot()] = Some(id);
        id
    }

    /// Releases every populated slot's reference, for server shutdown.
    pub fn teardown<C: Clock>(&mut self, registry: &mut Registry<C>) {
        for slot in self.slots.iter_mut() {
            if let Some(id) = slot.take() {
                registry.release(id);
            }
        }
    }

    /// Returns the human label for `id`, when it is a currently
    /// populated root slot. Used by the v2 codec's path dumper.
    pub fn label_for(&self, id: KeyId) -> Option<&'static str> {
        const ORDER: [RootKey; ROOT_COUNT] = [
            RootKey::ClassesRoot,
            RootKey::CurrentUser,
            RootKey::LocalMachine,
            RootKey::Users,
            RootKey::CurrentConfig,
        ];
        self.slots
            .iter()
            .position(|slot| *slot == Some(id))
            .map(|i| ORDER[i].label())
    }
}

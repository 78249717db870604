// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Handle resolution and the external-collaborator seams.
//!
//! The dispatcher never touches a [`KeyId`] directly from a request;
//! it resolves an opaque [`Hkey`] through a [`HandleManager`]. This
//! crate treats the real handle manager, and the byte streams used by
//! load/save, as external collaborators (server §6) — [`LocalHandleManager`]
//! and [`FsRegistryIo`] are the in-process stand-ins exercised by tests
//! and the demo binary.

use crate::registry::clock::Clock;
use crate::registry::error::{not_found, RegResult};
use crate::registry::key::KeyId;
use crate::registry::tree::Registry;
use std::collections::HashMap;
use std::io::{Read, Write};

/// An opaque per-process capability referring to a key. Well-known
/// small values (see `roots.rs`) identify roots without consuming a
/// handle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hkey(pub u64);

/// Access mask bits carried on every RPC request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessMask(u32);

impl AccessMask {
    pub const NONE: AccessMask = AccessMask(0);
    pub const CREATE_SUB_KEY: AccessMask = AccessMask(0b0000_0001);
    pub const ENUMERATE_SUB_KEYS: AccessMask = AccessMask(0b0000_0010);
    pub const QUERY_VALUE: AccessMask = AccessMask(0b0000_0100);
    pub const SET_VALUE: AccessMask = AccessMask(0b0000_1000);
    pub const MAXIMUM_ALLOWED: AccessMask = AccessMask(0b0001_0000);
    pub const KEY_ALL_ACCESS: AccessMask = AccessMask(0b0000_1111);

    pub fn contains(self, other: AccessMask) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Coerces a `MAXIMUM_ALLOWED` request into `KEY_ALL_ACCESS`, per
    /// the dispatcher's access-resolution rule.
    pub fn resolve(self) -> AccessMask {
        if self.contains(AccessMask::MAXIMUM_ALLOWED) {
            AccessMask::KEY_ALL_ACCESS
        } else {
            self
        }
    }
}

impl std::ops::BitOr for AccessMask {
    type Output = AccessMask;
    fn bitor(self, rhs: AccessMask) -> AccessMask {
        AccessMask(self.0 | rhs.0)
    }
}

/// Resolves handles to tree nodes and mints new ones. Stands in for
/// the generic object/handle manager the real server provides.
pub trait HandleManager<C: Clock> {
    /// Resolves `hkey` to a key reference, checking `access` the way
    /// the real object manager would. Returns a new reference to the
    /// target the caller owns and must eventually release.
    fn resolve(&mut self, registry: &mut Registry<C>, hkey: Hkey, access: AccessMask) -> RegResult<KeyId>;

    /// Mints a new handle referring to `id`, which must already carry
    /// the reference the handle will own.
    fn alloc_handle(&mut self, id: KeyId) -> Hkey;

    /// Closes `hkey`, releasing the reference it held.
    fn close_handle(&mut self, registry: &mut Registry<C>, hkey: Hkey) -> RegResult<()>;
}

/// A simple in-process handle table: sequential integer handles
/// mapped to key ids, with the access mask each handle was opened
/// with ignored (access enforcement belongs to the real object
/// manager, not this stand-in).
#[derive(Default)]
pub struct LocalHandleManager {
    table: HashMap<u64, KeyId>,
    next: u64,
}

impl LocalHandleManager {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            next: 1,
        }
    }
}

impl<C: Clock> HandleManager<C> for LocalHandleManager {
    fn resolve(&mut self, registry: &mut Registry<C>, hkey: Hkey, _access: AccessMask) -> RegResult<KeyId> {
        let id = *self
            .table
            .get(&hkey.0)
            .ok_or_else(|| not_found(format!("no such handle: {}", hkey.0)))?;
        Ok(registry.arena.add_ref(id))
    }

    fn alloc_handle(&mut self, id: KeyId) -> Hkey {
        let handle = Hkey(self.next);
        self.next += 1;
        self.table.insert(handle.0, id);
        handle
    }

    fn close_handle(&mut self, registry: &mut Registry<C>, hkey: Hkey) -> RegResult<()> {
        let id = self
            .table
            .remove(&hkey.0)
            .ok_or_else(|| not_found(format!("no such handle: {}", hkey.0)))?;
        registry.release(id);
        Ok(())
    }
}

/// Supplies the byte streams `load_registry`/`save_registry` adopt.
/// Stands in for `get_read_fd`/`get_write_fd` on the external object.
pub trait RegistryIo {
    fn open_read(&self, path: &str) -> std::io::Result<Box<dyn Read>>;
    fn open_write(&self, path: &str) -> std::io::Result<Box<dyn Write>>;
}

/// Plain filesystem-backed implementation, used by the demo binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRegistryIo;

impl RegistryIo for FsRegistryIo {
    fn open_read(&self, path: &str) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn open_write(&self, path: &str) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(std::fs::File::create(path)?))
    }
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The RPC opcode dispatcher.
//!
//! Each handler resolves its `hkey` argument through [`HandleManager`]
//! (or the root table, for well-known root values), performs the tree
//! or value operation, and releases every reference it acquired on
//! every exit path — including the error paths, which is why each
//! handler is written as a small guarded block rather than an early
//! return past an open reference.

use crate::registry::clock::Clock;
use crate::registry::codec::v1;
use crate::registry::codec::v2::{self as v2_mod, LabelResolver};
use crate::registry::config::{SavingVersion, ServerConfig};
use crate::registry::diag::Diagnostics;
use crate::registry::error::{io_error, RegError, RegResult};
use crate::registry::handle::{AccessMask, HandleManager, Hkey, RegistryIo};
use crate::registry::key::{KeyFlags, ValueType};
use crate::registry::roots::{RootKey, RootTable};
use crate::registry::strutil::Wstr;
use crate::registry::tree::{QueryKeyInfo, Registry};
use crate::registry::value;
use std::io::{BufReader, Write};
use std::time::{Duration, Instant};

/// Either a well-known root value or a handle minted by a prior
/// `create_key`/`open_key` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRef {
    Root(RootKey),
    Handle(Hkey),
}

/// One RPC request, matching the opcode table.
pub enum Request {
    CreateKey {
        base: KeyRef,
        subpath: Wstr,
        class: Option<Wstr>,
        volatile: bool,
    },
    OpenKey {
        base: KeyRef,
        subpath: Wstr,
    },
    DeleteKey {
        base: KeyRef,
        subpath: Wstr,
    },
    CloseKey {
        hkey: Hkey,
    },
    EnumKey {
        base: KeyRef,
        index: usize,
    },
    QueryKeyInfo {
        base: KeyRef,
    },
    SetKeyValue {
        base: KeyRef,
        name: Wstr,
        value_type: ValueType,
        data: Vec<u8>,
    },
    GetKeyValue {
        base: KeyRef,
        name: Wstr,
    },
    EnumKeyValue {
        base: KeyRef,
        index: usize,
    },
    DeleteKeyValue {
        base: KeyRef,
        name: Wstr,
    },
    LoadRegistry {
        base: KeyRef,
        path: String,
    },
    SaveRegistry {
        base: KeyRef,
        path: String,
        saving_version: SavingVersion,
    },
    SetRegistryLevels {
        current_level: u32,
        saving_level: u32,
    },
}

/// The corresponding reply.
pub enum Response {
    NewHandle { hkey: Hkey, created: bool },
    Empty,
    KeyInfo { name: Wstr, class: Option<Wstr>, modif: u64 },
    QueryInfo(QueryKeyInfo),
    Value { value_type: ValueType, data: Vec<u8> },
    NamedValue { name: Wstr, value_type: ValueType, data: Vec<u8> },
}

/// Dispatches requests against a registry, mediating every `hkey`
/// through the root table and a handle manager.
pub struct Dispatcher<C: Clock, H: HandleManager<C>, IO: RegistryIo> {
    pub roots: RootTable,
    pub handles: H,
    pub io: IO,
    pub config: ServerConfig,
    _clock: std::marker::PhantomData<C>,
}

impl<C: Clock, H: HandleManager<C>, IO: RegistryIo> Dispatcher<C, H, IO> {
    pub fn new(handles: H, io: IO, config: ServerConfig) -> Self {
        Self {
            roots: RootTable::new(),
            handles,
            io,
            config,
            _clock: std::marker::PhantomData,
        }
    }

    fn resolve<W: Write>(
        &mut self,
        registry: &mut Registry<C>,
        base: KeyRef,
        access: AccessMask,
        diag: &mut Diagnostics<W>,
    ) -> RegResult<crate::registry::key::KeyId> {
        let resolved_access = access.resolve();
        let id = match base {
            KeyRef::Root(root) => {
                let root_id = self.roots.get(registry, root);
                registry.arena.add_ref(root_id)
            }
            KeyRef::Handle(hkey) => self.handles.resolve(registry, hkey, resolved_access)?,
        };
        if diag.debug_level() > 1 {
            let label_of: &LabelResolver = &|id| self.roots.label_for(id);
            diag.trace(&format!("resolved hkey to {}", v2_mod::dump_path(registry, id, label_of)));
        }
        Ok(id)
    }

    /// Runs `request`, returning the reply and the time spent.
    pub fn dispatch<W: Write>(
        &mut self,
        registry: &mut Registry<C>,
        request: Request,
        diag: &mut Diagnostics<W>,
    ) -> (RegResult<Response>, Duration) {
        let start = Instant::now();
        let result = self.dispatch_inner(registry, request, diag);
        (result, start.elapsed())
    }

    fn dispatch_inner<W: Write>(
        &mut self,
        registry: &mut Registry<C>,
        request: Request,
        diag: &mut Diagnostics<W>,
    ) -> RegResult<Response> {
        match request {
            Request::CreateKey { base, subpath, class, volatile } => {
                let base_id = self.resolve(registry, base, AccessMask::CREATE_SUB_KEY, diag)?;
                let result = registry.create_key(base_id, &subpath, class, volatile);
                registry.release(base_id);
                let (key_id, created) = result?;
                let hkey = self.handles.alloc_handle(key_id);
                Ok(Response::NewHandle { hkey, created })
            }

            Request::OpenKey { base, subpath } => {
                let base_id = self.resolve(registry, base, AccessMask::NONE, diag)?;
                let result = registry.open_key(base_id, &subpath);
                registry.release(base_id);
                let key_id = result?;
                let hkey = self.handles.alloc_handle(key_id);
                Ok(Response::NewHandle { hkey, created: false })
            }

            Request::DeleteKey { base, subpath } => {
                let base_id = self.resolve(registry, base, AccessMask::CREATE_SUB_KEY, diag)?;
                let result = registry.delete_key(base_id, &subpath);
                registry.release(base_id);
                result?;
                Ok(Response::Empty)
            }

            Request::CloseKey { hkey } => {
                match self.handles.close_handle(registry, hkey) {
                    Ok(()) => {}
                    Err(_) => {}
                }
                Ok(Response::Empty)
            }

            Request::EnumKey { base, index } => {
                let base_id = self.resolve(registry, base, AccessMask::ENUMERATE_SUB_KEYS, diag)?;
                let result = registry.enum_key(base_id, index);
                registry.release(base_id);
                let (name, class, modif) = result?;
                Ok(Response::KeyInfo { name, class, modif })
            }

            Request::QueryKeyInfo { base } => {
                let base_id = self.resolve(registry, base, AccessMask::QUERY_VALUE, diag)?;
                let info = registry.query_key(base_id);
                registry.release(base_id);
                Ok(Response::QueryInfo(info))
            }

            Request::SetKeyValue { base, name, value_type, data } => {
                let base_id = self.resolve(registry, base, AccessMask::SET_VALUE, diag)?;
                if data.len() > self.config.max_value_len {
                    registry.release(base_id);
                    return Err(RegError::OutOfMemory(format!(
                        "value data length {} exceeds max_value_len {}",
                        data.len(),
                        self.config.max_value_len
                    )));
                }
                let now = registry.now();
                let current_level = registry.current_level;
                let key = registry.arena.get_mut(base_id);
                value::set_value(key, &name, value_type, &data, now, current_level);
                registry.release(base_id);
                Ok(Response::Empty)
            }

            Request::GetKeyValue { base, name } => {
                let base_id = self.resolve(registry, base, AccessMask::QUERY_VALUE, diag)?;
                let result = {
                    let key = registry.arena.get(base_id);
                    value::get_value(key, &name).map(|(t, d)| (t, d.to_vec()))
                };
                registry.release(base_id);
                let (value_type, data) = result?;
                Ok(Response::Value { value_type, data })
            }

            Request::EnumKeyValue { base, index } => {
                let base_id = self.resolve(registry, base, AccessMask::QUERY_VALUE, diag)?;
                let result = {
                    let key = registry.arena.get(base_id);
                    value::enum_value(key, index)
                        .map(|v| (v.name.clone(), v.value_type, v.data.clone().unwrap_or_default()))
                };
                registry.release(base_id);
                let (name, value_type, data) = result?;
                Ok(Response::NamedValue { name, value_type, data })
            }

            Request::DeleteKeyValue { base, name } => {
                let base_id = self.resolve(registry, base, AccessMask::SET_VALUE, diag)?;
                let now = registry.now();
                let current_level = registry.current_level;
                let result = {
                    let key = registry.arena.get_mut(base_id);
                    value::delete_value(key, &name, now, current_level)
                };
                registry.release(base_id);
                result?;
                Ok(Response::Empty)
            }

            Request::LoadRegistry { base, path } => {
                let access = AccessMask::SET_VALUE | AccessMask::CREATE_SUB_KEY;
                let base_id = self.resolve(registry, base, access, diag)?;
                let result = match self.io.open_read(&path) {
                    Ok(stream) => v2_mod::load_registry(registry, base_id, BufReader::new(stream), diag),
                    Err(e) => Err(io_error("load_registry", path.clone(), e.to_string())),
                };
                registry.release(base_id);
                result?;
                Ok(Response::Empty)
            }

            Request::SaveRegistry { base, path, saving_version } => {
                let access = AccessMask::QUERY_VALUE | AccessMask::ENUMERATE_SUB_KEYS;
                let base_id = self.resolve(registry, base, access, diag)?;
                let result = match self.io.open_write(&path) {
                    Ok(mut stream) => match saving_version {
                        SavingVersion::V2 => {
                            let label_of: &LabelResolver = &|id| self.roots.label_for(id);
                            v2_mod::save_registry(registry, base_id, label_of, &mut stream)
                        }
                        SavingVersion::V1 => {
                            v1::update_level(&mut registry.arena, base_id);
                            v1::save_v1(registry, base_id, &mut stream)
                        }
                    },
                    Err(e) => Err(io_error("save_registry", path.clone(), e.to_string())),
                };
                registry.release(base_id);
                result?;
                Ok(Response::Empty)
            }

            Request::SetRegistryLevels { current_level, saving_level } => {
                registry.current_level = current_level;
                registry.saving_level = saving_level;
                Ok(Response::Empty)
            }
        }
    }

    pub fn shutdown(&mut self, registry: &mut Registry<C>) {
        self.roots.teardown(registry);
    }
}

/// Flags a subtree as volatile-only, the discipline
/// `create_key` relies on when `VOLATILE` is requested at the root of
/// a new chain. Exposed for callers assembling `Request::CreateKey`
/// outside the demo binary's own request-building helpers.
pub fn volatile_flags() -> KeyFlags {
    KeyFlags::VOLATILE
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Path-based operations over the key tree: open, create, delete,
//! enumerate, and query.

use crate::registry::clock::Clock;
use crate::registry::error::{not_found, RegError, RegResult};
use crate::registry::key::{Arena, KeyFlags, KeyId};
use crate::registry::strutil::{from_wide, split_path, Wstr};

/// Attributes returned by `query_key`: counts, maxima, and the parent's
/// own class string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKeyInfo {
    pub subkeys: usize,
    pub values: usize,
    pub max_subkey: usize,
    pub max_class: usize,
    pub max_value: usize,
    pub max_data: usize,
    pub modif: u64,
    pub class: Option<Wstr>,
}

/// Owns the key arena plus the two process-wide level integers that
/// gate which keys are savable.
pub struct Registry<C: Clock> {
    pub arena: Arena,
    pub current_level: u32,
    pub saving_level: u32,
    clock: C,
    alloc_budget: Option<u32>,
}

impl<C: Clock> Registry<C> {
    pub fn new(clock: C) -> Self {
        Self {
            arena: Arena::new(),
            current_level: 0,
            saving_level: 0,
            clock,
            alloc_budget: None,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Limits the number of subkey allocations `create_key` may perform
    /// before failing with `OUTOFMEMORY`, for exercising the rollback
    /// path deterministically in tests.
    pub fn set_alloc_budget(&mut self, n: u32) {
        self.alloc_budget = Some(n);
    }

    pub fn clear_alloc_budget(&mut self) {
        self.alloc_budget = None;
    }

    fn consume_alloc_budget(&mut self) -> RegResult<()> {
        if let Some(budget) = self.alloc_budget.as_mut() {
            if *budget == 0 {
                return Err(RegError::OutOfMemory(
                    "allocation budget exhausted".to_string(),
                ));
            }
            *budget -= 1;
        }
        Ok(())
    }

    pub fn release(&mut self, id: KeyId) {
        self.arena.release(id);
    }

    /// Finds or creates a single named child of `parent`, without any
    /// path tokenization. Used by the text-codec loader, which already
    /// has each path segment unescaped and must not re-split it on any
    /// backslash the name happens to contain.
    pub fn ensure_subkey(&mut self, parent: KeyId, name: &[u16]) -> KeyId {
        match self.arena.find_subkey(parent, name) {
            Ok((child, _)) => child,
            Err(index) => {
                let now = self.clock.now();
                self.arena
                    .alloc_subkey(parent, name.to_vec(), index, KeyFlags::empty(), now)
            }
        }
    }

    /// Tokenizes `path` and descends one token per step. An empty path
    /// returns `base` itself with a new reference.
    pub fn open_key(&mut self, base: KeyId, path: &[u16]) -> RegResult<KeyId> {
        let tokens = split_path(path);
        let mut current = base;
        for token in &tokens {
            match self.arena.find_subkey(current, token) {
                Ok((child, _)) => current = child,
                Err(_) => return Err(not_found(from_wide(token))),
            }
        }
        Ok(self.arena.add_ref(current))
    }

    /// Creates (or opens, if it already exists) the key named by
    /// `path` under `base`. Returns the new reference and whether any
    /// segment had to be allocated.
    pub fn create_key(
        &mut self,
        base: KeyId,
        path: &[u16],
        class: Option<Wstr>,
        volatile: bool,
    ) -> RegResult<(KeyId, bool)> {
        if self.arena.get(base).is_deleted() {
            return Err(RegError::KeyDeleted("base key is deleted".to_string()));
        }

        let new_flags = if volatile {
            KeyFlags::VOLATILE
        } else if self.arena.get(base).is_volatile() {
            return Err(RegError::ChildMustBeVolatile);
        } else {
            KeyFlags::empty()
        };

        let tokens = split_path(path);
        if tokens.is_empty() {
            if let Some(class) = class {
                self.arena.get_mut(base).class = Some(class);
            }
            return Ok((self.arena.add_ref(base), false));
        }

        let mut current = base;
        let mut created_any = false;
        let mut anchor: Option<(KeyId, usize)> = None;

        for token in &tokens {
            match self.arena.find_subkey(current, token) {
                Ok((child, _)) => current = child,
                Err(index) => {
                    if let Err(err) = self.consume_alloc_budget() {
                        if let Some((anchor_parent, anchor_index)) = anchor {
                            self.arena.free_subkey(anchor_parent, anchor_index);
                        }
                        return Err(err);
                    }
                    let now = self.clock.now();
                    let new_id =
                        self.arena
                            .alloc_subkey(current, token.clone(), index, new_flags, now);
                    if anchor.is_none() {
                        anchor = Some((current, index));
                    }
                    created_any = true;
                    current = new_id;
                }
            }
        }

        if let Some(class) = class {
            self.arena.get_mut(current).class = Some(class);
        }

        Ok((self.arena.add_ref(current), created_any))
    }

    /// Deletes the key named by `path` under `base` (or `base` itself
    /// when `path` is empty). Fails if the target is a root or still
    /// has subkeys, or if it (or an ancestor on the walk) is already
    /// deleted.
    pub fn delete_key(&mut self, base: KeyId, path: &[u16]) -> RegResult<()> {
        let tokens = split_path(path);
        let mut current = base;
        let mut parent: Option<KeyId> = None;

        for token in &tokens {
            if self.arena.get(current).is_deleted() {
                return Err(RegError::KeyDeleted("ancestor key is deleted".to_string()));
            }
            match self.arena.find_subkey(current, token) {
                Ok((child, _)) => {
                    parent = Some(current);
                    current = child;
                }
                Err(_) => return Err(not_found(from_wide(token))),
            }
        }

        let target = current;
        let parent = if tokens.is_empty() {
            self.arena.get(base).parent
        } else {
            parent
        };

        if self.arena.get(target).is_deleted() {
            return Err(RegError::KeyDeleted("target key is deleted".to_string()));
        }
        if self.arena.get(target).is_root() {
            return Err(RegError::AccessDenied("cannot delete a root key".to_string()));
        }
        if !self.arena.get(target).subkeys.is_empty() {
            return Err(RegError::AccessDenied(
                "key still has subkeys".to_string(),
            ));
        }

        let parent =
            parent.ok_or_else(|| RegError::AccessDenied("key has no parent".to_string()))?;
        let target_name = self.arena.get(target).name.clone().unwrap_or_default();
        let index = self
            .arena
            .get(parent)
            .find_subkey_index(&self.arena, &target_name)
            .expect("target must be present among its parent's subkeys");

        self.arena.free_subkey(parent, index);
        let now = self.clock.now();
        let current_level = self.current_level;
        self.arena.touch_key(parent, now, current_level);
        Ok(())
    }

    /// Returns `(name, class, modif)` of the subkey at `index`, or
    /// `NO_MORE_ITEMS` once past the end.
    pub fn enum_key(&self, key: KeyId, index: usize) -> RegResult<(Wstr, Option<Wstr>, u64)> {
        let parent = self.arena.get(key);
        match parent.subkeys.get(index) {
            Some(&child_id) => {
                let child = self.arena.get(child_id);
                Ok((
                    child.name.clone().unwrap_or_default(),
                    child.class.clone(),
                    child.modif,
                ))
            }
            None => Err(RegError::NoMoreItems),
        }
    }

    /// Returns counts, maxima, modification time, and class for `key`.
    ///
    /// The maxima loops intentionally stop one element short of the
    /// end (`i < last_subkey`, `i < last_value`), mirroring a
    /// documented quirk in the system this core replaces rather than
    /// silently correcting it.
    pub fn query_key(&self, key: KeyId) -> QueryKeyInfo {
        let k = self.arena.get(key);
        let mut max_subkey = 0;
        let mut max_class = 0;
        if let Some(last_subkey) = k.last_subkey() {
            for i in 0..last_subkey {
                let child = self.arena.get(*k.subkeys.get(i).unwrap());
                max_subkey = max_subkey.max(child.name.as_ref().map(|n| n.len()).unwrap_or(0));
                max_class = max_class.max(child.class.as_ref().map(|c| c.len()).unwrap_or(0));
            }
        }

        let mut max_value = 0;
        let mut max_data = 0;
        if let Some(last_value) = k.last_value() {
            for i in 0..last_value {
                let v = k.values.get(i).unwrap();
                max_value = max_value.max(v.name.len());
                max_data = max_data.max(v.len());
            }
        }

        QueryKeyInfo {
            subkeys: k.subkeys.len(),
            values: k.values.len(),
            max_subkey,
            max_class,
            max_value,
            max_data,
            modif: k.modif,
            class: k.class.clone(),
        }
    }
}

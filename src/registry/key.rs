// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The key tree: nodes, flags, values, and the arena that owns them.
//!
//! Parent/child references are cyclic by nature (a child points back
//! to its parent, the parent's array owns the child). Rather than
//! reach for `Rc<RefCell<_>>` cycles, every key lives in a flat arena
//! and refers to others purely by [`KeyId`] index — the ownership edge
//! from parent to child is a reference count the arena tracks, not a
//! smart pointer.

use crate::registry::array::SortedArray;
use crate::registry::strutil::{strcmpi_w, Wstr};

/// Minimal bitflags implementation, scoped to the three flag bits this
/// crate needs, avoiding a dependency this stack doesn't otherwise carry.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name($ty);

        impl $name {
            $(pub const $flag: $name = $name($value);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: $name) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

pub const MIN_SUBKEYS: usize = 8;
pub const MIN_VALUES: usize = 8;

/// Arena index referring to a [`Key`]. Cheap to copy; stable for the
/// node's lifetime in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u32);

impl KeyId {
    fn new(index: usize) -> Self {
        KeyId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags_lite! {
    /// Flags on a [`Key`]. `VOLATILE` is transitive to descendants
    /// (enforced at creation time, not re-checked continuously).
    pub struct KeyFlags: u8 {
        const VOLATILE = 0b001;
        const DELETED  = 0b010;
        const ROOT     = 0b100;
    }
}

/// Integer type tag for a [`KeyValue`]'s payload, mirroring the small
/// closed set the text codec understands plus an escape hatch for
/// anything else encountered on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Sz,
    ExpandSz,
    Binary,
    Dword,
    MultiSz,
    Other(u32),
}

impl ValueType {
    pub fn as_raw(self) -> u32 {
        match self {
            ValueType::Sz => 1,
            ValueType::ExpandSz => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::MultiSz => 7,
            ValueType::Other(n) => n,
        }
    }

    pub fn from_raw(n: u32) -> Self {
        match n {
            1 => ValueType::Sz,
            2 => ValueType::ExpandSz,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            7 => ValueType::MultiSz,
            other => ValueType::Other(other),
        }
    }
}

/// A named, typed byte blob attached to a [`Key`]. The empty name
/// denotes the key's "default" value.
#[derive(Debug, Clone)]
pub struct KeyValue {
    pub name: Wstr,
    pub value_type: ValueType,
    pub data: Option<Vec<u8>>,
}

impl KeyValue {
    pub fn new(name: Wstr) -> Self {
        Self {
            name,
            value_type: ValueType::Binary,
            data: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map(|d| d.len()).unwrap_or(0)
    }
}

/// A node in the registry tree.
#[derive(Debug)]
pub struct Key {
    pub name: Option<Wstr>,
    pub class: Option<Wstr>,
    pub parent: Option<KeyId>,
    pub subkeys: SortedArray<KeyId>,
    pub values: SortedArray<KeyValue>,
    pub flags: KeyFlags,
    pub level: u32,
    pub modif: u64,
    refcount: u32,
}

impl Key {
    fn new(name: Option<Wstr>, parent: Option<KeyId>, flags: KeyFlags, modif: u64) -> Self {
        Self {
            name,
            class: None,
            parent,
            subkeys: SortedArray::new(MIN_SUBKEYS),
            values: SortedArray::new(MIN_VALUES),
            flags,
            level: 0,
            modif,
            refcount: 1,
        }
    }

    pub fn is_volatile(&self) -> bool {
        self.flags.contains(KeyFlags::VOLATILE)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags.contains(KeyFlags::DELETED)
    }

    pub fn is_root(&self) -> bool {
        self.flags.contains(KeyFlags::ROOT)
    }

    pub fn last_subkey(&self) -> Option<usize> {
        self.subkeys.len().checked_sub(1)
    }

    pub fn last_value(&self) -> Option<usize> {
        self.values.len().checked_sub(1)
    }

    /// Binary search for a subkey id by name among this key's children.
    pub fn find_subkey_index(&self, arena: &Arena, name: &[u16]) -> Result<usize, usize> {
        self.subkeys.binary_search_by(|&id| {
            let child_name = arena.get(id).name.as_deref().unwrap_or(&[]);
            strcmpi_w(child_name, name)
        })
    }

    pub fn find_value_index(&self, name: &[u16]) -> Result<usize, usize> {
        self.values.binary_search_by(|v| strcmpi_w(&v.name, name))
    }
}

/// Owns every live [`Key`], indexed by [`KeyId`].
#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Option<Key>>,
    free: Vec<usize>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocates a new root-less key with an initial reference count
    /// of one, owned by whichever caller holds the returned id.
    pub fn alloc(&mut self, name: Option<Wstr>, parent: Option<KeyId>, flags: KeyFlags, modif: u64) -> KeyId {
        let key = Key::new(name, parent, flags, modif);
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(key);
            KeyId::new(slot)
        } else {
            self.slots.push(Some(key));
            KeyId::new(self.slots.len() - 1)
        }
    }

    pub fn get(&self, id: KeyId) -> &Key {
        self.slots[id.index()]
            .as_ref()
            .expect("dangling KeyId used after destruction")
    }

    pub fn get_mut(&mut self, id: KeyId) -> &mut Key {
        self.slots[id.index()]
            .as_mut()
            .expect("dangling KeyId used after destruction")
    }

    pub fn try_get(&self, id: KeyId) -> Option<&Key> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    /// Number of keys currently live in the arena, for leak checks.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Adds one reference to `id`, returning it unchanged for chaining.
    pub fn add_ref(&mut self, id: KeyId) -> KeyId {
        self.get_mut(id).refcount += 1;
        id
    }

    /// Releases one reference to `id`. When the count reaches zero the
    /// key is destroyed: its subkey array's owning references are
    /// released (recursively tearing down any subtree that becomes
    /// unreachable), then the slot is freed.
    pub fn release(&mut self, id: KeyId) {
        let refcount = {
            let key = self.get_mut(id);
            key.refcount -= 1;
            key.refcount
        };
        if refcount > 0 {
            return;
        }
        let children: Vec<KeyId> = self.get(id).subkeys.iter().copied().collect();
        for child in children {
            self.get_mut(child).parent = None;
            self.release(child);
        }
        self.slots[id.index()] = None;
        self.free.push(id.index());
    }

    /// Finds `name` among `parent`'s subkeys.
    pub fn find_subkey(&self, parent: KeyId, name: &[u16]) -> Result<(KeyId, usize), usize> {
        let key = self.get(parent);
        match key.find_subkey_index(self, name) {
            Ok(index) => Ok((*key.subkeys.get(index).unwrap(), index)),
            Err(index) => Err(index),
        }
    }

    /// Allocates a new child of `parent` named `name` at sorted
    /// position `index`, with an owning reference held by the
    /// parent's subkey array.
    pub fn alloc_subkey(
        &mut self,
        parent: KeyId,
        name: Wstr,
        index: usize,
        flags: KeyFlags,
        modif: u64,
    ) -> KeyId {
        let child = self.alloc(Some(name), Some(parent), flags, modif);
        self.get_mut(parent).subkeys.insert(index, child);
        child
    }

    /// Removes the subkey at `index` from `parent`, flags it
    /// `DELETED`, clears its parent pointer, and releases the
    /// parent array's owning reference.
    pub fn free_subkey(&mut self, parent: KeyId, index: usize) {
        let child = *self.get(parent).subkeys.get(index).unwrap();
        self.get_mut(parent).subkeys.remove(index);
        {
            let child_key = self.get_mut(child);
            child_key.flags.insert(KeyFlags::DELETED);
            child_key.parent = None;
        }
        self.release(child);
    }

    /// Sets `modif = now` and raises `level` to at least `current_level`.
    pub fn touch_key(&mut self, id: KeyId, now: u64, current_level: u32) {
        let key = self.get_mut(id);
        key.modif = now;
        key.level = key.level.max(current_level);
    }
}

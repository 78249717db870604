// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Value operations within a single key's value array.
//!
//! All indexed into `Key::values`; the binary-search discipline is
//! shared with subkeys via [`Key::find_value_index`].

use crate::registry::error::{not_found, RegError, RegResult};
use crate::registry::key::{Key, KeyValue, ValueType};
use crate::registry::strutil::Wstr;

/// Finds `name` in `key`'s values, returning the matching record.
pub fn find_value<'a>(key: &'a Key, name: &[u16]) -> Option<&'a KeyValue> {
    key.find_value_index(name).ok().and_then(|i| key.values.get(i))
}

/// Looks up `name`, inserting a zero-initialized slot if absent.
/// Returns the index of the (possibly new) slot.
pub fn insert_value(key: &mut Key, name: &Wstr) -> usize {
    match key.find_value_index(name) {
        Ok(index) => index,
        Err(index) => {
            key.values.insert(index, KeyValue::new(name.clone()));
            index
        }
    }
}

/// Sets `name`'s type and data, inserting the slot if it does not yet
/// exist. `bytes` is copied before any mutation so a failure leaves
/// the key untouched (there is no fallible copy in safe Rust, but the
/// ordering mirrors the source's copy-before-commit discipline).
pub fn set_value(key: &mut Key, name: &Wstr, value_type: ValueType, bytes: &[u8], now: u64, current_level: u32) {
    let owned = bytes.to_vec();
    let index = insert_value(key, name);
    let slot = key.values.get_mut(index).unwrap();
    slot.value_type = value_type;
    slot.data = if owned.is_empty() { None } else { Some(owned) };
    key.modif = now;
    key.level = key.level.max(current_level);
}

/// Reads `name`'s type and data. On a miss, reports `FILE_NOT_FOUND`
/// (callers that need the source's `type = -1` convention can match on
/// the error and substitute it at the RPC boundary).
pub fn get_value<'a>(key: &'a Key, name: &[u16]) -> RegResult<(ValueType, &'a [u8])> {
    match find_value(key, name) {
        Some(value) => Ok((value.value_type, value.data.as_deref().unwrap_or(&[]))),
        None => Err(not_found(String::from_utf16_lossy(name))),
    }
}

/// Returns the value at `index`, or `NO_MORE_ITEMS` once past the end.
pub fn enum_value(key: &Key, index: usize) -> RegResult<&KeyValue> {
    key.values.get(index).ok_or(RegError::NoMoreItems)
}

/// Removes `name` from `key`'s values, touching the key on success.
pub fn delete_value(key: &mut Key, name: &[u16], now: u64, current_level: u32) -> RegResult<()> {
    match key.find_value_index(name) {
        Ok(index) => {
            key.values.remove(index);
            key.modif = now;
            key.level = key.level.max(current_level);
            Ok(())
        }
        Err(_) => Err(not_found(String::from_utf16_lossy(name))),
    }
}

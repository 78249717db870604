// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The legacy text codec (format version 1). Write-only: nothing in
//! this core ever loads a v1 file back in.
//!
//! Indentation replaces v2's bracketed path syntax: one tab per
//! nesting level. Before writing, [`update_level`] propagates each
//! subtree's maximum level up to its root, so a single `level <
//! saving_level` check at each key mirrors v2's "saved implicitly via
//! children" rule without needing the lookahead v2 uses.

use crate::registry::clock::Clock;
use crate::registry::error::RegResult;
use crate::registry::key::{Arena, KeyId, ValueType};
use crate::registry::strutil::bytes_to_wide;
use crate::registry::tree::Registry;
use std::io::Write;

/// Recomputes `key.level` as the maximum level found anywhere in its
/// subtree, recursively, and returns that value.
pub fn update_level(arena: &mut Arena, key: KeyId) -> u32 {
    let children: Vec<KeyId> = arena.get(key).subkeys.iter().copied().collect();
    let mut max_level = arena.get(key).level;
    for child in children {
        max_level = max_level.max(update_level(arena, child));
    }
    arena.get_mut(key).level = max_level;
    max_level
}

/// Writes `key` and its savable descendants in the v1 indentation
/// format. Callers must call [`update_level`] on the subtree first.
pub fn save_v1<C: Clock, W: Write>(registry: &Registry<C>, key: KeyId, writer: &mut W) -> RegResult<()> {
    write_key(registry, key, writer, 0)
}

fn write_key<C: Clock, W: Write>(
    registry: &Registry<C>,
    key: KeyId,
    writer: &mut W,
    nesting: usize,
) -> RegResult<()> {
    let k = registry.arena.get(key);
    if k.is_volatile() || k.level < registry.saving_level {
        return Ok(());
    }

    let indent = "\t".repeat(nesting);
    let name = k.name.as_deref().map(escape_v1).unwrap_or_default();
    writeln!(writer, "{}{}", indent, name)?;

    let value_indent = "\t".repeat(nesting + 1);
    for value in k.values.iter() {
        let payload = match value.value_type {
            ValueType::Sz | ValueType::ExpandSz | ValueType::MultiSz => {
                escape_v1(&bytes_to_wide(value.data.as_deref().unwrap_or(&[])))
            }
            _ => value
                .data
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect(),
        };
        let name = escape_v1(&value.name);
        writeln!(
            writer,
            "{}{}={},0,{}",
            value_indent,
            name,
            value.value_type.as_raw(),
            payload
        )?;
    }

    let children: Vec<KeyId> = k.subkeys.iter().copied().collect();
    for child in children {
        write_key(registry, child, writer, nesting + 1)?;
    }
    Ok(())
}

fn escape_v1(s: &[u16]) -> String {
    let mut out = String::new();
    for &c in s {
        if c == b'\\' as u16 {
            out.push_str("\\\\");
        } else if c > 0x7F || c == b'\n' as u16 || c == b'=' as u16 {
            out.push_str(&format!("\\u{:04x}", c));
        } else {
            out.push(char::from_u32(c as u32).unwrap());
        }
    }
    out
}

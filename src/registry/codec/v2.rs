// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The primary text codec (format version 2).
//!
//! Export walks the tree depth-first, skipping volatile subtrees and
//! keys below the saving level. Import tokenizes the file line by
//! line, tolerating and logging per-line parse errors rather than
//! aborting the whole load.

use crate::registry::clock::Clock;
use crate::registry::codec::escape::{dump_str_w, parse_str_w};
use crate::registry::diag::Diagnostics;
use crate::registry::error::{RegError, RegResult};
use crate::registry::key::{KeyId, ValueType};
use crate::registry::strutil::{bytes_to_wide, wide_to_bytes};
use crate::registry::tree::Registry;
use crate::registry::value::set_value;
use std::io::{BufRead, Write};

const HEADER: &str = "WINE REGISTRY Version 2";
const PATH_DELIMS: (char, char) = ('[', ']');
const STRING_DELIMS: (char, char) = ('"', '"');
const HEX_LINE_WIDTH: usize = 20;

/// Resolves a key to its human root label, when it is one of the
/// well-known roots. Supplied by the caller so the codec stays
/// decoupled from the root table's internal layout.
pub type LabelResolver<'a> = dyn Fn(KeyId) -> Option<&'static str> + 'a;

/// Writes the header plus every savable key reachable from `key`.
pub fn save_registry<C: Clock, W: Write>(
    registry: &Registry<C>,
    key: KeyId,
    label_of: &LabelResolver,
    writer: &mut W,
) -> RegResult<()> {
    writeln!(writer, "{}", HEADER)?;
    writeln!(writer)?;
    save_subkeys(registry, key, label_of, writer)
}

fn save_subkeys<C: Clock, W: Write>(
    registry: &Registry<C>,
    key: KeyId,
    label_of: &LabelResolver,
    writer: &mut W,
) -> RegResult<()> {
    let k = registry.arena.get(key);
    if k.is_volatile() {
        return Ok(());
    }

    let has_values = !k.values.is_empty();
    let has_no_subkeys = k.subkeys.is_empty();
    if k.level >= registry.saving_level && (has_values || has_no_subkeys) {
        write_keyblock(registry, key, label_of, writer)?;
    }

    let children: Vec<KeyId> = k.subkeys.iter().copied().collect();
    for child in children {
        save_subkeys(registry, child, label_of, writer)?;
    }
    Ok(())
}

fn write_keyblock<C: Clock, W: Write>(
    registry: &Registry<C>,
    key: KeyId,
    label_of: &LabelResolver,
    writer: &mut W,
) -> RegResult<()> {
    let path = dump_path(registry, key, label_of);
    let k = registry.arena.get(key);
    writeln!(writer, "[{}] {}", path, k.modif)?;

    for value in k.values.iter() {
        let name_part = if value.name.is_empty() {
            "@".to_string()
        } else {
            format!("\"{}\"", dump_str_w(&value.name, STRING_DELIMS))
        };
        let typed = dump_typed_value(value.value_type, value.data.as_deref().unwrap_or(&[]));
        writeln!(writer, "{}={}", name_part, typed)?;
    }
    Ok(())
}

fn dump_typed_value(value_type: ValueType, data: &[u8]) -> String {
    match value_type {
        ValueType::Sz => format!("\"{}\"", dump_str_w(&bytes_to_wide(data), STRING_DELIMS)),
        ValueType::ExpandSz => format!(
            "str(2):\"{}\"",
            dump_str_w(&bytes_to_wide(data), STRING_DELIMS)
        ),
        ValueType::MultiSz => format!(
            "str(7):\"{}\"",
            dump_str_w(&bytes_to_wide(data), STRING_DELIMS)
        ),
        ValueType::Dword => {
            let mut buf = [0u8; 4];
            buf[..data.len().min(4)].copy_from_slice(&data[..data.len().min(4)]);
            format!("dword:{:08x}", u32::from_le_bytes(buf))
        }
        ValueType::Binary => format!("hex:{}", dump_hex_list(data)),
        ValueType::Other(tag) => format!("hex({:x}):{}", tag, dump_hex_list(data)),
    }
}

fn dump_hex_list(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, b) in data.iter().enumerate() {
        if i > 0 {
            out.push(',');
            if i % HEX_LINE_WIDTH == 0 {
                out.push_str("\\\n  ");
            }
        }
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Emits `key`'s full ancestor chain, topmost first, separated by a
/// literal backslash. The topmost segment is the owning root's human
/// label when recognized, else the `?????` placeholder used for a
/// detached or otherwise unrecognized ancestor.
pub fn dump_path<C: Clock>(registry: &Registry<C>, key: KeyId, label_of: &LabelResolver) -> String {
    let mut chain_names: Vec<Option<crate::registry::strutil::Wstr>> = Vec::new();
    let mut current = key;
    loop {
        let k = registry.arena.get(current);
        match k.parent {
            Some(parent) => {
                chain_names.push(k.name.clone());
                current = parent;
            }
            None => break,
        }
    }

    let top_label = label_of(current)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?????".to_string());

    chain_names.reverse();
    let mut parts = vec![top_label];
    for name in chain_names {
        if let Some(name) = name {
            parts.push(dump_str_w(&name, PATH_DELIMS));
        }
    }
    parts.join("\\")
}

fn split_bracket_path(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            if i + 1 < chars.len() && chars[i + 1] == '\\' {
                current.push('\\');
                current.push('\\');
                i += 2;
                continue;
            }
            segments.push(std::mem::take(&mut current));
            i += 1;
            continue;
        }
        current.push(chars[i]);
        i += 1;
    }
    segments.push(current);
    segments
}

/// Loads a v2 text stream into the tree rooted at `target`. Parse
/// errors are per-line and non-fatal; they are recorded on `diag` and
/// the offending line is skipped. Fails outright only when the header
/// is missing.
pub fn load_registry<C: Clock, R: BufRead, W: std::io::Write>(
    registry: &mut Registry<C>,
    target: KeyId,
    reader: R,
    diag: &mut Diagnostics<W>,
) -> RegResult<()> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(Ok(line)) => line,
        _ => return Err(RegError::NotRegistryFile),
    };
    if header.trim_end() != HEADER {
        return Err(RegError::NotRegistryFile);
    }

    let mut current_key: Option<KeyId> = None;
    let now = registry.now();
    let mut line_no = 1usize;

    while let Some(line) = lines.next() {
        line_no += 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            match parse_keyblock_header(rest) {
                Some(path) => {
                    let mut node = target;
                    for segment in split_bracket_path(&path) {
                        match parse_str_w(&segment, PATH_DELIMS) {
                            Ok(name) => node = registry.ensure_subkey(node, &name),
                            Err(e) => {
                                diag.load_error(line_no, e.to_string());
                                continue;
                            }
                        }
                    }
                    current_key = Some(node);
                }
                None => diag.load_error(line_no, "malformed key block"),
            }
            continue;
        }

        if trimmed.starts_with('"') || trimmed.starts_with('@') {
            // A value line ending in a bare backslash wraps a long hex
            // list onto the following indented lines; splice them back
            // together before handing the value off for parsing.
            let mut value_line = trimmed.to_string();
            while value_line.trim_end().ends_with('\\') {
                match lines.next() {
                    Some(Ok(next_line)) => {
                        line_no += 1;
                        value_line.push('\n');
                        value_line.push_str(&next_line);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }

            match current_key {
                Some(key) => {
                    if let Err(e) = load_value_line(registry, key, &value_line, now) {
                        diag.load_error(line_no, e.to_string());
                    }
                }
                None => diag.load_error(line_no, "value line with no current key"),
            }
            continue;
        }

        diag.load_error(line_no, "unrecognised line");
    }

    Ok(())
}

fn parse_keyblock_header(rest: &str) -> Option<String> {
    let end = rest.find(']')?;
    Some(rest[..end].to_string())
}

fn load_value_line<C: Clock>(registry: &mut Registry<C>, key: KeyId, line: &str, now: u64) -> RegResult<()> {
    let eq = line.find('=').ok_or_else(|| {
        RegError::OutOfMemory("value line missing '='".to_string())
    })?;
    let (name_part, rest) = line.split_at(eq);
    let rest = &rest[1..];

    let name = if name_part.trim() == "@" {
        Vec::new()
    } else {
        let unquoted = unquote(name_part.trim())?;
        parse_str_w(&unquoted, STRING_DELIMS)?
    };

    let (value_type, data) = parse_typed_value(rest)?;
    let current_level = registry.current_level;
    let k = registry.arena.get_mut(key);
    set_value(k, &name, value_type, &data, now, current_level);
    Ok(())
}

fn unquote(s: &str) -> RegResult<String> {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        Ok(s[1..s.len() - 1].to_string())
    } else {
        Err(RegError::OutOfMemory(format!("expected quoted name: {}", s)))
    }
}

fn parse_typed_value(rest: &str) -> RegResult<(ValueType, Vec<u8>)> {
    let rest = rest.trim();
    if let Some(body) = rest.strip_prefix("str(2):") {
        let s = parse_str_w(&unquote(body)?, STRING_DELIMS)?;
        return Ok((ValueType::ExpandSz, wide_to_bytes(&s)));
    }
    if let Some(body) = rest.strip_prefix("str(7):") {
        let s = parse_str_w(&unquote(body)?, STRING_DELIMS)?;
        return Ok((ValueType::MultiSz, wide_to_bytes(&s)));
    }
    if let Some(body) = rest.strip_prefix("str:") {
        let s = parse_str_w(&unquote(body)?, STRING_DELIMS)?;
        return Ok((ValueType::Sz, wide_to_bytes(&s)));
    }
    if let Some(body) = rest.strip_prefix("dword:") {
        let value = u32::from_str_radix(body.trim(), 16)
            .map_err(|_| RegError::OutOfMemory(format!("malformed dword: {}", body)))?;
        return Ok((ValueType::Dword, value.to_le_bytes().to_vec()));
    }
    if let Some(body) = rest.strip_prefix("hex(") {
        let close = body
            .find("):")
            .ok_or_else(|| RegError::OutOfMemory("malformed hex(NN): tag".to_string()))?;
        let tag = u32::from_str_radix(&body[..close], 16)
            .map_err(|_| RegError::OutOfMemory(format!("malformed hex tag: {}", &body[..close])))?;
        let bytes = parse_hex_list(&body[close + 2..])?;
        return Ok((ValueType::Other(tag), bytes));
    }
    if let Some(body) = rest.strip_prefix("hex:") {
        return Ok((ValueType::Binary, parse_hex_list(body)?));
    }
    if rest.starts_with('"') {
        let s = parse_str_w(&unquote(rest)?, STRING_DELIMS)?;
        return Ok((ValueType::Sz, wide_to_bytes(&s)));
    }
    Err(RegError::OutOfMemory(format!("unrecognised value syntax: {}", rest)))
}

fn parse_hex_list(body: &str) -> RegResult<Vec<u8>> {
    let joined: String = body.split('\\').map(|part| part.trim()).collect::<Vec<_>>().join("");
    if joined.is_empty() {
        return Ok(Vec::new());
    }
    joined
        .split(',')
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .map(|b| u8::from_str_radix(b, 16).map_err(|_| RegError::OutOfMemory(format!("bad hex byte: {}", b))))
        .collect()
}

pub fn path_delims() -> (char, char) {
    PATH_DELIMS
}

pub fn string_delims() -> (char, char) {
    STRING_DELIMS
}

pub fn header_line() -> &'static str {
    HEADER
}

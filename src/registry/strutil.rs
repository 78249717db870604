// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Wide-character string and path utilities.
//!
//! Names and paths throughout the tree are 16-bit code unit strings
//! rather than `str`, so comparisons match what a case-insensitive
//! Windows-style namespace expects regardless of host locale. `Wstr`
//! is a thin owned wrapper; conversions to/from `&str` are provided at
//! the edges (codec and test boundaries) where UTF-8 is convenient.

use crate::registry::config::MAX_PATH;
use crate::registry::error::{RegError, RegResult};

/// An owned 16-bit code unit string, compared case-insensitively
/// throughout the tree.
pub type Wstr = Vec<u16>;

/// Converts a UTF-8 string into its wide-character representation.
pub fn to_wide(s: &str) -> Wstr {
    s.encode_utf16().collect()
}

/// Converts a wide-character string back to UTF-8, replacing any
/// unpaired surrogate with the replacement character.
pub fn from_wide(w: &[u16]) -> String {
    String::from_utf16_lossy(w)
}

/// Case-insensitive comparison of two wide-character strings.
///
/// ASCII letters are folded; code units outside `A-Z`/`a-z` compare
/// by raw value, matching the narrow case-folding the source performs
/// rather than a full Unicode case fold.
pub fn strcmpi_w(a: &[u16], b: &[u16]) -> std::cmp::Ordering {
    let mut ia = a.iter();
    let mut ib = b.iter();
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(&ca), Some(&cb)) => {
                let ord = fold(ca).cmp(&fold(cb));
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn fold(c: u16) -> u16 {
    if (b'A' as u16..=b'Z' as u16).contains(&c) {
        c + 32
    } else {
        c
    }
}

/// Length-bounded copy from a request path buffer into a new owned
/// string, truncating at the first embedded nul or at `MAX_PATH`
/// code units, whichever comes first.
pub fn copy_path(raw: &[u16]) -> RegResult<Wstr> {
    let bound = raw.len().min(MAX_PATH);
    let end = raw[..bound].iter().position(|&c| c == 0).unwrap_or(bound);
    if end == bound && raw.len() > bound && raw[bound] != 0 {
        return Err(RegError::OutOfMemory(
            "path exceeds maximum length".to_string(),
        ));
    }
    Ok(raw[..end].to_vec())
}

/// Heap-owned duplicate of a string slice, using its own length
/// rather than scanning for a terminator.
pub fn req_strdup_w(raw: &[u16]) -> Wstr {
    raw.to_vec()
}

/// One backslash-delimited segment of a path, borrowed from the
/// original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathToken<'a> {
    pub segment: &'a [u16],
}

/// Iterator over the backslash-delimited segments of a path.
///
/// Leading backslashes are skipped; consecutive backslashes do not
/// produce empty segments. This replaces the source's static-cursor
/// tokenizer with an explicit, reentrant iterator.
pub struct PathTokens<'a> {
    remaining: &'a [u16],
}

impl<'a> PathTokens<'a> {
    pub fn new(path: &'a [u16]) -> Self {
        Self { remaining: path }
    }
}

impl<'a> Iterator for PathTokens<'a> {
    type Item = PathToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining.first() == Some(&(b'\\' as u16)) {
            self.remaining = &self.remaining[1..];
        }
        if self.remaining.is_empty() {
            return None;
        }
        let end = self
            .remaining
            .iter()
            .position(|&c| c == b'\\' as u16)
            .unwrap_or(self.remaining.len());
        let segment = &self.remaining[..end];
        self.remaining = &self.remaining[end..];
        Some(PathToken { segment })
    }
}

/// Splits a path into its segments, collecting owned copies. Small
/// convenience over [`PathTokens`] for call sites that need to hold
/// the result past the input buffer's lifetime.
pub fn split_path(path: &[u16]) -> Vec<Wstr> {
    PathTokens::new(path).map(|t| t.segment.to_vec()).collect()
}

/// Encodes a wide string as little-endian bytes, the representation
/// `SZ`/`EXPAND_SZ`/`MULTI_SZ` value data is stored in.
pub fn wide_to_bytes(w: &[u16]) -> Vec<u8> {
    w.iter().flat_map(|c| c.to_le_bytes()).collect()
}

/// Decodes little-endian bytes back into a wide string, padding a
/// trailing odd byte with a zero high byte.
pub fn bytes_to_wide(b: &[u8]) -> Wstr {
    b.chunks(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect()
}

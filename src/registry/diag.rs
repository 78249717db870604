// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Leveled diagnostics for the registry core.
//!
//! The dispatcher and the v2 codec both need two distinct things the
//! spec keeps separate: a human-readable trace stream gated by a
//! `debug_level` integer (server §6), and a per-line, non-fatal error
//! log collected while parsing a load file (§7). Both are served by
//! the same small logger so callers only need one knob.

use std::io::Write;

/// Verbosity of a single diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum DiagLevel {
    Error = 0,
    Warn = 1,
    Trace = 2,
}

impl DiagLevel {
    fn as_str(self) -> &'static str {
        match self {
            DiagLevel::Error => "ERROR",
            DiagLevel::Warn => "WARN",
            DiagLevel::Trace => "TRACE",
        }
    }
}

/// A single load-time parse error, with its 1-based source line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub line: usize,
    pub message: String,
}

/// Sink for trace lines and load diagnostics.
///
/// `debug_level` mirrors the source's global integer: `0` is silent,
/// `1` only surfaces hard errors, anything `> 1` additionally emits
/// human-readable traces (matching §6: "when > 1, operations emit
/// human-readable traces to the error stream").
pub struct Diagnostics<W: Write> {
    sink: W,
    debug_level: u8,
    load_errors: Vec<LoadDiagnostic>,
}

impl Diagnostics<std::io::Stderr> {
    /// Creates a diagnostics sink writing to stderr at the given level.
    pub fn stderr(debug_level: u8) -> Self {
        Diagnostics::new(std::io::stderr(), debug_level)
    }
}

impl<W: Write> Diagnostics<W> {
    pub fn new(sink: W, debug_level: u8) -> Self {
        Self {
            sink,
            debug_level,
            load_errors: Vec::new(),
        }
    }

    pub fn debug_level(&self) -> u8 {
        self.debug_level
    }

    pub fn set_debug_level(&mut self, level: u8) {
        self.debug_level = level;
    }

    /// Emits a trace line, only when `debug_level > 1`.
    pub fn trace(&mut self, message: &str) {
        if self.debug_level > 1 {
            self.emit(DiagLevel::Trace, message);
        }
    }

    /// Emits a warning unconditionally to the sink (mirrors the error
    /// reporter always being live regardless of trace verbosity).
    pub fn warn(&mut self, message: &str) {
        self.emit(DiagLevel::Warn, message);
    }

    /// Records a non-fatal load-time parse error at `line` and also
    /// emits it as a warning, per §7: "logged with its line number,
    /// and parsing continues".
    pub fn load_error(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        self.warn(&format!("line {}: {}", line, message));
        self.load_errors.push(LoadDiagnostic { line, message });
    }

    /// Returns every load-time parse error collected since the last
    /// [`Diagnostics::clear_load_errors`] call.
    pub fn load_errors(&self) -> &[LoadDiagnostic] {
        &self.load_errors
    }

    pub fn clear_load_errors(&mut self) {
        self.load_errors.clear();
    }

    fn emit(&mut self, level: DiagLevel, message: &str) {
        let _ = writeln!(self.sink, "{} {}: {}", timestamp(), level.as_str(), message);
    }
}

/// Seconds-since-epoch timestamp, matching the `modif` POSIX-seconds
/// convention used throughout the tree rather than pulling in a date
/// library purely for log lines.
fn timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::diag::Diagnostics;

    #[test]
    fn trace_is_silent_below_level_two() {
        let mut buf = Vec::new();
        let mut diag = Diagnostics::new(&mut buf, 1);
        diag.trace("should not appear");
        assert!(buf.is_empty());
    }

    #[test]
    fn trace_emits_above_level_one() {
        let mut buf = Vec::new();
        let mut diag = Diagnostics::new(&mut buf, 2);
        diag.trace("opening HKLM\\Software");
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("opening HKLM\\Software"));
    }

    #[test]
    fn load_errors_accumulate_with_line_numbers() {
        let mut buf = Vec::new();
        let mut diag = Diagnostics::new(&mut buf, 0);
        diag.load_error(3, "unrecognised line");
        diag.load_error(7, "bad hex digit");
        assert_eq!(diag.load_errors().len(), 2);
        assert_eq!(diag.load_errors()[0].line, 3);
        assert_eq!(diag.load_errors()[1].message, "bad hex digit");
    }

    #[test]
    fn clear_load_errors_empties_the_log() {
        let mut buf = Vec::new();
        let mut diag = Diagnostics::new(&mut buf, 0);
        diag.load_error(1, "x");
        diag.clear_load_errors();
        assert!(diag.load_errors().is_empty());
    }
}

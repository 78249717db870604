// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::strutil::{copy_path, from_wide, split_path, strcmpi_w, to_wide};
    use std::cmp::Ordering;

    #[test]
    fn strcmpi_w_is_case_insensitive() {
        assert_eq!(strcmpi_w(&to_wide("Software"), &to_wide("SOFTWARE")), Ordering::Equal);
        assert_eq!(strcmpi_w(&to_wide("abc"), &to_wide("abd")), Ordering::Less);
        assert_eq!(strcmpi_w(&to_wide("abd"), &to_wide("abc")), Ordering::Greater);
    }

    #[test]
    fn strcmpi_w_orders_by_prefix_length() {
        assert_eq!(strcmpi_w(&to_wide("ab"), &to_wide("abc")), Ordering::Less);
        assert_eq!(strcmpi_w(&to_wide("abc"), &to_wide("ab")), Ordering::Greater);
    }

    #[test]
    fn split_path_skips_leading_and_repeated_backslashes() {
        let tokens = split_path(&to_wide("\\A\\\\B\\C"));
        let strs: Vec<String> = tokens.iter().map(|t| from_wide(t)).collect();
        assert_eq!(strs, vec!["A", "B", "C"]);
    }

    #[test]
    fn split_path_empty_is_no_tokens() {
        let tokens = split_path(&to_wide(""));
        assert!(tokens.is_empty());
    }

    #[test]
    fn split_path_trailing_backslash_has_no_trailing_empty_token() {
        let tokens = split_path(&to_wide("A\\B\\"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn copy_path_truncates_at_embedded_nul() {
        let mut raw = to_wide("A\\B");
        raw.push(0);
        raw.extend(to_wide("garbage"));
        let copied = copy_path(&raw).unwrap();
        assert_eq!(from_wide(&copied), "A\\B");
    }

    #[test]
    fn copy_path_rejects_overlong_input() {
        let raw = vec![b'a' as u16; 1000];
        assert!(copy_path(&raw).is_err());
    }
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::clock::FixedClock;
    use crate::registry::codec::v2::{load_registry, save_registry, LabelResolver};
    use crate::registry::diag::Diagnostics;
    use crate::registry::error::RegError;
    use crate::registry::key::{KeyFlags, KeyId, ValueType};
    use crate::registry::strutil::{bytes_to_wide, to_wide, wide_to_bytes};
    use crate::registry::tree::Registry;
    use crate::registry::value::{get_value, set_value};
    use std::io::BufReader;

    fn label_of(root: KeyId) -> impl Fn(KeyId) -> Option<&'static str> {
        move |id| if id == root { Some("HKEY_LOCAL_MACHINE") } else { None }
    }

    #[test]
    fn save_then_load_round_trips_nested_tree() {
        let mut reg = Registry::new(FixedClock(500));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let (soft, _) = reg.create_key(root, &to_wide("Soft\\App"), None, false).unwrap();
        {
            let k = reg.arena.get_mut(soft);
            let bytes = wide_to_bytes(&to_wide("h\u{00e9}llo\n"));
            set_value(k, &to_wide("greet"), ValueType::Sz, &bytes, 1, 0);
        }

        let mut buf: Vec<u8> = Vec::new();
        let resolver: Box<LabelResolver> = Box::new(label_of(root));
        save_registry(&reg, root, &*resolver, &mut buf).unwrap();

        let mut reg2 = Registry::new(FixedClock(500));
        let root2 = reg2.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, 0);
        load_registry(&mut reg2, root2, BufReader::new(buf.as_slice()), &mut diag).unwrap();
        assert!(diag.load_errors().is_empty(), "{:?}", diag.load_errors());

        let (app2, _) = reg2
            .create_key(root2, &to_wide("HKEY_LOCAL_MACHINE\\Soft\\App"), None, false)
            .unwrap();
        let (value_type, data) = get_value(reg2.arena.get(app2), &to_wide("greet")).unwrap();
        assert_eq!(value_type, ValueType::Sz);
        assert_eq!(String::from_utf16(&bytes_to_wide(data)).unwrap(), "h\u{00e9}llo\n");
    }

    #[test]
    fn volatile_subtree_is_skipped_on_save() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        reg.create_key(root, &to_wide("Temp"), None, true).unwrap();
        reg.create_key(root, &to_wide("Perm"), None, false).unwrap();

        let mut buf = Vec::new();
        let resolver: Box<LabelResolver> = Box::new(label_of(root));
        save_registry(&reg, root, &*resolver, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("Temp"));
        assert!(text.contains("Perm"));
    }

    #[test]
    fn dword_value_round_trips() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        {
            let k = reg.arena.get_mut(root);
            set_value(k, &to_wide("v"), ValueType::Dword, &0xDEADBEEFu32.to_le_bytes(), 0, 0);
        }
        let mut buf = Vec::new();
        let resolver: Box<LabelResolver> = Box::new(label_of(root));
        save_registry(&reg, root, &*resolver, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("dword:deadbeef"));

        let mut reg2 = Registry::new(FixedClock(1));
        let root2 = reg2.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, 0);
        load_registry(&mut reg2, root2, BufReader::new(buf.as_slice()), &mut diag).unwrap();
        let (child, _) = reg2
            .create_key(root2, &to_wide("HKEY_LOCAL_MACHINE"), None, false)
            .unwrap();
        let (value_type, data) = get_value(reg2.arena.get(child), &to_wide("v")).unwrap();
        assert_eq!(value_type, ValueType::Dword);
        assert_eq!(u32::from_le_bytes(data.try_into().unwrap()), 0xDEADBEEF);
    }

    #[test]
    fn binary_value_with_continuation_round_trips() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let bytes: Vec<u8> = (0..50u16).map(|n| (n % 256) as u8).collect();
        {
            let k = reg.arena.get_mut(root);
            set_value(k, &to_wide("blob"), ValueType::Binary, &bytes, 0, 0);
        }
        let mut buf = Vec::new();
        let resolver: Box<LabelResolver> = Box::new(label_of(root));
        save_registry(&reg, root, &*resolver, &mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf).contains("\\\n"));

        let mut reg2 = Registry::new(FixedClock(1));
        let root2 = reg2.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, 0);
        load_registry(&mut reg2, root2, BufReader::new(buf.as_slice()), &mut diag).unwrap();
        let (child, _) = reg2
            .create_key(root2, &to_wide("HKEY_LOCAL_MACHINE"), None, false)
            .unwrap();
        let (_, data) = get_value(reg2.arena.get(child), &to_wide("blob")).unwrap();
        assert_eq!(data, bytes.as_slice());
    }

    #[test]
    fn wrong_header_fails_not_registry_file() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let text = "WINE REGISTRY Version 1\n";
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, 0);
        let result = load_registry(&mut reg, root, BufReader::new(text.as_bytes()), &mut diag);
        assert!(matches!(result, Err(RegError::NotRegistryFile)));
        assert_eq!(reg.arena.get(root).subkeys.len(), 0);
    }

    #[test]
    fn unrecognised_line_is_logged_and_parsing_continues() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let text = "WINE REGISTRY Version 2\n\ngarbage line\n[HKEY_LOCAL_MACHINE\\A] 1\n\"v\"=\"ok\"\n";
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, 0);
        load_registry(&mut reg, root, BufReader::new(text.as_bytes()), &mut diag).unwrap();
        assert_eq!(diag.load_errors().len(), 1);
        let (a, _) = reg.create_key(root, &to_wide("HKEY_LOCAL_MACHINE\\A"), None, false).unwrap();
        let (_, data) = get_value(reg.arena.get(a), &to_wide("v")).unwrap();
        assert_eq!(String::from_utf16(&bytes_to_wide(data)).unwrap(), "ok");
    }
}

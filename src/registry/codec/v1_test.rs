// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::clock::FixedClock;
    use crate::registry::codec::v1::{save_v1, update_level};
    use crate::registry::key::{KeyFlags, ValueType};
    use crate::registry::strutil::to_wide;
    use crate::registry::tree::Registry;
    use crate::registry::value::set_value;

    #[test]
    fn update_level_propagates_max_from_descendants() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        let (a, _) = reg.create_key(root, &to_wide("A"), None, false).unwrap();
        let (b, _) = reg.create_key(a, &to_wide("B"), None, false).unwrap();
        reg.arena.get_mut(b).level = 5;

        update_level(&mut reg.arena, root);
        assert_eq!(reg.arena.get(root).level, 5);
        assert_eq!(reg.arena.get(a).level, 5);
    }

    #[test]
    fn below_saving_level_subtree_is_omitted() {
        let mut reg = Registry::new(FixedClock(1));
        reg.saving_level = 10;
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        reg.create_key(root, &to_wide("Low"), None, false).unwrap();
        update_level(&mut reg.arena, root);

        let mut buf = Vec::new();
        save_v1(&reg, root, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().is_empty());
    }

    #[test]
    fn volatile_key_is_skipped() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        reg.create_key(root, &to_wide("Temp"), None, true).unwrap();
        update_level(&mut reg.arena, root);

        let mut buf = Vec::new();
        save_v1(&reg, root, &mut buf).unwrap();
        assert!(!String::from_utf8(buf).unwrap().contains("Temp"));
    }

    #[test]
    fn equals_sign_in_value_name_is_escaped() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        {
            let k = reg.arena.get_mut(root);
            set_value(k, &to_wide("a=b"), ValueType::Sz, b"x", 0, 0);
        }
        update_level(&mut reg.arena, root);

        let mut buf = Vec::new();
        save_v1(&reg, root, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("a\\u003db="));
    }

    #[test]
    fn nesting_uses_one_tab_per_level() {
        let mut reg = Registry::new(FixedClock(1));
        let root = reg.arena.alloc(None, None, KeyFlags::ROOT, 0);
        reg.create_key(root, &to_wide("A\\B"), None, false).unwrap();
        update_level(&mut reg.arena, root);

        let mut buf = Vec::new();
        save_v1(&reg, root, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().any(|l| l == "\tA"));
        assert!(text.lines().any(|l| l == "\t\tB"));
    }
}

// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::clock::FixedClock;
    use crate::registry::roots::{RootKey, RootTable};
    use crate::registry::tree::Registry;

    #[test]
    fn same_root_is_returned_on_repeated_lookup() {
        let mut reg = Registry::new(FixedClock(1));
        let mut roots = RootTable::new();
        let a = roots.get(&mut reg, RootKey::LocalMachine);
        let b = roots.get(&mut reg, RootKey::LocalMachine);
        assert_eq!(a, b);
    }

    #[test]
    fn classes_root_aliases_software_classes_under_local_machine() {
        let mut reg = Registry::new(FixedClock(1));
        let mut roots = RootTable::new();
        let classes = roots.get(&mut reg, RootKey::ClassesRoot);
        let local_machine = roots.get(&mut reg, RootKey::LocalMachine);

        let resolved = reg
            .open_key(local_machine, &crate::registry::strutil::to_wide("SOFTWARE\\Classes"))
            .unwrap();
        assert_eq!(classes, resolved);
    }

    #[test]
    fn distinct_roots_are_distinct_keys() {
        let mut reg = Registry::new(FixedClock(1));
        let mut roots = RootTable::new();
        let lm = roots.get(&mut reg, RootKey::LocalMachine);
        let users = roots.get(&mut reg, RootKey::Users);
        assert_ne!(lm, users);
    }

    #[test]
    fn teardown_releases_every_populated_slot() {
        let mut reg = Registry::new(FixedClock(1));
        let mut roots = RootTable::new();
        roots.get(&mut reg, RootKey::LocalMachine);
        roots.get(&mut reg, RootKey::Users);
        let live_before = reg.arena.live_count();
        assert!(live_before >= 2);
        roots.teardown(&mut reg);
        assert_eq!(reg.arena.live_count(), 0);
    }
}

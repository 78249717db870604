// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::array::SortedArray;

    #[test]
    fn insert_and_get_preserve_order() {
        let mut arr: SortedArray<i32> = SortedArray::new(8);
        arr.insert(0, 3);
        arr.insert(0, 1);
        arr.insert(1, 2);
        assert_eq!(arr.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn capacity_grows_past_floor_when_full() {
        let mut arr: SortedArray<i32> = SortedArray::new(2);
        for i in 0..10 {
            arr.insert(arr.len(), i);
        }
        assert_eq!(arr.len(), 10);
        assert!(arr.capacity() >= 10);
    }

    #[test]
    fn remove_shifts_and_shrinks_when_far_below_half() {
        let mut arr: SortedArray<i32> = SortedArray::new(2);
        for i in 0..20 {
            arr.insert(arr.len(), i);
        }
        let cap_before = arr.capacity();
        for _ in 0..18 {
            arr.remove(0);
        }
        assert_eq!(arr.len(), 2);
        assert!(arr.capacity() <= cap_before);
    }

    #[test]
    fn capacity_never_drops_below_floor() {
        let mut arr: SortedArray<i32> = SortedArray::new(8);
        for i in 0..20 {
            arr.insert(arr.len(), i);
        }
        for _ in 0..19 {
            arr.remove(0);
        }
        assert!(arr.capacity() >= 8);
    }

    #[test]
    fn binary_search_returns_insertion_point_when_absent() {
        let mut arr: SortedArray<i32> = SortedArray::new(8);
        arr.insert(0, 1);
        arr.insert(1, 3);
        arr.insert(2, 5);
        assert_eq!(arr.binary_search_by(|x| x.cmp(&3)), Ok(1));
        assert_eq!(arr.binary_search_by(|x| x.cmp(&4)), Err(2));
        assert_eq!(arr.binary_search_by(|x| x.cmp(&0)), Err(0));
    }
}

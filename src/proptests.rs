use std::collections::BTreeMap;

use proptest::prelude::*;

use super::AvlTreeMap;

const N_OPS: usize = 300;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, u32),
    Remove(u8),
    Get(u8),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    // A small key domain makes updates and removals of present keys likely.
    prop_oneof![
        3 => (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => any::<u8>().prop_map(Op::Remove),
        1 => any::<u8>().prop_map(Op::Get),
    ]
}

// Pre-order (key, height) of every node.
fn heights(map: &AvlTreeMap<u8, u32>) -> Vec<(u8, usize)> {
    let mut nodes = Vec::new();
    map.visit(|info| nodes.push((*info.key, info.height)));
    nodes
}

proptest! {
    /// Apply random operations to the tree and to a control model, checking
    /// the tree invariants and agreement with the model after every step.
    #[test]
    fn prop_ops_match_model(ops in prop::collection::vec(arbitrary_op(), 0..N_OPS)) {
        let mut map = AvlTreeMap::new();
        let mut control = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => prop_assert_eq!(map.insert(k, v), control.insert(k, v)),
                Op::Remove(k) => prop_assert_eq!(map.remove(&k), control.remove(&k)),
                Op::Get(k) => prop_assert_eq!(map.get(&k), control.get(&k)),
            }
            map.check_consistency();
            prop_assert_eq!(map.len(), control.len());
            prop_assert_eq!(map.iter().count(), map.len());
        }

        prop_assert!(map.iter().eq(control.iter()));
        prop_assert!(map.iter().rev().eq(control.iter().rev()));
    }

    /// After inserting a key its value can be read back.
    #[test]
    fn prop_insert_get(entries in prop::collection::vec((any::<i32>(), any::<i32>()), 0..N_OPS)) {
        let mut map = AvlTreeMap::new();
        for (k, v) in &entries {
            map.insert(*k, *v);
            prop_assert_eq!(map.get(k), Some(v));
        }
        map.check_consistency();
    }

    /// Updating an existing key keeps the length and stores the new value.
    #[test]
    fn prop_update(
        keys in prop::collection::hash_set(any::<u16>(), 1..N_OPS),
        v1 in any::<u32>(),
        v2 in any::<u32>(),
    ) {
        let mut map = AvlTreeMap::new();
        for k in &keys {
            map.insert(*k, v1);
        }
        let len = map.len();
        for k in &keys {
            prop_assert_eq!(map.insert(*k, v2), Some(v1));
            prop_assert_eq!(map.len(), len);
            prop_assert_eq!(map.get(k), Some(&v2));
        }
        map.check_consistency();
    }

    /// Removing an absent key changes neither the traversal nor the heights.
    #[test]
    fn prop_remove_absent(
        entries in prop::collection::btree_map(any::<u8>(), any::<u32>(), 0..100),
        absent in any::<u8>(),
    ) {
        prop_assume!(!entries.contains_key(&absent));
        let mut map: AvlTreeMap<u8, u32> = entries.into_iter().collect();
        let before = heights(&map);
        let entries_before: Vec<(u8, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();

        prop_assert_eq!(map.remove(&absent), None);

        prop_assert_eq!(heights(&map), before);
        let entries_after: Vec<(u8, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(entries_after, entries_before);
    }

    /// Removing every key, in any order, leaves an empty map.
    #[test]
    fn prop_remove_all(keys in prop::collection::vec(any::<i16>(), 0..N_OPS).prop_shuffle()) {
        let mut map = AvlTreeMap::new();
        for k in &keys {
            map.insert(*k, ());
        }
        for k in &keys {
            map.remove(k);
            map.check_consistency();
            prop_assert!(!map.contains_key(k));
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.len(), 0);
        prop_assert_eq!(map.height(), None);
    }
}

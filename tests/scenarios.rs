use avl_map::AvlTreeMap;

// Pre-order keys of the tree.
fn preorder(map: &AvlTreeMap<i32, i32>) -> Vec<i32> {
    let mut keys = Vec::new();
    map.visit(|info| keys.push(*info.key));
    keys
}

// Checks the balance condition from the heights reported by the visitor.
// Pre-order visits let the child heights be recovered with a stack.
fn assert_balanced(map: &AvlTreeMap<i32, i32>) {
    struct Frame {
        height: usize,
        pending: Vec<bool>,
        child_heights: Vec<isize>,
    }

    fn close(stack: &mut Vec<Frame>) {
        while let Some(top) = stack.last() {
            if !top.pending.is_empty() {
                break;
            }
            let Some(frame) = stack.pop() else { break };
            let (left, right) = (frame.child_heights[0], frame.child_heights[1]);
            assert!((left - right).abs() <= 1, "unbalanced node");
            assert_eq!(frame.height as isize, 1 + left.max(right));
            if let Some(parent) = stack.last_mut() {
                let slot = parent.pending.remove(0);
                let idx = if slot { 0 } else { 1 };
                parent.child_heights[idx] = frame.height as isize;
            }
        }
    }

    let mut stack: Vec<Frame> = Vec::new();
    map.visit(|info| {
        let mut pending = Vec::new();
        if info.has_left {
            pending.push(true);
        }
        if info.has_right {
            pending.push(false);
        }
        stack.push(Frame {
            height: info.height,
            pending,
            child_heights: vec![-1, -1],
        });
        close(&mut stack);
    });
    assert!(stack.is_empty());
}

fn keys(map: &AvlTreeMap<i32, i32>) -> Vec<i32> {
    map.keys().copied().collect()
}

fn build(keys: &[i32]) -> AvlTreeMap<i32, i32> {
    let mut map = AvlTreeMap::new();
    for &key in keys {
        map.insert(key, key);
        assert_balanced(&map);
    }
    map
}

#[test]
fn ll_rotation_on_insert() {
    let map = build(&[20, 10, 5]);
    assert_eq!(keys(&map), [5, 10, 20]);
    assert_eq!(preorder(&map)[0], 10);
    assert_eq!(map.height(), Some(1));
}

#[test]
fn rr_rotation_on_insert() {
    let mut map = build(&[20, 10, 5, 7, 50]);
    assert_eq!(preorder(&map), [10, 5, 7, 20, 50]);

    map.insert(500, 500);
    assert_balanced(&map);
    // 20 became right-right heavy and was rotated under 50.
    assert_eq!(preorder(&map), [10, 5, 7, 50, 20, 500]);

    map.insert(30, 30);
    assert_balanced(&map);
    assert_eq!(keys(&map), [5, 7, 10, 20, 30, 50, 500]);
    assert_eq!(preorder(&map)[0], 10);
}

#[test]
fn remove_leaf_then_rebalance() {
    let mut map = build(&[20, 10, 5, 7, 50, 500, 30]);
    assert_eq!(map.remove(&30), Some(30));
    assert_balanced(&map);
    assert_eq!(keys(&map), [5, 7, 10, 20, 50, 500]);
    assert_eq!(map.len(), 6);
}

#[test]
fn remove_absent_key() {
    let mut map = build(&[20, 10, 5, 7, 50, 500, 30]);
    let before = preorder(&map);
    assert_eq!(map.remove(&9999), None);
    assert_eq!(preorder(&map), before);
    assert_eq!(map.len(), 7);
}

#[test]
fn remove_only_key() {
    let mut map = build(&[42]);
    assert_eq!(map.remove(&42), Some(42));
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.height(), None);
}

#[test]
fn mixed_insert_and_remove_sequence() {
    let mut map = build(&[20, 10, 5, 7, 50, 500, 30, 25, 28, 22]);
    assert_eq!(map.remove(&28), Some(28));
    assert_balanced(&map);
    map.insert(33, 33);
    map.insert(31, 31);
    assert_eq!(map.remove(&31), Some(31));
    assert_balanced(&map);
    map.insert(32, 32);
    map.insert(38, 38);
    assert_balanced(&map);
    assert_eq!(map.remove(&30), Some(30));
    assert_balanced(&map);
    assert_eq!(keys(&map), [5, 7, 10, 20, 22, 25, 32, 33, 38, 50, 500]);
}

#[test]
fn contains_key_and_update() {
    let mut map = build(&[3, 1, 2]);
    assert!(map.contains_key(&2));
    assert!(!map.contains_key(&4));
    assert_eq!(map.insert(2, 200), Some(2));
    assert_eq!(map.get(&2), Some(&200));
    assert_eq!(map.len(), 3);
}

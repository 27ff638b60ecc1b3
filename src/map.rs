//! An ordered map implemented with an AVL tree.

use std::cmp::{self, Ordering};
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::ops::Index;
use std::vec;

use compare::{Compare, Natural};
use slab::Slab;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// An ordered map implemented with an AVL tree.
///
/// Keys are ordered by the comparator `C`, which defaults to the natural
/// order of `K`.
///
/// ```
/// use avl_map::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K, V, C = Natural<K>> {
    nodes: Slab<Node<K, V>>,
    root: Link,
    cmp: C,
}

/// A snapshot of a single tree node, handed to the visitor of [`AvlTreeMap::visit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo<'a, K, V> {
    /// The key stored in the node.
    pub key: &'a K,
    /// The value stored in the node.
    pub value: &'a V,
    /// Height of the subtree rooted at the node; a leaf has height 0.
    pub height: usize,
    /// Whether the node has a left child.
    pub has_left: bool,
    /// Whether the node has a right child.
    pub has_right: bool,
}

/// An iterator over the entries of a map, sorted by key.
pub struct Iter<'a, K, V> {
    indices: Indices<'a, K, V>,
}

/// A mutable iterator over the entries of a map, sorted by key.
pub struct IterMut<'a, K, V> {
    inner: vec::IntoIter<(&'a K, &'a mut V)>,
}

/// An owning iterator over the entries of a map, sorted by key.
pub struct IntoIter<K, V> {
    inner: vec::IntoIter<(K, V)>,
}

/// An iterator over the keys of a map, in sorted order.
pub struct Keys<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// An iterator over the values of a map, in key order.
pub struct Values<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// A mutable iterator over the values of a map, in key order.
pub struct ValuesMut<'a, K, V> {
    iter: IterMut<'a, K, V>,
}

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link,
    right: Link,
    parent: Link,
    height: usize,
}

// Slab index of a node. The parent link is only ever used for walking up.
type Link = Option<usize>;

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

enum InsertPos {
    Occupied(usize),
    Vacant(Link, Side),
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    LL,
    LR,
    RR,
    RL,
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

// Node indices in key order, walking successor and predecessor links.
struct Indices<'a, K, V> {
    nodes: &'a Slab<Node<K, V>>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map ordered by the natural order of its keys.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }
}

impl<K, V, C> AvlTreeMap<K, V, C> {
    /// Creates an empty map ordered by the given comparator.
    ///
    /// ```
    /// use avl_map::AvlTreeMap;
    /// use compare::{natural, Compare};
    ///
    /// let mut map = AvlTreeMap::with_cmp(natural().rev());
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [2, 1]);
    /// ```
    pub fn with_cmp(cmp: C) -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
            cmp,
        }
    }

    /// Returns a reference to the map's comparator.
    pub fn cmp(&self) -> &C {
        &self.cmp
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the height of the tree, or `None` if the map is empty.
    /// A map with a single element has height 0.
    pub fn height(&self) -> Option<usize> {
        self.root.map(|root| self.nodes[root].height)
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        debug!(len = self.nodes.len(), "clearing map");
        self.nodes = Slab::new();
        self.root = None;
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| {
            let node = &self.nodes[leftmost(&self.nodes, root)];
            (&node.key, &node.value)
        })
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| {
            let node = &self.nodes[rightmost(&self.nodes, root)];
            (&node.key, &node.value)
        })
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// The iterator walks the tree lazily; it can be cloned to restart
    /// from its current position.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            indices: self.indices(),
        }
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let ranks = self.ranks();
        let mut slots: Vec<Option<(&K, &mut V)>> = Vec::new();
        slots.resize_with(self.nodes.len(), || None);
        for (idx, node) in self.nodes.iter_mut() {
            slots[ranks[idx]] = Some((&node.key, &mut node.value));
        }
        IterMut {
            inner: slots.into_iter().flatten().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { iter: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            iter: self.iter_mut(),
        }
    }

    /// Calls the visitor once for every node of the tree, in pre-order.
    ///
    /// Pre-order together with the child flags of each [`NodeInfo`]
    /// determines the shape of the tree, which is all a renderer needs
    /// to draw it.
    pub fn visit<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeInfo<'_, K, V>),
    {
        self.preorder(|idx| {
            let node = &self.nodes[idx];
            visitor(NodeInfo {
                key: &node.key,
                value: &node.value,
                height: node.height,
                has_left: node.left.is_some(),
                has_right: node.right.is_some(),
            });
        });
    }

    /// Calls `f` for every entry, level by level from the root,
    /// each level from left to right.
    pub fn traverse_level_order<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let mut queue: VecDeque<usize> = self.root.into_iter().collect();
        while let Some(idx) = queue.pop_front() {
            let node = &self.nodes[idx];
            f(&node.key, &node.value);
            queue.extend(node.left);
            queue.extend(node.right);
        }
    }

    fn indices(&self) -> Indices<'_, K, V> {
        Indices {
            nodes: &self.nodes,
            front: self.root.map(|root| leftmost(&self.nodes, root)),
            back: self.root.map(|root| rightmost(&self.nodes, root)),
            remaining: self.nodes.len(),
        }
    }

    // Position of every node in key order, indexed by slab key.
    fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![0; self.nodes.capacity()];
        for (rank, idx) in self.indices().enumerate() {
            ranks[idx] = rank;
        }
        ranks
    }

    fn link_height(&self, link: Link) -> isize {
        match link {
            None => -1,
            Some(idx) => self.nodes[idx].height as isize,
        }
    }

    // Height of left subtree minus height of right subtree.
    fn balance(&self, idx: usize) -> isize {
        let node = &self.nodes[idx];
        self.link_height(node.left) - self.link_height(node.right)
    }

    fn adjust_height(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        let height = 1 + cmp::max(self.link_height(node.left), self.link_height(node.right));
        self.nodes[idx].height = height as usize;
    }

    // Points the parent's link (or the root) that referred to `old` at `new`.
    fn replace_child(&mut self, parent: Link, old: usize, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent = &mut self.nodes[parent];
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    parent.right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, idx: usize) {
        if let Some(right) = self.nodes[idx].right {
            let right_left = self.nodes[right].left;
            self.nodes[idx].right = right_left;
            if let Some(right_left) = right_left {
                self.nodes[right_left].parent = Some(idx);
            }

            let parent = self.nodes[idx].parent;
            self.nodes[right].parent = parent;
            self.replace_child(parent, idx, Some(right));

            self.nodes[right].left = Some(idx);
            self.nodes[idx].parent = Some(right);

            self.adjust_height(idx);
            self.adjust_height(right);
        }
    }

    fn rotate_right(&mut self, idx: usize) {
        if let Some(left) = self.nodes[idx].left {
            let left_right = self.nodes[left].right;
            self.nodes[idx].left = left_right;
            if let Some(left_right) = left_right {
                self.nodes[left_right].parent = Some(idx);
            }

            let parent = self.nodes[idx].parent;
            self.nodes[left].parent = parent;
            self.replace_child(parent, idx, Some(left));

            self.nodes[left].right = Some(idx);
            self.nodes[idx].parent = Some(left);

            self.adjust_height(idx);
            self.adjust_height(left);
        }
    }

    /// Rebalances nodes starting from given position up towards the root node.
    /// A removal can shrink a subtree even after a rotation, so the walk goes on
    /// until some subtree keeps the height it had before the update.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(idx) = current {
            let old_height = self.nodes[idx].height;
            let subtree = self.rebalance_node(idx);
            let height = self.nodes[subtree].height;
            trace!(node = idx, old_height, height, "rebalance step");
            if height == old_height {
                break;
            }
            current = self.nodes[subtree].parent;
        }
    }

    /// Rebalances nodes starting from given position up towards the root node.
    /// Stops after first rebalance operation.
    /// This is enough to restore balance after a single insert operation.
    fn rebalance_once(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(idx) = current {
            let old_height = self.nodes[idx].height;
            if self.rebalance_node(idx) != idx || self.nodes[idx].height == old_height {
                break;
            }
            current = self.nodes[idx].parent;
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns the root of the subtree that was rooted at the node.
    fn rebalance_node(&mut self, idx: usize) -> usize {
        let balance = self.balance(idx);
        debug_assert!((-2..=2).contains(&balance));
        let rotation = if balance > 1 {
            match self.nodes[idx].left {
                Some(left) if self.balance(left) < 0 => Rotation::LR,
                _ => Rotation::LL,
            }
        } else if balance < -1 {
            match self.nodes[idx].right {
                Some(right) if self.balance(right) > 0 => Rotation::RL,
                _ => Rotation::RR,
            }
        } else {
            self.adjust_height(idx);
            return idx;
        };

        match rotation {
            Rotation::LL => self.rotate_right(idx),
            Rotation::LR => {
                if let Some(left) = self.nodes[idx].left {
                    self.rotate_left(left);
                }
                self.rotate_right(idx);
            }
            Rotation::RR => self.rotate_left(idx),
            Rotation::RL => {
                if let Some(right) = self.nodes[idx].right {
                    self.rotate_right(right);
                }
                self.rotate_left(idx);
            }
        }

        // The node was demoted; its new parent roots the rotated subtree.
        let subtree = self.nodes[idx].parent.unwrap_or(idx);
        trace!(
            node = idx,
            subtree,
            ?rotation,
            height = self.nodes[subtree].height,
            "rotated"
        );
        subtree
    }

    // Detaches a node with at most one child by splicing that child into its place.
    // Returns the former parent, where rebalancing has to start.
    fn unlink_twig(&mut self, idx: usize) -> Link {
        let node = &self.nodes[idx];
        debug_assert!(node.left.is_none() || node.right.is_none());
        let parent = node.parent;
        let child = node.left.or(node.right);
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }
        self.replace_child(parent, idx, child);
        parent
    }

    fn preorder<F: FnMut(usize)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn inorder<F: FnMut(usize)>(&self, f: F) {
        self.traverse(|_| {}, f, |_| {});
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(usize),
        In: FnMut(usize),
        Post: FnMut(usize),
    {
        if let Some(mut idx) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                let node = &self.nodes[idx];
                match dir {
                    Direction::FromParent => {
                        preorder(idx);
                        if let Some(left) = node.left {
                            idx = left;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(idx);
                        if let Some(right) = node.right {
                            idx = right;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        postorder(idx);
                        match node.parent {
                            Some(parent) => {
                                if self.nodes[parent].left == Some(idx) {
                                    dir = Direction::FromLeft;
                                } else {
                                    dir = Direction::FromRight;
                                }
                                idx = parent;
                            }
                            None => break,
                        }
                    }
                }
            }
        }
    }
}

impl<K, V, C: Compare<K>> AvlTreeMap<K, V, C> {
    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.nodes[idx].value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.find(key) {
            Some(idx) => Some(&mut self.nodes[idx].value),
            None => None,
        }
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|idx| {
            let node = &self.nodes[idx];
            (&node.key, &node.value)
        })
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already had the key, its value is replaced and the old
    /// value returned; the stored key is kept.
    ///
    /// # Panics
    ///
    /// Panics if the comparator does not order the key equal to itself.
    /// Use [`try_insert`](Self::try_insert) to handle such keys.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(old_value) => old_value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Inserts a key-value pair into the map, rejecting keys the comparator
    /// cannot place.
    ///
    /// ```
    /// use avl_map::{AvlTreeMap, Error};
    ///
    /// let mut map = AvlTreeMap::with_cmp(|a: &f64, b: &f64| {
    ///     a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less)
    /// });
    /// assert_eq!(map.try_insert(1.5, "x"), Ok(None));
    /// assert_eq!(map.try_insert(f64::NAN, "y"), Err(Error::IncomparableKey));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if self.cmp.compare(&key, &key) != Ordering::Equal {
            return Err(Error::IncomparableKey);
        }

        match self.find_insert_pos(&key) {
            InsertPos::Occupied(idx) => Ok(Some(mem::replace(&mut self.nodes[idx].value, value))),
            InsertPos::Vacant(parent, side) => {
                let idx = self.nodes.insert(Node {
                    key,
                    value,
                    left: None,
                    right: None,
                    parent,
                    height: 0,
                });
                match (parent, side) {
                    (None, _) => self.root = Some(idx),
                    (Some(parent), Side::Left) => self.nodes[parent].left = Some(idx),
                    (Some(parent), Side::Right) => self.nodes[parent].right = Some(idx),
                }
                self.rebalance_once(parent);
                Ok(None)
            }
        }
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map.
    /// Returns the stored key and value if the key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let idx = self.find(key)?;

        // A node with two children takes over the entry of its in-order
        // successor, which has no left child and is unlinked instead.
        let twig = match (self.nodes[idx].left, self.nodes[idx].right) {
            (Some(_), Some(right)) => {
                let successor = leftmost(&self.nodes, right);
                if let Some((node, successor_node)) = self.nodes.get2_mut(idx, successor) {
                    mem::swap(&mut node.key, &mut successor_node.key);
                    mem::swap(&mut node.value, &mut successor_node.value);
                }
                successor
            }
            _ => idx,
        };

        let parent = self.unlink_twig(twig);
        let node = self.nodes.remove(twig);
        self.rebalance(parent);
        debug_assert!(self.find(&node.key).is_none());
        Some((node.key, node.value))
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root) = self.root {
            assert!(self.nodes[root].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        self.preorder(|idx| {
            let node = &self.nodes[idx];
            let mut left_height = -1;
            let mut right_height = -1;

            // Check link for left child node
            if let Some(left) = node.left {
                assert_eq!(self.nodes[left].parent, Some(idx));
                assert_eq!(self.cmp.compare(&self.nodes[left].key, &node.key), Ordering::Less);
                left_height = self.nodes[left].height as isize;
            }

            // Check link for right child node
            if let Some(right) = node.right {
                assert_eq!(self.nodes[right].parent, Some(idx));
                assert_eq!(
                    self.cmp.compare(&self.nodes[right].key, &node.key),
                    Ordering::Greater
                );
                right_height = self.nodes[right].height as isize;
            }

            // Check height
            assert_eq!(node.height as isize, 1 + cmp::max(left_height, right_height));

            // Check AVL condition (nearly balance)
            assert!(left_height <= right_height + 1);
            assert!(right_height <= left_height + 1);

            num_nodes += 1;
        });

        // Check number of nodes
        assert_eq!(num_nodes, self.nodes.len());

        // Check ordering across subtrees
        let mut prev: Option<usize> = None;
        self.inorder(|idx| {
            if let Some(prev) = prev {
                assert_eq!(
                    self.cmp.compare(&self.nodes[prev].key, &self.nodes[idx].key),
                    Ordering::Less
                );
            }
            prev = Some(idx);
        });
    }

    fn find(&self, key: &K) -> Link {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    fn find_insert_pos(&self, key: &K) -> InsertPos {
        let mut parent: Link = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            parent = Some(idx);
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return InsertPos::Occupied(idx),
                Ordering::Less => {
                    side = Side::Left;
                    node.left
                }
                Ordering::Greater => {
                    side = Side::Right;
                    node.right
                }
            };
        }
        InsertPos::Vacant(parent, side)
    }
}

fn leftmost<K, V>(nodes: &Slab<Node<K, V>>, mut idx: usize) -> usize {
    while let Some(left) = nodes[idx].left {
        idx = left;
    }
    idx
}

fn rightmost<K, V>(nodes: &Slab<Node<K, V>>, mut idx: usize) -> usize {
    while let Some(right) = nodes[idx].right {
        idx = right;
    }
    idx
}

fn successor<K, V>(nodes: &Slab<Node<K, V>>, idx: usize) -> Link {
    if let Some(right) = nodes[idx].right {
        return Some(leftmost(nodes, right));
    }
    let mut current = idx;
    while let Some(parent) = nodes[current].parent {
        if nodes[parent].left == Some(current) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

fn predecessor<K, V>(nodes: &Slab<Node<K, V>>, idx: usize) -> Link {
    if let Some(left) = nodes[idx].left {
        return Some(rightmost(nodes, left));
    }
    let mut current = idx;
    while let Some(parent) = nodes[current].parent {
        if nodes[parent].right == Some(current) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for AvlTreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, C: Compare<K>> Index<&K> for AvlTreeMap<K, V, C> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for AvlTreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for AvlTreeMap<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlTreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlTreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut AvlTreeMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for AvlTreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        let ranks = self.ranks();
        let mut slots: Vec<Option<(K, V)>> = Vec::new();
        slots.resize_with(self.nodes.len(), || None);
        for (idx, node) in self.nodes {
            slots[ranks[idx]] = Some((node.key, node.value));
        }
        IntoIter {
            inner: slots.into_iter().flatten().collect::<Vec<_>>().into_iter(),
        }
    }
}

// Auto derived clone seems to have an invalid type bound of K: Clone
impl<K, V> Clone for Indices<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K, V> Iterator for Indices<'_, K, V> {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front?;
        self.remaining -= 1;
        self.front = successor(self.nodes, idx);
        Some(idx)
    }
}

impl<K, V> DoubleEndedIterator for Indices<'_, K, V> {
    fn next_back(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back?;
        self.remaining -= 1;
        self.back = predecessor(self.nodes, idx);
        Some(idx)
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            indices: self.indices.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.indices.nodes;
        self.indices.next().map(|idx| {
            let node = &nodes[idx];
            (&node.key, &node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.indices.remaining, Some(self.indices.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let nodes = self.indices.nodes;
        self.indices.next_back().map(|idx| {
            let node = &nodes[idx];
            (&node.key, &node.value)
        })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

//! An ordered map and an ordered set implemented with an AVL tree.
//!
//! Every node keeps the height of its subtree, and after each insertion or
//! removal the heights of the left and right subtree of any node differ by
//! at most one. Lookup, insertion and removal therefore take O(log n).
//!
//! Nodes live in a [`slab`] arena and refer to their children and parent
//! by index. Keys are ordered by a [`compare::Compare`] comparator, the
//! natural order of the key type by default.
//!
//! ```
//! use avl_map::AvlTreeMap;
//!
//! let mut map = AvlTreeMap::new();
//! for key in [20, 10, 5] {
//!     map.insert(key, key * 2);
//! }
//! assert_eq!(map.get(&10), Some(&20));
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), [5, 10, 20]);
//! assert_eq!(map.height(), Some(1));
//! ```

pub mod map;
pub mod set;

mod error;
#[cfg(feature = "serde")]
mod serde_impl;

pub use error::{Error, Result};
pub use map::{AvlTreeMap, NodeInfo};
pub use set::AvlTreeSet;

#[cfg(test)]
mod proptests;

use thiserror::Error;

/// Errors reported by fallible map and set operations.
///
/// Looking up or removing an absent key is not an error; those operations
/// return `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The ordering does not compare the key as equal to itself,
    /// so the key has no well-defined position in the tree.
    #[error("key is not comparable under the map's ordering")]
    IncomparableKey,
}

/// Result alias for fallible map and set operations.
pub type Result<T> = std::result::Result<T, Error>;

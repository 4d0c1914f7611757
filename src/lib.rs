//! # probe-lab
//!
//! Bounded search structures over small key sets: open addressing with
//! several probe policies, chained hashing, nested overflow arrays, sorted
//! and unsorted arrays, and three bit-radix trees over single letters.
//!
//! Every structure is a plain in-memory state machine. Mutations either
//! succeed or return a [`CoreError`] without touching state; front ends read
//! back `snapshot()` / [`KeyIndex::active_keys`] after each call.
//!
//! ## Example
//!
//! ```rust
//! use probe_lab::{HashStrategy, KeyIndex, OpenAddressingTable, ProbePolicy};
//!
//! let mut table =
//!     OpenAddressingTable::new(5, 2, HashStrategy::Mod, ProbePolicy::Linear).unwrap();
//! table.insert("10").unwrap();
//! table.insert("15").unwrap();
//! table.insert("20").unwrap();
//!
//! // All three hash to position 1 and are pushed down linearly.
//! assert_eq!(table.search("20"), Ok(3));
//! table.delete("15").unwrap();
//! assert_eq!(table.search("20"), Ok(3));
//! ```

#![warn(clippy::all)]

pub mod array;
pub mod chained;
pub mod codec;
pub mod error;
pub mod hash;
pub mod nested;
pub mod open;
pub mod probe;
pub mod tree;

pub use array::{ArrayConfig, BinaryArray, SequentialArray};
pub use chained::{ChainLocation, ChainedConfig, ChainedTable};
pub use codec::{DigitSource, KeyCodec, KeyEncoding};
pub use error::{ConfigError, CoreError, KeyError};
pub use hash::{FoldCombine, FoldTail, HashFunction, HashStrategy, TruncationPolicy};
pub use nested::{NestedConfig, NestedLocation, NestedArrayTable};
pub use open::{OpenAddressingTable, OpenConfig, Slot};
pub use probe::{ProbePolicy, ProbeSequence};
pub use tree::digital::DigitalTree;
pub use tree::multiway::MultiwayTree;
pub use tree::trie::SplitTrie;
pub use tree::{LetterCode, TreePath, TreeView};

use serde::{Deserialize, Serialize};

/// The operation set shared by every structure.
pub trait KeyIndex {
    /// Where a key lives; the shape depends on the structure.
    type Location;

    fn insert(&mut self, key: &str) -> Result<(), CoreError>;

    /// Absence is reported as [`CoreError::NotFound`].
    fn search(&self, key: &str) -> Result<Self::Location, CoreError>;

    fn delete(&mut self, key: &str) -> Result<(), CoreError>;

    /// Stored keys, in the structure's natural order.
    fn active_keys(&self) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &str) -> bool {
        self.search(key).is_ok()
    }
}

/// Occupancy figures for the hash-backed structures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    /// Slots in the primary array.
    pub capacity: usize,
    /// Live keys.
    pub len: usize,
    /// Deleted markers (open addressing only).
    pub tombstones: usize,
    /// Arrays stacked under the primary one (nested tables only).
    pub overflow_arrays: usize,
    /// Longest overflow chain, in nodes (chained tables only).
    pub longest_chain: usize,
    /// `len / capacity`.
    pub load_factor: f64,
}

impl TableStats {
    pub(crate) fn new(capacity: usize, len: usize) -> Self {
        Self {
            capacity,
            len,
            load_factor: len as f64 / capacity as f64,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod proptests;

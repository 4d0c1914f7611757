//! Nested overflow arrays: a primary array plus a stack of same-sized
//! overflow arrays.
//!
//! A key hashed to position `p` lands in the first array whose column `p` is
//! free, appending a new array when every column `p` is taken. Deletes shift
//! the rest of the column up, so occupied cells of a column are always
//! contiguous from the primary array down and a top-down search may stop at
//! the first empty cell.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{KeyCodec, KeyEncoding};
use crate::error::{ConfigError, CoreError};
use crate::hash::{HashFunction, HashStrategy};
use crate::{KeyIndex, TableStats};

/// Where a key sits in a [`NestedArrayTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedLocation {
    /// 0 is the primary array.
    pub array: usize,
    /// 1-based.
    pub position: usize,
}

impl fmt::Display for NestedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array == 0 {
            write!(f, "primary array, position {}", self.position)
        } else {
            write!(f, "overflow array {}, position {}", self.array, self.position)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedConfig {
    pub capacity: usize,
    pub key_len: usize,
    pub hash: HashStrategy,
    pub encoding: KeyEncoding,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            key_len: 2,
            hash: HashStrategy::Mod,
            encoding: KeyEncoding::Literal,
        }
    }
}

type Column = Vec<Option<String>>;

/// Hash table resolving collisions into stacked overflow arrays.
#[derive(Debug, Clone)]
pub struct NestedArrayTable {
    /// Never empty; `arrays[0]` is the primary array.
    arrays: Vec<Column>,
    codec: KeyCodec,
    hash: HashFunction,
    count: usize,
}

impl NestedArrayTable {
    pub fn new(capacity: usize, key_len: usize) -> Result<Self, ConfigError> {
        Self::with_config(NestedConfig {
            capacity,
            key_len,
            ..NestedConfig::default()
        })
    }

    pub fn with_config(config: NestedConfig) -> Result<Self, ConfigError> {
        let codec = KeyCodec::new(config.key_len, config.encoding);
        codec.check()?;
        let hash = HashFunction::new(config.hash, config.capacity)?;
        Ok(Self {
            arrays: vec![vec![None; config.capacity]],
            codec,
            hash,
            count: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.hash.table_size()
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.codec.key_len()
    }

    /// Primary array included.
    #[inline]
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    pub fn hash_function(&self) -> &HashFunction {
        &self.hash
    }

    pub fn base_position(&self, key: &str) -> Result<usize, CoreError> {
        self.codec.validate(key)?;
        self.hash.position(&self.codec, key)
    }

    pub fn find(&self, key: &str) -> Result<Option<NestedLocation>, CoreError> {
        let position = self.base_position(key)?;
        for (array, cells) in self.arrays.iter().enumerate() {
            match cells[position - 1].as_deref() {
                None => return Ok(None),
                Some(stored) if stored == key => {
                    return Ok(Some(NestedLocation { array, position }));
                }
                Some(_) => {}
            }
        }
        Ok(None)
    }

    /// Every array, primary first.
    pub fn snapshot(&self) -> Vec<Vec<Option<String>>> {
        self.arrays.clone()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            overflow_arrays: self.arrays.len() - 1,
            ..TableStats::new(self.capacity(), self.count)
        }
    }

    fn trim(&mut self) {
        while self.arrays.len() > 1
            && self
                .arrays
                .last()
                .is_some_and(|cells| cells.iter().all(Option::is_none))
        {
            self.arrays.pop();
            debug!(arrays = self.arrays.len(), "trimmed empty overflow array");
        }
    }
}

impl KeyIndex for NestedArrayTable {
    type Location = NestedLocation;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        if self.find(key)?.is_some() {
            return Err(CoreError::DuplicateKey(key.to_owned()));
        }
        let position = self.hash.position(&self.codec, key)?;
        let idx = position - 1;
        let array = match self.arrays.iter().position(|cells| cells[idx].is_none()) {
            Some(array) => array,
            None => {
                self.arrays.push(vec![None; self.capacity()]);
                self.arrays.len() - 1
            }
        };
        self.arrays[array][idx] = Some(key.to_owned());
        self.count += 1;
        debug!(key, array, position, "inserted");
        Ok(())
    }

    fn search(&self, key: &str) -> Result<NestedLocation, CoreError> {
        self.find(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_owned()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let NestedLocation { array, position } = self.search(key)?;
        let idx = position - 1;
        let last = self.arrays.len() - 1;
        for i in array..last {
            let below = self.arrays[i + 1][idx].take();
            self.arrays[i][idx] = below;
        }
        self.arrays[last][idx] = None;
        self.count -= 1;
        debug!(key, array, position, "deleted");
        self.trim();
        Ok(())
    }

    /// Primary array first, left to right.
    fn active_keys(&self) -> Vec<String> {
        self.arrays
            .iter()
            .flatten()
            .flatten()
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.count
    }
}

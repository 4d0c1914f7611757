//! Bounded arrays searched by linear scan or binary search.
//!
//! Both keep their keys packed at the front of a fixed-capacity array;
//! deletes shift the tail left by one. Locations are 0-based indices.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::validate;
use crate::error::{ConfigError, CoreError};
use crate::KeyIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayConfig {
    pub capacity: usize,
    pub key_len: usize,
    /// Keep keys in ascending order ([`SequentialArray`] only; a
    /// [`BinaryArray`] is always sorted).
    pub sorted: bool,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            key_len: 2,
            sorted: false,
        }
    }
}

impl ArrayConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidTableSize);
        }
        if self.key_len == 0 {
            return Err(ConfigError::InvalidKeyLength);
        }
        Ok(())
    }
}

/// Backing storage shared by both array flavours.
#[derive(Debug, Clone)]
struct Bounded {
    keys: Vec<String>,
    capacity: usize,
    key_len: usize,
}

impl Bounded {
    fn new(config: &ArrayConfig) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self {
            keys: Vec::with_capacity(config.capacity),
            capacity: config.capacity,
            key_len: config.key_len,
        })
    }

    /// Called after the duplicate check, so a duplicate wins over `TableFull`.
    fn ensure_room(&self) -> Result<(), CoreError> {
        if self.keys.len() >= self.capacity {
            return Err(CoreError::TableFull {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) {
        // Vec::remove shifts the tail left.
        let key = self.keys.remove(index);
        debug!(key = key.as_str(), index, "deleted");
    }

    fn snapshot(&self) -> Vec<Option<String>> {
        let mut cells: Vec<Option<String>> = self.keys.iter().cloned().map(Some).collect();
        cells.resize(self.capacity, None);
        cells
    }
}

// =============================================================================
// Sequential search
// =============================================================================

/// Array searched front to back, optionally kept sorted by insertion sort.
#[derive(Debug, Clone)]
pub struct SequentialArray {
    inner: Bounded,
    sorted: bool,
}

impl SequentialArray {
    pub fn new(capacity: usize, key_len: usize, sorted: bool) -> Result<Self, ConfigError> {
        Self::with_config(ArrayConfig {
            capacity,
            key_len,
            sorted,
        })
    }

    pub fn with_config(config: ArrayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Bounded::new(&config)?,
            sorted: config.sorted,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.inner.key_len
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.keys.len() >= self.inner.capacity
    }

    /// A sorted array stops scanning at the first key greater than `key`.
    pub fn find(&self, key: &str) -> Result<Option<usize>, CoreError> {
        validate(key, self.inner.key_len)?;
        for (index, stored) in self.inner.keys.iter().enumerate() {
            match stored.as_str().cmp(key) {
                Ordering::Equal => return Ok(Some(index)),
                Ordering::Greater if self.sorted => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// The whole array, `None` past the last key.
    pub fn snapshot(&self) -> Vec<Option<String>> {
        self.inner.snapshot()
    }
}

impl KeyIndex for SequentialArray {
    type Location = usize;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        if self.find(key)?.is_some() {
            return Err(CoreError::DuplicateKey(key.to_owned()));
        }
        self.inner.ensure_room()?;

        let keys = &mut self.inner.keys;
        keys.push(key.to_owned());
        let mut index = keys.len() - 1;
        if self.sorted {
            while index > 0 && keys[index] < keys[index - 1] {
                keys.swap(index, index - 1);
                index -= 1;
            }
        }
        debug!(key, index, "inserted");
        Ok(())
    }

    fn search(&self, key: &str) -> Result<usize, CoreError> {
        self.find(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_owned()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let index = self.search(key)?;
        self.inner.remove(index);
        Ok(())
    }

    fn active_keys(&self) -> Vec<String> {
        self.inner.keys.clone()
    }

    fn len(&self) -> usize {
        self.inner.keys.len()
    }
}

// =============================================================================
// Binary search
// =============================================================================

/// Array kept sorted and searched by bisection.
#[derive(Debug, Clone)]
pub struct BinaryArray {
    inner: Bounded,
}

impl BinaryArray {
    pub fn new(capacity: usize, key_len: usize) -> Result<Self, ConfigError> {
        Self::with_config(ArrayConfig {
            capacity,
            key_len,
            sorted: true,
        })
    }

    /// `config.sorted` is ignored.
    pub fn with_config(config: ArrayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Bounded::new(&config)?,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.inner.key_len
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.keys.len() >= self.inner.capacity
    }

    /// Index of `key`, or the index it would be inserted at.
    fn bisect(&self, key: &str) -> Result<usize, usize> {
        let keys = &self.inner.keys;
        let (mut lo, mut hi) = (0usize, keys.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            match keys[mid].as_str().cmp(key) {
                Ordering::Equal => return Ok(mid),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Err(lo)
    }

    pub fn find(&self, key: &str) -> Result<Option<usize>, CoreError> {
        validate(key, self.inner.key_len)?;
        Ok(self.bisect(key).ok())
    }

    /// Indices inspected while searching for `key`, in order.
    pub fn search_path(&self, key: &str) -> Result<Vec<usize>, CoreError> {
        validate(key, self.inner.key_len)?;
        let keys = &self.inner.keys;
        let (mut lo, mut hi) = (0usize, keys.len());
        let mut path = Vec::new();
        while lo < hi {
            let mid = (lo + hi) / 2;
            path.push(mid);
            match keys[mid].as_str().cmp(key) {
                Ordering::Equal => break,
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Ok(path)
    }

    pub fn snapshot(&self) -> Vec<Option<String>> {
        self.inner.snapshot()
    }
}

impl KeyIndex for BinaryArray {
    type Location = usize;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        validate(key, self.inner.key_len)?;
        let index = match self.bisect(key) {
            Ok(_) => return Err(CoreError::DuplicateKey(key.to_owned())),
            Err(index) => index,
        };
        self.inner.ensure_room()?;
        self.inner.keys.insert(index, key.to_owned());
        debug!(key, index, "inserted");
        Ok(())
    }

    fn search(&self, key: &str) -> Result<usize, CoreError> {
        self.find(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_owned()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let index = self.search(key)?;
        self.inner.remove(index);
        Ok(())
    }

    /// Ascending.
    fn active_keys(&self) -> Vec<String> {
        self.inner.keys.clone()
    }

    fn len(&self) -> usize {
        self.inner.keys.len()
    }
}

//! Chained hashing: a fixed base array plus one overflow list per slot.
//!
//! The first key hashed to a slot lives in the base array; later ones are
//! appended to that slot's chain. Deleting a base key promotes the chain head
//! into the base slot, so a non-empty chain always hangs off an occupied slot.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{KeyCodec, KeyEncoding};
use crate::error::{ConfigError, CoreError};
use crate::hash::{HashFunction, HashStrategy};
use crate::{KeyIndex, TableStats};

/// Where a key sits in a [`ChainedTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLocation {
    /// 1-based base position.
    pub position: usize,
    /// 0 for the base slot, then 1, 2, ... along the chain.
    pub hops: usize,
}

impl fmt::Display for ChainLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hops == 0 {
            write!(f, "position {}", self.position)
        } else {
            write!(f, "position {}, chain node {}", self.position, self.hops)
        }
    }
}

/// One base slot and its overflow chain, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSlotView {
    pub position: usize,
    pub base: Option<String>,
    pub chain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedConfig {
    pub capacity: usize,
    pub key_len: usize,
    pub hash: HashStrategy,
    pub encoding: KeyEncoding,
}

impl Default for ChainedConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            key_len: 2,
            hash: HashStrategy::Mod,
            encoding: KeyEncoding::Literal,
        }
    }
}

#[derive(Debug, Clone)]
struct ChainNode {
    key: String,
    next: Option<Box<ChainNode>>,
}

type Link = Option<Box<ChainNode>>;

fn append(link: &mut Link, key: String) {
    match link {
        Some(node) => append(&mut node.next, key),
        None => *link = Some(Box::new(ChainNode { key, next: None })),
    }
}

fn unlink(link: &mut Link, key: &str) -> bool {
    match link {
        None => false,
        Some(node) if node.key == key => {
            *link = node.next.take();
            true
        }
        Some(node) => unlink(&mut node.next, key),
    }
}

struct ChainIter<'a> {
    next: Option<&'a ChainNode>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.key)
    }
}

/// Hash table with a base array and per-slot linked overflow chains.
#[derive(Debug, Clone)]
pub struct ChainedTable {
    base: Vec<Option<String>>,
    chains: Vec<Link>,
    codec: KeyCodec,
    hash: HashFunction,
    count: usize,
}

impl ChainedTable {
    /// MOD-hashed chained table.
    pub fn new(capacity: usize, key_len: usize) -> Result<Self, ConfigError> {
        Self::with_config(ChainedConfig {
            capacity,
            key_len,
            ..ChainedConfig::default()
        })
    }

    pub fn with_config(config: ChainedConfig) -> Result<Self, ConfigError> {
        let codec = KeyCodec::new(config.key_len, config.encoding);
        codec.check()?;
        let hash = HashFunction::new(config.hash, config.capacity)?;
        Ok(Self {
            base: vec![None; config.capacity],
            chains: vec![None; config.capacity],
            codec,
            hash,
            count: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.base.len()
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.codec.key_len()
    }

    pub fn hash_function(&self) -> &HashFunction {
        &self.hash
    }

    pub fn base_position(&self, key: &str) -> Result<usize, CoreError> {
        self.codec.validate(key)?;
        self.hash.position(&self.codec, key)
    }

    fn chain(&self, idx: usize) -> ChainIter<'_> {
        ChainIter {
            next: self.chains[idx].as_deref(),
        }
    }

    pub fn find(&self, key: &str) -> Result<Option<ChainLocation>, CoreError> {
        let position = self.base_position(key)?;
        let idx = position - 1;
        match self.base[idx].as_deref() {
            None => return Ok(None),
            Some(stored) if stored == key => return Ok(Some(ChainLocation { position, hops: 0 })),
            Some(_) => {}
        }
        Ok(self
            .chain(idx)
            .position(|stored| stored == key)
            .map(|i| ChainLocation {
                position,
                hops: i + 1,
            }))
    }

    /// Base slots with their chains, in table order.
    pub fn snapshot(&self) -> Vec<ChainSlotView> {
        (0..self.capacity())
            .map(|idx| ChainSlotView {
                position: idx + 1,
                base: self.base[idx].clone(),
                chain: self.chain(idx).map(str::to_owned).collect(),
            })
            .collect()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            longest_chain: (0..self.capacity())
                .map(|idx| self.chain(idx).count())
                .max()
                .unwrap_or(0),
            ..TableStats::new(self.capacity(), self.count)
        }
    }
}

impl KeyIndex for ChainedTable {
    type Location = ChainLocation;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        if self.find(key)?.is_some() {
            return Err(CoreError::DuplicateKey(key.to_owned()));
        }
        let position = self.hash.position(&self.codec, key)?;
        let idx = position - 1;
        if self.base[idx].is_none() {
            self.base[idx] = Some(key.to_owned());
            debug!(key, position, hops = 0, "inserted");
        } else {
            append(&mut self.chains[idx], key.to_owned());
            debug!(key, position, hops = self.chain(idx).count(), "inserted");
        }
        self.count += 1;
        Ok(())
    }

    fn search(&self, key: &str) -> Result<ChainLocation, CoreError> {
        self.find(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_owned()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let location = self.search(key)?;
        let idx = location.position - 1;
        if location.hops == 0 {
            self.base[idx] = match self.chains[idx].take() {
                Some(head) => {
                    let head = *head;
                    self.chains[idx] = head.next;
                    Some(head.key)
                }
                None => None,
            };
        } else {
            let removed = unlink(&mut self.chains[idx], key);
            debug_assert!(removed);
        }
        self.count -= 1;
        debug!(key, position = location.position, hops = location.hops, "deleted");
        Ok(())
    }

    fn active_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.count);
        for idx in 0..self.capacity() {
            keys.extend(self.base[idx].iter().cloned());
            keys.extend(self.chain(idx).map(str::to_owned));
        }
        keys
    }

    fn len(&self) -> usize {
        self.count
    }
}

//! Open addressing: one fixed array, collisions resolved by probing.
//!
//! Deleted keys leave a [`Slot::Tombstone`] behind. Searches skip
//! tombstones and stop at the first [`Slot::Empty`], so a key pushed past a
//! deleted neighbour is still reachable.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::codec::{KeyCodec, KeyEncoding};
use crate::error::{ConfigError, CoreError};
use crate::hash::{HashFunction, HashStrategy};
use crate::probe::{secondary_step, ProbePolicy, ProbeSequence};
use crate::{KeyIndex, TableStats};

/// State of one table slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    Empty,
    /// A deleted key; free for inserts, transparent to searches.
    Tombstone,
    Occupied(String),
}

impl Slot {
    /// The stored key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Slot::Occupied(key) => Some(key),
            _ => None,
        }
    }

    #[inline]
    fn is_free(&self) -> bool {
        matches!(self, Slot::Empty | Slot::Tombstone)
    }
}

/// Construction parameters for [`OpenAddressingTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenConfig {
    /// Number of slots `n`.
    pub capacity: usize,
    /// Exact length of every key, in characters.
    pub key_len: usize,
    pub hash: HashStrategy,
    pub probe: ProbePolicy,
    pub encoding: KeyEncoding,
}

impl Default for OpenConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            key_len: 2,
            hash: HashStrategy::Mod,
            probe: ProbePolicy::Linear,
            encoding: KeyEncoding::Literal,
        }
    }
}

/// Fixed-capacity hash table with open addressing.
#[derive(Debug, Clone)]
pub struct OpenAddressingTable {
    slots: Vec<Slot>,
    codec: KeyCodec,
    hash: HashFunction,
    policy: ProbePolicy,
    count: usize,
}

impl OpenAddressingTable {
    pub fn new(
        capacity: usize,
        key_len: usize,
        hash: HashStrategy,
        probe: ProbePolicy,
    ) -> Result<Self, ConfigError> {
        Self::with_config(OpenConfig {
            capacity,
            key_len,
            hash,
            probe,
            ..OpenConfig::default()
        })
    }

    pub fn with_config(config: OpenConfig) -> Result<Self, ConfigError> {
        let codec = KeyCodec::new(config.key_len, config.encoding);
        codec.check()?;
        let hash = HashFunction::new(config.hash, config.capacity)?;
        Ok(Self {
            slots: vec![Slot::Empty; config.capacity],
            codec,
            hash,
            policy: config.probe,
            count: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.codec.key_len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count >= self.capacity()
    }

    pub fn hash_function(&self) -> &HashFunction {
        &self.hash
    }

    pub fn probe_policy(&self) -> ProbePolicy {
        self.policy
    }

    /// `H(k)` for `key`, 1-based, before any collision handling.
    pub fn base_position(&self, key: &str) -> Result<usize, CoreError> {
        self.codec.validate(key)?;
        self.hash.position(&self.codec, key)
    }

    /// 0-based slots the configured policy visits for `key`, base slot first.
    pub fn probe_sequence(&self, key: &str) -> Result<ProbeSequence, CoreError> {
        self.codec.validate(key)?;
        self.sequence(key)
    }

    fn sequence(&self, key: &str) -> Result<ProbeSequence, CoreError> {
        let base = self.hash.position(&self.codec, key)?;
        let step = match self.policy {
            ProbePolicy::DoubleHash => secondary_step(self.codec.numeric_value(key)?, self.capacity()),
            _ => 0,
        };
        Ok(ProbeSequence::new(self.policy, base, self.capacity(), step))
    }

    /// 1-based position of `key`, or `None` when a search hits an empty slot
    /// or runs out of attempts.
    pub fn find(&self, key: &str) -> Result<Option<usize>, CoreError> {
        self.codec.validate(key)?;
        for slot in self.sequence(key)? {
            match &self.slots[slot] {
                Slot::Empty => return Ok(None),
                Slot::Occupied(stored) if stored == key => return Ok(Some(slot + 1)),
                _ => {}
            }
        }
        Ok(None)
    }

    /// 1-based positions a search for `key` visits, in order, including the
    /// one it stops at.
    pub fn probe_path(&self, key: &str) -> Result<Vec<usize>, CoreError> {
        self.codec.validate(key)?;
        let mut path = Vec::new();
        for slot in self.sequence(key)? {
            path.push(slot + 1);
            match &self.slots[slot] {
                Slot::Empty => break,
                Slot::Occupied(stored) if stored == key => break,
                _ => {}
            }
        }
        Ok(path)
    }

    /// Every slot in table order.
    pub fn snapshot(&self) -> Vec<Slot> {
        self.slots.clone()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            tombstones: self
                .slots
                .iter()
                .filter(|s| matches!(s, Slot::Tombstone))
                .count(),
            ..TableStats::new(self.capacity(), self.count)
        }
    }
}

impl KeyIndex for OpenAddressingTable {
    type Location = usize;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        if self.find(key)?.is_some() {
            return Err(CoreError::DuplicateKey(key.to_owned()));
        }
        if self.is_full() {
            return Err(CoreError::TableFull {
                capacity: self.capacity(),
            });
        }

        let mut sequence = self.sequence(key)?;
        for slot in sequence.by_ref() {
            if self.slots[slot].is_free() {
                self.slots[slot] = Slot::Occupied(key.to_owned());
                self.count += 1;
                debug!(key, position = slot + 1, "inserted");
                return Ok(());
            }
            trace!(key, position = slot + 1, "collision");
        }

        // Quadratic and double-hash sequences can cycle over a subset of slots.
        warn!(
            key,
            attempts = sequence.attempt(),
            len = self.count,
            "probe sequence exhausted"
        );
        Err(CoreError::TableFull {
            capacity: self.capacity(),
        })
    }

    fn search(&self, key: &str) -> Result<usize, CoreError> {
        self.find(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_owned()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let position = self.search(key)?;
        self.slots[position - 1] = Slot::Tombstone;
        self.count -= 1;
        debug!(key, position, "deleted");
        Ok(())
    }

    fn active_keys(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|s| s.key().map(str::to_owned))
            .collect()
    }

    fn len(&self) -> usize {
        self.count
    }
}

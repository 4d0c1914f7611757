//! Multi-way radix tree consuming `m` code bits per level.
//!
//! The 5-bit code is cut into `ceil(5 / m)` groups of `m` bits, the last one
//! possibly shorter. Each group picks a child at its level and keys live only
//! on the last level, so every key sits at the same depth. Deletes rebuild
//! the tree from the insertion history.

use smallvec::SmallVec;
use tracing::debug;

use super::{code_of, Arena, LetterCode, NodeId, TreePath, TreeView, CODE_BITS};
use crate::error::{ConfigError, CoreError, KeyError};
use crate::KeyIndex;

#[derive(Debug, Clone)]
pub struct MultiwayTree {
    arena: Arena,
    root: NodeId,
    m: u32,
    /// Bits consumed at each level; sums to [`CODE_BITS`].
    bits_per_level: SmallVec<[usize; CODE_BITS]>,
    history: Vec<char>,
}

impl MultiwayTree {
    /// `m` bits per level, `1..=5`.
    pub fn new(m: u32) -> Result<Self, ConfigError> {
        if !(1..=CODE_BITS as u32).contains(&m) {
            return Err(ConfigError::BitsPerLevel(m));
        }
        let mut bits_per_level: SmallVec<[usize; CODE_BITS]> = SmallVec::new();
        let mut remaining = CODE_BITS;
        while remaining > 0 {
            let bits = remaining.min(m as usize);
            bits_per_level.push(bits);
            remaining -= bits;
        }
        let mut arena = Arena::default();
        let root = arena.alloc(None, 1 << bits_per_level[0]);
        Ok(Self {
            arena,
            root,
            m,
            bits_per_level,
            history: Vec::new(),
        })
    }

    /// Bits per level as configured.
    #[inline]
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Children per node, `2^m`.
    #[inline]
    pub fn fanout(&self) -> usize {
        1 << self.m
    }

    /// Tree depth, `ceil(5 / m)`.
    #[inline]
    pub fn levels(&self) -> usize {
        self.bits_per_level.len()
    }

    pub fn bits_per_level(&self) -> &[usize] {
        &self.bits_per_level
    }

    pub fn code_of(&self, key: &str) -> Result<String, KeyError> {
        code_of(key)
    }

    /// `key`'s code split into one bit group per level.
    pub fn groups(&self, key: &str) -> Result<Vec<String>, KeyError> {
        let bits = code_of(key)?;
        let mut start = 0;
        Ok(self
            .bits_per_level
            .iter()
            .map(|&len| {
                let group = bits[start..start + len].to_owned();
                start += len;
                group
            })
            .collect())
    }

    /// Child index taken at every level.
    fn indices(&self, code: LetterCode) -> SmallVec<[usize; CODE_BITS]> {
        let mut start = 0;
        self.bits_per_level
            .iter()
            .map(|&len| {
                let index = code.group(start, len);
                start += len;
                index
            })
            .collect()
    }

    fn fanout_at(&self, level: usize) -> usize {
        self.bits_per_level.get(level).map_or(0, |&bits| 1 << bits)
    }

    pub fn keys(&self) -> Vec<String> {
        self.history.iter().copied().map(String::from).collect()
    }

    /// Stored keys in child-index order, which is alphabetical.
    pub fn collected_keys(&self) -> Vec<String> {
        self.arena.preorder_keys(Some(self.root))
    }

    pub fn snapshot(&self) -> TreeView {
        self.arena.view(Some(self.root), |depth| {
            self.bits_per_level.get(depth).copied().unwrap_or(0)
        })
    }

    fn locate(&self, code: LetterCode) -> Option<TreePath> {
        let mut node = self.root;
        for index in self.indices(code) {
            node = self.arena.child(node, index)?;
        }
        (self.arena.key(node) == Some(code.letter())).then(|| TreePath {
            depth: self.levels(),
            bits: code.bits_string(),
        })
    }

    pub fn find(&self, key: &str) -> Result<Option<TreePath>, CoreError> {
        let code = LetterCode::parse(key)?;
        Ok(self.locate(code))
    }

    fn place(&mut self, code: LetterCode) {
        let mut node = self.root;
        for (level, index) in self.indices(code).into_iter().enumerate() {
            node = match self.arena.child(node, index) {
                Some(child) => child,
                None => {
                    // Leaves get no child slots.
                    let fanout = self.fanout_at(level + 1);
                    let child = self.arena.alloc(None, fanout);
                    self.arena.set_child(node, index, child);
                    child
                }
            };
        }
        self.arena.get_mut(node).key = Some(code.letter());
    }

    fn rebuild(&mut self) -> Result<(), KeyError> {
        let fanout = self.fanout_at(0);
        self.arena.clear();
        self.root = self.arena.alloc(None, fanout);
        for letter in self.history.clone() {
            self.place(LetterCode::from_char(letter)?);
        }
        Ok(())
    }
}

impl KeyIndex for MultiwayTree {
    type Location = TreePath;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        let code = LetterCode::parse(key)?;
        let letter = code.letter();
        if self.locate(code).is_some() {
            return Err(CoreError::DuplicateKey(letter.to_string()));
        }
        self.place(code);
        self.history.push(letter);
        debug!(key = %letter, m = self.m, "inserted");
        Ok(())
    }

    fn search(&self, key: &str) -> Result<TreePath, CoreError> {
        let code = LetterCode::parse(key)?;
        self.locate(code)
            .ok_or_else(|| CoreError::NotFound(code.letter().to_string()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let code = LetterCode::parse(key)?;
        let letter = code.letter();
        if self.locate(code).is_none() {
            return Err(CoreError::NotFound(letter.to_string()));
        }
        self.history.retain(|&c| c != letter);
        self.rebuild()?;
        debug!(key = %letter, remaining = self.history.len(), "deleted and rebuilt");
        Ok(())
    }

    /// Insertion order.
    fn active_keys(&self) -> Vec<String> {
        self.keys()
    }

    fn len(&self) -> usize {
        self.history.len()
    }
}

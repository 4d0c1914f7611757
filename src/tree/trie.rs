//! Binary trie with collision splitting.
//!
//! The root is a pure link node. A key is stored as a terminal node as soon
//! as its bit path reaches a free child. When the child is already a
//! terminal, that node turns into a link and both keys are pushed one bit
//! deeper, so every terminal sits exactly where its code first diverges from
//! its neighbours'. Deletes rebuild the trie from the insertion history.

use tracing::{debug, trace};

use super::{code_of, Arena, LetterCode, NodeId, TreePath, TreeView, CODE_BITS};
use crate::error::{CoreError, KeyError};
use crate::KeyIndex;

#[derive(Debug, Clone)]
pub struct SplitTrie {
    arena: Arena,
    root: NodeId,
    history: Vec<char>,
}

impl Default for SplitTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitTrie {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let root = arena.alloc(None, 2);
        Self {
            arena,
            root,
            history: Vec::new(),
        }
    }

    pub fn code_of(&self, key: &str) -> Result<String, KeyError> {
        code_of(key)
    }

    /// Stored keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.history.iter().copied().map(String::from).collect()
    }

    /// Stored keys in pre-order, left before right.
    pub fn collected_keys(&self) -> Vec<String> {
        self.arena.preorder_keys(Some(self.root))
    }

    pub fn snapshot(&self) -> TreeView {
        self.arena.view(Some(self.root), |_| 1)
    }

    fn locate(&self, code: LetterCode) -> Option<TreePath> {
        let mut node = self.root;
        let mut path = TreePath::default();
        for i in 0..CODE_BITS {
            let bit = code.bit(i);
            node = self.arena.child(node, usize::from(bit))?;
            path.depth += 1;
            path.bits.push(if bit { '1' } else { '0' });
            match self.arena.key(node) {
                Some(stored) if stored == code.letter() => return Some(path),
                // Terminal holding another key.
                Some(_) => return None,
                None => {}
            }
        }
        None
    }

    pub fn find(&self, key: &str) -> Result<Option<TreePath>, CoreError> {
        let code = LetterCode::parse(key)?;
        Ok(self.locate(code))
    }

    fn insert_from(&mut self, node: NodeId, code: LetterCode, level: usize) -> Result<(), CoreError> {
        if level >= CODE_BITS {
            return Err(CoreError::CapacityExceeded(code.letter().to_string()));
        }
        let side = usize::from(code.bit(level));
        let Some(child) = self.arena.child(node, side) else {
            let leaf = self.arena.alloc(Some(code.letter()), 2);
            self.arena.set_child(node, side, leaf);
            return Ok(());
        };
        match self.arena.get_mut(child).key.take() {
            None => self.insert_from(child, code, level + 1),
            Some(resident) => {
                trace!(key = %code.letter(), %resident, depth = level + 1, "split");
                self.insert_from(child, LetterCode::from_char(resident)?, level + 1)?;
                self.insert_from(child, code, level + 1)
            }
        }
    }

    fn rebuild(&mut self) -> Result<(), CoreError> {
        self.arena.clear();
        self.root = self.arena.alloc(None, 2);
        for letter in self.history.clone() {
            self.insert_from(self.root, LetterCode::from_char(letter)?, 0)?;
        }
        Ok(())
    }
}

impl KeyIndex for SplitTrie {
    type Location = TreePath;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        let code = LetterCode::parse(key)?;
        let letter = code.letter();
        if self.locate(code).is_some() {
            return Err(CoreError::DuplicateKey(letter.to_string()));
        }
        self.insert_from(self.root, code, 0)?;
        self.history.push(letter);
        debug!(key = %letter, "inserted");
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

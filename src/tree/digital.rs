//! Plain digital search tree.
//!
//! Every node may hold a key and link to children at the same time. A key
//! is stored at the first free spot on its bit path, so its code is only an
//! upper bound on its depth. Deleting clears the key in place and keeps the
//! branch, which keeps every other key reachable.

use tracing::debug;

use super::{code_of, Arena, LetterCode, NodeId, TreePath, TreeView, CODE_BITS};
use crate::error::{CoreError, KeyError};
use crate::KeyIndex;

#[derive(Debug, Clone, Default)]
pub struct DigitalTree {
    arena: Arena,
    root: Option<NodeId>,
    /// Stored letters in insertion order.
    history: Vec<char>,
}

impl DigitalTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5-bit code of `key`.
    pub fn code_of(&self, key: &str) -> Result<String, KeyError> {
        code_of(key)
    }

    /// Stored keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.history.iter().copied().map(String::from).collect()
    }

    /// Stored keys by in-order traversal (left, node, right).
    pub fn inorder_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.history.len());
        self.inorder(self.root, &mut keys);
        keys
    }

    fn inorder(&self, id: Option<NodeId>, keys: &mut Vec<String>) {
        let Some(id) = id else { return };
        self.inorder(self.arena.child(id, 0), keys);
        keys.extend(self.arena.key(id).map(String::from));
        self.inorder(self.arena.child(id, 1), keys);
    }

    pub fn snapshot(&self) -> TreeView {
        self.arena.view(self.root, |_| 1)
    }

    fn locate(&self, code: LetterCode) -> Option<(NodeId, TreePath)> {
        let mut node = self.root?;
        let mut path = TreePath::default();
        if self.arena.key(node) == Some(code.letter()) {
            return Some((node, path));
        }
        for i in 0..CODE_BITS {
            let bit = code.bit(i);
            node = self.arena.child(node, usize::from(bit))?;
            path.depth += 1;
            path.bits.push(if bit { '1' } else { '0' });
            if self.arena.key(node) == Some(code.letter()) {
                return Some((node, path));
            }
        }
        None
    }

    pub fn find(&self, key: &str) -> Result<Option<TreePath>, CoreError> {
        let code = LetterCode::parse(key)?;
        Ok(self.locate(code).map(|(_, path)| path))
    }

    /// Node that should receive `code`, creating it if the path runs out.
    fn place(&mut self, code: LetterCode) -> Option<(NodeId, usize)> {
        let Some(mut node) = self.root else {
            let root = self.arena.alloc(None, 2);
            self.root = Some(root);
            return Some((root, 0));
        };
        if self.arena.key(node).is_none() {
            return Some((node, 0));
        }
        for i in 0..CODE_BITS {
            let side = usize::from(code.bit(i));
            match self.arena.child(node, side) {
                None => {
                    let child = self.arena.alloc(None, 2);
                    self.arena.set_child(node, side, child);
                    return Some((child, i + 1));
                }
                Some(child) if self.arena.key(child).is_none() => return Some((child, i + 1)),
                Some(child) => node = child,
            }
        }
        None
    }
}

impl KeyIndex for DigitalTree {
    type Location = TreePath;

    fn insert(&mut self, key: &str) -> Result<(), CoreError> {
        let code = LetterCode::parse(key)?;
        let letter = code.letter();
        if self.locate(code).is_some() {
            return Err(CoreError::DuplicateKey(letter.to_string()));
        }
        let (node, depth) = self
            .place(code)
            .ok_or_else(|| CoreError::CapacityExceeded(letter.to_string()))?;
        self.arena.get_mut(node).key = Some(letter);
        self.history.push(letter);
        debug!(key = %letter, depth, "inserted");
        Ok(())
    }

    fn search(&self, key: &str) -> Result<TreePath, CoreError> {
        let code = LetterCode::parse(key)?;
        self.locate(code)
            .map(|(_, path)| path)
            .ok_or_else(|| CoreError::NotFound(code.letter().to_string()))
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let code = LetterCode::parse(key)?;
        let letter = code.letter();
        let (node, path) = self
            .locate(code)
            .ok_or_else(|| CoreError::NotFound(letter.to_string()))?;
        self.arena.get_mut(node).key = None;
        self.history.retain(|&c| c != letter);
        debug!(key = %letter, depth = path.depth, "cleared");
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

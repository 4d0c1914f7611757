//! Bit-radix trees over single letters.
//!
//! A letter is indexed by its alphabet position (`A = 1` .. `Z = 26`) written
//! as a 5-bit code, most significant bit first. Bit `0` selects the left
//! child, bit `1` the right one; the multi-way tree consumes several bits per
//! level instead.
//!
//! Nodes live in an [`Arena`] and refer to their children by [`NodeId`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::KeyError;

pub mod digital;
pub mod multiway;
pub mod trie;

/// Width of every letter code, in bits.
pub const CODE_BITS: usize = 5;

// =============================================================================
// Letter codes
// =============================================================================

/// An upper-case letter and its 5-bit alphabet code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LetterCode {
    letter: char,
    position: u8,
}

impl LetterCode {
    /// Accepts exactly one ASCII letter, in either case.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(KeyError::Empty),
            (Some(c), None) => Self::from_char(c),
            _ => Err(KeyError::NotSingleLetter(key.to_owned())),
        }
    }

    pub fn from_char(c: char) -> Result<Self, KeyError> {
        if !c.is_ascii_alphabetic() {
            return Err(KeyError::NotALetter(c));
        }
        let letter = c.to_ascii_uppercase();
        Ok(Self {
            letter,
            position: letter as u8 - b'A' + 1,
        })
    }

    #[inline]
    pub fn letter(self) -> char {
        self.letter
    }

    /// Alphabet position, `1..=26`.
    #[inline]
    pub fn position(self) -> u8 {
        self.position
    }

    /// The code as an integer; equal to [`position`](Self::position).
    #[inline]
    pub fn bits(self) -> u8 {
        self.position
    }

    /// Bit `i` of the code, `0` being the most significant.
    #[inline]
    pub fn bit(self, i: usize) -> bool {
        debug_assert!(i < CODE_BITS);
        (self.position >> (CODE_BITS - 1 - i)) & 1 == 1
    }

    /// `len` bits starting at bit `start`, as an integer.
    pub fn group(self, start: usize, len: usize) -> usize {
        debug_assert!(start + len <= CODE_BITS);
        let shifted = self.position as usize >> (CODE_BITS - start - len);
        shifted & ((1 << len) - 1)
    }

    /// The code as a `0`/`1` string, e.g. `"00010"` for `B`.
    pub fn bits_string(self) -> String {
        format!("{:05b}", self.position)
    }
}

impl fmt::Display for LetterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> position {} -> {:05b}",
            self.letter, self.position, self.position
        )
    }
}

/// The 5-bit code of a single-letter key.
pub fn code_of(key: &str) -> Result<String, KeyError> {
    LetterCode::parse(key).map(LetterCode::bits_string)
}

// =============================================================================
// Search results and views
// =============================================================================

/// The route from the root to the node holding a key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreePath {
    /// Edges walked; 0 is the root itself.
    pub depth: usize,
    /// Code bits consumed along the way, `""` for the root.
    pub bits: String,
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth == 0 {
            f.write_str("root")
        } else {
            write!(f, "depth {} via {}", self.depth, self.bits)
        }
    }
}

/// One node of a [`TreeView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub depth: usize,
    /// Bits from the root to this node.
    pub path: String,
    /// `None` for link nodes and cleared nodes.
    pub key: Option<char>,
}

/// Every node of a tree in pre-order, children in index order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreeView {
    pub nodes: Vec<NodeView>,
}

impl TreeView {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node reached by `path`, if it exists.
    pub fn node(&self, path: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.path == path)
    }
}

// =============================================================================
// Node arena
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) key: Option<char>,
    children: SmallVec<[Option<NodeId>; 2]>,
}

/// Owns every node of one tree. Nodes are never freed individually; trees
/// that rebuild simply [`clear`](Arena::clear) and start over.
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn alloc(&mut self, key: Option<char>, fanout: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            key,
            children: smallvec::smallvec![None; fanout],
        });
        id
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> Option<char> {
        self.get(id).key
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id).children.get(index).copied().flatten()
    }

    pub(crate) fn set_child(&mut self, id: NodeId, index: usize, child: NodeId) {
        self.get_mut(id).children[index] = Some(child);
    }

    /// Pre-order walk from `root`; `width(depth)` is the number of code bits
    /// spelled by an edge leaving a node at `depth`.
    pub(crate) fn view(&self, root: Option<NodeId>, width: impl Fn(usize) -> usize) -> TreeView {
        let mut view = TreeView::default();
        if let Some(root) = root {
            self.view_from(root, 0, String::new(), &width, &mut view);
        }
        view
    }

    fn view_from(
        &self,
        id: NodeId,
        depth: usize,
        path: String,
        width: &impl Fn(usize) -> usize,
        view: &mut TreeView,
    ) {
        let node = self.get(id);
        view.nodes.push(NodeView {
            depth,
            path: path.clone(),
            key: node.key,
        });
        let bits = width(depth);
        for (index, child) in node.children.iter().enumerate() {
            if let Some(child) = *child {
                let edge = format!("{:0width$b}", index, width = bits);
                self.view_from(child, depth + 1, format!("{path}{edge}"), width, view);
            }
        }
    }

    /// Keys in pre-order (node, then children in index order).
    pub(crate) fn preorder_keys(&self, root: Option<NodeId>) -> Vec<String> {
        let mut keys = Vec::new();
        let mut stack: Vec<NodeId> = root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.get(id);
            keys.extend(node.key.map(String::from));
            stack.extend(node.children.iter().rev().flatten().copied());
        }
        keys
    }
}

//! Strict binary trees with payload carrying leaves, and a flat fixed-stride
//! encoding of them.
//!
//! A [`Tree`] is either a [`Tree::Node`] owning exactly two children or a
//! [`Tree::Leaf`] carrying a [`Payload`]. Interior nodes carry no data, so
//! every tree with `n` leaves has exactly `n - 1` interior nodes.
//!
//! Mirroring swaps the children of every node, all the way down. It comes in
//! three forms with different tradeoffs:
//!
//! - [`Tree::mirror`] rebuilds the tree recursively. Recursion depth equals
//!   the tree height.
//! - [`Tree::mirror_in_place`] mutates the tree using an explicit work
//!   stack, so it handles trees of any depth.
//! - [`FlatTree::mirror_in_place`] swaps the pointer cells of the flat
//!   encoding in a single linear pass, without ever decoding a tree.
//!
//! The flat encoding ([`FlatTree`]) stores one record of [`RECORD_CELLS`]
//! cells per tree node in a `Vec<u64>`, addressed by [`Offset`]. A node
//! record holds the offsets of its two children, a leaf record holds the
//! numeric payload. Only numeric payloads can be encoded, see
//! [`FlatTree::from_tree`].
//!
//! ```
//! use mirror_tree::{FlatTree, Tree};
//!
//! let tree = Tree::node(Tree::node(Tree::leaf(42), Tree::leaf(7)), Tree::leaf(9));
//!
//! // mirroring twice restores the original
//! let mirrored = tree.clone().mirror();
//! assert_ne!(mirrored, tree);
//! assert_eq!(mirrored.mirror(), tree);
//!
//! // the flat encoding round trips
//! let flat = FlatTree::from_tree(&tree).unwrap();
//! assert_eq!(flat.to_tree().unwrap(), tree);
//! ```
use std::{fmt, mem};

use bytes::Bytes;
use smallvec::SmallVec;

mod error;
mod flat;
mod iter;


pub use crate::{
    error::{DecodeError, EncodeError},
    flat::{FlatTree, Offset, Record, Records, RECORD_CELLS},
    iter::{Leaves, Nodes},
};

/// Payload carried by a leaf.
///
/// Leaves hold either a numeric value or an opaque blob. The flat encoding
/// is numeric only, so [`FlatTree::from_tree`] refuses trees containing
/// blob leaves instead of silently mangling them.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    /// A numeric value
    Value(u64),
    /// An opaque blob
    Bytes(Bytes),
}

impl Payload {
    /// The numeric value, if there is one.
    pub const fn value(&self) -> Option<u64> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Bytes(_) => None,
        }
    }
}

impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Self::Value(value)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Bytes(bytes) => write!(f, "[{} bytes]", bytes.len()),
        }
    }
}

/// A strict binary tree.
///
/// Every interior node has exactly two children and no payload of its own.
/// All data lives in the leaves. There is no empty tree, the smallest tree
/// is a single leaf.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tree {
    /// An interior node owning its two children
    Node {
        left: Box<Tree>,
        right: Box<Tree>,
    },
    /// A terminal node carrying the payload
    Leaf {
        data: Payload,
    },
}

impl Tree {
    /// Create an interior node from two subtrees.
    pub fn node(left: Tree, right: Tree) -> Self {
        Self::Node {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a leaf.
    pub fn leaf(data: impl Into<Payload>) -> Self {
        Self::Leaf { data: data.into() }
    }

    /// True if this is a leaf.
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Both children of an interior node, or `None` for a leaf.
    pub fn children(&self) -> Option<(&Tree, &Tree)> {
        match self {
            Self::Node { left, right } => Some((left, right)),
            Self::Leaf { .. } => None,
        }
    }

    /// Number of edges from the root to the deepest leaf.
    ///
    /// 0 for a bare leaf. Computed with an explicit stack, so this works for
    /// trees of any depth.
    pub fn depth(&self) -> u32 {
        let mut res = 0;
        let mut stack = SmallVec::<[(&Tree, u32); 16]>::new();
        stack.push((self, 0));
        while let Some((node, level)) = stack.pop() {
            if let Some((left, right)) = node.children() {
                stack.push((left, level + 1));
                stack.push((right, level + 1));
            } else {
                res = res.max(level);
            }
        }
        res
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.leaves().count() as u64
    }

    /// Total number of nodes, interior and leaf.
    ///
    /// For a tree with `n` leaves this is always `2n - 1`.
    pub fn node_count(&self) -> u64 {
        self.nodes().count() as u64
    }

    /// Iterate over the leaf payloads, leftmost leaf first.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(self)
    }

    /// Iterate over all subtrees in pre order, parents before children.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes::new(self)
    }

    /// The mirror image of the tree.
    ///
    /// Swaps the children of every node by rebuilding the tree recursively,
    /// consuming the input. Leaves are kept as they are, so the leaf
    /// payloads end up in reverse order. Mirroring twice gives back the
    /// original tree.
    ///
    /// Recursion depth equals the tree height, so a degenerate, deeply
    /// skewed tree can exhaust the call stack. [`Tree::mirror_in_place`]
    /// handles such trees.
    pub fn mirror(self) -> Self {
        match self {
            Self::Node { left, right } => Self::node(right.mirror(), left.mirror()),
            leaf => leaf,
        }
    }

    /// Mirror the tree in place.
    ///
    /// Swaps the children of a node before descending into them, pushing
    /// both onto an explicit work stack, so every interior node is visited
    /// exactly once and no tree is ever allocated or freed. The stack lives
    /// on the heap, which makes this safe for trees of any depth.
    pub fn mirror_in_place(&mut self) {
        let mut stack = SmallVec::<[&mut Tree; 16]>::new();
        stack.push(self);
        while let Some(node) = stack.pop() {
            if let Self::Node { left, right } = node {
                mem::swap(left, right);
                stack.push(left);
                stack.push(right);
            }
        }
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node { left, right } => write!(f, "({left:?} {right:?})"),
            Self::Leaf { data } => write!(f, "{data:?}"),
        }
    }
}

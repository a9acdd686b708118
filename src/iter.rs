//! Iterators over trees.
//!
//! Both iterators drive the traversal from an explicit stack, so they are
//! safe for trees of any depth. The stack is a [`SmallVec`] that only spills
//! to the heap for trees deeper than a typical balanced tree.
use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::{Payload, Tree};

/// Iterator over the leaf payloads of a tree, leftmost leaf first.
///
/// Created by [`Tree::leaves`].
#[derive(Debug)]
pub struct Leaves<'a> {
    stack: SmallVec<[&'a Tree; 16]>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(tree: &'a Tree) -> Self {
        let mut stack = SmallVec::new();
        stack.push(tree);
        Self { stack }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Payload;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Tree::Node { left, right } => {
                    // push right first so we pop left first
                    self.stack.push(right);
                    self.stack.push(left);
                }
                Tree::Leaf { data } => break Some(data),
            }
        }
    }
}

impl FusedIterator for Leaves<'_> {}

/// Pre order iterator over all subtrees of a tree, parents before children.
///
/// Created by [`Tree::nodes`]. Yields every node, interior and leaf, so it
/// produces `2n - 1` items for a tree with `n` leaves.
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: SmallVec<[&'a Tree; 16]>,
}

impl<'a> Nodes<'a> {
    pub(crate) fn new(tree: &'a Tree) -> Self {
        let mut stack = SmallVec::new();
        stack.push(tree);
        Self { stack }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Tree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Tree::Node { left, right } = node {
            self.stack.push(right);
            self.stack.push(left);
        }
        Some(node)
    }
}

impl FusedIterator for Nodes<'_> {}

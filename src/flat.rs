//! The flat, fixed-stride encoding of a tree.
//!
//! A [`FlatTree`] stores one record of [`RECORD_CELLS`] cells per tree node
//! in a single `Vec<u64>`. A record starting at offset `i` is laid out as
//!
//! ```text
//! cells[i]     left child offset, or 0 for a leaf
//! cells[i + 1] right child offset, or 0 for a leaf
//! cells[i + 2] payload for a leaf, 0 for an interior node
//! ```
//!
//! Offset 0 is reserved for the root record, so a child pointer of 0 is
//! unambiguous: `cells[i] != 0` is the only test a decoder needs to tell a
//! node record from a leaf record. Child records are always placed after
//! their parent, so walking child pointers strictly increases the offset.
//!
//! The tree `(42 (333 777))` encodes as
//!
//! ```text
//! offset  0         3         6         9          12
//! cells   [3, 6, 0, 0, 0, 42, 9, 12, 0, 0, 0, 333, 0, 0, 777]
//!          root      leaf 42   node      leaf 333   leaf 777
//! ```
use std::{fmt, iter::FusedIterator, slice};

use smallvec::SmallVec;

use crate::{
    error::{DecodeError, EncodeError},
    Tree,
};

/// Number of cells in a single record.
pub const RECORD_CELLS: u64 = 3;

/// Start offset of a record in a [`FlatTree`].
///
/// Valid offsets are multiples of [`RECORD_CELLS`]; offset 0 is the root
/// record.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset(pub u64);

impl Offset {
    /// The root record.
    pub const ROOT: Offset = Offset(0);

    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded view of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// An interior node. The payload cell of a node record is always 0.
    Node {
        left: Offset,
        right: Offset,
    },
    /// A leaf carrying a numeric payload. Both pointer cells are 0.
    Leaf {
        value: u64,
    },
}

/// A tree of numeric leaves, encoded as a flat cell buffer.
///
/// The encoding only represents numeric payloads, see [`FlatTree::from_tree`].
/// All operations except [`FlatTree::mirror_in_place`] and the accessors
/// validate offsets and report [`DecodeError`] instead of panicking on
/// malformed cell buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatTree {
    cells: Vec<u64>,
}

impl FlatTree {
    /// Encode a tree into a fresh cell buffer.
    ///
    /// Records are allocated while walking the tree with an explicit stack,
    /// so this works for trees of any depth. When a node record is written,
    /// its two children get the next two free record slots, left before
    /// right. The root goes to offset 0.
    ///
    /// Fails with [`EncodeError::UnsupportedPayload`] if any leaf carries a
    /// payload that [`Payload::value`](crate::Payload::value) cannot
    /// represent as a `u64`. The tree itself is never modified.
    pub fn from_tree(tree: &Tree) -> Result<Self, EncodeError> {
        let mut cells = vec![0u64; (tree.node_count() * RECORD_CELLS) as usize];
        let mut stack = SmallVec::<[(&Tree, Offset); 16]>::new();
        stack.push((tree, Offset::ROOT));
        // highest record start handed out so far
        let mut allocated = 0;
        while let Some((node, offset)) = stack.pop() {
            let i = offset.to_usize();
            match node {
                Tree::Node { left, right } => {
                    let l = Offset(allocated + RECORD_CELLS);
                    let r = Offset(allocated + 2 * RECORD_CELLS);
                    allocated = r.0;
                    cells[i] = l.0;
                    cells[i + 1] = r.0;
                    stack.push((left, l));
                    stack.push((right, r));
                }
                Tree::Leaf { data } => {
                    let Some(value) = data.value() else {
                        return Err(EncodeError::UnsupportedPayload(offset));
                    };
                    cells[i + 2] = value;
                }
            }
        }
        Ok(Self { cells })
    }

    /// Take ownership of an existing cell buffer.
    ///
    /// This only checks the buffer shape, a non-zero multiple of
    /// [`RECORD_CELLS`] cells. The record contents are validated lazily by
    /// [`FlatTree::record`] and [`FlatTree::subtree`] as they are read.
    pub fn from_cells(cells: Vec<u64>) -> Result<Self, DecodeError> {
        let len = cells.len() as u64;
        if len == 0 || len % RECORD_CELLS != 0 {
            // offset of the missing or truncated record
            return Err(DecodeError::MalformedEncoding(Offset(len - len % RECORD_CELLS)));
        }
        Ok(Self { cells })
    }

    /// The raw cells.
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Discard the wrapper and return the cell buffer.
    pub fn into_cells(self) -> Vec<u64> {
        self.cells
    }

    /// Number of records in the buffer.
    pub fn record_count(&self) -> u64 {
        self.cells.len() as u64 / RECORD_CELLS
    }

    /// Decode the record at the given offset.
    ///
    /// Fails if the offset is not a multiple of [`RECORD_CELLS`] or if the
    /// record does not lie fully within the buffer.
    pub fn record(&self, offset: Offset) -> Result<Record, DecodeError> {
        // bounds are checked in u64 so a huge offset cannot wrap
        let fits = offset
            .0
            .checked_add(RECORD_CELLS)
            .map_or(false, |end| end <= self.cells.len() as u64);
        if offset.0 % RECORD_CELLS != 0 || !fits {
            return Err(DecodeError::MalformedEncoding(offset));
        }
        let i = offset.to_usize();
        Ok(decode_record(&self.cells[i..i + RECORD_CELLS as usize]))
    }

    /// Decode the subtree rooted at the given offset.
    ///
    /// Recursion depth equals the height of the decoded subtree.
    pub fn subtree(&self, offset: Offset) -> Result<Tree, DecodeError> {
        match self.record(offset)? {
            Record::Node { left, right } => {
                // offsets are allocated in strictly increasing order, so a
                // child pointer that does not move forward cannot come from
                // a valid encoding and would loop the decoder
                if left.0 <= offset.0 || right.0 <= offset.0 {
                    return Err(DecodeError::MalformedEncoding(offset));
                }
                Ok(Tree::node(self.subtree(left)?, self.subtree(right)?))
            }
            Record::Leaf { value } => Ok(Tree::leaf(value)),
        }
    }

    /// Decode the whole buffer back into a tree, starting at the root record.
    pub fn to_tree(&self) -> Result<Tree, DecodeError> {
        self.subtree(Offset::ROOT)
    }

    /// Mirror the encoded tree without decoding it.
    ///
    /// Swaps the two pointer cells of every record. For a leaf record that
    /// swaps two zero cells, a no-op, and the payload cell is never touched,
    /// so this is a single linear pass that visits each record once.
    pub fn mirror_in_place(&mut self) {
        for record in self.cells.chunks_exact_mut(RECORD_CELLS as usize) {
            record.swap(0, 1);
        }
    }

    /// Iterate over all records in offset order, with their offsets.
    ///
    /// This enumerates records as they are stored, which is not a traversal
    /// order of the tree.
    pub fn records(&self) -> Records<'_> {
        Records {
            inner: self.cells.chunks_exact(RECORD_CELLS as usize),
            offset: 0,
        }
    }
}

fn decode_record(cells: &[u64]) -> Record {
    if cells[0] != 0 {
        Record::Node {
            left: Offset(cells[0]),
            right: Offset(cells[1]),
        }
    } else {
        Record::Leaf { value: cells[2] }
    }
}

/// Iterator over the records of a [`FlatTree`], created by
/// [`FlatTree::records`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    inner: slice::ChunksExact<'a, u64>,
    offset: u64,
}

impl Iterator for Records<'_> {
    type Item = (Offset, Record);

    fn next(&mut self) -> Option<Self::Item> {
        let cells = self.inner.next()?;
        let offset = Offset(self.offset);
        self.offset += RECORD_CELLS;
        Some((offset, decode_record(cells)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Records<'_> {}

impl FusedIterator for Records<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_node_tree() -> Tree {
        Tree::node(
            Tree::leaf(42),
            Tree::node(Tree::leaf(333), Tree::leaf(777)),
        )
    }

    fn node_leaf_tree() -> Tree {
        Tree::node(Tree::node(Tree::leaf(42), Tree::leaf(7)), Tree::leaf(9))
    }

    #[test]
    fn encode_leaf_node_tree() {
        let flat = FlatTree::from_tree(&leaf_node_tree()).unwrap();
        assert_eq!(
            flat.cells(),
            &[3, 6, 0, 0, 0, 42, 9, 12, 0, 0, 0, 333, 0, 0, 777]
        );
    }

    #[test]
    fn encode_node_leaf_tree() {
        let flat = FlatTree::from_tree(&node_leaf_tree()).unwrap();
        assert_eq!(
            flat.cells(),
            &[3, 6, 0, 9, 12, 0, 0, 0, 9, 0, 0, 42, 0, 0, 7]
        );
    }

    #[test]
    fn encode_single_leaf() {
        let flat = FlatTree::from_tree(&Tree::leaf(7)).unwrap();
        assert_eq!(flat.cells(), &[0, 0, 7]);
        assert_eq!(flat.record_count(), 1);
        assert_eq!(flat.record(Offset::ROOT), Ok(Record::Leaf { value: 7 }));
        assert_eq!(flat.to_tree(), Ok(Tree::leaf(7)));
    }

    #[test]
    fn decode_round_trip() {
        for tree in [leaf_node_tree(), node_leaf_tree()] {
            let flat = FlatTree::from_tree(&tree).unwrap();
            assert_eq!(flat.to_tree().unwrap(), tree);
        }
    }

    #[test]
    fn zero_payload_survives_a_round_trip() {
        // a zero payload cell looks just like the padding cell of a node
        // record, but the pointer cells alone decide how a record decodes
        let tree = Tree::node(Tree::leaf(0), Tree::leaf(0));
        let flat = FlatTree::from_tree(&tree).unwrap();
        assert_eq!(flat.cells(), &[3, 6, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(flat.to_tree().unwrap(), tree);
    }

    #[test]
    fn mirror_swaps_only_pointer_cells() {
        let mut flat = FlatTree::from_tree(&leaf_node_tree()).unwrap();
        flat.mirror_in_place();
        assert_eq!(
            flat.cells(),
            &[6, 3, 0, 0, 0, 42, 12, 9, 0, 0, 0, 333, 0, 0, 777]
        );
        assert_eq!(flat.to_tree().unwrap(), leaf_node_tree().mirror());
    }

    #[test]
    fn mirrored_encoding_decodes_to_the_mirrored_tree() {
        let tree = node_leaf_tree();
        let mut flat = FlatTree::from_tree(&tree).unwrap();
        flat.mirror_in_place();
        let expected = Tree::node(
            Tree::leaf(9),
            Tree::node(Tree::leaf(7), Tree::leaf(42)),
        );
        assert_eq!(tree.mirror(), expected);
        assert_eq!(flat.to_tree().unwrap(), expected);
    }

    #[test]
    fn records_enumerates_in_offset_order() {
        let flat = FlatTree::from_tree(&leaf_node_tree()).unwrap();
        let records = flat.records().collect::<Vec<_>>();
        assert_eq!(
            records,
            vec![
                (
                    Offset(0),
                    Record::Node {
                        left: Offset(3),
                        right: Offset(6)
                    }
                ),
                (Offset(3), Record::Leaf { value: 42 }),
                (
                    Offset(6),
                    Record::Node {
                        left: Offset(9),
                        right: Offset(12)
                    }
                ),
                (Offset(9), Record::Leaf { value: 333 }),
                (Offset(12), Record::Leaf { value: 777 }),
            ]
        );
        assert_eq!(flat.records().len(), 5);
    }

    #[test]
    fn from_cells_checks_the_buffer_shape() {
        assert_eq!(
            FlatTree::from_cells(vec![]),
            Err(DecodeError::MalformedEncoding(Offset(0)))
        );
        assert_eq!(
            FlatTree::from_cells(vec![0, 0, 1, 0]),
            Err(DecodeError::MalformedEncoding(Offset(3)))
        );
        assert!(FlatTree::from_cells(vec![0, 0, 1]).is_ok());
    }

    #[test]
    fn cells_round_trip_through_from_cells() {
        let flat = FlatTree::from_tree(&leaf_node_tree()).unwrap();
        let rebuilt = FlatTree::from_cells(flat.clone().into_cells()).unwrap();
        assert_eq!(rebuilt, flat);
    }

    #[test]
    fn record_checks_alignment_and_bounds() {
        let flat = FlatTree::from_tree(&leaf_node_tree()).unwrap();
        assert_eq!(
            flat.record(Offset(1)),
            Err(DecodeError::MalformedEncoding(Offset(1)))
        );
        assert_eq!(
            flat.record(Offset(15)),
            Err(DecodeError::MalformedEncoding(Offset(15)))
        );
    }

    #[test]
    fn decode_rejects_backwards_pointers() {
        // right child pointer of 0 aims back at the root record
        let flat = FlatTree::from_cells(vec![3, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(
            flat.to_tree(),
            Err(DecodeError::MalformedEncoding(Offset(0)))
        );
    }

    #[test]
    fn decode_rejects_dangling_pointers() {
        // right child pointer runs past the end of the buffer
        let flat = FlatTree::from_cells(vec![3, 6, 0, 0, 0, 1]).unwrap();
        assert_eq!(
            flat.to_tree(),
            Err(DecodeError::MalformedEncoding(Offset(6)))
        );
    }
}

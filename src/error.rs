//! Errors when encoding or decoding the flat representation
//!
//! Both directions can fail in exactly one way, and both errors carry the
//! offset of the record where the problem was found.
use std::{error, fmt};

use crate::Offset;

/// Error when encoding a [`Tree`](crate::Tree) into a [`FlatTree`](crate::FlatTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The tree contains a leaf whose payload is not numeric
    ///
    /// A record has a single payload cell holding a `u64`, so blob payloads
    /// cannot be encoded. The offset is the record the leaf would have
    /// occupied.
    UnsupportedPayload(Offset),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPayload(offset) => {
                write!(f, "unsupported non-numeric payload at offset {offset}")
            }
        }
    }
}

impl error::Error for EncodeError {}

/// Error when decoding a [`FlatTree`](crate::FlatTree) back into a [`Tree`](crate::Tree)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The cells do not describe a valid encoding at the given offset
    ///
    /// Raised for a truncated or empty cell buffer, for a record offset that
    /// is unaligned or out of bounds, and for a child pointer that does not
    /// point past its parent.
    MalformedEncoding(Offset),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding(offset) => {
                write!(f, "malformed encoding at offset {offset}")
            }
        }
    }
}

impl error::Error for DecodeError {}

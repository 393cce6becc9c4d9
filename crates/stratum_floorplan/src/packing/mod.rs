//! Per-die packing sequences and their decode/encode transforms.
//!
//! A die's floorplan is an ordered list of [`Tuple`]s. Decoding walks the list
//! and places each block against everything already placed, either from the
//! left ([`Direction::Left`]) or from below ([`Direction::Bottom`]). Soft
//! blocks carry their current width in the tuple. The
//! sequence is the only persisted form of a candidate; coordinates are always
//! re-derived.
//!
//! # Modules
//!
//! - [`contour`]: skyline maps used to push blocks flush against placed ones
//! - [`decode`]: sequence to geometry
//! - [`encode`]: geometry back to a sequence
//! - [`ops`]: perturbation operators the search applies to sequences

pub mod contour;
pub mod decode;
pub mod encode;
pub mod ops;

pub use contour::Contour;
pub use decode::{decode, decode_die, DieDecoder};
pub use encode::{encode, encode_die, EncodeError};
pub use ops::{alignment_swap, random_op, reshape_op, OpKind, OpRejected, PackingOp, Slot};

use crate::geometry::Coord;
use crate::ids::BlockId;
use serde::{Deserialize, Serialize};

/// The side a block is inserted from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Pushed left against the right contour; the stack fixes its `y`.
    Left,
    /// Pushed down against the top contour; the stack fixes its `x`.
    Bottom,
}

impl Direction {
    /// Returns the other direction.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Bottom,
            Direction::Bottom => Direction::Left,
        }
    }
}

/// One entry of a die's packing sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Tuple {
    /// The block placed by this entry.
    pub block: BlockId,
    /// The insertion side.
    pub direction: Direction,
    /// How many boundary blocks beyond the first the new block covers.
    pub junctions: u32,
    /// Displacement along the stack-derived axis, clamped at the die edge.
    pub offset: Coord,
    /// Whether the block is placed with width and height exchanged.
    pub rotated: bool,
    /// Width chosen for a soft block; its height follows from the area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Coord>,
}

impl Tuple {
    /// Creates an unrotated, left-inserted tuple with no junctions and no offset.
    pub fn new(block: BlockId) -> Self {
        Self {
            block,
            direction: Direction::Left,
            junctions: 0,
            offset: 0,
            rotated: false,
            shape: None,
        }
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the junction count.
    pub fn with_junctions(mut self, junctions: u32) -> Self {
        self.junctions = junctions;
        self
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: Coord) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    /// Sets the soft-block width.
    pub fn with_shape(mut self, width: Coord) -> Self {
        self.shape = Some(width);
        self
    }
}

/// The ordered tuple list of one die.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DieSequence {
    tuples: Vec<Tuple>,
}

impl DieSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sequence from tuples.
    pub fn from_tuples(tuples: Vec<Tuple>) -> Self {
        Self { tuples }
    }

    /// Returns the number of tuples.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Returns `true` if the die has no blocks.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Returns the tuples in placement order.
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    /// Returns the tuples mutably.
    pub fn tuples_mut(&mut self) -> &mut [Tuple] {
        &mut self.tuples
    }

    /// Returns the tuple at `index`.
    pub fn get(&self, index: usize) -> Option<&Tuple> {
        self.tuples.get(index)
    }

    /// Returns the tuple at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tuple> {
        self.tuples.get_mut(index)
    }

    /// Returns the position of `block`, if it is on this die.
    pub fn position(&self, block: BlockId) -> Option<usize> {
        self.tuples.iter().position(|t| t.block == block)
    }

    /// Appends a tuple.
    pub fn push(&mut self, tuple: Tuple) {
        self.tuples.push(tuple);
    }

    /// Inserts a tuple at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, tuple: Tuple) {
        let index = index.min(self.tuples.len());
        self.tuples.insert(index, tuple);
    }

    /// Removes and returns the tuple at `index`.
    pub fn remove(&mut self, index: usize) -> Tuple {
        self.tuples.remove(index)
    }

    /// Iterates over the tuples.
    pub fn iter(&self) -> std::slice::Iter<'_, Tuple> {
        self.tuples.iter()
    }
}

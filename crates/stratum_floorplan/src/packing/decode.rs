//! Decoding packing sequences into non-overlapping geometry.
//!
//! Each die keeps two boundary stacks and two contours while its sequence is
//! walked:
//!
//! - `right_boundary`: blocks visible from the right, topmost on top of the stack
//! - `top_boundary`: blocks visible from above, rightmost on top of the stack
//! - `right`: for every `y`, the largest right edge of a placed block covering `y`
//! - `top`: for every `x`, the largest top edge of a placed block covering `x`
//!
//! A [`Direction::Left`] tuple pops `junctions + 1` blocks from the right
//! boundary. Its `y` starts at the lowest popped block (or 0 if the boundary
//! ran empty) shifted by the tuple offset, and its `x` is the right contour's
//! maximum over the block's vertical span. [`Direction::Bottom`] is the mirror
//! image. Since every block is pushed flush against the contour of everything
//! already placed across its whole span, the result never overlaps, whatever
//! the tuple values are.

use crate::data::Design;
use crate::geometry::{Coord, Rect};
use crate::ids::DieId;
use crate::packing::contour::Contour;
use crate::packing::{DieSequence, Direction, Tuple};
use crate::placement::{PlacedBlock, Placement};

/// Incremental decoder for one die.
///
/// Also used by [`encode`](crate::packing::encode) to replay a sequence while
/// it is being built.
#[derive(Clone, Debug)]
pub struct DieDecoder {
    die: DieId,
    right_boundary: Vec<Rect>,
    top_boundary: Vec<Rect>,
    right: Contour,
    top: Contour,
}

impl DieDecoder {
    /// Creates a decoder for an empty die.
    pub fn new(die: DieId) -> Self {
        Self {
            die,
            right_boundary: Vec::new(),
            top_boundary: Vec::new(),
            right: Contour::new(),
            top: Contour::new(),
        }
    }

    fn boundary(&self, direction: Direction) -> &[Rect] {
        match direction {
            Direction::Left => &self.right_boundary,
            Direction::Bottom => &self.top_boundary,
        }
    }

    /// Returns the free-axis base a tuple with `direction` and `junctions`
    /// would start from, before its offset is applied.
    pub fn base(&self, direction: Direction, junctions: u32) -> Coord {
        let stack = self.boundary(direction);
        let covered = (junctions as usize + 1).min(stack.len());
        if covered == stack.len() {
            return 0;
        }
        stack[stack.len() - covered..]
            .iter()
            .map(|b| match direction {
                Direction::Left => b.ll.y,
                Direction::Bottom => b.ll.x,
            })
            .min()
            .unwrap_or(0)
    }

    /// Returns the contour coordinate a block of `extent` along the free axis,
    /// starting at `free`, would be pushed to.
    pub fn contour_coord(&self, direction: Direction, free: Coord, extent: Coord) -> Coord {
        match direction {
            Direction::Left => self.right.max_over(free, free + extent),
            Direction::Bottom => self.top.max_over(free, free + extent),
        }
    }

    /// Places one tuple of oriented size `(width, height)` and returns its footprint.
    pub fn place(&mut self, tuple: &Tuple, width: Coord, height: Coord) -> Rect {
        let free = (self.base(tuple.direction, tuple.junctions) + tuple.offset).max(0);
        let rect = match tuple.direction {
            Direction::Left => {
                let x = self.contour_coord(Direction::Left, free, height);
                Rect::new(x, free, width, height)
            }
            Direction::Bottom => {
                let y = self.contour_coord(Direction::Bottom, free, width);
                Rect::new(free, y, width, height)
            }
        };
        self.update_boundaries(tuple.direction, tuple.junctions, rect);
        self.right.raise(rect.ll.y, rect.ur.y, rect.ur.x);
        self.top.raise(rect.ll.x, rect.ur.x, rect.ur.y);
        rect
    }

    fn update_boundaries(&mut self, direction: Direction, junctions: u32, current: Rect) {
        let (stack, other) = match direction {
            Direction::Left => (&mut self.right_boundary, &mut self.top_boundary),
            Direction::Bottom => (&mut self.top_boundary, &mut self.right_boundary),
        };

        let covered = (junctions as usize + 1).min(stack.len());
        let relevant = stack.split_off(stack.len() - covered);

        // A covered block stays on the boundary unless the new block hides it.
        let hidden = |b: &Rect| match direction {
            Direction::Left => b.is_left_of(&current) && b.overlaps_y(&current),
            Direction::Bottom => b.is_below(&current) && b.overlaps_x(&current),
        };
        // The new block is hidden from the other side if a covered block shadows it.
        let shadowed = relevant.iter().any(|b| match direction {
            Direction::Left => current.is_below(b) && b.overlaps_x(&current),
            Direction::Bottom => current.is_left_of(b) && b.overlaps_y(&current),
        });

        stack.push(current);
        stack.extend(relevant.into_iter().filter(|b| !hidden(b)));
        if !shadowed {
            other.push(current);
        }
    }

    /// Returns the die this decoder places onto.
    pub fn die(&self) -> DieId {
        self.die
    }
}

/// Decodes one die's sequence into placed blocks, in sequence order.
pub fn decode_die(design: &Design, die: DieId, sequence: &DieSequence) -> Vec<PlacedBlock> {
    let mut decoder = DieDecoder::new(die);
    sequence
        .iter()
        .map(|tuple| {
            let (w, h) = design.block(tuple.block).shaped_dims(tuple.shape, tuple.rotated);
            PlacedBlock {
                block: tuple.block,
                die,
                rect: decoder.place(tuple, w, h),
                // Rotating a square changes nothing.
                rotated: tuple.rotated && w != h,
            }
        })
        .collect()
}

/// Decodes the sequences of all dies into a [`Placement`] indexed by block ID.
pub fn decode(design: &Design, sequences: &[DieSequence]) -> Placement {
    let mut blocks = vec![PlacedBlock::default(); design.block_count()];
    for (i, sequence) in sequences.iter().enumerate() {
        let die = DieId::from_raw(i as u32);
        for placed in decode_die(design, die, sequence) {
            blocks[placed.block.index()] = placed;
        }
    }
    Placement::new(sequences.len(), blocks)
}

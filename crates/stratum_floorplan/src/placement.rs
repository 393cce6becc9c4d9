//! Decoded geometry: where every block ended up.
//!
//! A [`Placement`] is always derived from the per-die sequences by decode; it
//! is never edited directly and never treated as the ground truth of a
//! candidate.

use crate::geometry::Rect;
use crate::ids::{BlockId, DieId};
use serde::{Deserialize, Serialize};

/// The decoded position of one block.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PlacedBlock {
    /// The placed block.
    pub block: BlockId,
    /// The die the block sits on.
    pub die: DieId,
    /// The absolute footprint, already oriented.
    pub rect: Rect,
    /// Whether the block is rotated relative to its nominal width/height.
    pub rotated: bool,
}

/// Absolute positions of all blocks across all dies, indexed by block ID.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Placement {
    layers: usize,
    blocks: Vec<PlacedBlock>,
}

impl Placement {
    /// Creates a placement from per-block entries ordered by block ID.
    pub fn new(layers: usize, blocks: Vec<PlacedBlock>) -> Self {
        Self { layers, blocks }
    }

    /// Returns the number of dies.
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Returns the number of placed blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no blocks are placed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the placement of a block.
    pub fn get(&self, id: BlockId) -> &PlacedBlock {
        &self.blocks[id.index()]
    }

    /// Returns the footprint of a block.
    pub fn rect(&self, id: BlockId) -> Rect {
        self.blocks[id.index()].rect
    }

    /// Returns the die a block sits on.
    pub fn die_of(&self, id: BlockId) -> DieId {
        self.blocks[id.index()].die
    }

    /// Iterates over all placed blocks in block-ID order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter()
    }

    /// Iterates over the blocks placed on `die`.
    pub fn on_die(&self, die: DieId) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter().filter(move |p| p.die == die)
    }

    /// Returns the bounding box of the blocks on `die`, or `None` for an empty die.
    pub fn die_bounding_box(&self, die: DieId) -> Option<Rect> {
        self.on_die(die).map(|p| p.rect).reduce(|acc, r| acc.union(&r))
    }

    /// Returns every pair of blocks on the same die whose footprints overlap.
    ///
    /// Quadratic; intended for checks and tests, not for the search loop.
    pub fn overlapping_pairs(&self) -> Vec<(BlockId, BlockId)> {
        let mut pairs = Vec::new();
        for (i, a) in self.blocks.iter().enumerate() {
            for b in &self.blocks[i + 1..] {
                if a.die == b.die && a.rect.overlaps(&b.rect) {
                    pairs.push((a.block, b.block));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(block: u32, die: u32, rect: Rect) -> PlacedBlock {
        PlacedBlock {
            block: BlockId::from_raw(block),
            die: DieId::from_raw(die),
            rect,
            rotated: false,
        }
    }

    #[test]
    fn per_die_queries() {
        let p = Placement::new(
            2,
            vec![
                placed(0, 0, Rect::new(0, 0, 2, 2)),
                placed(1, 1, Rect::new(0, 0, 3, 1)),
                placed(2, 0, Rect::new(2, 0, 1, 5)),
            ],
        );
        assert_eq!(p.on_die(DieId::from_raw(0)).count(), 2);
        assert_eq!(
            p.die_bounding_box(DieId::from_raw(0)),
            Some(Rect::new(0, 0, 3, 5))
        );
        assert_eq!(p.die_of(BlockId::from_raw(1)), DieId::from_raw(1));
        assert!(p.overlapping_pairs().is_empty());
    }

    #[test]
    fn overlap_only_counts_same_die() {
        let p = Placement::new(
            2,
            vec![
                placed(0, 0, Rect::new(0, 0, 2, 2)),
                placed(1, 1, Rect::new(1, 1, 2, 2)),
                placed(2, 0, Rect::new(1, 1, 2, 2)),
            ],
        );
        assert_eq!(
            p.overlapping_pairs(),
            vec![(BlockId::from_raw(0), BlockId::from_raw(2))]
        );
    }

    #[test]
    fn empty_die_has_no_bounding_box() {
        let p = Placement::new(2, vec![placed(0, 0, Rect::new(0, 0, 1, 1))]);
        assert!(p.die_bounding_box(DieId::from_raw(1)).is_none());
    }
}

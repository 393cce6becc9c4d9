//! Encoding geometry back into packing sequences.
//!
//! Blocks are ordered topologically by "left of with vertical overlap" and
//! "below with horizontal overlap", which is acyclic for any overlap-free
//! placement. The order is then replayed through a [`DieDecoder`]: a block
//! gets [`Direction::Left`] if the right contour already reaches its `x`,
//! otherwise [`Direction::Bottom`] if the top contour reaches its `y`. Its
//! offset is whatever moves the stack base to its actual free coordinate.
//! A block touching neither contour cannot come out of decode and is reported.

use crate::data::Design;
use crate::ids::{BlockId, DieId};
use crate::packing::decode::DieDecoder;
use crate::packing::{DieSequence, Direction, Tuple};
use crate::placement::{PlacedBlock, Placement};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Reasons a placement cannot be turned into a sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The block is neither pushed left nor pushed down against its neighbours.
    #[error("block {block} is not compacted to the left or bottom")]
    NotCompacted {
        /// The floating block.
        block: BlockId,
    },
    /// The footprint matches neither orientation of the block.
    #[error("block {block} footprint does not match its dimensions")]
    ShapeMismatch {
        /// The mismatching block.
        block: BlockId,
    },
    /// The placement's blocks overlap, so no order exists.
    #[error("blocks on die {die} overlap")]
    Overlap {
        /// The die with overlapping blocks.
        die: DieId,
    },
}

/// Encodes a full placement into one sequence per die.
pub fn encode(design: &Design, placement: &Placement) -> Result<Vec<DieSequence>, EncodeError> {
    (0..placement.layers())
        .map(|i| {
            let die = DieId::from_raw(i as u32);
            let blocks: Vec<PlacedBlock> = placement.on_die(die).copied().collect();
            encode_die(design, die, &blocks)
        })
        .collect()
}

/// Encodes the blocks of one die.
pub fn encode_die(
    design: &Design,
    die: DieId,
    blocks: &[PlacedBlock],
) -> Result<DieSequence, EncodeError> {
    let order = topological_order(die, blocks)?;
    let mut decoder = DieDecoder::new(die);
    let mut sequence = DieSequence::new();

    for index in order {
        let placed = &blocks[index];
        let rect = placed.rect;
        let block = design.block(placed.block);
        let size = (rect.width(), rect.height());
        let (rotated, shape) = if size == block.dims(false) {
            (false, None)
        } else if size == block.dims(true) {
            (true, None)
        } else if block.soft && size == block.shaped_dims(Some(size.0), false) {
            (false, Some(size.0))
        } else {
            return Err(EncodeError::ShapeMismatch {
                block: placed.block,
            });
        };

        let direction = if decoder.contour_coord(Direction::Left, rect.ll.y, rect.height())
            == rect.ll.x
        {
            Direction::Left
        } else if decoder.contour_coord(Direction::Bottom, rect.ll.x, rect.width()) == rect.ll.y
        {
            Direction::Bottom
        } else {
            return Err(EncodeError::NotCompacted {
                block: placed.block,
            });
        };

        let free = match direction {
            Direction::Left => rect.ll.y,
            Direction::Bottom => rect.ll.x,
        };
        let mut tuple = Tuple::new(placed.block)
            .with_direction(direction)
            .with_offset(free - decoder.base(direction, 0))
            .with_rotation(rotated);
        tuple.shape = shape;

        let replayed = decoder.place(&tuple, rect.width(), rect.height());
        debug_assert_eq!(replayed, rect);
        sequence.push(tuple);
    }

    Ok(sequence)
}

/// Orders blocks so that every block comes after all blocks left of it with
/// vertical overlap and all blocks below it with horizontal overlap.
///
/// Kahn's algorithm over an explicit ready queue; ties break towards the
/// lower-left so the result is deterministic.
fn topological_order(die: DieId, blocks: &[PlacedBlock]) -> Result<Vec<usize>, EncodeError> {
    let n = blocks.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let (a, b) = (&blocks[i].rect, &blocks[j].rect);
            if a.overlaps(b) {
                return Err(EncodeError::Overlap { die });
            }
            let precedes =
                (a.is_left_of(b) && a.overlaps_y(b)) || (a.is_below(b) && a.overlaps_x(b));
            if precedes {
                successors[i].push(j);
                indegree[j] += 1;
            }
        }
    }

    let key = |i: usize| {
        let r = &blocks[i].rect;
        Reverse((r.ll.x + r.ll.y, r.ll.x, blocks[i].block))
    };
    let mut ready: BinaryHeap<(Reverse<(i64, i64, BlockId)>, usize)> = (0..n)
        .filter(|&i| indegree[i] == 0)
        .map(|i| (key(i), i))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some((_, i)) = ready.pop() {
        order.push(i);
        for &j in &successors[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 {
                ready.push((key(j), j));
            }
        }
    }

    // Overlap-free rectangles cannot form a cycle under this relation.
    if order.len() != n {
        return Err(EncodeError::Overlap { die });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Block;
    use crate::geometry::{Coord, Rect};
    use crate::packing::decode::decode;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn design(sizes: &[(Coord, Coord)]) -> Design {
        let mut d = Design::new();
        for (i, &(w, h)) in sizes.iter().enumerate() {
            d.add_block(Block::new(format!("b{i}"), w, h));
        }
        d
    }

    fn placed(block: u32, rect: Rect) -> PlacedBlock {
        PlacedBlock {
            block: BlockId::from_raw(block),
            die: DieId::from_raw(0),
            rect,
            rotated: false,
        }
    }

    #[test]
    fn encodes_a_row() {
        let d = design(&[(2, 2), (3, 2)]);
        let placement = Placement::new(
            1,
            vec![
                placed(0, Rect::new(0, 0, 2, 2)),
                placed(1, Rect::new(2, 0, 3, 2)),
            ],
        );
        let sequences = encode(&d, &placement).unwrap();
        assert_eq!(sequences[0].len(), 2);
        assert_eq!(decode(&d, &sequences), placement);
    }

    #[test]
    fn detects_rotation() {
        let d = design(&[(4, 1)]);
        let mut p = placed(0, Rect::new(0, 0, 1, 4));
        p.rotated = true;
        let placement = Placement::new(1, vec![p]);
        let sequences = encode(&d, &placement).unwrap();
        assert!(sequences[0].tuples()[0].rotated);
        assert_eq!(decode(&d, &sequences), placement);
    }

    #[test]
    fn recovers_soft_shape() {
        let mut d = Design::new();
        d.add_block(Block::new("s", 4, 3).as_soft());
        d.add_block(Block::new("h", 4, 3));
        let placement = Placement::new(
            1,
            vec![
                placed(0, Rect::new(0, 0, 6, 2)),
                placed(1, Rect::new(6, 0, 4, 3)),
            ],
        );
        let sequences = encode(&d, &placement).unwrap();
        assert_eq!(sequences[0].tuples()[0].shape, Some(6));
        assert_eq!(sequences[0].tuples()[1].shape, None);
        assert_eq!(decode(&d, &sequences), placement);

        // The same footprint on a hard block matches neither orientation.
        let hard = Placement::new(1, vec![placed(0, Rect::new(0, 0, 6, 2))]);
        let mut only_hard = Design::new();
        only_hard.add_block(Block::new("h", 4, 3));
        assert!(matches!(
            encode(&only_hard, &hard),
            Err(EncodeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn floating_block_is_rejected() {
        let d = design(&[(2, 2)]);
        let placement = Placement::new(1, vec![placed(0, Rect::new(3, 3, 2, 2))]);
        assert_eq!(
            encode(&d, &placement),
            Err(EncodeError::NotCompacted {
                block: BlockId::from_raw(0)
            })
        );
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let d = design(&[(2, 2)]);
        let placement = Placement::new(1, vec![placed(0, Rect::new(0, 0, 2, 3))]);
        assert!(matches!(
            encode(&d, &placement),
            Err(EncodeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn overlap_is_rejected() {
        let d = design(&[(2, 2), (2, 2)]);
        let placement = Placement::new(
            1,
            vec![
                placed(0, Rect::new(0, 0, 2, 2)),
                placed(1, Rect::new(1, 0, 2, 2)),
            ],
        );
        assert!(matches!(
            encode(&d, &placement),
            Err(EncodeError::Overlap { .. })
        ));
    }

    #[test]
    fn offset_placements_roundtrip() {
        // Block 1 rests on the left edge, raised above block 0 by a gap.
        let d = design(&[(2, 2), (2, 2)]);
        let placement = Placement::new(
            1,
            vec![
                placed(0, Rect::new(0, 0, 2, 2)),
                placed(1, Rect::new(0, 5, 2, 2)),
            ],
        );
        let sequences = encode(&d, &placement).unwrap();
        assert_eq!(decode(&d, &sequences), placement);
    }

    #[test]
    fn decode_encode_decode_is_identity() {
        let sizes: Vec<(Coord, Coord)> = (0..30)
            .map(|i| (1 + (i * 7) % 11, 1 + (i * 3) % 7))
            .collect();
        let d = design(&sizes);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let layers = 3;
            let mut sequences = vec![DieSequence::new(); layers];
            let mut order: Vec<u32> = (0..sizes.len() as u32).collect();
            for i in (1..order.len()).rev() {
                order.swap(i, rng.gen_range(0..=i));
            }
            for block in order {
                let tuple = Tuple::new(BlockId::from_raw(block))
                    .with_direction(if rng.gen_bool(0.5) {
                        Direction::Left
                    } else {
                        Direction::Bottom
                    })
                    .with_junctions(rng.gen_range(0..3))
                    .with_offset(rng.gen_range(-3..8))
                    .with_rotation(rng.gen_bool(0.5));
                sequences[rng.gen_range(0..layers)].push(tuple);
            }

            let geometry = decode(&d, &sequences);
            let encoded = encode(&d, &geometry).unwrap();
            assert_eq!(decode(&d, &encoded), geometry);
        }
    }
}

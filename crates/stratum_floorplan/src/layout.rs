//! The layout orchestrator: one packing sequence per die.
//!
//! A [`Layout`] is the search's unit of state. It is cheap to clone; the
//! search clones the current layout, applies one operator to the copy, and
//! either keeps or drops the copy.

use crate::alignment::{AlignmentEvaluation, AlignmentModel, AlignmentTarget, Handling};
use crate::data::Design;
use crate::geometry::Coord;
use crate::ids::{BlockId, DieId};
use crate::packing::{
    alignment_swap, decode, encode, random_op, reshape_op, DieSequence, Direction, EncodeError,
    OpKind, OpRejected, PackingOp, Tuple,
};
use crate::placement::Placement;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use stratum_config::{OperatorWeights, StackConfig};

/// How often [`Layout::propose`] redraws before giving up.
const PROPOSAL_ATTEMPTS: usize = 16;

/// Weighted choice among operator kinds.
#[derive(Debug, Clone)]
pub struct OperatorMix {
    index: WeightedIndex<f64>,
}

impl OperatorMix {
    /// Builds the mix from configured weights. Returns `None` if all weights
    /// are zero or any is negative.
    pub fn new(weights: &OperatorWeights) -> Option<Self> {
        WeightedIndex::new(weights.as_array())
            .ok()
            .map(|index| Self { index })
    }

    /// Draws an operator kind.
    pub fn pick(&self, rng: &mut impl Rng) -> OpKind {
        OpKind::ALL[self.index.sample(rng)]
    }
}

/// Per-die packing sequences of one candidate floorplan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    sequences: Vec<DieSequence>,
}

impl Layout {
    /// Wraps existing sequences.
    pub fn from_sequences(sequences: Vec<DieSequence>) -> Self {
        Self { sequences }
    }

    /// Builds the starting layout.
    ///
    /// Blocks are taken by area, largest first. A block with a die hint goes
    /// to that die. Any other block goes to the first still-empty die that no
    /// hint points at, or else to the die with the least block area so far. Each die is filled in rows: blocks are inserted from the left
    /// until the next one would cross the outline width, and a row break is a
    /// bottom insertion covering the whole top boundary.
    pub fn initial(design: &Design, stack: &StackConfig) -> Self {
        let layers = stack.layers.max(1);
        let mut order: Vec<BlockId> = design.blocks.iter().map(|b| b.id).collect();
        order.sort_by(|a, b| {
            design
                .block(*b)
                .area()
                .total_cmp(&design.block(*a).area())
                .then(a.cmp(b))
        });

        let mut sequences = vec![DieSequence::new(); layers];
        let mut die_area = vec![0.0f64; layers];
        let mut row_width: Vec<Coord> = vec![0; layers];
        let mut pinned = vec![false; layers];
        for die in design.blocks.iter().filter_map(|b| b.die) {
            if let Some(slot) = pinned.get_mut(die.index()) {
                *slot = true;
            }
        }

        for id in order {
            let block = design.block(id);
            let die = match block.die {
                Some(d) if d.index() < layers => d.index(),
                _ => (0..layers)
                    .find(|&d| !pinned[d] && sequences[d].is_empty())
                    .unwrap_or_else(|| {
                        die_area
                            .iter()
                            .enumerate()
                            .min_by(|a, b| a.1.total_cmp(b.1))
                            .map_or(0, |(i, _)| i)
                    }),
            };
            die_area[die] += block.area();

            let rotated = !block.aspect_ok(false) && block.aspect_ok(true);
            let (w, _) = block.dims(rotated);
            let seq = &mut sequences[die];
            let mut tuple = Tuple::new(id).with_rotation(rotated);
            if row_width[die] > 0 && row_width[die] + w > stack.outline_width {
                tuple = tuple
                    .with_direction(Direction::Bottom)
                    .with_junctions(seq.len() as u32);
                row_width[die] = w;
            } else {
                row_width[die] += w;
            }
            seq.push(tuple);
        }

        Self { sequences }
    }

    /// Encodes a decode-reachable placement into a layout.
    pub fn from_placement(design: &Design, placement: &Placement) -> Result<Self, EncodeError> {
        encode(design, placement).map(Self::from_sequences)
    }

    /// Moves the blocks of every strict requirement to the front of their
    /// die sequences, where they start from the die origin.
    ///
    /// Requirements between blocks on different dies are satisfied outright
    /// when they ask for zero offsets; others merely get a better start.
    pub fn repair_strict(&mut self, design: &Design) {
        for req in design.alignments.iter().filter(|r| r.handling == Handling::Strict) {
            let blocks: Vec<BlockId> = req.blocks().collect();
            let mut fronts: Vec<(usize, usize)> = Vec::new();
            for block in blocks {
                let Some((die, index)) = self.locate(block) else {
                    continue;
                };
                let seq = &mut self.sequences[die];
                let mut tuple = seq.remove(index);
                tuple.direction = Direction::Left;
                tuple.junctions = 0;
                tuple.offset = 0;
                // A second block on the same die queues behind the first.
                let slot = fronts.iter().filter(|(d, _)| *d == die).count();
                seq.insert(slot, tuple);
                fronts.push((die, slot));
            }
        }
    }

    /// Returns `(die, index)` of `block`.
    pub fn locate(&self, block: BlockId) -> Option<(usize, usize)> {
        self.sequences
            .iter()
            .enumerate()
            .find_map(|(d, seq)| seq.position(block).map(|i| (d, i)))
    }

    /// Returns the number of dies.
    pub fn layers(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the sequences.
    pub fn sequences(&self) -> &[DieSequence] {
        &self.sequences
    }

    /// Consumes the layout and returns its sequences.
    pub fn into_sequences(self) -> Vec<DieSequence> {
        self.sequences
    }

    /// Decodes all dies.
    pub fn decode(&self, design: &Design) -> Placement {
        decode(design, &self.sequences)
    }

    /// Applies an operator; see [`PackingOp::apply`].
    pub fn apply(
        &mut self,
        op: &PackingOp,
        design: &Design,
        allow_empty_dies: bool,
    ) -> Result<(), OpRejected> {
        op.apply(&mut self.sequences, design, allow_empty_dies)
    }

    /// Draws a random operator from `mix`.
    ///
    /// Alignment-guided draws target the first unfulfilled requirement
    /// between two blocks in `evaluations`; when there is none, or a draw
    /// yields nothing applicable, another kind is drawn.
    pub fn propose(
        &self,
        design: &Design,
        placement: &Placement,
        model: &AlignmentModel,
        evaluations: &[AlignmentEvaluation],
        mix: &OperatorMix,
        rng: &mut impl Rng,
    ) -> Option<PackingOp> {
        for _ in 0..PROPOSAL_ATTEMPTS {
            let kind = mix.pick(rng);
            let op = match kind {
                OpKind::AlignmentGuided => {
                    self.alignment_guided(placement, model, evaluations, rng)
                }
                OpKind::Reshape => reshape_op(&self.sequences, placement, design, rng),
                _ => random_op(kind, &self.sequences, design, rng),
            };
            if op.is_some() {
                return op;
            }
        }
        None
    }

    fn alignment_guided(
        &self,
        placement: &Placement,
        model: &AlignmentModel,
        evaluations: &[AlignmentEvaluation],
        rng: &mut impl Rng,
    ) -> Option<PackingOp> {
        let (a, b) = evaluations.iter().filter(|e| !e.fulfilled).find_map(|e| {
            let req = model.requirement(e.requirement);
            match (req.first, req.second) {
                (AlignmentTarget::Block(a), AlignmentTarget::Block(b)) => Some((a, b)),
                _ => None,
            }
        })?;
        let (moved, partner) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
        alignment_swap(&self.sequences, placement, moved, partner, rng)
    }

    /// Returns the die every block sits on, by block index.
    pub fn assignment(&self, blocks: usize) -> Vec<Option<DieId>> {
        let mut dies = vec![None; blocks];
        for (d, seq) in self.sequences.iter().enumerate() {
            for t in seq.iter() {
                if let Some(slot) = dies.get_mut(t.block.index()) {
                    *slot = Some(DieId::from_raw(d as u32));
                }
            }
        }
        dies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{AlignmentRequirement, AxisRequirement};
    use crate::data::Block;
    use crate::ids::AlignmentId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stack(layers: usize, width: Coord) -> StackConfig {
        StackConfig {
            layers,
            outline_width: width,
            outline_height: width,
            ..StackConfig::default()
        }
    }

    fn design(sizes: &[(Coord, Coord)]) -> Design {
        let mut d = Design::new();
        for (i, &(w, h)) in sizes.iter().enumerate() {
            d.add_block(Block::new(format!("b{i}"), w, h));
        }
        d
    }

    #[test]
    fn initial_balances_area_and_honours_hints() {
        let mut d = design(&[(10, 10), (8, 8), (6, 6), (2, 2)]);
        d.blocks[3].die = Some(DieId::from_raw(0));
        let layout = Layout::initial(&d, &stack(2, 100));
        let dies = layout.assignment(4);
        // Die 1 has no pinned block, so it takes the largest free one.
        assert_eq!(dies[0], Some(DieId::from_raw(1)));
        assert_eq!(dies[1], Some(DieId::from_raw(0)));
        assert_eq!(dies[2], Some(DieId::from_raw(0)));
        assert_eq!(dies[3], Some(DieId::from_raw(0)));
        // Largest first on each die.
        assert_eq!(layout.sequences()[0].tuples()[0].block, BlockId::from_raw(1));
    }

    #[test]
    fn initial_keeps_free_block_for_unpinned_die() {
        // The small pinned block comes last; the large free block must not
        // take die 0 and strand die 1.
        let mut d = design(&[(10, 10), (2, 2)]);
        d.blocks[1].die = Some(DieId::from_raw(0));
        let mut config = stack(2, 100);
        config.allow_empty_dies = false;
        let layout = Layout::initial(&d, &config);
        assert!(layout.sequences().iter().all(|s| !s.is_empty()));
        assert_eq!(layout.assignment(2)[0], Some(DieId::from_raw(1)));
    }

    #[test]
    fn initial_rows_wrap_at_outline_width() {
        let d = design(&[(6, 2), (6, 2), (6, 2)]);
        let placement = Layout::initial(&d, &stack(1, 13)).decode(&d);
        assert!(placement.overlapping_pairs().is_empty());
        let bbox = placement.die_bounding_box(DieId::from_raw(0)).unwrap();
        assert_eq!((bbox.width(), bbox.height()), (12, 4));
    }

    #[test]
    fn initial_rotates_blocks_out_of_range() {
        let mut d = design(&[(2, 8)]);
        d.blocks[0].aspect_ratio = Some(crate::data::AspectRange { min: 1.0, max: 5.0 });
        let layout = Layout::initial(&d, &stack(1, 100));
        assert!(layout.sequences()[0].tuples()[0].rotated);
    }

    #[test]
    fn repair_strict_aligns_cross_die_pair_at_origin() {
        let mut d = design(&[(10, 10), (8, 8), (4, 4), (3, 3)]);
        d.blocks[2].die = Some(DieId::from_raw(1));
        d.blocks[3].die = Some(DieId::from_raw(0));
        d.add_alignment(
            AlignmentRequirement::between(BlockId::from_raw(2), BlockId::from_raw(3))
                .with_x(AxisRequirement::offset(0))
                .with_y(AxisRequirement::offset(0))
                .with_handling(Handling::Strict),
        );
        let mut layout = Layout::initial(&d, &stack(2, 100));
        layout.repair_strict(&d);
        let placement = layout.decode(&d);
        let model = AlignmentModel::new(&d, 0);
        let eval = model.evaluate(AlignmentId::from_raw(0), &placement);
        assert!(eval.fulfilled);
    }

    #[test]
    fn encode_roundtrip_through_layout() {
        let d = design(&[(3, 2), (2, 2), (4, 1)]);
        let layout = Layout::initial(&d, &stack(1, 100));
        let placement = layout.decode(&d);
        let again = Layout::from_placement(&d, &placement).unwrap();
        assert_eq!(again.decode(&d), placement);
    }

    #[test]
    fn propose_respects_zero_weights() {
        let d = design(&[(3, 2), (2, 2), (4, 1), (1, 5)]);
        let layout = Layout::initial(&d, &stack(2, 100));
        let placement = layout.decode(&d);
        let model = AlignmentModel::new(&d, 0);
        let weights = OperatorWeights {
            swap: 0.0,
            move_within: 0.0,
            flip_direction: 1.0,
            switch_junctions: 0.0,
            move_between_dies: 0.0,
            rotate: 0.0,
            shift_offset: 0.0,
            reshape: 0.0,
            alignment_guided: 0.0,
        };
        let mix = OperatorMix::new(&weights).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let op = layout
                .propose(&d, &placement, &model, &[], &mix, &mut rng)
                .unwrap();
            assert_eq!(op.kind(), OpKind::FlipDirection);
        }
    }

    #[test]
    fn alignment_guided_without_violations_falls_through() {
        let d = design(&[(3, 2), (2, 2)]);
        let layout = Layout::initial(&d, &stack(1, 100));
        let placement = layout.decode(&d);
        let model = AlignmentModel::new(&d, 0);
        let weights = OperatorWeights {
            swap: 0.0,
            move_within: 0.0,
            flip_direction: 0.0,
            switch_junctions: 0.0,
            move_between_dies: 0.0,
            rotate: 0.0,
            shift_offset: 0.0,
            reshape: 0.0,
            alignment_guided: 1.0,
        };
        let mix = OperatorMix::new(&weights).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(layout
            .propose(&d, &placement, &model, &[], &mix, &mut rng)
            .is_none());
    }
}

//! The immutable outcome of a floorplanning run.

use crate::alignment::AlignmentEvaluation;
use crate::geometry::{Coord, Rect};
use crate::ids::{BlockId, DieId};
use crate::layout::Layout;
use crate::packing::DieSequence;
use crate::placement::{PlacedBlock, Placement};
use crate::search::anneal::Termination;
use crate::search::cost::CostVector;
use crate::search::schedule::ScheduleStep;
use crate::thermal::ThermalAnalysis;
use serde::{Deserialize, Serialize};

/// Final position of one block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockPlacement {
    /// Block name.
    pub name: String,
    /// Block ID.
    pub block: BlockId,
    /// Die the block sits on.
    pub die: DieId,
    /// Lower-left x.
    pub x: Coord,
    /// Lower-left y.
    pub y: Coord,
    /// Placed width.
    pub width: Coord,
    /// Placed height.
    pub height: Coord,
    /// Whether the block is rotated.
    pub rotated: bool,
}

impl BlockPlacement {
    /// Returns the footprint.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// The best floorplan found plus everything needed to inspect the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorplanResult {
    /// Number of dies.
    pub layers: usize,
    /// Block positions in block-ID order.
    pub blocks: Vec<BlockPlacement>,
    /// Packing sequence per die; decoding them reproduces `blocks`.
    pub sequences: Vec<DieSequence>,
    /// Cost of the best floorplan.
    pub cost: CostVector,
    /// Thermal maps of the best floorplan.
    pub thermal: ThermalAnalysis,
    /// Alignment evaluations of the best floorplan.
    pub alignments: Vec<AlignmentEvaluation>,
    /// One entry per temperature level.
    pub schedule: Vec<ScheduleStep>,
    /// Why the search stopped.
    pub termination: Termination,
    /// Seed of the run.
    pub seed: u64,
    /// Completed temperature levels.
    pub levels: usize,
    /// Attempted search steps.
    pub steps: usize,
    /// Accepted search steps.
    pub accepted: usize,
}

impl FloorplanResult {
    /// Returns the block named `name`.
    pub fn block(&self, name: &str) -> Option<&BlockPlacement> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Rebuilds the placement.
    pub fn placement(&self) -> Placement {
        let blocks = self
            .blocks
            .iter()
            .map(|b| PlacedBlock {
                block: b.block,
                die: b.die,
                rect: b.rect(),
                rotated: b.rotated,
            })
            .collect();
        Placement::new(self.layers, blocks)
    }

    /// Returns the layout the result was decoded from.
    pub fn layout(&self) -> Layout {
        Layout::from_sequences(self.sequences.clone())
    }

    /// Returns the bounding box of `die`, or `None` if it is empty.
    pub fn die_bounding_box(&self, die: DieId) -> Option<Rect> {
        self.blocks
            .iter()
            .filter(|b| b.die == die)
            .map(|b| b.rect())
            .reduce(|acc, r| acc.union(&r))
    }
}

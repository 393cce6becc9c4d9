//! Design input: blocks, nets, TSV islands, and alignment requirements.
//!
//! Entities expose what they can do through small capability traits instead
//! of a shared base type: [`HasGeometry`] for anything with a footprint in a
//! placement, [`HasPower`] for heat sources, and [`HasVoltageDomain`] for
//! blocks tagged with a supply domain. The [`Design`] is the read-only input
//! of a floorplanning run.

use crate::alignment::AlignmentRequirement;
use crate::geometry::{Coord, Point, Rect};
use crate::ids::{AlignmentId, BlockId, DieId, IslandId, NetId};
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Something that occupies a region of a die in a given placement.
pub trait HasGeometry {
    /// Returns the footprint in `placement`, or `None` if it has no extent there.
    fn footprint(&self, placement: &Placement) -> Option<Rect>;

    /// Returns the die the entity sits on, or `None` if it spans several or none.
    fn die(&self, placement: &Placement) -> Option<DieId>;
}

/// A heat source.
pub trait HasPower {
    /// Returns the power density (power per square database unit).
    fn power_density(&self) -> f64;

    /// Returns the total dissipated power.
    fn power(&self) -> f64;
}

/// Something that belongs to a supply-voltage domain.
pub trait HasVoltageDomain {
    /// Returns the domain tag, if assigned.
    fn voltage_domain(&self) -> Option<u32>;
}

/// Allowed range of a block's width-to-height ratio.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AspectRange {
    /// Smallest allowed width / height.
    pub min: f64,
    /// Largest allowed width / height.
    pub max: f64,
}

impl AspectRange {
    /// Range a soft block reshapes within when it declares none.
    pub const SOFT_DEFAULT: AspectRange = AspectRange {
        min: 1.0 / 3.0,
        max: 3.0,
    };

    /// Returns `true` if `ratio` lies inside the range.
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

/// A rectangular functional block to be floorplanned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Arena index, assigned by [`Design::add_block`] or [`Design::reindex`].
    #[serde(skip)]
    pub id: BlockId,
    /// Unique block name.
    pub name: String,
    /// Nominal width in database units.
    pub width: Coord,
    /// Nominal height in database units.
    pub height: Coord,
    /// Allowed aspect-ratio range; unconstrained if absent.
    #[serde(default)]
    pub aspect_ratio: Option<AspectRange>,
    /// Soft blocks keep their area but may change shape within their range.
    #[serde(default)]
    pub soft: bool,
    /// Preferred die for the initial layout.
    #[serde(default)]
    pub die: Option<DieId>,
    /// Power per square database unit.
    #[serde(default)]
    pub power_density: f64,
    /// Supply-voltage domain tag.
    #[serde(default)]
    pub voltage_domain: Option<u32>,
    /// TSV island this block belongs to.
    #[serde(default)]
    pub tsv_island: Option<IslandId>,
}

impl Block {
    /// Creates an unconstrained, unpowered block.
    pub fn new(name: impl Into<String>, width: Coord, height: Coord) -> Self {
        Self {
            id: BlockId::default(),
            name: name.into(),
            width,
            height,
            aspect_ratio: None,
            soft: false,
            die: None,
            power_density: 0.0,
            voltage_domain: None,
            tsv_island: None,
        }
    }

    /// Sets the power density.
    pub fn with_power_density(mut self, density: f64) -> Self {
        self.power_density = density;
        self
    }

    /// Sets the preferred die.
    pub fn on_die(mut self, die: DieId) -> Self {
        self.die = Some(die);
        self
    }

    /// Sets the allowed aspect-ratio range.
    pub fn with_aspect_ratio(mut self, min: f64, max: f64) -> Self {
        self.aspect_ratio = Some(AspectRange { min, max });
        self
    }

    /// Marks the block as soft.
    pub fn as_soft(mut self) -> Self {
        self.soft = true;
        self
    }

    /// Sets the TSV island.
    pub fn in_island(mut self, island: IslandId) -> Self {
        self.tsv_island = Some(island);
        self
    }

    /// Returns the oriented `(width, height)`.
    pub fn dims(&self, rotated: bool) -> (Coord, Coord) {
        self.shaped_dims(None, rotated)
    }

    /// Returns the oriented `(width, height)` of a tuple carrying `shape`.
    ///
    /// A soft block with a shape takes that width and the smallest height
    /// that keeps at least its nominal area. Hard blocks ignore the shape.
    pub fn shaped_dims(&self, shape: Option<Coord>, rotated: bool) -> (Coord, Coord) {
        let (w, h) = match shape {
            Some(width) if self.soft && width > 0 => (width, self.height_for(width)),
            _ => (self.width, self.height),
        };
        if rotated {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Returns the height a soft block takes at `width`.
    pub fn height_for(&self, width: Coord) -> Coord {
        let area = self.width * self.height;
        (area + width - 1) / width
    }

    /// Returns the range a soft block may be reshaped within.
    pub fn shape_range(&self) -> AspectRange {
        self.aspect_ratio.unwrap_or(AspectRange::SOFT_DEFAULT)
    }

    /// Returns the nominal area.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Returns `true` if a `width` x `height` footprint respects the
    /// aspect-ratio range.
    pub fn aspect_fits(&self, width: Coord, height: Coord) -> bool {
        self.aspect_ratio
            .map_or(true, |range| range.contains(width as f64 / height as f64))
    }

    /// Returns `true` if the oriented shape respects the aspect-ratio range.
    pub fn aspect_ok(&self, rotated: bool) -> bool {
        let (w, h) = self.dims(rotated);
        self.aspect_fits(w, h)
    }

    /// Returns `true` if rotating changes the shape and keeps it in range.
    pub fn can_rotate(&self) -> bool {
        self.width != self.height && self.aspect_ok(true)
    }
}

impl HasGeometry for Block {
    fn footprint(&self, placement: &Placement) -> Option<Rect> {
        Some(placement.rect(self.id))
    }

    fn die(&self, placement: &Placement) -> Option<DieId> {
        Some(placement.die_of(self.id))
    }
}

impl HasPower for Block {
    fn power_density(&self) -> f64 {
        self.power_density
    }

    fn power(&self) -> f64 {
        self.power_density * self.area()
    }
}

impl HasVoltageDomain for Block {
    fn voltage_domain(&self) -> Option<u32> {
        self.voltage_domain
    }
}

/// A group of blocks whose vertical signals share one TSV island.
///
/// Its footprint is the bounding box of its members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TsvIsland {
    /// The island ID.
    pub id: IslandId,
    /// Member blocks.
    pub members: Vec<BlockId>,
}

impl HasGeometry for TsvIsland {
    fn footprint(&self, placement: &Placement) -> Option<Rect> {
        self.members
            .iter()
            .map(|&b| placement.rect(b))
            .reduce(|acc, r| acc.union(&r))
    }

    fn die(&self, placement: &Placement) -> Option<DieId> {
        let mut dies = self.members.iter().map(|&b| placement.die_of(b));
        let first = dies.next()?;
        dies.all(|d| d == first).then_some(first)
    }
}

/// The origin corner of every die, a zero-size reference point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DieOrigin;

impl HasGeometry for DieOrigin {
    fn footprint(&self, _placement: &Placement) -> Option<Rect> {
        Some(Rect::from_corners(Point::default(), Point::default()))
    }

    fn die(&self, _placement: &Placement) -> Option<DieId> {
        None
    }
}

fn default_net_weight() -> f64 {
    1.0
}

/// A net connecting blocks, possibly across dies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Net {
    /// Arena index, assigned by [`Design::add_net`] or [`Design::reindex`].
    #[serde(skip)]
    pub id: NetId,
    /// Net name.
    pub name: String,
    /// Connected blocks.
    pub blocks: Vec<BlockId>,
    /// Fixed pins on the bottom die.
    #[serde(default)]
    pub terminals: Vec<Point>,
    /// Relative importance in wirelength and routing demand.
    #[serde(default = "default_net_weight")]
    pub weight: f64,
}

impl Net {
    /// Creates a unit-weight net over `blocks`.
    pub fn new(name: impl Into<String>, blocks: Vec<BlockId>) -> Self {
        Self {
            id: NetId::default(),
            name: name.into(),
            blocks,
            terminals: Vec::new(),
            weight: 1.0,
        }
    }
}

/// The complete input of a floorplanning run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Design {
    /// All blocks, indexed by [`BlockId`].
    pub blocks: Vec<Block>,
    /// All nets, indexed by [`NetId`].
    #[serde(default)]
    pub nets: Vec<Net>,
    /// All alignment requirements, indexed by [`AlignmentId`].
    #[serde(default)]
    pub alignments: Vec<AlignmentRequirement>,
    /// Auxiliary index: block name to ID (rebuilt by [`reindex`](Self::reindex)).
    #[serde(skip)]
    pub block_by_name: HashMap<String, BlockId>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block and returns its ID.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        let id = BlockId::from_raw(self.blocks.len() as u32);
        block.id = id;
        self.block_by_name.insert(block.name.clone(), id);
        self.blocks.push(block);
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, mut net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        net.id = id;
        self.nets.push(net);
        id
    }

    /// Adds an alignment requirement and returns its ID.
    pub fn add_alignment(&mut self, req: AlignmentRequirement) -> AlignmentId {
        let id = AlignmentId::from_raw(self.alignments.len() as u32);
        self.alignments.push(req);
        id
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.index()]
    }

    /// Returns the number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the sum of all block powers.
    pub fn total_power(&self) -> f64 {
        self.blocks.iter().map(|b| b.power()).sum()
    }

    /// Returns the TSV island with the given ID; it has no members if unused.
    pub fn island(&self, id: IslandId) -> TsvIsland {
        TsvIsland {
            id,
            members: self
                .blocks
                .iter()
                .filter(|b| b.tsv_island == Some(id))
                .map(|b| b.id)
                .collect(),
        }
    }

    /// Reassigns arena IDs and rebuilds auxiliary indices after deserialization.
    pub fn reindex(&mut self) {
        self.block_by_name.clear();
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.id = BlockId::from_raw(i as u32);
            self.block_by_name.insert(block.name.clone(), block.id);
        }
        for (i, net) in self.nets.iter_mut().enumerate() {
            net.id = NetId::from_raw(i as u32);
        }
    }
}

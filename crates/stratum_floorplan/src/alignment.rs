//! Alignment requirements between pairs of blocks, TSV islands, or the die origin.
//!
//! Each requirement constrains the relative position of two targets per axis:
//!
//! - `Offset(t)`: the second target's lower-left coordinate minus the first's
//!   must equal `t` (within the configured tolerance).
//! - `Min(b)`: the two footprints must overlap by at least `b` along the axis.
//!   A negative bound allows a gap of at most `-b`.
//! - `Max(b)`: the distance between the two centres must not exceed `b`.
//! - `Undef`: the axis is unconstrained.
//!
//! Requirements are evaluated fresh against every decoded placement. Whether a
//! violation rejects the candidate or merely costs something is decided by
//! the [`Handling`] in the cost model, not here.

use crate::data::{Design, DieOrigin, HasGeometry, TsvIsland};
use crate::geometry::{Axis, Coord, Rect};
use crate::ids::{AlignmentId, BlockId, IslandId};
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What an axis of a requirement constrains.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentKind {
    /// Exact relative offset of the lower-left corners.
    Offset,
    /// Minimum overlap of the footprints.
    Min,
    /// Maximum distance of the centres.
    Max,
    /// No constraint.
    #[default]
    Undef,
}

/// How an unfulfilled requirement is treated by the cost model.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handling {
    /// A hard gate: the candidate is rejected outright.
    Strict,
    /// A weighted penalty proportional to the violation.
    #[default]
    Flexible,
}

/// One axis of an alignment requirement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct AxisRequirement {
    /// The constraint kind.
    pub kind: AlignmentKind,
    /// Offset, minimum overlap, or maximum distance, depending on `kind`.
    #[serde(default)]
    pub value: Coord,
}

impl AxisRequirement {
    /// An exact offset.
    pub fn offset(value: Coord) -> Self {
        Self {
            kind: AlignmentKind::Offset,
            value,
        }
    }

    /// A minimum overlap.
    pub fn min(value: Coord) -> Self {
        Self {
            kind: AlignmentKind::Min,
            value,
        }
    }

    /// A maximum centre distance.
    pub fn max(value: Coord) -> Self {
        Self {
            kind: AlignmentKind::Max,
            value,
        }
    }

    /// No constraint.
    pub fn undef() -> Self {
        Self::default()
    }
}

/// An entity an alignment requirement refers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentTarget {
    /// A block.
    Block(BlockId),
    /// The bounding box of a TSV island's member blocks.
    Island(IslandId),
    /// The die origin `(0, 0)`.
    Origin,
}

fn default_signals() -> u32 {
    1
}

/// A constraint on the relative position of two targets.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AlignmentRequirement {
    /// The reference target.
    pub first: AlignmentTarget,
    /// The target measured relative to `first`.
    pub second: AlignmentTarget,
    /// Horizontal constraint.
    #[serde(default)]
    pub x: AxisRequirement,
    /// Vertical constraint.
    #[serde(default)]
    pub y: AxisRequirement,
    /// Strict or flexible treatment of violations.
    #[serde(default)]
    pub handling: Handling,
    /// Number of signals (bus width) the requirement carries; scales its penalty.
    #[serde(default = "default_signals")]
    pub signals: u32,
}

impl AlignmentRequirement {
    /// Creates a flexible single-signal requirement between two blocks.
    pub fn between(first: BlockId, second: BlockId) -> Self {
        Self {
            first: AlignmentTarget::Block(first),
            second: AlignmentTarget::Block(second),
            x: AxisRequirement::undef(),
            y: AxisRequirement::undef(),
            handling: Handling::Flexible,
            signals: 1,
        }
    }

    /// Sets the horizontal constraint.
    pub fn with_x(mut self, x: AxisRequirement) -> Self {
        self.x = x;
        self
    }

    /// Sets the vertical constraint.
    pub fn with_y(mut self, y: AxisRequirement) -> Self {
        self.y = y;
        self
    }

    /// Sets the handling.
    pub fn with_handling(mut self, handling: Handling) -> Self {
        self.handling = handling;
        self
    }

    /// Sets the signal count.
    pub fn with_signals(mut self, signals: u32) -> Self {
        self.signals = signals;
        self
    }

    /// Returns the axis requirement for `axis`.
    pub fn axis(&self, axis: Axis) -> AxisRequirement {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Returns the referenced blocks (islands and the origin contribute none).
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> {
        [self.first, self.second]
            .into_iter()
            .filter_map(|t| match t {
                AlignmentTarget::Block(b) => Some(b),
                _ => None,
            })
    }
}

/// Where the measured value lies relative to the requirement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisStatus {
    /// The axis is satisfied.
    Fulfilled,
    /// The measured value is below the target or bound.
    TooLow,
    /// The measured value is above the target or bound.
    TooHigh,
}

/// Evaluation of one axis.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AxisEvaluation {
    /// Measured offset, overlap, or centre distance (0 for `Undef`).
    pub measured: f64,
    /// Non-negative distance from fulfilment.
    pub violation: f64,
    /// Classification of the measured value.
    pub status: AxisStatus,
}

impl AxisEvaluation {
    fn fulfilled(measured: f64) -> Self {
        Self {
            measured,
            violation: 0.0,
            status: AxisStatus::Fulfilled,
        }
    }

    /// Returns `true` if the axis is satisfied.
    pub fn is_fulfilled(&self) -> bool {
        self.status == AxisStatus::Fulfilled
    }
}

/// Evaluation of a requirement against one placement.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AlignmentEvaluation {
    /// The evaluated requirement.
    pub requirement: AlignmentId,
    /// The requirement's handling.
    pub handling: Handling,
    /// `true` if both axes are satisfied.
    pub fulfilled: bool,
    /// Horizontal result.
    pub x: AxisEvaluation,
    /// Vertical result.
    pub y: AxisEvaluation,
    /// Total violation of both axes times the signal count.
    pub mismatch: f64,
}

impl AlignmentEvaluation {
    /// Returns `true` if this is an unfulfilled strict requirement.
    pub fn is_strict_violation(&self) -> bool {
        !self.fulfilled && self.handling == Handling::Strict
    }
}

/// Evaluates requirements of one design against placements.
///
/// TSV island memberships are resolved once on construction.
#[derive(Debug, Clone)]
pub struct AlignmentModel {
    requirements: Vec<AlignmentRequirement>,
    islands: HashMap<IslandId, TsvIsland>,
    tolerance: Coord,
}

impl AlignmentModel {
    /// Builds the model for `design` with the given OFFSET tolerance.
    pub fn new(design: &Design, tolerance: Coord) -> Self {
        let mut islands = HashMap::new();
        for req in &design.alignments {
            for target in [req.first, req.second] {
                if let AlignmentTarget::Island(id) = target {
                    islands.entry(id).or_insert_with(|| design.island(id));
                }
            }
        }
        Self {
            requirements: design.alignments.clone(),
            islands,
            tolerance,
        }
    }

    /// Returns the number of requirements.
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Returns `true` if the design has no requirements.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Returns the requirement with the given ID.
    pub fn requirement(&self, id: AlignmentId) -> &AlignmentRequirement {
        &self.requirements[id.index()]
    }

    /// Evaluates every requirement against `placement`.
    pub fn evaluate_all(&self, placement: &Placement) -> Vec<AlignmentEvaluation> {
        (0..self.requirements.len())
            .map(|i| self.evaluate(AlignmentId::from_raw(i as u32), placement))
            .collect()
    }

    /// Evaluates one requirement against `placement`.
    pub fn evaluate(&self, id: AlignmentId, placement: &Placement) -> AlignmentEvaluation {
        let req = &self.requirements[id.index()];
        let a = self.footprint(req.first, placement);
        let b = self.footprint(req.second, placement);
        let x = evaluate_axis(req.x, &a, &b, Axis::X, self.tolerance);
        let y = evaluate_axis(req.y, &a, &b, Axis::Y, self.tolerance);
        AlignmentEvaluation {
            requirement: id,
            handling: req.handling,
            fulfilled: x.is_fulfilled() && y.is_fulfilled(),
            x,
            y,
            mismatch: (x.violation + y.violation) * req.signals as f64,
        }
    }

    fn footprint(&self, target: AlignmentTarget, placement: &Placement) -> Rect {
        let rect = match target {
            AlignmentTarget::Block(b) => Some(placement.rect(b)),
            AlignmentTarget::Island(id) => self
                .islands
                .get(&id)
                .and_then(|island| island.footprint(placement)),
            AlignmentTarget::Origin => DieOrigin.footprint(placement),
        };
        rect.unwrap_or_default()
    }
}

/// Measures one axis of `req` between footprints `a` and `b`.
pub fn evaluate_axis(
    req: AxisRequirement,
    a: &Rect,
    b: &Rect,
    axis: Axis,
    tolerance: Coord,
) -> AxisEvaluation {
    match req.kind {
        AlignmentKind::Undef => AxisEvaluation::fulfilled(0.0),
        AlignmentKind::Offset => {
            let measured = b.ll.along(axis) - a.ll.along(axis);
            let deviation = measured - req.value;
            let status = if deviation.abs() <= tolerance {
                AxisStatus::Fulfilled
            } else if deviation < 0 {
                AxisStatus::TooLow
            } else {
                AxisStatus::TooHigh
            };
            AxisEvaluation {
                measured: measured as f64,
                violation: if status == AxisStatus::Fulfilled {
                    0.0
                } else {
                    deviation.abs() as f64
                },
                status,
            }
        }
        AlignmentKind::Min => {
            let overlap = a.overlap_along(b, axis);
            if overlap >= req.value {
                AxisEvaluation::fulfilled(overlap as f64)
            } else {
                AxisEvaluation {
                    measured: overlap as f64,
                    violation: (req.value - overlap) as f64,
                    status: AxisStatus::TooLow,
                }
            }
        }
        AlignmentKind::Max => {
            let distance = (b.center_along(axis) - a.center_along(axis)).abs();
            let bound = req.value as f64;
            if distance <= bound {
                AxisEvaluation::fulfilled(distance)
            } else {
                AxisEvaluation {
                    measured: distance,
                    violation: distance - bound,
                    status: AxisStatus::TooHigh,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Block;
    use crate::ids::DieId;
    use crate::placement::PlacedBlock;

    fn two_block_design(req: AlignmentRequirement) -> Design {
        let mut design = Design::new();
        design.add_block(Block::new("a", 4, 4));
        design.add_block(Block::new("b", 4, 4));
        design.add_alignment(req);
        design
    }

    fn place(a: Rect, b: Rect) -> Placement {
        Placement::new(
            2,
            vec![
                PlacedBlock {
                    block: BlockId::from_raw(0),
                    die: DieId::from_raw(0),
                    rect: a,
                    rotated: false,
                },
                PlacedBlock {
                    block: BlockId::from_raw(1),
                    die: DieId::from_raw(1),
                    rect: b,
                    rotated: false,
                },
            ],
        )
    }

    fn eval(req: AlignmentRequirement, a: Rect, b: Rect, tolerance: Coord) -> AlignmentEvaluation {
        let design = two_block_design(req);
        AlignmentModel::new(&design, tolerance).evaluate(AlignmentId::from_raw(0), &place(a, b))
    }

    fn pair() -> AlignmentRequirement {
        AlignmentRequirement::between(BlockId::from_raw(0), BlockId::from_raw(1))
    }

    #[test]
    fn offset_exact_is_fulfilled() {
        let req = pair()
            .with_x(AxisRequirement::offset(3))
            .with_y(AxisRequirement::offset(0));
        let e = eval(req, Rect::new(1, 2, 4, 4), Rect::new(4, 2, 4, 4), 0);
        assert!(e.fulfilled);
        assert_eq!(e.x.measured, 3.0);
        assert_eq!(e.mismatch, 0.0);
    }

    #[test]
    fn offset_deviation_is_linear_and_signed() {
        let req = pair().with_x(AxisRequirement::offset(3));
        let low = eval(req, Rect::new(0, 0, 4, 4), Rect::new(1, 0, 4, 4), 0);
        assert!(!low.fulfilled);
        assert_eq!(low.x.status, AxisStatus::TooLow);
        assert_eq!(low.x.violation, 2.0);

        let high = eval(req, Rect::new(0, 0, 4, 4), Rect::new(8, 0, 4, 4), 0);
        assert_eq!(high.x.status, AxisStatus::TooHigh);
        assert_eq!(high.x.violation, 5.0);
    }

    #[test]
    fn offset_within_tolerance_is_fulfilled() {
        let req = pair().with_y(AxisRequirement::offset(0));
        let e = eval(req, Rect::new(0, 0, 4, 4), Rect::new(0, 2, 4, 4), 2);
        assert!(e.fulfilled);
        let e = eval(req, Rect::new(0, 0, 4, 4), Rect::new(0, 3, 4, 4), 2);
        assert!(!e.fulfilled);
    }

    #[test]
    fn min_overlap_bound() {
        let req = pair().with_x(AxisRequirement::min(2));
        let ok = eval(req, Rect::new(0, 0, 4, 4), Rect::new(2, 0, 4, 4), 0);
        assert!(ok.fulfilled);
        assert_eq!(ok.x.measured, 2.0);

        let short = eval(req, Rect::new(0, 0, 4, 4), Rect::new(3, 0, 4, 4), 0);
        assert!(!short.fulfilled);
        assert_eq!(short.x.violation, 1.0);

        // Disjoint: missing overlap plus the gap.
        let apart = eval(req, Rect::new(0, 0, 4, 4), Rect::new(6, 0, 4, 4), 0);
        assert_eq!(apart.x.measured, -2.0);
        assert_eq!(apart.x.violation, 4.0);
    }

    #[test]
    fn max_distance_bound() {
        let req = pair().with_y(AxisRequirement::max(5));
        let ok = eval(req, Rect::new(0, 0, 4, 4), Rect::new(0, 5, 4, 4), 0);
        assert!(ok.fulfilled);
        let far = eval(req, Rect::new(0, 0, 4, 4), Rect::new(0, 8, 4, 4), 0);
        assert!(!far.fulfilled);
        assert_eq!(far.y.status, AxisStatus::TooHigh);
        assert_eq!(far.y.violation, 3.0);
    }

    #[test]
    fn undef_always_fulfilled() {
        let req = pair();
        for b in [Rect::new(0, 0, 4, 4), Rect::new(500, 900, 4, 4)] {
            let e = eval(req, Rect::new(0, 0, 4, 4), b, 0);
            assert!(e.fulfilled);
            assert_eq!(e.mismatch, 0.0);
        }
    }

    #[test]
    fn signals_scale_mismatch() {
        let req = pair().with_x(AxisRequirement::offset(0)).with_signals(8);
        let e = eval(req, Rect::new(0, 0, 4, 4), Rect::new(1, 0, 4, 4), 0);
        assert_eq!(e.mismatch, 8.0);
    }

    #[test]
    fn strict_violation_flag() {
        let req = pair()
            .with_x(AxisRequirement::offset(0))
            .with_handling(Handling::Strict);
        let e = eval(req, Rect::new(0, 0, 4, 4), Rect::new(1, 0, 4, 4), 0);
        assert!(e.is_strict_violation());
        let e = eval(req, Rect::new(0, 0, 4, 4), Rect::new(0, 9, 4, 4), 0);
        assert!(!e.is_strict_violation());
    }

    #[test]
    fn island_and_origin_targets() {
        let mut design = Design::new();
        let island = IslandId::from_raw(0);
        design.add_block(Block::new("a", 4, 4).in_island(island));
        design.add_block(Block::new("b", 4, 4).in_island(island));
        design.add_alignment(AlignmentRequirement {
            first: AlignmentTarget::Origin,
            second: AlignmentTarget::Island(island),
            x: AxisRequirement::offset(2),
            y: AxisRequirement::undef(),
            handling: Handling::Flexible,
            signals: 1,
        });
        let model = AlignmentModel::new(&design, 0);
        let p = place(Rect::new(2, 0, 4, 4), Rect::new(6, 0, 4, 4));
        let e = model.evaluate(AlignmentId::from_raw(0), &p);
        assert!(e.fulfilled);
        assert_eq!(e.x.measured, 2.0);
    }

    #[test]
    fn requirement_deserializes() {
        let json = r#"{
            "first": {"block": 0},
            "second": "origin",
            "x": {"kind": "offset", "value": 5},
            "handling": "strict"
        }"#;
        let req: AlignmentRequirement = serde_json::from_str(json).unwrap();
        assert_eq!(req.first, AlignmentTarget::Block(BlockId::from_raw(0)));
        assert_eq!(req.second, AlignmentTarget::Origin);
        assert_eq!(req.x, AxisRequirement::offset(5));
        assert_eq!(req.y.kind, AlignmentKind::Undef);
        assert_eq!(req.handling, Handling::Strict);
        assert_eq!(req.signals, 1);
    }
}

//! The multi-objective cost of a candidate floorplan.
//!
//! Geometric terms (area, outline overflow, aspect ratio) are already
//! relative to the die outline. Wirelength, TSV count, and thermal cost are
//! divided by reference values taken during INIT, so that the configured
//! weights trade comparable magnitudes. An unfulfilled strict alignment
//! makes the whole candidate cost [`REJECTING_COST`].

use crate::alignment::{AlignmentEvaluation, AlignmentModel, Handling};
use crate::congestion::ExternalCost;
use crate::data::Design;
use crate::ids::DieId;
use crate::interconnect;
use crate::placement::Placement;
use crate::thermal::ThermalAnalyzer;
use serde::{Deserialize, Serialize};
use stratum_config::{CostWeights, FloorplanConfig, StackConfig};

/// Total cost of a candidate violating a strict alignment requirement.
pub const REJECTING_COST: f64 = f64::INFINITY;

/// Reference magnitudes the unbounded terms are divided by.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Reference weighted wirelength.
    pub wirelength: f64,
    /// Reference TSV count.
    pub tsv: f64,
    /// Reference thermal cost.
    pub thermal: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            wirelength: 1.0,
            tsv: 1.0,
            thermal: 1.0,
        }
    }
}

impl Normalization {
    /// Starts an observation with all references at zero.
    pub fn empty() -> Self {
        Self {
            wirelength: 0.0,
            tsv: 0.0,
            thermal: 0.0,
        }
    }

    /// Raises the references to the raw values of `cost` where larger.
    pub fn observe(&mut self, cost: &CostVector) {
        self.wirelength = self.wirelength.max(cost.raw_wirelength);
        self.tsv = self.tsv.max(cost.raw_tsv);
        self.thermal = self.thermal.max(cost.raw_thermal);
    }

    fn scale(value: f64, reference: f64) -> f64 {
        if reference > 0.0 {
            value / reference
        } else {
            value
        }
    }
}

/// All cost terms of one candidate plus the weighted total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostVector {
    /// Largest die bounding-box area relative to the outline area.
    pub area: f64,
    /// Largest relative overflow of a die bounding box past the outline (x plus y).
    pub outline: f64,
    /// Fraction of blocks placed outside their aspect-ratio range.
    pub aspect: f64,
    /// Normalized weighted wirelength.
    pub wirelength: f64,
    /// Normalized TSV count.
    pub tsv: f64,
    /// Normalized thermal cost.
    pub thermal: f64,
    /// Flexible alignment penalty, relative to the outline half-perimeter.
    pub alignment: f64,
    /// External congestion estimate.
    pub congestion: f64,
    /// External voltage-domain estimate.
    pub voltage: f64,
    /// Weighted wirelength before normalization.
    pub raw_wirelength: f64,
    /// TSV count before normalization.
    pub raw_tsv: f64,
    /// Thermal cost before normalization.
    pub raw_thermal: f64,
    /// Number of unfulfilled strict requirements.
    pub strict_violations: usize,
    /// Whether every die's bounding box lies within the outline.
    pub fits_outline: bool,
    /// Weighted sum, or [`REJECTING_COST`].
    pub total: f64,
}

impl CostVector {
    /// Returns `true` if a strict requirement is violated.
    pub fn is_rejecting(&self) -> bool {
        self.strict_violations > 0
    }

    /// Returns `true` if `self` should replace `other` as the best solution.
    ///
    /// Rejected candidates never win. A candidate fitting the outline beats
    /// one that does not; otherwise the lower total wins.
    pub fn better_than(&self, other: &CostVector) -> bool {
        if self.is_rejecting() {
            return false;
        }
        if other.is_rejecting() {
            return true;
        }
        match (self.fits_outline, other.fits_outline) {
            (true, false) => true,
            (false, true) => false,
            _ => self.total < other.total,
        }
    }

    fn with_totals(mut self, weights: &CostWeights, norm: &Normalization) -> Self {
        self.wirelength = Normalization::scale(self.raw_wirelength, norm.wirelength);
        self.tsv = Normalization::scale(self.raw_tsv, norm.tsv);
        self.thermal = Normalization::scale(self.raw_thermal, norm.thermal);
        self.total = if self.is_rejecting() {
            REJECTING_COST
        } else {
            weights.area * (self.area + self.outline + self.aspect)
                + weights.wirelength * self.wirelength
                + weights.tsv * self.tsv
                + weights.thermal * self.thermal
                + weights.alignment * self.alignment
                + weights.congestion * self.congestion
                + weights.voltage * self.voltage
        };
        self
    }
}

/// Evaluates placements of one design.
pub struct CostModel<'a> {
    design: &'a Design,
    stack: StackConfig,
    weights: CostWeights,
    alignment: AlignmentModel,
    thermal: ThermalAnalyzer,
    external: &'a dyn ExternalCost,
    normalization: Normalization,
}

impl<'a> CostModel<'a> {
    /// Creates a cost model with unit normalization.
    pub fn new(
        design: &'a Design,
        config: &FloorplanConfig,
        external: &'a dyn ExternalCost,
    ) -> Self {
        Self {
            design,
            stack: config.stack.clone(),
            weights: config.weights.clone(),
            alignment: AlignmentModel::new(design, config.alignment.tolerance),
            thermal: ThermalAnalyzer::new(&config.stack, &config.thermal),
            external,
            normalization: Normalization::default(),
        }
    }

    /// Returns the alignment model.
    pub fn alignment(&self) -> &AlignmentModel {
        &self.alignment
    }

    /// Returns the thermal analyzer.
    pub fn thermal(&self) -> &ThermalAnalyzer {
        &self.thermal
    }

    /// Returns the current normalization.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Replaces the normalization; references of zero are treated as one.
    pub fn set_normalization(&mut self, normalization: Normalization) {
        let one_if_zero = |v: f64| if v > 0.0 { v } else { 1.0 };
        self.normalization = Normalization {
            wirelength: one_if_zero(normalization.wirelength),
            tsv: one_if_zero(normalization.tsv),
            thermal: one_if_zero(normalization.thermal),
        };
    }

    /// Recomputes the normalized terms and total of `cost` under the current
    /// normalization.
    pub fn renormalize(&self, cost: &CostVector) -> CostVector {
        cost.clone().with_totals(&self.weights, &self.normalization)
    }

    /// Evaluates `placement`, returning its cost and the alignment evaluations.
    ///
    /// Thermal analysis and external estimators only run when their weight
    /// is non-zero.
    pub fn evaluate(&self, placement: &Placement) -> (CostVector, Vec<AlignmentEvaluation>) {
        let evaluations = self.alignment.evaluate_all(placement);
        let strict_violations = evaluations.iter().filter(|e| e.is_strict_violation()).count();
        let flexible_mismatch: f64 = evaluations
            .iter()
            .filter(|e| e.handling == Handling::Flexible && !e.fulfilled)
            .map(|e| e.mismatch)
            .sum();

        let (ow, oh) = (
            self.stack.outline_width as f64,
            self.stack.outline_height as f64,
        );
        let mut area: f64 = 0.0;
        let mut outline: f64 = 0.0;
        let mut fits_outline = true;
        for d in 0..placement.layers() {
            if let Some(bbox) = placement.die_bounding_box(DieId::from_raw(d as u32)) {
                let (bw, bh) = (bbox.ur.x as f64, bbox.ur.y as f64);
                area = area.max(bw * bh / (ow * oh));
                let overflow = (bw / ow - 1.0).max(0.0) + (bh / oh - 1.0).max(0.0);
                outline = outline.max(overflow);
                fits_outline &= overflow == 0.0;
            }
        }

        let blocks = self.design.block_count().max(1) as f64;
        let aspect = placement
            .iter()
            .filter(|p| {
                !self
                    .design
                    .block(p.block)
                    .aspect_fits(p.rect.width(), p.rect.height())
            })
            .count() as f64
            / blocks;

        let raw_wirelength = if self.weights.wirelength > 0.0 {
            self.design
                .nets
                .iter()
                .map(|n| interconnect::wirelength(n, placement))
                .sum()
        } else {
            0.0
        };
        let raw_tsv = if self.weights.tsv > 0.0 {
            self.design
                .nets
                .iter()
                .map(|n| interconnect::die_span(n, placement) as f64)
                .sum()
        } else {
            0.0
        };
        let raw_thermal = if self.weights.thermal > 0.0 {
            self.thermal.analyze(self.design, placement).summary.cost
        } else {
            0.0
        };
        let congestion = if self.weights.congestion > 0.0 {
            self.external.congestion(self.design, placement)
        } else {
            0.0
        };
        let voltage = if self.weights.voltage > 0.0 {
            self.external.voltage(self.design, placement)
        } else {
            0.0
        };

        let cost = CostVector {
            area,
            outline,
            aspect,
            wirelength: 0.0,
            tsv: 0.0,
            thermal: 0.0,
            alignment: flexible_mismatch / (ow + oh),
            congestion,
            voltage,
            raw_wirelength,
            raw_tsv,
            raw_thermal,
            strict_violations,
            fits_outline,
            total: 0.0,
        }
        .with_totals(&self.weights, &self.normalization);
        (cost, evaluations)
    }
}

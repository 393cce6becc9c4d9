//! 3D-IC floorplanning by simulated annealing over per-die packing sequences.
//!
//! This crate takes a [`Design`] (rectangular blocks, nets, alignment
//! requirements) and a [`FloorplanConfig`](stratum_config::FloorplanConfig)
//! describing the die stack, and searches for a non-overlapping placement of
//! every block on one of the dies. Candidates are scored by a multi-objective
//! cost covering area, outline fit, wirelength, TSV count, temperature, and
//! alignment; strict alignment violations reject a candidate outright.
//!
//! # Pipeline
//!
//! 1. **Validate**: malformed input is reported as `E1xx` diagnostics
//! 2. **Initialize**: shelf-packed start, strict repair, temperature sampling
//! 3. **Anneal**: perturb sequences, decode, evaluate, Metropolis acceptance
//! 4. **Freeze**: best candidate plus its thermal map as a [`FloorplanResult`]
//!
//! # Usage
//!
//! ```ignore
//! use stratum_floorplan::Floorplanner;
//!
//! let result = Floorplanner::new(&design, &config).run(&sink)?;
//! println!("{}", result.cost.total);
//! ```

#![warn(missing_docs)]

pub mod alignment;
pub mod codes;
pub mod congestion;
pub mod data;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod interconnect;
pub mod layout;
pub mod packing;
pub mod placement;
pub mod search;
pub mod thermal;
pub mod validate;

pub use alignment::{
    AlignmentEvaluation, AlignmentKind, AlignmentModel, AlignmentRequirement, AlignmentTarget,
    AxisRequirement, Handling,
};
pub use congestion::{BuiltinCosts, ExternalCost, NoExternalCost, RoutingUtilization};
pub use data::{AspectRange, Block, Design, HasGeometry, HasPower, HasVoltageDomain, Net};
pub use error::FloorplanError;
pub use geometry::{Coord, Point, Rect};
pub use ids::{AlignmentId, BlockId, DieId, IslandId, NetId};
pub use layout::Layout;
pub use packing::{decode, encode, DieSequence, Direction, Tuple};
pub use placement::{PlacedBlock, Placement};
pub use search::{
    acceptance_probability, AnnealObserver, CostVector, FloorplanResult, NoObserver,
    ScheduleStep, Termination, REJECTING_COST,
};
pub use thermal::{ThermalAnalysis, ThermalAnalyzer};
pub use validate::validate;

use search::Annealer;
use std::sync::atomic::AtomicBool;
use stratum_config::FloorplanConfig;
use stratum_diagnostics::DiagnosticSink;

/// Configures and runs one floorplanning job.
///
/// The design's IDs must be in arena order; call [`Design::reindex`] after
/// deserializing one.
pub struct Floorplanner<'a> {
    design: &'a Design,
    config: &'a FloorplanConfig,
    external: &'a dyn ExternalCost,
    stop: Option<&'a AtomicBool>,
}

impl<'a> Floorplanner<'a> {
    /// Creates a job without external cost estimators or a stop signal.
    pub fn new(design: &'a Design, config: &'a FloorplanConfig) -> Self {
        Self {
            design,
            config,
            external: &NoExternalCost,
            stop: None,
        }
    }

    /// Uses `external` for the congestion and voltage cost terms.
    pub fn with_external(mut self, external: &'a dyn ExternalCost) -> Self {
        self.external = external;
        self
    }

    /// Stops the search as soon as `stop` is set; the best so far is kept.
    pub fn with_stop_signal(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validates the input and runs the search.
    pub fn run(&self, sink: &DiagnosticSink) -> Result<FloorplanResult, FloorplanError> {
        self.run_observed(sink, &mut NoObserver)
    }

    /// Like [`run`](Self::run), reporting levels and accepted steps to `observer`.
    pub fn run_observed(
        &self,
        sink: &DiagnosticSink,
        observer: &mut dyn AnnealObserver,
    ) -> Result<FloorplanResult, FloorplanError> {
        validate(self.design, self.config, sink)?;
        let mut annealer = Annealer::new(self.design, self.config, self.external)?;
        if let Some(stop) = self.stop {
            annealer = annealer.with_stop_signal(stop);
        }
        Ok(annealer.run(sink, observer))
    }
}

/// Floorplans `design` with `config` and no external estimators.
pub fn floorplan(
    design: &Design,
    config: &FloorplanConfig,
    sink: &DiagnosticSink,
) -> Result<FloorplanResult, FloorplanError> {
    Floorplanner::new(design, config).run(sink)
}

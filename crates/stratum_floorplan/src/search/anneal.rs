//! Simulated-annealing search over per-die packing sequences.
//!
//! The search runs as a small state machine. INIT builds and evaluates the
//! starting layout, samples random moves to pick normalization references
//! and the initial temperature. EXPLORE runs one temperature level of
//! Metropolis steps, COOL adjusts the temperature, and FREEZE packages the
//! best candidate into a [`FloorplanResult`].

use crate::alignment::AlignmentEvaluation;
use crate::codes;
use crate::congestion::ExternalCost;
use crate::data::Design;
use crate::error::FloorplanError;
use crate::layout::{Layout, OperatorMix};
use crate::placement::Placement;
use crate::search::cost::{CostModel, CostVector, Normalization};
use crate::search::result::{BlockPlacement, FloorplanResult};
use crate::search::schedule::{
    acceptance_probability, std_dev, steps_per_level, Adjustment, CoolingSchedule, ScheduleStep,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use stratum_config::{ConfigError, FloorplanConfig};
use stratum_diagnostics::{Diagnostic, DiagnosticSink, Verbosity};

/// At most this many hotspot regions are reported as diagnostics.
const REPORTED_HOTSPOTS: usize = 5;

/// INIT keeps sampling for up to this many levels' worth of moves until one
/// of them changes the cost.
const INIT_SAMPLE_ROUNDS: usize = 8;

/// Why the search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The temperature fell below the configured minimum.
    TemperatureFloor,
    /// Acceptance stayed collapsed for the configured number of levels.
    AcceptanceCollapsed,
    /// The configured number of levels ran out.
    IterationBudget,
    /// The stop signal was raised.
    Stopped,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::TemperatureFloor => write!(f, "temperature floor reached"),
            Termination::AcceptanceCollapsed => write!(f, "acceptance collapsed"),
            Termination::IterationBudget => write!(f, "level budget exhausted"),
            Termination::Stopped => write!(f, "stopped"),
        }
    }
}

/// Hooks into the running search.
///
/// Both methods default to doing nothing.
pub trait AnnealObserver {
    /// Called after every temperature level.
    fn on_level(&mut self, _step: &ScheduleStep) {}

    /// Called whenever a step is accepted, with the new current candidate.
    fn on_accept(&mut self, _placement: &Placement, _cost: &CostVector) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObserver;

impl AnnealObserver for NoObserver {}

/// One evaluated layout.
#[derive(Clone, Debug)]
struct Candidate {
    layout: Layout,
    placement: Placement,
    alignments: Vec<AlignmentEvaluation>,
    cost: CostVector,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Explore,
    Cool,
    Freeze(Termination),
}

/// Step statistics of one temperature level.
#[derive(Default)]
struct LevelStats {
    attempted: usize,
    accepted: usize,
    cost_sum: f64,
    cost_count: usize,
}

impl LevelStats {
    fn record(&mut self, cost: &CostVector) {
        if cost.total.is_finite() {
            self.cost_sum += cost.total;
            self.cost_count += 1;
        }
    }

    fn acceptance(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }

    fn avg_cost(&self, fallback: f64) -> f64 {
        if self.cost_count == 0 {
            fallback
        } else {
            self.cost_sum / self.cost_count as f64
        }
    }
}

/// The annealing engine for one design and configuration.
pub struct Annealer<'a> {
    design: &'a Design,
    config: &'a FloorplanConfig,
    model: CostModel<'a>,
    mix: OperatorMix,
    stop: Option<&'a AtomicBool>,
    rng: StdRng,
    best: Option<Candidate>,
    steps: usize,
    accepted: usize,
}

impl<'a> Annealer<'a> {
    /// Creates an engine seeded from `config.annealing.seed`.
    ///
    /// `design` must already be validated.
    pub fn new(
        design: &'a Design,
        config: &'a FloorplanConfig,
        external: &'a dyn ExternalCost,
    ) -> Result<Self, FloorplanError> {
        let mix = OperatorMix::new(&config.annealing.operators).ok_or_else(|| {
            ConfigError::ValidationError(
                "annealing.operators must contain at least one positive weight".into(),
            )
        })?;
        Ok(Self {
            design,
            config,
            model: CostModel::new(design, config, external),
            mix,
            stop: None,
            rng: StdRng::seed_from_u64(config.annealing.seed),
            best: None,
            steps: 0,
            accepted: 0,
        })
    }

    /// Makes the search check `stop` before every step.
    pub fn with_stop_signal(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Runs the search to completion.
    pub fn run(mut self, sink: &DiagnosticSink, observer: &mut dyn AnnealObserver) -> FloorplanResult {
        let config = self.config;
        let anneal = &config.annealing;
        let steps = steps_per_level(self.design.block_count(), anneal.inner_loop_factor);
        let mut schedule = CoolingSchedule::new(anneal);
        let mut log: Vec<ScheduleStep> = Vec::new();

        let (mut current, mut temperature) = self.initialize(steps, sink);
        self.offer_best(&current, sink);

        let mut phase = if temperature <= anneal.min_temperature {
            Phase::Freeze(Termination::TemperatureFloor)
        } else {
            Phase::Explore
        };
        let mut stats = LevelStats::default();

        let termination = loop {
            phase = match phase {
                Phase::Explore => {
                    match self.explore(&mut current, temperature, steps, &mut stats, observer, sink) {
                        Some(stopped) => Phase::Freeze(stopped),
                        None => Phase::Cool,
                    }
                }
                Phase::Cool => {
                    let level = std::mem::take(&mut stats);
                    let acceptance = level.acceptance();
                    let avg_cost = level.avg_cost(current.cost.total);
                    let step = ScheduleStep {
                        level: log.len(),
                        temperature,
                        acceptance,
                        avg_cost,
                        best_cost: self.best_total(),
                    };
                    if sink.enabled(Verbosity::Debug) {
                        sink.emit(Diagnostic::note(
                            codes::P302,
                            Verbosity::Debug,
                            format!(
                                "level {}: T = {:.6}, acceptance {:.3}, avg cost {:.6}, best {:.6}",
                                step.level, temperature, acceptance, avg_cost, step.best_cost
                            ),
                        ));
                    }
                    observer.on_level(&step);
                    log.push(step);

                    match schedule.adjust(acceptance, avg_cost) {
                        Adjustment::Cool(factor) => temperature *= factor,
                        Adjustment::Reheat(factor) => {
                            temperature *= factor;
                            sink.emit(Diagnostic::note(
                                codes::P303,
                                Verbosity::Verbose,
                                format!(
                                    "reheat #{} after stagnation: T = {temperature:.6}",
                                    schedule.reheats()
                                ),
                            ));
                        }
                    }

                    if temperature < anneal.min_temperature {
                        Phase::Freeze(Termination::TemperatureFloor)
                    } else if schedule.is_frozen() {
                        Phase::Freeze(Termination::AcceptanceCollapsed)
                    } else if log.len() >= anneal.max_levels {
                        Phase::Freeze(Termination::IterationBudget)
                    } else {
                        Phase::Explore
                    }
                }
                Phase::Freeze(termination) => break termination,
            };
        };

        self.finish(current, log, termination, sink)
    }

    fn stopped(&self) -> bool {
        self.stop.is_some_and(|s| s.load(Ordering::Relaxed))
    }

    fn evaluate(&self, layout: Layout) -> Candidate {
        let placement = layout.decode(self.design);
        let (cost, alignments) = self.model.evaluate(&placement);
        Candidate {
            layout,
            placement,
            alignments,
            cost,
        }
    }

    /// Proposes, applies, and evaluates one random move away from `from`.
    fn perturb(&mut self, from: &Candidate) -> Option<Candidate> {
        let op = from.layout.propose(
            self.design,
            &from.placement,
            self.model.alignment(),
            &from.alignments,
            &self.mix,
            &mut self.rng,
        )?;
        let mut layout = from.layout.clone();
        layout
            .apply(&op, self.design, self.config.stack.allow_empty_dies)
            .ok()?;
        Some(self.evaluate(layout))
    }

    fn best_total(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.cost.total)
    }

    fn offer_best(&mut self, candidate: &Candidate, sink: &DiagnosticSink) {
        let improves = match &self.best {
            Some(best) => candidate.cost.better_than(&best.cost),
            None => !candidate.cost.is_rejecting(),
        };
        if improves {
            if sink.enabled(Verbosity::Debug) {
                sink.emit(Diagnostic::note(
                    codes::P305,
                    Verbosity::Debug,
                    format!("new best cost {:.6}", candidate.cost.total),
                ));
            }
            self.best = Some(candidate.clone());
        }
    }

    /// INIT: starting layout, strict repair, sampling, normalization, T0.
    fn initialize(&mut self, steps: usize, sink: &DiagnosticSink) -> (Candidate, f64) {
        let mut layout = Layout::initial(self.design, &self.config.stack);
        layout.repair_strict(self.design);
        let mut start = self.evaluate(layout);

        if start.cost.is_rejecting() {
            match self.walk_to_feasible(&start) {
                Some(feasible) => start = feasible,
                None => sink.emit(
                    Diagnostic::warning(
                        codes::W201,
                        "no starting layout satisfies every strict alignment requirement",
                    )
                    .with_note(format!(
                        "{} random moves were tried",
                        self.config.annealing.repair_attempts
                    )),
                ),
            }
        }

        let mut normalization = Normalization::empty();
        normalization.observe(&start.cost);
        let mut samples = vec![start.cost.clone()];
        let mut moves: Vec<(CostVector, CostVector)> = Vec::new();
        let mut varied = false;
        let mut walker = start.clone();
        for attempt in 0..steps.saturating_mul(INIT_SAMPLE_ROUNDS) {
            if self.stopped() || (attempt >= steps && varied) {
                break;
            }
            let Some(next) = self.perturb(&walker) else {
                continue;
            };
            if next.cost.is_rejecting() {
                continue;
            }
            normalization.observe(&next.cost);
            samples.push(next.cost.clone());
            if !walker.cost.is_rejecting() {
                varied |= next.cost.total != walker.cost.total;
                moves.push((walker.cost.clone(), next.cost.clone()));
            }
            if walker.cost.is_rejecting() || next.cost.total <= walker.cost.total {
                walker = next;
            }
        }

        self.model.set_normalization(normalization);
        let totals: Vec<f64> = samples
            .iter()
            .map(|c| self.model.renormalize(c).total)
            .filter(|t| t.is_finite())
            .collect();
        let factor = self.config.annealing.init_temp_factor;
        let mut temperature = factor * std_dev(&totals);
        if temperature <= self.config.annealing.min_temperature {
            // Every sample cost the same; fall back to the typical move size.
            let deltas: Vec<f64> = moves
                .iter()
                .map(|(from, to)| {
                    (self.model.renormalize(to).total - self.model.renormalize(from).total).abs()
                })
                .filter(|d| d.is_finite() && *d > 0.0)
                .collect();
            if !deltas.is_empty() {
                temperature = factor * deltas.iter().sum::<f64>() / deltas.len() as f64;
            }
        }
        start.cost = self.model.renormalize(&start.cost);

        let norm = self.model.normalization();
        sink.emit(Diagnostic::note(
            codes::P301,
            Verbosity::Verbose,
            format!(
                "initial temperature {temperature:.6} from {} samples; references: \
                 wirelength {:.3}, tsv {:.3}, thermal {:.3}",
                totals.len(),
                norm.wirelength,
                norm.tsv,
                norm.thermal
            ),
        ));
        (start, temperature)
    }

    /// Random walk from a strict-violating start until a feasible layout turns up.
    fn walk_to_feasible(&mut self, start: &Candidate) -> Option<Candidate> {
        let mut walker = start.clone();
        for _ in 0..self.config.annealing.repair_attempts {
            if self.stopped() {
                return None;
            }
            if let Some(next) = self.perturb(&walker) {
                if !next.cost.is_rejecting() {
                    return Some(next);
                }
                walker = next;
            }
        }
        None
    }

    /// EXPLORE: one temperature level. Returns `Some` if the stop signal fired.
    fn explore(
        &mut self,
        current: &mut Candidate,
        temperature: f64,
        steps: usize,
        stats: &mut LevelStats,
        observer: &mut dyn AnnealObserver,
        sink: &DiagnosticSink,
    ) -> Option<Termination> {
        for _ in 0..steps {
            if self.stopped() {
                return Some(Termination::Stopped);
            }
            self.steps += 1;
            stats.attempted += 1;

            if let Some(candidate) = self.perturb(current) {
                let delta = candidate.cost.total - current.cost.total;
                let p = acceptance_probability(delta, temperature);
                if p > 0.0 && self.rng.gen::<f64>() < p {
                    self.accepted += 1;
                    stats.accepted += 1;
                    observer.on_accept(&candidate.placement, &candidate.cost);
                    self.offer_best(&candidate, sink);
                    *current = candidate;
                }
            }
            stats.record(&current.cost);
        }
        None
    }

    /// FREEZE: package the best candidate.
    fn finish(
        mut self,
        current: Candidate,
        schedule: Vec<ScheduleStep>,
        termination: Termination,
        sink: &DiagnosticSink,
    ) -> FloorplanResult {
        let best = match self.best.take() {
            Some(best) => best,
            None => {
                sink.emit(Diagnostic::warning(
                    codes::W202,
                    "search ended without a candidate satisfying every strict requirement",
                ));
                current
            }
        };

        let thermal = self.model.thermal().analyze(self.design, &best.placement);
        for region in thermal.summary.hotspots.iter().take(REPORTED_HOTSPOTS) {
            sink.emit(
                Diagnostic::note(
                    codes::T401,
                    Verbosity::Normal,
                    format!(
                        "hotspot of {} bins peaking at {:.2} K",
                        region.bins, region.peak
                    ),
                )
                .with_subject(format!("die {}", region.layer)),
            );
        }

        sink.emit(Diagnostic::note(
            codes::P304,
            Verbosity::Verbose,
            format!(
                "search frozen after {} levels ({termination}): {} of {} steps accepted, best cost {:.6}",
                schedule.len(),
                self.accepted,
                self.steps,
                best.cost.total
            ),
        ));

        let blocks = best
            .placement
            .iter()
            .map(|p| BlockPlacement {
                name: self.design.block(p.block).name.clone(),
                block: p.block,
                die: p.die,
                x: p.rect.ll.x,
                y: p.rect.ll.y,
                width: p.rect.width(),
                height: p.rect.height(),
                rotated: p.rotated,
            })
            .collect();

        FloorplanResult {
            layers: best.placement.layers(),
            blocks,
            sequences: best.layout.into_sequences(),
            cost: best.cost,
            thermal,
            alignments: best.alignments,
            levels: schedule.len(),
            schedule,
            termination,
            seed: self.config.annealing.seed,
            steps: self.steps,
            accepted: self.accepted,
        }
    }
}

//! Temperature schedule: Metropolis acceptance, adaptive cooling, reheating.

use serde::{Deserialize, Serialize};
use stratum_config::AnnealingConfig;

/// Probability of accepting a move that changes the cost by `delta` at
/// `temperature`.
///
/// Non-worsening moves are always accepted. A worsening move is accepted
/// with probability `exp(-delta / temperature)`. Moves into a rejecting
/// (infinite) cost, undefined deltas, and non-positive temperatures accept
/// nothing uphill.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta.is_nan() || delta == f64::INFINITY {
        return 0.0;
    }
    if delta <= 0.0 {
        return 1.0;
    }
    if temperature <= 0.0 {
        return 0.0;
    }
    (-delta / temperature).exp()
}

/// Number of steps per temperature level for `blocks` blocks.
pub fn steps_per_level(blocks: usize, inner_loop_factor: f64) -> usize {
    let steps = inner_loop_factor * (blocks as f64).powf(4.0 / 3.0);
    (steps.round() as usize).max(1)
}

/// Population standard deviation; 0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt()
}

/// One completed temperature level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStep {
    /// Zero-based level index.
    pub level: usize,
    /// Temperature the level ran at.
    pub temperature: f64,
    /// Accepted steps divided by attempted steps.
    pub acceptance: f64,
    /// Mean total cost of the current solution over the level.
    pub avg_cost: f64,
    /// Best total cost found so far.
    pub best_cost: f64,
}

/// What the schedule decided after a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    /// Multiply the temperature by the factor.
    Cool(f64),
    /// Multiply the temperature by the reheat factor.
    Reheat(f64),
}

/// Adaptive cooling with stagnation-triggered reheating.
#[derive(Clone, Debug)]
pub struct CoolingSchedule {
    config: AnnealingConfig,
    recent_costs: Vec<f64>,
    reheats: usize,
    collapsed_levels: usize,
}

impl CoolingSchedule {
    /// Creates a schedule from annealing settings.
    pub fn new(config: &AnnealingConfig) -> Self {
        Self {
            config: config.clone(),
            recent_costs: Vec::new(),
            reheats: 0,
            collapsed_levels: 0,
        }
    }

    /// Returns the cooling factor for a level's acceptance rate.
    pub fn cooling_factor(&self, acceptance: f64) -> f64 {
        if acceptance > self.config.high_acceptance {
            self.config.cooling_fast
        } else if acceptance < self.config.low_acceptance {
            self.config.cooling_slow
        } else {
            self.config.cooling_normal
        }
    }

    /// Records a finished level and decides the next temperature change.
    pub fn adjust(&mut self, acceptance: f64, avg_cost: f64) -> Adjustment {
        if avg_cost.is_finite() {
            self.recent_costs.push(avg_cost);
            let window = self.config.reheat_window.max(1);
            if self.recent_costs.len() > window {
                let excess = self.recent_costs.len() - window;
                self.recent_costs.drain(..excess);
            }
        }

        let collapsed = acceptance <= self.config.freeze_acceptance;
        if !collapsed {
            self.collapsed_levels = 0;
            return Adjustment::Cool(self.cooling_factor(acceptance));
        }

        let stagnant = self.recent_costs.len() >= self.config.reheat_window.max(1)
            && std_dev(&self.recent_costs) < self.config.reheat_stddev_limit;
        if stagnant && self.reheats < self.config.max_reheats {
            self.reheats += 1;
            self.collapsed_levels = 0;
            self.recent_costs.clear();
            return Adjustment::Reheat(self.config.reheat_factor);
        }

        self.collapsed_levels += 1;
        Adjustment::Cool(self.cooling_factor(acceptance))
    }

    /// Returns `true` once acceptance stayed collapsed for `freeze_levels` levels.
    pub fn is_frozen(&self) -> bool {
        self.collapsed_levels >= self.config.freeze_levels.max(1)
    }

    /// Returns the number of reheats so far.
    pub fn reheats(&self) -> usize {
        self.reheats
    }
}

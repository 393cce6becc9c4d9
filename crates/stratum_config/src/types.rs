//! Configuration types deserialized from `stratum.toml`.

use serde::{Deserialize, Serialize};

/// The top-level floorplanning configuration parsed from `stratum.toml`.
///
/// Every section is optional and falls back to its [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorplanConfig {
    /// The die stack: layer count, outline, and vertical physical parameters.
    pub stack: StackConfig,
    /// The simulated-annealing schedule and operator mix.
    pub annealing: AnnealingConfig,
    /// Objective weights combined into the scalar cost.
    pub weights: CostWeights,
    /// Thermal grid and impulse-response parameters.
    pub thermal: ThermalConfig,
    /// Alignment evaluation settings.
    pub alignment: AlignmentConfig,
    /// Built-in routing-utilization estimator settings.
    pub routing: RoutingConfig,
}

/// Die stack geometry and the physical parameters the thermal mask is derived from.
///
/// Thicknesses are in micrometres, thermal resistivities in m·K/W. Only their
/// ratios enter the mask, so any consistent unit system works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Number of stacked dies (layer 0 is farthest from the heatsink).
    pub layers: usize,
    /// Fixed die outline width in database units.
    pub outline_width: i64,
    /// Fixed die outline height in database units.
    pub outline_height: i64,
    /// Whether a die may end up without blocks.
    pub allow_empty_dies: bool,
    /// Active silicon thickness per die.
    pub thickness_si: f64,
    /// Back-end-of-line (metal stack) thickness per die.
    pub thickness_beol: f64,
    /// Bonding layer thickness between two dies.
    pub thickness_bond: f64,
    /// Thermal resistivity of silicon.
    pub resistivity_si: f64,
    /// Thermal resistivity of the BEOL stack.
    pub resistivity_beol: f64,
    /// Thermal resistivity of the bonding layer.
    pub resistivity_bond: f64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            layers: 2,
            outline_width: 1000,
            outline_height: 1000,
            allow_empty_dies: true,
            thickness_si: 100.0,
            thickness_beol: 12.0,
            thickness_bond: 20.0,
            resistivity_si: 0.0085,
            resistivity_beol: 0.4444,
            resistivity_bond: 5.0,
        }
    }
}

impl StackConfig {
    /// Returns the die outline area in square database units.
    pub fn outline_area(&self) -> f64 {
        self.outline_width as f64 * self.outline_height as f64
    }
}

/// Simulated-annealing schedule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Seed for the search's random number generator.
    pub seed: u64,
    /// Steps per temperature level as a multiple of `blocks^(4/3)`.
    pub inner_loop_factor: f64,
    /// Maximum number of temperature levels.
    pub max_levels: usize,
    /// Initial temperature as a multiple of the sampled cost standard deviation.
    pub init_temp_factor: f64,
    /// Temperature floor below which the search freezes.
    pub min_temperature: f64,
    /// Cooling factor applied when the acceptance rate is above `high_acceptance`.
    pub cooling_fast: f64,
    /// Cooling factor applied between the two acceptance thresholds.
    pub cooling_normal: f64,
    /// Cooling factor applied when the acceptance rate is below `low_acceptance`.
    pub cooling_slow: f64,
    /// Acceptance rate above which cooling is fast.
    pub high_acceptance: f64,
    /// Acceptance rate below which cooling is slow.
    pub low_acceptance: f64,
    /// Acceptance rate at or below which a level counts as collapsed.
    pub freeze_acceptance: f64,
    /// Consecutive collapsed levels that freeze the search.
    pub freeze_levels: usize,
    /// Temperature multiplier applied on a reheat.
    pub reheat_factor: f64,
    /// Number of recent level-average costs inspected before reheating.
    pub reheat_window: usize,
    /// Standard deviation of recent level costs below which the search is stuck.
    pub reheat_stddev_limit: f64,
    /// Maximum number of reheats per run.
    pub max_reheats: usize,
    /// Random walk steps spent looking for a start that satisfies strict alignments.
    pub repair_attempts: usize,
    /// Relative frequency of each perturbation operator.
    pub operators: OperatorWeights,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            inner_loop_factor: 2.0,
            max_levels: 200,
            init_temp_factor: 1.0,
            min_temperature: 1e-6,
            cooling_fast: 0.8,
            cooling_normal: 0.93,
            cooling_slow: 0.98,
            high_acceptance: 0.9,
            low_acceptance: 0.1,
            freeze_acceptance: 0.005,
            freeze_levels: 10,
            reheat_factor: 2.0,
            reheat_window: 3,
            reheat_stddev_limit: 1e-6,
            max_reheats: 3,
            repair_attempts: 500,
            operators: OperatorWeights::default(),
        }
    }
}

/// Relative selection weights of the perturbation operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorWeights {
    /// Swap two blocks (same or different die).
    pub swap: f64,
    /// Move a tuple to another position within its die.
    pub move_within: f64,
    /// Flip a tuple's insertion direction.
    pub flip_direction: f64,
    /// Change a tuple's junction count.
    pub switch_junctions: f64,
    /// Move a block to another die.
    pub move_between_dies: f64,
    /// Rotate a block.
    pub rotate: f64,
    /// Shift a tuple's free-axis offset.
    pub shift_offset: f64,
    /// Stretch, shrink, or randomly reshape a soft block.
    pub reshape: f64,
    /// Move the partner of a violated alignment next to its counterpart.
    pub alignment_guided: f64,
}

impl Default for OperatorWeights {
    fn default() -> Self {
        Self {
            swap: 1.0,
            move_within: 1.0,
            flip_direction: 1.0,
            switch_junctions: 1.0,
            move_between_dies: 1.0,
            rotate: 0.5,
            shift_offset: 0.25,
            reshape: 0.5,
            alignment_guided: 0.25,
        }
    }
}

impl OperatorWeights {
    /// Returns the weights in a fixed operator order.
    pub fn as_array(&self) -> [f64; 9] {
        [
            self.swap,
            self.move_within,
            self.flip_direction,
            self.switch_junctions,
            self.move_between_dies,
            self.rotate,
            self.shift_offset,
            self.reshape,
            self.alignment_guided,
        ]
    }
}

/// Weights combining the normalized cost terms into the scalar total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Area, outline overflow, and aspect-ratio terms.
    pub area: f64,
    /// Half-perimeter wirelength.
    pub wirelength: f64,
    /// TSV count.
    pub tsv: f64,
    /// Thermal peak times mean.
    pub thermal: f64,
    /// Flexible alignment violations.
    pub alignment: f64,
    /// Externally supplied congestion signal.
    pub congestion: f64,
    /// Externally supplied voltage-domain signal.
    pub voltage: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            area: 1.0,
            wirelength: 0.3,
            tsv: 0.1,
            thermal: 0.2,
            alignment: 1.0,
            congestion: 0.0,
            voltage: 0.0,
        }
    }
}

/// Thermal grid and impulse-response parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Bins per side of each layer's power and temperature grid.
    pub map_dim: usize,
    /// Side length of the (odd) convolution mask.
    pub mask_dim: usize,
    /// Peak of the impulse response for a source on the same layer.
    pub impulse_factor: f64,
    /// Exponent applied to the vertical resistance ratio for distant layers.
    pub impulse_scaling_exponent: f64,
    /// Value the 1-D impulse profile reaches at the mask boundary.
    pub mask_boundary_value: f64,
    /// Ambient temperature every map starts from.
    pub temp_offset: f64,
    /// Temperature above which a bin counts as a hotspot.
    pub hotspot_threshold: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            map_dim: 64,
            mask_dim: 7,
            impulse_factor: 1.0,
            impulse_scaling_exponent: 1.0,
            mask_boundary_value: 0.01,
            temp_offset: 293.15,
            hotspot_threshold: 353.15,
        }
    }
}

/// Alignment evaluation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Allowed absolute deviation for OFFSET requirements, in database units.
    pub tolerance: i64,
}

/// Built-in routing-utilization estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Bins per side of each layer's utilization grid.
    pub map_dim: usize,
    /// Utilization above which a bin counts as overused.
    pub capacity: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            map_dim: 32,
            capacity: 1.0,
        }
    }
}

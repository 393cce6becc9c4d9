//! Power-blurring thermal analysis.
//!
//! The temperature of layer `d` is the ambient offset plus the power map of
//! every layer `l` convolved with the mask for distance `|l - d|`. The
//! convolution is separable and edge-clamped: a mask tap that would fall
//! outside the grid is charged to the nearest edge bin, so each pass
//! multiplies a layer's total by exactly the profile sum.

use crate::data::Design;
use crate::geometry::Coord;
use crate::placement::Placement;
use crate::thermal::grid::Grid;
use crate::thermal::hotspot::{find_hotspots, HotspotRegion};
use crate::thermal::mask::ThermalMask;
use crate::thermal::power::bin_power;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stratum_config::{StackConfig, ThermalConfig};

/// For each target index, the `(source index, weight)` taps landing on it.
type Gather = Vec<Vec<(usize, f64)>>;

fn build_gather(profile: &[f64], dim: usize) -> Gather {
    let center = profile.len() / 2;
    let mut gather: Gather = vec![Vec::new(); dim];
    for source in 0..dim {
        for (k, &w) in profile.iter().enumerate() {
            let target = (source as isize + k as isize - center as isize).clamp(0, dim as isize - 1)
                as usize;
            match gather[target].iter_mut().find(|(s, _)| *s == source) {
                Some(tap) => tap.1 += w,
                None => gather[target].push((source, w)),
            }
        }
    }
    gather
}

/// Per-layer temperature statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Total power binned on the layer.
    pub power: f64,
    /// Highest bin temperature.
    pub peak: f64,
    /// Mean bin temperature.
    pub mean: f64,
    /// Population variance of the bin temperatures.
    pub variance: f64,
    /// Number of bins above the hotspot threshold.
    pub hotspot_bins: usize,
}

impl LayerSummary {
    fn of(power: f64, map: &Grid, threshold: f64) -> Self {
        Self {
            power,
            peak: map.max(),
            mean: map.mean(),
            variance: map.variance(),
            hotspot_bins: map.values().iter().filter(|&&t| t > threshold).count(),
        }
    }
}

/// Stack-wide temperature statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalSummary {
    /// Statistics per layer.
    pub layers: Vec<LayerSummary>,
    /// The layer with the highest peak.
    pub hottest_layer: usize,
    /// Highest temperature of the stack.
    pub peak: f64,
    /// Mean temperature over all layers.
    pub mean: f64,
    /// Hotspot regions of all layers, hottest first.
    pub hotspots: Vec<HotspotRegion>,
    /// `peak × mean` of the hottest layer, or 0 without any power.
    pub cost: f64,
}

/// Temperature maps plus their summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalAnalysis {
    /// Temperature grid per layer.
    pub maps: Vec<Grid>,
    /// Statistics derived from the maps.
    pub summary: ThermalSummary,
}

/// Thermal analyzer for one stack configuration.
///
/// Masks and convolution taps are computed once on construction.
#[derive(Clone, Debug)]
pub struct ThermalAnalyzer {
    mask: ThermalMask,
    map_dim: usize,
    outline: (Coord, Coord),
    offset: f64,
    threshold: f64,
    gathers: Vec<Gather>,
}

impl ThermalAnalyzer {
    /// Creates an analyzer for `stack` and `thermal` settings.
    pub fn new(stack: &StackConfig, thermal: &ThermalConfig) -> Self {
        let mask = ThermalMask::new(stack, thermal);
        let gathers = (0..mask.distances())
            .map(|n| build_gather(mask.profile(n), thermal.map_dim))
            .collect();
        Self {
            mask,
            map_dim: thermal.map_dim,
            outline: (stack.outline_width, stack.outline_height),
            offset: thermal.temp_offset,
            threshold: thermal.hotspot_threshold,
            gathers,
        }
    }

    /// Returns the masks in use.
    pub fn mask(&self) -> &ThermalMask {
        &self.mask
    }

    /// Returns the per-layer power grids of `placement`.
    pub fn power_maps(&self, design: &Design, placement: &Placement) -> Vec<Grid> {
        bin_power(design, placement, self.outline, self.map_dim)
    }

    /// Adds the convolution of `power` with the mask for layer distance `n`
    /// to `out`.
    ///
    /// Both passes run in parallel over rows; `power` is only read.
    pub fn convolve_into(&self, power: &Grid, n: usize, out: &mut Grid) {
        let dim = self.map_dim;
        let gather = &self.gathers[n.min(self.gathers.len() - 1)];

        let mut horizontal = Grid::zeros(dim);
        horizontal
            .values_mut()
            .par_chunks_mut(dim)
            .enumerate()
            .for_each(|(y, row)| {
                let src = power.row(y);
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = gather[x].iter().map(|&(s, w)| src[s] * w).sum();
                }
            });

        out.values_mut()
            .par_chunks_mut(dim)
            .enumerate()
            .for_each(|(y, row)| {
                for &(s, w) in &gather[y] {
                    for (cell, &v) in row.iter_mut().zip(horizontal.row(s)) {
                        *cell += v * w;
                    }
                }
            });
    }

    /// Computes the temperature maps and summary of `placement`.
    pub fn analyze(&self, design: &Design, placement: &Placement) -> ThermalAnalysis {
        let power = self.power_maps(design, placement);
        let layers = power.len();
        let layer_power: Vec<f64> = power.iter().map(Grid::sum).collect();
        let total: f64 = layer_power.iter().sum();

        let maps: Vec<Grid> = (0..layers)
            .map(|d| {
                let mut map = Grid::filled(self.map_dim, self.offset);
                if total > 0.0 {
                    for (l, grid) in power.iter().enumerate() {
                        if layer_power[l] > 0.0 {
                            self.convolve_into(grid, l.abs_diff(d), &mut map);
                        }
                    }
                }
                map
            })
            .collect();

        let summary = self.summarize(&layer_power, &maps, total > 0.0);
        ThermalAnalysis { maps, summary }
    }

    fn summarize(&self, layer_power: &[f64], maps: &[Grid], powered: bool) -> ThermalSummary {
        let layers: Vec<LayerSummary> = maps
            .iter()
            .zip(layer_power)
            .map(|(map, &p)| LayerSummary::of(p, map, self.threshold))
            .collect();

        let hottest_layer = layers
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.peak.total_cmp(&b.1.peak))
            .map_or(0, |(i, _)| i);
        let peak = layers.get(hottest_layer).map_or(self.offset, |l| l.peak);
        let mean = if layers.is_empty() {
            self.offset
        } else {
            layers.iter().map(|l| l.mean).sum::<f64>() / layers.len() as f64
        };

        let mut hotspots: Vec<HotspotRegion> = maps
            .iter()
            .enumerate()
            .flat_map(|(i, map)| find_hotspots(map, i, self.threshold))
            .collect();
        hotspots.sort_by(|a, b| b.peak.total_cmp(&a.peak));

        let cost = match layers.get(hottest_layer) {
            Some(l) if powered => l.peak * l.mean,
            _ => 0.0,
        };

        ThermalSummary {
            layers,
            hottest_layer,
            peak,
            mean,
            hotspots,
            cost,
        }
    }
}

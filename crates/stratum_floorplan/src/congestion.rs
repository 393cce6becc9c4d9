//! External cost signals: routing congestion and voltage-domain quality.
//!
//! These estimators are collaborators of the search, not part of it. The
//! search only sees the [`ExternalCost`] trait; a run without estimators
//! uses [`NoExternalCost`].

use crate::data::{Design, HasVoltageDomain};
use crate::geometry::{Coord, Rect};
use crate::interconnect::layer_boxes;
use crate::placement::Placement;
use crate::thermal::power::axis_shares;
use crate::thermal::Grid;
use std::collections::BTreeMap;
use stratum_config::{RoutingConfig, StackConfig};

/// Additional cost terms computed outside the core cost model.
///
/// Both terms default to zero. Implementations must be deterministic for a
/// given placement.
pub trait ExternalCost: Send + Sync {
    /// Returns a congestion estimate for `placement`.
    fn congestion(&self, _design: &Design, _placement: &Placement) -> f64 {
        0.0
    }

    /// Returns a voltage-domain cost for `placement`.
    fn voltage(&self, _design: &Design, _placement: &Placement) -> f64 {
        0.0
    }
}

/// Contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalCost;

impl ExternalCost for NoExternalCost {}

/// Routing-utilization grids of one placement.
#[derive(Debug, Clone)]
pub struct UtilizationMap {
    /// Demand per bin, one grid per layer.
    pub layers: Vec<Grid>,
    capacity: f64,
}

impl UtilizationMap {
    /// Returns the highest bin demand over all layers.
    pub fn peak(&self) -> f64 {
        self.layers
            .iter()
            .map(Grid::max)
            .fold(0.0, f64::max)
    }

    /// Returns the mean bin demand over all layers.
    pub fn mean(&self) -> f64 {
        if self.layers.is_empty() {
            return 0.0;
        }
        self.layers.iter().map(Grid::mean).sum::<f64>() / self.layers.len() as f64
    }

    /// Returns whether any bin exceeds the capacity.
    pub fn has_congestion(&self) -> bool {
        self.overused_count() > 0
    }

    /// Returns the number of bins whose demand exceeds the capacity.
    pub fn overused_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|g| g.values())
            .filter(|&&d| d > self.capacity)
            .count()
    }
}

/// Probabilistic routing-utilization estimate.
///
/// Every net segment spreads a demand of `weight × (w + h) / area` per unit
/// area uniformly over its bounding box, on the segment's lower layer. The
/// congestion cost is `peak × mean` of the resulting utilization.
#[derive(Debug, Clone)]
pub struct RoutingUtilization {
    map_dim: usize,
    capacity: f64,
    outline: (Coord, Coord),
}

impl RoutingUtilization {
    /// Creates an estimator for `stack` with `routing` settings.
    pub fn new(stack: &StackConfig, routing: &RoutingConfig) -> Self {
        Self {
            map_dim: routing.map_dim,
            capacity: routing.capacity,
            outline: (stack.outline_width, stack.outline_height),
        }
    }

    /// Builds the utilization grids of `placement`.
    pub fn utilization(&self, design: &Design, placement: &Placement) -> UtilizationMap {
        let dim = self.map_dim;
        let mut layers = vec![Grid::zeros(dim); placement.layers()];
        let bin_w = self.outline.0 as f64 / dim as f64;
        let bin_h = self.outline.1 as f64 / dim as f64;
        let bin_area = bin_w * bin_h;

        for net in &design.nets {
            for (layer, rect) in layer_boxes(net, placement) {
                let Some(grid) = layers.get_mut(layer) else {
                    continue;
                };
                // Degenerate boxes still occupy one database unit.
                let w = rect.width().max(1);
                let h = rect.height().max(1);
                // Total demand of the segment, spread by overlap and expressed
                // per bin area so the capacity is resolution independent.
                let total = net.weight * (w + h) as f64;
                let xs = axis_shares(rect.ll.x, rect.ll.x + w, bin_w, dim);
                let ys = axis_shares(rect.ll.y, rect.ll.y + h, bin_h, dim);
                for &(y, fy) in &ys {
                    for &(x, fx) in &xs {
                        grid.add(x, y, total * fx * fy / bin_area);
                    }
                }
            }
        }

        UtilizationMap {
            layers,
            capacity: self.capacity,
        }
    }
}

impl ExternalCost for RoutingUtilization {
    fn congestion(&self, design: &Design, placement: &Placement) -> f64 {
        let map = self.utilization(design, placement);
        map.peak() * map.mean()
    }
}

/// Voltage-domain fragmentation estimate.
///
/// For each domain tag and die, the share of the domain's bounding box not
/// covered by its own blocks, plus one per extra die the domain spans,
/// averaged over domains. Compact single-die domains cost 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainSpread;

impl ExternalCost for DomainSpread {
    fn voltage(&self, design: &Design, placement: &Placement) -> f64 {
        let mut groups: BTreeMap<u32, BTreeMap<usize, Vec<Rect>>> = BTreeMap::new();
        for block in &design.blocks {
            if let Some(domain) = block.voltage_domain() {
                let placed = placement.get(block.id);
                groups
                    .entry(domain)
                    .or_default()
                    .entry(placed.die.index())
                    .or_default()
                    .push(placed.rect);
            }
        }
        if groups.is_empty() {
            return 0.0;
        }

        let total: f64 = groups
            .values()
            .map(|dies| {
                let gaps: f64 = dies
                    .values()
                    .filter_map(|rects| {
                        let bbox = Rect::bounding_box(rects)?;
                        let used: f64 = rects.iter().map(Rect::area).sum();
                        Some(((bbox.area() - used) / bbox.area()).max(0.0))
                    })
                    .sum();
                gaps + (dies.len() - 1) as f64
            })
            .sum();
        total / groups.len() as f64
    }
}

/// The built-in estimators: routing utilization and domain spread.
#[derive(Debug, Clone)]
pub struct BuiltinCosts {
    /// Congestion estimator.
    pub routing: RoutingUtilization,
    /// Voltage-domain estimator.
    pub domains: DomainSpread,
}

impl BuiltinCosts {
    /// Creates the estimators for `stack` with `routing` settings.
    pub fn new(stack: &StackConfig, routing: &RoutingConfig) -> Self {
        Self {
            routing: RoutingUtilization::new(stack, routing),
            domains: DomainSpread,
        }
    }
}

impl ExternalCost for BuiltinCosts {
    fn congestion(&self, design: &Design, placement: &Placement) -> f64 {
        self.routing.congestion(design, placement)
    }

    fn voltage(&self, design: &Design, placement: &Placement) -> f64 {
        self.domains.voltage(design, placement)
    }
}

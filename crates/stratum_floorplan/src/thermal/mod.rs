//! Thermal analysis by power blurring.
//!
//! Block power is binned onto one grid per die ([`power`]), convolved with
//! precomputed impulse-response masks ([`mask`]) into temperature maps
//! ([`analyzer`]), and summarized into peak, mean, variance, and hotspot
//! regions ([`hotspot`]). Grids are rebuilt for every evaluated candidate.

pub mod analyzer;
pub mod grid;
pub mod hotspot;
pub mod mask;
pub mod power;

pub use analyzer::{LayerSummary, ThermalAnalysis, ThermalAnalyzer, ThermalSummary};
pub use grid::Grid;
pub use hotspot::{find_hotspots, HotspotRegion};
pub use mask::ThermalMask;
pub use power::bin_power;

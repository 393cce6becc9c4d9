//! Hotspot regions: 4-connected groups of bins above a threshold.

use crate::thermal::grid::Grid;
use serde::{Deserialize, Serialize};

/// One connected region of hot bins on a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotspotRegion {
    /// The layer the region lies on.
    pub layer: usize,
    /// Number of bins in the region.
    pub bins: usize,
    /// Highest temperature in the region.
    pub peak: f64,
    /// Mean temperature of the region's bins.
    pub mean: f64,
    /// Bin bounding box `(min_x, min_y, max_x, max_y)`, inclusive.
    pub bounds: (usize, usize, usize, usize),
}

/// Finds all regions of `grid` strictly above `threshold`, largest peak first.
pub fn find_hotspots(grid: &Grid, layer: usize, threshold: f64) -> Vec<HotspotRegion> {
    let dim = grid.dim();
    let mut visited = vec![false; dim * dim];
    let mut regions = Vec::new();
    let mut worklist = Vec::new();

    for start in 0..dim * dim {
        if visited[start] || grid.values()[start] <= threshold {
            continue;
        }
        visited[start] = true;
        worklist.push(start);

        let mut bins = 0;
        let mut sum = 0.0;
        let mut peak = f64::NEG_INFINITY;
        let mut bounds = (usize::MAX, usize::MAX, 0, 0);

        while let Some(i) = worklist.pop() {
            let (x, y) = (i % dim, i / dim);
            let t = grid.values()[i];
            bins += 1;
            sum += t;
            peak = peak.max(t);
            bounds = (
                bounds.0.min(x),
                bounds.1.min(y),
                bounds.2.max(x),
                bounds.3.max(y),
            );

            let neighbours = [
                (x > 0).then(|| i - 1),
                (x + 1 < dim).then(|| i + 1),
                (y > 0).then(|| i - dim),
                (y + 1 < dim).then(|| i + dim),
            ];
            for n in neighbours.into_iter().flatten() {
                if !visited[n] && grid.values()[n] > threshold {
                    visited[n] = true;
                    worklist.push(n);
                }
            }
        }

        regions.push(HotspotRegion {
            layer,
            bins,
            peak,
            mean: sum / bins as f64,
            bounds,
        });
    }

    regions.sort_by(|a, b| b.peak.total_cmp(&a.peak));
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[f64]]) -> Grid {
        let dim = rows.len();
        let mut g = Grid::zeros(dim);
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                g.add(x, y, v);
            }
        }
        g
    }

    #[test]
    fn separates_diagonal_neighbours() {
        let g = grid(&[&[5.0, 0.0, 0.0], &[0.0, 6.0, 6.0], &[0.0, 6.0, 0.0]]);
        let regions = find_hotspots(&g, 0, 1.0);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bins, 3);
        assert_eq!(regions[0].bounds, (1, 1, 2, 2));
        assert_eq!(regions[1].bins, 1);
        assert_eq!(regions[1].peak, 5.0);
    }

    #[test]
    fn cold_grid_has_no_regions() {
        let g = Grid::filled(4, 300.0);
        assert!(find_hotspots(&g, 1, 300.0).is_empty());
    }

    #[test]
    fn large_region_needs_no_recursion() {
        let g = Grid::filled(256, 10.0);
        let regions = find_hotspots(&g, 0, 1.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bins, 256 * 256);
    }
}

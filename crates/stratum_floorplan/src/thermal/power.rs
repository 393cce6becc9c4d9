//! Power binning onto per-layer grids.
//!
//! The grid spans the die outline. The outermost bins reach to infinity, so
//! the part of a block hanging outside the outline is charged to the edge
//! bins and the grid total always equals the design's total power.

use crate::data::{Design, HasPower};
use crate::geometry::Coord;
use crate::placement::Placement;
use crate::thermal::grid::Grid;

/// Splits `[lo, hi)` over `dim` bins of width `bin` along one axis and returns
/// `(bin index, fraction of the interval)` pairs summing to 1.
pub(crate) fn axis_shares(lo: Coord, hi: Coord, bin: f64, dim: usize) -> Vec<(usize, f64)> {
    let (lo, hi) = (lo as f64, hi as f64);
    let length = hi - lo;
    let last_bin = dim as isize - 1;
    if length <= 0.0 || dim == 0 {
        return Vec::new();
    }
    let first = ((lo / bin).floor() as isize).clamp(0, last_bin) as usize;
    let last = ((hi / bin).ceil() as isize - 1).clamp(0, last_bin) as usize;

    (first..=last)
        .filter_map(|i| {
            let bin_lo = if i == 0 { f64::NEG_INFINITY } else { i as f64 * bin };
            let bin_hi = if i == dim - 1 {
                f64::INFINITY
            } else {
                (i + 1) as f64 * bin
            };
            let overlap = hi.min(bin_hi) - lo.max(bin_lo);
            (overlap > 0.0).then(|| (i, overlap / length))
        })
        .collect()
}

/// Distributes every block's power over the `dim × dim` grid of its die by
/// area-weighted overlap. Returns one grid per layer.
pub fn bin_power(
    design: &Design,
    placement: &Placement,
    outline: (Coord, Coord),
    dim: usize,
) -> Vec<Grid> {
    let mut grids = vec![Grid::zeros(dim); placement.layers()];
    let bin_w = outline.0 as f64 / dim as f64;
    let bin_h = outline.1 as f64 / dim as f64;

    for placed in placement.iter() {
        let power = design.block(placed.block).power();
        if power == 0.0 {
            continue;
        }
        let Some(grid) = grids.get_mut(placed.die.index()) else {
            continue;
        };
        let r = placed.rect;
        let xs = axis_shares(r.ll.x, r.ur.x, bin_w, dim);
        let ys = axis_shares(r.ll.y, r.ur.y, bin_h, dim);
        for &(y, fy) in &ys {
            for &(x, fx) in &xs {
                grid.add(x, y, power * fx * fy);
            }
        }
    }
    grids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Block;
    use crate::geometry::Rect;
    use crate::ids::{BlockId, DieId};
    use crate::placement::PlacedBlock;

    fn single(rect: Rect, density: f64) -> (Design, Placement) {
        let mut design = Design::new();
        design.add_block(
            Block::new("hot", rect.width(), rect.height()).with_power_density(density),
        );
        let placement = Placement::new(
            1,
            vec![PlacedBlock {
                block: BlockId::from_raw(0),
                die: DieId::from_raw(0),
                rect,
                rotated: false,
            }],
        );
        (design, placement)
    }

    #[test]
    fn shares_sum_to_one() {
        let shares = axis_shares(5, 35, 10.0, 4);
        assert_eq!(shares.len(), 4);
        let total: f64 = shares.iter().map(|s| s.1).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((shares[0].1 - 5.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn outside_parts_clamp_to_edge_bins() {
        // Entirely right of a 40-wide outline: lands in the last bin.
        assert_eq!(axis_shares(50, 60, 10.0, 4), vec![(3, 1.0)]);
        // Straddling the left edge.
        let shares = axis_shares(-10, 10, 10.0, 4);
        assert_eq!(shares, vec![(0, 1.0)]);
    }

    #[test]
    fn block_inside_one_bin() {
        let (design, placement) = single(Rect::new(12, 12, 4, 4), 0.5);
        let grids = bin_power(&design, &placement, (40, 40), 4);
        assert_eq!(grids[0].get(1, 1), 8.0);
        assert_eq!(grids[0].sum(), 8.0);
    }

    #[test]
    fn power_is_conserved_for_overhanging_blocks() {
        let (design, placement) = single(Rect::new(30, 25, 25, 30), 0.1);
        let grids = bin_power(&design, &placement, (40, 40), 8);
        assert!((grids[0].sum() - design.total_power()).abs() < 1e-9);
    }
}

//! Net geometry: per-layer bounding boxes and die spans.
//!
//! A net touching several dies is modelled as one segment per pair of
//! consecutive occupied layers: the bounding box of its pins on the lower
//! layer together with those on the next occupied layer above. Terminals
//! are fixed pins on layer 0.

use crate::data::Net;
use crate::geometry::{Point, Rect};
use crate::placement::Placement;

fn pins(net: &Net, placement: &Placement) -> Vec<(usize, Rect)> {
    let blocks = net.blocks.iter().map(|&b| {
        let placed = placement.get(b);
        (placed.die.index(), placed.rect)
    });
    let terminals = net
        .terminals
        .iter()
        .map(|&p: &Point| (0, Rect::from_corners(p, p)));
    blocks.chain(terminals).collect()
}

/// Returns the net's bounding box per segment, labelled by the lower layer.
///
/// A net confined to one layer yields a single box; a net without pins
/// yields none.
pub fn layer_boxes(net: &Net, placement: &Placement) -> Vec<(usize, Rect)> {
    let pins = pins(net, placement);
    let mut layers: Vec<usize> = pins.iter().map(|p| p.0).collect();
    layers.sort_unstable();
    layers.dedup();

    let bbox = |lo: usize, hi: usize| {
        Rect::bounding_box(pins.iter().filter(|p| p.0 == lo || p.0 == hi).map(|p| &p.1))
    };

    match layers.as_slice() {
        [] => Vec::new(),
        [only] => bbox(*only, *only).map(|r| (*only, r)).into_iter().collect(),
        occupied => occupied
            .windows(2)
            .filter_map(|w| bbox(w[0], w[1]).map(|r| (w[0], r)))
            .collect(),
    }
}

/// Returns the weighted half-perimeter wirelength of a net over all its segments.
pub fn wirelength(net: &Net, placement: &Placement) -> f64 {
    let hpwl: i64 = layer_boxes(net, placement)
        .iter()
        .map(|(_, r)| r.half_perimeter())
        .sum();
    net.weight * hpwl as f64
}

/// Returns the number of die boundaries the net crosses.
pub fn die_span(net: &Net, placement: &Placement) -> usize {
    let pins = pins(net, placement);
    let lo = pins.iter().map(|p| p.0).min();
    let hi = pins.iter().map(|p| p.0).max();
    match (lo, hi) {
        (Some(lo), Some(hi)) => hi - lo,
        _ => 0,
    }
}

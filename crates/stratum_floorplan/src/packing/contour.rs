//! Piecewise-constant skyline over one axis.
//!
//! A contour maps every coordinate `c` to the largest far edge of any placed
//! block whose span covers `c`. Segments are kept in a `BTreeMap` keyed by
//! segment start, so range queries and raises cost `O(log n + k)` for `k`
//! touched segments, and adjacent equal segments are merged on every raise.

use crate::geometry::Coord;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

/// A skyline: for each coordinate, the far edge of the blocks covering it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    segments: BTreeMap<Coord, Coord>,
}

impl Contour {
    /// Creates a flat contour at height 0.
    pub fn new() -> Self {
        let mut segments = BTreeMap::new();
        segments.insert(Coord::MIN, 0);
        Self { segments }
    }

    /// Returns the contour height at coordinate `at`.
    pub fn value_at(&self, at: Coord) -> Coord {
        self.segments
            .range(..=at)
            .next_back()
            .map_or(0, |(_, &v)| v)
    }

    /// Returns the highest contour value over the half-open span `[lo, hi)`.
    pub fn max_over(&self, lo: Coord, hi: Coord) -> Coord {
        let mut max = self.value_at(lo);
        if hi > lo {
            for (_, &v) in self.segments.range((Excluded(lo), Excluded(hi))) {
                max = max.max(v);
            }
        }
        max
    }

    /// Raises the contour to at least `value` over `[lo, hi)`.
    pub fn raise(&mut self, lo: Coord, hi: Coord, value: Coord) {
        if hi <= lo {
            return;
        }
        self.split_at(lo);
        self.split_at(hi);
        for (_, v) in self.segments.range_mut(lo..hi) {
            *v = (*v).max(value);
        }
        self.merge_from(lo, hi);
    }

    /// Returns the number of constant segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn split_at(&mut self, at: Coord) {
        if !self.segments.contains_key(&at) {
            let v = self.value_at(at);
            self.segments.insert(at, v);
        }
    }

    /// Removes segment starts in `[lo, hi]` that repeat their predecessor's value.
    fn merge_from(&mut self, lo: Coord, hi: Coord) {
        let mut previous = self
            .segments
            .range((Unbounded, Excluded(lo)))
            .next_back()
            .map(|(_, &v)| v);
        let keys: Vec<(Coord, Coord)> = self
            .segments
            .range(lo..=hi)
            .map(|(&k, &v)| (k, v))
            .collect();
        for (k, v) in keys {
            if previous == Some(v) {
                self.segments.remove(&k);
            } else {
                previous = Some(v);
            }
        }
    }
}

impl Default for Contour {
    fn default() -> Self {
        Self::new()
    }
}

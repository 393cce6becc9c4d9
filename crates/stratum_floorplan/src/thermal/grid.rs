//! Square per-layer value grids.

use serde::{Deserialize, Serialize};

/// A `dim × dim` grid of values in row-major order (`y * dim + x`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    dim: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Creates a grid with every bin set to `value`.
    pub fn filled(dim: usize, value: f64) -> Self {
        Self {
            dim,
            values: vec![value; dim * dim],
        }
    }

    /// Creates a zero grid.
    pub fn zeros(dim: usize) -> Self {
        Self::filled(dim, 0.0)
    }

    /// Returns the side length.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the bin at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.dim + x]
    }

    /// Adds `value` to the bin at `(x, y)`.
    pub fn add(&mut self, x: usize, y: usize, value: f64) {
        self.values[y * self.dim + x] += value;
    }

    /// Returns all bins in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns all bins mutably in row-major order.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> &[f64] {
        &self.values[y * self.dim..(y + 1) * self.dim]
    }

    /// Returns the sum of all bins.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Returns the largest bin value, or `f64::NEG_INFINITY` for an empty grid.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Returns the mean bin value.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum() / self.values.len() as f64
        }
    }

    /// Returns the population variance of the bins.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / self.values.len() as f64
    }
}

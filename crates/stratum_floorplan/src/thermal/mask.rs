//! Separable impulse-response masks, one per layer distance.
//!
//! A power source on layer `l` heats layer `d` through `|l - d|` die and
//! bond stacks. The peak of its impulse response falls with the vertical
//! thermal resistance between the two layers:
//!
//! ```text
//! r_die = t_si * rho_si + t_beol * rho_beol
//! r(n)  = r_die + n * (r_die + t_bond * rho_bond)
//! peak(n) = impulse_factor * (r_die / r(n)) ^ impulse_scaling_exponent
//! ```
//!
//! The 2-D mask is the outer product of the 1-D profile
//! `sqrt(peak) * exp(-(i * scale)^2)` with itself, where `scale` makes the
//! same-layer mask decay to `mask_boundary_value` at its edge.

use stratum_config::{StackConfig, ThermalConfig};

/// The 1-D mask profiles for every layer distance in a stack.
#[derive(Clone, Debug, PartialEq)]
pub struct ThermalMask {
    dim: usize,
    profiles: Vec<Vec<f64>>,
}

impl ThermalMask {
    /// Builds the masks for `stack.layers` distances.
    pub fn new(stack: &StackConfig, thermal: &ThermalConfig) -> Self {
        let dim = thermal.mask_dim;
        let center = (dim / 2) as f64;
        let r_die = stack.thickness_si * stack.resistivity_si
            + stack.thickness_beol * stack.resistivity_beol;
        let r_bond = stack.thickness_bond * stack.resistivity_bond;

        let ratio = thermal.impulse_factor / thermal.mask_boundary_value;
        let scale = if center > 0.0 && ratio > 1.0 {
            ratio.ln().sqrt() / center
        } else {
            0.0
        };

        let profiles = (0..stack.layers.max(1))
            .map(|n| {
                let r_n = r_die + n as f64 * (r_die + r_bond);
                let peak = thermal.impulse_factor
                    * (r_die / r_n).powf(thermal.impulse_scaling_exponent);
                let amplitude = peak.sqrt();
                (0..dim)
                    .map(|i| {
                        let x = (i as f64 - center) * scale;
                        amplitude * (-(x * x)).exp()
                    })
                    .collect()
            })
            .collect();

        Self { dim, profiles }
    }

    /// Returns the mask side length.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the index of the mask centre.
    pub fn center(&self) -> usize {
        self.dim / 2
    }

    /// Returns the number of layer distances covered.
    pub fn distances(&self) -> usize {
        self.profiles.len()
    }

    /// Returns the 1-D profile for layer distance `n`.
    pub fn profile(&self, n: usize) -> &[f64] {
        &self.profiles[n.min(self.profiles.len() - 1)]
    }

    /// Returns the 2-D mask peak for layer distance `n`.
    pub fn peak(&self, n: usize) -> f64 {
        let c = self.profile(n)[self.center()];
        c * c
    }

    /// Returns the sum of the 2-D mask for layer distance `n`.
    pub fn weight(&self, n: usize) -> f64 {
        let s: f64 = self.profile(n).iter().sum();
        s * s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(layers: usize) -> ThermalMask {
        let stack = StackConfig {
            layers,
            ..StackConfig::default()
        };
        ThermalMask::new(&stack, &ThermalConfig::default())
    }

    #[test]
    fn same_layer_peak_is_impulse_factor() {
        let m = mask(3);
        assert!((m.peak(0) - 1.0).abs() < 1e-12);
        assert_eq!(m.profile(0).len(), 7);
    }

    #[test]
    fn same_layer_mask_reaches_boundary_value_at_edge() {
        let m = mask(1);
        let p = m.profile(0);
        // Edge of the 2-D mask along one axis: p[edge] * p[center].
        let edge = p[0] * p[m.center()];
        assert!((edge - 0.01).abs() < 1e-9);
    }

    #[test]
    fn peaks_fall_with_distance() {
        let m = mask(3);
        assert!(m.peak(0) > m.peak(1));
        assert!(m.peak(1) > m.peak(2));
        assert!(m.peak(2) > 0.0);
    }

    #[test]
    fn profile_is_symmetric() {
        let m = mask(2);
        let p = m.profile(1);
        for i in 0..p.len() {
            assert!((p[i] - p[p.len() - 1 - i]).abs() < 1e-15);
        }
    }
}

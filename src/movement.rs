//! The movement function: diffusion of range intensity between time steps
//!
//! One step spreads intensity into a cell from its 8-neighborhood, weighted
//! by the cell's environmental suitability and by how occupied the cell
//! already is. The neighborhood sum is always divided by 8, including at
//! edges and corners where fewer than 8 neighbors exist: off-grid neighbors
//! contribute zero (absorbing boundary). This matches the published model
//! and is deliberate, not a missing renormalization.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::grid::Grid;

/// Relative weighting of colonizing empty cells (`alpha`) against holding
/// already-occupied cells (`beta`). Both are conventionally in [0, 1]; the
/// update stays well-defined outside that range, so out-of-range values are
/// reported as warnings rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateParameters {
    pub alpha: f64,
    pub beta: f64,
}

impl RateParameters {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Warnings for parameter values that are mathematically fine but not
    /// domain-meaningful for this model.
    pub fn domain_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(format!(
                    "{name} = {value} is outside [0, 1]; the update remains defined but the value has no model interpretation"
                ));
            }
        }
        warnings
    }
}

/// Apply one synchronous movement step.
///
/// Every output cell is computed from the prior grid only (Jacobi-style), so
/// cell update order cannot leak into the result:
///
/// ```text
/// P'(i,q) = E(i,q) * ( (1 - P(i,q)) * Nbar/8 * alpha + P(i,q) * Nbar/8 * beta )
/// ```
///
/// where `Nbar` is the clamped 8-neighborhood sum around `(i,q)`.
pub fn step(p: &Grid, env: &Grid, rates: RateParameters) -> Result<Grid, ModelError> {
    env.check_same_dims(p, "movement step")?;
    let (rows, cols) = p.dims();
    let mut next = Grid::zeros(rows, cols);
    for i in 0..rows {
        for q in 0..cols {
            let occupancy = p.get(i, q);
            let shared = p.neighborhood_sum(i, q) / 8.0;
            let value = env.get(i, q)
                * ((1.0 - occupancy) * shared * rates.alpha + occupancy * shared * rates.beta);
            next.set(i, q, value);
        }
    }
    Ok(next)
}

/// Apply [`step`] `steps` times in sequence, integrating the movement process
/// along one branch's time span. `steps == 0` returns the input unchanged.
pub fn propagate(
    p: &Grid,
    env: &Grid,
    rates: RateParameters,
    steps: u64,
) -> Result<Grid, ModelError> {
    let mut current = p.clone();
    for _ in 0..steps {
        current = step(&current, env, rates)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn uniform_env(rows: usize, cols: usize) -> Grid {
        Grid::from_fn(rows, cols, |_, _| 1.0)
    }

    #[test]
    fn equal_rates_reduce_to_neighborhood_average() {
        // With alpha == beta and E == 1, the occupancy terms cancel:
        // (1-P)*k + P*k = k, so P' = Nbar/8 everywhere.
        let p = Grid::from_fn(4, 4, |r, c| ((r + 2 * c) % 3) as f64 * 0.25);
        let env = uniform_env(4, 4);
        let rates = RateParameters::new(0.7, 0.7);

        let next = step(&p, &env, rates).unwrap();
        for r in 0..4 {
            for c in 0..4 {
                let expected = p.neighborhood_sum(r, c) / 8.0 * 0.7;
                assert!((next.get(r, c) - expected).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn single_occupied_center_after_one_step() {
        // 3x3 grid, only the center occupied. The center's neighbors are all
        // zero, so it empties; every other cell sees exactly the center in
        // its neighborhood, so Nbar = 1 and P' = alpha/8.
        let mut p = Grid::zeros(3, 3);
        p.set(1, 1, 1.0);
        let env = uniform_env(3, 3);
        let rates = RateParameters::new(0.5, 0.5);

        let next = step(&p, &env, rates).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if (r, c) == (1, 1) { 0.0 } else { 0.5 / 8.0 };
                assert!(
                    (next.get(r, c) - expected).abs() < TOLERANCE,
                    "cell ({r},{c}) = {}, expected {expected}",
                    next.get(r, c)
                );
            }
        }
    }

    #[test]
    fn environment_scales_cells_independently() {
        let mut p = Grid::zeros(3, 3);
        p.set(1, 1, 1.0);
        let mut env = uniform_env(3, 3);
        env.set(0, 0, 0.25);
        let rates = RateParameters::new(0.8, 0.2);

        let next = step(&p, &env, rates).unwrap();
        assert!((next.get(0, 0) - 0.25 * 0.8 / 8.0).abs() < TOLERANCE);
        assert!((next.get(0, 1) - 0.8 / 8.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_steps_is_identity() {
        let p = Grid::from_fn(5, 3, |r, c| (r + c) as f64);
        let env = uniform_env(5, 3);
        let out = propagate(&p, &env, RateParameters::new(0.3, 0.9), 0).unwrap();
        assert_eq!(out, p);
    }

    #[test]
    fn propagate_chains_steps() {
        let p = Grid::from_fn(4, 4, |r, c| ((r * c) % 2) as f64);
        let env = uniform_env(4, 4);
        let rates = RateParameters::new(0.4, 0.6);

        let chained = propagate(&p, &env, rates, 3).unwrap();
        let manual = step(
            &step(&step(&p, &env, rates).unwrap(), &env, rates).unwrap(),
            &env,
            rates,
        )
        .unwrap();
        assert_eq!(chained, manual);
    }

    #[test]
    fn mismatched_environment_is_rejected() {
        let p = Grid::zeros(3, 3);
        let env = Grid::zeros(3, 4);
        assert!(matches!(
            step(&p, &env, RateParameters::new(0.5, 0.5)),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn out_of_range_rates_warn_but_construct() {
        let rates = RateParameters::new(1.5, -0.1);
        let warnings = rates.domain_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("alpha"));
        assert!(warnings[1].contains("beta"));

        assert!(RateParameters::new(0.0, 1.0).domain_warnings().is_empty());
    }
}

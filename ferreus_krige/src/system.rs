/////////////////////////////////////////////////////////////////////////////////////////////
//
// Assembles Kriging systems: covariance blocks, Lagrange constraint borders, and right-hand sides.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # system
//!
//! Builds the square symmetric Kriging system for one set of observation
//! locations. The top-left `n_obs x n_obs` block holds the pairwise
//! variogram evaluations, converted to covariance form when the model is
//! stationary; the border holds the variant-specific Lagrange constraints
//! and the bottom-right corner is identically zero.

use crate::estimator_config::{EstimatorSettings, KrigingVariant, evaluate_monomial};
use faer::{Mat, MatRef, RowRef};
use ferreus_krige_utils::{VariogramFunction, get_gamma_matrix, get_gamma_vector};

/// Applies the stationarity transform to one semivariance value.
///
/// Stationary models are converted to covariances (`sill - gamma`), which
/// keeps the Simple Kriging block positive definite and improves the
/// conditioning of the bordered systems. Non-stationary models stay in raw
/// semivariance form.
#[inline(always)]
pub(crate) fn covariance_transform(model: &dyn VariogramFunction, gamma: f64) -> f64 {
    match model.is_stationary() {
        true => model.sill() - gamma,
        false => gamma,
    }
}

/// One assembled Kriging system.
pub(crate) struct KrigingSystem {
    /// Symmetric `(n_obs + n_constraints)` square matrix.
    pub lhs: Mat<f64>,
    pub n_obs: usize,
    pub n_constraints: usize,
}

impl KrigingSystem {
    /// Builds the full system matrix for the given observation locations.
    pub fn assemble(
        settings: &EstimatorSettings,
        points: MatRef<'_, f64>,
        model: &dyn VariogramFunction,
    ) -> Self {
        let n = points.nrows();
        let m = settings.num_constraints();

        debug_assert_eq!(points.ncols(), settings.dimensions);

        let mut lhs = Mat::<f64>::zeros(n + m, n + m);

        // Pairwise variogram block, transformed and mirrored. Only the lower
        // triangle of the gamma matrix is fresh work; the transform is cheap
        // enough to apply to both mirror targets here.
        let gamma = get_gamma_matrix(points, model);
        for j in 0..n {
            for i in j..n {
                let c = covariance_transform(model, gamma[(i, j)]);
                lhs[(i, j)] = c;
                lhs[(j, i)] = c;
            }
        }

        // Variant constraint border; row i mirrors column i and the corner
        // block stays zero.
        match &settings.variant {
            KrigingVariant::Simple { .. } => {}
            KrigingVariant::Ordinary => {
                for i in 0..n {
                    lhs[(i, n)] = 1.0;
                    lhs[(n, i)] = 1.0;
                }
            }
            KrigingVariant::Universal { .. } => {
                for (c, exponent) in settings.exponents().iter().enumerate() {
                    for i in 0..n {
                        let v = evaluate_monomial(points.row(i), exponent);
                        lhs[(i, n + c)] = v;
                        lhs[(n + c, i)] = v;
                    }
                }
            }
            KrigingVariant::ExternalDrift { drifts } => {
                for (c, drift) in drifts.iter().enumerate() {
                    for i in 0..n {
                        let v = drift(points.row(i));
                        lhs[(i, n + c)] = v;
                        lhs[(n + c, i)] = v;
                    }
                }
            }
        }

        Self {
            lhs,
            n_obs: n,
            n_constraints: m,
        }
    }

    /// Fills the right-hand side for one query location into `rhs`, which
    /// must be an `(n_obs + n_constraints) x 1` buffer.
    pub fn fill_rhs(
        settings: &EstimatorSettings,
        points: MatRef<'_, f64>,
        model: &dyn VariogramFunction,
        query: RowRef<'_, f64>,
        rhs: &mut Mat<f64>,
    ) {
        let n = points.nrows();

        debug_assert_eq!(rhs.nrows(), n + settings.num_constraints());
        debug_assert_eq!(rhs.ncols(), 1);

        let gamma = get_gamma_vector(points, query, model);
        for i in 0..n {
            rhs[(i, 0)] = covariance_transform(model, gamma[(i, 0)]);
        }

        match &settings.variant {
            KrigingVariant::Simple { .. } => {}
            KrigingVariant::Ordinary => {
                rhs[(n, 0)] = 1.0;
            }
            KrigingVariant::Universal { .. } => {
                for (c, exponent) in settings.exponents().iter().enumerate() {
                    rhs[(n + c, 0)] = evaluate_monomial(query, exponent);
                }
            }
            KrigingVariant::ExternalDrift { drifts } => {
                for (c, drift) in drifts.iter().enumerate() {
                    rhs[(n + c, 0)] = drift(query);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator_config::DriftFunction;
    use equator::assert;
    use faer::{mat, utils::approx::*};
    use ferreus_krige_utils::models::{GaussianVariogram, PowerVariogram};
    use std::sync::Arc;

    fn sample_points() -> Mat<f64> {
        mat![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0], [3.0, 1.0f64]]
    }

    fn gaussian() -> GaussianVariogram {
        GaussianVariogram { range: 10.0, sill: 2.0, nugget: 0.0 }
    }

    #[test]
    fn stationary_block_is_covariance_with_sill_diagonal() {
        let points = sample_points();
        let model = gaussian();
        let settings = EstimatorSettings::new(KrigingVariant::Simple { mean: 0.0 }, 2, &model).unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        assert_eq!(system.lhs.nrows(), 4);
        for i in 0..4 {
            assert!((system.lhs[(i, i)] - 2.0).abs() < 1e-15);
        }
        // Off-diagonal entries are sill - gamma(h), strictly below the sill.
        assert!(system.lhs[(0, 1)] < 2.0);
        assert!(system.lhs[(0, 1)] > 0.0);
    }

    #[test]
    fn non_stationary_block_keeps_raw_semivariance() {
        let points = sample_points();
        let model = PowerVariogram { scaling: 1.0, exponent: 1.0, nugget: 0.0 };
        let settings = EstimatorSettings::new(KrigingVariant::Ordinary, 2, &model).unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        for i in 0..4 {
            assert_eq!(system.lhs[(i, i)], 0.0);
        }
        // gamma(h) = h for this model
        assert!((system.lhs[(0, 1)] - 1.0).abs() < 1e-15);
        assert!((system.lhs[(0, 2)] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn assembled_system_is_exactly_symmetric() {
        let points = sample_points();
        let model = gaussian();
        let settings = EstimatorSettings::new(KrigingVariant::Universal { degree: 2 }, 2, &model).unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        let approx_eq = CwiseMat(ApproxEq::eps());
        let transposed = system.lhs.transpose().to_owned();
        assert!(&system.lhs ~ &transposed);
    }

    #[test]
    fn ordinary_border_is_ones_with_zero_corner() {
        let points = sample_points();
        let model = gaussian();
        let settings = EstimatorSettings::new(KrigingVariant::Ordinary, 2, &model).unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        assert_eq!(system.lhs.nrows(), 5);
        for i in 0..4 {
            assert_eq!(system.lhs[(i, 4)], 1.0);
            assert_eq!(system.lhs[(4, i)], 1.0);
        }
        assert_eq!(system.lhs[(4, 4)], 0.0);
    }

    #[test]
    fn universal_border_holds_monomials_in_descending_degree_order() {
        let points = sample_points();
        let model = gaussian();
        let settings = EstimatorSettings::new(KrigingVariant::Universal { degree: 1 }, 2, &model).unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        // Exponent rows for degree 1 in 2D: [0,1], [1,0], [0,0].
        let exponents = settings.exponents();
        assert_eq!(exponents.len(), 3);
        assert_eq!(exponents[2], vec![0, 0]);

        for (c, exponent) in exponents.iter().enumerate() {
            for i in 0..4 {
                let expected = evaluate_monomial(points.row(i), exponent);
                assert_eq!(system.lhs[(i, 4 + c)], expected);
                assert_eq!(system.lhs[(4 + c, i)], expected);
            }
        }
        // Constraint corner block is zero.
        for a in 4..7 {
            for b in 4..7 {
                assert_eq!(system.lhs[(a, b)], 0.0);
            }
        }
    }

    #[test]
    fn external_drift_border_evaluates_the_covariates() {
        let points = sample_points();
        let model = gaussian();
        let constant: DriftFunction = Arc::new(|_| 1.0);
        let east: DriftFunction = Arc::new(|p: faer::RowRef<'_, f64>| p[0]);
        let settings = EstimatorSettings::new(
            KrigingVariant::ExternalDrift { drifts: vec![constant, east] },
            2,
            &model,
        )
        .unwrap();

        let system = KrigingSystem::assemble(&settings, points.as_ref(), &model);

        for i in 0..4 {
            assert_eq!(system.lhs[(i, 4)], 1.0);
            assert_eq!(system.lhs[(i, 5)], points[(i, 0)]);
        }
    }

    #[test]
    fn rhs_carries_transformed_gamma_and_constraint_slice() {
        let points = sample_points();
        let model = gaussian();
        let settings = EstimatorSettings::new(KrigingVariant::Universal { degree: 1 }, 2, &model).unwrap();

        let query = mat![[0.5, 0.5f64]];
        let mut rhs = Mat::<f64>::zeros(7, 1);
        KrigingSystem::fill_rhs(&settings, points.as_ref(), &model, query.row(0), &mut rhs);

        for i in 0..4 {
            let gamma = model.evaluate(points.row(i), query.row(0));
            assert!((rhs[(i, 0)] - (2.0 - gamma)).abs() < 1e-15);
        }
        // Constraint slice: monomials at the query, descending total degree.
        assert_eq!(rhs[(4, 0)], 0.5); // y
        assert_eq!(rhs[(5, 0)], 0.5); // x
        assert_eq!(rhs[(6, 0)], 1.0); // 1
    }
}

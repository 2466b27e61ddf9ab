/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the fitted Kriging estimator: factorisation ownership, weights, and predictions.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # estimator
//!
//! One fitted Kriging estimator per observation set. `fit` assembles and
//! factorises the system; `predict` maps query locations to
//! (mean, variance) pairs by solving against the stored factorisation.

use crate::{
    estimator_config::{EstimatorSettings, KrigingVariant},
    linalg::{FactorizationError, SystemFactor},
    system::KrigingSystem,
};
use faer::{Col, ColRef, Mat, MatRef, RowRef};
use ferreus_krige_utils::VariogramFunction;

/// A single Kriging prediction.
///
/// The variance is reported exactly as computed: floating-point cancellation
/// can leave it marginally negative and no clamping is applied.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub mean: f64,
    pub variance: f64,
}

/// Interpolation weights and Lagrange multipliers for one query location.
///
/// `lambda` has one entry per observation; `nu` one per constraint (empty
/// for Simple Kriging). Produced on demand and not retained.
#[derive(Debug, Clone)]
pub struct KrigingWeights {
    pub lambda: Col<f64>,
    pub nu: Col<f64>,
}

/// A Kriging estimator fitted to one observation set.
///
/// Borrows the observation coordinates and values, owns the factorisation
/// and an RHS scratch buffer sized `n_obs + n_constraints`.
pub struct FittedEstimator<'a> {
    settings: &'a EstimatorSettings,
    model: &'a dyn VariogramFunction,
    points: MatRef<'a, f64>,
    values: ColRef<'a, f64>,
    factor: SystemFactor,
    n_obs: usize,
    n_constraints: usize,
    rhs: Mat<f64>,
}

impl<'a> FittedEstimator<'a> {
    /// Assembles and factorises the Kriging system over the given
    /// observations.
    ///
    /// This is an O(n^3) operation in the number of observations. Exact
    /// estimation pays it once per variable; neighbour-restricted estimation
    /// and sequential simulation pay it once **per query location**, which
    /// makes this call the dominant cost of those modes.
    ///
    /// A numerically singular or non-SPD system is reported through the
    /// returned status; nothing panics.
    pub fn fit(
        settings: &'a EstimatorSettings,
        model: &'a dyn VariogramFunction,
        points: MatRef<'a, f64>,
        values: ColRef<'a, f64>,
    ) -> Result<Self, FactorizationError> {
        debug_assert_eq!(points.nrows(), values.nrows());

        let system = KrigingSystem::assemble(settings, points, model);

        let factor = match &settings.variant {
            KrigingVariant::Simple { .. } => SystemFactor::cholesky(system.lhs.as_ref())?,
            _ => SystemFactor::symmetric_indefinite(system.lhs.as_ref())?,
        };

        let dim = system.n_obs + system.n_constraints;

        Ok(Self {
            settings,
            model,
            points,
            values,
            factor,
            n_obs: system.n_obs,
            n_constraints: system.n_constraints,
            rhs: Mat::zeros(dim, 1),
        })
    }

    /// Number of observations this estimator was fitted to.
    pub fn num_observations(&self) -> usize {
        self.n_obs
    }

    /// Allocates an RHS buffer of the right shape for [`Self::predict_with`].
    pub fn rhs_buffer(&self) -> Mat<f64> {
        Mat::zeros(self.n_obs + self.n_constraints, 1)
    }

    /// Predicts mean and variance at one query location using the internal
    /// RHS buffer.
    pub fn predict(&mut self, query: RowRef<'_, f64>) -> Prediction {
        let mut rhs = std::mem::replace(&mut self.rhs, Mat::new());
        let prediction = self.predict_with(query, &mut rhs);
        self.rhs = rhs;
        prediction
    }

    /// Predicts mean and variance at one query location using a
    /// caller-supplied RHS buffer.
    ///
    /// This is the path for concurrent prediction: the estimator itself is
    /// shared read-only and each worker owns its own buffer (see
    /// [`Self::rhs_buffer`]).
    pub fn predict_with(&self, query: RowRef<'_, f64>, rhs: &mut Mat<f64>) -> Prediction {
        KrigingSystem::fill_rhs(self.settings, self.points, self.model, query, rhs);
        let solution = self.factor.solve(rhs);
        self.combine(rhs, &solution)
    }

    /// Returns the interpolation weights and Lagrange multipliers for one
    /// query location.
    pub fn weights(&mut self, query: RowRef<'_, f64>) -> KrigingWeights {
        let mut rhs = std::mem::replace(&mut self.rhs, Mat::new());
        KrigingSystem::fill_rhs(self.settings, self.points, self.model, query, &mut rhs);
        let solution = self.factor.solve(&rhs);
        self.rhs = rhs;

        KrigingWeights {
            lambda: Col::from_fn(self.n_obs, |i| solution[(i, 0)]),
            nu: Col::from_fn(self.n_constraints, |c| solution[(self.n_obs + c, 0)]),
        }
    }

    /// Combines the solved weights with the observation values per variant.
    fn combine(&self, rhs: &Mat<f64>, solution: &Mat<f64>) -> Prediction {
        let n = self.n_obs;
        let m = self.n_constraints;

        let lambda_dot_cov: f64 = (0..n).map(|i| solution[(i, 0)] * rhs[(i, 0)]).sum();
        let nu_dot_constraint: f64 = (n..n + m).map(|i| solution[(i, 0)] * rhs[(i, 0)]).sum();

        match &self.settings.variant {
            KrigingVariant::Simple { mean } => {
                let mut estimate = *mean;
                for i in 0..n {
                    estimate += solution[(i, 0)] * (self.values[i] - mean);
                }
                Prediction {
                    mean: estimate,
                    variance: self.model.sill() - lambda_dot_cov,
                }
            }
            _ => {
                let estimate: f64 = (0..n).map(|i| solution[(i, 0)] * self.values[i]).sum();
                let variance = match self.model.is_stationary() {
                    true => self.model.sill() - (lambda_dot_cov + nu_dot_constraint),
                    false => lambda_dot_cov + nu_dot_constraint,
                };
                Prediction {
                    mean: estimate,
                    variance,
                }
            }
        }
    }
}

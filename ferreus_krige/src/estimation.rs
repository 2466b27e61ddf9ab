/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the main Kriging interpolator, preprocessing, and the estimation solver loops.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{KrigingConfig, ResolvedConfig, SolveMode},
    estimator::FittedEstimator,
    estimator_config::ConfigurationError,
    kdtree::{DistanceMetric, KDTree},
    neighborhood::NeighborFinder,
    progress::{ProgressMsg, ProgressSink},
};
use faer::{Col, Mat};
use ferreus_krige_utils::{VariogramFunction, get_pointarray_extents, select_mat_rows};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Estimation output over one set of target locations.
///
/// Both matrices are aligned with the target enumeration order and carry one
/// column per variable. Locations the solver could not resolve (too few
/// neighbours, failed factorisation) hold `f64::NAN` in both.
#[derive(Debug, Clone)]
pub struct EstimationResult {
    pub means: Mat<f64>,
    pub variances: Mat<f64>,
}

/// Convenience builder for constructing a [`KrigingInterpolator`].
///
/// The builder should be called via the [`KrigingInterpolator::builder`] method.
pub struct KrigingInterpolatorBuilder {
    points: Mat<f64>,
    point_values: Mat<f64>,
    model: Arc<dyn VariogramFunction>,
    configs: Vec<KrigingConfig>,
    progress_callback: Option<Arc<dyn ProgressSink>>,
    test_unique: bool,
}

impl KrigingInterpolatorBuilder {
    fn new(points: Mat<f64>, point_values: Mat<f64>, model: Arc<dyn VariogramFunction>) -> Self {
        Self {
            points,
            point_values,
            model,
            configs: Vec::new(),
            progress_callback: None,
            test_unique: true,
        }
    }

    /// Applies one configuration to every variable (value column).
    pub fn config(mut self, config: KrigingConfig) -> Self {
        self.configs = vec![config];
        self
    }

    /// Applies one configuration per variable, in column order.
    pub fn variable_configs(mut self, configs: Vec<KrigingConfig>) -> Self {
        self.configs = configs;
        self
    }

    /// Optional callback for reporting solver progress.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Enables or disables duplicate-location screening.
    pub fn test_unique(mut self, test_unique: bool) -> Self {
        self.test_unique = test_unique;
        self
    }

    /// Validates the configuration and returns the interpolator.
    pub fn build(self) -> Result<KrigingInterpolator, ConfigurationError> {
        KrigingInterpolator::new(
            self.points,
            self.point_values,
            self.model,
            self.configs,
            self.progress_callback,
            self.test_unique,
        )
    }
}

/// Kriging estimation and conditional simulation over a fixed observation set.
///
/// Holds the observation coordinates (one row per location), the per-variable
/// values (one column per variable, `f64::NAN` marking missing entries), the
/// shared variogram model, and the per-variable plans resolved once at
/// construction.
pub struct KrigingInterpolator {
    /// Coordinates of the observation locations.
    pub points: Mat<f64>,

    /// Observed values, one column per variable. `NaN` entries are treated
    /// as missing and excluded from that variable's fits.
    pub point_values: Mat<f64>,

    pub(crate) model: Arc<dyn VariogramFunction>,
    pub(crate) resolved: Vec<ResolvedConfig>,
    pub(crate) progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl KrigingInterpolator {
    /// Creates a new [`KrigingInterpolatorBuilder`] for the given
    /// observations and variogram model.
    ///
    /// This is the way to construct an interpolator.
    pub fn builder(
        points: Mat<f64>,
        point_values: Mat<f64>,
        model: Arc<dyn VariogramFunction>,
    ) -> KrigingInterpolatorBuilder {
        KrigingInterpolatorBuilder::new(points, point_values, model)
    }

    fn new(
        points: Mat<f64>,
        point_values: Mat<f64>,
        model: Arc<dyn VariogramFunction>,
        configs: Vec<KrigingConfig>,
        progress_callback: Option<Arc<dyn ProgressSink>>,
        test_unique: bool,
    ) -> Result<Self, ConfigurationError> {
        assert_eq!(
            points.nrows(),
            point_values.nrows(),
            "points and point_values must have the same number of rows"
        );

        let dimensions = points.ncols();
        let num_variables = point_values.ncols();

        // Broadcast a single config (or the default) across all variables.
        let configs = match configs.len() {
            0 => vec![KrigingConfig::default(); num_variables],
            1 => vec![configs[0].clone(); num_variables],
            n => {
                assert_eq!(n, num_variables, "one config per value column expected");
                configs
            }
        };

        let resolved = configs
            .iter()
            .map(|config| config.resolve(dimensions, &*model))
            .collect::<Result<Vec<_>, _>>()?;

        let (points, point_values) = if test_unique {
            let keep = remove_duplicates(&points, &*model);

            if keep.len() == points.nrows() {
                (points, point_values)
            } else {
                if let Some(sink) = &progress_callback {
                    sink.emit(ProgressMsg::DuplicatesRemoved {
                        num_duplicates: points.nrows() - keep.len(),
                    });
                }
                (
                    select_mat_rows(&points, &keep),
                    select_mat_rows(&point_values, &keep),
                )
            }
        } else {
            (points, point_values)
        };

        Ok(Self {
            points,
            point_values,
            model,
            resolved,
            progress_callback,
        })
    }

    /// Estimates every variable at every target location.
    ///
    /// Exact mode (unrestricted neighbourhood) fits one global system per
    /// variable, O(n^3 + L n^2). Approximate mode performs a fresh
    /// neighbour-restricted fit per location, O(L k^3); the per-location
    /// factorisation is the dominant cost.
    ///
    /// Locations are processed in the target enumeration order and in
    /// parallel; every worker owns its private scratch buffers.
    pub fn estimate(&self, target_points: &Mat<f64>) -> EstimationResult {
        assert_eq!(
            target_points.ncols(),
            self.points.ncols(),
            "target dimensionality must match the observations"
        );

        let num_targets = target_points.nrows();
        let num_variables = self.point_values.ncols();

        let mut means = Mat::from_fn(num_targets, num_variables, |_, _| f64::NAN);
        let mut variances = Mat::from_fn(num_targets, num_variables, |_, _| f64::NAN);

        for variable in 0..num_variables {
            let plan = &self.resolved[variable];

            // Per-variable missing-value support: NaN observations drop out.
            let valid: Vec<usize> = (0..self.points.nrows())
                .filter(|&i| self.point_values[(i, variable)].is_finite())
                .collect();

            let obs_points = select_mat_rows(&self.points, &valid);
            let obs_values = Col::from_fn(valid.len(), |i| self.point_values[(valid[i], variable)]);

            let column = match plan.mode() {
                SolveMode::Exact => self.estimate_exact(
                    plan,
                    variable,
                    &obs_points,
                    &obs_values,
                    target_points,
                ),
                SolveMode::Approximate(spec) => {
                    let finder = NeighborFinder::new(&obs_points, spec, plan.max_neighbors);
                    self.estimate_approximate(plan, &finder, &obs_points, &obs_values, target_points)
                }
            };

            for (i, prediction) in column.iter().enumerate() {
                means[(i, variable)] = prediction.0;
                variances[(i, variable)] = prediction.1;
            }

            if let Some(sink) = &self.progress_callback {
                sink.emit(ProgressMsg::VariableEstimated {
                    variable,
                    num_variables,
                });
            }
        }

        EstimationResult { means, variances }
    }

    /// Exact loop: one global fit, shared across the parallel prediction pass.
    fn estimate_exact(
        &self,
        plan: &ResolvedConfig,
        variable: usize,
        obs_points: &Mat<f64>,
        obs_values: &Col<f64>,
        target_points: &Mat<f64>,
    ) -> Vec<(f64, f64)> {
        let num_targets = target_points.nrows();

        if obs_points.nrows() < plan.min_neighbors {
            return vec![(f64::NAN, f64::NAN); num_targets];
        }

        let fitted = match FittedEstimator::fit(
            &plan.settings,
            &*self.model,
            obs_points.as_ref(),
            obs_values.as_ref(),
        ) {
            Ok(fitted) => fitted,
            Err(status) => {
                // A failed global factorisation loses the whole variable.
                if let Some(sink) = &self.progress_callback {
                    sink.emit(ProgressMsg::Message {
                        message: format!(
                            "global Kriging fit failed for variable {}: {:?}",
                            variable, status
                        ),
                    });
                }
                return vec![(f64::NAN, f64::NAN); num_targets];
            }
        };

        (0..num_targets)
            .into_par_iter()
            .map_init(
                || fitted.rhs_buffer(),
                |rhs, i| {
                    let prediction = fitted.predict_with(target_points.row(i), rhs);
                    (prediction.mean, prediction.variance)
                },
            )
            .collect()
    }

    /// Approximate loop: per-location neighbour query and fresh local fit.
    fn estimate_approximate(
        &self,
        plan: &ResolvedConfig,
        finder: &NeighborFinder,
        obs_points: &Mat<f64>,
        obs_values: &Col<f64>,
        target_points: &Mat<f64>,
    ) -> Vec<(f64, f64)> {
        let min_neighbors = plan.min_neighbors;

        (0..target_points.nrows())
            .into_par_iter()
            .map_init(
                || Vec::<usize>::new(),
                |neighbor_buffer, i| {
                    let query = target_points.row(i);

                    finder.find(query, neighbor_buffer);
                    if neighbor_buffer.len() < min_neighbors {
                        return (f64::NAN, f64::NAN);
                    }

                    let local_points = select_mat_rows(obs_points, neighbor_buffer);
                    let local_values =
                        Col::from_fn(neighbor_buffer.len(), |j| obs_values[neighbor_buffer[j]]);

                    match FittedEstimator::fit(
                        &plan.settings,
                        &*self.model,
                        local_points.as_ref(),
                        local_values.as_ref(),
                    ) {
                        Ok(mut fitted) => {
                            let prediction = fitted.predict(query);
                            (prediction.mean, prediction.variance)
                        }
                        // Degenerate local systems skip this location only.
                        Err(_) => (f64::NAN, f64::NAN),
                    }
                },
            )
            .collect()
    }
}

/// Estimate a duplicate cutoff distance for this variogram model.
///
/// Probes the model response near zero lag and scales the cutoff so that
/// `|gamma(r) - gamma(0+)|` rises above machine epsilon relative to the
/// response at `h_ref`. Locations closer than this are indistinguishable to
/// the model and make the assembled systems rank deficient.
///
/// Returns a cutoff distance in `[0, h_ref]`.
fn duplicate_cutoff_distance(h_ref: f64, model: &dyn VariogramFunction) -> f64 {
    let dims = 1usize;
    let origin = Mat::<f64>::zeros(1, dims);

    let gamma_at = |r: f64| {
        let probe = Mat::<f64>::from_fn(1, dims, |_, _| r);
        model.evaluate(probe.row(0), origin.row(0))
    };

    let eps = f64::EPSILON;
    let mut rtol = 1E-12;

    let gamma0 = gamma_at(0.0);
    let gamma_ref = gamma_at(h_ref);
    let target = eps * (gamma_ref - gamma0).abs();

    let resid = |r| (gamma_at(r) - gamma0).abs() - target;

    // If the reference point already meets the target, just return h_ref.
    if resid(h_ref) <= 0.0 {
        return h_ref;
    }

    match roots::find_root_inverse_quadratic(0.0, h_ref, resid, &mut rtol) {
        Ok(r) => r,
        _ => h_ref,
    }
}

/// Remove duplicate or near-duplicate observation locations.
///
/// Groups points within the model-derived cutoff radius using an
/// infinity-norm KD-tree sweep and keeps the first point of each group.
///
/// Returns the indices of the points to keep, in enumeration order.
fn remove_duplicates(points: &Mat<f64>, model: &dyn VariogramFunction) -> Vec<usize> {
    if points.nrows() == 0 {
        return Vec::new();
    }

    let dims = points.ncols();
    let extents = get_pointarray_extents(points);
    let mins = &extents[..dims];
    let maxs = &extents[dims..];
    let max_length = maxs
        .iter()
        .zip(mins.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(f64::NEG_INFINITY, f64::max);

    let cutoff = duplicate_cutoff_distance(max_length, model);

    let kdtree = KDTree::new(points);

    let mut visited = HashSet::new();
    let mut keep = Vec::new();

    for i in 0..points.nrows() {
        if visited.contains(&i) {
            continue;
        }

        let group = kdtree.within_radius(points.row(i), cutoff, DistanceMetric::InfinityNorm);

        keep.push(i);
        visited.extend(group);
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KrigingConfig;
    use crate::neighborhood::NeighborhoodSpec;
    use ferreus_krige_utils::models::GaussianVariogram;

    fn step_data() -> (Mat<f64>, Mat<f64>, Arc<dyn VariogramFunction>) {
        // Data sites sit on grid nodes 25, 50, and 75 of a 100-node line.
        let points = Mat::from_fn(3, 1, |i, _| 25.0 + 25.0 * i as f64);
        let values = Mat::from_fn(3, 1, |i, _| if i == 1 { 0.0 } else { 1.0 });
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 35.0, sill: 1.0, nugget: 0.0 });
        (points, values, model)
    }

    fn line_grid(n: usize) -> Mat<f64> {
        Mat::from_fn(n, 1, |i, _| i as f64)
    }

    #[test]
    fn step_pattern_reproduced_by_global_kriging() {
        let (points, values, model) = step_data();
        let interpolator = KrigingInterpolator::builder(points, values, model)
            .build()
            .unwrap();

        let result = interpolator.estimate(&line_grid(100));

        assert!((result.means[(25, 0)] - 1.0).abs() < 1e-6);
        assert!((result.means[(50, 0)] - 0.0).abs() < 1e-6);
        assert!((result.means[(75, 0)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn step_pattern_reproduced_by_nearest_neighbor_kriging() {
        let (points, values, model) = step_data();
        let interpolator = KrigingInterpolator::builder(points, values, model)
            .config(KrigingConfig::builder().max_neighbors(3).build())
            .build()
            .unwrap();

        let result = interpolator.estimate(&line_grid(100));

        assert!((result.means[(25, 0)] - 1.0).abs() < 1e-6);
        assert!((result.means[(50, 0)] - 0.0).abs() < 1e-6);
        assert!((result.means[(75, 0)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn step_pattern_reproduced_by_windowed_kriging() {
        let (points, values, model) = step_data();
        let interpolator = KrigingInterpolator::builder(points, values, model)
            .config(
                KrigingConfig::builder()
                    .neighborhood(NeighborhoodSpec::Window { half_widths: vec![30.0] })
                    .build(),
            )
            .build()
            .unwrap();

        let result = interpolator.estimate(&line_grid(100));

        assert!((result.means[(25, 0)] - 1.0).abs() < 1e-6);
        assert!((result.means[(50, 0)] - 0.0).abs() < 1e-6);
        assert!((result.means[(75, 0)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn variance_vanishes_at_data_and_grows_away_from_it() {
        let (points, values, model) = step_data();
        let interpolator = KrigingInterpolator::builder(points, values, model)
            .build()
            .unwrap();

        let result = interpolator.estimate(&line_grid(100));

        assert!(result.variances[(25, 0)].abs() < 1e-6);
        assert!(result.variances[(0, 0)] > result.variances[(26, 0)]);
    }

    #[test]
    fn missing_observations_are_excluded_per_variable() {
        let points = Mat::from_fn(4, 1, |i, _| 10.0 * i as f64);
        let mut values = Mat::from_fn(4, 1, |i, _| i as f64);
        values[(2, 0)] = f64::NAN;
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 30.0, sill: 1.0, nugget: 0.0 });

        let interpolator = KrigingInterpolator::builder(points.clone(), values, model)
            .build()
            .unwrap();

        let result = interpolator.estimate(&points);

        // The remaining observations still interpolate exactly.
        assert!((result.means[(0, 0)] - 0.0).abs() < 1e-6);
        assert!((result.means[(1, 0)] - 1.0).abs() < 1e-6);
        assert!((result.means[(3, 0)] - 3.0).abs() < 1e-6);
        // The dropped site predicts from its neighbours, not its own value.
        assert!(result.means[(2, 0)].is_finite());
    }

    #[test]
    fn insufficient_neighbors_yield_missing_sentinels() {
        let points = Mat::from_fn(3, 1, |i, _| i as f64);
        let values = Mat::from_fn(3, 1, |i, _| i as f64);
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 5.0, sill: 1.0, nugget: 0.0 });

        let interpolator = KrigingInterpolator::builder(points, values, model)
            .config(
                KrigingConfig::builder()
                    .min_neighbors(2)
                    .neighborhood(NeighborhoodSpec::Ball { radius: 1.5 })
                    .build(),
            )
            .build()
            .unwrap();

        let targets = Mat::from_fn(2, 1, |i, _| [1.0, 40.0][i]);
        let result = interpolator.estimate(&targets);

        assert!(result.means[(0, 0)].is_finite());
        assert!(result.means[(1, 0)].is_nan());
        assert!(result.variances[(1, 0)].is_nan());
    }

    #[test]
    fn failed_global_factorization_loses_the_variable_without_panicking() {
        // Exact duplicates with screening disabled make the system singular.
        let points = Mat::from_fn(3, 1, |i, _| [0.0, 0.0, 5.0][i]);
        let values = Mat::from_fn(3, 1, |i, _| i as f64);
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 5.0, sill: 1.0, nugget: 0.0 });

        let interpolator = KrigingInterpolator::builder(points, values, model)
            .test_unique(false)
            .build()
            .unwrap();

        let result = interpolator.estimate(&line_grid(4));

        for i in 0..4 {
            assert!(result.means[(i, 0)].is_nan());
            assert!(result.variances[(i, 0)].is_nan());
        }
    }

    #[test]
    fn duplicate_screening_keeps_first_of_each_cluster() {
        let points = Mat::from_fn(4, 1, |i, _| [0.0, 0.0, 5.0, 10.0][i]);
        let values = Mat::from_fn(4, 1, |i, _| [1.0, 2.0, 3.0, 4.0][i]);
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 10.0, sill: 1.0, nugget: 0.0 });

        let interpolator = KrigingInterpolator::builder(points, values, model)
            .build()
            .unwrap();

        assert_eq!(interpolator.points.nrows(), 3);
        assert_eq!(interpolator.point_values[(0, 0)], 1.0);

        // The deduplicated dataset still solves.
        let result = interpolator.estimate(&line_grid(11));
        assert!((result.means[(5, 0)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn per_variable_configs_run_independently() {
        let points = Mat::from_fn(5, 1, |i, _| 5.0 * i as f64);
        let values = Mat::from_fn(5, 1, |i, _| 0.5 * i as f64 + 1.0);
        let two_vars = Mat::from_fn(5, 2, |i, j| values[(i, 0)] + j as f64);
        let model: Arc<dyn VariogramFunction> =
            Arc::new(GaussianVariogram { range: 20.0, sill: 1.0, nugget: 0.0 });

        let interpolator = KrigingInterpolator::builder(points.clone(), two_vars, model)
            .variable_configs(vec![
                KrigingConfig::default(),
                KrigingConfig::builder().polynomial_degree(1).max_neighbors(4).build(),
            ])
            .build()
            .unwrap();

        let result = interpolator.estimate(&points);

        for i in 0..5 {
            assert!((result.means[(i, 0)] - (0.5 * i as f64 + 1.0)).abs() < 1e-6);
            assert!((result.means[(i, 1)] - (0.5 * i as f64 + 2.0)).abs() < 1e-6);
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for Kriging estimation and simulation.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Kriging estimation and sequential Gaussian simulation.
//!
//! Kriging is the best linear unbiased spatial estimator: interpolation
//! weights are derived from a variogram (semivariance) model of the field
//! rather than from distributional assumptions. This crate implements the
//! shared linear-system engine behind four estimator variants and the two
//! solver loops built on top of it:
//!
//! - **Simple Kriging** (known mean, Cholesky-factorised covariance system)
//! - **Ordinary Kriging** (weights constrained to sum to one)
//! - **Universal Kriging** (polynomial-drift unbiasedness up to a degree)
//! - **External-Drift Kriging** (arbitrary user-supplied drift covariates)
//!
//! Estimation runs either **exact** (one global fit per variable, every
//! observation participates) or **approximate** (a fresh fit per target
//! location over a nearest/ball/window neighbourhood), and **sequential
//! Gaussian simulation** draws conditional realizations along a random path
//! where every simulated location immediately conditions the ones after it.
//!
//! # Features
//! - Supports 1D, 2D, and 3D input domains
//! - Variogram models supplied by the companion [`ferreus_krige_utils`] crate
//! - Parallel estimation loops and parallel independent realizations
//! - Per-variable configuration with missing-value support
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear algebra,
//!   avoiding complex build dependencies
//!
//! # Examples
//!
//! ```
//! use ferreus_krige::{KrigingConfig, KrigingInterpolator, create_evaluation_grid};
//! use ferreus_krige_utils::{VariogramFunction, models::GaussianVariogram};
//! use faer::Mat;
//! use std::sync::Arc;
//!
//! // Three observations on a 100-node line with a step pattern.
//! let points = Mat::from_fn(3, 1, |i, _| 25.0 + 25.0 * i as f64);
//! let values = Mat::from_fn(3, 1, |i, _| if i == 1 { 0.0 } else { 1.0 });
//!
//! let model: Arc<dyn VariogramFunction> =
//!     Arc::new(GaussianVariogram { range: 35.0, sill: 1.0, nugget: 0.0 });
//!
//! // Ordinary Kriging restricted to the 3 nearest neighbours.
//! let interpolator = KrigingInterpolator::builder(points, values, model)
//!     .config(KrigingConfig::builder().max_neighbors(3).build())
//!     .build()?;
//!
//! let targets = create_evaluation_grid(&[(0.0, 99.0)], &[100]);
//! let result = interpolator.estimate(&targets);
//!
//! // The data values are reproduced at their grid nodes.
//! assert!((result.means[(25, 0)] - 1.0).abs() < 1e-6);
//! assert!((result.means[(50, 0)] - 0.0).abs() < 1e-6);
//! assert!((result.means[(75, 0)] - 1.0).abs() < 1e-6);
//! # Ok::<(), ferreus_krige::ConfigurationError>(())
//! ```
pub mod estimator_config;

pub mod config;

mod common;

mod estimation;

mod estimator;

mod kdtree;

mod linalg;

mod neighborhood;

mod rtree;

mod simulation;

mod system;

pub mod progress;

pub use {
    common::{
        create_evaluation_grid, csv_to_point_arrays, estimation_to_csv, generate_random_points,
    },
    config::{KrigingConfig, KrigingConfigBuilder, SimulationParams, SimulationParamsBuilder},
    estimation::{EstimationResult, KrigingInterpolator, KrigingInterpolatorBuilder},
    estimator::{FittedEstimator, KrigingWeights, Prediction},
    estimator_config::{
        ConfigurationError, DriftFunction, EstimatorSettings, KrigingVariant,
    },
    kdtree::{DistanceMetric, KDTree},
    linalg::{FactorizationError, SystemFactor},
    neighborhood::NeighborhoodSpec,
};

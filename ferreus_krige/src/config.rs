/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares per-variable configuration, precedence resolution, and simulation parameters.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares per-variable configuration, precedence resolution, and simulation parameters.

use crate::estimator_config::{
    ConfigurationError, DriftFunction, EstimatorSettings, KrigingVariant,
};
use crate::neighborhood::NeighborhoodSpec;
use ferreus_krige_utils::VariogramFunction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-variable Kriging configuration.
///
/// The estimator variant is chosen by precedence, highest first:
/// drift functions, then polynomial degree, then a known mean, then the
/// Ordinary Kriging default. The chain is resolved exactly once during
/// preprocessing, never re-evaluated inside the solve loops.
#[derive(Clone)]
pub struct KrigingConfig {
    /// Known field mean; resolves to Simple Kriging.
    pub mean: Option<f64>,

    /// Polynomial drift degree; resolves to Universal Kriging.
    pub polynomial_degree: Option<i32>,

    /// External drift covariates; resolves to External-Drift Kriging.
    pub drifts: Option<Vec<DriftFunction>>,

    /// Minimum neighbour count below which a location is left unresolved
    /// (estimation) or drawn unconditionally (simulation).
    pub min_neighbors: usize,

    /// Upper bound on participating neighbours. `None` means unrestricted,
    /// i.e. exact estimation with a single global fit.
    pub max_neighbors: Option<usize>,

    /// Neighbourhood selection rule for approximate estimation. Defaults to
    /// nearest-`max_neighbors` when only a bound is given.
    pub neighborhood: Option<NeighborhoodSpec>,
}

impl fmt::Debug for KrigingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrigingConfig")
            .field("mean", &self.mean)
            .field("polynomial_degree", &self.polynomial_degree)
            .field("num_drifts", &self.drifts.as_ref().map(Vec::len))
            .field("min_neighbors", &self.min_neighbors)
            .field("max_neighbors", &self.max_neighbors)
            .field("neighborhood", &self.neighborhood)
            .finish()
    }
}

impl Default for KrigingConfig {
    fn default() -> Self {
        KrigingConfig::builder().build()
    }
}

impl KrigingConfig {
    /// Returns a new [`KrigingConfigBuilder`] with defaults (Ordinary
    /// Kriging, one required neighbour, unrestricted neighbourhood).
    pub fn builder() -> KrigingConfigBuilder {
        KrigingConfigBuilder {
            mean: None,
            polynomial_degree: None,
            drifts: None,
            min_neighbors: 1,
            max_neighbors: None,
            neighborhood: None,
        }
    }

    /// Resolves the precedence chain into a concrete, validated plan.
    pub(crate) fn resolve(
        &self,
        dimensions: usize,
        model: &dyn VariogramFunction,
    ) -> Result<ResolvedConfig, ConfigurationError> {
        let variant = if let Some(drifts) = &self.drifts {
            KrigingVariant::ExternalDrift { drifts: drifts.clone() }
        } else if let Some(degree) = self.polynomial_degree {
            KrigingVariant::Universal { degree }
        } else if let Some(mean) = self.mean {
            KrigingVariant::Simple { mean }
        } else {
            KrigingVariant::Ordinary
        };

        let settings = EstimatorSettings::new(variant, dimensions, model)?;

        Ok(ResolvedConfig {
            settings,
            min_neighbors: self.min_neighbors.max(1),
            max_neighbors: self.max_neighbors,
            neighborhood: self.neighborhood.clone(),
        })
    }
}

/// A convenience builder for constructing a [`KrigingConfig`] instance.
///
/// The builder should be called via the [`KrigingConfig::builder`] method.
#[derive(Clone)]
pub struct KrigingConfigBuilder {
    mean: Option<f64>,
    polynomial_degree: Option<i32>,
    drifts: Option<Vec<DriftFunction>>,
    min_neighbors: usize,
    max_neighbors: Option<usize>,
    neighborhood: Option<NeighborhoodSpec>,
}

impl KrigingConfigBuilder {
    /// Sets a known field mean (Simple Kriging).
    pub fn mean(mut self, mean: f64) -> Self {
        self.mean = Some(mean);
        self
    }

    /// Sets a polynomial drift degree (Universal Kriging).
    pub fn polynomial_degree(mut self, degree: i32) -> Self {
        self.polynomial_degree = Some(degree);
        self
    }

    /// Sets external drift covariates (External-Drift Kriging).
    pub fn drifts(mut self, drifts: Vec<DriftFunction>) -> Self {
        self.drifts = Some(drifts);
        self
    }

    /// Sets the minimum neighbour count.
    pub fn min_neighbors(mut self, min_neighbors: usize) -> Self {
        self.min_neighbors = min_neighbors;
        self
    }

    /// Sets the maximum neighbour count, switching to approximate mode.
    pub fn max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = Some(max_neighbors);
        self
    }

    /// Sets the neighbourhood selection rule, switching to approximate mode.
    pub fn neighborhood(mut self, neighborhood: NeighborhoodSpec) -> Self {
        self.neighborhood = Some(neighborhood);
        self
    }

    /// Builds and returns a [`KrigingConfig`] instance.
    pub fn build(self) -> KrigingConfig {
        KrigingConfig {
            mean: self.mean,
            polynomial_degree: self.polynomial_degree,
            drifts: self.drifts,
            min_neighbors: self.min_neighbors,
            max_neighbors: self.max_neighbors,
            neighborhood: self.neighborhood,
        }
    }
}

/// How one variable is solved over the target locations.
pub(crate) enum SolveMode {
    /// Single global fit over every valid observation.
    Exact,

    /// Fresh fit per location over a bounded neighbourhood.
    Approximate(NeighborhoodSpec),
}

/// One variable's resolved plan: concrete estimator settings plus the
/// neighbourhood bounds. Computed once before any location is visited.
pub(crate) struct ResolvedConfig {
    pub settings: EstimatorSettings,
    pub min_neighbors: usize,
    pub max_neighbors: Option<usize>,
    pub neighborhood: Option<NeighborhoodSpec>,
}

impl ResolvedConfig {
    pub fn mode(&self) -> SolveMode {
        match (&self.neighborhood, self.max_neighbors) {
            (Some(spec), _) => SolveMode::Approximate(spec.clone()),
            (None, Some(k)) => SolveMode::Approximate(NeighborhoodSpec::Nearest { k }),
            (None, None) => SolveMode::Exact,
        }
    }
}

/// Parameters for sequential Gaussian simulation.
///
/// A fixed `seed` together with the path-generation rule reproduces
/// bit-identical realizations run to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Number of independent realizations to generate.
    pub num_realizations: usize,

    /// Master seed; per-realization generators are derived from it.
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            num_realizations: 1,
            seed: 0,
        }
    }
}

impl SimulationParams {
    /// Returns a new [`SimulationParamsBuilder`].
    pub fn builder() -> SimulationParamsBuilder {
        SimulationParamsBuilder {
            num_realizations: 1,
            seed: 0,
        }
    }
}

/// Builder for [`SimulationParams`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationParamsBuilder {
    num_realizations: usize,
    seed: u64,
}

impl SimulationParamsBuilder {
    /// Sets the number of realizations.
    pub fn num_realizations(mut self, num_realizations: usize) -> Self {
        self.num_realizations = num_realizations;
        self
    }

    /// Sets the master seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds and returns a [`SimulationParams`] instance.
    pub fn build(self) -> SimulationParams {
        SimulationParams {
            num_realizations: self.num_realizations,
            seed: self.seed,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies the Kriging estimator variants and their construction-time validation.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies the Kriging estimator variants and their construction-time validation.

use faer::RowRef;
use ferreus_krige_utils::{VariogramFunction, cartesian_product};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A drift covariate evaluated at a location.
///
/// External-Drift Kriging takes an ordered list of these; the predictions are
/// unbiased when one of them is identically `1`.
pub type DriftFunction = Arc<dyn Fn(RowRef<'_, f64>) -> f64 + Send + Sync>;

/// The four Kriging estimator variants.
///
/// All variants share the fit/predict machinery and differ only in the
/// Lagrange constraints they inject into the system and in how weights are
/// combined into a prediction.
#[derive(Clone)]
pub enum KrigingVariant {
    /// Simple Kriging: the field mean is known and no unbiasedness
    /// constraint is imposed. Requires a stationary variogram.
    Simple { mean: f64 },

    /// Ordinary Kriging: a single constraint forces the weights to sum to 1.
    Ordinary,

    /// Universal Kriging: polynomial-drift unbiasedness up to the given
    /// degree, one constraint per monomial.
    Universal { degree: i32 },

    /// External-Drift Kriging: one constraint per user-supplied drift
    /// covariate.
    ExternalDrift { drifts: Vec<DriftFunction> },
}

impl fmt::Debug for KrigingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KrigingVariant::Simple { mean } => f.debug_struct("Simple").field("mean", mean).finish(),
            KrigingVariant::Ordinary => f.write_str("Ordinary"),
            KrigingVariant::Universal { degree } => {
                f.debug_struct("Universal").field("degree", degree).finish()
            }
            KrigingVariant::ExternalDrift { drifts } => f
                .debug_struct("ExternalDrift")
                .field("num_drifts", &drifts.len())
                .finish(),
        }
    }
}

/// Errors raised while validating estimator configuration, before any data
/// access happens.
#[derive(Debug)]
pub enum ConfigurationError {
    /// Universal Kriging was configured with a negative polynomial degree.
    NegativeDegree { degree: i32 },

    /// The spatial dimensionality is outside the supported 1-3 range.
    UnsupportedDimensions { dimensions: usize },

    /// Simple Kriging needs a stationary variogram to form its covariance
    /// matrix; the supplied model is non-stationary.
    NonStationaryVariogram,

    /// External-Drift Kriging was configured with no drift functions.
    EmptyDriftSet,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NegativeDegree { degree } => {
                write!(f, "polynomial drift degree must be non-negative, got {}", degree)
            }
            ConfigurationError::UnsupportedDimensions { dimensions } => {
                write!(f, "unsupported number of spatial dimensions: {}", dimensions)
            }
            ConfigurationError::NonStationaryVariogram => {
                write!(f, "Simple Kriging requires a stationary variogram model")
            }
            ConfigurationError::EmptyDriftSet => {
                write!(f, "External-Drift Kriging requires at least one drift function")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// A validated estimator variant bound to a spatial dimensionality.
///
/// For Universal Kriging the monomial exponent table is derived once here:
/// one row per monomial up to the requested degree, sorted by descending
/// total degree, which keeps the constraint block ordered for conditioning.
#[derive(Clone, Debug)]
pub struct EstimatorSettings {
    pub variant: KrigingVariant,
    pub dimensions: usize,
    exponents: Vec<Vec<u32>>,
}

impl EstimatorSettings {
    /// Validates the variant against the dimensionality and variogram model.
    ///
    /// Fails fast with a [`ConfigurationError`]; no observation data is
    /// touched here.
    pub fn new(
        variant: KrigingVariant,
        dimensions: usize,
        model: &dyn VariogramFunction,
    ) -> Result<Self, ConfigurationError> {
        if !(1..=3).contains(&dimensions) {
            return Err(ConfigurationError::UnsupportedDimensions { dimensions });
        }

        let exponents = match &variant {
            KrigingVariant::Simple { .. } => {
                if !model.is_stationary() {
                    return Err(ConfigurationError::NonStationaryVariogram);
                }
                Vec::new()
            }
            KrigingVariant::Ordinary => Vec::new(),
            KrigingVariant::Universal { degree } => {
                if *degree < 0 {
                    return Err(ConfigurationError::NegativeDegree { degree: *degree });
                }
                monomial_exponents(*degree as u32, dimensions)
            }
            KrigingVariant::ExternalDrift { drifts } => {
                if drifts.is_empty() {
                    return Err(ConfigurationError::EmptyDriftSet);
                }
                Vec::new()
            }
        };

        Ok(Self {
            variant,
            dimensions,
            exponents,
        })
    }

    /// Number of Lagrange constraints this variant appends to the system.
    pub fn num_constraints(&self) -> usize {
        match &self.variant {
            KrigingVariant::Simple { .. } => 0,
            KrigingVariant::Ordinary => 1,
            KrigingVariant::Universal { .. } => self.exponents.len(),
            KrigingVariant::ExternalDrift { drifts } => drifts.len(),
        }
    }

    /// The Universal Kriging exponent table; empty for the other variants.
    pub(crate) fn exponents(&self) -> &[Vec<u32>] {
        &self.exponents
    }
}

/// Evaluates the monomial `prod_d x_d^(e_d)` at a location.
#[inline(always)]
pub(crate) fn evaluate_monomial(point: RowRef<f64>, exponent: &[u32]) -> f64 {
    point
        .iter()
        .zip(exponent.iter())
        .map(|(x, e)| x.powi(*e as i32))
        .product()
}

/// All monomial exponent tuples up to `degree` over `dimensions` coordinates,
/// sorted by descending total degree.
fn monomial_exponents(degree: u32, dimensions: usize) -> Vec<Vec<u32>> {
    let powers: Vec<u32> = (0..=degree).collect();
    let table = cartesian_product(&powers, dimensions);

    let mut rows: Vec<Vec<u32>> = (0..table.nrows())
        .map(|i| (0..dimensions).map(|j| *table.get(i, j)).collect::<Vec<u32>>())
        .filter(|row| row.iter().sum::<u32>() <= degree)
        .collect();

    rows.sort_by_key(|row| std::cmp::Reverse(row.iter().sum::<u32>()));
    rows
}

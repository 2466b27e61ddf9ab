/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares traits for variogram models shared across the ferreus_krige crates.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::variogram_helpers::VariogramParams;
use faer::RowRef;

/// A variogram (semivariance) model evaluated between two locations.
///
/// Implementations must be safe to share across worker threads: the
/// estimation loops evaluate the same model concurrently from many
/// locations at once.
pub trait VariogramFunction: Send + Sync {
    /// Semivariance between the two locations.
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64;

    /// Whether the model depends only on the separation of the two
    /// locations. Stationary models can be converted to a covariance
    /// via `sill - gamma`.
    fn is_stationary(&self) -> bool;

    /// Asymptotic semivariance. Unbounded models report `f64::INFINITY`.
    fn sill(&self) -> f64;
}

/// Converts a shared [`VariogramParams`] configuration into a concrete model type.
pub trait VariogramFromParams: Sized {
    /// Constructs `Self` from a set of uniform variogram parameters.
    fn from_params(p: &VariogramParams) -> Self;
}

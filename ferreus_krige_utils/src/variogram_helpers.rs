/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring variogram models.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

use crate::variograms::{
    ExponentialVariogram, GaussianVariogram, PowerVariogram, SphericalVariogram,
};

/// The implemented variogram model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariogramType {
    Gaussian,
    Spherical,
    Exponential,
    Power,
}

/// Defines the [`VariogramType`] to use, along with its parameter values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VariogramParams {
    /// VariogramType enum variant to use.
    pub variogram_type: VariogramType,

    /// Practical range: the lag at which the structured part of the model
    /// has essentially reached the sill. Ignored by the power model.
    pub range: f64,

    /// Total sill of the model. For the power model this is the scaling
    /// coefficient of `h^exponent` instead.
    pub sill: f64,

    /// Semivariance discontinuity at zero lag.
    pub nugget: f64,

    /// Power-law exponent in `(0, 2)`. Only used by the power model.
    pub exponent: f64,
}

impl VariogramParams {
    /// Begins building a [`VariogramParams`] instance for the given model type.
    pub fn builder(variogram_type: VariogramType) -> VariogramParamsBuilder {
        VariogramParamsBuilder {
            variogram_type,
            range: 1.0,
            sill: 1.0,
            nugget: 0.0,
            exponent: 1.0,
        }
    }
}

/// Builder for [`VariogramParams`] that provides sensible defaults.
#[derive(Debug, Clone, Copy)]
pub struct VariogramParamsBuilder {
    variogram_type: VariogramType,
    range: f64,
    sill: f64,
    nugget: f64,
    exponent: f64,
}

impl VariogramParamsBuilder {
    /// Sets the `range` parameter on the builder.
    pub fn range(mut self, v: f64) -> Self {
        self.range = v;
        self
    }

    /// Sets the `sill` parameter on the builder.
    pub fn sill(mut self, v: f64) -> Self {
        self.sill = v;
        self
    }

    /// Sets the `nugget` parameter on the builder.
    pub fn nugget(mut self, v: f64) -> Self {
        self.nugget = v;
        self
    }

    /// Sets the `exponent` parameter on the builder.
    pub fn exponent(mut self, v: f64) -> Self {
        self.exponent = v;
        self
    }

    /// Finalises the builder into a [`VariogramParams`] value.
    pub fn build(self) -> VariogramParams {
        assert!(self.range > 0.0);
        assert!(self.sill >= self.nugget);
        assert!(self.nugget >= 0.0);
        assert!(self.exponent > 0.0 && self.exponent < 2.0);
        VariogramParams {
            variogram_type: self.variogram_type,
            range: self.range,
            sill: self.sill,
            nugget: self.nugget,
            exponent: self.exponent,
        }
    }
}

/// Evaluates the semivariance `gamma(h)` for the model described by `params`.
#[inline(always)]
pub fn variogram_gamma(h: f64, params: &VariogramParams) -> f64 {
    match params.variogram_type {
        VariogramType::Gaussian => GaussianVariogram {
            range: params.range,
            sill: params.sill,
            nugget: params.nugget,
        }
        .gamma(h),
        VariogramType::Spherical => SphericalVariogram {
            range: params.range,
            sill: params.sill,
            nugget: params.nugget,
        }
        .gamma(h),
        VariogramType::Exponential => ExponentialVariogram {
            range: params.range,
            sill: params.sill,
            nugget: params.nugget,
        }
        .gamma(h),
        VariogramType::Power => PowerVariogram {
            scaling: params.sill,
            exponent: params.exponent,
            nugget: params.nugget,
        }
        .gamma(h),
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete variogram models and their faer-compatible evaluations.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{VariogramFromParams, VariogramParams, get_distance, traits::VariogramFunction};
use faer::RowRef;

/// Gaussian variogram with `gamma(h) = (s - n) * (1 - exp(-3 (h/r)^2)) + n` for `h > 0`.
///
/// The factor of 3 makes `range` the practical range: the model reaches
/// ~95% of the sill at `h = range`.
#[derive(Clone, Debug, Copy)]
pub struct GaussianVariogram {
    pub range: f64,
    pub sill: f64,
    pub nugget: f64,
}

impl GaussianVariogram {
    #[inline(always)]
    pub fn gamma(&self, h: f64) -> f64 {
        if h <= 0.0 {
            return 0.0;
        }
        let hr = h / self.range;
        (self.sill - self.nugget) * (1.0 - (-3.0 * hr * hr).exp()) + self.nugget
    }
}

impl VariogramFunction for GaussianVariogram {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.gamma(get_distance(target, source))
    }

    #[inline(always)]
    fn is_stationary(&self) -> bool {
        true
    }

    #[inline(always)]
    fn sill(&self) -> f64 {
        self.sill
    }
}

impl VariogramFromParams for GaussianVariogram {
    #[inline(always)]
    fn from_params(p: &VariogramParams) -> Self {
        GaussianVariogram {
            range: p.range,
            sill: p.sill,
            nugget: p.nugget,
        }
    }
}

/// Spherical variogram, linear near the origin and exactly flat beyond `range`.
#[derive(Clone, Debug, Copy)]
pub struct SphericalVariogram {
    pub range: f64,
    pub sill: f64,
    pub nugget: f64,
}

impl SphericalVariogram {
    #[inline(always)]
    pub fn gamma(&self, h: f64) -> f64 {
        if h <= 0.0 {
            return 0.0;
        }
        if h >= self.range {
            return self.sill;
        }
        let hr = h / self.range;
        (self.sill - self.nugget) * (1.5 * hr - 0.5 * hr * hr * hr) + self.nugget
    }
}

impl VariogramFunction for SphericalVariogram {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.gamma(get_distance(target, source))
    }

    #[inline(always)]
    fn is_stationary(&self) -> bool {
        true
    }

    #[inline(always)]
    fn sill(&self) -> f64 {
        self.sill
    }
}

impl VariogramFromParams for SphericalVariogram {
    #[inline(always)]
    fn from_params(p: &VariogramParams) -> Self {
        SphericalVariogram {
            range: p.range,
            sill: p.sill,
            nugget: p.nugget,
        }
    }
}

/// Exponential variogram with `gamma(h) = (s - n) * (1 - exp(-3 h/r)) + n` for `h > 0`.
#[derive(Clone, Debug, Copy)]
pub struct ExponentialVariogram {
    pub range: f64,
    pub sill: f64,
    pub nugget: f64,
}

impl ExponentialVariogram {
    #[inline(always)]
    pub fn gamma(&self, h: f64) -> f64 {
        if h <= 0.0 {
            return 0.0;
        }
        (self.sill - self.nugget) * (1.0 - (-3.0 * h / self.range).exp()) + self.nugget
    }
}

impl VariogramFunction for ExponentialVariogram {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.gamma(get_distance(target, source))
    }

    #[inline(always)]
    fn is_stationary(&self) -> bool {
        true
    }

    #[inline(always)]
    fn sill(&self) -> f64 {
        self.sill
    }
}

impl VariogramFromParams for ExponentialVariogram {
    #[inline(always)]
    fn from_params(p: &VariogramParams) -> Self {
        ExponentialVariogram {
            range: p.range,
            sill: p.sill,
            nugget: p.nugget,
        }
    }
}

/// Power variogram with `gamma(h) = scaling * h^exponent + n` for `h > 0`.
///
/// Unbounded, hence non-stationary: systems built from this model stay in
/// semivariance form and [`VariogramFunction::sill`] reports infinity.
/// Requires `0 < exponent < 2`.
#[derive(Clone, Debug, Copy)]
pub struct PowerVariogram {
    pub scaling: f64,
    pub exponent: f64,
    pub nugget: f64,
}

impl PowerVariogram {
    #[inline(always)]
    pub fn gamma(&self, h: f64) -> f64 {
        if h <= 0.0 {
            return 0.0;
        }
        self.scaling * h.powf(self.exponent) + self.nugget
    }
}

impl VariogramFunction for PowerVariogram {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.gamma(get_distance(target, source))
    }

    #[inline(always)]
    fn is_stationary(&self) -> bool {
        false
    }

    #[inline(always)]
    fn sill(&self) -> f64 {
        f64::INFINITY
    }
}

impl VariogramFromParams for PowerVariogram {
    #[inline(always)]
    fn from_params(p: &VariogramParams) -> Self {
        PowerVariogram {
            scaling: p.sill,
            exponent: p.exponent,
            nugget: p.nugget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn gamma_is_zero_at_zero_lag() {
        let g = GaussianVariogram { range: 10.0, sill: 2.0, nugget: 0.5 };
        let s = SphericalVariogram { range: 10.0, sill: 2.0, nugget: 0.5 };
        let e = ExponentialVariogram { range: 10.0, sill: 2.0, nugget: 0.5 };
        let p = PowerVariogram { scaling: 1.0, exponent: 1.5, nugget: 0.5 };

        assert_eq!(g.gamma(0.0), 0.0);
        assert_eq!(s.gamma(0.0), 0.0);
        assert_eq!(e.gamma(0.0), 0.0);
        assert_eq!(p.gamma(0.0), 0.0);
    }

    #[test]
    fn nugget_discontinuity_just_past_zero() {
        let g = GaussianVariogram { range: 10.0, sill: 2.0, nugget: 0.5 };
        // At a vanishing lag the structured part contributes nothing but the
        // nugget is fully present.
        assert!((g.gamma(1e-12) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn spherical_reaches_sill_exactly_at_range() {
        let s = SphericalVariogram { range: 10.0, sill: 2.0, nugget: 0.0 };
        assert_eq!(s.gamma(10.0), 2.0);
        assert_eq!(s.gamma(25.0), 2.0);
    }

    #[test]
    fn gaussian_and_exponential_approach_sill() {
        let g = GaussianVariogram { range: 10.0, sill: 2.0, nugget: 0.0 };
        let e = ExponentialVariogram { range: 10.0, sill: 2.0, nugget: 0.0 };
        assert!((g.gamma(100.0) - 2.0).abs() < 1e-9);
        assert!((e.gamma(100.0) - 2.0).abs() < 1e-9);
        // ~95% of the sill at the practical range
        assert!((g.gamma(10.0) - 2.0 * 0.95).abs() < 0.01);
        assert!((e.gamma(10.0) - 2.0 * 0.95).abs() < 0.01);
    }

    #[test]
    fn power_is_unbounded_and_non_stationary() {
        let p = PowerVariogram { scaling: 1.0, exponent: 1.0, nugget: 0.0 };
        assert!(!p.is_stationary());
        assert_eq!(p.sill(), f64::INFINITY);
        assert!(p.gamma(1e6) > 1e5);
    }

    #[test]
    fn evaluate_uses_euclidean_separation() {
        let g = GaussianVariogram { range: 10.0, sill: 1.0, nugget: 0.0 };
        let points = mat![[0.0, 0.0], [3.0, 4.0f64]];
        let by_rows = g.evaluate(points.row(0), points.row(1));
        assert!((by_rows - g.gamma(5.0)).abs() < 1e-15);
    }
}

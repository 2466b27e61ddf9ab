/////////////////////////////////////////////////////////////////////////////////////////////
//
// Adds the factorisation layer shared by all Kriging variants: Cholesky and Bunch-Kaufman.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! Factorisation of assembled Kriging systems.
//!
//! Simple Kriging produces a symmetric positive definite covariance matrix
//! and is factorised with LLᵀ. The constrained variants (Ordinary, Universal,
//! External-Drift) append Lagrange rows and columns, which makes the system
//! symmetric indefinite; those are factorised with Bunch-Kaufman LBLᵀ.
//!
//! Both paths report failure as a status instead of panicking, so the batch
//! solver loops can skip or abandon individual fits.

use faer::{
    self, Conj, Mat, MatRef, Side,
    diag::Diag,
    dyn_stack::{MemBuffer, MemStack},
    linalg::solvers::{Llt, Solve},
    perm::Perm,
    prelude::*,
};

/// Status reported when a Kriging system cannot be factorised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorizationError {
    /// LLᵀ failed: the covariance block is not numerically positive definite.
    NotSpd,

    /// LBLᵀ produced a collapsed pivot block: the system is numerically singular.
    Singular,
}

/// Factorisation of one assembled Kriging system.
///
/// Holds either an LLᵀ (Simple Kriging) or an LBLᵀ (constrained variants)
/// decomposition and maps right-hand sides to weight vectors.
pub enum SystemFactor {
    Llt(Llt<f64>),
    Lblt(LbltFactor),
}

impl SystemFactor {
    /// Cholesky factorisation of a symmetric positive definite system.
    ///
    /// Only the lower triangle of `a` is accessed.
    pub fn cholesky(a: MatRef<'_, f64>) -> Result<Self, FactorizationError> {
        match Llt::new(a, Side::Lower) {
            Ok(llt) => Ok(SystemFactor::Llt(llt)),
            Err(_) => Err(FactorizationError::NotSpd),
        }
    }

    /// Bunch-Kaufman factorisation of a symmetric indefinite system.
    ///
    /// Only the lower triangle of `a` is accessed. Near-singular systems are
    /// reported through the returned status rather than surfacing as
    /// non-finite solve results later.
    pub fn symmetric_indefinite(a: MatRef<'_, f64>) -> Result<Self, FactorizationError> {
        LbltFactor::try_new(a).map(SystemFactor::Lblt)
    }

    /// Solves `A @ X = B` for the factorised system.
    pub fn solve(&self, rhs: &Mat<f64>) -> Mat<f64> {
        match self {
            SystemFactor::Llt(f) => f.solve(rhs),
            SystemFactor::Lblt(f) => f.solve(rhs),
        }
    }
}

/// Bunch-Kaufman LBLᵀ factorisation with an explicit singularity check.
///
/// The factorisation itself always completes; singularity shows up as a
/// collapsed 1-by-1 or 2-by-2 pivot block on the block diagonal. The pivot
/// scan happens once at construction so that `solve` can stay infallible.
#[allow(non_snake_case)]
pub struct LbltFactor {
    /// Unit lower triangular factor.
    L: Mat<f64>,
    B_diag: Diag<f64>,
    B_subdiag: Diag<f64>,
    P: Perm<usize>,
}

#[allow(non_snake_case)]
impl LbltFactor {
    /// Factorises the lower triangle of `a` and scans the pivot blocks.
    pub fn try_new(a: MatRef<'_, f64>) -> Result<Self, FactorizationError> {
        assert!(a.nrows() == a.ncols());

        let n = a.nrows();
        let par = faer::get_global_parallelism();

        let mut L = Mat::zeros(n, n);
        L.copy_from_triangular_lower(a);

        let mut diag = Diag::zeros(n);
        let mut subdiag = Diag::zeros(n);
        let mut perm_fwd = vec![0usize; n];
        let mut perm_bwd = vec![0usize; n];

        let mut mem = MemBuffer::new(
            faer::linalg::cholesky::lblt::factor::cholesky_in_place_scratch::<usize, f64>(
                n,
                par,
                default(),
            ),
        );
        let stack = MemStack::new(&mut mem);

        faer::linalg::cholesky::lblt::factor::cholesky_in_place(
            L.as_mut(),
            subdiag.as_mut(),
            &mut perm_fwd,
            &mut perm_bwd,
            par,
            stack,
            default(),
        );

        diag.copy_from(L.diagonal());
        L.diagonal_mut().fill(1.0);

        let factor = Self {
            L,
            B_diag: diag,
            B_subdiag: subdiag,
            P: unsafe {
                Perm::new_unchecked(perm_fwd.into_boxed_slice(), perm_bwd.into_boxed_slice())
            },
        };

        match factor.pivot_blocks_nonsingular() {
            true => Ok(factor),
            false => Err(FactorizationError::Singular),
        }
    }

    /// Walks the block diagonal of `B` and rejects pivots that collapsed to
    /// (numerical) zero. A nonzero subdiagonal entry marks a 2-by-2 block.
    fn pivot_blocks_nonsingular(&self) -> bool {
        let diag: Vec<f64> = self
            .B_diag
            .as_ref()
            .column_vector()
            .iter()
            .copied()
            .collect();
        let subdiag: Vec<f64> = self
            .B_subdiag
            .as_ref()
            .column_vector()
            .iter()
            .copied()
            .collect();

        let n = diag.len();
        if n == 0 {
            return true;
        }

        let mut scale = 0.0_f64;
        for i in 0..n {
            scale = scale.max(diag[i].abs()).max(subdiag[i].abs());
        }
        if scale == 0.0 {
            return false;
        }
        let tol = (n as f64) * f64::EPSILON * scale;

        let mut i = 0;
        while i < n {
            if i + 1 < n && subdiag[i] != 0.0 {
                let det = diag[i] * diag[i + 1] - subdiag[i] * subdiag[i];
                if det.abs() <= tol * scale {
                    return false;
                }
                i += 2;
            } else {
                if diag[i].abs() <= tol {
                    return false;
                }
                i += 1;
            }
        }

        true
    }

    /// Solves `A @ X = B` using the stored factors.
    pub fn solve(&self, rhs: &Mat<f64>) -> Mat<f64> {
        let par = faer::get_global_parallelism();

        let mut out = rhs.clone();

        let mut mem = MemBuffer::new(
            faer::linalg::cholesky::lblt::solve::solve_in_place_scratch::<usize, f64>(
                self.L.nrows(),
                out.ncols(),
                par,
            ),
        );
        let stack = MemStack::new(&mut mem);

        faer::linalg::cholesky::lblt::solve::solve_in_place_with_conj(
            self.L.as_ref(),
            self.B_diag.as_ref(),
            self.B_subdiag.as_ref(),
            Conj::No,
            self.P.as_ref(),
            out.as_mut(),
            par,
            stack,
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    /// Deterministic SPD matrix: A = M Mᵀ + alpha I.
    fn make_spd(n: usize, alpha: f64) -> Mat<f64> {
        let mut m = Mat::<f64>::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let x = (i as f64 + 1.0) * (j as f64 + 2.0);
                m[(i, j)] = (x.sin() + 2.0 * x.cos()) / (1.0 + (i + j + 1) as f64);
            }
        }
        let mut a = &m * m.transpose();
        for i in 0..n {
            a[(i, i)] += alpha.max(1e-3);
        }
        a
    }

    /// Ordinary-Kriging-shaped bordered system: SPD block plus a ones border
    /// with a zero corner. Indefinite but nonsingular.
    fn make_bordered(n: usize) -> Mat<f64> {
        let core = make_spd(n, 1.0);
        let mut a = Mat::<f64>::zeros(n + 1, n + 1);
        a.submatrix_mut(0, 0, n, n).copy_from(&core);
        for i in 0..n {
            a[(i, n)] = 1.0;
            a[(n, i)] = 1.0;
        }
        a
    }

    #[test]
    fn cholesky_solves_spd_system() {
        let n = 7;
        let a = make_spd(n, 1e-2);
        let b = Mat::<f64>::from_fn(n, 2, |i, j| ((i + 2 * j + 1) as f64).sin());

        let factor = SystemFactor::cholesky(a.as_ref()).unwrap();
        let x = factor.solve(&b);

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        assert!(&a * &x ~ b);
    }

    #[test]
    fn cholesky_rejects_indefinite_matrix() {
        let a = mat![[1.0, 0.0], [0.0, -1.0f64]];
        let status = SystemFactor::cholesky(a.as_ref());
        assert!(matches!(status, Err(FactorizationError::NotSpd)));
    }

    #[test]
    fn lblt_solves_bordered_indefinite_system() {
        let n = 6;
        let a = make_bordered(n);
        let b = Mat::<f64>::from_fn(n + 1, 1, |i, _| 1.0 / (1.0 + i as f64));

        let factor = SystemFactor::symmetric_indefinite(a.as_ref()).unwrap();
        let x = factor.solve(&b);

        let approx_eq = CwiseMat(ApproxEq::eps() * 256.0 * ((n + 1) as f64));
        assert!(&a * &x ~ b);
    }

    #[test]
    fn lblt_matches_cholesky_on_spd_input() {
        let n = 5;
        let a = make_spd(n, 1.0);
        let b = Mat::<f64>::from_fn(n, 1, |i, _| (i as f64 + 1.0).ln());

        let llt = SystemFactor::cholesky(a.as_ref()).unwrap();
        let lblt = SystemFactor::symmetric_indefinite(a.as_ref()).unwrap();

        let x_llt = llt.solve(&b);
        let x_lblt = lblt.solve(&b);

        let approx_eq = CwiseMat(ApproxEq::eps() * 256.0 * (n as f64));
        assert!(&x_llt ~ &x_lblt);
    }

    #[test]
    fn lblt_reports_singular_system_as_status() {
        // Two identical rows/columns: rank deficient by construction.
        let a = mat![
            [1.0, 1.0, 0.5],
            [1.0, 1.0, 0.5],
            [0.5, 0.5, 2.0f64],
        ];
        let status = SystemFactor::symmetric_indefinite(a.as_ref());
        assert!(matches!(status, Err(FactorizationError::Singular)));
    }

    #[test]
    fn lblt_reports_zero_matrix_as_singular() {
        let a = Mat::<f64>::zeros(4, 4);
        let status = SystemFactor::symmetric_indefinite(a.as_ref());
        assert!(matches!(status, Err(FactorizationError::Singular)));
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances, extents, and gamma matrices.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::traits::VariogramFunction;
use faer::{Mat, MatRef, RowRef};
use std::fmt::Debug;

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_krige_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let wanted_rows = vec![0usize, 2];
///
/// let sub_matrix = select_mat_rows(&matrix, &wanted_rows);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [0.0, 1.0],
///         [2.0, 2.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &Vec<usize>) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Generates the cartesian product of a slice of values repeated `num_columns` times.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_krige_utils::cartesian_product;
///
/// let values = vec![0, 1];
///
/// let result = cartesian_product(&values, 2);
///
/// assert_eq!(
///     result,
///     mat![
///         [0, 0],
///         [0, 1],
///         [1, 0],
///         [1, 1],
///     ]
/// );
/// ```
#[inline(always)]
pub fn cartesian_product<T>(values: &[T], num_columns: usize) -> Mat<T>
where
    T: Clone + Debug + Default,
{
    let base = values.len();
    let total_rows = base.pow(num_columns as u32);

    Mat::from_fn(total_rows, num_columns, |i, j| {
        let index = (i / base.pow((num_columns - j - 1) as u32)) % base;
        values[index].clone()
    })
}

/// Returns the indices that would sort the input slice.
///
/// # Examples
///
/// ```
/// use ferreus_krige_utils::argsort;
///
/// let data = [30, 10, 20];
///
/// let sorted_indices = argsort(&data);
///
/// assert_eq!(sorted_indices, vec![1, 2, 0]);
/// ```
#[inline(always)]
pub fn argsort<T: PartialOrd>(data: &[T]) -> Vec<usize> {
    let mut indices = (0..data.len()).collect::<Vec<_>>();
    indices.sort_by(|&i, &j| {
        data[i]
            .partial_cmp(&data[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_krige_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0],
/// ];
///
/// let dist = get_distance(points.row(0), points.row(1));
///
/// assert_eq!(dist, 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist.sqrt()
}

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// Returns a flat vector arranged as `[min_0, ..., min_n, max_0, ..., max_n]`
/// where `n` is the number of columns in the matrix.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_krige_utils::get_pointarray_extents;
///
/// let points = mat![
///     [1.0, 2.0],
///     [3.0, -1.0],
///     [0.5, 4.0f64]
/// ];
/// let extents = get_pointarray_extents(&points);
/// assert_eq!(extents, vec![0.5, -1.0, 3.0, 4.0]);
/// ```
#[inline(always)]
pub fn get_pointarray_extents<T>(points: &Mat<T>) -> Vec<T>
where
    T: PartialOrd + Clone,
{
    let ncols = points.shape().1;

    let mut extents: Vec<T> = vec![points.get(0, 0).clone(); 2 * ncols];

    for col in 0..ncols {
        extents[col] = points.get(0, col).clone();
        extents[col + ncols] = points.get(0, col).clone();
    }

    for row in points.row_iter() {
        for (col, item) in row.iter().enumerate() {
            if item < &extents[col] {
                extents[col] = item.clone();
            }
            if item > &extents[col + ncols] {
                extents[col + ncols] = item.clone();
            }
        }
    }

    extents
}

/// Builds the dense symmetric matrix of pairwise semivariances
/// `G[i, j] = gamma(x_i, x_j)` for one set of locations.
///
/// Only the lower triangle is evaluated; the upper triangle is mirrored so
/// the result is exactly symmetric.
#[inline(always)]
pub fn get_gamma_matrix(points: MatRef<f64>, model: &dyn VariogramFunction) -> Mat<f64> {
    let n = points.nrows();

    let mut gamma_matrix = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source_row = points.row(j);

        for i in j..n {
            let g = model.evaluate(points.row(i), source_row);

            gamma_matrix[(i, j)] = g;
            gamma_matrix[(j, i)] = g;
        }
    }

    gamma_matrix
}

/// Evaluates the semivariances between each of `points` and one query location.
///
/// Returns a column matrix with one entry per row of `points`.
#[inline(always)]
pub fn get_gamma_vector(
    points: MatRef<f64>,
    query: RowRef<f64>,
    model: &dyn VariogramFunction,
) -> Mat<f64> {
    Mat::from_fn(points.nrows(), 1, |i, _| model.evaluate(points.row(i), query))
}

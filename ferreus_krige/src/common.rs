/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for random point generation, evaluation grids, and CSV I/O.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use csv::{ReaderBuilder, Writer};
use faer::{Mat, MatRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fs::File;

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of spatial dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of points will be generated
///     deterministically across runs and platforms (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, d)` where each element lies in `[0.0, 1.0)`.
///
/// # Example
/// ```
/// use ferreus_krige::generate_random_points;
///
/// // Generate 100 reproducible 3D points
/// let pts = generate_random_points(100, 3, Some(42));
/// assert_eq!(pts.ncols(), 3);
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Create a regular evaluation grid from per-dimension ranges and sample counts.
///
/// # Arguments
/// * `ranges` - Inclusive `(min, max)` range for each dimension.
/// * `counts` - Number of grid samples per range; must match `ranges.len()`.
///
/// # Returns
/// A `Mat<f64>` with one row per grid point and one column per dimension.
pub fn create_evaluation_grid(ranges: &[(f64, f64)], counts: &[usize]) -> Mat<f64> {
    assert_eq!(ranges.len(), counts.len());

    let dimensions = counts.to_vec();
    let total_points: usize = dimensions.iter().product();
    let num_dimensions = ranges.len();

    Mat::from_fn(total_points, num_dimensions, |row_idx, col_idx| {
        let dim_points = dimensions[col_idx];
        let (start, end) = ranges[col_idx];
        let step = (end - start) / (dim_points as f64 - 1.0);

        let stride = match col_idx == 0 {
            true => 1,
            false => dimensions[..col_idx].iter().product::<usize>(),
        };

        let index_in_dim = (row_idx / stride) % dim_points;
        start + step * index_in_dim as f64
    })
}

/// Load a CSV file into separate point and value matrices.
///
/// The last column is treated as the observed value, and all preceding
/// columns form the point coordinates.
///
/// # Arguments
/// * `file_path` - Path to the CSV file.
/// * `has_headers` - Whether the file has a single header row to skip.
///
/// # Returns
/// On success, returns `(points, values)` where `points` has shape
/// `(n_rows, n_cols - 1)` and `values` has shape `(n_rows, 1)`.
pub fn csv_to_point_arrays(
    file_path: &str,
    has_headers: bool,
) -> Result<(Mat<f64>, Mat<f64>), Box<dyn Error>> {
    let file = File::open(file_path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .from_reader(file);

    let mut data = Vec::new();
    let mut last_column = Vec::new();
    let mut num_rows = 0;
    let mut num_cols = 0;

    for result in reader.records() {
        let record = result?;
        if num_cols == 0 {
            num_cols = record.len();
        } else if record.len() != num_cols {
            return Err("Inconsistent number of columns in CSV".into());
        }

        for (i, value) in record.iter().enumerate() {
            let parsed_value: f64 = value.parse()?;
            if i == num_cols - 1 {
                last_column.push(parsed_value);
            } else {
                data.push(parsed_value);
            }
        }

        num_rows += 1;
    }

    let points = MatRef::from_row_major_slice(data.as_slice(), num_rows, num_cols - 1).to_owned();
    let values = MatRef::from_row_major_slice(last_column.as_slice(), num_rows, 1).to_owned();

    Ok((points, values))
}

/// Write point coordinates and estimation output to a CSV file.
///
/// Each row of `points` is written followed by the corresponding mean and
/// variance, with headers `X, Y, Z, Mean, Variance` truncated to the actual
/// dimensionality.
///
/// # Arguments
/// * `points` - Matrix of point coordinates (rows are points).
/// * `means` - Column matrix of estimated means; must match `points` rows.
/// * `variances` - Column matrix of estimation variances; must match `points` rows.
/// * `filename` - Output CSV filename.
///
/// # Errors
/// Returns an error if writing to disk fails.
pub fn estimation_to_csv(
    points: &Mat<f64>,
    means: &Mat<f64>,
    variances: &Mat<f64>,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let num_points = points.nrows();
    assert_eq!(num_points, means.nrows(), "Points and means must have same length.");
    assert_eq!(num_points, variances.nrows(), "Points and variances must have same length.");

    let mut wtr = Writer::from_path(filename)?;

    let mut headers: Vec<&str> = ["X", "Y", "Z"][..points.ncols()].to_vec();
    headers.push("Mean");
    headers.push("Variance");
    wtr.write_record(&headers)?;

    for i in 0..num_points {
        let mut record: Vec<String> = points.row(i).iter().map(|c| c.to_string()).collect();
        record.push(means.get(i, 0).to_string());
        record.push(variances.get(i, 0).to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

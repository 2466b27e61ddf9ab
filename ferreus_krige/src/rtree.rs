/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to build spatial R-trees for neighbourhood and window queries.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # rtree
//!
//! Wrapper module for the rstar crate.
//!
//! Holds indexed point sets and answers k-nearest, radius, and axis-aligned
//! window queries. Unlike the static KD-tree, the R-tree supports incremental
//! insertion, which the sequential simulation solver relies on for its
//! growing conditioning set.

use faer::{MatRef, RowRef};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

// rstar doesn't support 1D natively, so we've worked around that by treating
// it as a 2D problem with the y component pinned to 0 for every point and
// [-0.5, 0.5] for every query envelope.
type Point2 = GeomWithData<[f64; 2], usize>;
type Point3 = GeomWithData<[f64; 3], usize>;

pub enum NdPointTree {
    D1(RTree<Point2>), // 1D embedded in 2D
    D2(RTree<Point2>),
    D3(RTree<Point3>),
}

#[inline(always)]
fn key_1d_as_2d(coords: RowRef<f64>) -> [f64; 2] {
    [coords[0], 0.0]
}

#[inline(always)]
fn key_2d(coords: RowRef<f64>) -> [f64; 2] {
    [coords[0], coords[1]]
}

#[inline(always)]
fn key_3d(coords: RowRef<f64>) -> [f64; 3] {
    [coords[0], coords[1], coords[2]]
}

impl NdPointTree {
    /// Creates an empty tree for the given dimensionality (1-3).
    pub fn new(dimensions: usize) -> Self {
        match dimensions {
            1 => NdPointTree::D1(RTree::new()),
            2 => NdPointTree::D2(RTree::new()),
            3 => NdPointTree::D3(RTree::new()),
            _ => panic!("Unsupported dimensions for NdPointTree: {}", dimensions),
        }
    }

    /// Bulk loads a tree from a point matrix; each leaf carries its row index.
    pub fn from_points(points: MatRef<f64>) -> Self {
        let n = points.nrows();
        match points.ncols() {
            1 => NdPointTree::D1(RTree::bulk_load(
                (0..n)
                    .map(|i| GeomWithData::new(key_1d_as_2d(points.row(i)), i))
                    .collect(),
            )),
            2 => NdPointTree::D2(RTree::bulk_load(
                (0..n)
                    .map(|i| GeomWithData::new(key_2d(points.row(i)), i))
                    .collect(),
            )),
            3 => NdPointTree::D3(RTree::bulk_load(
                (0..n)
                    .map(|i| GeomWithData::new(key_3d(points.row(i)), i))
                    .collect(),
            )),
            d => panic!("Unsupported dimensions for NdPointTree: {}", d),
        }
    }

    /// Inserts one point carrying the caller-supplied stable index.
    pub fn insert(&mut self, coords: RowRef<f64>, index: usize) {
        match self {
            NdPointTree::D1(tree) => tree.insert(GeomWithData::new(key_1d_as_2d(coords), index)),
            NdPointTree::D2(tree) => tree.insert(GeomWithData::new(key_2d(coords), index)),
            NdPointTree::D3(tree) => tree.insert(GeomWithData::new(key_3d(coords), index)),
        }
    }

    /// Returns up to `k` nearest points as `(index, distance)`, closest first.
    pub fn k_nearest(&self, query: RowRef<f64>, k: usize) -> Vec<(usize, f64)> {
        match self {
            NdPointTree::D1(tree) => tree
                .nearest_neighbor_iter_with_distance_2(&key_1d_as_2d(query))
                .take(k)
                .map(|(item, d2)| (item.data, d2.sqrt()))
                .collect(),
            NdPointTree::D2(tree) => tree
                .nearest_neighbor_iter_with_distance_2(&key_2d(query))
                .take(k)
                .map(|(item, d2)| (item.data, d2.sqrt()))
                .collect(),
            NdPointTree::D3(tree) => tree
                .nearest_neighbor_iter_with_distance_2(&key_3d(query))
                .take(k)
                .map(|(item, d2)| (item.data, d2.sqrt()))
                .collect(),
        }
    }

    /// Returns all points within euclidean `radius` of `query` as
    /// `(index, distance)`. The order is not significant.
    pub fn within_distance(&self, query: RowRef<f64>, radius: f64) -> Vec<(usize, f64)> {
        if radius < 0.0 {
            return Vec::new();
        }
        let r2 = radius * radius;
        match self {
            NdPointTree::D1(tree) => tree
                .locate_within_distance(key_1d_as_2d(query), r2)
                .map(|item| (item.data, distance_2d(item.geom(), &key_1d_as_2d(query)).sqrt()))
                .collect(),
            NdPointTree::D2(tree) => tree
                .locate_within_distance(key_2d(query), r2)
                .map(|item| (item.data, distance_2d(item.geom(), &key_2d(query)).sqrt()))
                .collect(),
            NdPointTree::D3(tree) => tree
                .locate_within_distance(key_3d(query), r2)
                .map(|item| (item.data, distance_3d(item.geom(), &key_3d(query)).sqrt()))
                .collect(),
        }
    }

    /// Returns all points inside the axis-aligned window centred on `query`
    /// with the given per-dimension half widths, as `(index, distance)`.
    ///
    /// Points on the window boundary are included.
    pub fn within_window(&self, query: RowRef<f64>, half_widths: &[f64]) -> Vec<(usize, f64)> {
        match self {
            NdPointTree::D1(tree) => {
                assert!(half_widths.len() == 1, "1D window expects one half width");
                let q = key_1d_as_2d(query);
                let envelope = AABB::from_corners(
                    [q[0] - half_widths[0], -0.5],
                    [q[0] + half_widths[0], 0.5],
                );
                tree.locate_in_envelope(&envelope)
                    .map(|item| (item.data, distance_2d(item.geom(), &q).sqrt()))
                    .collect()
            }
            NdPointTree::D2(tree) => {
                assert!(half_widths.len() == 2, "2D window expects two half widths");
                let q = key_2d(query);
                let envelope = AABB::from_corners(
                    [q[0] - half_widths[0], q[1] - half_widths[1]],
                    [q[0] + half_widths[0], q[1] + half_widths[1]],
                );
                tree.locate_in_envelope(&envelope)
                    .map(|item| (item.data, distance_2d(item.geom(), &q).sqrt()))
                    .collect()
            }
            NdPointTree::D3(tree) => {
                assert!(half_widths.len() == 3, "3D window expects three half widths");
                let q = key_3d(query);
                let envelope = AABB::from_corners(
                    [
                        q[0] - half_widths[0],
                        q[1] - half_widths[1],
                        q[2] - half_widths[2],
                    ],
                    [
                        q[0] + half_widths[0],
                        q[1] + half_widths[1],
                        q[2] + half_widths[2],
                    ],
                );
                tree.locate_in_envelope(&envelope)
                    .map(|item| (item.data, distance_3d(item.geom(), &q).sqrt()))
                    .collect()
            }
        }
    }
}

#[inline(always)]
fn distance_2d(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

#[inline(always)]
fn distance_3d(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

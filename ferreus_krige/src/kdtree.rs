/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a KD-tree for nearest-neighbour and radius queries over static observation sets.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::{Mat, RowRef};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Distance metrics supported by the tree.
///
/// The infinity norm turns a radius query into an axis-aligned cube
/// membership test, which is what the duplicate screen uses.
#[derive(Clone, Copy, Debug)]
pub enum DistanceMetric {
    Euclidean,
    InfinityNorm,
}

impl DistanceMetric {
    #[inline(always)]
    pub(crate) fn between(self, a: RowRef<f64>, b: RowRef<f64>) -> f64 {
        match self {
            DistanceMetric::Euclidean => {
                let mut acc = 0.0;
                for (x, y) in a.iter().zip(b.iter()) {
                    let diff = x - y;
                    acc += diff * diff;
                }
                acc.sqrt()
            }
            DistanceMetric::InfinityNorm => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0_f64, f64::max),
        }
    }
}

/// A node in the tree; `point` is a row index into the owned coordinate matrix.
#[derive(Debug)]
struct Node {
    point: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Candidate neighbour ordered by distance, farthest first.
#[derive(Debug, PartialEq)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.distance.partial_cmp(&other.distance)
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// KD-tree over a fixed set of points.
///
/// The tree owns a copy of the coordinates; queries return row indices into
/// the matrix the tree was built from.
#[derive(Debug)]
pub struct KDTree {
    points: Mat<f64>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KDTree {
    /// Coordinates the tree was built from.
    pub(crate) fn coords(&self) -> &Mat<f64> {
        &self.points
    }

    /// Constructs a new KD-tree from a Mat of points (one row per point).
    pub fn new(points: &Mat<f64>) -> Self {
        let mut order: Vec<usize> = (0..points.nrows()).collect();
        let mut nodes = Vec::with_capacity(points.nrows());
        let root = Self::build(points, &mut nodes, &mut order, 0);

        KDTree {
            points: points.clone(),
            nodes,
            root,
        }
    }

    /// Recursively builds the tree, storing nodes in a flat vector.
    fn build(
        points: &Mat<f64>,
        nodes: &mut Vec<Node>,
        indices: &mut [usize],
        depth: usize,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let axis = depth % points.ncols();

        indices.sort_by(|&a, &b| {
            points[(a, axis)]
                .partial_cmp(&points[(b, axis)])
                .unwrap_or(Ordering::Equal)
        });

        let mid = indices.len() / 2;

        let node_index = nodes.len();
        nodes.push(Node {
            point: indices[mid],
            left: None,
            right: None,
        });

        let (lower, rest) = indices.split_at_mut(mid);
        let upper = &mut rest[1..];

        let left = Self::build(points, nodes, lower, depth + 1);
        let right = Self::build(points, nodes, upper, depth + 1);
        nodes[node_index].left = left;
        nodes[node_index].right = right;

        Some(node_index)
    }

    /// Returns the `k` points closest to `query`, ordered closest first,
    /// as `(row index, distance)` pairs. Fewer than `k` entries are returned
    /// when the tree holds fewer points.
    pub fn nearest(&self, query: RowRef<f64>, k: usize, metric: DistanceMetric) -> Vec<(usize, f64)> {
        let mut heap = BinaryHeap::with_capacity(k + 1);

        if k > 0 {
            self.nearest_impl(self.root, query, k, 0, metric, &mut heap);
        }

        // into_sorted_vec orders by the Candidate Ord, i.e. closest first.
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.index, c.distance))
            .collect()
    }

    fn nearest_impl(
        &self,
        node_index: Option<usize>,
        query: RowRef<f64>,
        k: usize,
        depth: usize,
        metric: DistanceMetric,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let Some(node_index) = node_index else {
            return;
        };

        let node = &self.nodes[node_index];
        let point = self.points.row(node.point);
        let dist = metric.between(query, point);

        if heap.len() < k {
            heap.push(Candidate { distance: dist, index: node.point });
        } else if dist < heap.peek().map(|c| c.distance).unwrap_or(f64::INFINITY) {
            heap.pop();
            heap.push(Candidate { distance: dist, index: node.point });
        }

        let axis = depth % self.points.ncols();
        let diff = query[axis] - point[axis];

        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.nearest_impl(near, query, k, depth + 1, metric, heap);

        // The far half-space can only contain closer points if the splitting
        // plane is within the current worst distance.
        let worst = heap.peek().map(|c| c.distance).unwrap_or(f64::INFINITY);
        if heap.len() < k || diff.abs() <= worst {
            self.nearest_impl(far, query, k, depth + 1, metric, heap);
        }
    }

    /// Returns the row indices of all points within `radius` of `query`.
    ///
    /// A negative radius yields an empty result. The returned order is not
    /// significant.
    pub fn within_radius(
        &self,
        query: RowRef<f64>,
        radius: f64,
        metric: DistanceMetric,
    ) -> Vec<usize> {
        let mut result = Vec::new();
        self.within_radius_impl(self.root, query, radius, 0, metric, &mut result);
        result
    }

    fn within_radius_impl(
        &self,
        node_index: Option<usize>,
        query: RowRef<f64>,
        radius: f64,
        depth: usize,
        metric: DistanceMetric,
        result: &mut Vec<usize>,
    ) {
        let Some(node_index) = node_index else {
            return;
        };

        let node = &self.nodes[node_index];
        let point = self.points.row(node.point);

        if metric.between(query, point) <= radius {
            result.push(node.point);
        }

        let axis = depth % self.points.ncols();
        let diff = query[axis] - point[axis];

        if diff.abs() <= radius {
            self.within_radius_impl(node.left, query, radius, depth + 1, metric, result);
            self.within_radius_impl(node.right, query, radius, depth + 1, metric, result);
        } else if diff < 0.0 {
            self.within_radius_impl(node.left, query, radius, depth + 1, metric, result);
        } else {
            self.within_radius_impl(node.right, query, radius, depth + 1, metric, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, dim: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, dim, |_, _| rng.random_range(0.0..1.0))
    }

    fn brute_force_radius(
        points: &Mat<f64>,
        query: RowRef<f64>,
        radius: f64,
        metric: DistanceMetric,
    ) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..points.nrows())
            .filter(|&i| metric.between(points.row(i), query) <= radius)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn brute_force_nearest(
        points: &Mat<f64>,
        query: RowRef<f64>,
        k: usize,
        metric: DistanceMetric,
    ) -> Vec<(usize, f64)> {
        let mut all: Vec<(usize, f64)> = (0..points.nrows())
            .map(|i| (i, metric.between(points.row(i), query)))
            .collect();
        all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        all.truncate(k);
        all
    }

    #[test]
    fn radius_matches_bruteforce_in_1d_2d_3d() {
        for (n, d, seed, rmax) in [
            (200, 1, 42u64, 0.4),
            (300, 2, 123u64, 0.35),
            (400, 3, 999u64, 0.3),
        ] {
            let points = random_points(n, d, seed);
            let tree = KDTree::new(&points);
            let mut rng = StdRng::seed_from_u64(seed + 50);

            for _ in 0..25 {
                let q_idx = rng.random_range(0..points.nrows());
                let query = points.row(q_idx);
                let r = rng.random_range(0.0..rmax);

                for metric in [DistanceMetric::Euclidean, DistanceMetric::InfinityNorm] {
                    let mut kd = tree.within_radius(query, r, metric);
                    kd.sort_unstable();
                    let bf = brute_force_radius(&points, query, r, metric);
                    assert_eq!(kd, bf);
                }
            }
        }
    }

    #[test]
    fn nearest_matches_bruteforce_in_1d_2d_3d() {
        for (n, d, seed) in [(150, 1, 7u64), (250, 2, 8u64), (350, 3, 9u64)] {
            let points = random_points(n, d, seed);
            let tree = KDTree::new(&points);
            let mut rng = StdRng::seed_from_u64(seed + 100);

            for _ in 0..25 {
                let q_idx = rng.random_range(0..points.nrows());
                let query = points.row(q_idx);
                let k = rng.random_range(1..12usize);

                let kd = tree.nearest(query, k, DistanceMetric::Euclidean);
                let bf = brute_force_nearest(&points, query, k, DistanceMetric::Euclidean);

                assert_eq!(kd.len(), bf.len());
                // Compare distances rather than ids: ties may resolve differently.
                for (a, b) in kd.iter().zip(bf.iter()) {
                    assert!((a.1 - b.1).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn nearest_returns_ordered_distances() {
        let points = random_points(100, 2, 11);
        let tree = KDTree::new(&points);
        let nbrs = tree.nearest(points.row(0), 10, DistanceMetric::Euclidean);
        assert_eq!(nbrs.len(), 10);
        assert_eq!(nbrs[0].0, 0);
        assert_eq!(nbrs[0].1, 0.0);
        for pair in nbrs.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn nearest_caps_at_tree_size() {
        let points = random_points(4, 2, 12);
        let tree = KDTree::new(&points);
        let nbrs = tree.nearest(points.row(1), 10, DistanceMetric::Euclidean);
        assert_eq!(nbrs.len(), 4);
    }

    #[test]
    fn empty_tree_returns_empty() {
        let points = Mat::<f64>::zeros(0, 3);
        let tree = KDTree::new(&points);
        let query = Mat::<f64>::zeros(1, 3);
        assert!(tree.within_radius(query.row(0), 1.0, DistanceMetric::Euclidean).is_empty());
        assert!(tree.nearest(query.row(0), 3, DistanceMetric::Euclidean).is_empty());
    }

    #[test]
    fn negative_radius_returns_empty() {
        let points = random_points(10, 2, 44);
        let tree = KDTree::new(&points);
        let out = tree.within_radius(points.row(0), -0.1, DistanceMetric::Euclidean);
        assert!(out.is_empty());
    }

    #[test]
    fn duplicates_are_all_returned_at_zero_radius() {
        let mut points = Mat::<f64>::zeros(2, 2);
        points[(0, 0)] = 0.3;
        points[(0, 1)] = 0.7;
        points[(1, 0)] = 0.3;
        points[(1, 1)] = 0.7;

        let tree = KDTree::new(&points);
        let mut out = tree.within_radius(points.row(0), 0.0, DistanceMetric::Euclidean);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn infnorm_radius_is_a_cube_test() {
        // 0: (0,0), 1: (0.2,0), 2: (0,0.2), 3: (0.2,0.2)
        let mut points = Mat::<f64>::zeros(4, 2);
        points[(1, 0)] = 0.2;
        points[(2, 1)] = 0.2;
        points[(3, 0)] = 0.2;
        points[(3, 1)] = 0.2;

        let tree = KDTree::new(&points);

        // Euclidean radius 0.2 excludes the diagonal point (~0.2828 away).
        let mut eu = tree.within_radius(points.row(0), 0.2, DistanceMetric::Euclidean);
        eu.sort_unstable();
        assert_eq!(eu, vec![0, 1, 2]);

        // Infinity norm includes all four.
        let mut inf = tree.within_radius(points.row(0), 0.2, DistanceMetric::InfinityNorm);
        inf.sort_unstable();
        assert_eq!(inf, vec![0, 1, 2, 3]);
    }
}

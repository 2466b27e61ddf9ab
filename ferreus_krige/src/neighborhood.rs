/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines neighbourhood selection rules and the per-variable neighbour finder.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # neighborhood
//!
//! Subset-selection rules limiting which observations take part in one local
//! Kriging fit. Static datasets are searched with the KD-tree (nearest,
//! ball) or the R-tree (window); the sequential simulation solver reuses the
//! same rules against its growing R-tree via
//! [`NeighborhoodSpec::query_rtree`].

use crate::{
    kdtree::{DistanceMetric, KDTree},
    rtree::NdPointTree,
};
use faer::{Mat, RowRef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A neighbourhood selection rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NeighborhoodSpec {
    /// The `k` observations closest to the query under euclidean distance.
    Nearest { k: usize },

    /// All observations within a euclidean radius of the query.
    Ball { radius: f64 },

    /// All observations inside an axis-aligned window centred on the query,
    /// with one half width per dimension.
    Window { half_widths: Vec<f64> },
}

impl NeighborhoodSpec {
    /// Applies this rule against an R-tree, returning `(index, distance)`
    /// pairs ordered closest first and truncated to `max_neighbors`.
    pub(crate) fn query_rtree(
        &self,
        tree: &NdPointTree,
        query: RowRef<'_, f64>,
        max_neighbors: Option<usize>,
    ) -> Vec<(usize, f64)> {
        let mut found = match self {
            NeighborhoodSpec::Nearest { k } => {
                let cap = match max_neighbors {
                    Some(max) => (*k).min(max),
                    None => *k,
                };
                return tree.k_nearest(query, cap);
            }
            NeighborhoodSpec::Ball { radius } => tree.within_distance(query, *radius),
            NeighborhoodSpec::Window { half_widths } => tree.within_window(query, half_widths),
        };

        sort_and_truncate(&mut found, max_neighbors);
        found
    }
}

#[inline]
fn sort_and_truncate(found: &mut Vec<(usize, f64)>, max_neighbors: Option<usize>) {
    found.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    if let Some(max) = max_neighbors {
        found.truncate(max);
    }
}

/// Per-variable neighbour finder over the static observation set.
///
/// Built once during preprocessing; `find` is called for every query
/// location of the solve loop and writes the bounded, distance-ordered
/// index list into the caller's buffer.
pub(crate) struct NeighborFinder {
    spec: NeighborhoodSpec,
    max_neighbors: Option<usize>,
    kdtree: Option<KDTree>,
    rtree: Option<NdPointTree>,
}

impl NeighborFinder {
    pub fn new(points: &Mat<f64>, spec: NeighborhoodSpec, max_neighbors: Option<usize>) -> Self {
        let (kdtree, rtree) = match &spec {
            NeighborhoodSpec::Nearest { .. } | NeighborhoodSpec::Ball { .. } => {
                (Some(KDTree::new(points)), None)
            }
            NeighborhoodSpec::Window { .. } => (None, Some(NdPointTree::from_points(points.as_ref()))),
        };

        Self {
            spec,
            max_neighbors,
            kdtree,
            rtree,
        }
    }

    /// Writes the neighbour indices for `query` into `out`, closest first.
    pub fn find(&self, query: RowRef<'_, f64>, out: &mut Vec<usize>) {
        out.clear();

        match &self.spec {
            NeighborhoodSpec::Nearest { k } => {
                let cap = match self.max_neighbors {
                    Some(max) => (*k).min(max),
                    None => *k,
                };
                let tree = self.kdtree.as_ref().unwrap();
                out.extend(
                    tree.nearest(query, cap, DistanceMetric::Euclidean)
                        .into_iter()
                        .map(|(i, _)| i),
                );
            }
            NeighborhoodSpec::Ball { radius } => {
                let tree = self.kdtree.as_ref().unwrap();
                let coords = tree.coords();
                let mut found: Vec<(usize, f64)> = tree
                    .within_radius(query, *radius, DistanceMetric::Euclidean)
                    .into_iter()
                    .map(|i| (i, DistanceMetric::Euclidean.between(coords.row(i), query)))
                    .collect();
                sort_and_truncate(&mut found, self.max_neighbors);
                out.extend(found.into_iter().map(|(i, _)| i));
            }
            NeighborhoodSpec::Window { .. } => {
                let tree = self.rtree.as_ref().unwrap();
                out.extend(
                    self.spec
                        .query_rtree(tree, query, self.max_neighbors)
                        .into_iter()
                        .map(|(i, _)| i),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    fn line_points() -> Mat<f64> {
        mat![[0.0], [1.0], [2.0], [3.0], [4.0], [10.0f64]]
    }

    #[test]
    fn nearest_finder_orders_and_caps() {
        let points = line_points();
        let finder = NeighborFinder::new(&points, NeighborhoodSpec::Nearest { k: 4 }, Some(2));
        let query = mat![[2.2f64]];

        let mut out = Vec::new();
        finder.find(query.row(0), &mut out);

        assert_eq!(out, vec![2, 3]);
    }

    #[test]
    fn ball_finder_orders_by_distance_and_truncates() {
        let points = line_points();
        let finder = NeighborFinder::new(&points, NeighborhoodSpec::Ball { radius: 2.5 }, Some(3));
        let query = mat![[1.9f64]];

        let mut out = Vec::new();
        finder.find(query.row(0), &mut out);

        // In radius: 0..=4; closest three to 1.9 are 2, 1, 3.
        assert_eq!(out, vec![2, 1, 3]);
    }

    #[test]
    fn window_finder_respects_half_widths() {
        let points = mat![[0.0, 0.0], [1.0, 0.1], [0.2, 3.0], [4.0, 4.0f64]];
        let finder = NeighborFinder::new(
            &points,
            NeighborhoodSpec::Window { half_widths: vec![1.5, 0.5] },
            None,
        );
        let query = mat![[0.5, 0.0f64]];

        let mut out = Vec::new();
        finder.find(query.row(0), &mut out);

        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn empty_result_when_nothing_is_in_range() {
        let points = line_points();
        let finder = NeighborFinder::new(&points, NeighborhoodSpec::Ball { radius: 0.1 }, None);
        let query = mat![[6.5f64]];

        let mut out = vec![99];
        finder.find(query.row(0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn rtree_query_path_matches_static_finder() {
        let points = line_points();
        let tree = NdPointTree::from_points(points.as_ref());
        let spec = NeighborhoodSpec::Nearest { k: 3 };
        let query = mat![[2.2f64]];

        let via_rtree: Vec<usize> = spec
            .query_rtree(&tree, query.row(0), None)
            .into_iter()
            .map(|(i, _)| i)
            .collect();

        let finder = NeighborFinder::new(&points, spec, None);
        let mut via_kdtree = Vec::new();
        finder.find(query.row(0), &mut via_kdtree);

        assert_eq!(via_rtree, via_kdtree);
    }
}

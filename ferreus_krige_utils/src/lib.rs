/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports variogram models, parameters, and helper functions used across the ferreus_krige crates.
//
// Created on: 28 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`ferreus_krige`] crate
mod traits;
mod utils;
mod variogram_helpers;
mod variograms;

/// Implemented variogram models for use in the [`ferreus_krige`] crate.
pub mod models {
    pub use super::variograms::*;
}

pub use {
    traits::{VariogramFromParams, VariogramFunction},
    utils::{
        argsort, cartesian_product, get_distance, get_gamma_matrix, get_gamma_vector,
        get_pointarray_extents, select_mat_rows,
    },
    variogram_helpers::{VariogramParams, VariogramParamsBuilder, VariogramType, variogram_gamma},
};

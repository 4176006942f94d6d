//! # EOForest Core
//!
//! Core types and I/O for the EOForest disturbance-monitoring pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `SceneId` / `Sensor`: Landsat scene identifiers and band layouts
//! - `Product`: Typed metadata for every output raster the pipeline writes
//! - ENVI flat-binary reading/writing
//! - Tile grid and scene footprint matching

pub mod error;
pub mod io;
pub mod product;
pub mod raster;
pub mod report;
pub mod scene;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use scene::{SceneId, Sensor};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::{read_envi, write_envi, EnviHeader, EnviScalar};
    pub use crate::product::Product;
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::scene::{SceneId, Sensor};
    pub use crate::vector::{Tile, TileGrid};
}

//! Raster input/output

mod envi;

pub use envi::{
    read_envi, read_envi_bands, read_envi_header, write_envi, write_envi_bands, EnviHeader,
    EnviScalar,
};

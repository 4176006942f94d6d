//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with an affine
/// transform mapping pixel indices to map coordinates. Classification
/// rasters use `u8` category codes, count/percentage rasters `u16`.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster from existing data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            nodata: None,
        })
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a zero-filled raster with the same georeferencing but a
    /// different element type and dimensions
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Map-space bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Coordinate conversion

    /// Convert pixel indices to map coordinates (pixel top-left corner)
    pub fn pixel_to_world(&self, col: i64, row: i64) -> (f64, f64) {
        self.transform.pixel_to_world(col, row)
    }

    /// Convert map coordinates to pixel indices
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        self.transform.world_to_pixel(x, y)
    }

    /// Count cells equal to a value
    pub fn count_equal(&self, value: T) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_access() {
        let mut r: Raster<u8> = Raster::new(10, 12);
        assert_eq!(r.shape(), (10, 12));
        assert_eq!(r.get(3, 4).unwrap(), 0);

        r.set(3, 4, 7).unwrap();
        assert_eq!(r.get(3, 4).unwrap(), 7);
        assert!(r.get(10, 0).is_err());
    }

    #[test]
    fn test_from_vec_dimension_check() {
        let r = Raster::from_vec(vec![1u8; 12], 3, 4).unwrap();
        assert_eq!(r.shape(), (3, 4));
        assert!(Raster::from_vec(vec![1u8; 11], 3, 4).is_err());
    }

    #[test]
    fn test_count_equal() {
        let mut r: Raster<u8> = Raster::new(4, 4);
        r.set(0, 0, 8).unwrap();
        r.set(2, 3, 8).unwrap();
        assert_eq!(r.count_equal(8), 2);
        assert_eq!(r.count_equal(0), 14);
    }

    #[test]
    fn test_world_coordinates() {
        let mut r: Raster<u8> = Raster::new(100, 100);
        r.set_transform(GeoTransform::new(418500.0, 969000.0, 30.0, -30.0));

        let (x, y) = r.pixel_to_world(10, 20);
        assert_eq!(r.world_to_pixel(x, y), (10, 20));
    }
}

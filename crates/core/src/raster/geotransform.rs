//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y).
/// Only axis-aligned transforms are used by the pipeline: for north-up
/// images `pixel_height` is negative and both rotation terms are 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new north-up GeoTransform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Create from a GDAL-style array
    /// [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height];
    /// the rotation terms are ignored.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            origin_y: coeffs[3],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to a GDAL-style array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// Convert pixel indices to the map coordinates of the pixel's top-left corner
    pub fn pixel_to_world(&self, col: i64, row: i64) -> (f64, f64) {
        let x = self.origin_x + col as f64 * self.pixel_width;
        let y = self.origin_y + row as f64 * self.pixel_height;
        (x, y)
    }

    /// Convert map coordinates to integer pixel indices (floor of the
    /// fractional position)
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.origin_x) / self.pixel_width).floor() as i64;
        let row = ((y - self.origin_y) / self.pixel_height).floor() as i64;
        (col, row)
    }

    /// Get the cell size (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) for a raster of the given
    /// dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_world(0, 0);
        let (x1, y1) = self.pixel_to_world(width as i64, height as i64);

        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_world_roundtrip() {
        let gt = GeoTransform::new(418500.0, 969000.0, 30.0, -30.0);

        let (x, y) = gt.pixel_to_world(5, 10);
        let (col, row) = gt.world_to_pixel(x, y);

        assert_eq!(col, 5);
        assert_eq!(row, 10);
        assert_relative_eq!(x, 418650.0, epsilon = 1e-10);
        assert_relative_eq!(y, 968700.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }
}

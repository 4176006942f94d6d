//! Processing tiles and scene footprints
//!
//! The national grid is a set of named rectangular tiles. Scenes are
//! matched to tiles by polygon intersection of their map-space
//! footprints.

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use geo::{BoundingRect, Intersects};
use geo_types::{Coord, Polygon, Rect};
use std::path::Path;
use tracing::info;

/// A named processing tile with a rectangular footprint in map
/// coordinates
#[derive(Debug, Clone)]
pub struct Tile {
    name: String,
    footprint: Polygon<f64>,
}

impl Tile {
    pub fn from_bounds(
        name: impl Into<String>,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Self {
        let rect = Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        );
        Self {
            name: name.into(),
            footprint: rect.to_polygon(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn footprint(&self) -> &Polygon<f64> {
        &self.footprint
    }

    /// Bounds as (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        // A tile polygon always has a bounding rect
        let rect = self.footprint.bounding_rect().unwrap_or(Rect::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
        ));
        (rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// North-up geotransform anchored at the tile's upper-left corner
    pub fn transform(&self, cell_size: f64) -> GeoTransform {
        let (min_x, _, _, max_y) = self.bounds();
        GeoTransform::new(min_x, max_y, cell_size, -cell_size)
    }

    /// Raster dimensions (rows, cols) covering the tile at the given
    /// cell size
    pub fn raster_shape(&self, cell_size: f64) -> (usize, usize) {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        let rows = ((max_y - min_y) / cell_size).ceil() as usize;
        let cols = ((max_x - min_x) / cell_size).ceil() as usize;
        (rows, cols)
    }

    /// Whether a scene footprint overlaps this tile
    pub fn intersects(&self, footprint: &Polygon<f64>) -> bool {
        self.footprint.intersects(footprint)
    }
}

/// Map-space footprint of a raster of the given dimensions
pub fn raster_footprint(transform: &GeoTransform, rows: usize, cols: usize) -> Polygon<f64> {
    let (min_x, min_y, max_x, max_y) = transform.bounds(cols, rows);
    Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    )
    .to_polygon()
}

/// The set of tiles a run processes
#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self { tiles: Vec::new() }
    }

    /// Load a tile index file: one `name,min_x,min_y,max_x,max_y` line
    /// per tile, `#` comments allowed. A missing index aborts the run.
    pub fn from_index<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut tiles = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let bounds: Option<Vec<f64>> = parts
                .get(1..5)
                .map(|vals| vals.iter().filter_map(|v| v.parse::<f64>().ok()).collect());
            match bounds {
                Some(b) if parts.len() == 5 && b.len() == 4 => {
                    tiles.push(Tile::from_bounds(parts[0], b[0], b[1], b[2], b[3]));
                }
                _ => {
                    return Err(Error::Other(format!(
                        "bad tile index line {} in {}",
                        lineno + 1,
                        path.display()
                    )))
                }
            }
        }
        info!(tiles = tiles.len(), index = %path.display(), "tile index loaded");
        Ok(Self { tiles })
    }

    pub fn push(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn get(&self, name: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl IntoIterator for TileGrid {
    type Item = Tile;
    type IntoIter = std::vec::IntoIter<Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_transform_and_shape() {
        let tile = Tile::from_bounds("A07", 418500.0, 939000.0, 448500.0, 969000.0);
        let t = tile.transform(30.0);
        assert_eq!(t.origin_x, 418500.0);
        assert_eq!(t.origin_y, 969000.0);
        assert_eq!(t.pixel_height, -30.0);
        assert_eq!(tile.raster_shape(30.0), (1000, 1000));
    }

    #[test]
    fn test_scene_tile_intersection() {
        let tile = Tile::from_bounds("A07", 0.0, 0.0, 30000.0, 30000.0);

        let inside = GeoTransform::new(15000.0, 20000.0, 30.0, -30.0);
        assert!(tile.intersects(&raster_footprint(&inside, 100, 100)));

        let outside = GeoTransform::new(90000.0, 20000.0, 30.0, -30.0);
        assert!(!tile.intersects(&raster_footprint(&outside, 100, 100)));
    }

    #[test]
    fn test_tile_index_parsing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tiles.csv");
        std::fs::write(
            &path,
            "# national grid\nA07,418500,939000,448500,969000\nB02, 0, 0, 30000, 30000\n",
        )
        .unwrap();

        let grid = TileGrid::from_index(&path).unwrap();
        assert_eq!(grid.len(), 2);
        assert!(grid.get("A07").is_some());
        assert!(grid.get("Z99").is_none());

        std::fs::write(&path, "A07,418500,oops\n").unwrap();
        assert!(TileGrid::from_index(&path).is_err());
    }
}

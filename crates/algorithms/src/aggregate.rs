//! Per-tile aggregation of scene classifications
//!
//! Every classified scene overlapping a tile adds one vote per clear
//! pixel to a set of category counters. Closing the accumulator yields
//! per-category probability rasters (parts per 10000 of valid
//! observations), the observation count, and the majority category per
//! pixel.

use crate::maybe_rayon::*;
use eoforest_core::product::Category;
use eoforest_core::vector::Tile;
use eoforest_core::{Error, Raster, Result};
use ndarray::Array2;

/// Accumulates classification votes for one tile-year
#[derive(Debug, Clone)]
pub struct TileAccumulator {
    tile: Tile,
    rows: usize,
    cols: usize,
    cell_size: f64,
    with_confusion: bool,
    forestry: Array2<u16>,
    cropgrass: Array2<u16>,
    bogheath: Array2<u16>,
    heathforest: Array2<u16>,
    urban: Array2<u16>,
    water: Array2<u16>,
    forestcrop: Array2<u16>,
    forestcropheath: Array2<u16>,
    denominator: Array2<u16>,
    scenes: Vec<String>,
}

/// Closed accumulator: everything the tile drivers write to disk
#[derive(Debug, Clone)]
pub struct TileAggregate {
    pub percents: Vec<(Category, Raster<u16>)>,
    pub denominator: Raster<u16>,
    pub majority: Raster<u8>,
    pub scenes: Vec<String>,
}

impl TileAccumulator {
    /// `with_confusion` enables the forest/crop confusion counters fed
    /// by classification codes 10 and 11
    pub fn new(tile: &Tile, cell_size: f64, with_confusion: bool) -> Self {
        let (rows, cols) = tile.raster_shape(cell_size);
        Self {
            tile: tile.clone(),
            rows,
            cols,
            cell_size,
            with_confusion,
            forestry: Array2::zeros((rows, cols)),
            cropgrass: Array2::zeros((rows, cols)),
            bogheath: Array2::zeros((rows, cols)),
            heathforest: Array2::zeros((rows, cols)),
            urban: Array2::zeros((rows, cols)),
            water: Array2::zeros((rows, cols)),
            forestcrop: Array2::zeros((rows, cols)),
            forestcropheath: Array2::zeros((rows, cols)),
            denominator: Array2::zeros((rows, cols)),
            scenes: Vec::new(),
        }
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Paste one classified scene into the tile counters.
    ///
    /// Both grids are axis-aligned at the same cell size; each tile
    /// pixel samples the scene pixel containing its center. Pixels
    /// outside the scene, and unclassified pixels, add nothing.
    pub fn add_scene(&mut self, classes: &Raster<u8>, name: &str) -> Result<()> {
        if classes.is_empty() {
            return Err(Error::InvalidDimensions {
                width: classes.cols(),
                height: classes.rows(),
            });
        }
        let tile_transform = self.tile.transform(self.cell_size);
        let half = self.cell_size / 2.0;

        for row in 0..self.rows {
            for col in 0..self.cols {
                let (x, y) = tile_transform.pixel_to_world(col as i64, row as i64);
                let (scol, srow) = classes.world_to_pixel(x + half, y - half);
                if srow < 0 || scol < 0 {
                    continue;
                }
                let (srow, scol) = (srow as usize, scol as usize);
                if srow >= classes.rows() || scol >= classes.cols() {
                    continue;
                }
                let code = unsafe { classes.get_unchecked(srow, scol) };
                match code {
                    0 => continue,
                    1 => self.water[(row, col)] += 1,
                    2 => self.urban[(row, col)] += 1,
                    3 | 5 => self.bogheath[(row, col)] += 1,
                    4 | 6 => self.cropgrass[(row, col)] += 1,
                    7 | 8 => self.forestry[(row, col)] += 1,
                    9 => self.heathforest[(row, col)] += 1,
                    10 if self.with_confusion => self.forestcrop[(row, col)] += 1,
                    11 if self.with_confusion => self.forestcropheath[(row, col)] += 1,
                    _ => {}
                }
                if (1..=11).contains(&code) {
                    self.denominator[(row, col)] += 1;
                }
            }
        }
        self.scenes.push(name.to_string());
        Ok(())
    }

    /// Derive the tie-confusion counters, probabilities and per-pixel
    /// majority
    pub fn finish(self) -> TileAggregate {
        let shape = (self.rows, self.cols);
        let tied_sum = |a: &Array2<u16>, b: &Array2<u16>| -> Array2<u16> {
            let mut out = Array2::zeros(shape);
            for ((o, &av), &bv) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
                if av == bv {
                    *o = av + bv;
                }
            }
            out
        };
        let bogforest = tied_sum(&self.bogheath, &self.forestry);
        let cropforest = tied_sum(&self.cropgrass, &self.forestry);
        let cropbog = tied_sum(&self.cropgrass, &self.bogheath);

        let mut counts: Vec<(Category, &Array2<u16>)> = vec![
            (Category::Forestry, &self.forestry),
            (Category::CropGrass, &self.cropgrass),
            (Category::BogHeath, &self.bogheath),
            (Category::HeathForest, &self.heathforest),
            (Category::Urban, &self.urban),
            (Category::Water, &self.water),
            (Category::BogForest, &bogforest),
            (Category::CropForest, &cropforest),
            (Category::CropBog, &cropbog),
        ];
        if self.with_confusion {
            counts.push((Category::ForestCrop, &self.forestcrop));
            counts.push((Category::ForestCropHeath, &self.forestcropheath));
        }

        let transform = self.tile.transform(self.cell_size);
        let template: Raster<u8> = {
            let mut r = Raster::new(1, 1);
            r.set_transform(transform);
            r
        };

        let percents: Vec<(Category, Raster<u16>)> = counts
            .iter()
            .map(|&(category, count)| {
                let mut pct: Raster<u16> = template.with_same_meta(self.rows, self.cols);
                for ((o, &c), &d) in pct
                    .data_mut()
                    .iter_mut()
                    .zip(count.iter())
                    .zip(self.denominator.iter())
                {
                    if d > 0 {
                        *o = (c as u32 * 10000 / d as u32) as u16;
                    }
                }
                (category, pct)
            })
            .collect();

        // Majority candidate order fixes the output class codes: water
        // is 1, forestry 5, the confusion codes 10 and 11 come last.
        // Ties resolve to the lowest code.
        let mut candidates: Vec<&Array2<u16>> = vec![
            &self.water,
            &self.urban,
            &self.cropgrass,
            &self.bogheath,
            &self.forestry,
            &self.heathforest,
            &cropbog,
            &cropforest,
            &bogforest,
        ];
        if self.with_confusion {
            candidates.push(&self.forestcrop);
            candidates.push(&self.forestcropheath);
        }

        let majority_data: Vec<u8> = (0..self.rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![0u8; self.cols];
                for col in 0..self.cols {
                    let mut best = 0u16;
                    let mut best_idx = 0u8;
                    for (i, counter) in candidates.iter().enumerate() {
                        let v = counter[(row, col)];
                        if v > best {
                            best = v;
                            best_idx = i as u8 + 1;
                        }
                    }
                    row_data[col] = best_idx;
                }
                row_data
            })
            .collect();
        let mut majority = Raster::from_array(
            Array2::from_shape_vec(shape, majority_data).unwrap_or_else(|_| Array2::zeros(shape)),
        );
        majority.set_transform(transform);

        let mut denominator = Raster::from_array(self.denominator);
        denominator.set_transform(transform);

        TileAggregate {
            percents,
            denominator,
            majority,
            scenes: self.scenes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoforest_core::GeoTransform;

    fn tile() -> Tile {
        Tile::from_bounds("T1", 0.0, 0.0, 300.0, 300.0)
    }

    fn scene_raster(code: u8) -> Raster<u8> {
        let mut r = Raster::filled(10, 10, code);
        r.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        r
    }

    fn pct<'a>(agg: &'a TileAggregate, category: Category) -> &'a Raster<u16> {
        &agg
            .percents
            .iter()
            .find(|(c, _)| *c == category)
            .unwrap()
            .1
    }

    #[test]
    fn test_full_coverage_gives_10000() {
        let mut acc = TileAccumulator::new(&tile(), 30.0, false);
        acc.add_scene(&scene_raster(8), "a").unwrap();
        acc.add_scene(&scene_raster(7), "b").unwrap();
        let agg = acc.finish();

        assert_eq!(pct(&agg, Category::Forestry).get(5, 5).unwrap(), 10000);
        assert_eq!(pct(&agg, Category::Water).get(5, 5).unwrap(), 0);
        assert_eq!(agg.denominator.get(5, 5).unwrap(), 2);
        // Forestry sits at index 5 of the majority candidate list
        assert_eq!(agg.majority.get(5, 5).unwrap(), 5);
    }

    #[test]
    fn test_no_observations_stays_zero() {
        let acc = TileAccumulator::new(&tile(), 30.0, false);
        let agg = acc.finish();
        assert_eq!(agg.denominator.get(0, 0).unwrap(), 0);
        assert_eq!(pct(&agg, Category::Forestry).get(0, 0).unwrap(), 0);
        assert_eq!(agg.majority.get(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_tie_categories_sum_equal_counts() {
        let mut acc = TileAccumulator::new(&tile(), 30.0, false);
        // One forestry vote and one bog/heath vote per pixel
        acc.add_scene(&scene_raster(8), "a").unwrap();
        acc.add_scene(&scene_raster(3), "b").unwrap();
        let agg = acc.finish();

        // 1 == 1, so bogforest carries both votes: 2 of 2 observations
        assert_eq!(pct(&agg, Category::BogForest).get(4, 4).unwrap(), 10000);
        assert_eq!(pct(&agg, Category::Forestry).get(4, 4).unwrap(), 5000);
        // bogforest (sum 2) outvotes forestry and bogheath (1 each)
        assert_eq!(agg.majority.get(4, 4).unwrap(), 9);
    }

    #[test]
    fn test_majority_tie_takes_lowest_index() {
        let mut acc = TileAccumulator::new(&tile(), 30.0, false);
        // Water and urban each get one vote; water is earlier in the
        // candidate order
        acc.add_scene(&scene_raster(1), "a").unwrap();
        acc.add_scene(&scene_raster(2), "b").unwrap();
        let agg = acc.finish();
        assert_eq!(agg.majority.get(0, 0).unwrap(), 1);
    }

    #[test]
    fn test_partial_overlap_pastes_window() {
        // Scene covers only the eastern half of the tile
        let mut scene = Raster::filled(10, 5, 7u8);
        scene.set_transform(GeoTransform::new(150.0, 300.0, 30.0, -30.0));

        let mut acc = TileAccumulator::new(&tile(), 30.0, false);
        acc.add_scene(&scene, "east").unwrap();
        let agg = acc.finish();

        assert_eq!(agg.denominator.get(3, 7).unwrap(), 1);
        assert_eq!(agg.denominator.get(3, 2).unwrap(), 0);
        assert_eq!(pct(&agg, Category::Forestry).get(3, 7).unwrap(), 10000);
    }

    #[test]
    fn test_confusion_codes_ignored_without_flag() {
        let mut acc = TileAccumulator::new(&tile(), 30.0, false);
        acc.add_scene(&scene_raster(10), "a").unwrap();
        let agg = acc.finish();
        // Code 10 still counts as an observation but feeds no category
        assert_eq!(agg.denominator.get(0, 0).unwrap(), 1);
        assert_eq!(agg.majority.get(0, 0).unwrap(), 0);
        assert!(!agg.percents.iter().any(|(c, _)| *c == Category::ForestCrop));

        let mut acc = TileAccumulator::new(&tile(), 30.0, true);
        acc.add_scene(&scene_raster(10), "a").unwrap();
        let agg = acc.finish();
        assert_eq!(pct(&agg, Category::ForestCrop).get(0, 0).unwrap(), 10000);
        assert_eq!(agg.majority.get(0, 0).unwrap(), 10);
    }
}

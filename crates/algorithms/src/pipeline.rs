//! Batch pipeline drivers
//!
//! Orchestrates the full processing chain: scene discovery and
//! classification, per-tile probability aggregation, yearly composites,
//! the forestry-class remap and multi-year change detection. Every
//! stage is idempotent: existing outputs are skipped unless the run is
//! set to overwrite.

use crate::aggregate::TileAccumulator;
use crate::change::detect_change;
use crate::classify::{classify_scene, Classifier, SceneBands};
use crate::composite::{forestry_class, resolve_composite, CompositeInputs};
use crate::config::RunConfig;
use eoforest_core::io::{read_envi, read_envi_bands, write_envi, EnviHeader, EnviScalar};
use eoforest_core::product::{Category, ObservationKind, Product};
use eoforest_core::report::{read_bad_list, ErrorLog, ReprocessQueue};
use eoforest_core::scene::SceneId;
use eoforest_core::vector::{raster_footprint, Tile, TileGrid};
use eoforest_core::{Error, Raster, Result};
use ndarray::Array2;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of surface-reflectance scene files
const REFLECTANCE_SUFFIX: &str = "_ref_ITM.dat";

/// A discovered scene: reflectance stack plus its cloud mask, when one
/// exists
#[derive(Debug, Clone)]
pub struct SceneSource {
    pub id: SceneId,
    pub reflectance: PathBuf,
    pub mask: Option<PathBuf>,
}

/// Why a scene/classifier pair produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOutcome {
    Classified,
    OutputExists,
    NoCloudMask,
    InsufficientPixels { clear: usize },
}

/// Classification stage totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub classified: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// One configured processing run
pub struct Pipeline {
    config: RunConfig,
    tiles: TileGrid,
    error_log: ErrorLog,
    reprocess: ReprocessQueue,
    bad_dates: HashSet<String>,
}

impl Pipeline {
    /// Build a pipeline from a config. A missing tile index aborts the
    /// run; a missing exclusion list is only a warning.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let tiles = TileGrid::from_index(&config.tile_index)?;
        std::fs::create_dir_all(&config.output_dir)?;
        let error_log = ErrorLog::new(config.output_dir.join("errors.csv"));
        let reprocess = ReprocessQueue::new(config.output_dir.join("reprocess.txt"));
        let bad_dates = match &config.bad_list {
            Some(path) if path.is_file() => read_bad_list(path)?,
            Some(path) => {
                warn!(path = %path.display(), "scene exclusion list missing");
                HashSet::new()
            }
            None => HashSet::new(),
        };
        Ok(Self {
            config,
            tiles,
            error_log,
            reprocess,
            bad_dates,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// Find all in-season scenes within the configured year range
    pub fn discover_scenes(&self) -> Result<Vec<SceneSource>> {
        let mut sources = Vec::new();
        for entry in std::fs::read_dir(&self.config.scene_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(REFLECTANCE_SUFFIX) {
                continue;
            }
            let Ok(id) = SceneId::parse(name) else {
                debug!(file = name, "skipping file with unparsable scene id");
                continue;
            };
            if id.year() < self.config.start_year
                || id.year() > self.config.end_year
                || !self.config.in_season(id.day_of_year())
            {
                continue;
            }
            let mask = self.mask_path(&id);
            sources.push(SceneSource {
                id,
                reflectance: entry.path(),
                mask,
            });
        }
        sources.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        info!(scenes = sources.len(), "scene discovery complete");
        Ok(sources)
    }

    /// Cloud mask path for a scene: the newer mask naming first, then
    /// the legacy one
    fn mask_path(&self, id: &SceneId) -> Option<PathBuf> {
        for suffix in ["_cfmask.dat", "_fmask.dat"] {
            let candidate = self.config.mask_dir.join(format!("{id}{suffix}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Classify one scene with one classifier and write the output
    pub fn classify_one(
        &self,
        source: &SceneSource,
        classifier: &Classifier,
    ) -> Result<SceneOutcome> {
        let class_dir = self.config.class_dir(classifier);
        std::fs::create_dir_all(&class_dir)?;
        let product = classifier.product(source.id.clone());
        let out_path = class_dir.join(product.base_filename());
        if out_path.exists() && !self.config.overwrite {
            debug!(scene = source.id.as_str(), "output exists, skipping");
            return Ok(SceneOutcome::OutputExists);
        }

        let Some(mask_path) = &source.mask else {
            warn!(scene = source.id.as_str(), "cloud mask missing");
            self.error_log
                .record(source.id.as_str(), "cloud mask missing")?;
            self.reprocess.push(source.id.as_str())?;
            return Ok(SceneOutcome::NoCloudMask);
        };

        let (mask, _) = read_envi::<u8, _>(mask_path)?;
        let clear = mask.count_equal(0);
        if clear < self.config.min_pixels {
            info!(
                scene = source.id.as_str(),
                clear, "not enough clear land pixels"
            );
            return Ok(SceneOutcome::InsufficientPixels { clear });
        }

        let (bands, _) = read_envi_bands::<i16, _>(&source.reflectance)?;
        let scene = assemble_bands(&source.id, bands)?;
        let classes = classify_scene(
            &scene,
            mask.data(),
            classifier,
            source.id.sensor().coeffs(),
        )?;

        let parents = vec![
            path_name(&source.reflectance),
            path_name(mask_path),
        ];
        let header = EnviHeader::for_product(&classes, &product, parents);
        write_envi(&out_path, &classes, &header)?;
        info!(scene = source.id.as_str(), out = %out_path.display(), "scene classified");
        Ok(SceneOutcome::Classified)
    }

    /// Classify every discovered scene with every configured
    /// classifier. Processing errors are logged and retried; a scene
    /// with no usable mask or too few clear pixels skips its remaining
    /// classifiers.
    pub fn classify_scenes(&self) -> Result<RunSummary> {
        let sources = self.discover_scenes()?;
        let classifiers = self.config.classifiers();
        let mut summary = RunSummary::default();

        for source in &sources {
            'classifiers: for classifier in &classifiers {
                let mut attempts = 0;
                loop {
                    match self.classify_one(source, classifier) {
                        Ok(SceneOutcome::Classified) => {
                            summary.classified += 1;
                            break;
                        }
                        Ok(SceneOutcome::OutputExists) => {
                            summary.skipped += 1;
                            break;
                        }
                        Ok(_) => {
                            // The scene itself is unusable, not just
                            // this classifier
                            summary.skipped += 1;
                            break 'classifiers;
                        }
                        Err(e) => {
                            attempts += 1;
                            self.error_log.record(source.id.as_str(), &e.to_string())?;
                            if attempts >= self.config.max_retries {
                                warn!(
                                    scene = source.id.as_str(),
                                    attempts, error = %e, "giving up on scene"
                                );
                                summary.failed += 1;
                                break;
                            }
                            debug!(scene = source.id.as_str(), attempts, "retrying scene");
                        }
                    }
                }
            }
        }
        Ok(summary)
    }

    /// Classified scenes of one classifier that overlap a tile within
    /// a year window, excluding dates on the bad list
    fn tile_scenes(
        &self,
        tile: &Tile,
        classifier: &Classifier,
        first_year: i32,
        last_year: i32,
    ) -> Result<Vec<(PathBuf, SceneId)>> {
        let class_dir = self.config.class_dir(classifier);
        if !class_dir.is_dir() {
            return Ok(Vec::new());
        }
        let suffix = format!("_{}class.dat", classifier.name());
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&class_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(&suffix) {
                continue;
            }
            let Ok(id) = SceneId::parse(name) else { continue };
            if id.year() < first_year || id.year() > last_year {
                continue;
            }
            if self.bad_dates.contains(id.date_code()) {
                debug!(scene = id.as_str(), "scene is on the exclusion list");
                continue;
            }
            out.push((entry.path(), id));
        }
        out.sort_by(|a, b| a.1.as_str().cmp(b.1.as_str()));
        Ok(out)
    }

    /// Aggregate one tile-year (or year span) into probability,
    /// observation-count and majority rasters. Returns the probability
    /// directory, or `None` when no scene overlapped the tile.
    pub fn aggregate_tile(
        &self,
        tile: &Tile,
        classifier: &Classifier,
        year: i32,
    ) -> Result<Option<PathBuf>> {
        let last_year = year + self.config.year_span.unwrap_or(1) - 1;
        let span_end = self.config.year_span.map(|_| last_year);
        let prob_dir = self.config.probability_dir(classifier);
        std::fs::create_dir_all(&prob_dir)?;

        let thresholds = Some(classifier.thresholds());
        let majority_product = Product::Majority {
            tile: tile.name().to_string(),
            year,
            thresholds,
        };
        let majority_path = prob_dir.join(majority_product.base_filename());
        if majority_path.exists() && !self.config.overwrite {
            debug!(tile = tile.name(), year, "majority raster exists, skipping");
            return Ok(Some(prob_dir));
        }

        let candidates = self.tile_scenes(tile, classifier, year, last_year)?;
        let mut acc = TileAccumulator::new(tile, self.config.cell_size, classifier.with_confusion());
        for (path, id) in &candidates {
            let (classes, _) = read_envi::<u8, _>(path)?;
            let footprint = raster_footprint(classes.transform(), classes.rows(), classes.cols());
            if !tile.intersects(&footprint) {
                continue;
            }
            acc.add_scene(&classes, &path_name(path))?;
            debug!(tile = tile.name(), scene = id.as_str(), "scene added to tile");
        }
        if acc.scene_count() == 0 {
            info!(tile = tile.name(), year, "no scenes overlap tile");
            return Ok(None);
        }

        let tile_name = tile.name().to_string();
        let agg = acc.finish();
        info!(
            tile = tile.name(),
            year,
            scenes = agg.scenes.len(),
            "writing tile probabilities"
        );

        let denominator = Product::Denominator {
            tile: tile_name.clone(),
            year,
            thresholds,
        };
        self.write_product(&prob_dir, &denominator, &agg.denominator, agg.scenes.clone())?;
        for (category, pct) in &agg.percents {
            let product = Product::Percent {
                category: *category,
                tile: tile_name.clone(),
                year,
                span_end,
                thresholds,
            };
            self.write_product(&prob_dir, &product, pct, agg.scenes.clone())?;
        }
        self.write_product(&prob_dir, &majority_product, &agg.majority, agg.scenes)?;
        Ok(Some(prob_dir))
    }

    /// Resolve one tile-year composite from its probability rasters
    pub fn composite_tile(&self, tile_name: &str, classifier: &Classifier, year: i32) -> Result<()> {
        let prob_dir = self.config.probability_dir(classifier);
        let last_year = year + self.config.year_span.unwrap_or(1) - 1;
        let span_end = self.config.year_span.map(|_| last_year);
        let thresholds = Some(classifier.thresholds());

        let product = Product::YearlyComposite {
            tile: tile_name.to_string(),
            year,
            span_end,
            thresholds,
        };
        let out_path = prob_dir.join(product.base_filename());
        if out_path.exists() && !self.config.overwrite {
            debug!(tile = tile_name, year, "composite exists, skipping");
            return Ok(());
        }

        let pct_path = |category: Category| {
            let p = Product::Percent {
                category,
                tile: tile_name.to_string(),
                year,
                span_end,
                thresholds: None,
            };
            prob_dir.join(p.base_filename())
        };
        let mut required = vec![
            pct_path(Category::Forestry),
            pct_path(Category::CropGrass),
            pct_path(Category::BogHeath),
            pct_path(Category::HeathForest),
            pct_path(Category::BogForest),
            pct_path(Category::Urban),
            pct_path(Category::Water),
        ];
        if classifier.with_confusion() {
            required.push(pct_path(Category::ForestCrop));
            required.push(pct_path(Category::ForestCropHeath));
        }
        if let Some(missing) = required.iter().find(|p| !p.is_file()) {
            warn!(tile = tile_name, year, missing = %missing.display(), "probability raster missing");
            return Ok(());
        }

        let read = |path: &Path| -> Result<Raster<u16>> { Ok(read_envi::<u16, _>(path)?.0) };
        let inputs = CompositeInputs {
            forestry: read(&required[0])?,
            cropgrass: read(&required[1])?,
            bogheath: read(&required[2])?,
            heathforest: read(&required[3])?,
            bogforest: read(&required[4])?,
            urban: read(&required[5])?,
            water: read(&required[6])?,
            forestcrop: if classifier.with_confusion() {
                Some(read(&required[7])?)
            } else {
                None
            },
            forestcropheath: if classifier.with_confusion() {
                Some(read(&required[8])?)
            } else {
                None
            },
        };
        let composite = resolve_composite(&inputs)?;
        let parents = required.iter().map(|p| path_name(p)).collect();
        self.write_product(&prob_dir, &product, &composite, parents)?;
        info!(tile = tile_name, year, "composite written");
        Ok(())
    }

    /// Remap one tile-year composite to the four forestry classes
    pub fn forestry_class_tile(
        &self,
        tile_name: &str,
        classifier: &Classifier,
        year: i32,
    ) -> Result<()> {
        let prob_dir = self.config.probability_dir(classifier);
        let forestry_dir = self.config.forestry_dir(classifier);
        std::fs::create_dir_all(&forestry_dir)?;
        let thresholds = Some(classifier.thresholds());

        let product = Product::ForestryClass {
            tile: tile_name.to_string(),
            year,
            thresholds,
        };
        let out_path = forestry_dir.join(product.base_filename());
        if out_path.exists() && !self.config.overwrite {
            debug!(tile = tile_name, year, "forestry class exists, skipping");
            return Ok(());
        }

        let composite_product = Product::YearlyComposite {
            tile: tile_name.to_string(),
            year,
            span_end: None,
            thresholds: None,
        };
        let composite_path = prob_dir.join(composite_product.base_filename());
        if !composite_path.is_file() {
            warn!(tile = tile_name, year, "composite missing, cannot remap");
            return Ok(());
        }
        let (composite, _) = read_envi::<u8, _>(&composite_path)?;
        let remapped = forestry_class(&composite);
        self.write_product(
            &forestry_dir,
            &product,
            &remapped,
            vec![path_name(&composite_path)],
        )?;
        Ok(())
    }

    /// Run change detection over a tile's yearly forestry-class stack.
    ///
    /// Years without a forestry-class raster contribute no-data to
    /// every signal. When a national forestry mask is configured, only
    /// pixels the mask marks as forestry are analysed.
    pub fn detect_tile_changes(&self, tile_name: &str, classifier: &Classifier) -> Result<()> {
        let forestry_dir = self.config.forestry_dir(classifier);
        if !forestry_dir.is_dir() {
            return Ok(());
        }
        let change_dir = forestry_dir.join("Change");
        std::fs::create_dir_all(&change_dir)?;
        let thresholds = Some(classifier.thresholds());

        let reforested_product = Product::EventYear {
            tile: tile_name.to_string(),
            observation: ObservationKind::Reforested,
            thresholds,
        };
        let refor_path = change_dir.join(reforested_product.base_filename());
        if refor_path.exists() && !self.config.overwrite {
            debug!(tile = tile_name, "change maps exist, skipping");
            return Ok(());
        }

        let years: Vec<i32> = (self.config.start_year..=self.config.end_year).collect();
        let mut stack: Vec<Option<Raster<u8>>> = Vec::with_capacity(years.len());
        let mut parents = Vec::new();
        for &year in &years {
            let product = Product::ForestryClass {
                tile: tile_name.to_string(),
                year,
                thresholds: None,
            };
            let path = forestry_dir.join(product.base_filename());
            if path.is_file() {
                parents.push(path_name(&path));
                stack.push(Some(read_envi::<u8, _>(&path)?.0));
            } else {
                stack.push(None);
            }
        }
        let Some(first) = stack.iter().flatten().next() else {
            info!(tile = tile_name, "no forestry-class rasters, skipping change detection");
            return Ok(());
        };
        let (rows, cols) = first.shape();
        let transform = *first.transform();

        let forestry_mask = match &self.config.forestry_mask {
            Some(path) => Some(read_envi::<u8, _>(path)?.0),
            None => None,
        };

        let mut start_class: Raster<u8> = first.with_same_meta(rows, cols);
        let mut end_class: Raster<u8> = first.with_same_meta(rows, cols);
        let mut status: Raster<u8> = first.with_same_meta(rows, cols);
        let mut clearcut: Raster<u16> = first.with_same_meta(rows, cols);
        let mut afforested: Raster<u16> = first.with_same_meta(rows, cols);
        let mut reforested: Raster<u16> = first.with_same_meta(rows, cols);
        let mut status_year: Raster<u16> = first.with_same_meta(rows, cols);

        let mut signal = vec![0u8; years.len()];
        let mut unresolved = 0usize;
        for row in 0..rows {
            for col in 0..cols {
                if let Some(mask) = &forestry_mask {
                    if !mask_selects(mask, &transform, row, col) {
                        continue;
                    }
                }
                for (v, layer) in signal.iter_mut().zip(&stack) {
                    *v = match layer {
                        Some(raster) => unsafe { raster.get_unchecked(row, col) },
                        None => 0,
                    };
                }
                let record = match detect_change(&signal, &years, self.config.end_year) {
                    Ok(record) => record,
                    Err(Error::SignalUnresolved { .. }) => {
                        unresolved += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                start_class.set(row, col, record.start_class)?;
                end_class.set(row, col, record.end_class)?;
                status.set(row, col, record.status.code())?;
                clearcut.set(row, col, record.clearcut.max(0) as u16)?;
                afforested.set(row, col, record.afforested.max(0) as u16)?;
                reforested.set(row, col, record.reforested.max(0) as u16)?;
                status_year.set(row, col, record.status_year.max(0) as u16)?;
            }
        }
        if unresolved > 0 {
            warn!(tile = tile_name, pixels = unresolved, "signals left unresolved");
        }

        let tile = tile_name.to_string();
        self.write_product(
            &change_dir,
            &Product::ForestryClass {
                tile: tile.clone(),
                year: self.config.start_year,
                thresholds,
            },
            &start_class,
            parents.clone(),
        )?;
        self.write_product(
            &change_dir,
            &Product::ForestryClass {
                tile: tile.clone(),
                year: self.config.end_year,
                thresholds,
            },
            &end_class,
            parents.clone(),
        )?;
        self.write_product(
            &change_dir,
            &Product::ForestryStatus {
                tile: tile.clone(),
                start_year: self.config.start_year,
                end_year: self.config.end_year,
                thresholds,
            },
            &status,
            parents.clone(),
        )?;
        for (observation, raster) in [
            (ObservationKind::Clearcut, &clearcut),
            (ObservationKind::Afforested, &afforested),
            (ObservationKind::StatusYear, &status_year),
            (ObservationKind::Reforested, &reforested),
        ] {
            self.write_product(
                &change_dir,
                &Product::EventYear {
                    tile: tile.clone(),
                    observation,
                    thresholds,
                },
                raster,
                parents.clone(),
            )?;
        }
        info!(tile = tile_name, "change maps written");
        Ok(())
    }

    /// Run the whole pipeline: classify, then aggregate, composite,
    /// remap and detect change per tile
    pub fn run(&self) -> Result<RunSummary> {
        let summary = self.classify_scenes()?;
        let step = self.config.year_span.unwrap_or(1).max(1);
        for classifier in self.config.classifiers() {
            for tile in self.tiles.iter() {
                let mut year = self.config.start_year;
                while year <= self.config.end_year {
                    if self.aggregate_tile(tile, &classifier, year)?.is_some() {
                        self.composite_tile(tile.name(), &classifier, year)?;
                        self.forestry_class_tile(tile.name(), &classifier, year)?;
                    }
                    year += step;
                }
                self.detect_tile_changes(tile.name(), &classifier)?;
            }
        }
        Ok(summary)
    }

    fn write_product<T: EnviScalar>(
        &self,
        dir: &Path,
        product: &Product,
        raster: &Raster<T>,
        parents: Vec<String>,
    ) -> Result<PathBuf> {
        let path = dir.join(product.base_filename());
        let header = EnviHeader::for_product(raster, product, parents);
        write_envi(&path, raster, &header)?;
        Ok(path)
    }
}

/// Whether the national forestry mask marks the map location of a tile
/// pixel
fn mask_selects(
    mask: &Raster<u8>,
    transform: &eoforest_core::GeoTransform,
    row: usize,
    col: usize,
) -> bool {
    let cell = transform.cell_size();
    let (x, y) = transform.pixel_to_world(col as i64, row as i64);
    let (mcol, mrow) = mask.world_to_pixel(x + cell / 2.0, y - cell / 2.0);
    if mrow < 0 || mcol < 0 {
        return false;
    }
    let (mrow, mcol) = (mrow as usize, mcol as usize);
    if mrow >= mask.rows() || mcol >= mask.cols() {
        return false;
    }
    unsafe { mask.get_unchecked(mrow, mcol) == 1 }
}

/// Order the six reflectance bands for the scene's sensor
fn assemble_bands(id: &SceneId, bands: Vec<Raster<i16>>) -> Result<SceneBands> {
    let layout = id.sensor().reflectance_bands();
    let needed = layout[5];
    if bands.len() < needed {
        return Err(Error::Other(format!(
            "scene {} has {} bands, sensor layout needs {needed}",
            id,
            bands.len()
        )));
    }
    let transform = *bands[0].transform();
    let mut arrays: Vec<Array2<i16>> = bands.into_iter().map(|r| r.into_array()).collect();
    let mut take = |band: usize| std::mem::take(&mut arrays[band - 1]);
    Ok(SceneBands {
        blue: take(layout[0]),
        green: take(layout[1]),
        red: take(layout[2]),
        nir: take(layout[3]),
        swir1: take(layout[4]),
        swir2: take(layout[5]),
        transform,
    })
}

fn path_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoforest_core::scene::Sensor;
    use eoforest_core::GeoTransform;

    fn band(value: i16) -> Raster<i16> {
        let mut r = Raster::filled(2, 2, value);
        r.set_transform(GeoTransform::new(0.0, 60.0, 30.0, -30.0));
        r
    }

    #[test]
    fn test_assemble_bands_tm_layout() {
        let id = SceneId::parse("LT50230241995182AAA02").unwrap();
        let bands = (1i16..=6).map(|b| band(b * 100)).collect();
        let scene = assemble_bands(&id, bands).unwrap();
        assert_eq!(scene.blue[(0, 0)], 100);
        assert_eq!(scene.swir2[(0, 0)], 600);
    }

    #[test]
    fn test_assemble_bands_oli_layout() {
        // OLI stacks carry the coastal band first
        let id = SceneId::parse("LC80230242014150LGN00").unwrap();
        assert_eq!(id.sensor(), Sensor::Lc8);
        let bands = (1i16..=7).map(|b| band(b * 100)).collect();
        let scene = assemble_bands(&id, bands).unwrap();
        assert_eq!(scene.blue[(0, 0)], 200);
        assert_eq!(scene.swir2[(0, 0)], 700);
    }

    #[test]
    fn test_assemble_bands_rejects_short_stack() {
        let id = SceneId::parse("LT50230241995182AAA02").unwrap();
        let bands = (1i16..=4).map(band).collect();
        assert!(assemble_bands(&id, bands).is_err());
    }

    #[test]
    fn test_mask_selection_maps_coordinates() {
        // Mask grid offset one pixel east of the tile grid
        let mut mask: Raster<u8> = Raster::new(2, 2);
        mask.set_transform(GeoTransform::new(30.0, 60.0, 30.0, -30.0));
        mask.set(0, 0, 1).unwrap();

        let tile_transform = GeoTransform::new(0.0, 60.0, 30.0, -30.0);
        // Tile pixel (0, 1) sits over mask pixel (0, 0)
        assert!(mask_selects(&mask, &tile_transform, 0, 1));
        assert!(!mask_selects(&mask, &tile_transform, 0, 0));
        assert!(!mask_selects(&mask, &tile_transform, 1, 1));
    }
}

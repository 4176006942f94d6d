//! End-to-end pipeline run over a synthetic scene archive

use eoforest_algorithms::config::{RunConfig, Variant};
use eoforest_algorithms::pipeline::Pipeline;
use eoforest_core::io::{read_envi, write_envi, write_envi_bands, EnviHeader};
use eoforest_core::{GeoTransform, Raster};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROWS: usize = 10;
const COLS: usize = 10;

/// Closed canopy below the forest/grass threshold: classifies as
/// mature forest under every variant
const FOREST: [i16; 6] = [300, 500, 400, 2500, 1200, 2000];

fn transform() -> GeoTransform {
    GeoTransform::new(0.0, 300.0, 30.0, -30.0)
}

fn band(value: i16) -> Raster<i16> {
    let mut r = Raster::filled(ROWS, COLS, value);
    r.set_transform(transform());
    r
}

fn write_scene(dir: &Path, scene_id: &str, px: [i16; 6]) {
    let bands: Vec<Raster<i16>> = px.iter().map(|&v| band(v)).collect();
    let header = EnviHeader {
        samples: COLS,
        lines: ROWS,
        bands: 6,
        data_type: 2,
        description: format!("Surface reflectance for {scene_id}"),
        transform: Some(transform()),
        ..EnviHeader::default()
    };
    write_envi_bands(dir.join(format!("{scene_id}_ref_ITM.dat")), &bands, &header).unwrap();
}

fn write_mask(dir: &Path, scene_id: &str, value: u8) {
    let mut mask = Raster::filled(ROWS, COLS, value);
    mask.set_transform(transform());
    let header = EnviHeader {
        samples: COLS,
        lines: ROWS,
        bands: 1,
        data_type: 1,
        transform: Some(transform()),
        ..EnviHeader::default()
    };
    write_envi(dir.join(format!("{scene_id}_cfmask.dat")), &mask, &header).unwrap();
}

fn config(root: &Path) -> RunConfig {
    let scene_dir = root.join("scenes");
    let mask_dir = root.join("masks");
    fs::create_dir_all(&scene_dir).unwrap();
    fs::create_dir_all(&mask_dir).unwrap();
    let tile_index = root.join("tiles.csv");
    fs::write(&tile_index, "T1,0,0,300,300\n").unwrap();
    RunConfig {
        scene_dir,
        mask_dir,
        output_dir: root.join("output"),
        tile_index,
        variant: Variant::Dt4b,
        start_year: 1995,
        end_year: 1996,
        min_pixels: 50,
        ..RunConfig::default()
    }
}

#[test]
fn test_full_run_over_forest_tile() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    write_scene(&cfg.scene_dir, "LT50230241995182AAA02", FOREST);
    write_mask(&cfg.mask_dir, "LT50230241995182AAA02", 0);
    write_scene(&cfg.scene_dir, "LT50230241996185AAA02", FOREST);
    write_mask(&cfg.mask_dir, "LT50230241996185AAA02", 0);

    let pipeline = Pipeline::new(cfg.clone()).unwrap();
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.classified, 2);
    assert_eq!(summary.failed, 0);

    // Scene classification
    let class_path = cfg
        .output_dir
        .join("dt4b")
        .join("LT50230241995182AAA02_DT4bclass.dat");
    let (classes, header) = read_envi::<u8, _>(&class_path).unwrap();
    assert_eq!(classes.get(4, 4).unwrap(), 8);
    assert_eq!(header.class_names.len(), 12);

    // Tile probabilities: every observation voted forestry
    let prob_dir = cfg.output_dir.join("dt4b").join("Probability");
    let (pct, _) = read_envi::<u16, _>(prob_dir.join("forestry_pct_1995_T1.dat")).unwrap();
    assert_eq!(pct.get(3, 3).unwrap(), 10000);
    let (obs, _) = read_envi::<u16, _>(prob_dir.join("Obs_1995_T1.dat")).unwrap();
    assert_eq!(obs.get(3, 3).unwrap(), 1);
    let (majority, _) = read_envi::<u8, _>(prob_dir.join("Highpos_1995_T1.dat")).unwrap();
    assert_eq!(majority.get(3, 3).unwrap(), 5);

    // Composite resolves forestry outright, which remaps to forest
    let (composite, _) = read_envi::<u8, _>(prob_dir.join("DT4_class_1995_T1.dat")).unwrap();
    assert_eq!(composite.get(2, 7).unwrap(), 5);
    let forestry_dir = prob_dir.join("Forestry");
    let (fc, _) = read_envi::<u8, _>(forestry_dir.join("forestryclass_1995_T1.dat")).unwrap();
    assert_eq!(fc.get(2, 7).unwrap(), 3);

    // Forest in both years: stable forest, no event years
    let change_dir = forestry_dir.join("Change");
    let (status, _) = read_envi::<u8, _>(change_dir.join("forestrystatus_T1.dat")).unwrap();
    assert_eq!(status.get(5, 5).unwrap(), 2);
    let (clearcut, _) = read_envi::<u16, _>(change_dir.join("clearcut_T1.dat")).unwrap();
    assert_eq!(clearcut.get(5, 5).unwrap(), 0);

    // A second run leaves everything on disk alone
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.classified, 0);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_unusable_scenes_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    // Fully clouded scene
    write_scene(&cfg.scene_dir, "LT50230241995182AAA02", FOREST);
    write_mask(&cfg.mask_dir, "LT50230241995182AAA02", 4);
    // Scene with no cloud mask at all
    write_scene(&cfg.scene_dir, "LT50230241996185AAA02", FOREST);
    // Out-of-season acquisition, dropped at discovery
    write_scene(&cfg.scene_dir, "LT50230241995050AAA02", FOREST);
    write_mask(&cfg.mask_dir, "LT50230241995050AAA02", 0);

    let pipeline = Pipeline::new(cfg.clone()).unwrap();
    assert_eq!(pipeline.discover_scenes().unwrap().len(), 2);

    let summary = pipeline.run().unwrap();
    assert_eq!(summary.classified, 0);
    assert_eq!(summary.skipped, 2);
    assert!(!cfg
        .output_dir
        .join("dt4b")
        .join("LT50230241995182AAA02_DT4bclass.dat")
        .exists());

    // The maskless scene lands on the reprocess queue
    let queue = fs::read_to_string(cfg.output_dir.join("reprocess.txt")).unwrap();
    assert!(queue.contains("LT50230241996185AAA02"));
}

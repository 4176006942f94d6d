//! Output product metadata.
//!
//! Every raster the pipeline writes belongs to one product kind with a
//! fixed class legend, color lookup table, band naming and base filename.
//! The variants here replace the string-keyed header dictionaries of older
//! tooling with strongly typed records.

use crate::scene::SceneId;

/// Semantic categories accumulated per tile-year.
///
/// The first six are counted directly from classification codes; the
/// remaining five are tie-derived confusion categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Forestry,
    CropGrass,
    BogHeath,
    HeathForest,
    Urban,
    Water,
    BogForest,
    CropForest,
    CropBog,
    ForestCrop,
    ForestCropHeath,
}

impl Category {
    /// Short name used in percentage-raster filenames
    pub fn name(self) -> &'static str {
        match self {
            Category::Forestry => "forestry",
            Category::CropGrass => "cropgrass",
            Category::BogHeath => "bogheath",
            Category::HeathForest => "heathforest",
            Category::Urban => "urban",
            Category::Water => "water",
            Category::BogForest => "bogforest",
            Category::CropForest => "cropforest",
            Category::CropBog => "cropbog",
            Category::ForestCrop => "forestcrop",
            Category::ForestCropHeath => "forestcropheath",
        }
    }

    /// Human-readable label used in descriptions
    pub fn label(self) -> &'static str {
        match self {
            Category::Forestry => "Forestry",
            Category::CropGrass => "Crop or grassland",
            Category::BogHeath => "Bog or heath",
            Category::HeathForest => "Heath or forest confusion",
            Category::Urban => "Urban",
            Category::Water => "Water",
            Category::BogForest => "Bog or forest confusion",
            Category::CropForest => "Crop or forest confusion",
            Category::CropBog => "Crop or bog confusion",
            Category::ForestCrop => "Forest or crop confusion",
            Category::ForestCropHeath => "Forest or heath or crop confusion",
        }
    }
}

/// Event-year rasters produced by change detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationKind {
    Clearcut,
    Afforested,
    Reforested,
    StatusYear,
}

impl ObservationKind {
    pub fn name(self) -> &'static str {
        match self {
            ObservationKind::Clearcut => "clearcut",
            ObservationKind::Afforested => "afforested",
            ObservationKind::Reforested => "reforested",
            ObservationKind::StatusYear => "statusyearmap",
        }
    }
}

/// Classification legend: class names plus an RGB color lookup table
#[derive(Debug, Clone, Copy)]
pub struct ClassLegend {
    pub names: &'static [&'static str],
    pub lookup: &'static [[u8; 3]],
}

impl ClassLegend {
    pub fn class_count(&self) -> usize {
        self.names.len()
    }
}

const SCENE_CLASS_NAMES_ONE_THRESHOLD: [&str; 10] = [
    "Unclassified",
    "Water",
    "Urban",
    "Bog",
    "Bare Soil",
    "Heath",
    "Grassland/ cropland",
    "Young forest",
    "Mature forest",
    "Possible forest or green heath",
];

const SCENE_CLASS_NAMES_TWO_THRESHOLD: [&str; 12] = [
    "Unclassified",
    "Water",
    "Urban",
    "Bog",
    "Bare Soil",
    "Heath",
    "Grassland/ cropland",
    "Young forest",
    "Mature forest",
    "Possible forest or green heath",
    "Forest/ grass/ crop",
    "Forest/ green heath/ grass/ crop",
];

const SCENE_CLASS_LOOKUP: [[u8; 3]; 12] = [
    [0, 0, 0],
    [0, 0, 255],
    [200, 200, 200],
    [255, 127, 80],
    [160, 82, 45],
    [218, 112, 214],
    [0, 255, 0],
    [165, 214, 0],
    [0, 139, 0],
    [0, 170, 100],
    [0, 200, 0],
    [0, 215, 150],
];

const COMPOSITE_CLASS_NAMES: [&str; 17] = [
    "Unclassified",
    "Water",
    "Urban",
    "Grassland/ cropland",
    "Bog/ heath",
    "Forestry",
    "Crop + bog",
    "crop + forest",
    "bog + forest",
    "forest + urban",
    "bog + urban",
    "crop + urban",
    "forest + water",
    "bog + water",
    "crop + water",
    "urban + water",
    "Three or more classes",
];

const COMPOSITE_CLASS_LOOKUP: [[u8; 3]; 17] = [
    [0, 0, 0],
    [0, 0, 255],
    [200, 200, 200],
    [0, 255, 0],
    [160, 82, 45],
    [0, 139, 0],
    [80, 169, 23],
    [139, 197, 139],
    [160, 139, 45],
    [100, 139, 100],
    [255, 127, 80],
    [100, 200, 100],
    [0, 139, 100],
    [218, 112, 214],
    [0, 255, 200],
    [200, 200, 255],
    [75, 75, 75],
];

const FORESTRY_CLASS_NAMES: [&str; 4] = ["No data", "Not forest", "Possible forest", "Forest"];

const FORESTRY_CLASS_LOOKUP: [[u8; 3]; 4] = [
    [0, 0, 0],
    [200, 200, 200],
    [100, 255, 100],
    [0, 139, 0],
];

const MAJORITY_CLASS_NAMES: [&str; 12] = [
    "No data",
    "Water",
    "Urban",
    "Crop or grassland",
    "Bog or heathland",
    "Forestry",
    "Heathland or forest",
    "Crop/grassland or bog",
    "Crop/grassland or forest",
    "Bog/heathland or forest",
    "Forest/ grass/ crop",
    "Forest/ green heath/ grass/ crop",
];

const MAJORITY_CLASS_LOOKUP: [[u8; 3]; 12] = [
    [0, 0, 0],
    [0, 0, 255],
    [200, 200, 200],
    [0, 255, 0],
    [160, 82, 45],
    [0, 139, 0],
    [0, 139, 100],
    [80, 169, 23],
    [139, 197, 139],
    [160, 139, 45],
    [0, 200, 0],
    [0, 215, 150],
];

const STATUS_CLASS_NAMES: [&str; 8] = [
    "No data",
    "Unforested",
    "Forested (no change)",
    "Deforestation",
    "Possible deforestation",
    "Recent clearcut",
    "Reforestation",
    "Afforestation",
];

const STATUS_CLASS_LOOKUP: [[u8; 3]; 8] = [
    [0, 0, 0],
    [200, 200, 200],
    [100, 100, 100],
    [255, 0, 0],
    [115, 38, 0],
    [255, 255, 0],
    [0, 255, 0],
    [0, 139, 0],
];

/// Forest/grass reflectance thresholds applied by a classification run.
///
/// `Single` is the legacy one-threshold sweep; `Range` carries the two
/// cutoffs of the refined variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thresholds {
    Single(i32),
    Range { min: i32, max: i32 },
}

impl Thresholds {
    fn describe(&self) -> String {
        match self {
            Thresholds::Single(t) => format!("foresttograss = {t}"),
            Thresholds::Range { min, max } => format!("foresttograss = {min} - {max}"),
        }
    }
}

/// Everything the pipeline writes, as a tagged metadata record.
#[derive(Debug, Clone)]
pub enum Product {
    /// Per-scene decision-tree classification, one-threshold variant
    Dt4 {
        scene: SceneId,
        forest_to_grass: i32,
    },
    /// Per-scene classification, two-threshold variant
    Dt4a {
        scene: SceneId,
        min_forest_to_grass: i32,
        max_forest_to_grass: i32,
    },
    /// Per-scene classification, two-threshold variant with corrected
    /// continuum-removal estimates
    Dt4b {
        scene: SceneId,
        min_forest_to_grass: i32,
        max_forest_to_grass: i32,
    },
    /// Per-tile-per-year dominant/co-dominant class composite
    YearlyComposite {
        tile: String,
        year: i32,
        span_end: Option<i32>,
        thresholds: Option<Thresholds>,
    },
    /// Composite remapped to no-data/not-forest/possible-forest/forest
    ForestryClass {
        tile: String,
        year: i32,
        thresholds: Option<Thresholds>,
    },
    /// Highest-count category per pixel
    Majority {
        tile: String,
        year: i32,
        thresholds: Option<Thresholds>,
    },
    /// Per-category percentage (count x 10000 / observations)
    Percent {
        category: Category,
        tile: String,
        year: i32,
        span_end: Option<i32>,
        thresholds: Option<Thresholds>,
    },
    /// Valid-observation count per pixel
    Denominator {
        tile: String,
        year: i32,
        thresholds: Option<Thresholds>,
    },
    /// Year of a change event per pixel
    EventYear {
        tile: String,
        observation: ObservationKind,
        thresholds: Option<Thresholds>,
    },
    /// Final forest-change status per pixel
    ForestryStatus {
        tile: String,
        start_year: i32,
        end_year: i32,
        thresholds: Option<Thresholds>,
    },
}

impl Product {
    /// Default output basename for this product
    pub fn base_filename(&self) -> String {
        match self {
            Product::Dt4 { scene, .. } => format!("{scene}_DT4class.dat"),
            Product::Dt4a { scene, .. } => format!("{scene}_DT4aclass.dat"),
            Product::Dt4b { scene, .. } => format!("{scene}_DT4bclass.dat"),
            Product::YearlyComposite {
                tile,
                year,
                span_end,
                ..
            } => match span_end {
                Some(end) => format!("DT4_class_{year}_{end}_{tile}.dat"),
                None => format!("DT4_class_{year}_{tile}.dat"),
            },
            Product::ForestryClass { tile, year, .. } => {
                format!("forestryclass_{year}_{tile}.dat")
            }
            Product::Majority { tile, year, .. } => format!("Highpos_{year}_{tile}.dat"),
            Product::Percent {
                category,
                tile,
                year,
                span_end,
                ..
            } => match span_end {
                Some(end) => format!("{}_pct_{year}_{end}_{tile}.dat", category.name()),
                None => format!("{}_pct_{year}_{tile}.dat", category.name()),
            },
            Product::Denominator { tile, year, .. } => format!("Obs_{year}_{tile}.dat"),
            Product::EventYear {
                tile, observation, ..
            } => format!("{}_{tile}.dat", observation.name()),
            Product::ForestryStatus { tile, .. } => format!("forestrystatus_{tile}.dat"),
        }
    }

    /// Header description line
    pub fn description(&self) -> String {
        match self {
            Product::Dt4 {
                scene,
                forest_to_grass,
            } => format!(
                "Decision tree classification for {scene}, foresttograss = {forest_to_grass}"
            ),
            Product::Dt4a {
                scene,
                min_forest_to_grass,
                max_forest_to_grass,
            }
            | Product::Dt4b {
                scene,
                min_forest_to_grass,
                max_forest_to_grass,
            } => format!(
                "Decision tree classification for {scene}, foresttograss = {min_forest_to_grass} - {max_forest_to_grass}"
            ),
            Product::YearlyComposite {
                year,
                span_end,
                thresholds,
                ..
            } => {
                let span = match span_end {
                    Some(end) => format!("{year} - {end}"),
                    None => format!("{year}"),
                };
                match thresholds {
                    Some(t) => format!("Highest probability class for {span}, {}", t.describe()),
                    None => format!("Highest probability class for {span}"),
                }
            }
            Product::ForestryClass {
                year, thresholds, ..
            } => match thresholds {
                Some(t) => format!("Forest classification {year} for {}", t.describe()),
                None => format!("Forest classification {year}"),
            },
            Product::Majority {
                year, thresholds, ..
            } => match thresholds {
                Some(t) => format!("Highest probability class for {year}, {}", t.describe()),
                None => format!("Highest probability class for {year}"),
            },
            Product::Percent {
                category,
                year,
                thresholds,
                ..
            } => match thresholds {
                Some(t) => format!(
                    "{} class probability for {year}, {}",
                    category.name(),
                    t.describe()
                ),
                None => format!("{} class probability for {year}", category.name()),
            },
            Product::Denominator {
                year, thresholds, ..
            } => match thresholds {
                Some(t) => format!("Number of observations for {year}, {}", t.describe()),
                None => format!("Number of observations for {year}"),
            },
            Product::EventYear {
                observation,
                thresholds,
                ..
            } => match thresholds {
                Some(t) => format!("{} year, {}", observation.name(), t.describe()),
                None => format!("{} year", observation.name()),
            },
            Product::ForestryStatus {
                start_year,
                end_year,
                thresholds,
                ..
            } => match thresholds {
                Some(t) => format!(
                    "Forestry status change for {start_year} - {end_year}, {}",
                    t.describe()
                ),
                None => format!("Forestry status change for {start_year} - {end_year}"),
            },
        }
    }

    /// Band names for the single output band
    pub fn band_names(&self) -> Vec<String> {
        match self {
            Product::Dt4 { .. } => vec!["DT4".to_string()],
            Product::Dt4a { .. } => vec!["DT4a".to_string()],
            Product::Dt4b { .. } => vec!["DT4b".to_string()],
            Product::YearlyComposite { year, span_end, .. } => match span_end {
                Some(end) => vec![format!("Class {year}-{end}")],
                None => vec![format!("Class {year}")],
            },
            Product::ForestryClass { year, .. } => vec![format!("{year}")],
            Product::Majority { year, .. } => vec![format!("{year} land cover class")],
            Product::Percent { category, year, .. } => {
                vec![format!("{} {year}", category.name())]
            }
            Product::Denominator { year, .. } => vec![format!("Observations for {year}")],
            Product::EventYear { observation, .. } => {
                vec![format!("Year of {}", observation.name())]
            }
            Product::ForestryStatus { .. } => vec!["Forestry status".to_string()],
        }
    }

    /// Class legend, for categorical products
    pub fn legend(&self) -> Option<ClassLegend> {
        match self {
            Product::Dt4 { .. } => Some(ClassLegend {
                names: &SCENE_CLASS_NAMES_ONE_THRESHOLD,
                lookup: &SCENE_CLASS_LOOKUP[..10],
            }),
            Product::Dt4a { .. } | Product::Dt4b { .. } => Some(ClassLegend {
                names: &SCENE_CLASS_NAMES_TWO_THRESHOLD,
                lookup: &SCENE_CLASS_LOOKUP,
            }),
            Product::YearlyComposite { .. } => Some(ClassLegend {
                names: &COMPOSITE_CLASS_NAMES,
                lookup: &COMPOSITE_CLASS_LOOKUP,
            }),
            Product::ForestryClass { .. } => Some(ClassLegend {
                names: &FORESTRY_CLASS_NAMES,
                lookup: &FORESTRY_CLASS_LOOKUP,
            }),
            Product::Majority { .. } => Some(ClassLegend {
                names: &MAJORITY_CLASS_NAMES,
                lookup: &MAJORITY_CLASS_LOOKUP,
            }),
            Product::ForestryStatus { .. } => Some(ClassLegend {
                names: &STATUS_CLASS_NAMES,
                lookup: &STATUS_CLASS_LOOKUP,
            }),
            Product::Percent { .. } | Product::Denominator { .. } | Product::EventYear { .. } => {
                None
            }
        }
    }

    /// Default acquisition timestamp for tile-year products; scene
    /// products derive theirs from the source header or the scene
    /// identifier instead.
    pub fn default_acquisition_time(&self) -> Option<String> {
        match self {
            Product::Dt4 { scene, .. }
            | Product::Dt4a { scene, .. }
            | Product::Dt4b { scene, .. } => Some(scene.default_acquisition_time()),
            Product::YearlyComposite { year, .. }
            | Product::ForestryClass { year, .. }
            | Product::Majority { year, .. }
            | Product::Percent { year, .. }
            | Product::Denominator { year, .. } => Some(format!("{year}-07-01")),
            Product::EventYear { .. } | Product::ForestryStatus { .. } => None,
        }
    }
}

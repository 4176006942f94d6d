//! Run configuration
//!
//! Everything a pipeline run needs in one deserializable struct, with
//! the operational defaults the monitoring service runs with. Config
//! files are RON; every field falls back to its default when omitted.

use crate::classify::Classifier;
use eoforest_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which decision-tree variant a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    Dt4,
    Dt4a,
    Dt4b,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory of surface-reflectance scenes
    pub scene_dir: PathBuf,
    /// Directory of per-scene cloud masks
    pub mask_dir: PathBuf,
    /// Base output directory; per-variant subdirectories are created
    /// underneath
    pub output_dir: PathBuf,
    /// Tile index file
    pub tile_index: PathBuf,
    /// Scene exclusion list, one year+day-of-year code per line
    pub bad_list: Option<PathBuf>,
    /// National forestry mask raster restricting change detection
    pub forestry_mask: Option<PathBuf>,

    pub variant: Variant,
    /// NIR threshold separating forest from grass. For the
    /// single-threshold variant this is the lowest threshold of the
    /// sweep.
    pub min_forest_to_grass: i32,
    /// Upper threshold: sweep end for Dt4, confusion-band top for the
    /// two-threshold variants
    pub max_forest_to_grass: i32,
    /// Sweep step for the single-threshold variant
    pub threshold_increment: i32,

    pub start_year: i32,
    pub end_year: i32,
    /// First acceptable acquisition day of year (growing season start)
    pub start_day: u32,
    /// Last acceptable acquisition day of year
    pub end_day: u32,
    /// Minimum clear land pixels for a scene to be worth classifying
    pub min_pixels: usize,
    /// Aggregate this many consecutive years per composite instead of
    /// one
    pub year_span: Option<i32>,

    pub overwrite: bool,
    /// Attempts per scene before a processing error becomes permanent
    pub max_retries: u32,
    pub cell_size: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scene_dir: PathBuf::from("data/scenes"),
            mask_dir: PathBuf::from("data/masks"),
            output_dir: PathBuf::from("output"),
            tile_index: PathBuf::from("data/tiles.csv"),
            bad_list: None,
            forestry_mask: None,
            variant: Variant::Dt4b,
            min_forest_to_grass: 3000,
            max_forest_to_grass: 4000,
            threshold_increment: 250,
            start_year: 1984,
            end_year: 2017,
            start_day: 82,
            end_day: 283,
            min_pixels: 1000,
            year_span: None,
            overwrite: false,
            max_retries: 5,
            cell_size: 30.0,
        }
    }
}

impl RunConfig {
    /// Load a RON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: RunConfig =
            ron::from_str(&text).map_err(|e| Error::Other(format!("bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_forest_to_grass >= self.max_forest_to_grass {
            return Err(Error::InvalidParameter {
                name: "min_forest_to_grass",
                value: self.min_forest_to_grass.to_string(),
                reason: format!("must be below max_forest_to_grass {}", self.max_forest_to_grass),
            });
        }
        if self.threshold_increment <= 0 {
            return Err(Error::InvalidParameter {
                name: "threshold_increment",
                value: self.threshold_increment.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.start_year > self.end_year {
            return Err(Error::InvalidParameter {
                name: "start_year",
                value: self.start_year.to_string(),
                reason: format!("later than end_year {}", self.end_year),
            });
        }
        if self.start_day > self.end_day || self.end_day > 366 {
            return Err(Error::InvalidParameter {
                name: "end_day",
                value: self.end_day.to_string(),
                reason: "day-of-year window is invalid".to_string(),
            });
        }
        Ok(())
    }

    /// The classifiers this run applies to every scene. The
    /// single-threshold variant sweeps the threshold range; the
    /// two-threshold variants run once.
    pub fn classifiers(&self) -> Vec<Classifier> {
        match self.variant {
            Variant::Dt4 => {
                let mut out = Vec::new();
                let mut t = self.min_forest_to_grass;
                while t <= self.max_forest_to_grass {
                    out.push(Classifier::Dt4 { forest_to_grass: t });
                    t += self.threshold_increment;
                }
                out
            }
            Variant::Dt4a => vec![Classifier::Dt4a {
                min_forest_to_grass: self.min_forest_to_grass,
                max_forest_to_grass: self.max_forest_to_grass,
            }],
            Variant::Dt4b => vec![Classifier::Dt4b {
                min_forest_to_grass: self.min_forest_to_grass,
                max_forest_to_grass: self.max_forest_to_grass,
            }],
        }
    }

    /// Per-classifier output subdirectory under `output_dir`
    pub fn class_dir(&self, classifier: &Classifier) -> PathBuf {
        let sub = match classifier {
            Classifier::Dt4 { forest_to_grass } => forest_to_grass.to_string(),
            Classifier::Dt4a { .. } => "dt4a".to_string(),
            Classifier::Dt4b { .. } => "dt4b".to_string(),
        };
        self.output_dir.join(sub)
    }

    /// Tile probability outputs for one classifier
    pub fn probability_dir(&self, classifier: &Classifier) -> PathBuf {
        self.class_dir(classifier).join("Probability")
    }

    /// Forestry classification and change outputs for one classifier
    pub fn forestry_dir(&self, classifier: &Classifier) -> PathBuf {
        self.probability_dir(classifier).join("Forestry")
    }

    /// Whether an acquisition day of year falls in the usable window
    pub fn in_season(&self, doy: u32) -> bool {
        (self.start_day..=self.end_day).contains(&doy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RunConfig::default();
        assert_eq!(c.min_forest_to_grass, 3000);
        assert_eq!(c.max_forest_to_grass, 4000);
        assert_eq!(c.min_pixels, 1000);
        assert_eq!(c.start_year, 1984);
        assert!(c.in_season(82));
        assert!(c.in_season(283));
        assert!(!c.in_season(81));
        assert!(!c.in_season(284));
    }

    #[test]
    fn test_threshold_sweep() {
        let c = RunConfig {
            variant: Variant::Dt4,
            ..RunConfig::default()
        };
        let classifiers = c.classifiers();
        assert_eq!(classifiers.len(), 5);
        assert_eq!(
            classifiers[0],
            Classifier::Dt4 {
                forest_to_grass: 3000
            }
        );
        assert_eq!(
            classifiers[4],
            Classifier::Dt4 {
                forest_to_grass: 4000
            }
        );

        let c = RunConfig::default();
        assert_eq!(c.classifiers().len(), 1);
    }

    #[test]
    fn test_output_layout() {
        let c = RunConfig::default();
        let cls = &c.classifiers()[0];
        assert_eq!(c.class_dir(cls), PathBuf::from("output/dt4b"));
        assert_eq!(
            c.forestry_dir(cls),
            PathBuf::from("output/dt4b/Probability/Forestry")
        );

        let sweep = Classifier::Dt4 {
            forest_to_grass: 3250,
        };
        assert_eq!(c.class_dir(&sweep), PathBuf::from("output/3250"));
    }

    #[test]
    fn test_ron_roundtrip_and_validation() {
        let c: RunConfig = ron::from_str(
            "(variant: Dt4a, min_forest_to_grass: 3100, overwrite: true)",
        )
        .unwrap();
        assert_eq!(c.variant, Variant::Dt4a);
        assert_eq!(c.min_forest_to_grass, 3100);
        assert!(c.overwrite);
        assert_eq!(c.max_retries, 5);
        assert!(c.validate().is_ok());

        let bad = RunConfig {
            min_forest_to_grass: 5000,
            ..RunConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}

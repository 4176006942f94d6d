//! Per-scene decision-tree classification
//!
//! An ordered rule table assigns one land-cover code to every clear
//! pixel of a six-band Landsat surface-reflectance scene. Rules are
//! first-match: once a pixel is classified, later rules never touch it.
//! The forest/grass split hinges on NIR reflectance thresholds and two
//! continuum-removal indices bracketing red and SWIR1.

use crate::maybe_rayon::*;
use eoforest_core::product::{Product, Thresholds};
use eoforest_core::scene::{SceneId, SensorCoeffs};
use eoforest_core::{Error, GeoTransform, Raster, Result};
use ndarray::Array2;

/// Surface reflectance clamp: values outside (0, 10000) are sensor or
/// processing artifacts
const REFLECTANCE_MAX: i32 = 10000;
/// Dark-surface cutoff shared by the urban and bog rules
const DARK_CUTOFF: i32 = 1000;

/// A decision-tree classifier variant with its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classifier {
    /// Single forest/grass threshold
    Dt4 { forest_to_grass: i32 },
    /// Two thresholds; NIR between them marks forest/crop confusion
    Dt4a {
        min_forest_to_grass: i32,
        max_forest_to_grass: i32,
    },
    /// As Dt4a, with corrected continuum-removal estimates
    Dt4b {
        min_forest_to_grass: i32,
        max_forest_to_grass: i32,
    },
}

impl Classifier {
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Dt4 { .. } => "DT4",
            Classifier::Dt4a { .. } => "DT4a",
            Classifier::Dt4b { .. } => "DT4b",
        }
    }

    /// Highest class code this variant can emit
    pub fn max_class(&self) -> u8 {
        match self {
            Classifier::Dt4 { .. } => 9,
            Classifier::Dt4a { .. } | Classifier::Dt4b { .. } => 11,
        }
    }

    /// Whether this variant emits the forest/crop confusion codes 10
    /// and 11
    pub fn with_confusion(&self) -> bool {
        !matches!(self, Classifier::Dt4 { .. })
    }

    pub fn thresholds(&self) -> Thresholds {
        match *self {
            Classifier::Dt4 { forest_to_grass } => Thresholds::Single(forest_to_grass),
            Classifier::Dt4a {
                min_forest_to_grass,
                max_forest_to_grass,
            }
            | Classifier::Dt4b {
                min_forest_to_grass,
                max_forest_to_grass,
            } => Thresholds::Range {
                min: min_forest_to_grass,
                max: max_forest_to_grass,
            },
        }
    }

    /// Output product metadata for a classified scene
    pub fn product(&self, scene: SceneId) -> Product {
        match *self {
            Classifier::Dt4 { forest_to_grass } => Product::Dt4 {
                scene,
                forest_to_grass,
            },
            Classifier::Dt4a {
                min_forest_to_grass,
                max_forest_to_grass,
            } => Product::Dt4a {
                scene,
                min_forest_to_grass,
                max_forest_to_grass,
            },
            Classifier::Dt4b {
                min_forest_to_grass,
                max_forest_to_grass,
            } => Product::Dt4b {
                scene,
                min_forest_to_grass,
                max_forest_to_grass,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Classifier::Dt4 { forest_to_grass } if forest_to_grass <= 0 => {
                Err(Error::InvalidParameter {
                    name: "forest_to_grass",
                    value: forest_to_grass.to_string(),
                    reason: "threshold must be positive".to_string(),
                })
            }
            Classifier::Dt4a {
                min_forest_to_grass,
                max_forest_to_grass,
            }
            | Classifier::Dt4b {
                min_forest_to_grass,
                max_forest_to_grass,
            } if min_forest_to_grass >= max_forest_to_grass => Err(Error::InvalidParameter {
                name: "min_forest_to_grass",
                value: min_forest_to_grass.to_string(),
                reason: format!("must be below max_forest_to_grass {max_forest_to_grass}"),
            }),
            _ => Ok(()),
        }
    }
}

/// The six reflectance bands of one scene, row/col aligned with its
/// cloud mask
#[derive(Debug, Clone)]
pub struct SceneBands {
    pub blue: Array2<i16>,
    pub green: Array2<i16>,
    pub red: Array2<i16>,
    pub nir: Array2<i16>,
    pub swir1: Array2<i16>,
    pub swir2: Array2<i16>,
    pub transform: GeoTransform,
}

impl SceneBands {
    pub fn shape(&self) -> (usize, usize) {
        self.blue.dim()
    }

    fn check_aligned(&self, mask: &Array2<u8>) -> Result<()> {
        let dim = self.blue.dim();
        for band in [&self.green, &self.red, &self.nir, &self.swir1, &self.swir2] {
            if band.dim() != dim {
                return Err(Error::SizeMismatch {
                    er: dim.0,
                    ec: dim.1,
                    ar: band.dim().0,
                    ac: band.dim().1,
                });
            }
        }
        if mask.dim() != dim {
            return Err(Error::SizeMismatch {
                er: dim.0,
                ec: dim.1,
                ar: mask.dim().0,
                ac: mask.dim().1,
            });
        }
        Ok(())
    }
}

/// One pixel's bands widened to i32; `green * 4` overflows i16
#[derive(Clone, Copy)]
struct Pixel {
    blue: i32,
    green: i32,
    red: i32,
    nir: i32,
    swir1: i32,
    swir2: i32,
}

impl Pixel {
    fn out_of_range(&self) -> bool {
        [self.blue, self.green, self.red, self.nir, self.swir1, self.swir2]
            .iter()
            .any(|&v| v <= 0 || v >= REFLECTANCE_MAX)
    }

    /// Continuum removal across green/red/NIR: positive where red sits
    /// below the green-NIR line
    fn cr_gr(&self, classifier: &Classifier, coeffs: SensorCoeffs) -> f64 {
        match classifier {
            Classifier::Dt4 { .. } | Classifier::Dt4a { .. } => {
                (self.green + self.nir) as f64 * coeffs.gr_nir - self.red as f64
            }
            Classifier::Dt4b { .. } => {
                (self.nir - self.green) as f64 * coeffs.gr_nir + (self.green - self.red) as f64
            }
        }
    }

    /// Continuum removal across NIR/SWIR1/SWIR2
    fn cr_ns(&self, classifier: &Classifier, coeffs: SensorCoeffs) -> f64 {
        match classifier {
            Classifier::Dt4 { .. } | Classifier::Dt4a { .. } => {
                (self.nir + self.swir2) as f64 * coeffs.nir_swir - self.swir1 as f64
            }
            Classifier::Dt4b { .. } => {
                self.swir2 as f64 - (self.swir2 - self.nir) as f64 * coeffs.nir_swir
                    - self.swir1 as f64
            }
        }
    }
}

/// Classify one scene. Masked pixels and out-of-range reflectance stay
/// 0 (unclassified).
pub fn classify_scene(
    bands: &SceneBands,
    mask: &Array2<u8>,
    classifier: &Classifier,
    coeffs: SensorCoeffs,
) -> Result<Raster<u8>> {
    classifier.validate()?;
    bands.check_aligned(mask)?;
    let (rows, cols) = bands.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                // Alignment checked above
                if unsafe { *mask.uget((row, col)) } != 0 {
                    continue;
                }
                let px = unsafe {
                    Pixel {
                        blue: *bands.blue.uget((row, col)) as i32,
                        green: *bands.green.uget((row, col)) as i32,
                        red: *bands.red.uget((row, col)) as i32,
                        nir: *bands.nir.uget((row, col)) as i32,
                        swir1: *bands.swir1.uget((row, col)) as i32,
                        swir2: *bands.swir2.uget((row, col)) as i32,
                    }
                };
                if px.out_of_range() {
                    continue;
                }
                row_data[col] = classify_pixel(px, classifier, coeffs);
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    let mut out = Raster::from_array(array);
    out.set_transform(bands.transform);
    Ok(out)
}

fn classify_pixel(px: Pixel, classifier: &Classifier, coeffs: SensorCoeffs) -> u8 {
    // Water: green or red brighter than NIR
    if px.green > px.nir || px.red > px.nir {
        return 1;
    }
    // Urban: uniformly dark across all six bands
    if px.blue < DARK_CUTOFF
        && px.green < DARK_CUTOFF
        && px.red < DARK_CUTOFF
        && px.nir < DARK_CUTOFF
        && px.swir1 < DARK_CUTOFF
        && px.swir2 < DARK_CUTOFF
    {
        return 2;
    }

    let cr_gr = px.cr_gr(classifier, coeffs);
    let cr_ns = px.cr_ns(classifier, coeffs);
    // Green peak with a strong NIR plateau marks closed canopy or
    // vigorous grass
    let canopy = px.green > px.blue && px.green > px.red && px.green * 4 < px.nir;

    match *classifier {
        Classifier::Dt4 { forest_to_grass } => {
            if canopy && px.nir > px.swir1 && px.nir < forest_to_grass {
                return if cr_ns > 0.0 { 8 } else { 9 };
            }
            if canopy && px.nir >= forest_to_grass && cr_ns > 0.0 {
                return 6;
            }
        }
        Classifier::Dt4a {
            min_forest_to_grass,
            max_forest_to_grass,
        }
        | Classifier::Dt4b {
            min_forest_to_grass,
            max_forest_to_grass,
        } => {
            if canopy && px.nir > px.swir1 {
                if px.nir < min_forest_to_grass {
                    return if cr_ns > 0.0 { 8 } else { 9 };
                }
                if px.nir < max_forest_to_grass {
                    return if cr_ns > 0.0 { 10 } else { 11 };
                }
            }
            if canopy && px.nir >= max_forest_to_grass && cr_ns > 0.0 {
                return 6;
            }
        }
    }

    if cr_gr > 0.0 && cr_ns > 0.0 {
        return 7; // Young forest
    }
    if cr_gr > 0.0 && cr_ns <= 0.0 && px.nir > px.swir1 {
        return 5; // Heath
    }
    if cr_gr <= 0.0 && px.red < DARK_CUTOFF {
        return 3; // Bog
    }
    if (cr_gr <= 0.0 && px.red >= DARK_CUTOFF) || (cr_gr > 0.0 && cr_ns <= 0.0) {
        return 4; // Bare soil
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoforest_core::scene::Sensor;

    fn uniform_scene(px: [i16; 6], rows: usize, cols: usize) -> SceneBands {
        SceneBands {
            blue: Array2::from_elem((rows, cols), px[0]),
            green: Array2::from_elem((rows, cols), px[1]),
            red: Array2::from_elem((rows, cols), px[2]),
            nir: Array2::from_elem((rows, cols), px[3]),
            swir1: Array2::from_elem((rows, cols), px[4]),
            swir2: Array2::from_elem((rows, cols), px[5]),
            transform: GeoTransform::default(),
        }
    }

    fn classify_one(px: [i16; 6], classifier: Classifier) -> u8 {
        let bands = uniform_scene(px, 1, 1);
        let mask = Array2::zeros((1, 1));
        let out = classify_scene(&bands, &mask, &classifier, Sensor::Lt5.coeffs()).unwrap();
        out.get(0, 0).unwrap()
    }

    const DT4: Classifier = Classifier::Dt4 {
        forest_to_grass: 3000,
    };

    #[test]
    fn test_water_beats_everything() {
        // Green above NIR, regardless of the rest
        assert_eq!(classify_one([500, 900, 400, 700, 300, 200], DT4), 1);
    }

    #[test]
    fn test_urban_is_uniformly_dark() {
        assert_eq!(classify_one([400, 500, 450, 900, 600, 500], DT4), 2);
    }

    #[test]
    fn test_mature_forest_below_threshold() {
        // Green peak, NIR plateau below 3000, positive NIR/SWIR continuum
        let px = [300, 600, 400, 2800, 1200, 900];
        assert_eq!(classify_one(px, DT4), 8);
    }

    #[test]
    fn test_grass_above_threshold() {
        // Same shape but NIR at 4500 crosses the forest/grass cutoff
        let px = [300, 600, 400, 4500, 1200, 900];
        assert_eq!(classify_one(px, DT4), 6);
    }

    #[test]
    fn test_confusion_band_between_thresholds() {
        let ab = Classifier::Dt4a {
            min_forest_to_grass: 3000,
            max_forest_to_grass: 4000,
        };
        // NIR 3500 falls between the thresholds
        let px = [300, 600, 400, 3500, 1200, 900];
        assert_eq!(classify_one(px, ab), 10);
        // Below min still reads as mature forest
        assert_eq!(
            classify_one([300, 600, 400, 2800, 1200, 900], ab),
            8
        );
    }

    #[test]
    fn test_bog_is_dark_red_negative_continuum() {
        // Flat dark spectrum but SWIR1 bright enough to keep it out of
        // the urban rule
        let px = [700, 800, 900, 950, 1400, 600];
        assert_eq!(classify_one(px, DT4), 3);
    }

    #[test]
    fn test_masked_and_bad_pixels_stay_unclassified() {
        let bands = uniform_scene([300, 600, 400, 2800, 1200, 900], 1, 2);
        let mut mask = Array2::zeros((1, 2));
        mask[(0, 0)] = 4;
        let out = classify_scene(&bands, &mask, &DT4, Sensor::Lt5.coeffs()).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 0);
        assert_eq!(out.get(0, 1).unwrap(), 8);

        // Saturated NIR is screened out even where the mask is clear
        assert_eq!(classify_one([300, 600, 400, 10000, 1200, 900], DT4), 0);
    }

    #[test]
    fn test_codes_stay_in_variant_range() {
        let ab = Classifier::Dt4b {
            min_forest_to_grass: 3000,
            max_forest_to_grass: 4000,
        };
        for nir in (500..9500).step_by(250) {
            for swir1 in (500..9500).step_by(500) {
                let code = classify_one([400, 700, 500, nir as i16, swir1 as i16, 800], ab);
                assert!(code <= ab.max_class());
            }
        }
    }

    #[test]
    fn test_threshold_validation() {
        let bands = uniform_scene([300, 600, 400, 2800, 1200, 900], 1, 1);
        let mask = Array2::zeros((1, 1));
        let bad = Classifier::Dt4a {
            min_forest_to_grass: 4000,
            max_forest_to_grass: 3000,
        };
        assert!(classify_scene(&bands, &mask, &bad, Sensor::Lt5.coeffs()).is_err());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bands = uniform_scene([300, 600, 400, 2800, 1200, 900], 2, 2);
        let mask = Array2::zeros((1, 2));
        assert!(classify_scene(&bands, &mask, &DT4, Sensor::Lt5.coeffs()).is_err());
    }
}

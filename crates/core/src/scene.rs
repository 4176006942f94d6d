//! Landsat scene identifiers and per-sensor spectral constants

use crate::error::{Error, Result};
use chrono::NaiveDate;

/// Landsat sensor families handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Landsat 4 TM
    Lt4,
    /// Landsat 5 TM
    Lt5,
    /// Landsat 7 ETM+
    Le7,
    /// Landsat 8 OLI
    Lc8,
}

/// Continuum-removal coefficients precomputed from nominal band center
/// wavelengths (micrometers) for each sensor.
///
/// `gr_nir` brackets the red band between green and NIR, `nir_swir`
/// brackets SWIR1 between NIR and SWIR2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCoeffs {
    pub gr_nir: f64,
    pub nir_swir: f64,
}

impl Sensor {
    /// Parse the 3-character sensor prefix of a scene identifier
    pub fn from_prefix(prefix: &str) -> Result<Self> {
        match prefix {
            "LT4" => Ok(Sensor::Lt4),
            "LT5" => Ok(Sensor::Lt5),
            "LE7" => Ok(Sensor::Le7),
            "LC8" => Ok(Sensor::Lc8),
            other => Err(Error::UnknownSensor(other.to_string())),
        }
    }

    /// Continuum-removal coefficients for this sensor
    pub fn coeffs(self) -> SensorCoeffs {
        match self {
            Sensor::Lt4 | Sensor::Lt5 => SensorCoeffs {
                gr_nir: (0.662 - 0.560) / (0.830 - 0.560),
                nir_swir: (2.215 - 1.648) / (2.215 - 0.830),
            },
            Sensor::Le7 => SensorCoeffs {
                gr_nir: (0.662 - 0.560) / (0.835 - 0.560),
                nir_swir: (2.206 - 1.648) / (2.206 - 0.835),
            },
            Sensor::Lc8 => SensorCoeffs {
                gr_nir: (0.6546 - 0.5613) / (0.8646 - 0.5613),
                nir_swir: (2.201 - 1.609) / (2.201 - 0.8646),
            },
        }
    }

    /// 1-based band numbers for (blue, green, red, NIR, SWIR1, SWIR2)
    /// in a surface-reflectance stack. OLI carries its coastal aerosol
    /// band first, shifting everything by one.
    pub fn reflectance_bands(self) -> [usize; 6] {
        match self {
            Sensor::Lc8 => [2, 3, 4, 5, 6, 7],
            _ => [1, 2, 3, 4, 5, 6],
        }
    }
}

/// A parsed 21-character Landsat scene identifier, e.g.
/// `LT50230241995182AAA02`: sensor, WRS path/row, acquisition year and
/// day of year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneId {
    raw: String,
    sensor: Sensor,
    path: u16,
    row: u16,
    year: i32,
    doy: u32,
}

impl SceneId {
    /// Parse a scene identifier from the leading 21 characters of a file
    /// basename
    pub fn parse(name: &str) -> Result<Self> {
        if name.len() < 21 || !name.is_ascii() {
            return Err(Error::BadSceneId(name.to_string()));
        }
        let raw = name[..21].to_string();
        let sensor = Sensor::from_prefix(&raw[..3])?;
        let path = raw[3..6]
            .parse::<u16>()
            .map_err(|_| Error::BadSceneId(raw.clone()))?;
        let row = raw[6..9]
            .parse::<u16>()
            .map_err(|_| Error::BadSceneId(raw.clone()))?;
        let year = raw[9..13]
            .parse::<i32>()
            .map_err(|_| Error::BadSceneId(raw.clone()))?;
        let doy = raw[13..16]
            .parse::<u32>()
            .map_err(|_| Error::BadSceneId(raw.clone()))?;
        if NaiveDate::from_yo_opt(year, doy).is_none() {
            return Err(Error::BadSceneId(raw));
        }
        Ok(Self {
            raw,
            sensor,
            path,
            row,
            year,
            doy,
        })
    }

    /// The full 21-character identifier
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn path(&self) -> u16 {
        self.path
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn day_of_year(&self) -> u32 {
        self.doy
    }

    /// Acquisition date derived from year and day of year
    pub fn acquisition_date(&self) -> NaiveDate {
        // Validity established in parse()
        NaiveDate::from_yo_opt(self.year, self.doy).unwrap_or_default()
    }

    /// The 7-character year+day-of-year code used by scene exclusion lists
    pub fn date_code(&self) -> &str {
        &self.raw[9..16]
    }

    /// Default acquisition timestamp when the source header carries none
    pub fn default_acquisition_time(&self) -> String {
        format!("{}T11:30:00Z", self.acquisition_date().format("%Y-%m-%d"))
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

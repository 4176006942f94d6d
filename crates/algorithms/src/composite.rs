//! Yearly tile composite and forest-class remap
//!
//! The per-category probability rasters of one tile-year are resolved
//! into a single dominant/co-dominant class raster, which is then
//! remapped to the four-level forestry classification used by change
//! detection.

use crate::maybe_rayon::*;
use eoforest_core::{Error, Raster, Result};
use ndarray::Array2;

/// Probability rasters feeding one composite. The confusion pair is
/// present only for two-threshold classification runs.
#[derive(Debug, Clone)]
pub struct CompositeInputs {
    pub forestry: Raster<u16>,
    pub cropgrass: Raster<u16>,
    pub bogheath: Raster<u16>,
    pub heathforest: Raster<u16>,
    pub bogforest: Raster<u16>,
    pub urban: Raster<u16>,
    pub water: Raster<u16>,
    pub forestcrop: Option<Raster<u16>>,
    pub forestcropheath: Option<Raster<u16>>,
}

impl CompositeInputs {
    fn check_aligned(&self) -> Result<()> {
        let (er, ec) = self.forestry.shape();
        let mut shapes = vec![
            self.cropgrass.shape(),
            self.bogheath.shape(),
            self.heathforest.shape(),
            self.bogforest.shape(),
            self.urban.shape(),
            self.water.shape(),
        ];
        if let Some(fc) = &self.forestcrop {
            shapes.push(fc.shape());
        }
        if let Some(fch) = &self.forestcropheath {
            shapes.push(fch.shape());
        }
        for (ar, ac) in shapes {
            if (ar, ac) != (er, ec) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        Ok(())
    }
}

/// Resolve the composite class for every pixel.
///
/// Confusion probabilities are first folded into the forestry,
/// bog/heath and crop/grass totals. The redistribution masks are all
/// evaluated against the unadjusted values, so the order of the
/// adjustments cannot change the result. An ordered first-match rule
/// table then assigns the class code.
pub fn resolve_composite(inputs: &CompositeInputs) -> Result<Raster<u8>> {
    inputs.check_aligned()?;
    let (rows, cols) = inputs.forestry.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                // Alignment checked above
                let px = unsafe {
                    (
                        inputs.forestry.get_unchecked(row, col) as i32,
                        inputs.cropgrass.get_unchecked(row, col) as i32,
                        inputs.bogheath.get_unchecked(row, col) as i32,
                        inputs.heathforest.get_unchecked(row, col) as i32,
                        inputs.bogforest.get_unchecked(row, col) as i32,
                        inputs.urban.get_unchecked(row, col) as i32,
                        inputs.water.get_unchecked(row, col) as i32,
                    )
                };
                let confusion = match (&inputs.forestcrop, &inputs.forestcropheath) {
                    (Some(fc), Some(fch)) => unsafe {
                        Some((
                            fc.get_unchecked(row, col) as i32,
                            fch.get_unchecked(row, col) as i32,
                        ))
                    },
                    _ => None,
                };
                row_data[col] = composite_pixel(px, confusion);
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    let mut out = Raster::from_array(array);
    out.set_transform(*inputs.forestry.transform());
    Ok(out)
}

fn composite_pixel(
    (forestry0, cropgrass0, bogheath0, heathforest, bogforest, urban, water): (
        i32,
        i32,
        i32,
        i32,
        i32,
        i32,
        i32,
    ),
    confusion: Option<(i32, i32)>,
) -> u8 {
    let mut forestry = forestry0;
    let mut cropgrass = cropgrass0;
    let mut bogheath = bogheath0;

    if forestry0 >= bogheath0 {
        forestry += bogforest + heathforest;
    } else {
        bogheath += bogforest + heathforest;
    }
    if let Some((forestcrop, forestcropheath)) = confusion {
        if forestry0 > cropgrass0 {
            forestry += forestcrop;
        }
        if cropgrass0 < forestry0 && forestry0 >= bogheath0 {
            forestry += forestcropheath;
        }
        if cropgrass0 < bogheath0 && forestry0 < bogheath0 {
            bogheath += forestcropheath;
        }
        if forestry0 == bogheath0 && forestry0 == cropgrass0 {
            bogheath += forestcropheath;
        }
        if cropgrass0 >= bogheath0 && forestry0 <= cropgrass0 {
            cropgrass += forestcropheath;
        }
        if forestry0 <= cropgrass0 {
            cropgrass += forestcrop;
        }
    }

    // Strong unresolved bog/forest signal wins outright
    if forestry < bogforest
        && bogforest > bogheath
        && bogforest > cropgrass
        && bogforest > urban
        && bogforest > water
    {
        return 8;
    }
    if water > bogheath && water > forestry && water > urban && cropgrass < water {
        return 1;
    }
    if urban > bogheath && urban > forestry && water < urban && cropgrass < urban {
        return 2;
    }
    if cropgrass > bogheath && cropgrass > forestry && cropgrass > urban && cropgrass > water {
        return 3;
    }
    if cropgrass < bogheath && bogheath > forestry && bogheath > urban && bogheath > water {
        return 4;
    }
    if forestry > bogheath && cropgrass < forestry && forestry > urban && forestry > water {
        return 5;
    }
    if cropgrass == bogheath && bogheath > forestry && bogheath > urban && bogheath > water {
        return 6;
    }
    if cropgrass == forestry && bogheath < forestry && forestry > urban && forestry > water {
        return 7;
    }
    if forestry == bogheath && bogheath > cropgrass && bogheath > urban && bogheath > water {
        return 8;
    }
    if forestry == urban && urban > cropgrass && bogheath < urban && urban > water {
        return 9;
    }
    if urban == bogheath && bogheath > forestry && bogheath > cropgrass && bogheath > water {
        return 10;
    }
    if cropgrass == urban && bogheath < urban && urban > forestry && urban > water {
        return 11;
    }
    if forestry == water && water > cropgrass && bogheath < water && urban < water {
        return 12;
    }
    if water == bogheath && bogheath > forestry && bogheath > urban && bogheath > cropgrass {
        return 13;
    }
    if cropgrass == water && bogheath < water && water > forestry && urban < water {
        return 14;
    }
    if urban == water && water > forestry && water > cropgrass && bogheath < water {
        return 15;
    }
    if urban > 0 || water > 0 || forestry > 0 || cropgrass > 0 || bogheath > 0 {
        return 16;
    }
    0
}

/// Composite-to-forestry remap table: (low, high, output)
const FORESTRY_REMAP: [(u8, u8, u8); 7] = [
    (1, 4, 1),
    (5, 5, 3),
    (7, 9, 2),
    (12, 12, 2),
    (6, 6, 1),
    (10, 11, 1),
    (13, 16, 1),
];

/// Remap a composite raster to the four forestry classes:
/// 0 no data, 1 not forest, 2 possible forest, 3 forest
pub fn forestry_class(composite: &Raster<u8>) -> Raster<u8> {
    let mut out = composite.clone();
    for v in out.data_mut().iter_mut() {
        let code = *v;
        *v = FORESTRY_REMAP
            .iter()
            .find(|&&(lo, hi, _)| code >= lo && code <= hi)
            .map(|&(_, _, mapped)| mapped)
            .unwrap_or(0);
    }
    out
}

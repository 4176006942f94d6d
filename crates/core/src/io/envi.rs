//! ENVI flat-binary reading/writing
//!
//! Rasters are stored as a bare little-endian `.dat` file plus a
//! text `.hdr` sidecar. Single band, BSQ interleave. Class legends,
//! parent-raster lineage and acquisition timestamps ride along in the
//! header.

use crate::error::{Error, Result};
use crate::product::Product;
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Element types with a fixed ENVI data-type code and little-endian
/// byte layout
pub trait EnviScalar: RasterElement {
    /// ENVI `data type` header code
    const DATA_TYPE: u8;
    /// Size of one value in bytes
    const BYTES: usize;

    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_envi_scalar {
    ($t:ty, $code:expr) => {
        impl EnviScalar for $t {
            const DATA_TYPE: u8 = $code;
            const BYTES: usize = std::mem::size_of::<$t>();

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }
        }
    };
}

impl_envi_scalar!(u8, 1);
impl_envi_scalar!(i16, 2);
impl_envi_scalar!(i32, 3);
impl_envi_scalar!(f32, 4);
impl_envi_scalar!(f64, 5);
impl_envi_scalar!(u16, 12);
impl_envi_scalar!(u32, 13);

/// Parsed or to-be-written `.hdr` contents
#[derive(Debug, Clone, Default)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub data_type: u8,
    pub description: String,
    pub band_names: Vec<String>,
    pub class_names: Vec<String>,
    pub class_lookup: Vec<[u8; 3]>,
    pub transform: Option<GeoTransform>,
    pub acquisition_time: Option<String>,
    pub parent_rasters: Vec<String>,
}

impl EnviHeader {
    /// Header describing a raster about to be written as `product`
    pub fn for_product<T: EnviScalar>(
        raster: &Raster<T>,
        product: &Product,
        parents: Vec<String>,
    ) -> Self {
        let (lines, samples) = raster.shape();
        let (class_names, class_lookup) = match product.legend() {
            Some(legend) => (
                legend.names.iter().map(|s| s.to_string()).collect(),
                legend.lookup.to_vec(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            samples,
            lines,
            bands: 1,
            data_type: T::DATA_TYPE,
            description: product.description(),
            band_names: product.band_names(),
            class_names,
            class_lookup,
            transform: Some(*raster.transform()),
            acquisition_time: product.default_acquisition_time(),
            parent_rasters: parents,
        }
    }
}

/// Sidecar header path for a `.dat` file
fn header_path(data_path: &Path) -> PathBuf {
    data_path.with_extension("hdr")
}

/// Write a single-band raster and its header sidecar
pub fn write_envi<T, P>(path: P, raster: &Raster<T>, header: &EnviHeader) -> Result<()>
where
    T: EnviScalar,
    P: AsRef<Path>,
{
    write_envi_bands(path, std::slice::from_ref(raster), header)
}

/// Write a multi-band BSQ raster and its header sidecar. All bands
/// must share the first band's dimensions.
pub fn write_envi_bands<T, P>(path: P, rasters: &[Raster<T>], header: &EnviHeader) -> Result<()>
where
    T: EnviScalar,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let Some(first) = rasters.first() else {
        return Err(Error::Other("no bands to write".to_string()));
    };
    let (rows, cols) = first.shape();
    let mut bytes = Vec::with_capacity(rasters.len() * first.len() * T::BYTES);
    for raster in rasters {
        if raster.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: raster.rows(),
                ac: raster.cols(),
            });
        }
        for &v in raster.data().iter() {
            v.write_le(&mut bytes);
        }
    }
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&bytes)?;
    out.flush()?;

    let mut header = header.clone();
    header.samples = cols;
    header.lines = rows;
    header.bands = rasters.len();
    header.data_type = T::DATA_TYPE;
    let mut hdr = BufWriter::new(File::create(header_path(path))?);
    write_header(&mut hdr, &header)?;
    hdr.flush()?;
    Ok(())
}

fn write_header(out: &mut impl Write, header: &EnviHeader) -> Result<()> {
    writeln!(out, "ENVI")?;
    writeln!(out, "description = {{\n  {}}}", header.description)?;
    writeln!(out, "samples = {}", header.samples)?;
    writeln!(out, "lines = {}", header.lines)?;
    writeln!(out, "bands = {}", header.bands)?;
    writeln!(out, "header offset = 0")?;
    writeln!(out, "file type = ENVI Standard")?;
    writeln!(out, "data type = {}", header.data_type)?;
    writeln!(out, "interleave = bsq")?;
    writeln!(out, "byte order = 0")?;
    if let Some(t) = &header.transform {
        writeln!(
            out,
            "map info = {{Transverse Mercator, 1, 1, {}, {}, {}, {}, units=Meters}}",
            t.origin_x,
            t.origin_y,
            t.pixel_width,
            t.pixel_height.abs()
        )?;
    }
    if !header.band_names.is_empty() {
        writeln!(out, "band names = {{{}}}", header.band_names.join(", "))?;
    }
    if !header.class_names.is_empty() {
        writeln!(out, "classes = {}", header.class_names.len())?;
        writeln!(out, "class names = {{\n {}}}", header.class_names.join(",\n "))?;
        let flat: Vec<String> = header
            .class_lookup
            .iter()
            .flat_map(|rgb| rgb.iter().map(|c| c.to_string()))
            .collect();
        writeln!(out, "class lookup = {{\n {}}}", flat.join(", "))?;
    }
    if let Some(acq) = &header.acquisition_time {
        writeln!(out, "acquisition time = {acq}")?;
    }
    if !header.parent_rasters.is_empty() {
        writeln!(
            out,
            "parent rasters = {{ {}}}",
            header.parent_rasters.join(", ")
        )?;
    }
    Ok(())
}

/// Parse a `.hdr` sidecar
pub fn read_envi_header<P: AsRef<Path>>(path: P) -> Result<EnviHeader> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let fields = parse_fields(&text, path)?;

    let parse_usize = |key: &str| -> Result<usize> {
        fields
            .get(key)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| Error::HeaderParse {
                path: path.display().to_string(),
                reason: format!("missing or invalid field '{key}'"),
            })
    };

    let mut header = EnviHeader {
        samples: parse_usize("samples")?,
        lines: parse_usize("lines")?,
        bands: parse_usize("bands")?,
        data_type: parse_usize("data type")? as u8,
        ..EnviHeader::default()
    };
    if let Some(order) = fields.get("byte order") {
        if order.trim() != "0" {
            return Err(Error::HeaderParse {
                path: path.display().to_string(),
                reason: "big-endian rasters are not supported".to_string(),
            });
        }
    }
    if let Some(desc) = fields.get("description") {
        header.description = desc.trim().to_string();
    }
    if let Some(names) = fields.get("band names") {
        header.band_names = split_list(names);
    }
    if let Some(names) = fields.get("class names") {
        header.class_names = split_list(names);
    }
    if let Some(lookup) = fields.get("class lookup") {
        let values: Vec<u8> = split_list(lookup)
            .iter()
            .filter_map(|v| v.parse::<u8>().ok())
            .collect();
        header.class_lookup = values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    }
    if let Some(info) = fields.get("map info") {
        header.transform = parse_map_info(info);
    }
    if let Some(acq) = fields.get("acquisition time") {
        header.acquisition_time = Some(acq.trim().to_string());
    }
    if let Some(parents) = fields.get("parent rasters") {
        header.parent_rasters = split_list(parents);
    }
    Ok(header)
}

/// Read a single-band raster plus its header sidecar.
///
/// The header's data type must match `T`; a mismatch is an error
/// rather than a silent cast.
pub fn read_envi<T, P>(path: P) -> Result<(Raster<T>, EnviHeader)>
where
    T: EnviScalar,
    P: AsRef<Path>,
{
    let (mut bands, header) = read_envi_bands(path)?;
    // read_envi_bands returns exactly header.bands rasters
    let raster = bands.pop().ok_or_else(|| Error::Other(
        "raster has no bands".to_string(),
    ))?;
    if !bands.is_empty() {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single band, found {}",
            bands.len() + 1
        )));
    }
    Ok((raster, header))
}

/// Read every band of a BSQ raster, in file order
pub fn read_envi_bands<T, P>(path: P) -> Result<(Vec<Raster<T>>, EnviHeader)>
where
    T: EnviScalar,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let header = read_envi_header(header_path(path))?;
    if header.data_type != T::DATA_TYPE {
        return Err(Error::DataTypeMismatch {
            expected: T::DATA_TYPE,
            found: header.data_type,
        });
    }

    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    let plane = header.lines * header.samples * T::BYTES;
    if plane == 0 {
        return Err(Error::HeaderParse {
            path: path.display().to_string(),
            reason: "zero-sized raster".to_string(),
        });
    }
    let expected = plane * header.bands;
    if bytes.len() != expected {
        return Err(Error::HeaderParse {
            path: path.display().to_string(),
            reason: format!("data file is {} bytes, header implies {expected}", bytes.len()),
        });
    }

    let rasters = bytes
        .chunks_exact(plane)
        .map(|chunk| {
            let data: Vec<T> = chunk.chunks_exact(T::BYTES).map(T::read_le).collect();
            let mut raster = Raster::from_vec(data, header.lines, header.samples)?;
            if let Some(t) = header.transform {
                raster.set_transform(t);
            }
            Ok(raster)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((rasters, header))
}

/// Split `key = value` fields, where a value opening with `{` runs to
/// the matching `}` across lines
fn parse_fields(text: &str, path: &Path) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::new();
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim() == "ENVI" => {}
        _ => {
            return Err(Error::HeaderParse {
                path: path.display().to_string(),
                reason: "missing ENVI magic line".to_string(),
            })
        }
    }

    let mut current: Option<(String, String)> = None;
    for line in lines {
        if let Some((_, value)) = current.as_mut() {
            value.push(' ');
            value.push_str(line);
            if line.contains('}') {
                if let Some((key, value)) = current.take() {
                    fields.insert(key, strip_braces(&value));
                }
            }
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();
        if value.starts_with('{') && !value.contains('}') {
            current = Some((key, value.to_string()));
        } else {
            fields.insert(key, strip_braces(value));
        }
    }
    Ok(fields)
}

fn strip_braces(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim()
        .to_string()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Pull the geotransform back out of a `map info` field. Fields are
/// projection name, reference pixel (x, y), easting, northing, pixel
/// sizes, then projection extras we ignore.
fn parse_map_info(info: &str) -> Option<GeoTransform> {
    let parts: Vec<&str> = info.split(',').map(str::trim).collect();
    if parts.len() < 7 {
        return None;
    }
    let origin_x = parts[3].parse::<f64>().ok()?;
    let origin_y = parts[4].parse::<f64>().ok()?;
    let pixel_width = parts[5].parse::<f64>().ok()?;
    let pixel_height = -parts[6].parse::<f64>().ok()?.abs();
    Some(GeoTransform::new(origin_x, origin_y, pixel_width, pixel_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Category, Product};
    use tempfile::TempDir;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forestry_pct_1995_A07.dat");

        let mut raster: Raster<u16> = Raster::new(4, 5);
        raster.set(1, 2, 10000).unwrap();
        raster.set(3, 4, 4200).unwrap();
        raster.set_transform(GeoTransform::new(418500.0, 969000.0, 30.0, -30.0));

        let product = Product::Percent {
            category: Category::Forestry,
            tile: "A07".to_string(),
            year: 1995,
            span_end: None,
            thresholds: None,
        };
        let header = EnviHeader::for_product(&raster, &product, vec!["a.dat".into(), "b.dat".into()]);
        write_envi(&path, &raster, &header).unwrap();

        let (back, hdr) = read_envi::<u16, _>(&path).unwrap();
        assert_eq!(back.shape(), (4, 5));
        assert_eq!(back.get(1, 2).unwrap(), 10000);
        assert_eq!(back.get(3, 4).unwrap(), 4200);
        assert_eq!(back.get(0, 0).unwrap(), 0);
        assert_eq!(hdr.data_type, 12);
        assert_eq!(hdr.parent_rasters, vec!["a.dat", "b.dat"]);
        assert_eq!(hdr.acquisition_time.as_deref(), Some("1995-07-01"));

        let t = back.transform();
        assert_eq!(t.origin_x, 418500.0);
        assert_eq!(t.pixel_height, -30.0);
    }

    #[test]
    fn test_class_legend_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forestryclass_1995_A07.dat");

        let raster: Raster<u8> = Raster::new(2, 2);
        let product = Product::ForestryClass {
            tile: "A07".to_string(),
            year: 1995,
            thresholds: None,
        };
        let header = EnviHeader::for_product(&raster, &product, Vec::new());
        write_envi(&path, &raster, &header).unwrap();

        let hdr = read_envi_header(path.with_extension("hdr")).unwrap();
        assert_eq!(hdr.class_names.len(), 4);
        assert_eq!(hdr.class_names[3], "Forest");
        assert_eq!(hdr.class_lookup[3], [0, 139, 0]);
    }

    #[test]
    fn test_data_type_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("obs.dat");

        let raster: Raster<u16> = Raster::new(2, 2);
        let product = Product::Denominator {
            tile: "A07".to_string(),
            year: 1995,
            thresholds: None,
        };
        let header = EnviHeader::for_product(&raster, &product, Vec::new());
        write_envi(&path, &raster, &header).unwrap();

        assert!(matches!(
            read_envi::<u8, _>(&path),
            Err(Error::DataTypeMismatch { expected: 1, found: 12 })
        ));
    }

    #[test]
    fn test_multiband_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("LT50230241995182AAA02_ref_ITM.dat");

        let mut bands: Vec<Raster<i16>> = Vec::new();
        for b in 0..6 {
            let mut r = Raster::filled(3, 4, (b as i16 + 1) * 100);
            r.set_transform(GeoTransform::new(418500.0, 969000.0, 30.0, -30.0));
            bands.push(r);
        }
        let header = EnviHeader {
            description: "Surface reflectance".to_string(),
            transform: Some(*bands[0].transform()),
            ..EnviHeader::default()
        };
        write_envi_bands(&path, &bands, &header).unwrap();

        let (back, hdr) = read_envi_bands::<i16, _>(&path).unwrap();
        assert_eq!(hdr.bands, 6);
        assert_eq!(back.len(), 6);
        assert_eq!(back[0].get(0, 0).unwrap(), 100);
        assert_eq!(back[5].get(2, 3).unwrap(), 600);

        // Single-band reader refuses the stack
        assert!(read_envi::<i16, _>(&path).is_err());
    }

    #[test]
    fn test_truncated_data_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("obs.dat");

        let raster: Raster<u16> = Raster::new(4, 4);
        let product = Product::Denominator {
            tile: "A07".to_string(),
            year: 1995,
            thresholds: None,
        };
        let header = EnviHeader::for_product(&raster, &product, Vec::new());
        write_envi(&path, &raster, &header).unwrap();
        std::fs::write(&path, [0u8; 10]).unwrap();

        assert!(read_envi::<u16, _>(&path).is_err());
    }
}

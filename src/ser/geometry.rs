use std::{
    fs::{self, File},
    io::{Cursor, Read},
    path::{Path, PathBuf},
    time::Instant,
};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use shapefile::{
    Shape,
    dbase::{CodePageMark, FieldValue, Record, encoding::EncodingRs},
};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{
    ser::{GeometryMap, InputError, SegmentGeometry, ServiceArea, ShapefileConfig},
    shared::{Coordinate, Projection},
};

/// Where the shapefile layers live.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapefileSource {
    /// A zip archive; layers are found by file name anywhere inside it.
    Zip(PathBuf),
    /// A directory holding `<layer>.shp` and `<layer>.dbf`.
    Directory(PathBuf),
}

impl ShapefileSource {
    /// A `.zip` path is read as an archive, a directory as is, and a `.shp`
    /// path as its parent directory.
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::Directory(path.to_path_buf());
        }
        match extension(path).as_deref() {
            Some("shp") => Self::Directory(
                path.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            ),
            _ => Self::Zip(path.to_path_buf()),
        }
    }

    fn path(&self) -> &Path {
        match self {
            ShapefileSource::Zip(path) | ShapefileSource::Directory(path) => path,
        }
    }

    fn read_layer(&self, layer: &str) -> Result<Option<Layer>, InputError> {
        let (shp, dbf, cpg) = match self {
            ShapefileSource::Zip(path) => {
                let file = File::open(path).map_err(InputError::io(path))?;
                let mut archive = ZipArchive::new(file)?;
                (
                    read_zip_entry(&mut archive, &format!("{layer}.shp"), path)?,
                    read_zip_entry(&mut archive, &format!("{layer}.dbf"), path)?,
                    read_zip_entry(&mut archive, &format!("{layer}.cpg"), path)?,
                )
            }
            ShapefileSource::Directory(dir) => (
                read_optional(&dir.join(format!("{layer}.shp")))?,
                read_optional(&dir.join(format!("{layer}.dbf")))?,
                read_optional(&dir.join(format!("{layer}.cpg")))?,
            ),
        };
        match (shp, dbf) {
            (Some(shp), Some(dbf)) => Ok(Some(Layer { shp, dbf, cpg })),
            _ => Ok(None),
        }
    }
}

struct Layer {
    shp: Vec<u8>,
    dbf: Vec<u8>,
    /// Code page sidecar, e.g. `1252` or `UTF-8`.
    cpg: Option<Vec<u8>>,
}

impl Layer {
    fn features(self) -> Result<Vec<(Shape, Record)>, InputError> {
        let encoding = self.text_encoding();
        let shape_reader = shapefile::ShapeReader::new(Cursor::new(self.shp))?;
        let mut dbase_reader = shapefile::dbase::Reader::new(Cursor::new(self.dbf))?;
        if let Some(encoding) = encoding {
            dbase_reader.set_encoding(EncodingRs::from(encoding));
        }
        let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);
        let mut features = Vec::new();
        for result in reader.iter_shapes_and_records() {
            features.push(result?);
        }
        Ok(features)
    }

    /// Encoding for the attribute text, when the `.dbf` header alone cannot be trusted.
    ///
    /// A `.cpg` sidecar wins. Headers without a usable code page (unset, UTF-8 or
    /// unknown marks such as the `0x57` "ANSI" written by some GIS tools) are
    /// read as UTF-8 when the records are valid UTF-8 and as Windows-1252 otherwise.
    fn text_encoding(&self) -> Option<&'static Encoding> {
        if let Some(encoding) = self
            .cpg
            .as_deref()
            .and_then(|label| Encoding::for_label(cpg_label(label).as_bytes()))
        {
            return Some(encoding);
        }
        let mark = CodePageMark::from(*self.dbf.get(29)?);
        match mark {
            CodePageMark::Undefined | CodePageMark::Invalid | CodePageMark::Utf8 => {
                let offset = self
                    .dbf
                    .get(8..10)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)?;
                let records = self.dbf.get(offset..).unwrap_or_default();
                if std::str::from_utf8(records).is_ok() {
                    Some(UTF_8)
                } else {
                    Some(WINDOWS_1252)
                }
            }
            _ => None,
        }
    }
}

/// `.cpg` files hold either an encoding label or a bare Windows code page number.
fn cpg_label(raw: &[u8]) -> String {
    let label = String::from_utf8_lossy(raw).trim().to_string();
    match label.parse::<u16>() {
        Ok(code_page) => format!("windows-{code_page}"),
        Err(_) => label,
    }
}

/// Reads the segments layer into a key to geometry map.
///
/// Line parts of a feature are concatenated in order. Features that are not
/// lines, have fewer than two points or lack a key are skipped. When two
/// features share a key the first one is kept.
pub fn load_geometry<P: AsRef<Path>>(
    path: P,
    config: &ShapefileConfig,
) -> Result<GeometryMap, InputError> {
    let path = path.as_ref();
    let (source, layer) = match extension(path).as_deref() {
        Some("shp") => (
            ShapefileSource::detect(path),
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| config.segments_layer.clone()),
        ),
        _ => (ShapefileSource::detect(path), config.segments_layer.clone()),
    };

    debug!("Loading geometry layer {layer} from {}...", path.display());
    let now = Instant::now();
    let features = source
        .read_layer(&layer)?
        .ok_or_else(|| InputError::LayerNotFound {
            layer: layer.clone(),
            path: source.path().to_path_buf(),
        })?
        .features()?;

    let mut geometry = GeometryMap::with_capacity(features.len());
    let mut skipped = 0usize;
    for (index, (shape, record)) in features.iter().enumerate() {
        let Some(key) = field_text(record, &config.key_field) else {
            warn!("Skipping shape #{index}: missing {} attribute", config.key_field);
            skipped += 1;
            continue;
        };
        let points = match line_points(shape) {
            Some(points) if points.len() >= 2 => project(&points, config.projection, config.precision),
            _ => {
                warn!("Skipping shape {key}: {:?} is not a line", shape.shapetype());
                skipped += 1;
                continue;
            }
        };
        if geometry.contains_key(&key) {
            debug!("Duplicate shape key {key}, keeping the first feature");
            skipped += 1;
            continue;
        }
        let bay_type = config
            .bay_type_field
            .as_deref()
            .and_then(|field| field_text(record, field));
        geometry.insert(key, SegmentGeometry { points, bay_type });
    }
    debug!(
        "Loaded {} shapes ({} skipped) in {:?}",
        geometry.len(),
        skipped,
        now.elapsed()
    );
    Ok(geometry)
}

/// Reads the regulated neighbourhood boundaries, when the archive has them.
///
/// A missing boundary layer is not an error, the map is simply drawn
/// without them. Every outer ring becomes its own [`ServiceArea`].
pub fn load_service_areas<P: AsRef<Path>>(
    path: P,
    config: &ShapefileConfig,
) -> Result<Vec<ServiceArea>, InputError> {
    let Some(layer) = config.boundary_layer.as_deref() else {
        return Ok(Vec::new());
    };
    let source = ShapefileSource::detect(path);
    let Some(files) = source.read_layer(layer)? else {
        debug!("No {layer} layer in {}", source.path().display());
        return Ok(Vec::new());
    };

    let now = Instant::now();
    let mut areas = Vec::new();
    for (shape, record) in files.features()? {
        let name = field_text(&record, &config.boundary_name_field).unwrap_or_default();
        if name == config.excluded_boundary_name {
            continue;
        }
        for ring in outer_rings(&shape) {
            areas.push(ServiceArea {
                name: name.clone(),
                ring: project(&ring, config.projection, config.precision),
            });
        }
    }
    debug!("Loaded {} service areas in {:?}", areas.len(), now.elapsed());
    Ok(areas)
}

fn line_points(shape: &Shape) -> Option<Vec<(f64, f64)>> {
    match shape {
        Shape::Polyline(line) => Some(line.parts().iter().flatten().map(|p| (p.x, p.y)).collect()),
        Shape::PolylineM(line) => Some(line.parts().iter().flatten().map(|p| (p.x, p.y)).collect()),
        Shape::PolylineZ(line) => Some(line.parts().iter().flatten().map(|p| (p.x, p.y)).collect()),
        _ => None,
    }
}

fn outer_rings(shape: &Shape) -> Vec<Vec<(f64, f64)>> {
    use shapefile::PolygonRing;
    match shape {
        Shape::Polygon(polygon) => polygon
            .rings()
            .iter()
            .filter_map(|ring| match ring {
                PolygonRing::Outer(points) => Some(points.iter().map(|p| (p.x, p.y)).collect()),
                PolygonRing::Inner(_) => None,
            })
            .collect(),
        Shape::PolygonZ(polygon) => polygon
            .rings()
            .iter()
            .filter_map(|ring| match ring {
                PolygonRing::Outer(points) => Some(points.iter().map(|p| (p.x, p.y)).collect()),
                PolygonRing::Inner(_) => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn project(points: &[(f64, f64)], projection: Projection, precision: u32) -> Vec<Coordinate> {
    points
        .iter()
        .map(|&(x, y)| projection.to_wgs84(x, y).rounded(precision))
        .collect()
}

/// Attribute value as trimmed text. Whole numbers are printed without a
/// fractional part so that `123.0` in a numeric column matches `123` in the CSV.
fn field_text(record: &Record, field: &str) -> Option<String> {
    let text = match record.get(field)? {
        FieldValue::Character(Some(value)) => value.trim().to_string(),
        FieldValue::Numeric(Some(value)) => number_text(*value),
        FieldValue::Float(Some(value)) => number_text(*value as f64),
        FieldValue::Double(value) => number_text(*value),
        FieldValue::Integer(value) => value.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn read_zip_entry(
    archive: &mut ZipArchive<File>,
    file_name: &str,
    path: &Path,
) -> Result<Option<Vec<u8>>, InputError> {
    let wanted = file_name.to_lowercase();
    let Some(name) = archive
        .file_names()
        .find(|name| {
            let name = name.to_lowercase();
            name == wanted || name.ends_with(&format!("/{wanted}"))
        })
        .map(str::to_owned)
    else {
        return Ok(None);
    };
    let mut entry = archive.by_name(&name)?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).map_err(InputError::io(path))?;
    Ok(Some(buf))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, InputError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read(path).map(Some).map_err(InputError::io(path))
}

#[test]
fn cpg_numbers_become_windows_labels() {
    assert_eq!(cpg_label(b"1252\r\n"), "windows-1252");
    assert_eq!(cpg_label(b" UTF-8 "), "UTF-8");
    assert_eq!(
        Encoding::for_label(cpg_label(b"ISO-8859-1").as_bytes()),
        Some(WINDOWS_1252)
    );
}

#[test]
fn number_text_drops_zero_fraction() {
    assert_eq!(number_text(123.0), "123");
    assert_eq!(number_text(12.5), "12.5");
}

#[test]
fn detect_zip_and_shp_sources() {
    assert_eq!(
        ShapefileSource::detect("data/SHP_ZIP.zip"),
        ShapefileSource::Zip(PathBuf::from("data/SHP_ZIP.zip"))
    );
    assert_eq!(
        ShapefileSource::detect("data/SHP_ZIP/Bandas_de_Aparcamiento.shp"),
        ShapefileSource::Directory(PathBuf::from("data/SHP_ZIP"))
    );
}

#![allow(dead_code)]

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use shapefile::{
    Point, Polygon, PolygonRing, Polyline,
    dbase::{FieldName, FieldValue, Record, TableWriterBuilder, encoding::EncodingRs},
};
use tempfile::TempDir;
use zip::{ZipWriter, write::SimpleFileOptions};

pub const HEADER: &str = "ID;Color;Res_NumPla;Calle;Bateria_Li";

pub fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

pub fn write_csv(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("ser_segments.csv");
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).expect("write csv");
    path
}

pub struct Line<'a> {
    pub key: &'a str,
    pub bay_type: &'a str,
    /// `(x, y)` pairs, longitude first for geographic data.
    pub points: Vec<(f64, f64)>,
}

pub fn line<'a>(key: &'a str, points: &[(f64, f64)]) -> Line<'a> {
    Line {
        key,
        bay_type: "Línea",
        points: points.to_vec(),
    }
}

/// Writes `Bandas_de_Aparcamiento.{shp,shx,dbf}` into `dir`.
pub fn write_segments_layer(dir: &Path, lines: &[Line]) -> PathBuf {
    let path = dir.join("Bandas_de_Aparcamiento.shp");
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("ID").unwrap(), 20)
        .add_character_field(FieldName::try_from("Bateria_Li").unwrap(), 20);
    let mut writer = shapefile::Writer::from_path(&path, table).expect("create shapefile");
    for line in lines {
        let shape = Polyline::new(line.points.iter().map(|&(x, y)| Point::new(x, y)).collect());
        let mut record = Record::default();
        record.insert("ID".to_string(), FieldValue::Character(Some(line.key.to_string())));
        record.insert(
            "Bateria_Li".to_string(),
            FieldValue::Character(Some(line.bay_type.to_string())),
        );
        writer
            .write_shape_and_record(&shape, &record)
            .expect("write shape");
    }
    drop(writer);
    path
}

/// Writes `Barrios_Zona_SER.{shp,shx,dbf}` with one square per name.
pub fn write_boundary_layer(dir: &Path, areas: &[(&str, (f64, f64))]) -> PathBuf {
    boundary_layer(dir, areas, TableWriterBuilder::new())
}

/// Same layer with the attribute text stored as Windows-1252, as the city publishes it.
/// The `.dbf` header is marked as code page 1252 (`0x03`).
pub fn write_latin1_boundary_layer(dir: &Path, areas: &[(&str, (f64, f64))]) -> PathBuf {
    let table = TableWriterBuilder::with_encoding(EncodingRs::from(encoding_rs::WINDOWS_1252));
    boundary_layer(dir, areas, table)
}

/// Overwrites the language driver byte of a `.dbf` header.
pub fn set_code_page_mark(dbf: &Path, mark: u8) {
    let mut bytes = fs::read(dbf).expect("read dbf");
    bytes[29] = mark;
    fs::write(dbf, bytes).expect("write dbf");
}

fn boundary_layer(dir: &Path, areas: &[(&str, (f64, f64))], table: TableWriterBuilder) -> PathBuf {
    let path = dir.join("Barrios_Zona_SER.shp");
    let table = table.add_character_field(FieldName::try_from("NOMBAR").unwrap(), 40);
    let mut writer = shapefile::Writer::from_path(&path, table).expect("create shapefile");
    for (name, (x, y)) in areas {
        let ring = vec![
            Point::new(*x, *y),
            Point::new(*x, y + 0.01),
            Point::new(x + 0.01, y + 0.01),
            Point::new(x + 0.01, *y),
            Point::new(*x, *y),
        ];
        let shape = Polygon::new(PolygonRing::Outer(ring));
        let mut record = Record::default();
        record.insert("NOMBAR".to_string(), FieldValue::Character(Some(name.to_string())));
        writer
            .write_shape_and_record(&shape, &record)
            .expect("write shape");
    }
    drop(writer);
    path
}

/// Zips every shapefile part in `dir` under a `SHP_ZIP/` folder.
pub fn zip_layers(dir: &Path, zip_path: &Path) {
    let mut names: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("shp" | "shx" | "dbf" | "cpg")
            )
        })
        .collect();
    names.sort();

    let file = File::create(zip_path).expect("create zip");
    let mut zip = ZipWriter::new(file);
    for path in names {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        zip.start_file(format!("SHP_ZIP/{name}"), SimpleFileOptions::default())
            .expect("start zip entry");
        zip.write_all(&fs::read(&path).expect("read layer"))
            .expect("write zip entry");
    }
    zip.finish().expect("finish zip");
}

/// Pulls the embedded data object back out of a generated page.
pub fn embedded_payload(html: &str) -> serde_json::Value {
    let start = html.find("const serMap = ").expect("payload start") + "const serMap = ".len();
    let end = start + html[start..].find(";\n").expect("payload end");
    serde_json::from_str(&html[start..end]).expect("payload json")
}

pub fn zone<'a>(payload: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    payload["zones"]
        .as_array()
        .expect("zones")
        .iter()
        .find(|zone| zone["key"] == key)
        .expect("zone present")
}

use serde::{Deserialize, Serialize};

use crate::shared::Projection;

/// Column names of the segments CSV. Header cells are compared after trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
    pub id_column: String,
    pub zone_column: String,
    pub spots_column: String,
    pub street_column: String,
    pub key_column: String,
    pub bay_type_column: Option<String>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            id_column: "ID".into(),
            zone_column: "Color".into(),
            spots_column: "Res_NumPla".into(),
            street_column: "Calle".into(),
            key_column: "ID".into(),
            bay_type_column: Some("Bateria_Li".into()),
        }
    }
}

/// Layer and attribute names inside the shapefile archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapefileConfig {
    pub segments_layer: String,
    pub key_field: String,
    pub bay_type_field: Option<String>,
    pub boundary_layer: Option<String>,
    pub boundary_name_field: String,
    /// Boundary features with this name are not part of the regulated area.
    pub excluded_boundary_name: String,
    pub projection: Projection,
    /// Decimal places kept on every coordinate.
    pub precision: u32,
}

impl Default for ShapefileConfig {
    fn default() -> Self {
        Self {
            segments_layer: "Bandas_de_Aparcamiento".into(),
            key_field: "ID".into(),
            bay_type_field: Some("Bateria_Li".into()),
            boundary_layer: Some("Barrios_Zona_SER".into()),
            boundary_name_field: "NOMBAR".into(),
            excluded_boundary_name: "No está en la zona SER".into(),
            projection: Projection::Auto,
            precision: 5,
        }
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Error,
    parking::{self, MapSummary, UnmatchedPolicy},
    render::{self, RenderOptions},
    ser::{self, CsvConfig, InputError, ShapefileConfig},
    shared::MADRID_CENTER,
};

/// Everything a run needs. Loadable from TOML; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub csv_path: PathBuf,
    /// `None` renders the map without geometry.
    pub shapefile_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub title: String,
    /// Stamp the page with the generation time.
    pub timestamp: bool,
    pub unmatched: UnmatchedPolicy,
    pub csv: CsvConfig,
    pub shapefile: ShapefileConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_path: "data/ser_segments.csv".into(),
            shapefile_path: Some("data/SHP_ZIP.zip".into()),
            output_path: "index.html".into(),
            title: RenderOptions::default().title,
            timestamp: true,
            unmatched: UnmatchedPolicy::default(),
            csv: CsvConfig::default(),
            shapefile: ShapefileConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(InputError::io(path))?;
        toml::from_str(&content).map_err(|source| InputError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Single-shot pipeline from the input files to the published page.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    settings: Settings,
    generated_at: Option<String>,
}

impl Generator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            generated_at: None,
        }
    }

    /// Pins the generation stamp instead of reading the clock.
    pub fn generated_at(mut self, stamp: impl Into<String>) -> Self {
        self.generated_at = Some(stamp.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the whole pipeline. On any error the output file is left untouched.
    pub fn run(&self) -> Result<MapSummary, Error> {
        let settings = &self.settings;
        let now = Instant::now();

        let rows = ser::load_records(&settings.csv_path, &settings.csv)?;
        let (geometry, service_areas) = match &settings.shapefile_path {
            Some(path) => (
                Some(ser::load_geometry(path, &settings.shapefile)?),
                ser::load_service_areas(path, &settings.shapefile)?,
            ),
            None => {
                debug!("No shapefile configured, rendering without geometry");
                (None, Vec::new())
            }
        };

        let built = parking::build_segments(&rows, geometry.as_ref(), settings.unmatched);
        for warning in &built.warnings {
            warn!("Skipping record: {warning}");
        }
        let skipped = built.warnings.len();
        let groups = parking::group_by_zone(built.segments);
        let summary = MapSummary::new(&groups, skipped);

        let options = RenderOptions {
            title: settings.title.clone(),
            generated_at: self.stamp(),
            center: MADRID_CENTER,
        };
        render::render(
            &groups,
            &service_areas,
            &summary,
            &options,
            &settings.output_path,
        )?;

        for zone in &summary.zones {
            info!(
                "{}: {} segments, {} spots, {:.1} km",
                zone.zone,
                zone.segments,
                zone.spots,
                zone.length_m as f64 / 1000.0
            );
        }
        info!(
            "Generated {} with {} segments and {} spots ({} skipped, {} without geometry) in {:?}",
            settings.output_path.display(),
            summary.segments,
            summary.spots,
            summary.skipped,
            summary.without_geometry,
            now.elapsed()
        );
        Ok(summary)
    }

    fn stamp(&self) -> Option<String> {
        if !self.settings.timestamp {
            return None;
        }
        self.generated_at
            .clone()
            .or_else(|| Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)))
    }
}

#[test]
fn settings_from_partial_toml() {
    let settings: Settings = toml::from_str(
        r#"
        csv_path = "input.csv"
        unmatched = "keep"

        [csv]
        delimiter = ","
        street_column = "Nombre de la via"

        [shapefile]
        projection = "utm30n"
        "#,
    )
    .unwrap();
    assert_eq!(settings.csv_path, PathBuf::from("input.csv"));
    assert_eq!(settings.unmatched, UnmatchedPolicy::Keep);
    assert_eq!(settings.csv.delimiter, ',');
    assert_eq!(settings.csv.street_column, "Nombre de la via");
    assert_eq!(settings.csv.id_column, "ID");
    assert_eq!(settings.shapefile.projection, crate::shared::Projection::Utm30n);
    assert_eq!(settings.output_path, PathBuf::from("index.html"));
}

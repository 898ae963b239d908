use std::path::PathBuf;

use clap::{ArgAction, Parser};
use sermap::{generator::Settings, ser::InputError};

/// Generates the Madrid SER parking map as a single HTML page.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file with paths, column names and layer names.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Segments CSV.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Shapefile archive (.zip), directory or .shp file with the segment geometry.
    #[arg(long, conflicts_with = "no_shapefile")]
    pub shapefile: Option<PathBuf>,

    /// Render without geometry, even if the configuration names a shapefile.
    #[arg(long)]
    pub no_shapefile: bool,

    /// Where to write the page.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Page title.
    #[arg(long)]
    pub title: Option<String>,

    /// Leave the generation time out of the page.
    #[arg(long)]
    pub no_timestamp: bool,

    /// More logging, repeat for trace output. Overridden by RUST_LOG.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn settings(&self) -> Result<Settings, InputError> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_toml_file(path)?,
            None => Settings::default(),
        };
        if let Some(csv) = &self.csv {
            settings.csv_path = csv.clone();
        }
        if let Some(shapefile) = &self.shapefile {
            settings.shapefile_path = Some(shapefile.clone());
        }
        if self.no_shapefile {
            settings.shapefile_path = None;
        }
        if let Some(output) = &self.output {
            settings.output_path = output.clone();
        }
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
        if self.no_timestamp {
            settings.timestamp = false;
        }
        Ok(settings)
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[test]
fn flags_override_defaults() {
    let args = Args::parse_from([
        "sermap",
        "--csv",
        "in.csv",
        "--no-shapefile",
        "-o",
        "out/map.html",
        "--no-timestamp",
    ]);
    let settings = args.settings().unwrap();
    assert_eq!(settings.csv_path, PathBuf::from("in.csv"));
    assert_eq!(settings.shapefile_path, None);
    assert_eq!(settings.output_path, PathBuf::from("out/map.html"));
    assert!(!settings.timestamp);
}

#[test]
fn shapefile_conflicts_with_no_shapefile() {
    let result = Args::try_parse_from(["sermap", "--shapefile", "a.zip", "--no-shapefile"]);
    assert!(result.is_err());
}

#[test]
fn verbose_raises_level() {
    assert_eq!(Args::parse_from(["sermap"]).log_level(), "info");
    assert_eq!(Args::parse_from(["sermap", "-vv"]).log_level(), "trace");
}
